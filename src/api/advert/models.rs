use serde::{Deserialize, Serialize};
use validator::Validate;

pub const CATEGORY_REQUIRED: &str = "You must select a category.";
pub const URL_REQUIRED: &str = "You must enter an url.";
pub const URL_TAKEN: &str = "This job advert already exists in the database.";
pub const NOTE_REQUIRED: &str = "You must select a note.";
pub const NOTE_OUT_OF_RANGE: &str = "The note must be a number between 0 and 5.";

/// Order in which form errors are reported
pub const FIELD_ORDER: [&str; 3] = ["category", "url", "note"];

/// Raw values of the add/edit form, exactly as the user entered them.
///
/// `category` and `note` are selections, so `None` means nothing was picked.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct AdvertForm {
    #[validate(required(message = "You must select a category."))]
    pub category: Option<String>,
    pub organization: String,
    #[validate(length(min = 1, message = "You must enter an url."))]
    pub url: String,
    pub title: String,
    #[validate(required(message = "You must select a note."))]
    pub note: Option<String>,
    pub pros: String,
    pub cons: String,
    pub desc: String,
}
