//! Translation between raw form values and stored job adverts.

use chrono::NaiveDate;
use validator::{Validate, ValidationErrors};

use super::models::{AdvertForm, FIELD_ORDER, NOTE_OUT_OF_RANGE, URL_TAKEN};
use crate::api::validation::{collect_field_errors, rule, FieldError};
use crate::db::models::{AdvertChanges, Category, JobAdvertRecord, MAX_NOTE};
use crate::db::RecordStore;

/// Validated category and note shared by the add and edit flows
struct Selections {
    category: Option<Category>,
    note: Option<u8>,
}

/// Run the derive rules, then add the ones that need parsing.
/// Every violation is recorded; nothing stops at the first one.
fn check_selections(form: &AdvertForm, errors: &mut ValidationErrors) -> Selections {
    let category = match form.category.as_deref().map(str::parse::<Category>) {
        Some(Ok(category)) => Some(category),
        Some(Err(unknown)) => {
            errors.add("category", rule("unknown_category", unknown.to_string()));
            None
        }
        None => None,
    };

    let note = match form.note.as_deref().map(parse_note) {
        Some(Some(note)) => Some(note),
        Some(None) => {
            errors.add("note", rule("range", NOTE_OUT_OF_RANGE));
            None
        }
        None => None,
    };

    Selections { category, note }
}

fn parse_note(raw: &str) -> Option<u8> {
    raw.trim().parse::<u8>().ok().filter(|note| *note <= MAX_NOTE)
}

fn derive_errors(form: &AdvertForm) -> ValidationErrors {
    match form.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    }
}

/// Validate an "add" submission and build the record to insert.
///
/// The URL must not already be in `store`. `today` becomes the record date.
pub fn build_from_input(
    form: &AdvertForm,
    store: &RecordStore,
    today: NaiveDate,
) -> Result<JobAdvertRecord, Vec<FieldError>> {
    let mut errors = derive_errors(form);
    let selections = check_selections(form, &mut errors);

    if !form.url.is_empty() && store.contains(&form.url) {
        errors.add("url", rule("duplicate", URL_TAKEN));
    }

    match selections {
        Selections {
            category: Some(category),
            note: Some(note),
        } if errors.is_empty() => Ok(JobAdvertRecord {
            url: form.url.clone(),
            category,
            cons: form.cons.clone(),
            date: today,
            desc: form.desc.clone(),
            note,
            organization: form.organization.clone(),
            pros: form.pros.clone(),
            title: form.title.clone(),
        }),
        _ => Err(collect_field_errors(&errors, &FIELD_ORDER)),
    }
}

/// Validate an "edit" submission.
///
/// The form's URL only names the target record, so it is neither checked
/// nor part of the returned changes. The date is never touched.
pub fn build_changes_from_input(form: &AdvertForm) -> Result<AdvertChanges, Vec<FieldError>> {
    let mut errors = derive_errors(form);
    let selections = check_selections(form, &mut errors);

    let field_errors: Vec<FieldError> = collect_field_errors(&errors, &FIELD_ORDER)
        .into_iter()
        .filter(|e| e.field != "url")
        .collect();

    match selections {
        Selections {
            category: Some(category),
            note: Some(note),
        } if field_errors.is_empty() => Ok(AdvertChanges {
            category: Some(category),
            organization: Some(form.organization.clone()),
            title: Some(form.title.clone()),
            note: Some(note),
            pros: Some(form.pros.clone()),
            cons: Some(form.cons.clone()),
            desc: Some(form.desc.clone()),
        }),
        _ => Err(field_errors),
    }
}

/// Fill a form from a stored record, e.g. to pre-populate the edit view
pub fn populate_from_record(record: &JobAdvertRecord) -> AdvertForm {
    AdvertForm {
        category: Some(record.category.label().to_string()),
        organization: record.organization.clone(),
        url: record.url.clone(),
        title: record.title.clone(),
        note: Some(record.note.to_string()),
        pros: record.pros.clone(),
        cons: record.cons.clone(),
        desc: record.desc.clone(),
    }
}
