use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Highest rating a job advert can be given
pub const MAX_NOTE: u8 = 5;

/// Category of a job advert
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    #[serde(rename = "Company", alias = "Entrprise")]
    Company,
    #[serde(rename = "Research-Engineer/Research-Intern", alias = "IR/IE")]
    ResearchEngineer,
    #[serde(rename = "PostDoc")]
    PostDoc,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Company, Category::ResearchEngineer, Category::PostDoc];

    /// Label shown to the user and written to the backing file
    pub fn label(self) -> &'static str {
        match self {
            Category::Company => "Company",
            Category::ResearchEngineer => "Research-Engineer/Research-Intern",
            Category::PostDoc => "PostDoc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a label matches none of the categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown category \"{}\".", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Company" | "Entrprise" => Ok(Category::Company),
            "Research-Engineer/Research-Intern" | "IR/IE" => Ok(Category::ResearchEngineer),
            "PostDoc" => Ok(Category::PostDoc),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// One job advert as stored in the backing file.
///
/// The URL is the key of the JSON object, so it is not serialized inside
/// the value; the store fills it in after loading. Fields are declared in
/// alphabetical order so the written document has sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobAdvertRecord {
    #[serde(skip)]
    pub url: String,
    pub category: Category,
    #[serde(default)]
    pub cons: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub desc: String,
    #[serde(with = "note_as_string")]
    pub note: u8,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub pros: String,
    #[serde(default)]
    pub title: String,
}

/// Fields an edit may change. There is no way to express a new `url` or `date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertChanges {
    pub category: Option<Category>,
    pub organization: Option<String>,
    pub title: Option<String>,
    pub note: Option<u8>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub desc: Option<String>,
}

impl AdvertChanges {
    pub fn apply_to(self, record: &mut JobAdvertRecord) {
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(organization) = self.organization {
            record.organization = organization;
        }
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(note) = self.note {
            record.note = note;
        }
        if let Some(pros) = self.pros {
            record.pros = pros;
        }
        if let Some(cons) = self.cons {
            record.cons = cons;
        }
        if let Some(desc) = self.desc {
            record.desc = desc;
        }
    }
}

/// The rating is written as a string ("4"); a bare integer is accepted on read.
mod note_as_string {
    use serde::de::{self, Deserializer, Unexpected};
    use serde::{Deserialize, Serializer};

    use super::MAX_NOTE;

    pub fn serialize<S>(note: &u8, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&note.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNote {
        Text(String),
        Number(i64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match RawNote::deserialize(deserializer)? {
            RawNote::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| de::Error::invalid_value(Unexpected::Str(&text), &"a rating between 0 and 5"))?,
            RawNote::Number(n) => n,
        };

        u8::try_from(value)
            .ok()
            .filter(|note| *note <= MAX_NOTE)
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Signed(value), &"a rating between 0 and 5"))
    }
}
