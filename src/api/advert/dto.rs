use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::{Category, JobAdvertRecord};

/// Column a listing can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    Category,
    Organization,
    Note,
    Date,
    #[default]
    Url,
    Title,
}

/// One line of the browse list: the columns shown for each advert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvertRow {
    pub category: Category,
    pub organization: String,
    pub note: u8,
    pub date: NaiveDate,
    pub url: String,
    pub title: String,
}

impl From<&JobAdvertRecord> for AdvertRow {
    fn from(record: &JobAdvertRecord) -> Self {
        Self {
            category: record.category,
            organization: record.organization.clone(),
            note: record.note,
            date: record.date,
            url: record.url.clone(),
            title: record.title.clone(),
        }
    }
}

impl AdvertRow {
    /// Sort rows on `key`, ties broken by URL
    pub fn sort(rows: &mut [AdvertRow], key: SortKey, reverse: bool) {
        rows.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Category => a.category.label().cmp(b.category.label()),
                SortKey::Organization => a.organization.cmp(&b.organization),
                SortKey::Note => a.note.cmp(&b.note),
                SortKey::Date => a.date.cmp(&b.date),
                SortKey::Url => std::cmp::Ordering::Equal,
                SortKey::Title => a.title.cmp(&b.title),
            }
            .then_with(|| a.url.cmp(&b.url));

            if reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}
