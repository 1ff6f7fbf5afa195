use std::fmt;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use super::dto::{AdvertRow, SortKey};
use super::mapper::{build_changes_from_input, build_from_input, populate_from_record};
use super::models::{AdvertForm, URL_TAKEN};
use crate::api::validation::{combined_message, FieldError};
use crate::db::models::JobAdvertRecord;
use crate::db::record_store::{RecordStore, StoreError};

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// The submitted form broke one or more rules
    Validation(Vec<FieldError>),

    /// The store could not be written
    Store(StoreError),

    /// No advert with this URL
    NotFound(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(errors) => write!(f, "{}", combined_message(errors)),
            ServiceError::Store(e) => write!(f, "Storage error: {}", e),
            ServiceError::NotFound(url) => write!(f, "Job advert not found: {}", url),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // Reported like any other form error in the add flow
            StoreError::DuplicateKey(_) => ServiceError::Validation(vec![FieldError {
                field: "url".to_string(),
                message: URL_TAKEN.to_string(),
            }]),
            StoreError::NotFound(url) => ServiceError::NotFound(url),
            other => ServiceError::Store(other),
        }
    }
}

/// Advert service containing the add/edit/browse logic
pub struct AdvertService {
    store: RecordStore,
}

impl AdvertService {
    /// Create a new AdvertService over an opened store
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Add a job advert dated today
    pub fn add(&mut self, form: &AdvertForm) -> Result<&JobAdvertRecord, ServiceError> {
        self.add_on(form, Local::now().date_naive())
    }

    /// Add a job advert
    ///
    /// # Business Logic
    /// - Validates the whole form, collecting every violation
    /// - Rejects URLs already in the store
    /// - Inserts the record and rewrites the backing file
    pub fn add_on(&mut self, form: &AdvertForm, today: NaiveDate) -> Result<&JobAdvertRecord, ServiceError> {
        info!("Service: Adding job advert url={}", form.url);

        let record = build_from_input(form, &self.store, today).map_err(|errors| {
            warn!("Service: Validation failed for job advert: {}", form.url);
            ServiceError::Validation(errors)
        })?;

        let record = self.store.insert(record)?;

        info!("Service: Job advert added: url={}", record.url);
        Ok(record)
    }

    /// Apply an edit form to the advert stored at `url`.
    /// The advert keeps its URL and date whatever the form holds.
    pub fn edit(&mut self, url: &str, form: &AdvertForm) -> Result<&JobAdvertRecord, ServiceError> {
        info!("Service: Editing job advert url={}", url);

        if !self.store.contains(url) {
            warn!("Service: Job advert not found: {}", url);
            return Err(ServiceError::NotFound(url.to_string()));
        }

        let changes = build_changes_from_input(form).map_err(|errors| {
            warn!("Service: Validation failed for job advert edit: {}", url);
            ServiceError::Validation(errors)
        })?;

        let record = self.store.update(url, changes)?;

        info!("Service: Job advert updated: url={}", url);
        Ok(record)
    }

    /// Form pre-filled from the stored advert, if any
    pub fn form_for(&self, url: &str) -> Option<AdvertForm> {
        self.store.get(url).map(populate_from_record)
    }

    /// Browse list rows, sorted on `key`
    pub fn list(&self, key: SortKey, reverse: bool) -> Vec<AdvertRow> {
        let mut rows: Vec<AdvertRow> = self.store.records().map(AdvertRow::from).collect();
        AdvertRow::sort(&mut rows, key, reverse);
        rows
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Category;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 6, d).unwrap()
    }

    fn form(url: &str, category: &str, organization: &str, note: &str) -> AdvertForm {
        AdvertForm {
            category: Some(category.to_string()),
            organization: organization.to_string(),
            url: url.to_string(),
            title: "Researcher".to_string(),
            note: Some(note.to_string()),
            pros: "good".to_string(),
            cons: String::new(),
            desc: String::new(),
        }
    }

    fn service(temp_dir: &TempDir) -> AdvertService {
        AdvertService::new(RecordStore::open(temp_dir.path().join("job_adverts.json")))
    }

    #[test]
    fn add_then_reject_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);

        service
            .add_on(&form("http://x/jobs/1", "PostDoc", "Acme", "4"), day(1))
            .unwrap();
        let err = service
            .add_on(&form("http://x/jobs/1", "Company", "Other", "1"), day(2))
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(ref errors) if errors[0].message == URL_TAKEN));
        let stored = service.store().get("http://x/jobs/1").unwrap();
        assert_eq!(stored.organization, "Acme");
        assert_eq!(stored.date, day(1));
    }

    #[test]
    fn add_uses_todays_date() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);

        let before = Local::now().date_naive();
        let date = service
            .add(&form("http://x/jobs/1", "PostDoc", "Acme", "4"))
            .unwrap()
            .date;
        let after = Local::now().date_naive();

        assert!(before <= date && date <= after);
    }

    #[test]
    fn invalid_form_is_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);

        let err = service
            .add_on(&form("http://x/jobs/1", "PostDoc", "Acme", "8"), day(1))
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(service.store().is_empty());
        assert!(!temp_dir.path().join("job_adverts.json").exists());
    }

    #[test]
    fn edit_keeps_url_and_date() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);
        service
            .add_on(&form("http://x/jobs/1", "PostDoc", "Acme", "4"), day(1))
            .unwrap();

        let mut edited = service.form_for("http://x/jobs/1").unwrap();
        edited.url = "http://elsewhere".to_string();
        edited.category = Some("Company".to_string());
        edited.note = Some("2".to_string());

        let record = service.edit("http://x/jobs/1", &edited).unwrap().clone();

        assert_eq!(record.url, "http://x/jobs/1");
        assert_eq!(record.date, day(1));
        assert_eq!(record.category, Category::Company);
        assert_eq!(record.note, 2);
        assert!(!service.store().contains("http://elsewhere"));
    }

    #[test]
    fn edit_of_unknown_url_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);

        let err = service
            .edit("http://nowhere", &form("http://nowhere", "PostDoc", "Acme", "4"))
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn list_sorts_on_requested_column() {
        let temp_dir = TempDir::new().unwrap();
        let mut service = service(&temp_dir);
        service.add_on(&form("http://a", "PostDoc", "Zeta", "1"), day(3)).unwrap();
        service.add_on(&form("http://b", "Company", "Acme", "5"), day(1)).unwrap();
        service.add_on(&form("http://c", "PostDoc", "Mid", "3"), day(2)).unwrap();

        let urls = |rows: Vec<AdvertRow>| rows.into_iter().map(|r| r.url).collect::<Vec<_>>();

        assert_eq!(urls(service.list(SortKey::Url, false)), vec!["http://a", "http://b", "http://c"]);
        assert_eq!(urls(service.list(SortKey::Organization, false)), vec!["http://b", "http://c", "http://a"]);
        assert_eq!(urls(service.list(SortKey::Note, true)), vec!["http://b", "http://c", "http://a"]);
        assert_eq!(urls(service.list(SortKey::Date, false)), vec!["http://b", "http://c", "http://a"]);
        assert_eq!(urls(service.list(SortKey::Category, false)), vec!["http://b", "http://a", "http://c"]);
    }
}
