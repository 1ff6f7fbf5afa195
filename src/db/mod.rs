pub mod models;
pub mod record_store;

pub use models::{AdvertChanges, Category, JobAdvertRecord};
pub use record_store::{RecordStore, StoreError};
