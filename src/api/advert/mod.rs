pub mod dto;
pub mod mapper;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use models::AdvertForm;
pub use service::{AdvertService, ServiceError};
