pub mod advert;
pub mod validation;
