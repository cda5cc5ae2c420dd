pub mod capture_grant;
pub mod catalog_store;
pub mod encoder_backend;
