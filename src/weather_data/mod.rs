pub mod cache;
pub mod data_extractor;
pub mod data_loader;
pub mod error;
pub mod fetch;
