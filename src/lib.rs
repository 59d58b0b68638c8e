// Library interface for rust_lab_scraper
// The binary and the integration tests both drive the pipeline through these modules

pub mod browser;
pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod navigator;
pub mod normalizer;
pub mod pipeline;
pub mod reconciler;

pub use config::Config;
pub use error::ScrapeError;
pub use models::{Education, ProfileRecord, ResultTable};
pub use pipeline::Pipeline;
