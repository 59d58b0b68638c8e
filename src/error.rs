use crate::browser::BrowserError;

/// Errors raised while scraping and normalizing the directory
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The anchor could not be reached after every attempt. Aborts the run.
    #[error("Navigation to anchor {anchor} failed after {attempts} attempts: {last_error}")]
    NavigationError {
        anchor: String,
        attempts: u32,
        last_error: String,
    },

    /// No known page layout was found. Aborts the run.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// A text block could not be split into fields. Logged and skipped by callers.
    #[error("Cannot split {text:?}: {reason}")]
    SplitError { text: String, reason: String },

    #[error("Page for anchor {0} produced no records")]
    EmptyPageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
