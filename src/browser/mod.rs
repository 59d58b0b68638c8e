//! Browser automation for the directory scrape
//!
//! The scraper talks to the browser only through the [`PageSession`] trait.
//! [`TabSession`] implements it over a headless Chrome tab owned by a
//! [`BrowserManager`].
//!
//! # Example
//!
//! ```no_run
//! use rust_lab_scraper::browser::{BrowserConfig, BrowserManager, PageSession, TabSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BrowserManager::new(BrowserConfig::default())?;
//! let mut session = TabSession::new(manager.new_tab()?);
//!
//! session.load("https://example.com")?;
//! let html = session.html()?;
//!
//! println!("Extracted {} bytes of HTML", html.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;
pub mod session;

pub use config::BrowserConfig;
pub use manager::{BrowserError, BrowserManager};
pub use session::{PageSession, TabSession};
