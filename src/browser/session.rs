use super::manager::BrowserError;
use headless_chrome::Tab;
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The browser capabilities the scraper needs.
///
/// Every call reads or changes the session's current page, so navigation and
/// extraction must be issued one after another on the same `&mut` session.
pub trait PageSession {
    /// Load `url` and wait for the navigation to finish
    fn load(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Wait until an element matching `selector` is rendered and can receive a click
    fn wait_clickable(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Wait until an element matching `selector` is present in the DOM
    fn wait_present(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Serialized HTML of the current page
    fn html(&mut self) -> Result<String, BrowserError>;
}

/// `PageSession` backed by a headless Chrome tab
pub struct TabSession {
    tab: Arc<Tab>,
}

impl TabSession {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    fn poll_until<F>(&self, selector: &str, timeout: Duration, mut ready: F) -> Result<(), BrowserError>
    where
        F: FnMut(&Tab) -> bool,
    {
        let start = Instant::now();

        loop {
            if ready(self.tab.as_ref()) {
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout(format!(
                    "{} after {:?}",
                    selector, timeout
                )));
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl PageSession for TabSession {
    fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        log::debug!("Loading {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationError(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationError(format!("Navigation timeout for {}: {}", url, e)))?;

        Ok(())
    }

    fn wait_clickable(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        // A box model only exists once the element is laid out and visible
        self.poll_until(selector, timeout, |tab| {
            tab.find_element(selector)
                .map(|element| element.get_box_model().is_ok())
                .unwrap_or(false)
        })
    }

    fn wait_present(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.poll_until(selector, timeout, |tab| tab.find_element(selector).is_ok())
    }

    fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .map_err(|e| BrowserError::NotClickable(format!("{}: {}", selector, e)))?;

        Ok(())
    }

    fn html(&mut self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::HtmlExtractionError(e.to_string()))
    }
}
