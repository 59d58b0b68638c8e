/// Scripted stand-in for a browser tab
/// Serves a directory root page and one profile page per anchor selector
use rust_lab_scraper::browser::{BrowserError, PageSession};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;

pub const ROOT_URL: &str = "https://directory.test/labs";

#[derive(Default)]
pub struct ScriptedSession {
    pages: HashMap<String, String>,
    /// Remaining `wait_clickable` failures per anchor selector
    click_failures: HashMap<String, u32>,
    /// Pages served as unreadable this many times before their real HTML
    blank_reads: HashMap<String, u32>,
    current: Option<String>,
    current_anchor: Option<String>,
    pub loads: usize,
    pub clicks: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, anchor: &str, html: &str) -> Self {
        self.pages.insert(anchor.to_string(), html.to_string());
        self
    }

    pub fn failing_clicks(mut self, anchor: &str, times: u32) -> Self {
        self.click_failures.insert(anchor.to_string(), times);
        self
    }

    pub fn blank_reads(mut self, anchor: &str, times: u32) -> Self {
        self.blank_reads.insert(anchor.to_string(), times);
        self
    }

    fn root_html(&self) -> String {
        let links: String = self
            .pages
            .keys()
            .map(|a| format!("<a id=\"{}\" href=\"#\">link</a>", a.trim_start_matches('#')))
            .collect();
        format!("<html><body>{}</body></html>", links)
    }
}

impl PageSession for ScriptedSession {
    fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        self.loads += 1;
        if url != ROOT_URL {
            return Err(BrowserError::NavigationError(format!("unknown url {}", url)));
        }
        self.current = Some(self.root_html());
        self.current_anchor = None;
        Ok(())
    }

    fn wait_clickable(&mut self, selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        if self.current_anchor.is_some() || !self.pages.contains_key(selector) {
            return Err(BrowserError::Timeout(selector.to_string()));
        }
        if let Some(remaining) = self.click_failures.get_mut(selector) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::NotClickable(selector.to_string()));
            }
        }
        Ok(())
    }

    fn wait_present(&mut self, selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        let html = self
            .current
            .as_deref()
            .ok_or_else(|| BrowserError::HtmlExtractionError("nothing loaded".to_string()))?;
        let selector = Selector::parse(selector)
            .map_err(|e| BrowserError::ElementNotFound(format!("{:?}", e)))?;

        if Html::parse_document(html).select(&selector).next().is_some() {
            Ok(())
        } else {
            Err(BrowserError::Timeout("layout never appeared".to_string()))
        }
    }

    fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let page = self
            .pages
            .get(selector)
            .cloned()
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))?;
        self.clicks.push(selector.to_string());
        self.current = Some(page);
        self.current_anchor = Some(selector.to_string());
        Ok(())
    }

    fn html(&mut self) -> Result<String, BrowserError> {
        if let Some(anchor) = &self.current_anchor {
            if let Some(remaining) = self.blank_reads.get_mut(anchor) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok("<html><body></body></html>".to_string());
                }
            }
        }
        self.current
            .clone()
            .ok_or_else(|| BrowserError::HtmlExtractionError("nothing loaded".to_string()))
    }
}

/// Multi-researcher page in the directory's markup
#[allow(dead_code)]
pub fn multi_page(heading: &str, researchers: &[&str], sections: &[&str]) -> String {
    let items = |entries: &[&str]| -> String {
        entries
            .iter()
            .map(|e| format!("<li>{}</li>", e.replace('\n', "<br>")))
            .collect()
    };
    format!(
        r#"<html><body><h1>{}</h1>
        <div class="block block-field-blocknodedivisionfield-subtopic-division">
          <div class="field field--name-field-body field__item"><ul>{}</ul></div>
          <ul>{}</ul>
        </div></body></html>"#,
        heading,
        items(researchers),
        items(sections)
    )
}

#[allow(dead_code)]
pub fn single_page(name: &str, section: &str) -> String {
    format!(
        r#"<html><body><h1>{}</h1><div id="anch_346"><p>{}</p></div></body></html>"#,
        name, section
    )
}
