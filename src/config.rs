use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::BrowserConfig;
use crate::error::ScrapeError;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
    #[serde(default)]
    pub corrections: Corrections,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the directory lives and how its pages are laid out
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory root every profile page is reached from
    #[serde(default = "default_url")]
    pub url: String,

    /// First anchor id to visit (inclusive)
    #[serde(default = "default_anchor_start")]
    pub anchor_start: u32,

    /// Last anchor id to visit (exclusive)
    #[serde(default = "default_anchor_end")]
    pub anchor_end: u32,

    /// Element id prefix; anchor `n` is the element `#{prefix}{n}`
    #[serde(default = "default_anchor_prefix")]
    pub anchor_prefix: String,

    #[serde(default)]
    pub layout: LayoutAnchors,
}

/// CSS selectors locating the content blocks of both page layouts
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LayoutAnchors {
    /// Container listing every researcher and section entry (multi-researcher pages)
    #[serde(default = "default_full_list")]
    pub full_list: String,

    /// Container listing only the researcher entries (multi-researcher pages)
    #[serde(default = "default_subset_list")]
    pub subset_list: String,

    /// Page heading; the researcher name on single pages, the branch otherwise
    #[serde(default = "default_heading")]
    pub heading: String,

    /// Labelled section block on single-researcher pages
    #[serde(default = "default_single_section")]
    pub single_section: String,
}

/// Bounds for every wait-and-retry loop
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds to wait for an element before an attempt counts as failed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// What to do with a single-character final name token such as "Smith J"
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrailingInitial {
    #[default]
    Strip,
    Keep,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Leading characters two last names must share to be treated as one spelling
    #[serde(default = "default_last_name_prefix")]
    pub last_name_prefix: usize,

    #[serde(default)]
    pub trailing_initial: TrailingInitial,
}

/// Hand-curated exact-match name fixes, applied at fixed reconciliation stages
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Corrections {
    /// Applied right after sorting, before middle names are compared
    #[serde(default = "default_first_names")]
    pub first_names: BTreeMap<String, String>,

    /// Applied after the middle-name pass
    #[serde(default = "default_middle_names")]
    pub middle_names: BTreeMap<String, String>,

    /// Applied last, after last names are repaired
    #[serde(default = "default_full_names")]
    pub full_names: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Draw a progress bar over the anchor range
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

fn default_true() -> bool { true }
fn default_url() -> String {
    "https://www.niaid.nih.gov/research/division-intramural-research-labs".to_string()
}
fn default_anchor_start() -> u32 { 354 }
fn default_anchor_end() -> u32 { 374 }
fn default_anchor_prefix() -> String { "anch_".to_string() }
fn default_full_list() -> String {
    ".block-field-blocknodedivisionfield-subtopic-division".to_string()
}
fn default_subset_list() -> String { ".field--name-field-body.field__item".to_string() }
fn default_heading() -> String { "h1".to_string() }
fn default_single_section() -> String { "#anch_346".to_string() }
fn default_max_attempts() -> u32 { 3 }
fn default_timeout_secs() -> u64 { 12 }
fn default_last_name_prefix() -> usize { 2 }
fn default_output_path() -> PathBuf { PathBuf::from("niaid-dir-org.csv") }

fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

fn default_first_names() -> BTreeMap<String, String> {
    pairs(&[
        ("Beth Fischer", "Elizabeth Fischer"),
        ("David Hackstadt", "Ted Hackstadt"),
    ])
}

fn default_middle_names() -> BTreeMap<String, String> {
    pairs(&[
        ("Elizabeth Fischer", "Elizabeth R Fischer"),
        ("David Sacks", "David L Sacks"),
        ("Daniella Schwartz", "Daniella M Schwartz"),
        ("Richard Davey", "Richard T Davey"),
        ("Louis Miller", "Louis H Miller"),
        ("Catharine Bosio", "Catharine M Bosio"),
    ])
}

fn default_full_names() -> BTreeMap<String, String> {
    pairs(&[
        ("Jennifer M Cuellar-Rodriguez", "Jennifer M Cuellar-Rodríguez"),
        ("Sumati Ragagopalan", "Sumati Rajagopalan"),
    ])
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            anchor_start: default_anchor_start(),
            anchor_end: default_anchor_end(),
            anchor_prefix: default_anchor_prefix(),
            layout: LayoutAnchors::default(),
        }
    }
}

impl Default for LayoutAnchors {
    fn default() -> Self {
        Self {
            full_list: default_full_list(),
            subset_list: default_subset_list(),
            heading: default_heading(),
            single_section: default_single_section(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            last_name_prefix: default_last_name_prefix(),
            trailing_initial: TrailingInitial::default(),
        }
    }
}

impl Default for Corrections {
    fn default() -> Self {
        Self {
            first_names: default_first_names(),
            middle_names: default_middle_names(),
            full_names: default_full_names(),
        }
    }
}

impl Corrections {
    /// No corrections at all
    pub fn empty() -> Self {
        Self {
            first_names: BTreeMap::new(),
            middle_names: BTreeMap::new(),
            full_names: BTreeMap::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            show_progress: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            retry: RetryPolicy::default(),
            browser: BrowserConfig::default(),
            reconcile: ReconcilePolicy::default(),
            corrections: Corrections::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SiteConfig {
    /// Selector for the link behind anchor `n`
    pub fn anchor_selector(&self, n: u32) -> String {
        format!("#{}{}", self.anchor_prefix, n)
    }

    pub fn anchors(&self) -> std::ops::Range<u32> {
        self.anchor_start..self.anchor_end
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, ScrapeError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ScrapeError> {
        toml::from_str::<Config>(content).map_err(|e| ScrapeError::ConfigError(e.to_string()))
    }

    /// Reject settings the scrape cannot run with
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.site.url.trim().is_empty() {
            return Err(ScrapeError::ConfigError("site.url must not be empty".into()));
        }
        if self.site.anchor_start >= self.site.anchor_end {
            return Err(ScrapeError::ConfigError(format!(
                "anchor range {}..{} is empty",
                self.site.anchor_start, self.site.anchor_end
            )));
        }
        if self.retry.max_attempts < 1 {
            return Err(ScrapeError::ConfigError("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.timeout_secs < 1 {
            return Err(ScrapeError::ConfigError("retry.timeout_secs must be at least 1".into()));
        }
        if self.reconcile.last_name_prefix < 1 {
            return Err(ScrapeError::ConfigError(
                "reconcile.last_name_prefix must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
