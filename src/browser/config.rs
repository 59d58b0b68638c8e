use serde::Deserialize;
use std::time::Duration;

/// Configuration for the browser instance driving the scrape
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Browser window size
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// Run Chrome with its sandbox disabled
    #[serde(default = "default_true")]
    pub no_sandbox: bool,

    #[serde(default = "default_true")]
    pub ignore_certificate_errors: bool,

    #[serde(default = "default_true")]
    pub disable_extensions: bool,

    #[serde(default = "default_true")]
    pub start_maximized: bool,

    /// Page the first tab opens before any navigation
    #[serde(default = "default_home_page")]
    pub home_page: String,

    /// Seconds the browser may sit idle before Chrome is considered hung
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Additional Chrome flags
    #[serde(default)]
    pub chrome_flags: Vec<String>,
}

fn default_true() -> bool { true }
fn default_window_size() -> (u32, u32) { (1920, 1080) }
fn default_home_page() -> String { "about:blank".to_string() }
fn default_idle_timeout() -> u64 { 300 }

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: default_window_size(),
            no_sandbox: true,
            ignore_certificate_errors: true,
            disable_extensions: true,
            start_maximized: true,
            home_page: default_home_page(),
            idle_timeout_secs: default_idle_timeout(),
            chrome_flags: vec![],
        }
    }
}

impl BrowserConfig {
    /// Flags passed to Chrome on top of what `LaunchOptions` sets directly
    pub fn launch_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.disable_extensions {
            flags.push("--disable-extensions".to_string());
        }
        if self.start_maximized {
            flags.push("--start-maximized".to_string());
        }
        flags.extend(self.chrome_flags.iter().cloned());
        flags
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
