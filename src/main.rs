use clap::Parser;
use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::PathBuf;

use rust_lab_scraper::browser::{BrowserManager, TabSession};
use rust_lab_scraper::config::{Config, DEFAULT_CONFIG_PATH};
use rust_lab_scraper::Pipeline;

/// Scrape the lab directory into a normalized researcher CSV
#[derive(Parser, Debug)]
#[command(name = "rust_lab_scraper", version)]
struct Cli {
    /// TOML configuration file; defaults are used when it does not exist
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First anchor id to visit
    #[arg(long)]
    start: Option<u32>,

    /// Anchor id to stop before
    #[arg(long)]
    end: Option<u32>,

    /// Run Chrome with a visible window
    #[arg(long)]
    show_browser: bool,

    #[arg(long)]
    no_progress: bool,
}

fn init_logging() {
    let Err(e) = log4rs::init_file("log4rs.yml", Default::default()) else {
        return;
    };

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();

    let fallback = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));

    match fallback {
        Ok(cfg) => {
            if log4rs::init_config(cfg).is_ok() {
                info!("log4rs.yml not loaded ({}), logging to console", e);
            }
        }
        Err(errs) => eprintln!("Failed to configure logging: {}", errs),
    }
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if cli.config.exists() {
        Config::from_path(&cli.config)?
    } else {
        info!("{} not found, using defaults", cli.config.display());
        Config::default()
    };

    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(start) = cli.start {
        config.site.anchor_start = start;
    }
    if let Some(end) = cli.end {
        config.site.anchor_end = end;
    }
    if cli.show_browser {
        config.browser.headless = false;
    }
    if cli.no_progress {
        config.output.show_progress = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    info!(
        "Scraping anchors {}..{} from {}",
        config.site.anchor_start, config.site.anchor_end, config.site.url
    );

    let manager = BrowserManager::new(config.browser.clone())?;
    let mut session = TabSession::new(manager.new_tab()?);

    let mut pipeline = Pipeline::new(&mut session, &config);
    let table = match pipeline.run() {
        Ok(table) => table,
        Err(e) => {
            error!("Scrape failed, no output written: {}", e);
            return Err(e.into());
        }
    };

    table.save(&config.output.path)?;
    Ok(())
}
