//! Scrape orchestration: visit every anchor, build the table, then reconcile.
//!
//! Stage order matters and is fixed here:
//! 1. per page: navigate → extract → drop multi-section rows → split out
//!    education → assign branch
//! 2. whole table: reconcile names (sorts descending first) → reconcile
//!    sections (needs final branches) → finalize

use indicatif::{ProgressBar, ProgressStyle};

use crate::browser::PageSession;
use crate::config::{Config, Corrections, ReconcilePolicy};
use crate::error::ScrapeError;
use crate::extractor;
use crate::models::{ProfileRecord, ResultTable};
use crate::navigator;
use crate::normalizer::{self, dedup_rows, squash_whitespace};
use crate::reconciler;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages: usize,
    /// Navigation attempts beyond the first, summed over all pages
    pub navigation_retries: u32,
    pub dropped_multi_section: usize,
    pub rows: usize,
}

pub struct Pipeline<'a, S: PageSession> {
    session: &'a mut S,
    config: &'a Config,
    stats: RunStats,
}

impl<'a, S: PageSession> Pipeline<'a, S> {
    pub fn new(session: &'a mut S, config: &'a Config) -> Self {
        Self {
            session,
            config,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Scrape every configured page and return the reconciled table.
    ///
    /// Any fatal page error aborts the run and the partial table is dropped.
    pub fn run(&mut self) -> Result<ResultTable, ScrapeError> {
        self.config.validate()?;

        let anchors = self.config.site.anchors();
        let progress = self.progress_bar(anchors.len() as u64);
        let mut rows = Vec::new();

        for anchor in anchors {
            progress.set_message(self.config.site.anchor_selector(anchor));
            match self.scrape_page(anchor) {
                Ok(page_rows) => rows.extend(page_rows),
                Err(e) => {
                    progress.abandon();
                    log::error!("Aborting run at anchor {}: {}", anchor, e);
                    return Err(e);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let table = reconcile(rows, &self.config.corrections, &self.config.reconcile);
        self.stats.rows = table.len();

        log::info!(
            "Scraped {} pages ({} navigation retries, {} multi-section rows dropped) into {} rows",
            self.stats.pages,
            self.stats.navigation_retries,
            self.stats.dropped_multi_section,
            self.stats.rows
        );

        Ok(table)
    }

    /// Navigate to one anchor and return its normalized rows with branches set
    pub fn scrape_page(&mut self, anchor: u32) -> Result<Vec<ProfileRecord>, ScrapeError> {
        let config = self.config;
        let site = &config.site;
        let selector = site.anchor_selector(anchor);

        let attempts = navigator::navigate(&mut *self.session, &site.url, &selector, &config.retry)?;
        self.stats.navigation_retries += attempts - 1;

        let page = extractor::extract(&mut *self.session, &site.layout, &config.retry)?;
        log::info!(
            "{}: {:?} layout, {} raw records",
            selector,
            page.layout,
            page.records.len()
        );

        let raw_count = page.records.len();
        let rows = normalizer::normalize_section(page.records);
        self.stats.dropped_multi_section += raw_count - rows.len();

        let mut rows = normalizer::normalize_education(rows);
        normalizer::assign_branch(&mut rows, page.heading.as_deref(), &selector)?;

        self.stats.pages += 1;
        Ok(rows)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.output.show_progress {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::with_template("{msg:12} [{bar:40}] {pos}/{len} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        ProgressBar::new(len).with_style(style)
    }
}

/// Run the whole-table passes on accumulated page rows
pub fn reconcile(
    rows: Vec<ProfileRecord>,
    corrections: &Corrections,
    policy: &ReconcilePolicy,
) -> ResultTable {
    let mut rows = reconciler::reconcile_names(rows, corrections, policy);
    reconciler::reconcile_sections(&mut rows);
    finalize(rows)
}

/// Trim every column, collapse repeated spaces, sort by (Branch, Name) and
/// drop exact duplicates
pub fn finalize(rows: Vec<ProfileRecord>) -> ResultTable {
    let mut rows: Vec<ProfileRecord> = rows
        .into_iter()
        .map(|mut row| {
            row.name = squash_whitespace(&row.name);
            row.section = squash_whitespace(&row.section);
            row.branch = row.branch.map(|b| squash_whitespace(&b));
            row
        })
        .collect();

    rows.sort_by(|a, b| (&a.branch, &a.name).cmp(&(&b.branch, &b.name)));

    dedup_rows(rows).into_iter().collect()
}
