//! Per-page record transforms, run on each page's rows before they join the table

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::error::ScrapeError;
use crate::models::{Education, ProfileRecord};

/// Job titles appended to names on the directory pages. Removed in this order,
/// so longer phrases sharing a word come before their parts.
const JOB_TITLES: &[&str] = &[
    "Chief",
    "Director",
    "Diplomate",
    "Senior Investigator",
    "Facility Veterinarian",
    "FRCPA Staff Clinician",
    "FRCPA",
    "Diplomate ACLAM",
    "ACLAM",
    "FAAAAI",
    "Acting",
    "Associate",
    "Staff Clinician",
];

const PUNCTUATION: &[&str] = &[";", ",", "."];

static CREDENTIAL_PATTERNS: Lazy<Vec<(Education, Regex)>> = Lazy::new(|| {
    Education::CREDENTIALS
        .iter()
        .map(|&edu| {
            let pattern = format!(r"\b{}\b", regex::escape(edu.as_str()));
            (edu, Regex::new(&pattern).expect("credential pattern is valid"))
        })
        .collect()
});

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse whitespace runs to one space and trim
pub fn squash_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Remove exact duplicate rows, keeping the first occurrence
pub fn dedup_rows(rows: Vec<ProfileRecord>) -> Vec<ProfileRecord> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Drop rows whose section names several sections at once ("Unit A, Unit B")
pub fn normalize_section(rows: Vec<ProfileRecord>) -> Vec<ProfileRecord> {
    rows.into_iter()
        .filter(|row| {
            let keep = !row.section.contains(',');
            if !keep {
                log::debug!("Dropping multi-section row {:?} / {:?}", row.name, row.section);
            }
            keep
        })
        .collect()
}

/// Pull credentials out of `name`, in vocabulary order, returning the cleaned
/// name and every credential found
pub fn split_credentials(name: &str) -> (String, Vec<Education>) {
    let mut name = name.to_string();
    let mut found = Vec::new();

    for (edu, pattern) in CREDENTIAL_PATTERNS.iter() {
        if pattern.is_match(&name) {
            name = squash_whitespace(&pattern.replace_all(&name, ""));
            found.push(*edu);
        }
    }

    (name, found)
}

/// Move education credentials from the name into the `education` field.
///
/// Job titles and punctuation are stripped first. The first credential found
/// on a row is assigned to it; each further credential forks a copy of the row
/// carrying that credential. Rows without one get [`Education::Other`]. The
/// output never has fewer rows than the input, except where the cleanup turns
/// two rows into exact duplicates or leaves a name empty.
pub fn normalize_education(rows: Vec<ProfileRecord>) -> Vec<ProfileRecord> {
    let mut out = Vec::with_capacity(rows.len());

    for mut row in rows {
        let mut name = row.name.clone();
        for title in JOB_TITLES.iter().chain(PUNCTUATION) {
            name = name.replace(title, "");
        }

        let (name, credentials) = split_credentials(name.trim());
        row.name = squash_whitespace(&PARENTHETICAL.replace_all(&name, ""));
        row.section = squash_whitespace(&row.section);

        if row.name.is_empty() {
            log::warn!("Dropping row with no name left in section {:?}", row.section);
            continue;
        }

        match credentials.split_first() {
            None => out.push(row.with_education(Education::Other)),
            Some((first, rest)) => {
                let forks: Vec<ProfileRecord> = rest
                    .iter()
                    .map(|&edu| row.clone().with_education(edu))
                    .collect();
                out.push(row.with_education(*first));
                out.extend(forks);
            }
        }
    }

    dedup_rows(out)
}

/// Set the branch of one page's rows.
///
/// A page listing several researchers shares its heading as the branch. A
/// single-researcher page has no separate branch, so the row's own section is
/// used.
pub fn assign_branch(
    rows: &mut [ProfileRecord],
    heading: Option<&str>,
    page: &str,
) -> Result<(), ScrapeError> {
    match rows.len() {
        0 => Err(ScrapeError::EmptyPageError(page.to_string())),
        1 => {
            let single = &mut rows[0];
            single.branch = Some(single.section.clone());
            Ok(())
        }
        _ => {
            let heading = heading
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .ok_or_else(|| {
                    ScrapeError::ExtractionError(format!("page {} has no heading to use as branch", page))
                })?;

            for row in rows.iter_mut() {
                row.branch = Some(heading.to_string());
            }
            Ok(())
        }
    }
}
