use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ScrapeError;

/// Output column order. Downstream consumers read the CSV positionally.
pub const COLUMNS: [&str; 4] = ["Name", "Education", "Branch", "Section"];

/// Education credentials recognized in researcher names.
///
/// Variants are listed in scan order: a longer token that shares a prefix with a
/// shorter one (`MSc` / `MS`, `MHSc` / `MHS`) comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Education {
    #[serde(rename = "MA")]
    Ma,
    #[serde(rename = "MSc")]
    MSc,
    #[serde(rename = "MS")]
    Ms,
    #[serde(rename = "MHSc")]
    MHSc,
    #[serde(rename = "MHS")]
    Mhs,
    #[serde(rename = "MPVM")]
    Mpvm,
    #[serde(rename = "MPH")]
    Mph,
    #[serde(rename = "MD")]
    Md,
    #[serde(rename = "ScD")]
    ScD,
    #[serde(rename = "DSc")]
    DSc,
    #[serde(rename = "DVM")]
    Dvm,
    #[serde(rename = "DPhil")]
    DPhil,
    #[serde(rename = "PhD")]
    PhD,
    #[serde(rename = "Dr rer nat")]
    DrRerNat,
    /// No credential listed on the page
    Other,
}

impl Education {
    /// Credential vocabulary in scan order (excludes `Other`)
    pub const CREDENTIALS: [Education; 14] = [
        Education::Ma,
        Education::MSc,
        Education::Ms,
        Education::MHSc,
        Education::Mhs,
        Education::Mpvm,
        Education::Mph,
        Education::Md,
        Education::ScD,
        Education::DSc,
        Education::Dvm,
        Education::DPhil,
        Education::PhD,
        Education::DrRerNat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Education::Ma => "MA",
            Education::MSc => "MSc",
            Education::Ms => "MS",
            Education::MHSc => "MHSc",
            Education::Mhs => "MHS",
            Education::Mpvm => "MPVM",
            Education::Mph => "MPH",
            Education::Md => "MD",
            Education::ScD => "ScD",
            Education::DSc => "DSc",
            Education::Dvm => "DVM",
            Education::DPhil => "DPhil",
            Education::PhD => "PhD",
            Education::DrRerNat => "Dr rer nat",
            Education::Other => "Other",
        }
    }
}

impl fmt::Display for Education {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One researcher row. `education` and `branch` are filled in by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileRecord {
    pub name: String,
    pub education: Option<Education>,
    pub branch: Option<String>,
    pub section: String,
}

impl ProfileRecord {
    pub fn new(name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            education: None,
            branch: None,
            section: section.into(),
        }
    }

    pub fn with_education(mut self, education: Education) -> Self {
        self.education = Some(education);
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Cells in `COLUMNS` order. A row never run through education
    /// normalization is written as `Other`.
    pub fn to_row(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.education.unwrap_or(Education::Other).as_str(),
            self.branch.as_deref().unwrap_or(""),
            self.section.as_str(),
        ]
    }
}

/// The accumulated researcher table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub rows: Vec<ProfileRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ProfileRecord>) {
        self.rows.extend(rows);
    }

    /// Write the table as CSV with a header row and no index column
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), ScrapeError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        wtr.write_record(COLUMNS)?;
        for row in &self.rows {
            wtr.write_record(row.to_row())?;
        }
        wtr.flush()?;

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ScrapeError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)?;
        log::info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

impl FromIterator<ProfileRecord> for ResultTable {
    fn from_iter<I: IntoIterator<Item = ProfileRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
