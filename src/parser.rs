// 🏗️ Dataset Parsers - DOAJ CSV and Scimago JSON
//
// Raw rows are loosely typed ("Yes"/"No" booleans, ", "-joined language lists,
// blank quartiles). Everything is normalized here, before any row reaches a store
// or an engine.

use crate::entities::{Journal, Quartile};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which open dataset a file comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceType {
    /// Directory of Open Access Journals export (CSV)
    Doaj,

    /// Scimago Journal Rank export (JSON)
    Scimago,
}

impl SourceType {
    pub fn name(&self) -> &str {
        match self {
            SourceType::Doaj => "DOAJ",
            SourceType::Scimago => "Scimago",
        }
    }
}

/// One Scimago journal entry, normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ScimagoRecord {
    pub identifiers: Vec<String>,
    pub categories: Vec<ScimagoCategory>,
    pub areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScimagoCategory {
    pub id: String,
    pub quartile: Option<Quartile>,
}

/// DatasetParser - one implementation per source format
pub trait DatasetParser {
    type Record;

    /// Parse a file into normalized records; rows that cannot be normalized are skipped
    fn parse(&self, file_path: &Path) -> Result<Vec<Self::Record>>;

    fn source_type(&self) -> SourceType;

    /// Parser version (logged with each upload)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

// ============================================================================
// SOURCE DETECTION
// ============================================================================

/// Detect the dataset from the file extension
pub fn detect_source(file_path: &Path) -> Result<SourceType> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(SourceType::Doaj),
        "json" => Ok(SourceType::Scimago),
        _ => Err(Error::InvalidInput(format!(
            "cannot tell dataset type of {} (expected .csv or .json)",
            file_path.display()
        ))),
    }
}

// ============================================================================
// FIELD NORMALIZATION
// ============================================================================

/// "Yes"/"No" style flag; blank means no
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" | "" => Ok(false),
        other => Err(Error::InvalidInput(format!("not a yes/no value: '{}'", other))),
    }
}

/// Split a comma-joined language list ("English, French")
pub fn split_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// DOAJ CSV
// ============================================================================

#[derive(Debug, Deserialize)]
struct DoajRow {
    #[serde(rename = "Journal title")]
    title: String,

    #[serde(rename = "Journal ISSN (print version)", default)]
    issn: String,

    #[serde(rename = "Journal EISSN (online version)", default)]
    eissn: String,

    #[serde(rename = "Languages in which the journal accepts manuscripts", default)]
    languages: String,

    #[serde(rename = "Publisher", default)]
    publisher: String,

    #[serde(rename = "DOAJ Seal", default)]
    seal: String,

    #[serde(rename = "Journal license", default)]
    license: String,

    #[serde(rename = "APC", default)]
    apc: String,
}

impl DoajRow {
    fn into_journal(self) -> Result<Journal> {
        let journal = Journal::from_issns(&self.issn, &self.eissn, self.title)?
            .with_languages(split_languages(&self.languages))
            .with_publisher(Some(self.publisher))
            .with_license(self.license)
            .with_seal(parse_flag(&self.seal)?)
            .with_apc(parse_flag(&self.apc)?);
        Ok(journal)
    }
}

pub struct DoajParser;

impl DoajParser {
    pub fn new() -> Self {
        DoajParser
    }

    /// Parse DOAJ rows from any reader (header row required)
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<Journal>> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut journals = Vec::new();

        for (index, result) in rdr.deserialize::<DoajRow>().enumerate() {
            // Header is line 1
            let line_number = index + 2;
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable DOAJ line {}: {}", line_number, e);
                    continue;
                }
            };

            match row.into_journal() {
                Ok(journal) => journals.push(journal),
                Err(e) => warn!("Skipping DOAJ line {}: {}", line_number, e),
            }
        }

        debug!("Parsed {} DOAJ journals", journals.len());
        Ok(journals)
    }
}

impl Default for DoajParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetParser for DoajParser {
    type Record = Journal;

    fn parse(&self, file_path: &Path) -> Result<Vec<Journal>> {
        let file = File::open(file_path)?;
        self.parse_reader(file)
    }

    fn source_type(&self) -> SourceType {
        SourceType::Doaj
    }
}

// ============================================================================
// SCIMAGO JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawScimagoRecord {
    #[serde(default)]
    identifiers: Vec<String>,

    #[serde(default)]
    categories: Vec<RawScimagoCategory>,

    #[serde(default)]
    areas: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawScimagoCategory {
    id: String,

    #[serde(default)]
    quartile: Option<String>,
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|v| v == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

impl RawScimagoRecord {
    fn normalize(self) -> Result<ScimagoRecord> {
        let identifiers = clean_list(self.identifiers);
        if identifiers.is_empty() {
            return Err(Error::InvalidEntity("record has no ISSN".to_string()));
        }

        let mut categories: Vec<ScimagoCategory> = Vec::new();
        for raw in self.categories {
            let id = raw.id.trim();
            if id.is_empty() {
                continue;
            }
            let category = ScimagoCategory {
                id: id.to_string(),
                quartile: Quartile::parse_optional(raw.quartile.as_deref())?,
            };
            if !categories.contains(&category) {
                categories.push(category);
            }
        }

        Ok(ScimagoRecord {
            identifiers,
            categories,
            areas: clean_list(self.areas),
        })
    }
}

pub struct ScimagoParser;

impl ScimagoParser {
    pub fn new() -> Self {
        ScimagoParser
    }

    /// Parse a Scimago JSON array
    pub fn parse_str(&self, content: &str) -> Result<Vec<ScimagoRecord>> {
        let raw: Vec<RawScimagoRecord> = serde_json::from_str(content)?;
        let mut records = Vec::with_capacity(raw.len());

        for (index, entry) in raw.into_iter().enumerate() {
            match entry.normalize() {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping Scimago entry {}: {}", index, e),
            }
        }

        debug!("Parsed {} Scimago records", records.len());
        Ok(records)
    }
}

impl Default for ScimagoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetParser for ScimagoParser {
    type Record = ScimagoRecord;

    fn parse(&self, file_path: &Path) -> Result<Vec<ScimagoRecord>> {
        let content = std::fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }

    fn source_type(&self) -> SourceType {
        SourceType::Scimago
    }
}

// ============================================================================
// TESTS
// ============================================================================
