// Upload Handlers - dataset file -> store
//
// DOAJ CSV goes to the graph store as SPARQL INSERT DATA, batched.
// Scimago JSON goes to the relational store; the database file and schema are
// created on first upload, and re-uploading the same file writes nothing new.

use crate::db;
use crate::error::Result;
use crate::handlers::sparql::insert_journals;
use crate::handlers::{Handler, SparqlJournalHandler};
use crate::parser::{DatasetParser, DoajParser, ScimagoParser, SourceType};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// UPLOAD REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub source: SourceType,
    pub location: String,
    pub rows_read: usize,
    pub rows_written: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl UploadReport {
    pub fn summary(&self) -> String {
        format!(
            "{} upload to {}: {} read, {} written in {} ms",
            self.source.name(),
            self.location,
            self.rows_read,
            self.rows_written,
            (self.finished_at - self.started_at).num_milliseconds()
        )
    }
}

// ============================================================================
// RELATIONAL STORE (Scimago)
// ============================================================================

#[derive(Debug, Clone)]
pub struct CategoryUploadHandler {
    db_path: String,
}

impl CategoryUploadHandler {
    pub fn new(db_path: impl Into<String>) -> Self {
        CategoryUploadHandler {
            db_path: db_path.into(),
        }
    }

    pub fn set_location(&mut self, db_path: impl Into<String>) {
        self.db_path = db_path.into();
    }

    pub fn push_data_to_db(&self, path: &Path) -> Result<UploadReport> {
        let started_at = Utc::now();
        let parser = ScimagoParser::new();
        let records = parser.parse(path)?;

        debug!(parser_version = parser.version(), records = records.len(), "Parsed Scimago file");

        let conn = Connection::open(&self.db_path)?;
        db::setup_database(&conn)?;
        let rows_written = db::insert_scimago_records(&conn, &records)?;

        let report = UploadReport {
            source: parser.source_type(),
            location: self.db_path.clone(),
            rows_read: records.len(),
            rows_written,
            started_at,
            finished_at: Utc::now(),
        };
        info!("{}", report.summary());
        Ok(report)
    }
}

impl Handler for CategoryUploadHandler {
    fn location(&self) -> &str {
        &self.db_path
    }
}

// ============================================================================
// GRAPH STORE (DOAJ)
// ============================================================================

/// Shares the SPARQL handler's HTTP session and batch size
pub struct JournalUploadHandler {
    store: SparqlJournalHandler,
}

impl JournalUploadHandler {
    pub fn new(store: SparqlJournalHandler) -> Self {
        JournalUploadHandler { store }
    }

    pub fn set_location(&mut self, endpoint: impl Into<String>) {
        self.store.set_location(endpoint);
    }

    pub fn push_data_to_db(&self, path: &Path) -> Result<UploadReport> {
        let started_at = Utc::now();
        let parser = DoajParser::new();
        let journals = parser.parse(path)?;

        debug!(parser_version = parser.version(), journals = journals.len(), "Parsed DOAJ file");

        let mut rows_written = 0;
        for chunk in journals.chunks(self.store.batch_size()) {
            self.store.update(&insert_journals(chunk))?;
            rows_written += chunk.len();
            debug!(written = rows_written, total = journals.len(), "Inserted journal batch");
        }

        let report = UploadReport {
            source: parser.source_type(),
            location: self.store.location().to_string(),
            rows_read: journals.len(),
            rows_written,
            started_at,
            finished_at: Utc::now(),
        };
        info!("{}", report.summary());
        Ok(report)
    }
}

impl Handler for JournalUploadHandler {
    fn location(&self) -> &str {
        self.store.location()
    }
}
