// Journal Entity - DOAJ metadata as read from the graph store
//
// Built once per query from store rows and never mutated afterwards.
// The builder methods consume `self`, so a finished Journal is a read-only snapshot.

use super::{IdentifiableEntity, Identifiers};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Journal {
    /// Print ISSN first when present, then EISSN
    ids: Identifiers,

    issn: Option<String>,

    eissn: Option<String>,

    title: String,

    /// Languages in which the journal accepts manuscripts, source order
    languages: Vec<String>,

    publisher: Option<String>,

    /// License string as published by DOAJ (e.g. "CC BY")
    license: String,

    /// Article processing charge applies
    has_apc: bool,

    /// DOAJ Seal awarded
    has_seal: bool,
}

impl Journal {
    /// Create a journal with the required fields; everything else starts empty/false
    ///
    /// `ids` are positional: print ISSN, then EISSN.
    pub fn new<I, S>(ids: I, title: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = Identifiers::new(ids)?;
        let issn = ids.as_slice().first().cloned();
        let eissn = ids.as_slice().get(1).cloned();
        Self::build(ids, issn, eissn, title.into())
    }

    /// Create from the two DOAJ identifier columns; a blank column is absent
    pub fn from_issns(issn: &str, eissn: &str, title: impl Into<String>) -> Result<Self> {
        let issn = Some(issn.trim()).filter(|i| !i.is_empty()).map(str::to_string);
        let eissn = Some(eissn.trim())
            .filter(|e| !e.is_empty() && Some(*e) != issn.as_deref())
            .map(str::to_string);
        let ids = Identifiers::new(issn.iter().chain(eissn.iter()))?;
        Self::build(ids, issn, eissn, title.into())
    }

    fn build(
        ids: Identifiers,
        issn: Option<String>,
        eissn: Option<String>,
        title: String,
    ) -> Result<Self> {
        Ok(Journal {
            ids,
            issn,
            eissn,
            title: title.trim().to_string(),
            languages: Vec::new(),
            publisher: None,
            license: String::new(),
            has_apc: false,
            has_seal: false,
        })
    }

    /// Builder pattern: languages (blank entries and repeats are dropped)
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for language in languages {
            let language = language.as_ref().trim();
            if !language.is_empty() && !cleaned.iter().any(|l| l == language) {
                cleaned.push(language.to_string());
            }
        }
        self.languages = cleaned;
        self
    }

    /// Builder pattern: publisher (blank means unknown)
    pub fn with_publisher(mut self, publisher: Option<String>) -> Self {
        self.publisher = publisher
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into().trim().to_string();
        self
    }

    pub fn with_apc(mut self, has_apc: bool) -> Self {
        self.has_apc = has_apc;
        self
    }

    pub fn with_seal(mut self, has_seal: bool) -> Self {
        self.has_seal = has_seal;
        self
    }

    /// Print ISSN
    pub fn issn(&self) -> Option<&str> {
        self.issn.as_deref()
    }

    /// Online ISSN
    pub fn eissn(&self) -> Option<&str> {
        self.eissn.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn has_apc(&self) -> bool {
        self.has_apc
    }

    pub fn has_doaj_seal(&self) -> bool {
        self.has_seal
    }

    /// "Diamond" = open access without an author-facing charge
    pub fn is_diamond(&self) -> bool {
        !self.has_apc
    }

    /// True when `id` is either the ISSN or the EISSN of this journal
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Result ordering: title ascending (case-insensitive), then primary ISSN
    pub fn display_order(&self, other: &Journal) -> Ordering {
        self.title
            .to_lowercase()
            .cmp(&other.title.to_lowercase())
            .then_with(|| self.primary_id().cmp(other.primary_id()))
    }
}

impl IdentifiableEntity for Journal {
    fn identifiers(&self) -> &Identifiers {
        &self.ids
    }
}

/// Sort in result order
pub fn sort_journals(journals: &mut [Journal]) {
    journals.sort_by(|a, b| a.display_order(b));
}
