// SPARQL-backed journal handler (Blazegraph or any SPARQL 1.1 endpoint)
//
// Journals are stored as:
//   <http://doaj.org/journal/{issn}> rdf:type doaj:Journal ;
//       doaj:title "..." ; doaj:issn "..." ; doaj:eissn "..." ;
//       doaj:language "..." (one triple per language) ; doaj:publisher "..." ;
//       doaj:hasDOAJSeal "true"^^xsd:boolean ; doaj:licence "..." ;
//       doaj:hasAPC "false"^^xsd:boolean .
//
// SELECT results come back one row per (journal, language) and are folded per IRI.

use super::{matches_any_issn, Handler, JournalQueryHandler};
use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_TIMEOUT_SECS};
use crate::entities::{IdentifiableEntity, Journal};
use crate::error::{Error, Result};
use crate::parser::parse_flag;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

const PREFIXES: &str = "PREFIX doaj: <http://doaj.org/>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
";

pub const JOURNAL_IRI_BASE: &str = "http://doaj.org/journal/";

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

// ============================================================================
// QUERY BUILDING
// ============================================================================

/// Escape a value for use inside a double-quoted SPARQL literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn literal_list<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(|v| format!("\"{}\"", escape_literal(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT over every journal property, restricted by `filter` (a FILTER clause or empty)
pub fn select_journals(filter: &str) -> String {
    format!(
        "{}
SELECT ?journal ?title ?issn ?eissn ?language ?publisher ?seal ?licence ?apc
WHERE {{
    ?journal rdf:type doaj:Journal .
    ?journal doaj:title ?title .
    OPTIONAL {{ ?journal doaj:issn ?issn }}
    OPTIONAL {{ ?journal doaj:eissn ?eissn }}
    OPTIONAL {{ ?journal doaj:language ?language }}
    OPTIONAL {{ ?journal doaj:publisher ?publisher }}
    OPTIONAL {{ ?journal doaj:hasDOAJSeal ?seal }}
    OPTIONAL {{ ?journal doaj:licence ?licence }}
    OPTIONAL {{ ?journal doaj:hasAPC ?apc }}
    {}
}}
ORDER BY ?title",
        PREFIXES, filter
    )
}

/// FILTER matching journals whose ISSN or EISSN is in `issns`
pub fn issn_filter(issns: &[&String]) -> String {
    let list = literal_list(issns.iter().copied());
    format!(
        "FILTER ((BOUND(?issn) && ?issn IN ({list})) || (BOUND(?eissn) && ?eissn IN ({list})))",
        list = list
    )
}

/// INSERT DATA for a batch of journals
pub fn insert_journals(journals: &[Journal]) -> String {
    let mut body = String::new();
    for journal in journals {
        let iri = format!("<{}{}>", JOURNAL_IRI_BASE, escape_iri(journal.primary_id()));

        body.push_str(&format!("    {} rdf:type doaj:Journal .\n", iri));
        body.push_str(&format!(
            "    {} doaj:title \"{}\" .\n",
            iri,
            escape_literal(journal.title())
        ));

        if let Some(issn) = journal.issn() {
            body.push_str(&format!("    {} doaj:issn \"{}\" .\n", iri, escape_literal(issn)));
        }
        if let Some(eissn) = journal.eissn() {
            body.push_str(&format!("    {} doaj:eissn \"{}\" .\n", iri, escape_literal(eissn)));
        }

        for language in journal.languages() {
            body.push_str(&format!(
                "    {} doaj:language \"{}\" .\n",
                iri,
                escape_literal(language)
            ));
        }
        if let Some(publisher) = journal.publisher() {
            body.push_str(&format!(
                "    {} doaj:publisher \"{}\" .\n",
                iri,
                escape_literal(publisher)
            ));
        }
        body.push_str(&format!(
            "    {} doaj:hasDOAJSeal \"{}\"^^xsd:boolean .\n",
            iri,
            journal.has_doaj_seal()
        ));
        body.push_str(&format!(
            "    {} doaj:licence \"{}\" .\n",
            iri,
            escape_literal(journal.license())
        ));
        body.push_str(&format!(
            "    {} doaj:hasAPC \"{}\"^^xsd:boolean .\n",
            iri,
            journal.has_apc()
        ));
    }

    format!("{}INSERT DATA {{\n{}}}", PREFIXES, body)
}

/// Keep IRI-safe characters only (ISSNs are digits, X and '-')
fn escape_iri(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

// ============================================================================
// RESULT DECODING
// ============================================================================

/// SPARQL 1.1 JSON results document
#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    pub results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
pub struct SparqlBindings {
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
pub struct SparqlTerm {
    pub value: String,
}

/// Properties of one journal IRI gathered across its result rows
#[derive(Debug, Default)]
struct JournalRows {
    title: Option<String>,
    issn: Option<String>,
    eissn: Option<String>,
    languages: Vec<String>,
    publisher: Option<String>,
    seal: Option<String>,
    licence: Option<String>,
    apc: Option<String>,
}

impl JournalRows {
    fn absorb(&mut self, row: &HashMap<String, SparqlTerm>) {
        let get = |key: &str| row.get(key).map(|t| t.value.clone());

        // First value wins for single-valued properties
        self.title = self.title.take().or_else(|| get("title"));
        self.issn = self.issn.take().or_else(|| get("issn"));
        self.eissn = self.eissn.take().or_else(|| get("eissn"));
        self.publisher = self.publisher.take().or_else(|| get("publisher"));
        self.seal = self.seal.take().or_else(|| get("seal"));
        self.licence = self.licence.take().or_else(|| get("licence"));
        self.apc = self.apc.take().or_else(|| get("apc"));

        if let Some(language) = get("language") {
            self.languages.push(language);
        }
    }

    fn into_journal(self) -> Result<Journal> {
        let journal = Journal::from_issns(
            self.issn.as_deref().unwrap_or(""),
            self.eissn.as_deref().unwrap_or(""),
            self.title.unwrap_or_default(),
        )?
            .with_languages(self.languages)
            .with_publisher(self.publisher)
            .with_license(self.licence.unwrap_or_default())
            .with_seal(parse_flag(self.seal.as_deref().unwrap_or(""))?)
            .with_apc(parse_flag(self.apc.as_deref().unwrap_or(""))?);
        Ok(journal)
    }
}

/// Fold result rows into journals, first-seen IRI order
///
/// Journals that cannot be normalized (no ISSN at all, unreadable flags) are
/// skipped with a warning rather than failing the whole answer.
pub fn fold_bindings(location: &str, results: SparqlResults) -> Vec<Journal> {
    let mut order: Vec<String> = Vec::new();
    let mut by_iri: HashMap<String, JournalRows> = HashMap::new();

    for row in &results.results.bindings {
        let Some(iri) = row.get("journal").map(|t| t.value.clone()) else {
            warn!(endpoint = %location, "Result row without ?journal, skipped");
            continue;
        };

        if !by_iri.contains_key(&iri) {
            order.push(iri.clone());
        }
        by_iri.entry(iri).or_default().absorb(row);
    }

    let mut journals = Vec::with_capacity(order.len());
    for iri in order {
        let Some(rows) = by_iri.remove(&iri) else { continue };
        match rows.into_journal() {
            Ok(journal) => journals.push(journal),
            Err(e) => warn!(
                endpoint = %location,
                "{}",
                Error::malformed(location, format!("{}: {}", iri, e))
            ),
        }
    }

    journals
}

// ============================================================================
// HANDLER
// ============================================================================

/// Journal handler talking SPARQL over HTTP
///
/// The HTTP client is the handler's session: created once, reused for every call.
pub struct SparqlJournalHandler {
    endpoint: String,
    client: Client,
    batch_size: usize,
}

impl SparqlJournalHandler {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_options(endpoint, DEFAULT_BATCH_SIZE, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_options(
        endpoint: impl Into<String>,
        batch_size: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(SparqlJournalHandler {
            endpoint: endpoint.into(),
            client,
            batch_size,
        })
    }

    pub fn set_location(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run a SELECT and fold the rows into journals
    fn select(&self, query: &str) -> Result<Vec<Journal>> {
        debug!(endpoint = %self.endpoint, "SPARQL select");

        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .query(&[("query", query), ("format", "json")])
            .send()
            .map_err(|e| Error::unavailable(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::unavailable(
                &self.endpoint,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let results: SparqlResults = response
            .json()
            .map_err(|e| Error::malformed(&self.endpoint, e))?;

        Ok(fold_bindings(&self.endpoint, results))
    }

    /// Run a SPARQL update (INSERT DATA)
    pub fn update(&self, update: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("update", update)])
            .send()
            .map_err(|e| Error::unavailable(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::unavailable(
                &self.endpoint,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        Ok(())
    }
}

impl Handler for SparqlJournalHandler {
    fn location(&self) -> &str {
        &self.endpoint
    }
}

impl JournalQueryHandler for SparqlJournalHandler {
    fn get_all_journals(&self) -> Result<Vec<Journal>> {
        self.select(&select_journals(""))
    }

    fn get_journals_with_issn(&self, issns: &BTreeSet<String>) -> Result<Vec<Journal>> {
        let wanted: Vec<&String> = issns.iter().filter(|i| !i.trim().is_empty()).collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        // One logical fetch, chunked to keep each VALUES list bounded
        let mut journals = Vec::new();
        for chunk in wanted.chunks(self.batch_size) {
            journals.extend(self.select(&select_journals(&issn_filter(chunk)))?);
        }

        journals.retain(|j| matches_any_issn(j, issns));
        Ok(journals)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Journal>> {
        let id = id.trim().to_string();
        if id.is_empty() {
            return Ok(None);
        }
        Ok(self
            .select(&select_journals(&issn_filter(&[&id])))?
            .into_iter()
            .next())
    }

    fn get_journals_with_title(&self, partial_title: &str) -> Result<Vec<Journal>> {
        self.select(&select_journals(&format!(
            "FILTER (CONTAINS(LCASE(?title), LCASE(\"{}\")))",
            escape_literal(partial_title)
        )))
    }

    fn get_journals_published_by(&self, partial_name: &str) -> Result<Vec<Journal>> {
        self.select(&select_journals(&format!(
            "FILTER (BOUND(?publisher) && CONTAINS(LCASE(?publisher), LCASE(\"{}\")))",
            escape_literal(partial_name)
        )))
    }

    fn get_journals_with_license(&self, licenses: &BTreeSet<String>) -> Result<Vec<Journal>> {
        if licenses.is_empty() {
            return Ok(Vec::new());
        }
        self.select(&select_journals(&format!(
            "FILTER (BOUND(?licence) && ?licence IN ({}))",
            literal_list(licenses.iter())
        )))
    }

    fn get_journals_with_apc(&self) -> Result<Vec<Journal>> {
        self.select(&select_journals("FILTER (LCASE(STR(?apc)) = \"true\")"))
    }

    fn get_journals_with_doaj_seal(&self) -> Result<Vec<Journal>> {
        self.select(&select_journals("FILTER (LCASE(STR(?seal)) = \"true\")"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DoajParser;

    fn results(json: &str) -> SparqlResults {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"Say "hi"\now"#), r#"Say \"hi\"\\now"#);
        assert_eq!(escape_literal("a\nb"), "a\\nb");
    }

    #[test]
    fn test_issn_filter_lists_every_id() {
        let a = "1111-1111".to_string();
        let b = "2222-2222".to_string();
        let filter = issn_filter(&[&a, &b]);

        assert!(filter.contains("?issn IN (\"1111-1111\", \"2222-2222\")"));
        assert!(filter.contains("?eissn IN (\"1111-1111\", \"2222-2222\")"));
    }

    #[test]
    fn test_select_embeds_filter() {
        let query = select_journals("FILTER (?x)");
        assert!(query.starts_with("PREFIX doaj:"));
        assert!(query.contains("FILTER (?x)"));
        assert!(query.trim_end().ends_with("ORDER BY ?title"));
    }

    #[test]
    fn test_fold_rows_per_journal() {
        let doc = results(
            r#"{
            "head": {"vars": ["journal", "title", "issn", "language", "apc", "seal", "licence"]},
            "results": {"bindings": [
                {"journal": {"type": "uri", "value": "http://doaj.org/journal/1111-1111"},
                 "title": {"type": "literal", "value": "Alpha"},
                 "issn": {"type": "literal", "value": "1111-1111"},
                 "eissn": {"type": "literal", "value": "2222-2222"},
                 "language": {"type": "literal", "value": "English"},
                 "apc": {"type": "literal", "value": "false"},
                 "seal": {"type": "literal", "value": "true"},
                 "licence": {"type": "literal", "value": "CC BY"}},
                {"journal": {"type": "uri", "value": "http://doaj.org/journal/1111-1111"},
                 "title": {"type": "literal", "value": "Alpha"},
                 "issn": {"type": "literal", "value": "1111-1111"},
                 "language": {"type": "literal", "value": "French"}},
                {"journal": {"type": "uri", "value": "http://doaj.org/journal/3333-3333"},
                 "title": {"type": "literal", "value": "Beta"},
                 "eissn": {"type": "literal", "value": "3333-3333"},
                 "apc": {"type": "literal", "value": "True"}}
            ]}
        }"#,
        );

        let journals = fold_bindings("test", doc);

        assert_eq!(journals.len(), 2);
        let alpha = &journals[0];
        assert_eq!(alpha.ids(), &["1111-1111".to_string(), "2222-2222".to_string()]);
        assert_eq!(alpha.languages(), &["English".to_string(), "French".to_string()]);
        assert_eq!(alpha.license(), "CC BY");
        assert!(alpha.has_doaj_seal());
        assert!(!alpha.has_apc());

        let beta = &journals[1];
        assert_eq!(beta.primary_id(), "3333-3333");
        assert!(beta.has_apc());
    }

    #[test]
    fn test_fold_skips_journals_without_issn() {
        let doc = results(
            r#"{"results": {"bindings": [
                {"journal": {"type": "uri", "value": "http://doaj.org/journal/x"},
                 "title": {"type": "literal", "value": "No ids"}},
                {"title": {"type": "literal", "value": "No iri"}}
            ]}}"#,
        );

        assert!(fold_bindings("test", doc).is_empty());
    }

    #[test]
    fn test_insert_data_document() {
        let journal = Journal::new(["1111-1111", "2222-2222"], "Say \"Alpha\"")
            .unwrap()
            .with_languages(["English", "French"])
            .with_license("CC BY")
            .with_apc(false)
            .with_seal(true);

        let update = insert_journals(&[journal]);

        assert!(update.contains("INSERT DATA {"));
        assert!(update.contains("<http://doaj.org/journal/1111-1111> rdf:type doaj:Journal ."));
        assert!(update.contains("doaj:title \"Say \\\"Alpha\\\"\""));
        assert!(update.contains("doaj:eissn \"2222-2222\""));
        assert!(update.contains("doaj:language \"French\""));
        assert!(update.contains("doaj:hasAPC \"false\"^^xsd:boolean"));
        assert!(update.contains("doaj:hasDOAJSeal \"true\"^^xsd:boolean"));
        assert!(!update.contains("doaj:publisher"));
    }

    #[test]
    fn test_online_only_journal_keeps_eissn_predicate() {
        let csv = "Journal title,Journal ISSN (print version),Journal EISSN (online version),APC\n\
                   Beta,,3333-3333,No\n";
        let journals = DoajParser::new().parse_reader(csv.as_bytes()).unwrap();

        let update = insert_journals(&journals);

        assert!(update.contains("<http://doaj.org/journal/3333-3333> doaj:eissn \"3333-3333\" ."));
        assert!(!update.contains("doaj:issn"));
    }

    #[test]
    fn test_fold_reads_back_online_only_journal() {
        let doc = results(
            r#"{"results": {"bindings": [
                {"journal": {"type": "uri", "value": "http://doaj.org/journal/3333-3333"},
                 "title": {"type": "literal", "value": "Beta"},
                 "eissn": {"type": "literal", "value": "3333-3333"}}
            ]}}"#,
        );

        let journals = fold_bindings("test", doc);

        assert_eq!(journals.len(), 1);
        assert_eq!(journals[0].issn(), None);
        assert_eq!(journals[0].eissn(), Some("3333-3333"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(matches!(
            SparqlJournalHandler::with_options("http://localhost:1/sparql", 0, 5),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) on localhost is not a SPARQL endpoint
        let handler = SparqlJournalHandler::with_options("http://127.0.0.1:9/sparql", 10, 1).unwrap();

        let err = handler.get_all_journals().unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
    }

    #[test]
    fn test_empty_issn_set_skips_network() {
        let handler = SparqlJournalHandler::with_options("http://127.0.0.1:9/sparql", 10, 1).unwrap();
        assert!(handler.get_journals_with_issn(&BTreeSet::new()).unwrap().is_empty());
    }
}
