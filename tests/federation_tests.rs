//! Federation integration tests
//!
//! The relational store is a real SQLite file, loaded through the upload handler.
//! The graph store is an in-memory journal handler so no SPARQL endpoint is needed.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use journal_federation::{
    BasicQueryEngine, CategoryUploadHandler, Entity, Error, FullQueryEngine, Handler,
    IdentifiableEntity, Journal, JournalQueryHandler, Quartile, SqliteCategoryHandler, StoreKind,
};
use tempfile::TempDir;

// ============================================================================
// FIXTURES
// ============================================================================

const SCIMAGO_JSON: &str = r#"[
    {"identifiers": ["1111-1111"],
     "categories": [{"id": "Medicine", "quartile": "Q1"}],
     "areas": ["Social Sciences"]},
    {"identifiers": ["2222-3333"],
     "categories": [{"id": "Medicine", "quartile": "Q1"}, {"id": "Oncology", "quartile": "Q2"}],
     "areas": ["Social Sciences", "Medicine"]},
    {"identifiers": ["9999-9999"],
     "categories": [{"id": "Medicine", "quartile": "Q1"}],
     "areas": ["Social Sciences"]},
    {"identifiers": ["4444-4444"],
     "categories": [{"id": "Oncology", "quartile": "Q1"}, {"id": "Oncology", "quartile": "Q3"}],
     "areas": ["Medicine"]}
]"#;

struct MemoryJournals {
    location: String,
    journals: Vec<Journal>,
    fail: bool,
}

impl MemoryJournals {
    fn new(location: &str, journals: Vec<Journal>) -> Self {
        MemoryJournals {
            location: location.to_string(),
            journals,
            fail: false,
        }
    }

    fn failing(location: &str) -> Self {
        MemoryJournals {
            location: location.to_string(),
            journals: Vec::new(),
            fail: true,
        }
    }

    fn check(&self) -> journal_federation::Result<()> {
        if self.fail {
            Err(Error::unavailable(&self.location, "connection refused"))
        } else {
            Ok(())
        }
    }
}

impl Handler for MemoryJournals {
    fn location(&self) -> &str {
        &self.location
    }
}

impl JournalQueryHandler for MemoryJournals {
    fn get_all_journals(&self) -> journal_federation::Result<Vec<Journal>> {
        self.check()?;
        Ok(self.journals.clone())
    }

    fn get_journals_with_issn(
        &self,
        issns: &BTreeSet<String>,
    ) -> journal_federation::Result<Vec<Journal>> {
        self.check()?;
        Ok(self
            .journals
            .iter()
            .filter(|j| j.ids().iter().any(|id| issns.contains(id)))
            .cloned()
            .collect())
    }
}

fn doaj_journals() -> Vec<Journal> {
    vec![
        Journal::new(["1111-1111"], "Alpha")
            .unwrap()
            .with_license("CC BY")
            .with_apc(false),
        Journal::new(["2222-2222", "2222-3333"], "Beta")
            .unwrap()
            .with_license("CC BY")
            .with_apc(true),
        Journal::new(["4444-4444"], "delta journal")
            .unwrap()
            .with_license("CC BY-NC")
            .with_apc(false),
        Journal::new(["5555-5555"], "Epsilon")
            .unwrap()
            .with_license("CC0")
            .with_seal(true),
    ]
}

struct Fixture {
    dir: TempDir,
    db_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("relational.db");
        Fixture { dir, db_path }
    }

    fn db(&self) -> String {
        self.db_path.to_string_lossy().to_string()
    }

    fn upload(&self) {
        let json_path = self.dir.path().join("scimago.json");
        fs::write(&json_path, SCIMAGO_JSON).unwrap();
        CategoryUploadHandler::new(self.db())
            .push_data_to_db(&json_path)
            .unwrap();
    }

    fn engine(&self) -> FullQueryEngine {
        let mut engine = FullQueryEngine::new();
        engine
            .basic_mut()
            .add_journal_handler(Box::new(MemoryJournals::new("memory://doaj", doaj_journals())));
        engine
            .basic_mut()
            .add_category_handler(Box::new(SqliteCategoryHandler::new(self.db())));
        engine
    }
}

fn seeded() -> (Fixture, FullQueryEngine) {
    let fixture = Fixture::new();
    fixture.upload();
    let engine = fixture.engine();
    (fixture, engine)
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn quartiles(values: &[Quartile]) -> BTreeSet<Quartile> {
    values.iter().copied().collect()
}

fn titles(journals: &[Journal]) -> Vec<&str> {
    journals.iter().map(|j| j.title()).collect()
}

// ============================================================================
// MASHUP QUERIES
// ============================================================================

#[test]
fn test_diamond_journals_in_social_sciences_medicine_q1() {
    let (_fixture, engine) = seeded();

    let journals = engine
        .get_diamond_journals_in_areas_and_categories_with_quartile(
            &set(&["Social Sciences"]),
            &set(&["Medicine"]),
            &quartiles(&[Quartile::Q1]),
        )
        .unwrap();

    // Beta qualifies on both sides but charges APC; 9999-9999 has no journal record
    assert_eq!(titles(&journals), vec!["Alpha"]);
}

#[test]
fn test_journals_in_categories_match_through_eissn() {
    let (_fixture, engine) = seeded();

    let journals = engine
        .get_journals_in_categories_with_quartile(&set(&["Medicine"]), &quartiles(&[Quartile::Q1]))
        .unwrap();

    assert_eq!(titles(&journals), vec!["Alpha", "Beta"]);
}

#[test]
fn test_journal_in_several_categories_appears_once() {
    let (_fixture, engine) = seeded();

    let journals = engine
        .get_journals_in_categories_with_quartile(
            &set(&["Medicine", "Oncology"]),
            &quartiles(&[Quartile::Q1, Quartile::Q2]),
        )
        .unwrap();

    assert_eq!(titles(&journals), vec!["Alpha", "Beta", "delta journal"]);
}

#[test]
fn test_conflicting_quartiles_each_match() {
    let (_fixture, engine) = seeded();

    for q in [Quartile::Q1, Quartile::Q3] {
        let journals = engine
            .get_journals_in_categories_with_quartile(&set(&["Oncology"]), &quartiles(&[q]))
            .unwrap();
        assert!(
            journals.iter().any(|j| j.has_id("4444-4444")),
            "4444-4444 should match Oncology at {}",
            q
        );
    }
}

#[test]
fn test_journals_in_areas_with_license() {
    let (_fixture, engine) = seeded();

    let journals = engine
        .get_journals_in_areas_with_license(&set(&["Medicine"]), &set(&["CC BY"]))
        .unwrap();
    assert_eq!(titles(&journals), vec!["Beta"]);

    let journals = engine
        .get_journals_in_areas_with_license(&set(&["Medicine"]), &set(&["CC BY", "CC BY-NC"]))
        .unwrap();
    assert_eq!(titles(&journals), vec!["Beta", "delta journal"]);
}

#[test]
fn test_empty_filter_sets_match_nothing() {
    let (_fixture, engine) = seeded();
    let none: BTreeSet<String> = BTreeSet::new();

    assert!(engine
        .get_journals_in_categories_with_quartile(&set(&["Medicine"]), &BTreeSet::new())
        .unwrap()
        .is_empty());
    assert!(engine
        .get_journals_in_areas_with_license(&none, &set(&["CC BY"]))
        .unwrap()
        .is_empty());
    assert!(engine
        .get_diamond_journals_in_areas_and_categories_with_quartile(
            &set(&["Social Sciences"]),
            &none,
            &quartiles(&[Quartile::Q1]),
        )
        .unwrap()
        .is_empty());
}

#[test]
fn test_repeated_queries_and_reupload_give_same_answer() {
    let (fixture, engine) = seeded();
    let query = |engine: &FullQueryEngine| {
        engine
            .get_journals_in_categories_with_quartile(
                &set(&["Medicine", "Oncology"]),
                &quartiles(&[Quartile::Q1, Quartile::Q2, Quartile::Q3]),
            )
            .unwrap()
    };

    let first = query(&engine);
    assert_eq!(first, query(&engine));

    fixture.upload();
    assert_eq!(first, query(&engine));
}

// ============================================================================
// FAILURE POLICY
// ============================================================================

#[test]
fn test_missing_relational_store_degrades_to_empty() {
    // No upload: the database file does not exist
    let fixture = Fixture::new();
    let engine = fixture.engine();

    assert_eq!(engine.basic().get_all_journals().unwrap().len(), 4);
    assert!(engine.basic().get_all_categories().unwrap().is_empty());
    assert!(engine
        .get_diamond_journals_in_areas_and_categories_with_quartile(
            &set(&["Social Sciences"]),
            &set(&["Medicine"]),
            &quartiles(&[Quartile::Q1]),
        )
        .unwrap()
        .is_empty());
    assert!(!fixture.db_path.exists());
}

#[test]
fn test_no_handler_configured_is_an_error() {
    let fixture = Fixture::new();
    fixture.upload();

    let mut categories_only = FullQueryEngine::new();
    categories_only
        .basic_mut()
        .add_category_handler(Box::new(SqliteCategoryHandler::new(fixture.db())));

    let err = categories_only
        .get_journals_in_categories_with_quartile(&set(&["Medicine"]), &quartiles(&[Quartile::Q1]))
        .unwrap_err();
    assert!(matches!(err, Error::NoHandlerConfigured(StoreKind::Journal)));

    let empty = BasicQueryEngine::new();
    assert!(matches!(
        empty.get_all_categories(),
        Err(Error::NoHandlerConfigured(StoreKind::Category))
    ));
}

#[test]
fn test_journal_handlers_fan_out_and_union() {
    let (fixture, _) = seeded();

    let mut basic = BasicQueryEngine::new();
    basic.add_journal_handler(Box::new(MemoryJournals::new(
        "memory://first",
        vec![Journal::new(["1111-1111"], "Alpha").unwrap()],
    )));
    basic.add_journal_handler(Box::new(MemoryJournals::new(
        "memory://second",
        vec![
            Journal::new(["1111-1111"], "Alpha (mirror)").unwrap(),
            Journal::new(["5555-5555"], "Epsilon").unwrap(),
        ],
    )));
    basic.add_journal_handler(Box::new(MemoryJournals::failing("memory://down")));
    basic.add_category_handler(Box::new(SqliteCategoryHandler::new(fixture.db())));

    let journals = basic.get_all_journals().unwrap();
    assert_eq!(titles(&journals), vec!["Alpha", "Epsilon"]);

    let engine = FullQueryEngine::from(basic);
    let journals = engine
        .get_journals_in_categories_with_quartile(&set(&["Medicine"]), &quartiles(&[Quartile::Q1]))
        .unwrap();
    assert_eq!(titles(&journals), vec!["Alpha"]);
}

// ============================================================================
// SINGLE-STORE QUERIES
// ============================================================================

#[test]
fn test_categories_and_areas_from_relational_store() {
    let (_fixture, engine) = seeded();
    let basic = engine.basic();

    let q1: Vec<String> = basic
        .get_categories_with_quartile(&quartiles(&[Quartile::Q1]))
        .unwrap()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(q1, vec!["Medicine", "Oncology"]);

    assert_eq!(basic.get_all_categories().unwrap().len(), 4);

    let areas: Vec<String> = basic
        .get_all_areas()
        .unwrap()
        .iter()
        .map(|a| a.name().to_string())
        .collect();
    assert_eq!(areas, vec!["Medicine", "Social Sciences"]);

    let areas_of_oncology = basic
        .get_areas_assigned_to_categories(&set(&["Oncology"]))
        .unwrap();
    assert_eq!(areas_of_oncology.len(), 2);

    let categories_of_medicine = basic
        .get_categories_assigned_to_areas(&set(&["Medicine"]))
        .unwrap();
    assert!(categories_of_medicine
        .iter()
        .any(|c| c.name() == "Oncology" && c.quartile() == Some(Quartile::Q3)));
}

#[test]
fn test_entity_lookup_checks_journals_then_categories() {
    let (_fixture, engine) = seeded();
    let basic = engine.basic();

    assert!(matches!(
        basic.get_entity_by_id("2222-3333").unwrap(),
        Some(Entity::Journal(j)) if j.title() == "Beta"
    ));
    // "Medicine" is both a category and an area: the category wins
    assert!(matches!(basic.get_entity_by_id("Medicine").unwrap(), Some(Entity::Category(_))));
    assert!(matches!(
        basic.get_entity_by_id("Social Sciences").unwrap(),
        Some(Entity::Area(_))
    ));
    assert_eq!(basic.get_entity_by_id("0000-0000").unwrap(), None);
}

#[test]
fn test_journal_filters() {
    let (_fixture, engine) = seeded();
    let basic = engine.basic();

    assert_eq!(titles(&basic.get_journals_with_title("ALPH").unwrap()), vec!["Alpha"]);
    assert_eq!(titles(&basic.get_journals_with_apc().unwrap()), vec!["Beta"]);
    assert_eq!(titles(&basic.get_journals_with_doaj_seal().unwrap()), vec!["Epsilon"]);
    assert_eq!(
        titles(&basic.get_journals_with_license(&set(&["CC BY"])).unwrap()),
        vec!["Alpha", "Beta"]
    );
    assert!(basic.get_journals_with_license(&BTreeSet::new()).unwrap().is_empty());
}
