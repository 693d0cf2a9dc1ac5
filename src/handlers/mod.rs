// Store Handlers - one per backing store
//
// Each handler owns its store location and its connection/session, and returns
// entities already normalized into the typed model. Engines only ever see
// `Journal`, `Category`, `Area` and the two relation row types.

pub mod sparql;
pub mod sqlite;

pub use sparql::SparqlJournalHandler;
pub use sqlite::SqliteCategoryHandler;

use crate::entities::{
    Area, AreaRelation, Category, CategoryRelation, Entity, IdentifiableEntity, Journal, Quartile,
};
use crate::error::Result;
use std::collections::BTreeSet;

/// Base capability: a handler knows where its store lives
pub trait Handler: Send + Sync {
    /// File path or endpoint URL
    fn location(&self) -> &str;
}

/// Read access to the graph store holding journals
///
/// Only `get_all_journals` and `get_journals_with_issn` are required; the rest
/// default to filtering the full journal list in memory. Network-backed handlers
/// override them to filter server-side.
pub trait JournalQueryHandler: Handler {
    fn get_all_journals(&self) -> Result<Vec<Journal>>;

    /// Journals whose ISSN or EISSN is in `issns`, in one logical call
    fn get_journals_with_issn(&self, issns: &BTreeSet<String>) -> Result<Vec<Journal>>;

    fn get_by_id(&self, id: &str) -> Result<Option<Journal>> {
        let wanted: BTreeSet<String> = [id.trim().to_string()].into_iter().collect();
        Ok(self.get_journals_with_issn(&wanted)?.into_iter().next())
    }

    /// Case-insensitive substring match on the title
    fn get_journals_with_title(&self, partial_title: &str) -> Result<Vec<Journal>> {
        let needle = partial_title.to_lowercase();
        Ok(self
            .get_all_journals()?
            .into_iter()
            .filter(|j| j.title().to_lowercase().contains(&needle))
            .collect())
    }

    /// Case-insensitive substring match on the publisher
    fn get_journals_published_by(&self, partial_name: &str) -> Result<Vec<Journal>> {
        let needle = partial_name.to_lowercase();
        Ok(self
            .get_all_journals()?
            .into_iter()
            .filter(|j| {
                j.publisher()
                    .map(|p| p.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn get_journals_with_license(&self, licenses: &BTreeSet<String>) -> Result<Vec<Journal>> {
        if licenses.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .get_all_journals()?
            .into_iter()
            .filter(|j| licenses.contains(j.license()))
            .collect())
    }

    fn get_journals_with_apc(&self) -> Result<Vec<Journal>> {
        Ok(self
            .get_all_journals()?
            .into_iter()
            .filter(|j| j.has_apc())
            .collect())
    }

    fn get_journals_with_doaj_seal(&self) -> Result<Vec<Journal>> {
        Ok(self
            .get_all_journals()?
            .into_iter()
            .filter(|j| j.has_doaj_seal())
            .collect())
    }
}

/// Read access to the relational store holding categories, areas and their relations
pub trait CategoryQueryHandler: Handler {
    fn get_all_categories(&self) -> Result<Vec<Category>>;

    fn get_all_areas(&self) -> Result<Vec<Area>>;

    /// Journal/category relation rows whose quartile is in `quartiles`
    fn get_categories_with_quartile(
        &self,
        quartiles: &BTreeSet<Quartile>,
    ) -> Result<Vec<CategoryRelation>>;

    /// Journal/area relation rows for the given areas
    fn get_journal_areas_in(&self, area_ids: &BTreeSet<String>) -> Result<Vec<AreaRelation>>;

    /// Journal/area relation rows for the given journals
    fn get_areas_of_journals(&self, issns: &BTreeSet<String>) -> Result<Vec<AreaRelation>>;

    fn get_categories_assigned_to_areas(&self, area_ids: &BTreeSet<String>)
        -> Result<Vec<Category>>;

    fn get_areas_assigned_to_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Area>>;

    /// Category (checked first) or area with this name
    fn get_by_id(&self, id: &str) -> Result<Option<Entity>>;
}

/// True when any identifier of `journal` is in `issns`
pub(crate) fn matches_any_issn(journal: &Journal, issns: &BTreeSet<String>) -> bool {
    journal.ids().iter().any(|id| issns.contains(id))
}
