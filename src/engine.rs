// 🔎 Basic Query Engine - one-store reads behind a uniform API
//
// Every registered handler of the needed kind is queried and the answers are
// unioned and deduplicated by key. A handler that fails is logged and skipped;
// only a missing registration is a hard error.

use crate::entities::{
    journal::sort_journals, Area, Category, Entity, IdentifiableEntity, Journal, Quartile,
};
use crate::error::{Error, Result, StoreKind};
use crate::handlers::{CategoryQueryHandler, JournalQueryHandler};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

#[derive(Default)]
pub struct BasicQueryEngine {
    journal_handlers: Vec<Box<dyn JournalQueryHandler>>,
    category_handlers: Vec<Box<dyn CategoryQueryHandler>>,
}

impl BasicQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Register a journal handler; a second handler for the same location is ignored
    pub fn add_journal_handler(&mut self, handler: Box<dyn JournalQueryHandler>) -> bool {
        if self
            .journal_handlers
            .iter()
            .any(|h| h.location() == handler.location())
        {
            debug!(location = %handler.location(), "Journal handler already registered");
            return false;
        }
        self.journal_handlers.push(handler);
        true
    }

    /// Register a category handler; a second handler for the same location is ignored
    pub fn add_category_handler(&mut self, handler: Box<dyn CategoryQueryHandler>) -> bool {
        if self
            .category_handlers
            .iter()
            .any(|h| h.location() == handler.location())
        {
            debug!(location = %handler.location(), "Category handler already registered");
            return false;
        }
        self.category_handlers.push(handler);
        true
    }

    pub fn clean_journal_handlers(&mut self) {
        self.journal_handlers.clear();
    }

    pub fn clean_category_handlers(&mut self) {
        self.category_handlers.clear();
    }

    pub fn journal_handler_count(&self) -> usize {
        self.journal_handlers.len()
    }

    pub fn category_handler_count(&self) -> usize {
        self.category_handlers.len()
    }

    // ========================================================================
    // FAN-OUT
    // ========================================================================

    pub(crate) fn require(&self, kind: StoreKind) -> Result<()> {
        let registered = match kind {
            StoreKind::Journal => !self.journal_handlers.is_empty(),
            StoreKind::Category => !self.category_handlers.is_empty(),
        };
        if registered {
            Ok(())
        } else {
            Err(Error::NoHandlerConfigured(kind))
        }
    }

    /// Ask every journal handler, union by identifier, return in result order
    pub(crate) fn fan_out_journals<F>(&self, operation: &str, query: F) -> Result<Vec<Journal>>
    where
        F: Fn(&dyn JournalQueryHandler) -> Result<Vec<Journal>>,
    {
        self.require(StoreKind::Journal)?;

        let mut journals: Vec<Journal> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for handler in &self.journal_handlers {
            match query(handler.as_ref()) {
                Ok(batch) => merge_journals(&mut journals, &mut seen, batch),
                Err(e) => degrade(operation, handler.location(), &e),
            }
        }

        sort_journals(&mut journals);
        Ok(journals)
    }

    /// Ask every category handler and concatenate; callers deduplicate by their own key
    pub(crate) fn fan_out_categories<T, F>(&self, operation: &str, query: F) -> Result<Vec<T>>
    where
        F: Fn(&dyn CategoryQueryHandler) -> Result<Vec<T>>,
    {
        self.require(StoreKind::Category)?;

        let mut rows = Vec::new();
        for handler in &self.category_handlers {
            match query(handler.as_ref()) {
                Ok(batch) => rows.extend(batch),
                Err(e) => degrade(operation, handler.location(), &e),
            }
        }
        Ok(rows)
    }

    // ========================================================================
    // JOURNAL QUERIES
    // ========================================================================

    pub fn get_all_journals(&self) -> Result<Vec<Journal>> {
        self.fan_out_journals("all journals", |h| h.get_all_journals())
    }

    /// Journal whose ISSN or EISSN is `issn`
    pub fn get_journal_by_issn(&self, issn: &str) -> Result<Option<Journal>> {
        self.require(StoreKind::Journal)?;

        for handler in &self.journal_handlers {
            match handler.get_by_id(issn) {
                Ok(Some(journal)) => return Ok(Some(journal)),
                Ok(None) => {}
                Err(e) => degrade("journal by ISSN", handler.location(), &e),
            }
        }
        Ok(None)
    }

    /// Batched fetch of full journal records for a set of ISSNs
    pub fn get_journals_with_issn(&self, issns: &BTreeSet<String>) -> Result<Vec<Journal>> {
        self.require(StoreKind::Journal)?;
        if issns.is_empty() {
            return Ok(Vec::new());
        }
        self.fan_out_journals("journals by ISSN", |h| h.get_journals_with_issn(issns))
    }

    pub fn get_journals_with_title(&self, partial_title: &str) -> Result<Vec<Journal>> {
        self.fan_out_journals("journals by title", |h| h.get_journals_with_title(partial_title))
    }

    pub fn get_journals_published_by(&self, partial_name: &str) -> Result<Vec<Journal>> {
        self.fan_out_journals("journals by publisher", |h| {
            h.get_journals_published_by(partial_name)
        })
    }

    pub fn get_journals_with_license(&self, licenses: &BTreeSet<String>) -> Result<Vec<Journal>> {
        self.require(StoreKind::Journal)?;
        if licenses.is_empty() {
            return Ok(Vec::new());
        }
        self.fan_out_journals("journals by license", |h| h.get_journals_with_license(licenses))
    }

    pub fn get_journals_with_apc(&self) -> Result<Vec<Journal>> {
        self.fan_out_journals("journals with APC", |h| h.get_journals_with_apc())
    }

    pub fn get_journals_with_doaj_seal(&self) -> Result<Vec<Journal>> {
        self.fan_out_journals("journals with DOAJ seal", |h| h.get_journals_with_doaj_seal())
    }

    // ========================================================================
    // CATEGORY / AREA QUERIES
    // ========================================================================

    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        let categories = self.fan_out_categories("all categories", |h| h.get_all_categories())?;
        Ok(dedup_categories(categories))
    }

    /// Distinct (category, quartile) pairs seen at any of `quartiles`
    pub fn get_categories_with_quartile(
        &self,
        quartiles: &BTreeSet<Quartile>,
    ) -> Result<Vec<Category>> {
        self.require(StoreKind::Category)?;
        if quartiles.is_empty() {
            return Ok(Vec::new());
        }

        let relations = self.fan_out_categories("categories by quartile", |h| {
            h.get_categories_with_quartile(quartiles)
        })?;

        let mut categories = Vec::with_capacity(relations.len());
        for relation in relations {
            match Category::new(&relation.category_id, relation.quartile) {
                Ok(category) => categories.push(category),
                Err(e) => warn!("Skipping category relation for {}: {}", relation.issn, e),
            }
        }
        Ok(dedup_categories(categories))
    }

    pub fn get_all_areas(&self) -> Result<Vec<Area>> {
        let areas = self.fan_out_categories("all areas", |h| h.get_all_areas())?;
        Ok(dedup_areas(areas))
    }

    pub fn get_categories_assigned_to_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<Vec<Category>> {
        self.require(StoreKind::Category)?;
        if area_ids.is_empty() {
            return Ok(Vec::new());
        }
        let categories = self.fan_out_categories("categories of areas", |h| {
            h.get_categories_assigned_to_areas(area_ids)
        })?;
        Ok(dedup_categories(categories))
    }

    pub fn get_areas_assigned_to_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Area>> {
        self.require(StoreKind::Category)?;
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let areas = self.fan_out_categories("areas of categories", |h| {
            h.get_areas_assigned_to_categories(category_ids)
        })?;
        Ok(dedup_areas(areas))
    }

    /// Look an id up in journal stores first, then category stores
    ///
    /// Needs at least one handler of either kind.
    pub fn get_entity_by_id(&self, id: &str) -> Result<Option<Entity>> {
        if self.journal_handlers.is_empty() && self.category_handlers.is_empty() {
            return Err(Error::NoHandlerConfigured(StoreKind::Journal));
        }

        for handler in &self.journal_handlers {
            match handler.get_by_id(id) {
                Ok(Some(journal)) => return Ok(Some(Entity::Journal(journal))),
                Ok(None) => {}
                Err(e) => degrade("entity by id", handler.location(), &e),
            }
        }

        for handler in &self.category_handlers {
            match handler.get_by_id(id) {
                Ok(Some(entity)) => return Ok(Some(entity)),
                Ok(None) => {}
                Err(e) => degrade("entity by id", handler.location(), &e),
            }
        }

        Ok(None)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// A failed sub-query contributes nothing; the rest of the answer still stands
fn degrade(operation: &str, location: &str, error: &Error) {
    warn!(
        operation = %operation,
        location = %location,
        "Sub-query failed, continuing without it: {}",
        error
    );
}

/// Append journals not seen yet (by any identifier); first handler wins
pub(crate) fn merge_journals(
    target: &mut Vec<Journal>,
    seen: &mut HashSet<String>,
    batch: Vec<Journal>,
) {
    for journal in batch {
        if journal.ids().iter().any(|id| seen.contains(id)) {
            continue;
        }
        seen.extend(journal.ids().iter().cloned());
        target.push(journal);
    }
}

fn dedup_categories(categories: Vec<Category>) -> Vec<Category> {
    let mut unique: BTreeMap<(String, Option<Quartile>), Category> = BTreeMap::new();
    for category in categories {
        unique
            .entry((category.name().to_string(), category.quartile()))
            .or_insert(category);
    }
    unique.into_values().collect()
}

fn dedup_areas(areas: Vec<Area>) -> Vec<Area> {
    let mut unique: BTreeMap<String, Area> = BTreeMap::new();
    for area in areas {
        unique.entry(area.name().to_string()).or_insert(area);
    }
    unique.into_values().collect()
}
