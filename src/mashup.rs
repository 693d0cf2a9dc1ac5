// 🔗 Mashup Query Engine - queries whose predicate spans both stores
//
// The graph store (journals) and the relational store (categories, areas) cannot
// share a query plan, so joins happen here, in memory, over ISSN keys:
//
//   1. one relational query per predicate group  -> set of qualifying ISSNs
//   2. set algebra over those ISSN sets            (union within, intersection across)
//   3. one batched graph fetch for the final set   -> Journal records
//   4. client-side filters (license, APC), dedup, ordering
//
// Empty filter sets match nothing. A failing store degrades its sub-query to an
// empty set; a missing handler registration is a hard error.

use crate::engine::BasicQueryEngine;
use crate::entities::{Journal, Quartile};
use crate::error::{Result, StoreKind};
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Default)]
pub struct FullQueryEngine {
    basic: BasicQueryEngine,
}

impl FullQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basic(&self) -> &BasicQueryEngine {
        &self.basic
    }

    /// Registration goes through the basic engine
    pub fn basic_mut(&mut self) -> &mut BasicQueryEngine {
        &mut self.basic
    }

    fn require_both(&self) -> Result<()> {
        self.basic.require(StoreKind::Journal)?;
        self.basic.require(StoreKind::Category)
    }

    // ========================================================================
    // ISSN SETS (relational side)
    // ========================================================================

    /// ISSNs holding any of `category_names` at any of `quartiles`
    fn category_issns(
        &self,
        category_names: &BTreeSet<String>,
        quartiles: &BTreeSet<Quartile>,
    ) -> Result<BTreeSet<String>> {
        let relations = self
            .basic
            .fan_out_categories("category relations", |h| h.get_categories_with_quartile(quartiles))?;

        // Conflicting quartiles across rows are independent relations: any match counts
        let issns: BTreeSet<String> = relations
            .into_iter()
            .filter(|r| category_names.contains(&r.category_id))
            .filter(|r| r.quartile.map(|q| quartiles.contains(&q)).unwrap_or(false))
            .map(|r| r.issn)
            .filter(|issn| !issn.is_empty())
            .collect();

        debug!(count = issns.len(), "ISSNs matching category/quartile filter");
        Ok(issns)
    }

    /// ISSNs belonging to any of `area_names`
    fn area_issns(&self, area_names: &BTreeSet<String>) -> Result<BTreeSet<String>> {
        let relations = self
            .basic
            .fan_out_categories("area relations", |h| h.get_journal_areas_in(area_names))?;

        let issns: BTreeSet<String> = relations
            .into_iter()
            .filter(|r| area_names.contains(&r.area_id))
            .map(|r| r.issn)
            .filter(|issn| !issn.is_empty())
            .collect();

        debug!(count = issns.len(), "ISSNs matching area filter");
        Ok(issns)
    }

    /// One batched graph fetch for the whole ISSN set
    ///
    /// ISSNs with no journal record (dangling relations) simply produce nothing.
    fn journals_for(&self, issns: &BTreeSet<String>) -> Result<Vec<Journal>> {
        if issns.is_empty() {
            return Ok(Vec::new());
        }
        let mut journals = self.basic.get_journals_with_issn(issns)?;
        journals.retain(|j| crate::handlers::matches_any_issn(j, issns));
        Ok(journals)
    }

    // ========================================================================
    // MASHUP QUERIES
    // ========================================================================

    /// Journals ranked in any of `category_names` at any of `quartiles`
    ///
    /// Ordered by title (case-insensitive), then primary ISSN. A journal that
    /// qualifies through several categories appears once.
    pub fn get_journals_in_categories_with_quartile(
        &self,
        category_names: &BTreeSet<String>,
        quartiles: &BTreeSet<Quartile>,
    ) -> Result<Vec<Journal>> {
        self.require_both()?;
        if category_names.is_empty() || quartiles.is_empty() {
            return Ok(Vec::new());
        }

        let issns = self.category_issns(category_names, quartiles)?;
        let journals = self.journals_for(&issns)?;

        info!(
            categories = category_names.len(),
            quartiles = quartiles.len(),
            results = journals.len(),
            "Journals in categories with quartile"
        );
        Ok(journals)
    }

    /// Journals in any of `area_names` whose license is one of `licenses`
    ///
    /// License lives only in the graph store, so it is filtered after the fetch.
    pub fn get_journals_in_areas_with_license(
        &self,
        area_names: &BTreeSet<String>,
        licenses: &BTreeSet<String>,
    ) -> Result<Vec<Journal>> {
        self.require_both()?;
        if area_names.is_empty() || licenses.is_empty() {
            return Ok(Vec::new());
        }

        let issns = self.area_issns(area_names)?;
        let mut journals = self.journals_for(&issns)?;
        journals.retain(|j| licenses.contains(j.license()));

        info!(
            areas = area_names.len(),
            licenses = licenses.len(),
            results = journals.len(),
            "Journals in areas with license"
        );
        Ok(journals)
    }

    /// Journals without APC that are in one of `area_names` AND ranked in one of
    /// `category_names` at one of `quartiles`
    pub fn get_diamond_journals_in_areas_and_categories_with_quartile(
        &self,
        area_names: &BTreeSet<String>,
        category_names: &BTreeSet<String>,
        quartiles: &BTreeSet<Quartile>,
    ) -> Result<Vec<Journal>> {
        self.require_both()?;
        if area_names.is_empty() || category_names.is_empty() || quartiles.is_empty() {
            return Ok(Vec::new());
        }

        let in_areas = self.area_issns(area_names)?;
        if in_areas.is_empty() {
            return Ok(Vec::new());
        }

        let in_categories = self.category_issns(category_names, quartiles)?;
        let both: BTreeSet<String> = in_areas.intersection(&in_categories).cloned().collect();

        let mut journals = self.journals_for(&both)?;
        journals.retain(Journal::is_diamond);

        info!(
            areas = area_names.len(),
            categories = category_names.len(),
            quartiles = quartiles.len(),
            results = journals.len(),
            "Diamond journals in areas and categories with quartile"
        );
        Ok(journals)
    }
}

impl From<BasicQueryEngine> for FullQueryEngine {
    fn from(basic: BasicQueryEngine) -> Self {
        FullQueryEngine { basic }
    }
}
