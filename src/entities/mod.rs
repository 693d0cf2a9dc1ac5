// Entity Model - journals (graph store), categories and areas (relational store)
//
// Entities are immutable value objects built fresh from store rows on every query.
// Identity is by key (ISSN / category name / area name), never by store location.

pub mod category;
pub mod journal;

pub use category::{Area, AreaRelation, Category, CategoryRelation, Quartile};
pub use journal::Journal;

use crate::error::{Error, Result};
use serde::Serialize;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Non-empty, duplicate-free list of identifiers, in insertion order
///
/// The first identifier is the primary key (print ISSN when a journal has one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifiers(Vec<String>);

impl Identifiers {
    /// Build from raw values; blanks are dropped, repeats collapse to the first occurrence
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() || cleaned.iter().any(|existing| existing == id) {
                continue;
            }
            cleaned.push(id.to_string());
        }

        if cleaned.is_empty() {
            return Err(Error::InvalidEntity(
                "an entity needs at least one identifier".to_string(),
            ));
        }

        Ok(Identifiers(cleaned))
    }

    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }
}

/// Anything addressable by one or more string keys
pub trait IdentifiableEntity {
    fn identifiers(&self) -> &Identifiers;

    fn ids(&self) -> &[String] {
        self.identifiers().as_slice()
    }

    fn primary_id(&self) -> &str {
        self.identifiers().primary()
    }
}

/// Result of an id lookup that may land in either store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Journal(Journal),
    Category(Category),
    Area(Area),
}
