// Category and Area Entities - Scimago rankings as read from the relational store
//
// The quartile lives on the journal<->category relation: the same category can
// appear at several quartiles across journals and source rows.

use super::{IdentifiableEntity, Identifiers};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// QUARTILE
// ============================================================================

/// Ranking tier within a category (Q1 highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quartile {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quartile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quartile::Q1 => "Q1",
            Quartile::Q2 => "Q2",
            Quartile::Q3 => "Q3",
            Quartile::Q4 => "Q4",
        }
    }

    /// Parse an optional store value: blank or "-" means no quartile
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Quartile>> {
        match raw.map(str::trim) {
            None | Some("") | Some("-") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

impl fmt::Display for Quartile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quartile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "Q1" => Ok(Quartile::Q1),
            "Q2" => Ok(Quartile::Q2),
            "Q3" => Ok(Quartile::Q3),
            "Q4" => Ok(Quartile::Q4),
            other => Err(Error::InvalidInput(format!("unknown quartile '{}'", other))),
        }
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    /// Category name, e.g. "Oncology"
    ids: Identifiers,

    quartile: Option<Quartile>,
}

impl Category {
    pub fn new(name: &str, quartile: Option<Quartile>) -> Result<Self> {
        Ok(Category {
            ids: Identifiers::new([name])?,
            quartile,
        })
    }

    pub fn name(&self) -> &str {
        self.ids.primary()
    }

    pub fn quartile(&self) -> Option<Quartile> {
        self.quartile
    }
}

impl IdentifiableEntity for Category {
    fn identifiers(&self) -> &Identifiers {
        &self.ids
    }
}

// ============================================================================
// AREA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Area {
    ids: Identifiers,
}

impl Area {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Area {
            ids: Identifiers::new([name])?,
        })
    }

    pub fn name(&self) -> &str {
        self.ids.primary()
    }
}

impl IdentifiableEntity for Area {
    fn identifiers(&self) -> &Identifiers {
        &self.ids
    }
}

// ============================================================================
// RELATIONS (join keys, not first-class entities)
// ============================================================================

/// One `journal_categories` row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryRelation {
    pub issn: String,
    pub category_id: String,
    pub quartile: Option<Quartile>,
}

impl CategoryRelation {
    pub fn new(issn: &str, category_id: &str, quartile: Option<Quartile>) -> Self {
        CategoryRelation {
            issn: issn.trim().to_string(),
            category_id: category_id.trim().to_string(),
            quartile,
        }
    }
}

/// One `journal_areas` row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AreaRelation {
    pub issn: String,
    pub area_id: String,
}

impl AreaRelation {
    pub fn new(issn: &str, area_id: &str) -> Self {
        AreaRelation {
            issn: issn.trim().to_string(),
            area_id: area_id.trim().to_string(),
        }
    }
}
