// SQLite-backed category/area handler
//
// A connection is opened per call and dropped when the call returns, on every
// path. The file must already exist: a missing database is an unavailable store,
// not an empty one.

use super::{CategoryQueryHandler, Handler};
use crate::db;
use crate::entities::{Area, AreaRelation, Category, CategoryRelation, Entity, Quartile};
use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SqliteCategoryHandler {
    db_path: String,
}

impl SqliteCategoryHandler {
    pub fn new(db_path: impl Into<String>) -> Self {
        SqliteCategoryHandler {
            db_path: db_path.into(),
        }
    }

    pub fn set_location(&mut self, db_path: impl Into<String>) {
        self.db_path = db_path.into();
    }

    /// Run `f` against a fresh connection; backend errors become `StoreUnavailable`
    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::unavailable(&self.db_path, e))?;

        debug!(db = %self.db_path, "Opened relational store");

        f(&conn).map_err(|e| match e {
            Error::Database(inner) => Error::unavailable(&self.db_path, inner),
            Error::MalformedRow { reason, .. } => Error::malformed(&self.db_path, reason),
            other => other,
        })
    }
}

impl Handler for SqliteCategoryHandler {
    fn location(&self) -> &str {
        &self.db_path
    }
}

impl CategoryQueryHandler for SqliteCategoryHandler {
    fn get_all_categories(&self) -> Result<Vec<Category>> {
        self.with_connection(db::get_all_categories)
    }

    fn get_all_areas(&self) -> Result<Vec<Area>> {
        self.with_connection(db::get_all_areas)
    }

    fn get_categories_with_quartile(
        &self,
        quartiles: &BTreeSet<Quartile>,
    ) -> Result<Vec<CategoryRelation>> {
        if quartiles.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| db::get_categories_with_quartile(conn, quartiles))
    }

    fn get_journal_areas_in(&self, area_ids: &BTreeSet<String>) -> Result<Vec<AreaRelation>> {
        if area_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| db::get_journal_areas_in(conn, area_ids))
    }

    fn get_areas_of_journals(&self, issns: &BTreeSet<String>) -> Result<Vec<AreaRelation>> {
        if issns.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| db::get_areas_of_journals(conn, issns))
    }

    fn get_categories_assigned_to_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<Vec<Category>> {
        if area_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| db::get_categories_assigned_to_areas(conn, area_ids))
    }

    fn get_areas_assigned_to_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Area>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| db::get_areas_assigned_to_categories(conn, category_ids))
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Entity>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        self.with_connection(|conn| {
            if let Some(category) = db::find_categories(conn, id)?.into_iter().next() {
                return Ok(Some(Entity::Category(category)));
            }
            Ok(db::find_area(conn, id)?.map(Entity::Area))
        })
    }
}
