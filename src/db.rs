// 🗄️ Relational Store - Scimago categories and areas in SQLite
//
// Tables:
//   areas(id)
//   categories(id, quartile)
//   journal_categories(issn, category_id, quartile)
//   journal_areas(issn, area_id)
//
// A missing quartile is stored as '' so that the composite keys deduplicate.

use crate::entities::{Area, AreaRelation, Category, CategoryRelation, Quartile};
use crate::error::{Error, Result};
use crate::parser::ScimagoRecord;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::BTreeSet;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Entity tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS areas (
            id TEXT PRIMARY KEY
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT NOT NULL,
            quartile TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (id, quartile)
        )",
        [],
    )?;

    // ==========================================================================
    // Relation tables (every issn/category/quartile triple is its own row)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS journal_categories (
            issn TEXT NOT NULL,
            category_id TEXT NOT NULL,
            quartile TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (issn, category_id, quartile)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS journal_areas (
            issn TEXT NOT NULL,
            area_id TEXT NOT NULL,
            PRIMARY KEY (issn, area_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_journal_categories_category
         ON journal_categories(category_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_journal_categories_quartile
         ON journal_categories(quartile)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_journal_areas_area ON journal_areas(area_id)",
        [],
    )?;

    Ok(())
}

/// Insert Scimago records; re-importing the same file writes nothing new
///
/// Returns the number of rows actually written across all four tables.
pub fn insert_scimago_records(conn: &Connection, records: &[ScimagoRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut written = 0;

    {
        let mut insert_area = tx.prepare("INSERT OR IGNORE INTO areas (id) VALUES (?1)")?;
        let mut insert_category =
            tx.prepare("INSERT OR IGNORE INTO categories (id, quartile) VALUES (?1, ?2)")?;
        let mut insert_journal_category = tx.prepare(
            "INSERT OR IGNORE INTO journal_categories (issn, category_id, quartile)
             VALUES (?1, ?2, ?3)",
        )?;
        let mut insert_journal_area =
            tx.prepare("INSERT OR IGNORE INTO journal_areas (issn, area_id) VALUES (?1, ?2)")?;

        for record in records {
            for area in &record.areas {
                written += insert_area.execute(params![area])?;
            }

            for category in &record.categories {
                let quartile = quartile_column(category.quartile);
                written += insert_category.execute(params![category.id, quartile])?;
            }

            for issn in &record.identifiers {
                for category in &record.categories {
                    let quartile = quartile_column(category.quartile);
                    written +=
                        insert_journal_category.execute(params![issn, category.id, quartile])?;
                }
                for area in &record.areas {
                    written += insert_journal_area.execute(params![issn, area])?;
                }
            }
        }
    }

    tx.commit()?;
    Ok(written)
}

fn quartile_column(quartile: Option<Quartile>) -> &'static str {
    quartile.map(|q| q.as_str()).unwrap_or("")
}

fn parse_quartile(table: &str, raw: &str) -> Result<Option<Quartile>> {
    Quartile::parse_optional(Some(raw)).map_err(|e| Error::malformed(table, e))
}

/// "?1, ?2, ..." for an IN clause
fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// READ QUERIES
// ============================================================================

pub fn get_all_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT id, quartile FROM categories ORDER BY id, quartile",
    )?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, quartile)| Category::new(&id, parse_quartile("categories", &quartile)?))
        .collect()
}

pub fn get_all_areas(conn: &Connection) -> Result<Vec<Area>> {
    let mut stmt = conn.prepare("SELECT DISTINCT id FROM areas ORDER BY id")?;

    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    ids.iter().map(|id| Area::new(id)).collect()
}

/// Journal/category rows whose quartile is in `quartiles`
pub fn get_categories_with_quartile(
    conn: &Connection,
    quartiles: &BTreeSet<Quartile>,
) -> Result<Vec<CategoryRelation>> {
    if quartiles.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT issn, category_id, quartile FROM journal_categories
         WHERE quartile IN ({})
         ORDER BY category_id, issn, quartile",
        placeholders(quartiles.len())
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params_from_iter(quartiles.iter().map(|q| q.as_str())), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(issn, category_id, quartile)| {
            Ok(CategoryRelation::new(
                &issn,
                &category_id,
                parse_quartile("journal_categories", &quartile)?,
            ))
        })
        .collect()
}

/// Journal/area rows for the given areas
pub fn get_journal_areas_in(
    conn: &Connection,
    area_ids: &BTreeSet<String>,
) -> Result<Vec<AreaRelation>> {
    select_area_relations(conn, "area_id", area_ids)
}

/// Journal/area rows for the given journals
pub fn get_areas_of_journals(
    conn: &Connection,
    issns: &BTreeSet<String>,
) -> Result<Vec<AreaRelation>> {
    select_area_relations(conn, "issn", issns)
}

fn select_area_relations(
    conn: &Connection,
    column: &str,
    keys: &BTreeSet<String>,
) -> Result<Vec<AreaRelation>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT issn, area_id FROM journal_areas
         WHERE {} IN ({})
         ORDER BY area_id, issn",
        column,
        placeholders(keys.len())
    );
    let mut stmt = conn.prepare(&sql)?;

    let relations = stmt
        .query_map(params_from_iter(keys.iter()), |row| {
            let issn: String = row.get(0)?;
            let area_id: String = row.get(1)?;
            Ok(AreaRelation::new(&issn, &area_id))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(relations)
}

/// Categories held by journals that belong to any of the given areas
pub fn get_categories_assigned_to_areas(
    conn: &Connection,
    area_ids: &BTreeSet<String>,
) -> Result<Vec<Category>> {
    if area_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT DISTINCT jc.category_id, jc.quartile
         FROM journal_categories jc
         JOIN journal_areas ja ON jc.issn = ja.issn
         WHERE ja.area_id IN ({})
         ORDER BY jc.category_id, jc.quartile",
        placeholders(area_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params_from_iter(area_ids.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, quartile)| {
            Category::new(&id, parse_quartile("journal_categories", &quartile)?)
        })
        .collect()
}

/// Areas of journals that hold any of the given categories
pub fn get_areas_assigned_to_categories(
    conn: &Connection,
    category_ids: &BTreeSet<String>,
) -> Result<Vec<Area>> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT DISTINCT ja.area_id
         FROM journal_areas ja
         JOIN journal_categories jc ON ja.issn = jc.issn
         WHERE jc.category_id IN ({})
         ORDER BY ja.area_id",
        placeholders(category_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;

    let ids = stmt
        .query_map(params_from_iter(category_ids.iter()), |row| {
            row.get::<_, String>(0)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    ids.iter().map(|id| Area::new(id)).collect()
}

/// Category rows with this name (one per quartile it was seen at)
pub fn find_categories(conn: &Connection, id: &str) -> Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, quartile FROM categories WHERE id = ?1 ORDER BY quartile")?;

    let rows = stmt
        .query_map([id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, quartile)| Category::new(&id, parse_quartile("categories", &quartile)?))
        .collect()
}

pub fn find_area(conn: &Connection, id: &str) -> Result<Option<Area>> {
    let mut stmt = conn.prepare("SELECT id FROM areas WHERE id = ?1")?;
    let mut rows = stmt.query([id])?;

    match rows.next()? {
        Some(row) => {
            let id: String = row.get(0)?;
            Ok(Some(Area::new(&id)?))
        }
        None => Ok(None),
    }
}

/// Row count of one of the store tables
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    match table {
        "areas" | "categories" | "journal_categories" | "journal_areas" => {}
        other => return Err(Error::InvalidInput(format!("unknown table '{}'", other))),
    }

    let count: i64 =
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ScimagoCategory, ScimagoRecord};

    fn record(issns: &[&str], categories: &[(&str, Option<Quartile>)], areas: &[&str]) -> ScimagoRecord {
        ScimagoRecord {
            identifiers: issns.iter().map(|s| s.to_string()).collect(),
            categories: categories
                .iter()
                .map(|(id, quartile)| ScimagoCategory {
                    id: id.to_string(),
                    quartile: *quartile,
                })
                .collect(),
            areas: areas.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let records = vec![
            record(
                &["1111-1111", "1111-2222"],
                &[("Oncology", Some(Quartile::Q1)), ("Surgery", Some(Quartile::Q3))],
                &["Medicine"],
            ),
            record(
                &["3333-3333"],
                &[("Oncology", Some(Quartile::Q2)), ("History", None)],
                &["Medicine", "Arts and Humanities"],
            ),
        ];
        insert_scimago_records(&conn, &records).unwrap();
        conn
    }

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    #[test]
    fn test_import_twice_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let records = vec![record(&["1111-1111"], &[("Oncology", Some(Quartile::Q1))], &["Medicine"])];

        let first = insert_scimago_records(&conn, &records).unwrap();
        let second = insert_scimago_records(&conn, &records).unwrap();

        assert_eq!(first, 4, "area + category + two relation rows");
        assert_eq!(second, 0, "second import should write nothing");
        assert_eq!(count_rows(&conn, "journal_categories").unwrap(), 1);
    }

    #[test]
    fn test_same_category_at_two_quartiles_kept() {
        let conn = seeded();

        let categories = get_all_categories(&conn).unwrap();
        let oncology: Vec<_> = categories.iter().filter(|c| c.name() == "Oncology").collect();

        assert_eq!(oncology.len(), 2);
        assert_eq!(oncology[0].quartile(), Some(Quartile::Q1));
        assert_eq!(oncology[1].quartile(), Some(Quartile::Q2));
    }

    #[test]
    fn test_missing_quartile_round_trips_as_none() {
        let conn = seeded();

        let history = find_categories(&conn, "History").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quartile(), None);
    }

    #[test]
    fn test_categories_with_quartile_returns_relations() {
        let conn = seeded();

        let rows = get_categories_with_quartile(&conn, &set(&[Quartile::Q1])).unwrap();

        // Both identifiers of the first journal carry the Q1 relation
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.category_id == "Oncology"));
        assert!(rows.iter().any(|r| r.issn == "1111-2222"));
    }

    #[test]
    fn test_empty_filters_return_nothing() {
        let conn = seeded();

        assert!(get_categories_with_quartile(&conn, &BTreeSet::new()).unwrap().is_empty());
        assert!(get_journal_areas_in(&conn, &BTreeSet::new()).unwrap().is_empty());
        assert!(get_areas_of_journals(&conn, &BTreeSet::new()).unwrap().is_empty());
        assert!(get_categories_assigned_to_areas(&conn, &BTreeSet::new()).unwrap().is_empty());
        assert!(get_areas_assigned_to_categories(&conn, &BTreeSet::new()).unwrap().is_empty());
    }

    #[test]
    fn test_area_relations_both_directions() {
        let conn = seeded();

        let by_area = get_journal_areas_in(&conn, &set(&["Arts and Humanities".to_string()])).unwrap();
        assert_eq!(by_area, vec![AreaRelation::new("3333-3333", "Arts and Humanities")]);

        let by_issn = get_areas_of_journals(&conn, &set(&["3333-3333".to_string()])).unwrap();
        assert_eq!(by_issn.len(), 2);
    }

    #[test]
    fn test_cross_assignment_queries() {
        let conn = seeded();

        let categories =
            get_categories_assigned_to_areas(&conn, &set(&["Arts and Humanities".to_string()])).unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["History", "Oncology"]);

        let areas = get_areas_assigned_to_categories(&conn, &set(&["Surgery".to_string()])).unwrap();
        let names: Vec<&str> = areas.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Medicine"]);
    }

    #[test]
    fn test_find_area() {
        let conn = seeded();

        assert_eq!(find_area(&conn, "Medicine").unwrap(), Some(Area::new("Medicine").unwrap()));
        assert_eq!(find_area(&conn, "Physics").unwrap(), None);
    }

    #[test]
    fn test_count_rows_rejects_unknown_table() {
        let conn = seeded();
        assert_eq!(count_rows(&conn, "areas").unwrap(), 2);
        assert!(count_rows(&conn, "sqlite_master; DROP TABLE areas").is_err());
    }
}
