use buildtrace_types::PackageId;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    Error, Result,
    records::{PackageGraph, PackageRecord},
};

/// Insert a package or return the id of the existing (name, path) row.
pub fn upsert(conn: &Connection, name: &str, path: &str) -> Result<PackageId> {
    if name.trim().is_empty() {
        return Err(Error::Validation("package name is empty".to_string()));
    }
    if path.trim().is_empty() {
        return Err(Error::Validation("package path is empty".to_string()));
    }

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        r#"
        INSERT INTO packages (name, path)
        VALUES (?1, ?2)
        ON CONFLICT (name, path) DO NOTHING
        "#,
        params![name, path],
    )?;

    let id: i64 = tx.query_row(
        "SELECT id FROM packages WHERE name = ?1 AND path = ?2",
        params![name, path],
        |row| row.get(0),
    )?;

    tx.commit()?;
    Ok(PackageId::new(id))
}

pub fn add_dependency(conn: &Connection, dependent: PackageId, dependency: PackageId) -> Result<()> {
    if dependent == dependency {
        return Err(Error::Validation(format!(
            "package {} cannot depend on itself",
            dependent
        )));
    }

    conn.execute(
        r#"
        INSERT INTO package_dependencies (dependent_id, dependency_id)
        VALUES (?1, ?2)
        "#,
        params![dependent.as_i64(), dependency.as_i64()],
    )?;

    Ok(())
}

pub fn get(conn: &Connection, id: PackageId) -> Result<Option<PackageRecord>> {
    let result = conn
        .query_row(
            "SELECT id, name, path FROM packages WHERE id = ?1",
            [id.as_i64()],
            map_row,
        )
        .optional()?;

    Ok(result)
}

pub fn list(conn: &Connection) -> Result<Vec<PackageRecord>> {
    let mut stmt = conn.prepare("SELECT id, name, path FROM packages ORDER BY name, path")?;
    let packages = stmt
        .query_map([], map_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(packages)
}

/// Whole package dependency graph: all packages plus all edges.
pub fn graph(conn: &Connection) -> Result<PackageGraph> {
    let tx = conn.unchecked_transaction()?;

    let packages = {
        let mut stmt = tx.prepare("SELECT id, name, path FROM packages ORDER BY name, path")?;
        stmt.query_map([], map_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?
    };

    let edges = {
        let mut stmt = tx.prepare(
            r#"
            SELECT dependent_id, dependency_id
            FROM package_dependencies
            ORDER BY dependent_id, dependency_id
            "#,
        )?;
        stmt.query_map([], |row| {
            Ok((
                PackageId::new(row.get(0)?),
                PackageId::new(row.get(1)?),
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?
    };

    tx.commit()?;
    Ok(PackageGraph { packages, edges })
}

fn map_row(row: &Row<'_>) -> std::result::Result<PackageRecord, rusqlite::Error> {
    Ok(PackageRecord {
        id: PackageId::new(row.get(0)?),
        name: row.get(1)?,
        path: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_upsert_returns_existing_id() -> Result<()> {
        let db = Database::open_in_memory()?;

        let first = db.upsert_package("web", "apps/web")?;
        let second = db.upsert_package("web", "apps/web")?;
        assert_eq!(first, second);

        // Same name at a different path is a distinct package.
        let moved = db.upsert_package("web", "packages/web")?;
        assert_ne!(first, moved);

        assert_eq!(db.list_packages()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_upsert_rejects_empty_name() {
        let db = Database::open_in_memory().unwrap();

        let err = db.upsert_package("", "apps/web").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_dependency_edge_round_trips() -> Result<()> {
        let db = Database::open_in_memory()?;

        let web = db.upsert_package("web", "apps/web")?;
        let ui = db.upsert_package("ui", "packages/ui")?;
        db.add_package_dependency(web, ui)?;

        let graph = db.package_graph()?;
        assert_eq!(graph.packages.len(), 2);
        assert_eq!(graph.edges, vec![(web, ui)]);

        Ok(())
    }

    #[test]
    fn test_dependency_on_unknown_package_fails() {
        let db = Database::open_in_memory().unwrap();

        let web = db.upsert_package("web", "apps/web").unwrap();
        let err = db
            .add_package_dependency(web, PackageId::new(999))
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));

        // The failed insert left no edge behind.
        assert!(db.package_graph().unwrap().edges.is_empty());
    }

    #[test]
    fn test_self_dependency_is_rejected() {
        let db = Database::open_in_memory().unwrap();

        let web = db.upsert_package("web", "apps/web").unwrap();
        let err = db.add_package_dependency(web, web).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
