use buildtrace_types::{CacheStatus, PackageId, RunId, TaskId, TaskResult};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{Error, Result, records::TaskRecord};

pub fn insert(conn: &Connection, run_id: RunId, result: &TaskResult) -> Result<TaskId> {
    if result.name.trim().is_empty() {
        return Err(Error::Validation("task name is empty".to_string()));
    }
    if result.hash.trim().is_empty() {
        return Err(Error::Validation("task hash is empty".to_string()));
    }

    conn.execute(
        r#"
        INSERT INTO tasks (run_id, name, hash, package_id, start_time, end_time,
                           cache_status, exit_code, logs)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            run_id.as_i64(),
            &result.name,
            &result.hash,
            result.package_id.as_i64(),
            result.start_time,
            result.end_time,
            result.cache_status.as_str(),
            &result.exit_code,
            &result.logs,
        ],
    )?;

    Ok(TaskId::new(conn.last_insert_rowid()))
}

pub fn add_dependency(conn: &Connection, dependent: TaskId, dependency: TaskId) -> Result<()> {
    if dependent == dependency {
        return Err(Error::Validation(format!(
            "task {} cannot depend on itself",
            dependent
        )));
    }

    conn.execute(
        r#"
        INSERT INTO task_dependencies (dependent_id, dependency_id)
        VALUES (?1, ?2)
        "#,
        params![dependent.as_i64(), dependency.as_i64()],
    )?;

    Ok(())
}

pub fn get(conn: &Connection, id: TaskId) -> Result<Option<TaskRecord>> {
    let result = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_TASK),
            [id.as_i64()],
            map_row,
        )
        .optional()?;

    Ok(result)
}

/// Tasks belonging to one run, in insertion order.
pub fn for_run(conn: &Connection, run_id: RunId) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!("{} WHERE run_id = ?1 ORDER BY id", SELECT_TASK))?;
    let tasks = stmt
        .query_map([run_id.as_i64()], map_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(tasks)
}

/// All recorded executions sharing a content hash, across runs.
pub fn by_hash(conn: &Connection, hash: &str) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!("{} WHERE hash = ?1 ORDER BY id", SELECT_TASK))?;
    let tasks = stmt
        .query_map([hash], map_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(tasks)
}

/// Direct dependencies of a task.
pub fn dependencies_of(conn: &Connection, id: TaskId) -> Result<Vec<TaskId>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT dependency_id
        FROM task_dependencies
        WHERE dependent_id = ?1
        ORDER BY dependency_id
        "#,
    )?;
    let ids = stmt
        .query_map([id.as_i64()], |row| Ok(TaskId::new(row.get(0)?)))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(ids)
}

/// Direct dependents of a task.
pub fn dependents_of(conn: &Connection, id: TaskId) -> Result<Vec<TaskId>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT dependent_id
        FROM task_dependencies
        WHERE dependency_id = ?1
        ORDER BY dependent_id
        "#,
    )?;
    let ids = stmt
        .query_map([id.as_i64()], |row| Ok(TaskId::new(row.get(0)?)))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(ids)
}

/// Transitive dependency closure of a task, excluding the task itself.
///
/// Task graphs are DAGs at the domain level, but the recursive CTE uses
/// UNION (not UNION ALL) so a defective cyclic graph still terminates.
pub fn dependency_closure(conn: &Connection, id: TaskId) -> Result<Vec<TaskId>> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM tasks WHERE id = ?1", [id.as_i64()], |row| {
            row.get(0)
        })
        .optional()?;
    if exists.is_none() {
        return Err(Error::NotFound {
            entity: "task",
            id: id.as_i64(),
        });
    }

    let mut stmt = conn.prepare(
        r#"
        WITH RECURSIVE closure(id) AS (
            SELECT dependency_id FROM task_dependencies WHERE dependent_id = ?1
            UNION
            SELECT td.dependency_id
            FROM task_dependencies td
            JOIN closure c ON td.dependent_id = c.id
        )
        SELECT id FROM closure ORDER BY id
        "#,
    )?;
    let ids = stmt
        .query_map([id.as_i64()], |row| Ok(TaskId::new(row.get(0)?)))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(ids)
}

const SELECT_TASK: &str = r#"
    SELECT id, run_id, name, hash, package_id, start_time, end_time,
           cache_status, exit_code, logs
    FROM tasks
"#;

fn map_row(row: &Row<'_>) -> std::result::Result<TaskRecord, rusqlite::Error> {
    let cache_status: String = row.get(7)?;
    let cache_status = cache_status.parse::<CacheStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(TaskRecord {
        id: TaskId::new(row.get(0)?),
        run_id: RunId::new(row.get(1)?),
        name: row.get(2)?,
        hash: row.get(3)?,
        package_id: PackageId::new(row.get(4)?),
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        cache_status,
        exit_code: row.get(8)?,
        logs: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use buildtrace_types::{ClientInfo, RunMetadata, VcsInfo};

    use super::*;
    use crate::Database;

    fn seeded(db: &Database) -> (RunId, PackageId) {
        let run_id = db
            .create_run(&RunMetadata {
                command: "build".to_string(),
                package_inference_root: None,
                context: "local".to_string(),
                vcs: VcsInfo::default(),
                origination_user: "alice".to_string(),
                client: ClientInfo::new("cli", "buildtrace", "1.0"),
                start_time: 1_000,
            })
            .unwrap();
        let package_id = db.upsert_package("web", "apps/web").unwrap();
        (run_id, package_id)
    }

    fn task(package_id: PackageId, name: &str, hash: &str) -> TaskResult {
        TaskResult {
            name: name.to_string(),
            hash: hash.to_string(),
            package_id,
            start_time: 1_000,
            end_time: 2_000,
            cache_status: CacheStatus::Miss,
            exit_code: Some(0),
            logs: String::new(),
        }
    }

    #[test]
    fn test_hash_and_logs_round_trip_verbatim() -> Result<()> {
        let db = Database::open_in_memory()?;
        let (run_id, package_id) = seeded(&db);

        let mut result = task(package_id, "build", "abc123");
        result.logs = "line one\n\tline two\r\nunicode: ✓ 日本語\n".to_string();
        let id = db.record_task(run_id, &result)?;

        let stored = db.get_task(id)?.unwrap();
        assert_eq!(stored.hash, "abc123");
        assert_eq!(stored.logs, result.logs);
        assert_eq!(stored.cache_status, CacheStatus::Miss);
        assert_eq!(stored.exit_code, Some(0));

        Ok(())
    }

    #[test]
    fn test_task_with_unknown_run_fails() {
        let db = Database::open_in_memory().unwrap();
        let package_id = db.upsert_package("web", "apps/web").unwrap();

        let err = db
            .record_task(RunId::new(999), &task(package_id, "build", "abc"))
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));
    }

    #[test]
    fn test_task_with_unknown_package_fails() {
        let db = Database::open_in_memory().unwrap();
        let (run_id, _) = seeded(&db);

        let err = db
            .record_task(run_id, &task(PackageId::new(999), "build", "abc"))
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));
    }

    #[test]
    fn test_dependency_closure_is_transitive() -> Result<()> {
        let db = Database::open_in_memory()?;
        let (run_id, package_id) = seeded(&db);

        // lint <- build <- test, plus test -> lint directly
        let lint = db.record_task(run_id, &task(package_id, "lint", "h1"))?;
        let build = db.record_task(run_id, &task(package_id, "build", "h2"))?;
        let test = db.record_task(run_id, &task(package_id, "test", "h3"))?;

        db.add_task_dependency(build, lint)?;
        db.add_task_dependency(test, build)?;
        db.add_task_dependency(test, lint)?;

        let closure = db.task_dependency_closure(test)?;
        assert_eq!(closure, vec![lint, build]);

        assert_eq!(db.task_dependencies(test)?, vec![lint, build]);
        assert_eq!(db.task_dependents(lint)?, vec![build, test]);
        assert!(db.task_dependency_closure(lint)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_closure_of_unknown_task_is_not_found() {
        let db = Database::open_in_memory().unwrap();

        let err = db.task_dependency_closure(TaskId::new(999)).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "task", .. }));
    }

    #[test]
    fn test_edge_with_unknown_endpoint_leaves_store_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let (run_id, package_id) = seeded(&db);
        let t1 = db.record_task(run_id, &task(package_id, "build", "abc123")).unwrap();

        let err = db.add_task_dependency(TaskId::new(999), t1).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));

        assert!(db.task_dependencies(t1).unwrap().is_empty());
        assert!(db.task_dependents(t1).unwrap().is_empty());
    }

    #[test]
    fn test_tasks_by_hash_spans_runs() -> Result<()> {
        let db = Database::open_in_memory()?;
        let (run_one, package_id) = seeded(&db);
        let (run_two, _) = seeded(&db);

        let mut hit = task(package_id, "build", "shared");
        hit.cache_status = CacheStatus::Remote;

        db.record_task(run_one, &task(package_id, "build", "shared"))?;
        db.record_task(run_two, &hit)?;

        let executions = db.tasks_by_hash("shared")?;
        assert_eq!(executions.len(), 2);
        assert_eq!(executions[0].run_id, run_one);
        assert_eq!(executions[1].run_id, run_two);
        assert_eq!(executions[1].cache_status, CacheStatus::Remote);

        Ok(())
    }
}
