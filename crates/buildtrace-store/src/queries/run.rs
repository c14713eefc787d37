use buildtrace_types::{RunId, RunMetadata, RunStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{Error, Result, records::RunRecord};

pub fn insert(conn: &Connection, metadata: &RunMetadata) -> Result<RunId> {
    validate(metadata)?;

    conn.execute(
        r#"
        INSERT INTO runs (start_time, end_time, exit_code, status, command,
                          package_inference_root, context, git_branch, git_sha,
                          origination_user, client_id, client_name, client_version,
                          full_cache_hit)
        VALUES (?1, NULL, NULL, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)
        "#,
        params![
            metadata.start_time,
            RunStatus::Pending.as_str(),
            &metadata.command,
            &metadata.package_inference_root,
            &metadata.context,
            &metadata.vcs.branch,
            &metadata.vcs.sha,
            &metadata.origination_user,
            &metadata.client.id,
            &metadata.client.name,
            &metadata.client.version,
        ],
    )?;

    Ok(RunId::new(conn.last_insert_rowid()))
}

/// Close an open run. Runs close exactly once; completing an
/// already-closed run is rejected with `Error::Conflict`.
pub fn complete(
    conn: &Connection,
    id: RunId,
    end_time: i64,
    exit_code: i32,
    status: RunStatus,
) -> Result<()> {
    if !status.is_terminal() {
        return Err(Error::Validation(format!(
            "cannot complete a run with non-terminal status '{}'",
            status
        )));
    }

    let tx = conn.unchecked_transaction()?;

    let existing: Option<Option<i64>> = tx
        .query_row(
            "SELECT end_time FROM runs WHERE id = ?1",
            [id.as_i64()],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        None => {
            return Err(Error::NotFound {
                entity: "run",
                id: id.as_i64(),
            });
        }
        Some(Some(_)) => {
            return Err(Error::Conflict(format!("run {} is already completed", id)));
        }
        Some(None) => {}
    }

    tx.execute(
        r#"
        UPDATE runs
        SET end_time = ?2, exit_code = ?3, status = ?4
        WHERE id = ?1
        "#,
        params![id.as_i64(), end_time, exit_code, status.as_str()],
    )?;

    tx.commit()?;
    Ok(())
}

/// Recompute the full-cache-hit flag for an open run: true when the run
/// has at least one task and none of them missed cache. Returns the
/// value that was stored.
pub fn mark_full_cache_hit(conn: &Connection, id: RunId) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;

    let end_time: Option<Option<i64>> = tx
        .query_row(
            "SELECT end_time FROM runs WHERE id = ?1",
            [id.as_i64()],
            |row| row.get(0),
        )
        .optional()?;

    match end_time {
        None => {
            return Err(Error::NotFound {
                entity: "run",
                id: id.as_i64(),
            });
        }
        Some(Some(_)) => {
            return Err(Error::Conflict(format!("run {} is already completed", id)));
        }
        Some(None) => {}
    }

    let (total, misses): (i64, i64) = tx.query_row(
        r#"
        SELECT COUNT(*),
               COUNT(CASE WHEN cache_status = 'miss' THEN 1 END)
        FROM tasks
        WHERE run_id = ?1
        "#,
        [id.as_i64()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let full_cache_hit = total > 0 && misses == 0;
    tx.execute(
        "UPDATE runs SET full_cache_hit = ?2 WHERE id = ?1",
        params![id.as_i64(), full_cache_hit],
    )?;

    tx.commit()?;
    Ok(full_cache_hit)
}

pub fn get(conn: &Connection, id: RunId) -> Result<Option<RunRecord>> {
    let result = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_RUN),
            [id.as_i64()],
            map_row,
        )
        .optional()?;

    Ok(result)
}

pub fn list(conn: &Connection, limit: Option<usize>) -> Result<Vec<RunRecord>> {
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        "{} ORDER BY start_time DESC, id DESC {}",
        SELECT_RUN, limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let runs = stmt
        .query_map([], map_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(runs)
}

const SELECT_RUN: &str = r#"
    SELECT id, start_time, end_time, exit_code, status, command,
           package_inference_root, context, git_branch, git_sha,
           origination_user, client_id, client_name, client_version,
           full_cache_hit
    FROM runs
"#;

fn map_row(row: &Row<'_>) -> std::result::Result<RunRecord, rusqlite::Error> {
    let status: String = row.get(4)?;
    let status = status.parse::<RunStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(RunRecord {
        id: RunId::new(row.get(0)?),
        start_time: row.get(1)?,
        end_time: row.get(2)?,
        exit_code: row.get(3)?,
        status,
        command: row.get(5)?,
        package_inference_root: row.get(6)?,
        context: row.get(7)?,
        git_branch: row.get(8)?,
        git_sha: row.get(9)?,
        origination_user: row.get(10)?,
        client_id: row.get(11)?,
        client_name: row.get(12)?,
        client_version: row.get(13)?,
        full_cache_hit: row.get(14)?,
    })
}

fn validate(metadata: &RunMetadata) -> Result<()> {
    let required = [
        ("command", &metadata.command),
        ("context", &metadata.context),
        ("origination_user", &metadata.origination_user),
        ("client_id", &metadata.client.id),
        ("client_name", &metadata.client.name),
        ("client_version", &metadata.client.version),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!(
                "required run field '{}' is empty",
                field
            )));
        }
    }

    Ok(())
}
