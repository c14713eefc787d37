use buildtrace_types::{ConfigId, ConfigSnapshot};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{Result, records::ConfigRecord};

pub fn insert(conn: &Connection, snapshot: &ConfigSnapshot) -> Result<ConfigId> {
    let global_deps = serde_json::to_string(&snapshot.global_deps)?;
    let global_env = serde_json::to_string(&snapshot.global_env)?;
    let task_definitions = serde_json::to_string(&snapshot.task_definitions)?;

    conn.execute(
        r#"
        INSERT INTO config (api_url, login_url, team_slug, team_id, signature,
                            preflight, timeout, global_deps, global_env,
                            task_definitions, cache_dir, root_config_path)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            &snapshot.api_url,
            &snapshot.login_url,
            &snapshot.team_slug,
            &snapshot.team_id,
            &snapshot.signature,
            &snapshot.preflight,
            &snapshot.timeout,
            &global_deps,
            &global_env,
            &task_definitions,
            &snapshot.cache_dir,
            &snapshot.root_config_path,
        ],
    )?;

    Ok(ConfigId::new(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: ConfigId) -> Result<Option<ConfigRecord>> {
    let raw = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_CONFIG),
            [id.as_i64()],
            map_row,
        )
        .optional()?;

    raw.map(RawConfig::into_record).transpose()
}

pub fn latest(conn: &Connection) -> Result<Option<ConfigRecord>> {
    let raw = conn
        .query_row(
            &format!("{} ORDER BY id DESC LIMIT 1", SELECT_CONFIG),
            [],
            map_row,
        )
        .optional()?;

    raw.map(RawConfig::into_record).transpose()
}

const SELECT_CONFIG: &str = r#"
    SELECT id, api_url, login_url, team_slug, team_id, signature, preflight,
           timeout, global_deps, global_env, task_definitions, cache_dir,
           root_config_path
    FROM config
"#;

// Row image before the JSON columns are deserialized.
struct RawConfig {
    record: ConfigRecord,
    global_deps: String,
    global_env: String,
    task_definitions: String,
}

impl RawConfig {
    fn into_record(self) -> Result<ConfigRecord> {
        let mut record = self.record;
        record.global_deps = serde_json::from_str(&self.global_deps)?;
        record.global_env = serde_json::from_str(&self.global_env)?;
        record.task_definitions = serde_json::from_str(&self.task_definitions)?;
        Ok(record)
    }
}

fn map_row(row: &Row<'_>) -> std::result::Result<RawConfig, rusqlite::Error> {
    Ok(RawConfig {
        record: ConfigRecord {
            id: ConfigId::new(row.get(0)?),
            api_url: row.get(1)?,
            login_url: row.get(2)?,
            team_slug: row.get(3)?,
            team_id: row.get(4)?,
            signature: row.get(5)?,
            preflight: row.get(6)?,
            timeout: row.get(7)?,
            global_deps: Vec::new(),
            global_env: Vec::new(),
            task_definitions: serde_json::Value::Null,
            cache_dir: row.get(11)?,
            root_config_path: row.get(12)?,
        },
        global_deps: row.get(8)?,
        global_env: row.get(9)?,
        task_definitions: row.get(10)?,
    })
}
