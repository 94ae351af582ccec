//! Schema versions for the `http` cache database.
//!
//! Applied versions are recorded in `_migrations`. A migration and its
//! version row commit together, so a failed step leaves the previous
//! version in place and the next open retries it.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// One schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by `version`, strictly increasing.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "http table", sql: include_str!("../../migrations/001_http.sql") },
    Migration { version: 2, name: "http expire index", sql: include_str!("../../migrations/002_http_expire_index.sql") },
];

/// Bring the schema up to the latest version.
///
/// # Errors
///
/// `Error::MigrationFailed` names the version whose SQL was rejected;
/// versions before it stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| apply_pending(conn, MIGRATIONS)).await.map_err(Error::from)
}

fn apply_pending(conn: &mut rusqlite::Connection, migrations: &[Migration]) -> Result<(), Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )?;

    let current = current_version(conn)?;
    let mut applied = 0;

    for migration in migrations.iter().filter(|m| m.version > current) {
        tracing::debug!("applying cache schema v{} ({})", migration.version, migration.name);

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| Error::MigrationFailed(format!("v{} {}: {e}", migration.version, migration.name)))?;
        tx.execute(
            "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
            params![migration.version, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        applied += 1;
    }

    if applied > 0 {
        tracing::info!("cache schema at v{} ({} applied)", current_version(conn)?, applied);
    }

    Ok(())
}

fn current_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
}
