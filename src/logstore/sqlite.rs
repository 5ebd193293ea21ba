//! SQLite-backed log store
//!
//! One `logs` table indexed on `time`, the only column nearly every log
//! query constrains.

use super::filter::LogFilter;
use super::{LogStore, LogStoreResult};
use crate::model::LogLine;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use std::path::Path;
use std::sync::Mutex;

const SELECT_COLUMNS: &str = "time, lineno, class, type, options, message, state, state_type, \
     attempt, host_name, service_description, contact_name, plugin_output, command_name";

/// Log history kept in a SQLite database
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
}

impl SqliteLogStore {
    /// Create or open a log database file
    pub fn open(path: &Path) -> LogStoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let store = Self::init(conn)?;
        tracing::info!(path = %path.display(), "Opened log store");
        Ok(store)
    }

    /// Private in-memory database, mainly for tests
    pub fn open_in_memory() -> LogStoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> LogStoreResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS logs (
                time INTEGER NOT NULL,
                lineno INTEGER NOT NULL DEFAULT 0,
                class INTEGER NOT NULL DEFAULT 0,
                type TEXT NOT NULL DEFAULT '',
                options TEXT NOT NULL DEFAULT '',
                message TEXT NOT NULL DEFAULT '',
                state INTEGER NOT NULL DEFAULT 0,
                state_type TEXT NOT NULL DEFAULT '',
                attempt INTEGER NOT NULL DEFAULT 0,
                host_name TEXT NOT NULL DEFAULT '',
                service_description TEXT NOT NULL DEFAULT '',
                contact_name TEXT NOT NULL DEFAULT '',
                plugin_output TEXT NOT NULL DEFAULT '',
                command_name TEXT NOT NULL DEFAULT ''
            )",
            [],
        )?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_logs_time ON logs(time)", [])?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another reader panicked mid-query
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append one log line
    pub fn insert(&self, line: &LogLine) -> LogStoreResult<()> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO logs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SELECT_COLUMNS
        ))?;
        stmt.execute(params![
            line.time,
            line.lineno,
            line.class,
            line.log_type,
            line.options,
            line.message,
            line.state,
            line.state_type,
            line.attempt,
            line.host_name,
            line.service_description,
            line.contact_name,
            line.plugin_output,
            line.command_name,
        ])?;
        Ok(())
    }

    /// Delete lines older than `days` days; returns the number removed
    pub fn purge_older_than(&self, days: u32) -> LogStoreResult<usize> {
        let cutoff = chrono::Utc::now().timestamp() - i64::from(days) * 86_400;
        let removed = self
            .lock()
            .execute("DELETE FROM logs WHERE time < ?", params![cutoff])?;
        if removed > 0 {
            tracing::info!(removed, days, "Purged old log lines");
        }
        Ok(removed)
    }

    pub fn count(&self) -> LogStoreResult<u64> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn read_line(row: &Row<'_>) -> rusqlite::Result<LogLine> {
    Ok(LogLine {
        time: row.get(0)?,
        lineno: row.get(1)?,
        class: row.get(2)?,
        log_type: row.get(3)?,
        options: row.get(4)?,
        message: row.get(5)?,
        state: row.get(6)?,
        state_type: row.get(7)?,
        attempt: row.get(8)?,
        host_name: row.get(9)?,
        service_description: row.get(10)?,
        contact_name: row.get(11)?,
        plugin_output: row.get(12)?,
        command_name: row.get(13)?,
    })
}

impl LogStore for SqliteLogStore {
    fn log_lines(&self, filter: &LogFilter, limit: Option<usize>) -> LogStoreResult<Vec<LogLine>> {
        let (clause, params) = filter
            .where_clause()
            .unwrap_or_else(|| ("1 = 1".to_string(), Vec::new()));
        let mut sql = format!(
            "SELECT {} FROM logs WHERE {} ORDER BY time, lineno",
            SELECT_COLUMNS, clause
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        tracing::debug!(sql = %sql, "Log store query");

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let lines = stmt
            .query_map(params_from_iter(params), read_line)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
    }
}
