//! Append-only processing log for jobs.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

impl ToSql for LogLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for LogLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub job_id: String,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: String,
}

impl LogEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            level: row.get("level")?,
            message: row.get("message")?,
            timestamp: row.get("timestamp")?,
        })
    }
}

/// Appends an entry stamped with the current time.
pub fn append(
    db: &Database,
    job_id: &str,
    level: LogLevel,
    message: &str,
) -> Result<i64, DatabaseError> {
    append_at(db, job_id, level, message, &now_timestamp())
}

pub fn append_at(
    db: &Database,
    job_id: &str,
    level: LogLevel,
    message: &str,
    timestamp: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processing_logs (job_id, level, message, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![job_id, level, message, timestamp],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Entries for one job, oldest first. Entries sharing a timestamp keep
/// insertion order.
pub fn list_for_job(db: &Database, job_id: &str) -> Result<Vec<LogEntry>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM processing_logs WHERE job_id = ?1 ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![job_id], LogEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
