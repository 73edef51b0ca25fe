//! Job repository for the `jobs` table.
//!
//! Status changes go through conditional updates so a job moves
//! PENDING → PROCESSING → COMPLETED | FAILED exactly once, even when two
//! workers race for it.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// The only status a job may be in right before entering `self`.
    pub fn predecessor(&self) -> Option<JobStatus> {
        match self {
            Self::Pending => None,
            Self::Processing => Some(Self::Pending),
            Self::Completed | Self::Failed => Some(Self::Processing),
        }
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        next.predecessor() == Some(*self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("Unknown job status: {}", other)),
        }
    }
}

impl ToSql for JobStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for JobStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// A raw job row from the database.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    pub job_id: String,
    pub filename: String,
    pub source_path: String,
    pub status: JobStatus,
    pub total_pages: Option<usize>,
    pub processed_pages: usize,
    pub documents_created: usize,
    pub error_message: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    /// Seconds between claim and terminal state.
    pub processing_time: Option<f64>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_id: row.get("job_id")?,
            filename: row.get("filename")?,
            source_path: row.get("source_path")?,
            status: row.get("status")?,
            total_pages: row.get("total_pages")?,
            processed_pages: row.get("processed_pages")?,
            documents_created: row.get("documents_created")?,
            error_message: row.get("error_message")?,
            created_at: row.get("created_at")?,
            started_at: row.get("started_at")?,
            completed_at: row.get("completed_at")?,
            processing_time: row.get("processing_time")?,
        })
    }
}

/// Counters written when a job completes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JobCompletion {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub documents_created: usize,
    pub processing_time: f64,
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new PENDING job.
pub fn insert_pending(
    db: &Database,
    job_id: &str,
    filename: &str,
    source_path: &str,
    created_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (job_id, filename, source_path, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![job_id, filename, source_path, JobStatus::Pending, created_at],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, job_id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE job_id = ?1")?;
        let mut rows = stmt.query_map(params![job_id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Like [`find_by_id`], but a missing job is an error.
pub fn get(db: &Database, job_id: &str) -> Result<JobRow, DatabaseError> {
    find_by_id(db, job_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity: "job",
        id: job_id.to_string(),
    })
}

/// Queries jobs newest first, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC, job_id DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// PENDING jobs, oldest first.
pub fn list_pending(db: &Database, limit: u64) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE status = ?1 ORDER BY created_at ASC, job_id ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![JobStatus::Pending, limit as i64], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: JobStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

fn predecessor_of(status: JobStatus) -> JobStatus {
    // Only called for statuses reached through a transition.
    status.predecessor().unwrap_or(JobStatus::Pending)
}

/// Claims a PENDING job. Returns `false`, leaving the row untouched, when
/// the job does not exist or is no longer PENDING.
pub fn mark_processing(db: &Database, job_id: &str, started_at: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET status = ?2, started_at = ?3
             WHERE job_id = ?1 AND status = ?4",
            params![
                job_id,
                JobStatus::Processing,
                started_at,
                predecessor_of(JobStatus::Processing)
            ],
        )?;
        Ok(changed == 1)
    })
}

/// PROCESSING → COMPLETED. Returns `false` when the job was not PROCESSING.
pub fn mark_completed(
    db: &Database,
    job_id: &str,
    completion: &JobCompletion,
    completed_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET status = ?2, total_pages = ?3, processed_pages = ?4,
             documents_created = ?5, processing_time = ?6, completed_at = ?7
             WHERE job_id = ?1 AND status = ?8",
            params![
                job_id,
                JobStatus::Completed,
                completion.total_pages,
                completion.processed_pages,
                completion.documents_created,
                completion.processing_time,
                completed_at,
                predecessor_of(JobStatus::Completed)
            ],
        )?;
        Ok(changed == 1)
    })
}

/// PROCESSING → FAILED. Returns `false` when the job was not PROCESSING.
pub fn mark_failed(
    db: &Database,
    job_id: &str,
    error_message: &str,
    processing_time: f64,
    completed_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET status = ?2, error_message = ?3, processing_time = ?4,
             completed_at = ?5
             WHERE job_id = ?1 AND status = ?6",
            params![
                job_id,
                JobStatus::Failed,
                error_message,
                processing_time,
                completed_at,
                predecessor_of(JobStatus::Failed)
            ],
        )?;
        Ok(changed == 1)
    })
}
