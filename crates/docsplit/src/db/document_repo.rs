//! Document repository for the `documents` table. Rows are insert-only.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::classifier::DocumentType;

impl ToSql for DocumentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DocumentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: crate::classifier::ParseDocumentTypeError| FromSqlError::Other(Box::new(e)))
    }
}

/// A document about to be recorded for a job.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub job_id: String,
    pub filename: String,
    pub file_path: String,
    pub page_start: usize,
    pub page_end: usize,
    pub total_pages: usize,
    pub barcode_value: Option<String>,
    pub barcode_type: Option<String>,
    pub document_type: DocumentType,
    pub ocr_excerpt: Option<String>,
    pub blank_pages_skipped: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRow {
    pub id: i64,
    pub job_id: String,
    pub filename: String,
    pub file_path: String,
    pub page_start: usize,
    pub page_end: usize,
    pub total_pages: usize,
    pub barcode_value: Option<String>,
    pub barcode_type: Option<String>,
    pub document_type: DocumentType,
    pub ocr_excerpt: Option<String>,
    pub blank_pages_skipped: usize,
    pub created_at: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            filename: row.get("filename")?,
            file_path: row.get("file_path")?,
            page_start: row.get("page_start")?,
            page_end: row.get("page_end")?,
            total_pages: row.get("total_pages")?,
            barcode_value: row.get("barcode_value")?,
            barcode_type: row.get("barcode_type")?,
            document_type: row.get("document_type")?,
            ocr_excerpt: row.get("ocr_excerpt")?,
            blank_pages_skipped: row.get("blank_pages_skipped")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct DocumentFilter {
    pub job_id: Option<String>,
    pub document_type: Option<DocumentType>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a document row and returns its id.
pub fn insert(db: &Database, doc: &NewDocument) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (job_id, filename, file_path, page_start, page_end,
             total_pages, barcode_value, barcode_type, document_type, ocr_excerpt,
             blank_pages_skipped, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                doc.job_id,
                doc.filename,
                doc.file_path,
                doc.page_start,
                doc.page_end,
                doc.total_pages,
                doc.barcode_value,
                doc.barcode_type,
                doc.document_type,
                doc.ocr_excerpt,
                doc.blank_pages_skipped,
                doc.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries documents in insertion order, returning (rows, total_count).
pub fn query(
    db: &Database,
    filter: &DocumentFilter,
) -> Result<(Vec<DocumentRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref job_id) = filter.job_id {
            conditions.push(format!("job_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(job_id.clone()));
        }
        if let Some(document_type) = filter.document_type {
            conditions.push(format!("document_type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(document_type));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM documents {}", where_clause);
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM documents {} ORDER BY id ASC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// All documents of one job, in page order.
pub fn list_for_job(db: &Database, job_id: &str) -> Result<Vec<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM documents WHERE job_id = ?1 ORDER BY page_start ASC, id ASC")?;
        let rows = stmt
            .query_map(params![job_id], DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::job_repo;

    fn test_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create test database");
        for id in ["job_a", "job_b"] {
            job_repo::insert_pending(&db, id, "lote.pdf", "/in/lote.pdf", "2026-01-01T00:00:00Z")
                .unwrap();
        }
        db
    }

    fn sample(job_id: &str, page_start: usize, doc_type: DocumentType) -> NewDocument {
        NewDocument {
            job_id: job_id.to_string(),
            filename: format!("lote_doc_{}.pdf", page_start),
            file_path: format!("/out/{}/lote_doc_{}.pdf", job_id, page_start),
            page_start,
            page_end: page_start + 1,
            total_pages: 2,
            barcode_value: Some("CED-001".to_string()),
            barcode_type: Some("CODE-128".to_string()),
            document_type: doc_type,
            ocr_excerpt: None,
            blank_pages_skipped: 0,
            created_at: "2026-01-01T00:00:05Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let id = insert(&db, &sample("job_a", 2, DocumentType::Cedula)).unwrap();

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.job_id, "job_a");
        assert_eq!(found.document_type, DocumentType::Cedula);
        assert_eq!((found.page_start, found.page_end), (2, 3));
        assert_eq!(found.barcode_value.as_deref(), Some("CED-001"));
        assert!(find_by_id(&db, id + 100).unwrap().is_none());
    }

    #[test]
    fn test_insert_rejects_unknown_job() {
        let db = test_db();
        assert!(insert(&db, &sample("job_missing", 2, DocumentType::Unknown)).is_err());
    }

    #[test]
    fn test_query_filters() {
        let db = test_db();
        insert(&db, &sample("job_a", 2, DocumentType::Cedula)).unwrap();
        insert(&db, &sample("job_a", 5, DocumentType::Mecanizado)).unwrap();
        insert(&db, &sample("job_b", 2, DocumentType::Cedula)).unwrap();

        let (rows, total) = query(
            &db,
            &DocumentFilter {
                job_id: Some("job_a".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].page_start, 2);

        let (rows, total) = query(
            &db,
            &DocumentFilter {
                document_type: Some(DocumentType::Cedula),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|r| r.document_type == DocumentType::Cedula));

        let (rows, total) = query(
            &db,
            &DocumentFilter {
                job_id: Some("job_a".to_string()),
                document_type: Some(DocumentType::Cedula),
                limit: Some(1),
                offset: Some(0),
            },
        )
        .unwrap();
        assert_eq!((rows.len(), total), (1, 1));
    }

    #[test]
    fn test_list_for_job_in_page_order() {
        let db = test_db();
        insert(&db, &sample("job_a", 7, DocumentType::Unknown)).unwrap();
        insert(&db, &sample("job_a", 2, DocumentType::Cedula)).unwrap();

        let docs = list_for_job(&db, "job_a").unwrap();
        let starts: Vec<_> = docs.iter().map(|d| d.page_start).collect();
        assert_eq!(starts, vec![2, 7]);
        assert!(list_for_job(&db, "job_b").unwrap().is_empty());
    }
}
