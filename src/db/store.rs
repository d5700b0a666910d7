//! Document store over SQLite.
//!
//! Collections hold JSON documents addressed by ID. Every write bumps the
//! document version; updates only land when the version read by the caller is
//! still current.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::{now_timestamp, Document, Stored};

const SELECT_COLUMNS: &str = "SELECT id, data, version, created_at, updated_at FROM documents";

/// One page of documents plus the collection size.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<Stored<T>>,
    pub total: usize,
}

/// Document store for all collections.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a document by ID.
    pub async fn get<T: Document>(&self, id: &str) -> AppResult<Option<Stored<T>>> {
        let row = sqlx::query(&format!(
            "{} WHERE collection = ? AND id = ?",
            SELECT_COLUMNS
        ))
        .bind(T::COLLECTION)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(stored_from_row::<T>).transpose()
    }

    /// Get a document by ID, failing with `NOT_FOUND` when missing.
    pub async fn require<T: Document>(&self, id: &str) -> AppResult<Stored<T>> {
        self.get::<T>(id)
            .await?
            .ok_or_else(|| AppError::not_found(T::KIND, id))
    }

    /// List a whole collection, newest first.
    pub async fn list<T: Document>(&self) -> AppResult<Vec<Stored<T>>> {
        let rows = sqlx::query(&format!(
            "{} WHERE collection = ? ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .bind(T::COLLECTION)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stored_from_row::<T>).collect()
    }

    /// List a slice of a collection, newest first.
    pub async fn page<T: Document>(&self, offset: usize, limit: usize) -> AppResult<Page<T>> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM documents WHERE collection = ?")
            .bind(T::COLLECTION)
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let rows = sqlx::query(&format!(
            "{} WHERE collection = ? ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(T::COLLECTION)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows
                .iter()
                .map(stored_from_row::<T>)
                .collect::<AppResult<_>>()?,
            total: total as usize,
        })
    }

    /// Documents whose top-level string `field` equals `value`, newest first.
    pub async fn query_by_field<T: Document>(
        &self,
        field: &str,
        value: &str,
    ) -> AppResult<Vec<Stored<T>>> {
        let rows = sqlx::query(&format!(
            "{} WHERE collection = ? AND json_extract(data, ?) = ? ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .bind(T::COLLECTION)
        .bind(format!("$.{}", field))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stored_from_row::<T>).collect()
    }

    /// Documents whose ID starts with `prefix`.
    pub async fn find_by_id_prefix<T: Document>(&self, prefix: &str) -> AppResult<Vec<Stored<T>>> {
        let rows = sqlx::query(&format!(
            "{} WHERE collection = ? AND substr(id, 1, ?) = ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(T::COLLECTION)
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stored_from_row::<T>).collect()
    }

    /// Add a document under a newly generated ID.
    pub async fn add<T: Document>(&self, doc: T) -> AppResult<Stored<T>> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();
        let data = serde_json::to_string(&doc)?;

        sqlx::query(
            "INSERT INTO documents (collection, id, data, version, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(T::COLLECTION)
        .bind(&id)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Stored {
            id,
            version: 1,
            created_at: now.clone(),
            updated_at: now,
            doc,
        })
    }

    /// Create or overwrite the document with the given ID.
    pub async fn set<T: Document>(&self, id: &str, doc: T) -> AppResult<Stored<T>> {
        let now = now_timestamp();
        let data = serde_json::to_string(&doc)?;

        let row = sqlx::query(
            r#"INSERT INTO documents (collection, id, data, version, created_at, updated_at)
               VALUES (?, ?, ?, 1, ?, ?)
               ON CONFLICT(collection, id) DO UPDATE SET
                   data = excluded.data,
                   version = documents.version + 1,
                   updated_at = excluded.updated_at
               RETURNING version, created_at, updated_at"#,
        )
        .bind(T::COLLECTION)
        .bind(id)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(Stored {
            id: id.to_string(),
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            doc,
        })
    }

    /// Overwrite a document that was read at `read_version`.
    ///
    /// Fails with `VERSION_MISMATCH` if another write landed in between.
    pub async fn update<T: Document>(
        &self,
        id: &str,
        doc: T,
        read_version: i64,
    ) -> AppResult<Stored<T>> {
        let now = now_timestamp();
        let data = serde_json::to_string(&doc)?;

        let row = sqlx::query(
            r#"UPDATE documents SET data = ?, version = version + 1, updated_at = ?
               WHERE collection = ? AND id = ? AND version = ?
               RETURNING version, created_at, updated_at"#,
        )
        .bind(&data)
        .bind(&now)
        .bind(T::COLLECTION)
        .bind(id)
        .bind(read_version)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            // Version changed between read and write, or the document is gone
            let current = self.require::<T>(id).await?;
            return Err(AppError::VersionMismatch {
                message: "Concurrent modification detected".to_string(),
                current_version: current.version,
            });
        };

        Ok(Stored {
            id: id.to_string(),
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            doc,
        })
    }

    /// Persist a modified copy of a stored document.
    pub async fn save<T: Document>(&self, stored: Stored<T>) -> AppResult<Stored<T>> {
        self.update(&stored.id, stored.doc, stored.version).await
    }

    /// Delete a document.
    pub async fn delete<T: Document>(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(T::COLLECTION)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(T::KIND, id));
        }
        Ok(())
    }
}

/// Reject a write whose client-side version is stale.
pub fn check_expected_version<T>(stored: &Stored<T>, expected: Option<i64>) -> AppResult<()> {
    if let Some(expected) = expected {
        if stored.version != expected {
            return Err(AppError::VersionMismatch {
                message: format!(
                    "Version mismatch: expected {}, current {}",
                    expected, stored.version
                ),
                current_version: stored.version,
            });
        }
    }
    Ok(())
}

fn stored_from_row<T: Document>(row: &SqliteRow) -> AppResult<Stored<T>> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    let doc = serde_json::from_str(&data).map_err(|e| {
        tracing::error!("Malformed {} document {}: {}", T::COLLECTION, id, e);
        AppError::Database(format!("Malformed {} document {}", T::KIND, id))
    })?;

    Ok(Stored {
        id,
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        doc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::Todo;
    use tempfile::TempDir;

    async fn store() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (DocumentStore::new(pool), temp_dir)
    }

    fn todo(title: &str, owner: &str) -> Todo {
        Todo {
            title: title.to_string(),
            description: String::new(),
            completed: false,
            owner_id: owner.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_get_delete() {
        let (store, _dir) = store().await;

        let added = store.add(todo("Pack bags", "u1")).await.unwrap();
        assert_eq!(added.version, 1);

        let fetched = store.require::<Todo>(&added.id).await.unwrap();
        assert_eq!(fetched.doc.title, "Pack bags");

        store.delete::<Todo>(&added.id).await.unwrap();
        assert!(store.get::<Todo>(&added.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete::<Todo>(&added.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stale_update_is_rejected() {
        let (store, _dir) = store().await;
        let added = store.add(todo("Book hotel", "u1")).await.unwrap();

        let mut first = added.clone();
        first.doc.completed = true;
        let saved = store.save(first).await.unwrap();
        assert_eq!(saved.version, 2);

        let mut stale = added;
        stale.doc.title = "Overwrite".to_string();
        match store.save(stale).await {
            Err(AppError::VersionMismatch {
                current_version, ..
            }) => assert_eq!(current_version, 2),
            other => panic!("expected version mismatch, got {:?}", other.map(|s| s.id)),
        }

        let current = store.require::<Todo>(&saved.id).await.unwrap();
        assert_eq!(current.doc.title, "Book hotel");
        assert!(current.doc.completed);
    }

    #[tokio::test]
    async fn test_query_by_field_and_ordering() {
        let (store, _dir) = store().await;
        store.add(todo("first", "u1")).await.unwrap();
        store.add(todo("other", "u2")).await.unwrap();
        store.add(todo("second", "u1")).await.unwrap();

        let mine = store.query_by_field::<Todo>("ownerId", "u1").await.unwrap();
        let titles: Vec<&str> = mine.iter().map(|t| t.doc.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        let page = store.page::<Todo>(1, 1).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].doc.title, "other");
    }

    #[tokio::test]
    async fn test_set_upserts_and_bumps_version() {
        let (store, _dir) = store().await;

        let created = store.set("fixed-id", todo("v1", "u1")).await.unwrap();
        assert_eq!(created.version, 1);

        let replaced = store.set("fixed-id", todo("v2", "u1")).await.unwrap();
        assert_eq!(replaced.version, 2);
        assert_eq!(replaced.created_at, created.created_at);

        let found = store.find_by_id_prefix::<Todo>("fixed").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].doc.title, "v2");
    }

    #[test]
    fn test_check_expected_version() {
        let stored = Stored {
            id: "t".to_string(),
            version: 3,
            created_at: String::new(),
            updated_at: String::new(),
            doc: (),
        };
        assert!(check_expected_version(&stored, None).is_ok());
        assert!(check_expected_version(&stored, Some(3)).is_ok());
        assert!(check_expected_version(&stored, Some(2)).is_err());
    }
}
