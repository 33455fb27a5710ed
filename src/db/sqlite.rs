use crate::db::models::RepoEntry;
use crate::db::schema::SQLITE_INIT;
use crate::error::CasicsError;
use futures::TryStreamExt;
use sqlx::sqlite::SqliteConnection;
use sqlx::{Pool, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

const UPSERT_SQL: &str = r#"
    INSERT INTO repos (id, owner, name, document, updated_at)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        owner=excluded.owner,
        name=excluded.name,
        document=excluded.document,
        updated_at=excluded.updated_at
"#;

#[derive(Clone)]
pub struct RepoStore {
    pool: SqlitePool,
}

impl RepoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), CasicsError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert or replace the entry with the same id. Returns the id.
    pub async fn upsert(&self, entry: &RepoEntry) -> Result<i64, CasicsError> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_on(&mut conn, entry).await
    }

    /// Batch upsert in a single transaction. Returns ids in input order.
    pub async fn upsert_many(&self, entries: &[RepoEntry]) -> Result<Vec<i64>, CasicsError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            ids.push(Self::upsert_on(&mut tx, entry).await?);
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn upsert_on(conn: &mut SqliteConnection, entry: &RepoEntry) -> Result<i64, CasicsError> {
        let document = serde_json::to_string(entry)?;
        sqlx::query(UPSERT_SQL)
            .bind(entry.id)
            .bind(entry.owner.as_deref())
            .bind(entry.name.as_deref())
            .bind(document)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *conn)
            .await?;
        Ok(entry.id)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<RepoEntry>, CasicsError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT document FROM repos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(doc,)| Self::decode(&doc)).transpose()
    }

    pub async fn find_by_owner(&self, owner: &str) -> Result<Vec<RepoEntry>, CasicsError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT document FROM repos WHERE owner = ? ORDER BY id")
                .bind(owner)
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(|(doc,)| Self::decode(doc)).collect()
    }

    /// Entries whose `languages` list names `language`.
    pub async fn find_by_language(&self, language: &str) -> Result<Vec<RepoEntry>, CasicsError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"SELECT r.document FROM repos r
               WHERE json_type(r.document, '$.languages') = 'array'
                 AND EXISTS (
                     SELECT 1 FROM json_each(r.document, '$.languages') j
                     WHERE json_extract(j.value, '$.name') = ?
                 )
               ORDER BY r.id"#,
        )
        .bind(language)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|(doc,)| Self::decode(doc)).collect()
    }

    pub async fn count(&self) -> Result<i64, CasicsError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM repos")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    /// Remove an entry. Returns whether it existed.
    pub async fn delete(&self, id: i64) -> Result<bool, CasicsError> {
        let res = sqlx::query("DELETE FROM repos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Stream every entry in id order. Returns how many were visited.
    pub async fn for_each<F>(&self, mut f: F) -> Result<usize, CasicsError>
    where
        F: FnMut(RepoEntry),
    {
        let mut rows =
            sqlx::query_as::<_, (String,)>("SELECT document FROM repos ORDER BY id")
                .fetch(&self.pool);
        let mut visited = 0;
        while let Some((doc,)) = rows.try_next().await? {
            f(Self::decode(&doc)?);
            visited += 1;
        }
        Ok(visited)
    }

    fn decode(doc: &str) -> Result<RepoEntry, CasicsError> {
        Ok(serde_json::from_str(doc)?)
    }
}
