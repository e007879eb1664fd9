use std::collections::HashMap;
use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Arc;
use std::sync::Once;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tokio_rusqlite::{ffi, Connection};

use crate::errors::{AppError, AppResult};
use crate::services::embedding_backend::EmbeddingBackend;

/// Persistent, session-scoped chunk storage with similarity search.
///
/// Within one session, `reset` and `add` are serialized against each other;
/// distinct sessions may proceed concurrently.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Deletes all chunks of this session. Idempotent.
    async fn reset(&self, session_id: &str) -> AppResult<()>;

    /// Embeds and persists the chunks under ids `{session_id}_{index}`.
    /// The whole batch is inserted in one transaction: a failure leaves no
    /// partial chunk set behind, and any previously stored rows the batch
    /// does not overwrite are dropped, so the session always holds exactly
    /// one batch.
    async fn add(&self, session_id: &str, chunks: &[String]) -> AppResult<()>;

    /// Returns up to `k` chunk texts of this session most similar to
    /// `query_text` under cosine similarity, most similar first.
    async fn query_similar(
        &self,
        session_id: &str,
        query_text: &str,
        k: usize,
    ) -> AppResult<Vec<String>>;

    /// Returns all chunk texts of the session in insertion order.
    async fn get_all(&self, session_id: &str) -> AppResult<Vec<String>>;

    /// Deletes chunks older than `ttl`, returning the number removed.
    async fn purge_expired(&self, ttl: Duration) -> AppResult<usize>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chunks (
    id          TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content     TEXT NOT NULL,
    embedding   TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_session ON chunks(session_id);
";

/// SQLite-backed vector store using the sqlite-vec extension for cosine
/// similarity. Embedding computation is delegated to the injected
/// [`EmbeddingBackend`]; this type owns index structure, persistence, and
/// the search query itself.
pub struct SqliteChunkRepository {
    conn: Connection,
    embeddings: Arc<dyn EmbeddingBackend>,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SqliteChunkRepository {
    pub async fn open(
        path: impl AsRef<Path>,
        embeddings: Arc<dyn EmbeddingBackend>,
    ) -> AppResult<Self> {
        register_sqlite_vec()?;

        let conn = Connection::open(path).await?;
        conn.call(|conn| {
            // Fails fast if the sqlite-vec extension did not load.
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            conn.execute_batch(SCHEMA)
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            embeddings,
            session_locks: Mutex::new(HashMap::new()),
        })
    }

    /// One async mutex per session id; serializes concurrent `reset`/`add`
    /// for the same session.
    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl ChunkRepository for SqliteChunkRepository {
    async fn reset(&self, session_id: &str) -> AppResult<()> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let session_id_owned = session_id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                conn.execute("DELETE FROM chunks WHERE session_id = ?1", [&session_id_owned])
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;

        log::debug!("reset session {}: {} chunks removed", session_id, deleted);
        Ok(())
    }

    async fn add(&self, session_id: &str, chunks: &[String]) -> AppResult<()> {
        // Embed before taking the session lock; only the insert needs to be
        // serialized.
        let mut rows = Vec::with_capacity(chunks.len());
        for (index, content) in chunks.iter().enumerate() {
            let embedding = self.embeddings.embed(content).await?;
            let embedding_json = serde_json::to_string(&embedding)
                .map_err(|err| AppError::StorageError(err.to_string()))?;
            rows.push((
                format!("{}_{}", session_id, index),
                index as i64,
                content.clone(),
                embedding_json,
            ));
        }

        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let session_id_owned = session_id.to_string();
        let count = rows.len();
        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                // Interleaved reset+add pairs for the same session may land
                // an older, larger batch's rows above this batch's indices;
                // dropping them here keeps the session equal to one batch.
                tx.execute(
                    "DELETE FROM chunks WHERE session_id = ?1 AND chunk_index >= ?2",
                    (&session_id_owned, count as i64),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let now = Utc::now().timestamp();
                for (id, chunk_index, content, embedding_json) in rows {
                    tx.execute(
                        "INSERT OR REPLACE INTO chunks \
                         (id, session_id, chunk_index, content, embedding, created_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        (
                            &id,
                            &session_id_owned,
                            chunk_index,
                            &content,
                            &embedding_json,
                            now,
                        ),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await?;

        log::info!("session {}: stored {} chunks", session_id, count);
        Ok(())
    }

    async fn query_similar(
        &self,
        session_id: &str,
        query_text: &str,
        k: usize,
    ) -> AppResult<Vec<String>> {
        let query_embedding = self.embeddings.embed(query_text).await?;
        let embedding_json = serde_json::to_string(&query_embedding)
            .map_err(|err| AppError::StorageError(err.to_string()))?;

        let session_id_owned = session_id.to_string();
        let contents = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT content, \
                         vec_distance_cosine(vec_f32(embedding), vec_f32(?1)) AS distance \
                         FROM chunks WHERE session_id = ?2 \
                         ORDER BY distance ASC \
                         LIMIT ?3",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map(
                        (&embedding_json, &session_id_owned, k as i64),
                        |row| row.get::<_, String>(0),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut contents = Vec::new();
                for row in rows {
                    contents.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(contents)
            })
            .await?;

        if contents.is_empty() {
            return Err(AppError::SessionNotFound(session_id.to_string()));
        }
        Ok(contents)
    }

    async fn get_all(&self, session_id: &str) -> AppResult<Vec<String>> {
        let session_id_owned = session_id.to_string();
        let contents = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT content FROM chunks WHERE session_id = ?1 \
                         ORDER BY chunk_index ASC",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&session_id_owned], |row| row.get::<_, String>(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut contents = Vec::new();
                for row in rows {
                    contents.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(contents)
            })
            .await?;

        if contents.is_empty() {
            return Err(AppError::SessionNotFound(session_id.to_string()));
        }
        Ok(contents)
    }

    async fn purge_expired(&self, ttl: Duration) -> AppResult<usize> {
        let cutoff = (Utc::now() - ttl).timestamp();
        let deleted = self
            .conn
            .call(move |conn| {
                conn.execute("DELETE FROM chunks WHERE created_at < ?1", [cutoff])
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;

        // Idle lock entries would otherwise accumulate one per session for
        // the life of the process. A count of one means only the map itself
        // still holds the lock.
        let mut locks = self.session_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        drop(locks);

        if deleted > 0 {
            log::info!("purged {} expired chunks", deleted);
        }
        Ok(deleted)
    }
}

/// Registers sqlite-vec as an auto extension so every new connection gets
/// the vec_* functions. Process-wide, so guarded by a Once.
fn register_sqlite_vec() -> AppResult<()> {
    use std::sync::Mutex as StdMutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: StdMutex<Option<Result<(), String>>> = StdMutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *const c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(AppError::StorageError)
}
