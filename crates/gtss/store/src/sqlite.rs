//! SQLite adapter for the entity store.
//!
//! Two tables: `entities` and `scorecards`, the latter keyed 1:1 to the former
//! by a unique foreign key with cascading delete. Every write runs inside one
//! transaction; dropping an uncommitted transaction rolls it back, so an error
//! never leaves a half-written pair behind.
//!
//! Write transactions open with `BEGIN IMMEDIATE`. A deferred transaction that
//! reads first and writes later cannot upgrade its lock while another writer
//! holds one, and SQLite fails it with `SQLITE_BUSY` instead of waiting.

use crate::diff::{apply_patch, check_new, check_patch};
use crate::model::{
    EntityId, EntityPatch, NewEntity, Page, PageRequest, Scorecard, StoredEntity,
    StoredScorecard,
};
use crate::traits::{check_page, EntityStore};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, Transaction};
use std::str::FromStr;
use std::time::Duration;

const SELECT_JOINED: &str = r#"
    SELECT e.id AS id,
           e.name AS name,
           e.category AS category,
           e.affiliation AS affiliation,
           e.notes AS notes,
           e.image_ref AS image_ref,
           e.last_update AS last_update,
           s.active_aggression AS active_aggression,
           s.attack_range AS attack_range,
           s.unpredictability AS unpredictability,
           s.special_ability AS special_ability,
           s.historical_threat AS historical_threat,
           s.encounter_probability AS encounter_probability,
           s.last_update AS scorecard_last_update
      FROM entities e
      JOIN scorecards s ON s.entity_id = e.id
"#;

/// SQLite-backed entity store.
#[derive(Debug, Clone)]
pub struct SqliteEntityStore {
    pool: SqlitePool,
}

impl SqliteEntityStore {
    /// Connect and initialize the schema.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Self::connect_with_options(database_url, 5, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::StorageFailure(format!("invalid sqlite url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::StorageFailure(format!("failed to connect sqlite: {e}")))?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database. The pool pins a single connection, since
    /// each SQLite connection to `:memory:` sees its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::StorageFailure(format!("invalid sqlite url: {e}")))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::StorageFailure(format!("failed to open sqlite: {e}")))?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool. Schema creation is idempotent.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Write transaction that takes the reserved lock up front.
    async fn begin_write(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                affiliation TEXT NOT NULL,
                notes TEXT NOT NULL,
                image_ref TEXT NOT NULL,
                last_update TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS scorecards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id INTEGER NOT NULL UNIQUE REFERENCES entities(id) ON DELETE CASCADE,
                active_aggression REAL NOT NULL,
                attack_range REAL NOT NULL,
                unpredictability REAL NOT NULL,
                special_ability REAL NOT NULL,
                historical_threat REAL NOT NULL,
                encounter_probability REAL NOT NULL,
                last_update TEXT NOT NULL
            )
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::StorageFailure(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    async fn create_pair(&self, entity: NewEntity) -> StoreResult<StoredEntity> {
        check_new(&entity)?;
        let now = Utc::now();
        let mut tx = self.begin_write().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO entities (name, category, affiliation, notes, image_ref, last_update)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entity.name)
        .bind(&entity.category)
        .bind(&entity.affiliation)
        .bind(&entity.notes)
        .bind(&entity.image_ref)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conflict_on(&entity.name))?;
        let id = inserted.last_insert_rowid();

        let scores = entity.scorecard;
        sqlx::query(
            r#"
            INSERT INTO scorecards
                (entity_id, active_aggression, attack_range, unpredictability,
                 special_ability, historical_threat, encounter_probability, last_update)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(id)
        .bind(scores.active_aggression)
        .bind(scores.attack_range)
        .bind(scores.unpredictability)
        .bind(scores.special_ability)
        .bind(scores.historical_threat)
        .bind(scores.encounter_probability)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let stored = fetch_by_id(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!(name = %stored.name, id = %stored.id, "created entity");
        Ok(stored)
    }

    async fn patch(&self, name: &str, patch: EntityPatch) -> StoreResult<StoredEntity> {
        check_patch(&patch)?;
        let mut tx = self.begin_write().await?;
        let mut current = fetch_by_name(&mut tx, name)
            .await?
            .ok_or_else(|| StoreError::not_found(name))?;

        let changes = apply_patch(&mut current, &patch, Utc::now());
        if changes.is_empty() {
            tracing::debug!(name, "update is a no-op");
            return Ok(current);
        }

        if changes.main_changed {
            sqlx::query(
                r#"
                UPDATE entities
                   SET name = ?1, category = ?2, affiliation = ?3, notes = ?4,
                       image_ref = ?5, last_update = ?6
                 WHERE id = ?7
                "#,
            )
            .bind(&current.name)
            .bind(&current.category)
            .bind(&current.affiliation)
            .bind(&current.notes)
            .bind(&current.image_ref)
            .bind(current.last_update)
            .bind(current.id.0)
            .execute(&mut *tx)
            .await
            .map_err(conflict_on(&current.name))?;
        }

        if changes.scorecard_changed {
            let scores = current.scorecard.scores;
            sqlx::query(
                r#"
                UPDATE scorecards
                   SET active_aggression = ?1, attack_range = ?2, unpredictability = ?3,
                       special_ability = ?4, historical_threat = ?5,
                       encounter_probability = ?6, last_update = ?7
                 WHERE entity_id = ?8
                "#,
            )
            .bind(scores.active_aggression)
            .bind(scores.attack_range)
            .bind(scores.unpredictability)
            .bind(scores.special_ability)
            .bind(scores.historical_threat)
            .bind(scores.encounter_probability)
            .bind(current.scorecard.last_update)
            .bind(current.id.0)
            .execute(&mut *tx)
            .await?;
        }

        let stored = fetch_by_id(&mut tx, current.id.0).await?;
        tx.commit().await?;
        tracing::info!(
            name,
            main_changed = changes.main_changed,
            scorecard_changed = changes.scorecard_changed,
            "updated entity"
        );
        Ok(stored)
    }

    async fn remove(&self, name: &str) -> StoreResult<bool> {
        let mut tx = self.begin_write().await?;
        sqlx::query(
            "DELETE FROM scorecards WHERE entity_id IN (SELECT id FROM entities WHERE name = ?1)",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;
        let deleted = sqlx::query("DELETE FROM entities WHERE name = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(name, "deleted entity");
        }
        Ok(deleted > 0)
    }

    async fn page(&self, request: PageRequest) -> StoreResult<Page<StoredEntity>> {
        check_page(request)?;
        let mut tx = self.pool.begin().await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entities")
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!("{SELECT_JOINED} ORDER BY e.id LIMIT ?1 OFFSET ?2");
        let rows = sqlx::query(&sql)
            .bind(to_i64(request.limit())?)
            .bind(to_i64(request.offset())?)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(entity_row_to_record)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, request, u64::try_from(total).unwrap_or(0)))
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn create(&self, entity: NewEntity) -> StoreResult<StoredEntity> {
        self.create_pair(entity)
            .await
            .inspect_err(|e| report("create", e))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<StoredEntity> {
        tracing::debug!(name, "get entity");
        let mut conn = self.pool.acquire().await?;
        fetch_by_name(&mut conn, name)
            .await
            .inspect_err(|e| report("get_by_name", e))?
            .ok_or_else(|| StoreError::not_found(name))
    }

    async fn get_all(&self) -> StoreResult<Vec<StoredEntity>> {
        let sql = format!("{SELECT_JOINED} ORDER BY e.id");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)
            .inspect_err(|e| report("get_all", e))?;
        rows.into_iter().map(entity_row_to_record).collect()
    }

    async fn list_page(&self, request: PageRequest) -> StoreResult<Page<StoredEntity>> {
        self.page(request)
            .await
            .inspect_err(|e| report("list_page", e))
    }

    async fn update(&self, name: &str, patch: EntityPatch) -> StoreResult<StoredEntity> {
        self.patch(name, patch)
            .await
            .inspect_err(|e| report("update", e))
    }

    async fn delete(&self, name: &str) -> StoreResult<bool> {
        self.remove(name).await.inspect_err(|e| report("delete", e))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

async fn fetch_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> StoreResult<Option<StoredEntity>> {
    let sql = format!("{SELECT_JOINED} WHERE e.name = ?1");
    let row = sqlx::query(&sql).bind(name).fetch_optional(&mut *conn).await?;
    row.map(entity_row_to_record).transpose()
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> StoreResult<StoredEntity> {
    let sql = format!("{SELECT_JOINED} WHERE e.id = ?1");
    let row = sqlx::query(&sql).bind(id).fetch_one(&mut *conn).await?;
    entity_row_to_record(row)
}

fn entity_row_to_record(row: SqliteRow) -> StoreResult<StoredEntity> {
    Ok(StoredEntity {
        id: EntityId(row.try_get("id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        affiliation: row.try_get("affiliation")?,
        notes: row.try_get("notes")?,
        image_ref: row.try_get("image_ref")?,
        last_update: row.try_get("last_update")?,
        scorecard: StoredScorecard {
            scores: Scorecard {
                active_aggression: row.try_get("active_aggression")?,
                attack_range: row.try_get("attack_range")?,
                unpredictability: row.try_get("unpredictability")?,
                special_ability: row.try_get("special_ability")?,
                historical_threat: row.try_get("historical_threat")?,
                encounter_probability: row.try_get("encounter_probability")?,
            },
            last_update: row.try_get("scorecard_last_update")?,
        },
    })
}

/// Only the name column is a caller-visible uniqueness rule; any other unique
/// violation stays a storage failure.
fn conflict_on(name: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::duplicate(name)
        }
        _ => StoreError::from(err),
    }
}

fn report(op: &'static str, err: &StoreError) {
    match err {
        StoreError::StorageFailure(_) => tracing::error!(op, error = %err, "store operation failed"),
        _ => tracing::warn!(op, error = %err, "store operation rejected"),
    }
}

fn to_i64(value: u64) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::ValidationGap("page window value too large".to_string()))
}
