//! Database operations for the entities table.

use marketsync_engine::{Metadata, NaturalKey, PendingWrite, PlatformId, Record};
use sqlx::{PgPool, Row};

/// A stored entity row from the database.
#[derive(Debug)]
pub struct StoredEntity {
    pub collection: String,
    pub platform: String,
    pub natural_key: String,
    pub version: i64,
    pub payload: serde_json::Value,
    pub created_at: i64,
    pub updated_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEntity {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredEntity {
            collection: row.try_get("collection")?,
            platform: row.try_get("platform")?,
            natural_key: row.try_get("natural_key")?,
            version: row.try_get("version")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredEntity {
    /// Convert a database row to a store record.
    pub fn to_record(&self) -> Record {
        Record {
            key: NaturalKey::new(PlatformId::new(&self.platform), self.natural_key.clone()),
            collection: self.collection.clone(),
            version: self.version.max(0) as u64,
            payload: self.payload.clone(),
            metadata: Metadata {
                created_at: self.created_at.max(0) as u64,
                updated_at: self.updated_at.max(0) as u64,
            },
        }
    }
}

/// Insert or update one record.
///
/// A row already holding a newer version is left alone, so replaying a
/// requeued write is harmless.
pub async fn upsert_entity(pool: &PgPool, record: &Record) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO entities (
            collection, platform, natural_key, version, payload, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (collection, platform, natural_key) DO UPDATE SET
            version = EXCLUDED.version,
            payload = EXCLUDED.payload,
            updated_at = EXCLUDED.updated_at
        WHERE entities.version <= EXCLUDED.version
        "#,
    )
    .bind(&record.collection)
    .bind(record.key.platform.as_str())
    .bind(&record.key.value)
    .bind(record.version as i64)
    .bind(&record.payload)
    .bind(record.metadata.created_at as i64)
    .bind(record.metadata.updated_at as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load every stored entity.
pub async fn load_entities(pool: &PgPool) -> Result<Vec<StoredEntity>, sqlx::Error> {
    sqlx::query_as::<_, StoredEntity>(
        r#"
        SELECT collection, platform, natural_key, version, payload, created_at, updated_at
        FROM entities
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Mirror pending writes, oldest first.
///
/// Returns the writes that could not be stored, each with the reason, in
/// their original order. Once the database itself is unreachable the
/// remaining writes are not attempted and fail with the same reason.
pub async fn flush_writes(pool: &PgPool, writes: Vec<PendingWrite>) -> Vec<(PendingWrite, String)> {
    let mut failed = Vec::new();
    let mut unreachable: Option<String> = None;

    for write in writes {
        if let Some(reason) = &unreachable {
            failed.push((write, reason.clone()));
            continue;
        }
        if let Err(e) = upsert_entity(pool, &write.record).await {
            tracing::warn!(
                collection = %write.record.collection,
                key = %write.record.key,
                version = write.version(),
                "Failed to persist entity: {}",
                e
            );
            let reason = e.to_string();
            if !matches!(e, sqlx::Error::Database(_)) {
                unreachable = Some(reason.clone());
            }
            failed.push((write, reason));
        }
    }
    failed
}
