use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Keys look like `sel_<32 alphanumeric chars>`. The first 8 characters
/// are stored in the clear as a lookup prefix; the full key is stored
/// only as a sha256 hash.
pub const KEY_PREFIX_LEN: usize = 8;

/// Credential for federated agents and ingestion pipelines
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    pub prefix: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

pub fn hash_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn generate_secret() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("sel_{random}")
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn list(&self) -> Result<Vec<ApiKey>>;
    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>>;
    async fn insert(
        &self,
        name: &str,
        prefix: &str,
        key_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKey>;
    async fn revoke(&self, id: Uuid) -> Result<bool>;
    async fn touch_last_used(&self, id: Uuid) -> Result<()>;
}

/// Validate a presented key: prefix lookup, hash compare, then
/// active/expiry checks. Returns None for anything short of a live
/// matching key.
pub async fn authenticate(store: &dyn ApiKeyStore, raw_key: &str) -> Result<Option<ApiKey>> {
    // get() handles both short keys and multi-byte input that has no
    // char boundary at the prefix cut.
    let Some(prefix) = raw_key.get(..KEY_PREFIX_LEN) else {
        return Ok(None);
    };
    let Some(key) = store.find_by_prefix(prefix).await? else {
        return Ok(None);
    };
    if key.key_hash != hash_key(raw_key) {
        return Ok(None);
    }
    if !key.is_active || key.is_expired(Utc::now()) {
        return Ok(None);
    }
    Ok(Some(key))
}

#[derive(Clone)]
pub struct PgApiKeyStore {
    pool: PgPool,
}

impl PgApiKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    async fn list(&self) -> Result<Vec<ApiKey>> {
        let keys =
            sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(keys)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE prefix = $1")
            .bind(prefix)
            .fetch_optional(&self.pool)
            .await?;
        Ok(key)
    }

    async fn insert(
        &self,
        name: &str,
        prefix: &str,
        key_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (id, name, prefix, key_hash, is_active, expires_at)
            VALUES ($1, $2, $3, $4, true, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(prefix)
        .bind(key_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(key)
    }

    async fn revoke(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE api_keys SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
