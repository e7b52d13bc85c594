//! Match document store port.
//!
//! A consumed key-value document store with at-least-one-writer semantics
//! elsewhere; the analytics core only reads. Match records live as JSONB
//! documents keyed by match id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rift_common::MatchRecord;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Errors from the match store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Query or connection failure.
    #[error("store error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document did not decode into a match record.
    #[error("stored match malformed: {0}")]
    Decode(String),
}

/// Search filter for stored matches. All fields are conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchFilter {
    /// Restrict to matches the player appears in.
    pub puuid: Option<String>,
    /// Restrict to one champion (any participant).
    pub champion: Option<String>,
    /// Restrict to one queue.
    pub queue_id: Option<u32>,
    /// Restrict to matches starting at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Page size; defaults to 20, capped at 100.
    pub limit: Option<u32>,
}

impl MatchFilter {
    /// Effective page size.
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(20).min(100))
    }
}

/// Capability set of the match document store (read-only).
#[async_trait]
pub trait MatchStore: Send + Sync + 'static {
    /// Reads one match document.
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError>;

    /// Searches stored matches, newest first.
    async fn search_matches(&self, filter: &MatchFilter) -> Result<Vec<MatchRecord>, StoreError>;
}

/// Create the `PostgreSQL` connection pool.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// PostgreSQL-backed match store reading JSONB documents.
#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode(document: serde_json::Value) -> Result<MatchRecord, StoreError> {
    serde_json::from_value(document).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT document FROM matches WHERE match_id = $1")
                .bind(match_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(document,)| decode(document)).transpose()
    }

    async fn search_matches(&self, filter: &MatchFilter) -> Result<Vec<MatchRecord>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            r"SELECT document FROM matches
              WHERE ($1::text IS NULL
                     OR document->'participants' @> jsonb_build_array(jsonb_build_object('puuid', $1::text)))
                AND ($2::text IS NULL
                     OR document->'participants' @> jsonb_build_array(jsonb_build_object('champion', $2::text)))
                AND ($3::bigint IS NULL OR (document->>'queue_id')::bigint = $3)
                AND ($4::timestamptz IS NULL OR (document->>'game_start')::timestamptz >= $4)
              ORDER BY (document->>'game_start') DESC
              LIMIT $5",
        )
        .bind(filter.puuid.as_deref())
        .bind(filter.champion.as_deref())
        .bind(filter.queue_id.map(i64::from))
        .bind(filter.since)
        .bind(filter.effective_limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|(document,)| decode(document)).collect()
    }
}
