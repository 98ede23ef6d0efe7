//! Postgres binding store
//!
//! NOTE: queries use runtime-checked sqlx::query() because the table is
//! created by `ensure_schema()` and may not exist at compile time.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};

use super::{decode_each, Binding, BindingFilter, BindingStore};
use crate::config::{mask_database_url, DatabaseConfig};
use crate::error::StoreError;
use crate::renderer::ButtonStyle;

const SCHEMA: &str = include_str!("../../migrations/001_reaction_role_bindings.sql");

pub struct PgBindingStore {
    pool: PgPool,
}

impl PgBindingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool with the given settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!(
            "Connecting to database: {}",
            mask_database_url(&config.database_url)
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                e
            })?;

        info!("Database connection pool created successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the bindings table if it is missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        debug!("reaction_role_bindings schema ensured");
        Ok(())
    }

    fn row_key(row: &PgRow) -> (String, String) {
        (
            row.try_get("channel_id").unwrap_or_default(),
            row.try_get("option_id").unwrap_or_default(),
        )
    }

    fn row_to_binding(row: &PgRow) -> Result<Binding, StoreError> {
        let style_code: i16 = row.try_get("style")?;
        let style = ButtonStyle::from_code(style_code).ok_or(StoreError::Corrupt {
            field: "style",
            value: style_code.to_string(),
        })?;

        Ok(Binding {
            channel_id: row.try_get("channel_id")?,
            message_id: row.try_get("message_id")?,
            option_id: row.try_get("option_id")?,
            grant_ref: row.try_get("grant_ref")?,
            label: row.try_get("label")?,
            glyph: row.try_get("glyph")?,
            style,
        })
    }
}

#[async_trait]
impl BindingStore for PgBindingStore {
    async fn save(&self, binding: &Binding) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reaction_role_bindings
                (channel_id, message_id, option_id, grant_ref, label, glyph, style)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&binding.channel_id)
        .bind(&binding.message_id)
        .bind(&binding.option_id)
        .bind(&binding.grant_ref)
        .bind(&binding.label)
        .bind(&binding.glyph)
        .bind(binding.style.code())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_all(&self, filter: &BindingFilter) -> Result<Vec<Binding>, StoreError> {
        let channel_ids: Option<Vec<String>> = filter
            .channel_ids
            .as_ref()
            .map(|ids| ids.iter().cloned().collect());

        let rows = sqlx::query(
            r#"
            SELECT channel_id, message_id, option_id, grant_ref, label, glyph, style
            FROM reaction_role_bindings
            WHERE ($1::text[] IS NULL OR channel_id = ANY($1))
              AND ($2::text IS NULL OR message_id = $2)
            "#,
        )
        .bind(channel_ids)
        .bind(&filter.message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_each(&rows, Self::row_key, Self::row_to_binding))
    }

    async fn find_one(
        &self,
        channel_id: &str,
        message_id: &str,
        option_id: &str,
    ) -> Result<Option<Binding>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT channel_id, message_id, option_id, grant_ref, label, glyph, style
            FROM reaction_role_bindings
            WHERE channel_id = $1 AND message_id = $2 AND option_id = $3
            "#,
        )
        .bind(channel_id)
        .bind(message_id)
        .bind(option_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_binding).transpose()
    }
}
