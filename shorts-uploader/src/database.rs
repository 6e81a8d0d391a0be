//! PostgreSQL implementation of the core `VideoRepository` contract.
//!
//! The `videos` table is owned by the application that serves the clips; this
//! module only reads and writes rows, it never creates or migrates the schema.

use async_trait::async_trait;
use chrono::Utc;
use shorts_uploader_core::contract::{NewVideoRecord, RepositoryError, VideoRecord, VideoRepository};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use crate::load_config::DatabaseConfig;

#[derive(Debug, FromRow)]
struct VideoRow {
    id: i32,
    video_id: String,
    filename: String,
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    r2_url: Option<String>,
    r2_key: Option<String>,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            id: row.id,
            video_id: row.video_id,
            filename: row.filename,
            title: row.title,
            description: row.description,
            duration: row.duration,
            r2_url: row.r2_url,
            r2_key: row.r2_key,
        }
    }
}

pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    /// Opens a single-connection pool; the run is sequential.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = match config {
            DatabaseConfig::Url(url) => PgConnectOptions::from_str(url)?,
            DatabaseConfig::Params {
                host,
                port,
                name,
                user,
                password,
            } => PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(name)
                .username(user)
                .password(password),
        };

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        tracing::info!("Connected to database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn find_by_video_id(
        &self,
        video_id: &str,
    ) -> Result<Option<VideoRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            SELECT id, video_id, filename, title, description, duration, r2_url, r2_key
            FROM videos
            WHERE video_id = $1
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VideoRecord::from))
    }

    async fn upsert(
        &self,
        existing: Option<VideoRecord>,
        record: NewVideoRecord,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().naive_utc();
        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        match existing {
            Some(row) => {
                let result = sqlx::query(
                    r#"
                    UPDATE videos
                    SET r2_url = $1, r2_key = $2, updated_at = $3
                    WHERE id = $4
                    "#,
                )
                .bind(&record.r2_url)
                .bind(&record.r2_key)
                .bind(now)
                .bind(row.id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() != 1 {
                    return Err(format!(
                        "expected to update 1 row for {}, updated {}",
                        row.video_id,
                        result.rows_affected()
                    )
                    .into());
                }
                tracing::debug!(video_id = %row.video_id, "Updated video row");
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO videos
                        (video_id, filename, title, description, duration, r2_url, r2_key, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
                    ON CONFLICT (video_id) DO UPDATE
                    SET r2_url = EXCLUDED.r2_url,
                        r2_key = EXCLUDED.r2_key,
                        updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(&record.video_id)
                .bind(&record.filename)
                .bind(&record.title)
                .bind(&record.description)
                .bind(record.duration)
                .bind(&record.r2_url)
                .bind(&record.r2_key)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                tracing::debug!(video_id = %record.video_id, "Inserted video row");
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection closed");
    }
}
