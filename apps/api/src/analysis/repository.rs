use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::analysis::{Analysis, AnalysisRow, NewAnalysis, Suggestion};

/// Row-level persistence for `Analysis` records.
///
/// Terminal transitions (`mark_completed`, `mark_failed`) only apply while the
/// row is still `pending` or `processing`, and report whether they applied.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn insert(&self, new: &NewAnalysis) -> Result<Analysis>;

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>>;

    async fn mark_processing(&self, id: Uuid) -> Result<bool>;

    async fn mark_completed(
        &self,
        id: Uuid,
        similarity_score: f64,
        suggestions: &[Suggestion],
        results: &Value,
    ) -> Result<bool>;

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool>;

    async fn record_optimization(
        &self,
        id: Uuid,
        selected: &[Uuid],
        file_name: &str,
        optimized_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct PgAnalysisRepository {
    pool: PgPool,
}

impl PgAnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisRepository for PgAnalysisRepository {
    async fn insert(&self, new: &NewAnalysis) -> Result<Analysis> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO analyses
                (id, user_id, resume_path, job_description_path, file_format,
                 original_filename, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.user_id)
        .bind(&new.resume_path)
        .bind(&new.job_description_path)
        .bind(new.file_format.as_str())
        .bind(&new.original_filename)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        let row = sqlx::query_as::<_, AnalysisRow>("SELECT * FROM analyses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Analysis::try_from).transpose()
    }

    async fn mark_processing(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE analyses
            SET status = 'processing', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        similarity_score: f64,
        suggestions: &[Suggestion],
        results: &Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE analyses
            SET status = 'completed',
                similarity_score = $2,
                suggestions = $3,
                results = $4,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(id)
        .bind(similarity_score)
        .bind(sqlx::types::Json(suggestions))
        .bind(results)
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;
        if !applied {
            warn!("Analysis {id} was already terminal; completion not recorded");
        }
        Ok(applied)
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE analyses
            SET status = 'failed',
                results = jsonb_build_object('error', $2::text),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;
        if !applied {
            warn!("Analysis {id} was already terminal; failure not recorded");
        }
        Ok(applied)
    }

    async fn record_optimization(
        &self,
        id: Uuid,
        selected: &[Uuid],
        file_name: &str,
        optimized_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE analyses
            SET selected_suggestions = $2,
                optimized_file_name = $3,
                optimized_at = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(selected)
        .bind(file_name)
        .bind(optimized_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
