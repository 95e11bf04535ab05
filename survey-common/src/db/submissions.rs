//! Completed survey records

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::models::SurveyAggregate;
use crate::progress::SurveySink;
use crate::{Error, Result};

/// Stored survey with its record metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub survey: SurveyAggregate,
}

/// `SurveySink` writing to the `surveys` table
#[derive(Debug, Clone)]
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert `survey`, returning the new record id
    pub async fn insert(&self, survey: &SurveyAggregate) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO surveys (id, model_order, step_one, step_two, step_three, review, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(serde_json::to_string(&survey.model_order())?)
        .bind(serde_json::to_string(&survey.step_one)?)
        .bind(serde_json::to_string(&survey.step_two)?)
        .bind(serde_json::to_string(&survey.step_three)?)
        .bind(serde_json::to_string(&survey.review)?)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(
            target: "analytics",
            event = "survey_submitted",
            survey_id = %id,
            preference = %survey.review.preference,
            "Survey submitted"
        );

        Ok(id)
    }
}

impl SurveySink for SqliteSink {
    async fn submit(&self, survey: &SurveyAggregate) -> Result<()> {
        self.insert(survey).await.map(|_| ())
    }
}

/// Number of stored surveys
pub async fn count_submissions(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM surveys")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load one stored survey by id
pub async fn fetch_submission(pool: &SqlitePool, id: Uuid) -> Result<Option<SubmissionRecord>> {
    let row = sqlx::query(
        "SELECT step_one, step_two, step_three, review, created_at FROM surveys WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let step_one: String = row.get("step_one");
    let step_two: String = row.get("step_two");
    let step_three: String = row.get("step_three");
    let review: String = row.get("review");
    let created_at: String = row.get("created_at");

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Bad created_at for survey {}: {}", id, e)))?
        .with_timezone(&Utc);

    Ok(Some(SubmissionRecord {
        id,
        created_at,
        survey: SurveyAggregate {
            step_one: serde_json::from_str(&step_one)?,
            step_two: serde_json::from_str(&step_two)?,
            step_three: serde_json::from_str(&step_three)?,
            review: serde_json::from_str(&review)?,
        },
    }))
}
