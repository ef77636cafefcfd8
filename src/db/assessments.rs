use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::models::*;

fn map_run_row(row: &SqliteRow) -> AssessmentRun {
    // Listing queries leave out the heavy report columns
    let report: Option<String> = row.try_get("report").ok().flatten();
    AssessmentRun {
        id: row.get("id"),
        status: row.get("status"),
        triggered_by: row.get("triggered_by"),
        device_count: row.get("device_count"),
        summary: row.get("summary"),
        report: report.and_then(|r| serde_json::from_str(&r).ok()),
        report_html: row.try_get("report_html").ok().flatten(),
        error: row.get("error"),
        created_at: row.get("created_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    }
}

const SELECT_RUN: &str = r#"
    SELECT id, status, triggered_by, device_count, summary, report, report_html, error,
           created_at, started_at, completed_at
    FROM assessment_runs
"#;

const SELECT_RUN_SUMMARY: &str = r#"
    SELECT id, status, triggered_by, device_count, summary, error,
           created_at, started_at, completed_at
    FROM assessment_runs
"#;

pub struct AssessmentRepo;

impl AssessmentRepo {
    /// Insert a queued run unless another run is queued or running.
    /// Check and insert are one statement, so concurrent callers cannot both win.
    pub async fn create_if_idle(
        pool: &Pool<Sqlite>,
        id: &str,
        triggered_by: &str,
    ) -> Result<Option<AssessmentRun>> {
        let result = sqlx::query(
            r#"
            INSERT INTO assessment_runs (id, status, triggered_by, created_at)
            SELECT ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM assessment_runs WHERE status IN (?, ?)
            )
            "#,
        )
        .bind(id)
        .bind(run_status::QUEUED)
        .bind(triggered_by)
        .bind(Utc::now())
        .bind(run_status::QUEUED)
        .bind(run_status::RUNNING)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let run = Self::get(pool, id)
            .await?
            .context("Assessment run not found after creation")?;
        Ok(Some(run))
    }

    pub async fn get(pool: &Pool<Sqlite>, id: &str) -> Result<Option<AssessmentRun>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_RUN))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_run_row))
    }

    /// Most recent completed run, including its report
    pub async fn latest_completed(pool: &Pool<Sqlite>) -> Result<Option<AssessmentRun>> {
        let row = sqlx::query(&format!(
            "{} WHERE status = ? ORDER BY completed_at DESC LIMIT 1",
            SELECT_RUN
        ))
        .bind(run_status::COMPLETED)
        .fetch_optional(pool)
        .await?;
        Ok(row.as_ref().map(map_run_row))
    }

    pub async fn update_started(pool: &Pool<Sqlite>, id: &str, device_count: i64) -> Result<()> {
        sqlx::query("UPDATE assessment_runs SET status = ?, device_count = ?, started_at = ? WHERE id = ?")
            .bind(run_status::RUNNING)
            .bind(device_count)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update_completed(
        pool: &Pool<Sqlite>,
        id: &str,
        summary: &str,
        report: &str,
        report_html: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE assessment_runs
            SET status = ?, summary = ?, report = ?, report_html = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(run_status::COMPLETED)
        .bind(summary)
        .bind(report)
        .bind(report_html)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_failed(pool: &Pool<Sqlite>, id: &str, error: &str) -> Result<()> {
        sqlx::query("UPDATE assessment_runs SET status = ?, error = ?, completed_at = ? WHERE id = ?")
            .bind(run_status::FAILED)
            .bind(error)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn list_recent(pool: &Pool<Sqlite>, limit: i32) -> Result<Vec<AssessmentRun>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at DESC LIMIT ?", SELECT_RUN_SUMMARY))
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_run_row).collect())
    }

    /// Runs left queued or running by a previous process
    pub async fn list_stuck(pool: &Pool<Sqlite>) -> Result<Vec<AssessmentRun>> {
        let rows = sqlx::query(&format!(
            "{} WHERE status IN (?, ?) ORDER BY created_at",
            SELECT_RUN_SUMMARY
        ))
        .bind(run_status::QUEUED)
        .bind(run_status::RUNNING)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_run_row).collect())
    }
}
