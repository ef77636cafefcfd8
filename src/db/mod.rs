mod assessments;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::models::*;

/// Typed error for "resource not found" so the API error handler can
/// downcast instead of matching on strings.
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Store handles all database operations, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Create a new database store with the default pool size
    #[cfg(test)]
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_pool_size(db_path, 5).await
    }

    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ========== Assessment Run Operations ==========

    /// Queue a new run; `None` when a run is already queued or running
    pub async fn create_assessment(&self, id: &str, triggered_by: &str) -> Result<Option<AssessmentRun>> {
        assessments::AssessmentRepo::create_if_idle(&self.pool, id, triggered_by).await
    }

    pub async fn get_assessment(&self, id: &str) -> Result<Option<AssessmentRun>> {
        assessments::AssessmentRepo::get(&self.pool, id).await
    }

    /// Like `get_assessment`, but a missing run is a `NotFoundError`
    pub async fn require_assessment(&self, id: &str) -> Result<AssessmentRun> {
        self.get_assessment(id)
            .await?
            .ok_or_else(|| NotFoundError::new("assessment", id).into())
    }

    pub async fn latest_assessment(&self) -> Result<Option<AssessmentRun>> {
        assessments::AssessmentRepo::latest_completed(&self.pool).await
    }

    pub async fn update_assessment_started(&self, id: &str, device_count: i64) -> Result<()> {
        assessments::AssessmentRepo::update_started(&self.pool, id, device_count).await
    }

    pub async fn update_assessment_completed(
        &self,
        id: &str,
        summary: &str,
        report: &str,
        report_html: &str,
    ) -> Result<()> {
        assessments::AssessmentRepo::update_completed(&self.pool, id, summary, report, report_html).await
    }

    pub async fn update_assessment_failed(&self, id: &str, error: &str) -> Result<()> {
        assessments::AssessmentRepo::update_failed(&self.pool, id, error).await
    }

    pub async fn list_assessments_recent(&self, limit: i32) -> Result<Vec<AssessmentRun>> {
        assessments::AssessmentRepo::list_recent(&self.pool, limit).await
    }

    pub async fn list_assessments_stuck(&self) -> Result<Vec<AssessmentRun>> {
        assessments::AssessmentRepo::list_stuck(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::new(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_assessment_lifecycle() {
        let (store, _dir) = test_store().await;

        let run = store.create_assessment("run-1", triggered_by::API).await.unwrap().unwrap();
        assert_eq!(run.status, run_status::QUEUED);
        assert_eq!(run.device_count, 0);
        assert!(store.create_assessment("run-2", triggered_by::API).await.unwrap().is_none());

        store.update_assessment_started("run-1", 3).await.unwrap();
        let run = store.get_assessment("run-1").await.unwrap().unwrap();
        assert_eq!(run.status, run_status::RUNNING);
        assert_eq!(run.device_count, 3);
        assert!(run.started_at.is_some());
        assert!(store.latest_assessment().await.unwrap().is_none());
        assert!(store.create_assessment("run-2", triggered_by::API).await.unwrap().is_none());

        store
            .update_assessment_completed("run-1", "3 devices", r#"{"bgp":{}}"#, "<html></html>")
            .await
            .unwrap();
        let run = store.latest_assessment().await.unwrap().unwrap();
        assert_eq!(run.id, "run-1");
        assert_eq!(run.status, run_status::COMPLETED);
        assert_eq!(run.summary.as_deref(), Some("3 devices"));
        assert_eq!(run.report, Some(serde_json::json!({"bgp": {}})));
        assert_eq!(run.report_html.as_deref(), Some("<html></html>"));
        assert!(store.create_assessment("run-2", triggered_by::API).await.unwrap().is_some());
        assert!(store.get_assessment("run-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_creates_queue_one_run() {
        let (store, _dir) = test_store().await;

        let (first, second) = tokio::join!(
            store.create_assessment("left", triggered_by::API),
            store.create_assessment("right", triggered_by::SCHEDULED),
        );
        let created: Vec<AssessmentRun> = [first.unwrap(), second.unwrap()].into_iter().flatten().collect();
        assert_eq!(created.len(), 1);

        let active = store.list_assessments_stuck().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, created[0].id);
    }

    #[tokio::test]
    async fn test_failed_and_stuck_runs() {
        let (store, _dir) = test_store().await;

        store.create_assessment("a", triggered_by::SCHEDULED).await.unwrap().unwrap();
        store.update_assessment_failed("a", "device list missing").await.unwrap();
        store.create_assessment("b", triggered_by::API).await.unwrap().unwrap();
        store.update_assessment_started("b", 1).await.unwrap();

        // A queued row left next to a running one by a crashed process
        sqlx::query("INSERT INTO assessment_runs (id, status, triggered_by, created_at) VALUES (?, ?, ?, ?)")
            .bind("c")
            .bind(run_status::QUEUED)
            .bind(triggered_by::API)
            .bind(chrono::Utc::now())
            .execute(&store.pool)
            .await
            .unwrap();

        let stuck: Vec<String> = store
            .list_assessments_stuck()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(stuck, vec!["b".to_string(), "c".to_string()]);

        let failed = store.get_assessment("a").await.unwrap().unwrap();
        assert_eq!(failed.status, run_status::FAILED);
        assert_eq!(failed.error.as_deref(), Some("device list missing"));

        let recent = store.list_assessments_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.report.is_none()));

        assert!(store.get_assessment("missing").await.unwrap().is_none());
        let err = store.require_assessment("missing").await.unwrap_err();
        let nf = err.downcast_ref::<NotFoundError>().unwrap();
        assert_eq!(nf.to_string(), "assessment not found: missing");
    }
}
