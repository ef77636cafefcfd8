use anyhow::Result;
use chrono::{DateTime, Utc};
use croner::Cron;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::assess::FleetAssessor;
use crate::config::Config;
use crate::db::Store;
use crate::eapi::DeviceApi;
use crate::models::*;

/// Outcome of one fleet pass, ready to persist
struct RunOutput {
    summary: String,
    report: String,
    report_html: String,
}

/// AssessmentService queues fleet assessment runs and executes them one at a time
pub struct AssessmentService {
    store: Store,
    config: Config,
    api: Arc<dyn DeviceApi>,
    pending_tx: mpsc::Sender<String>,
}

impl AssessmentService {
    pub fn new(store: Store, config: Config, api: Arc<dyn DeviceApi>) -> Arc<Self> {
        let (pending_tx, pending_rx) = mpsc::channel(100);

        let service = Arc::new(Self {
            store,
            config,
            api,
            pending_tx,
        });

        // Start the worker
        let worker_service = service.clone();
        tokio::spawn(async move {
            worker_service.worker(pending_rx).await;
        });

        // Re-queue runs left behind by a previous crash
        let requeue_service = service.clone();
        tokio::spawn(async move {
            requeue_service.requeue_stuck_runs().await;
        });

        service
    }

    /// Submit a run ID for processing
    pub async fn submit(&self, run_id: String) {
        if let Err(e) = self.pending_tx.send(run_id.clone()).await {
            tracing::warn!("Failed to submit assessment {}: {}", run_id, e);
        }
    }

    /// Create a queued run and hand it to the worker.
    /// Returns `None` without queuing when a run is already queued or running.
    pub async fn enqueue(&self, triggered_by: &str) -> Result<Option<AssessmentRun>> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let Some(run) = self.store.create_assessment(&run_id, triggered_by).await? else {
            return Ok(None);
        };
        tracing::info!("Queued assessment {} (triggered_by={})", run_id, triggered_by);
        self.submit(run_id).await;
        Ok(Some(run))
    }

    async fn requeue_stuck_runs(&self) {
        match self.store.list_assessments_stuck().await {
            Ok(runs) => {
                for run in &runs {
                    tracing::info!("Re-queuing stuck assessment {} (status={})", run.id, run.status);
                    if let Err(e) = self.pending_tx.send(run.id.clone()).await {
                        tracing::warn!("Failed to re-queue assessment {}: {}", run.id, e);
                    }
                }
                if !runs.is_empty() {
                    tracing::info!("Re-queued {} stuck assessments", runs.len());
                }
            }
            Err(e) => {
                tracing::error!("Failed to list stuck assessments: {}", e);
            }
        }
    }

    /// Start the cron scheduler when `ASSESS_SCHEDULE` is set
    pub fn start_scheduler(self: &Arc<Self>) {
        let schedule = self.config.schedule.trim().to_string();
        if schedule.is_empty() {
            tracing::info!("Scheduler: no schedule configured, scheduled assessments disabled");
            return;
        }

        let cron = match Cron::new(&schedule).parse() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Scheduler: invalid cron '{}': {}", schedule, e);
                return;
            }
        };
        tracing::info!("Scheduler: assessments scheduled with '{}'", schedule);

        let svc = self.clone();
        tokio::spawn(async move {
            let mut last_run = Utc::now();
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;

                let now = Utc::now();
                if !is_due(&cron, &last_run, &now) {
                    continue;
                }
                last_run = now;

                match svc.enqueue(triggered_by::SCHEDULED).await {
                    Ok(Some(_)) => {}
                    Ok(None) => tracing::info!("Scheduler: assessment already in progress, skipping"),
                    Err(e) => tracing::error!("Scheduler: failed to queue assessment: {}", e),
                }
            }
        });
    }

    async fn worker(&self, mut rx: mpsc::Receiver<String>) {
        while let Some(run_id) = rx.recv().await {
            if let Err(e) = self.process_run(&run_id).await {
                tracing::error!("Assessment {} processing error: {}", run_id, e);
            }
        }
    }

    async fn process_run(&self, run_id: &str) -> Result<()> {
        let run = match self.store.get_assessment(run_id).await? {
            Some(r) => r,
            None => {
                tracing::warn!("Assessment {} not found, skipping", run_id);
                return Ok(());
            }
        };
        if run.status == run_status::COMPLETED || run.status == run_status::FAILED {
            tracing::debug!("Assessment {} already {}, skipping", run_id, run.status);
            return Ok(());
        }

        match self.execute(run_id).await {
            Ok(output) => {
                self.store
                    .update_assessment_completed(run_id, &output.summary, &output.report, &output.report_html)
                    .await?;
                tracing::info!("Assessment {} completed: {}", run_id, output.summary);
            }
            Err(e) => {
                let error_msg = format!("{:#}", e);
                tracing::error!("Assessment {} failed: {}", run_id, error_msg);
                self.store.update_assessment_failed(run_id, &error_msg).await?;
            }
        }

        Ok(())
    }

    async fn execute(&self, run_id: &str) -> Result<RunOutput> {
        let devices = crate::utils::load_devices(&self.config.devices_file).await?;
        if devices.is_empty() {
            return Err(anyhow::anyhow!("No devices listed in {}", self.config.devices_file));
        }

        self.store
            .update_assessment_started(run_id, devices.len() as i64)
            .await?;

        let report = FleetAssessor::new(self.api.clone(), self.config.concurrency)
            .with_precheck(self.config.precheck)
            .with_topology(!self.config.topology_path.is_empty())
            .run(devices)
            .await;

        Ok(RunOutput {
            summary: report.summary(),
            report: serde_json::to_string(&report)?,
            report_html: crate::report::render_html(&report)?,
        })
    }
}

/// A schedule is due once its next occurrence after the last run has passed
fn is_due(cron: &Cron, last_run: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
    match cron.find_next_occurrence(last_run, false) {
        Ok(next) => next <= *now,
        Err(_) => false,
    }
}
