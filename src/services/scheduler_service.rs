use crate::errors::AppError;
use crate::external::price_oracle::PriceOracle;
use crate::services::report_service;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: PgPool,
    pub oracle: Arc<dyn PriceOracle>,
}

pub struct ReportScheduler {
    scheduler: JobScheduler,
    context: JobContext,
}

impl ReportScheduler {
    pub async fn new(pool: PgPool, oracle: Arc<dyn PriceOracle>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context: JobContext { pool, oracle },
        })
    }

    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting report scheduler...");

        // Test mode runs the job every minute instead of daily
        let test_mode = std::env::var("REPORT_SCHEDULER_TEST_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let (schedule, description) = if test_mode {
            warn!("⚠️  REPORT SCHEDULER IN TEST MODE - Job will run every minute!");
            ("0 */1 * * * *", "Every minute (TEST MODE)")
        } else {
            ("0 0 8 * * *", "Daily at 8:00 AM")
        };

        let context = self.context.clone();
        // A batch can outlive the cron period on slow upstreams; overlapping
        // runs are skipped, not queued.
        let running = Arc::new(tokio::sync::Mutex::new(()));

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let running = running.clone();
            Box::pin(async move {
                let _guard = match running.try_lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        warn!("⏭️  Previous daily report batch still running, skipping this tick");
                        return;
                    }
                };
                run_daily_report_job(&context).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create daily report job: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add daily report job: {}", e)))?;

        info!("📅 Scheduled: daily_reports - {} [cron: {}]", description, schedule);

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Report scheduler started");
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping report scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Report scheduler stopped");
        Ok(())
    }
}

async fn run_daily_report_job(context: &JobContext) {
    info!("🏃 Starting job: daily_reports");
    let started_at = Utc::now();

    let result =
        report_service::send_daily_reports(&context.pool, context.oracle.as_ref()).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(outcome) => info!(
            "✅ Job completed: daily_reports (sent: {}, failed: {}, duration: {}ms)",
            outcome.sent, outcome.failed, duration_ms
        ),
        Err(e) => error!("❌ Job failed: daily_reports - {}", e),
    }
}
