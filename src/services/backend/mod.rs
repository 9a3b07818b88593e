pub mod portal;

use async_trait::async_trait;

use crate::models::{HealthAlerts, SessionContext, SummaryEntry, SummaryRecord, SymptomReport};

/// The portal backend that stores summaries and raises health alerts.
#[async_trait]
pub trait HealthBackend: Send + Sync {
    async fn fetch_summaries(&self, ctx: &SessionContext) -> anyhow::Result<Vec<SummaryEntry>>;

    async fn store_summary(&self, ctx: &SessionContext, record: &SummaryRecord)
        -> anyhow::Result<()>;

    async fn analyze_symptoms(&self, ctx: &SessionContext, report: &SymptomReport)
        -> anyhow::Result<()>;

    async fn check_health_alerts(&self, ctx: &SessionContext) -> anyhow::Result<HealthAlerts>;
}
