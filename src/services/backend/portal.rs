use anyhow::Context;
use async_trait::async_trait;

use super::HealthBackend;
use crate::models::{HealthAlerts, SessionContext, SummaryEntry, SummaryRecord, SymptomReport};

pub struct PortalBackend {
    base_url: String,
    client: reqwest::Client,
}

impl PortalBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-2xx response into an error carrying the backend's `detail`.
async fn ensure_success(resp: reqwest::Response, what: &str) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let detail = body["detail"]
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("status {status}"));
    anyhow::bail!("{what} rejected ({status}): {detail}")
}

#[async_trait]
impl HealthBackend for PortalBackend {
    async fn fetch_summaries(&self, ctx: &SessionContext) -> anyhow::Result<Vec<SummaryEntry>> {
        let resp = self
            .client
            .get(self.url("/summaries/"))
            .bearer_auth(ctx.auth_token())
            .send()
            .await
            .context("failed to fetch summaries")?;

        ensure_success(resp, "summaries")
            .await?
            .json()
            .await
            .context("failed to parse summaries")
    }

    async fn store_summary(
        &self,
        ctx: &SessionContext,
        record: &SummaryRecord,
    ) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.url("/store-summary"))
            .bearer_auth(ctx.auth_token())
            .json(record)
            .send()
            .await
            .context("failed to store summary")?;

        ensure_success(resp, "summary").await?;
        Ok(())
    }

    async fn analyze_symptoms(
        &self,
        ctx: &SessionContext,
        report: &SymptomReport,
    ) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.url("/analyze-symptoms"))
            .bearer_auth(ctx.auth_token())
            .json(report)
            .send()
            .await
            .context("failed to submit symptoms")?;

        ensure_success(resp, "symptom analysis").await?;
        Ok(())
    }

    async fn check_health_alerts(&self, ctx: &SessionContext) -> anyhow::Result<HealthAlerts> {
        let resp = self
            .client
            .post(self.url("/check-health-alerts"))
            .bearer_auth(ctx.auth_token())
            .send()
            .await
            .context("failed to check health alerts")?;

        ensure_success(resp, "health alert check")
            .await?
            .json()
            .await
            .context("failed to parse health alerts")
    }
}
