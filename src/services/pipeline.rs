//! Post-call steps: fetch the provider's record, store the summary, report
//! symptoms from the transcript, then ask the backend for health alerts.

use std::sync::Arc;

use crate::config::CallTiming;
use crate::errors::CallError;
use crate::models::{
    CallDetail, PipelineReport, PipelineStep, SessionContext, StepFailure, SummaryRecord,
    SymptomReport,
};
use crate::services::backend::HealthBackend;
use crate::services::symptoms::SymptomExtractor;
use crate::services::voice::VoiceProvider;

#[derive(Clone)]
pub struct SummaryPipeline {
    voice: Arc<dyn VoiceProvider>,
    backend: Arc<dyn HealthBackend>,
    extractor: Arc<SymptomExtractor>,
    timing: CallTiming,
}

impl SummaryPipeline {
    pub fn new(
        voice: Arc<dyn VoiceProvider>,
        backend: Arc<dyn HealthBackend>,
        extractor: Arc<SymptomExtractor>,
        timing: CallTiming,
    ) -> Self {
        Self {
            voice,
            backend,
            extractor,
            timing,
        }
    }

    /// Waits for the provider to finish its post-call analysis and returns
    /// the call record. After `summary_max_polls` fetches the last record is
    /// returned even if the provider has not marked it processed.
    pub async fn ready_for_summary(&self, call_id: &str) -> Result<CallDetail, CallError> {
        tokio::time::sleep(self.timing.summary_delay).await;

        let max_polls = self.timing.summary_max_polls.max(1);
        let mut poll = 1;
        loop {
            let detail = self
                .voice
                .get_call_detail(call_id)
                .await
                .map_err(|e| CallError::DetailFetchFailure(format!("{e:#}")))?;

            if detail.is_processed() {
                return Ok(detail);
            }
            if poll >= max_polls {
                tracing::debug!(call_id, poll, "call record not marked processed, using it as-is");
                return Ok(detail);
            }

            poll += 1;
            tokio::time::sleep(self.timing.summary_poll_interval).await;
        }
    }

    /// Runs every step it can. Only a failed detail fetch stops the run; the
    /// later steps depend on nothing but the fetched record.
    pub async fn run(&self, ctx: &SessionContext, call_id: &str) -> PipelineReport {
        let mut report = PipelineReport::new(call_id);

        let detail = match self.ready_for_summary(call_id).await {
            Ok(detail) => detail,
            Err(e) => {
                record_failure(&mut report, PipelineStep::DetailFetch, e);
                return report;
            }
        };

        let record = SummaryRecord::from_detail(call_id, &detail);
        match self.backend.store_summary(ctx, &record).await {
            Ok(()) => {
                tracing::info!(call_id, "summary stored");
                report.summary_stored = true;
            }
            Err(e) => record_failure(
                &mut report,
                PipelineStep::SummarySubmit,
                CallError::SummarySubmitFailure(format!("{e:#}")),
            ),
        }

        if let Some(transcript) = detail.transcript_text() {
            let symptoms = self.extractor.extract(transcript);
            tracing::info!(call_id, count = symptoms.len(), "extracted symptoms from transcript");

            let body = SymptomReport {
                call_id: call_id.to_string(),
                symptoms: symptoms.clone(),
            };
            match self.backend.analyze_symptoms(ctx, &body).await {
                Ok(()) => report.symptoms_submitted = true,
                Err(e) => record_failure(
                    &mut report,
                    PipelineStep::AnalysisSubmit,
                    CallError::AnalysisSubmitFailure(format!("{e:#}")),
                ),
            }
            report.symptoms = Some(symptoms);
        }

        match self.backend.check_health_alerts(ctx).await {
            Ok(alerts) => {
                if !alerts.alerts.is_empty() {
                    tracing::warn!(call_id, alerts = ?alerts.alerts, "health alerts detected");
                }
                report.alerts = Some(alerts);
            }
            Err(e) => record_failure(
                &mut report,
                PipelineStep::AlertCheck,
                CallError::AlertCheckFailure(format!("{e:#}")),
            ),
        }

        report.detail = Some(detail);
        report
    }

    /// Stores the summary for an already fetched record again.
    pub async fn resubmit(
        &self,
        ctx: &SessionContext,
        call_id: &str,
        detail: &CallDetail,
    ) -> Result<(), CallError> {
        let record = SummaryRecord::from_detail(call_id, detail);
        self.backend
            .store_summary(ctx, &record)
            .await
            .map_err(|e| CallError::SummarySubmitFailure(format!("{e:#}")))
    }
}

fn record_failure(report: &mut PipelineReport, step: PipelineStep, err: CallError) {
    match step {
        PipelineStep::AlertCheck => {
            tracing::warn!(call_id = %report.call_id, error = %err, "alert check failed")
        }
        _ => tracing::error!(call_id = %report.call_id, step = ?step, error = %err, "summary step failed"),
    }
    report.failures.push(StepFailure {
        step,
        message: err.to_string(),
    });
}
