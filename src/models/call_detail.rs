use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SymptomObservation;

/// Post-call record returned by the voice provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub stereo_recording_url: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ended_reason: Option<String>,
    #[serde(default)]
    pub analysis: Option<CallAnalysis>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalysis {
    #[serde(default)]
    pub summary: Option<String>,
}

impl CallDetail {
    /// Top-level summary, falling back to the analysis block.
    pub fn summary_text(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.analysis.as_ref().and_then(|a| a.summary.as_deref()))
            .unwrap_or("")
    }

    pub fn transcript_text(&self) -> Option<&str> {
        self.transcript.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Whether the provider has finished its post-call analysis.
    pub fn is_processed(&self) -> bool {
        self.status.as_deref() == Some("ended") && !self.summary_text().is_empty()
    }
}

/// Body of the backend's summary endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRecord {
    pub call_id: String,
    pub summary: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "endedAt")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(rename = "recordingUrl")]
    pub recording_url: Option<String>,
    #[serde(rename = "stereoRecordingUrl")]
    pub stereo_recording_url: Option<String>,
    pub transcript: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "endedReason")]
    pub ended_reason: Option<String>,
}

impl SummaryRecord {
    pub fn from_detail(call_id: &str, detail: &CallDetail) -> Self {
        Self {
            call_id: call_id.to_string(),
            summary: detail.summary_text().to_string(),
            started_at: detail.started_at,
            ended_at: detail.ended_at,
            recording_url: detail.recording_url.clone(),
            stereo_recording_url: detail.stereo_recording_url.clone(),
            transcript: detail.transcript.clone(),
            status: detail.status.clone(),
            ended_reason: detail.ended_reason.clone(),
        }
    }
}

/// Body of the backend's symptom-analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymptomReport {
    pub call_id: String,
    pub symptoms: Vec<SymptomObservation>,
}

/// One past call summary as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryEntry {
    pub summary: String,
    #[serde(rename = "startedAt", default)]
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthAlerts {
    #[serde(default)]
    pub alerts: Vec<serde_json::Value>,
}
