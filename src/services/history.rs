use chrono::{DateTime, NaiveDate};

use crate::models::{SessionContext, SummaryEntry};
use crate::services::backend::HealthBackend;

/// Renders past call summaries as the assistant's conversation history.
pub fn compose_history(entries: &[SummaryEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "Summary: {}. Date: {}",
                entry.summary.trim_end_matches('.'),
                format_date(entry.started_at.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "unknown".to_string();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.date().format("%Y-%m-%d").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// Loads prior summaries for the caller. A backend failure yields an empty
/// history so the call can still go ahead.
pub async fn load_history(backend: &dyn HealthBackend, ctx: &SessionContext) -> String {
    match backend.fetch_summaries(ctx).await {
        Ok(entries) => {
            tracing::debug!(count = entries.len(), "loaded conversation history");
            compose_history(&entries)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load conversation history");
            String::new()
        }
    }
}
