use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use carecall::config::CallTiming;
use carecall::handlers;
use carecall::models::{
    CallDetail, HealthAlerts, SessionContext, SummaryEntry, SummaryRecord, SymptomReport,
};
use carecall::services::backend::HealthBackend;
use carecall::services::call::CallController;
use carecall::services::voice::{AssistantOverrides, VoiceProvider};
use carecall::state::AppState;

// ── Mock Providers ──

struct MockVoice {
    call_id: Option<String>,
    overrides: Arc<Mutex<Vec<AssistantOverrides>>>,
}

#[async_trait]
impl VoiceProvider for MockVoice {
    async fn start_session(&self, overrides: &AssistantOverrides) -> anyhow::Result<Value> {
        self.overrides.lock().unwrap().push(overrides.clone());
        Ok(match &self.call_id {
            Some(id) => json!({
                "id": id,
                "status": "queued",
                "webCallUrl": format!("https://vapi.daily.co/{id}"),
            }),
            None => json!({ "status": "queued" }),
        })
    }

    async fn stop_session(&self, _session_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_call_detail(&self, session_id: &str) -> anyhow::Result<CallDetail> {
        Ok(CallDetail {
            id: Some(session_id.to_string()),
            summary: Some("Discussed a cough.".to_string()),
            transcript: Some("User: she has a mild cough for a few days".to_string()),
            status: Some("ended".to_string()),
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct MockBackend {
    stored: Mutex<Vec<SummaryRecord>>,
    reports: Mutex<Vec<SymptomReport>>,
}

#[async_trait]
impl HealthBackend for MockBackend {
    async fn fetch_summaries(&self, _ctx: &SessionContext) -> anyhow::Result<Vec<SummaryEntry>> {
        Ok(vec![SummaryEntry {
            summary: "Child has asthma".to_string(),
            started_at: Some("2025-01-20T08:00:00Z".to_string()),
        }])
    }

    async fn store_summary(&self, _ctx: &SessionContext, record: &SummaryRecord) -> anyhow::Result<()> {
        self.stored.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn analyze_symptoms(&self, _ctx: &SessionContext, report: &SymptomReport) -> anyhow::Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn check_health_alerts(&self, _ctx: &SessionContext) -> anyhow::Result<HealthAlerts> {
        Ok(HealthAlerts::default())
    }
}

// ── Helpers ──

fn test_timing() -> CallTiming {
    CallTiming {
        start_max_attempts: 3,
        start_retry_delay: Duration::ZERO,
        summary_delay: Duration::ZERO,
        summary_poll_interval: Duration::ZERO,
        summary_max_polls: 1,
    }
}

struct Harness {
    app: Router,
    overrides: Arc<Mutex<Vec<AssistantOverrides>>>,
    backend: Arc<MockBackend>,
}

fn harness(call_id: Option<&str>) -> Harness {
    let overrides = Arc::new(Mutex::new(vec![]));
    let voice = MockVoice {
        call_id: call_id.map(|s| s.to_string()),
        overrides: Arc::clone(&overrides),
    };
    let backend = Arc::new(MockBackend::default());
    let calls = CallController::new(Arc::new(voice), backend.clone(), test_timing());
    let state = Arc::new(AppState {
        calls,
        backend: backend.clone(),
    });
    Harness {
        app: handlers::router(state),
        overrides,
        backend,
    }
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer user-token");
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(res: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn wait_for_state(app: &Router, state: &str) -> Value {
    for _ in 0..200 {
        let res = app
            .clone()
            .oneshot(authed("GET", "/api/call/status", None))
            .await
            .unwrap();
        let json = body_json(res).await;
        if json["state"] == state {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("call never reached state {state}");
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Start ──

#[tokio::test]
async fn test_start_requires_auth() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/call/start")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(h.overrides.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_start_with_history() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/call/start",
            Some(json!({"history": "Summary: earlier call", "profile": {"childAge": "4"}})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["call_id"], "call-1");
    assert_eq!(body["web_call_url"], "https://vapi.daily.co/call-1");

    let sent = h.overrides.lock().unwrap();
    assert_eq!(
        sent[0].variable_values.previous_conversation_history,
        "Summary: earlier call"
    );
    assert_eq!(sent[0].variable_values.profile.child_age.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_start_loads_history_from_backend() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .clone()
        .oneshot(authed("POST", "/api/call/start", Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let sent = h.overrides.lock().unwrap();
    assert_eq!(
        sent[0].variable_values.previous_conversation_history,
        "Summary: Child has asthma. Date: 2025-01-20"
    );
}

#[tokio::test]
async fn test_start_failure_is_reported() {
    let h = harness(None);
    let res = h
        .app
        .clone()
        .oneshot(authed("POST", "/api/call/start", Some(json!({"history": ""}))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(res).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("could not start call"));
    assert_eq!(h.overrides.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_second_start_conflicts() {
    let h = harness(Some("call-1"));
    let body = Some(json!({"history": ""}));
    let res = h
        .app
        .clone()
        .oneshot(authed("POST", "/api/call/start", body.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = h
        .app
        .clone()
        .oneshot(authed("POST", "/api/call/start", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

// ── Stop ──

#[tokio::test]
async fn test_stop_without_call() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(authed("POST", "/api/call/stop", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_stop_submits_summary_in_background() {
    let h = harness(Some("call-7"));
    h.app
        .clone()
        .oneshot(authed("POST", "/api/call/start", Some(json!({"history": ""}))))
        .await
        .unwrap();

    let res = h
        .app
        .clone()
        .oneshot(authed("POST", "/api/call/stop", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let json = body_json(res).await;
    assert_eq!(json["call_id"], "call-7");

    let status = wait_for_state(&h.app, "ended").await;
    assert_eq!(status["last_report"]["summary_stored"], true);

    let stored = h.backend.stored.lock().unwrap();
    assert_eq!(stored[0].call_id, "call-7");
    assert_eq!(stored[0].summary, "Discussed a cough.");

    let reports = h.backend.reports.lock().unwrap();
    let symptoms = serde_json::to_value(&reports[0].symptoms).unwrap();
    assert_eq!(symptoms[0]["name"], "cough");
    assert_eq!(symptoms[0]["severity"], "mild");
    assert_eq!(symptoms[0]["duration"], "few days");
}

#[tokio::test]
async fn test_retry_without_summary() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(authed("POST", "/api/call/summary/retry", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Provider events ──

#[tokio::test]
async fn test_provider_events_update_status() {
    let h = harness(Some("call-1"));
    h.app
        .clone()
        .oneshot(authed("POST", "/api/call/start", Some(json!({"history": ""}))))
        .await
        .unwrap();

    for event in [
        json!({"type": "call-start"}),
        json!({"type": "speech-start"}),
        json!({"type": "volume-level", "level": 0.25}),
    ] {
        let res = h
            .app
            .clone()
            .oneshot(authed("POST", "/api/call/events", Some(event)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let res = h
        .app
        .clone()
        .oneshot(authed("GET", "/api/call/status", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["state"], "active");
    assert_eq!(json["connected"], true);
    assert_eq!(json["assistant_speaking"], true);
    assert_eq!(json["volume_level"], 0.25);
}

#[tokio::test]
async fn test_remote_call_end_triggers_summary() {
    let h = harness(Some("call-3"));
    h.app
        .clone()
        .oneshot(authed("POST", "/api/call/start", Some(json!({"history": ""}))))
        .await
        .unwrap();

    let res = h
        .app
        .clone()
        .oneshot(authed("POST", "/api/call/events", Some(json!({"type": "call-end"}))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    wait_for_state(&h.app, "ended").await;
    assert_eq!(h.backend.stored.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_event_rejected() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(authed("POST", "/api/call/events", Some(json!({"type": "message"}))))
        .await
        .unwrap();
    assert!(res.status().is_client_error());
}

// ── Symptoms ──

#[tokio::test]
async fn test_extract_symptoms_endpoint() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/symptoms/extract")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({"transcript": "My child has a high fever since yesterday and a dry cough"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = body_json(res).await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "fever");
    assert_eq!(list[0]["severity"], "high");
    assert_eq!(list[0]["duration"], "since yesterday");
    assert_eq!(list[1]["name"], "cough");
    assert!(list[1]["severity"].is_null());
    assert!(list[1]["duration"].is_null());
}

#[tokio::test]
async fn test_extract_empty_transcript() {
    let h = harness(Some("call-1"));
    let res = h
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/symptoms/extract")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"transcript": ""}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(res).await, json!([]));
}
