use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use firefighter_request::clients::{FirefighterClient, RequestGateway, RequestRepository};
use firefighter_request::config::Config;
use firefighter_request::error::ApiError;
use firefighter_request::models::{
    Attachments, LogArtifact, LogKind, Request, RequestForm, RequestPayload, RequestSummary,
    Submission,
};
use firefighter_request::workflow::{SubmissionCtx, SubmissionFlow};

// ========== 模拟后端 ==========

#[derive(Default)]
struct MockState {
    raw_bodies: Vec<Value>,
    requests: Vec<Request>,
    multipart_fields: Vec<(String, String)>,
    /// 创建之后的上传与分析调用，按到达顺序记录路径
    hits: Vec<String>,
}

type Shared = Arc<Mutex<MockState>>;

async fn create(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["itsmNumber"] == "BOOM" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database down").into_response();
    }
    if body["itsmNumber"] == "QUIET" {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let payload: RequestPayload = match serde_json::from_value(body.clone()) {
        Ok(p) => p,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };

    let mut state = state.lock().await;
    state.raw_bodies.push(body);
    // NOID: 成功响应但没有分析 ID
    let analysis_id = if payload.itsm_number == "NOID" {
        String::new()
    } else {
        format!("FFA-HTTP-{}", state.requests.len() + 1)
    };
    let request = Request {
        analysis_id,
        payload,
        created_at: Some("2025-03-04T10:00:00".into()),
        updated_at: Some("2025-03-04T10:00:00".into()),
    };
    state.requests.push(request.clone());
    Json(request).into_response()
}

async fn get_one(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().await;
    match state.requests.iter().find(|r| r.analysis_id == id) {
        Some(r) => Json(r.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list(State(state): State<Shared>) -> Json<Vec<RequestSummary>> {
    let state = state.lock().await;
    // 后端按创建时间倒序返回
    Json(state.requests.iter().rev().map(RequestSummary::from).collect())
}

async fn details(Path(_id): Path<String>) -> Response {
    (StatusCode::NOT_FOUND, r#"{"error":"no such request"}"#).into_response()
}

/// 读出所有 multipart 字段，文件字段记录为 "file:文件名:内容"
async fn read_fields(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let text = field.text().await.unwrap_or_default();
        let value = match file_name {
            Some(f) => format!("file:{f}:{text}"),
            None => text,
        };
        fields.push((name, value));
    }
    fields
}

fn field(fields: &[(String, String)], name: &str) -> String {
    fields
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

async fn sm20(
    State(state): State<Shared>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let fields = read_fields(multipart).await;
    state.lock().await.hits.push(format!("sm20-log/{id}"));
    if id == "FFA-BROKEN" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "SM20 parser crashed").into_response();
    }
    if id == "FFA-SILENT" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    format!("SM20 log uploaded: {} fields", fields.len()).into_response()
}

async fn transaction(
    State(state): State<Shared>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let fields = read_fields(multipart).await;
    state.lock().await.hits.push(format!("transaction-log/{id}"));
    if id == "FFA-SILENT" {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    format!("Transaction log uploaded for {id}: {}", field(&fields, "file")).into_response()
}

async fn cdhdr(State(state): State<Shared>, multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    let content = field(&fields, "file");
    let analysis_id = field(&fields, "analysisId");
    state.lock().await.multipart_fields.extend(fields);

    if content.contains("BAD") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "Invalid CDHDR format"})),
        )
            .into_response();
    }
    Json(json!({
        "success": true,
        "message": "CDHDR uploaded",
        "recordsUploaded": 2,
        "analysisId": analysis_id,
        "nextStep": "Upload CDPOS"
    }))
    .into_response()
}

/// 按 analysisId 返回不同结果
async fn cdpos(multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    let analysis_id = field(&fields, "analysisId");
    match analysis_id.as_str() {
        "FFA-NOHINT" => (
            StatusCode::PRECONDITION_FAILED,
            Json(json!({"success": false, "error": "CDHDR not found"})),
        )
            .into_response(),
        "FFA-MISMATCH" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"success": false, "error": "CDPOS rows reference unknown CHANGENR"})),
        )
            .into_response(),
        "FFA-HTML" => (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response(),
        "FFA-OK" => Json(json!({
            "success": true,
            "message": "CDPOS uploaded",
            "recordsUploaded": 3,
            "recordsMatched": 3,
            "analysisId": analysis_id
        }))
        .into_response(),
        _ => (
            StatusCode::PRECONDITION_FAILED,
            Json(json!({
                "success": false,
                "error": "CDHDR not found",
                "hint": "Upload CDHDR first"
            })),
        )
            .into_response(),
    }
}

async fn stats(Query(query): Query<HashMap<String, String>>) -> Response {
    let Some(id) = query.get("analysisId") else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "analysisId is required"})))
            .into_response();
    };
    Json(json!({
        "success": true,
        "analysisId": id,
        "statistics": {
            "cdhdrRecords": 3,
            "cdposRecords": 7,
            "matchedRecords": 6,
            "unmatchedRecords": 1
        },
        "timestamp": 1_741_000_000_000_i64
    }))
    .into_response()
}

async fn analyze(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.lock().await.hits.push(format!("analyze/{id}"));
    match id.as_str() {
        "FFA-1" => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"message": "Analysis engine offline", "error": "unavailable"})),
        )
            .into_response(),
        "FFA-HTML" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "<html>Internal Error</html>").into_response()
        }
        _ => Json(json!({
            "analysisId": id,
            "status": "completed",
            "aiInsights": {
                "riskScore": 75,
                "activityAlignment": 60,
                "ownership": "Finance",
                "redFlags": ["Posting outside requested window"]
            }
        }))
        .into_response(),
    }
}

/// 在随机端口启动模拟后端
async fn spawn_backend() -> (FirefighterClient, Shared) {
    let state: Shared = Arc::new(Mutex::new(MockState::default()));
    let app = Router::new()
        .route("/api/firefighter/request", post(create))
        .route("/api/firefighter/request/:id", get(get_one))
        .route("/api/firefighter/request/:id/details", get(details))
        .route("/api/firefighter/requests", get(list))
        .route("/api/firefighter/sm20-log/:id", post(sm20))
        .route("/api/firefighter/transaction-log/:id", post(transaction))
        .route("/api/cdhdr-cdpos/upload-cdhdr", post(cdhdr))
        .route("/api/cdhdr-cdpos/upload-cdpos", post(cdpos))
        .route("/api/cdhdr-cdpos/stats", get(stats))
        .route("/api/analysis/analyze/:id", post(analyze))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = FirefighterClient::with_base_url(format!("http://{addr}/")).unwrap();
    (client, state)
}

fn form(itsm: &str) -> RequestForm {
    RequestForm {
        itsm_number: Some(itsm.into()),
        client: Some("Atos".into()),
        system: Some("ecc".into()),
        requested_for: Some("FF_BASIS_01".into()),
        requested_on_behalf_of: Some("r.kumar".into()),
        requested_date: Some("2025-03-04".into()),
        used_date: Some("2025-03-06".into()),
        tcodes: Some("su01, sm37".into()),
        reason: Some("Stuck background job".into()),
        activities: Some("Cancel job and reset user lock".into()),
    }
}

fn payload(itsm: &str) -> RequestPayload {
    form(itsm).into_payload().unwrap()
}

// ========== 创建与查询 ==========

#[tokio::test]
async fn test_create_sends_wire_field_names() {
    let (client, state) = spawn_backend().await;
    assert!(!client.base_url().ends_with('/'));

    let created = client.create_request(&payload("ITSM-1")).await.unwrap();
    assert_eq!(created.analysis_id, "FFA-HTTP-1");

    let state = state.lock().await;
    let body = &state.raw_bodies[0];
    assert_eq!(body["itsmNumber"], "ITSM-1");
    assert_eq!(body["client"], "ATOS");
    assert_eq!(body["system"], "ECC");
    assert_eq!(body["requested_on_behalfof"], "r.kumar");
    assert_eq!(body["requestedDate"], "2025-03-04");
    assert_eq!(body["tcodes"], "SU01,SM37");
    assert_eq!(body["activities_to_be_performed"], "Cancel job and reset user lock");
    assert!(body.get("analysisID").is_none());
}

#[tokio::test]
async fn test_create_then_fetch_round_trip() {
    let (client, _) = spawn_backend().await;
    let sent = payload("ITSM-RT");

    let created = client.create_request(&sent).await.unwrap();
    let fetched = client.get_request_by_id(&created.analysis_id).await.unwrap();

    assert_eq!(fetched.payload, sent);
    assert_eq!(fetched.created_at.as_deref(), Some("2025-03-04T10:00:00"));
}

#[tokio::test]
async fn test_create_error_includes_status_and_body() {
    let (client, _) = spawn_backend().await;

    let err = client.create_request(&payload("BOOM")).await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(
        err.to_string(),
        "Failed to create request: Internal Server Error - database down"
    );

    let err = client.create_request(&payload("QUIET")).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to create request: Bad Request");
}

#[tokio::test]
async fn test_create_without_analysis_id_stops_submission() {
    let (client, state) = spawn_backend().await;
    let flow = SubmissionFlow::new(Arc::new(client), &Config::default());
    let attachments = Attachments::new()
        .with(LogArtifact::new(LogKind::Sm20, "sm20.csv", "date,user\n"))
        .with(LogArtifact::new(LogKind::Cdhdr, "cdhdr.csv", "h\nr1\n"));
    let submission = Submission::new("无 ID", form("NOID"), attachments);

    let report = flow
        .run(&submission, &SubmissionCtx::new("无 ID", 1))
        .await
        .unwrap();

    assert!(!report.created());
    assert_eq!(report.analysis_id, None);
    let messages: Vec<_> = report.notices.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Failed to create request: server returned no analysis ID"]
    );

    let state = state.lock().await;
    assert_eq!(state.raw_bodies.len(), 1);
    assert!(state.hits.is_empty());
    assert!(state.multipart_fields.is_empty());
}

#[tokio::test]
async fn test_fetch_errors_use_status_text() {
    let (client, _) = spawn_backend().await;

    let err = client.get_request_by_id("FFA-NOPE").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch request: Not Found");

    let err = client.get_request_details("FFA-NOPE").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch request details: Not Found");
}

#[tokio::test]
async fn test_list_keeps_server_order() {
    let (client, _) = spawn_backend().await;
    for itsm in ["ITSM-A", "ITSM-B", "ITSM-C"] {
        client.create_request(&payload(itsm)).await.unwrap();
    }

    let first = client.get_all_requests().await.unwrap();
    let second = client.get_all_requests().await.unwrap();
    assert_eq!(first, second);
    let itsm: Vec<_> = first.iter().map(|r| r.itsm_number.as_str()).collect();
    assert_eq!(itsm, vec!["ITSM-C", "ITSM-B", "ITSM-A"]);
}

// ========== 上传 ==========

#[tokio::test]
async fn test_sm20_error_uses_body_text() {
    let (client, _) = spawn_backend().await;
    let file = LogArtifact::new(LogKind::Sm20, "sm20.csv", "date,user\n");

    let ok = client.upload_sm20_log("FFA-1", &file).await.unwrap();
    assert_eq!(ok, "SM20 log uploaded: 1 fields");

    let err = client.upload_sm20_log("FFA-BROKEN", &file).await.unwrap_err();
    assert_eq!(err.to_string(), "SM20 parser crashed");

    let err = client.upload_sm20_log("FFA-SILENT", &file).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to upload SM20 log");
}

#[tokio::test]
async fn test_transaction_log_upload() {
    let (client, state) = spawn_backend().await;
    let file = LogArtifact::new(LogKind::Transaction, "tx.csv", "tcode,user\nFB02,j.doe\n");

    let ok = client.upload_transaction_log("FFA-3", &file).await.unwrap();
    assert_eq!(
        ok,
        "Transaction log uploaded for FFA-3: file:tx.csv:tcode,user\nFB02,j.doe\n"
    );

    let err = client
        .upload_transaction_log("FFA-SILENT", &file)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(502));
    assert_eq!(err.to_string(), "Failed to upload transaction log");

    assert_eq!(
        state.lock().await.hits,
        vec!["transaction-log/FFA-3", "transaction-log/FFA-SILENT"]
    );
}

#[tokio::test]
async fn test_cdhdr_multipart_and_error_field() {
    let (client, state) = spawn_backend().await;

    let good = LogArtifact::new(LogKind::Cdhdr, "cdhdr.csv", "h\nr1\nr2\n");
    let resp = client.upload_cdhdr("FFA-7", &good).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.records_uploaded, Some(2));
    assert_eq!(resp.analysis_id.as_deref(), Some("FFA-7"));

    {
        let state = state.lock().await;
        assert!(state
            .multipart_fields
            .contains(&("file".to_string(), "file:cdhdr.csv:h\nr1\nr2\n".to_string())));
        assert!(state
            .multipart_fields
            .contains(&("analysisId".to_string(), "FFA-7".to_string())));
    }

    let bad = LogArtifact::new(LogKind::Cdhdr, "cdhdr.csv", "BAD");
    let err = client.upload_cdhdr("FFA-7", &bad).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.to_string(), "Invalid CDHDR format");
}

#[tokio::test]
async fn test_cdpos_precondition_message_is_hint() {
    let (client, _) = spawn_backend().await;
    let file = LogArtifact::new(LogKind::Cdpos, "cdpos.csv", "h\nr1\n");

    let err = client.upload_cdpos("FFA-9", &file).await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed { .. }));
    assert_eq!(err.to_string(), "Upload CDHDR first");

    let err = client.upload_cdpos("FFA-NOHINT", &file).await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed { .. }));
    assert_eq!(err.status_code(), Some(412));
    assert_eq!(
        err.to_string(),
        "Please upload CDHDR file first before uploading CDPOS"
    );
}

#[tokio::test]
async fn test_cdpos_other_failures_and_success() {
    let (client, _) = spawn_backend().await;
    let file = LogArtifact::new(LogKind::Cdpos, "cdpos.csv", "h\nr1\nr2\nr3\n");

    let err = client.upload_cdpos("FFA-MISMATCH", &file).await.unwrap_err();
    assert!(!matches!(err, ApiError::PreconditionFailed { .. }));
    assert_eq!(err.status_code(), Some(422));
    assert_eq!(err.to_string(), "CDPOS rows reference unknown CHANGENR");

    let err = client.upload_cdpos("FFA-HTML", &file).await.unwrap_err();
    assert_eq!(err.status_code(), Some(502));
    assert_eq!(err.to_string(), "Failed to upload CDPOS file");

    let ok = client.upload_cdpos("FFA-OK", &file).await.unwrap();
    assert!(ok.success);
    assert_eq!(ok.records_uploaded, Some(3));
    assert_eq!(ok.records_matched, Some(3));
}

// ========== 统计与分析 ==========

#[tokio::test]
async fn test_stats_passes_analysis_id_as_query() {
    let (client, _) = spawn_backend().await;

    let stats = client.get_upload_stats("FFA-42").await.unwrap();
    assert_eq!(stats.analysis_id, "FFA-42");
    assert_eq!(stats.statistics.cdpos_records, 7);
    assert_eq!(stats.statistics.unmatched_records, 1);
}

#[tokio::test]
async fn test_analyze_prefers_message_over_error() {
    let (client, _) = spawn_backend().await;

    let err = client.analyze_request("FFA-1").await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.to_string(), "Analysis engine offline");

    let err = client.analyze_request("FFA-HTML").await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.to_string(), "Failed to analyze request");
}

#[tokio::test]
async fn test_analyze_success_returns_insights() {
    let (client, state) = spawn_backend().await;

    let result = client.analyze_request("FFA-5").await.unwrap();
    assert_eq!(result.0["status"], "completed");

    let insights = result.insights().unwrap();
    assert_eq!(insights.risk_score, 75.0);
    assert_eq!(insights.activity_alignment, 60.0);
    assert_eq!(insights.ownership, "Finance");
    assert_eq!(insights.red_flags, vec!["Posting outside requested window".to_string()]);
    assert!(insights.recommendations.is_empty());
    assert_eq!(insights.risk_level().label(), "HIGH");

    assert_eq!(state.lock().await.hits, vec!["analyze/FFA-5"]);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = FirefighterClient::with_base_url(format!("http://{addr}")).unwrap();
    let err = client.get_all_requests().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(err.status_code(), None);
}
