//! 内存后端 - 基础设施层
//!
//! 在进程内实现完整的网关接口，用于测试和离线演练。
//! 可以为任意操作注入失败，并记录每一次调用。

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clients::{RequestGateway, RequestRepository};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AnalysisResult, FileUploadResponse, LogArtifact, Request, RequestDetails, RequestPayload,
    RequestSummary, UploadStatistics, UploadStats,
};

/// 内存后端支持的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    GetById,
    GetDetails,
    List,
    UploadSm20,
    UploadTransaction,
    UploadCdhdr,
    UploadCdpos,
    Stats,
    Analyze,
}

impl Operation {
    fn endpoint(self) -> &'static str {
        match self {
            Operation::Create => "memory://firefighter/request",
            Operation::GetById => "memory://firefighter/request/{id}",
            Operation::GetDetails => "memory://firefighter/request/{id}/details",
            Operation::List => "memory://firefighter/requests",
            Operation::UploadSm20 => "memory://firefighter/sm20-log",
            Operation::UploadTransaction => "memory://firefighter/transaction-log",
            Operation::UploadCdhdr => "memory://cdhdr-cdpos/upload-cdhdr",
            Operation::UploadCdpos => "memory://cdhdr-cdpos/upload-cdpos",
            Operation::Stats => "memory://cdhdr-cdpos/stats",
            Operation::Analyze => "memory://analysis/analyze",
        }
    }
}

/// 注入的失败响应
#[derive(Debug, Clone)]
struct InjectedFailure {
    status: u16,
    message: String,
}

#[derive(Debug, Clone)]
struct StoredRequest {
    request: Request,
    sm20_uploaded: bool,
    transaction_uploaded: bool,
    cdhdr_records: Option<u64>,
    cdpos_records: Option<u64>,
    analysis: Option<AnalysisResult>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    requests: Vec<StoredRequest>,
    failures: HashMap<Operation, InjectedFailure>,
    calls: Vec<Operation>,
}

impl State {
    fn find_mut(&mut self, id: &str) -> Option<&mut StoredRequest> {
        self.requests
            .iter_mut()
            .find(|r| r.request.analysis_id == id)
    }

    /// 记录调用，并在有注入失败时返回对应错误
    fn enter(&mut self, op: Operation) -> ApiResult<()> {
        self.calls.push(op);
        match self.failures.get(&op) {
            Some(failure) if op == Operation::UploadCdpos && failure.status == 412 => {
                Err(ApiError::PreconditionFailed {
                    endpoint: op.endpoint().to_string(),
                    hint: failure.message.clone(),
                })
            }
            Some(failure) => Err(ApiError::bad_status(
                op.endpoint(),
                failure.status,
                failure.message.clone(),
            )),
            None => Ok(()),
        }
    }
}

/// 内存后端
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让某个操作之后的每次调用都返回指定的失败
    pub async fn fail(&self, op: Operation, status: u16, message: impl Into<String>) {
        self.state.lock().await.failures.insert(
            op,
            InjectedFailure {
                status,
                message: message.into(),
            },
        );
    }

    /// 取消注入的失败
    pub async fn recover(&self, op: Operation) {
        self.state.lock().await.failures.remove(&op);
    }

    /// 到目前为止的调用顺序
    pub async fn calls(&self) -> Vec<Operation> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self, op: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }
}

fn not_found(op: Operation, id: &str) -> ApiError {
    ApiError::bad_status(op.endpoint(), 404, format!("Request not found: {id}"))
}

/// 数据行数：去掉空行和表头
fn count_records(file: &LogArtifact) -> u64 {
    let lines = String::from_utf8_lossy(&file.bytes)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count() as u64;
    lines.saturating_sub(1)
}

#[async_trait]
impl RequestRepository for MemoryBackend {
    async fn create_request(&self, payload: &RequestPayload) -> ApiResult<Request> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Create)?;

        state.next_id += 1;
        let request = Request {
            analysis_id: format!("FFA-{:06}", state.next_id),
            payload: payload.clone(),
            created_at: Some(chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()),
            updated_at: None,
        };
        debug!("内存后端创建申请 {}", request.analysis_id);

        state.requests.push(StoredRequest {
            request: request.clone(),
            sm20_uploaded: false,
            transaction_uploaded: false,
            cdhdr_records: None,
            cdpos_records: None,
            analysis: None,
        });
        Ok(request)
    }

    async fn get_request_by_id(&self, id: &str) -> ApiResult<Request> {
        let mut state = self.state.lock().await;
        state.enter(Operation::GetById)?;
        state
            .find_mut(id)
            .map(|r| r.request.clone())
            .ok_or_else(|| not_found(Operation::GetById, id))
    }

    async fn get_all_requests(&self) -> ApiResult<Vec<RequestSummary>> {
        let mut state = self.state.lock().await;
        state.enter(Operation::List)?;
        Ok(state
            .requests
            .iter()
            .map(|r| RequestSummary::from(&r.request))
            .collect())
    }
}

#[async_trait]
impl RequestGateway for MemoryBackend {
    async fn get_request_details(&self, id: &str) -> ApiResult<RequestDetails> {
        let mut state = self.state.lock().await;
        state.enter(Operation::GetDetails)?;
        let stored = state
            .find_mut(id)
            .ok_or_else(|| not_found(Operation::GetDetails, id))?;

        let p = &stored.request.payload;
        Ok(RequestDetails {
            analysis_id: stored.request.analysis_id.clone(),
            itsm_number: p.itsm_number.clone(),
            client: p.client.to_string(),
            system: p.system.to_string(),
            requested_for: p.requested_for.clone(),
            requested_on_behalf_of: p.requested_on_behalf_of.clone(),
            requested_date: p.requested_date.to_string(),
            used_date: p.used_date.to_string(),
            tcodes: p.tcodes.clone(),
            reason: p.reason.clone(),
            activities: p.activities.clone(),
            transaction_usage: Vec::new(),
            audit_logs: Vec::new(),
            change_doc_logs: Vec::new(),
            ai_insights: stored.analysis.as_ref().and_then(AnalysisResult::insights),
        })
    }

    async fn upload_sm20_log(&self, id: &str, file: &LogArtifact) -> ApiResult<String> {
        let mut state = self.state.lock().await;
        state.enter(Operation::UploadSm20)?;
        let stored = state
            .find_mut(id)
            .ok_or_else(|| not_found(Operation::UploadSm20, id))?;
        stored.sm20_uploaded = true;
        Ok(format!("SM20 log uploaded: {} records", count_records(file)))
    }

    async fn upload_transaction_log(&self, id: &str, file: &LogArtifact) -> ApiResult<String> {
        let mut state = self.state.lock().await;
        state.enter(Operation::UploadTransaction)?;
        let stored = state
            .find_mut(id)
            .ok_or_else(|| not_found(Operation::UploadTransaction, id))?;
        stored.transaction_uploaded = true;
        Ok(format!("Transaction log uploaded: {} records", count_records(file)))
    }

    async fn upload_cdhdr(
        &self,
        analysis_id: &str,
        file: &LogArtifact,
    ) -> ApiResult<FileUploadResponse> {
        let mut state = self.state.lock().await;
        state.enter(Operation::UploadCdhdr)?;
        let stored = state
            .find_mut(analysis_id)
            .ok_or_else(|| not_found(Operation::UploadCdhdr, analysis_id))?;

        let records = count_records(file);
        stored.cdhdr_records = Some(records);

        Ok(FileUploadResponse {
            success: true,
            message: "CDHDR uploaded".to_string(),
            records_uploaded: Some(records),
            analysis_id: Some(analysis_id.to_string()),
            next_step: Some("Upload CDPOS".to_string()),
            ..Default::default()
        })
    }

    async fn upload_cdpos(
        &self,
        analysis_id: &str,
        file: &LogArtifact,
    ) -> ApiResult<FileUploadResponse> {
        let mut state = self.state.lock().await;
        state.enter(Operation::UploadCdpos)?;
        let stored = state
            .find_mut(analysis_id)
            .ok_or_else(|| not_found(Operation::UploadCdpos, analysis_id))?;

        if stored.cdhdr_records.is_none() {
            return Err(ApiError::PreconditionFailed {
                endpoint: Operation::UploadCdpos.endpoint().to_string(),
                hint: "Upload CDHDR first".to_string(),
            });
        }

        let records = count_records(file);
        stored.cdpos_records = Some(records);

        Ok(FileUploadResponse {
            success: true,
            message: "CDPOS uploaded".to_string(),
            records_uploaded: Some(records),
            records_matched: Some(records),
            analysis_id: Some(analysis_id.to_string()),
            ..Default::default()
        })
    }

    async fn get_upload_stats(&self, analysis_id: &str) -> ApiResult<UploadStats> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Stats)?;
        let stored = state
            .find_mut(analysis_id)
            .ok_or_else(|| not_found(Operation::Stats, analysis_id))?;

        let cdhdr = stored.cdhdr_records.unwrap_or(0);
        let cdpos = stored.cdpos_records.unwrap_or(0);
        Ok(UploadStats {
            success: true,
            analysis_id: analysis_id.to_string(),
            statistics: UploadStatistics {
                cdhdr_records: cdhdr,
                cdpos_records: cdpos,
                matched_records: cdpos,
                unmatched_records: 0,
            },
            timestamp: chrono::Local::now().timestamp_millis(),
        })
    }

    async fn analyze_request(&self, id: &str) -> ApiResult<AnalysisResult> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Analyze)?;
        let stored = state
            .find_mut(id)
            .ok_or_else(|| not_found(Operation::Analyze, id))?;

        let received = [
            stored.sm20_uploaded,
            stored.transaction_uploaded,
            stored.cdhdr_records.is_some(),
            stored.cdpos_records.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();

        let result = AnalysisResult(json!({
            "analysisId": id,
            "aiInsights": {
                "activityAlignment": 100.0,
                "ownership": "Not assessed",
                "justification": "Not assessed",
                "riskScore": 0.0,
                "redFlags": [],
                "recommendations": [],
                "keyInsights": [format!("{received} log files received")]
            }
        }));
        stored.analysis = Some(result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientName, LogKind, TargetSystem};
    use chrono::NaiveDate;

    fn payload() -> RequestPayload {
        RequestPayload {
            itsm_number: "ITSM1".into(),
            client: ClientName::Implema,
            system: TargetSystem::Ecc,
            requested_for: "FF_01".into(),
            requested_on_behalf_of: "ops".into(),
            requested_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            used_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            tcodes: "SU01".into(),
            reason: "r".into(),
            activities: "a".into(),
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let backend = MemoryBackend::new();
        let (a, b) = tokio_test::block_on(async {
            let a = backend.create_request(&payload()).await.unwrap();
            let b = backend.create_request(&payload()).await.unwrap();
            (a, b)
        });
        assert_eq!(a.analysis_id, "FFA-000001");
        assert_eq!(b.analysis_id, "FFA-000002");
    }

    #[test]
    fn test_cdpos_requires_cdhdr() {
        let backend = MemoryBackend::new();
        let cdpos = LogArtifact::new(LogKind::Cdpos, "cdpos.csv", "H\nrow\n");
        let cdhdr = LogArtifact::new(LogKind::Cdhdr, "cdhdr.csv", "H\nrow1\nrow2\n");

        tokio_test::block_on(async {
            let id = backend.create_request(&payload()).await.unwrap().analysis_id;

            let err = backend.upload_cdpos(&id, &cdpos).await.unwrap_err();
            assert_eq!(err.to_string(), "Upload CDHDR first");

            let header = backend.upload_cdhdr(&id, &cdhdr).await.unwrap();
            assert_eq!(header.records_uploaded, Some(2));

            let items = backend.upload_cdpos(&id, &cdpos).await.unwrap();
            assert_eq!(items.records_matched, Some(1));

            let stats = backend.get_upload_stats(&id).await.unwrap();
            assert_eq!(stats.statistics.cdhdr_records, 2);
            assert_eq!(stats.statistics.cdpos_records, 1);
        });
    }

    #[test]
    fn test_injected_failure_and_recover() {
        let backend = MemoryBackend::new();
        tokio_test::block_on(async {
            backend.fail(Operation::Create, 503, "backend down").await;
            let err = backend.create_request(&payload()).await.unwrap_err();
            assert_eq!(err.status_code(), Some(503));
            assert_eq!(err.to_string(), "backend down");

            backend.recover(Operation::Create).await;
            assert!(backend.create_request(&payload()).await.is_ok());
            assert_eq!(backend.call_count(Operation::Create).await, 2);
        });
    }

    #[test]
    fn test_unknown_id() {
        let backend = MemoryBackend::new();
        let err = tokio_test::block_on(backend.get_request_by_id("FFA-404")).unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}
