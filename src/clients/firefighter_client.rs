/// 后端 HTTP 客户端
///
/// 每个操作对应一次 HTTP 请求，不缓存、不重试；失败时尽量提取最具体的错误信息
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::clients::gateway::{RequestGateway, RequestRepository};
use crate::config::Config;
use crate::error::{ApiError, ApiResult, ConfigError};
use crate::models::{
    AnalysisResult, FileUploadResponse, LogArtifact, Request, RequestDetails, RequestPayload,
    RequestSummary, UploadStats,
};

const CDPOS_PRECONDITION_DEFAULT: &str = "Please upload CDHDR file first before uploading CDPOS";

/// 后端 HTTP 客户端
#[derive(Debug, Clone)]
pub struct FirefighterClient {
    http: reqwest::Client,
    base_url: String,
}

impl FirefighterClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 使用指定地址和默认传输设置创建客户端
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Config {
            api_base_url: base_url.into(),
            ..Config::default()
        };
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 发送请求并读出状态码和响应文本
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> ApiResult<(StatusCode, String)> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(endpoint, e))?;

        debug!("{} -> {} ({} 字节)", endpoint, status.as_u16(), body.len());

        Ok((status, body))
    }
}

#[async_trait]
impl RequestRepository for FirefighterClient {
    async fn create_request(&self, payload: &RequestPayload) -> ApiResult<Request> {
        let endpoint = self.url("/api/firefighter/request");
        info!("📝 创建申请: {}", payload.itsm_number);

        let (status, body) = self.send(&endpoint, self.http.post(&endpoint).json(payload)).await?;

        if !status.is_success() {
            let mut message = format!("Failed to create request: {}", status_text(status));
            if let Some(text) = non_empty(&body) {
                message.push_str(" - ");
                message.push_str(text);
            }
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        let request: Request = decode(&endpoint, &body)?;
        info!("✓ 申请已创建，分析 ID: {}", request.analysis_id);
        Ok(request)
    }

    async fn get_request_by_id(&self, id: &str) -> ApiResult<Request> {
        let endpoint = self.url(&format!("/api/firefighter/request/{id}"));
        let (status, body) = self.send(&endpoint, self.http.get(&endpoint)).await?;

        if !status.is_success() {
            let message = format!("Failed to fetch request: {}", status_text(status));
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }

    async fn get_all_requests(&self) -> ApiResult<Vec<RequestSummary>> {
        let endpoint = self.url("/api/firefighter/requests");
        let (status, body) = self.send(&endpoint, self.http.get(&endpoint)).await?;

        if !status.is_success() {
            let message = format!("Failed to fetch requests: {}", status_text(status));
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }
}

#[async_trait]
impl RequestGateway for FirefighterClient {
    async fn get_request_details(&self, id: &str) -> ApiResult<RequestDetails> {
        let endpoint = self.url(&format!("/api/firefighter/request/{id}/details"));
        let (status, body) = self.send(&endpoint, self.http.get(&endpoint)).await?;

        if !status.is_success() {
            let message = format!("Failed to fetch request details: {}", status_text(status));
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }

    async fn upload_sm20_log(&self, id: &str, file: &LogArtifact) -> ApiResult<String> {
        let endpoint = self.url(&format!("/api/firefighter/sm20-log/{id}"));
        self.upload_text_log(endpoint, file, "Failed to upload SM20 log").await
    }

    async fn upload_transaction_log(&self, id: &str, file: &LogArtifact) -> ApiResult<String> {
        let endpoint = self.url(&format!("/api/firefighter/transaction-log/{id}"));
        self.upload_text_log(endpoint, file, "Failed to upload transaction log")
            .await
    }

    async fn upload_cdhdr(
        &self,
        analysis_id: &str,
        file: &LogArtifact,
    ) -> ApiResult<FileUploadResponse> {
        let endpoint = self.url("/api/cdhdr-cdpos/upload-cdhdr");
        log_upload(file, analysis_id);

        let form = file_form(file).text("analysisId", analysis_id.to_string());
        let (status, body) = self
            .send(&endpoint, self.http.post(&endpoint).multipart(form))
            .await?;

        if !status.is_success() {
            let message = json_error_field(&body, &["error"])
                .unwrap_or_else(|| "Failed to upload CDHDR file".to_string());
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }

    async fn upload_cdpos(
        &self,
        analysis_id: &str,
        file: &LogArtifact,
    ) -> ApiResult<FileUploadResponse> {
        let endpoint = self.url("/api/cdhdr-cdpos/upload-cdpos");
        log_upload(file, analysis_id);

        let form = file_form(file).text("analysisId", analysis_id.to_string());
        let (status, body) = self
            .send(&endpoint, self.http.post(&endpoint).multipart(form))
            .await?;

        if status == StatusCode::PRECONDITION_FAILED {
            let hint = json_error_field(&body, &["hint"])
                .unwrap_or_else(|| CDPOS_PRECONDITION_DEFAULT.to_string());
            return Err(ApiError::PreconditionFailed { endpoint, hint });
        }

        if !status.is_success() {
            let message = json_error_field(&body, &["error"])
                .unwrap_or_else(|| "Failed to upload CDPOS file".to_string());
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }

    async fn get_upload_stats(&self, analysis_id: &str) -> ApiResult<UploadStats> {
        let endpoint = self.url("/api/cdhdr-cdpos/stats");
        let request = self
            .http
            .get(&endpoint)
            .query(&[("analysisId", analysis_id)]);
        let (status, body) = self.send(&endpoint, request).await?;

        if !status.is_success() {
            let message = json_error_field(&body, &["error"])
                .unwrap_or_else(|| "Failed to fetch upload statistics".to_string());
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }

    async fn analyze_request(&self, id: &str) -> ApiResult<AnalysisResult> {
        let endpoint = self.url(&format!("/api/analysis/analyze/{id}"));
        info!("🔍 触发分析: {}", id);

        let (status, body) = self.send(&endpoint, self.http.post(&endpoint)).await?;

        if !status.is_success() {
            let message = json_error_field(&body, &["message", "error"])
                .unwrap_or_else(|| "Failed to analyze request".to_string());
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        decode(&endpoint, &body)
    }
}

impl FirefighterClient {
    /// SM20 与事务日志共用：multipart 上传，返回原始文本
    async fn upload_text_log(
        &self,
        endpoint: String,
        file: &LogArtifact,
        default_error: &str,
    ) -> ApiResult<String> {
        log_upload(file, &endpoint);

        let (status, body) = self
            .send(&endpoint, self.http.post(&endpoint).multipart(file_form(file)))
            .await?;

        if !status.is_success() {
            let message = non_empty(&body).unwrap_or(default_error).to_string();
            return Err(ApiError::bad_status(endpoint, status.as_u16(), message));
        }

        Ok(body)
    }
}

// ========== 辅助函数 ==========

fn file_form(file: &LogArtifact) -> Form {
    let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
    Form::new().part("file", part)
}

fn log_upload(file: &LogArtifact, target: &str) {
    info!(
        "📤 上传 {}: {} ({} 字节) -> {}",
        file.kind,
        file.file_name,
        file.len(),
        target
    );
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::decode(endpoint, e))
}

/// 状态描述，例如 "Not Found"
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

fn non_empty(body: &str) -> Option<&str> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// 按顺序取 JSON 响应体中第一个非空字符串字段
///
/// 响应体不是 JSON 时返回 None，由调用方使用默认文案
pub(crate) fn json_error_field(body: &str, fields: &[&str]) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    fields.iter().find_map(|field| {
        value
            .get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}
