//! 网关抽象
//!
//! 编排层只依赖这里的 trait，HTTP 客户端和内存后端都是它的实现

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{
    AnalysisResult, FileUploadResponse, LogArtifact, Request, RequestDetails, RequestPayload,
    RequestSummary, UploadStats,
};

/// 申请单存储：创建、按 ID 读取、列表
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// 创建申请，返回带分析 ID 的申请单
    async fn create_request(&self, payload: &RequestPayload) -> ApiResult<Request>;

    async fn get_request_by_id(&self, id: &str) -> ApiResult<Request>;

    /// 按服务端顺序返回，不做重排
    async fn get_all_requests(&self) -> ApiResult<Vec<RequestSummary>>;
}

/// 完整的请求网关：在存储之上增加日志上传和分析
#[async_trait]
pub trait RequestGateway: RequestRepository {
    async fn get_request_details(&self, id: &str) -> ApiResult<RequestDetails>;

    /// 成功时返回原始响应文本
    async fn upload_sm20_log(&self, id: &str, file: &LogArtifact) -> ApiResult<String>;

    /// 成功时返回原始响应文本
    async fn upload_transaction_log(&self, id: &str, file: &LogArtifact) -> ApiResult<String>;

    async fn upload_cdhdr(&self, analysis_id: &str, file: &LogArtifact)
        -> ApiResult<FileUploadResponse>;

    /// CDHDR 尚未上传时返回 `ApiError::PreconditionFailed`
    async fn upload_cdpos(&self, analysis_id: &str, file: &LogArtifact)
        -> ApiResult<FileUploadResponse>;

    async fn get_upload_stats(&self, analysis_id: &str) -> ApiResult<UploadStats>;

    async fn analyze_request(&self, id: &str) -> ApiResult<AnalysisResult>;
}

/// 详情数据来源
///
/// 详情视图只认这个接口，不关心数据来自哪里
#[async_trait]
pub trait DetailsSource: Send + Sync {
    async fn fetch_details(&self, id: &str) -> ApiResult<RequestDetails>;
}

#[async_trait]
impl<G: RequestGateway + ?Sized> DetailsSource for G {
    async fn fetch_details(&self, id: &str) -> ApiResult<RequestDetails> {
        self.get_request_details(id).await
    }
}
