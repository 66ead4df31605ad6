//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：读取配置、创建 HTTP 客户端
//! 2. **批量提交**：扫描申请目录，逐份提交，每份之间按配置等待
//! 3. **查询命令**：列表、详情、上传统计，返回可直接打印的文本
//! 4. **全局统计**：汇总所有申请的处理结果
//!
//! `App` 对网关泛型，测试时可以直接换成 `MemoryBackend`。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::{DetailsSource, FirefighterClient, RequestGateway};
use crate::config::Config;
use crate::models::{load_all_submissions, load_toml_to_submission, Submission};
use crate::orchestrator::submission_processor::{is_successful, process_submission};
use crate::services::ReportWriter;
use crate::utils::logging::{
    log_startup, log_submission_start, log_submissions_loaded, print_final_stats,
};
use crate::views::{render_request_details, render_request_table, render_upload_stats};
use crate::workflow::{SubmissionFlow, SubmissionReport};

/// 批量提交统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

/// 应用主结构
pub struct App<G: RequestGateway = FirefighterClient> {
    config: Config,
    gateway: Arc<G>,
    writer: ReportWriter,
}

impl App<FirefighterClient> {
    /// 初始化应用：按配置创建 HTTP 客户端
    pub fn initialize(config: Config) -> Result<Self> {
        let client = FirefighterClient::new(&config).context("创建 HTTP 客户端失败")?;
        Ok(Self::with_gateway(config, Arc::new(client)))
    }
}

impl<G: RequestGateway> App<G> {
    pub fn with_gateway(config: Config, gateway: Arc<G>) -> Self {
        let writer = ReportWriter::new(config.output_log_file.clone());
        Self {
            config,
            gateway,
            writer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========== 提交 ==========

    /// 提交申请目录下的所有 TOML 文件
    pub async fn run_folder(&self) -> Result<BatchStats> {
        log_startup(&self.config.api_base_url, self.config.parallel_uploads);

        info!("\n📁 正在扫描待提交的申请: {}", self.config.submission_folder);
        let submissions = load_all_submissions(&self.config.submission_folder)
            .await
            .with_context(|| format!("加载申请目录失败: {}", self.config.submission_folder))?;

        if submissions.is_empty() {
            warn!("⚠️ 没有找到待提交的TOML文件，程序结束");
            return Ok(BatchStats::default());
        }

        self.writer.init().context("初始化输出日志失败")?;
        log_submissions_loaded(submissions.len(), self.config.post_submit_delay_ms);

        let stats = self.submit_all(&submissions).await;
        print_final_stats(stats.success, stats.failed, stats.total, self.writer.path());
        Ok(stats)
    }

    /// 提交单个 TOML 文件
    pub async fn submit_file(&self, path: &Path) -> Result<SubmissionReport> {
        log_startup(&self.config.api_base_url, self.config.parallel_uploads);

        let submission = load_toml_to_submission(path)
            .await
            .with_context(|| format!("加载申请文件失败: {}", path.display()))?;

        self.writer.init().context("初始化输出日志失败")?;
        log_submission_start(1, 1, &submission.name, submission.attachments.count());

        let flow = self.flow();
        process_submission(&flow, &self.writer, &submission, 1).await
    }

    /// 逐份提交，单份失败不影响后续
    async fn submit_all(&self, submissions: &[Submission]) -> BatchStats {
        let flow = self.flow();
        let total = submissions.len();
        let mut stats = BatchStats {
            total,
            ..Default::default()
        };

        for (idx, submission) in submissions.iter().enumerate() {
            let index = idx + 1;
            log_submission_start(index, total, &submission.name, submission.attachments.count());

            match process_submission(&flow, &self.writer, submission, index).await {
                Ok(report) if is_successful(&report) => stats.success += 1,
                Ok(_) => stats.failed += 1,
                Err(e) => {
                    error!("[申请 #{}] ❌ 处理过程中发生错误: {:#}", index, e);
                    stats.failed += 1;
                }
            }

            if index < total && self.config.post_submit_delay_ms > 0 {
                tokio::time::sleep(self.config.post_submit_delay()).await;
            }
        }

        stats
    }

    fn flow(&self) -> SubmissionFlow<G> {
        SubmissionFlow::new(Arc::clone(&self.gateway), &self.config)
    }

    // ========== 查询 ==========

    /// 渲染申请列表
    pub async fn list(&self) -> Result<String> {
        let requests = self
            .gateway
            .get_all_requests()
            .await
            .context("获取申请列表失败")?;
        info!("📋 共 {} 条申请", requests.len());
        Ok(render_request_table(&requests))
    }

    /// 渲染单条申请详情
    pub async fn show(&self, id: &str) -> Result<String> {
        let details = self
            .gateway
            .fetch_details(id)
            .await
            .with_context(|| format!("获取申请详情失败: {id}"))?;
        Ok(render_request_details(&details))
    }

    /// 渲染 CDHDR / CDPOS 上传统计
    pub async fn stats(&self, analysis_id: &str) -> Result<String> {
        let stats = self
            .gateway
            .get_upload_stats(analysis_id)
            .await
            .with_context(|| format!("获取上传统计失败: {analysis_id}"))?;
        Ok(render_upload_stats(&stats))
    }
}
