//! 提交流程 - 流程层
//!
//! 核心职责：定义"一份申请"的完整提交流程
//!
//! 流程顺序：
//! 1. 校验表单 → 创建申请（失败则整体终止）
//! 2. 按 `SUBMISSION_PLAN` 依次执行 SM20 / 事务日志 / CDHDR / CDPOS 上传
//! 3. 所有上传都没有失败时触发分析
//!
//! 单个步骤失败只记录状态和通知，不影响与它无关的后续步骤。

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::clients::RequestGateway;
use crate::config::Config;
use crate::error::{ApiResult, WorkflowError};
use crate::models::{AnalysisResult, Attachments, LogArtifact, LogKind, Submission};
use crate::workflow::notice::{Notice, NoticeLevel};
use crate::workflow::step::{Decision, OnUnmet, StepBoard, StepId, StepSpec, SUBMISSION_PLAN};
use crate::workflow::submission_ctx::SubmissionCtx;

/// 一次提交的结果
#[derive(Debug, Clone, Default)]
pub struct SubmissionReport {
    /// 创建成功后才有
    pub analysis_id: Option<String>,
    pub board: StepBoard,
    /// 按发生顺序排列
    pub notices: Vec<Notice>,
    pub analysis: Option<AnalysisResult>,
}

impl SubmissionReport {
    pub fn created(&self) -> bool {
        self.analysis_id.is_some()
    }

    /// 创建成功且分析已完成
    pub fn analysed(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }

    pub fn notices_for(&self, step: StepId) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.step == Some(step))
    }
}

/// 步骤要做的事
#[derive(Debug, Clone, Copy)]
enum StepAction<'a> {
    Upload(&'a LogArtifact),
    Analyze,
}

/// 步骤成功的产出
struct StepSuccess {
    message: String,
    analysis: Option<AnalysisResult>,
}

/// 申请提交流程
///
/// - 持有网关，按固定计划编排调用
/// - 独占步骤状态，通过 watch 通道对外发布
/// - 每个步骤结果对应一条通知
pub struct SubmissionFlow<G: RequestGateway> {
    gateway: Arc<G>,
    parallel_uploads: bool,
    status_tx: watch::Sender<StepBoard>,
}

impl<G: RequestGateway> SubmissionFlow<G> {
    pub fn new(gateway: Arc<G>, config: &Config) -> Self {
        let (status_tx, _) = watch::channel(StepBoard::default());
        Self {
            gateway,
            parallel_uploads: config.parallel_uploads,
            status_tx,
        }
    }

    /// 同一阶段内互不依赖的上传是否并行执行
    pub fn with_parallel_uploads(mut self, parallel: bool) -> Self {
        self.parallel_uploads = parallel;
        self
    }

    /// 订阅步骤状态变化
    pub fn subscribe(&self) -> watch::Receiver<StepBoard> {
        self.status_tx.subscribe()
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub async fn run(
        &self,
        submission: &Submission,
        ctx: &SubmissionCtx,
    ) -> Result<SubmissionReport, WorkflowError> {
        let mut report = SubmissionReport::default();
        self.status_tx.send_replace(report.board);

        // ========== 校验表单 ==========
        let payload = match submission.form.clone().into_payload() {
            Ok(payload) => payload,
            Err(e) => {
                debug!("{} 表单校验失败: {:?}", ctx, e);
                push(&mut report, ctx, Notice::error(None, e.to_string()));
                return Ok(report);
            }
        };

        // ========== 创建申请 ==========
        info!("{} 📝 创建申请...", ctx);
        let analysis_id = match self.gateway.create_request(&payload).await {
            Ok(request) if !request.analysis_id.trim().is_empty() => request.analysis_id,
            Ok(_) => {
                let msg = "Failed to create request: server returned no analysis ID";
                push(&mut report, ctx, Notice::error(None, msg));
                return Ok(report);
            }
            Err(e) => {
                push(&mut report, ctx, Notice::error(None, e.to_string()));
                return Ok(report);
            }
        };
        push(
            &mut report,
            ctx,
            Notice::success(None, format!("Request created: {analysis_id}")),
        );
        report.analysis_id = Some(analysis_id.clone());

        // ========== 按计划执行各步骤 ==========
        for stage in stages(SUBMISSION_PLAN) {
            if self.parallel_uploads {
                self.run_batch(stage, &analysis_id, &submission.attachments, &mut report, ctx)
                    .await?;
            } else {
                for spec in stage {
                    self.run_batch(
                        std::slice::from_ref(spec),
                        &analysis_id,
                        &submission.attachments,
                        &mut report,
                        ctx,
                    )
                    .await?;
                }
            }
        }

        Ok(report)
    }

    /// 执行一批互不依赖的步骤
    ///
    /// 先统一检查前置条件并标记 Uploading，再执行，最后按计划顺序记录结果
    async fn run_batch(
        &self,
        specs: &[StepSpec],
        analysis_id: &str,
        attachments: &Attachments,
        report: &mut SubmissionReport,
        ctx: &SubmissionCtx,
    ) -> Result<(), WorkflowError> {
        let mut runnable = Vec::new();

        for spec in specs {
            match (spec.evaluate(&report.board, attachments), action(spec.id, attachments)) {
                (Decision::Run, Some(action)) => {
                    report.board.begin(spec.id)?;
                    runnable.push((spec.id, action));
                }
                (Decision::Skip(OnUnmet::Warn(message)), _) => {
                    push(report, ctx, Notice::warning(Some(spec.id), message));
                }
                (Decision::Skip(OnUnmet::Silent), _) | (Decision::Run, None) => {
                    debug!("{} {} 未附带文件，跳过", ctx, spec.id.label());
                }
            }
        }

        if runnable.is_empty() {
            return Ok(());
        }
        self.status_tx.send_replace(report.board);

        let results = join_all(
            runnable
                .iter()
                .map(|(step, action)| self.execute(*step, *action, analysis_id, ctx)),
        )
        .await;

        for ((step, _), result) in runnable.into_iter().zip(results) {
            match result {
                Ok(success) => {
                    report.board.finish(step, true)?;
                    if success.analysis.is_some() {
                        report.analysis = success.analysis;
                    }
                    push(report, ctx, Notice::success(Some(step), success.message));
                }
                Err(e) => {
                    report.board.finish(step, false)?;
                    let message = format!("✗ {} failed: {}", step.label(), e);
                    push(report, ctx, Notice::error(Some(step), message));
                }
            }
        }
        self.status_tx.send_replace(report.board);

        Ok(())
    }

    /// 执行单个步骤：一次网关调用
    async fn execute(
        &self,
        step: StepId,
        action: StepAction<'_>,
        analysis_id: &str,
        ctx: &SubmissionCtx,
    ) -> ApiResult<StepSuccess> {
        match action {
            StepAction::Upload(file) => {
                info!("{} 📤 上传 {} ({})", ctx, step.label(), file.file_name);
                let message = match file.kind {
                    LogKind::Sm20 => {
                        self.gateway.upload_sm20_log(analysis_id, file).await?;
                        "✓ SM20 log uploaded".to_string()
                    }
                    LogKind::Transaction => {
                        self.gateway.upload_transaction_log(analysis_id, file).await?;
                        "✓ Transaction log uploaded".to_string()
                    }
                    LogKind::Cdhdr => {
                        let resp = self.gateway.upload_cdhdr(analysis_id, file).await?;
                        format!(
                            "✓ CDHDR uploaded: {} records",
                            resp.records_uploaded.unwrap_or(0)
                        )
                    }
                    LogKind::Cdpos => {
                        let resp = self.gateway.upload_cdpos(analysis_id, file).await?;
                        format!(
                            "✓ CDPOS uploaded: {} records",
                            resp.records_matched.unwrap_or(0)
                        )
                    }
                };
                Ok(StepSuccess {
                    message,
                    analysis: None,
                })
            }
            StepAction::Analyze => {
                info!("{} 🔍 Starting analysis...", ctx);
                let result = self.gateway.analyze_request(analysis_id).await?;
                Ok(StepSuccess {
                    message: "✓ Analysis completed!".to_string(),
                    analysis: Some(result),
                })
            }
        }
    }
}

// ========== 辅助函数 ==========

fn push(report: &mut SubmissionReport, ctx: &SubmissionCtx, notice: Notice) {
    notice.emit(&ctx.to_string());
    report.notices.push(notice);
}

/// 步骤对应的动作；上传步骤缺少文件时返回 None
fn action(step: StepId, attachments: &Attachments) -> Option<StepAction<'_>> {
    match step.log_kind() {
        Some(kind) => attachments.get(kind).map(StepAction::Upload),
        None => Some(StepAction::Analyze),
    }
}

/// 按 stage 把连续的步骤分组
fn stages(plan: &[StepSpec]) -> Vec<&[StepSpec]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=plan.len() {
        if i == plan.len() || plan[i].stage != plan[start].stage {
            groups.push(&plan[start..i]);
            start = i;
        }
    }
    groups
}
