//! 单份申请处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **流程调度**：把一份申请交给 `SubmissionFlow`
//! 2. **结果落盘**：通过 `ReportWriter` 追加一行处理记录
//! 3. **统计输出**：记录各步骤状态和分析结论

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clients::RequestGateway;
use crate::models::Submission;
use crate::services::ReportWriter;
use crate::utils::logging::truncate_text;
use crate::workflow::{StepStatus, SubmissionCtx, SubmissionFlow, SubmissionReport};

/// 处理单份申请
///
/// # 参数
/// - `flow`: 复用的提交流程
/// - `writer`: 输出日志写入服务
/// - `submission`: 申请数据
/// - `index`: 申请编号（用于日志）
///
/// # 返回
/// 返回流程报告；只有流程内部状态机出错或写日志失败时才返回 Err
pub async fn process_submission<G: RequestGateway>(
    flow: &SubmissionFlow<G>,
    writer: &ReportWriter,
    submission: &Submission,
    index: usize,
) -> Result<SubmissionReport> {
    let ctx = SubmissionCtx::new(submission.name.clone(), index);

    if let Some(reason) = submission.form.reason.as_deref() {
        info!("{} 申请原因: {}", ctx, truncate_text(reason, 40));
    }

    let report = flow
        .run(submission, &ctx)
        .await
        .with_context(|| format!("{} 提交流程异常", ctx))?;

    writer
        .write(&ctx, &report)
        .with_context(|| format!("{} 写入输出日志失败", ctx))?;

    log_submission_summary(&ctx, &report);
    Ok(report)
}

/// 创建成功且没有任何错误通知才算成功
pub fn is_successful(report: &SubmissionReport) -> bool {
    report.created() && !report.has_errors()
}

// ========== 日志辅助函数 ==========

fn log_submission_summary(ctx: &SubmissionCtx, report: &SubmissionReport) {
    let Some(analysis_id) = report.analysis_id.as_deref() else {
        warn!("{} ❌ 申请未创建", ctx);
        return;
    };

    let finished = report
        .board
        .iter()
        .filter(|(_, status)| status.is_finished())
        .count();
    let failed = report
        .board
        .iter()
        .filter(|(_, status)| *status == StepStatus::Error)
        .count();
    info!(
        "{} 📊 分析ID {} | 完成步骤 {} | 失败 {}",
        ctx, analysis_id, finished, failed
    );

    if let Some(insights) = report.analysis.as_ref().and_then(|a| a.insights()) {
        info!(
            "{} 🔍 风险评分 {} ({})",
            ctx,
            insights.risk_score,
            insights.risk_level().label()
        );
    }
}
