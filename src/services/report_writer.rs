//! 提交记录写入服务
//!
//! 只负责把每份申请的处理结果追加到输出日志文件

use std::fs::{self, OpenOptions};
use std::io::Write;

use tracing::debug;

use crate::error::{AppResult, FileError};
use crate::workflow::{StepStatus, SubmissionCtx, SubmissionReport};

/// 提交记录写入服务
pub struct ReportWriter {
    log_file_path: String,
}

impl ReportWriter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.log_file_path
    }

    /// 覆盖写入带时间戳的文件头
    pub fn init(&self) -> AppResult<()> {
        let header = format!(
            "{}\n申请提交日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.log_file_path, header).map_err(|source| FileError::WriteFailed {
            path: self.log_file_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// 追加一行处理结果
    pub fn write(&self, ctx: &SubmissionCtx, report: &SubmissionReport) -> AppResult<()> {
        let line = format_line(ctx, report);
        debug!("写入提交记录: {}", line);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|source| FileError::WriteFailed {
                path: self.log_file_path.clone(),
                source,
            })?;

        writeln!(file, "{line}").map_err(|source| FileError::WriteFailed {
            path: self.log_file_path.clone(),
            source,
        })?;

        Ok(())
    }
}

fn status_mark(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "-",
        StepStatus::Uploading => "…",
        StepStatus::Success => "ok",
        StepStatus::Error => "ERR",
    }
}

fn format_line(ctx: &SubmissionCtx, report: &SubmissionReport) -> String {
    let steps = report
        .board
        .iter()
        .map(|(step, status)| format!("{}={}", step.label(), status_mark(status)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!(
        "{} | 申请 {} | 分析ID {} | {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        ctx.name,
        report.analysis_id.as_deref().unwrap_or("-"),
        steps
    );

    if let Some(first_error) = report
        .notices
        .iter()
        .find(|n| n.level == crate::workflow::NoticeLevel::Error)
    {
        line.push_str(" | ");
        line.push_str(&first_error.message);
    }

    line
}
