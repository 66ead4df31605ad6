//! 用户通知
//!
//! 每个步骤的结果（成功、失败、跳过）对应一条通知，同时写入日志

use std::fmt;

use tracing::{error, info, warn};

use crate::workflow::step::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// 一条面向用户的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// None 表示与具体步骤无关（校验、创建申请）
    pub step: Option<StepId>,
    pub message: String,
}

impl Notice {
    pub fn success(step: Option<StepId>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, step, message)
    }

    pub fn warning(step: Option<StepId>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, step, message)
    }

    pub fn error(step: Option<StepId>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, step, message)
    }

    fn new(level: NoticeLevel, step: Option<StepId>, message: impl Into<String>) -> Self {
        Self {
            level,
            step,
            message: message.into(),
        }
    }

    /// 以对应级别写日志
    pub fn emit(&self, context: &str) {
        match self.level {
            NoticeLevel::Success => info!("{} {}", context, self.message),
            NoticeLevel::Warning => warn!("{} {}", context, self.message),
            NoticeLevel::Error => error!("{} {}", context, self.message),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
