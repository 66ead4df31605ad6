//! 提交上下文
//!
//! 封装"我正在处理第几份申请"这一信息，只用于日志

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 申请名称（TOML 文件名）
    pub name: String,

    /// 批次中的序号（从1开始）
    pub index: usize,
}

impl SubmissionCtx {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[申请 #{} {}]", self.index, self.name)
    }
}
