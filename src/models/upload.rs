//! 日志文件与上传结果模型

use std::fmt;

use serde::{Deserialize, Serialize};

/// 可上传的日志类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// SM20 安全审计日志
    Sm20,
    /// 事务使用日志
    Transaction,
    /// CDHDR 变更文档头
    Cdhdr,
    /// CDPOS 变更文档行项目，依赖 CDHDR
    Cdpos,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [LogKind::Sm20, LogKind::Transaction, LogKind::Cdhdr, LogKind::Cdpos];

    /// 面向用户的名称
    pub fn label(self) -> &'static str {
        match self {
            LogKind::Sm20 => "SM20 log",
            LogKind::Transaction => "Transaction log",
            LogKind::Cdhdr => "CDHDR",
            LogKind::Cdpos => "CDPOS",
        }
    }

    fn index(self) -> usize {
        match self {
            LogKind::Sm20 => 0,
            LogKind::Transaction => 1,
            LogKind::Cdhdr => 2,
            LogKind::Cdpos => 3,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 已读入内存的日志文件
#[derive(Clone, PartialEq, Eq)]
pub struct LogArtifact {
    pub kind: LogKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl LogArtifact {
    pub fn new(kind: LogKind, file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for LogArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogArtifact")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// 一次提交附带的日志文件，每种最多一个
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    slots: [Option<LogArtifact>; 4],
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// 附加文件，同类型的旧文件会被替换
    pub fn attach(&mut self, artifact: LogArtifact) {
        let idx = artifact.kind.index();
        self.slots[idx] = Some(artifact);
    }

    pub fn with(mut self, artifact: LogArtifact) -> Self {
        self.attach(artifact);
        self
    }

    pub fn get(&self, kind: LogKind) -> Option<&LogArtifact> {
        self.slots[kind.index()].as_ref()
    }

    pub fn has(&self, kind: LogKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// CDHDR / CDPOS 上传返回
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_uploaded: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_matched: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// CDHDR / CDPOS 上传统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub success: bool,
    pub analysis_id: String,
    pub statistics: UploadStatistics,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatistics {
    pub cdhdr_records: u64,
    pub cdpos_records: u64,
    pub matched_records: u64,
    pub unmatched_records: u64,
}
