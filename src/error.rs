use thiserror::Error;

use crate::workflow::StepId;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error(transparent)]
    Api(#[from] ApiError),
    /// 表单校验错误
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 流程状态错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
///
/// `Display` 输出即为展示给用户的提示文本，所以状态类错误只打印 message
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败（请求未到达服务器或没有响应）
    #[error("Network error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务器返回非 2xx 状态
    #[error("{message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// CDPOS 上传返回 412，携带补救提示
    #[error("{hint}")]
    PreconditionFailed { endpoint: String, hint: String },
    /// 成功响应但响应体无法解析
    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// 出错的接口地址
    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Transport { endpoint, .. }
            | ApiError::Status { endpoint, .. }
            | ApiError::PreconditionFailed { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    /// HTTP 状态码（网络错误和解析错误没有状态码）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::PreconditionFailed { .. } => Some(412),
            _ => None,
        }
    }
}

/// 表单校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必填字段缺失
    #[error("Please fill in all required fields")]
    MissingFields { fields: Vec<&'static str> },
    /// 事务码格式不正确
    #[error("Invalid transaction code: {code}")]
    InvalidTcode { code: String },
    /// 日期格式不正确（需要 yyyy-MM-dd）
    #[error("Invalid {field}: {value} (expected yyyy-MM-dd)")]
    InvalidDate { field: &'static str, value: String },
    /// 枚举字段取值不在允许范围内
    #[error("Unsupported {field}: {value}")]
    UnsupportedValue { field: &'static str, value: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 流程状态错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// 步骤状态只能前进，不能回退或重复
    #[error("步骤 {step:?} 不能从 {from:?} 变为 {to:?}")]
    InvalidTransition {
        step: StepId,
        from: crate::workflow::StepStatus,
        to: crate::workflow::StepStatus,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP客户端初始化失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }
}

impl ApiError {
    /// 创建网络请求失败错误
    pub fn transport(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::Transport {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建响应解析失败错误
    pub fn decode(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::Decode {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建非 2xx 状态错误
    pub fn bad_status(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 网关调用结果类型
pub type ApiResult<T> = Result<T, ApiError>;
