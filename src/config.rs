use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端服务基础地址
    pub api_base_url: String,
    /// 待提交的申请 TOML 文件目录
    pub submission_folder: String,
    /// 每次提交完成后的停顿时间（毫秒）
    pub post_submit_delay_ms: u64,
    /// 单次 HTTP 请求超时（秒），None 表示使用传输层默认值
    pub request_timeout_secs: Option<u64>,
    /// 是否并行上传互不依赖的日志（SM20 / 事务日志 / CDHDR）
    pub parallel_uploads: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            submission_folder: "submissions".to_string(),
            post_submit_delay_ms: 2000,
            request_timeout_secs: None,
            parallel_uploads: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            submission_folder: std::env::var("SUBMISSION_FOLDER")
                .unwrap_or(default.submission_folder),
            post_submit_delay_ms: parse_var("POST_SUBMIT_DELAY_MS", "u64")?
                .unwrap_or(default.post_submit_delay_ms),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "u64")?
                .or(default.request_timeout_secs),
            parallel_uploads: parse_var("PARALLEL_UPLOADS", "bool")?
                .unwrap_or(default.parallel_uploads),
            verbose_logging: parse_var("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        })
    }

    pub fn post_submit_delay(&self) -> Duration {
        Duration::from_millis(self.post_submit_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// 读取并解析环境变量；未设置时返回 None，设置了但无法解析时报错
fn parse_var<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
