use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;

use crate::error::{AppError, AppResult, FileError};
use crate::models::form::{RequestForm, Submission};
use crate::models::upload::{Attachments, LogArtifact, LogKind};

/// 申请 TOML 文件的结构
///
/// ```toml
/// itsm_number = "ITSM0123456"
/// client = "Tarento"
/// # ...其余表单字段
///
/// [logs]
/// sm20 = "logs/sm20.csv"
/// cdhdr = "logs/cdhdr.csv"
/// ```
#[derive(Debug, Deserialize)]
struct SubmissionFile {
    #[serde(flatten)]
    form: RequestForm,
    #[serde(default)]
    logs: LogPaths,
}

#[derive(Debug, Default, Deserialize)]
struct LogPaths {
    sm20: Option<PathBuf>,
    transaction: Option<PathBuf>,
    cdhdr: Option<PathBuf>,
    cdpos: Option<PathBuf>,
}

impl LogPaths {
    fn entries(self) -> [(LogKind, Option<PathBuf>); 4] {
        [
            (LogKind::Sm20, self.sm20),
            (LogKind::Transaction, self.transaction),
            (LogKind::Cdhdr, self.cdhdr),
            (LogKind::Cdpos, self.cdpos),
        ]
    }
}

/// 从 TOML 文件加载一份待提交的申请，并读入所有附带的日志文件
///
/// 相对路径以 TOML 文件所在目录为基准
pub async fn load_toml_to_submission(toml_file_path: &Path) -> AppResult<Submission> {
    let display = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    let parsed: SubmissionFile = toml::from_str(&content).map_err(|source| {
        FileError::TomlParseFailed {
            path: display.clone(),
            source,
        }
    })?;

    let base_dir = toml_file_path.parent().unwrap_or_else(|| Path::new("."));
    let mut attachments = Attachments::new();
    for (kind, path) in parsed.logs.entries() {
        if let Some(path) = path {
            attachments.attach(load_artifact(kind, &base_dir.join(path)).await?);
        }
    }

    let name = toml_file_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(Submission {
        name,
        form: parsed.form,
        attachments,
        file_path: Some(toml_file_path.to_path_buf()),
    })
}

/// 读入单个日志文件
pub async fn load_artifact(kind: LogKind, path: &Path) -> AppResult<LogArtifact> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    tracing::debug!("已读取 {} 文件 {} ({} 字节)", kind, file_name, bytes.len());

    Ok(LogArtifact::new(kind, file_name, bytes))
}

/// 从文件夹中加载所有申请 TOML 文件，按文件名排序
///
/// 单个文件加载失败只记录警告，不影响其他文件
pub async fn load_all_submissions(folder_path: &str) -> AppResult<Vec<Submission>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut submissions = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_to_submission(&path).await {
            Ok(submission) => {
                tracing::info!("成功加载，附带 {} 个日志文件", submission.attachments.count());
                submissions.push(submission);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(submissions)
}
