/// 日志工具模块
///
/// 提供日志初始化和批量提交过程中的横幅输出
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；未设置时默认 `info`，verbose 时为 `debug`。
/// 重复调用时静默忽略（测试中常见）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `api_base_url`: 后端地址
/// - `parallel_uploads`: 是否并行上传
pub fn log_startup(api_base_url: &str, parallel_uploads: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 特权账号申请提交");
    info!("🌐 后端地址: {}", api_base_url);
    info!(
        "📤 上传模式: {}",
        if parallel_uploads { "同阶段并行" } else { "顺序" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录申请文件加载信息
pub fn log_submissions_loaded(total: usize, delay_ms: u64) {
    info!("✓ 找到 {} 个待提交的申请", total);
    info!("💡 每份申请提交后等待 {} ms 再处理下一份\n", delay_ms);
}

/// 记录单份申请开始
///
/// # 参数
/// - `index`: 申请编号（从 1 开始）
/// - `total`: 申请总数
/// - `name`: 申请名称
/// - `attachments`: 附带的日志文件数量
pub fn log_submission_start(index: usize, total: usize, name: &str, attachments: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📄 申请 {}/{}: {}", index, total, name);
    info!("📎 附带日志文件: {} 个", attachments);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部提交完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
