//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量提交和命令调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载申请（Vec<Submission>）
//! - 控制每份申请之间的等待
//! - 提供列表 / 详情 / 统计查询
//! - 输出全局统计信息
//!
//! ### `submission_processor` - 单份申请处理器
//! - 调用 SubmissionFlow
//! - 写入输出日志
//! - 输出单份申请的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Vec<Submission>)
//!     ↓
//! submission_processor (处理单个 Submission)
//!     ↓
//! workflow::SubmissionFlow (创建 → 上传 → 分析)
//!     ↓
//! clients (RequestGateway：HTTP / 内存)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管批量，submission_processor 管单个
//! 2. **向下依赖**：编排层 → workflow → clients
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod submission_processor;

// 重新导出主要类型
pub use app::{App, BatchStats};
pub use submission_processor::{is_successful, process_submission};
