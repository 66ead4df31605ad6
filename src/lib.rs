//! # Firefighter Request
//!
//! 特权（firefighter）账号申请的提交客户端
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 网关层（Clients）
//! - `clients/` - 后端接口的唯一入口
//! - `RequestGateway` - 创建 / 查询 / 上传 / 分析能力
//! - `FirefighterClient` - 基于 reqwest 的 HTTP 实现
//!
//! ### ② 基础设施层（Infrastructure）
//! - `MemoryBackend` - 内存实现，用于离线演示和测试
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份申请"的完整提交流程
//! - `SubmissionCtx` - 上下文封装（申请名称 + 编号）
//! - `SubmissionFlow` - 流程编排（校验 → 创建 → 上传 → 分析）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 批量提交与查询命令
//! - `orchestrator/submission_processor` - 单份申请处理
//!
//! 另有 `models`（数据模型与 TOML 加载）、`services`（输出日志）、
//! `views`（文本渲染）、`utils`（日志工具）。
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod views;
pub mod workflow;

// 重新导出常用类型
pub use clients::{FirefighterClient, RequestGateway, RequestRepository};
pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use infrastructure::MemoryBackend;
pub use models::{Request, RequestPayload, Submission};
pub use orchestrator::{App, BatchStats};
pub use workflow::{SubmissionCtx, SubmissionFlow, SubmissionReport};
