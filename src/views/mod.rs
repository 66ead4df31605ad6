//! 文本视图
//!
//! 纯函数，输入数据结构，输出可直接打印的文本

pub mod details;
pub mod table;

pub use details::{render_insights, render_request_details, render_upload_stats};
pub use table::render_request_table;
