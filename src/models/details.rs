//! 详情页数据模型与分析结果
//!
//! 分析结果由后端生成，这里只做只读解析

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `/details` 接口返回的完整申请信息
///
/// 描述字段按字符串原样读取，缺失时为空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub analysis_id: String,
    #[serde(default)]
    pub itsm_number: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub requested_for: String,
    #[serde(default)]
    pub requested_on_behalf_of: String,
    #[serde(default)]
    pub requested_date: String,
    #[serde(default)]
    pub used_date: String,
    #[serde(default)]
    pub tcodes: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub activities: String,
    #[serde(default)]
    pub transaction_usage: Vec<TransactionUsage>,
    #[serde(default)]
    pub audit_logs: Vec<AuditLog>,
    #[serde(default)]
    pub change_doc_logs: Vec<ChangeDocLog>,
    /// 尚未分析时后端可能不返回
    #[serde(default)]
    pub ai_insights: Option<AiInsights>,
}

/// 事务使用记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUsage {
    pub timestamp: String,
    pub transaction: String,
    #[serde(default)]
    pub description: String,
    pub user: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub system: String,
}

/// SM20 审计日志记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    pub timestamp: String,
    pub action: String,
    #[serde(default)]
    pub terminal: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub details: String,
}

/// CDHDR/CDPOS 变更文档记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDocLog {
    pub timestamp: String,
    pub table: String,
    pub field: String,
    #[serde(default)]
    pub old_value: String,
    #[serde(default)]
    pub new_value: String,
    pub user: String,
}

/// AI 风险评估
///
/// 后端可能只返回部分字段，缺失的取默认值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiInsights {
    /// 实际活动与申请活动的吻合度（百分比）
    pub activity_alignment: f64,
    pub ownership: String,
    pub justification: String,
    /// 0-100
    pub risk_score: f64,
    pub red_flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub key_insights: Vec<String>,
}

impl AiInsights {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// 风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// 大于 70 为高风险，大于 40 为中风险
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            RiskLevel::High
        } else if score > 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// 触发分析后的原始返回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(pub Value);

impl AnalysisResult {
    /// 提取 AI 评估；兼容顶层字段与 `aiInsights` 嵌套两种返回
    ///
    /// 顶层既没有 `aiInsights` 也没有 `riskScore` 时视为没有评估
    pub fn insights(&self) -> Option<AiInsights> {
        let candidate = match self.0.get("aiInsights") {
            Some(nested) => nested,
            None if self.0.get("riskScore").is_some() => &self.0,
            None => return None,
        };
        serde_json::from_value(candidate.clone()).ok()
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}
