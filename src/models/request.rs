//! 申请单数据模型
//!
//! 字段名与后端 live API 保持一致（`requested_on_behalfof`、`activities_to_be_performed` 等）

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 客户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientName {
    Tarento,
    Implema,
    #[serde(rename = "ATOS")]
    Atos,
}

impl ClientName {
    pub const ALL: [ClientName; 3] = [ClientName::Tarento, ClientName::Implema, ClientName::Atos];

    pub fn as_str(self) -> &'static str {
        match self {
            ClientName::Tarento => "Tarento",
            ClientName::Implema => "Implema",
            ClientName::Atos => "ATOS",
        }
    }
}

impl FromStr for ClientName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnsupportedValue {
                field: "client",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 目标系统
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSystem {
    #[serde(rename = "ECC")]
    Ecc,
    #[serde(rename = "S4HANA")]
    S4Hana,
}

impl TargetSystem {
    pub const ALL: [TargetSystem; 2] = [TargetSystem::Ecc, TargetSystem::S4Hana];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetSystem::Ecc => "ECC",
            TargetSystem::S4Hana => "S4HANA",
        }
    }
}

impl FromStr for TargetSystem {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnsupportedValue {
                field: "system",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TargetSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 创建申请的请求体（十个必填字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    #[serde(rename = "itsmNumber")]
    pub itsm_number: String,
    pub client: ClientName,
    pub system: TargetSystem,
    #[serde(rename = "requestedFor")]
    pub requested_for: String,
    #[serde(rename = "requested_on_behalfof")]
    pub requested_on_behalf_of: String,
    #[serde(rename = "requestedDate")]
    pub requested_date: NaiveDate,
    #[serde(rename = "usedDate")]
    pub used_date: NaiveDate,
    /// 逗号分隔的事务码列表
    pub tcodes: String,
    pub reason: String,
    #[serde(rename = "activities_to_be_performed")]
    pub activities: String,
}

impl RequestPayload {
    /// 拆分后的事务码
    pub fn tcode_list(&self) -> Vec<&str> {
        split_tcodes(&self.tcodes).collect()
    }
}

/// 后端创建成功后返回的申请单
///
/// 分析 ID 只存在于这里，请求体上没有该字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "analysisID")]
    pub analysis_id: String,
    #[serde(flatten)]
    pub payload: RequestPayload,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// 列表页的一行
///
/// 服务端返回的内容原样保留：客户、系统、日期都按字符串读取，
/// 单行数据不规范不影响整个列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
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
    pub requested_date: String,
    #[serde(default)]
    pub used_date: String,
}

impl From<&Request> for RequestSummary {
    fn from(request: &Request) -> Self {
        let p = &request.payload;
        Self {
            analysis_id: request.analysis_id.clone(),
            itsm_number: p.itsm_number.clone(),
            client: p.client.to_string(),
            system: p.system.to_string(),
            requested_for: p.requested_for.clone(),
            requested_date: p.requested_date.format("%Y-%m-%d").to_string(),
            used_date: p.used_date.format("%Y-%m-%d").to_string(),
        }
    }
}

// ========== 事务码 ==========

/// SAP 事务码字段为 CHAR(20)：不含空白、逗号和控制字符即可（如 `F-02`、`/SAPAPO/RRP3`）
fn tcode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s,[:cntrl:]]{1,20}$").expect("valid tcode regex"))
}

fn split_tcodes(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// 规范化事务码列表：去空白、转大写、校验格式，返回逗号连接的字符串
pub fn normalize_tcodes(raw: &str) -> Result<String, ValidationError> {
    let mut codes = Vec::new();
    for code in split_tcodes(raw) {
        let upper = code.to_ascii_uppercase();
        if !tcode_pattern().is_match(&upper) {
            return Err(ValidationError::InvalidTcode {
                code: code.to_string(),
            });
        }
        codes.push(upper);
    }

    if codes.is_empty() {
        return Err(ValidationError::MissingFields {
            fields: vec!["tcodes"],
        });
    }

    Ok(codes.join(","))
}
