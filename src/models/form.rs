//! 表单状态与待提交的申请

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::request::{normalize_tcodes, ClientName, RequestPayload, TargetSystem};
use crate::models::upload::Attachments;

/// 用户填写的表单，任意字段都可能为空
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestForm {
    pub itsm_number: Option<String>,
    pub client: Option<String>,
    pub system: Option<String>,
    pub requested_for: Option<String>,
    pub requested_on_behalf_of: Option<String>,
    pub requested_date: Option<String>,
    pub used_date: Option<String>,
    pub tcodes: Option<String>,
    pub reason: Option<String>,
    pub activities: Option<String>,
}

impl RequestForm {
    /// 校验并转换为请求体
    ///
    /// 先收集所有缺失字段一起报错，再逐个校验格式
    pub fn into_payload(self) -> Result<RequestPayload, ValidationError> {
        let fields: [(&'static str, &Option<String>); 10] = [
            ("itsmNumber", &self.itsm_number),
            ("client", &self.client),
            ("system", &self.system),
            ("requestedFor", &self.requested_for),
            ("requestedOnBehalfOf", &self.requested_on_behalf_of),
            ("requestedDate", &self.requested_date),
            ("usedDate", &self.used_date),
            ("tcodes", &self.tcodes),
            ("reason", &self.reason),
            ("activities", &self.activities),
        ];

        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        Ok(RequestPayload {
            itsm_number: required(self.itsm_number),
            client: required(self.client).parse::<ClientName>()?,
            system: required(self.system).parse::<TargetSystem>()?,
            requested_for: required(self.requested_for),
            requested_on_behalf_of: required(self.requested_on_behalf_of),
            requested_date: parse_date("requestedDate", &required(self.requested_date))?,
            used_date: parse_date("usedDate", &required(self.used_date))?,
            tcodes: normalize_tcodes(&required(self.tcodes))?,
            reason: required(self.reason),
            activities: required(self.activities),
        })
    }
}

// 缺失字段已在前面统一检查
fn required(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// 一次待提交的申请：表单 + 附件
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// 显示名称（通常是 TOML 文件名）
    pub name: String,
    pub form: RequestForm,
    pub attachments: Attachments,
    /// 来源文件
    pub file_path: Option<PathBuf>,
}

impl Submission {
    pub fn new(name: impl Into<String>, form: RequestForm, attachments: Attachments) -> Self {
        Self {
            name: name.into(),
            form,
            attachments,
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> RequestForm {
        RequestForm {
            itsm_number: Some("ITSM0123456".into()),
            client: Some("Tarento".into()),
            system: Some("ECC".into()),
            requested_for: Some("FF_FIN_01".into()),
            requested_on_behalf_of: Some("a.smith".into()),
            requested_date: Some("2025-02-10".into()),
            used_date: Some("2025-02-11".into()),
            tcodes: Some("fb02, SE16N".into()),
            reason: Some("Blocked invoice".into()),
            activities: Some("Change payment block".into()),
        }
    }

    #[test]
    fn test_filled_form_converts() {
        let payload = filled_form().into_payload().unwrap();
        assert_eq!(payload.client, ClientName::Tarento);
        assert_eq!(payload.system, TargetSystem::Ecc);
        assert_eq!(payload.tcodes, "FB02,SE16N");
        assert_eq!(payload.used_date, NaiveDate::from_ymd_opt(2025, 2, 11).unwrap());
    }

    #[test]
    fn test_hyphenated_tcodes_are_accepted() {
        let form = RequestForm {
            tcodes: Some("F-02,FB02".into()),
            ..filled_form()
        };
        assert_eq!(form.into_payload().unwrap().tcodes, "F-02,FB02");
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let form = RequestForm {
            reason: Some("   ".into()),
            tcodes: None,
            ..filled_form()
        };
        let err = form.into_payload().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                fields: vec!["tcodes", "reason"]
            }
        );
        assert_eq!(err.to_string(), "Please fill in all required fields");
    }

    #[test]
    fn test_bad_date_and_client() {
        let form = RequestForm {
            used_date: Some("11/02/2025".into()),
            ..filled_form()
        };
        assert!(matches!(
            form.into_payload(),
            Err(ValidationError::InvalidDate { field: "usedDate", .. })
        ));

        let form = RequestForm {
            client: Some("Contoso".into()),
            ..filled_form()
        };
        assert!(matches!(
            form.into_payload(),
            Err(ValidationError::UnsupportedValue { field: "client", .. })
        ));
    }
}
