//! 申请详情渲染
//!
//! 只依赖 `RequestDetails` 结构本身，数据来源由调用方决定

use crate::models::{AiInsights, RequestDetails, UploadStats};

/// 渲染完整详情：申请信息、日志、AI 评估
pub fn render_request_details(details: &RequestDetails) -> String {
    let mut out = String::new();

    section(&mut out, &format!("Request {}", details.analysis_id));
    let fields = [
        ("ITSM Number", &details.itsm_number),
        ("Client", &details.client),
        ("System", &details.system),
        ("Requested For", &details.requested_for),
        ("Requested On Behalf Of", &details.requested_on_behalf_of),
        ("Requested Date", &details.requested_date),
        ("Used Date", &details.used_date),
        ("Requested Tcodes", &details.tcodes),
        ("Reason", &details.reason),
        ("Activities", &details.activities),
    ];
    for (label, value) in fields {
        out.push_str(&format!("{:<24}{}\n", format!("{label}:"), value));
    }

    section(
        &mut out,
        &format!("Transaction Usage ({})", details.transaction_usage.len()),
    );
    for t in &details.transaction_usage {
        out.push_str(&format!(
            "{}  {:<10} {:<12} {}\n",
            t.timestamp, t.transaction, t.user, t.description
        ));
    }

    section(&mut out, &format!("Audit Logs ({})", details.audit_logs.len()));
    for a in &details.audit_logs {
        out.push_str(&format!(
            "{}  {:<16} {:<12} {}\n",
            a.timestamp, a.action, a.program, a.details
        ));
    }

    section(
        &mut out,
        &format!("Change Documents ({})", details.change_doc_logs.len()),
    );
    for c in &details.change_doc_logs {
        out.push_str(&format!(
            "{}  {}.{}  {} -> {}  ({})\n",
            c.timestamp, c.table, c.field, c.old_value, c.new_value, c.user
        ));
    }

    section(&mut out, "AI Insights");
    match &details.ai_insights {
        Some(insights) => out.push_str(&render_insights(insights)),
        None => out.push_str("Not analysed yet\n"),
    }

    out
}

/// 渲染 AI 评估
pub fn render_insights(insights: &AiInsights) -> String {
    let mut lines = vec![
        format!(
            "Risk Score:          {}/100 ({})",
            insights.risk_score,
            insights.risk_level().label()
        ),
        format!("Activity Alignment:  {}%", insights.activity_alignment),
        format!("Ownership:           {}", insights.ownership),
        format!("Justification:       {}", insights.justification),
    ];

    for (title, items) in [
        ("Red Flags", &insights.red_flags),
        ("Recommendations", &insights.recommendations),
        ("Key Insights", &insights.key_insights),
    ] {
        if items.is_empty() {
            continue;
        }
        lines.push(format!("{title}:"));
        lines.extend(items.iter().map(|item| format!("  - {item}")));
    }

    lines.join("\n") + "\n"
}

/// 渲染 CDHDR / CDPOS 上传统计
pub fn render_upload_stats(stats: &UploadStats) -> String {
    let s = &stats.statistics;
    format!(
        "Analysis {}\n  CDHDR records:     {}\n  CDPOS records:     {}\n  Matched records:   {}\n  Unmatched records: {}\n",
        stats.analysis_id, s.cdhdr_records, s.cdpos_records, s.matched_records, s.unmatched_records
    )
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(title);
    out.push('\n');
    out.push_str(&"─".repeat(title.chars().count().max(20)));
    out.push('\n');
}
