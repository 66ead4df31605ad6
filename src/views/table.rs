//! 申请列表渲染

use crate::models::RequestSummary;

const HEADERS: [&str; 7] = [
    "Analysis ID",
    "ITSM Number",
    "Client",
    "System",
    "Requested For",
    "Requested Date",
    "Used Date",
];

fn row(summary: &RequestSummary) -> [String; 7] {
    [
        summary.analysis_id.clone(),
        summary.itsm_number.clone(),
        summary.client.clone(),
        summary.system.clone(),
        summary.requested_for.clone(),
        summary.requested_date.clone(),
        summary.used_date.clone(),
    ]
}

fn format_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter())
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// 按服务端返回顺序渲染申请列表
pub fn render_request_table(requests: &[RequestSummary]) -> String {
    if requests.is_empty() {
        return "No requests found\n".to_string();
    }

    let rows: Vec<[String; 7]> = requests.iter().map(row).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format_cells(HEADERS.iter().copied(), &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for r in &rows {
        out.push_str(&format_cells(r.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}
