//! Report rendering: JSON for machines, aligned tables for people.

use vigil_core::Severity;
use vigil_validate::ValidationReport;

/// Render a simple aligned table for string rows.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(String::len)
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect();

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header_cells: Vec<String> = headers.iter().map(ToString::to_string).collect();
    let header_line = render_row(&header_cells);
    let divider = "-".repeat(header_line.len());

    let mut lines = Vec::with_capacity(2 + rows.len());
    lines.push(header_line);
    lines.push(divider);
    lines.extend(rows.iter().map(|row| render_row(row)));
    lines.join("\n")
}

/// Render a full report as human-readable text, one section per group.
#[must_use]
pub fn render_report(report: &ValidationReport) -> String {
    let mut sections = Vec::new();
    for grouped in &report.groups {
        if grouped.issues.is_empty() {
            continue;
        }
        let rows: Vec<Vec<String>> = grouped
            .issues
            .iter()
            .map(|issue| {
                vec![
                    issue.severity.to_string(),
                    issue.issue_type.to_string(),
                    issue.rule_id.clone(),
                    issue.path.clone(),
                    match &issue.suggestion {
                        Some(suggestion) => format!("{} (try: {suggestion})", issue.message),
                        None => issue.message.clone(),
                    },
                ]
            })
            .collect();
        sections.push(format!(
            "[{}]\n{}",
            grouped.group,
            render_table(&["severity", "type", "rule", "path", "message"], &rows)
        ));
    }

    if !report.anomalies.is_empty() {
        let rows: Vec<Vec<String>> = report
            .anomalies
            .iter()
            .map(|anomaly| {
                vec![
                    anomaly.rule_id.clone(),
                    anomaly.path.clone(),
                    format!("{:?}", anomaly.kind),
                ]
            })
            .collect();
        sections.push(format!(
            "[anomalies]\n{}",
            render_table(&["rule", "path", "kind"], &rows)
        ));
    }

    let summary = format!(
        "{} issue(s): {} error(s), {} warning(s), {} note(s); {} suppressed",
        report.total(),
        report.count_at(Severity::Error),
        report.count_at(Severity::Warning),
        report.count_at(Severity::Info),
        report.suppressed,
    );
    sections.push(summary);
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::render_table;

    #[test]
    fn columns_align_to_the_widest_cell() {
        let rendered = render_table(
            &["id", "name"],
            &[
                vec!["1".to_string(), "kitchen".to_string()],
                vec!["22".to_string(), "hall".to_string()],
            ],
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "id  name");
        assert_eq!(lines[2], "1   kitchen");
        assert_eq!(lines[3], "22  hall");
    }
}
