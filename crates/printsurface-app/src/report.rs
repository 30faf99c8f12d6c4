//! Plain-text preflight report.

use printsurface_core::{Severity, SideReport};
use std::fmt::Write;

/// Render per-side warnings as a short human readable report.
pub fn format_report(reports: &[SideReport]) -> String {
    let mut out = String::new();
    for report in reports {
        if report.warnings.is_empty() {
            let _ = writeln!(out, "{}: ok", report.side_id);
            continue;
        }
        let _ = writeln!(out, "{}: {} warning(s)", report.side_id, report.warnings.len());
        for warning in &report.warnings {
            let label = match warning.severity {
                Severity::Error => "error",
                Severity::Warn => "warn ",
            };
            let _ = writeln!(
                out,
                "  {label} {:<32} {} [{}]",
                warning.id,
                warning.message,
                warning.fix.map_or("-", |fix| fix.tag())
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use printsurface_core::{WarningItem, WarningKind};

    #[test]
    fn test_format_report() {
        let reports = vec![
            SideReport {
                side_id: "front".into(),
                warnings: vec![WarningItem::for_node(
                    WarningKind::OutsideTrim,
                    "box",
                    "Object extends past the trim line",
                )],
            },
            SideReport {
                side_id: "back".into(),
                warnings: Vec::new(),
            },
        ];
        let text = format_report(&reports);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "front: 1 warning(s)");
        assert!(lines[1].starts_with("  error OUTSIDE_TRIM:box"));
        assert!(lines[1].ends_with("[move-inside-trim]"));
        assert_eq!(lines[2], "back: ok");
    }
}
