use crate::pipeline::Outcome;
use anyhow::Result;
use stubgen_engine::MergeReport;

pub fn render_json(outcome: &Outcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// One-line human summary of a run
pub fn summary_line(outcome: &Outcome, dry_run: bool) -> String {
    let report = &outcome.report;
    let state = if report.is_noop() {
        "up to date"
    } else if dry_run {
        "would update"
    } else if outcome.written {
        "updated"
    } else {
        "unchanged"
    };

    format!(
        "{}: {state} ({}) from {}",
        outcome.destination.display(),
        counts(report),
        outcome.declaration
    )
}

fn counts(report: &MergeReport) -> String {
    let mut parts = vec![
        format!("{} inserted", report.inserted.len()),
        format!("{} replaced", report.replaced.len()),
        format!("{} kept", report.kept.len()),
    ];
    if !report.imports_added.is_empty() {
        parts.push(format!("{} imports", report.imports_added.len()));
    }
    if report.namespace_synthesized {
        parts.push("package clause added".to_string());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcome(report: MergeReport, written: bool) -> Outcome {
        Outcome {
            destination: PathBuf::from("impl/widget.go"),
            declaration: "Widget".into(),
            written,
            report,
            rendered: String::new(),
        }
    }

    #[test]
    fn summary_counts_units() {
        let report = MergeReport {
            inserted: vec!["type widget".into(), "method widget.Open".into()],
            kept: vec!["method widget.Close".into()],
            imports_added: vec!["context".into()],
            ..MergeReport::default()
        };
        assert_eq!(
            summary_line(&outcome(report, true), false),
            "impl/widget.go: updated (2 inserted, 0 replaced, 1 kept, 1 imports) from Widget"
        );
    }

    #[test]
    fn noop_is_up_to_date() {
        let report = MergeReport {
            kept: vec!["type widget".into()],
            ..MergeReport::default()
        };
        assert!(summary_line(&outcome(report, false), false).contains("up to date"));
    }

    #[test]
    fn json_omits_rendered_text() {
        let json = render_json(&outcome(MergeReport::default(), false)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["declaration"], "Widget");
        assert!(value.get("rendered").is_none());
        assert!(value["report"]["inserted"].is_array());
    }
}
