//! Export: JSON, CSV, and Markdown artifacts for a monitor run.
//!
//! - **JSON**: the full `MonitorResult` with schema versioning, plus a standalone summary
//! - **CSV**: weekly composite with band, and the weekly component table
//! - **Markdown**: a human-readable report with movers and callouts
//!
//! Undefined values are written as empty CSV cells.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fragility_core::scoring::{Component, ComponentScores, CompositeIndex};

use crate::explain::ReportContext;
use crate::monitor::{MonitorResult, Summary, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `MonitorResult` to pretty JSON.
pub fn export_json(result: &MonitorResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize MonitorResult to JSON")
}

/// Deserialize a `MonitorResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<MonitorResult> {
    let result: MonitorResult =
        serde_json::from_str(json).context("failed to deserialize MonitorResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

pub fn export_summary_json(summary: &Summary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize Summary to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.4}")
    }
}

/// Columns: date, index, band_lower, band_upper
pub fn export_composite_csv(composite: &CompositeIndex) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "index", "band_lower", "band_upper"])?;
    for row in &composite.rows {
        wtr.write_record([
            row.date.to_string(),
            cell(row.index),
            cell(row.band_lower),
            cell(row.band_upper),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, then one column per component in canonical order.
pub fn export_components_csv(components: &ComponentScores) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date"];
    header.extend(Component::ALL.iter().map(|c| c.as_str()));
    wtr.write_record(&header)?;

    let columns: Vec<Option<&[f64]>> = Component::ALL
        .iter()
        .map(|c| components.values(*c))
        .collect();
    for (i, date) in components.index().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(
            columns
                .iter()
                .map(|col| cell(col.map_or(f64::NAN, |v| v[i]))),
        );
        wtr.write_record(&record)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one monitor run.
pub fn generate_report(result: &MonitorResult) -> String {
    let summary = &result.summary;
    let context = ReportContext::build(&result.composite, &result.components);
    let mut md = String::with_capacity(2048);

    md.push_str("# Fragility Report\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| As of | {} |\n", summary.as_of));
    md.push_str(&format!("| Index | {:.1} |\n", summary.index));
    if let Some(latest) = result.composite.latest() {
        md.push_str(&format!(
            "| Band | [{:.1}, {:.1}] |\n",
            latest.band_lower, latest.band_upper
        ));
    }
    md.push_str(&format!("| Regime | {} |\n", summary.regime));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');
    md.push_str(&summary.interpretation);
    md.push_str("\n\n");

    md.push_str("## Components\n\n");
    md.push_str("| Component | Score |\n");
    md.push_str("| --- | ---: |\n");
    for component in Component::ALL {
        let value = result.components.latest(component);
        let text = if value.is_nan() {
            "n/a".to_string()
        } else {
            format!("{value:.1}")
        };
        md.push_str(&format!("| {} | {} |\n", component.label(), text));
    }
    md.push('\n');

    if !context.movers.is_empty() {
        md.push_str("## Biggest Movers\n\n");
        for mover in &context.movers {
            md.push_str(&format!(
                "- {}: {:+.1} {}\n",
                mover.label(),
                mover.delta,
                mover.sigma_text()
            ));
        }
        md.push('\n');
    }

    let callouts: Vec<&String> = context
        .containment_message
        .iter()
        .chain(context.macro_sector_callout.iter())
        .collect();
    if !callouts.is_empty() {
        md.push_str("## Notes\n\n");
        for callout in callouts {
            md.push_str(&format!("- {callout}\n"));
        }
        md.push('\n');
    }

    let b = &result.backtest;
    md.push_str("## Backtest\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Precision | {:.2} |\n", b.precision));
    md.push_str(&format!("| Recall | {:.2} |\n", b.recall));
    md.push_str(&format!(
        "| Avg Lead (days) | {} |\n",
        b.avg_lead_days
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:.1}"))
    ));
    md.push_str(&format!("| Events | {} |\n", b.events));
    md.push_str(&format!("| Signals | {} |\n", b.signals));

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set into `output_dir`:
/// - `manifest.json`: the full `MonitorResult`
/// - `summary.json`
/// - `composite.csv`, `components.csv`
/// - `report.md`
///
/// Returns `output_dir`.
pub fn save_artifacts(result: &MonitorResult, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    let write = |name: &str, content: String| -> Result<()> {
        let path = output_dir.join(name);
        std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
    };

    write("manifest.json", export_json(result)?)?;
    write("summary.json", export_summary_json(&result.summary)?)?;
    write("composite.csv", export_composite_csv(&result.composite)?)?;
    write("components.csv", export_components_csv(&result.components)?)?;
    write("report.md", generate_report(result))?;

    Ok(output_dir.to_path_buf())
}

/// Load a `MonitorResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<MonitorResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fragility_core::backtest::BacktestResult;
    use fragility_core::domain::Frame;
    use fragility_core::scoring::{CompositeRow, Regime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn sample_result() -> MonitorResult {
        let composite = CompositeIndex {
            rows: vec![
                CompositeRow {
                    date: d(1),
                    index: 40.0,
                    band_lower: 30.0,
                    band_upper: 50.0,
                },
                CompositeRow {
                    date: d(8),
                    index: 62.5,
                    band_lower: 55.0,
                    band_upper: 70.0,
                },
            ],
        };
        let mut table = Frame::new(vec![d(1), d(8)]);
        for c in Component::ALL {
            table.insert(c.as_str(), vec![f64::NAN, 50.0]);
        }
        table.insert(Component::CapitalFlow.as_str(), vec![20.0, 80.0]);
        let components = ComponentScores { table };
        let summary = Summary::from_latest(&composite, &components).unwrap();
        MonitorResult {
            schema_version: SCHEMA_VERSION,
            composite,
            components,
            summary,
            backtest: BacktestResult {
                precision: 0.5,
                recall: 1.0,
                avg_lead_days: Some(4.0),
                events: 1,
                signals: 2,
                true_positives: 1,
            },
            dataset_hash: "abc123".into(),
            has_synthetic: true,
        }
    }

    #[test]
    fn composite_csv_has_header_and_rows() {
        let csv = export_composite_csv(&sample_result().composite).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,index,band_lower,band_upper");
        assert_eq!(lines[2], "2024-03-08,62.5000,55.0000,70.0000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn components_csv_leaves_undefined_cells_empty() {
        let csv = export_components_csv(&sample_result().components).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with("date,capital_flow,revenue_reality"));
        assert!(lines[1].starts_with("2024-03-01,20.0000,,"));
    }

    #[test]
    fn json_roundtrip_and_schema_check() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.summary, result.summary);
        assert_eq!(back.composite, result.composite);

        let future = json.replacen(
            &format!("\"schema_version\": {SCHEMA_VERSION}"),
            "\"schema_version\": 99",
            1,
        );
        assert!(import_json(&future).is_err());
    }

    #[test]
    fn summary_json_keeps_component_order() {
        let json = export_summary_json(&sample_result().summary).unwrap();
        let revenue = json.find("\"revenue_reality\"").unwrap();
        let model = json.find("\"model_economics\"").unwrap();
        let hype = json.find("\"ai_hype\"").unwrap();
        assert!(revenue < model && model < hype);
    }

    #[test]
    fn report_mentions_regime_and_synthetic_flag() {
        let report = generate_report(&sample_result());
        assert!(report.contains(&format!("| Regime | {} |", Regime::Stressed)));
        assert!(report.contains("**SYNTHETIC**"));
        assert!(report.contains("| Capital Flow | 80.0 |"));
        assert!(report.contains("| Avg Lead (days) | 4.0 |"));
    }

    #[test]
    fn save_and_load_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        let out = save_artifacts(&result, dir.path()).unwrap();
        for name in ["manifest.json", "summary.json", "composite.csv", "components.csv", "report.md"] {
            assert!(out.join(name).exists(), "{name} missing");
        }
        let loaded = load_artifacts(&out).unwrap();
        assert_eq!(loaded.summary, result.summary);
    }
}
