use std::path::Path;

use anyhow::{Context, bail};
use drainwise_disruption::{LaunchPrice, worst_launch_price};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::snapshot::Snapshot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplacementReport {
    node: String,
    instance_type: Option<String>,
    current_price: f64,
    options: usize,
    replacements: Vec<ReplacementRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplacementRow {
    name: String,
    worst_launch_price: f64,
}

pub fn replacements(snapshot_path: &Path, node: &str, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = Snapshot::from_file(snapshot_path)?;
    print!("{}", render(&snapshot, node, format)?);
    Ok(())
}

/// Instance types strictly cheaper than `node`'s current offering.
pub fn render(snapshot: &Snapshot, node: &str, format: OutputFormat) -> anyhow::Result<String> {
    let candidates = snapshot.candidates()?;
    let Some(candidate) = candidates.iter().find(|c| c.name() == node) else {
        bail!("no candidate named {node} in snapshot");
    };

    let cheaper = candidate
        .cheaper_replacements(&snapshot.instance_types, &snapshot.requirements)
        .with_context(|| format!("no valid price-based narrowing for {node}"))?;

    let report = ReplacementReport {
        node: node.to_string(),
        instance_type: candidate.instance_type.as_ref().map(|it| it.name.clone()),
        current_price: candidate.current_price().unwrap_or_default(),
        options: snapshot.instance_types.len(),
        replacements: cheaper
            .iter()
            .map(|it| ReplacementRow {
                name: it.name.clone(),
                worst_launch_price: worst_launch_price(&it.offerings.available(), &snapshot.requirements)
                    .as_f64(),
            })
            .collect(),
    };

    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&report)?)),
        OutputFormat::Text => {
            let mut out = format!(
                "Node {} ({}) at {}/h\n",
                report.node,
                report.instance_type.as_deref().unwrap_or("unknown"),
                LaunchPrice::Known(report.current_price)
            );
            if report.replacements.is_empty() {
                out.push_str("No cheaper replacements.\n");
                return Ok(out);
            }
            out.push_str(&format!(
                "Cheaper replacements ({} of {}):\n",
                report.replacements.len(),
                report.options
            ));
            for row in &report.replacements {
                out.push_str(&format!("  {:<20}{:.4}\n", row.name, row.worst_launch_price));
            }
            Ok(out)
        }
    }
}
