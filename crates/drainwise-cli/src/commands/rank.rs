use std::path::Path;

use drainwise_disruption::{Clock, RankOptions, RankedCandidate, TracingSink, rank_candidates};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::snapshot::Snapshot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RankRow<'a> {
    node: &'a str,
    node_pool: &'a str,
    pods: usize,
    pod_cost: f64,
    lifetime_remaining: f64,
    disruption_cost: f64,
}

impl<'a> From<&RankedCandidate<'a>> for RankRow<'a> {
    fn from(r: &RankedCandidate<'a>) -> Self {
        let candidate = r.candidate;
        Self {
            node: &candidate.node.name,
            node_pool: &candidate.node_pool.name,
            pods: candidate.pods.len(),
            pod_cost: r.pod_cost,
            lifetime_remaining: r.lifetime_remaining,
            disruption_cost: r.disruption_cost,
        }
    }
}

pub fn rank(
    snapshot_path: &Path,
    clock: &dyn Clock,
    options: RankOptions,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let snapshot = Snapshot::from_file(snapshot_path)?;
    print!("{}", render(&snapshot, clock, options, format)?);
    Ok(())
}

/// Candidates cheapest-to-disrupt first.
pub fn render(
    snapshot: &Snapshot,
    clock: &dyn Clock,
    options: RankOptions,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let candidates = snapshot.candidates()?;
    let ranked = rank_candidates(&candidates, clock, &TracingSink, options);
    let rows: Vec<RankRow<'_>> = ranked.iter().map(RankRow::from).collect();

    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&rows)?)),
        OutputFormat::Text => {
            let mut out = format!(
                "{:<24}{:<16}{:>6}{:>12}{:>10}{:>18}\n",
                "NODE", "NODE POOL", "PODS", "POD COST", "LIFETIME", "DISRUPTION COST"
            );
            for row in &rows {
                out.push_str(&format!(
                    "{:<24}{:<16}{:>6}{:>12.4}{:>10.4}{:>18.4}\n",
                    row.node,
                    row.node_pool,
                    row.pods,
                    row.pod_cost,
                    row.lifetime_remaining,
                    row.disruption_cost
                ));
            }
            Ok(out)
        }
    }
}
