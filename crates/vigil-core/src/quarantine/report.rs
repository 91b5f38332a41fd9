//! Prune report artifacts: a JSON summary for tooling and a markdown page
//! for people.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use vigil_state::{write_json, write_text, StateStore};

use super::model::{PendingItem, PruneReason};
use crate::error::Result;

const MS_PER_DAY: i64 = 86_400_000;

/// One pruned file in the JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunedReportItem {
    #[serde(rename = "arquivo")]
    pub path: String,
    #[serde(rename = "motivo")]
    pub reason: PruneReason,
    #[serde(
        rename = "diasInativo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub days_inactive: Option<i64>,
}

/// One kept file in the JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeptReportItem {
    #[serde(rename = "arquivo")]
    pub path: String,
    #[serde(rename = "motivo")]
    pub reason: PruneReason,
}

/// Machine-readable prune report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    #[serde(rename = "podados")]
    pub pruned: Vec<PrunedReportItem>,
    #[serde(rename = "mantidos")]
    pub kept: Vec<KeptReportItem>,
    #[serde(rename = "totalPodados")]
    pub total_pruned: usize,
    #[serde(rename = "totalMantidos")]
    pub total_kept: usize,
    /// Generation time, epoch milliseconds.
    pub timestamp: i64,
}

/// Whole days between detection and `now`; `None` for unknown or future detections.
pub fn days_inactive(detected_at_ms: i64, now: DateTime<Utc>) -> Option<i64> {
    let elapsed = now.timestamp_millis().checked_sub(detected_at_ms)?;
    (detected_at_ms > 0 && elapsed >= 0).then_some(elapsed / MS_PER_DAY)
}

pub fn build_prune_report(
    pruned: &[PendingItem],
    kept: &[PendingItem],
    now: DateTime<Utc>,
) -> PruneReport {
    PruneReport {
        pruned: pruned
            .iter()
            .map(|p| PrunedReportItem {
                path: p.path.clone(),
                reason: p.reason,
                days_inactive: days_inactive(p.detected_at, now),
            })
            .collect(),
        kept: kept
            .iter()
            .map(|k| KeptReportItem {
                path: k.path.clone(),
                reason: k.reason,
            })
            .collect(),
        total_pruned: pruned.len(),
        total_kept: kept.len(),
        timestamp: now.timestamp_millis(),
    }
}

fn detection_date(detected_at_ms: i64) -> String {
    if detected_at_ms <= 0 {
        return "-".to_string();
    }
    Utc.timestamp_millis_opt(detected_at_ms)
        .single()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render the markdown report page.
pub fn render_prune_report_md(
    pruned: &[PendingItem],
    kept: &[PendingItem],
    now: DateTime<Utc>,
    simulated: bool,
) -> String {
    let mut out = String::new();
    out.push_str("# Prune Report\n\n");
    out.push_str(&format!("- generated: {}\n", now.to_rfc3339()));
    out.push_str(&format!(
        "- execution: {}\n",
        if simulated { "simulated" } else { "real" }
    ));
    out.push_str(&format!("- files pruned: {}\n", pruned.len()));
    out.push_str(&format!("- files kept: {}\n\n", kept.len()));

    out.push_str("## Pruned Files\n\n");
    if pruned.is_empty() {
        out.push_str("No files pruned.\n\n");
    } else {
        out.push_str("| File | Reason | Days inactive | Detected |\n");
        out.push_str("|------|--------|---------------|----------|\n");
        for p in pruned {
            let days = days_inactive(p.detected_at, now)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                p.path,
                p.reason,
                days,
                detection_date(p.detected_at)
            ));
        }
        out.push('\n');
    }

    out.push_str("## Kept Files\n\n");
    if kept.is_empty() {
        out.push_str("No files kept.\n");
    } else {
        out.push_str("| File | Reason |\n");
        out.push_str("|------|--------|\n");
        for k in kept {
            out.push_str(&format!("| `{}` | {} |\n", k.path, k.reason));
        }
    }
    out
}

/// Write both report artifacts.
pub async fn write_prune_reports<S>(
    store: &S,
    json_path: &Path,
    md_path: &Path,
    report: &PruneReport,
    markdown: &str,
) -> Result<()>
where
    S: StateStore + ?Sized,
{
    write_json(store, json_path, report).await?;
    write_text(store, md_path, markdown).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    #[test]
    fn days_inactive_floors_and_rejects_future() {
        let now = at(10 * MS_PER_DAY + 5);
        assert_eq!(days_inactive(MS_PER_DAY, now), Some(9));
        assert_eq!(days_inactive(now.timestamp_millis(), now), Some(0));
        assert_eq!(days_inactive(now.timestamp_millis() + 1, now), None);
        assert_eq!(days_inactive(0, now), None);
    }

    #[test]
    fn json_report_uses_wire_keys() {
        let now = at(3 * MS_PER_DAY);
        let pruned = vec![PendingItem::detected("old.js", PruneReason::Orphan, MS_PER_DAY)];
        let kept = vec![PendingItem::detected("keep.js", PruneReason::Inactive, MS_PER_DAY)];
        let report = build_prune_report(&pruned, &kept, now);

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["totalPodados"], 1);
        assert_eq!(v["totalMantidos"], 1);
        assert_eq!(v["timestamp"], 3 * MS_PER_DAY);
        assert_eq!(v["podados"][0]["arquivo"], "old.js");
        assert_eq!(v["podados"][0]["diasInativo"], 2);
        assert_eq!(v["mantidos"][0]["motivo"], "inativo");
        assert!(v["mantidos"][0].get("diasInativo").is_none());
    }

    #[test]
    fn markdown_lists_both_tables() {
        let now = at(2 * MS_PER_DAY);
        let pruned = vec![PendingItem::detected("old.js", PruneReason::Orphan, MS_PER_DAY)];
        let md = render_prune_report_md(&pruned, &[], now, true);
        assert!(md.starts_with("# Prune Report"));
        assert!(md.contains("- execution: simulated"));
        assert!(md.contains("| `old.js` | orfao | 1 | 1970-01-02 |"));
        assert!(md.contains("No files kept."));
    }

    #[test]
    fn empty_markdown_says_so() {
        let md = render_prune_report_md(&[], &[], at(MS_PER_DAY), false);
        assert!(md.contains("- files pruned: 0"));
        assert!(md.contains("No files pruned."));
        assert!(md.contains("- execution: real"));
    }
}
