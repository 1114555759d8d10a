// ── Merged telemetry snapshot ──
//
// One poll cycle produces exactly one `Snapshot`. The four sections
// are always present; a failed fetch leaves its section as an empty
// map, so readers never need to null-check whole sections. Snapshots
// are immutable once built and replaced wholesale on the next cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use dyness_api::PointRecord;

/// Point ID carrying the comma-separated module serial list.
pub const SUB_POINT_ID: &str = "SUB";

/// The merged result of one polling cycle.
///
/// Structurally complete by construction: all four sections exist even
/// when empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Raw device detail payload (model, firmware, station, ...).
    pub device: Map<String, Value>,
    /// Most recent power/SOC history record with a usable power value.
    pub power: Map<String, Value>,
    /// BMS real-time points: point-id → point-value.
    pub bms: Map<String, Value>,
    /// Dongle real-time points: point-id → point-value.
    pub dongle: Map<String, Value>,
    /// When this cycle completed.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// A BMS point value by ID.
    pub fn bms_point(&self, id: &str) -> Option<&Value> {
        self.bms.get(id)
    }

    /// A dongle point value by ID.
    pub fn dongle_point(&self, id: &str) -> Option<&Value> {
        self.dongle.get(id)
    }
}

// ── Pure merge helpers ───────────────────────────────────────────────

/// Select the power record for the snapshot: the *last* entry whose
/// `realTimePower` field is present and non-null. Entries without a
/// usable power value are skipped; an empty map is returned when none
/// qualify.
pub fn latest_power_record(records: &[Value]) -> Map<String, Value> {
    records
        .iter()
        .rev()
        .find(|r| r.get("realTimePower").is_some_and(|v| !v.is_null()))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Flatten realtime point records into a point-id → point-value map.
///
/// Later duplicates win, matching the order the service reports them.
pub fn point_map(records: Vec<PointRecord>) -> Map<String, Value> {
    records
        .into_iter()
        .map(|p| (p.point_id, p.point_value))
        .collect()
}

/// Derive a module-serial candidate from the BMS section.
///
/// The `SUB` point carries a comma-separated serial list; the first
/// non-empty token (trimmed) wins. Deterministic given the same input,
/// so concurrent derivations cannot disagree.
pub fn module_sn_candidate(bms: &Map<String, Value>) -> Option<String> {
    let sub = bms.get(SUB_POINT_ID)?.as_str()?;
    sub.split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}
