// ── Named readings registry ──
//
// Maps reading identifiers to pure extraction functions over the
// snapshot. Consumers (the CLI, or any host layer) iterate the
// registry and evaluate lazily per query; a reading whose extractor
// yields `None` is simply "unavailable" for that cycle.
//
// Point IDs are vendor-defined; values arrive as string-encoded
// numbers more often than not, so numeric extraction is tolerant.

use serde_json::Value;

use crate::snapshot::Snapshot;

/// Power threshold (W) separating charge/discharge from standby.
const STATUS_THRESHOLD_W: f64 = 10.0;

/// What a reading measures; drives units/formatting downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Power,
    Current,
    Voltage,
    Temperature,
    Battery,
    Signal,
    Status,
    Info,
    Timestamp,
}

impl std::fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Power => "power",
            Self::Current => "current",
            Self::Voltage => "voltage",
            Self::Temperature => "temperature",
            Self::Battery => "battery",
            Self::Signal => "signal",
            Self::Status => "status",
            Self::Info => "info",
            Self::Timestamp => "timestamp",
        };
        f.write_str(s)
    }
}

/// One extracted reading value.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One row of the registry: identifier, presentation metadata, and a
/// pure extractor over the snapshot.
pub struct Reading {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub kind: ReadingKind,
    extract: fn(&Snapshot) -> Option<ReadingValue>,
}

impl Reading {
    /// Evaluate this reading against a snapshot.
    pub fn value(&self, snapshot: &Snapshot) -> Option<ReadingValue> {
        (self.extract)(snapshot)
    }
}

/// The full registry of known readings.
pub fn registry() -> &'static [Reading] {
    &REGISTRY
}

/// Find a reading by identifier.
pub fn lookup(id: &str) -> Option<&'static Reading> {
    REGISTRY.iter().find(|r| r.id == id)
}

// ── Extraction helpers ───────────────────────────────────────────────

/// Lenient numeric parse: accepts JSON numbers and string-encoded
/// numbers; treats null, `""`, and `"null"` as absent.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "null" {
                None
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn power_num(s: &Snapshot, key: &str) -> Option<ReadingValue> {
    s.power.get(key).and_then(as_f64).map(|v| ReadingValue::Number(round3(v)))
}

fn bms_num(s: &Snapshot, id: &str) -> Option<ReadingValue> {
    s.bms_point(id).and_then(as_f64).map(|v| ReadingValue::Number(round3(v)))
}

fn bms_text(s: &Snapshot, id: &str) -> Option<ReadingValue> {
    s.bms_point(id)
        .and_then(Value::as_str)
        .map(|v| ReadingValue::Text(v.to_owned()))
}

fn device_text(s: &Snapshot, key: &str) -> Option<ReadingValue> {
    s.device
        .get(key)
        .and_then(Value::as_str)
        .map(|v| ReadingValue::Text(v.to_owned()))
}

fn flag(s: &Snapshot, id: &str, on: &str, yes: &str, no: &str) -> Option<ReadingValue> {
    let raw = s.bms_point(id)?;
    let matches_on = raw.as_str().map_or_else(|| raw.to_string() == on, |v| v == on);
    Some(ReadingValue::Text(
        (if matches_on { yes } else { no }).to_owned(),
    ))
}

/// Classify the battery state from the real-time power sign.
fn battery_status(s: &Snapshot) -> Option<ReadingValue> {
    let label = match s.power.get("realTimePower").and_then(as_f64) {
        None => "Unknown",
        Some(p) if p > STATUS_THRESHOLD_W => "Charging",
        Some(p) if p < -STATUS_THRESHOLD_W => "Discharging",
        Some(_) => "Standby",
    };
    Some(ReadingValue::Text(label.to_owned()))
}

/// Max minus min cell voltage; needs both points.
fn cell_voltage_spread(s: &Snapshot) -> Option<ReadingValue> {
    let max = s.bms_point("1300").and_then(as_f64)?;
    let min = s.bms_point("1500").and_then(as_f64)?;
    Some(ReadingValue::Number(round3(max - min)))
}

// ── The registry ─────────────────────────────────────────────────────

static REGISTRY: [Reading; 27] = [
    // ── Power & energy ──
    Reading {
        id: "battery_power",
        name: "Battery Power",
        unit: Some("W"),
        kind: ReadingKind::Power,
        extract: |s| power_num(s, "realTimePower"),
    },
    Reading {
        id: "battery_current",
        name: "Battery Current",
        unit: Some("A"),
        kind: ReadingKind::Current,
        extract: |s| power_num(s, "realTimeCurrent"),
    },
    Reading {
        id: "battery_status",
        name: "Battery Status",
        unit: None,
        kind: ReadingKind::Status,
        extract: battery_status,
    },
    // ── SOC / SOH ──
    Reading {
        id: "battery_soc",
        name: "Battery SOC",
        unit: Some("%"),
        kind: ReadingKind::Battery,
        extract: |s| power_num(s, "soc"),
    },
    Reading {
        id: "battery_soh",
        name: "Battery SOH",
        unit: Some("%"),
        kind: ReadingKind::Battery,
        extract: |s| bms_num(s, "1200"),
    },
    // ── Voltage ──
    Reading {
        id: "pack_voltage",
        name: "Pack Voltage",
        unit: Some("V"),
        kind: ReadingKind::Voltage,
        extract: |s| bms_num(s, "600"),
    },
    Reading {
        id: "cell_voltage_max",
        name: "Cell Voltage Max",
        unit: Some("V"),
        kind: ReadingKind::Voltage,
        extract: |s| bms_num(s, "1300"),
    },
    Reading {
        id: "cell_voltage_min",
        name: "Cell Voltage Min",
        unit: Some("V"),
        kind: ReadingKind::Voltage,
        extract: |s| bms_num(s, "1500"),
    },
    Reading {
        id: "cell_voltage_spread",
        name: "Cell Voltage Spread",
        unit: Some("V"),
        kind: ReadingKind::Voltage,
        extract: cell_voltage_spread,
    },
    Reading {
        id: "cell_voltage_max_cell",
        name: "Max Voltage Cell #",
        unit: None,
        kind: ReadingKind::Info,
        extract: |s| bms_text(s, "1402"),
    },
    Reading {
        id: "cell_voltage_min_cell",
        name: "Min Voltage Cell #",
        unit: None,
        kind: ReadingKind::Info,
        extract: |s| bms_text(s, "1602"),
    },
    Reading {
        id: "charge_voltage_upper",
        name: "Charge Voltage Upper Limit",
        unit: Some("V"),
        kind: ReadingKind::Voltage,
        extract: |s| bms_num(s, "3600"),
    },
    Reading {
        id: "charge_voltage_lower",
        name: "Charge Voltage Lower Limit",
        unit: Some("V"),
        kind: ReadingKind::Voltage,
        extract: |s| bms_num(s, "3700"),
    },
    // ── Temperature ──
    Reading {
        id: "cell_temp_max",
        name: "Cell Temperature Max",
        unit: Some("°C"),
        kind: ReadingKind::Temperature,
        extract: |s| bms_num(s, "1800"),
    },
    Reading {
        id: "cell_temp_min",
        name: "Cell Temperature Min",
        unit: Some("°C"),
        kind: ReadingKind::Temperature,
        extract: |s| bms_num(s, "2000"),
    },
    Reading {
        id: "mosfet_temp",
        name: "MOSFET Temperature",
        unit: Some("°C"),
        kind: ReadingKind::Temperature,
        extract: |s| bms_num(s, "2300"),
    },
    Reading {
        id: "bms_temp_max",
        name: "BMS Temperature Max",
        unit: Some("°C"),
        kind: ReadingKind::Temperature,
        extract: |s| bms_num(s, "2800"),
    },
    Reading {
        id: "bms_temp_min",
        name: "BMS Temperature Min",
        unit: Some("°C"),
        kind: ReadingKind::Temperature,
        extract: |s| bms_num(s, "3000"),
    },
    // ── Current limits ──
    Reading {
        id: "max_charge_current",
        name: "Max Charge Current",
        unit: Some("A"),
        kind: ReadingKind::Current,
        extract: |s| bms_num(s, "3800"),
    },
    Reading {
        id: "max_discharge_current",
        name: "Max Discharge Current",
        unit: Some("A"),
        kind: ReadingKind::Current,
        extract: |s| bms_num(s, "3900"),
    },
    // ── Status flags ──
    Reading {
        id: "charge_enable",
        name: "Charge Enable",
        unit: None,
        kind: ReadingKind::Status,
        extract: |s| flag(s, "4008", "1", "Enabled", "Disabled"),
    },
    Reading {
        id: "discharge_enable",
        name: "Discharge Enable",
        unit: None,
        kind: ReadingKind::Status,
        extract: |s| flag(s, "4007", "1", "Enabled", "Disabled"),
    },
    Reading {
        id: "alarm_status",
        name: "Alarm Status",
        unit: None,
        kind: ReadingKind::Status,
        extract: |s| flag(s, "4100", "0", "OK", "ALARM"),
    },
    Reading {
        id: "communication_status",
        name: "Communication Status",
        unit: None,
        kind: ReadingKind::Info,
        extract: |s| {
            device_text(s, "deviceCommunicationStatus")
                .or(Some(ReadingValue::Text("Unknown".to_owned())))
        },
    },
    Reading {
        id: "firmware_version",
        name: "Firmware Version",
        unit: None,
        kind: ReadingKind::Info,
        extract: |s| device_text(s, "firmwareVersion"),
    },
    Reading {
        id: "signal_strength",
        name: "Signal Strength",
        unit: Some("dBm"),
        kind: ReadingKind::Signal,
        extract: |s| {
            s.dongle_point("800000")
                .and_then(as_f64)
                .map(|v| ReadingValue::Number(round3(v)))
        },
    },
    Reading {
        id: "last_update",
        name: "Last Data Update",
        unit: None,
        kind: ReadingKind::Timestamp,
        extract: |s| device_text(s, "dataUpdateTime"),
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        let mut snap = Snapshot::default();
        snap.power = serde_json::from_value(json!({
            "realTimePower": "120.5",
            "realTimeCurrent": 2.4,
            "soc": "55",
        }))
        .unwrap();
        snap.bms = serde_json::from_value(json!({
            "600": "51.2",
            "1200": "98",
            "1300": "3.412",
            "1500": "3.401",
            "4008": "1",
            "4007": "0",
            "4100": "0",
        }))
        .unwrap();
        snap.device = serde_json::from_value(json!({
            "deviceCommunicationStatus": "Online",
            "firmwareVersion": "1.2.3",
        }))
        .unwrap();
        snap.dongle = serde_json::from_value(json!({ "800000": "-67" })).unwrap();
        snap
    }

    #[test]
    fn registry_ids_are_unique() {
        let mut ids: Vec<_> = registry().iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), registry().len());
    }

    #[test]
    fn numeric_extraction_tolerates_string_encoding() {
        let snap = snapshot();
        assert_eq!(
            lookup("battery_power").unwrap().value(&snap),
            Some(ReadingValue::Number(120.5))
        );
        assert_eq!(
            lookup("battery_current").unwrap().value(&snap),
            Some(ReadingValue::Number(2.4))
        );
        assert_eq!(
            lookup("pack_voltage").unwrap().value(&snap),
            Some(ReadingValue::Number(51.2))
        );
    }

    #[test]
    fn missing_points_are_unavailable() {
        let snap = Snapshot::default();
        assert_eq!(lookup("pack_voltage").unwrap().value(&snap), None);
        assert_eq!(lookup("firmware_version").unwrap().value(&snap), None);
        // Communication status falls back to Unknown rather than absent.
        assert_eq!(
            lookup("communication_status").unwrap().value(&snap),
            Some(ReadingValue::Text("Unknown".to_owned()))
        );
    }

    #[test]
    fn blank_and_null_strings_are_absent() {
        let mut snap = Snapshot::default();
        snap.bms.insert("600".into(), json!(""));
        snap.bms.insert("1200".into(), json!("null"));
        assert_eq!(lookup("pack_voltage").unwrap().value(&snap), None);
        assert_eq!(lookup("battery_soh").unwrap().value(&snap), None);
    }

    #[test]
    fn battery_status_classification() {
        let mut snap = Snapshot::default();
        assert_eq!(
            lookup("battery_status").unwrap().value(&snap),
            Some(ReadingValue::Text("Unknown".to_owned()))
        );

        snap.power.insert("realTimePower".into(), json!(150));
        assert_eq!(
            lookup("battery_status").unwrap().value(&snap),
            Some(ReadingValue::Text("Charging".to_owned()))
        );

        snap.power.insert("realTimePower".into(), json!("-80"));
        assert_eq!(
            lookup("battery_status").unwrap().value(&snap),
            Some(ReadingValue::Text("Discharging".to_owned()))
        );

        snap.power.insert("realTimePower".into(), json!(3));
        assert_eq!(
            lookup("battery_status").unwrap().value(&snap),
            Some(ReadingValue::Text("Standby".to_owned()))
        );
    }

    #[test]
    fn spread_needs_both_cell_voltages() {
        let snap = snapshot();
        assert_eq!(
            lookup("cell_voltage_spread").unwrap().value(&snap),
            Some(ReadingValue::Number(0.011))
        );

        let mut partial = snapshot();
        partial.bms.remove("1500");
        assert_eq!(lookup("cell_voltage_spread").unwrap().value(&partial), None);
    }

    #[test]
    fn enable_flags_and_alarm() {
        let snap = snapshot();
        assert_eq!(
            lookup("charge_enable").unwrap().value(&snap),
            Some(ReadingValue::Text("Enabled".to_owned()))
        );
        assert_eq!(
            lookup("discharge_enable").unwrap().value(&snap),
            Some(ReadingValue::Text("Disabled".to_owned()))
        );
        assert_eq!(
            lookup("alarm_status").unwrap().value(&snap),
            Some(ReadingValue::Text("OK".to_owned()))
        );

        let mut alarming = snapshot();
        alarming.bms.insert("4100".into(), json!("2"));
        assert_eq!(
            lookup("alarm_status").unwrap().value(&alarming),
            Some(ReadingValue::Text("ALARM".to_owned()))
        );
    }

    #[test]
    fn dongle_signal_strength() {
        let snap = snapshot();
        assert_eq!(
            lookup("signal_strength").unwrap().value(&snap),
            Some(ReadingValue::Number(-67.0))
        );
    }

    #[test]
    fn lookup_unknown_id_is_none() {
        assert!(lookup("nonexistent").is_none());
    }
}
