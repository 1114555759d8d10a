// Dyness API endpoint methods
//
// One method per documented route, all POST with a `deviceSn` body.
// Payload shapes vary per endpoint, so `storage_detail` returns a raw
// map and the realtime route returns typed point records.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::DynessClient;
use crate::error::Error;
use crate::models::PointRecord;

/// Device detail by BMS serial.
pub const PATH_STORAGE_DETAIL: &str = "/v1/device/household/storage/detail";
/// Power/SOC history by BMS serial.
pub const PATH_LATEST_POWER: &str = "/v1/device/getLastPowerDataBySn";
/// Real-time point data by serial (BMS or dongle).
pub const PATH_REALTIME_DATA: &str = "/v1/device/realTime/data";

impl DynessClient {
    /// Fetch household-storage device detail (model, firmware,
    /// communication status, ...).
    ///
    /// `POST /v1/device/household/storage/detail`
    pub async fn storage_detail(&self, device_sn: &str) -> Result<Map<String, Value>, Error> {
        debug!(device_sn, "fetching storage detail");
        let envelope = self
            .call(PATH_STORAGE_DETAIL, &json!({ "deviceSn": device_sn }))
            .await?;
        match envelope.data {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Fetch the recent power/SOC history records.
    ///
    /// `POST /v1/device/getLastPowerDataBySn`
    ///
    /// Returns the raw record list; entries may carry a null
    /// `realTimePower` when the device had no usable sample.
    pub async fn latest_power(&self, device_sn: &str) -> Result<Vec<Value>, Error> {
        debug!(device_sn, "fetching latest power data");
        let envelope = self
            .call(PATH_LATEST_POWER, &json!({ "deviceSn": device_sn }))
            .await?;
        match envelope.data {
            Value::Array(records) => Ok(records),
            _ => Ok(Vec::new()),
        }
    }

    /// Fetch real-time telemetry points for a serial (works for both
    /// BMS and dongle serials).
    ///
    /// `POST /v1/device/realTime/data`
    pub async fn realtime_points(&self, device_sn: &str) -> Result<Vec<PointRecord>, Error> {
        debug!(device_sn, "fetching realtime points");
        let envelope = self
            .call(PATH_REALTIME_DATA, &json!({ "deviceSn": device_sn }))
            .await?;
        match envelope.data {
            Value::Array(records) => records
                .into_iter()
                .map(|r| {
                    serde_json::from_value(r).map_err(|e| Error::Json {
                        path: PATH_REALTIME_DATA.to_owned(),
                        message: format!("bad point record: {e}"),
                    })
                })
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}
