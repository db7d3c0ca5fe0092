//! Typed view of the `GetArchiveData.cgi` response.
//!
//! The response is first read into [`serde_json::Value`] so that it can be logged when
//! anything goes wrong, and only then deserialized into these structures.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Only the head, so that the status can be checked before the body is touched.
#[derive(Deserialize)]
pub struct Envelope {
    #[serde(rename = "Head")]
    pub head: Option<Head>,
}

#[derive(Deserialize)]
pub struct Head {
    #[serde(rename = "Status")]
    pub status: Option<Status>,
}

#[derive(Deserialize)]
pub struct Status {
    /// Zero means success.
    #[serde(rename = "Code")]
    pub code: i64,

    #[serde(rename = "Reason", default)]
    pub reason: String,

    #[serde(rename = "UserMessage", default)]
    pub user_message: String,
}

#[derive(Deserialize)]
pub struct ArchiveResponse {
    #[serde(rename = "Body")]
    pub body: Body,
}

#[derive(Deserialize)]
pub struct Body {
    #[serde(rename = "Data")]
    pub data: DeviceData,
}

#[derive(Deserialize)]
pub struct DeviceData {
    #[serde(rename = "inverter/1")]
    pub inverter: Device,
}

#[derive(Deserialize)]
pub struct Device {
    #[serde(rename = "Data")]
    pub channels: Channels,
}

#[derive(Deserialize)]
pub struct Channels {
    #[serde(rename = "EnergyReal_WAC_Sum_Produced")]
    pub energy_produced: Channel,
}

#[derive(Deserialize)]
pub struct Channel {
    /// Offset in seconds since the requested start date to the energy produced on that day.
    ///
    /// Kept raw: the inverter sends `null` for the days it has no data for, and every
    /// unusable entry gets logged individually while parsing.
    #[serde(rename = "Values")]
    pub values: BTreeMap<String, serde_json::Value>,
}
