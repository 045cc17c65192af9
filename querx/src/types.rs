use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{QuerxError, Result};

/// Catalog position of the temperature sensor on TH models.
pub const TH_SENSOR_TEMPERATURE: usize = 0;
/// Catalog position of the humidity sensor on TH models.
pub const TH_SENSOR_HUMIDITY: usize = 1;
/// Catalog position of the dew point sensor on TH models.
pub const TH_SENSOR_DEW_POINT: usize = 2;

/// Decoded "current values" document of a device.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentDocument {
    #[serde(default)]
    pub version: String,
    pub hostname: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default, deserialize_with = "zero_if_blank")]
    pub port: u16,
    #[serde(default)]
    pub date_gmt: String,
    #[serde(default)]
    pub date_local: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub location: String,
    pub sensors: SensorCatalog,
    pub data: RecordSet,
}

impl CurrentDocument {
    /// Decode the XML body returned by the current values endpoint.
    ///
    /// The root element name is not checked and unknown elements are
    /// skipped. `hostname`, `sensors` and `data` must be present, so a
    /// login or error page served in place of the document fails here.
    ///
    /// Bodies must be UTF-8 unless the XML declaration names ISO-8859-1.
    pub fn from_xml(body: &[u8]) -> Result<Self> {
        let text = decode_text(body)?;
        let document = quick_xml::de::from_str(&text)?;
        Ok(document)
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors.sensors
    }

    pub fn records(&self) -> &[Record] {
        &self.data.records
    }

    pub fn sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensors().iter().find(|s| s.id == id)
    }

    /// Record the device lists first, which holds the current readings.
    pub fn first_record(&self) -> Option<&Record> {
        self.records().first()
    }
}

fn decode_text(body: &[u8]) -> Result<Cow<'_, str>> {
    match std::str::from_utf8(body) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        // ISO-8859-1 bytes are the first 256 code points
        Err(_) if declares_latin1(body) => Ok(Cow::Owned(body.iter().map(|&b| char::from(b)).collect())),
        Err(e) => Err(QuerxError::Decode(de::Error::custom(format!(
            "document is not valid UTF-8: {}",
            e
        )))),
    }
}

fn declares_latin1(body: &[u8]) -> bool {
    let Some(end) = body.windows(2).position(|w| w == b"?>") else {
        return false;
    };
    let declaration = String::from_utf8_lossy(&body[..end]).to_ascii_lowercase();
    if !declaration.trim_start().starts_with("<?xml") {
        return false;
    }
    ["iso-8859-1", "iso8859-1", "latin1", "latin-1"].iter().any(|name| {
        declaration.contains(&format!("encoding=\"{}\"", name))
            || declaration.contains(&format!("encoding='{}'", name))
    })
}

/// Empty or blank numeric content reads as zero, as the device firmware
/// leaves unset limits and ports empty.
fn zero_if_blank<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(T::default());
    }
    raw.parse().map_err(de::Error::custom)
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SensorCatalog {
    #[serde(rename = "sensor", default)]
    pub sensors: Vec<Sensor>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sensor {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@unit", default)]
    pub unit: String,
    #[serde(rename = "@status", default, deserialize_with = "zero_if_blank")]
    pub status: u32,
    #[serde(rename = "@uplim", default, deserialize_with = "zero_if_blank")]
    pub upper_limit: f64,
    #[serde(rename = "@lolim", default, deserialize_with = "zero_if_blank")]
    pub lower_limit: f64,
}

impl Sensor {
    /// Conditions asserted in the low four status bits, bit 0 first.
    pub fn alerts(&self) -> Vec<Alert> {
        Alert::ALL
            .into_iter()
            .filter(|alert| self.status & alert.mask() != 0)
            .collect()
    }

    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts().iter().map(ToString::to_string).collect()
    }
}

/// One alarm condition signalled through a sensor's status bitmask.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    UpperLimitExceeded,
    LowerLimitUndershot,
    SensorFault,
    SensorDisconnected,
}

impl Alert {
    /// Every condition, ordered by status bit.
    pub const ALL: [Alert; 4] = [
        Alert::UpperLimitExceeded,
        Alert::LowerLimitUndershot,
        Alert::SensorFault,
        Alert::SensorDisconnected,
    ];

    pub fn bit(self) -> u32 {
        match self {
            Alert::UpperLimitExceeded => 0,
            Alert::LowerLimitUndershot => 1,
            Alert::SensorFault => 2,
            Alert::SensorDisconnected => 3,
        }
    }

    fn mask(self) -> u32 {
        1 << self.bit()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Alert::UpperLimitExceeded => "upper alarm limit exceeded",
            Alert::LowerLimitUndershot => "lower alarm limit undershot",
            Alert::SensorFault => "sensor fault",
            Alert::SensorDisconnected => "sensor disconnected",
        };
        f.write_str(text)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    #[serde(rename = "record", default)]
    pub records: Vec<Record>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    /// Raw UNIX timestamp as sent by the device.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "datetime", default)]
    pub time: String,
    #[serde(rename = "entry", default)]
    pub entries: Vec<Entry>,
}

impl Record {
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.trim().parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    pub fn entry(&self, sensor_id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.sensor_id == sensor_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    #[serde(rename = "@sensorid")]
    pub sensor_id: String,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: f64,
    #[serde(rename = "@trend", default, deserialize_with = "zero_if_blank")]
    pub trend: f64,
}
