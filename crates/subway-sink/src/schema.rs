//! The raw ridership table as downstream consumers read it.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Columns the cleaning step looks up by name.
pub const RAW_COLUMNS: [&str; 6] = [
    "USE_YMD",
    "SBWY_ROUT_LN_NM",
    "SBWY_STNS_NM",
    "GTON_TNOPE",
    "GTOFF_TNOPE",
    "REG_YMD",
];

/// One station's card-tap totals for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRidership {
    /// Day of travel.
    pub date: NaiveDate,

    /// Line name (e.g. "2호선").
    pub line: String,

    /// Station name.
    pub station: String,

    /// Boardings.
    pub ride: u64,

    /// Alightings.
    pub getoff: u64,

    /// Day the figures were published, when present.
    pub registered_at: Option<NaiveDate>,
}

/// Raw CSV record for deserialization.
/// Maps directly to the CSV columns.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRidershipRecord {
    #[serde(rename = "USE_YMD")]
    pub use_ymd: String,
    #[serde(rename = "SBWY_ROUT_LN_NM")]
    pub line: String,
    #[serde(rename = "SBWY_STNS_NM")]
    pub station: String,
    #[serde(rename = "GTON_TNOPE", deserialize_with = "deserialize_count")]
    pub ride: u64,
    #[serde(rename = "GTOFF_TNOPE", deserialize_with = "deserialize_count")]
    pub getoff: u64,
    #[serde(rename = "REG_YMD", default)]
    pub reg_ymd: String,
}

impl TryFrom<RawRidershipRecord> for RawRidership {
    type Error = String;

    fn try_from(record: RawRidershipRecord) -> Result<Self, Self::Error> {
        let date = parse_ymd(&record.use_ymd)
            .ok_or_else(|| format!("invalid USE_YMD: {}", record.use_ymd))?;
        let registered_at = if record.reg_ymd.trim().is_empty() {
            None
        } else {
            Some(
                parse_ymd(&record.reg_ymd)
                    .ok_or_else(|| format!("invalid REG_YMD: {}", record.reg_ymd))?,
            )
        };

        Ok(RawRidership {
            date,
            line: record.line,
            station: record.station,
            ride: record.ride,
            getoff: record.getoff,
            registered_at,
        })
    }
}

fn parse_ymd(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d").ok()
}

/// Counts may arrive as `1234` or, after a float round trip, `1234.0`.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(serde::de::Error::custom(format!("invalid count: {}", s))),
    }
}
