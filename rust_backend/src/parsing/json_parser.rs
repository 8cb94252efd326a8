use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::models::MeasurementRow;

/// Custom deserializer that accepts either string or integer for the heating system ID
fn deserialize_heating_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => Ok(s),
        StringOrInt::Int(i) => Ok(i.to_string()),
    }
}

/// Accepts a number, a numeric string, an empty string or null.
fn deserialize_optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s))),
    }
}

/// Raw JSON structure of one measurement row, snake_case or camelCase keys
#[derive(Debug, Deserialize)]
struct RawMeasurementRow {
    #[serde(alias = "heatingId", deserialize_with = "deserialize_heating_id")]
    heating_id: String,
    #[serde(
        default,
        alias = "thermalEnergyKwh",
        deserialize_with = "deserialize_optional_number"
    )]
    thermal_energy_kwh: Option<f64>,
    #[serde(
        default,
        alias = "electricalEnergyKwh",
        deserialize_with = "deserialize_optional_number"
    )]
    electrical_energy_kwh: Option<f64>,
    #[serde(
        default,
        alias = "thermalEnergyHeatingKwh",
        deserialize_with = "deserialize_optional_number"
    )]
    thermal_energy_heating_kwh: Option<f64>,
    #[serde(
        default,
        alias = "electricalEnergyHeatingKwh",
        deserialize_with = "deserialize_optional_number"
    )]
    electrical_energy_heating_kwh: Option<f64>,
    #[serde(
        default,
        alias = "outdoorTemperatureC",
        alias = "outdoor_temperature",
        alias = "outdoorTemperature",
        deserialize_with = "deserialize_optional_number"
    )]
    outdoor_temperature_c: Option<f64>,
    #[serde(
        default,
        alias = "flowTemperatureC",
        alias = "flow_temperature",
        alias = "flowTemperature",
        deserialize_with = "deserialize_optional_number"
    )]
    flow_temperature_c: Option<f64>,
    #[serde(default, alias = "time")]
    timestamp: Option<DateTime<Utc>>,
}

impl From<RawMeasurementRow> for MeasurementRow {
    fn from(raw: RawMeasurementRow) -> Self {
        MeasurementRow {
            heating_id: raw.heating_id,
            thermal_energy_kwh: raw.thermal_energy_kwh,
            electrical_energy_kwh: raw.electrical_energy_kwh,
            thermal_energy_heating_kwh: raw.thermal_energy_heating_kwh,
            electrical_energy_heating_kwh: raw.electrical_energy_heating_kwh,
            outdoor_temperature_c: raw.outdoor_temperature_c,
            flow_temperature_c: raw.flow_temperature_c,
            timestamp: raw.timestamp,
        }
    }
}

/// Parse a JSON file of measurement rows
pub fn parse_measurement_rows_json(json_path: &Path) -> Result<Vec<MeasurementRow>> {
    let json_content = std::fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read JSON file: {}", json_path.display()))?;

    parse_measurement_rows_json_str(&json_content)
        .with_context(|| format!("Failed to parse measurement rows from {}", json_path.display()))
}

/// Parse measurement rows from a string.
///
/// Accepts a bare array of rows or an object holding the array under `rows`
/// or `data`.
pub fn parse_measurement_rows_json_str(json_str: &str) -> Result<Vec<MeasurementRow>> {
    let json_value: serde_json::Value = serde_json::from_str(json_str).with_context(|| {
        let preview: String = json_str.chars().take(200).collect();
        format!("Invalid JSON syntax. First 200 chars: {}", preview)
    })?;

    let rows = match &json_value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(map) => match map.get("rows").or_else(|| map.get("data")) {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => anyhow::bail!(
                "JSON object must contain a 'rows' or 'data' array. Found keys: {:?}",
                map.keys().collect::<Vec<_>>()
            ),
        },
        other => anyhow::bail!("Expected a JSON array of rows, found {}", type_name(other)),
    };

    let parsed = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            RawMeasurementRow::deserialize(row)
                .map(MeasurementRow::from)
                .with_context(|| format!("Invalid measurement row at index {}", idx))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Parsed {} measurement rows", parsed.len());
    Ok(parsed)
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
