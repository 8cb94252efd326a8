//! Declarative record filters and two-group comparison partitioning.
//!
//! A [`FilterGroup`] is a named, colored list of `{field, operator, value}`
//! predicates that are ANDed together. Predicates mirror an interactive filter
//! editor: a half-filled row (no field, no operator, or no value for an
//! operator that needs one) is inactive and matches everything.

use serde::{Deserialize, Serialize};

use crate::models::{MeasurementRow, SystemEfficiency, SystemProfile};

/// A field value as seen by the filter evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Text form used by the string operators.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Numeric form used by the comparison operators.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(f64::from(n))
    }
}

/// Filter operators. Serialized with the names the filter editor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "equals")]
    Equals,
    /// Same as `Equals`; offered for enumerated fields.
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "isEmpty")]
    IsEmpty,
    #[serde(rename = "isNotEmpty")]
    IsNotEmpty,
}

impl FilterOperator {
    /// Whether the operator compares against a predicate value.
    pub fn requires_value(&self) -> bool {
        !matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    /// Parse the editor's operator name.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "contains" => FilterOperator::Contains,
            "equals" => FilterOperator::Equals,
            "is" => FilterOperator::Is,
            "startsWith" => FilterOperator::StartsWith,
            "endsWith" => FilterOperator::EndsWith,
            ">" => FilterOperator::GreaterThan,
            ">=" => FilterOperator::GreaterOrEqual,
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessOrEqual,
            "isEmpty" => FilterOperator::IsEmpty,
            "isNotEmpty" => FilterOperator::IsNotEmpty,
            _ => return None,
        };
        Some(op)
    }
}

/// One `{field, operator, value}` filter row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub operator: Option<FilterOperator>,
    pub value: Option<FieldValue>,
}

impl FilterPredicate {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: Option<FieldValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value,
        }
    }

    /// Incomplete predicates are ignored rather than matching nothing.
    pub fn is_active(&self) -> bool {
        let Some(operator) = self.operator else {
            return false;
        };
        if self.field.trim().is_empty() {
            return false;
        }
        if !operator.requires_value() {
            return true;
        }
        matches!(&self.value, Some(value) if !value.is_empty())
    }

    /// Evaluate against the resolved field value of a record.
    ///
    /// Inactive predicates match. A missing field value only satisfies
    /// `isEmpty`.
    pub fn matches(&self, actual: Option<&FieldValue>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(operator) = self.operator else {
            return true;
        };

        let actual_is_empty = actual.map_or(true, FieldValue::is_empty);
        match operator {
            FilterOperator::IsEmpty => return actual_is_empty,
            FilterOperator::IsNotEmpty => return !actual_is_empty,
            _ => {}
        }

        let (Some(actual), Some(expected)) = (actual, self.value.as_ref()) else {
            return false;
        };

        match operator {
            FilterOperator::Contains
            | FilterOperator::Equals
            | FilterOperator::Is
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith => {
                let haystack = actual.as_text().to_lowercase();
                let needle = expected.as_text().to_lowercase();
                match operator {
                    FilterOperator::Contains => haystack.contains(&needle),
                    FilterOperator::StartsWith => haystack.starts_with(&needle),
                    FilterOperator::EndsWith => haystack.ends_with(&needle),
                    _ => haystack == needle,
                }
            }
            FilterOperator::GreaterThan
            | FilterOperator::GreaterOrEqual
            | FilterOperator::LessThan
            | FilterOperator::LessOrEqual => {
                let (Some(a), Some(b)) = (actual.as_number(), expected.as_number()) else {
                    return false;
                };
                match operator {
                    FilterOperator::GreaterThan => a > b,
                    FilterOperator::GreaterOrEqual => a >= b,
                    FilterOperator::LessThan => a < b,
                    _ => a <= b,
                }
            }
            FilterOperator::IsEmpty | FilterOperator::IsNotEmpty => false,
        }
    }
}

/// Named, colored set of ANDed predicates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub filters: Vec<FilterPredicate>,
}

impl FilterGroup {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, predicate: FilterPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn active_filters(&self) -> impl Iterator<Item = &FilterPredicate> {
        self.filters.iter().filter(|f| f.is_active())
    }

    /// True when every active predicate matches the record.
    pub fn matches_with<R, F>(&self, record: &R, resolver: &F) -> bool
    where
        F: Fn(&R, &str) -> Option<FieldValue>,
    {
        self.active_filters()
            .all(|predicate| predicate.matches(resolver(record, &predicate.field).as_ref()))
    }
}

/// Records whose fields can be looked up by name.
pub trait FilterableRecord {
    fn field_value(&self, field: &str) -> Option<FieldValue>;
}

/// Lower-cases and strips separators so `heatingId`, `heating_id` and
/// `Heating-ID` resolve to the same field.
fn normalize_field_name(field: &str) -> String {
    field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn text(value: &Option<String>) -> Option<FieldValue> {
    value.as_ref().map(|s| FieldValue::Text(s.clone()))
}

fn number(value: Option<f64>) -> Option<FieldValue> {
    value.map(FieldValue::Number)
}

impl FilterableRecord for MeasurementRow {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match normalize_field_name(field).as_str() {
            "heatingid" => Some(FieldValue::Text(self.heating_id.clone())),
            "thermalenergykwh" => number(self.thermal_energy_kwh),
            "electricalenergykwh" => number(self.electrical_energy_kwh),
            "thermalenergyheatingkwh" => number(self.thermal_energy_heating_kwh),
            "electricalenergyheatingkwh" => number(self.electrical_energy_heating_kwh),
            "outdoortemperature" | "outdoortemperaturec" => number(self.outdoor_temperature_c),
            "flowtemperature" | "flowtemperaturec" => number(self.flow_temperature_c),
            "timestamp" => self.timestamp.map(|ts| FieldValue::Text(ts.to_rfc3339())),
            _ => None,
        }
    }
}

impl FilterableRecord for SystemEfficiency {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match normalize_field_name(field).as_str() {
            "heatingid" => Some(FieldValue::Text(self.heating_id.clone())),
            "az" => number(self.az),
            "azheating" => number(self.az_heating),
            "thermalenergytotalkwh" => number(Some(self.thermal_energy_total_kwh)),
            "electricalenergytotalkwh" => number(Some(self.electrical_energy_total_kwh)),
            "thermalenergyheatingtotalkwh" => number(Some(self.thermal_energy_heating_total_kwh)),
            "electricalenergyheatingtotalkwh" => {
                number(Some(self.electrical_energy_heating_total_kwh))
            }
            _ => None,
        }
    }
}

impl FilterableRecord for SystemProfile {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match normalize_field_name(field).as_str() {
            "heatingid" => Some(FieldValue::Text(self.heating_id.clone())),
            "manufacturer" => text(&self.manufacturer),
            "model" => text(&self.model),
            "heatpumptype" => text(&self.heat_pump_type),
            "buildingtype" => text(&self.building_type),
            "constructionyear" => self.construction_year.map(FieldValue::from),
            "heatedarea" | "heatedaream2" => number(self.heated_area_m2),
            "heatingload" | "heatingloadkw" => number(self.heating_load_kw),
            "postalcode" => text(&self.postal_code),
            "country" => text(&self.country),
            _ => None,
        }
    }
}

/// Keep the records matching every active predicate of `group`.
pub fn apply_filters_to_data<R>(rows: &[R], group: &FilterGroup) -> Vec<R>
where
    R: FilterableRecord + Clone,
{
    apply_filters_with_resolver(rows, group, |row: &R, field: &str| row.field_value(field))
}

/// Same as [`apply_filters_to_data`] with a caller-supplied field resolver,
/// so computed fields that are not stored on the record filter the same way.
pub fn apply_filters_with_resolver<R, F>(rows: &[R], group: &FilterGroup, resolver: F) -> Vec<R>
where
    R: Clone,
    F: Fn(&R, &str) -> Option<FieldValue>,
{
    let active = group.active_filters().count();
    let filtered: Vec<R> = rows
        .iter()
        .filter(|row| group.matches_with(*row, &resolver))
        .cloned()
        .collect();

    log::debug!(
        "Filter group '{}' ({} active predicates) matched {} of {} records",
        group.name,
        active,
        filtered.len(),
        rows.len()
    );
    filtered
}

/// Records that matched one comparison group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSubset<R> {
    pub name: String,
    pub color: String,
    pub rows: Vec<R>,
}

/// Exactly two comparison groups, charted side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonGroups {
    pub primary: FilterGroup,
    pub secondary: FilterGroup,
}

impl ComparisonGroups {
    pub fn new(primary: FilterGroup, secondary: FilterGroup) -> Self {
        Self { primary, secondary }
    }

    pub fn groups(&self) -> [&FilterGroup; 2] {
        [&self.primary, &self.secondary]
    }

    /// Filter `rows` independently through both groups.
    ///
    /// The subsets may overlap: a record matching both groups appears in both.
    pub fn partition<R>(&self, rows: &[R]) -> [GroupSubset<R>; 2]
    where
        R: FilterableRecord + Clone,
    {
        self.partition_with(rows, |row: &R, field: &str| row.field_value(field))
    }

    pub fn partition_with<R, F>(&self, rows: &[R], resolver: F) -> [GroupSubset<R>; 2]
    where
        R: Clone,
        F: Fn(&R, &str) -> Option<FieldValue>,
    {
        self.groups().map(|group| GroupSubset {
            name: group.name.clone(),
            color: group.color.clone(),
            rows: apply_filters_with_resolver(rows, group, &resolver),
        })
    }
}

/// Free-function form of [`ComparisonGroups::partition`].
pub fn partition_into_groups<R>(rows: &[R], groups: &ComparisonGroups) -> [GroupSubset<R>; 2]
where
    R: FilterableRecord + Clone,
{
    groups.partition(rows)
}
