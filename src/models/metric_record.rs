use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ReshapeError;

pub const HOURLY_RANGE_FIELD: &str = "hourly_stats_aggregated_by_advertiser_time_zone";

/// One insights row as returned by the Graph API.
///
/// The set of fields depends on the request (`fields`, `breakdowns`), so the
/// row is kept as a raw JSON object and read through typed accessors.
/// Numeric metrics arrive as strings (`"impressions": "125"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricRecord(pub Map<String, Value>);

impl MetricRecord {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn date_start(&self) -> Option<&str> {
        self.str_field("date_start")
    }

    pub fn hourly_range(&self) -> Option<&str> {
        self.str_field(HOURLY_RANGE_FIELD)
    }

    pub fn age(&self) -> Option<&str> {
        self.str_field("age")
    }

    /// Alignment key: `date_start` plus the start of the hourly range.
    ///
    /// Returns `Ok(None)` when the record carries no hourly range.
    pub fn timestamp(&self) -> Result<Option<NaiveDateTime>, ReshapeError> {
        let Some(range) = self.hourly_range() else {
            return Ok(None);
        };
        let date = self
            .date_start()
            .ok_or_else(|| ReshapeError::MissingField("date_start".to_string()))?;
        parse_hourly_timestamp(date, range).map(Some)
    }

    /// Like [`timestamp`](Self::timestamp) but a missing hourly range is an error.
    pub fn require_timestamp(&self) -> Result<NaiveDateTime, ReshapeError> {
        self.timestamp()?
            .ok_or_else(|| ReshapeError::MissingField(HOURLY_RANGE_FIELD.to_string()))
    }

    /// Numeric value of `field`, accepting both JSON numbers and numeric strings.
    pub fn number(&self, field: &str) -> Result<f64, ReshapeError> {
        let value = self
            .0
            .get(field)
            .ok_or_else(|| ReshapeError::MissingField(field.to_string()))?;
        value_as_f64(field, value)
    }

    /// Integral value of `field`; `"12.5"` is rejected rather than truncated.
    pub fn integer(&self, field: &str) -> Result<i64, ReshapeError> {
        let value = self
            .0
            .get(field)
            .ok_or_else(|| ReshapeError::MissingField(field.to_string()))?;
        value_as_i64(field, value)
    }

    /// Parsed `actions` list; a record without one has no actions.
    pub fn actions(&self) -> Result<Vec<ActionValue>, ReshapeError> {
        match self.0.get("actions") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                ReshapeError::NonNumeric {
                    field: "actions".to_string(),
                    value: value.to_string(),
                }
            }),
        }
    }
}

/// One `{action_type, value}` entry of a record's `actions` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionValue {
    #[serde(default)]
    pub action_type: String,
    pub value: Value,
}

impl ActionValue {
    pub fn count(&self) -> Result<i64, ReshapeError> {
        value_as_i64("actions.value", &self.value)
    }
}

/// Joins `"2024-10-01"` and `"08:00:00 - 08:59:59"` into `2024-10-01T08:00:00`.
pub fn parse_hourly_timestamp(date: &str, range: &str) -> Result<NaiveDateTime, ReshapeError> {
    let bad = || ReshapeError::BadTimestamp(format!("{} {}", date, range));

    let start = range.split(" - ").next().unwrap_or(range).trim();
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| bad())?;
    let time = NaiveTime::parse_from_str(start, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(start, "%H:%M"))
        .map_err(|_| bad())?;

    Ok(day.and_time(time))
}

fn value_as_f64(field: &str, value: &Value) -> Result<f64, ReshapeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReshapeError::NonNumeric {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn value_as_i64(field: &str, value: &Value) -> Result<i64, ReshapeError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ReshapeError::NonNumeric {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> MetricRecord {
        MetricRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_timestamp_uses_start_of_hourly_range() {
        let r = record(json!({
            "date_start": "2024-10-01",
            HOURLY_RANGE_FIELD: "08:00:00 - 08:59:59",
        }));
        let ts = r.timestamp().unwrap().unwrap();
        assert_eq!(ts.to_string(), "2024-10-01 08:00:00");
    }

    #[test]
    fn test_timestamp_accepts_minutes_only() {
        let ts = parse_hourly_timestamp("2024-10-01", "14:00 - 15:00").unwrap();
        assert_eq!(ts.to_string(), "2024-10-01 14:00:00");
    }

    #[test]
    fn test_timestamp_absent_without_hourly_range() {
        let r = record(json!({ "date_start": "2024-10-01", "impressions": "3" }));
        assert_eq!(r.timestamp().unwrap(), None);
        assert_eq!(
            r.require_timestamp(),
            Err(ReshapeError::MissingField(HOURLY_RANGE_FIELD.to_string()))
        );
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        assert!(matches!(
            parse_hourly_timestamp("yesterday", "08:00:00 - 08:59:59"),
            Err(ReshapeError::BadTimestamp(_))
        ));
    }

    #[test]
    fn test_number_accepts_strings_and_numbers() {
        let r = record(json!({ "spend": "1.25", "ctr": 0.5 }));
        assert_eq!(r.number("spend").unwrap(), 1.25);
        assert_eq!(r.number("ctr").unwrap(), 0.5);
    }

    #[test]
    fn test_non_numeric_metric_is_an_error() {
        let r = record(json!({ "impressions": "many" }));
        assert!(matches!(
            r.number("impressions"),
            Err(ReshapeError::NonNumeric { .. })
        ));
        assert_eq!(
            r.number("spend"),
            Err(ReshapeError::MissingField("spend".to_string()))
        );
    }

    #[test]
    fn test_integer_rejects_fractions() {
        let r = record(json!({ "impressions": "12.5" }));
        assert!(r.integer("impressions").is_err());
    }

    #[test]
    fn test_actions_default_to_empty() {
        let r = record(json!({ "date_start": "2024-10-01" }));
        assert!(r.actions().unwrap().is_empty());

        let r = record(json!({
            "actions": [
                { "action_type": "link_click", "value": "3" },
                { "action_type": "post_engagement", "value": 6 }
            ]
        }));
        let counts: Vec<i64> = r.actions().unwrap().iter().map(|a| a.count().unwrap()).collect();
        assert_eq!(counts, vec![3, 6]);
    }
}
