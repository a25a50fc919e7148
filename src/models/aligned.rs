use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

/// One metric for one entity on an explicit, sorted timeline.
///
/// `timestamps` and `values` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySeries {
    pub metric: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl EntitySeries {
    /// Reindexes `observed` onto `timeline`, writing 0 wherever the entity
    /// has no observation. Observations outside the timeline are dropped.
    pub fn reindexed(
        metric: impl Into<String>,
        observed: &BTreeMap<NaiveDateTime, f64>,
        timeline: &[NaiveDateTime],
    ) -> Self {
        let values = timeline
            .iter()
            .map(|ts| observed.get(ts).copied().unwrap_or(0.0))
            .collect();

        Self {
            metric: metric.into(),
            timestamps: timeline.to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn value_at(&self, ts: &NaiveDateTime) -> Option<f64> {
        self.timestamps
            .binary_search(ts)
            .ok()
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, f64)> + '_ {
        self.timestamps.iter().zip(self.values.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub impressions: f64,
    pub actions: f64,
    pub spend: f64,
    pub ctr: f64,
    pub bid: f64,
}

/// Every hourly metric of one entity joined on the shared timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTable {
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Impressions per age bucket for a set of named entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBreakdown {
    /// Sorted union of every bucket seen in any entity.
    pub buckets: Vec<String>,
    pub entities: Vec<AgeTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeTotals {
    pub name: String,
    pub impressions_by_age: BTreeMap<String, i64>,
}

impl AgeBreakdown {
    /// Bucket total for one entity; buckets the entity never reported read as 0.
    pub fn value(&self, entity: usize, bucket: &str) -> i64 {
        self.entities
            .get(entity)
            .and_then(|e| e.impressions_by_age.get(bucket).copied())
            .unwrap_or(0)
    }

    /// Bar heights for one entity in bucket order.
    pub fn bars(&self, entity: usize) -> Vec<i64> {
        self.buckets
            .iter()
            .map(|bucket| self.value(entity, bucket))
            .collect()
    }
}

pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reindex_fills_gaps_with_zero() {
        let observed = BTreeMap::from([(hour(8), 5.0), (hour(10), 7.0)]);
        let series = EntitySeries::reindexed("impressions", &observed, &[hour(8), hour(9), hour(10)]);

        assert_eq!(series.values, vec![5.0, 0.0, 7.0]);
        assert_eq!(series.value_at(&hour(9)), Some(0.0));
        assert_eq!(series.value_at(&hour(11)), None);
        assert_eq!(series.total(), 12.0);
    }

    #[test]
    fn test_reindex_on_empty_observations_is_all_zero() {
        let series = EntitySeries::reindexed("spend", &BTreeMap::new(), &[hour(1), hour(2)]);
        assert_eq!(series.values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_age_breakdown_defaults_missing_bucket_to_zero() {
        let breakdown = AgeBreakdown {
            buckets: vec!["18-24".to_string(), "25-34".to_string()],
            entities: vec![AgeTotals {
                name: "A".to_string(),
                impressions_by_age: BTreeMap::from([("25-34".to_string(), 15)]),
            }],
        };
        assert_eq!(breakdown.bars(0), vec![0, 15]);
        assert_eq!(breakdown.value(3, "25-34"), 0);
    }
}
