use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::errors::ReshapeError;
use crate::models::{AgeBreakdown, AgeTotals, AlignedRow, AlignedTable, EntitySeries, MetricRecord};

/// Divisor applied to the summed action counts of every hourly row.
// TODO: confirm the divisor with the reporting owners; it is undocumented upstream.
pub const ACTION_NORMALIZATION_DIVISOR: f64 = 3.0;

/// Metrics stored as whole counts; everything else is read as a decimal.
const INTEGRAL_METRICS: &[&str] = &["impressions", "reach", "clicks"];

/// Aligns one metric of several entities on the union of their hourly timestamps.
///
/// Every record must carry `date_start`, the hourly range and `metric`.
/// Returns one series per entity, in input order, each exactly as long as
/// the union; hours an entity did not report are 0.
pub fn extract_hourly_stat(
    entities: &[Vec<MetricRecord>],
    metric: &str,
) -> Result<Vec<EntitySeries>, ReshapeError> {
    let mut observed = Vec::with_capacity(entities.len());
    for (idx, records) in entities.iter().enumerate() {
        let mut by_hour = BTreeMap::new();
        for record in records {
            let ts = record.require_timestamp()?;
            let value = metric_value(record, metric)?;
            insert_unique(&mut by_hour, idx, ts, value)?;
        }
        observed.push(by_hour);
    }

    Ok(align(metric, &observed))
}

/// Aligns hourly action totals of several entities.
///
/// A record's value is the sum of its `actions[].value` divided by
/// [`ACTION_NORMALIZATION_DIVISOR`]. Records without an hourly range are
/// skipped and take no part in the timeline.
pub fn extract_hourly_actions(entities: &[Vec<MetricRecord>]) -> Result<Vec<EntitySeries>, ReshapeError> {
    let mut observed = Vec::with_capacity(entities.len());
    for (idx, records) in entities.iter().enumerate() {
        let mut by_hour = BTreeMap::new();
        for record in records {
            let Some(ts) = record.timestamp()? else {
                continue;
            };
            insert_unique(&mut by_hour, idx, ts, action_total(record)?)?;
        }
        observed.push(by_hour);
    }

    Ok(align("actions", &observed))
}

/// Sum of a record's action counts, normalized.
pub fn action_total(record: &MetricRecord) -> Result<f64, ReshapeError> {
    let mut sum = 0i64;
    for action in record.actions()? {
        let count = action.count()?;
        sum = sum
            .checked_add(count)
            .ok_or_else(|| overflow("actions.value", sum, count))?;
    }
    Ok(sum as f64 / ACTION_NORMALIZATION_DIVISOR)
}

/// Raw hourly rows for every metric of a comparison, one list per entity.
#[derive(Debug, Clone, Default)]
pub struct HourlyInputs {
    pub impressions: Vec<Vec<MetricRecord>>,
    pub actions: Vec<Vec<MetricRecord>>,
    pub spend: Vec<Vec<MetricRecord>>,
    pub ctr: Vec<Vec<MetricRecord>>,
    /// One constant bid per entity, repeated on every row.
    pub bids: Vec<f64>,
}

/// Joins impressions, actions, spend, ctr and the bid into one table per entity.
///
/// Each metric is aligned on its own union of timestamps, so two metrics
/// fetched with different coverage can disagree. The join does not reconcile
/// them: any entity whose metric timelines differ yields
/// [`ReshapeError::IndexMismatch`].
pub fn extract_full_hourly_data(inputs: &HourlyInputs) -> Result<Vec<AlignedTable>, ReshapeError> {
    let expected = inputs.impressions.len();
    check_count("actions", expected, inputs.actions.len())?;
    check_count("spend", expected, inputs.spend.len())?;
    check_count("ctr", expected, inputs.ctr.len())?;
    check_count("bids", expected, inputs.bids.len())?;

    let impressions = extract_hourly_stat(&inputs.impressions, "impressions")?;
    let actions = extract_hourly_actions(&inputs.actions)?;
    let spend = extract_hourly_stat(&inputs.spend, "spend")?;
    let ctr = extract_hourly_stat(&inputs.ctr, "ctr")?;

    let mut tables = Vec::with_capacity(expected);
    for (entity, base) in impressions.iter().enumerate() {
        let others = [
            ("actions", &actions[entity]),
            ("spend", &spend[entity]),
            ("ctr", &ctr[entity]),
        ];
        for (metric, series) in others {
            if series.timestamps != base.timestamps {
                return Err(ReshapeError::IndexMismatch { entity, metric });
            }
        }

        let bid = inputs.bids[entity];
        let rows = base
            .iter()
            .enumerate()
            .map(|(i, (ts, impressions))| AlignedRow {
                timestamp: *ts,
                impressions,
                actions: actions[entity].values[i],
                spend: spend[entity].values[i],
                ctr: ctr[entity].values[i],
                bid,
            })
            .collect();
        tables.push(AlignedTable { rows });
    }

    Ok(tables)
}

/// Sums impressions per `age` bucket for each named entity.
///
/// Records of the same bucket (e.g. several days, or a gender split) add
/// up. Buckets are the sorted union over all entities; an entity that never
/// reported a bucket reads 0 for it.
pub fn aggregate_age_breakdown(
    entities: &[Vec<MetricRecord>],
    names: &[String],
) -> Result<AgeBreakdown, ReshapeError> {
    check_count("names", entities.len(), names.len())?;

    let mut buckets = BTreeSet::new();
    let mut totals = Vec::with_capacity(entities.len());

    for (records, name) in entities.iter().zip(names) {
        let mut impressions_by_age: BTreeMap<String, i64> = BTreeMap::new();
        for record in records {
            let age = record
                .age()
                .ok_or_else(|| ReshapeError::MissingField("age".to_string()))?;
            let impressions = record.integer("impressions")?;
            let total = impressions_by_age.entry(age.to_string()).or_insert(0);
            let current = *total;
            *total = current
                .checked_add(impressions)
                .ok_or_else(|| overflow("impressions", current, impressions))?;
            buckets.insert(age.to_string());
        }
        totals.push(AgeTotals {
            name: name.clone(),
            impressions_by_age,
        });
    }

    Ok(AgeBreakdown {
        buckets: buckets.into_iter().collect(),
        entities: totals,
    })
}

fn metric_value(record: &MetricRecord, metric: &str) -> Result<f64, ReshapeError> {
    if INTEGRAL_METRICS.contains(&metric) {
        record.integer(metric).map(|v| v as f64)
    } else {
        record.number(metric)
    }
}

fn overflow(field: &str, sum: i64, addend: i64) -> ReshapeError {
    ReshapeError::NonNumeric {
        field: field.to_string(),
        value: format!("{} + {} overflows", sum, addend),
    }
}

fn insert_unique(
    by_hour: &mut BTreeMap<NaiveDateTime, f64>,
    entity: usize,
    timestamp: NaiveDateTime,
    value: f64,
) -> Result<(), ReshapeError> {
    if by_hour.insert(timestamp, value).is_some() {
        return Err(ReshapeError::DuplicateTimestamp { entity, timestamp });
    }
    Ok(())
}

fn align(metric: &str, observed: &[BTreeMap<NaiveDateTime, f64>]) -> Vec<EntitySeries> {
    let timeline: Vec<NaiveDateTime> = observed
        .iter()
        .flat_map(|by_hour| by_hour.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    observed
        .iter()
        .map(|by_hour| EntitySeries::reindexed(metric, by_hour, &timeline))
        .collect()
}

fn check_count(input: &'static str, expected: usize, actual: usize) -> Result<(), ReshapeError> {
    if expected != actual {
        return Err(ReshapeError::EntityCountMismatch {
            input,
            expected,
            actual,
        });
    }
    Ok(())
}
