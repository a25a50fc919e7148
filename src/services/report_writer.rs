use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::errors::ReportError;
use crate::models::{timestamp_format, AgeBreakdown, AlignedTable, EntitySeries};

/// Writes one aligned table as `timestamp,impressions,actions,spend,ctr,bid`.
pub fn write_aligned_table<W: Write>(writer: W, table: &AlignedTable) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if table.rows.is_empty() {
        wtr.write_record(["timestamp", "impressions", "actions", "spend", "ctr", "bid"])?;
    }
    for row in &table.rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_aligned_table_file(path: &Path, table: &AlignedTable) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_aligned_table(file, table)
}

/// Side-by-side series, one column per legend: the data behind an hourly
/// comparison line chart.
pub fn write_comparison<W: Write>(
    writer: W,
    legends: &[String],
    series: &[EntitySeries],
) -> Result<(), ReportError> {
    if legends.len() != series.len() {
        return Err(ReportError::LegendCount {
            legends: legends.len(),
            series: series.len(),
        });
    }
    if let Some(first) = series.first() {
        if series.iter().any(|s| s.timestamps != first.timestamps) {
            return Err(ReportError::Misaligned);
        }
    }

    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["timestamp".to_string()];
    header.extend(legends.iter().cloned());
    wtr.write_record(&header)?;

    let timeline = series.first().map(|s| s.timestamps.as_slice()).unwrap_or(&[]);
    for (i, timestamp) in timeline.iter().enumerate() {
        wtr.serialize(ComparisonRow {
            timestamp,
            values: series.iter().map(|s| s.values[i]).collect(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_comparison_file(
    path: &Path,
    legends: &[String],
    series: &[EntitySeries],
) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_comparison(file, legends, series)
}

/// Grouped-bar data: one row per age bucket, one column per entity.
pub fn write_age_breakdown<W: Write>(writer: W, breakdown: &AgeBreakdown) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["age".to_string()];
    header.extend(breakdown.entities.iter().map(|e| e.name.clone()));
    wtr.write_record(&header)?;

    for bucket in &breakdown.buckets {
        let mut record = vec![bucket.clone()];
        record.extend((0..breakdown.entities.len()).map(|i| breakdown.value(i, bucket).to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_age_breakdown_file(path: &Path, breakdown: &AgeBreakdown) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_age_breakdown(file, breakdown)
}

/// A timestamp followed by one value per series. Values go through the csv
/// serializer so they print exactly like [`AlignedRow`](crate::models::AlignedRow) fields.
struct ComparisonRow<'a> {
    timestamp: &'a NaiveDateTime,
    values: Vec<f64>,
}

impl Serialize for ComparisonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(1 + self.values.len())?;
        tuple.serialize_element(&self.timestamp.format(timestamp_format::FORMAT).to_string())?;
        for value in &self.values {
            tuple.serialize_element(value)?;
        }
        tuple.end()
    }
}
