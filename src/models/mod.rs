mod account_objects;
mod aligned;
mod metric_record;

pub use account_objects::{AdSet, AdStudyCell, AudienceSize, Campaign, GraphPage, Paging};
pub use aligned::{timestamp_format, AgeBreakdown, AgeTotals, AlignedRow, AlignedTable, EntitySeries};
pub use metric_record::{parse_hourly_timestamp, ActionValue, MetricRecord, HOURLY_RANGE_FIELD};
