use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::DiigoError;

/// Diigo's `created_at` layout, e.g. `2024/11/14 05:48:28 +0000`.
const DIIGO_TS_FORMAT: &str = "%Y/%m/%d %H:%M:%S %z";

pub fn parse_diigo_datetime(value: &str) -> Result<DateTime<Utc>, DiigoError> {
    let trimmed = value.trim();
    DateTime::parse_from_str(trimmed, DIIGO_TS_FORMAT)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| DiigoError::InvalidResponse(format!("bad timestamp {trimmed:?}: {err}")))
}

/// ISO 8601 in UTC with second precision, the form written to the `created` column.
pub fn format_created(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
