//! Display formatting for dates.

use chrono::NaiveDate;

/// Format a date as `YYYY.M.D` without zero padding, e.g. `2026.1.5`.
pub fn format_date_jp(date: NaiveDate) -> String {
    date.format("%Y.%-m.%-d").to_string()
}
