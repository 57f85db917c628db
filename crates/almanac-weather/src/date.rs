//! Date-text validation and lookback arithmetic.

use almanac_core::WeatherError;
use chrono::{Datelike, Months, NaiveDate};

/// Parse strict `YYYY-MM-DD` text.
///
/// The shape is checked before chrono sees it, so `2024-1-5` or `+2024-01-05`
/// are rejected; chrono then rejects impossible days such as Feb 30.
pub fn parse_date_text(text: &str) -> Result<NaiveDate, WeatherError> {
    let bytes = text.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(WeatherError::InvalidDateFormat(text.to_string()));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| WeatherError::InvalidDateFormat(text.to_string()))
}

/// `date` moved back by whole years. Feb 29 lands on Feb 28 in common years.
pub fn years_before(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(years.checked_mul(12)?))
}

/// Anchor for the lookback of a future `entered` date: same month and day,
/// in the year before `today`.
///
/// Near and far future dates use the same rule.
pub fn anchor_date(entered: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let target_year = today.year() - 1;
    let gap = entered.year() - target_year;
    if gap >= 0 {
        years_before(entered, u32::try_from(gap).ok()?)
    } else {
        entered.checked_add_months(Months::new(u32::try_from(-gap).ok()?.checked_mul(12)?))
    }
}

/// The dates fetched for a prediction: `anchor`, then one year earlier each step.
pub fn lookback_dates(anchor: NaiveDate, years: u32) -> Vec<NaiveDate> {
    (0..years).filter_map(|back| years_before(anchor, back)).collect()
}
