//! Derived metrics on taxpayer records

use chrono::NaiveDate;

/// Whole days from registry arrival to delivery.
///
/// `None` unless both dates are known. Not clamped: a delivery recorded
/// before arrival gives a negative count.
pub fn processing_days(arrival: Option<NaiveDate>, delivery: Option<NaiveDate>) -> Option<i64> {
    match (arrival, delivery) {
        (Some(arrival), Some(delivery)) => Some((delivery - arrival).num_days()),
        _ => None,
    }
}
