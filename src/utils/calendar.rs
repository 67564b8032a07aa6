//! Business-day arithmetic (weekends only, no holiday calendar)

use chrono::{Datelike, NaiveDate, Weekday};

/// Any day that is not Saturday or Sunday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First business day strictly after `date`
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date;
    while let Some(day) = next.succ_opt() {
        next = day;
        if is_business_day(next) {
            break;
        }
    }
    next
}
