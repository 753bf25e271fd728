// libs/scheduling-cell/src/services/recurring.rs
use chrono::{Days, Months, NaiveDate};

use crate::models::RecurrenceFrequency;

/// Expand a recurrence into its ordered candidate dates, end date inclusive.
///
/// Every occurrence is computed from the anchor (start) date, not from the
/// previous occurrence. For monthly recurrences a day-of-month that does not
/// exist in the target month clamps to that month's last day, and the next
/// occurrence returns to the anchor day: Jan 31 -> Feb 28 -> Mar 31 -> Apr 30.
pub fn expand_dates(
    start: NaiveDate,
    end: NaiveDate,
    frequency: RecurrenceFrequency,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    for n in 0.. {
        let occurrence = match frequency {
            RecurrenceFrequency::Daily => start.checked_add_days(Days::new(n)),
            RecurrenceFrequency::Weekly => start.checked_add_days(Days::new(7 * n)),
            RecurrenceFrequency::Biweekly => start.checked_add_days(Days::new(14 * n)),
            RecurrenceFrequency::Monthly => start.checked_add_months(Months::new(n as u32)),
        };

        match occurrence {
            Some(date) if date <= end => dates.push(date),
            _ => break,
        }
    }

    dates
}
