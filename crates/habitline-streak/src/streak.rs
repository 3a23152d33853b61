use std::collections::BTreeSet;

use chrono::NaiveDate;

/// The slice of a check-in the streak calculation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInDay {
    pub date: NaiveDate,
    pub completed: bool,
}

impl CheckInDay {
    pub fn completed(date: NaiveDate) -> Self {
        Self { date, completed: true }
    }

    pub fn missed(date: NaiveDate) -> Self {
        Self { date, completed: false }
    }
}

/// Current streak of a single habit as of `today`.
///
/// Input order does not matter and duplicate dates count once. The streak
/// survives a missing check-in today as long as yesterday was completed;
/// once both today and yesterday are empty it is 0.
pub fn compute_streak(check_ins: &[CheckInDay], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = check_ins
        .iter()
        .filter(|c| c.completed)
        .map(|c| c.date)
        .collect();

    if days.is_empty() {
        return 0;
    }

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    for &day in days.iter().rev() {
        if day > cursor {
            continue;
        }
        if day < cursor {
            break;
        }

        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    streak
}

/// Whether a completed check-in exists on `day`.
pub fn completed_on(check_ins: &[CheckInDay], day: NaiveDate) -> bool {
    check_ins.iter().any(|c| c.completed && c.date == day)
}
