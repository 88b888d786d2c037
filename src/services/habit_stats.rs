//! Streak and completion-rate computation over a habit's entries.
//!
//! All functions take `today` explicitly. Callers pass the server's local
//! calendar day, while entries are stored as plain calendar dates.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use crate::models::{HabitEntry, HabitStats};

fn completed_days(entries: &[HabitEntry]) -> BTreeSet<NaiveDate> {
    entries
        .iter()
        .filter(|e| e.completed)
        .map(|e| e.date)
        .collect()
}

pub fn completed_today(entries: &[HabitEntry], today: NaiveDate) -> bool {
    entries.iter().any(|e| e.date == today && e.completed)
}

/// Consecutive completed days ending today. Zero when today is incomplete.
pub fn current_streak(entries: &[HabitEntry], today: NaiveDate) -> u32 {
    let days = completed_days(entries);
    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

pub fn longest_streak(entries: &[HabitEntry]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in completed_days(entries) {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

/// Share of completed days among the last `window_days` days, not counting
/// days before `first_day` (the habit's creation day).
pub fn completion_rate(
    entries: &[HabitEntry],
    today: NaiveDate,
    first_day: NaiveDate,
    window_days: u32,
) -> f64 {
    let window_start = today
        .checked_sub_days(Days::new(u64::from(window_days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN)
        .max(first_day);
    if window_start > today {
        return 0.0;
    }
    let span = (today - window_start).num_days() + 1;
    let done = completed_days(entries)
        .range(window_start..=today)
        .count();
    done as f64 / span as f64
}

pub fn compute(
    entries: &[HabitEntry],
    today: NaiveDate,
    first_day: NaiveDate,
    window_days: u32,
) -> HabitStats {
    HabitStats {
        completed_today: completed_today(entries, today),
        streak: current_streak(entries, today),
        longest_streak: longest_streak(entries),
        completion_rate: completion_rate(entries, today, first_day, window_days),
    }
}
