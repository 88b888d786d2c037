use chrono::{DateTime, Duration, Utc};

use crate::models::{PomodoroSession, PomodoroSettings, SessionKind};

pub fn planned_minutes(kind: SessionKind, settings: &PomodoroSettings) -> i64 {
    let minutes = match kind {
        SessionKind::Focus => settings.focus_minutes,
        SessionKind::ShortBreak => settings.short_break_minutes,
        SessionKind::LongBreak => settings.long_break_minutes,
    };
    i64::from(minutes)
}

pub fn planned_end(session: &PomodoroSession) -> DateTime<Utc> {
    session.started_at + Duration::minutes(session.planned_minutes)
}

/// Seconds left on the countdown, never negative.
pub fn remaining_seconds(session: &PomodoroSession, now: DateTime<Utc>) -> i64 {
    (planned_end(session) - now).num_seconds().max(0)
}

pub fn is_expired(session: &PomodoroSession, now: DateTime<Utc>) -> bool {
    planned_end(session) <= now
}

/// Kind to offer after `last`, given how many focus sessions are done today.
pub fn next_kind(last: Option<SessionKind>, focus_completed: u32, long_break_interval: u32) -> SessionKind {
    match last {
        Some(SessionKind::Focus) => {
            if long_break_interval > 0 && focus_completed > 0 && focus_completed % long_break_interval == 0 {
                SessionKind::LongBreak
            } else {
                SessionKind::ShortBreak
            }
        }
        _ => SessionKind::Focus,
    }
}
