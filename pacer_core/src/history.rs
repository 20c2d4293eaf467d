//! Session history and summary windows.
//!
//! History is read from the JSONL data service and sorted newest first.
//! Windows follow a Sunday-start calendar week in the caller's time zone.

use crate::store::read_sessions;
use crate::{Result, SessionRecord};
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    /// Since local midnight
    Today,
    /// Since Sunday midnight, before today
    ThisWeek,
    /// The full Sunday-to-Saturday week before this one
    LastWeek,
}

/// Load every stored session, newest first
pub fn load_history(path: &Path) -> Result<Vec<SessionRecord>> {
    let mut sessions = read_sessions(path)?;
    sessions.sort_by(|a, b| b.date.cmp(&a.date));
    tracing::info!("Loaded {} sessions from history", sessions.len());
    Ok(sessions)
}

/// `[start, end)` bounds of `window` relative to `now`; `end` is open for today
pub fn window_bounds<Tz: TimeZone>(
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
    let start_of_today = local_midnight(now);
    let days_since_sunday = i64::from(now.weekday().num_days_from_sunday());
    let start_of_week = start_of_today - Duration::days(days_since_sunday);

    match window {
        TimeWindow::Today => (start_of_today, None),
        TimeWindow::ThisWeek => (start_of_week, Some(start_of_today)),
        TimeWindow::LastWeek => (start_of_week - Duration::days(7), Some(start_of_week)),
    }
}

/// Every session inside `window`, keeping input order
pub fn sessions_in_window<'a, Tz: TimeZone>(
    sessions: &'a [SessionRecord],
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> impl Iterator<Item = &'a SessionRecord> {
    let (start, end) = window_bounds(window, now);
    sessions
        .iter()
        .filter(move |s| s.date >= start && end.map_or(true, |end| s.date < end))
}

/// First session inside `window`; with newest-first history, the latest one
pub fn find_in_window<'a, Tz: TimeZone>(
    sessions: &'a [SessionRecord],
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> Option<&'a SessionRecord> {
    sessions_in_window(sessions, window, now).next()
}

fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // midnight skipped by a DST jump; fall back to UTC midnight
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonlSessionStore;
    use crate::SessionStore;
    use uuid::Uuid;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn session(plan: &str, date: &str) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            plan_id: plan.into(),
            plan_name: plan.into(),
            plan_notes: String::new(),
            date: at(date),
            duration_minutes: 30,
            calories_burned: 200,
            completed_exercises: vec![],
        }
    }

    // Wednesday
    const NOW: &str = "2025-06-11T15:00:00Z";

    #[test]
    fn test_window_bounds_sunday_start() {
        let now = at(NOW);
        assert_eq!(
            window_bounds(TimeWindow::Today, &now),
            (at("2025-06-11T00:00:00Z"), None)
        );
        assert_eq!(
            window_bounds(TimeWindow::ThisWeek, &now),
            (at("2025-06-08T00:00:00Z"), Some(at("2025-06-11T00:00:00Z")))
        );
        assert_eq!(
            window_bounds(TimeWindow::LastWeek, &now),
            (at("2025-06-01T00:00:00Z"), Some(at("2025-06-08T00:00:00Z")))
        );
    }

    #[test]
    fn test_find_in_window() {
        let sessions = vec![
            session("today", "2025-06-11T07:30:00Z"),
            session("monday", "2025-06-09T18:00:00Z"),
            session("sunday", "2025-06-08T09:00:00Z"),
            session("last_thursday", "2025-06-05T12:00:00Z"),
            session("older", "2025-05-20T12:00:00Z"),
        ];
        let now = at(NOW);

        let pick = |w| find_in_window(&sessions, w, &now).map(|s| s.plan_id.as_str());
        assert_eq!(pick(TimeWindow::Today), Some("today"));
        assert_eq!(pick(TimeWindow::ThisWeek), Some("monday"));
        assert_eq!(pick(TimeWindow::LastWeek), Some("last_thursday"));

        assert_eq!(
            sessions_in_window(&sessions, TimeWindow::ThisWeek, &now).count(),
            2
        );
    }

    #[test]
    fn test_this_week_is_empty_on_sunday() {
        let sessions = vec![session("sunday", "2025-06-08T09:00:00Z")];
        let sunday_evening = at("2025-06-08T20:00:00Z");
        assert!(find_in_window(&sessions, TimeWindow::ThisWeek, &sunday_evening).is_none());
        assert!(find_in_window(&sessions, TimeWindow::Today, &sunday_evening).is_some());
    }

    #[test]
    fn test_load_history_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlSessionStore::in_data_dir(temp_dir.path());
        store
            .save_session(&session("old", "2025-06-01T10:00:00Z"))
            .unwrap();
        store
            .save_session(&session("new", "2025-06-10T10:00:00Z"))
            .unwrap();

        let history = load_history(store.path()).unwrap();
        assert_eq!(history[0].plan_id, "new");
        assert_eq!(history[1].plan_id, "old");
    }
}
