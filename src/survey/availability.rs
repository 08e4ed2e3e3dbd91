//! Whether a survey can be answered at a given instant.
//!
//! Everything here is a pure function of an already-loaded survey row and an
//! explicit instant. The daily window is wall-clock time projected onto the
//! instant's own calendar date, so the caller's timezone decides what "today"
//! means.

use crate::orm::surveys;
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone};

/// Accepted stored formats, seconds optional.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Format used when persisting a window bound and when comparing in SQL.
pub const STORED_TIME_FORMAT: &str = "%H:%M:%S";

pub fn is_available_now<Tz: TimeZone>(survey: &surveys::Model, now: &DateTime<Tz>) -> bool {
    if survey.is_deleted() || survey.is_closed || !survey.is_active {
        return false;
    }

    if is_expired(survey.expires_at, now) {
        return false;
    }

    if let Some((from, until)) = time_window(survey) {
        let from = match time_for_today(from, now) {
            Some(t) => t,
            None => return false,
        };
        let until = match time_for_today(until, now) {
            Some(t) => t,
            None => return false,
        };

        let local = now.naive_local();
        if local < from || local > until {
            return false;
        }
    }

    true
}

/// True once `expires_at` lies strictly before `now`.
pub fn is_expired<Tz: TimeZone>(expires_at: Option<NaiveDateTime>, now: &DateTime<Tz>) -> bool {
    match expires_at {
        Some(expires_at) => expires_at < now.naive_utc(),
        None => false,
    }
}

/// Both bounds, or nothing. A lone bound is ignored.
fn time_window(survey: &surveys::Model) -> Option<(&str, &str)> {
    let from = survey.available_from_time.as_deref().filter(|s| !s.is_empty())?;
    let until = survey.available_until_time.as_deref().filter(|s| !s.is_empty())?;
    Some((from, until))
}

pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

fn time_for_today<Tz: TimeZone>(value: &str, now: &DateTime<Tz>) -> Option<NaiveDateTime> {
    let time = parse_time_of_day(value)?;
    Some(now.naive_local().date().and_time(time))
}

/// Wall-clock time of `now` in the stored format, for window comparisons in SQL.
pub fn time_of_day_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(STORED_TIME_FORMAT).to_string()
}
