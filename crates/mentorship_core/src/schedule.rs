//! crates/mentorship_core/src/schedule.rs
//!
//! Recurring-availability primitives: weekdays, `HH:MM` times, the slot token
//! wire format, and the resolver that turns a recurring weekday/time pair into
//! a concrete calendar occurrence.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Errors
//=========================================================================================

/// Failures while parsing schedule values from their string forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("'{0}' is not a valid weekday")]
    InvalidWeekday(String),
    #[error("'{0}' is not a valid HH:MM time")]
    InvalidTime(String),
    #[error("Start time {start} must be before end time {end}")]
    EmptyRange { start: String, end: String },
    #[error("'{0}' is not a valid slot (expected \"<Weekday> @ <HH:MM> - <HH:MM>\")")]
    InvalidSlotToken(String),
}

//=========================================================================================
// Weekday
//=========================================================================================

/// A day of the week, indexed from Sunday (0) to Saturday (6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Every weekday in index order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    const NAMES: [&'static str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];

    /// Days since Sunday.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Self::ALL[day.num_days_from_sunday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = ScheduleError;

    /// Accepts the full English day name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(trimmed))
            .map(|i| Self::ALL[i])
            .ok_or_else(|| ScheduleError::InvalidWeekday(s.to_string()))
    }
}

//=========================================================================================
// TimeOfDay
//=========================================================================================

/// A wall-clock time with minute precision, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive_time(self) -> NaiveTime {
        self.0
    }

    /// The time-of-day of a timestamp, truncated to the minute.
    pub fn of(datetime: &DateTime<Utc>) -> Self {
        let t = datetime.time();
        Self(t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    /// Parses exactly `HH:MM` (two digits each, 24-hour clock).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 2 || b.is_ascii_digit());
        if !well_formed {
            return Err(ScheduleError::InvalidTime(s.to_string()));
        }
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(Self)
            .map_err(|_| ScheduleError::InvalidTime(s.to_string()))
    }
}

//=========================================================================================
// TimeRange and SlotToken
//=========================================================================================

/// A half-open window within a single day. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::EmptyRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        Self::new(start.parse()?, end.parse()?)
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }
}

/// The structured form of a slot chosen by a mentee.
///
/// On the wire a slot travels as `"<Weekday> @ <HH:MM> - <HH:MM>"`, for example
/// `"Monday @ 09:00 - 10:00"`. It is parsed once at the boundary and carried
/// structured from then on; `Display` produces the wire form again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotToken {
    pub weekday: Weekday,
    pub range: TimeRange,
}

impl SlotToken {
    pub fn new(weekday: Weekday, range: TimeRange) -> Self {
        Self { weekday, range }
    }

    pub fn start(&self) -> TimeOfDay {
        self.range.start()
    }

    pub fn end(&self) -> TimeOfDay {
        self.range.end()
    }
}

impl fmt::Display for SlotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} - {}", self.weekday, self.start(), self.end())
    }
}

impl FromStr for SlotToken {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidSlotToken(s.to_string());

        let (day_part, time_part) = s.split_once('@').ok_or_else(invalid)?;
        let (start, end) = time_part.split_once('-').ok_or_else(invalid)?;

        let weekday = day_part.parse::<Weekday>()?;
        let range = TimeRange::parse(start, end)?;
        Ok(Self { weekday, range })
    }
}

//=========================================================================================
// Slot Resolver
//=========================================================================================

/// How a slot falling on the current weekday is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameDayPolicy {
    /// Today if the start time has not passed yet, otherwise one week out.
    #[default]
    RollIfPassed,
    /// Always one week out, even when the start time is still ahead today.
    AlwaysNextWeek,
}

impl FromStr for SameDayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roll_if_passed" => Ok(Self::RollIfPassed),
            "always_next_week" => Ok(Self::AlwaysNextWeek),
            other => Err(format!("'{}' is not a valid same-day policy", other)),
        }
    }
}

/// Maps a recurring weekday and start time onto the nearest concrete occurrence
/// relative to `now`. Pure: the same inputs always give the same output.
///
/// The result always falls on `weekday` at `start` with zero seconds. Under
/// `RollIfPassed` it is never before `now` and less than seven days after it.
/// That bound does not hold for `AlwaysNextWeek`: a slot later today lands on
/// the same weekday next week, so up to a day more than seven days out.
pub fn resolve_next_occurrence(
    weekday: Weekday,
    start: TimeOfDay,
    now: DateTime<Utc>,
    policy: SameDayPolicy,
) -> DateTime<Utc> {
    let today = Weekday::from_chrono(now.weekday()).index();
    let mut diff = (weekday.index() + 7 - today) % 7;

    if diff == 0 {
        let later_today = occurrence_at(now, 0, start) >= now;
        if policy == SameDayPolicy::AlwaysNextWeek || !later_today {
            diff = 7;
        }
    }

    occurrence_at(now, diff, start)
}

fn occurrence_at(now: DateTime<Utc>, days_ahead: u32, start: TimeOfDay) -> DateTime<Utc> {
    let date = now.date_naive() + Duration::days(i64::from(days_ahead));
    Utc.from_utc_datetime(&date.and_time(start.as_naive_time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn weekday_names_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(day.name().parse::<Weekday>().unwrap(), day);
        }
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert!("Mon".parse::<Weekday>().is_err());
    }

    #[test]
    fn time_of_day_requires_two_digit_fields() {
        assert_eq!("09:00".parse::<TimeOfDay>().unwrap().to_string(), "09:00");
        assert_eq!("23:59".parse::<TimeOfDay>().unwrap().to_string(), "23:59");
        assert!("9:00".parse::<TimeOfDay>().is_err());
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("09:60".parse::<TimeOfDay>().is_err());
        assert!("0900".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn time_range_rejects_empty_or_inverted_windows() {
        assert!(TimeRange::parse("09:00", "10:00").is_ok());
        assert!(matches!(
            TimeRange::parse("10:00", "10:00"),
            Err(ScheduleError::EmptyRange { .. })
        ));
        assert!(TimeRange::parse("11:00", "10:00").is_err());
    }

    #[test]
    fn slot_token_parses_and_formats_wire_form() {
        let token: SlotToken = "Monday @ 09:00 - 10:00".parse().unwrap();
        assert_eq!(token.weekday, Weekday::Monday);
        assert_eq!(token.start().to_string(), "09:00");
        assert_eq!(token.end().to_string(), "10:00");
        assert_eq!(token.to_string(), "Monday @ 09:00 - 10:00");

        let loose: SlotToken = "friday@14:30-15:00".parse().unwrap();
        assert_eq!(loose.to_string(), "Friday @ 14:30 - 15:00");
    }

    #[test]
    fn slot_token_rejects_malformed_input() {
        assert!(matches!(
            "Monday 09:00 - 10:00".parse::<SlotToken>(),
            Err(ScheduleError::InvalidSlotToken(_))
        ));
        assert!(matches!(
            "Monday @ 09:00".parse::<SlotToken>(),
            Err(ScheduleError::InvalidSlotToken(_))
        ));
        assert!(matches!(
            "Someday @ 09:00 - 10:00".parse::<SlotToken>(),
            Err(ScheduleError::InvalidWeekday(_))
        ));
    }

    #[test]
    fn resolves_later_weekday_in_same_week() {
        // 2024-01-03 is a Wednesday.
        let now = at("2024-01-03T12:00:00Z");
        let start = "09:00".parse().unwrap();
        let resolved = resolve_next_occurrence(Weekday::Friday, start, now, SameDayPolicy::default());
        assert_eq!(resolved, at("2024-01-05T09:00:00Z"));
    }

    #[test]
    fn resolves_earlier_weekday_into_next_week() {
        let now = at("2024-01-03T12:00:00Z");
        let start = "09:00".parse().unwrap();
        let resolved = resolve_next_occurrence(Weekday::Monday, start, now, SameDayPolicy::default());
        assert_eq!(resolved, at("2024-01-08T09:00:00Z"));
    }

    #[test]
    fn same_day_rolls_only_when_time_has_passed() {
        let now = at("2024-01-03T12:00:00Z");
        let later = "15:00".parse().unwrap();
        let earlier = "08:00".parse().unwrap();

        assert_eq!(
            resolve_next_occurrence(Weekday::Wednesday, later, now, SameDayPolicy::RollIfPassed),
            at("2024-01-03T15:00:00Z")
        );
        assert_eq!(
            resolve_next_occurrence(Weekday::Wednesday, earlier, now, SameDayPolicy::RollIfPassed),
            at("2024-01-10T08:00:00Z")
        );
        assert_eq!(
            resolve_next_occurrence(Weekday::Wednesday, later, now, SameDayPolicy::AlwaysNextWeek),
            at("2024-01-10T15:00:00Z")
        );
    }

    #[test]
    fn always_next_week_can_exceed_seven_days() {
        let now = at("2024-01-03T12:00:00Z");
        let later = "15:00".parse().unwrap();
        let resolved =
            resolve_next_occurrence(Weekday::Wednesday, later, now, SameDayPolicy::AlwaysNextWeek);
        assert!(resolved - now > chrono::Duration::days(7));
        assert!(resolved - now < chrono::Duration::days(8));

        let rolled =
            resolve_next_occurrence(Weekday::Wednesday, later, now, SameDayPolicy::RollIfPassed);
        assert!(rolled - now < chrono::Duration::days(7));
    }

    #[test]
    fn same_minute_resolves_to_now_when_seconds_are_zero() {
        let now = at("2024-01-03T12:00:00Z");
        let start = "12:00".parse().unwrap();
        assert_eq!(
            resolve_next_occurrence(Weekday::Wednesday, start, now, SameDayPolicy::RollIfPassed),
            now
        );
    }

    #[test]
    fn time_of_day_of_timestamp_truncates_seconds() {
        let t = TimeOfDay::of(&at("2024-01-03T07:45:31Z"));
        assert_eq!(t.to_string(), "07:45");
    }

    #[test]
    fn same_day_policy_parses_config_values() {
        assert_eq!("roll_if_passed".parse::<SameDayPolicy>().unwrap(), SameDayPolicy::RollIfPassed);
        assert_eq!(
            "ALWAYS_NEXT_WEEK".parse::<SameDayPolicy>().unwrap(),
            SameDayPolicy::AlwaysNextWeek
        );
        assert!("tomorrow".parse::<SameDayPolicy>().is_err());
    }
}
