use chrono::prelude::*;
use chrono_tz::{Tz, UTC};
use rrule::{Frequenzy, ParsedOptions, RRule, RRuleSet};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvalidRecurrenceError {
    #[error("Recurrence rule part is malformed: {0}")]
    Malformed(String),
    #[error("Invalid recurrence frequency: {0}")]
    InvalidFrequency(String),
    #[error("Invalid weekday specified: {0}")]
    InvalidWeekDay(String),
    #[error("Invalid value for {attr}: {value}")]
    InvalidValue { attr: String, value: String },
    #[error("Recurrence rule is missing the FREQ attribute")]
    MissingFrequency,
    #[error("Recurrence rule does not contain a DTSTART attribute")]
    MissingStart,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecurrenceFrequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
}

impl FromStr for RecurrenceFrequency {
    type Err = InvalidRecurrenceError;

    fn from_str(freq: &str) -> Result<Self, Self::Err> {
        match freq.to_uppercase().as_str() {
            "YEARLY" => Ok(Self::Yearly),
            "MONTHLY" => Ok(Self::Monthly),
            "WEEKLY" => Ok(Self::Weekly),
            "DAILY" => Ok(Self::Daily),
            _ => Err(InvalidRecurrenceError::InvalidFrequency(freq.to_string())),
        }
    }
}

/// A recurrence schedule for a `Reminder`, parsed from the rule text that
/// the clients store, e.g. `FREQ=DAILY;INTERVAL=2` or
/// `DTSTART=20240101T090000Z;FREQ=WEEKLY;BYDAY=MO,FR`.
///
/// All timestamps are UTC millis.
#[derive(Clone, Debug, PartialEq)]
pub struct RecurrenceSpec {
    pub freq: RecurrenceFrequency,
    pub interval: usize,
    pub count: Option<u32>,
    pub until: Option<i64>,
    pub byweekday: Option<Vec<WeekDay>>,
    /// The instant the schedule expands from, either embedded in the rule
    /// text as DTSTART or provided by the caller
    pub start_ts: i64,
}

impl RecurrenceSpec {
    /// Parses a rule that embeds its own DTSTART attribute.
    pub fn anchored_by_rule(rule: &str) -> Result<Self, InvalidRecurrenceError> {
        let parts = RuleParts::parse(rule)?;
        let start_ts = parts.dtstart.ok_or(InvalidRecurrenceError::MissingStart)?;
        Self::create(parts, start_ts)
    }

    /// Parses a bare rule and anchors it at the given start instant.
    pub fn anchored_at(rule: &str, start_ts: i64) -> Result<Self, InvalidRecurrenceError> {
        let parts = RuleParts::parse(rule)?;
        Self::create(parts, start_ts)
    }

    fn create(parts: RuleParts, start_ts: i64) -> Result<Self, InvalidRecurrenceError> {
        let freq = parts.freq.ok_or(InvalidRecurrenceError::MissingFrequency)?;
        Ok(Self {
            freq,
            interval: parts.interval.unwrap_or(1),
            count: parts.count,
            until: parts.until,
            byweekday: parts.byweekday,
            start_ts,
        })
    }

    /// Whether the rule text is the `FREQ=NONE` marker for a reminder that
    /// never repeats. Only an exact (case-insensitive) match counts, a rule
    /// that merely mentions the marker goes through the parser like any other.
    pub fn is_non_recurring(rule: &str) -> bool {
        rule.trim().eq_ignore_ascii_case("FREQ=NONE")
    }

    /// The first occurrence strictly after `after` (UTC millis), or `None`
    /// when the schedule has no occurrence left.
    pub fn next_occurrence_after(&self, after: i64) -> Option<i64> {
        let mut rrule_set = RRuleSet::new();
        let rrule = RRule::new(self.get_parsed_options());
        rrule_set.rrule(rrule);

        rrule_set
            .into_iter()
            .take_while(|occurrence| occurrence.timestamp_millis() <= get_max_timestamp())
            .find(|occurrence| occurrence.timestamp_millis() > after)
            .map(|occurrence| occurrence.timestamp_millis())
    }

    fn get_parsed_options(&self) -> ParsedOptions {
        let timezone: Tz = UTC;
        let dtstart = timezone.timestamp(self.start_ts / 1000, 0);
        let until = self.until.map(|ts| timezone.timestamp(ts / 1000, 0));

        let mut byweekday = Vec::new();
        let mut bynweekday: Vec<Vec<isize>> = Default::default();
        if let Some(opts_byweekday) = self.byweekday.clone() {
            for wday in opts_byweekday {
                match wday.nth() {
                    None => byweekday.push(wday.weekday()),
                    Some(n) => bynweekday.push(vec![wday.weekday() as isize, n]),
                }
            }
        }

        ParsedOptions {
            freq: freq_convert(&self.freq),
            count: self.count,
            bymonth: vec![],
            dtstart,
            byweekday,
            byhour: vec![dtstart.hour() as usize],
            bysetpos: vec![],
            byweekno: vec![],
            byminute: vec![dtstart.minute() as usize],
            bysecond: vec![dtstart.second() as usize],
            byyearday: vec![],
            bymonthday: vec![],
            bynweekday,
            bynmonthday: vec![],
            until,
            wkst: 0,
            tzid: timezone,
            interval: self.interval,
            byeaster: None,
        }
    }
}

fn freq_convert(freq: &RecurrenceFrequency) -> Frequenzy {
    match freq {
        RecurrenceFrequency::Yearly => Frequenzy::Yearly,
        RecurrenceFrequency::Monthly => Frequenzy::Monthly,
        RecurrenceFrequency::Weekly => Frequenzy::Weekly,
        RecurrenceFrequency::Daily => Frequenzy::Daily,
    }
}

fn get_max_timestamp() -> i64 {
    5609882500905 // Mon Oct 09 2147 06:41:40 GMT+0200 (Central European Summer Time)
}

#[derive(Debug, Default)]
struct RuleParts {
    freq: Option<RecurrenceFrequency>,
    interval: Option<usize>,
    count: Option<u32>,
    until: Option<i64>,
    dtstart: Option<i64>,
    byweekday: Option<Vec<WeekDay>>,
}

impl RuleParts {
    fn parse(rule: &str) -> Result<Self, InvalidRecurrenceError> {
        let mut parts = Self::default();
        for part in rule.trim().split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| InvalidRecurrenceError::Malformed(part.to_string()))?;
            match key.to_uppercase().as_str() {
                "FREQ" => parts.freq = Some(value.parse()?),
                "INTERVAL" => parts.interval = Some(parse_positive_int(key, value)?),
                "COUNT" => parts.count = Some(parse_positive_int(key, value)? as u32),
                "UNTIL" => parts.until = Some(parse_timestamp(key, value)?),
                "DTSTART" => parts.dtstart = Some(parse_timestamp(key, value)?),
                "BYDAY" => parts.byweekday = Some(parse_weekdays(value)?),
                _ => return Err(InvalidRecurrenceError::Malformed(part.to_string())),
            }
        }
        Ok(parts)
    }
}

fn parse_positive_int(key: &str, value: &str) -> Result<usize, InvalidRecurrenceError> {
    match value.parse::<usize>() {
        Ok(number) if number >= 1 => Ok(number),
        _ => Err(InvalidRecurrenceError::InvalidValue {
            attr: key.to_uppercase(),
            value: value.to_string(),
        }),
    }
}

/// Accepts the `YYYYMMDDTHHMMSSZ` and `YYYYMMDD` date formats
fn parse_timestamp(key: &str, value: &str) -> Result<i64, InvalidRecurrenceError> {
    let value = value.trim().to_uppercase();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(&value, "%Y%m%dT%H%M%SZ") {
        return Ok(datetime.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y%m%d") {
        return Ok(date.and_hms(0, 0, 0).timestamp_millis());
    }
    Err(InvalidRecurrenceError::InvalidValue {
        attr: key.to_uppercase(),
        value,
    })
}

fn parse_weekdays(value: &str) -> Result<Vec<WeekDay>, InvalidRecurrenceError> {
    value
        .split(',')
        .map(|wday| wday.trim().parse::<WeekDay>())
        .collect()
}

/// A weekday in a BYDAY list, optionally prefixed with an occurrence
/// number: `MO`, `2TU`, `-1FR`, ...
#[derive(Clone, Debug, PartialEq)]
pub struct WeekDay {
    n: Option<isize>,
    weekday: usize,
}

impl WeekDay {
    fn create(weekday: usize, n: Option<isize>) -> Result<Self, ()> {
        if !Self::is_valid_weekday(weekday) {
            return Err(());
        }
        if let Some(n) = n {
            if !Self::is_valid_n(n) {
                return Err(());
            }
        }
        Ok(Self { weekday, n })
    }

    pub fn nth(&self) -> Option<isize> {
        self.n
    }
    pub fn weekday(&self) -> usize {
        self.weekday
    }

    pub fn new(weekday: usize) -> Result<Self, ()> {
        Self::create(weekday, None)
    }

    pub fn new_nth(weekday: usize, n: isize) -> Result<Self, ()> {
        Self::create(weekday, Some(n))
    }

    fn is_valid_n(n: isize) -> bool {
        n != 0 && n < 500 && n > -500
    }

    fn is_valid_weekday(wday: usize) -> bool {
        wday <= 6
    }
}

impl Display for WeekDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n_prefix = match self.n {
            Some(n) => format!("{}", n),
            None => "".into(),
        };
        write!(f, "{}{}", n_prefix, weekday_to_str(self.weekday))
    }
}

fn str_to_weekday(d: &str) -> Result<usize, InvalidRecurrenceError> {
    match d.to_uppercase().as_str() {
        "MO" => Ok(0),
        "TU" => Ok(1),
        "WE" => Ok(2),
        "TH" => Ok(3),
        "FR" => Ok(4),
        "SA" => Ok(5),
        "SU" => Ok(6),
        _ => Err(InvalidRecurrenceError::InvalidWeekDay(d.to_string())),
    }
}

fn weekday_to_str(wday: usize) -> String {
    match wday {
        0 => "MO",
        1 => "TU",
        2 => "WE",
        3 => "TH",
        4 => "FR",
        5 => "SA",
        6 => "SU",
        _ => "", // maybe use unreachable ?
    }
    .into()
}

impl FromStr for WeekDay {
    type Err = InvalidRecurrenceError;

    fn from_str(day: &str) -> Result<Self, Self::Err> {
        let e = InvalidRecurrenceError::InvalidWeekDay(day.to_string());
        if day.len() < 2 || !day.is_ascii() {
            return Err(e);
        } else if day.len() == 2 {
            // MO, TU, ...
            let wday = str_to_weekday(day)?;
            WeekDay::new(wday).map_err(|_| e)
        } else {
            let wday = str_to_weekday(&day[day.len() - 2..])?;
            let n = match day[0..day.len() - 2].parse::<isize>() {
                Ok(n) => n,
                Err(_) => return Err(e),
            };
            WeekDay::new_nth(wday, n).map_err(|_| e)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ts(datetime: &str) -> i64 {
        DateTime::parse_from_rfc3339(datetime)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn parses_bare_rule() {
        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY;INTERVAL=2", 100).unwrap();
        assert_eq!(spec.freq, RecurrenceFrequency::Daily);
        assert_eq!(spec.interval, 2);
        assert_eq!(spec.count, None);
        assert_eq!(spec.until, None);
        assert_eq!(spec.start_ts, 100);
    }

    #[test]
    fn interval_defaults_to_one() {
        let spec = RecurrenceSpec::anchored_at("FREQ=WEEKLY", 0).unwrap();
        assert_eq!(spec.interval, 1);
    }

    #[test]
    fn parses_rule_attributes_case_insensitively() {
        let spec = RecurrenceSpec::anchored_at("freq=daily;Interval=3;count=7", 0).unwrap();
        assert_eq!(spec.freq, RecurrenceFrequency::Daily);
        assert_eq!(spec.interval, 3);
        assert_eq!(spec.count, Some(7));
    }

    #[test]
    fn parses_byday_list() {
        let spec = RecurrenceSpec::anchored_at("FREQ=WEEKLY;BYDAY=MO,FR", 0).unwrap();
        assert_eq!(
            spec.byweekday,
            Some(vec![WeekDay::new(0).unwrap(), WeekDay::new(4).unwrap()])
        );

        let spec = RecurrenceSpec::anchored_at("FREQ=MONTHLY;BYDAY=2TU,-1FR", 0).unwrap();
        assert_eq!(
            spec.byweekday,
            Some(vec![
                WeekDay::new_nth(1, 2).unwrap(),
                WeekDay::new_nth(4, -1).unwrap()
            ])
        );
    }

    #[test]
    fn parses_until_formats() {
        let spec =
            RecurrenceSpec::anchored_at("FREQ=DAILY;UNTIL=20240105T100058Z", 0).unwrap();
        assert_eq!(spec.until, Some(ts("2024-01-05T10:00:58Z")));

        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY;UNTIL=20240105", 0).unwrap();
        assert_eq!(spec.until, Some(ts("2024-01-05T00:00:00Z")));
    }

    #[test]
    fn rule_with_dtstart_anchors_itself() {
        let spec =
            RecurrenceSpec::anchored_by_rule("DTSTART=20240101T100058Z;FREQ=DAILY").unwrap();
        assert_eq!(spec.start_ts, ts("2024-01-01T10:00:58Z"));
    }

    #[test]
    fn rule_without_dtstart_cannot_anchor_itself() {
        assert!(RecurrenceSpec::anchored_by_rule("FREQ=DAILY").is_err());
    }

    #[test]
    fn rejects_invalid_rules() {
        assert!(RecurrenceSpec::anchored_at("", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("INTERVAL=2", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=SOMETIMES", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=DAILY;INTERVAL=0", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=DAILY;COUNT=abc", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=DAILY;UNTIL=someday", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=DAILY;BYDAY=MO,XX", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=DAILY;RRULE", 0).is_err());
        assert!(RecurrenceSpec::anchored_at("FREQ=DAILY;BYSETPOS=1", 0).is_err());
    }

    #[test]
    fn recognizes_the_non_recurring_marker() {
        assert!(RecurrenceSpec::is_non_recurring("FREQ=NONE"));
        assert!(RecurrenceSpec::is_non_recurring("freq=none"));
        assert!(RecurrenceSpec::is_non_recurring(" Freq=None "));
        assert!(!RecurrenceSpec::is_non_recurring("FREQ=NONE;INTERVAL=1"));
        assert!(!RecurrenceSpec::is_non_recurring("DTSTART=20240101T100058Z;FREQ=NONE"));
        assert!(!RecurrenceSpec::is_non_recurring("FREQ=DAILY"));
    }

    #[test]
    fn daily_schedule_advances_by_one_day() {
        let start = ts("2024-01-01T10:00:58Z");
        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY;INTERVAL=1", start).unwrap();
        assert_eq!(
            spec.next_occurrence_after(start),
            Some(ts("2024-01-02T10:00:58Z"))
        );
    }

    #[test]
    fn daily_schedule_respects_interval() {
        let start = ts("2024-01-01T10:00:58Z");
        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY;INTERVAL=2", start).unwrap();
        assert_eq!(
            spec.next_occurrence_after(start),
            Some(ts("2024-01-03T10:00:58Z"))
        );
    }

    #[test]
    fn first_occurrence_is_the_start_instant() {
        let start = ts("2024-01-01T10:00:58Z");
        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY", start).unwrap();
        assert_eq!(
            spec.next_occurrence_after(ts("2023-12-24T00:00:00Z")),
            Some(start)
        );
    }

    #[test]
    fn exhausted_count_gives_no_next_occurrence() {
        let start = ts("2024-01-01T10:00:58Z");
        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY;COUNT=1", start).unwrap();
        assert_eq!(spec.next_occurrence_after(start), None);

        let spec = RecurrenceSpec::anchored_at("FREQ=DAILY;COUNT=2", start).unwrap();
        let second = spec.next_occurrence_after(start).unwrap();
        assert_eq!(second, ts("2024-01-02T10:00:58Z"));
        assert_eq!(spec.next_occurrence_after(second), None);
    }

    #[test]
    fn passed_until_gives_no_next_occurrence() {
        let start = ts("2024-01-01T10:00:58Z");
        let spec =
            RecurrenceSpec::anchored_at("FREQ=DAILY;UNTIL=20240103T100058Z", start).unwrap();
        assert_eq!(
            spec.next_occurrence_after(ts("2024-01-02T10:00:58Z")),
            Some(ts("2024-01-03T10:00:58Z"))
        );
        assert_eq!(spec.next_occurrence_after(ts("2024-01-03T10:00:58Z")), None);
    }

    #[test]
    fn weekly_schedule_follows_byday() {
        // 2024-01-01 is a monday
        let start = ts("2024-01-01T09:00:00Z");
        let spec = RecurrenceSpec::anchored_at("FREQ=WEEKLY;BYDAY=MO,FR", start).unwrap();
        let friday = spec.next_occurrence_after(start).unwrap();
        assert_eq!(friday, ts("2024-01-05T09:00:00Z"));
        let monday = spec.next_occurrence_after(friday).unwrap();
        assert_eq!(monday, ts("2024-01-08T09:00:00Z"));
    }

    #[test]
    fn parses_valid_weekday_str_correctly() {
        assert_eq!("mo".parse::<WeekDay>().unwrap(), WeekDay::new(0).unwrap());
        assert_eq!("su".parse::<WeekDay>().unwrap(), WeekDay::new(6).unwrap());
        assert_eq!(
            "1mo".parse::<WeekDay>().unwrap(),
            WeekDay::new_nth(0, 1).unwrap()
        );
        assert_eq!(
            "-2fr".parse::<WeekDay>().unwrap(),
            WeekDay::new_nth(4, -2).unwrap()
        );
        assert_eq!(
            "+22mo".parse::<WeekDay>().unwrap(),
            WeekDay::new_nth(0, 22).unwrap()
        );
    }

    #[test]
    fn parses_invalid_weekday_str_correctly() {
        assert!("".parse::<WeekDay>().is_err());
        assert!("-1".parse::<WeekDay>().is_err());
        assert!("7".parse::<WeekDay>().is_err());
        assert!("00".parse::<WeekDay>().is_err());
        assert!("-1WED".parse::<WeekDay>().is_err());
        assert!("mon".parse::<WeekDay>().is_err());
        assert!("1000mo".parse::<WeekDay>().is_err());
        assert!("0mo".parse::<WeekDay>().is_err());
        assert!("+0mo".parse::<WeekDay>().is_err());
    }

    #[test]
    fn serializes_weekday() {
        assert_eq!(WeekDay::new(0).unwrap().to_string(), "MO");
        assert_eq!(WeekDay::new(6).unwrap().to_string(), "SU");
        assert_eq!(WeekDay::new_nth(6, 1).unwrap().to_string(), "1SU");
        assert_eq!(WeekDay::new_nth(6, -1).unwrap().to_string(), "-1SU");
    }
}
