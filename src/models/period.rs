//! Forecast periods, hour arithmetic and part-of-day classification

use crate::StoryError;
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed time span `[start, end]` a forecast fact applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct WeatherPeriod {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<RawPeriod> for WeatherPeriod {
    type Error = StoryError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        WeatherPeriod::new(raw.start, raw.end)
    }
}

impl WeatherPeriod {
    /// Create a period, rejecting `start > end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> crate::Result<Self> {
        if start > end {
            return Err(StoryError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// Zero-length period at a single timestamp
    #[must_use]
    pub fn instant(timestamp: NaiveDateTime) -> Self {
        Self {
            start: timestamp,
            end: timestamp,
        }
    }

    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whole hours from start to end
    #[must_use]
    pub fn length_hours(&self) -> i64 {
        hours_between(self.end, self.start)
    }

    #[must_use]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    #[must_use]
    pub fn contains_period(&self, other: &WeatherPeriod) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Common part of two periods, if any
    #[must_use]
    pub fn intersection(&self, other: &WeatherPeriod) -> Option<WeatherPeriod> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(WeatherPeriod { start, end })
    }

    /// Same period with a new end, clamped so the period never inverts
    #[must_use]
    pub fn with_end(&self, end: NaiveDateTime) -> WeatherPeriod {
        WeatherPeriod {
            start: self.start,
            end: end.max(self.start),
        }
    }
}

impl fmt::Display for WeatherPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}...{}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Signed whole hours from `earlier` to `later`
#[must_use]
pub fn hours_between(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    (later - earlier).num_hours()
}

#[must_use]
pub fn shift_hours(timestamp: NaiveDateTime, hours: i64) -> NaiveDateTime {
    timestamp + TimeDelta::hours(hours)
}

/// Named parts of the day with their hour windows
///
/// Finnish names in parentheses; the combined variants span two adjacent
/// narrow parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfDay {
    /// aamu, 06-09
    Morning,
    /// aamupäivä, 09-11
    Forenoon,
    /// keskipäivä, 11-13
    Midday,
    /// iltapäivä, 13-18
    Afternoon,
    /// ilta, 18-22
    Evening,
    /// iltayö, 22-00
    LateEvening,
    /// keskiyö, 00-03
    Midnight,
    /// aamuyö, 03-06
    EarlyMorning,
    /// päivä, 09-18
    Daytime,
    /// yö, 00-06
    Night,
    EarlyMorningAndMorning,
    MorningAndForenoon,
    ForenoonAndMidday,
    MiddayAndAfternoon,
    AfternoonAndEvening,
    EveningAndLateEvening,
    LateEveningAndMidnight,
}

impl PartOfDay {
    /// The eight non-overlapping parts covering a whole day
    pub const NARROW: [PartOfDay; 8] = [
        PartOfDay::Morning,
        PartOfDay::Forenoon,
        PartOfDay::Midday,
        PartOfDay::Afternoon,
        PartOfDay::Evening,
        PartOfDay::LateEvening,
        PartOfDay::Midnight,
        PartOfDay::EarlyMorning,
    ];

    const COMBINED: [PartOfDay; 7] = [
        PartOfDay::EarlyMorningAndMorning,
        PartOfDay::MorningAndForenoon,
        PartOfDay::ForenoonAndMidday,
        PartOfDay::MiddayAndAfternoon,
        PartOfDay::AfternoonAndEvening,
        PartOfDay::EveningAndLateEvening,
        PartOfDay::LateEveningAndMidnight,
    ];

    /// Hour window `(start, end)`; an end of 0 means midnight
    #[must_use]
    pub fn hours(self) -> (u32, u32) {
        match self {
            PartOfDay::Morning => (6, 9),
            PartOfDay::Forenoon => (9, 11),
            PartOfDay::Midday => (11, 13),
            PartOfDay::Afternoon => (13, 18),
            PartOfDay::Evening => (18, 22),
            PartOfDay::LateEvening => (22, 0),
            PartOfDay::Midnight => (0, 3),
            PartOfDay::EarlyMorning => (3, 6),
            PartOfDay::Daytime => (9, 18),
            PartOfDay::Night => (0, 6),
            PartOfDay::EarlyMorningAndMorning => (3, 9),
            PartOfDay::MorningAndForenoon => (6, 11),
            PartOfDay::ForenoonAndMidday => (9, 13),
            PartOfDay::MiddayAndAfternoon => (11, 18),
            PartOfDay::AfternoonAndEvening => (13, 22),
            PartOfDay::EveningAndLateEvening => (18, 0),
            PartOfDay::LateEveningAndMidnight => (22, 3),
        }
    }

    /// The two narrow parts of a combined part
    #[must_use]
    pub fn components(self) -> Option<(PartOfDay, PartOfDay)> {
        use PartOfDay::*;
        match self {
            EarlyMorningAndMorning => Some((EarlyMorning, Morning)),
            MorningAndForenoon => Some((Morning, Forenoon)),
            ForenoonAndMidday => Some((Forenoon, Midday)),
            MiddayAndAfternoon => Some((Midday, Afternoon)),
            AfternoonAndEvening => Some((Afternoon, Evening)),
            EveningAndLateEvening => Some((Evening, LateEvening)),
            LateEveningAndMidnight => Some((LateEvening, Midnight)),
            _ => None,
        }
    }

    fn span_hours(self) -> i64 {
        let (start, end) = self.hours();
        let span = (i64::from(end) - i64::from(start)).rem_euclid(24);
        if span == 0 { 24 } else { span }
    }

    /// Whether the hour of `timestamp` lies inside the window, ends inclusive
    #[must_use]
    pub fn contains_timestamp(self, timestamp: NaiveDateTime) -> bool {
        let hour = timestamp.hour();
        match self.hours() {
            (start, 0) => hour >= start || hour == 0,
            (start, end) if start < end => start <= hour && hour <= end,
            (start, end) => hour >= start || hour <= end,
        }
    }

    /// Whether the whole period fits inside one occurrence of the window
    #[must_use]
    pub fn contains_period(self, period: &WeatherPeriod) -> bool {
        if period.length_hours() > self.span_hours() {
            return false;
        }
        if !self.contains_timestamp(period.start()) || !self.contains_timestamp(period.end()) {
            return false;
        }
        let (start, end) = self.hours();
        let wraps = end != 0 && start > end;
        if !wraps && end != 0 {
            return period.start().date() == period.end().date()
                && period.start().hour() <= period.end().hour();
        }
        true
    }

    /// Narrow part containing `timestamp`, windows half-open
    #[must_use]
    pub fn of_timestamp(timestamp: NaiveDateTime) -> PartOfDay {
        match timestamp.hour() {
            6..=8 => PartOfDay::Morning,
            9..=10 => PartOfDay::Forenoon,
            11..=12 => PartOfDay::Midday,
            13..=17 => PartOfDay::Afternoon,
            18..=21 => PartOfDay::Evening,
            22..=23 => PartOfDay::LateEvening,
            0..=2 => PartOfDay::Midnight,
            _ => PartOfDay::EarlyMorning,
        }
    }

    /// First narrow part containing the whole period
    #[must_use]
    pub fn narrow_of_period(period: &WeatherPeriod) -> Option<PartOfDay> {
        PartOfDay::NARROW
            .into_iter()
            .find(|part| part.contains_period(period))
    }

    /// Narrow part, then night or daytime, then a combined part
    #[must_use]
    pub fn large_of_period(period: &WeatherPeriod) -> Option<PartOfDay> {
        PartOfDay::narrow_of_period(period)
            .or_else(|| {
                [PartOfDay::Night, PartOfDay::Daytime]
                    .into_iter()
                    .find(|part| part.contains_period(period))
            })
            .or_else(|| {
                PartOfDay::COMBINED
                    .into_iter()
                    .find(|part| part.contains_period(period))
            })
    }

    /// Finnish phrase key, "aamulla" or with `from_specifier` "aamusta alkaen"
    #[must_use]
    pub fn phrase(self, from_specifier: bool) -> &'static str {
        if let Some((first, _)) = self.components() {
            if from_specifier {
                return first.phrase(true);
            }
        }
        match (self, from_specifier) {
            (PartOfDay::Morning, false) => "aamulla",
            (PartOfDay::Morning, true) => "aamusta alkaen",
            (PartOfDay::Forenoon, false) => "aamupäivällä",
            (PartOfDay::Forenoon, true) => "aamupäivästä alkaen",
            (PartOfDay::Midday, false) => "keskipäivällä",
            (PartOfDay::Midday, true) => "keskipäivästä alkaen",
            (PartOfDay::Afternoon, false) => "iltapäivällä",
            (PartOfDay::Afternoon, true) => "iltapäivästä alkaen",
            (PartOfDay::Evening, false) => "illalla",
            (PartOfDay::Evening, true) => "illasta alkaen",
            (PartOfDay::LateEvening, false) => "iltayöllä",
            (PartOfDay::LateEvening, true) => "iltayöstä alkaen",
            (PartOfDay::Midnight, false) => "keskiyöllä",
            (PartOfDay::Midnight, true) => "keskiyöstä alkaen",
            (PartOfDay::EarlyMorning, false) => "aamuyöllä",
            (PartOfDay::EarlyMorning, true) => "aamuyöstä alkaen",
            (PartOfDay::Daytime, false) => "päivällä",
            (PartOfDay::Daytime, true) => "päivästä alkaen",
            (PartOfDay::Night, false) => "yöllä",
            (PartOfDay::Night, true) => "yöstä alkaen",
            (PartOfDay::EarlyMorningAndMorning, _) => "aamuyöllä ja aamulla",
            (PartOfDay::MorningAndForenoon, _) => "aamulla ja aamupäivällä",
            (PartOfDay::ForenoonAndMidday, _) => "aamupäivällä ja keskipäivällä",
            (PartOfDay::MiddayAndAfternoon, _) => "keskipäivällä ja iltapäivällä",
            (PartOfDay::AfternoonAndEvening, _) => "iltapäivällä ja illalla",
            (PartOfDay::EveningAndLateEvening, _) => "illalla ja iltayöllä",
            (PartOfDay::LateEveningAndMidnight, _) => "iltayöllä ja keskiyöllä",
        }
    }
}

impl fmt::Display for PartOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phrase(false))
    }
}
