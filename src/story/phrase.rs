//! Time phrases for story items

use crate::models::{PartOfDay, WeatherPeriod};
use crate::text::Sentence;
use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use std::collections::{BTreeSet, HashMap};

/// Coarse phases used when a period fits no named part of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayPhase {
    Night,
    Morning,
    Day,
    Evening,
    NightAndMorning,
    MorningAndDay,
    DayAndEvening,
    EveningAndNight,
}

impl DayPhase {
    const ALL: [DayPhase; 8] = [
        DayPhase::Night,
        DayPhase::Morning,
        DayPhase::Day,
        DayPhase::Evening,
        DayPhase::NightAndMorning,
        DayPhase::MorningAndDay,
        DayPhase::DayAndEvening,
        DayPhase::EveningAndNight,
    ];

    /// Start and end hour; the window ends on the next day when end < start
    fn hours(self) -> (u32, u32) {
        match self {
            DayPhase::Night => (21, 6),
            DayPhase::Morning => (5, 10),
            DayPhase::Day => (10, 18),
            DayPhase::Evening => (17, 22),
            DayPhase::NightAndMorning => (21, 10),
            DayPhase::MorningAndDay => (5, 18),
            DayPhase::DayAndEvening => (10, 22),
            DayPhase::EveningAndNight => (17, 6),
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            DayPhase::Night => "yöllä",
            DayPhase::Morning => "aamulla",
            DayPhase::Day => "päivällä",
            DayPhase::Evening => "illalla",
            DayPhase::NightAndMorning => "yöllä ja aamulla",
            DayPhase::MorningAndDay => "aamulla ja päivällä",
            DayPhase::DayAndEvening => "päivällä ja illalla",
            DayPhase::EveningAndNight => "illalla ja yöllä",
        }
    }

    /// The phase window anchored on the day `timestamp` falls on
    fn window(self, timestamp: NaiveDateTime) -> Option<WeatherPeriod> {
        let (start_hour, end_hour) = self.hours();
        let date = timestamp.date();
        let start = date.and_time(NaiveTime::from_hms_opt(start_hour, 0, 0)?);
        let mut end = date.and_time(NaiveTime::from_hms_opt(end_hour, 0, 0)?);
        if end_hour < start_hour {
            end += TimeDelta::days(1);
        }
        WeatherPeriod::new(start, end).ok()
    }

    /// Share of `period` covered by this phase
    fn coverage(self, period: &WeatherPeriod) -> f64 {
        let length = period.length_hours();
        if length <= 0 {
            return 0.0;
        }
        self.window(period.start())
            .and_then(|window| window.intersection(period))
            .map_or(0.0, |common| common.length_hours() as f64 / length as f64)
    }
}

/// Weekday (1 = Monday) used to prefix a part-of-day phrase
fn day_number(part: PartOfDay, period: &WeatherPeriod) -> Option<u32> {
    match part {
        PartOfDay::EarlyMorning | PartOfDay::EarlyMorningAndMorning => {
            Some(period.end().weekday().number_from_monday())
        }
        PartOfDay::Midnight
        | PartOfDay::Night
        | PartOfDay::ForenoonAndMidday
        | PartOfDay::MiddayAndAfternoon => None,
        _ => Some(period.start().weekday().number_from_monday()),
    }
}

/// Cached period phrases for one story assembly
///
/// The first phrase naming a part of a given weekday carries the weekday
/// number (`"3-aamulla"`); later phrases of the same weekday do not.
#[derive(Debug, Clone)]
pub struct PeriodPhraseGenerator {
    day_numbers: BTreeSet<u32>,
    phrases: HashMap<WeatherPeriod, Sentence>,
    coverage_ratio: f64,
}

impl PeriodPhraseGenerator {
    #[must_use]
    pub fn new(coverage_ratio: f64) -> Self {
        Self {
            day_numbers: BTreeSet::new(),
            phrases: HashMap::new(),
            coverage_ratio,
        }
    }

    /// Phrase for `period`, empty when no part of the day describes it
    pub fn period_phrase(&mut self, period: &WeatherPeriod) -> Sentence {
        if let Some(cached) = self.phrases.get(period) {
            return cached.clone();
        }

        let mut phrase = Sentence::new();
        match PartOfDay::large_of_period(period) {
            Some(PartOfDay::Night) => {
                phrase.push("yöllä");
            }
            Some(part) => {
                let prefix = match day_number(part, period) {
                    Some(day) if self.day_numbers.insert(day) => format!("{day}-"),
                    _ => String::new(),
                };
                phrase.push(format!("{prefix}{}", part.phrase(false)));
            }
            None => {
                let mut best: Option<(DayPhase, f64)> = None;
                for phase in DayPhase::ALL {
                    let share = phase.coverage(period);
                    if share > best.map_or(0.0, |(_, top)| top) {
                        best = Some((phase, share));
                    }
                }
                if let Some((phase, share)) = best {
                    if share >= self.coverage_ratio {
                        phrase.push(phase.phrase());
                    }
                }
            }
        }

        self.phrases.insert(*period, phrase.clone());
        phrase
    }

    /// Forget mentioned weekdays and cached phrases
    pub fn reset(&mut self) {
        self.day_numbers.clear();
        self.phrases.clear();
    }

    /// Forget cached phrases but keep the mentioned weekdays
    pub fn clear_phrase_cache(&mut self) {
        self.phrases.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self, period: &WeatherPeriod) -> bool {
        self.phrases.contains_key(period)
    }
}

/// 06:00 is both early morning and morning: morning when the forecast
/// starts there, early morning otherwise
pub(crate) fn aamuyo_or_aamu_phrase(
    period: &WeatherPeriod,
    forecast_start: NaiveDateTime,
    from_specifier: bool,
) -> Option<&'static str> {
    if period.start() != period.end() || period.start().hour() != 6 {
        return None;
    }
    let part = if period.start() == forecast_start {
        PartOfDay::Morning
    } else {
        PartOfDay::EarlyMorning
    };
    Some(part.phrase(from_specifier))
}

/// Largest part of the day describing `period`
///
/// With `from_specifier` a period matching no part is named after the part
/// it starts in ("iltapäivästä alkaen").
pub(crate) fn large_time_phrase(period: &WeatherPeriod, from_specifier: bool) -> Sentence {
    match PartOfDay::large_of_period(period) {
        Some(part) => Sentence::from_phrase(part.phrase(from_specifier)),
        None if from_specifier => {
            Sentence::from_phrase(PartOfDay::of_timestamp(period.start()).phrase(true))
        }
        None => Sentence::new(),
    }
}
