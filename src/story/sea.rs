//! Story assembly for marine forecasts
//!
//! At sea only precipitation, fog and visibility are reported. Reported
//! precipitation periods close to each other are joined locally; the story
//! items themselves are left as they are.

use super::WeatherForecastStory;
use crate::models::{
    FogType, PrecipitationForm, PrecipitationIntensity, PrecipitationType, WeatherPeriod,
    hours_between,
};
use crate::text::{Paragraph, Sentence};
use tracing::debug;

/// Reported precipitation periods at most this far apart are joined
const SEA_JOIN_MAX_GAP_HOURS: i64 = 2;
/// Precipitation must cover more than this share of the area (%)
const SEA_MIN_EXTENT: f32 = 10.0;
/// Bad visibility must last at least this many hours
const BAD_VISIBILITY_MIN_HOURS: u32 = 3;

/// Precipitation period as reported at sea
#[derive(Debug, Clone)]
struct SeaPrecipitation {
    index: usize,
    period: WeatherPeriod,
    intensity: f32,
    extent: f32,
    form: PrecipitationForm,
    precipitation_type: PrecipitationType,
    poutaantuu: bool,
}

#[derive(Debug, Clone)]
enum SeaEntry {
    Precipitation(SeaPrecipitation),
    /// Cloudiness item with fog
    Fog(usize),
    /// Precipitation joined into an earlier entry
    Joined,
}

fn weighted(first: f32, first_hours: i64, second: f32, second_hours: i64) -> f32 {
    let total = first_hours + second_hours;
    if total <= 0 {
        return (first + second) / 2.0;
    }
    (first * first_hours as f32 + second * second_hours as f32) / total as f32
}

impl WeatherForecastStory<'_> {
    fn sea_entries(&self) -> Vec<SeaEntry> {
        let limits = &self.config.precipitation;
        let within_places = |extent: f32| {
            extent >= limits.in_some_places_lower_limit
                && extent <= limits.in_many_places_upper_limit
        };

        let mut entries: Vec<SeaEntry> = Vec::new();
        for index in 0..self.items.len() {
            let item = &self.items[index];
            if !item.included {
                continue;
            }
            let period = self.chain_period(index);

            if let Some(precipitation) = item.as_precipitation() {
                let form = self.merged_form(index);
                let sleet_or_snow =
                    form.intersects(PrecipitationForm::SLEET | PrecipitationForm::SNOW);
                let weak = self.is_weak_precipitation(index);
                let extent = self.merged_extent(index);
                debug!(
                    "Precipitation period at sea {}: weak {}, extent {}, sleet or snow {}",
                    period, weak, extent, sleet_or_snow
                );
                if !(sleet_or_snow || !weak) || extent <= SEA_MIN_EXTENT {
                    continue;
                }

                if let Some(SeaEntry::Precipitation(previous)) = entries.last_mut() {
                    if within_places(previous.extent)
                        && within_places(extent)
                        && hours_between(period.start(), previous.period.end())
                            <= SEA_JOIN_MAX_GAP_HOURS
                    {
                        debug!("Joining {} and {} at sea", previous.period, period);
                        previous.period = previous.period.with_end(period.end());
                        continue;
                    }
                }
                entries.push(SeaEntry::Precipitation(SeaPrecipitation {
                    index,
                    period,
                    intensity: self.merged_intensity(index),
                    extent,
                    form,
                    precipitation_type: precipitation.precipitation_type,
                    poutaantuu: precipitation.poutaantuu,
                }));
            } else if item.is_cloudiness()
                && !self.is_silent_trailing_cloudiness(index)
                && self.sources.fog.fog_info(&period).fog.is_fog()
            {
                entries.push(SeaEntry::Fog(index));
            }
        }
        entries
    }

    /// Successive precipitation entries of equal type and form are reported
    /// together with length-weighted intensity and extent
    fn join_equal_precipitation(entries: &mut [SeaEntry]) {
        let mut first = 0;
        for current in 1..entries.len() {
            let joined = match (&entries[first], &entries[current]) {
                (SeaEntry::Precipitation(head), SeaEntry::Precipitation(next))
                    if head.precipitation_type == next.precipitation_type
                        && head.form == next.form =>
                {
                    let head_hours = head.period.length_hours();
                    let next_hours = next.period.length_hours();
                    Some(SeaPrecipitation {
                        period: head.period.with_end(next.period.end()),
                        intensity: weighted(head.intensity, head_hours, next.intensity, next_hours),
                        extent: weighted(head.extent, head_hours, next.extent, next_hours),
                        ..head.clone()
                    })
                }
                _ => None,
            };
            match joined {
                Some(head) => {
                    entries[first] = SeaEntry::Precipitation(head);
                    entries[current] = SeaEntry::Joined;
                }
                None => first = current,
            }
        }
    }

    /// Fog sentence of one or two successive fog items
    fn sea_fog_sentence(&self, first: usize, second: Option<usize>) -> (Sentence, i64) {
        let fog = self.sources.fog;
        let first_info = fog.fog_info(&self.chain_period(first));
        let extensive = |kind: FogType| matches!(kind, FogType::Fog | FogType::FogPossiblyDense);

        let Some(second) = second else {
            let mut sentence = Sentence::new();
            if !first_info.sentence.is_empty() {
                sentence.append(&first_info.time_phrase);
                sentence.append(&first_info.sentence);
            }
            let hours = if !sentence.is_empty() && extensive(first_info.fog) {
                self.items[first].period.length_hours()
            } else {
                0
            };
            return (sentence, hours);
        };

        let second_info = fog.fog_info(&self.chain_period(second));
        let mut sentence = Sentence::new();
        match (first_info.sentence.is_empty(), second_info.sentence.is_empty()) {
            (false, false) => {
                let first_longer =
                    first_info.period.length_hours() > second_info.period.length_hours();
                let longer = if first_longer {
                    &first_info.sentence
                } else {
                    &second_info.sentence
                };
                sentence.append(&first_info.time_phrase);
                sentence.push("ja");
                sentence.append(&second_info.time_phrase);
                sentence.append(longer);
            }
            (false, true) => {
                sentence.append(&first_info.time_phrase);
                sentence.append(&first_info.sentence);
            }
            (true, false) => {
                sentence.append(&second_info.time_phrase);
                sentence.append(&second_info.sentence);
            }
            (true, true) => {}
        }

        let mut hours = 0;
        if extensive(first_info.fog) {
            hours += self.items[first].period.length_hours();
        }
        if extensive(second_info.fog) {
            hours += self.items[second].period.length_hours();
        }
        (sentence, hours)
    }

    /// The forecast story at sea: precipitation, fog and visibility
    #[tracing::instrument(skip(self))]
    pub fn weather_forecast_story_at_sea(&mut self) -> Paragraph {
        debug!("Start processing weather forecast at sea");
        self.reset_render_state();
        self.ctx.use_icing_phrase = false;

        let limits = self.config.precipitation.clone();
        let forecast_hours = self.forecast_period.length_hours();

        let mut entries = self.sea_entries();
        if let Some(first) = entries.iter().find_map(|entry| match entry {
            SeaEntry::Precipitation(precipitation) => Some(precipitation.period.start()),
            SeaEntry::Fog(index) => Some(self.chain_period(*index).start()),
            SeaEntry::Joined => None,
        }) {
            // The first sentence gets a time phrase when the story starts late
            if first > self.forecast_period.start() {
                self.story_size += 1;
            }
        }
        Self::join_equal_precipitation(&mut entries);

        let mut sentences: Vec<Sentence> = Vec::new();
        let mut precipitation_hours = 0;
        let mut precipitation_and_fog_hours = 0;
        let mut bad_visibility_hours = 0;
        let mut bad_visibility = false;
        let mut in_many_places = false;
        let mut snow_involved = false;
        let mut pending_fog: Option<usize> = None;

        for position in 0..entries.len() {
            match &entries[position] {
                SeaEntry::Joined => {}
                SeaEntry::Fog(index) => {
                    let index = *index;
                    if matches!(entries.get(position + 1), Some(SeaEntry::Fog(_))) {
                        pending_fog.get_or_insert(index);
                        continue;
                    }
                    let (sentence, hours) = match pending_fog.take() {
                        Some(first) => self.sea_fog_sentence(first, Some(index)),
                        None => self.sea_fog_sentence(index, None),
                    };
                    debug!("Fog at sea: {}", sentence);
                    precipitation_and_fog_hours += hours;
                    if !sentence.is_empty() {
                        self.story_size += sentence.len();
                        sentences.push(sentence);
                    }
                }
                SeaEntry::Precipitation(entry) => {
                    let entry = entry.clone();
                    if entry.extent <= SEA_MIN_EXTENT {
                        debug!("Extent {} at {} too small at sea", entry.extent, entry.period);
                        continue;
                    }
                    let weak =
                        PrecipitationIntensity::classify(entry.form, entry.intensity, &limits)
                            == PrecipitationIntensity::Weak;
                    if !weak
                        && entry.form.is_wintry()
                        && entry.extent >= limits.in_many_places_lower_limit
                    {
                        let precipitation = self.sources.precipitation;
                        let moderate = precipitation
                            .precipitation_hours(PrecipitationIntensity::Moderate, &entry.period);
                        let heavy = precipitation
                            .precipitation_hours(PrecipitationIntensity::Heavy, &entry.period);
                        bad_visibility_hours += moderate + heavy;
                        bad_visibility = true;
                    }

                    let own_period = self.items[entry.index].period;
                    let sentence = self
                        .precipitation_sentence_for(entry.index, entry.period, own_period)
                        .sentence;
                    self.story_size += sentence.len();
                    debug!("Precipitation at sea {}: {}", entry.period, sentence);

                    if !sentence.is_empty() || entry.poutaantuu {
                        sentences.push(sentence);
                        in_many_places = in_many_places
                            || (entry.extent > limits.in_many_places_lower_limit
                                && entry.extent <= limits.in_many_places_upper_limit);
                        let hours = entry.period.length_hours();
                        if entry.precipitation_type == PrecipitationType::Continuous
                            && entry.extent >= limits.in_many_places_upper_limit
                        {
                            precipitation_and_fog_hours += hours;
                        }
                        precipitation_hours += hours;
                        snow_involved =
                            snow_involved || entry.form.contains(PrecipitationForm::SNOW);
                    }
                }
            }
        }

        if sentences.is_empty() {
            sentences.push(Sentence::from_phrase("hyvä näkyvyys"));
        } else if !self.config.story.short_text_mode
            && precipitation_hours != 0
            && forecast_hours > 0
        {
            let share = precipitation_hours as f32 / forecast_hours as f32;
            if bad_visibility && share > 0.5 && bad_visibility_hours >= BAD_VISIBILITY_MIN_HOURS
            {
                sentences.push(Sentence::from_phrase("huono näkyvyys"));
            } else if share <= 0.5 && !in_many_places {
                if let Some(last) = sentences.last_mut() {
                    last.delimiter(",").push("enimmäkseen hyvä näkyvyys");
                }
            } else if !snow_involved
                && (precipitation_and_fog_hours < forecast_hours || in_many_places)
            {
                if let Some(last) = sentences.last_mut() {
                    last.delimiter(",").push("muuten hyvä näkyvyys");
                }
            }
        }

        debug!(
            "Weather forecast at sea: continuous precipitation or extensive fog {} h, \
             forecast {} h, precipitation {} h, bad visibility {} h, in many places {}",
            precipitation_and_fog_hours,
            forecast_hours,
            precipitation_hours,
            bad_visibility_hours,
            in_many_places
        );

        let mut paragraph = Paragraph::new();
        for sentence in sentences {
            paragraph.push(sentence);
        }
        paragraph
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::StoryConfig;
    use crate::scenario::FogEntry;

    #[test]
    fn test_dry_sea_has_good_visibility() {
        let scenario = create_test_scenario();
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story_at_sea();

        assert_eq!(paragraph.len(), 1);
        assert!(paragraph.sentences()[0].contains_phrase("hyvä näkyvyys"));
        assert!(!story.render_context().use_icing_phrase);
    }

    #[test]
    fn test_short_scattered_rain_mostly_good_visibility() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 1.0, 30.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story_at_sea();

        assert_eq!(paragraph.len(), 1);
        let sentence = &paragraph.sentences()[0];
        assert!(sentence.contains_phrase("sadekuuroja"));
        assert!(sentence.contains_phrase("enimmäkseen hyvä näkyvyys"));
    }

    #[test]
    fn test_weak_rain_not_reported_at_sea() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.2, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story_at_sea();

        assert_eq!(paragraph.len(), 1);
        assert!(paragraph.sentences()[0].contains_phrase("hyvä näkyvyys"));
    }

    #[test]
    fn test_long_snow_gives_bad_visibility() {
        let mut scenario = create_test_scenario();
        let mut snow = rain((1, 6), (2, 6), 1.0, 70.0, PrecipitationType::Continuous);
        snow.form = PrecipitationForm::SNOW;
        snow.moderate_hours = 10;
        scenario.precipitation.push(snow);
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story_at_sea();

        assert_eq!(paragraph.len(), 2);
        assert!(paragraph.sentences()[1].contains_phrase("huono näkyvyys"));
    }

    #[test]
    fn test_successive_fog_reported_together() {
        let mut scenario = create_test_scenario();
        // Weak rain between the fog periods is not reported at sea
        scenario.precipitation.push(rain((1, 12), (1, 14), 0.2, 60.0, PrecipitationType::Continuous));
        scenario.fog.push(FogEntry {
            period: period((1, 6), (1, 9)),
            fog: FogType::Fog,
        });
        scenario.fog.push(FogEntry {
            period: period((1, 23), (2, 5)),
            fog: FogType::FogInManyPlaces,
        });
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story_at_sea();

        assert_eq!(paragraph.len(), 1);
        let fog_sentence = &paragraph.sentences()[0];
        assert!(fog_sentence.contains_phrase("aamulla"));
        assert!(fog_sentence.contains_phrase("ja"));
        // The sentence of the longer fog period is used
        assert!(fog_sentence.contains_phrase("monin paikoin sumua"));
    }

    #[test]
    fn test_silent_trailing_cloudiness_reports_no_fog() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 6), (2, 3), 1.0, 95.0, PrecipitationType::Continuous));
        scenario.fog.push(FogEntry {
            period: period((2, 4), (2, 6)),
            fog: FogType::Fog,
        });
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        assert!(story.items()[1].is_included());
        assert!(story.is_silent_trailing_cloudiness(1));

        let paragraph = story.weather_forecast_story_at_sea();
        assert_eq!(paragraph.len(), 1);
        assert!(paragraph.sentences()[0].contains_phrase("sadetta"));
        assert!(!paragraph.sentences()[0].contains_phrase("sumua"));
    }

    #[test]
    fn test_equal_precipitation_entries_joined() {
        let hours = |start: u32, end: u32| period((1, start), (1, end));
        let entry = |index, period, intensity, extent| {
            SeaEntry::Precipitation(SeaPrecipitation {
                index,
                period,
                intensity,
                extent,
                form: PrecipitationForm::WATER,
                precipitation_type: PrecipitationType::Showers,
                poutaantuu: true,
            })
        };
        let mut entries = vec![
            entry(1, hours(8, 10), 1.0, 30.0),
            entry(3, hours(14, 20), 2.0, 60.0),
            SeaEntry::Fog(4),
            entry(5, hours(22, 23), 1.0, 30.0),
        ];
        WeatherForecastStory::join_equal_precipitation(&mut entries);

        let SeaEntry::Precipitation(head) = &entries[0] else {
            panic!("expected precipitation");
        };
        assert_eq!(head.period, hours(8, 20));
        // 2 h at 30 % and 6 h at 60 %
        assert!((head.extent - 52.5).abs() < 1e-4);
        assert!(matches!(entries[1], SeaEntry::Joined));
        assert!(matches!(entries[3], SeaEntry::Precipitation(_)));
    }
}
