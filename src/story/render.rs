//! Sentence realization per story item and story assembly on land

use super::phrase::{aamuyo_or_aamu_phrase, large_time_phrase};
use super::{StoryItemKind, WeatherForecastStory};
use crate::forecast::ComposedSentence;
use crate::models::{CloudinessId, PartOfDay, WeatherEventId, WeatherPeriod};
use crate::text::{Paragraph, Sentence};
use tracing::debug;

impl WeatherForecastStory<'_> {
    /// Connective for multi-item stories: "aluksi" first, "myöhemmin" after
    #[must_use]
    pub fn time_phrase(&self) -> Sentence {
        if !self.report_time_phrase {
            return Sentence::new();
        }
        if self.story_size == 0 {
            Sentence::from_phrase("aluksi")
        } else {
            Sentence::from_phrase("myöhemmin")
        }
    }

    /// Time phrase for an item, by default for its whole story period
    ///
    /// 06:00 is resolved first; plain phrases come from the cached period
    /// phrase generator and otherwise from the largest matching part of
    /// the day.
    fn item_period_phrase(
        &mut self,
        index: usize,
        from_specifier: bool,
        phrase_period: Option<WeatherPeriod>,
    ) -> Sentence {
        let phrase_period = phrase_period.unwrap_or_else(|| self.chain_period(index));

        let mut sentence = Sentence::new();
        if let Some(phrase) =
            aamuyo_or_aamu_phrase(&phrase_period, self.forecast_period.start(), from_specifier)
        {
            sentence.push(phrase);
        }
        if sentence.is_empty() && !from_specifier {
            sentence = self.phrases.period_phrase(&phrase_period);
        }
        if sentence.is_empty() {
            sentence = large_time_phrase(&phrase_period, from_specifier);
        }

        debug!("Phrase period {}: {}", phrase_period, sentence);
        sentence
    }

    /// Sentence of one item, empty when the item is not reported
    pub(crate) fn item_sentence(&mut self, index: usize) -> ComposedSentence {
        if !self.items[index].included {
            return ComposedSentence::default();
        }
        match self.items[index].kind {
            StoryItemKind::Precipitation(_) => {
                let story_period = self.chain_period(index);
                let own_period = self.items[index].period;
                self.precipitation_sentence_for(index, story_period, own_period)
            }
            StoryItemKind::Cloudiness(_) => self.cloudiness_sentence(index).into(),
            StoryItemKind::Missing => ComposedSentence::default(),
        }
    }

    /// Precipitation sentence of item `index` narrated over `story_period`
    pub(crate) fn precipitation_sentence_for(
        &mut self,
        index: usize,
        story_period: WeatherPeriod,
        own_period: WeatherPeriod,
    ) -> ComposedSentence {
        let precipitation = self.sources.precipitation;
        let forecast_period = self.forecast_period;
        let report_poutaantuu = self.items[index]
            .as_precipitation()
            .is_some_and(|item| item.report_poutaantuu);

        let mut composed = ComposedSentence::default();
        if story_period.length_hours() >= self.config.story.long_period_hours {
            let mut phrase = Sentence::new();
            let part = if story_period.start() != forecast_period.start() {
                if story_period.start() > forecast_period.start() {
                    phrase = self.item_period_phrase(index, true, Some(story_period));
                }
                if phrase.is_empty() {
                    phrase = self.time_phrase();
                }
                precipitation.precipitation_change_sentence(
                    &story_period,
                    &phrase,
                    WeatherEventId::PrecipitationStarts,
                    &mut self.ctx,
                )
            } else {
                phrase = self.time_phrase();
                precipitation.precipitation_sentence(&story_period, &phrase, &mut self.ctx)
            };
            composed.sentence.append(&part.sentence);
            composed.additional.extend(part.additional);

            if story_period.end() != forecast_period.end() && report_poutaantuu {
                let ending = WeatherPeriod::instant(story_period.end());
                let mut phrase = self.item_period_phrase(index, false, Some(ending));
                if phrase.is_empty() {
                    phrase = self.time_phrase();
                }
                if !composed.sentence.is_empty() {
                    composed.sentence.delimiter(",");
                }
                let ends = precipitation.precipitation_change_sentence(
                    &story_period,
                    &phrase,
                    WeatherEventId::PrecipitationEnds,
                    &mut self.ctx,
                );
                composed.sentence.append(&ends.sentence);
                composed.additional.extend(ends.additional);
            }
            self.short_time_precipitation_reported = false;
        } else {
            let mut phrase = Sentence::new();
            if own_period.start() > forecast_period.start() {
                phrase = self.item_period_phrase(index, false, Some(story_period));
            }
            if phrase.is_empty() {
                phrase = self.time_phrase();
            }

            if precipitation.short_term_precipitation_exists(&own_period) {
                composed.sentence = precipitation.short_term_precipitation_sentence(
                    &own_period,
                    &phrase,
                    &mut self.ctx,
                );
                self.short_time_precipitation_reported = true;
            } else {
                composed =
                    precipitation.precipitation_sentence(&story_period, &phrase, &mut self.ctx);
            }
        }
        composed
    }

    /// A short cloudiness tail right after the precipitation adds nothing
    pub(crate) fn is_silent_trailing_cloudiness(&self, index: usize) -> bool {
        let Some(item) = self.items[index].as_cloudiness() else {
            return false;
        };
        let story_period = self.chain_period(index);
        if story_period.end() != self.forecast_period.end()
            || story_period.length_hours() > self.config.story.trailing_cloudiness_max_hours
        {
            return false;
        }
        item.previous_precipitation
            .map(|previous| self.merge_root(previous))
            .filter(|&previous| self.items[previous].included)
            .is_some_and(|previous| {
                let previous_period = self.chain_period(previous);
                previous_period.length_hours() >= self.config.story.long_period_hours
                    || PartOfDay::narrow_of_period(&previous_period)
                        == PartOfDay::narrow_of_period(&story_period)
            })
    }

    /// Cloudiness sentence of item `index`, with clearing up after
    /// precipitation and a change clause when the sky changes
    pub(crate) fn cloudiness_sentence(&mut self, index: usize) -> Sentence {
        let Some(item) = self.items[index].as_cloudiness().cloned() else {
            return Sentence::new();
        };
        let cloudiness = self.sources.cloudiness;
        let precipitation = self.sources.precipitation;
        let forecast_period = self.forecast_period;
        let story_period = self.chain_period(index);
        let own_period = self.items[index].period;

        // A merged precipitation item is narrated by the head of its chain
        let previous_included = item
            .previous_precipitation
            .map(|previous| self.merge_root(previous))
            .filter(|&previous| self.items[previous].included);

        if self.is_silent_trailing_cloudiness(index) {
            return Sentence::new();
        }

        let mut change_timestamp = None;
        let mut change = Sentence::new();
        if let Some(event) = cloudiness.weather_events().into_iter().find(|event| {
            matches!(event.id, WeatherEventId::GettingCloudy | WeatherEventId::ClearingUp)
                && own_period.contains(event.timestamp)
        }) {
            let at_event = WeatherPeriod::instant(event.timestamp);
            change = cloudiness.cloudiness_change_sentence(&at_event);
            change_timestamp = Some(event.timestamp);
            debug!("Cloudiness change at {}: {}", event.timestamp, change);
        }
        let report_change = !change.is_empty()
            && cloudiness.cloudiness_id(&story_period) > CloudinessId::MostlyClear;

        let mut report_dry_weather = item.report_dry_weather;
        let mut poutaantuu = Sentence::new();
        let clearing_up = previous_included.filter(|&previous| {
            self.items[previous]
                .as_precipitation()
                .is_some_and(|precipitation| precipitation.poutaantuu)
        });
        if let Some(previous) = clearing_up {
            let cloudiness_id = cloudiness.cloudiness_id(&story_period);
            let ending = WeatherPeriod::instant(self.chain_period(previous).end());
            let mut phrase = self.item_period_phrase(index, true, Some(ending));
            if phrase.is_empty() {
                phrase = self.time_phrase();
            }
            poutaantuu = precipitation.poutaantuu_and_cloudiness_sentence(
                &phrase,
                cloudiness_id,
                &mut self.ctx,
            );
            if let Some(previous_item) = self.items[previous].as_precipitation_mut() {
                previous_item.report_poutaantuu = false;
            }
            report_dry_weather = false;
        }

        let mut sentence = Sentence::new();
        if !poutaantuu.is_empty() {
            sentence.append(&poutaantuu);
        } else {
            let mut phrase = Sentence::new();
            if story_period.start() > forecast_period.start() {
                if story_period.length_hours() >= self.config.story.long_period_hours {
                    if self.story_size > 0 {
                        phrase = self.item_period_phrase(index, true, None);
                    }
                } else {
                    phrase = self.item_period_phrase(index, false, Some(story_period));
                }
            }
            if phrase.is_empty() {
                phrase = self.time_phrase();
            }

            let described = match change_timestamp {
                Some(timestamp) if !change.is_empty() => story_period.with_end(timestamp),
                _ => story_period,
            };
            sentence = cloudiness.cloudiness_sentence(
                &described,
                report_dry_weather && !self.ctx.dry_period_tautology,
                &phrase,
                false,
            );
            self.ctx.dry_period_tautology = report_dry_weather;
        }
        if report_change {
            sentence.delimiter(",");
            sentence.append(&change);
        }

        if let Some(stored) = self.items[index].as_cloudiness_mut() {
            stored.report_dry_weather = report_dry_weather;
            stored.change_timestamp = change_timestamp;
        }
        self.cloudiness_reported = true;
        sentence
    }

    pub(crate) fn reset_render_state(&mut self) {
        self.phrases.reset();
        self.short_time_precipitation_reported = false;
        self.cloudiness_reported = false;
        self.story_size = 0;
        self.ctx.dry_period_tautology = false;
    }

    /// Number of included items that would produce a sentence
    ///
    /// Rendering mutates item flags and phrasing state, so both are restored
    /// afterwards.
    pub(crate) fn count_reported_items(&mut self) -> usize {
        let items = self.items.clone();
        let ctx = self.ctx.clone();

        self.reset_render_state();
        let mut count = 0;
        for index in 0..self.items.len() {
            if self.items[index].included && !self.item_sentence(index).sentence.is_empty() {
                count += 1;
            }
        }

        self.items = items;
        self.ctx = ctx;
        self.reset_render_state();
        count
    }

    /// The forecast story on land
    ///
    /// Items are narrated in time order; cloudiness items are followed by a
    /// possible fog sentence. When no item produced text the story is the
    /// precipitation sentence of the whole forecast period.
    #[tracing::instrument(skip(self))]
    pub fn weather_forecast_story(&mut self) -> Paragraph {
        debug!("Start processing weather forecast at land");
        self.reset_render_state();

        let mut paragraph = Paragraph::new();
        let multi_day = self.forecast_period.length_hours() > 24;
        for index in 0..self.items.len() {
            let crosses_day = index > 0
                && self.items[index - 1].period.end().date()
                    != self.items[index].period.end().date();
            if multi_day && crosses_day {
                self.phrases.clear_phrase_cache();
            }
            if self.items[index].merged_into.is_some() {
                continue;
            }

            let composed = self.item_sentence(index);
            if composed.sentence.is_empty() {
                continue;
            }
            self.story_size += composed.sentence.len();
            paragraph.push(composed.sentence);
            for additional in composed.additional {
                paragraph.push(additional.sentence);
            }

            if self.items[index].is_cloudiness() {
                let fog = self.sources.fog.fog_sentence(&self.items[index].period);
                self.story_size += fog.len();
                paragraph.push(fog);
            }
        }

        if self.story_size == 0 {
            let precipitation = self.sources.precipitation;
            let composed = precipitation.precipitation_sentence(
                &self.forecast_period,
                &Sentence::new(),
                &mut self.ctx,
            );
            paragraph.push(composed.sentence);
            for additional in composed.additional {
                paragraph.push(additional.sentence);
            }
        }

        paragraph
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::StoryConfig;
    use crate::forecast::{CloudinessForecast, ForecastSources};
    use crate::models::{ForecastArea, FogType, PrecipitationType, WeatherEvent};
    use crate::scenario::{CloudinessEntry, FogEntry, Scenario};

    #[test]
    fn test_three_sentences_for_single_rain_period() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        assert_eq!(paragraph.len(), 3);
        let sentences = paragraph.sentences();
        assert!(sentences[0].contains_phrase("poutaa"));
        assert!(sentences[1].contains_phrase("3-päivällä"));
        assert!(sentences[2].contains_phrase("iltapäivästä alkaen"));
        assert!(sentences[2].contains_phrase("sää poutaantuu"));
        assert!(story.cloudiness_reported());
    }

    #[test]
    fn test_second_day_is_phrased_after_day_change() {
        let mut scenario = Scenario::new(period((1, 6), (2, 20)));
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((2, 10), (2, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        let sentences = paragraph.sentences();
        assert!(sentences.iter().any(|sentence| sentence.contains_phrase("3-päivällä")));
        assert!(sentences.iter().any(|sentence| sentence.contains_phrase("4-päivällä")));
        let first_day_prefixes = sentences
            .iter()
            .flat_map(|sentence| sentence.phrases())
            .filter(|phrase| phrase.starts_with("3-"))
            .count();
        assert_eq!(first_day_prefixes, 1);
        assert!(!story.phrases.is_cached(&period((1, 10), (1, 14))));
        assert!(story.phrases.is_cached(&period((2, 10), (2, 14))));
    }

    #[test]
    fn test_single_day_keeps_phrase_cache() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        story.weather_forecast_story();

        assert!(story.phrases.is_cached(&period((1, 10), (1, 14))));
    }

    #[test]
    fn test_clearing_up_never_repeats_dry_weather() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 6), (1, 14), 1.0, 80.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        let last = paragraph.sentences().last().unwrap();
        assert!(last.contains_phrase("sää poutaantuu"));
        assert!(!last.contains_phrase("poutaa"));
        let cloudiness = story.items().iter().find_map(|item| item.as_cloudiness()).unwrap();
        assert!(!cloudiness.report_dry_weather);
    }

    #[test]
    fn test_long_rain_from_forecast_start_has_no_period_phrase() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 6), (1, 20), 1.0, 95.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        let first = &paragraph.sentences()[0];
        assert_eq!(first.phrases().next(), Some("sadetta"));
    }

    #[test]
    fn test_long_rain_later_reports_start() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 13), (2, 6), 1.0, 80.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        let rain_sentence = paragraph
            .sentences()
            .iter()
            .find(|sentence| sentence.contains_phrase("sadetta"))
            .unwrap();
        assert!(rain_sentence.contains_phrase("iltapäivästä alkaen"));
    }

    #[test]
    fn test_connectives_for_short_stories() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let mut config = StoryConfig::default();
        config.story.specify_part_of_the_day = false;
        let mut story = scenario.story(&config).unwrap();
        assert!(story.reports_time_phrase());

        let paragraph = story.weather_forecast_story();
        assert!(paragraph.sentences()[0].contains_phrase("aluksi"));
    }

    #[test]
    fn test_counting_leaves_items_untouched() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();

        let before = story.items().to_vec();
        assert_eq!(story.count_reported_items(), 3);
        assert_eq!(story.items(), before.as_slice());
        assert_eq!(story.story_size(), 0);
    }

    #[test]
    fn test_cloudiness_change_clause() {
        let mut scenario = create_test_scenario();
        scenario.cloudiness.push(CloudinessEntry {
            period: period((1, 6), (2, 6)),
            cover: 90.0,
        });
        scenario.cloudiness_events.push(WeatherEvent {
            timestamp: at(1, 15),
            id: WeatherEventId::GettingCloudy,
        });
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        let sentence = &paragraph.sentences()[0];
        assert!(sentence.contains_phrase(CloudinessId::Cloudy.phrase()));
        assert!(sentence.contains_phrase("pilvistyvää"));
        assert_eq!(
            story.items()[0].as_cloudiness().unwrap().change_timestamp,
            Some(at(1, 15))
        );
    }

    #[test]
    fn test_no_change_clause_when_mostly_clear() {
        let mut scenario = create_test_scenario();
        scenario.cloudiness.push(CloudinessEntry {
            period: period((1, 6), (2, 6)),
            cover: 20.0,
        });
        scenario.cloudiness_events.push(WeatherEvent {
            timestamp: at(1, 15),
            id: WeatherEventId::ClearingUp,
        });
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();
        assert!(!paragraph.sentences()[0].contains_phrase("selkenevää"));
    }

    #[test]
    fn test_fog_follows_cloudiness() {
        let mut scenario = create_test_scenario();
        scenario.fog.push(FogEntry {
            period: period((1, 6), (1, 9)),
            fog: FogType::FogInSomePlaces,
        });
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        assert_eq!(paragraph.len(), 2);
        assert!(paragraph.sentences()[1].contains_phrase("paikoin sumua"));
    }

    #[test]
    fn test_additional_sentence_follows_item() {
        let mut scenario = create_test_scenario();
        let mut entry = rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous);
        entry.heavy_hours = 2;
        scenario.precipitation.push(entry);
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        let paragraph = story.weather_forecast_story();

        assert_eq!(paragraph.len(), 4);
        assert!(paragraph.sentences()[2].contains_phrase("sade voi olla runsasta"));
    }

    #[test]
    fn test_short_term_precipitation_flag() {
        let mut scenario = create_test_scenario();
        let mut entry = rain((1, 10), (1, 12), 0.5, 30.0, PrecipitationType::Showers);
        entry.short_term = true;
        scenario.precipitation.push(entry);
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();
        story.weather_forecast_story();
        assert!(story.short_time_precipitation_reported());
    }

    /// Cloudiness source that never has anything to say
    struct SilentSky;

    impl CloudinessForecast for SilentSky {
        fn cloudiness_id(&self, _period: &WeatherPeriod) -> CloudinessId {
            CloudinessId::Clear
        }

        fn cloudiness_sentence(
            &self,
            _period: &WeatherPeriod,
            _report_dry_weather: bool,
            _time_phrase: &Sentence,
            _short_form: bool,
        ) -> Sentence {
            Sentence::new()
        }

        fn cloudiness_change_sentence(&self, _period: &WeatherPeriod) -> Sentence {
            Sentence::new()
        }

        fn weather_events(&self) -> Vec<WeatherEvent> {
            Vec::new()
        }
    }

    #[test]
    fn test_empty_story_falls_back_to_whole_period() {
        let scenario = create_test_scenario();
        let sources = ForecastSources {
            cloudiness: &SilentSky,
            ..ForecastSources::from_single(&scenario)
        };
        let config = StoryConfig::default();
        let mut story =
            WeatherForecastStory::new(scenario.forecast_period, ForecastArea::FULL, sources, &config)
                .unwrap();
        let paragraph = story.weather_forecast_story();

        assert_eq!(paragraph.len(), 1);
        assert!(paragraph.sentences()[0].contains_phrase("poutaa"));
    }
}
