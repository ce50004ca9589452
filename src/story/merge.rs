//! Merge passes over the story item arena
//!
//! Both passes follow the same pattern: a switch in the dominant phenomenon
//! is not narrated when the interruption is brief and weak. Cloudiness runs
//! first so that weak precipitation blips are already suppressed when the
//! precipitation pass looks for neighbours.

use super::WeatherForecastStory;
use crate::models::{WeatherPeriod, hours_between, shift_hours};
use tracing::debug;

/// Hours strictly between two items, trimmed by one hour on each side
fn gap_length(previous: &WeatherPeriod, current: &WeatherPeriod) -> i64 {
    let gap_start = shift_hours(previous.end(), 1);
    let gap_end = if gap_start < current.start() {
        shift_hours(current.start(), -1)
    } else {
        current.start()
    };
    hours_between(gap_end, gap_start).max(0)
}

impl WeatherForecastStory<'_> {
    /// Collapse short and weak interruptions into merge chains
    pub(crate) fn merge_periods_when_feasible(&mut self) {
        self.log_story_items("story items before merge");

        self.merge_cloudiness_periods_when_feasible();
        self.merge_precipitation_periods_when_feasible();

        debug!("******** story items after merge ********");
        for (index, item) in self.items.iter().enumerate() {
            if !item.included {
                continue;
            }
            match item.merge_with {
                Some(partner) => debug!(
                    "{} merged periods: {} and {}",
                    self.chain_period(index),
                    item.period,
                    self.items[partner].period
                ),
                None => debug!("{}", self.chain_period(index)),
            }
        }
    }

    fn included_indexes(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.included)
            .map(|(index, _)| index)
            .collect()
    }

    /// `later` is absorbed by `earlier` and no longer reported on its own
    fn link_merge(&mut self, earlier: usize, later: usize) {
        self.items[earlier].merge_with = Some(later);
        self.items[later].merged_into = Some(earlier);
        self.items[later].included = false;
    }

    fn merge_precipitation_periods_when_feasible(&mut self) {
        let limits = self.config.merge.clone();
        let indexes = self.included_indexes();
        let mut previous_precipitation: Option<usize> = None;

        for (position, &current) in indexes.iter().enumerate() {
            if !self.items[current].included || !self.items[current].is_precipitation() {
                continue;
            }
            let Some(previous) = previous_precipitation else {
                previous_precipitation = Some(current);
                continue;
            };
            // Always set here: `previous` precedes `current` in the included list
            let previous_story_item = indexes[position - 1];

            let previous_period = self.items[previous].period;
            let current_period = self.items[current].period;
            if hours_between(current_period.start(), previous_period.end())
                <= limits.poutaantuu_gap_hours
            {
                if let Some(precipitation) = self.items[previous].as_precipitation_mut() {
                    precipitation.report_poutaantuu = false;
                }
            }

            let (Some(previous_item), Some(current_item)) = (
                self.items[previous].as_precipitation(),
                self.items[current].as_precipitation(),
            ) else {
                previous_precipitation = Some(current);
                continue;
            };
            if previous_item.precipitation_type != current_item.precipitation_type
                && !(previous_item.thunder && current_item.thunder)
            {
                if previous_story_item != previous
                    && self.story_item_period_length(previous_story_item)
                        <= limits.short_item_hours
                {
                    debug!(
                        "Dropping short gap item {} between {} and {}",
                        self.items[previous_story_item].period, previous_period, current_period
                    );
                    self.items[previous_story_item].included = false;
                }
                previous_precipitation = Some(current);
                continue;
            }

            let gap = gap_length(&previous_period, &current_period);
            let combined = self.story_item_period_length(current)
                + self.story_item_period_length(previous)
                + limits.precipitation_merge_slack_hours;
            if gap <= limits.precipitation_merge_max_gap_hours && gap <= combined {
                debug!("Merging precipitation {} and {}", previous_period, current_period);
                self.link_merge(previous, current);
                if self.items[previous_story_item].is_cloudiness() {
                    self.items[previous_story_item].included = false;
                }
            }
            previous_precipitation = Some(current);
        }

        let indexes = self.included_indexes();
        if indexes.len() < 2 {
            return;
        }
        let (first, second) = (indexes[0], indexes[1]);
        if self.items[first].is_precipitation()
            && self.items[second].is_cloudiness()
            && self.items[first].period.length_hours() <= limits.short_item_hours
            && self.items[first].merge_with.is_none()
        {
            debug!("Dropping short leading precipitation {}", self.items[first].period);
            self.items[first].included = false;
        }

        let (before_last, last) = (indexes[indexes.len() - 2], indexes[indexes.len() - 1]);
        if self.items[last].is_precipitation()
            && self.items[last].period.length_hours() <= limits.short_item_hours
            && self.items[before_last].is_cloudiness()
            && self.items[before_last].included
        {
            debug!("Dropping short trailing precipitation {}", self.items[last].period);
            self.items[last].included = false;
        }
    }

    fn merge_cloudiness_periods_when_feasible(&mut self) {
        let limits = self.config.merge.clone();
        let mut previous_cloudiness: Option<usize> = None;

        for current in self.included_indexes() {
            if !self.items[current].included {
                continue;
            }
            let Some(interrupting) = self.items[current]
                .as_cloudiness()
                .map(|cloudiness| cloudiness.previous_precipitation)
            else {
                continue;
            };

            if let Some(previous) = previous_cloudiness {
                let gap = gap_length(&self.items[previous].period, &self.items[current].period);
                if let Some(precipitation_index) = interrupting {
                    let weak = self.items[precipitation_index]
                        .as_precipitation()
                        .is_some_and(|precipitation| {
                            precipitation.intensity <= limits.cloudiness_merge_max_intensity
                        });
                    if gap <= limits.cloudiness_merge_max_gap_hours && weak {
                        debug!(
                            "Merging cloudiness {} and {} over {}",
                            self.items[previous].period,
                            self.items[current].period,
                            self.items[precipitation_index].period
                        );
                        self.link_merge(previous, current);
                        self.items[precipitation_index].included = false;
                    }
                }
            }
            previous_cloudiness = Some(current);
        }

        let indexes = self.included_indexes();
        if indexes.len() < 2 {
            return;
        }
        let (first, second) = (indexes[0], indexes[1]);
        if self.items[first].is_cloudiness()
            && self.items[second].is_precipitation()
            && self.items[first].period.length_hours() <= limits.short_item_hours
            && self.items[first].merge_with.is_none()
        {
            debug!("Dropping short leading cloudiness {}", self.items[first].period);
            self.items[first].included = false;
        }

        let (before_last, last) = (indexes[indexes.len() - 2], indexes[indexes.len() - 1]);
        if self.items[last].is_cloudiness()
            && self.items[last].period.length_hours() <= limits.short_item_hours
            && self.items[before_last].is_precipitation()
            && self.items[before_last].included
        {
            debug!("Dropping short trailing cloudiness {}", self.items[last].period);
            self.items[last].included = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::StoryConfig;
    use crate::models::PrecipitationType;

    fn precipitation_indexes(story: &WeatherForecastStory<'_>) -> Vec<usize> {
        story
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_precipitation())
            .map(|(index, _)| index)
            .collect()
    }

    #[test]
    fn test_gap_length_trims_both_ends() {
        assert_eq!(gap_length(&period((1, 6), (1, 9)), &period((1, 10), (1, 12))), 0);
        assert_eq!(gap_length(&period((1, 6), (1, 9)), &period((1, 11), (1, 12))), 0);
        assert_eq!(gap_length(&period((1, 6), (1, 9)), &period((1, 12), (1, 14))), 1);
        assert_eq!(gap_length(&period((1, 6), (1, 9)), &period((1, 15), (1, 18))), 4);
    }

    #[test]
    fn test_close_precipitation_suppresses_clearing_up() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 13), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 14), (1, 17), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let precipitation = precipitation_indexes(&story);
        let earlier = story.items()[precipitation[0]].as_precipitation().unwrap();
        assert!(earlier.poutaantuu);
        assert!(!earlier.report_poutaantuu);
        assert_eq!(story.items()[precipitation[0]].merge_with(), Some(precipitation[1]));
        assert_eq!(story.items()[precipitation[1]].merged_into(), Some(precipitation[0]));
        assert!(!story.items()[precipitation[1]].is_included());
    }

    #[test]
    fn test_different_types_never_merge() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 13), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 15), (1, 18), 0.5, 60.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let precipitation = precipitation_indexes(&story);
        assert_eq!(story.items()[precipitation[0]].merge_with(), None);
        assert!(story.items()[precipitation[1]].is_included());
        // The one-hour dry spell between them is not worth a sentence
        let between = &story.items()[precipitation[0] + 1];
        assert_eq!(between.period(), period((1, 14), (1, 14)));
        assert!(!between.is_included());
    }

    #[test]
    fn test_thunder_on_both_sides_allows_merge() {
        let mut scenario = create_test_scenario();
        let mut first = rain((1, 10), (1, 13), 0.5, 60.0, PrecipitationType::Continuous);
        first.thunder = true;
        let mut second = rain((1, 15), (1, 18), 0.5, 60.0, PrecipitationType::Showers);
        second.thunder = true;
        scenario.precipitation.push(first);
        scenario.precipitation.push(second);
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let precipitation = precipitation_indexes(&story);
        assert_eq!(story.items()[precipitation[0]].merge_with(), Some(precipitation[1]));
    }

    #[test]
    fn test_long_gap_prevents_merge() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 9), (1, 11), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 17), (1, 20), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let precipitation = precipitation_indexes(&story);
        assert_eq!(story.items()[precipitation[0]].merge_with(), None);
        assert!(story.items().iter().all(|item| item.is_included()));
    }

    #[test]
    fn test_merge_pass_is_idempotent() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 8), (1, 11), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 13), (1, 15), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 20), (1, 22), 0.5, 60.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let mut story = scenario.story(&config).unwrap();

        let links = |story: &WeatherForecastStory<'_>| -> Vec<_> {
            story
                .items()
                .iter()
                .map(|item| (item.merge_with(), item.merged_into(), item.is_included()))
                .collect()
        };
        let before = links(&story);
        story.merge_periods_when_feasible();
        assert_eq!(links(&story), before);
    }

    #[test]
    fn test_weak_blip_merges_cloudiness() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 11), 0.05, 20.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert_eq!(story.items().len(), 3);
        assert_eq!(story.items()[0].merge_with(), Some(2));
        assert!(!story.items()[1].is_included());
        assert!(!story.items()[2].is_included());
        assert_eq!(story.story_item_period(0), Some(period((1, 6), (2, 6))));
    }

    #[test]
    fn test_moderate_blip_keeps_cloudiness_apart() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 11), 0.5, 20.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert_eq!(story.items()[0].merge_with(), None);
        assert!(story.items()[1].is_included());
    }

    #[test]
    fn test_short_leading_precipitation_dropped() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 6), (1, 7), 0.5, 50.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert!(!story.items()[0].is_included());
        assert!(story.items()[1].is_included());
    }

    #[test]
    fn test_short_trailing_precipitation_dropped() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((2, 5), (2, 6), 0.5, 50.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert!(story.items()[0].is_included());
        assert!(!story.items()[1].is_included());
    }

    #[test]
    fn test_short_leading_cloudiness_dropped() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 8), (2, 6), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert_eq!(story.items()[0].period(), period((1, 6), (1, 7)));
        assert!(!story.items()[0].is_included());
        assert!(story.items()[1].is_included());
    }
}
