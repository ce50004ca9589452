//! Partition of the forecast period into precipitation and gap items

use super::item::{CloudinessItem, PrecipitationItem, StoryItem, StoryItemKind};
use super::WeatherForecastStory;
use crate::models::{WeatherPeriod, hours_between, shift_hours};
use crate::{Result, StoryError};
use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

/// Analyzer values that are not finite or negative count as no data
fn sanitize(value: f32, name: &str, period: &WeatherPeriod) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("Ignoring missing {} value {} for period {}", name, value, period);
        0.0
    }
}

impl WeatherForecastStory<'_> {
    /// Precipitation items with gap placeholders, covering the whole forecast period
    pub(crate) fn add_precipitation_story_items(&mut self) -> Result<()> {
        let precipitation = self.sources.precipitation;
        let forecast_period = self.forecast_period;
        let periods = precipitation.precipitation_periods(&forecast_period, self.area);

        let mut detected: Vec<StoryItem> = Vec::with_capacity(periods.len());
        let mut previous_end = None;
        for period in periods {
            if !forecast_period.contains_period(&period) {
                return Err(StoryError::invariant(format!(
                    "precipitation period {period} lies outside forecast period {forecast_period}"
                )));
            }
            if let Some(end) = previous_end {
                if period.start() <= end {
                    return Err(StoryError::invariant(format!(
                        "precipitation period {period} overlaps or precedes the previous period"
                    )));
                }
            }
            previous_end = Some(period.end());

            let intensity = sanitize(
                precipitation.mean_intensity(&period, self.area),
                "intensity",
                &period,
            );
            let extent = sanitize(
                precipitation.precipitation_extent(&period, self.area),
                "extent",
                &period,
            );
            if period.length_hours() <= self.config.merge.noise_max_hours
                && extent < self.config.merge.noise_min_extent
            {
                debug!("Skipping short precipitation period {} with extent {}", period, extent);
                continue;
            }

            let full_duration = precipitation
                .full_precipitation_period(period.start())
                .map_or(period.length_hours(), |full| full.length_hours());
            let poutaantuu = intensity > self.config.precipitation.weak_precipitation_limit_water;

            detected.push(StoryItem::new(
                period,
                StoryItemKind::Precipitation(PrecipitationItem {
                    intensity,
                    extent,
                    form: precipitation.precipitation_form(&period, self.area),
                    precipitation_type: precipitation.precipitation_type(&period, self.area),
                    thunder: precipitation.thunder_exists(&period, self.area),
                    poutaantuu,
                    report_poutaantuu: poutaantuu,
                    full_duration,
                }),
            ));
        }

        if detected.is_empty() {
            self.items = vec![StoryItem::new(
                forecast_period,
                StoryItemKind::Cloudiness(CloudinessItem {
                    cloudiness: self.sources.cloudiness.cloudiness_id(&forecast_period),
                    previous_precipitation: None,
                    next_precipitation: None,
                    report_dry_weather: true,
                    change_timestamp: None,
                }),
            )];
            return Ok(());
        }

        // Single forward pass: every gap between covered hours gets a placeholder
        let mut items = Vec::with_capacity(detected.len() * 2 + 1);
        let mut covered_until: Option<NaiveDateTime> = None;
        for item in detected {
            let start = item.period.start();
            match covered_until {
                None if hours_between(start, forecast_period.start()) > 0 => {
                    items.push(Self::placeholder(forecast_period.start(), shift_hours(start, -1))?);
                }
                Some(end) if hours_between(start, end) > 1 => {
                    items.push(Self::placeholder(shift_hours(end, 1), shift_hours(start, -1))?);
                }
                _ => {}
            }
            covered_until = Some(item.period.end());
            items.push(item);
        }
        if let Some(end) = covered_until {
            if hours_between(forecast_period.end(), end) > 0 {
                items.push(Self::placeholder(shift_hours(end, 1), forecast_period.end())?);
            }
        }

        self.items = items;
        Ok(())
    }

    fn placeholder(start: NaiveDateTime, end: NaiveDateTime) -> Result<StoryItem> {
        Ok(StoryItem::new(WeatherPeriod::new(start, end)?, StoryItemKind::Missing))
    }

    /// Replace every placeholder in place by a cloudiness item
    pub(crate) fn add_cloudiness_story_items(&mut self) {
        let mut previous_precipitation: Option<usize> = None;
        for index in 0..self.items.len() {
            match self.items[index].kind {
                StoryItemKind::Precipitation(_) => previous_precipitation = Some(index),
                StoryItemKind::Cloudiness(_) => {}
                StoryItemKind::Missing => {
                    let period = self.items[index].period;
                    let next_precipitation = self
                        .items
                        .get(index + 1)
                        .filter(|next| next.is_precipitation())
                        .map(|_| index + 1);

                    let mut report_dry_weather = previous_precipitation.is_none();
                    if let Some(previous) = previous_precipitation {
                        let previous_item = &mut self.items[previous];
                        let included = previous_item.included;
                        if let Some(precipitation) = previous_item.as_precipitation_mut() {
                            if included && precipitation.poutaantuu {
                                precipitation.report_poutaantuu = false;
                                report_dry_weather = false;
                            }
                        }
                    }

                    self.items[index].kind = StoryItemKind::Cloudiness(CloudinessItem {
                        cloudiness: self.sources.cloudiness.cloudiness_id(&period),
                        previous_precipitation,
                        next_precipitation,
                        report_dry_weather,
                        change_timestamp: None,
                    });
                }
            }
        }
    }

    /// Items must be ordered, non-overlapping and cover the forecast period
    pub(crate) fn verify_partition(&self) -> Result<()> {
        let (Some(first), Some(last)) = (self.items.first(), self.items.last()) else {
            return Err(StoryError::invariant("story has no items"));
        };
        if first.period.start() != self.forecast_period.start()
            || last.period.end() != self.forecast_period.end()
        {
            return Err(StoryError::invariant(format!(
                "story items {}...{} do not span forecast period {}",
                first.period.start(),
                last.period.end(),
                self.forecast_period
            )));
        }
        for pair in self.items.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let step = next.period.start() - previous.period.end();
            if step <= TimeDelta::zero() || step > TimeDelta::hours(1) {
                return Err(StoryError::invariant(format!(
                    "story items {} and {} are not adjacent",
                    previous.period, next.period
                )));
            }
        }
        if let Some(missing) = self
            .items
            .iter()
            .find(|item| matches!(item.kind, StoryItemKind::Missing))
        {
            return Err(StoryError::invariant(format!(
                "placeholder {} left unresolved",
                missing.period
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::WeatherForecastStory;
    use crate::config::StoryConfig;
    use crate::forecast::ForecastSources;
    use crate::models::{ForecastArea, PrecipitationType, StoryPartId, WeatherPeriod};
    use crate::scenario::Scenario;
    use crate::StoryError;

    fn story_from_periods(scenario: &Scenario, periods: Vec<WeatherPeriod>) -> Option<StoryError> {
        let precipitation = FixedPeriods { periods, scenario };
        let sources = ForecastSources {
            precipitation: &precipitation,
            ..ForecastSources::from_single(scenario)
        };
        let config = StoryConfig::default();
        WeatherForecastStory::new(scenario.forecast_period, ForecastArea::FULL, sources, &config)
            .err()
    }

    #[test]
    fn test_empty_forecast_is_one_dry_cloudiness_item() {
        let scenario = create_test_scenario();
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert_eq!(story.items().len(), 1);
        let item = &story.items()[0];
        assert_eq!(item.part_id(), StoryPartId::Cloudiness);
        assert_eq!(item.period(), period((1, 6), (2, 6)));
        assert!(item.as_cloudiness().unwrap().report_dry_weather);
    }

    #[test]
    fn test_gaps_become_cloudiness_items() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let periods: Vec<_> = story.items().iter().map(|item| item.period()).collect();
        assert_eq!(
            periods,
            vec![
                period((1, 6), (1, 9)),
                period((1, 10), (1, 14)),
                period((1, 15), (2, 6)),
            ]
        );
        let leading = story.items()[0].as_cloudiness().unwrap();
        assert!(leading.report_dry_weather);
        assert_eq!(leading.previous_precipitation, None);
        assert_eq!(leading.next_precipitation, Some(1));
        let trailing = story.items()[2].as_cloudiness().unwrap();
        assert!(!trailing.report_dry_weather);
        assert_eq!(trailing.previous_precipitation, Some(1));
    }

    #[test]
    fn test_adjacent_periods_need_no_placeholder() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 6), (1, 9), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 10), (1, 12), 0.5, 60.0, PrecipitationType::Showers));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert_eq!(story.items()[0].part_id(), StoryPartId::Precipitation);
        assert_eq!(story.items()[1].part_id(), StoryPartId::Precipitation);
        assert_eq!(story.items()[2].period(), period((1, 13), (2, 6)));
    }

    #[test]
    fn test_overlapping_periods_rejected() {
        let scenario = create_test_scenario();
        let error = story_from_periods(
            &scenario,
            vec![period((1, 10), (1, 14)), period((1, 14), (1, 16))],
        );
        assert!(matches!(error, Some(StoryError::Invariant { .. })));
    }

    #[test]
    fn test_period_outside_window_rejected() {
        let scenario = create_test_scenario();
        let error = story_from_periods(&scenario, vec![period((2, 4), (2, 9))]);
        assert!(matches!(error, Some(StoryError::Invariant { .. })));
    }

    #[test]
    fn test_rain_across_window_start_is_clipped() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 0), (1, 12), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let first = &story.items()[0];
        assert_eq!(first.period(), period((1, 6), (1, 12)));
        assert_eq!(first.as_precipitation().unwrap().full_duration, 12);
        assert_eq!(story.items()[1].period(), period((1, 13), (2, 6)));
    }

    #[test]
    fn test_rain_across_window_end_is_clipped() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((2, 4), (2, 9), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let last = story.items().last().unwrap();
        assert_eq!(last.period(), period((2, 4), (2, 6)));
        assert_eq!(last.as_precipitation().unwrap().full_duration, 5);
    }

    #[test]
    fn test_coastal_and_inland_rain_is_one_item() {
        let mut scenario = create_test_scenario();
        let mut coastal = rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous);
        coastal.area = ForecastArea::COASTAL;
        let mut inland = coastal.clone();
        inland.area = ForecastArea::INLAND;
        scenario.precipitation.push(coastal);
        scenario.precipitation.push(inland);
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let precipitation: Vec<_> =
            story.items().iter().filter(|item| item.is_precipitation()).collect();
        assert_eq!(precipitation.len(), 1);
        assert_eq!(precipitation[0].period(), period((1, 10), (1, 14)));
    }

    #[test]
    fn test_full_duration_from_collaborator() {
        let mut scenario = create_test_scenario();
        let mut entry = rain((1, 6), (1, 12), 0.5, 60.0, PrecipitationType::Continuous);
        entry.full_period = Some(period((1, 0), (1, 12)));
        scenario.precipitation.push(entry);
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();
        assert_eq!(story.items()[0].as_precipitation().unwrap().full_duration, 12);
    }
}
