//! Forecast story assembly
//!
//! A [`WeatherForecastStory`] partitions the forecast period into story
//! items, resolves gaps into cloudiness, merges short and weak interruptions
//! and finally narrates each item through the forecast collaborators.
//!
//! Items live in a single arena (`Vec<StoryItem>`); merge chains and the
//! links between cloudiness and precipitation items are arena indices.

mod item;
mod merge;
mod phrase;
mod render;
mod sea;
mod segment;

pub use item::{CloudinessItem, PrecipitationItem, StoryItem, StoryItemKind};
pub use phrase::PeriodPhraseGenerator;

use crate::config::StoryConfig;
use crate::forecast::{ForecastSources, RenderContext};
use crate::models::{
    ForecastArea, PrecipitationForm, PrecipitationIntensity, WeatherPeriod,
};
use crate::text::Sentence;
use crate::Result;
use tracing::debug;

/// Story of one forecast period for one forecast area
pub struct WeatherForecastStory<'a> {
    forecast_period: WeatherPeriod,
    area: ForecastArea,
    sources: ForecastSources<'a>,
    config: StoryConfig,
    items: Vec<StoryItem>,
    ctx: RenderContext,
    phrases: PeriodPhraseGenerator,
    story_size: usize,
    report_time_phrase: bool,
    short_time_precipitation_reported: bool,
    cloudiness_reported: bool,
}

impl<'a> WeatherForecastStory<'a> {
    /// Segment, resolve and merge the story items of `forecast_period`
    ///
    /// Fails with `StoryError::Invariant` when the precipitation collaborator
    /// returns periods that cannot form a partition of the forecast period.
    pub fn new(
        forecast_period: WeatherPeriod,
        area: ForecastArea,
        sources: ForecastSources<'a>,
        config: &StoryConfig,
    ) -> Result<Self> {
        let mut story = Self {
            forecast_period,
            area,
            sources,
            config: config.clone(),
            items: Vec::new(),
            ctx: RenderContext {
                use_olla_verb: config.story.use_olla_verb,
                ..RenderContext::default()
            },
            phrases: PeriodPhraseGenerator::new(config.story.phrase_coverage_ratio),
            story_size: 0,
            report_time_phrase: false,
            short_time_precipitation_reported: false,
            cloudiness_reported: false,
        };

        story.add_precipitation_story_items()?;
        story.add_cloudiness_story_items();
        story.verify_partition()?;
        story.merge_periods_when_feasible();

        if !story.config.story.specify_part_of_the_day {
            story.report_time_phrase = story.count_reported_items() > 1;
        }
        story.ctx.single_precipitation_form = story
            .items
            .iter()
            .filter(|item| item.included)
            .filter_map(StoryItem::as_precipitation)
            .all(|precipitation| precipitation.form.is_single());

        story.log_story_items("story items");
        Ok(story)
    }

    #[must_use]
    pub fn forecast_period(&self) -> WeatherPeriod {
        self.forecast_period
    }

    #[must_use]
    pub fn area(&self) -> ForecastArea {
        self.area
    }

    #[must_use]
    pub fn items(&self) -> &[StoryItem] {
        &self.items
    }

    #[must_use]
    pub fn render_context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Glyph count of the story assembled so far
    #[must_use]
    pub fn story_size(&self) -> usize {
        self.story_size
    }

    #[must_use]
    pub fn reports_time_phrase(&self) -> bool {
        self.report_time_phrase
    }

    #[must_use]
    pub fn short_time_precipitation_reported(&self) -> bool {
        self.short_time_precipitation_reported
    }

    #[must_use]
    pub fn cloudiness_reported(&self) -> bool {
        self.cloudiness_reported
    }

    /// Period of item `index` extended through its merge chain, `None` when
    /// there is no such item
    #[must_use]
    pub fn story_item_period(&self, index: usize) -> Option<WeatherPeriod> {
        (index < self.items.len()).then(|| self.chain_period(index))
    }

    pub(crate) fn chain_period(&self, index: usize) -> WeatherPeriod {
        let own = self.items[index].period;
        let mut cursor = index;
        let mut end = own.end();
        // Chains only point forward, so the walk is bounded by the arena length
        for _ in 0..self.items.len() {
            let Some(next) = self.items[cursor].merge_with else {
                break;
            };
            end = self.items[next].period.end();
            cursor = next;
        }
        own.with_end(end)
    }

    /// Standalone thunder sentence for `period` in the story's area
    #[must_use]
    pub fn thunder_sentence(&self, period: &WeatherPeriod) -> Sentence {
        self.sources.thunder.thunder_sentence(period, self.area)
    }

    /// First item of the merge chain `index` belongs to
    pub(crate) fn merge_root(&self, index: usize) -> usize {
        let mut cursor = index;
        for _ in 0..self.items.len() {
            match self.items[cursor].merged_into {
                Some(earlier) => cursor = earlier,
                None => break,
            }
        }
        cursor
    }

    pub(crate) fn story_item_period_length(&self, index: usize) -> i64 {
        self.chain_period(index).length_hours()
    }

    /// Length-weighted value over an item and its direct merge partner
    fn weighted<F>(&self, index: usize, value: F) -> Option<f32>
    where
        F: Fn(&PrecipitationItem) -> f32,
    {
        let item = &self.items[index];
        let own = item.as_precipitation()?;
        let Some(partner_index) = item.merge_with else {
            return Some(value(own));
        };
        let Some(partner) = self.items[partner_index].as_precipitation() else {
            return Some(value(own));
        };
        let own_length = item.period.length_hours() as f32;
        let partner_length = self.items[partner_index].period.length_hours() as f32;
        let total = own_length + partner_length;
        if total <= 0.0 {
            return Some((value(own) + value(partner)) / 2.0);
        }
        Some((value(own) * own_length + value(partner) * partner_length) / total)
    }

    /// Extent (%) of a precipitation item, averaged with its merge partner
    pub(crate) fn merged_extent(&self, index: usize) -> f32 {
        self.weighted(index, |p| p.extent).unwrap_or(0.0)
    }

    /// Intensity (mm/h) of a precipitation item, averaged with its merge partner
    pub(crate) fn merged_intensity(&self, index: usize) -> f32 {
        self.weighted(index, |p| p.intensity).unwrap_or(0.0)
    }

    /// Form of the longer of an item and its merge partner
    pub(crate) fn merged_form(&self, index: usize) -> PrecipitationForm {
        let item = &self.items[index];
        let Some(own) = item.as_precipitation() else {
            return PrecipitationForm::empty();
        };
        match item
            .merge_with
            .and_then(|partner| Some((partner, self.items[partner].as_precipitation()?)))
        {
            Some((partner_index, partner))
                if self.items[partner_index].period.length_hours() >= item.period.length_hours() =>
            {
                partner.form
            }
            _ => own.form,
        }
    }

    pub(crate) fn is_weak_precipitation(&self, index: usize) -> bool {
        PrecipitationIntensity::classify(
            self.merged_form(index),
            self.merged_intensity(index),
            &self.config.precipitation,
        ) == PrecipitationIntensity::Weak
    }

    fn log_story_items(&self, label: &str) {
        debug!("******** {} ********", label);
        for (index, item) in self.items.iter().enumerate() {
            debug!("[{}] {} story period {}", index, item, self.chain_period(index));
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::PrecipitationType;

    #[test]
    fn test_story_period_follows_merge_chain() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 12), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 14), (1, 16), 0.5, 60.0, PrecipitationType::Continuous));
        scenario.precipitation.push(rain((1, 18), (1, 20), 0.5, 60.0, PrecipitationType::Continuous));
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let first = story
            .items()
            .iter()
            .position(|item| item.is_precipitation())
            .unwrap();
        assert_eq!(story.story_item_period(first), Some(period((1, 10), (1, 20))));
        assert_eq!(story.story_item_period(story.items().len()), None);
        assert_eq!(story.story_item_period_length(first), 10);

        let last = story
            .items()
            .iter()
            .rposition(|item| item.is_precipitation())
            .unwrap();
        assert_eq!(story.merge_root(last), first);
        assert_eq!(story.merge_root(first), first);
    }

    #[test]
    fn test_merged_statistics_are_length_weighted() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 13), 1.0, 80.0, PrecipitationType::Continuous));
        let mut snow = rain((1, 15), (1, 16), 0.2, 20.0, PrecipitationType::Continuous);
        snow.form = PrecipitationForm::SNOW;
        scenario.precipitation.push(snow);
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        let first = story
            .items()
            .iter()
            .position(|item| item.is_precipitation())
            .unwrap();
        assert!(story.items()[first].merge_with().is_some());
        // 3 h at 80 % and 1 h at 20 %
        assert!((story.merged_extent(first) - 65.0).abs() < 1e-4);
        assert!((story.merged_intensity(first) - 0.8).abs() < 1e-4);
        assert_eq!(story.merged_form(first), PrecipitationForm::WATER);
        assert!(!story.is_weak_precipitation(first));
    }

    #[test]
    fn test_olla_verb_setting_reaches_sentences() {
        let mut scenario = create_test_scenario();
        scenario.precipitation.push(rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous));
        let mut config = StoryConfig::default();
        config.story.use_olla_verb = true;
        let mut story = scenario.story(&config).unwrap();
        assert!(story.render_context().use_olla_verb);

        let paragraph = story.weather_forecast_story();
        let rain_sentence = &paragraph.sentences()[1];
        assert!(rain_sentence.contains_phrase("saadaan"));
        assert!(rain_sentence.contains_phrase("monin paikoin"));
    }

    #[test]
    fn test_thunder_sentence_from_thunder_source() {
        let mut scenario = create_test_scenario();
        let mut storm = rain((1, 14), (1, 17), 2.5, 70.0, PrecipitationType::Showers);
        storm.thunder = true;
        scenario.precipitation.push(storm);
        scenario.thunder_probability = 70.0;
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();

        assert_eq!(
            story.thunder_sentence(&period((1, 12), (1, 18))),
            Sentence::from_phrase("todennäköisesti ukkosta")
        );
        assert!(story.thunder_sentence(&period((1, 6), (1, 10))).is_empty());
    }

    #[test]
    fn test_single_form_flag() {
        let mut scenario = create_test_scenario();
        let mut mixed = rain((1, 10), (1, 14), 0.5, 60.0, PrecipitationType::Continuous);
        mixed.form = PrecipitationForm::WATER | PrecipitationForm::SNOW;
        scenario.precipitation.push(mixed);
        let config = StoryConfig::default();
        let story = scenario.story(&config).unwrap();
        assert!(!story.render_context().single_precipitation_form);
    }
}
