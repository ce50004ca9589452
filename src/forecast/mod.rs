//! Call contract of the per-parameter forecast analyzers
//!
//! The story engine never computes statistics itself. It asks these
//! collaborators for summaries of sub-periods and for sentences built from
//! those summaries. Cross-call phrasing state lives in [`RenderContext`],
//! which the story passes explicitly to every sentence factory.

use crate::models::{
    CloudinessId, FogType, ForecastArea, PrecipitationForm, PrecipitationIntensity,
    PrecipitationType, WeatherEvent, WeatherEventId, WeatherPeriod,
};
use crate::text::Sentence;
use chrono::NaiveDateTime;

/// Phrasing state shared by consecutive sentence factory calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Dry weather was just mentioned; do not repeat it
    pub dry_period_tautology: bool,
    /// Every reported precipitation period has a single form
    pub single_precipitation_form: bool,
    /// In-places phrases are preceded by "saadaan"
    pub use_olla_verb: bool,
    pub use_icing_phrase: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            dry_period_tautology: false,
            single_precipitation_form: true,
            use_olla_verb: false,
            use_icing_phrase: true,
        }
    }
}

/// Extra sentence bound to a sub-period, emitted after its parent sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalSentence {
    pub period: WeatherPeriod,
    pub sentence: Sentence,
}

/// A sentence plus the additional sentences produced alongside it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedSentence {
    pub sentence: Sentence,
    pub additional: Vec<AdditionalSentence>,
}

impl From<Sentence> for ComposedSentence {
    fn from(sentence: Sentence) -> Self {
        Self {
            sentence,
            additional: Vec::new(),
        }
    }
}

/// Fog summary for a period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FogInfo {
    pub period: WeatherPeriod,
    pub fog: FogType,
    /// Time phrase without the fog phrase
    pub time_phrase: Sentence,
    /// Fog phrase without the time phrase
    pub sentence: Sentence,
}

pub trait PrecipitationForecast {
    /// Disjoint, time-ordered precipitation sub-periods within `period`
    fn precipitation_periods(
        &self,
        period: &WeatherPeriod,
        area: ForecastArea,
    ) -> Vec<WeatherPeriod>;

    /// Mean intensity in mm/h
    fn mean_intensity(&self, period: &WeatherPeriod, area: ForecastArea) -> f32;

    /// Areal extent in percent
    fn precipitation_extent(&self, period: &WeatherPeriod, area: ForecastArea) -> f32;

    fn precipitation_form(&self, period: &WeatherPeriod, area: ForecastArea) -> PrecipitationForm;

    fn precipitation_type(&self, period: &WeatherPeriod, area: ForecastArea) -> PrecipitationType;

    fn thunder_exists(&self, period: &WeatherPeriod, area: ForecastArea) -> bool;

    /// The whole precipitation episode containing `timestamp`, possibly
    /// extending beyond the forecast window
    fn full_precipitation_period(&self, timestamp: NaiveDateTime) -> Option<WeatherPeriod>;

    /// Hours within `period` with precipitation of class `intensity`
    fn precipitation_hours(&self, intensity: PrecipitationIntensity, period: &WeatherPeriod) -> u32;

    fn precipitation_sentence(
        &self,
        period: &WeatherPeriod,
        time_phrase: &Sentence,
        ctx: &mut RenderContext,
    ) -> ComposedSentence;

    fn short_term_precipitation_exists(&self, period: &WeatherPeriod) -> bool;

    fn short_term_precipitation_sentence(
        &self,
        period: &WeatherPeriod,
        time_phrase: &Sentence,
        ctx: &mut RenderContext,
    ) -> Sentence;

    fn precipitation_change_sentence(
        &self,
        period: &WeatherPeriod,
        time_phrase: &Sentence,
        event: WeatherEventId,
        ctx: &mut RenderContext,
    ) -> ComposedSentence;

    /// "Precipitation ends and the sky is `cloudiness`"
    fn poutaantuu_and_cloudiness_sentence(
        &self,
        time_phrase: &Sentence,
        cloudiness: CloudinessId,
        ctx: &mut RenderContext,
    ) -> Sentence;
}

pub trait CloudinessForecast {
    fn cloudiness_id(&self, period: &WeatherPeriod) -> CloudinessId;

    fn cloudiness_sentence(
        &self,
        period: &WeatherPeriod,
        report_dry_weather: bool,
        time_phrase: &Sentence,
        short_form: bool,
    ) -> Sentence;

    /// Change clause for events inside `period`, empty if none
    fn cloudiness_change_sentence(&self, period: &WeatherPeriod) -> Sentence;

    /// Time-ordered cloudiness change events
    fn weather_events(&self) -> Vec<WeatherEvent>;
}

pub trait FogForecast {
    fn fog_sentence(&self, period: &WeatherPeriod) -> Sentence;

    /// Fog summary for `period`; the sentence is empty when there is no fog
    fn fog_info(&self, period: &WeatherPeriod) -> FogInfo;
}

pub trait ThunderForecast {
    fn thunder_sentence(&self, period: &WeatherPeriod, area: ForecastArea) -> Sentence;
}

/// The four analyzers a story reads from
#[derive(Clone, Copy)]
pub struct ForecastSources<'a> {
    pub precipitation: &'a dyn PrecipitationForecast,
    pub cloudiness: &'a dyn CloudinessForecast,
    pub fog: &'a dyn FogForecast,
    /// Thunder inside precipitation is reported by the precipitation
    /// sentences; this source only serves standalone thunder sentences
    pub thunder: &'a dyn ThunderForecast,
}

impl<'a> ForecastSources<'a> {
    /// Sources backed by a single value implementing every analyzer
    pub fn from_single<T>(forecast: &'a T) -> Self
    where
        T: PrecipitationForecast + CloudinessForecast + FogForecast + ThunderForecast,
    {
        Self {
            precipitation: forecast,
            cloudiness: forecast,
            fog: forecast,
            thunder: forecast,
        }
    }
}
