//! Scenario-driven forecast collaborators
//!
//! A [`Scenario`] holds pre-computed statistics of one forecast period,
//! usually read from a JSON file, and answers the collaborator calls of the
//! story engine from them. Statistics over a queried period are weighted by
//! the number of hours each entry shares with it.

use crate::config::{PrecipitationLimits, StoryConfig};
use crate::forecast::{
    AdditionalSentence, CloudinessForecast, ComposedSentence, FogForecast, FogInfo,
    ForecastSources, PrecipitationForecast, RenderContext, ThunderForecast,
};
use crate::models::weather::{MOSTLY_CLOUDY_UPPER_LIMIT, PARTLY_CLOUDY_UPPER_LIMIT};
use crate::models::{
    CloudinessId, FogType, ForecastArea, PartOfDay, PrecipitationForm, PrecipitationIntensity,
    PrecipitationType, WeatherEvent, WeatherEventId, WeatherPeriod,
};
use crate::story::WeatherForecastStory;
use crate::text::Sentence;
use crate::{Result, StoryError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Thunder probability (%) from which thunder is called likely
const LIKELY_THUNDER_PROBABILITY: f32 = 60.0;

/// Form nouns for continuous precipitation and for showers
const FORM_NOUNS: [(PrecipitationForm, &str, &str); 4] = [
    (PrecipitationForm::WATER, "vesisadetta", "vesikuuroja"),
    (PrecipitationForm::DRIZZLE, "tihkusadetta", "tihkusadetta"),
    (PrecipitationForm::SLEET, "räntäsadetta", "räntäkuuroja"),
    (PrecipitationForm::SNOW, "lumisadetta", "lumikuuroja"),
];

/// Precipitation statistics of one sub-period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationEntry {
    pub period: WeatherPeriod,
    /// Mean intensity in mm/h
    pub intensity: f32,
    /// Areal extent in percent
    pub extent: f32,
    #[serde(default = "default_form")]
    pub form: PrecipitationForm,
    #[serde(default, rename = "type")]
    pub precipitation_type: PrecipitationType,
    #[serde(default)]
    pub thunder: bool,
    /// Whole precipitation episode, possibly reaching outside the forecast
    #[serde(default)]
    pub full_period: Option<WeatherPeriod>,
    #[serde(default)]
    pub short_term: bool,
    #[serde(default)]
    pub moderate_hours: u32,
    #[serde(default)]
    pub heavy_hours: u32,
    #[serde(default)]
    pub area: ForecastArea,
}

impl PrecipitationEntry {
    #[must_use]
    pub fn new(
        period: WeatherPeriod,
        intensity: f32,
        extent: f32,
        form: PrecipitationForm,
        precipitation_type: PrecipitationType,
    ) -> Self {
        Self {
            period,
            intensity,
            extent,
            form,
            precipitation_type,
            thunder: false,
            full_period: None,
            short_term: false,
            moderate_hours: 0,
            heavy_hours: 0,
            area: ForecastArea::FULL,
        }
    }
}

/// Mean cloud cover (%) of a sub-period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudinessEntry {
    pub period: WeatherPeriod,
    pub cover: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogEntry {
    pub period: WeatherPeriod,
    pub fog: FogType,
}

fn default_form() -> PrecipitationForm {
    PrecipitationForm::WATER
}

fn default_cloudiness() -> CloudinessId {
    CloudinessId::PartlyCloudy
}

/// Hours shared by two periods, both ends counted
fn shared_hours(first: &WeatherPeriod, second: &WeatherPeriod) -> Option<i64> {
    first
        .intersection(second)
        .map(|common| common.length_hours() + 1)
}

/// Precipitation summary of a queried period
#[derive(Debug, Clone, Copy)]
struct PrecipitationSummary {
    extent: f32,
    form: PrecipitationForm,
    precipitation_type: PrecipitationType,
    class: PrecipitationIntensity,
    thunder: bool,
}

/// Pre-computed statistics of one forecast period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub forecast_period: WeatherPeriod,
    #[serde(default)]
    pub area: ForecastArea,
    #[serde(default)]
    pub precipitation: Vec<PrecipitationEntry>,
    #[serde(default)]
    pub cloudiness: Vec<CloudinessEntry>,
    /// Used for hours no cloudiness entry covers
    #[serde(default = "default_cloudiness")]
    pub default_cloudiness: CloudinessId,
    #[serde(default)]
    pub cloudiness_events: Vec<WeatherEvent>,
    #[serde(default)]
    pub fog: Vec<FogEntry>,
    /// Thunder probability (%) of the thunder periods
    #[serde(default)]
    pub thunder_probability: f32,
    #[serde(skip)]
    limits: PrecipitationLimits,
}

impl Scenario {
    /// Dry scenario with default cloudiness and no fog
    #[must_use]
    pub fn new(forecast_period: WeatherPeriod) -> Self {
        Self {
            forecast_period,
            area: ForecastArea::FULL,
            precipitation: Vec::new(),
            cloudiness: Vec::new(),
            default_cloudiness: default_cloudiness(),
            cloudiness_events: Vec::new(),
            fog: Vec::new(),
            thunder_probability: 0.0,
            limits: PrecipitationLimits::default(),
        }
    }

    /// Classify intensities with `limits` instead of the defaults
    #[must_use]
    pub fn with_limits(mut self, limits: PrecipitationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let scenario = Self::from_json_str(&json)?;
        info!(
            "Loaded scenario {} with {} precipitation entries for {}",
            path.display(),
            scenario.precipitation.len(),
            scenario.forecast_period
        );
        Ok(scenario)
    }

    /// Reject percentages outside 0..=100 and negative intensities
    pub fn validate(&self) -> Result<()> {
        for entry in &self.precipitation {
            if !(0.0..=100.0).contains(&entry.extent) {
                return Err(StoryError::scenario(format!(
                    "precipitation extent {} at {} is not a percentage",
                    entry.extent, entry.period
                )));
            }
            if entry.intensity.is_nan() || entry.intensity < 0.0 {
                return Err(StoryError::scenario(format!(
                    "precipitation intensity {} at {} is negative",
                    entry.intensity, entry.period
                )));
            }
        }
        for entry in &self.cloudiness {
            if !(0.0..=100.0).contains(&entry.cover) {
                return Err(StoryError::scenario(format!(
                    "cloud cover {} at {} is not a percentage",
                    entry.cover, entry.period
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.thunder_probability) {
            return Err(StoryError::scenario("thunder probability is not a percentage"));
        }
        Ok(())
    }

    /// Story of the whole scenario for its own forecast area
    pub fn story(&self, config: &StoryConfig) -> Result<WeatherForecastStory<'_>> {
        WeatherForecastStory::new(
            self.forecast_period,
            self.area,
            ForecastSources::from_single(self),
            config,
        )
    }

    fn overlapping<'s>(
        &'s self,
        period: &'s WeatherPeriod,
        area: ForecastArea,
    ) -> impl Iterator<Item = (&'s PrecipitationEntry, i64)> + 's {
        self.precipitation
            .iter()
            .filter(move |entry| entry.area.intersects(area))
            .filter_map(move |entry| Some((entry, shared_hours(&entry.period, period)?)))
    }

    fn weighted_mean<F>(&self, period: &WeatherPeriod, area: ForecastArea, value: F) -> Option<f32>
    where
        F: Fn(&PrecipitationEntry) -> f32,
    {
        let (sum, hours) = self
            .overlapping(period, area)
            .fold((0.0_f32, 0_i64), |(sum, hours), (entry, shared)| {
                (sum + value(entry) * shared as f32, hours + shared)
            });
        (hours > 0).then(|| sum / hours as f32)
    }

    fn summary(&self, period: &WeatherPeriod) -> Option<PrecipitationSummary> {
        let intensity = self.weighted_mean(period, self.area, |entry| entry.intensity)?;
        let form = self.precipitation_form(period, self.area);
        let class = PrecipitationIntensity::classify(form, intensity, &self.limits);
        if class == PrecipitationIntensity::Dry {
            return None;
        }
        Some(PrecipitationSummary {
            extent: self.precipitation_extent(period, self.area),
            form,
            precipitation_type: self.precipitation_type(period, self.area),
            class,
            thunder: self.thunder_exists(period, self.area),
        })
    }

    fn extent_phrase(&self, extent: f32) -> Option<&'static str> {
        if extent <= self.limits.in_some_places_upper_limit {
            Some("paikoin")
        } else if extent <= self.limits.in_many_places_upper_limit {
            Some("monin paikoin")
        } else {
            None
        }
    }

    /// "paikoin", or "saadaan paikoin" with the olla verb
    fn push_places_phrase(&self, extent: f32, ctx: &RenderContext, sentence: &mut Sentence) {
        if let Some(phrase) = self.extent_phrase(extent) {
            if ctx.use_olla_verb {
                sentence.push("saadaan");
            }
            sentence.push(phrase);
        }
    }

    /// Form nouns, e.g. "lumisadetta" or "vesisadetta tai lumisadetta"
    fn form_phrase(
        form: PrecipitationForm,
        showers: bool,
        ctx: &RenderContext,
        sentence: &mut Sentence,
    ) {
        let base = form - PrecipitationForm::FREEZING;
        if base.is_empty() || (base == PrecipitationForm::WATER && ctx.single_precipitation_form) {
            sentence.push(if showers { "sadekuuroja" } else { "sadetta" });
            return;
        }
        let mut first = true;
        for (flag, continuous, showery) in FORM_NOUNS {
            if !base.contains(flag) {
                continue;
            }
            if !first {
                sentence.push("tai");
            }
            sentence.push(if showers { showery } else { continuous });
            first = false;
        }
    }

    fn summary_phrase(
        &self,
        period: &WeatherPeriod,
        summary: &PrecipitationSummary,
        ctx: &RenderContext,
    ) -> Sentence {
        let showers = summary.precipitation_type == PrecipitationType::Showers;
        let mut sentence = Sentence::new();
        self.push_places_phrase(summary.extent, ctx, &mut sentence);
        match (summary.class, showers) {
            (PrecipitationIntensity::Weak, false) => {
                sentence.push("heikkoa");
            }
            (PrecipitationIntensity::Weak, true) => {
                sentence.push("heikkoja");
            }
            (PrecipitationIntensity::Heavy, false) => {
                sentence.push("runsasta");
            }
            (PrecipitationIntensity::Heavy, true) => {
                sentence.push("voimakkaita");
            }
            _ => {}
        }
        if summary.form.contains(PrecipitationForm::FREEZING) && ctx.use_icing_phrase {
            sentence.push("jäätävää");
        }
        Self::form_phrase(summary.form, showers, ctx, &mut sentence);

        if summary.thunder {
            let thunder = self.thunder_sentence(period, self.area);
            if !thunder.is_empty() {
                sentence.delimiter(",");
                sentence.append(&thunder);
            }
        }
        sentence
    }

    fn fog_phrase(fog: FogType) -> Option<&'static str> {
        match fog {
            FogType::Fog => Some("sumua"),
            FogType::FogPossiblyDense => Some("sumua, joka voi olla sakeaa"),
            FogType::FogInSomePlaces => Some("paikoin sumua"),
            FogType::FogInSomePlacesPossiblyDense => Some("paikoin sakeaa sumua"),
            FogType::FogInManyPlaces => Some("monin paikoin sumua"),
            FogType::FogInManyPlacesPossiblyDense => Some("monin paikoin sakeaa sumua"),
            FogType::NoFog => None,
        }
    }
}

impl PrecipitationForecast for Scenario {
    fn precipitation_periods(
        &self,
        period: &WeatherPeriod,
        area: ForecastArea,
    ) -> Vec<WeatherPeriod> {
        let mut clipped: Vec<WeatherPeriod> = self
            .precipitation
            .iter()
            .filter(|entry| entry.area.intersects(area))
            .filter_map(|entry| entry.period.intersection(period))
            .collect();
        clipped.sort();

        // Entries sharing hours (coastal and inland of one episode) become one period
        let mut periods: Vec<WeatherPeriod> = Vec::with_capacity(clipped.len());
        for next in clipped {
            match periods.last_mut() {
                Some(last) if next.start() <= last.end() => {
                    *last = last.with_end(last.end().max(next.end()));
                }
                _ => periods.push(next),
            }
        }
        periods
    }

    fn mean_intensity(&self, period: &WeatherPeriod, area: ForecastArea) -> f32 {
        self.weighted_mean(period, area, |entry| entry.intensity)
            .unwrap_or(0.0)
    }

    fn precipitation_extent(&self, period: &WeatherPeriod, area: ForecastArea) -> f32 {
        self.weighted_mean(period, area, |entry| entry.extent)
            .unwrap_or(0.0)
    }

    fn precipitation_form(&self, period: &WeatherPeriod, area: ForecastArea) -> PrecipitationForm {
        self.overlapping(period, area)
            .fold(PrecipitationForm::empty(), |form, (entry, _)| form | entry.form)
    }

    fn precipitation_type(&self, period: &WeatherPeriod, area: ForecastArea) -> PrecipitationType {
        let (showers, continuous) =
            self.overlapping(period, area)
                .fold((0, 0), |(showers, continuous), (entry, shared)| {
                    match entry.precipitation_type {
                        PrecipitationType::Showers => (showers + shared, continuous),
                        PrecipitationType::Continuous => (showers, continuous + shared),
                        PrecipitationType::Missing => (showers, continuous),
                    }
                });
        if showers == 0 && continuous == 0 {
            PrecipitationType::Missing
        } else if showers > continuous {
            PrecipitationType::Showers
        } else {
            PrecipitationType::Continuous
        }
    }

    fn thunder_exists(&self, period: &WeatherPeriod, area: ForecastArea) -> bool {
        self.overlapping(period, area).any(|(entry, _)| entry.thunder)
    }

    fn full_precipitation_period(&self, timestamp: NaiveDateTime) -> Option<WeatherPeriod> {
        self.precipitation
            .iter()
            .find(|entry| entry.period.contains(timestamp))
            .map(|entry| entry.full_period.unwrap_or(entry.period))
    }

    fn precipitation_hours(
        &self,
        intensity: PrecipitationIntensity,
        period: &WeatherPeriod,
    ) -> u32 {
        self.overlapping(period, self.area)
            .map(|(entry, shared)| {
                let hours = u32::try_from(shared).unwrap_or(0);
                let heavy = entry.heavy_hours.min(hours);
                let moderate = entry.moderate_hours.min(hours - heavy);
                match intensity {
                    PrecipitationIntensity::Heavy => heavy,
                    PrecipitationIntensity::Moderate => moderate,
                    PrecipitationIntensity::Weak => hours - heavy - moderate,
                    PrecipitationIntensity::Dry => 0,
                }
            })
            .sum()
    }

    fn precipitation_sentence(
        &self,
        period: &WeatherPeriod,
        time_phrase: &Sentence,
        ctx: &mut RenderContext,
    ) -> ComposedSentence {
        let mut composed = ComposedSentence::default();
        composed.sentence.append(time_phrase);

        let Some(summary) = self.summary(period) else {
            composed.sentence.push("poutaa");
            ctx.dry_period_tautology = true;
            return composed;
        };
        composed
            .sentence
            .append(&self.summary_phrase(period, &summary, ctx));
        ctx.dry_period_tautology = false;

        if summary.class != PrecipitationIntensity::Heavy
            && self.precipitation_hours(PrecipitationIntensity::Heavy, period) > 0
        {
            debug!("Heavy precipitation hours inside {}", period);
            composed.additional.push(AdditionalSentence {
                period: *period,
                sentence: Sentence::from_phrase("sade voi olla runsasta"),
            });
        }
        composed
    }

    fn short_term_precipitation_exists(&self, period: &WeatherPeriod) -> bool {
        self.overlapping(period, self.area)
            .any(|(entry, _)| entry.short_term)
    }

    fn short_term_precipitation_sentence(
        &self,
        period: &WeatherPeriod,
        time_phrase: &Sentence,
        ctx: &mut RenderContext,
    ) -> Sentence {
        let mut sentence = time_phrase.clone();
        let form = self.precipitation_form(period, self.area);
        let extent = self.precipitation_extent(period, self.area);
        self.push_places_phrase(extent, ctx, &mut sentence);
        sentence.push("lyhyitä");
        Self::form_phrase(form, true, ctx, &mut sentence);
        ctx.dry_period_tautology = false;
        sentence
    }

    fn precipitation_change_sentence(
        &self,
        period: &WeatherPeriod,
        time_phrase: &Sentence,
        event: WeatherEventId,
        ctx: &mut RenderContext,
    ) -> ComposedSentence {
        match event {
            WeatherEventId::PrecipitationStarts => {
                self.precipitation_sentence(period, time_phrase, ctx)
            }
            WeatherEventId::PrecipitationEnds => {
                ctx.dry_period_tautology = true;
                time_phrase.clone().with("sää poutaantuu").into()
            }
            WeatherEventId::PrecipitationEndsSmallExtent => {
                time_phrase.clone().with("sateet vähenevät").into()
            }
            WeatherEventId::GettingCloudy | WeatherEventId::ClearingUp => {
                ComposedSentence::default()
            }
        }
    }

    fn poutaantuu_and_cloudiness_sentence(
        &self,
        time_phrase: &Sentence,
        cloudiness: CloudinessId,
        ctx: &mut RenderContext,
    ) -> Sentence {
        let mut sentence = time_phrase.clone();
        sentence
            .push("sää poutaantuu")
            .push("ja")
            .push("on")
            .push(cloudiness.phrase());
        ctx.dry_period_tautology = true;
        sentence
    }
}

impl CloudinessForecast for Scenario {
    fn cloudiness_id(&self, period: &WeatherPeriod) -> CloudinessId {
        let mut sum = 0.0_f32;
        let mut hours = 0_i64;
        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        for entry in &self.cloudiness {
            let Some(shared) = shared_hours(&entry.period, period) else {
                continue;
            };
            sum += entry.cover * shared as f32;
            hours += shared;
            lowest = lowest.min(entry.cover);
            highest = highest.max(entry.cover);
        }
        if hours == 0 {
            return self.default_cloudiness;
        }

        let mean = sum / hours as f32;
        if lowest <= PARTLY_CLOUDY_UPPER_LIMIT
            && highest > MOSTLY_CLOUDY_UPPER_LIMIT
            && mean > PARTLY_CLOUDY_UPPER_LIMIT
        {
            return CloudinessId::PartlyCloudyToCloudy;
        }
        CloudinessId::from_percentage(mean)
    }

    fn cloudiness_sentence(
        &self,
        period: &WeatherPeriod,
        report_dry_weather: bool,
        time_phrase: &Sentence,
        short_form: bool,
    ) -> Sentence {
        let mut sentence = time_phrase.clone();
        sentence.push(self.cloudiness_id(period).phrase());
        if report_dry_weather && !short_form {
            sentence.push("ja").push("poutaa");
        }
        sentence
    }

    fn cloudiness_change_sentence(&self, period: &WeatherPeriod) -> Sentence {
        let Some(event) = self.weather_events().into_iter().find(|event| {
            matches!(event.id, WeatherEventId::GettingCloudy | WeatherEventId::ClearingUp)
                && period.contains(event.timestamp)
        }) else {
            return Sentence::new();
        };
        let change = if event.id == WeatherEventId::GettingCloudy {
            "pilvistyvää"
        } else {
            "selkenevää"
        };
        Sentence::from_phrase(PartOfDay::of_timestamp(event.timestamp).phrase(false)).with(change)
    }

    fn weather_events(&self) -> Vec<WeatherEvent> {
        let mut events = self.cloudiness_events.clone();
        events.sort_by_key(|event| event.timestamp);
        events
    }
}

impl FogForecast for Scenario {
    fn fog_sentence(&self, period: &WeatherPeriod) -> Sentence {
        let info = self.fog_info(period);
        if info.sentence.is_empty() {
            return Sentence::new();
        }
        let mut sentence = info.time_phrase;
        sentence.append(&info.sentence);
        sentence
    }

    fn fog_info(&self, period: &WeatherPeriod) -> FogInfo {
        let longest = self
            .fog
            .iter()
            .filter(|entry| entry.fog.is_fog())
            .filter_map(|entry| Some((entry.fog, entry.period.intersection(period)?)))
            .max_by_key(|(_, common)| common.length_hours());

        let Some((fog, common)) = longest else {
            return FogInfo {
                period: *period,
                fog: FogType::NoFog,
                time_phrase: Sentence::new(),
                sentence: Sentence::new(),
            };
        };
        let time_phrase = PartOfDay::large_of_period(&common)
            .map_or_else(Sentence::new, |part| Sentence::from_phrase(part.phrase(false)));
        FogInfo {
            period: common,
            fog,
            time_phrase,
            sentence: Self::fog_phrase(fog).map_or_else(Sentence::new, Sentence::from_phrase),
        }
    }
}

impl ThunderForecast for Scenario {
    fn thunder_sentence(&self, period: &WeatherPeriod, area: ForecastArea) -> Sentence {
        if !self.thunder_exists(period, area) {
            return Sentence::new();
        }
        if self.thunder_probability >= LIKELY_THUNDER_PROBABILITY {
            Sentence::from_phrase("todennäköisesti ukkosta")
        } else {
            Sentence::from_phrase("mahdollisesti ukkosta")
        }
    }
}
