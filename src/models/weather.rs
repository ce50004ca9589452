//! Categorical weather values shared by the story engine and its collaborators

use crate::config::PrecipitationLimits;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cloud cover percentage upper bounds of the cloudiness categories
pub const CLEAR_UPPER_LIMIT: f32 = 9.9;
pub const MOSTLY_CLEAR_UPPER_LIMIT: f32 = 35.0;
pub const PARTLY_CLOUDY_UPPER_LIMIT: f32 = 65.0;
pub const MOSTLY_CLOUDY_UPPER_LIMIT: f32 = 85.0;

bitflags::bitflags! {
    /// Precipitation form as a set; more than one bit means mixed forms
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrecipitationForm: u8 {
        const WATER = 0b0000_0001;
        const DRIZZLE = 0b0000_0010;
        const SLEET = 0b0000_0100;
        const SNOW = 0b0000_1000;
        const FREEZING = 0b0001_0000;
    }
}

impl PrecipitationForm {
    /// True when at most one form is present
    #[must_use]
    pub fn is_single(self) -> bool {
        self.bits().count_ones() <= 1
    }

    /// Sleet or snow present
    #[must_use]
    pub fn is_wintry(self) -> bool {
        self.intersects(PrecipitationForm::SLEET | PrecipitationForm::SNOW)
    }
}

bitflags::bitflags! {
    /// Geographic sub-area a summary is computed for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ForecastArea: u8 {
        const COASTAL = 0b01;
        const INLAND = 0b10;
        const FULL = Self::COASTAL.bits() | Self::INLAND.bits();
    }
}

impl Default for ForecastArea {
    fn default() -> Self {
        ForecastArea::FULL
    }
}

/// Continuous versus showery precipitation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationType {
    Showers,
    Continuous,
    #[default]
    Missing,
}

/// Intensity class of a mean precipitation rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationIntensity {
    Dry,
    Weak,
    Moderate,
    Heavy,
}

impl PrecipitationIntensity {
    /// Classify `intensity` (mm/h) with the limits of the dominant form
    #[must_use]
    pub fn classify(form: PrecipitationForm, intensity: f32, limits: &PrecipitationLimits) -> Self {
        let (dry, weak, heavy) = if form
            .intersects(PrecipitationForm::WATER | PrecipitationForm::FREEZING)
        {
            (
                limits.dry_weather_limit_water,
                limits.weak_precipitation_limit_water,
                limits.heavy_precipitation_limit_water,
            )
        } else if form.contains(PrecipitationForm::DRIZZLE) {
            (
                limits.dry_weather_limit_drizzle,
                limits.weak_precipitation_limit_water,
                limits.heavy_precipitation_limit_water,
            )
        } else if form.contains(PrecipitationForm::SLEET) {
            (
                limits.dry_weather_limit_sleet,
                limits.weak_precipitation_limit_sleet,
                limits.heavy_precipitation_limit_sleet,
            )
        } else if form.contains(PrecipitationForm::SNOW) {
            (
                limits.dry_weather_limit_snow,
                limits.weak_precipitation_limit_snow,
                limits.heavy_precipitation_limit_snow,
            )
        } else {
            (
                limits.dry_weather_limit_water,
                limits.weak_precipitation_limit_water,
                limits.heavy_precipitation_limit_water,
            )
        };

        if intensity < dry {
            PrecipitationIntensity::Dry
        } else if intensity <= weak {
            PrecipitationIntensity::Weak
        } else if intensity < heavy {
            PrecipitationIntensity::Moderate
        } else {
            PrecipitationIntensity::Heavy
        }
    }
}

/// Ordered cloudiness category, clear first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudinessId {
    /// selkeää
    Clear,
    /// melko selkeää
    MostlyClear,
    /// puolipilvistä
    PartlyCloudy,
    /// verrattain pilvistä
    MostlyCloudy,
    /// pilvistä
    Cloudy,
    /// puolipilvistä ja pilvistä
    PartlyCloudyToCloudy,
}

impl CloudinessId {
    /// Category of a mean cloud cover percentage
    #[must_use]
    pub fn from_percentage(cover: f32) -> Self {
        if cover <= CLEAR_UPPER_LIMIT {
            CloudinessId::Clear
        } else if cover <= MOSTLY_CLEAR_UPPER_LIMIT {
            CloudinessId::MostlyClear
        } else if cover <= PARTLY_CLOUDY_UPPER_LIMIT {
            CloudinessId::PartlyCloudy
        } else if cover <= MOSTLY_CLOUDY_UPPER_LIMIT {
            CloudinessId::MostlyCloudy
        } else {
            CloudinessId::Cloudy
        }
    }

    #[must_use]
    pub fn phrase(self) -> &'static str {
        match self {
            CloudinessId::Clear => "selkeää",
            CloudinessId::MostlyClear => "melko selkeää",
            CloudinessId::PartlyCloudy => "puolipilvistä",
            CloudinessId::MostlyCloudy => "verrattain pilvistä",
            CloudinessId::Cloudy => "pilvistä",
            CloudinessId::PartlyCloudyToCloudy => "puolipilvistä ja pilvistä",
        }
    }
}

/// Weather change events reported inside a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherEventId {
    /// pilvistyy
    GettingCloudy,
    /// selkenee
    ClearingUp,
    /// poutaantuu
    PrecipitationEnds,
    PrecipitationEndsSmallExtent,
    /// sade alkaa
    PrecipitationStarts,
}

/// Timestamped weather event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherEvent {
    pub timestamp: NaiveDateTime,
    pub id: WeatherEventId,
}

/// Fog classification for a period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogType {
    Fog,
    FogPossiblyDense,
    FogInSomePlaces,
    FogInSomePlacesPossiblyDense,
    FogInManyPlaces,
    FogInManyPlacesPossiblyDense,
    #[default]
    NoFog,
}

impl FogType {
    #[must_use]
    pub fn is_fog(self) -> bool {
        self != FogType::NoFog
    }
}

/// Tag of a story item or story annex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoryPartId {
    Precipitation,
    Cloudiness,
    /// Reported as an annex after cloudiness
    Fog,
    /// Folded into precipitation
    Thunder,
    /// Gap placeholder awaiting cloudiness
    Missing,
}

impl fmt::Display for StoryPartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoryPartId::Precipitation => "precipitation",
            StoryPartId::Cloudiness => "cloudiness",
            StoryPartId::Fog => "fog",
            StoryPartId::Thunder => "thunder",
            StoryPartId::Missing => "missing",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_single_form() {
        assert!(PrecipitationForm::WATER.is_single());
        assert!(PrecipitationForm::empty().is_single());
        assert!(!(PrecipitationForm::WATER | PrecipitationForm::SNOW).is_single());
        assert!((PrecipitationForm::SLEET | PrecipitationForm::WATER).is_wintry());
    }

    #[rstest]
    #[case(PrecipitationForm::WATER, 0.01, PrecipitationIntensity::Dry)]
    #[case(PrecipitationForm::WATER, 0.3, PrecipitationIntensity::Weak)]
    #[case(PrecipitationForm::WATER, 0.4, PrecipitationIntensity::Weak)]
    #[case(PrecipitationForm::WATER, 0.5, PrecipitationIntensity::Moderate)]
    #[case(PrecipitationForm::WATER, 2.0, PrecipitationIntensity::Heavy)]
    #[case(PrecipitationForm::SNOW, 1.6, PrecipitationIntensity::Heavy)]
    #[case(PrecipitationForm::SLEET, 1.6, PrecipitationIntensity::Moderate)]
    #[case(PrecipitationForm::DRIZZLE, 0.03, PrecipitationIntensity::Weak)]
    fn test_intensity_classification(
        #[case] form: PrecipitationForm,
        #[case] intensity: f32,
        #[case] expected: PrecipitationIntensity,
    ) {
        let limits = PrecipitationLimits::default();
        assert_eq!(PrecipitationIntensity::classify(form, intensity, &limits), expected);
    }

    #[test]
    fn test_cloudiness_order_and_categories() {
        assert!(CloudinessId::Clear < CloudinessId::MostlyClear);
        assert!(CloudinessId::PartlyCloudy > CloudinessId::MostlyClear);
        assert_eq!(CloudinessId::from_percentage(5.0), CloudinessId::Clear);
        assert_eq!(CloudinessId::from_percentage(50.0), CloudinessId::PartlyCloudy);
        assert_eq!(CloudinessId::from_percentage(95.0), CloudinessId::Cloudy);
    }

    #[test]
    fn test_form_serde() {
        let form: PrecipitationForm = serde_json::from_str("\"WATER | SNOW\"").unwrap();
        assert_eq!(form, PrecipitationForm::WATER | PrecipitationForm::SNOW);
        let area: ForecastArea = serde_json::from_str("\"COASTAL\"").unwrap();
        assert_eq!(area, ForecastArea::COASTAL);
    }
}
