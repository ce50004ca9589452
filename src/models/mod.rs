//! Data models for the forecast story engine
//!
//! This module contains the core domain models organized by concern:
//! - Period: forecast periods, hour arithmetic and parts of the day
//! - Weather: precipitation, cloudiness, fog and event categories

pub mod period;
pub mod weather;

// Re-export all public types for convenient access
pub use period::{PartOfDay, WeatherPeriod, hours_between, shift_hours};
pub use weather::{
    CloudinessId, FogType, ForecastArea, PrecipitationForm, PrecipitationIntensity,
    PrecipitationType, StoryPartId, WeatherEvent, WeatherEventId,
};
