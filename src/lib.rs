//! `weatherstory` - Forecast story assembly for Finnish weather texts
//!
//! This library turns pre-computed forecast statistics into an ordered
//! sequence of phrase-key sentences: it segments the forecast period into
//! precipitation and cloudiness items, merges short interruptions and
//! narrates every item with the right time phrases.

pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod scenario;
pub mod story;
pub mod text;

// Re-export core types for public API
pub use config::StoryConfig;
pub use error::StoryError;
pub use forecast::{
    CloudinessForecast, FogForecast, ForecastSources, PrecipitationForecast, RenderContext,
    ThunderForecast,
};
pub use models::{ForecastArea, WeatherPeriod};
pub use scenario::Scenario;
pub use story::{StoryItem, WeatherForecastStory};
pub use text::{Paragraph, Sentence};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, StoryError>;
