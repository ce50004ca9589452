//! Configuration management for the forecast story engine
//!
//! Handles loading configuration from files and environment variables and
//! validates the numeric thresholds the story engine relies on.

use crate::StoryError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Precipitation intensity and extent limits
    #[serde(default)]
    pub precipitation: PrecipitationLimits,
    /// Segmentation and merge thresholds
    #[serde(default)]
    pub merge: MergeConfig,
    /// Story rendering settings
    #[serde(default)]
    pub story: StorySettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Precipitation limits in mm/h (intensities) and percent (extents)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecipitationLimits {
    #[serde(default = "default_dry_weather_limit_water")]
    pub dry_weather_limit_water: f32,
    #[serde(default = "default_dry_weather_limit_other")]
    pub dry_weather_limit_drizzle: f32,
    #[serde(default = "default_dry_weather_limit_other")]
    pub dry_weather_limit_sleet: f32,
    #[serde(default = "default_dry_weather_limit_other")]
    pub dry_weather_limit_snow: f32,
    /// Mean intensity above which a precipitation period ends in "poutaantuu"
    #[serde(default = "default_weak_precipitation_limit")]
    pub weak_precipitation_limit_water: f32,
    #[serde(default = "default_weak_precipitation_limit")]
    pub weak_precipitation_limit_sleet: f32,
    #[serde(default = "default_weak_precipitation_limit")]
    pub weak_precipitation_limit_snow: f32,
    #[serde(default = "default_heavy_precipitation_limit_water")]
    pub heavy_precipitation_limit_water: f32,
    #[serde(default = "default_heavy_precipitation_limit_sleet")]
    pub heavy_precipitation_limit_sleet: f32,
    #[serde(default = "default_heavy_precipitation_limit_snow")]
    pub heavy_precipitation_limit_snow: f32,
    #[serde(default = "default_rainstorm_limit")]
    pub rainstorm_limit: f32,
    #[serde(default = "default_in_some_places_lower_limit")]
    pub in_some_places_lower_limit: f32,
    #[serde(default = "default_in_some_places_upper_limit")]
    pub in_some_places_upper_limit: f32,
    #[serde(default = "default_in_many_places_lower_limit")]
    pub in_many_places_lower_limit: f32,
    #[serde(default = "default_in_many_places_upper_limit")]
    pub in_many_places_upper_limit: f32,
}

/// Thresholds used by segmentation and the merge passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Precipitation periods at most this long are noise candidates
    #[serde(default = "default_noise_max_hours")]
    pub noise_max_hours: i64,
    /// Noise candidates below this extent (%) are dropped
    #[serde(default = "default_noise_min_extent")]
    pub noise_min_extent: f32,
    /// Precipitation items closer than this do not narrate clearing up
    #[serde(default = "default_poutaantuu_gap_hours")]
    pub poutaantuu_gap_hours: i64,
    #[serde(default = "default_precipitation_merge_max_gap_hours")]
    pub precipitation_merge_max_gap_hours: i64,
    /// Slack added to the combined item length when deciding a merge
    #[serde(default = "default_precipitation_merge_slack_hours")]
    pub precipitation_merge_slack_hours: i64,
    #[serde(default = "default_cloudiness_merge_max_gap_hours")]
    pub cloudiness_merge_max_gap_hours: i64,
    /// Interrupting precipitation must be at most this intense (mm/h)
    #[serde(default = "default_cloudiness_merge_max_intensity")]
    pub cloudiness_merge_max_intensity: f32,
    /// Items at most this long are trimmed at the story edges
    #[serde(default = "default_short_item_hours")]
    pub short_item_hours: i64,
}

/// Rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySettings {
    /// Items at least this long use long-period phrasing
    #[serde(default = "default_long_period_hours")]
    pub long_period_hours: i64,
    /// When false, multi-item stories use "aluksi"/"myöhemmin" connectives
    #[serde(default = "default_specify_part_of_the_day")]
    pub specify_part_of_the_day: bool,
    /// Short text mode drops the visibility sentences at sea
    #[serde(default)]
    pub short_text_mode: bool,
    /// Trailing cloudiness at most this long may render nothing
    #[serde(default = "default_trailing_cloudiness_max_hours")]
    pub trailing_cloudiness_max_hours: i64,
    /// Share of a period a coarse part of the day must cover to name it
    #[serde(default = "default_phrase_coverage_ratio")]
    pub phrase_coverage_ratio: f64,
    /// Precipitation sentences say "saadaan paikoin" instead of "paikoin"
    #[serde(default)]
    pub use_olla_verb: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_dry_weather_limit_water() -> f32 {
    0.04
}

fn default_dry_weather_limit_other() -> f32 {
    0.02
}

fn default_weak_precipitation_limit() -> f32 {
    0.4
}

fn default_heavy_precipitation_limit_water() -> f32 {
    2.0
}

fn default_heavy_precipitation_limit_sleet() -> f32 {
    1.7
}

fn default_heavy_precipitation_limit_snow() -> f32 {
    1.5
}

fn default_rainstorm_limit() -> f32 {
    7.0
}

fn default_in_some_places_lower_limit() -> f32 {
    10.0
}

fn default_in_some_places_upper_limit() -> f32 {
    50.0
}

fn default_in_many_places_lower_limit() -> f32 {
    50.0
}

fn default_in_many_places_upper_limit() -> f32 {
    90.0
}

fn default_noise_max_hours() -> i64 {
    1
}

fn default_noise_min_extent() -> f32 {
    10.0
}

fn default_poutaantuu_gap_hours() -> i64 {
    2
}

fn default_precipitation_merge_max_gap_hours() -> i64 {
    3
}

fn default_precipitation_merge_slack_hours() -> i64 {
    2
}

fn default_cloudiness_merge_max_gap_hours() -> i64 {
    1
}

fn default_cloudiness_merge_max_intensity() -> f32 {
    0.1
}

fn default_short_item_hours() -> i64 {
    1
}

fn default_long_period_hours() -> i64 {
    6
}

fn default_specify_part_of_the_day() -> bool {
    true
}

fn default_trailing_cloudiness_max_hours() -> i64 {
    2
}

fn default_phrase_coverage_ratio() -> f64 {
    0.85
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for PrecipitationLimits {
    fn default() -> Self {
        Self {
            dry_weather_limit_water: default_dry_weather_limit_water(),
            dry_weather_limit_drizzle: default_dry_weather_limit_other(),
            dry_weather_limit_sleet: default_dry_weather_limit_other(),
            dry_weather_limit_snow: default_dry_weather_limit_other(),
            weak_precipitation_limit_water: default_weak_precipitation_limit(),
            weak_precipitation_limit_sleet: default_weak_precipitation_limit(),
            weak_precipitation_limit_snow: default_weak_precipitation_limit(),
            heavy_precipitation_limit_water: default_heavy_precipitation_limit_water(),
            heavy_precipitation_limit_sleet: default_heavy_precipitation_limit_sleet(),
            heavy_precipitation_limit_snow: default_heavy_precipitation_limit_snow(),
            rainstorm_limit: default_rainstorm_limit(),
            in_some_places_lower_limit: default_in_some_places_lower_limit(),
            in_some_places_upper_limit: default_in_some_places_upper_limit(),
            in_many_places_lower_limit: default_in_many_places_lower_limit(),
            in_many_places_upper_limit: default_in_many_places_upper_limit(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            noise_max_hours: default_noise_max_hours(),
            noise_min_extent: default_noise_min_extent(),
            poutaantuu_gap_hours: default_poutaantuu_gap_hours(),
            precipitation_merge_max_gap_hours: default_precipitation_merge_max_gap_hours(),
            precipitation_merge_slack_hours: default_precipitation_merge_slack_hours(),
            cloudiness_merge_max_gap_hours: default_cloudiness_merge_max_gap_hours(),
            cloudiness_merge_max_intensity: default_cloudiness_merge_max_intensity(),
            short_item_hours: default_short_item_hours(),
        }
    }
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            long_period_hours: default_long_period_hours(),
            specify_part_of_the_day: default_specify_part_of_the_day(),
            short_text_mode: false,
            trailing_cloudiness_max_hours: default_trailing_cloudiness_max_hours(),
            phrase_coverage_ratio: default_phrase_coverage_ratio(),
            use_olla_verb: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl StoryConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERSTORY_MERGE__NOISE_MIN_EXTENT=5
        builder = builder.add_source(
            Environment::with_prefix("WEATHERSTORY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: StoryConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherstory").join("config.toml"))
    }

    /// Apply default values to empty string fields
    pub fn apply_defaults(&mut self) {
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_precipitation_limits()?;
        self.validate_merge_thresholds()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_precipitation_limits(&self) -> Result<()> {
        let p = &self.precipitation;
        let ladders = [
            (
                "water",
                p.dry_weather_limit_water,
                p.weak_precipitation_limit_water,
                p.heavy_precipitation_limit_water,
            ),
            (
                "sleet",
                p.dry_weather_limit_sleet,
                p.weak_precipitation_limit_sleet,
                p.heavy_precipitation_limit_sleet,
            ),
            (
                "snow",
                p.dry_weather_limit_snow,
                p.weak_precipitation_limit_snow,
                p.heavy_precipitation_limit_snow,
            ),
        ];

        for (form, dry, weak, heavy) in ladders {
            if dry < 0.0 || !(dry <= weak && weak <= heavy) {
                return Err(StoryError::config(format!(
                    "Precipitation limits for {form} must satisfy 0 <= dry <= weak <= heavy"
                ))
                .into());
            }
        }

        if p.dry_weather_limit_drizzle < 0.0 {
            return Err(StoryError::config("Drizzle dry weather limit cannot be negative").into());
        }

        if p.rainstorm_limit < p.heavy_precipitation_limit_water {
            return Err(StoryError::config(
                "Rainstorm limit cannot be below the heavy rain limit",
            )
            .into());
        }

        if !(0.0..=100.0).contains(&p.in_some_places_lower_limit)
            || p.in_some_places_lower_limit > p.in_some_places_upper_limit
            || p.in_many_places_lower_limit > p.in_many_places_upper_limit
            || p.in_many_places_upper_limit > 100.0
        {
            return Err(StoryError::config(
                "Extent limits must be ordered percentages between 0 and 100",
            )
            .into());
        }

        Ok(())
    }

    fn validate_merge_thresholds(&self) -> Result<()> {
        let m = &self.merge;
        let hours = [
            ("noise_max_hours", m.noise_max_hours),
            ("poutaantuu_gap_hours", m.poutaantuu_gap_hours),
            (
                "precipitation_merge_max_gap_hours",
                m.precipitation_merge_max_gap_hours,
            ),
            (
                "precipitation_merge_slack_hours",
                m.precipitation_merge_slack_hours,
            ),
            (
                "cloudiness_merge_max_gap_hours",
                m.cloudiness_merge_max_gap_hours,
            ),
            ("short_item_hours", m.short_item_hours),
            ("long_period_hours", self.story.long_period_hours),
            (
                "trailing_cloudiness_max_hours",
                self.story.trailing_cloudiness_max_hours,
            ),
        ];

        for (name, value) in hours {
            if !(0..=48).contains(&value) {
                return Err(StoryError::config(format!(
                    "{name} must be between 0 and 48 hours, got {value}"
                ))
                .into());
            }
        }

        if m.noise_min_extent < 0.0 || m.cloudiness_merge_max_intensity < 0.0 {
            return Err(StoryError::config("Merge limits cannot be negative").into());
        }

        if !(0.0..=1.0).contains(&self.story.phrase_coverage_ratio) {
            return Err(StoryError::config("phrase_coverage_ratio must be between 0 and 1").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(StoryError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(StoryError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StoryConfig::default();
        assert_eq!(config.precipitation.weak_precipitation_limit_water, 0.4);
        assert_eq!(config.precipitation.dry_weather_limit_water, 0.04);
        assert_eq!(config.merge.noise_max_hours, 1);
        assert_eq!(config.merge.precipitation_merge_max_gap_hours, 3);
        assert_eq!(config.story.long_period_hours, 6);
        assert!(config.story.specify_part_of_the_day);
        assert!(!config.story.use_olla_verb);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = StoryConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_precipitation_limits() {
        let mut config = StoryConfig::default();
        config.precipitation.weak_precipitation_limit_snow = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_coverage_ratio_out_of_range() {
        let mut config = StoryConfig::default();
        config.story.phrase_coverage_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = StoryConfig::default();
        config.logging.level = String::new();
        config.apply_defaults();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("weatherstory-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[merge]\nnoise_min_extent = 5.0\n\n[story]\nspecify_part_of_the_day = false").unwrap();

        let config = StoryConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.merge.noise_min_extent, 5.0);
        assert!(!config.story.specify_part_of_the_day);
        assert_eq!(config.merge.noise_max_hours, 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
