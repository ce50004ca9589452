//! `weatherstory` command line tool
//!
//! Reads a JSON scenario of pre-computed forecast statistics and prints the
//! forecast story.
//!
//! ```bash
//! weatherstory --scenario tests/fixtures/single_rain.json
//! weatherstory --scenario sea.json --at-sea --dictionary en.json --language en
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use weatherstory::config::LoggingConfig;
use weatherstory::text::{
    BasicDictionary, Dictionary, NullDictionary, PlainTextFormatter, TextFormatter,
};
use weatherstory::{Scenario, StoryConfig};

#[derive(Parser)]
#[command(
    name = "weatherstory",
    version,
    about = "Finnish forecast story generator",
    long_about = "Assemble a weather forecast story from pre-computed forecast statistics"
)]
struct Args {
    /// Scenario JSON file
    #[arg(long, short = 's')]
    scenario: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Phrase dictionary (JSON object of phrase key to text)
    #[arg(long, short = 'd')]
    dictionary: Option<PathBuf>,

    /// Language of the dictionary
    #[arg(long, default_value = "fi")]
    language: String,

    /// Assemble the marine story
    #[arg(long)]
    at_sea: bool,

    /// Print the story items after the story
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = StoryConfig::load_from_path(args.config.clone())
        .context("Failed to load configuration")?;
    init_logging(&config.logging);

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?
        .with_limits(config.precipitation.clone());

    let dictionary: Box<dyn Dictionary> = match &args.dictionary {
        Some(path) => Box::new(
            BasicDictionary::load(&args.language, path)
                .with_context(|| format!("Failed to load dictionary {}", path.display()))?,
        ),
        None => Box::new(NullDictionary),
    };
    debug!("Using {} dictionary", dictionary.language());

    let mut story = scenario
        .story(&config)
        .context("Failed to assemble forecast story")?;
    let paragraph = if args.at_sea {
        story.weather_forecast_story_at_sea()
    } else {
        story.weather_forecast_story()
    };
    info!("Story of {} sentences for {}", paragraph.len(), story.forecast_period());

    let text = PlainTextFormatter
        .format_paragraph(&paragraph, dictionary.as_ref())
        .context("Failed to realize forecast text")?;
    println!("{text}");

    if args.verbose {
        println!();
        for (index, item) in story.items().iter().enumerate() {
            if let Some(period) = story.story_item_period(index) {
                println!("[{index}] {item} story period {period}");
            }
        }
    }

    Ok(())
}
