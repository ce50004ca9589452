//! Story items: one contiguous sub-period with its dominant phenomenon

use crate::models::{
    CloudinessId, PrecipitationForm, PrecipitationType, StoryPartId, WeatherPeriod,
};
use chrono::NaiveDateTime;
use std::fmt;

/// Precipitation summary of a story item
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationItem {
    /// Mean intensity in mm/h
    pub intensity: f32,
    /// Areal extent in percent
    pub extent: f32,
    pub form: PrecipitationForm,
    pub precipitation_type: PrecipitationType,
    pub thunder: bool,
    /// The end of this period is worth narrating as clearing up
    pub poutaantuu: bool,
    /// Clearing up is still to be narrated by this item itself
    pub report_poutaantuu: bool,
    /// Length in hours of the whole episode, including hours outside the window
    pub full_duration: i64,
}

/// Cloudiness summary of a story item
#[derive(Debug, Clone, PartialEq)]
pub struct CloudinessItem {
    pub cloudiness: CloudinessId,
    /// Nearest preceding precipitation item
    pub previous_precipitation: Option<usize>,
    /// Immediately following precipitation item
    pub next_precipitation: Option<usize>,
    pub report_dry_weather: bool,
    /// Timestamp of the cloudiness change reported in the last rendering
    pub change_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoryItemKind {
    /// Gap placeholder, replaced by cloudiness before merging
    Missing,
    Precipitation(PrecipitationItem),
    Cloudiness(CloudinessItem),
}

/// Arena slot of a story; links to other items are arena indices
#[derive(Debug, Clone, PartialEq)]
pub struct StoryItem {
    pub(crate) period: WeatherPeriod,
    pub(crate) kind: StoryItemKind,
    pub(crate) included: bool,
    pub(crate) merge_with: Option<usize>,
    pub(crate) merged_into: Option<usize>,
}

impl StoryItem {
    pub(crate) fn new(period: WeatherPeriod, kind: StoryItemKind) -> Self {
        Self {
            period,
            kind,
            included: true,
            merge_with: None,
            merged_into: None,
        }
    }

    /// The item's own sub-period, without merge extension
    #[must_use]
    pub fn period(&self) -> WeatherPeriod {
        self.period
    }

    #[must_use]
    pub fn kind(&self) -> &StoryItemKind {
        &self.kind
    }

    #[must_use]
    pub fn part_id(&self) -> StoryPartId {
        match self.kind {
            StoryItemKind::Missing => StoryPartId::Missing,
            StoryItemKind::Precipitation(_) => StoryPartId::Precipitation,
            StoryItemKind::Cloudiness(_) => StoryPartId::Cloudiness,
        }
    }

    #[must_use]
    pub fn is_included(&self) -> bool {
        self.included
    }

    /// Later item this one absorbs
    #[must_use]
    pub fn merge_with(&self) -> Option<usize> {
        self.merge_with
    }

    /// Earlier item that absorbed this one
    #[must_use]
    pub fn merged_into(&self) -> Option<usize> {
        self.merged_into
    }

    #[must_use]
    pub fn as_precipitation(&self) -> Option<&PrecipitationItem> {
        match &self.kind {
            StoryItemKind::Precipitation(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_cloudiness(&self) -> Option<&CloudinessItem> {
        match &self.kind {
            StoryItemKind::Cloudiness(item) => Some(item),
            _ => None,
        }
    }

    pub(crate) fn as_precipitation_mut(&mut self) -> Option<&mut PrecipitationItem> {
        match &mut self.kind {
            StoryItemKind::Precipitation(item) => Some(item),
            _ => None,
        }
    }

    pub(crate) fn as_cloudiness_mut(&mut self) -> Option<&mut CloudinessItem> {
        match &mut self.kind {
            StoryItemKind::Cloudiness(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_precipitation(&self) -> bool {
        matches!(self.kind, StoryItemKind::Precipitation(_))
    }

    #[must_use]
    pub fn is_cloudiness(&self) -> bool {
        matches!(self.kind, StoryItemKind::Cloudiness(_))
    }
}

impl fmt::Display for StoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - ", self.period, self.part_id())?;
        if !self.included {
            return write!(f, "excluded");
        }
        write!(f, "included")?;
        if let Some(index) = self.merge_with {
            write!(f, " - merged with item {index}")?;
        }
        Ok(())
    }
}
