// Season and special event classification for a calendar date

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    // Hotel calendar
    Low,
    Average,
    High,
    // Meteorological
    Winter,
    Spring,
    Summer,
    Fall,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Season::Low => "low",
            Season::Average => "average",
            Season::High => "high",
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.month(), date.day())
    }

    // Feb 29 is accepted, so check against a leap year
    fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(2000, self.month, self.day).is_some()
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// An inclusive range of days that repeats every year.
///
/// When `end` comes before `start` the range wraps over New Year,
/// so `12-01..02-29` covers all of December, January and February.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualRange {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl AnnualRange {
    pub const fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start: MonthDay::new(start.0, start.1),
            end: MonthDay::new(end.0, end.1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let day = MonthDay::of(date);
        if self.start <= self.end {
            self.start <= day && day <= self.end
        } else {
            day >= self.start || day <= self.end
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for bound in [self.start, self.end] {
            if !bound.is_valid() {
                return Err(ConfigError::InvalidSeasonRange(format!(
                    "{} is not a calendar day",
                    bound
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRule {
    pub season: Season,
    pub ranges: Vec<AnnualRange>,
}

/// Ordered season lookup. The first rule with a matching range wins and
/// dates outside every range fall back to `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonCalendar {
    pub rules: Vec<SeasonRule>,
    pub fallback: Season,
}

impl SeasonCalendar {
    pub fn season_of(&self, date: NaiveDate) -> Season {
        self.rules
            .iter()
            .find(|rule| rule.ranges.iter().any(|range| range.contains(date)))
            .map(|rule| rule.season)
            .unwrap_or(self.fallback)
    }

    /// Every label this calendar can return.
    pub fn seasons(&self) -> Vec<Season> {
        let mut seasons: Vec<Season> = self.rules.iter().map(|rule| rule.season).collect();
        seasons.push(self.fallback);
        seasons.sort();
        seasons.dedup();
        seasons
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.ranges.iter())
            .try_for_each(AnnualRange::validate)
    }

    /// High / average / low periods of a resort hotel.
    pub fn hotel_calendar() -> Self {
        Self {
            rules: vec![
                SeasonRule {
                    season: Season::High,
                    ranges: vec![
                        AnnualRange::new((12, 15), (12, 31)),
                        AnnualRange::new((7, 1), (8, 31)),
                    ],
                },
                SeasonRule {
                    season: Season::Low,
                    ranges: vec![
                        AnnualRange::new((1, 1), (3, 15)),
                        AnnualRange::new((10, 1), (11, 30)),
                    ],
                },
                SeasonRule {
                    season: Season::Average,
                    ranges: vec![
                        AnnualRange::new((3, 16), (6, 30)),
                        AnnualRange::new((9, 1), (9, 30)),
                        AnnualRange::new((12, 1), (12, 14)),
                    ],
                },
            ],
            fallback: Season::Average,
        }
    }

    /// Three-month meteorological seasons.
    pub fn meteorological() -> Self {
        Self {
            rules: vec![
                SeasonRule {
                    season: Season::Winter,
                    ranges: vec![AnnualRange::new((12, 1), (2, 29))],
                },
                SeasonRule {
                    season: Season::Spring,
                    ranges: vec![AnnualRange::new((3, 1), (5, 31))],
                },
                SeasonRule {
                    season: Season::Summer,
                    ranges: vec![AnnualRange::new((6, 1), (8, 31))],
                },
                SeasonRule {
                    season: Season::Fall,
                    ranges: vec![AnnualRange::new((9, 1), (11, 30))],
                },
            ],
            fallback: Season::Winter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialEvent {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub multiplier: f64,
}

impl SpecialEvent {
    pub fn on(name: &str, day: NaiveDate, multiplier: f64) -> Self {
        Self {
            name: name.to_string(),
            start: day,
            end: day,
            multiplier,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, begin: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && begin <= self.end
    }
}

// How an event window is matched against a stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMatching {
    StartDate,
    StayOverlap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCalendar {
    pub events: Vec<SpecialEvent>,
    pub matching: EventMatching,
}

impl EventCalendar {
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            matching: EventMatching::StartDate,
        }
    }

    pub fn is_event_date(&self, date: NaiveDate) -> bool {
        self.events.iter().any(|event| event.contains(date))
    }

    /// Combined multiplier of every event that applies to the stay.
    /// Overlapping events compound; no match gives 1.0.
    pub fn multiplier(&self, begin: NaiveDate, end: NaiveDate) -> f64 {
        self.events
            .iter()
            .filter(|event| match self.matching {
                EventMatching::StartDate => event.contains(begin),
                EventMatching::StayOverlap => event.overlaps(begin, end),
            })
            .map(|event| event.multiplier)
            .product()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for event in &self.events {
            if event.start > event.end {
                return Err(ConfigError::InvalidEvent {
                    name: event.name.clone(),
                    reason: format!("starts {} after it ends {}", event.start, event.end),
                });
            }
            if !(event.multiplier.is_finite() && event.multiplier > 0.0) {
                return Err(ConfigError::InvalidEvent {
                    name: event.name.clone(),
                    reason: format!("multiplier {} must be positive", event.multiplier),
                });
            }
        }
        Ok(())
    }
}
