// Generator profiles: the full, immutable configuration of one dataset

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{EventCalendar, EventMatching, Season, SeasonCalendar, SpecialEvent};
use crate::error::ConfigError;
use crate::generator::{LengthConvention, ShortfallPolicy, StayLengthDistribution};
use crate::pricing::{
    BasePriceRule, BasePriceTable, Inflation, Jitter, LengthPricing, PriceFactor, PricingEngine,
};
use crate::stay::RoomType;

// 150 rooms at 75% occupancy for every day of seven years
const HOTEL_CALENDAR_RECORDS: usize = 41_062 * 7;
const METEOROLOGICAL_RECORDS: usize = 100_000;

/// Everything the generator needs to produce a dataset.
///
/// Profiles are plain values: build one from a preset, adjust it with the
/// `with_*` helpers or load it from JSON, then hand it to
/// [`StayGenerator::new`](crate::generator::StayGenerator::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorProfile {
    pub name: String,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub record_count: usize,
    pub room_types: Vec<RoomType>,
    pub stay_length: StayLengthDistribution,
    pub length_convention: LengthConvention,
    #[serde(default)]
    pub shortfall: ShortfallPolicy,
    pub pricing: PricingEngine,
}

impl GeneratorProfile {
    /// Fixed base price with high/average/low season periods, short stays
    /// and recurring summer and winter events.
    pub fn hotel_calendar() -> Result<Self, ConfigError> {
        let first_day = ymd(2017, 1, 1)?;
        let last_day = ymd(2023, 12, 31)?;

        let mut season_multipliers = BTreeMap::new();
        season_multipliers.insert(Season::High, PriceFactor::fixed(1.7));
        season_multipliers.insert(Season::Average, PriceFactor::fixed(1.0));
        season_multipliers.insert(Season::Low, PriceFactor::fixed(0.5));

        let mut events = Vec::new();
        for year in first_day.year()..=last_day.year() {
            events.push(SpecialEvent {
                name: format!("Summer fair {}", year),
                start: ymd(year, 6, 25)?,
                end: ymd(year, 6, 27)?,
                multiplier: 2.0,
            });
            events.push(SpecialEvent {
                name: format!("Winter market {}", year),
                start: ymd(year, 12, 5)?,
                end: ymd(year, 12, 7)?,
                multiplier: 2.0,
            });
        }

        Ok(Self {
            name: "hotel-calendar".to_string(),
            first_day,
            last_day,
            record_count: HOTEL_CALENDAR_RECORDS,
            room_types: RoomType::ALL.to_vec(),
            stay_length: StayLengthDistribution::short_stays(),
            length_convention: LengthConvention::InclusiveEnd,
            shortfall: ShortfallPolicy::default(),
            pricing: PricingEngine {
                base_prices: BasePriceTable::flat(PriceFactor::fixed(150.0)),
                seasons: SeasonCalendar::hotel_calendar(),
                season_multipliers,
                events: EventCalendar {
                    events,
                    matching: EventMatching::StartDate,
                },
                inflation: Inflation {
                    rate: 0.03,
                    reference_year: first_day.year(),
                },
                length_pricing: LengthPricing::short_stay_discounts(),
                jitter: Jitter::Additive {
                    min: -5.0,
                    max: 5.0,
                },
            },
        })
    }

    /// Sampled base prices per room and occupancy, sampled meteorological
    /// season multipliers and three one-off events. Family rooms booked for
    /// two have no base price in this profile.
    pub fn meteorological() -> Result<Self, ConfigError> {
        let first_day = ymd(2015, 1, 1)?;

        let mut season_multipliers = BTreeMap::new();
        season_multipliers.insert(Season::Winter, PriceFactor::uniform(0.5, 0.8));
        season_multipliers.insert(Season::Spring, PriceFactor::uniform(0.8, 1.2));
        season_multipliers.insert(Season::Summer, PriceFactor::uniform(1.2, 1.5));
        season_multipliers.insert(Season::Fall, PriceFactor::uniform(0.8, 1.2));

        let rule = |room_type, persons, min, max| BasePriceRule {
            room_type,
            persons,
            nightly: PriceFactor::uniform(min, max),
        };

        Ok(Self {
            name: "meteorological".to_string(),
            first_day,
            last_day: ymd(2023, 12, 31)?,
            record_count: METEOROLOGICAL_RECORDS,
            room_types: RoomType::ALL.to_vec(),
            stay_length: StayLengthDistribution::Uniform { min: 1, max: 14 },
            length_convention: LengthConvention::ExclusiveEnd,
            shortfall: ShortfallPolicy::default(),
            pricing: PricingEngine {
                base_prices: BasePriceTable {
                    rules: vec![
                        rule(RoomType::Single, None, 100.0, 200.0),
                        rule(RoomType::Double, Some(1), 200.0, 250.0),
                        rule(RoomType::Double, Some(2), 200.0, 300.0),
                        rule(RoomType::Family, Some(3), 350.0, 400.0),
                        rule(RoomType::Family, Some(4), 400.0, 420.0),
                    ],
                },
                seasons: SeasonCalendar::meteorological(),
                season_multipliers,
                events: EventCalendar {
                    events: vec![
                        SpecialEvent::on("Christmas", ymd(2022, 12, 25)?, 2.0),
                        SpecialEvent::on("Summer Festival", ymd(2023, 6, 15)?, 1.5),
                        SpecialEvent::on("Local Concert", ymd(2023, 9, 20)?, 1.8),
                    ],
                    matching: EventMatching::StayOverlap,
                },
                inflation: Inflation {
                    rate: 0.03,
                    reference_year: first_day.year(),
                },
                length_pricing: LengthPricing::PerNight,
                jitter: Jitter::Multiplicative { min: 0.8, max: 1.2 },
            },
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ProfileFile(format!("{}: {}", path.display(), e)))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::ProfileFile(e.to_string()))
    }

    pub fn with_record_count(mut self, record_count: usize) -> Self {
        self.record_count = record_count;
        self
    }

    pub fn with_window(mut self, first_day: NaiveDate, last_day: NaiveDate) -> Self {
        self.first_day = first_day;
        self.last_day = last_day;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_day > self.last_day {
            return Err(ConfigError::InvalidWindow {
                first_day: self.first_day,
                last_day: self.last_day,
            });
        }
        if self.room_types.is_empty() {
            return Err(ConfigError::NoRoomTypes);
        }
        if let ShortfallPolicy::Regenerate { max_attempts: 0 } = self.shortfall {
            return Err(ConfigError::InvalidValue {
                key: "shortfall.max_attempts".to_string(),
                value: "0".to_string(),
            });
        }
        self.stay_length.validate()?;

        // the last check-in plus the longest stay must still be a date
        let longest = Duration::days(i64::from(self.stay_length.max_nights()));
        if self.last_day.checked_add_signed(longest).is_none() {
            return Err(ConfigError::DateOutOfRange(format!(
                "a {}-night stay from {} ends past the calendar",
                self.stay_length.max_nights(),
                self.last_day
            )));
        }

        self.pricing.validate()?;
        self.pricing
            .inflation
            .validate_window(self.first_day.year(), self.last_day.year())
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, ConfigError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ConfigError::InvalidDate {
        year,
        month,
        day,
    })
}
