// Stay generator: draws candidate stays, prices them and collects records

use chrono::{Duration, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, GeneratorError};
use crate::pricing::StayRequest;
use crate::profile::GeneratorProfile;
use crate::stay::StayRecord;

/// Longest stay any length distribution may produce.
pub const MAX_STAY_NIGHTS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthWeight {
    pub nights: u32,
    pub weight: f64,
}

// How many nights a stay lasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StayLengthDistribution {
    Weighted { weights: Vec<LengthWeight> },
    Uniform { min: u32, max: u32 },
}

impl StayLengthDistribution {
    /// 70% one night, 20% two nights, 10% three nights.
    pub fn short_stays() -> Self {
        StayLengthDistribution::Weighted {
            weights: vec![
                LengthWeight {
                    nights: 1,
                    weight: 0.7,
                },
                LengthWeight {
                    nights: 2,
                    weight: 0.2,
                },
                LengthWeight {
                    nights: 3,
                    weight: 0.1,
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler().map(|_| ())
    }

    /// Longest stay this distribution can draw.
    pub fn max_nights(&self) -> u32 {
        match self {
            StayLengthDistribution::Weighted { weights } => {
                weights.iter().map(|w| w.nights).max().unwrap_or(0)
            }
            StayLengthDistribution::Uniform { max, .. } => *max,
        }
    }

    fn sampler(&self) -> Result<LengthSampler, ConfigError> {
        match self {
            StayLengthDistribution::Weighted { weights } => {
                if let Some(zero) = weights.iter().find(|w| w.nights == 0) {
                    return Err(ConfigError::InvalidStayLength(format!(
                        "weight {} given to a zero-night stay",
                        zero.weight
                    )));
                }
                if let Some(long) = weights.iter().find(|w| w.nights > MAX_STAY_NIGHTS) {
                    return Err(ConfigError::InvalidStayLength(format!(
                        "{} nights exceeds the {} night maximum",
                        long.nights, MAX_STAY_NIGHTS
                    )));
                }
                let index = WeightedIndex::new(weights.iter().map(|w| w.weight))
                    .map_err(|e| ConfigError::InvalidStayLength(e.to_string()))?;
                Ok(LengthSampler::Weighted {
                    index,
                    nights: weights.iter().map(|w| w.nights).collect(),
                })
            }
            StayLengthDistribution::Uniform { min, max } => {
                if *min == 0 || min > max || *max > MAX_STAY_NIGHTS {
                    return Err(ConfigError::InvalidStayLength(format!(
                        "uniform range {}..={} must lie within 1..={}",
                        min, max, MAX_STAY_NIGHTS
                    )));
                }
                Ok(LengthSampler::Uniform {
                    min: *min,
                    max: *max,
                })
            }
        }
    }
}

enum LengthSampler {
    Weighted {
        index: WeightedIndex<f64>,
        nights: Vec<u32>,
    },
    Uniform {
        min: u32,
        max: u32,
    },
}

impl LengthSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match self {
            LengthSampler::Weighted { index, nights } => nights[index.sample(rng)],
            LengthSampler::Uniform { min, max } => rng.gen_range(*min..=*max),
        }
    }
}

/// Where the end date lands relative to the night count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthConvention {
    /// `end = begin + nights - 1`: a one-night stay begins and ends on the same day.
    InclusiveEnd,
    /// `end = begin + nights`: the end date is the check-out day.
    ExclusiveEnd,
}

impl LengthConvention {
    /// `None` when the end date falls outside the calendar.
    pub fn end_of_stay(&self, begin: NaiveDate, nights: u32) -> Option<NaiveDate> {
        let span = match self {
            LengthConvention::InclusiveEnd => i64::from(nights) - 1,
            LengthConvention::ExclusiveEnd => i64::from(nights),
        };
        begin.checked_add_signed(Duration::days(span))
    }
}

// What to do with a candidate whose room type and occupancy have no base price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShortfallPolicy {
    Regenerate { max_attempts: u32 },
    Skip,
    Fail,
}

impl Default for ShortfallPolicy {
    fn default() -> Self {
        ShortfallPolicy::Regenerate { max_attempts: 100 }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub requested: usize,
    pub produced: usize,
    pub skipped: usize,
    pub regenerated: usize,
}

impl GenerationReport {
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.produced)
    }
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub records: Vec<StayRecord>,
    pub report: GenerationReport,
}

pub struct StayGenerator {
    profile: GeneratorProfile,
    window_days: i64,
}

impl StayGenerator {
    pub fn new(profile: GeneratorProfile) -> Result<Self, ConfigError> {
        profile.validate()?;
        let window_days = (profile.last_day - profile.first_day).num_days();
        Ok(Self {
            profile,
            window_days,
        })
    }

    pub fn profile(&self) -> &GeneratorProfile {
        &self.profile
    }

    /// Generates one batch of `record_count` stays.
    ///
    /// Ids are assigned densely from 1 to the records actually produced.
    /// Candidates without a matching base price are handled by the profile's
    /// [`ShortfallPolicy`]; every other failure, including a price that is not
    /// finite, is returned to the caller.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Generation, GeneratorError> {
        let lengths = self.profile.stay_length.sampler()?;
        let requested = self.profile.record_count;

        info!(
            profile = %self.profile.name,
            requested,
            first_day = %self.profile.first_day,
            last_day = %self.profile.last_day,
            "generating stays"
        );

        let mut records = Vec::with_capacity(requested);
        let mut report = GenerationReport {
            requested,
            ..GenerationReport::default()
        };
        let mut next_id: u64 = 1;

        for _ in 0..requested {
            let mut attempts = 0;
            loop {
                attempts += 1;
                let candidate = self.draw_candidate(&lengths, rng)?;

                let err = match self.profile.pricing.quote(&candidate, rng) {
                    Ok(quote) => {
                        records.push(StayRecord::new(
                            next_id,
                            candidate.begin,
                            candidate.end,
                            candidate.persons,
                            candidate.room_type,
                            quote.total,
                        ));
                        next_id += 1;
                        break;
                    }
                    Err(err) if err.is_recoverable() => err,
                    Err(err) => return Err(err.into()),
                };

                match self.profile.shortfall {
                    ShortfallPolicy::Fail => return Err(err.into()),
                    ShortfallPolicy::Skip => {
                        debug!(error = %err, "skipping candidate");
                        report.skipped += 1;
                        break;
                    }
                    ShortfallPolicy::Regenerate { max_attempts } => {
                        if attempts >= max_attempts {
                            return Err(GeneratorError::ShortfallExhausted {
                                stay_id: next_id,
                                attempts,
                                last_error: err,
                            });
                        }
                        debug!(error = %err, attempts, "regenerating candidate");
                        report.regenerated += 1;
                    }
                }
            }
        }

        report.produced = records.len();
        if report.shortfall() > 0 {
            warn!(
                requested = report.requested,
                produced = report.produced,
                skipped = report.skipped,
                "produced fewer stays than requested"
            );
        }
        info!(
            produced = report.produced,
            regenerated = report.regenerated,
            "generation finished"
        );

        Ok(Generation { records, report })
    }

    fn draw_candidate<R: Rng + ?Sized>(
        &self,
        lengths: &LengthSampler,
        rng: &mut R,
    ) -> Result<StayRequest, ConfigError> {
        let offset = Duration::days(rng.gen_range(0..=self.window_days));
        let nights = lengths.sample(rng);
        let begin = self.profile.first_day.checked_add_signed(offset);
        let end = begin.and_then(|begin| {
            self.profile
                .length_convention
                .end_of_stay(begin, nights)
        });
        let (Some(begin), Some(end)) = (begin, end) else {
            return Err(ConfigError::DateOutOfRange(format!(
                "{}-night stay starting {} days after {}",
                nights,
                offset.num_days(),
                self.profile.first_day
            )));
        };
        let room_type = self.profile.room_types[rng.gen_range(0..self.profile.room_types.len())];
        let persons = rng.gen_range(room_type.occupancy());

        Ok(StayRequest {
            begin,
            end,
            nights,
            room_type,
            persons,
        })
    }
}
