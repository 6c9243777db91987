// Pricing rules: turns a stay request into a total price

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calendar::{EventCalendar, Season, SeasonCalendar};
use crate::error::{ConfigError, PricingError};
use crate::stay::{round_cents, RoomType};

/// Lowest total a stay can be priced at after jitter and rounding.
pub const MIN_PRICE: f64 = 0.01;

/// How far the inflation reference year may sit from the generation window.
pub const MAX_INFLATION_SPAN: i32 = 200;

// A scalar that is either fixed or drawn uniformly per stay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceFactor {
    Fixed { value: f64 },
    Uniform { min: f64, max: f64 },
}

impl PriceFactor {
    pub const fn fixed(value: f64) -> Self {
        PriceFactor::Fixed { value }
    }

    pub const fn uniform(min: f64, max: f64) -> Self {
        PriceFactor::Uniform { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            PriceFactor::Fixed { value } => value,
            PriceFactor::Uniform { min, max } => rng.gen_range(min..=max),
        }
    }

    // Positive and finite on both ends, min <= max
    fn validate(&self, context: &str) -> Result<(), ConfigError> {
        let (min, max) = match *self {
            PriceFactor::Fixed { value } => (value, value),
            PriceFactor::Uniform { min, max } => (min, max),
        };
        let reason = if !(min.is_finite() && max.is_finite()) {
            Some("bounds must be finite".to_string())
        } else if min <= 0.0 {
            Some(format!("{} must be positive", min))
        } else if min > max {
            Some(format!("min {} exceeds max {}", min, max))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ConfigError::InvalidPriceFactor {
                context: context.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePriceRule {
    pub room_type: RoomType,
    /// `None` matches any occupant count.
    #[serde(default)]
    pub persons: Option<u8>,
    pub nightly: PriceFactor,
}

/// Nightly base prices keyed by room type and, optionally, occupant count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePriceTable {
    pub rules: Vec<BasePriceRule>,
}

impl BasePriceTable {
    /// The same nightly price for every room and occupancy.
    pub fn flat(nightly: PriceFactor) -> Self {
        Self {
            rules: RoomType::ALL
                .iter()
                .map(|&room_type| BasePriceRule {
                    room_type,
                    persons: None,
                    nightly,
                })
                .collect(),
        }
    }

    pub fn lookup(&self, room_type: RoomType, persons: u8) -> Result<&PriceFactor, PricingError> {
        self.rules
            .iter()
            .find(|rule| rule.room_type == room_type && rule.persons.map_or(true, |p| p == persons))
            .map(|rule| &rule.nightly)
            .ok_or(PricingError::NoPriceBucket { room_type, persons })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inflation {
    pub rate: f64,
    pub reference_year: i32,
}

impl Inflation {
    /// `(1 + rate)^(year - reference_year)`; years before the reference deflate.
    pub fn factor(&self, year: i32) -> f64 {
        (1.0 + self.rate).powi(year.saturating_sub(self.reference_year))
    }

    // Reference year near the window and a usable factor at both of its ends.
    // The factor is monotonic in the year, so the ends bound every year between.
    pub fn validate_window(&self, first_year: i32, last_year: i32) -> Result<(), ConfigError> {
        let earliest = first_year.saturating_sub(MAX_INFLATION_SPAN);
        let latest = last_year.saturating_add(MAX_INFLATION_SPAN);
        if !(earliest..=latest).contains(&self.reference_year) {
            return Err(ConfigError::InvalidInflation(format!(
                "reference year {} must lie within {}..={}",
                self.reference_year, earliest, latest
            )));
        }
        for year in [first_year, last_year] {
            let factor = self.factor(year);
            if !(factor.is_finite() && factor > 0.0) {
                return Err(ConfigError::InvalidInflation(format!(
                    "rate {} gives factor {} in {}",
                    self.rate, factor, year
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthDiscount {
    pub nights: u32,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LengthPricing {
    PerNight,
    PerNightWithDiscounts { discounts: Vec<LengthDiscount> },
}

impl LengthPricing {
    /// 10% off two-night stays, 20% off three-night stays.
    pub fn short_stay_discounts() -> Self {
        LengthPricing::PerNightWithDiscounts {
            discounts: vec![
                LengthDiscount {
                    nights: 2,
                    factor: 0.9,
                },
                LengthDiscount {
                    nights: 3,
                    factor: 0.8,
                },
            ],
        }
    }

    pub fn factor(&self, nights: u32) -> f64 {
        match self {
            LengthPricing::PerNight => 1.0,
            LengthPricing::PerNightWithDiscounts { discounts } => discounts
                .iter()
                .find(|d| d.nights == nights)
                .map_or(1.0, |d| d.factor),
        }
    }
}

// Random noise added on top of the computed price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Jitter {
    None,
    Additive { min: f64, max: f64 },
    Multiplicative { min: f64, max: f64 },
}

impl Jitter {
    pub fn apply<R: Rng + ?Sized>(&self, amount: f64, rng: &mut R) -> f64 {
        match *self {
            Jitter::None => amount,
            Jitter::Additive { min, max } => amount + rng.gen_range(min..=max),
            Jitter::Multiplicative { min, max } => amount * rng.gen_range(min..=max),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidPriceFactor {
            context: "jitter".to_string(),
            reason,
        };
        match *self {
            Jitter::None => Ok(()),
            Jitter::Additive { min, max } | Jitter::Multiplicative { min, max }
                if !(min.is_finite() && max.is_finite()) || min > max =>
            {
                Err(invalid(format!("[{}, {}] is not a valid range", min, max)))
            }
            Jitter::Multiplicative { min, .. } if min <= 0.0 => {
                Err(invalid(format!("multiplier {} must be positive", min)))
            }
            _ => Ok(()),
        }
    }
}

/// What the pricing function needs to know about a stay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayRequest {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub nights: u32,
    pub room_type: RoomType,
    pub persons: u8,
}

/// Every factor that went into a price, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub season: Season,
    pub base_nightly: f64,
    pub season_factor: f64,
    pub event_factor: f64,
    pub inflation_factor: f64,
    pub nights: u32,
    pub length_factor: f64,
    /// Price before jitter and rounding.
    pub subtotal: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingEngine {
    pub base_prices: BasePriceTable,
    pub seasons: SeasonCalendar,
    pub season_multipliers: BTreeMap<Season, PriceFactor>,
    pub events: EventCalendar,
    pub inflation: Inflation,
    pub length_pricing: LengthPricing,
    pub jitter: Jitter,
}

impl PricingEngine {
    /// Prices a stay.
    ///
    /// Base nightly price, then season, special events and inflation, then
    /// the night count and any length discount. Jitter goes on last and the
    /// result is rounded to cents, never below [`MIN_PRICE`].
    pub fn quote<R: Rng + ?Sized>(
        &self,
        stay: &StayRequest,
        rng: &mut R,
    ) -> Result<PriceQuote, PricingError> {
        if stay.nights == 0 {
            return Err(PricingError::InvalidLength(stay.nights));
        }

        let base_nightly = self
            .base_prices
            .lookup(stay.room_type, stay.persons)?
            .sample(rng);

        let season = self.seasons.season_of(stay.begin);
        let season_factor = self
            .season_multipliers
            .get(&season)
            .map_or(1.0, |factor| factor.sample(rng));

        let event_factor = self.events.multiplier(stay.begin, stay.end);
        let inflation_factor = self.inflation.factor(stay.begin.year());
        let length_factor = self.length_pricing.factor(stay.nights);

        let subtotal = base_nightly
            * season_factor
            * event_factor
            * inflation_factor
            * f64::from(stay.nights)
            * length_factor;
        if !subtotal.is_finite() {
            return Err(PricingError::NonFinitePrice(subtotal));
        }

        // rounding scales by 100, so a finite subtotal can still overflow here
        let total = round_cents(self.jitter.apply(subtotal, rng)).max(MIN_PRICE);
        if !total.is_finite() {
            return Err(PricingError::NonFinitePrice(total));
        }

        Ok(PriceQuote {
            season,
            base_nightly,
            season_factor,
            event_factor,
            inflation_factor,
            nights: stay.nights,
            length_factor,
            subtotal,
            total,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.base_prices.rules {
            let context = match rule.persons {
                Some(persons) => format!("{} base price for {} person(s)", rule.room_type, persons),
                None => format!("{} base price", rule.room_type),
            };
            rule.nightly.validate(&context)?;
        }
        for (season, factor) in &self.season_multipliers {
            factor.validate(&format!("{} season", season))?;
        }
        self.seasons.validate()?;
        self.events.validate()?;

        if !(self.inflation.rate.is_finite() && self.inflation.rate > -1.0) {
            return Err(ConfigError::InvalidPriceFactor {
                context: "inflation".to_string(),
                reason: format!("rate {} must be finite and above -1", self.inflation.rate),
            });
        }
        if let LengthPricing::PerNightWithDiscounts { discounts } = &self.length_pricing {
            for discount in discounts {
                PriceFactor::fixed(discount.factor)
                    .validate(&format!("{}-night discount", discount.nights))?;
            }
        }
        self.jitter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{EventMatching, SpecialEvent};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Deterministic engine: fixed factors, no jitter
    fn fixed_engine() -> PricingEngine {
        let mut season_multipliers = BTreeMap::new();
        season_multipliers.insert(Season::High, PriceFactor::fixed(1.7));
        season_multipliers.insert(Season::Average, PriceFactor::fixed(1.0));
        season_multipliers.insert(Season::Low, PriceFactor::fixed(0.5));

        PricingEngine {
            base_prices: BasePriceTable::flat(PriceFactor::fixed(150.0)),
            seasons: SeasonCalendar::hotel_calendar(),
            season_multipliers,
            events: EventCalendar {
                events: vec![SpecialEvent {
                    name: "Summer fair".to_string(),
                    start: date(2024, 6, 25),
                    end: date(2024, 6, 27),
                    multiplier: 2.0,
                }],
                matching: EventMatching::StartDate,
            },
            inflation: Inflation {
                rate: 0.03,
                reference_year: 2017,
            },
            length_pricing: LengthPricing::short_stay_discounts(),
            jitter: Jitter::None,
        }
    }

    fn request(begin: NaiveDate, nights: u32, room_type: RoomType, persons: u8) -> StayRequest {
        StayRequest {
            begin,
            end: begin + chrono::Duration::days(i64::from(nights) - 1),
            nights,
            room_type,
            persons,
        }
    }

    #[test]
    fn test_quote_applies_every_factor() {
        let engine = fixed_engine();
        let mut rng = StdRng::seed_from_u64(7);

        // low season, two nights, two years after the reference
        let quote = engine
            .quote(&request(date(2019, 2, 10), 2, RoomType::Double, 2), &mut rng)
            .unwrap();

        assert_eq!(quote.season, Season::Low);
        assert_eq!(quote.season_factor, 0.5);
        assert_eq!(quote.event_factor, 1.0);
        assert_eq!(quote.length_factor, 0.9);
        let expected = 150.0 * 0.5 * 1.03_f64.powi(2) * 2.0 * 0.9;
        assert!((quote.subtotal - expected).abs() < 1e-9);
        assert_eq!(quote.total, round_cents(expected));
    }

    #[test_case(1, 1.0; "one night full price")]
    #[test_case(2, 0.9; "two nights ten percent off")]
    #[test_case(3, 0.8; "three nights twenty percent off")]
    #[test_case(5, 1.0; "no discount for other lengths")]
    fn test_length_discounts(nights: u32, factor: f64) {
        assert_eq!(LengthPricing::short_stay_discounts().factor(nights), factor);
        assert_eq!(LengthPricing::PerNight.factor(nights), 1.0);
    }

    #[test]
    fn test_price_increases_with_start_year() {
        let engine = fixed_engine();
        let mut rng = StdRng::seed_from_u64(1);
        let mut previous = 0.0;

        for year in 2015..2026 {
            let quote = engine
                .quote(&request(date(year, 4, 10), 1, RoomType::Single, 1), &mut rng)
                .unwrap();
            assert!(
                quote.subtotal > previous,
                "{} priced {} after {}",
                year,
                quote.subtotal,
                previous
            );
            previous = quote.subtotal;
        }
    }

    #[test]
    fn test_event_start_doubles_subtotal() {
        let engine = fixed_engine();
        let mut rng = StdRng::seed_from_u64(3);

        // Jun 25 and Jun 20 are both average season
        let event = engine
            .quote(&request(date(2024, 6, 25), 1, RoomType::Family, 3), &mut rng)
            .unwrap();
        let plain = engine
            .quote(&request(date(2024, 6, 20), 1, RoomType::Family, 3), &mut rng)
            .unwrap();

        assert_eq!(event.season, plain.season);
        assert_eq!(event.event_factor, 2.0);
        assert!((event.subtotal - 2.0 * plain.subtotal).abs() < 1e-9);
    }

    #[test]
    fn test_missing_price_bucket() {
        let engine = PricingEngine {
            base_prices: BasePriceTable {
                rules: vec![BasePriceRule {
                    room_type: RoomType::Family,
                    persons: Some(3),
                    nightly: PriceFactor::uniform(350.0, 400.0),
                }],
            },
            ..fixed_engine()
        };
        let mut rng = StdRng::seed_from_u64(11);

        let err = engine
            .quote(&request(date(2020, 5, 5), 1, RoomType::Family, 2), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            PricingError::NoPriceBucket {
                room_type: RoomType::Family,
                persons: 2
            }
        );

        let quote = engine
            .quote(&request(date(2020, 5, 5), 1, RoomType::Family, 3), &mut rng)
            .unwrap();
        assert!(quote.base_nightly >= 350.0 && quote.base_nightly <= 400.0);
    }

    #[test]
    fn test_zero_nights_rejected() {
        let engine = fixed_engine();
        let mut rng = StdRng::seed_from_u64(0);
        let stay = StayRequest {
            begin: date(2020, 1, 1),
            end: date(2020, 1, 1),
            nights: 0,
            room_type: RoomType::Single,
            persons: 1,
        };
        assert_eq!(
            engine.quote(&stay, &mut rng).unwrap_err(),
            PricingError::InvalidLength(0)
        );
    }

    #[test]
    fn test_total_never_drops_below_floor() {
        let engine = PricingEngine {
            base_prices: BasePriceTable::flat(PriceFactor::fixed(1.0)),
            jitter: Jitter::Additive {
                min: -50.0,
                max: -40.0,
            },
            ..fixed_engine()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let quote = engine
            .quote(&request(date(2020, 1, 5), 1, RoomType::Single, 1), &mut rng)
            .unwrap();
        assert_eq!(quote.total, MIN_PRICE);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            let added = Jitter::Additive { min: -5.0, max: 5.0 }.apply(100.0, &mut rng);
            assert!((95.0..=105.0).contains(&added));
            let scaled = Jitter::Multiplicative { min: 0.8, max: 1.2 }.apply(100.0, &mut rng);
            assert!((80.0..=120.0).contains(&scaled));
        }
    }

    #[test]
    fn test_validate_rejects_bad_factors() {
        assert!(fixed_engine().validate().is_ok());

        let inverted = PricingEngine {
            base_prices: BasePriceTable::flat(PriceFactor::uniform(200.0, 100.0)),
            ..fixed_engine()
        };
        assert!(inverted.validate().is_err());

        let negative_jitter = PricingEngine {
            jitter: Jitter::Multiplicative { min: -0.2, max: 1.2 },
            ..fixed_engine()
        };
        assert!(negative_jitter.validate().is_err());

        let collapse = PricingEngine {
            inflation: Inflation {
                rate: -1.0,
                reference_year: 2017,
            },
            ..fixed_engine()
        };
        assert!(collapse.validate().is_err());
    }

    #[test]
    fn test_inflation_far_from_reference_does_not_overflow() {
        let inflation = Inflation {
            rate: 0.03,
            reference_year: i32::MIN,
        };
        assert!(inflation.factor(2020).is_infinite());
        assert!(inflation.validate_window(2017, 2023).is_err());
    }

    #[test_case(0.03, 2017, true; "preset inflation")]
    #[test_case(0.03, 1900, true; "reference a century back")]
    #[test_case(0.03, i32::MIN, false; "reference year at the integer limit")]
    #[test_case(0.03, 2400, false; "reference too far ahead")]
    #[test_case(1e6, 1900, false; "rate that overflows across the window")]
    fn test_inflation_validate_window(rate: f64, reference_year: i32, valid: bool) {
        let inflation = Inflation {
            rate,
            reference_year,
        };
        assert_eq!(inflation.validate_window(2017, 2023).is_ok(), valid);
    }

    #[test]
    fn test_overflowing_price_is_an_error() {
        let engine = PricingEngine {
            base_prices: BasePriceTable::flat(PriceFactor::fixed(f64::MAX)),
            ..fixed_engine()
        };
        let mut rng = StdRng::seed_from_u64(13);

        // three nights at f64::MAX overflow whatever the season
        let err = engine
            .quote(&request(date(2020, 8, 1), 3, RoomType::Single, 1), &mut rng)
            .unwrap_err();
        assert!(matches!(err, PricingError::NonFinitePrice(price) if price.is_infinite()));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_jitter_overflow_is_an_error() {
        let engine = PricingEngine {
            base_prices: BasePriceTable::flat(PriceFactor::fixed(f64::MAX / 4.0)),
            season_multipliers: BTreeMap::new(),
            inflation: Inflation {
                rate: 0.0,
                reference_year: 2017,
            },
            length_pricing: LengthPricing::PerNight,
            jitter: Jitter::Multiplicative { min: 8.0, max: 9.0 },
            ..fixed_engine()
        };
        let mut rng = StdRng::seed_from_u64(17);

        let err = engine
            .quote(&request(date(2020, 3, 1), 1, RoomType::Double, 2), &mut rng)
            .unwrap_err();
        assert!(matches!(err, PricingError::NonFinitePrice(_)));
    }
}
