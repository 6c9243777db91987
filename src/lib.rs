// Synthetic hotel stay dataset generator

pub mod calendar;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod occupancy;
pub mod prediction;
pub mod pricing;
pub mod profile;
pub mod stay;

// Re-export key types for convenience
pub use calendar::{EventCalendar, EventMatching, Season, SeasonCalendar, SpecialEvent};
pub use dataset::{read_stays, write_stays};
pub use error::{ConfigError, DatasetError, GeneratorError, PredictionError, PricingError};
pub use generator::{Generation, GenerationReport, ShortfallPolicy, StayGenerator};
pub use occupancy::{count_occupied, occupancy_by_room_type};
pub use prediction::{predict_price, predict_prices, PricePrediction, PredictionRequest};
pub use pricing::{PriceQuote, PricingEngine, StayRequest};
pub use profile::GeneratorProfile;
pub use stay::{RoomType, StayRecord};
