// Error types shared across the generator pipeline

use chrono::NaiveDate;
use thiserror::Error;

use crate::stay::RoomType;

// Per-record pricing failures. These are recoverable: the generator decides
// what to do with the candidate according to its shortfall policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("No base price bucket for {room_type} with {persons} person(s)")]
    NoPriceBucket { room_type: RoomType, persons: u8 },

    #[error("Stay must cover at least one night, got {0}")]
    InvalidLength(u32),

    #[error("Price is not a finite amount: {0}")]
    NonFinitePrice(f64),
}

impl PricingError {
    /// Only a missing bucket can be cured by drawing another candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PricingError::NoPriceBucket { .. })
    }
}

// Invalid profile or window configuration, always fatal
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid window: {first_day} is after {last_day}")]
    InvalidWindow {
        first_day: NaiveDate,
        last_day: NaiveDate,
    },

    #[error("No such calendar day: {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid inflation: {0}")]
    InvalidInflation(String),

    #[error("Invalid stay length distribution: {0}")]
    InvalidStayLength(String),

    #[error("Invalid price factor for {context}: {reason}")]
    InvalidPriceFactor { context: String, reason: String },

    #[error("Invalid season range: {0}")]
    InvalidSeasonRange(String),

    #[error("Invalid special event '{name}': {reason}")]
    InvalidEvent { name: String, reason: String },

    #[error("Room type list must not be empty")]
    NoRoomTypes,

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Profile file error: {0}")]
    ProfileFile(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// Reading or writing the flat stay file
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// Price projection from a stay history
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("No {room_type} stays for {persons} person(s) around {date} in the previous {years} years")]
    NoHistory {
        room_type: RoomType,
        persons: u8,
        date: NaiveDate,
        years: i32,
    },

    #[error("Only one year of history for {room_type} around {date}, a price change needs at least two")]
    SingleYearHistory { room_type: RoomType, date: NaiveDate },

    #[error("Total room count must be positive")]
    NoRooms,

    #[error("Expected occupancy rate {0} must be a finite, non-negative percentage")]
    InvalidOccupancyRate(f64),

    #[error("Invalid prediction range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Gave up on record {stay_id} after {attempts} attempts: {last_error}")]
    ShortfallExhausted {
        stay_id: u64,
        attempts: u32,
        last_error: PricingError,
    },

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}
