// Stay records: one row of the generated dataset

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

// Room categories offered by the fictitious hotel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomType {
    Single,
    Double,
    Family,
}

impl RoomType {
    pub const ALL: [RoomType; 3] = [RoomType::Single, RoomType::Double, RoomType::Family];

    /// Number of guests the room can hold, inclusive on both ends.
    pub fn occupancy(&self) -> RangeInclusive<u8> {
        match self {
            RoomType::Single => 1..=1,
            RoomType::Double => 1..=2,
            RoomType::Family => 2..=4,
        }
    }

    pub fn admits(&self, persons: u8) -> bool {
        self.occupancy().contains(&persons)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "Single",
            RoomType::Double => "Double",
            RoomType::Family => "Family",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Single" => Ok(RoomType::Single),
            "Double" => Ok(RoomType::Double),
            "Family" => Ok(RoomType::Family),
            other => Err(format!("unknown room type '{}'", other)),
        }
    }
}

/// A single generated booking.
///
/// Records only come out of the generator or a dataset file and expose no
/// way to change them afterwards. Field order matches the CSV header.
/// Reading goes through the dataset module, which checks every invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayRecord {
    stay_id: u64,
    begin_of_stay: NaiveDate,
    end_of_stay: NaiveDate,
    persons: u8,
    room_type: RoomType,
    #[serde(serialize_with = "serialize_price")]
    total_price: f64,
}

impl StayRecord {
    pub(crate) fn new(
        stay_id: u64,
        begin_of_stay: NaiveDate,
        end_of_stay: NaiveDate,
        persons: u8,
        room_type: RoomType,
        total_price: f64,
    ) -> Self {
        Self {
            stay_id,
            begin_of_stay,
            end_of_stay,
            persons,
            room_type,
            total_price,
        }
    }

    pub fn stay_id(&self) -> u64 {
        self.stay_id
    }

    pub fn begin_of_stay(&self) -> NaiveDate {
        self.begin_of_stay
    }

    pub fn end_of_stay(&self) -> NaiveDate {
        self.end_of_stay
    }

    pub fn persons(&self) -> u8 {
        self.persons
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    /// Days between check-in and check-out.
    pub fn day_span(&self) -> i64 {
        (self.end_of_stay - self.begin_of_stay).num_days()
    }

    /// Whether the guest is in the room on `date` (both ends inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.begin_of_stay <= date && date <= self.end_of_stay
    }

    // Returns the first broken record invariant, if any
    pub(crate) fn violation(&self) -> Option<String> {
        if self.end_of_stay < self.begin_of_stay {
            return Some(format!(
                "end_of_stay {} is before begin_of_stay {}",
                self.end_of_stay, self.begin_of_stay
            ));
        }
        if !self.room_type.admits(self.persons) {
            return Some(format!(
                "{} person(s) do not fit a {} room",
                self.persons, self.room_type
            ));
        }
        if !(self.total_price.is_finite() && self.total_price > 0.0) {
            return Some(format!(
                "total_price {} is not a positive amount",
                self.total_price
            ));
        }
        None
    }
}

fn serialize_price<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", price))
}

/// Rounds a monetary amount to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test_case(RoomType::Single, 1, true; "single fits one")]
    #[test_case(RoomType::Single, 2, false; "single rejects two")]
    #[test_case(RoomType::Double, 1, true; "double fits one")]
    #[test_case(RoomType::Double, 3, false; "double rejects three")]
    #[test_case(RoomType::Family, 1, false; "family rejects one")]
    #[test_case(RoomType::Family, 4, true; "family fits four")]
    fn test_room_type_admits(room_type: RoomType, persons: u8, expected: bool) {
        assert_eq!(room_type.admits(persons), expected);
    }

    #[test]
    fn test_room_type_parse_and_display() {
        for room_type in RoomType::ALL {
            let parsed: RoomType = room_type.to_string().parse().unwrap();
            assert_eq!(parsed, room_type);
        }
        assert!("Suite".parse::<RoomType>().is_err());
        assert!("single".parse::<RoomType>().is_err());
    }

    #[test]
    fn test_covers_is_inclusive() {
        let stay = StayRecord::new(
            1,
            date(2021, 8, 20),
            date(2021, 8, 24),
            1,
            RoomType::Single,
            420.0,
        );
        assert!(stay.covers(date(2021, 8, 20)));
        assert!(stay.covers(date(2021, 8, 22)));
        assert!(stay.covers(date(2021, 8, 24)));
        assert!(!stay.covers(date(2021, 8, 25)));
        assert!(!stay.covers(date(2021, 8, 19)));
        assert_eq!(stay.day_span(), 4);
    }

    #[test]
    fn test_violation_detects_broken_records() {
        let ok = StayRecord::new(1, date(2020, 1, 1), date(2020, 1, 1), 2, RoomType::Double, 99.5);
        assert!(ok.violation().is_none());

        let reversed =
            StayRecord::new(2, date(2020, 1, 3), date(2020, 1, 1), 1, RoomType::Single, 10.0);
        assert!(reversed.violation().is_some());

        let crowded =
            StayRecord::new(3, date(2020, 1, 1), date(2020, 1, 2), 3, RoomType::Double, 10.0);
        assert!(crowded.violation().is_some());

        let free = StayRecord::new(4, date(2020, 1, 1), date(2020, 1, 2), 1, RoomType::Single, 0.0);
        assert!(free.violation().is_some());
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(12.345_6), 12.35);
        assert_eq!(round_cents(12.344), 12.34);
        assert_eq!(round_cents(100.0), 100.0);
    }
}
