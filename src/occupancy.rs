// Occupancy queries over a set of stays

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::stay::{RoomType, StayRecord};

/// Counts stays of `room_type` that cover `target_date`, both ends of the
/// stay included.
pub fn count_occupied(stays: &[StayRecord], room_type: RoomType, target_date: NaiveDate) -> usize {
    stays
        .iter()
        .filter(|stay| stay.room_type() == room_type && stay.covers(target_date))
        .count()
}

// One pass over the stays; room types with no stays still get a zero entry
pub fn occupancy_by_room_type(
    stays: &[StayRecord],
    target_date: NaiveDate,
) -> BTreeMap<RoomType, usize> {
    let mut counts: BTreeMap<RoomType, usize> =
        RoomType::ALL.iter().map(|&room_type| (room_type, 0)).collect();

    for stay in stays.iter().filter(|stay| stay.covers(target_date)) {
        *counts.entry(stay.room_type()).or_default() += 1;
    }
    counts
}
