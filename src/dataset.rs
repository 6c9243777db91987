// Flat CSV file holding generated stays

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::DatasetError;
use crate::stay::{RoomType, StayRecord};

pub const HEADER: [&str; 6] = [
    "stay_id",
    "begin_of_stay",
    "end_of_stay",
    "persons",
    "room_type",
    "total_price",
];

// A row as found on disk, before the record invariants are checked
#[derive(Debug, Deserialize)]
struct StayRow {
    stay_id: u64,
    begin_of_stay: NaiveDate,
    end_of_stay: NaiveDate,
    persons: u8,
    room_type: RoomType,
    total_price: f64,
}

impl TryFrom<StayRow> for StayRecord {
    type Error = String;

    fn try_from(row: StayRow) -> Result<Self, Self::Error> {
        let stay = StayRecord::new(
            row.stay_id,
            row.begin_of_stay,
            row.end_of_stay,
            row.persons,
            row.room_type,
            row.total_price,
        );
        match stay.violation() {
            Some(reason) => Err(reason),
            None => Ok(stay),
        }
    }
}

pub fn write_stays(path: impl AsRef<Path>, stays: &[StayRecord]) -> Result<(), DatasetError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_stays_to(file, stays)?;
    info!(path = %path.display(), rows = stays.len(), "wrote stay file");
    Ok(())
}

/// Writes the header followed by one row per stay. The header is written
/// even when there are no stays.
pub fn write_stays_to<W: Write>(writer: W, stays: &[StayRecord]) -> Result<(), DatasetError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for stay in stays {
        writer.serialize(stay)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_stays(path: impl AsRef<Path>) -> Result<Vec<StayRecord>, DatasetError> {
    let path = path.as_ref();
    let stays = read_stays_from(File::open(path)?)?;
    info!(path = %path.display(), rows = stays.len(), "read stay file");
    Ok(stays)
}

/// Parses a stay file. Any row that does not parse or breaks a record
/// invariant fails the whole read.
pub fn read_stays_from<R: Read>(reader: R) -> Result<Vec<StayRecord>, DatasetError> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(DatasetError::MalformedRow {
            line: 1,
            reason: format!("unexpected header '{}'", headers.iter().collect::<Vec<_>>().join(",")),
        });
    }

    let mut stays = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());

        let stay: StayRow = row
            .deserialize(Some(&headers))
            .map_err(|e| DatasetError::MalformedRow {
                line,
                reason: e.to_string(),
            })?;
        let stay = StayRecord::try_from(stay)
            .map_err(|reason| DatasetError::MalformedRow { line, reason })?;
        stays.push(stay);
    }
    Ok(stays)
}
