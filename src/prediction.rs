// Price projection for future dates from the same dates in past years

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::error::PredictionError;
use crate::stay::{RoomType, StayRecord};

/// Past years searched for comparable stays.
pub const HISTORY_YEARS: i32 = 5;
/// Days on either side of the reference day a stay may touch to count.
pub const WINDOW_DAYS: i64 = 4;
/// Smallest share of the projected price the occupancy adjustment keeps.
pub const MIN_OCCUPANCY_ADJUSTMENT: f64 = 0.1;

/// Which stays to learn from and what the hotel expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    pub room_type: RoomType,
    pub persons: u8,
    /// Occupancy the hotel expects, in percent.
    pub expected_occupancy_rate: f64,
    /// Rooms of this type in the hotel.
    pub total_rooms: u32,
}

impl PredictionRequest {
    fn validate(&self) -> Result<(), PredictionError> {
        if self.total_rooms == 0 {
            return Err(PredictionError::NoRooms);
        }
        if !(self.expected_occupancy_rate.is_finite() && self.expected_occupancy_rate >= 0.0) {
            return Err(PredictionError::InvalidOccupancyRate(
                self.expected_occupancy_rate,
            ));
        }
        Ok(())
    }
}

/// What one past year contributed to a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSample {
    pub year: i32,
    pub reference_day: NaiveDate,
    pub stays: usize,
    pub average_price: f64,
    /// Average rooms occupied over the window, in percent of the hotel's rooms.
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricePrediction {
    pub date: NaiveDate,
    /// Years with comparable stays, oldest first.
    pub history: Vec<YearSample>,
    pub average_price_change: f64,
    pub average_occupancy_rate: f64,
    pub occupancy_adjustment: f64,
    pub price: f64,
}

/// Predicts the price of a stay starting on `date`.
///
/// For each of the previous [`HISTORY_YEARS`] years, stays of the requested
/// room type and occupant count that touch the same calendar day give an
/// average price and an occupancy rate. The last average price is carried
/// forward by the mean year-over-year change, then scaled by how the
/// expected occupancy compares to the historical one.
pub fn predict_price(
    stays: &[StayRecord],
    request: &PredictionRequest,
    date: NaiveDate,
) -> Result<PricePrediction, PredictionError> {
    request.validate()?;

    let history = year_samples(stays, request, date);
    let last_price = match history.as_slice() {
        [] => {
            return Err(PredictionError::NoHistory {
                room_type: request.room_type,
                persons: request.persons,
                date,
                years: HISTORY_YEARS,
            })
        }
        [_] => {
            return Err(PredictionError::SingleYearHistory {
                room_type: request.room_type,
                date,
            })
        }
        [.., last] => last.average_price,
    };

    let average_price_change = history
        .windows(2)
        .map(|pair| (pair[1].average_price - pair[0].average_price) / pair[0].average_price)
        .sum::<f64>()
        / (history.len() - 1) as f64;
    let average_occupancy_rate =
        history.iter().map(|year| year.occupancy_rate).sum::<f64>() / history.len() as f64;

    // every sampled year has at least one stay inside its window, so the rate is positive
    let occupancy_adjustment = (1.0
        - (request.expected_occupancy_rate - average_occupancy_rate) / average_occupancy_rate)
        .max(MIN_OCCUPANCY_ADJUSTMENT);
    let price = last_price * (1.0 + average_price_change) * occupancy_adjustment;

    debug!(
        %date,
        years = history.len(),
        average_price_change,
        average_occupancy_rate,
        price,
        "predicted price"
    );

    Ok(PricePrediction {
        date,
        history,
        average_price_change,
        average_occupancy_rate,
        occupancy_adjustment,
        price,
    })
}

/// One prediction per day from `from` to `to`, both included.
pub fn predict_prices(
    stays: &[StayRecord],
    request: &PredictionRequest,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PricePrediction>, PredictionError> {
    if from > to {
        return Err(PredictionError::InvalidRange { from, to });
    }
    from.iter_days()
        .take_while(|date| *date <= to)
        .map(|date| predict_price(stays, request, date))
        .collect()
}

fn year_samples(
    stays: &[StayRecord],
    request: &PredictionRequest,
    date: NaiveDate,
) -> Vec<YearSample> {
    let matching: Vec<&StayRecord> = stays
        .iter()
        .filter(|stay| stay.room_type() == request.room_type && stay.persons() == request.persons)
        .collect();
    let reach = Duration::days(WINDOW_DAYS);

    (date.year().saturating_sub(HISTORY_YEARS)..date.year())
        .filter_map(|year| {
            let reference_day = same_day_in(year, date)?;
            let window_start = reference_day.checked_sub_signed(reach)?;
            let window_end = reference_day.checked_add_signed(reach)?;

            let nearby: Vec<&StayRecord> = matching
                .iter()
                .copied()
                .filter(|stay| {
                    stay.end_of_stay() >= window_start && stay.begin_of_stay() <= window_end
                })
                .collect();
            if nearby.is_empty() {
                return None;
            }

            let average_price =
                nearby.iter().map(|stay| stay.total_price()).sum::<f64>() / nearby.len() as f64;
            let occupied: usize = window_start
                .iter_days()
                .take_while(|day| *day <= window_end)
                .map(|day| nearby.iter().filter(|stay| stay.covers(day)).count())
                .sum();
            let window_len = (2 * WINDOW_DAYS + 1) as f64;
            let occupancy_rate =
                occupied as f64 / window_len / f64::from(request.total_rooms) * 100.0;

            debug!(year, stays = nearby.len(), average_price, occupancy_rate, "history year");
            Some(YearSample {
                year,
                reference_day,
                stays: nearby.len(),
                average_price,
                occupancy_rate,
            })
        })
        .collect()
}

// Feb 29 maps to Feb 28 in years without one
fn same_day_in(year: i32, date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
}
