//! Opaque identifiers used throughout the timetable graph.
//!
//! Stop identifiers encode structure: a stop *area* id and a stop *point*
//! id differ in one decimal digit. See [`stop_area`] and [`is_stop_point`].

use serde::{Deserialize, Serialize};

pub type StopId = u64;
pub type TripId = u64;
pub type RouteId = u64;
pub type ShapeId = u64;
pub type AgencyId = u64;
pub type ServiceId = i32;
pub type StopSequence = i32;

/// Reserved trip id meaning "walk transfer, not a real trip".
pub const WALK: TripId = 0;

/// Date as yyyymmdd plus its decomposed fields, matching GTFS calendar_dates.txt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Date {
        Date { year, month, day }
    }

    /// Parses the yyyymmdd integer encoding used by GTFS.
    pub fn from_yyyymmdd(value: i32) -> Date {
        Date {
            year: value / 10_000,
            month: ((value / 100) % 100) as u32,
            day: (value % 100) as u32,
        }
    }

    pub fn to_yyyymmdd(self) -> i32 {
        self.year * 10_000 + self.month as i32 * 100 + self.day as i32
    }
}

/// A stop point (platform) id has `2` in the "location type" decimal field,
/// ten digits up from the bottom, i.e. `(sp / 10^12) % 10 == 2`.
pub fn is_stop_point(sp: StopId) -> bool {
    (sp / 1_000_000_000_000) % 10 == 2
}

/// Folds a raw stop id down to its stop area. Ids that are not stop
/// points per [`is_stop_point`] are already area ids and pass through
/// unchanged; genuine stop-point ids fold as
/// `stopArea(sp) = sp - (sp mod 1000) - 10^12`.
pub fn stop_area(sp: StopId) -> StopId {
    if !is_stop_point(sp) {
        return sp;
    }
    let base = sp - (sp % 1000);
    base - 1_000_000_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_stop_point_to_area() {
        // sp % 1000 == 0 => fold is identity minus 10^12
        let sp: StopId = 2_001_004_002_000;
        assert_eq!(sp % 1000, 0);
        assert_eq!(stop_area(sp), sp - 1_000_000_000_000);
    }

    #[test]
    fn date_round_trips_through_yyyymmdd() {
        let d = Date::new(2022, 11, 18);
        assert_eq!(Date::from_yyyymmdd(d.to_yyyymmdd()), d);
    }

    #[test]
    fn stop_point_detection() {
        assert!(is_stop_point(2_001_002_000_500));
        assert!(!is_stop_point(2_001_000_000_500));
    }

    #[test]
    fn non_point_ids_pass_through_unfolded() {
        assert_eq!(stop_area(1), 1);
        assert_eq!(stop_area(100), 100);
    }
}
