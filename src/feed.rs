//! Typed record streams the core consumes: one `serde`
//! struct per GTFS text file, trimmed to the columns `access_core`'s
//! `Timetable::Builder` actually uses. Grounded in `platy-transit-radar`'s
//! `src/gtfs/mod.rs` row structs, generalized from its Berlin-specific
//! route-id string/int quirk (kept in spirit but not in the `RouteId`
//! type, which is fixed here as a plain `u64`).

use serde::{Deserialize, Deserializer};

use access_core::ids::{AgencyId, Date, RouteId, ServiceId, ShapeId, StopId, StopSequence, TripId};
use access_core::time::Time;
use access_core::timetable::RouteType;

/// GTFS stop-time columns are `HH:MM:SS` strings (and may exceed 24h),
/// not the plain-integer encoding `access_core::time::Time`'s own
/// `Deserialize` impl expects for internal (de)serialization — so the
/// feed reads through `Time`'s `FromStr` instead.
fn time_from_str<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
pub struct Agency {
    pub agency_id: AgencyId,
    pub agency_name: String,
    pub agency_url: String,
    pub agency_timezone: String,
}

/// A `location_type` of `1` is a stop area; anything else (typically
/// `0`) is a stop point/platform.
#[derive(Debug, Deserialize)]
pub struct Stop {
    pub stop_id: StopId,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default)]
    pub location_type: u8,
}

impl Stop {
    pub fn is_stop_point(&self) -> bool {
        self.location_type != 1
    }
}

#[derive(Debug, Deserialize)]
pub struct Route {
    pub route_id: RouteId,
    pub agency_id: AgencyId,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_type: RouteType,
    #[serde(default)]
    pub route_desc: String,
}

#[derive(Debug, Deserialize)]
pub struct Trip {
    pub route_id: RouteId,
    pub service_id: ServiceId,
    pub trip_id: TripId,
    #[serde(default)]
    pub direction_id: u8,
    pub shape_id: Option<ShapeId>,
}

#[derive(Debug, Deserialize)]
pub struct StopTime {
    pub trip_id: TripId,
    #[serde(deserialize_with = "time_from_str")]
    pub arrival_time: Time,
    #[serde(deserialize_with = "time_from_str")]
    pub departure_time: Time,
    pub stop_id: StopId,
    pub stop_sequence: StopSequence,
    pub shape_dist_traveled: Option<f64>,
    pub stop_headsign: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Calendar {
    pub service_id: ServiceId,
    pub start_date: i32,
    pub end_date: i32,
}

#[derive(Debug, Deserialize)]
pub struct CalendarDate {
    pub service_id: ServiceId,
    pub date: i32,
    /// `1` adds the date, `2` removes it; only feeds using exception
    /// type `1` exclusively are expected (the timetable holds the
    /// exact set of active dates, not a calendar+exception delta).
    pub exception_type: u8,
}

impl CalendarDate {
    pub fn date(&self) -> Date {
        Date::from_yyyymmdd(self.date)
    }
}

#[derive(Debug, Deserialize)]
pub struct Transfer {
    pub from_stop_id: StopId,
    pub to_stop_id: StopId,
    pub transfer_type: u8,
    pub min_transfer_time: Option<i32>,
    pub from_trip_id: Option<TripId>,
    pub to_trip_id: Option<TripId>,
}

#[derive(Debug, Deserialize)]
pub struct Shape {
    pub shape_id: ShapeId,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: i32,
    pub shape_dist_traveled: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedInfo {
    pub feed_publisher_name: String,
    pub feed_publisher_url: String,
    pub feed_lang: String,
    pub feed_start_date: Option<i32>,
    pub feed_end_date: Option<i32>,
    pub feed_version: Option<String>,
}

/// Resident record, one row per person in the
/// population dataset: home/work coordinates are pre-projected planar
/// meters on the 100m/+50m grid `PeopleIndex` assumes, not raw DMS.
#[derive(Debug, Deserialize)]
pub struct PersonRecord {
    pub is_female: bool,
    pub work_county: u16,
    pub work_municipality: u16,
    pub work_x: i32,
    pub work_y: i32,
    pub home_county: u16,
    pub home_municipality: u16,
    pub home_x: i32,
    pub home_y: i32,
}
