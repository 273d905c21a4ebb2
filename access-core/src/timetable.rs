//! In-memory timetable graph: stops, trips, stop-times, service
//! calendars, transfers, shapes and route metadata.
//!
//! Built once via [`Builder`] from already-parsed feed rows (the outer
//! crate owns CSV parsing); read-only from then on, exactly the split
//! `platy-transit-radar`'s `GTFSData`/`Builder` pair makes in
//! `radar-search/src/search_data.rs`, generalized here from its
//! station/platform/entrance stereotype to the stop-area / stop-point
//! fold used here.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ids::{stop_area, AgencyId, Date, RouteId, ServiceId, ShapeId, StopId, StopSequence, TripId, WALK};
use crate::time::Time;

pub type RouteType = u16;

/// Default minimum transfer time applied when the feed does not override
/// it for a stop.
pub const DEFAULT_MIN_TRANSFER_TIME: i32 = 300;

/// A type-2 (walk) transfer edge, pre-materialized on the `from` stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub to: StopId,
    pub cost: i32,
    /// `WALK` (0) for every edge stored here; kept as a field so the
    /// router can treat walk and trip-continuation edges uniformly.
    pub trip: TripId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub min_transfer_time: i32,
    pub transfers_of_type_walk: Vec<Edge>,
    /// type-1 (stay-seated) transfers: for each trip arriving here, the
    /// trips one may continue on without leaving the vehicle/platform.
    pub transfers_of_type_stay: HashMap<TripId, Vec<TripId>>,
}

impl Stop {
    fn new(stop_id: StopId, name: String, lat: f64, lon: f64) -> Stop {
        Stop {
            stop_id,
            name,
            lat,
            lon,
            min_transfer_time: DEFAULT_MIN_TRANSFER_TIME,
            transfers_of_type_walk: Vec::new(),
            transfers_of_type_stay: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: TripId,
    pub arrival: Time,
    pub departure: Time,
    /// Stop *area*, already folded from the raw feed stop id.
    pub stop_id: StopId,
    pub stop_sequence: StopSequence,
    pub shape_dist_travelled: Option<f64>,
    /// The raw platform (stop point) this stop-time actually boards at.
    pub stop_point: StopId,
    pub headsign: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub service_id: ServiceId,
    pub direction_id: u8,
    pub route_id: RouteId,
    pub shape_id: Option<ShapeId>,
    /// Ordered by `stop_sequence`; `stop_times[stop_sequence - 1]` is the
    /// record for that sequence number. GTFS sequences are 1-based,
    /// Rust slices are 0-based.
    pub stop_times: Vec<StopTime>,
}

impl Trip {
    /// The `StopTime` at 1-based `stop_sequence`, i.e. `stop_times[stop_sequence - 1]`,
    /// defensively re-checked in case a feed's sequences have gaps.
    pub fn stop_time_at(&self, stop_sequence: StopSequence) -> Option<&StopTime> {
        self.stop_times
            .get((stop_sequence - 1) as usize)
            .filter(|st| st.stop_sequence == stop_sequence)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub route_id: RouteId,
    pub agency_id: AgencyId,
    pub short_name: String,
    pub long_name: String,
    pub route_type: RouteType,
    pub desc: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShapePoint {
    pub cumulative_dist: f64,
    pub lat: f64,
    pub lon: f64,
}

/// The read-only transit graph. Construct via [`Builder`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Timetable {
    trips: HashMap<TripId, Trip>,
    stops: HashMap<StopId, Stop>,
    stop_points: HashMap<StopId, (f64, f64)>,
    routes: HashMap<RouteId, Route>,
    shapes: HashMap<ShapeId, Vec<ShapePoint>>,
    service_dates: HashMap<ServiceId, HashSet<Date>>,
    stop_times_by_stop: HashMap<StopId, Vec<StopTime>>,
    start_date: Option<Date>,
    end_date: Option<Date>,
}

impl Timetable {
    pub fn get_stop(&self, stop_id: StopId) -> Option<&Stop> {
        self.stops.get(&stop_id)
    }

    pub fn get_trip(&self, trip_id: TripId) -> Option<&Trip> {
        self.trips.get(&trip_id)
    }

    pub fn get_route(&self, route_id: RouteId) -> Option<&Route> {
        self.routes.get(&route_id)
    }

    pub fn get_shape(&self, shape_id: ShapeId) -> Option<&[ShapePoint]> {
        self.shapes.get(&shape_id).map(Vec::as_slice)
    }

    /// `stopTimesByStop[s]`, sorted ascending by departure.
    pub fn departures_at(&self, stop_id: StopId) -> &[StopTime] {
        self.stop_times_by_stop
            .get(&stop_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `true` iff `service_id` is active on `date`.
    pub fn service_runs_on(&self, service_id: ServiceId, date: Date) -> bool {
        self.service_dates
            .get(&service_id)
            .map(|dates| dates.contains(&date))
            .unwrap_or(false)
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    pub fn start_date(&self) -> Option<Date> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<Date> {
        self.end_date
    }
}

/// Incrementally constructs a [`Timetable`] from feed rows in build
/// order: trips, then stop-times, then the `stopTimesByStop` sort,
/// then calendar dates, stops, transfers, routes, shapes.
#[derive(Default)]
pub struct Builder {
    data: Timetable,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Registers a trip's own metadata; its stop times are added
    /// separately via [`Builder::add_stop_time`].
    pub fn add_trip(&mut self, trip_id: TripId, route_id: RouteId, service_id: ServiceId, direction_id: u8, shape_id: Option<ShapeId>) {
        self.data.trips.insert(
            trip_id,
            Trip {
                service_id,
                direction_id,
                route_id,
                shape_id,
                stop_times: Vec::new(),
            },
        );
    }

    /// Folds `raw_stop_id` to its stop area, appends to both
    /// `stopTimesByStop` and the trip's own `stop_times`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_stop_time(
        &mut self,
        trip_id: TripId,
        arrival: Time,
        departure: Time,
        raw_stop_id: StopId,
        stop_sequence: StopSequence,
        shape_dist_travelled: Option<f64>,
        headsign: Option<String>,
    ) {
        let Some(trip) = self.data.trips.get_mut(&trip_id) else {
            warn!(trip_id, "stop_time references unknown trip, dropping row");
            return;
        };
        let stop_id = stop_area(raw_stop_id);
        let stop_time = StopTime {
            trip_id,
            arrival,
            departure,
            stop_id,
            stop_sequence,
            shape_dist_travelled,
            stop_point: raw_stop_id,
            headsign,
        };
        self.data
            .stop_times_by_stop
            .entry(stop_id)
            .or_default()
            .push(stop_time.clone());
        trip.stop_times.push(stop_time);
    }

    /// Sorts every `stopTimesByStop[s]` ascending by departure.
    /// Deliberately does *not* touch `trip.stop_times`,
    /// which is already in stop-sequence order from the feed.
    pub fn sort_departures(&mut self) {
        for departures in self.data.stop_times_by_stop.values_mut() {
            departures.sort_by_key(|st| st.departure);
        }
    }

    /// Marks `date` as a service-active date for `service_id`.
    pub fn add_calendar_date(&mut self, service_id: ServiceId, date: Date) {
        self.data.service_dates.entry(service_id).or_default().insert(date);
        self.data.start_date = Some(self.data.start_date.map_or(date, |d| d.min(date)));
        self.data.end_date = Some(self.data.end_date.map_or(date, |d| d.max(date)));
    }

    /// `is_stop_point` is reported by the loader.
    pub fn add_stop(&mut self, stop_id: StopId, name: String, lat: f64, lon: f64, is_stop_point: bool) {
        if is_stop_point {
            self.data.stop_points.insert(stop_id, (lat, lon));
        } else {
            self.data.stops.insert(stop_id, Stop::new(stop_id, name, lat, lon));
        }
    }

    /// `transfer_type` 1 is stay-seated (requires
    /// `from_trip_id`/`to_trip_id`), 2 is timed/walk.
    pub fn add_transfer(
        &mut self,
        from_stop_id: StopId,
        to_stop_id: StopId,
        transfer_type: u8,
        min_transfer_time: Option<i32>,
        from_trip_id: Option<TripId>,
        to_trip_id: Option<TripId>,
    ) {
        match transfer_type {
            1 => {
                let (Some(from_trip_id), Some(to_trip_id)) = (from_trip_id, to_trip_id) else {
                    warn!("type-1 transfer missing trip ids, dropping row");
                    return;
                };
                if stop_area(from_stop_id) != stop_area(to_stop_id) {
                    warn!(from_stop_id, to_stop_id, "type-1 transfer spans stop areas, dropping row");
                    return;
                }
                let area = stop_area(from_stop_id);
                let Some(stop) = self.data.stops.get_mut(&area) else {
                    warn!(stop_id = area, "transfer references unknown stop, dropping row");
                    return;
                };
                stop.transfers_of_type_stay.entry(from_trip_id).or_default().push(to_trip_id);
            }
            2 => {
                let from_area = stop_area(from_stop_id);
                let to_area = stop_area(to_stop_id);
                if from_area == to_area {
                    if let Some(mtt) = min_transfer_time {
                        if mtt > 0 {
                            if let Some(stop) = self.data.stops.get_mut(&from_area) {
                                stop.min_transfer_time = mtt;
                            }
                        }
                    }
                    return;
                }
                let cost = min_transfer_time.unwrap_or(DEFAULT_MIN_TRANSFER_TIME);
                let Some(stop) = self.data.stops.get_mut(&from_area) else {
                    warn!(stop_id = from_area, "transfer references unknown stop, dropping row");
                    return;
                };
                if !stop.transfers_of_type_walk.iter().any(|e| e.to == to_area) {
                    stop.transfers_of_type_walk.push(Edge { to: to_area, cost, trip: WALK });
                }
            }
            other => warn!(transfer_type = other, "unknown transfer type, dropping row"),
        }
    }

    /// Registers a route's metadata.
    pub fn add_route(&mut self, route_id: RouteId, agency_id: AgencyId, short_name: String, long_name: String, route_type: RouteType, desc: String) {
        self.data.routes.insert(
            route_id,
            Route {
                route_id,
                agency_id,
                short_name,
                long_name,
                route_type,
                desc,
            },
        );
    }

    /// Appends in sequence order; callers must present shape points
    /// for a given `shape_id` in order.
    pub fn add_shape_point(&mut self, shape_id: ShapeId, cumulative_dist: f64, lat: f64, lon: f64) {
        self.data.shapes.entry(shape_id).or_default().push(ShapePoint {
            cumulative_dist,
            lat,
            lon,
        });
    }

    pub fn build(mut self) -> Timetable {
        self.sort_departures();
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hms: &str) -> Time {
        hms.parse().unwrap()
    }

    #[test]
    fn builds_a_three_stop_line() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_stop(2, "B".into(), 0.0, 0.0, false);
        b.add_stop(3, "C".into(), 0.0, 0.0, false);
        b.add_trip(100, 1, 1, 0, None);
        b.add_stop_time(100, t("08:00:00"), t("08:00:00"), 1, 1, None, None);
        b.add_stop_time(100, t("08:10:00"), t("08:10:00"), 2, 2, None, None);
        b.add_stop_time(100, t("08:20:00"), t("08:20:00"), 3, 3, None, None);
        b.add_calendar_date(1, Date::new(2022, 11, 18));
        let tt = b.build();

        assert_eq!(tt.get_trip(100).unwrap().stop_times.len(), 3);
        assert_eq!(tt.departures_at(1)[0].departure, t("08:00:00"));
        assert!(tt.service_runs_on(1, Date::new(2022, 11, 18)));
        assert!(!tt.service_runs_on(1, Date::new(2022, 11, 19)));
    }

    /// `trips[tripId].stopTimes[stopSequence-1]` is the record for
    /// that sequence.
    #[test]
    fn stop_sequence_is_one_based() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_trip(100, 1, 1, 0, None);
        b.add_stop_time(100, t("08:00:00"), t("08:00:00"), 1, 1, None, None);
        let tt = b.build();
        let trip = tt.get_trip(100).unwrap();
        let st = &trip.stop_times[(1 - 1) as usize];
        assert_eq!(st.stop_sequence, 1);
    }

    /// Type-2 transfers between distinct areas are stored once per
    /// direction, and re-adding the same edge doesn't duplicate it.
    #[test]
    fn walk_transfer_dedupes() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_stop(2, "B".into(), 0.0, 0.0, false);
        b.add_transfer(1, 2, 2, Some(120), None, None);
        b.add_transfer(1, 2, 2, Some(120), None, None);
        let tt = b.build();
        assert_eq!(tt.get_stop(1).unwrap().transfers_of_type_walk.len(), 1);
    }

    #[test]
    fn same_area_type2_overrides_min_transfer_time() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_transfer(1, 1, 2, Some(600), None, None);
        let tt = b.build();
        assert_eq!(tt.get_stop(1).unwrap().min_transfer_time, 600);
        assert!(tt.get_stop(1).unwrap().transfers_of_type_walk.is_empty());
    }

    #[test]
    fn stop_point_coordinates_are_not_stored_as_stops() {
        let mut b = Builder::new();
        b.add_stop(2_001_002_000_500, "Platform".into(), 1.0, 2.0, true);
        let tt = b.build();
        assert!(tt.get_stop(2_001_002_000_500).is_none());
    }
}
