//! Sorted spatial index over stop coordinates used for radius queries,
//! grounded on `original_source/backend/prox.cpp`: a
//! bounding-box prefilter via binary search, then a linear scan using
//! an equirectangular ("flat-earth") distance approximation.

use crate::coords::DmsCoord;
use crate::ids::StopId;

const DEGREES_PER_METER_LAT: f64 = 1.0 / 111_320.0;
const EARTH_RADIUS_M: f64 = 6_371_009.0;

struct Entry {
    stop_id: StopId,
    coord: DmsCoord,
}

/// Stops projected to DMS and sorted by `(lat, lon)`.
pub struct Prox {
    stops: Vec<Entry>,
}

impl Prox {
    pub fn new(stops: impl IntoIterator<Item = (StopId, DmsCoord)>) -> Prox {
        let mut stops: Vec<Entry> = stops.into_iter().map(|(stop_id, coord)| Entry { stop_id, coord }).collect();
        stops.sort_by(|a, b| a.coord.partial_cmp(&b.coord).expect("stop coordinates must not be NaN"));
        Prox { stops }
    }

    /// `stopsWithinMeters(coord, r)`: bounding box + binary search +
    /// equirectangular distance, emitting `(stopId, dist)` pairs.
    pub fn stops_within_meters(&self, coord: DmsCoord, r: f64) -> Vec<(StopId, f64)> {
        let delta_lat = r * DEGREES_PER_METER_LAT;
        let delta_lon = r / (111_320.0 * coord.lat.to_radians().cos());

        let lower = DmsCoord::new(coord.lat - delta_lat, coord.lon - delta_lon);
        let upper = DmsCoord::new(coord.lat + delta_lat, coord.lon + delta_lon);

        let lo = self.stops.partition_point(|e| e.coord < lower);
        let hi = self.stops.partition_point(|e| e.coord <= upper);

        self.stops[lo..hi]
            .iter()
            .filter(|e| e.coord.lon >= lower.lon && e.coord.lon <= upper.lon)
            .filter_map(|e| {
                let dist = equirectangular_distance(coord, e.coord);
                (dist < r).then_some((e.stop_id, dist))
            })
            .collect()
    }

    /// `stopsWithDelayMultiplier(coord, r, walkSpeed)`: walking seconds
    /// to reach each candidate stop, used by the Evaluator.
    pub fn stops_with_delay_multiplier(&self, coord: DmsCoord, r: f64, walk_speed: f64) -> Vec<(StopId, f64)> {
        self.stops_within_meters(coord, r)
            .into_iter()
            .map(|(stop_id, dist)| (stop_id, dist / walk_speed))
            .collect()
    }
}

fn equirectangular_distance(a: DmsCoord, b: DmsCoord) -> f64 {
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let x = (b.lon - a.lon).to_radians() * mean_lat.cos();
    let y = (b.lat - a.lat).to_radians();
    (x * x + y * y).sqrt() * EARTH_RADIUS_M
}
