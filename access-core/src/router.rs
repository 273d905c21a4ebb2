//! Time-dependent label-setting search over a [`Timetable`].
//!
//! Grounded on `platy-transit-radar`'s `JourneyGraphPlotter` in
//! `radar-search/src/journey_graph.rs` — a `BinaryHeap` of queue items
//! ordered by arrival time, lazily generating outgoing edges per
//! popped stop. This version generalizes that to the fixed edge
//! taxonomy used here (walk transfers, trip continuation, stay
//! transfers, fresh boardings) and adds the alternative-edge
//! revisit mechanism its `filter_slow_trip` approximates with a
//! single best predecessor.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::ids::{Date, ShapeId, StopId, StopSequence, TripId, WALK};
use crate::timetable::{Timetable, DEFAULT_MIN_TRANSFER_TIME};

/// Departures strictly before `start_time` are not boardable at the
/// origin; `search_time` bounds how far past the earliest departure a
/// stop's fresh-boarding scan looks.
#[derive(Debug, Clone, Copy)]
pub struct RoutingOptions {
    pub start_time: crate::time::Time,
    pub date: Date,
    pub search_time: i32,
    pub min_transfer_time: i32,
    pub override_min_transfer_time: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingEdge {
    pub from: StopId,
    pub trip_id: TripId,
    pub stop_sequence: StopSequence,
}

#[derive(Debug, Clone)]
pub struct StopState {
    pub travel_time: i32,
    pub initial_wait_time: i32,
    pub incoming: Vec<IncomingEdge>,
    visited: bool,
    revisit: bool,
}

impl StopState {
    fn unreached() -> StopState {
        StopState {
            travel_time: i32::MAX,
            initial_wait_time: 0,
            incoming: Vec::new(),
            visited: false,
            revisit: false,
        }
    }

    fn origin() -> StopState {
        StopState {
            travel_time: 0,
            ..StopState::unreached()
        }
    }
}

enum CandidateKind {
    Walk,
    Continuation,
    StayTransfer,
    FreshBoarding { departure: i32 },
}

struct Candidate {
    to: StopId,
    trip_id: TripId,
    stop_sequence: StopSequence,
    new_time: i32,
    kind: CandidateKind,
}

fn effective_min_transfer_time(tt: &Timetable, stop_id: StopId, options: &RoutingOptions) -> i32 {
    if options.override_min_transfer_time {
        options.min_transfer_time
    } else {
        tt.get_stop(stop_id).map(|s| s.min_transfer_time).unwrap_or(DEFAULT_MIN_TRANSFER_TIME)
    }
}

/// Produces every outgoing edge from `s`, having arrived there with
/// `travel_time` and predecessor list `incoming`: walk transfers, trip
/// continuation, stay transfers, and fresh boardings.
fn outgoing_edges(
    tt: &Timetable,
    s: StopId,
    travel_time: i32,
    incoming: &[IncomingEdge],
    is_origin: bool,
    options: &RoutingOptions,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let start = options.start_time.as_secs();

    if let Some(stop) = tt.get_stop(s) {
        // a) walk transfers
        for edge in &stop.transfers_of_type_walk {
            out.push(Candidate {
                to: edge.to,
                trip_id: WALK,
                stop_sequence: 0,
                new_time: travel_time + edge.cost,
                kind: CandidateKind::Walk,
            });
        }

        // b) trip continuation
        for inc in incoming.iter().filter(|i| i.trip_id != WALK) {
            let Some(trip) = tt.get_trip(inc.trip_id) else { continue };
            let next_seq = inc.stop_sequence + 1;
            if let Some(next) = trip.stop_time_at(next_seq) {
                out.push(Candidate {
                    to: next.stop_id,
                    trip_id: inc.trip_id,
                    stop_sequence: next_seq,
                    new_time: next.arrival.as_secs() - start,
                    kind: CandidateKind::Continuation,
                });
            }
        }

        // c) type-1 stay transfers
        for inc in incoming.iter().filter(|i| i.trip_id != WALK) {
            let Some(continuations) = stop.transfers_of_type_stay.get(&inc.trip_id) else {
                continue;
            };
            let threshold = start + travel_time;
            for &t2_id in continuations {
                let Some(t2) = tt.get_trip(t2_id) else { continue };
                let Some(mut i) = t2
                    .stop_times
                    .iter()
                    .position(|st| st.stop_id == s && st.departure.as_secs() >= threshold)
                else {
                    continue;
                };
                // walk forward past duplicate stop-area entries on the receiving trip
                while i + 1 < t2.stop_times.len() && t2.stop_times[i + 1].stop_id == s {
                    i += 1;
                }
                if let Some(next) = t2.stop_times.get(i + 1) {
                    out.push(Candidate {
                        to: next.stop_id,
                        trip_id: t2_id,
                        stop_sequence: next.stop_sequence,
                        new_time: next.arrival.as_secs() - start,
                        kind: CandidateKind::StayTransfer,
                    });
                }
            }
        }
    }

    // d) fresh boardings
    let earliest = if is_origin {
        start
    } else {
        start + travel_time + effective_min_transfer_time(tt, s, options)
    };
    let departures = tt.departures_at(s);
    let start_idx = departures.partition_point(|st| st.departure.as_secs() < earliest);
    let mut seen_shapes: HashSet<Option<ShapeId>> = HashSet::new();
    for st in &departures[start_idx..] {
        if st.departure.as_secs() >= earliest + options.search_time {
            break;
        }
        let Some(trip) = tt.get_trip(st.trip_id) else { continue };
        if !tt.service_runs_on(trip.service_id, options.date) {
            continue;
        }
        // at most one boarding per distinct shapeId, the earliest (departures are sorted)
        if !seen_shapes.insert(trip.shape_id) {
            continue;
        }
        let next_seq = st.stop_sequence + 1;
        let Some(next) = trip.stop_time_at(next_seq) else { continue };
        // don't board a trip that takes us straight back to where we came from
        if incoming.first().is_some_and(|ie| ie.from == next.stop_id) {
            continue;
        }
        // another platform of the same stop area isn't progress
        if next.stop_id == s {
            continue;
        }
        out.push(Candidate {
            to: next.stop_id,
            trip_id: st.trip_id,
            stop_sequence: next_seq,
            new_time: next.arrival.as_secs() - start,
            kind: CandidateKind::FreshBoarding {
                departure: st.departure.as_secs(),
            },
        });
    }

    out
}

#[allow(clippy::too_many_arguments)]
fn relax(
    tt: &Timetable,
    state: &mut HashMap<StopId, StopState>,
    heap: &mut BinaryHeap<Reverse<(i32, StopId)>>,
    from: StopId,
    predecessor_initial_wait_time: i32,
    is_origin: bool,
    options: &RoutingOptions,
    candidate: Candidate,
) {
    let v = candidate.to;
    let incoming_edge = IncomingEdge {
        from,
        trip_id: candidate.trip_id,
        stop_sequence: candidate.stop_sequence,
    };
    let entry = state.entry(v).or_insert_with(StopState::unreached);

    if candidate.new_time < entry.travel_time {
        entry.travel_time = candidate.new_time;
        entry.incoming.insert(0, incoming_edge);
        entry.initial_wait_time = match (is_origin, &candidate.kind) {
            (true, CandidateKind::FreshBoarding { departure }) => departure - options.start_time.as_secs(),
            _ => predecessor_initial_wait_time,
        };
        heap.push(Reverse((entry.travel_time, v)));
    } else if candidate.new_time <= entry.travel_time + effective_min_transfer_time(tt, v, options) {
        if !entry.incoming.iter().any(|e| e.trip_id == candidate.trip_id) {
            entry.incoming.push(incoming_edge);
        }
        if entry.visited {
            entry.revisit = true;
            heap.push(Reverse((entry.travel_time, v)));
        }
    }
}

/// Computes shortest paths (by arrival time, tie-broken by transfer
/// count) from `origin` to every reachable stop.
///
/// Never returns an error: unreachable stops are simply absent from the
/// map. Malformed trips/services are skipped as encountered.
pub fn shortest_paths(tt: &Timetable, origin: StopId, options: &RoutingOptions) -> HashMap<StopId, StopState> {
    let mut state: HashMap<StopId, StopState> = HashMap::new();
    state.insert(origin, StopState::origin());

    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0i32, origin)));

    while let Some(Reverse((_, stop_id))) = heap.pop() {
        let already_processed = {
            let s = &state[&stop_id];
            s.visited && !s.revisit
        };
        if already_processed {
            continue;
        }

        let (travel_time, initial_wait_time, incoming_snapshot) = {
            let s = state.get_mut(&stop_id).unwrap();
            s.visited = true;
            s.revisit = false;
            (s.travel_time, s.initial_wait_time, s.incoming.clone())
        };
        let is_origin = stop_id == origin;

        let candidates = outgoing_edges(tt, stop_id, travel_time, &incoming_snapshot, is_origin, options);
        for candidate in candidates {
            relax(tt, &mut state, &mut heap, stop_id, initial_wait_time, is_origin, options, candidate);
        }
    }

    if let Some(s) = state.get_mut(&origin) {
        s.incoming.clear();
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Date;
    use crate::time::Time;
    use crate::timetable::Builder;

    fn opts(start: &str, search_time: i32, min_transfer_time: i32, override_min_transfer_time: bool) -> RoutingOptions {
        RoutingOptions {
            start_time: start.parse().unwrap(),
            date: Date::new(2022, 11, 18),
            search_time,
            min_transfer_time,
            override_min_transfer_time,
        }
    }

    /// A 3-stop linear line.
    #[test]
    fn linear_line_arrival_times() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_stop(2, "B".into(), 0.0, 0.0, false);
        b.add_stop(3, "C".into(), 0.0, 0.0, false);
        b.add_trip(100, 1, 1, 0, Some(1));
        b.add_stop_time(100, "08:00:00".parse().unwrap(), "08:00:00".parse().unwrap(), 1, 1, None, None);
        b.add_stop_time(100, "08:10:00".parse().unwrap(), "08:10:00".parse().unwrap(), 2, 2, None, None);
        b.add_stop_time(100, "08:20:00".parse().unwrap(), "08:20:00".parse().unwrap(), 3, 3, None, None);
        b.add_calendar_date(1, Date::new(2022, 11, 18));
        let tt = b.build();

        let options = opts("08:00:00", 3600, 0, true);
        let map = shortest_paths(&tt, 1, &options);

        assert_eq!(map[&1].travel_time, 0);
        assert_eq!(map[&2].travel_time, 600);
        assert_eq!(map[&3].travel_time, 1200);
        assert_eq!(map[&2].incoming[0].from, 1);
        assert_eq!(map[&3].incoming[0].trip_id, 100);
    }

    /// A later start gives `initialWaitTime`.
    #[test]
    fn initial_wait_time_on_late_start() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_stop(2, "B".into(), 0.0, 0.0, false);
        b.add_trip(100, 1, 1, 0, Some(1));
        b.add_stop_time(100, "08:00:00".parse().unwrap(), "08:00:00".parse().unwrap(), 1, 1, None, None);
        b.add_stop_time(100, "08:10:00".parse().unwrap(), "08:10:00".parse().unwrap(), 2, 2, None, None);
        b.add_calendar_date(1, Date::new(2022, 11, 18));
        let tt = b.build();

        let options = opts("07:55:00", 3600, 0, true);
        let map = shortest_paths(&tt, 1, &options);

        assert_eq!(map[&2].travel_time, 900); // 08:10 - 07:55
        assert_eq!(map[&2].initial_wait_time, 300); // 08:00 - 07:55
    }

    /// Transfer margin rejects the too-close connection.
    #[test]
    fn transfer_margin_rejects_tight_connection() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_stop(2, "B".into(), 0.0, 0.0, false);
        b.add_stop(3, "C".into(), 0.0, 0.0, false);
        b.add_trip(1, 1, 1, 0, Some(1));
        b.add_stop_time(1, "08:00:00".parse().unwrap(), "08:00:00".parse().unwrap(), 1, 1, None, None);
        b.add_stop_time(1, "08:05:00".parse().unwrap(), "08:05:00".parse().unwrap(), 2, 2, None, None);
        b.add_trip(2, 2, 1, 0, Some(2));
        b.add_stop_time(2, "08:14:00".parse().unwrap(), "08:14:00".parse().unwrap(), 2, 1, None, None);
        b.add_stop_time(2, "08:19:00".parse().unwrap(), "08:19:00".parse().unwrap(), 3, 2, None, None);
        b.add_trip(3, 3, 1, 0, Some(3));
        b.add_stop_time(3, "08:20:00".parse().unwrap(), "08:20:00".parse().unwrap(), 2, 1, None, None);
        b.add_stop_time(3, "08:25:00".parse().unwrap(), "08:25:00".parse().unwrap(), 3, 2, None, None);
        b.add_calendar_date(1, Date::new(2022, 11, 18));
        let tt = b.build();

        let options = opts("08:00:00", 3600, 600, true);
        let map = shortest_paths(&tt, 1, &options);

        assert_eq!(map[&3].travel_time, 1500); // 08:25 - 08:00, via the 08:20 departure
    }

    #[test]
    fn unreachable_stop_is_absent() {
        let mut b = Builder::new();
        b.add_stop(1, "A".into(), 0.0, 0.0, false);
        b.add_stop(2, "B".into(), 0.0, 0.0, false);
        let tt = b.build();
        let map = shortest_paths(&tt, 1, &opts("08:00:00", 3600, 0, true));
        assert!(!map.contains_key(&2));
    }
}
