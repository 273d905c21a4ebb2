//! End-to-end tests driving the public API across module boundaries
//! (Timetable/Builder, Router, People, Prox, Evaluator together),
//! distinct from the inline unit tests which exercise one module at a
//! time against its own internals.

use access_core::coords::{DmsCoord, MeterCoord};
use access_core::evaluator::{evaluate, stat_mask, EvaluateOptions};
use access_core::ids::Date;
use access_core::people::{Person, PeopleIndex};
use access_core::prox::Prox;
use access_core::router::{shortest_paths, RoutingOptions};
use access_core::timetable::Builder;

fn t(hms: &str) -> access_core::time::Time {
    hms.parse().unwrap()
}

/// Two disjoint lines meeting at a shared stop with a binding transfer
/// margin: the earlier connection is too tight and the router must
/// fall through to the next departure.
#[test]
fn router_rejects_tight_transfer_and_takes_the_next_departure() {
    let mut b = Builder::new();
    b.add_stop(1, "A".into(), 0.0, 0.0, false);
    b.add_stop(2, "B".into(), 0.0, 0.0, false);
    b.add_stop(3, "C".into(), 0.0, 0.0, false);
    b.add_trip(100, 1, 1, 0, None);
    b.add_stop_time(100, t("08:00:00"), t("08:00:00"), 1, 1, None, None);
    b.add_stop_time(100, t("08:05:00"), t("08:05:00"), 2, 2, None, None);
    b.add_trip(200, 2, 1, 0, None);
    b.add_stop_time(200, t("08:14:00"), t("08:14:00"), 2, 1, None, None);
    b.add_stop_time(200, t("08:19:00"), t("08:19:00"), 3, 2, None, None);
    b.add_trip(201, 2, 1, 0, None);
    b.add_stop_time(201, t("08:20:00"), t("08:20:00"), 2, 1, None, None);
    b.add_stop_time(201, t("08:25:00"), t("08:25:00"), 3, 2, None, None);
    b.add_calendar_date(1, Date::new(2022, 11, 18));
    b.add_calendar_date(2, Date::new(2022, 11, 18));
    let tt = b.build();

    let options = RoutingOptions {
        start_time: t("08:00:00"),
        date: Date::new(2022, 11, 18),
        search_time: 3600,
        min_transfer_time: 600,
        override_min_transfer_time: true,
    };
    let map = shortest_paths(&tt, 1, &options);

    assert_eq!(map[&3].travel_time, 1500); // 08:25 - 08:00, via trip 201
    assert!(map[&3].incoming.iter().all(|e| e.trip_id != 200));
}

/// The full walk-ride-walk pipeline: a resident whose home and work
/// both sit near one of two stops on a single trip should be counted
/// as served and attributed to the right boarding/alighting stops.
#[test]
fn evaluate_composes_a_full_journey_for_a_resident() {
    let origin_dms = MeterCoord::new(0, 0).to_dms();
    let work_dms = MeterCoord::new(3000, 0).to_dms();

    let mut b = Builder::new();
    b.add_stop(1, "A".into(), origin_dms.lat, origin_dms.lon, false);
    b.add_stop(2, "B".into(), work_dms.lat, work_dms.lon, false);
    b.add_trip(100, 1, 1, 0, None);
    b.add_stop_time(100, t("08:00:00"), t("08:00:00"), 1, 1, None, None);
    b.add_stop_time(100, t("08:15:00"), t("08:15:00"), 2, 2, None, None);
    b.add_calendar_date(1, Date::new(2022, 11, 18));
    let tt = b.build();
    let prox = Prox::new(tt.stops().map(|s| (s.stop_id, DmsCoord::new(s.lat, s.lon))));

    let mut people = PeopleIndex::new();
    people.insert(Person {
        is_female: true,
        work_county: 1,
        work_municipality: 1,
        work_coord: MeterCoord::new(3050, 50),
        home_county: 1,
        home_municipality: 1,
        home_coord: MeterCoord::new(50, 50),
    });

    let opts = EvaluateOptions {
        interesting_stop: Some(1),
        walk_speed: 1.3,
        search_range: 2000,
        moveable_distance: 2000,
        minimum_range: 0,
        stats_to_collect: stat_mask::START_STOP_HISTOGRAM | stat_mask::END_STOP_HISTOGRAM | stat_mask::OPTIMAL_FIRST_STOP,
        routing_options: RoutingOptions {
            start_time: t("08:00:00"),
            date: Date::new(2022, 11, 18),
            search_time: 3600,
            min_transfer_time: 0,
            override_min_transfer_time: true,
        },
    };

    let stats = evaluate(&tt, &people, &prox, 1, &opts);
    assert_eq!(stats.persons_within_range, 1);
    assert_eq!(stats.persons_can_go_with_bus, 1);
    assert_eq!(stats.unreachable_works, 0);
    assert_eq!(stats.has_this_as_optimal, 1);
    assert_eq!(*stats.optimal_first_stop.get(&1).unwrap(), 1);
}

/// `evaluate` called twice with identical inputs produces identical
/// aggregate counters; nothing in the pipeline carries hidden state
/// across calls.
#[test]
fn evaluate_is_idempotent_across_repeated_calls() {
    let origin_dms = MeterCoord::new(0, 0).to_dms();
    let work_dms = MeterCoord::new(2000, 0).to_dms();

    let mut b = Builder::new();
    b.add_stop(1, "A".into(), origin_dms.lat, origin_dms.lon, false);
    b.add_stop(2, "B".into(), work_dms.lat, work_dms.lon, false);
    b.add_trip(100, 1, 1, 0, None);
    b.add_stop_time(100, t("08:00:00"), t("08:00:00"), 1, 1, None, None);
    b.add_stop_time(100, t("08:10:00"), t("08:10:00"), 2, 2, None, None);
    b.add_calendar_date(1, Date::new(2022, 11, 18));
    let tt = b.build();
    let prox = Prox::new(tt.stops().map(|s| (s.stop_id, DmsCoord::new(s.lat, s.lon))));

    let mut people = PeopleIndex::new();
    for i in 0..3 {
        people.insert(Person {
            is_female: i % 2 == 0,
            work_county: 1,
            work_municipality: 1,
            work_coord: MeterCoord::new(2050, 50),
            home_county: 1,
            home_municipality: 1,
            home_coord: MeterCoord::new(50, 50),
        });
    }

    let opts = EvaluateOptions {
        interesting_stop: None,
        walk_speed: 1.3,
        search_range: 2000,
        moveable_distance: 2000,
        minimum_range: 0,
        stats_to_collect: stat_mask::START_STOP_HISTOGRAM | stat_mask::END_STOP_HISTOGRAM,
        routing_options: RoutingOptions {
            start_time: t("08:00:00"),
            date: Date::new(2022, 11, 18),
            search_time: 3600,
            min_transfer_time: 0,
            override_min_transfer_time: true,
        },
    };

    let first = evaluate(&tt, &people, &prox, 1, &opts);
    let second = evaluate(&tt, &people, &prox, 1, &opts);

    assert_eq!(first.persons_can_go_with_bus, second.persons_can_go_with_bus);
    assert_eq!(first.dist_number_of_start_stops, second.dist_number_of_start_stops);
    assert_eq!(first.dist_number_of_end_stops, second.dist_number_of_end_stops);
    assert_eq!(first.persons_can_go_with_bus, 3);
}

/// An unknown origin stop degrades to an all-zero `Stats`, not an error.
#[test]
fn evaluate_unknown_origin_degrades_to_empty_stats() {
    let mut b = Builder::new();
    b.add_stop(1, "A".into(), 0.0, 0.0, false);
    let tt = b.build();
    let prox = Prox::new(tt.stops().map(|s| (s.stop_id, DmsCoord::new(s.lat, s.lon))));
    let people = PeopleIndex::new();

    let opts = EvaluateOptions {
        interesting_stop: None,
        walk_speed: 1.3,
        search_range: 1000,
        moveable_distance: 1000,
        minimum_range: 0,
        stats_to_collect: 0,
        routing_options: RoutingOptions {
            start_time: t("08:00:00"),
            date: Date::new(2022, 11, 18),
            search_time: 3600,
            min_transfer_time: 0,
            override_min_transfer_time: true,
        },
    };

    let stats = evaluate(&tt, &people, &prox, 999, &opts);
    assert_eq!(stats.persons_within_range, 0);
    assert_eq!(stats.persons_can_go_with_bus, 0);
}
