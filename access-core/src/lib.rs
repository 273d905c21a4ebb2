//! Public-transit accessibility analyzer: the routing and accessibility
//! engine. Consumes an already-built [`timetable::Timetable`]
//! and [`people::PeopleIndex`] — parsing the feed and resident data is
//! the outer crate's job — and exposes two entry points:
//!
//! - [`router::shortest_paths`]: time-dependent earliest-arrival search
//!   from one origin stop.
//! - [`evaluator::evaluate`]: walks the population around a stop,
//!   composes walk-ride-walk journeys and aggregates accessibility
//!   statistics.
//!
//! Everything here is read-only once built and performs no I/O.

pub mod coords;
pub mod evaluator;
pub mod ids;
pub mod people;
pub mod prox;
pub mod router;
pub mod time;
pub mod timetable;
