//! External collaborators around the `access-core` routing engine
//! typed GTFS record structs, CSV/JSON loaders wiring
//! those rows into `access_core::timetable::Builder`/`PeopleIndex`, a
//! line-color registry, a boarding-stats lookup interface, and an HTTP
//! adapter. None of this crate's modules implement routing or
//! accessibility logic themselves — that stays in `access-core`.

pub mod boarding_stats;
pub mod color_registry;
pub mod config;
pub mod error;
pub mod feed;
pub mod loader;
pub mod server;

pub use access_core;
