//! Entry point: loads a feed and population dataset, builds the
//! read-only `access-core` graph once, and serves `/evaluate/:stop_id`
//! (Timetable/People/Prox are read-only, shared across concurrent
//! requests once built). Grounded in `platy-transit-radar`'s
//! `webserver_sync::main`, generalized from its `warp`/GTFS-only setup
//! to also load the resident population dataset.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use access_core::prox::Prox;
use access_core::coords::DmsCoord;
use transit_access::config::Config;
use transit_access::loader;
use transit_access::server::{self, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let config = Config::from_env();

    let timetable = loader::load_timetable(&config.gtfs_dir).expect("gtfs feed to load");
    let people = config.people_path.exists().then(|| loader::load_people(&config.people_path).expect("people dataset to load")).unwrap_or_default();
    let prox = Prox::new(timetable.stops().map(|s| (s.stop_id, DmsCoord::new(s.lat, s.lon))));

    let state = Arc::new(AppState { timetable, people, prox, config });
    server::serve(state).await.expect("server to run");
}
