//! Process configuration, read once at startup from environment
//! variables the way `platy-transit-radar`'s `webserver_sync` reads
//! `PORT`/`STATIC_DIR`/`GTFS_DIR`: gather ad hoc `env::var` calls into
//! one struct instead of scattering them through `main`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::{Datelike, Timelike, Utc};

use access_core::ids::Date;
use access_core::router::RoutingOptions;
use access_core::time::Time;

/// Default `minTransferTime` override applied to every search unless a
/// stop's own value is used instead.
const DEFAULT_SEARCH_TIME: i32 = 3600;
const DEFAULT_WALK_SPEED: f64 = 1.3;
const DEFAULT_SEARCH_RANGE: i32 = 1000;
const DEFAULT_MOVEABLE_DISTANCE: i32 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub gtfs_dir: PathBuf,
    pub people_path: PathBuf,
    pub line_colors_path: Option<PathBuf>,
    pub default_routing_options: RoutingOptions,
    pub default_walk_speed: f64,
    pub default_search_range: i32,
    pub default_moveable_distance: i32,
}

impl Config {
    /// Reads `PORT`, `GTFS_DIR`, `PEOPLE_PATH`, `LINE_COLORS`,
    /// `QUERY_DATE` (yyyymmdd) and `QUERY_START_TIME` (`HH:MM:SS`) from
    /// the environment, falling back to development defaults.
    pub fn from_env() -> Config {
        let port: u16 = env_or("PORT", "8080").parse().unwrap_or(8080);
        let gtfs_dir = PathBuf::from(env_or("GTFS_DIR", "gtfs"));
        let people_path = PathBuf::from(env_or("PEOPLE_PATH", "people.csv"));
        let line_colors_path = std::env::var("LINE_COLORS").ok().map(PathBuf::from);

        let (now_date, now_time) = today_in_stockholm();
        let date = std::env::var("QUERY_DATE").ok().and_then(|v| v.parse().ok()).map(Date::from_yyyymmdd).unwrap_or(now_date);
        let start_time: Time = std::env::var("QUERY_START_TIME").ok().and_then(|v| v.parse().ok()).unwrap_or(now_time);

        Config {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            gtfs_dir,
            people_path,
            line_colors_path,
            default_routing_options: RoutingOptions {
                start_time,
                date,
                search_time: DEFAULT_SEARCH_TIME,
                min_transfer_time: 0,
                override_min_transfer_time: false,
            },
            default_walk_speed: DEFAULT_WALK_SPEED,
            default_search_range: DEFAULT_SEARCH_RANGE,
            default_moveable_distance: DEFAULT_MOVEABLE_DISTANCE,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Today's date and time of day in the projection's home timezone, the
/// default query moment when `QUERY_DATE`/`QUERY_START_TIME` aren't
/// pinned. Mirrors `platy-transit-radar`'s `webserver_sync::day_time`,
/// which converts `Utc::now()` into local wall-clock day/time the same way.
fn today_in_stockholm() -> (Date, Time) {
    let now = Utc::now().with_timezone(&chrono_tz::Europe::Stockholm);
    let date = Date::new(now.year(), now.month(), now.day());
    let time = Time::from_hms(now.hour() as i32, now.minute() as i32, now.second() as i32);
    (date, time)
}
