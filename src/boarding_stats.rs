//! Boarding-statistics lookup: interface-only, no implementation
//! bundled. The original's one-shot process-wide boardings map is
//! modeled here as a value passed in by the caller, not a global.

use access_core::ids::StopId;

pub trait BoardingStatsLookup {
    /// Average daily boardings at `stop`, if known.
    fn boardings(&self, stop: StopId) -> Option<u32>;
}

/// A `BoardingStatsLookup` with no data, for deployments that don't
/// have a boarding-stats source wired up yet.
#[derive(Debug, Default)]
pub struct NoBoardingStats;

impl BoardingStatsLookup for NoBoardingStats {
    fn boardings(&self, _stop: StopId) -> Option<u32> {
        None
    }
}
