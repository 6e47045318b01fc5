//! Geographic primitives: WGS84 coordinates and haversine distance.
//!
//! Distances are great-circle kilometres. Rider and store positions repeat
//! heavily across consecutive dispatch runs, so the cached front door keeps
//! an LRU of recently computed pairs keyed by the coordinate bit patterns.

use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use lru::LruCache;

/// Earth radius in kilometres for the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair in decimal degrees.
///
/// Inputs must be valid degrees (latitude in [-90, 90], longitude in
/// [-180, 180]); out-of-range values are a caller contract violation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn to_bits(self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

/// Uncached haversine distance (internal use).
fn distance_km_uncached(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

type PairKey = ((u64, u64), (u64, u64));

/// Global distance cache (50,000 entries, ~2MB memory).
fn get_distance_cache() -> &'static Mutex<LruCache<PairKey, f64>> {
    static CACHE: OnceLock<Mutex<LruCache<PairKey, f64>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(50_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Haversine distance between two coordinates with LRU caching.
///
/// Distance is symmetric, so the key orders the pair to maximize cache hits.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let (pa, pb) = (a.to_bits(), b.to_bits());
    let key = if pa <= pb { (pa, pb) } else { (pb, pa) };

    let mut cache = match get_distance_cache().lock() {
        Ok(guard) => guard,
        Err(_) => return distance_km_uncached(a, b), // Fallback: compute without cache if mutex poisoned
    };

    *cache.get_or_insert(key, || distance_km_uncached(a, b))
}
