//! Spatial key codecs consumed by the precision controller.

use geoprobe_data::{BoundRange, Geohash64};

use crate::error::Result;

/// Encodes coordinates into integer keys and expands a key into the ranges
/// around it at a given precision.
///
/// The controller only ever talks to this trait, so another key scheme (a
/// quad-tree key, say) can replace the geohash without touching the search
/// loop. `expand` must return an empty vector only when nothing narrower
/// than the whole key space can be described at that precision.
pub trait SpatialKeyCodec: Send + Sync {
    fn encode(&self, latitude: f64, longitude: f64) -> Result<u64>;

    fn expand(&self, key: u64, precision: u8) -> Vec<BoundRange>;
}

impl SpatialKeyCodec for Geohash64 {
    fn encode(&self, latitude: f64, longitude: f64) -> Result<u64> {
        Ok(Self::encode(*self, latitude, longitude)?)
    }

    fn expand(&self, key: u64, precision: u8) -> Vec<BoundRange> {
        Self::expand(*self, key, precision)
    }
}

impl<C: SpatialKeyCodec + ?Sized> SpatialKeyCodec for &C {
    fn encode(&self, latitude: f64, longitude: f64) -> Result<u64> {
        (**self).encode(latitude, longitude)
    }

    fn expand(&self, key: u64, precision: u8) -> Vec<BoundRange> {
        (**self).expand(key, precision)
    }
}
