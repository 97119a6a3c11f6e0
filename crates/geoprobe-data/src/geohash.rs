//! 64-bit integer geohash codec.
//!
//! Coordinates are quantised to 32 bits per axis and the bits interleaved,
//! longitude first, so that every leading bit halves the cell alternately in
//! longitude and latitude. Keeping the top `precision` bits of a key therefore
//! names a cell, and every key inside that cell lies in one contiguous integer
//! interval. [`Geohash64::expand`] turns a key and precision into the intervals
//! covering the cell and its eight neighbours.

use serde::{Deserialize, Serialize};

use crate::{DataError, Result};

/// Highest meaningful precision: every bit of the key is significant.
pub const MAX_PRECISION: u8 = 64;

/// Below this the ring around any cell covers (almost) the whole world.
const MIN_EXPANDABLE_PRECISION: u8 = 3;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// A bound on geohash integers: `value >= lower` and/or `value < upper`.
///
/// A missing bound means the interval is open on that side, which happens
/// when the interval starts at zero or runs to the end of the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundRange {
    pub lower: Option<u64>,
    pub upper: Option<u64>,
}

impl BoundRange {
    pub const fn new(lower: Option<u64>, upper: Option<u64>) -> Self {
        Self { lower, upper }
    }

    /// Both sides open, i.e. the range matches every key.
    pub const fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    pub fn contains(&self, value: u64) -> bool {
        self.lower.is_none_or(|lower| value >= lower) && self.upper.is_none_or(|upper| value < upper)
    }
}

/// The 64-bit interleaved geohash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geohash64;

impl Geohash64 {
    /// Encode a coordinate into its 64-bit key.
    ///
    /// Latitude must lie in `[-90, 90)`. Longitude is wrapped into
    /// `[-180, 180)` first, so `190.0` encodes the same as `-170.0`.
    pub fn encode(self, latitude: f64, longitude: f64) -> Result<u64> {
        if !latitude.is_finite() || !longitude.is_finite() || !(-90.0..90.0).contains(&latitude) {
            return Err(DataError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        let longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        let lat32 = quantise((latitude + 90.0) / 180.0);
        let lon32 = quantise((longitude + 180.0) / 360.0);
        Ok(interleave(lat32, lon32))
    }

    /// Bounding ranges covering the cell of `key` at `precision` and its
    /// eight neighbours, sorted and merged where contiguous.
    ///
    /// Longitude wraps across the antimeridian, latitude stops at the poles.
    /// Returns an empty vector when the precision is too coarse to narrow
    /// anything, including when the merged ring spans the entire key space.
    pub fn expand(self, key: u64, precision: u8) -> Vec<BoundRange> {
        let precision = precision.min(MAX_PRECISION);
        if precision < MIN_EXPANDABLE_PRECISION {
            return Vec::new();
        }

        let lon_bits = u32::from(precision.div_ceil(2));
        let lat_bits = u32::from(precision / 2);
        let lat_cell = i64::from(deinterleave(key) >> (32 - lat_bits));
        let lon_cell = i64::from(deinterleave(key >> 1) >> (32 - lon_bits));
        let lat_cells = 1_i64 << lat_bits;
        let lon_cells = 1_i64 << lon_bits;
        let span = 1_u128 << (64 - u32::from(precision));

        let mut cells: Vec<(u128, u128)> = (-1..=1_i64)
            .flat_map(|dlat| (-1..=1_i64).map(move |dlon| (dlat, dlon)))
            .filter_map(|(dlat, dlon)| {
                let lat = lat_cell + dlat;
                if !(0..lat_cells).contains(&lat) {
                    return None;
                }
                let lon = (lon_cell + dlon).rem_euclid(lon_cells);
                let start = interleave(
                    ((lat as u64) << (32 - lat_bits)) as u32,
                    ((lon as u64) << (32 - lon_bits)) as u32,
                );
                Some((u128::from(start), u128::from(start) + span))
            })
            .collect();
        cells.sort_unstable();
        cells.dedup();

        let mut merged: Vec<(u128, u128)> = Vec::with_capacity(cells.len());
        for (start, end) in cells {
            if let Some(last) = merged.last_mut()
                && last.1 >= start
            {
                last.1 = last.1.max(end);
                continue;
            }
            merged.push((start, end));
        }

        merged
            .into_iter()
            .map(|(start, end)| {
                BoundRange::new(
                    u64::try_from(start).ok().filter(|&lower| lower > 0),
                    u64::try_from(end).ok(),
                )
            })
            .filter(|range| !range.is_unbounded())
            .collect()
    }
}

fn quantise(fraction: f64) -> u32 {
    // `as` saturates, so anything rounding up to 2^32 lands on u32::MAX
    u32::try_from((fraction * TWO_POW_32) as u64).unwrap_or(u32::MAX)
}

fn spread(value: u32) -> u64 {
    let mut x = u64::from(value);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    (x | (x << 1)) & 0x5555_5555_5555_5555
}

/// Inverse of [`spread`]: collects the even bits of `value`.
fn deinterleave(value: u64) -> u32 {
    let mut x = value & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

fn interleave(lat32: u32, lon32: u32) -> u64 {
    (spread(lon32) << 1) | spread(lat32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODEC: Geohash64 = Geohash64;

    #[test]
    fn test_encode_origin_sets_leading_bits() {
        let key = CODEC.encode(0.0, 0.0).unwrap();
        assert_eq!(key, 0xC000_0000_0000_0000);
    }

    #[test]
    fn test_encode_extremes() {
        assert_eq!(CODEC.encode(-90.0, -180.0).unwrap(), 0);
        let top = CODEC.encode(89.999_999_999, 179.999_999_999).unwrap();
        assert!(top > 0xFFFF_0000_0000_0000, "got {top:#x}");
    }

    #[test]
    fn test_encode_rejects_invalid_latitude() {
        assert!(matches!(
            CODEC.encode(90.0, 0.0),
            Err(DataError::InvalidCoordinate { .. })
        ));
        assert!(CODEC.encode(-90.5, 0.0).is_err());
        assert!(CODEC.encode(f64::NAN, 0.0).is_err());
        assert!(CODEC.encode(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_encode_wraps_longitude() {
        assert_eq!(
            CODEC.encode(10.0, 190.0).unwrap(),
            CODEC.encode(10.0, -170.0).unwrap()
        );
        assert_eq!(
            CODEC.encode(-33.0, -200.0).unwrap(),
            CODEC.encode(-33.0, 160.0).unwrap()
        );
    }

    #[test]
    fn test_nearby_points_share_prefix() {
        let a = CODEC.encode(51.5007, -0.1246).unwrap();
        let b = CODEC.encode(51.5010, -0.1240).unwrap();
        let far = CODEC.encode(-33.8568, 151.2153).unwrap();
        assert!((a ^ b).leading_zeros() >= 20);
        assert!((a ^ far).leading_zeros() < 4);
    }

    #[test]
    fn test_interleave_and_deinterleave() {
        let key = interleave(0x1234_5678, 0x9ABC_DEF0);
        assert_eq!(deinterleave(key), 0x1234_5678);
        assert_eq!(deinterleave(key >> 1), 0x9ABC_DEF0);
    }

    #[test]
    fn test_expand_coarse_precision_is_empty() {
        let key = CODEC.encode(48.8566, 2.3522).unwrap();
        for precision in 0..MIN_EXPANDABLE_PRECISION {
            assert!(CODEC.expand(key, precision).is_empty());
        }
    }

    #[test]
    fn test_expand_covers_center_at_every_precision() {
        let key = CODEC.encode(48.8566, 2.3522).unwrap();
        for precision in MIN_EXPANDABLE_PRECISION..=MAX_PRECISION {
            let ranges = CODEC.expand(key, precision);
            assert!(!ranges.is_empty(), "precision {precision} produced no ranges");
            assert!(
                ranges.iter().any(|r| r.contains(key)),
                "precision {precision} does not cover its own center"
            );
        }
    }

    #[test]
    fn test_expand_ranges_are_sorted_and_disjoint() {
        let key = CODEC.encode(-12.0464, -77.0428).unwrap();
        let ranges = CODEC.expand(key, 21);
        for pair in ranges.windows(2) {
            let upper = pair[0].upper.expect("only the last range may be open above");
            let lower = pair[1].lower.expect("only the first range may be open below");
            assert!(upper < lower, "ranges {pair:?} touch or overlap");
        }
    }

    #[test]
    fn test_expand_wraps_across_antimeridian() {
        let key = CODEC.encode(0.5, 179.9).unwrap();
        let neighbour = CODEC.encode(0.5, -179.9).unwrap();
        let ranges = CODEC.expand(key, 20);
        assert!(ranges.iter().any(|r| r.contains(neighbour)));
    }

    #[test]
    fn test_expand_near_pole_does_not_cross() {
        let key = CODEC.encode(89.99, 10.0).unwrap();
        let ranges = CODEC.expand(key, 30);
        assert!(ranges.iter().any(|r| r.contains(key)));
        let south = CODEC.encode(-89.99, 10.0).unwrap();
        assert!(!ranges.iter().any(|r| r.contains(south)));
    }

    #[test]
    fn test_expand_finer_precision_is_narrower() {
        let key = CODEC.encode(35.6762, 139.6503).unwrap();
        let width = |ranges: &[BoundRange]| -> u128 {
            ranges
                .iter()
                .map(|r| {
                    u128::from(r.upper.unwrap_or(u64::MAX)) - u128::from(r.lower.unwrap_or(0))
                })
                .sum()
        };
        assert!(width(&CODEC.expand(key, 40)) < width(&CODEC.expand(key, 30)));
    }

    #[test]
    fn test_bound_range_contains() {
        let range = BoundRange::new(Some(10), Some(20));
        assert!(range.contains(10));
        assert!(range.contains(19));
        assert!(!range.contains(20));
        assert!(BoundRange::new(None, Some(5)).contains(0));
        assert!(BoundRange::new(Some(5), None).contains(u64::MAX));
        assert!(BoundRange::new(None, None).is_unbounded());
    }
}
