//! Chunk-grid addressing: the 64-bit spatial hash and world/chunk conversion.
//!
//! Each axis is biased by [`STRUCTURE_HALF_LENGTH`] into `[0, 2^21)` and packed
//! at 21-bit intervals (x lowest), so every representable chunk position maps to
//! a distinct non-negative key.

use cgmath::Point3;

use super::CHUNK_LENGTH;
use crate::error::StructureError;

/// Bits per axis in a chunk hash.
pub const STRUCTURE_POS_BITS: u32 = 21;
/// Representable positions per axis.
pub const STRUCTURE_LENGTH: i64 = 1 << STRUCTURE_POS_BITS;
pub const STRUCTURE_HALF_LENGTH: i32 = 1 << (STRUCTURE_POS_BITS - 1);
/// Smallest representable chunk coordinate.
pub const STRUCTURE_POS_MIN: i32 = -STRUCTURE_HALF_LENGTH;
/// Largest representable chunk coordinate.
pub const STRUCTURE_POS_MAX: i32 = STRUCTURE_HALF_LENGTH - 1;

const STRUCTURE_POS_MASK: u64 = (1 << STRUCTURE_POS_BITS) - 1;

#[inline]
pub fn is_chunk_pos_valid(position: Point3<i32>) -> bool {
    let range = STRUCTURE_POS_MIN..=STRUCTURE_POS_MAX;
    range.contains(&position.x) && range.contains(&position.y) && range.contains(&position.z)
}

/// Packs a chunk position into its hash.
///
/// The position must satisfy [`is_chunk_pos_valid`]; use
/// [`try_pos_to_chunk_hash`] for unchecked input.
#[inline]
pub fn pos_to_chunk_hash(position: Point3<i32>) -> u64 {
    debug_assert!(is_chunk_pos_valid(position), "chunk position {position:?} out of range");

    let bias = |v: i32| (v as i64 + STRUCTURE_HALF_LENGTH as i64) as u64 & STRUCTURE_POS_MASK;
    bias(position.x)
        | bias(position.y) << STRUCTURE_POS_BITS
        | bias(position.z) << (STRUCTURE_POS_BITS * 2)
}

pub fn try_pos_to_chunk_hash(position: Point3<i32>) -> Result<u64, StructureError> {
    if is_chunk_pos_valid(position) {
        Ok(pos_to_chunk_hash(position))
    } else {
        Err(StructureError::OutOfBounds(position))
    }
}

/// Inverse of [`pos_to_chunk_hash`].
#[inline]
pub fn hash_to_chunk_pos(hash: u64) -> Point3<i32> {
    let unbias = |shift: u32| ((hash >> shift) & STRUCTURE_POS_MASK) as i32 - STRUCTURE_HALF_LENGTH;
    Point3::new(
        unbias(0),
        unbias(STRUCTURE_POS_BITS),
        unbias(STRUCTURE_POS_BITS * 2),
    )
}

/// Chunk containing a world-space point (floor division by the chunk length).
pub fn world_to_chunk_pos(position: Point3<f32>) -> Point3<i32> {
    let length = CHUNK_LENGTH as f32;
    Point3::new(
        (position.x / length).floor() as i32,
        (position.y / length).floor() as i32,
        (position.z / length).floor() as i32,
    )
}

/// World-space origin (minimum corner) of a chunk.
pub fn chunk_to_world_pos(position: Point3<i32>) -> Point3<f32> {
    let length = CHUNK_LENGTH as f32;
    Point3::new(
        position.x as f32 * length,
        position.y as f32 * length,
        position.z as f32 * length,
    )
}

/// Squared distance between two chunk positions, in chunk units.
#[inline]
pub fn distance2(a: Point3<i32>, b: Point3<i32>) -> i64 {
    let dx = a.x as i64 - b.x as i64;
    let dy = a.y as i64 - b.y as i64;
    let dz = a.z as i64 - b.z as i64;
    dx * dx + dy * dy + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let samples = [
            Point3::new(0, 0, 0),
            Point3::new(1, -1, 2),
            Point3::new(-17, 300, -4096),
            Point3::new(STRUCTURE_POS_MIN, STRUCTURE_POS_MIN, STRUCTURE_POS_MIN),
            Point3::new(STRUCTURE_POS_MAX, STRUCTURE_POS_MAX, STRUCTURE_POS_MAX),
            Point3::new(STRUCTURE_POS_MIN, 0, STRUCTURE_POS_MAX),
        ];

        for position in samples {
            assert_eq!(hash_to_chunk_pos(pos_to_chunk_hash(position)), position);
        }

        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let position = Point3::new(
                rng.i32(STRUCTURE_POS_MIN..=STRUCTURE_POS_MAX),
                rng.i32(STRUCTURE_POS_MIN..=STRUCTURE_POS_MAX),
                rng.i32(STRUCTURE_POS_MIN..=STRUCTURE_POS_MAX),
            );
            assert_eq!(hash_to_chunk_pos(pos_to_chunk_hash(position)), position);
        }
    }

    #[test]
    fn test_negative_and_positive_do_not_alias() {
        let a = pos_to_chunk_hash(Point3::new(-1, 0, 0));
        let b = pos_to_chunk_hash(Point3::new(1, 0, 0));
        let c = pos_to_chunk_hash(Point3::new(0, -1, 0));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_origin_hash_is_biased() {
        let half = STRUCTURE_HALF_LENGTH as u64;
        assert_eq!(
            pos_to_chunk_hash(Point3::new(0, 0, 0)),
            half | half << 21 | half << 42
        );
        assert_eq!(pos_to_chunk_hash(Point3::new(STRUCTURE_POS_MIN, STRUCTURE_POS_MIN, STRUCTURE_POS_MIN)), 0);
        assert!(STRUCTURE_LENGTH == 2 * STRUCTURE_HALF_LENGTH as i64);
    }

    #[test]
    fn test_out_of_range_positions_are_rejected() {
        let position = Point3::new(STRUCTURE_POS_MAX + 1, 0, 0);
        assert!(!is_chunk_pos_valid(position));
        assert_eq!(
            try_pos_to_chunk_hash(position),
            Err(StructureError::OutOfBounds(position))
        );
        assert!(try_pos_to_chunk_hash(Point3::new(0, STRUCTURE_POS_MIN, 0)).is_ok());
    }

    #[test]
    fn test_world_to_chunk_floors() {
        assert_eq!(world_to_chunk_pos(Point3::new(0.0, 31.9, 32.0)), Point3::new(0, 0, 1));
        assert_eq!(world_to_chunk_pos(Point3::new(-0.5, -32.0, -32.5)), Point3::new(-1, -1, -2));
        assert_eq!(chunk_to_world_pos(Point3::new(-1, 0, 2)), Point3::new(-32.0, 0.0, 64.0));
    }

    #[test]
    fn test_distance2() {
        assert_eq!(distance2(Point3::new(0, 0, 0), Point3::new(1, -2, 2)), 9);
        assert_eq!(distance2(Point3::new(3, 3, 3), Point3::new(3, 3, 3)), 0);
    }
}
