//! Quadkeys: base-4 strings addressing a tile, one digit per level with the
//! coarsest level first.

use crate::error::TileError;
use crate::tile::MAX_LOD;

/// Encodes tile `(x, y)` at `lod` as a quadkey of `lod` digits.
///
/// Each digit carries one bit of `x` (value 1) and one bit of `y` (value 2).
///
/// # Panics
/// Panics if `lod` is greater than [`MAX_LOD`], the longest key
/// [`quadkey_to_tile_xy`] accepts.
///
/// # Example
/// ```rust
/// # use tile_downloader::tile_xy_to_quadkey;
/// assert_eq!(tile_xy_to_quadkey(3, 5, 3), "213");
/// ```
pub fn tile_xy_to_quadkey(x: i32, y: i32, lod: u8) -> String {
    assert!(lod <= MAX_LOD, "level of detail {} exceeds {}", lod, MAX_LOD);

    (1..=lod)
        .rev()
        .map(|level| {
            let mask = 1 << (level - 1);
            let mut digit = b'0';
            if x & mask != 0 {
                digit += 1;
            }
            if y & mask != 0 {
                digit += 2;
            }
            char::from(digit)
        })
        .collect()
}

/// Decodes a quadkey into `(x, y, lod)`, where `lod` is the key's length.
pub fn quadkey_to_tile_xy(quadkey: &str) -> Result<(i32, i32, u8), TileError> {
    let lod = quadkey.chars().count();
    if lod > usize::from(MAX_LOD) {
        return Err(TileError::QuadKeyTooLong(lod));
    }

    let (mut x, mut y) = (0, 0);
    for (position, digit) in quadkey.chars().enumerate() {
        let mask = 1 << (lod - position - 1);
        match digit {
            '0' => {}
            '1' => x |= mask,
            '2' => y |= mask,
            '3' => {
                x |= mask;
                y |= mask;
            }
            _ => return Err(TileError::InvalidQuadKeyDigit { digit, position }),
        }
    }

    Ok((x, y, lod as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes() {
        assert_eq!(tile_xy_to_quadkey(3, 3, 2), "33");
        assert_eq!(tile_xy_to_quadkey(0, 0, 0), "");
        assert_eq!(tile_xy_to_quadkey(1, 0, 1), "1");
        assert_eq!(tile_xy_to_quadkey(0, 1, 1), "2");
        assert_eq!(tile_xy_to_quadkey(35, 50, 6), "320031");
    }

    #[test]
    fn encodes_deepest_level() {
        let max = (1_i32 << MAX_LOD) - 1;
        assert_eq!(tile_xy_to_quadkey(max, 0, MAX_LOD), "1".repeat(usize::from(MAX_LOD)));
        assert_eq!(
            quadkey_to_tile_xy(&tile_xy_to_quadkey(max, max, MAX_LOD)),
            Ok((max, max, MAX_LOD))
        );
    }

    #[test]
    #[should_panic(expected = "level of detail 31 exceeds 30")]
    fn encoding_rejects_level_past_max() {
        tile_xy_to_quadkey(0, 0, MAX_LOD + 1);
    }

    #[test]
    #[should_panic(expected = "level of detail 40 exceeds 30")]
    fn encoding_rejects_shift_overflowing_level() {
        tile_xy_to_quadkey(0, 0, 40);
    }

    #[test]
    fn decodes() {
        assert_eq!(quadkey_to_tile_xy("33"), Ok((3, 3, 2)));
        assert_eq!(quadkey_to_tile_xy(""), Ok((0, 0, 0)));
        assert_eq!(quadkey_to_tile_xy("320031"), Ok((35, 50, 6)));
        assert_eq!(quadkey_to_tile_xy("0000"), Ok((0, 0, 4)));
    }

    #[test]
    fn rejects_invalid_digits() {
        assert_eq!(
            quadkey_to_tile_xy("1204"),
            Err(TileError::InvalidQuadKeyDigit { digit: '4', position: 3 })
        );
        assert_eq!(
            quadkey_to_tile_xy("a"),
            Err(TileError::InvalidQuadKeyDigit { digit: 'a', position: 0 })
        );
    }

    #[test]
    fn rejects_overlong_keys() {
        let key = "0".repeat(usize::from(MAX_LOD) + 1);
        assert_eq!(
            quadkey_to_tile_xy(&key),
            Err(TileError::QuadKeyTooLong(usize::from(MAX_LOD) + 1))
        );
        assert!(quadkey_to_tile_xy(&"3".repeat(usize::from(MAX_LOD))).is_ok());
    }

    #[test]
    fn decoding_inverts_encoding() {
        for lod in 1..=20_u8 {
            let n = 1_i32 << lod;
            let step = (n / 13).max(1);
            for x in (0..n).step_by(step as usize) {
                for y in (0..n).step_by(step as usize) {
                    let key = tile_xy_to_quadkey(x, y, lod);
                    assert_eq!(key.len(), usize::from(lod));
                    assert_eq!(quadkey_to_tile_xy(&key), Ok((x, y, lod)));
                }
            }
        }
    }
}
