// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed integer encoding of a layer's cells.
//!
//! Cells are packed as little-endian records inside an `i32` array. The current
//! format uses three integers (12 bytes) per cell:
//!
//! | bytes  | field              |
//! |--------|--------------------|
//! | 0..2   | x, `i16`           |
//! | 2..4   | y, `i16`           |
//! | 4..6   | source id, `u16`   |
//! | 6..8   | atlas x, `u16`     |
//! | 8..10  | atlas y, `u16`     |
//! | 10..12 | alternative, `u16` |
//!
//! Two legacy formats are still read. Both carry a 32-bit tile id at bytes 4..8
//! whose top three bits are flip and transpose flags; format 2 adds autotile
//! coordinates as two `i16` at bytes 8..12.

use alloc::vec::Vec;

use tileweave_terrain::Coord;

use crate::error::LayerError;
use crate::types::{TileRef, TileTransform};

/// Version of a packed cell array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileDataFormat {
    /// Legacy tile ids, two integers per cell.
    Legacy1,
    /// Legacy tile ids plus autotile coordinates, three integers per cell.
    Legacy2,
    /// Source, atlas coordinates and alternative, three integers per cell.
    Current,
}

impl TileDataFormat {
    /// Format from its version number.
    pub fn from_version(version: u32) -> Result<Self, LayerError> {
        match version {
            1 => Ok(Self::Legacy1),
            2 => Ok(Self::Legacy2),
            3 => Ok(Self::Current),
            v => Err(LayerError::UnsupportedFormat(v)),
        }
    }

    /// Version number.
    pub fn version(self) -> u32 {
        match self {
            Self::Legacy1 => 1,
            Self::Legacy2 => 2,
            Self::Current => 3,
        }
    }

    /// Integers per record.
    pub fn record_len(self) -> usize {
        match self {
            Self::Legacy1 => 2,
            Self::Legacy2 | Self::Current => 3,
        }
    }
}

/// One record of a packed cell array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodedCell {
    /// A cell of the current format.
    Tile {
        /// Grid coordinate.
        coords: Coord,
        /// The tile.
        tile: TileRef,
    },
    /// A cell of a legacy format, still to be mapped onto the tile set.
    Legacy {
        /// Grid coordinate.
        coords: Coord,
        /// Legacy tile id, flags stripped.
        tile_id: i32,
        /// Autotile coordinates; zero in format 1.
        autotile_coords: Coord,
        /// Flip and transpose flags.
        transform: TileTransform,
    },
}

const LEGACY_FLIP_H: u32 = 1 << 29;
const LEGACY_FLIP_V: u32 = 1 << 30;
const LEGACY_TRANSPOSE: u32 = 1 << 31;
const LEGACY_ID_MASK: u32 = (1 << 29) - 1;

/// Pack cells in the current format.
///
/// A cell whose coordinates do not fit `i16`, or whose tile fields do not fit
/// `u16`, cannot be stored. It is skipped with a warning.
pub fn encode(cells: impl IntoIterator<Item = (Coord, TileRef)>) -> Vec<i32> {
    let mut out = Vec::new();
    for (coords, tile) in cells {
        let Some(halves) = pack(coords, tile) else {
            log::warn!("cell {coords} with tile {tile:?} does not fit the packed format, skipped");
            continue;
        };
        let mut bytes = [0_u8; 12];
        for (i, half) in halves.into_iter().enumerate() {
            bytes[i * 2..i * 2 + 2].copy_from_slice(&half.to_le_bytes());
        }
        out.extend(bytes.chunks_exact(4).map(|w| i32::from_le_bytes([w[0], w[1], w[2], w[3]])));
    }
    out
}

/// The six 16-bit fields of one record, or `None` when a field is out of range.
fn pack(coords: Coord, tile: TileRef) -> Option<[u16; 6]> {
    let x = i16::try_from(coords.x).ok()?.cast_unsigned();
    let y = i16::try_from(coords.y).ok()?.cast_unsigned();
    Some([
        x,
        y,
        u16::try_from(tile.source_id).ok()?,
        u16::try_from(tile.atlas_coords.x).ok()?,
        u16::try_from(tile.atlas_coords.y).ok()?,
        u16::try_from(tile.alternative).ok()?,
    ])
}

/// Unpack a cell array of `format`.
pub fn decode(format: TileDataFormat, data: &[i32]) -> Result<Vec<DecodedCell>, LayerError> {
    let record = format.record_len();
    if data.len() % record != 0 {
        return Err(LayerError::CorruptTileData {
            len: data.len(),
            record,
        });
    }

    let mut out = Vec::with_capacity(data.len() / record);
    for chunk in data.chunks_exact(record) {
        let mut bytes = [0_u8; 12];
        for (i, word) in chunk.iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        let signed = |at: usize| i32::from(i16::from_le_bytes([bytes[at], bytes[at + 1]]));
        let unsigned = |at: usize| i32::from(u16::from_le_bytes([bytes[at], bytes[at + 1]]));
        let coords = Coord::new(signed(0), signed(2));

        out.push(match format {
            TileDataFormat::Current => DecodedCell::Tile {
                coords,
                tile: TileRef::new(
                    unsigned(4),
                    Coord::new(unsigned(6), unsigned(8)),
                    unsigned(10),
                ),
            },
            TileDataFormat::Legacy1 | TileDataFormat::Legacy2 => {
                let v = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                let mut transform = TileTransform::empty();
                transform.set(TileTransform::FLIP_H, v & LEGACY_FLIP_H != 0);
                transform.set(TileTransform::FLIP_V, v & LEGACY_FLIP_V != 0);
                transform.set(TileTransform::TRANSPOSE, v & LEGACY_TRANSPOSE != 0);
                let autotile_coords = if format == TileDataFormat::Legacy2 {
                    Coord::new(signed(8), signed(10))
                } else {
                    Coord::ZERO
                };
                #[allow(
                    clippy::cast_possible_wrap,
                    reason = "The masked id has at most 29 bits."
                )]
                let tile_id = (v & LEGACY_ID_MASK) as i32;
                DecodedCell::Legacy {
                    coords,
                    tile_id,
                    autotile_coords,
                    transform,
                }
            }
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_format_packs_little_endian_halves() {
        let data = encode([(Coord::new(-1, 2), TileRef::new(3, Coord::new(4, 5), 6))]);
        assert_eq!(data.len(), 3);
        // x = 0xFFFF, y = 0x0002
        assert_eq!(data[0], 0x0002_FFFF);
        assert_eq!(data[1], 0x0004_0003);
        assert_eq!(data[2], 0x0006_0005);

        let cells = decode(TileDataFormat::Current, &data).unwrap();
        assert_eq!(
            cells,
            [DecodedCell::Tile {
                coords: Coord::new(-1, 2),
                tile: TileRef::new(3, Coord::new(4, 5), 6),
            }]
        );
    }

    #[test]
    fn out_of_range_cells_are_skipped_not_wrapped() {
        let tile = TileRef::new(1, Coord::new(2, 3), 0);
        let data = encode([
            (Coord::new(70_000, 0), tile),
            (Coord::new(0, i32::from(i16::MIN) - 1), tile),
            (Coord::new(5, 5), TileRef::new(1, Coord::new(0x1_0000, 0), 0)),
            (Coord::new(i32::from(i16::MIN), i32::from(i16::MAX)), tile),
        ]);
        let cells = decode(TileDataFormat::Current, &data).unwrap();
        assert_eq!(
            cells,
            [DecodedCell::Tile {
                coords: Coord::new(i32::from(i16::MIN), i32::from(i16::MAX)),
                tile,
            }]
        );
    }

    #[test]
    fn transform_bits_survive_the_alternative_field() {
        let alt = 2 | TileTransform::FLIP_V.bits() as i32;
        let data = encode([(Coord::ZERO, TileRef::new(0, Coord::ZERO, alt))]);
        let cells = decode(TileDataFormat::Current, &data).unwrap();
        let DecodedCell::Tile { tile, .. } = cells[0] else {
            panic!("expected a current-format cell");
        };
        assert_eq!(tile.alternative, alt);
        assert_eq!(tile.transform(), TileTransform::FLIP_V);
    }

    #[test]
    fn legacy_records_carry_flags_and_autotile_coords() {
        let v: u32 = 7 | LEGACY_FLIP_H | LEGACY_TRANSPOSE;
        let word0 = i32::from_le_bytes([3, 0, 0xFE, 0xFF]);
        let word1 = i32::from_le_bytes(v.to_le_bytes());
        let word2 = i32::from_le_bytes([1, 0, 2, 0]);

        let cells = decode(TileDataFormat::Legacy2, &[word0, word1, word2]).unwrap();
        assert_eq!(
            cells,
            [DecodedCell::Legacy {
                coords: Coord::new(3, -2),
                tile_id: 7,
                autotile_coords: Coord::new(1, 2),
                transform: TileTransform::FLIP_H | TileTransform::TRANSPOSE,
            }]
        );

        let cells = decode(TileDataFormat::Legacy1, &[word0, word1]).unwrap();
        let DecodedCell::Legacy { autotile_coords, .. } = cells[0] else {
            panic!("expected a legacy cell");
        };
        assert_eq!(autotile_coords, Coord::ZERO);
    }

    #[test]
    fn bad_lengths_and_versions_are_rejected() {
        assert_eq!(
            decode(TileDataFormat::Current, &[0; 4]),
            Err(LayerError::CorruptTileData { len: 4, record: 3 })
        );
        assert_eq!(
            TileDataFormat::from_version(4),
            Err(LayerError::UnsupportedFormat(4))
        );
        assert_eq!(TileDataFormat::from_version(3).unwrap().version(), 3);
    }
}
