//! VTILE: streaming reader/writer for varint-framed vector map tiles.
//!
//! - All integers are unsigned base-128 varints; signed deltas are zigzag mapped.
//! - Coordinates live on a 4096 reference grid and are rescaled to the renderer tile size.
//! - Tags resolve through a two-tier dictionary: a compiled-in static table plus
//!   per-tile strings declared by the tile itself.
//!
//! Wire layout (field key = `tag << 3 | wire_type`):
//!   Tile     := Field*
//!   Field    := key Body
//!               1 => TileTags  (len) UTF-8 "key=value"
//!               2 => Ways      (len) SubField*
//!               3 => Polygons  (len) SubField*
//!               4 => Nodes     (len) SubField*
//!
//! Way/Polygon sub-fields:
//!   1 NumTags  2 NumIndices  3 NumCoords
//!   11 TagIndices (packed)  12 RingIndices (packed point counts)
//!   13 Coords (packed zigzag deltas, x/y interleaved)  21 Layer
//!
//! Node sub-fields:
//!   1 NumTags  2 NumCoords  11 TagIndices  12 Coords  21 Layer
//!
//! Tag indices below [`tags::STATIC_LIMIT`] address the static table; indices at
//! or above [`tags::DYNAMIC_OFFSET`] address the tile's own `TileTags` list.

pub mod buffer;
pub mod decoder;
pub mod encode;
pub mod error;
pub mod geometry;
mod static_tags;
pub mod tags;
pub mod varint;

pub use buffer::{BufferedSource, DEFAULT_BUFFER_CAPACITY};
pub use decoder::{
    decode_tile_bytes, decode_tile_file, DecodeState, DecodeStats, DecodedTile, TileDecoder,
    TileElements,
};
pub use encode::{FeatureBuilder, TileBuilder};
pub use error::DecodeError;
pub use geometry::{GeometryElement, GeometryKind, TileCoord};
pub use tags::{Tag, TagDictionary};

/// Side length of the grid tile coordinates are quantized on by producers.
pub const REFERENCE_TILE_SIZE: f32 = 4096.0;

/// Renderer tile size used when the caller does not pick one.
pub const DEFAULT_RENDERER_TILE_SIZE: f32 = 256.0;

/// Layer assigned to features that carry no explicit layer.
pub const DEFAULT_LAYER: i8 = 5;

/// Number of layer bands; explicit layers are clamped into `0..LAYER_BANDS`.
pub const LAYER_BANDS: i8 = 11;
