//! Tile writer for the same wire format the decoder reads.
//!
//! Coordinates are given on the 4096 reference grid with a top-down y axis,
//! exactly as producers quantize them.

use crate::tags::DYNAMIC_OFFSET;
use crate::varint::{encode_varint, zigzag_encode};

pub const WIRE_VARINT: u32 = 0;
pub const WIRE_LEN: u32 = 2;

pub(crate) mod field {
    pub const TILE_TAGS: u32 = 1;
    pub const TILE_WAYS: u32 = 2;
    pub const TILE_POLYGONS: u32 = 3;
    pub const TILE_NODES: u32 = 4;

    pub const WAY_NUM_TAGS: u32 = 1;
    pub const WAY_NUM_INDICES: u32 = 2;
    pub const WAY_NUM_COORDS: u32 = 3;
    pub const WAY_TAGS: u32 = 11;
    pub const WAY_INDEX: u32 = 12;
    pub const WAY_COORDS: u32 = 13;
    pub const WAY_LAYER: u32 = 21;

    pub const NODE_NUM_TAGS: u32 = 1;
    pub const NODE_NUM_COORDS: u32 = 2;
    pub const NODE_TAGS: u32 = 11;
    pub const NODE_COORDS: u32 = 12;
    pub const NODE_LAYER: u32 = 21;
}

#[inline]
fn write_key(out: &mut Vec<u8>, tag: u32, wire_type: u32) {
    encode_varint(tag << 3 | wire_type, out);
}

fn write_uint_field(out: &mut Vec<u8>, tag: u32, value: u32) {
    write_key(out, tag, WIRE_VARINT);
    encode_varint(value, out);
}

fn write_len_field(out: &mut Vec<u8>, tag: u32, payload: &[u8]) {
    write_key(out, tag, WIRE_LEN);
    encode_varint(payload.len() as u32, out);
    out.extend_from_slice(payload);
}

fn packed<I: IntoIterator<Item = u32>>(values: I) -> Vec<u8> {
    let mut buf = Vec::new();
    for v in values {
        encode_varint(v, &mut buf);
    }
    buf
}

/// One way, polygon or node.
///
/// The declared counts default to what was added; the `declare_*` overrides
/// exist to produce deliberately inconsistent features.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    tags: Vec<u32>,
    rings: Vec<u32>,
    points: Vec<(i32, i32)>,
    layer: Option<u32>,
    declared_tags: Option<u32>,
    declared_indices: Option<u32>,
    declared_coords: Option<u32>,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags(mut self, indices: &[u32]) -> Self {
        self.tags.extend_from_slice(indices);
        self
    }

    /// Append a ring of reference-grid points.
    pub fn ring(mut self, points: &[(i32, i32)]) -> Self {
        self.rings.push(points.len() as u32);
        self.points.extend_from_slice(points);
        self
    }

    /// Append a single point (nodes carry no ring index).
    pub fn point(mut self, x: i32, y: i32) -> Self {
        self.points.push((x, y));
        self
    }

    pub fn layer(mut self, layer: u32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn declare_tags(mut self, n: u32) -> Self {
        self.declared_tags = Some(n);
        self
    }

    pub fn declare_indices(mut self, n: u32) -> Self {
        self.declared_indices = Some(n);
        self
    }

    pub fn declare_coords(mut self, n: u32) -> Self {
        self.declared_coords = Some(n);
        self
    }

    fn coords(&self) -> Vec<u8> {
        let (mut lx, mut ly) = (0i32, 0i32);
        packed(self.points.iter().flat_map(|&(x, y)| {
            let dx = zigzag_encode(x.wrapping_sub(lx));
            let dy = zigzag_encode(y.wrapping_sub(ly));
            lx = x;
            ly = y;
            [dx, dy]
        }))
    }

    fn num_tags(&self) -> u32 {
        self.declared_tags.unwrap_or(self.tags.len() as u32)
    }

    fn num_coords(&self) -> u32 {
        self.declared_coords
            .unwrap_or(self.points.len() as u32 * 2)
    }

    fn encode_way(&self) -> Vec<u8> {
        let mut body = Vec::new();
        write_uint_field(&mut body, field::WAY_NUM_TAGS, self.num_tags());
        write_uint_field(
            &mut body,
            field::WAY_NUM_INDICES,
            self.declared_indices.unwrap_or(self.rings.len() as u32),
        );
        write_uint_field(&mut body, field::WAY_NUM_COORDS, self.num_coords());
        write_len_field(&mut body, field::WAY_TAGS, &packed(self.tags.iter().copied()));
        write_len_field(&mut body, field::WAY_INDEX, &packed(self.rings.iter().copied()));
        write_len_field(&mut body, field::WAY_COORDS, &self.coords());
        if let Some(layer) = self.layer {
            write_uint_field(&mut body, field::WAY_LAYER, layer);
        }
        body
    }

    fn encode_node(&self) -> Vec<u8> {
        let mut body = Vec::new();
        write_uint_field(&mut body, field::NODE_NUM_TAGS, self.num_tags());
        write_uint_field(&mut body, field::NODE_NUM_COORDS, self.num_coords());
        write_len_field(&mut body, field::NODE_TAGS, &packed(self.tags.iter().copied()));
        write_len_field(&mut body, field::NODE_COORDS, &self.coords());
        if let Some(layer) = self.layer {
            write_uint_field(&mut body, field::NODE_LAYER, layer);
        }
        body
    }
}

/// Accumulates a tile body field by field.
#[derive(Debug, Clone, Default)]
pub struct TileBuilder {
    out: Vec<u8>,
    tile_tags: u32,
}

impl TileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a tile-local tag string; returns the index features use for it.
    pub fn tile_tag(&mut self, raw: &str) -> u32 {
        write_len_field(&mut self.out, field::TILE_TAGS, raw.as_bytes());
        self.tile_tags += 1;
        DYNAMIC_OFFSET + self.tile_tags - 1
    }

    pub fn way(&mut self, feature: &FeatureBuilder) -> &mut Self {
        write_len_field(&mut self.out, field::TILE_WAYS, &feature.encode_way());
        self
    }

    pub fn polygon(&mut self, feature: &FeatureBuilder) -> &mut Self {
        write_len_field(&mut self.out, field::TILE_POLYGONS, &feature.encode_way());
        self
    }

    pub fn node(&mut self, feature: &FeatureBuilder) -> &mut Self {
        write_len_field(&mut self.out, field::TILE_NODES, &feature.encode_node());
        self
    }

    /// Write an arbitrary length-delimited field, e.g. one from a newer producer.
    pub fn raw_len_field(&mut self, tag: u32, payload: &[u8]) -> &mut Self {
        write_len_field(&mut self.out, tag, payload);
        self
    }

    pub fn raw_uint_field(&mut self, tag: u32, value: u32) -> &mut Self {
        write_uint_field(&mut self.out, tag, value);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
