use crate::tags::Tag;
use std::fmt;
use std::sync::Arc;

/// Quad-tree tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    #[inline]
    pub const fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at this zoom level.
    #[inline]
    pub fn tiles_per_axis(zoom: u8) -> u64 {
        1u64 << zoom.min(31)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

/// One decoded feature, ready for a renderer.
///
/// `coordinates` holds interleaved x, y values in renderer tile units.
/// `ring_index` holds per-ring value counts (twice the point count) and is
/// terminated by `-1`; the non-negative entries sum to `coordinates.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryElement {
    pub kind: GeometryKind,
    pub layer: i8,
    pub tags: Vec<Arc<Tag>>,
    pub coordinates: Vec<f32>,
    pub ring_index: Vec<i32>,
}

impl GeometryElement {
    pub fn point(layer: i8, tags: Vec<Arc<Tag>>, x: f32, y: f32) -> Self {
        Self {
            kind: GeometryKind::Point,
            layer,
            tags,
            coordinates: vec![x, y],
            ring_index: vec![2, -1],
        }
    }

    pub fn num_points(&self) -> usize {
        self.coordinates.len() / 2
    }

    /// Iterate the coordinate slice of each ring.
    pub fn rings(&self) -> impl Iterator<Item = &[f32]> + '_ {
        let mut offset = 0usize;
        self.ring_index
            .iter()
            .take_while(|&&len| len >= 0)
            .map(move |&len| {
                let start = offset;
                offset = (offset + len as usize).min(self.coordinates.len());
                &self.coordinates[start.min(offset)..offset]
            })
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| &*t.key == key)
            .and_then(|t| t.value.as_deref())
    }
}
