//! Streaming tile decoder.
//!
//! [`TileDecoder::decode`] walks the top-level fields of one tile body and
//! yields [`GeometryElement`]s lazily. Broken features are dropped and
//! counted; anything that breaks framing ends the tile with a single error.

use crate::buffer::BufferedSource;
use crate::encode::{field, WIRE_LEN, WIRE_VARINT};
use crate::error::{DecodeError, Result};
use crate::geometry::{GeometryElement, GeometryKind};
use crate::tags::{Tag, TagDictionary};
use crate::varint::{decode_varint, CoordinateDeltas};
use crate::{DEFAULT_LAYER, DEFAULT_RENDERER_TILE_SIZE, LAYER_BANDS, REFERENCE_TILE_SIZE};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    ExpectTopLevelTag,
    Done,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub elements: usize,
    pub dropped_features: usize,
    pub tile_tags: usize,
    pub skipped_fields: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DecodedTile {
    pub elements: Vec<GeometryElement>,
    pub stats: DecodeStats,
}

/// Decoder configuration shared by every tile a worker decodes.
#[derive(Debug, Clone)]
pub struct TileDecoder {
    dict: Arc<TagDictionary>,
    scale: f32,
    tile_size: f32,
}

impl TileDecoder {
    pub fn new(dict: Arc<TagDictionary>) -> Self {
        Self::with_tile_size(dict, DEFAULT_RENDERER_TILE_SIZE)
    }

    pub fn with_tile_size(dict: Arc<TagDictionary>, tile_size: f32) -> Self {
        Self {
            dict,
            scale: REFERENCE_TILE_SIZE / tile_size,
            tile_size,
        }
    }

    pub fn dictionary(&self) -> &Arc<TagDictionary> {
        &self.dict
    }

    /// Decode the message `source` is positioned at. The message ends at the
    /// length given to [`BufferedSource::begin_message`], at a zero field key,
    /// or at end of stream when no length was declared.
    pub fn decode<'a, R: Read>(&'a self, source: &'a mut BufferedSource<R>) -> TileElements<'a, R> {
        TileElements {
            decoder: self,
            source,
            dynamic: Vec::new(),
            pending: VecDeque::new(),
            state: DecodeState::ExpectTopLevelTag,
            stats: DecodeStats::default(),
        }
    }
}

/// Decode a complete tile held in memory.
pub fn decode_tile_bytes(decoder: &TileDecoder, bytes: &[u8]) -> Result<DecodedTile> {
    let mut source = BufferedSource::new(bytes);
    source.begin_message(bytes.len());
    decoder.decode(&mut source).collect_tile()
}

pub fn decode_tile_file<P: AsRef<Path>>(decoder: &TileDecoder, path: P) -> Result<DecodedTile> {
    let file = File::open(path)?;
    let len = file.metadata()?.len() as usize;
    let mut source = BufferedSource::new(file);
    source.begin_message(len);
    decoder.decode(&mut source).collect_tile()
}

enum Step {
    Emit(GeometryElement),
    Continue,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureField {
    Way,
    Node,
}

/// Everything read from one feature before validation.
#[derive(Default)]
struct RawFeature {
    declared_tags: usize,
    declared_indices: usize,
    declared_coords: usize,
    tags: Vec<Arc<Tag>>,
    ring_index: Vec<i32>,
    coordinates: Vec<f32>,
    layer: Option<u32>,
}

impl RawFeature {
    fn check(field: &'static str, declared: usize, decoded: usize) -> Result<()> {
        if declared != decoded {
            return Err(DecodeError::FeatureCountMismatch {
                field,
                declared,
                decoded,
            });
        }
        Ok(())
    }

    fn validate(&self, field: FeatureField) -> Result<()> {
        Self::check("tag", self.declared_tags, self.tags.len())?;
        Self::check("coordinate", self.declared_coords, self.coordinates.len())?;
        if self.coordinates.is_empty() {
            return Err(DecodeError::FeatureCountMismatch {
                field: "coordinate",
                declared: self.declared_coords,
                decoded: 0,
            });
        }

        match field {
            FeatureField::Way => {
                Self::check("ring", self.declared_indices, self.ring_index.len())?;
                let covered: usize = self.ring_index.iter().map(|&n| n as usize).sum();
                Self::check("ring length", covered, self.coordinates.len())
            }
            FeatureField::Node => {
                let values = self.coordinates.len();
                Self::check("point", values / 2 * 2, values)
            }
        }
    }
}

/// `0` means "no explicit layer"; everything else is clamped into the bands.
#[inline]
fn layer_band(raw: Option<u32>) -> i8 {
    match raw {
        None | Some(0) => DEFAULT_LAYER,
        Some(v) => v.min((LAYER_BANDS - 1) as u32) as i8,
    }
}

/// Lazy, single-pass sequence of the elements in one tile.
pub struct TileElements<'a, R> {
    decoder: &'a TileDecoder,
    source: &'a mut BufferedSource<R>,
    dynamic: Vec<Arc<Tag>>,
    pending: VecDeque<GeometryElement>,
    state: DecodeState,
    stats: DecodeStats,
}

impl<'a, R: Read> TileElements<'a, R> {
    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Drain the sequence, failing on the first tile-level error.
    pub fn collect_tile(mut self) -> Result<DecodedTile> {
        let mut elements = Vec::new();
        for item in self.by_ref() {
            elements.push(item?);
        }
        Ok(DecodedTile {
            elements,
            stats: self.stats,
        })
    }

    fn step(&mut self) -> Result<Step> {
        if self.source.at_message_end()? {
            return Ok(Step::End);
        }

        let key = decode_varint(self.source)?;
        if key == 0 {
            return Ok(Step::End);
        }

        let (tag, wire_type) = (key >> 3, key & 7);
        let step = match tag {
            field::TILE_TAGS => {
                self.read_tile_tag()?;
                Step::Continue
            }
            field::TILE_WAYS => self.read_feature(FeatureField::Way, GeometryKind::Line)?,
            field::TILE_POLYGONS => self.read_feature(FeatureField::Way, GeometryKind::Polygon)?,
            field::TILE_NODES => self.read_feature(FeatureField::Node, GeometryKind::Point)?,
            _ => {
                let end = self.source.content_length().unwrap_or(usize::MAX);
                self.skip_field(tag, wire_type, end)?;
                tracing::debug!(tag, wire_type, "skipped unknown tile field");
                Step::Continue
            }
        };

        if let Some(len) = self.source.content_length() {
            let position = self.source.bytes_processed();
            if position > len {
                return Err(DecodeError::LengthOverrun { position, end: len });
            }
        }
        Ok(step)
    }

    fn read_tile_tag(&mut self) -> Result<()> {
        let len = decode_varint(self.source)? as usize;
        let bytes = self.source.read_bytes(len)?;
        let raw = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        let tag = self.decoder.dict.intern_dynamic(raw)?;
        self.dynamic.push(tag);
        self.stats.tile_tags += 1;
        Ok(())
    }

    fn read_feature(&mut self, field: FeatureField, kind: GeometryKind) -> Result<Step> {
        let len = decode_varint(self.source)? as usize;
        let end = self.source.bytes_processed() + len;
        if let Some(content) = self.source.content_length() {
            if end > content {
                return Err(DecodeError::LengthOverrun {
                    position: end,
                    end: content,
                });
            }
        }

        let raw = match self.read_feature_body(field, end) {
            Ok(raw) => raw,
            Err(e) if e.is_feature_local() => {
                self.drop_feature(&e, end)?;
                return Ok(Step::Continue);
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = raw.validate(field) {
            self.drop_feature(&e, end)?;
            return Ok(Step::Continue);
        }

        let layer = layer_band(raw.layer);
        match field {
            FeatureField::Way => {
                let mut ring_index = raw.ring_index;
                ring_index.push(-1);
                Ok(Step::Emit(GeometryElement {
                    kind,
                    layer,
                    tags: raw.tags,
                    coordinates: raw.coordinates,
                    ring_index,
                }))
            }
            FeatureField::Node => {
                self.pending.extend(
                    raw.coordinates
                        .chunks_exact(2)
                        .map(|p| GeometryElement::point(layer, raw.tags.clone(), p[0], p[1])),
                );
                Ok(Step::Continue)
            }
        }
    }

    fn drop_feature(&mut self, error: &DecodeError, end: usize) -> Result<()> {
        self.stats.dropped_features += 1;
        tracing::debug!(error = %error, "dropping feature");
        let position = self.source.bytes_processed();
        if position > end {
            return Err(DecodeError::LengthOverrun { position, end });
        }
        self.source.skip(end - position)
    }

    fn read_feature_body(&mut self, field: FeatureField, end: usize) -> Result<RawFeature> {
        let mut raw = RawFeature::default();
        let mut deltas = CoordinateDeltas::new(self.decoder.scale, self.decoder.tile_size);

        while self.source.bytes_processed() < end {
            let key = decode_varint(self.source)?;
            if key == 0 {
                break;
            }
            let (tag, wire_type) = (key >> 3, key & 7);

            match (field, tag) {
                (FeatureField::Way, field::WAY_NUM_TAGS)
                | (FeatureField::Node, field::NODE_NUM_TAGS) => {
                    raw.declared_tags = decode_varint(self.source)? as usize;
                }
                (FeatureField::Way, field::WAY_NUM_INDICES) => {
                    raw.declared_indices = decode_varint(self.source)? as usize;
                }
                (FeatureField::Way, field::WAY_NUM_COORDS)
                | (FeatureField::Node, field::NODE_NUM_COORDS) => {
                    raw.declared_coords = decode_varint(self.source)? as usize;
                }
                (FeatureField::Way, field::WAY_TAGS) | (FeatureField::Node, field::NODE_TAGS) => {
                    self.read_tag_indices(end, &mut raw.tags)?;
                }
                (FeatureField::Way, field::WAY_INDEX) => {
                    self.read_ring_index(end, &mut raw.ring_index)?;
                }
                (FeatureField::Way, field::WAY_COORDS)
                | (FeatureField::Node, field::NODE_COORDS) => {
                    self.read_coordinates(end, &mut deltas, &mut raw.coordinates)?;
                }
                (FeatureField::Way, field::WAY_LAYER) | (FeatureField::Node, field::NODE_LAYER) => {
                    raw.layer = Some(decode_varint(self.source)?);
                }
                _ => {
                    self.skip_field(tag, wire_type, end)?;
                    tracing::trace!(tag, wire_type, "skipped unknown feature field");
                }
            }
        }

        let position = self.source.bytes_processed();
        if position > end {
            return Err(DecodeError::LengthOverrun { position, end });
        }
        if position < end {
            self.source.skip(end - position)?;
        }
        Ok(raw)
    }

    /// Read a packed-field length and return where the field stops.
    fn packed_end(&mut self, end: usize) -> Result<usize> {
        let len = decode_varint(self.source)? as usize;
        let stop = self.source.bytes_processed() + len;
        if stop > end {
            return Err(DecodeError::LengthOverrun { position: stop, end });
        }
        Ok(stop)
    }

    fn finish_packed(&self, stop: usize) -> Result<()> {
        let position = self.source.bytes_processed();
        if position != stop {
            return Err(DecodeError::LengthOverrun { position, end: stop });
        }
        Ok(())
    }

    fn read_tag_indices(&mut self, end: usize, out: &mut Vec<Arc<Tag>>) -> Result<()> {
        let stop = self.packed_end(end)?;
        while self.source.bytes_processed() < stop {
            let index = decode_varint(self.source)?;
            out.push(self.decoder.dict.resolve(index, &self.dynamic)?);
        }
        self.finish_packed(stop)
    }

    /// Ring lengths are point counts on the wire; the element stores value
    /// counts, so each is doubled.
    fn read_ring_index(&mut self, end: usize, out: &mut Vec<i32>) -> Result<()> {
        let stop = self.packed_end(end)?;
        while self.source.bytes_processed() < stop {
            let points = decode_varint(self.source)?;
            out.push(points.min(i32::MAX as u32 / 2) as i32 * 2);
        }
        self.finish_packed(stop)
    }

    fn read_coordinates(
        &mut self,
        end: usize,
        deltas: &mut CoordinateDeltas,
        out: &mut Vec<f32>,
    ) -> Result<()> {
        let stop = self.packed_end(end)?;
        while self.source.bytes_processed() < stop {
            out.push(deltas.next(decode_varint(self.source)?));
        }
        self.finish_packed(stop)
    }

    /// Skip a field this decoder does not understand. Only varint and
    /// length-delimited fields have a knowable extent.
    fn skip_field(&mut self, tag: u32, wire_type: u32, end: usize) -> Result<()> {
        match wire_type {
            WIRE_VARINT => {
                decode_varint(self.source)?;
            }
            WIRE_LEN => {
                let stop = self.packed_end(end)?;
                let position = self.source.bytes_processed();
                self.source.skip(stop - position)?;
            }
            _ => return Err(DecodeError::UnknownFieldTag { tag, wire_type }),
        }
        self.stats.skipped_fields += 1;
        Ok(())
    }
}

impl<R: Read> Iterator for TileElements<'_, R> {
    type Item = Result<GeometryElement>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(element) = self.pending.pop_front() {
                self.stats.elements += 1;
                return Some(Ok(element));
            }
            if self.state != DecodeState::ExpectTopLevelTag {
                return None;
            }

            match self.step() {
                Ok(Step::Emit(element)) => {
                    self.stats.elements += 1;
                    return Some(Ok(element));
                }
                Ok(Step::Continue) => {}
                Ok(Step::End) => {
                    self.state = DecodeState::Done;
                    self.stats.bytes = self.source.bytes_processed();
                }
                Err(e) => {
                    self.state = DecodeState::Failed;
                    self.stats.bytes = self.source.bytes_processed();
                    tracing::debug!(error = %e, "tile decode failed");
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: Read> FusedIterator for TileElements<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_bands() {
        assert_eq!(layer_band(None), DEFAULT_LAYER);
        assert_eq!(layer_band(Some(0)), DEFAULT_LAYER);
        assert_eq!(layer_band(Some(3)), 3);
        assert_eq!(layer_band(Some(40)), LAYER_BANDS - 1);
    }

    #[test]
    fn empty_body_is_an_empty_tile() {
        let decoder = TileDecoder::new(Arc::new(TagDictionary::new()));
        let tile = decode_tile_bytes(&decoder, &[]).unwrap();
        assert!(tile.elements.is_empty());
        assert_eq!(tile.stats, DecodeStats::default());
    }

    #[test]
    fn zero_key_ends_the_tile_early() {
        let decoder = TileDecoder::new(Arc::new(TagDictionary::new()));
        let mut source = BufferedSource::new(&[0u8, 0x0a, 0x01, b'x'][..]);
        source.begin_message(4);
        let mut elements = decoder.decode(&mut source);
        assert!(elements.next().is_none());
        assert_eq!(elements.state(), DecodeState::Done);
        assert_eq!(elements.stats().bytes, 1);
    }
}
