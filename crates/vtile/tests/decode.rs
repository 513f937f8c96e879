use std::io::{self, Read};
use std::sync::Arc;
use vtile::tags::DYNAMIC_OFFSET;
use vtile::{
    decode_tile_bytes, BufferedSource, DecodeError, DecodeState, FeatureBuilder, GeometryKind,
    TagDictionary, TileBuilder, TileDecoder,
};

fn decoder() -> TileDecoder {
    TileDecoder::new(Arc::new(TagDictionary::new()))
}

/// Square ring on the 4096 grid; decodes to x 10..20, y 236..246 at tile size 256.
const SQUARE: [(i32, i32); 4] = [(160, 320), (320, 320), (320, 160), (160, 160)];

fn four_tag_way(dict: &TagDictionary, tile: &mut TileBuilder) -> FeatureBuilder {
    let primary = dict.static_index("highway", "primary").unwrap();
    let oneway = dict.static_index("oneway", "yes").unwrap();
    let r#ref = tile.tile_tag("ref=B 96");
    let lanes = tile.tile_tag("lanes=2");
    FeatureBuilder::new()
        .tags(&[primary, r#ref, oneway, lanes])
        .ring(&SQUARE)
        .layer(3)
}

/// Reader that returns one byte per call.
struct OneByte<'a>(&'a [u8]);

impl Read for OneByte<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.0[0];
        self.0 = &self.0[1..];
        Ok(1)
    }
}

#[test]
fn way_with_four_tags_and_one_ring() {
    let decoder = decoder();
    let mut tile = TileBuilder::new();
    let way = four_tag_way(decoder.dictionary(), &mut tile);
    tile.way(&way);

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    assert_eq!(decoded.elements.len(), 1);

    let el = &decoded.elements[0];
    assert_eq!(el.kind, GeometryKind::Line);
    assert_eq!(el.layer, 3);
    let tags: Vec<String> = el.tags.iter().map(|t| t.to_string()).collect();
    assert_eq!(tags, ["highway=primary", "ref=B 96", "oneway=yes", "lanes=2"]);
    assert!(el.tags[0].is_static && !el.tags[1].is_static);

    assert_eq!(
        el.coordinates,
        [10.0, 236.0, 20.0, 236.0, 20.0, 246.0, 10.0, 246.0]
    );
    assert_eq!(el.ring_index, [8, -1]);
    assert_eq!(decoded.stats.tile_tags, 2);
    assert_eq!(decoded.stats.bytes, tile.as_bytes().len());
}

#[test]
fn polygon_field_yields_polygons() {
    let decoder = decoder();
    let mut tile = TileBuilder::new();
    let way = four_tag_way(decoder.dictionary(), &mut tile);
    tile.polygon(&way);

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    assert_eq!(decoded.elements.len(), 1);
    assert_eq!(decoded.elements[0].kind, GeometryKind::Polygon);
}

#[test]
fn multi_ring_polygon_keeps_the_ring_invariant() {
    let decoder = decoder();
    let water = decoder.dictionary().static_index("natural", "water").unwrap();
    let mut tile = TileBuilder::new();
    tile.polygon(
        &FeatureBuilder::new()
            .tags(&[water])
            .ring(&[(0, 0), (4096, 0), (4096, 4096), (0, 4096)])
            .ring(&[(1024, 1024), (2048, 1024), (2048, 2048)]),
    );

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    let el = &decoded.elements[0];
    assert_eq!(el.ring_index, [8, 6, -1]);
    let covered: i32 = el.ring_index.iter().filter(|&&n| n >= 0).sum();
    assert_eq!(covered as usize, el.coordinates.len());
    assert_eq!(&el.coordinates[..4], &[0.0, 256.0, 256.0, 256.0]);
    assert_eq!(el.rings().nth(1).unwrap(), &[64.0, 192.0, 128.0, 192.0, 128.0, 128.0]);
}

#[test]
fn tag_count_mismatch_drops_only_that_feature() {
    let decoder = decoder();
    let dict = decoder.dictionary();
    let residential = dict.static_index("highway", "residential").unwrap();
    let service = dict.static_index("highway", "service").unwrap();

    let mut tile = TileBuilder::new();
    tile.way(
        &FeatureBuilder::new()
            .tags(&[residential, service])
            .declare_tags(3)
            .ring(&SQUARE),
    );
    tile.way(&FeatureBuilder::new().tags(&[service]).ring(&SQUARE));

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    assert_eq!(decoded.stats.dropped_features, 1);
    assert_eq!(decoded.elements.len(), 1);
    assert_eq!(decoded.elements[0].tag_value("highway"), Some("service"));
}

#[test]
fn coordinate_and_index_mismatches_are_feature_local() {
    let decoder = decoder();
    let park = decoder.dictionary().static_index("leisure", "park").unwrap();

    let mut tile = TileBuilder::new();
    tile.polygon(&FeatureBuilder::new().tags(&[park]).ring(&SQUARE).declare_coords(6));
    tile.polygon(&FeatureBuilder::new().tags(&[park]).ring(&SQUARE).declare_indices(2));
    tile.polygon(&FeatureBuilder::new().tags(&[park]).ring(&SQUARE));

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    assert_eq!(decoded.stats.dropped_features, 2);
    assert_eq!(decoded.elements.len(), 1);
}

#[test]
fn unresolvable_tag_index_drops_the_feature() {
    let decoder = decoder();
    let mut tile = TileBuilder::new();
    let local = tile.tile_tag("surface=paved");
    tile.way(&FeatureBuilder::new().tags(&[local + 1]).ring(&SQUARE));
    tile.way(&FeatureBuilder::new().tags(&[DYNAMIC_OFFSET - 1]).ring(&SQUARE));
    tile.way(&FeatureBuilder::new().tags(&[local]).ring(&SQUARE));

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    assert_eq!(decoded.stats.dropped_features, 2);
    assert_eq!(decoded.elements.len(), 1);
    assert_eq!(decoded.elements[0].tag_value("surface"), Some("paved"));
}

#[test]
fn nodes_emit_one_point_each() {
    let decoder = decoder();
    let stop = decoder.dictionary().static_index("highway", "bus_stop").unwrap();
    let mut tile = TileBuilder::new();
    let name = tile.tile_tag("name=Central");
    tile.node(
        &FeatureBuilder::new()
            .tags(&[stop, name])
            .point(0, 0)
            .point(4096, 4096)
            .point(2048, 1024)
            .layer(7),
    );

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    let points: Vec<_> = decoded
        .elements
        .iter()
        .map(|e| (e.coordinates[0], e.coordinates[1]))
        .collect();
    assert_eq!(points, [(0.0, 256.0), (256.0, 0.0), (128.0, 192.0)]);
    for el in &decoded.elements {
        assert_eq!(el.kind, GeometryKind::Point);
        assert_eq!(el.layer, 7);
        assert_eq!(el.tags.len(), 2);
        // Names collapse into the value-less generalized name tag.
        assert!(el.tags.iter().any(|t| &*t.key == "name" && t.value.is_none()));
        assert_eq!(el.tag_value("name"), None);
        assert_eq!(el.ring_index, [2, -1]);
    }
    assert_eq!(decoded.stats.elements, 3);
}

#[test]
fn zero_and_oversized_layers() {
    let decoder = decoder();
    let wall = decoder.dictionary().static_index("barrier", "wall").unwrap();
    let mut tile = TileBuilder::new();
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE).layer(0));
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE).layer(99));
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    let layers: Vec<i8> = decoded.elements.iter().map(|e| e.layer).collect();
    assert_eq!(layers, [5, 10, 5]);
}

#[test]
fn unknown_length_delimited_fields_are_skipped() {
    let decoder = decoder();
    let wall = decoder.dictionary().static_index("barrier", "wall").unwrap();
    let mut tile = TileBuilder::new();
    tile.raw_len_field(9, b"from a newer producer");
    tile.raw_uint_field(10, 12345);
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    assert_eq!(decoded.elements.len(), 1);
    assert_eq!(decoded.stats.skipped_fields, 2);
}

#[test]
fn ambiguous_unknown_field_fails_the_tile_once() {
    let decoder = decoder();
    let wall = decoder.dictionary().static_index("barrier", "wall").unwrap();
    let mut tile = TileBuilder::new();
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));
    let mut bytes = tile.finish();
    // Field 9 with the fixed32 wire type.
    bytes.extend_from_slice(&[9 << 3 | 5, 1, 2, 3, 4]);

    let mut source = BufferedSource::new(&bytes[..]);
    source.begin_message(bytes.len());
    let mut elements = decoder.decode(&mut source);

    assert!(elements.next().unwrap().is_ok());
    assert!(matches!(
        elements.next(),
        Some(Err(DecodeError::UnknownFieldTag { tag: 9, wire_type: 5 }))
    ));
    assert!(elements.next().is_none());
    assert_eq!(elements.state(), DecodeState::Failed);
}

#[test]
fn unknown_wire_type_inside_a_feature_drops_only_that_feature() {
    let decoder = decoder();
    let wall = decoder.dictionary().static_index("barrier", "wall").unwrap();
    let mut tile = TileBuilder::new();
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));
    // A way whose only sub-field is field 9 with the fixed32 wire type.
    tile.raw_len_field(2, &[9 << 3 | 5, 1, 2, 3, 4]);
    tile.polygon(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE).layer(2));

    let decoded = decode_tile_bytes(&decoder, tile.as_bytes()).unwrap();
    let kinds: Vec<_> = decoded.elements.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [GeometryKind::Line, GeometryKind::Polygon]);
    assert_eq!(decoded.elements[1].layer, 2);
    assert_eq!(decoded.stats.dropped_features, 1);
}

#[test]
fn malformed_varint_mid_tile_fails_once() {
    let decoder = decoder();
    let wall = decoder.dictionary().static_index("barrier", "wall").unwrap();
    let mut tile = TileBuilder::new();
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));
    let mut bytes = tile.finish();
    // Five continuation bytes: no valid u32 varint.
    bytes.extend_from_slice(&[0xff; 5]);
    let mut trailing = TileBuilder::new();
    trailing.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));
    bytes.extend_from_slice(trailing.as_bytes());

    let mut source = BufferedSource::new(&bytes[..]);
    source.begin_message(bytes.len());
    let mut elements = decoder.decode(&mut source);

    assert!(elements.next().unwrap().is_ok());
    assert!(matches!(elements.next(), Some(Err(DecodeError::MalformedVarint))));
    assert!(elements.next().is_none());
    assert!(elements.next().is_none());
    assert_eq!(elements.state(), DecodeState::Failed);
    assert_eq!(elements.stats().elements, 1);
}

#[test]
fn truncated_tile_is_a_tile_error() {
    let decoder = decoder();
    let wall = decoder.dictionary().static_index("barrier", "wall").unwrap();
    let mut tile = TileBuilder::new();
    tile.way(&FeatureBuilder::new().tags(&[wall]).ring(&SQUARE));
    let bytes = tile.finish();

    let truncated = &bytes[..bytes.len() - 3];
    let mut source = BufferedSource::new(truncated);
    source.begin_message(bytes.len());
    let result = decoder.decode(&mut source).collect_tile();
    assert!(matches!(
        result,
        Err(DecodeError::LengthOverrun { .. }) | Err(DecodeError::UnexpectedEof { .. })
    ));
}

#[test]
fn oversized_tag_string_aborts_the_tile() {
    let decoder = decoder();
    let mut tile = TileBuilder::new();
    tile.tile_tag(&format!("note={}", "x".repeat(200)));
    let bytes = tile.finish();

    let mut source = BufferedSource::with_capacity(&bytes[..], 64);
    source.begin_message(bytes.len());
    let result = decoder.decode(&mut source).collect_tile();
    assert!(matches!(
        result,
        Err(DecodeError::RequestedSizeTooLarge { capacity: 64, .. })
    ));
}

#[test]
fn byte_at_a_time_stream_decodes_identically() {
    let decoder = decoder();
    let mut tile = TileBuilder::new();
    let way = four_tag_way(decoder.dictionary(), &mut tile);
    tile.way(&way).polygon(&way).node(&FeatureBuilder::new().tags(&[1]).point(7, 9));
    let bytes = tile.finish();

    let whole = decode_tile_bytes(&decoder, &bytes).unwrap();

    let mut source = BufferedSource::with_capacity(OneByte(&bytes), 32);
    source.begin_message(bytes.len());
    let streamed = decoder.decode(&mut source).collect_tile().unwrap();

    assert_eq!(whole.elements, streamed.elements);
    assert_eq!(streamed.elements.len(), 3);
}

#[test]
fn dynamic_cache_is_shared_across_tiles() {
    let decoder = decoder();
    let mut first = TileBuilder::new();
    let a = first.tile_tag("ref=E45");
    first.way(&FeatureBuilder::new().tags(&[a]).ring(&SQUARE));
    let mut second = TileBuilder::new();
    let b = second.tile_tag("ref=E45");
    second.way(&FeatureBuilder::new().tags(&[b]).ring(&SQUARE));

    let t1 = decode_tile_bytes(&decoder, first.as_bytes()).unwrap();
    let t2 = decode_tile_bytes(&decoder, second.as_bytes()).unwrap();
    assert!(Arc::ptr_eq(&t1.elements[0].tags[0], &t2.elements[0].tags[0]));
}
