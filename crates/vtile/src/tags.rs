//! Two-tier tag resolution.
//!
//! A [`TagDictionary`] owns the compiled-in static table and an access-ordered
//! cache of dynamic tags parsed from tile strings. One dictionary is shared
//! (behind an `Arc`) by every decoder; the static half needs no locking, the
//! dynamic cache sits behind a single mutex.

use crate::error::{DecodeError, Result};
use crate::static_tags::STATIC_TAG_PAIRS;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Tag indices below this address the static table.
pub const STATIC_LIMIT: u32 = STATIC_TAG_PAIRS.len() as u32;

/// Tag indices at or above this address the tile's own tag strings.
pub const DYNAMIC_OFFSET: u32 = 1024;

const _: () = assert!(STATIC_TAG_PAIRS.len() <= DYNAMIC_OFFSET as usize);

pub const DYNAMIC_CACHE_CAPACITY: usize = 100;

pub const KEY_NAME: &str = "name";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: Arc<str>,
    pub value: Option<Arc<str>>,
    pub is_static: bool,
}

impl Tag {
    pub fn new(key: &str, value: Option<&str>) -> Self {
        Self {
            key: Arc::from(key),
            value: value.map(Arc::from),
            is_static: false,
        }
    }

    /// Split a raw `key=value` string. A string without `=` is a bare key.
    pub fn split(raw: &str) -> Result<(&str, Option<&str>)> {
        let (key, value) = match raw.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (raw, None),
        };
        if key.is_empty() {
            return Err(DecodeError::InvalidTagString(raw.to_owned()));
        }
        Ok((key, value))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.key, v),
            None => f.write_str(&self.key),
        }
    }
}

/// Name values are high-cardinality; they collapse into one generalized name
/// tag and are never cached.
#[inline]
fn is_name_key(key: &str) -> bool {
    key == KEY_NAME || key.starts_with("name:")
}

pub struct TagDictionary {
    static_tags: Vec<Arc<Tag>>,
    static_lookup: HashMap<(&'static str, &'static str), u32>,
    strings: HashMap<&'static str, Arc<str>>,
    name_tag: Arc<Tag>,
    dynamic: Mutex<LruCache<String, Arc<Tag>>>,
}

impl TagDictionary {
    pub fn new() -> Self {
        Self::with_cache_capacity(DYNAMIC_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        let mut strings: HashMap<&'static str, Arc<str>> = HashMap::new();
        let mut shared = |s: &'static str| strings.entry(s).or_insert_with(|| Arc::from(s)).clone();

        let static_tags: Vec<Arc<Tag>> = STATIC_TAG_PAIRS
            .iter()
            .map(|&(k, v)| {
                Arc::new(Tag {
                    key: shared(k),
                    value: Some(shared(v)),
                    is_static: true,
                })
            })
            .collect();

        let static_lookup = STATIC_TAG_PAIRS
            .iter()
            .enumerate()
            .map(|(i, &pair)| (pair, i as u32))
            .collect();

        let name_tag = Arc::new(Tag {
            key: shared(KEY_NAME),
            value: None,
            is_static: false,
        });

        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            static_tags,
            static_lookup,
            strings,
            name_tag,
            dynamic: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Wire index of a static `(key, value)` pair, if the table has one.
    pub fn static_index(&self, key: &str, value: &str) -> Option<u32> {
        let lookup: &HashMap<(&str, &str), u32> = &self.static_lookup;
        lookup.get(&(key, value)).copied()
    }

    /// Resolve a wire tag index against the static table or `dynamic`, the
    /// tag strings declared earlier in the same tile.
    pub fn resolve(&self, index: u32, dynamic: &[Arc<Tag>]) -> Result<Arc<Tag>> {
        let found = if index < STATIC_LIMIT {
            self.static_tags.get(index as usize)
        } else if index >= DYNAMIC_OFFSET {
            dynamic.get((index - DYNAMIC_OFFSET) as usize)
        } else {
            None
        };
        found
            .cloned()
            .ok_or(DecodeError::InvalidTagIndex { index })
    }

    /// Turn a tile tag string into a shared tag.
    ///
    /// Cache hits promote the entry and return the cached instance. `name`
    /// and `name:*` strings all map to the value-less [`KEY_NAME`] tag.
    pub fn intern_dynamic(&self, raw: &str) -> Result<Arc<Tag>> {
        let (key, value) = Tag::split(raw)?;

        if is_name_key(key) {
            return Ok(self.name_tag.clone());
        }

        let mut cache = self.dynamic.lock();
        if let Some(tag) = cache.get(raw) {
            return Ok(tag.clone());
        }

        let tag = Arc::new(Tag {
            key: self.shared_str(key),
            value: value.map(|v| self.shared_str(v)),
            is_static: false,
        });
        if let Some((evicted, _)) = cache.push(raw.to_owned(), tag.clone()) {
            tracing::trace!(evicted = %evicted, "dynamic tag evicted");
        }
        Ok(tag)
    }

    /// Number of dynamic tags currently cached.
    pub fn cached_len(&self) -> usize {
        self.dynamic.lock().len()
    }

    /// Cache membership without touching recency.
    pub fn is_cached(&self, raw: &str) -> bool {
        self.dynamic.lock().contains(raw)
    }

    fn shared_str(&self, s: &str) -> Arc<str> {
        self.strings.get(s).cloned().unwrap_or_else(|| Arc::from(s))
    }
}

impl Default for TagDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDictionary")
            .field("static_len", &self.static_tags.len())
            .field("cached", &self.cached_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_lookups_share_one_instance() {
        let dict = TagDictionary::new();
        let a = dict.resolve(0, &[]).unwrap();
        let b = dict.resolve(0, &[]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_static);
        assert_eq!(a.to_string(), "highway=motorway");

        let idx = dict.static_index("building", "yes").unwrap();
        assert_eq!(&*dict.resolve(idx, &[]).unwrap().key, "building");
    }

    #[test]
    fn dynamic_indices_start_at_the_offset() {
        let dict = TagDictionary::new();
        let local = vec![
            dict.intern_dynamic("ref=A7").unwrap(),
            dict.intern_dynamic("height=12").unwrap(),
        ];
        let t = dict.resolve(DYNAMIC_OFFSET + 1, &local).unwrap();
        assert_eq!(t.to_string(), "height=12");
        assert!(!t.is_static);
    }

    #[test]
    fn out_of_range_indices_are_feature_local_errors() {
        let dict = TagDictionary::new();
        for index in [STATIC_LIMIT, DYNAMIC_OFFSET - 1, DYNAMIC_OFFSET] {
            let err = dict.resolve(index, &[]).unwrap_err();
            assert!(matches!(err, DecodeError::InvalidTagIndex { .. }));
            assert!(err.is_feature_local());
        }
    }

    #[test]
    fn cache_hit_returns_the_same_tag() {
        let dict = TagDictionary::new();
        let a = dict.intern_dynamic("ref=B12").unwrap();
        let b = dict.intern_dynamic("ref=B12").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(dict.cached_len(), 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let dict = TagDictionary::new();
        for i in 0..DYNAMIC_CACHE_CAPACITY {
            dict.intern_dynamic(&format!("ref={i}")).unwrap();
        }
        // Promote the oldest entry so "ref=1" becomes the eviction candidate.
        let first = dict.intern_dynamic("ref=0").unwrap();

        dict.intern_dynamic("ref=new").unwrap();

        assert_eq!(dict.cached_len(), DYNAMIC_CACHE_CAPACITY);
        assert!(dict.is_cached("ref=0"));
        assert!(!dict.is_cached("ref=1"));
        assert!(Arc::ptr_eq(&first, &dict.intern_dynamic("ref=0").unwrap()));
    }

    #[test]
    fn names_collapse_into_the_generalized_name_tag() {
        let dict = TagDictionary::new();
        let a = dict.intern_dynamic("name=Main Street").unwrap();
        let b = dict.intern_dynamic("name:de=Hauptstrasse").unwrap();
        assert_eq!(&*a.key, KEY_NAME);
        assert_eq!(a.value, None);
        assert_eq!(&*b.key, KEY_NAME);
        assert_eq!(b.value, None);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(dict.cached_len(), 0);
        assert!(!dict.is_cached("name=Main Street"));

        // Only the `name:` prefix counts, not any key starting with "name".
        let other = dict.intern_dynamic("names=x").unwrap();
        assert_eq!(other.value.as_deref(), Some("x"));
        assert_eq!(dict.cached_len(), 1);
    }

    #[test]
    fn dynamic_tags_reuse_static_strings() {
        let dict = TagDictionary::new();
        let t = dict.intern_dynamic("highway=rest_area").unwrap();
        let s = dict.resolve(0, &[]).unwrap();
        assert!(Arc::ptr_eq(&t.key, &s.key));
    }

    #[test]
    fn bare_keys_and_empty_keys() {
        let dict = TagDictionary::new();
        assert_eq!(dict.intern_dynamic("oneway").unwrap().value, None);
        assert!(matches!(
            dict.intern_dynamic("=x"),
            Err(DecodeError::InvalidTagString(_))
        ));
        assert!(dict.intern_dynamic("").is_err());
    }
}
