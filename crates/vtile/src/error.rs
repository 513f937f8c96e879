use std::io;
use thiserror::Error;

/// Everything that can go wrong while decoding a tile body.
///
/// Errors split into two classes. Feature-local errors drop a single way,
/// polygon or node and decoding continues with the next sibling field; every
/// other error aborts the whole tile. See [`DecodeError::is_feature_local`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A varint ran past five bytes.
    #[error("malformed varint")]
    MalformedVarint,

    /// A single field asked for more contiguous bytes than the read buffer holds.
    #[error("requested {requested} bytes but read buffer holds at most {capacity}")]
    RequestedSizeTooLarge { requested: usize, capacity: usize },

    /// The stream or the declared content length ended mid-field.
    #[error("unexpected end of tile data: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Declared and decoded tag/index/coordinate counts disagree.
    #[error("{field} count mismatch: declared {declared}, decoded {decoded}")]
    FeatureCountMismatch {
        field: &'static str,
        declared: usize,
        decoded: usize,
    },

    /// A tag index resolves to neither the static nor the tile's dynamic table.
    #[error("tag index {index} out of range")]
    InvalidTagIndex { index: u32 },

    #[error("invalid tag string {0:?}")]
    InvalidTagString(String),

    /// A field tag the decoder does not know and cannot skip safely.
    #[error("unknown field tag {tag} with wire type {wire_type}")]
    UnknownFieldTag { tag: u32, wire_type: u32 },

    /// A sub-field ran past the end of its enclosing message.
    #[error("field overran its message: position {position}, end {end}")]
    LengthOverrun { position: usize, end: usize },

    #[error("tile string is not valid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// True when the error only invalidates the feature being decoded.
    pub fn is_feature_local(&self) -> bool {
        matches!(
            self,
            DecodeError::FeatureCountMismatch { .. }
                | DecodeError::InvalidTagIndex { .. }
                | DecodeError::UnknownFieldTag { .. }
        )
    }
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;
