use crate::tag::{TagKind, TagState};

/// One renderable unit of output: a word, a synthetic paragraph boundary
/// (a single space), or a line boundary (`"\n"`).
///
/// Markers appear in discovery order, not display order; the renderer sorts
/// them by offset before splicing tags in.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub content: String,
    pub markers: Vec<TagMarker>,
}

impl Token {
    pub fn literal(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            markers: Vec::new(),
        }
    }
}

/// A resolved open or close instruction anchored inside a word.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TagMarker {
    pub kind: TagKind,
    pub state: TagState,
    /// Character offset within the owning word where the delimiter begins.
    pub offset: usize,
}
