use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Kinds of markup the dialect can attach to a word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TagKind {
    /// A `#` standing alone as the first word of a line. The matcher only
    /// ever opens a header; nothing closes it.
    Header,
    /// `__` delimiter, two characters wide.
    Bold,
    /// `_` delimiter, one character wide.
    Italic,
    /// Synthetic paragraph wrapper emitted around every line.
    Span,
}

impl TagKind {
    /// Number of characters the delimiter occupies inside its word.
    pub fn delimiter_width(self) -> usize {
        match self {
            TagKind::Bold => 2,
            TagKind::Header | TagKind::Italic | TagKind::Span => 1,
        }
    }
}

/// Final resolution of a marker. Delimiters that never resolve are dropped
/// before tokens leave the parser, so only these two states are public.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagState {
    Open,
    Close,
}

/// HTML element and markdown spelling for one tag kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagDef {
    pub html_element: &'static str,
    pub markdown_symbol: &'static str,
}

/// Read-only lookup from tag kind to its definition, injected into the
/// renderer. A kind missing from the table renders no markup at all.
#[derive(Clone, Debug, Default)]
pub struct TagTable {
    defs: HashMap<TagKind, TagDef>,
}

impl TagTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table used by the convenience converters: `b`, `i`, `span` and
    /// an unclosed `h1` for header lines.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.insert(
            TagKind::Bold,
            TagDef {
                html_element: "b",
                markdown_symbol: "__",
            },
        );
        table.insert(
            TagKind::Italic,
            TagDef {
                html_element: "i",
                markdown_symbol: "_",
            },
        );
        table.insert(
            TagKind::Span,
            TagDef {
                html_element: "span",
                markdown_symbol: "",
            },
        );
        table.insert(
            TagKind::Header,
            TagDef {
                html_element: "h1",
                markdown_symbol: "#",
            },
        );
        table
    }

    pub fn insert(&mut self, kind: TagKind, def: TagDef) {
        self.defs.insert(kind, def);
    }

    pub fn html_element(&self, kind: TagKind) -> Option<&str> {
        self.defs.get(&kind).map(|def| def.html_element)
    }

    pub fn markdown_symbol(&self, kind: TagKind) -> Option<&str> {
        self.defs.get(&kind).map(|def| def.markdown_symbol)
    }
}

pub(crate) static STANDARD_TAGS: Lazy<TagTable> = Lazy::new(TagTable::standard);
