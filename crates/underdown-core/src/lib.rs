mod emit;
mod parser;
mod tag;
mod token;

pub use emit::{convert_to_html, convert_to_html_sanitized, render};
pub use parser::parse;
pub use tag::{TagDef, TagKind, TagState, TagTable};
pub use token::{TagMarker, Token};
