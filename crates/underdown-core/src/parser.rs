use crate::tag::{TagKind, TagState};
use crate::token::{TagMarker, Token};

/// Parses a document into its token stream.
///
/// Matching is line-scoped: the delimiter stack is cleared at every `\n`,
/// so emphasis never pairs across lines. Malformed delimiter usage is not
/// an error; anything that fails to pair stays literal text.
pub fn parse(source: &str) -> Vec<Token> {
    if source.is_empty() {
        return Vec::new();
    }

    let mut matcher = Matcher::new();
    for line in source.split('\n') {
        matcher.open_paragraph();
        for (index, word) in line.split(' ').enumerate() {
            matcher.process_word(word, index);
        }
        matcher.close_paragraph();
        matcher.stack.clear();
        matcher.push_newline();
    }
    matcher.finish()
}

/// Handle into the marker arena. Pairing links markers by id so either side
/// of a pair can be invalidated with a plain field write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct MarkerId(usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MarkerState {
    /// Delimiter at offset 0; may open across words.
    ProvisionalOpen,
    /// Mid-word opener; only a close from the same word may pair with it.
    ProvisionalOpenInWord,
    /// Classification of a delimiter about to search the stack. Never
    /// stored in the arena; a successful search stores `Close` directly.
    ProvisionalClose,
    Open,
    Close,
    /// Pairing succeeded but the pair straddles a bold boundary; neither
    /// side is surfaced.
    Invalidated,
}

struct Marker {
    kind: TagKind,
    state: MarkerState,
    offset: usize,
    /// Word text at detection time, used to tell same-kind in-word openers
    /// from different words apart during the stack search.
    source_word: String,
    paired_with: Option<MarkerId>,
}

struct RawToken {
    content: String,
    markers: Vec<MarkerId>,
}

struct Matcher {
    arena: Vec<Marker>,
    stack: Vec<MarkerId>,
    tokens: Vec<RawToken>,
}

impl Matcher {
    fn new() -> Self {
        Self {
            arena: Vec::new(),
            stack: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn marker(&self, id: MarkerId) -> &Marker {
        &self.arena[id.0]
    }

    fn alloc(&mut self, kind: TagKind, state: MarkerState, offset: usize, word: &str) -> MarkerId {
        let id = MarkerId(self.arena.len());
        self.arena.push(Marker {
            kind,
            state,
            offset,
            source_word: word.to_string(),
            paired_with: None,
        });
        id
    }

    fn open_paragraph(&mut self) {
        let id = self.alloc(TagKind::Span, MarkerState::Open, 0, "");
        self.tokens.push(RawToken {
            content: " ".to_string(),
            markers: vec![id],
        });
    }

    fn close_paragraph(&mut self) {
        let id = self.alloc(TagKind::Span, MarkerState::Close, 0, "");
        self.tokens.push(RawToken {
            content: " ".to_string(),
            markers: vec![id],
        });
    }

    fn push_newline(&mut self) {
        self.tokens.push(RawToken {
            content: "\n".to_string(),
            markers: Vec::new(),
        });
    }

    fn process_word(&mut self, word: &str, word_index: usize) {
        let mut token = RawToken {
            content: word.to_string(),
            markers: Vec::new(),
        };

        if word_index == 0 && word == "#" {
            let id = self.alloc(TagKind::Header, MarkerState::Open, 0, word);
            token.markers.push(id);
        }

        // Bare delimiter runs and empty words never carry tags.
        if matches!(word, "" | " " | "__" | "____") {
            self.tokens.push(token);
            return;
        }

        let chars: Vec<char> = word.chars().collect();

        if chars.iter().any(|ch| ch.is_ascii_digit()) {
            // Numerals suppress mid-word emphasis: only the first and the
            // last one or two characters are eligible, with the two-wide
            // bold position tried before the final character.
            self.scan_at(&chars, 0, word, &mut token);
            match chars.len().checked_sub(2) {
                Some(second_last)
                    if self.scan_at(&chars, second_last, word, &mut token).is_some() => {}
                _ => {
                    self.scan_at(&chars, chars.len() - 1, word, &mut token);
                }
            }
            self.tokens.push(token);
            return;
        }

        let mut i = 0;
        while i < chars.len() {
            if self.scan_at(&chars, i, word, &mut token) == Some(TagKind::Bold) {
                // The second underscore of a bold run must not be re-read
                // as an italic delimiter.
                i += 1;
            }
            i += 1;
        }
        self.tokens.push(token);
    }

    /// Scans one offset: recognizes a delimiter, classifies it, and runs it
    /// through the stack. Returns the recognized kind whether or not a
    /// marker ended up attached.
    fn scan_at(
        &mut self,
        chars: &[char],
        index: usize,
        word: &str,
        token: &mut RawToken,
    ) -> Option<TagKind> {
        let kind = recognize(chars, index)?;
        let state = self.determine_state(chars, kind, index, token);
        if let Some(id) = self.handle_stack(kind, state, index, word) {
            token.markers.push(id);
        }
        Some(kind)
    }

    /// Boundary rules win over parity: a delimiter at offset 0 is always an
    /// opener, the last (italic) or second-to-last (bold) offset is always
    /// a closer.
    fn determine_state(
        &self,
        chars: &[char],
        kind: TagKind,
        index: usize,
        token: &RawToken,
    ) -> MarkerState {
        if index == 0 {
            return MarkerState::ProvisionalOpen;
        }
        if kind == TagKind::Italic && index == chars.len() - 1 {
            return MarkerState::ProvisionalClose;
        }
        if kind == TagKind::Bold && index == chars.len() - 2 {
            return MarkerState::ProvisionalClose;
        }

        let same_kind = token
            .markers
            .iter()
            .filter(|id| self.marker(**id).kind == kind)
            .count();
        if same_kind % 2 == 0 {
            MarkerState::ProvisionalOpenInWord
        } else {
            MarkerState::ProvisionalClose
        }
    }

    fn handle_stack(
        &mut self,
        kind: TagKind,
        state: MarkerState,
        offset: usize,
        word: &str,
    ) -> Option<MarkerId> {
        match state {
            MarkerState::ProvisionalOpen | MarkerState::ProvisionalOpenInWord => {
                let id = self.alloc(kind, state, offset, word);
                self.stack.push(id);
                Some(id)
            }
            MarkerState::ProvisionalClose => self.resolve_close(kind, offset, word),
            MarkerState::Open | MarkerState::Close | MarkerState::Invalidated => None,
        }
    }

    /// Pops the stack looking for the nearest opener this close can pair
    /// with. Everything popped goes back in its original order whether or
    /// not a match was found; an unmatched close is simply discarded.
    fn resolve_close(&mut self, kind: TagKind, offset: usize, word: &str) -> Option<MarkerId> {
        let mut popped: Vec<MarkerId> = Vec::new();
        let mut matched: Option<MarkerId> = None;

        while let Some(id) = self.stack.pop() {
            let candidate = self.marker(id);
            let is_match = candidate.kind == kind
                && (candidate.state == MarkerState::ProvisionalOpen
                    || (candidate.state == MarkerState::ProvisionalOpenInWord
                        && candidate.source_word == word));
            popped.push(id);
            if is_match {
                matched = Some(id);
                break;
            }
        }

        // While re-pushing, remember the last closed bold marker an italic
        // resolution walks across.
        let mut intersection: Option<MarkerId> = None;
        for id in popped.iter().rev() {
            let walked = self.marker(*id);
            if kind == TagKind::Italic
                && matched.is_some()
                && walked.kind == TagKind::Bold
                && walked.state == MarkerState::Close
            {
                intersection = Some(*id);
            }
            self.stack.push(*id);
        }

        let opener = matched?;

        self.arena[opener.0].state = MarkerState::Open;
        let closer = self.alloc(kind, MarkerState::Close, offset, word);
        self.arena[closer.0].paired_with = Some(opener);
        self.arena[opener.0].paired_with = Some(closer);

        // An italic pair that opens after a bold opener but closes after
        // its close would emit overlapping tags. If the walked bold close
        // has its opener outside the walked range, drop the italic pair
        // and leave its underscores literal. A bold span fully nested in
        // the italic one has both sides inside the range and survives.
        if let Some(crossing) = intersection {
            let bold_opener = self.marker(crossing).paired_with;
            if bold_opener.is_none_or(|id| !popped.contains(&id)) {
                self.arena[opener.0].state = MarkerState::Invalidated;
                self.arena[closer.0].state = MarkerState::Invalidated;
            }
        }

        self.stack.push(closer);
        Some(closer)
    }

    /// Surfaces the final token stream. Provisional and invalidated markers
    /// never leave the matcher.
    fn finish(self) -> Vec<Token> {
        let Matcher { arena, tokens, .. } = self;
        tokens
            .into_iter()
            .map(|raw| Token {
                content: raw.content,
                markers: raw
                    .markers
                    .iter()
                    .filter_map(|id| {
                        let marker = &arena[id.0];
                        let state = match marker.state {
                            MarkerState::Open => TagState::Open,
                            MarkerState::Close => TagState::Close,
                            MarkerState::ProvisionalOpen
                            | MarkerState::ProvisionalOpenInWord
                            | MarkerState::ProvisionalClose
                            | MarkerState::Invalidated => return None,
                        };
                        Some(TagMarker {
                            kind: marker.kind,
                            state,
                            offset: marker.offset,
                        })
                    })
                    .collect(),
            })
            .collect()
    }
}

fn recognize(chars: &[char], index: usize) -> Option<TagKind> {
    if chars[index] != '_' {
        return None;
    }
    if chars.get(index + 1) == Some(&'_') {
        Some(TagKind::Bold)
    } else {
        Some(TagKind::Italic)
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::tag::{TagKind, TagState};

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn every_line_is_wrapped_in_a_span_pair() {
        let tokens = parse("one\ntwo");

        // Per line: span-open, word, span-close, newline.
        assert_eq!(tokens.len(), 8);
        for line in tokens.chunks(4) {
            assert_eq!(line[0].content, " ");
            assert_eq!(line[0].markers[0].kind, TagKind::Span);
            assert_eq!(line[0].markers[0].state, TagState::Open);
            assert_eq!(line[2].markers[0].kind, TagKind::Span);
            assert_eq!(line[2].markers[0].state, TagState::Close);
            assert_eq!(line[3].content, "\n");
        }
    }

    #[test]
    fn unmatched_opener_is_never_surfaced() {
        let tokens = parse("_hello");
        assert!(tokens[1].markers.is_empty());
    }

    #[test]
    fn lone_underscore_word_stays_literal() {
        let tokens = parse("_");
        assert_eq!(tokens[1].content, "_");
        assert!(tokens[1].markers.is_empty());
    }

    #[test]
    fn bare_delimiter_runs_stay_literal() {
        for word in ["__", "____"] {
            let tokens = parse(word);
            assert!(tokens[1].markers.is_empty(), "word {:?}", word);
        }
    }

    #[test]
    fn header_requires_first_word() {
        let tokens = parse("# x");
        assert_eq!(tokens[1].markers[0].kind, TagKind::Header);
        assert_eq!(tokens[1].markers[0].state, TagState::Open);

        let tokens = parse("x #");
        assert!(tokens[2].markers.is_empty());
    }

    #[test]
    fn italic_pairs_across_words() {
        let tokens = parse("_hello world_");
        let open = tokens[1].markers[0];
        let close = tokens[2].markers[0];
        assert_eq!((open.kind, open.state, open.offset), (TagKind::Italic, TagState::Open, 0));
        assert_eq!((close.kind, close.state, close.offset), (TagKind::Italic, TagState::Close, 5));
    }

    #[test]
    fn pairing_never_crosses_lines() {
        let tokens = parse("_hello\nworld_");
        for token in &tokens {
            assert!(
                token
                    .markers
                    .iter()
                    .all(|marker| marker.kind == TagKind::Span),
                "unexpected marker on {:?}",
                token.content
            );
        }
    }

    #[test]
    fn in_word_opener_only_matches_its_own_word() {
        // The mid-word opener in "a_b" may not be closed from "c_".
        let tokens = parse("a_b c_");
        assert!(tokens[1].markers.is_empty());
        assert!(tokens[2].markers.is_empty());
    }

    #[test]
    fn parity_alternates_within_a_word() {
        let tokens = parse("a_b_c");
        let markers = &tokens[1].markers;
        assert_eq!(markers.len(), 2);
        assert_eq!((markers[0].state, markers[0].offset), (TagState::Open, 1));
        assert_eq!((markers[1].state, markers[1].offset), (TagState::Close, 3));
    }

    #[test]
    fn boundary_close_rule_beats_parity() {
        // The final underscore of "_a_b_" finds no opener left and is
        // discarded; the inner pair resolved first.
        let tokens = parse("_a_b_");
        let markers = &tokens[1].markers;
        assert_eq!(markers.len(), 2);
        assert_eq!((markers[0].state, markers[0].offset), (TagState::Open, 0));
        assert_eq!((markers[1].state, markers[1].offset), (TagState::Close, 2));
    }

    #[test]
    fn digit_word_skips_interior_offsets() {
        let tokens = parse("a_1_b");
        assert!(tokens[1].markers.is_empty());
    }

    #[test]
    fn digit_word_still_scans_its_tail() {
        let tokens = parse("_1_");
        let markers = &tokens[1].markers;
        assert_eq!(markers.len(), 2);
        assert_eq!((markers[0].state, markers[0].offset), (TagState::Open, 0));
        assert_eq!((markers[1].state, markers[1].offset), (TagState::Close, 2));
    }

    #[test]
    fn failed_close_search_preserves_stack_order() {
        // The bold opener in "__b" is popped over while the italic pair
        // resolves, goes back in place, and the bold stays unmatched.
        let tokens = parse("_a __b c_");
        assert_eq!(tokens[1].markers[0].state, TagState::Open);
        assert!(tokens[2].markers.is_empty());
        assert_eq!(tokens[3].markers[0].state, TagState::Close);
    }

    #[test]
    fn bold_nested_in_italic_survives() {
        let tokens = parse("_a __b__ c_");
        assert_eq!(tokens[2].markers.len(), 2);
        assert_eq!(tokens[2].markers[0].kind, TagKind::Bold);
        assert_eq!(tokens[1].markers[0].kind, TagKind::Italic);
        assert_eq!(tokens[3].markers[0].kind, TagKind::Italic);
    }

    #[test]
    fn italic_straddling_a_bold_boundary_is_invalidated() {
        let tokens = parse("__a_b__c_");
        let markers = &tokens[1].markers;
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|marker| marker.kind == TagKind::Bold));
    }

    #[test]
    fn cyrillic_words_use_character_offsets() {
        let tokens = parse("_ёж_");
        let markers = &tokens[1].markers;
        assert_eq!((markers[0].state, markers[0].offset), (TagState::Open, 0));
        assert_eq!((markers[1].state, markers[1].offset), (TagState::Close, 3));
    }
}
