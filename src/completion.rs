//! # Tab Completion
//!
//! Context-sensitive word completion over a caller-supplied vocabulary,
//! with deterministic cycling through alternatives on repeated invocation.
//!
//! The engine never sees keystrokes. It receives the raw input buffer and
//! returns the buffer to display; the "same buffer as last returned"
//! comparison is what turns a repeated completion key into a cycle step
//! without an explicit cycle signal from the editor.

/// Preview results are capped so ghost text never floods the screen.
pub const MAX_PREVIEW_COMPLETIONS: usize = 10;

/// Prefixes shorter than this return no preview; one-character prefixes
/// match too broadly to be useful as suggestions.
const MIN_PREVIEW_PREFIX: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CycleState {
    Idle,
    Cycling {
        /// Buffer string handed back by the last [`Completer::complete`]
        /// call. Cycling stays valid only while the editor re-submits
        /// exactly this string.
        output: String,
        matches: Vec<String>,
        index: usize,
    },
}

/// Stateful completion engine.
///
/// Candidates are ranked by ascending length and then lexicographically,
/// so the least specific word wins the first completion. State is
/// ephemeral; [`Completer::reset`] must be called on every edit that is
/// not itself a repeated completion, or stale matches would cycle on an
/// unrelated buffer.
#[derive(Debug, Clone)]
pub struct Completer {
    state: CycleState,
}

impl Completer {
    pub fn new() -> Self {
        Self {
            state: CycleState::Idle,
        }
    }

    /// Completes the last word of `input` against `words`.
    ///
    /// Returns the buffer to display. The input comes back unchanged when
    /// there is nothing to complete: no partial word, no candidate, or the
    /// partial word already matches a candidate exactly.
    ///
    /// Calling this again with the string it just returned advances
    /// through the remaining candidates, wrapping at the end.
    pub fn complete<S: AsRef<str>>(&mut self, input: &str, words: &[S]) -> String {
        let (prefix, partial) = split_last_word(input);
        if partial.is_empty() {
            return input.to_string();
        }

        if let CycleState::Cycling {
            output,
            matches,
            index,
        } = &mut self.state
        {
            if input == output && !matches.is_empty() {
                *index = (*index + 1) % matches.len();
                let next = format!("{}{}", prefix, matches[*index]);
                *output = next.clone();
                return next;
            }
        }

        let matches = matching_words(partial, words);
        if matches.is_empty() {
            return input.to_string();
        }

        let output = format!("{}{}", prefix, matches[0]);
        self.state = CycleState::Cycling {
            output: output.clone(),
            matches,
            index: 0,
        };
        output
    }

    /// Drops cached matches and cycle position.
    pub fn reset(&mut self) {
        self.state = CycleState::Idle;
    }

    /// Read-only candidate list for ghost-text display.
    ///
    /// Same matching and ordering as [`Completer::complete`], but requires
    /// a prefix of at least two characters and caps the result at
    /// [`MAX_PREVIEW_COMPLETIONS`]. Never touches cycling state.
    pub fn completions<S: AsRef<str>>(&self, prefix: &str, words: &[S]) -> Vec<String> {
        if prefix.chars().count() < MIN_PREVIEW_PREFIX {
            return Vec::new();
        }

        let mut matches = matching_words(prefix, words);
        matches.truncate(MAX_PREVIEW_COMPLETIONS);
        matches
    }
}

impl Default for Completer {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits the buffer at the last space into an immutable prefix (through
/// the space, or empty) and the partial word being completed. Trailing
/// whitespace is ignored.
fn split_last_word(input: &str) -> (&str, &str) {
    let trimmed = input.trim_end();
    match trimmed.rfind(' ') {
        Some(idx) => (&trimmed[..=idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    }
}

/// Case-insensitive prefix matches for `partial`, excluding words that
/// already equal it, sorted by length and then lexicographically.
fn matching_words<S: AsRef<str>>(partial: &str, words: &[S]) -> Vec<String> {
    let lower = partial.to_lowercase();
    let mut matches: Vec<String> = words
        .iter()
        .map(AsRef::as_ref)
        .filter(|word| {
            let lowered = word.to_lowercase();
            lowered.starts_with(&lower) && lowered != lower
        })
        .map(str::to_owned)
        .collect();

    matches.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    matches
}
