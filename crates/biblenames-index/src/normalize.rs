//! Case, whitespace and punctuation folding shared by index build and lookup.

use unicode_normalization::UnicodeNormalization;

/// Punctuation dropped from tokens unless a locale overrides it.
pub const DEFAULT_STRIP_CHARS: &str = ".,:;'’‘`\"()[]-–—·";

/// How runs of whitespace inside a token are folded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WhitespacePolicy {
    /// Drop all whitespace, so "1 Cor" and "1Cor" share a key.
    #[default]
    Remove,
    /// Keep word boundaries as a single space.
    Collapse,
}

/// Per-locale folding and leader-matching rules.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocaleRules {
    pub whitespace: WhitespacePolicy,
    pub strip_chars: String,
    /// Also match leaders glued to the following word ("1Kor").
    pub glued_leaders: bool,
}

impl Default for LocaleRules {
    fn default() -> Self {
        Self {
            whitespace: WhitespacePolicy::Remove,
            strip_chars: DEFAULT_STRIP_CHARS.to_string(),
            glued_leaders: false,
        }
    }
}

impl LocaleRules {
    /// Fold `raw` into an index key. The result has no leading or trailing
    /// whitespace and may be empty.
    pub fn normalize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut pending_space = false;
        for ch in raw.nfc().flat_map(char::to_lowercase) {
            if ch.is_whitespace() {
                pending_space = true;
                continue;
            }
            if self.strip_chars.contains(ch) {
                continue;
            }
            if pending_space && !out.is_empty() && self.whitespace == WhitespacePolicy::Collapse {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_case_whitespace_and_punctuation() {
        let rules = LocaleRules::default();
        assert_eq!(rules.normalize("  1 Corinthians "), "1corinthians");
        assert_eq!(rules.normalize("1Cor."), "1cor");
        assert_eq!(rules.normalize("Song of\tSongs"), "songofsongs");
        assert_eq!(rules.normalize("1-я Царств"), "1яцарств");
        assert_eq!(rules.normalize(" . "), "");
    }

    #[test]
    fn collapse_keeps_single_spaces() {
        let rules = LocaleRules {
            whitespace: WhitespacePolicy::Collapse,
            ..LocaleRules::default()
        };
        assert_eq!(rules.normalize("  Song   of Songs  "), "song of songs");
        assert_eq!(rules.normalize("1 . Cor"), "1 cor");
    }

    #[test]
    fn composes_before_comparing() {
        let rules = LocaleRules::default();
        // "e" + combining acute vs precomposed "é".
        assert_eq!(rules.normalize("Ge\u{301}nese"), rules.normalize("Génese"));
        assert_eq!(rules.normalize("ÉPHÉSIENS"), "éphésiens");
        // Decomposed capitals compose first, then fold to the precomposed lowercase.
        assert_eq!(rules.normalize("E\u{301}PHE\u{301}SIENS"), "\u{e9}ph\u{e9}siens");
    }

    #[test]
    fn custom_strip_set() {
        let rules = LocaleRules {
            strip_chars: ".".into(),
            ..LocaleRules::default()
        };
        assert_eq!(rules.normalize("Phil-m."), "phil-m");
    }
}
