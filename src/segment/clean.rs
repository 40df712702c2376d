//! Caption text normalization.

/// Filler words dropped by default.
pub const DEFAULT_FILLER_WORDS: &[&str] = &["uh", "um"];

/// Normalizes caption text: trims, collapses whitespace and drops bare filler tokens.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    fillers: Vec<String>,
}

impl TextCleaner {
    /// Create a cleaner with the given filler stoplist (matched case-insensitively).
    pub fn new<S: AsRef<str>>(fillers: &[S]) -> Self {
        Self {
            fillers: fillers
                .iter()
                .map(|f| f.as_ref().trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    /// Clean a piece of caption text.
    ///
    /// A filler followed only by punctuation (`um.`) is removed and its punctuation is
    /// carried onto the preceding word, unless that word already ends in punctuation.
    pub fn clean(&self, text: &str) -> String {
        let mut words: Vec<String> = Vec::new();

        for token in text.split_whitespace() {
            let bare = token.trim_end_matches(is_trailing_punct);
            if !self.is_filler(bare) {
                words.push(token.to_string());
                continue;
            }

            let punct = &token[bare.len()..];
            if punct.is_empty() {
                continue;
            }
            if let Some(prev) = words.last_mut() {
                if !prev.ends_with(is_trailing_punct) {
                    prev.push_str(punct);
                }
            }
        }

        words.join(" ")
    }

    fn is_filler(&self, word: &str) -> bool {
        !word.is_empty() && self.fillers.iter().any(|f| f.eq_ignore_ascii_case(word))
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_FILLER_WORDS)
    }
}

fn is_trailing_punct(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ';' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean("  hello \n\t  world  "), "hello world");
        assert_eq!(cleaner.clean("   "), "");
    }

    #[test]
    fn test_drops_fillers() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean("so uh this is um the point"), "so this is the point");
        assert_eq!(cleaner.clean("Uh UM uh"), "");
        // Only whole tokens are fillers.
        assert_eq!(cleaner.clean("umbrella uhura"), "umbrella uhura");
    }

    #[test]
    fn test_filler_punctuation_moves_to_previous_word() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean("that is it um."), "that is it.");
        assert_eq!(cleaner.clean("first, um, second"), "first, second");
        assert_eq!(cleaner.clean("um. start"), "start");
    }

    #[test]
    fn test_custom_stoplist() {
        let cleaner = TextCleaner::new(&["like", "you know"]);
        assert_eq!(cleaner.clean("it was like fast"), "it was fast");
        // Multi-word entries never match a single token.
        assert_eq!(cleaner.clean("you know"), "you know");
        assert_eq!(cleaner.clean("uh"), "uh");
    }
}
