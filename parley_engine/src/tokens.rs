//! Turning a line of player text into word tokens.

/// Token produced for a comma in the input.
pub const COMMA: &str = "comma";

/// Token produced for a full stop; it ends the current command like THEN.
pub const FULL_STOP: &str = "then";

/// One word of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// True for a double-quoted run, which is kept as a single token with its case intact.
    pub quoted: bool,
    /// 0 for text typed by the player, higher for sentences issued by handlers.
    pub depth: usize,
}

/// The tokens of one input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<Token>,
}

impl Tokens {
    /// Tokenize text typed by the player.
    pub fn tokenize(line: &str) -> Self {
        Self::tokenize_at(line, 0)
    }

    /// Tokenize text at a given indirection depth.
    pub fn tokenize_at(line: &str, depth: usize) -> Self {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = line.chars();

        let flush = |current: &mut String, tokens: &mut Vec<Token>| {
            if !current.is_empty() {
                tokens.push(Token {
                    text: current.to_lowercase(),
                    quoted: false,
                    depth,
                });
                current.clear();
            }
        };

        while let Some(ch) = chars.next() {
            match ch {
                '"' => {
                    flush(&mut current, &mut tokens);
                    let quoted: String = chars.by_ref().take_while(|c| *c != '"').collect();
                    tokens.push(Token {
                        text: quoted,
                        quoted: true,
                        depth,
                    });
                },
                ',' | '.' => {
                    flush(&mut current, &mut tokens);
                    tokens.push(Token {
                        text: if ch == ',' { COMMA } else { FULL_STOP }.to_string(),
                        quoted: false,
                        depth,
                    });
                },
                c if c.is_whitespace() => flush(&mut current, &mut tokens),
                c => current.push(c),
            }
        }
        flush(&mut current, &mut tokens);

        // a trailing full stop ends nothing
        if tokens.last().is_some_and(|tok| !tok.quoted && tok.text == FULL_STOP) {
            tokens.pop();
        }
        Self { tokens }
    }

    /// Drop unquoted filler words such as articles.
    #[must_use]
    pub fn without_words(mut self, ignore: &[String]) -> Self {
        self.tokens
            .retain(|tok| tok.quoted || !ignore.iter().any(|word| *word == tok.text));
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Text of the token at `index`, or `None` past the end.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(|tok| tok.text.as_str())
    }

    /// Words from `start` up to (not including) `end`, joined by spaces.
    pub fn phrase(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start >= end {
            return String::new();
        }
        self.tokens[start..end]
            .iter()
            .map(|tok| tok.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Value of a word that is written as an integer.
pub fn integer_value(word: &str) -> Option<i64> {
    word.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &Tokens) -> Vec<&str> {
        (0..tokens.len()).filter_map(|i| tokens.word(i)).collect()
    }

    #[test]
    fn lowercases_and_splits_on_whitespace() {
        let tokens = Tokens::tokenize("  Take   the LAMP ");
        assert_eq!(texts(&tokens), vec!["take", "the", "lamp"]);
    }

    #[test]
    fn commas_become_their_own_token() {
        let tokens = Tokens::tokenize("take cup,plate, lamp");
        assert_eq!(texts(&tokens), vec!["take", "cup", COMMA, "plate", COMMA, "lamp"]);
    }

    #[test]
    fn full_stop_separates_commands_but_trailing_one_is_dropped() {
        let tokens = Tokens::tokenize("take cup. drop it.");
        assert_eq!(texts(&tokens), vec!["take", "cup", FULL_STOP, "drop", "it"]);
    }

    #[test]
    fn quoted_run_is_a_single_token() {
        let tokens = Tokens::tokenize("say \"Hello There\" to bob");
        assert_eq!(tokens.len(), 4);
        let quoted = tokens.get(1).unwrap();
        assert!(quoted.quoted);
        assert_eq!(quoted.text, "Hello There");
        assert_eq!(tokens.word(3), Some("bob"));
    }

    #[test]
    fn depth_is_recorded_on_every_token() {
        let tokens = Tokens::tokenize_at("look around", 2);
        assert!((0..tokens.len()).all(|i| tokens.get(i).unwrap().depth == 2));
    }

    #[test]
    fn filler_words_are_removed_unless_quoted() {
        let ignore = vec!["the".to_string(), "a".to_string()];
        let tokens = Tokens::tokenize("put the cup on a \"the\"").without_words(&ignore);
        assert_eq!(texts(&tokens), vec!["put", "cup", "on", "the"]);
    }

    #[test]
    fn phrase_joins_a_range() {
        let tokens = Tokens::tokenize("take the red ball");
        assert_eq!(tokens.phrase(1, 4), "the red ball");
        assert_eq!(tokens.phrase(3, 9), "ball");
        assert_eq!(tokens.phrase(4, 2), "");
    }
}
