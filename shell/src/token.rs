//! Whitespace tokenization and value-grouping for raw input lines.
//!
//! A line is split on runs of whitespace into plain tokens. Grouping of
//! quoted strings and bracketed JSON literals is driven by the resolver,
//! because those rules only activate while a field is awaiting a value;
//! the queue exposes the accumulation loops, the resolver decides when to
//! invoke them.

use std::collections::VecDeque;

/// Splits a line on whitespace runs, discarding empty tokens.
pub fn split_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Token stream over one input line.
#[derive(Debug, Clone)]
pub struct TokenQueue {
    tokens: VecDeque<String>,
}

impl TokenQueue {
    /// Tokenizes a line.
    pub fn new(line: &str) -> Self {
        Self {
            tokens: split_line(line).into(),
        }
    }

    /// Takes the next token.
    pub fn next(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }

    /// Whether the stream is exhausted.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Accumulates a quoted value starting at `first`.
    ///
    /// Quote characters are stripped from every collected token and the
    /// parts are space-joined. When `first` contains exactly two quote
    /// characters the value closes immediately; otherwise tokens are
    /// consumed until one containing the quote character appears (or the
    /// line ends).
    pub fn collect_quoted(&mut self, first: &str, quote: char) -> String {
        let mut parts = vec![strip_char(first, quote)];
        if first.matches(quote).count() != 2 {
            while let Some(token) = self.next() {
                let closes = token.contains(quote);
                parts.push(strip_char(&token, quote));
                if closes {
                    break;
                }
            }
        }
        parts.join(" ")
    }

    /// Accumulates a bracketed literal starting at `first`.
    ///
    /// Tokens are space-joined with brackets intact until one ends with
    /// `close`; the result is passed downstream as a raw candidate-JSON
    /// string. A first token that already ends with `close` (and is more
    /// than the opening bracket) closes immediately.
    pub fn collect_bracketed(&mut self, first: &str, close: char) -> String {
        let mut parts = vec![first.to_string()];
        if !(first.len() > 1 && first.ends_with(close)) {
            while let Some(token) = self.next() {
                let closes = token.ends_with(close);
                parts.push(token);
                if closes {
                    break;
                }
            }
        }
        parts.join(" ")
    }
}

fn strip_char(token: &str, ch: char) -> String {
    token.chars().filter(|c| *c != ch).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_discards_empty_tokens() {
        assert_eq!(split_line("  a   b  "), vec!["a", "b"]);
        assert!(split_line("   ").is_empty());
    }

    #[test]
    fn test_quoted_single_token() {
        let mut q = TokenQueue::new("rest");
        assert_eq!(q.collect_quoted("\"nrp1\"", '"'), "nrp1");
        // the following token was not consumed
        assert_eq!(q.next().as_deref(), Some("rest"));
    }

    #[test]
    fn test_quoted_multi_token() {
        let mut q = TokenQueue::new("b c\" tail");
        assert_eq!(q.collect_quoted("\"a", '"'), "a b c");
        assert_eq!(q.next().as_deref(), Some("tail"));
    }

    #[test]
    fn test_quoted_unterminated_runs_to_end() {
        let mut q = TokenQueue::new("b c");
        assert_eq!(q.collect_quoted("\"a", '"'), "a b c");
        assert!(q.is_empty());
    }

    #[test]
    fn test_single_quotes_follow_same_rules() {
        let mut q = TokenQueue::new("b' tail");
        assert_eq!(q.collect_quoted("'a", '\''), "a b");
        assert_eq!(q.next().as_deref(), Some("tail"));
    }

    #[test]
    fn test_bracketed_object() {
        let mut q = TokenQueue::new("{\"a\": 1, \"b\": [ 2 ] } tail");
        let first = q.next().unwrap();
        let value = q.collect_bracketed(&first, '}');
        assert_eq!(value, "{\"a\": 1, \"b\": [ 2 ] }");
        assert_eq!(q.next().as_deref(), Some("tail"));
    }

    #[test]
    fn test_bracketed_single_token_closes_immediately() {
        let mut q = TokenQueue::new("tail");
        assert_eq!(q.collect_bracketed("{\"a\":1}", '}'), "{\"a\":1}");
        assert_eq!(q.next().as_deref(), Some("tail"));
    }

    #[test]
    fn test_bracketed_list() {
        let mut q = TokenQueue::new("1, 2 ] tail");
        assert_eq!(q.collect_bracketed("[", ']'), "[ 1, 2 ]");
        assert_eq!(q.next().as_deref(), Some("tail"));
    }

    #[test]
    fn test_pipe_inside_quotes_is_literal() {
        // grouping consumes the pipe before segmentation can see it
        let mut q = TokenQueue::new("b | c\" tail");
        assert_eq!(q.collect_quoted("\"a", '"'), "a b | c");
        assert_eq!(q.next().as_deref(), Some("tail"));
    }
}
