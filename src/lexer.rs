//! Lexical analysis for the interpreter: a bounded whitespace tokenizer.

/// Split a command line into at most `max_tokens` whitespace-delimited tokens.
///
/// Separators are space, tab and newline. Empty fields are skipped, so an
/// empty or all-whitespace line yields no tokens and repeated separators
/// never produce empty tokens. Tokens past the cap are silently dropped.
pub fn split_into_tokens(line: &str, max_tokens: usize) -> Vec<String> {
    line.split([' ', '\t', '\n'])
        .filter(|token| !token.is_empty())
        .take(max_tokens)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::split_into_tokens;

    #[test]
    fn test_empty_line_yields_no_tokens() {
        assert!(split_into_tokens("", 64).is_empty());
    }

    #[test]
    fn test_whitespace_only_line_yields_no_tokens() {
        assert!(split_into_tokens("  \t \n \t\t ", 64).is_empty());
    }

    #[test]
    fn test_tokens_keep_their_order() {
        let tokens = split_into_tokens("ls -l /tmp", 64);
        assert_eq!(tokens, vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn test_repeated_separators_collapse() {
        let tokens = split_into_tokens("a\t\t  b \n c", 64);
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokens_past_the_cap_are_dropped() {
        let tokens = split_into_tokens("a b c d e", 3);
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cap_equal_to_token_count_keeps_everything() {
        let tokens = split_into_tokens("a b c", 3);
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }
}
