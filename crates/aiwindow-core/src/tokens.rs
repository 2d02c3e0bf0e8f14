//! Word-based token estimation
//!
//! No tokenizer is consulted. The estimate is the whitespace-separated word count
//! times a fixed factor, tuned for Cyrillic text where sub-word tokenization yields
//! more tokens per word than English. Its consumers are the compression trigger and
//! "≈N tokens" displays, neither of which needs an exact count.

use crate::core_types::ChatTurn;

/// Tokens per word for Russian text.
pub const TOKENS_PER_WORD: f64 = 1.3;

pub fn estimate_tokens(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    let word_count = text.split_whitespace().count();
    (word_count as f64 * TOKENS_PER_WORD) as usize
}

/// Uses the turn's cached estimate when present.
pub fn estimate_tokens_for_turn(turn: &ChatTurn) -> usize {
    turn.estimated_token_count
        .unwrap_or_else(|| estimate_tokens(&turn.text))
}

pub fn estimate_tokens_for_history(turns: &[ChatTurn]) -> usize {
    turns.iter().map(estimate_tokens_for_turn).sum()
}

/// Formats a count with thousands separators, e.g. `1234567` -> `"1,234,567"`.
pub fn format_token_count(tokens: usize) -> String {
    let digits = tokens.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   \n\t "), 0);
    }

    #[test]
    fn test_estimate_uses_word_factor() {
        // 10 words * 1.3 = 13
        assert_eq!(estimate_tokens("one two three four five six seven eight nine ten"), 13);
        // 1 word * 1.3 truncates to 1
        assert_eq!(estimate_tokens("привет"), 1);
    }

    #[test]
    fn test_whitespace_runs_count_once() {
        assert_eq!(
            estimate_tokens("  alpha\n\n  beta\t\tgamma  "),
            estimate_tokens("alpha beta gamma")
        );
    }

    #[test]
    fn test_cached_estimate_preferred() {
        let mut turn = ChatTurn::new("t1", "one two three", true);
        assert_eq!(estimate_tokens_for_turn(&turn), 3);
        turn.estimated_token_count = Some(42);
        assert_eq!(estimate_tokens_for_turn(&turn), 42);
    }

    #[test]
    fn test_history_sums_turns() {
        let mut cached = ChatTurn::new("a", "ignored text here", false);
        cached.estimated_token_count = Some(100);
        let history = vec![cached, ChatTurn::new("b", "one two three four five six seven eight nine ten", true)];
        assert_eq!(estimate_tokens_for_history(&history), 113);
        assert_eq!(estimate_tokens_for_history(&[]), 0);
    }

    #[test]
    fn test_format_token_count() {
        assert_eq!(format_token_count(0), "0");
        assert_eq!(format_token_count(999), "999");
        assert_eq!(format_token_count(1000), "1,000");
        assert_eq!(format_token_count(1234567), "1,234,567");
    }
}
