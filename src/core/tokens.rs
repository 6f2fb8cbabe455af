//! Token estimation
//!
//! A fixed characters-per-token heuristic, not a tokenizer. Every size
//! threshold in the crate is calibrated against [`estimate_tokens`].

/// Characters per token, counted in UTF-16 code units
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text` as `ceil(units / 4)`.
///
/// Length is measured in UTF-16 code units, so characters outside the
/// Basic Multilingual Plane (most emoji) count twice.
///
/// # Examples
/// ```
/// use megg::core::tokens::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcd"), 1);
/// assert_eq!(estimate_tokens("abcde"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    text.encode_utf16().count().div_ceil(CHARS_PER_TOKEN)
}

/// Check if content exceeds a token limit
pub fn exceeds_token_limit(text: &str, limit: usize) -> bool {
    estimate_tokens(text) > limit
}

/// Render a token count: verbatim under 1000, else `12.3k`
pub fn format_token_count(tokens: usize) -> String {
    if tokens < 1000 {
        tokens.to_string()
    } else {
        format!("{:.1}k", tokens as f64 / 1000.0)
    }
}
