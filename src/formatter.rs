//! Stanza layout for generated lyrics.

/// Reflow space-separated words into lines of `word_group_count` words and
/// stanzas of two lines.
///
/// After each word (1-based index `i`):
/// - last word, or `i` a multiple of `2 * word_group_count` → `" \n\n"`
/// - `i` a multiple of `word_group_count` → `",\n  "`
/// - otherwise → `" "`
///
/// `word_group_count` must be at least 1.
pub fn format_lyrics(text: &str, word_group_count: usize) -> String {
    let group = word_group_count.max(1);
    let words: Vec<&str> = text.split(' ').collect();
    let mut out = String::with_capacity(text.len() + words.len() * 2);
    for (i, word) in words.iter().enumerate() {
        let index = i + 1;
        out.push_str(word);
        if index == words.len() || index % (2 * group) == 0 {
            out.push_str(" \n\n");
        } else if index % group == 0 {
            out.push_str(",\n  ");
        } else {
            out.push(' ');
        }
    }
    out
}
