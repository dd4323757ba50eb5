//! Title relevance check.

/// Returns `true` when `title` plausibly refers to the searched item.
///
/// Every query token longer than one character must appear as a substring
/// of the lowercased title. A query with no such tokens accepts any title.
#[must_use]
pub fn is_relevant_title(title: &str, query: &str) -> bool {
    let title = title.to_lowercase();
    query_tokens(query).all(|token| title.contains(token.as_str()))
}

/// Lowercase ASCII-alphanumeric runs of `query`, single characters dropped.
fn query_tokens(query: &str) -> impl Iterator<Item = String> + '_ {
    query
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() > 1)
        .map(str::to_ascii_lowercase)
}
