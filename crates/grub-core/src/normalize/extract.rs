//! Locating the JSON object inside a raw completion.

/// The greedy outer-brace span: from the first `{` to the last `}`.
///
/// Leading prose, trailing commentary and markdown fence markers fall outside
/// the span. Returns `None` when either brace is missing or the last `}`
/// precedes the first `{`.
pub fn object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
