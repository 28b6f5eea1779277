use ahash::AHashSet;

/// Collect the set of `k`-character shingles starting every `step`
/// characters. Returns an empty set when the text is shorter than `k`.
///
/// Offsets are character positions, so multi-byte text is never split
/// inside a code point.
pub fn shingles(text: &str, k: usize, step: usize) -> AHashSet<&str> {
    let mut set = AHashSet::new();
    if k == 0 || step == 0 {
        return set;
    }

    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;
    if char_len < k {
        return set;
    }

    let mut i = 0;
    while i + k <= char_len {
        set.insert(&text[bounds[i]..bounds[i + k]]);
        i += step;
    }
    set
}
