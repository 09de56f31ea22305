//! Business identifier allocation in a `PREFIX-<n>` namespace.
//!
//! Identifiers are human-readable strings like `MAT-7` or `Job-2`. The
//! allocator hands out the smallest positive integer suffix not currently in
//! use, so gaps left by deletions are filled before the range grows.

use std::collections::HashSet;

/// Extracts the numeric suffix of `id` if it matches `PREFIX-<n>`.
///
/// Malformed or non-numeric suffixes yield `None`; legacy ids that do not
/// follow the scheme are skipped by the allocator rather than rejected.
pub fn suffix_of(id: &str, prefix: &str) -> Option<u32> {
    id.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

/// Returns the smallest positive integer `n` such that `PREFIX-n` is free.
pub fn next_free_id<I>(existing: I, prefix: &str) -> u32
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let taken: HashSet<u32> = existing
        .into_iter()
        .filter_map(|id| suffix_of(id.as_ref(), prefix))
        .collect();

    let mut candidate = 1;
    while taken.contains(&candidate) {
        candidate += 1;
    }
    candidate
}

/// Formats a full identifier from its parts.
pub fn format_id(prefix: &str, n: u32) -> String {
    format!("{}-{}", prefix, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_namespace_starts_at_one() {
        let existing: Vec<String> = Vec::new();
        assert_eq!(next_free_id(existing, "MAT"), 1);
    }

    #[test]
    fn contiguous_ids_extend_the_range() {
        assert_eq!(next_free_id(["MAT-1", "MAT-2", "MAT-3"], "MAT"), 4);
    }

    #[test]
    fn gaps_are_reused_before_extending() {
        assert_eq!(next_free_id(["MAT-1", "MAT-3", "MAT-4"], "MAT"), 2);
        assert_eq!(next_free_id(["MAT-2"], "MAT"), 1);
    }

    #[test]
    fn malformed_suffixes_are_ignored() {
        assert_eq!(next_free_id(["MAT-1", "MAT-old", "MAT-", "MAT1"], "MAT"), 2);
    }

    #[test]
    fn other_prefixes_do_not_count() {
        assert_eq!(next_free_id(["Job-1", "User-1"], "MAT"), 1);
    }

    #[test]
    fn suffix_parsing() {
        assert_eq!(suffix_of("MAT-12", "MAT"), Some(12));
        assert_eq!(suffix_of("MAT-x", "MAT"), None);
        assert_eq!(suffix_of("MAT12", "MAT"), None);
        assert_eq!(suffix_of("Job-3", "MAT"), None);
    }

    #[test]
    fn format_round_trips() {
        let id = format_id("User", 7);
        assert_eq!(id, "User-7");
        assert_eq!(suffix_of(&id, "User"), Some(7));
    }
}
