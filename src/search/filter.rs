//! Suggestion filtering
//!
//! Plain case-insensitive substring matching on name or city. Results keep
//! directory order; there is no ranking.

use crate::directory::InstitutionRecord;

/// Default number of suggestions shown while typing
pub const MAX_SUGGESTIONS: usize = 5;

/// Queries must be longer than this (in characters) to produce suggestions
pub const MIN_QUERY_CHARS: usize = 2;

/// Number of characters in `query`, which is what the length rules count.
pub fn query_len(query: &str) -> usize {
    query.chars().count()
}

/// Whether a query is long enough to search.
pub fn is_searchable(query: &str, min_chars: usize) -> bool {
    query_len(query) > min_chars
}

/// First `limit` records whose name or city contains `query`.
pub fn filter_directory(
    directory: &[InstitutionRecord],
    query: &str,
    limit: usize,
) -> Vec<InstitutionRecord> {
    let needle = query.to_lowercase();
    directory
        .iter()
        .filter(|record| record.matches_lower(&needle))
        .take(limit)
        .cloned()
        .collect()
}

/// The record whose name equals `name`, ignoring case.
pub fn find_by_name<'a>(
    directory: &'a [InstitutionRecord],
    name: &str,
) -> Option<&'a InstitutionRecord> {
    let wanted = name.trim().to_lowercase();
    directory
        .iter()
        .find(|record| record.name.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Vec<InstitutionRecord> {
        vec![
            InstitutionRecord::new("Mercy General", "Austin", "Texas"),
            InstitutionRecord::new("St. Mercy", "Dallas", "Texas"),
            InstitutionRecord::new("Lakeside Medical", "Mercyville", "Ohio"),
            InstitutionRecord::new("Northwest Health", "Seattle", "Washington"),
        ]
    }

    #[test]
    fn matches_name_or_city_in_order() {
        let hits = filter_directory(&directory(), "MERCY", MAX_SUGGESTIONS);
        let names: Vec<_> = hits.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Mercy General", "St. Mercy", "Lakeside Medical"]);
    }

    #[test]
    fn respects_limit() {
        let hits = filter_directory(&directory(), "e", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Mercy General");
    }

    #[test]
    fn no_match_is_empty() {
        assert!(filter_directory(&directory(), "zzz", MAX_SUGGESTIONS).is_empty());
    }

    #[test]
    fn length_counts_characters() {
        assert!(!is_searchable("ab", MIN_QUERY_CHARS));
        assert!(is_searchable("abc", MIN_QUERY_CHARS));
        // Two characters, four bytes
        assert!(!is_searchable("éé", MIN_QUERY_CHARS));
    }

    #[test]
    fn exact_name_lookup_ignores_case() {
        let dir = directory();
        assert_eq!(find_by_name(&dir, "st. mercy").map(|r| r.city.as_str()), Some("Dallas"));
        assert!(find_by_name(&dir, "mercy").is_none());
    }
}
