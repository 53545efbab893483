use crate::candidate_store::CandidateStore;

/// Matches borrowed from the store, in store order.
pub type MatchList<'a> = Vec<&'a str>;

/// Every candidate that starts with `input`, case-sensitive. An empty input
/// matches nothing.
pub fn filter<'a>(store: &'a CandidateStore, input: &str) -> MatchList<'a> {
    if input.is_empty() || store.is_empty() {
        return Vec::new();
    }

    store.iter().filter(|name| name.starts_with(input)).collect()
}
