//! Combining several snapshot sources into one collection

use crate::ddl::SchemaAction;
use crate::traits::QueryType;
use std::collections::HashSet;

/// Concatenate `a` and `b`, keeping the first occurrence of each
/// `(object_name, query_type, content_hash)` triple.
pub fn merge(a: &[SchemaAction], b: &[SchemaAction]) -> Vec<SchemaAction> {
    merge_all([a, b])
}

/// Fold any number of collections with [`merge`] semantics.
pub fn merge_all<'a, I>(collections: I) -> Vec<SchemaAction>
where
    I: IntoIterator<Item = &'a [SchemaAction]>,
{
    let mut seen: HashSet<(Option<&str>, QueryType, &str)> = HashSet::new();
    let mut merged = Vec::new();

    for action in collections.into_iter().flatten() {
        let identity = (
            action.object_name.as_deref(),
            action.query_type,
            action.content_hash.as_str(),
        );
        if seen.insert(identity) {
            merged.push(action.clone());
        }
    }

    merged
}
