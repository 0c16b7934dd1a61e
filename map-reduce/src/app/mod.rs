//! Map and reduce functions the workers can be started with.

use crate::{MapFn, ReduceFn};

pub mod indexer;
pub mod wc;

/// Looks up an application by name.
pub fn by_name(name: &str) -> Option<(MapFn, ReduceFn)> {
    match name {
        "wc" => Some((wc::map as MapFn, wc::reduce as ReduceFn)),
        "indexer" => Some((indexer::map as MapFn, indexer::reduce as ReduceFn)),
        _ => None,
    }
}
