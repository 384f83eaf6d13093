//! Enclosing-function lookup over a [`FunctionMap`]

use crate::function_map::{FunctionMap, FunctionMapEntry};
use crate::position::SourcePosition;

/// Find the innermost function whose body contains `position`
///
/// Containment is inclusive at both ends. Since nested bodies lie inside their
/// parents, the innermost candidate has the greatest start; among equal starts
/// the smaller end wins, and identical ranges resolve to the first visited.
pub fn get_enclosing_function(
    function_map: &FunctionMap,
    position: SourcePosition,
) -> Option<&FunctionMapEntry> {
    function_map
        .entries()
        .iter()
        .filter(|entry| entry.range().contains(position))
        .fold(None::<&FunctionMapEntry>, |best, entry| match best {
            Some(current) if !is_tighter(entry, current) => Some(current),
            _ => Some(entry),
        })
}

fn is_tighter(candidate: &FunctionMapEntry, current: &FunctionMapEntry) -> bool {
    (candidate.start_source_position, std::cmp::Reverse(candidate.end_source_position))
        > (current.start_source_position, std::cmp::Reverse(current.end_source_position))
}
