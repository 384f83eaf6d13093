//! Source map mapping table and nearest-preceding position lookup
//!
//! Global invariants enforced:
//! - The mapping table is sorted by generated position and never mutated after construction
//! - A failed decode is a distinct state from an empty table
//!
//! Decoding of the base64-VLQ `mappings` string is delegated to the `sourcemap` crate;
//! this module only keeps the decoded rows it needs for lookups.

use crate::error::Result;
use crate::position::SourcePosition;
use serde::{Deserialize, Serialize};

/// One row of a source map: a generated position and what it maps back to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub generated_source_position: SourcePosition,
    pub original_source_position: Option<SourcePosition>,
    pub original_file_name: Option<String>,
    pub original_name: Option<String>,
}

impl MappingEntry {
    /// Entry for a generated position that has no original counterpart
    pub fn generated_only(generated_source_position: SourcePosition) -> Self {
        MappingEntry {
            generated_source_position,
            original_source_position: None,
            original_file_name: None,
            original_name: None,
        }
    }
}

/// Queryable source map
///
/// `parsed_mappings` is `None` when the source map body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    parsed_mappings: Option<Vec<MappingEntry>>,
}

impl SourceMap {
    /// Build a source map from decoded entries in any order
    ///
    /// The sort is stable, so entries sharing a generated position keep their
    /// relative order and the first of them wins lookups.
    pub fn new(mut entries: Vec<MappingEntry>) -> Self {
        entries.sort_by_key(|entry| entry.generated_source_position);
        SourceMap {
            parsed_mappings: Some(entries),
        }
    }

    /// A source map whose mappings could not be decoded
    pub fn failed_to_parse() -> Self {
        SourceMap {
            parsed_mappings: None,
        }
    }

    /// True when the mapping table was decoded successfully
    pub fn is_parsed(&self) -> bool {
        self.parsed_mappings.is_some()
    }

    pub fn parsed_mappings(&self) -> Option<&[MappingEntry]> {
        self.parsed_mappings.as_deref()
    }

    /// Number of mapping entries (0 when decoding failed)
    pub fn len(&self) -> usize {
        self.parsed_mappings.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the entry with the greatest generated position `<= position`
    ///
    /// Returns `None` when the position precedes every entry, when the table is
    /// empty, or when the source map failed to parse. The match may lie on an
    /// earlier generated line than `position`.
    pub fn get_mapping_entry_for_generated_source_position(
        &self,
        position: SourcePosition,
    ) -> Option<&MappingEntry> {
        let mappings = self.parsed_mappings.as_deref()?;

        // Number of entries at or before the position
        let idx = mappings.partition_point(|entry| entry.generated_source_position <= position);
        if idx == 0 {
            return None;
        }

        // Step back to the first of any entries sharing the winning position
        let winning = mappings[idx - 1].generated_source_position;
        let first = mappings[..idx]
            .partition_point(|entry| entry.generated_source_position < winning);

        mappings.get(first)
    }
}

/// Decode source map JSON into a [`SourceMap`]
///
/// Segments without source information become entries with only a generated position.
pub fn parse_source_map(json: &str) -> Result<SourceMap> {
    let decoded = sourcemap::SourceMap::from_slice(json.as_bytes())?;

    let entries = decoded
        .tokens()
        .map(|token| {
            let generated = SourcePosition::new(token.get_dst_line(), token.get_dst_col());
            match token.get_source() {
                Some(source) => MappingEntry {
                    generated_source_position: generated,
                    original_source_position: Some(SourcePosition::new(
                        token.get_src_line(),
                        token.get_src_col(),
                    )),
                    original_file_name: Some(source.to_string()),
                    original_name: token.get_name().map(str::to_string),
                },
                None => MappingEntry::generated_only(generated),
            }
        })
        .collect();

    Ok(SourceMap::new(entries))
}

/// Decode source map JSON, falling back to the parse-failure state
pub fn source_map_from_text(json: &str) -> SourceMap {
    match parse_source_map(json) {
        Ok(source_map) => source_map,
        Err(e) => {
            tracing::warn!(error = %e, "Source map failed to parse");
            SourceMap::failed_to_parse()
        }
    }
}
