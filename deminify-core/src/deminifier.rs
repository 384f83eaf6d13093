//! Single stack frame deminification
//!
//! Global invariants enforced:
//! - Name resolution and position resolution fail independently; both failures
//!   can be reported on the same frame
//! - With a source map, generated file/position never leak into the result
//! - Maps are only read, never modified

use crate::error::{DeminifyError, Result};
use crate::function_map::FunctionMapEntry;
use crate::function_map_consumer::get_enclosing_function;
use crate::position::SourcePosition;
use crate::source_map::SourceMap;
use crate::stack_trace::StackFrame;
use crate::store::{FunctionMapStore, SourceMapStore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Reasons a frame was only partially deminified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeminificationError {
    /// No source map could be obtained for the frame's file
    NoSourceMap,
    /// A source map was obtained but its mappings could not be decoded
    SourceMapFailedToParse,
    /// No mapping entry at or before the frame's generated position
    NoMatchingMappingInSourceMap,
    /// No function map for the file, or no function encloses the position
    NoWrappingFunctionFound,
}

impl DeminificationError {
    pub const ALL: [DeminificationError; 4] = [
        DeminificationError::NoSourceMap,
        DeminificationError::SourceMapFailedToParse,
        DeminificationError::NoMatchingMappingInSourceMap,
        DeminificationError::NoWrappingFunctionFound,
    ];

    fn bit(self) -> u8 {
        match self {
            DeminificationError::NoSourceMap => 1,
            DeminificationError::SourceMapFailedToParse => 1 << 1,
            DeminificationError::NoMatchingMappingInSourceMap => 1 << 2,
            DeminificationError::NoWrappingFunctionFound => 1 << 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeminificationError::NoSourceMap => "NoSourceMap",
            DeminificationError::SourceMapFailedToParse => "SourceMapFailedToParse",
            DeminificationError::NoMatchingMappingInSourceMap => "NoMatchingMappingInSourceMap",
            DeminificationError::NoWrappingFunctionFound => "NoWrappingFunctionFound",
        }
    }
}

impl fmt::Display for DeminificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of [`DeminificationError`]s carried by one frame result
///
/// Serializes as a list of error names; the empty set means full success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeminificationErrors(u8);

impl DeminificationErrors {
    pub const NONE: DeminificationErrors = DeminificationErrors(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, error: DeminificationError) -> bool {
        self.0 & error.bit() != 0
    }

    pub fn insert(&mut self, error: DeminificationError) {
        self.0 |= error.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = DeminificationError> {
        DeminificationError::ALL
            .into_iter()
            .filter(move |error| self.contains(*error))
    }
}

impl From<DeminificationError> for DeminificationErrors {
    fn from(error: DeminificationError) -> Self {
        DeminificationErrors(error.bit())
    }
}

impl FromIterator<DeminificationError> for DeminificationErrors {
    fn from_iter<I: IntoIterator<Item = DeminificationError>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |errors, error| errors | error)
    }
}

impl BitOr for DeminificationErrors {
    type Output = DeminificationErrors;

    fn bitor(self, rhs: DeminificationErrors) -> DeminificationErrors {
        DeminificationErrors(self.0 | rhs.0)
    }
}

impl BitOr<DeminificationError> for DeminificationErrors {
    type Output = DeminificationErrors;

    fn bitor(self, rhs: DeminificationError) -> DeminificationErrors {
        DeminificationErrors(self.0 | rhs.bit())
    }
}

impl BitOr for DeminificationError {
    type Output = DeminificationErrors;

    fn bitor(self, rhs: DeminificationError) -> DeminificationErrors {
        DeminificationErrors::from(self) | rhs
    }
}

impl BitOrAssign for DeminificationErrors {
    fn bitor_assign(&mut self, rhs: DeminificationErrors) {
        self.0 |= rhs.0;
    }
}

impl BitOrAssign<DeminificationError> for DeminificationErrors {
    fn bitor_assign(&mut self, rhs: DeminificationError) {
        self.insert(rhs);
    }
}

impl fmt::Display for DeminificationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self.iter().map(DeminificationError::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

impl Serialize for DeminificationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for DeminificationErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let errors = Vec::<DeminificationError>::deserialize(deserializer)?;
        Ok(errors.into_iter().collect())
    }
}

/// Outcome of deminifying one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrameDeminificationResult {
    pub deminified_stack_frame: StackFrame,
    pub deminification_error: DeminificationErrors,
}

/// Deminifies one stack frame at a time
pub trait FrameDeminifier: Send + Sync {
    /// Fails only when the frame lacks the input needed to attempt resolution
    fn deminify_stack_frame(&self, stack_frame: &StackFrame) -> Result<StackFrameDeminificationResult>;
}

/// Frame deminifier over a function map store and, optionally, a source map store
///
/// Without source maps only the function name is resolved and the generated
/// location is passed through. With source maps the location is translated
/// and names are looked up in the source map's `names` table.
#[derive(Clone)]
pub struct StackFrameDeminifier {
    function_maps: Arc<dyn FunctionMapStore>,
    source_maps: Option<Arc<dyn SourceMapStore>>,
}

impl StackFrameDeminifier {
    pub fn name_only(function_maps: Arc<dyn FunctionMapStore>) -> Self {
        StackFrameDeminifier {
            function_maps,
            source_maps: None,
        }
    }

    pub fn with_source_maps(
        function_maps: Arc<dyn FunctionMapStore>,
        source_maps: Arc<dyn SourceMapStore>,
    ) -> Self {
        StackFrameDeminifier {
            function_maps,
            source_maps: Some(source_maps),
        }
    }
}

impl FrameDeminifier for StackFrameDeminifier {
    fn deminify_stack_frame(&self, stack_frame: &StackFrame) -> Result<StackFrameDeminificationResult> {
        let file_path = stack_frame
            .file_path
            .as_deref()
            .ok_or(DeminifyError::InvalidArgument("stack frame has no file path"))?;
        let generated_position = stack_frame
            .source_position
            .ok_or(DeminifyError::InvalidArgument("stack frame has no source position"))?;

        let function_map = self.function_maps.get_function_map_for_url(file_path);
        let wrapping_function = function_map
            .as_deref()
            .and_then(|map| get_enclosing_function(map, generated_position));

        let mut deminification_error = DeminificationErrors::NONE;
        if wrapping_function.is_none() {
            deminification_error |= DeminificationError::NoWrappingFunctionFound;
        }

        let Some(source_maps) = &self.source_maps else {
            return Ok(StackFrameDeminificationResult {
                deminified_stack_frame: StackFrame {
                    function_name: wrapping_function.map(|entry| entry.function_name.clone()),
                    file_path: Some(file_path.to_string()),
                    source_position: Some(generated_position),
                },
                deminification_error,
            });
        };

        let source_map = source_maps.get_source_map_for_url(file_path);
        let mapping_entry = source_map
            .as_deref()
            .and_then(|map| map.get_mapping_entry_for_generated_source_position(generated_position));

        if mapping_entry.is_none() {
            deminification_error |= match source_map.as_deref() {
                None => DeminificationError::NoSourceMap,
                Some(map) if !map.is_parsed() => DeminificationError::SourceMapFailedToParse,
                Some(_) => DeminificationError::NoMatchingMappingInSourceMap,
            };
        }

        let function_name = wrapping_function.map(|entry| match source_map.as_deref() {
            Some(map) => original_function_name(entry, map).unwrap_or_else(|| entry.function_name.clone()),
            None => entry.function_name.clone(),
        });

        Ok(StackFrameDeminificationResult {
            deminified_stack_frame: StackFrame {
                function_name,
                file_path: mapping_entry.and_then(|entry| entry.original_file_name.clone()),
                source_position: mapping_entry.and_then(|entry| entry.original_source_position),
            },
            deminification_error,
        })
    }
}

/// Original name of a function as recorded by the source map at its binding
///
/// Properties of an owned object literal are qualified by the owner's original
/// name: `a.prototype = { b: ... }` resolves `b` under whatever `a.prototype` was.
fn original_function_name(entry: &FunctionMapEntry, source_map: &SourceMap) -> Option<String> {
    let name = original_name_at(source_map, entry.function_name_source_position?)?;

    let owner = entry
        .owner
        .as_ref()
        .and_then(|owner| original_name_at(source_map, owner.source_position));

    Some(match owner {
        Some(owner) => format!("{}.{}", owner, name),
        None => name.to_string(),
    })
}

fn original_name_at(source_map: &SourceMap, position: SourcePosition) -> Option<&str> {
    source_map
        .get_mapping_entry_for_generated_source_position(position)?
        .original_name
        .as_deref()
}
