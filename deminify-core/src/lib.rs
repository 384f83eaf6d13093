//! Deminify core library - JavaScript stack trace deminification
//!
//! Turns stack traces captured from minified scripts back into traces that
//! name the original functions, files and positions.

// Global invariants enforced in this crate:
// - Positions are zero-based internally, one-based only at the text boundary
// - Function and source maps are immutable once built
// - Each frame's failure is isolated from every other frame
// - Identical input yields byte-for-byte identical output

pub mod config;
pub mod deminifier;
pub mod error;
pub mod function_map;
pub mod function_map_consumer;
pub mod parser;
pub mod position;
pub mod provider;
pub mod report;
pub mod source_map;
pub mod stack_trace;
pub mod stack_trace_deminifier;
pub mod store;
pub mod syntax;

pub use config::ResolvedConfig;
pub use deminifier::{
    DeminificationError, DeminificationErrors, FrameDeminifier, StackFrameDeminificationResult,
    StackFrameDeminifier,
};
pub use error::DeminifyError;
pub use function_map::{build_function_map, FunctionMap, FunctionMapEntry};
pub use function_map_consumer::get_enclosing_function;
pub use parser::{EcmaScriptSyntaxTreeProvider, SyntaxTreeProvider};
pub use position::{SourcePosition, SourceRange};
pub use provider::{DirectoryArtifacts, InMemoryArtifacts, SourceCodeProvider, SourceMapProvider};
pub use report::{render, render_json, render_text, OutputFormat};
pub use source_map::{MappingEntry, SourceMap};
pub use stack_trace::{DialectStackTraceParser, StackFrame, StackTraceParser};
pub use stack_trace_deminifier::{
    name_only_stack_trace_deminifier, stack_trace_deminifier, DeminifyOptions,
    DeminifyStackTraceResult, StackTraceDeminifier,
};
pub use store::{CachingFunctionMapStore, CachingSourceMapStore, FunctionMapStore, SourceMapStore};
