//! Whole stack trace deminification
//!
//! Global invariants enforced:
//! - `deminified_stack_frame_results[i]` always describes `minified_stack_frames[i]`
//! - One frame's failure never affects another frame

use crate::deminifier::{FrameDeminifier, StackFrameDeminificationResult, StackFrameDeminifier};
use crate::parser::EcmaScriptSyntaxTreeProvider;
use crate::provider::{SourceCodeProvider, SourceMapProvider};
use crate::stack_trace::{DialectStackTraceParser, StackFrame, StackTraceParser};
use crate::store::{CachingFunctionMapStore, CachingSourceMapStore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Parsed frames and their deminification, index for index
///
/// A `None` result means the frame could not be deminified at all, as opposed
/// to a result whose error set records a partial deminification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeminifyStackTraceResult {
    pub minified_stack_frames: Vec<StackFrame>,
    pub deminified_stack_frame_results: Vec<Option<StackFrameDeminificationResult>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeminifyOptions {
    /// Deminify frames on the rayon thread pool
    pub parallel: bool,
}

pub struct StackTraceDeminifier {
    frame_deminifier: Arc<dyn FrameDeminifier>,
    parser: Arc<dyn StackTraceParser>,
    options: DeminifyOptions,
}

impl StackTraceDeminifier {
    pub fn new(frame_deminifier: Arc<dyn FrameDeminifier>, parser: Arc<dyn StackTraceParser>) -> Self {
        StackTraceDeminifier {
            frame_deminifier,
            parser,
            options: DeminifyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DeminifyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> DeminifyOptions {
        self.options
    }

    /// Parse `stack_trace` and deminify every recognized frame
    ///
    /// Unrecognized text yields empty sequences, never an error.
    #[instrument(skip_all, fields(parallel = self.options.parallel))]
    pub fn deminify_stack_trace(&self, stack_trace: &str) -> DeminifyStackTraceResult {
        let minified_stack_frames = self.parser.parse_stack_trace(stack_trace);
        debug!(frames = minified_stack_frames.len(), "Parsed stack trace");

        let deminified_stack_frame_results: Vec<Option<StackFrameDeminificationResult>> =
            if self.options.parallel {
                minified_stack_frames
                    .par_iter()
                    .map(|frame| self.deminify_frame(frame))
                    .collect()
            } else {
                minified_stack_frames
                    .iter()
                    .map(|frame| self.deminify_frame(frame))
                    .collect()
            };

        DeminifyStackTraceResult {
            minified_stack_frames,
            deminified_stack_frame_results,
        }
    }

    fn deminify_frame(&self, frame: &StackFrame) -> Option<StackFrameDeminificationResult> {
        match self.frame_deminifier.deminify_stack_frame(frame) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!(error = %e, "Frame could not be deminified");
                None
            }
        }
    }
}

/// Deminifier that translates names and locations through source maps
pub fn stack_trace_deminifier(
    source_map_provider: Arc<dyn SourceMapProvider>,
    source_code_provider: Arc<dyn SourceCodeProvider>,
) -> StackTraceDeminifier {
    let function_maps = Arc::new(CachingFunctionMapStore::new(
        source_code_provider,
        Arc::new(EcmaScriptSyntaxTreeProvider::new()),
    ));
    let source_maps = Arc::new(CachingSourceMapStore::new(source_map_provider));

    StackTraceDeminifier::new(
        Arc::new(StackFrameDeminifier::with_source_maps(function_maps, source_maps)),
        Arc::new(DialectStackTraceParser::new()),
    )
}

/// Deminifier that only resolves minified function names, no source maps needed
pub fn name_only_stack_trace_deminifier(
    source_code_provider: Arc<dyn SourceCodeProvider>,
) -> StackTraceDeminifier {
    let function_maps = Arc::new(CachingFunctionMapStore::new(
        source_code_provider,
        Arc::new(EcmaScriptSyntaxTreeProvider::new()),
    ));

    StackTraceDeminifier::new(
        Arc::new(StackFrameDeminifier::name_only(function_maps)),
        Arc::new(DialectStackTraceParser::new()),
    )
}
