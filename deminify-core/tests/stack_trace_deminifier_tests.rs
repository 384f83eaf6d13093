//! Stack trace deminifier façade over stub parsers and frame deminifiers

use deminify_core::error::Result;
use deminify_core::{
    DeminificationError, DeminifyError, DeminifyOptions, FrameDeminifier, SourcePosition,
    StackFrame, StackFrameDeminificationResult, StackTraceDeminifier, StackTraceParser,
};
use std::sync::Arc;

/// Returns the same frames for any input
struct FixedParser(Vec<StackFrame>);

impl StackTraceParser for FixedParser {
    fn parse_stack_trace(&self, _stack_trace: &str) -> Vec<StackFrame> {
        self.0.clone()
    }
}

/// Echoes the frame back, upper-casing its name; frames named "bad" fail
struct EchoDeminifier;

impl FrameDeminifier for EchoDeminifier {
    fn deminify_stack_frame(&self, stack_frame: &StackFrame) -> Result<StackFrameDeminificationResult> {
        if stack_frame.function_name.as_deref() == Some("bad") {
            return Err(DeminifyError::InvalidArgument("bad frame"));
        }
        Ok(StackFrameDeminificationResult {
            deminified_stack_frame: StackFrame {
                function_name: stack_frame.function_name.as_ref().map(|n| n.to_uppercase()),
                ..stack_frame.clone()
            },
            deminification_error: DeminificationError::NoSourceMap.into(),
        })
    }
}

fn frame(name: &str, column: u32) -> StackFrame {
    StackFrame::new(Some(name.to_string()), "http://x/app.js", SourcePosition::new(0, column))
}

fn deminifier(frames: Vec<StackFrame>) -> StackTraceDeminifier {
    StackTraceDeminifier::new(Arc::new(EchoDeminifier), Arc::new(FixedParser(frames)))
}

#[test]
fn test_unparsable_trace_gives_empty_result() {
    let result = deminifier(Vec::new()).deminify_stack_trace("foobar");

    assert!(result.minified_stack_frames.is_empty());
    assert!(result.deminified_stack_frame_results.is_empty());
}

#[test]
fn test_failed_frame_gives_absent_result() {
    let result = deminifier(vec![frame("bad", 1)]).deminify_stack_trace("foobar");

    assert_eq!(result.deminified_stack_frame_results.len(), 1);
    assert_eq!(result.minified_stack_frames[0], frame("bad", 1));
    assert!(result.deminified_stack_frame_results[0].is_none());
}

#[test]
fn test_frame_result_is_preserved() {
    let result = deminifier(vec![frame("a", 1)]).deminify_stack_trace("foobar");

    let only = result.deminified_stack_frame_results[0].as_ref().unwrap();
    assert_eq!(only.deminified_stack_frame.function_name.as_deref(), Some("A"));
    assert_eq!(only.deminification_error, DeminificationError::NoSourceMap.into());
    assert_eq!(result.minified_stack_frames[0], frame("a", 1));
}

#[test]
fn test_failures_are_isolated_per_frame() {
    let frames = vec![frame("a", 1), frame("bad", 2), frame("c", 3)];

    let result = deminifier(frames).deminify_stack_trace("foobar");

    let names: Vec<Option<&str>> = result
        .deminified_stack_frame_results
        .iter()
        .map(|r| r.as_ref().and_then(|r| r.deminified_stack_frame.function_name.as_deref()))
        .collect();
    assert_eq!(names, vec![Some("A"), None, Some("C")]);
}

#[test]
fn test_parallel_preserves_order() {
    let frames: Vec<StackFrame> = (0..200)
        .map(|i| if i % 7 == 0 { frame("bad", i) } else { frame(&format!("f{}", i), i) })
        .collect();

    let deminifier = deminifier(frames.clone()).with_options(DeminifyOptions { parallel: true });
    assert!(deminifier.options().parallel);

    let result = deminifier.deminify_stack_trace("foobar");

    assert_eq!(result.minified_stack_frames, frames);
    for (i, frame_result) in result.deminified_stack_frame_results.iter().enumerate() {
        if i % 7 == 0 {
            assert!(frame_result.is_none());
        } else {
            let frame_result = frame_result.as_ref().unwrap();
            assert_eq!(
                frame_result.deminified_stack_frame.function_name,
                Some(format!("F{}", i))
            );
            assert_eq!(
                frame_result.deminified_stack_frame.source_position,
                Some(SourcePosition::new(0, i as u32))
            );
        }
    }
}

#[test]
fn test_result_serializes_absent_frames_as_null() {
    let result = deminifier(vec![frame("bad", 1)]).deminify_stack_trace("foobar");

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["deminified_stack_frame_results"][0].is_null());
}
