//! Stack trace text parsing
//!
//! Global invariants enforced:
//! - Parsing never fails: unrecognized lines are dropped
//! - Positions leave this module zero-based
//! - Frame order follows line order of the input
//!
//! Recognized frame shapes, tried in this order (first match wins):
//! - `at Anonymous function (URL:LINE:COLUMN)` (IE/Edge legacy), name normalized to absent
//! - `at NAME (URL:LINE:COLUMN)` and `at URL:LINE:COLUMN` (V8)
//! - `NAME@URL:LINE:COLUMN` (Gecko/Safari), name may be empty; closure
//!   sentinels (`window.onload/<`) are kept on the frame as written

use crate::position::SourcePosition;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A single call site parsed from a stack trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub function_name: Option<String>,
    pub file_path: Option<String>,
    pub source_position: Option<SourcePosition>,
}

impl StackFrame {
    pub fn new(
        function_name: Option<String>,
        file_path: impl Into<String>,
        source_position: SourcePosition,
    ) -> Self {
        StackFrame {
            function_name,
            file_path: Some(file_path.into()),
            source_position: Some(source_position),
        }
    }
}

/// Turns raw stack trace text into frames
pub trait StackTraceParser: Send + Sync {
    /// Parse every recognizable frame; never fails
    fn parse_stack_trace(&self, stack_trace: &str) -> Vec<StackFrame>;
}

/// Parser for the common browser and runtime stack trace dialects
#[derive(Debug, Clone, Copy, Default)]
pub struct DialectStackTraceParser;

impl DialectStackTraceParser {
    pub fn new() -> Self {
        DialectStackTraceParser
    }

    /// Parse a single line, returning `None` when no frame shape matches
    pub fn parse_frame(&self, line: &str) -> Option<StackFrame> {
        if let Some(caps) = anonymous_function_re().captures(line) {
            return frame_from_captures(&caps, None);
        }

        if let Some(caps) = v8_re().captures(line) {
            let name = caps
                .name("name")
                .map(|m| m.as_str().trim())
                .filter(|name| !name.is_empty() && !is_anonymous_marker(name))
                .map(str::to_string);
            return frame_from_captures(&caps, name);
        }

        if let Some(caps) = gecko_re().captures(line) {
            // Sentinels stay on the frame; a name made only of sentinels is anonymous
            let name = caps
                .name("name")
                .map(|m| m.as_str().trim())
                .filter(|name| !strip_gecko_sentinels(name).is_empty())
                .map(str::to_string);
            return frame_from_captures(&caps, name);
        }

        None
    }
}

impl StackTraceParser for DialectStackTraceParser {
    fn parse_stack_trace(&self, stack_trace: &str) -> Vec<StackFrame> {
        stack_trace
            .lines()
            .filter_map(|line| self.parse_frame(line))
            .collect()
    }
}

fn anonymous_function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*at\s+Anonymous function\s+\((?P<url>\S+):(?P<line>\d+):(?P<column>\d+)\)\s*$",
        )
        .unwrap()
    })
}

fn v8_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*at\s+(?:(?P<name>.+?)\s+\()?(?P<url>[^\s()]+):(?P<line>\d+):(?P<column>\d+)\)?\s*$",
        )
        .unwrap()
    })
}

fn gecko_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<name>[^@]*)@(?P<url>\S+):(?P<line>\d+):(?P<column>\d+)\s*$").unwrap()
    })
}

/// V8 writes `<anonymous>` for unnamed functions, qualified by the receiver
/// (`HTMLButtonElement.<anonymous>`) or by `new`.
fn is_anonymous_marker(name: &str) -> bool {
    name.rsplit(|c: char| c == '.' || c == ' ').next() == Some("<anonymous>")
}

/// Gecko marks nested and anonymous closures with trailing `/` and `<`
/// (`window.onload/<`); the logical name is what precedes them.
fn strip_gecko_sentinels(name: &str) -> &str {
    name.trim_end_matches(|c: char| c == '/' || c == '<')
}

fn frame_from_captures(caps: &Captures<'_>, function_name: Option<String>) -> Option<StackFrame> {
    let url = caps.name("url")?.as_str();
    // Numbers too large for u32 are not real positions
    let line: u32 = caps.name("line")?.as_str().parse().ok()?;
    let column: u32 = caps.name("column")?.as_str().parse().ok()?;

    Some(StackFrame::new(
        function_name,
        url,
        SourcePosition::from_one_based(line, column),
    ))
}
