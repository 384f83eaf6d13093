//! Reporting and output generation
//!
//! Global invariants enforced:
//! - One output line per parsed frame, in stack order
//! - Byte-for-byte identical output across runs

use crate::stack_trace::StackFrame;
use crate::stack_trace_deminifier::DeminifyStackTraceResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output format for rendered results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("unknown output format: {} (expected text or json)", other),
        }
    }
}

/// Render a result in the requested format
pub fn render(result: &DeminifyStackTraceResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => render_json(result),
    }
}

/// Render a result as a V8-style stack trace
///
/// Positions are printed one-based and `?` stands in for anything unresolved.
/// A function name that could not be resolved falls back to the minified one.
/// Frames that carry errors list them after the location; frames that could
/// not be deminified at all are printed as they were parsed.
pub fn render_text(result: &DeminifyStackTraceResult) -> String {
    let mut output = String::new();

    for (index, minified) in result.minified_stack_frames.iter().enumerate() {
        match result.deminified_stack_frame_results.get(index).and_then(Option::as_ref) {
            Some(deminified) => {
                let frame = &deminified.deminified_stack_frame;
                if frame.function_name.is_none() && minified.function_name.is_some() {
                    // Unresolved names are shown as the runtime wrote them
                    let frame = StackFrame {
                        function_name: minified.function_name.clone(),
                        ..frame.clone()
                    };
                    output.push_str(&format_frame(&frame));
                } else {
                    output.push_str(&format_frame(frame));
                }
                if !deminified.deminification_error.is_none() {
                    output.push_str(&format!("  [{}]", deminified.deminification_error));
                }
            }
            None => {
                output.push_str(&format_frame(minified));
                output.push_str("  [not deminified]");
            }
        }
        output.push('\n');
    }

    output
}

/// Render a result as pretty-printed JSON
pub fn render_json(result: &DeminifyStackTraceResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

fn format_frame(frame: &StackFrame) -> String {
    let name = frame.function_name.as_deref().unwrap_or("?");
    let file = frame.file_path.as_deref().unwrap_or("?");
    let location = match frame.source_position {
        Some(position) => position.to_string(),
        None => "?:?".to_string(),
    };
    format!("    at {} ({}:{})", name, file, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deminifier::{DeminificationError, DeminificationErrors, StackFrameDeminificationResult};
    use crate::position::SourcePosition;

    fn sample() -> DeminifyStackTraceResult {
        let minified = vec![
            StackFrame::new(Some("a.a".to_string()), "http://x/app.js", SourcePosition::new(0, 98)),
            StackFrame::new(None, "http://x/app.js", SourcePosition::new(0, 400)),
            StackFrame::new(Some("c".to_string()), "http://x/app.js", SourcePosition::new(0, 134)),
        ];
        let results = vec![
            Some(StackFrameDeminificationResult {
                deminified_stack_frame: StackFrame::new(
                    Some("Widget.render".to_string()),
                    "src/widget.js",
                    SourcePosition::new(6, 75),
                ),
                deminification_error: DeminificationErrors::NONE,
            }),
            Some(StackFrameDeminificationResult {
                deminified_stack_frame: StackFrame::default(),
                deminification_error: DeminificationError::NoSourceMap
                    | DeminificationError::NoWrappingFunctionFound,
            }),
            None,
        ];
        DeminifyStackTraceResult {
            minified_stack_frames: minified,
            deminified_stack_frame_results: results,
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());

        assert_eq!(
            text,
            "    at Widget.render (src/widget.js:7:76)\n\
             \x20   at ? (?:?:?)  [NoSourceMap, NoWrappingFunctionFound]\n\
             \x20   at c (http://x/app.js:1:135)  [not deminified]\n"
        );
    }

    #[test]
    fn test_render_text_keeps_unresolved_gecko_name() {
        let result = DeminifyStackTraceResult {
            minified_stack_frames: vec![StackFrame::new(
                Some("window.onload/<".to_string()),
                "http://x/app.js",
                SourcePosition::new(0, 4),
            )],
            deminified_stack_frame_results: vec![Some(StackFrameDeminificationResult {
                deminified_stack_frame: StackFrame::new(None, "http://x/app.js", SourcePosition::new(0, 4)),
                deminification_error: DeminificationError::NoWrappingFunctionFound.into(),
            })],
        };

        assert_eq!(
            render_text(&result),
            "    at window.onload/< (http://x/app.js:1:5)  [NoWrappingFunctionFound]\n"
        );
    }

    #[test]
    fn test_render_text_empty() {
        assert_eq!(render_text(&DeminifyStackTraceResult::default()), "");
    }

    #[test]
    fn test_render_json_shape() {
        let json = render_json(&sample());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["minified_stack_frames"].as_array().unwrap().len(), 3);
        let results = value["deminified_stack_frame_results"].as_array().unwrap();
        assert_eq!(results[0]["deminification_error"], serde_json::json!([]));
        assert_eq!(
            results[1]["deminification_error"],
            serde_json::json!(["NoSourceMap", "NoWrappingFunctionFound"])
        );
        assert!(results[2].is_null());
        assert_eq!(
            results[0]["deminified_stack_frame"]["source_position"],
            serde_json::json!({"line": 6, "column": 75})
        );
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
