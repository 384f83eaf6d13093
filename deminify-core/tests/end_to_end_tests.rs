//! End-to-end deminification of a Closure-compiled script

use deminify_core::{
    name_only_stack_trace_deminifier, render_text, stack_trace_deminifier, DeminificationError,
    DeminificationErrors, DeminifyOptions, DeminifyStackTraceResult, DirectoryArtifacts,
    InMemoryArtifacts, SourcePosition, StackTraceDeminifier,
};
use std::path::PathBuf;
use std::sync::Arc;

const URL: &str = "http://localhost:11323/crashcauser.js";
const GENERATED_CODE: &str = include_str!("../../tests/fixtures/closure/crashcauser.js");
const SOURCE_MAP: &str = include_str!("../../tests/fixtures/closure/crashcauser.js.map");

const CHROME_TRACE: &str = "TypeError: Cannot read property 'length' of undefined
    at Function.a.a (http://localhost:11323/crashcauser.js:1:99)
    at Object.b (http://localhost:11323/crashcauser.js:1:63)
    at c (http://localhost:11323/crashcauser.js:1:135)
    at HTMLButtonElement.<anonymous> (http://localhost:11323/crashcauser.js:1:401)";

const FIREFOX_TRACE: &str = "a.a@http://localhost:11323/crashcauser.js:1:91
a.prototype.b@http://localhost:11323/crashcauser.js:1:61
c@http://localhost:11323/crashcauser.js:1:128
window.onload/<@http://localhost:11323/crashcauser.js:1:401";

const IE_TRACE: &str = "TypeError: Unable to get property 'length' of undefined or null reference
   at a.a (http://localhost:11323/crashcauser.js:1:91)
   at a.prototype.b (http://localhost:11323/crashcauser.js:1:54)
   at c (http://localhost:11323/crashcauser.js:1:121)
   at Anonymous function (http://localhost:11323/crashcauser.js:1:389)";

const ORIGINAL_NAMES: [&str; 4] = [
    "mynamespace.objectWithMethods.propertyMethodLevel2",
    "mynamespace.objectWithMethods.prototypeMethodLevel1",
    "GlobalFunction",
    "window",
];

fn artifacts() -> Arc<InMemoryArtifacts> {
    let artifacts = InMemoryArtifacts::new();
    artifacts.add_source(URL, GENERATED_CODE).add_source_map(URL, SOURCE_MAP);
    Arc::new(artifacts)
}

fn deminifier() -> StackTraceDeminifier {
    let artifacts = artifacts();
    stack_trace_deminifier(artifacts.clone(), artifacts)
}

fn function_names(result: &DeminifyStackTraceResult) -> Vec<Option<String>> {
    result
        .deminified_stack_frame_results
        .iter()
        .map(|r| {
            r.as_ref()
                .and_then(|r| r.deminified_stack_frame.function_name.clone())
        })
        .collect()
}

fn assert_original_names(result: &DeminifyStackTraceResult) {
    assert_eq!(result.minified_stack_frames.len(), 4);
    assert_eq!(result.deminified_stack_frame_results.len(), 4);

    let expected: Vec<Option<String>> = ORIGINAL_NAMES.iter().map(|n| Some(n.to_string())).collect();
    assert_eq!(function_names(result), expected);

    for frame_result in result.deminified_stack_frame_results.iter().flatten() {
        assert_eq!(frame_result.deminification_error, DeminificationErrors::NONE);
        assert_eq!(
            frame_result.deminified_stack_frame.file_path.as_deref(),
            Some("crashcauser.js")
        );
    }
}

#[test]
fn test_chrome_stack_trace() {
    let result = deminifier().deminify_stack_trace(CHROME_TRACE);
    assert_original_names(&result);
}

#[test]
fn test_firefox_stack_trace() {
    let result = deminifier().deminify_stack_trace(FIREFOX_TRACE);
    assert_original_names(&result);
}

#[test]
fn test_internet_explorer_stack_trace() {
    let result = deminifier().deminify_stack_trace(IE_TRACE);
    assert_original_names(&result);
}

#[test]
fn test_minified_frames_are_kept() {
    let result = deminifier().deminify_stack_trace(CHROME_TRACE);

    let first = &result.minified_stack_frames[0];
    assert_eq!(first.function_name.as_deref(), Some("Function.a.a"));
    assert_eq!(first.file_path.as_deref(), Some(URL));
    assert_eq!(first.source_position, Some(SourcePosition::new(0, 98)));
    assert_eq!(result.minified_stack_frames[3].function_name, None);
}

#[test]
fn test_parallel_matches_sequential() {
    let sequential = deminifier().deminify_stack_trace(CHROME_TRACE);
    let parallel = deminifier()
        .with_options(DeminifyOptions { parallel: true })
        .deminify_stack_trace(CHROME_TRACE);

    assert_eq!(parallel, sequential);
}

#[test]
fn test_repeated_traces_reuse_cached_maps() {
    let deminifier = deminifier();

    let first = deminifier.deminify_stack_trace(FIREFOX_TRACE);
    let second = deminifier.deminify_stack_trace(FIREFOX_TRACE);

    assert_eq!(first, second);
    assert_original_names(&second);
}

#[test]
fn test_name_only_resolves_minified_names() {
    let deminifier = name_only_stack_trace_deminifier(artifacts());

    let result = deminifier.deminify_stack_trace(CHROME_TRACE);

    assert_eq!(
        function_names(&result),
        vec![
            Some("a.a".to_string()),
            Some("b".to_string()),
            Some("c".to_string()),
            Some("window.onload".to_string()),
        ]
    );
    for (minified, frame_result) in result
        .minified_stack_frames
        .iter()
        .zip(result.deminified_stack_frame_results.iter().flatten())
    {
        assert!(frame_result.deminification_error.is_none());
        assert_eq!(frame_result.deminified_stack_frame.file_path, minified.file_path);
        assert_eq!(
            frame_result.deminified_stack_frame.source_position,
            minified.source_position
        );
    }
}

#[test]
fn test_missing_source_map_still_names_functions() {
    let artifacts = InMemoryArtifacts::new();
    artifacts.add_source(URL, GENERATED_CODE);
    let artifacts = Arc::new(artifacts);
    let deminifier = stack_trace_deminifier(artifacts.clone(), artifacts);

    let result = deminifier.deminify_stack_trace(CHROME_TRACE);

    let first = result.deminified_stack_frame_results[0].as_ref().unwrap();
    assert_eq!(first.deminification_error, DeminificationError::NoSourceMap.into());
    assert_eq!(first.deminified_stack_frame.function_name.as_deref(), Some("a.a"));
    assert_eq!(first.deminified_stack_frame.source_position, None);
}

#[test]
fn test_unknown_script_reports_both_failures() {
    let result = deminifier()
        .deminify_stack_trace("    at foo (http://localhost:11323/other.js:1:10)");

    let only = result.deminified_stack_frame_results[0].as_ref().unwrap();
    assert_eq!(
        only.deminification_error,
        DeminificationError::NoSourceMap | DeminificationError::NoWrappingFunctionFound
    );
}

#[test]
fn test_unresolved_gecko_frame_keeps_sentinels() {
    let artifacts = InMemoryArtifacts::new();
    artifacts.add_source("http://x/app.js", "var answer = 42;");
    let deminifier = name_only_stack_trace_deminifier(Arc::new(artifacts));

    let result = deminifier.deminify_stack_trace("window.onload/<@http://x/app.js:1:5");

    assert_eq!(
        result.minified_stack_frames[0].function_name.as_deref(),
        Some("window.onload/<")
    );
    let only = result.deminified_stack_frame_results[0].as_ref().unwrap();
    assert_eq!(only.deminified_stack_frame.function_name, None);
    assert_eq!(
        only.deminification_error,
        DeminificationError::NoWrappingFunctionFound.into()
    );
    assert_eq!(
        render_text(&result),
        "    at window.onload/< (http://x/app.js:1:5)  [NoWrappingFunctionFound]\n"
    );
}

#[test]
fn test_directory_artifacts() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("closure");
    let artifacts = Arc::new(DirectoryArtifacts::new(root));
    let deminifier = stack_trace_deminifier(artifacts.clone(), artifacts);

    let result = deminifier.deminify_stack_trace(IE_TRACE);
    assert_original_names(&result);
}
