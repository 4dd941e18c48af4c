//! Test case name qualification.
//!
//! JUnit reports from some runners store only the method in `name` and the
//! owning class in `classname`. Consumers that key on `name` alone then see
//! collisions between identically named methods of different classes. This
//! module rewrites each `<testcase>` so that `name` becomes
//! `classname + "." + name`.
//!
//! # Rules
//!
//! Only direct `testcase` children of the root element that are in no
//! namespace are visited. For each:
//!
//! 1. a missing `classname` aborts the run ([`ProcessError::MissingClassname`]);
//! 2. a missing `name` aborts the run ([`ProcessError::MissingName`]);
//! 3. `name` is left alone when everything before its last `.` equals
//!    `classname` (already qualified) or when it starts with `setUpClass (`;
//! 4. otherwise `name` is rewritten.
//!
//! Rule 3 makes the rewrite idempotent.
//!
//! # Example
//!
//! ```
//! use xuproc::transform::process_str;
//!
//! let xml = process_str(r#"<testsuite><testcase classname="org.example" name="method"/></testsuite>"#)?;
//! assert!(xml.contains(r#"name="org.example.method""#));
//! # Ok::<(), xuproc::ProcessError>(())
//! ```

use std::path::Path;

use tracing::debug;

use crate::document::Document;
use crate::error::{ProcessError, ProcessResult};

/// Tag of the records this module rewrites.
pub const TESTCASE_TAG: &str = "testcase";

/// Name prefix of class-level setup records, which are never qualified.
pub const SETUP_CLASS_MARKER: &str = "setUpClass (";

/// Reads the report at `filepath`, qualifies its test case names and returns
/// the serialized document.
///
/// # Errors
///
/// - [`ProcessError::MissingArgument`] if `filepath` is `None`
/// - [`ProcessError::FileNotFound`] / [`ProcessError::PermissionDenied`] if the
///   file cannot be read
/// - [`ProcessError::Parse`] if the file is not well-formed XML
/// - [`ProcessError::MissingClassname`] / [`ProcessError::MissingName`] if any
///   test case lacks a required attribute
/// - [`ProcessError::Unknown`] for anything else
pub fn process(filepath: Option<&Path>) -> ProcessResult<String> {
    let path = filepath.ok_or_else(|| ProcessError::MissingArgument("Missing filepath".into()))?;

    let content = std::fs::read(path).map_err(|e| ProcessError::from_io(path, e))?;
    debug!("Read {} bytes from {}", content.len(), path.display());

    process_bytes(&content)
}

/// Same as [`process`], for a document already in memory.
pub fn process_str(xml: &str) -> ProcessResult<String> {
    process_bytes(xml.as_bytes())
}

fn process_bytes(content: &[u8]) -> ProcessResult<String> {
    let mut document =
        Document::parse(content).map_err(|e| ProcessError::Parse(e.to_string()))?;

    let rewritten = rewrite_testcases(&mut document)?;
    debug!("Qualified {} test case name(s)", rewritten);

    Ok(document.to_xml()?)
}

/// Qualifies the name of every direct `testcase` child of the root.
///
/// Returns how many names were changed. Validation failures abort on the
/// first offending record; the document may already be partly rewritten at
/// that point and should be discarded.
///
/// A `testcase` under a default namespace (`xmlns="..."` on the root or on
/// the element itself) is a different element and is left alone.
pub fn rewrite_testcases(document: &mut Document) -> ProcessResult<usize> {
    let mut rewritten = 0;
    let root_namespace = document.root.attribute("xmlns").map(str::to_string);

    let testcases = document
        .root
        .children_named_mut(TESTCASE_TAG)
        .filter(|tc| {
            tc.attribute("xmlns")
                .or(root_namespace.as_deref())
                .is_none_or(str::is_empty)
        });

    for (index, testcase) in testcases.enumerate() {
        let classname = testcase
            .attribute("classname")
            .ok_or(ProcessError::MissingClassname { index })?;
        let name = testcase
            .attribute("name")
            .ok_or(ProcessError::MissingName { index })?;

        if let Some(qualified) = qualified_name(classname, name) {
            testcase.set_attribute("name", qualified);
            rewritten += 1;
        }
    }

    Ok(rewritten)
}

/// Returns the qualified form of `name`, or `None` if it must stay as is.
///
/// ```
/// use xuproc::transform::qualified_name;
///
/// assert_eq!(qualified_name("org.example", "method").as_deref(), Some("org.example.method"));
/// assert_eq!(qualified_name("org.example", "org.example.method"), None);
/// assert_eq!(qualified_name("org.example", "setUpClass (org.example)"), None);
/// ```
pub fn qualified_name(classname: &str, name: &str) -> Option<String> {
    let already_qualified = name
        .rsplit_once('.')
        .is_some_and(|(prefix, _)| prefix == classname);

    if already_qualified || name.starts_with(SETUP_CLASS_MARKER) {
        None
    } else {
        Some(format!("{classname}.{name}"))
    }
}
