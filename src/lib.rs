//! xuproc: JUnit XML post-processing.
//!
//! Rewrites a JUnit-style report so that every test case name is qualified
//! with its class name, making names unique across classes for consumers
//! that ignore `classname`.
//!
//! # Architecture
//!
//! - **Document**: owned XML tree, parsed from bytes and serialized back
//! - **Transform**: the name qualification pass and the [`process`] pipeline
//! - **Error**: failure kinds and their stable exit codes
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! match xuproc::process(Some(Path::new("junit.xml"))) {
//!     Ok(xml) => println!("{xml}"),
//!     Err(e) => {
//!         eprintln!("{e}");
//!         std::process::exit(e.exit_code());
//!     }
//! }
//! ```

pub mod document;
pub mod error;
pub mod transform;

// Re-export commonly used types
pub use document::{Document, Element, Node};
pub use error::{FailureKind, ProcessError, ProcessResult};
pub use transform::{process, process_str, qualified_name, rewrite_testcases};
