//! Conform structural checker
//!
//! Decides whether a concrete type satisfies an interface and turns the
//! answer into developer-facing diagnostics.
//!
//! # Usage
//!
//! ```ignore
//! use conform_checker::{is_compatible, Diagnostic};
//!
//! let compat = is_compatible(&logger, &file_logger);
//! if !compat.compatible() {
//!     let files = codespan_reporting::files::SimpleFiles::new();
//!     for diag in Diagnostic::from_compatibility(&compat) {
//!         eprintln!("{}", diag.render(&files));
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod diagnostic;
pub mod matcher;

pub use diagnostic::{create_files, Diagnostic, ErrorCode, JsonDiagnostic, JsonLabel};
pub use matcher::{is_compatible, satisfies, Compatibility, Mismatch, MismatchReason};
