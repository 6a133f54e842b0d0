//! Diagnostic infrastructure for error reporting
//!
//! Renders mismatch lists, descriptor errors and signature notation errors
//! with codespan-reporting, to a terminal or as JSON.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{NoColor, WriteColor};
use conform_types::{DescriptorError, ParseError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::matcher::{Compatibility, Mismatch, MismatchReason};

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    /// Code as text
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message, optionally anchored in a source file
pub struct Diagnostic {
    /// The underlying codespan diagnostic
    inner: CsDiagnostic<usize>,
    /// Error code (e.g., "E0101")
    code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Create a new diagnostic
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(
        mut self,
        file_id: usize,
        range: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        self.inner
            .labels
            .push(Label::primary(file_id, range).with_message(message));
        self
    }

    /// Add a note (additional context)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Error code, if any
    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// Main message
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Notes and help lines in order
    pub fn notes(&self) -> &[String] {
        &self.inner.notes
    }

    /// One diagnostic for an unsatisfied interface signature
    pub fn from_mismatch(interface: &str, concrete: &str, mismatch: &Mismatch) -> Self {
        let diag = Diagnostic::error(format!(
            "Type '{}' does not satisfy '{}' required by interface '{}'",
            concrete, mismatch.signature, interface
        ))
        .with_code(mismatch_code(&mismatch.reason))
        .with_note(mismatch.reason.to_string());

        match &mismatch.reason {
            MismatchReason::Missing => diag.with_help(format!(
                "add a method '{}' to '{}'",
                mismatch.signature, concrete
            )),
            MismatchReason::Ambiguous { .. } => {
                diag.with_help("remove one overload or make their qualifiers differ")
            }
            MismatchReason::QualifierMismatch { .. } | MismatchReason::TypeMismatch { .. } => diag,
        }
    }

    /// One diagnostic per mismatch, in interface declaration order
    pub fn from_compatibility(compat: &Compatibility) -> Vec<Self> {
        compat
            .mismatches()
            .iter()
            .map(|m| Self::from_mismatch(compat.interface(), compat.concrete(), m))
            .collect()
    }

    /// Create diagnostic from a DescriptorError
    pub fn from_descriptor_error(error: &DescriptorError) -> Self {
        let diag = Diagnostic::error(error.to_string()).with_code(descriptor_code(error));
        match error {
            DescriptorError::DisallowedMember { .. } => {
                diag.with_note("interfaces may only require ordinary named methods")
            }
            DescriptorError::NonTrailingDefault { .. } => {
                diag.with_help("move parameters with defaults to the end")
            }
            DescriptorError::ImplementationMismatch { .. } => {
                diag.with_help("declare the method with the signature its implementation has")
            }
            _ => diag,
        }
    }

    /// Create diagnostic from a notation error in `source`, the text of `file_id`
    pub fn from_parse_error(error: &ParseError, file_id: usize, source: &str) -> Self {
        let diag = Diagnostic::error("Invalid signature").with_code(ErrorCode("E0010"));
        match error {
            ParseError::UnexpectedEnd { expected } => diag.with_primary_label(
                file_id,
                source.len()..source.len(),
                format!("expected {}", expected),
            ),
            ParseError::UnexpectedToken {
                found,
                offset,
                expected,
            } => diag.with_primary_label(
                file_id,
                *offset..offset + found.len(),
                format!("expected {}", expected),
            ),
            ParseError::InvalidToken { text, offset } => {
                diag.with_primary_label(file_id, *offset..offset + text.len(), "not a token")
            }
        }
    }

    /// Emit the diagnostic to any color-aware writer
    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = codespan_reporting::term::Config::default();
        term::emit(writer, &config, files, &self.inner)
    }

    /// Render without colors
    pub fn render(&self, files: &SimpleFiles<String, String>) -> String {
        let mut writer = NoColor::new(Vec::new());
        if self.emit_to(&mut writer, files).is_err() {
            return self.inner.message.clone();
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Get the underlying codespan diagnostic (for testing/custom rendering)
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Convert to JSON representation for tooling
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "E0101")
    pub code: Option<String>,
    /// Severity level
    pub severity: String,
    /// Main error message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Additional notes and help
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    /// File name
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Label message
    pub message: Option<String>,
    /// Label style (primary or secondary)
    pub style: String,
}

impl JsonDiagnostic {
    /// Convert a Diagnostic to JSON representation
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;

                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Get error code for a mismatch reason
pub fn mismatch_code(reason: &MismatchReason) -> ErrorCode {
    match reason {
        MismatchReason::Missing => ErrorCode("E0101"),
        MismatchReason::QualifierMismatch { .. } => ErrorCode("E0102"),
        MismatchReason::TypeMismatch { .. } => ErrorCode("E0103"),
        MismatchReason::Ambiguous { .. } => ErrorCode("E0104"),
    }
}

/// Get error code for a DescriptorError
pub fn descriptor_code(error: &DescriptorError) -> ErrorCode {
    use DescriptorError::*;

    match error {
        DuplicateSignature { .. } => ErrorCode("E0001"),
        DisallowedMember { .. } => ErrorCode("E0002"),
        InvalidName { .. } => ErrorCode("E0003"),
        DefaultTypeMismatch { .. } => ErrorCode("E0004"),
        NonTrailingDefault { .. } => ErrorCode("E0005"),
        Redefinition { .. } => ErrorCode("E0006"),
        ImplementationMismatch { .. } => ErrorCode("E0007"),
        InvalidSignature { .. } => ErrorCode("E0008"),
    }
}

/// Helper to create a SimpleFiles instance holding one source
pub fn create_files(name: impl Into<String>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(name.into(), source.into());
    files
}
