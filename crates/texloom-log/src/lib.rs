//! # texloom Log Parser
//!
//! Turns the free-text output of a LaTeX build (`latexmk`, pdfTeX, XeTeX,
//! LuaTeX) into a [`ProcessedLog`]: ordered lists of errors, warnings and
//! typesetting messages, each tied to a source file and line when the log
//! names one.
//!
//! ## Overview
//!
//! Compiler output has no grammar to speak of, so the parser is a small state
//! machine over lines rather than a set of ad hoc substring searches:
//!
//! ```text
//! raw stdout
//!   -> LogText        undo TeX's hard wrapping at `max_print_line`
//!   -> Marker         classify the line that opens a diagnostic
//!   -> LatexParser    attach continuation lines, track the open-file stack
//!   -> ProcessedLog   errors / warnings / typesetting, in log order
//! ```
//!
//! Recognised markers:
//!
//! - `! message` and `file:line: message` errors, with context up to `l.<n>`
//! - `LaTeX Warning:`, `Package <name> Warning:`, `Class <name> Warning:`
//! - `LaTeX Font Warning:` and `Overfull`/`Underfull` boxes (typesetting)
//!
//! Everything else only feeds the `(file` / `)` stack used to attribute
//! diagnostics to files.
//!
//! ## Failure model
//!
//! Parsing never fails. Unrecognised or truncated output yields a partial
//! (possibly empty) [`ProcessedLog`]; the `fuzz` target checks that no input
//! panics.
//!
//! ## Example
//!
//! ```
//! use texloom_log::{ParseOptions, parse};
//!
//! let stdout = "(./main.tex\nLaTeX Warning: Reference `x' on page 1 undefined on input line 4.\n)";
//! let log = parse(stdout, ParseOptions::default().ignore_duplicates(true));
//!
//! assert_eq!(log.warnings.len(), 1);
//! assert_eq!(log.warnings[0].line, Some(4));
//! assert_eq!(log.warnings[0].file.as_deref(), Some("./main.tex"));
//!
//! let json = serde_json::to_string(&log)?;
//! assert!(json.contains("\"warnings\""));
//! # Ok::<(), serde_json::Error>(())
//! ```

/// Diagnostic model.
pub mod ir;
/// Line scanner and diagnostic extraction.
pub mod parser;
/// Log unwrapping.
pub mod text;


pub use ir::{Diagnostic, Level, ProcessedLog};
pub use parser::{LatexParser, ParseOptions, parse};

/// Schema version of the serialized [`ProcessedLog`].
///
/// Bumped on MAJOR for removed or renamed fields, MINOR for added optional
/// fields, PATCH for parsing fixes that leave the schema alone.
pub const SCHEMA_VERSION: &str = "1.0.0";
