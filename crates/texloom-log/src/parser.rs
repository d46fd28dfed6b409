use crate::ir::{Diagnostic, Level, ProcessedLog};
use crate::text::{DEFAULT_WRAP_WIDTH, LogText};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static FILE_LINE_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:\s][^:]*):(\d+): (.*)$").expect("valid regex"));
static LATEX_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^LaTeX Warning: (.*)$").expect("valid regex"));
static FONT_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^LaTeX Font Warning: (.*)$").expect("valid regex"));
static PACKAGE_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Package|Class) (\S+) Warning: ?(.*)$").expect("valid regex"));
static BAD_BOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Over|Under)full \\[hv]box").expect("valid regex"));
static LINE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^l\.(\d+)").expect("valid regex"));
static INPUT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"on input line (\d+)").expect("valid regex"));
static LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"lines? (\d+)").expect("valid regex"));

/// Upper bound on context lines attached to an error that never reaches an
/// `l.<n>` reference.
const ERROR_CONTEXT_LIMIT: usize = 24;

/// Options accepted by [`LatexParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Drop diagnostics whose (message, file, line) was already emitted.
    pub ignore_duplicates: bool,
    /// Width at which the engine hard-wrapped its output.
    pub wrap_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_duplicates: false,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl ParseOptions {
    pub fn ignore_duplicates(mut self, ignore: bool) -> Self {
        self.ignore_duplicates = ignore;
        self
    }
}

/// A line that opens a new diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker<'a> {
    Error {
        message: &'a str,
    },
    FileLineError {
        file: &'a str,
        line: u32,
        message: &'a str,
    },
    Warning {
        message: &'a str,
    },
    PackageWarning {
        package: &'a str,
        level: Level,
    },
    BadBox,
}

impl<'a> Marker<'a> {
    fn classify(line: &'a str) -> Option<Self> {
        if let Some(rest) = line.strip_prefix('!') {
            return Some(Marker::Error {
                message: rest.trim(),
            });
        }
        if let Some(caps) = LATEX_WARNING.captures(line) {
            let message = caps.get(1).map_or("", |m| m.as_str());
            return Some(Marker::Warning { message });
        }
        if FONT_WARNING.is_match(line) {
            return Some(Marker::PackageWarning {
                package: "Font",
                level: Level::Typesetting,
            });
        }
        if let Some(caps) = PACKAGE_WARNING.captures(line) {
            let package = caps.get(1).map_or("", |m| m.as_str());
            return Some(Marker::PackageWarning {
                package,
                level: Level::Warning,
            });
        }
        if BAD_BOX.is_match(line) {
            return Some(Marker::BadBox);
        }
        if let Some(caps) = FILE_LINE_ERROR.captures(line) {
            let file = caps.get(1).map_or("", |m| m.as_str());
            if !is_likely_path(file) {
                return None;
            }
            let line_no = caps.get(2).and_then(|m| m.as_str().parse().ok())?;
            let message = caps.get(3).map_or("", |m| m.as_str().trim());
            return Some(Marker::FileLineError {
                file,
                line: line_no,
                message,
            });
        }
        None
    }
}

/// Line-oriented scanner turning raw compiler output into a [`ProcessedLog`].
///
/// The parser is total: text it does not recognise is skipped, so malformed
/// output produces a partial (possibly empty) log instead of an error.
///
/// ```
/// use texloom_log::{LatexParser, ParseOptions};
///
/// let log = LatexParser::new(ParseOptions::default())
///     .parse("! Undefined control sequence.\nl.12 \\foo");
/// assert_eq!(log.errors.len(), 1);
/// assert_eq!(log.errors[0].line, Some(12));
/// ```
#[derive(Debug)]
pub struct LatexParser {
    options: ParseOptions,
    /// Open parentheses; `None` marks a parenthetical that is not a file.
    file_stack: Vec<Option<String>>,
    seen: HashSet<(String, Option<String>, Option<u32>)>,
    log: ProcessedLog,
}

impl Default for LatexParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl LatexParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            file_stack: Vec::new(),
            seen: HashSet::new(),
            log: ProcessedLog::default(),
        }
    }

    /// Parses a complete log.
    ///
    /// # Arguments
    ///
    /// * `input` - The raw stdout of the compiler run.
    ///
    /// # Returns
    ///
    /// The diagnostics grouped by level, each group in log order.
    pub fn parse(mut self, input: &str) -> ProcessedLog {
        let text = LogText::new(input, self.options.wrap_width);
        let mut row = 0;

        while let Some(line) = text.get(row) {
            row = match Marker::classify(line) {
                Some(marker) => self.consume(marker, &text, row),
                None => {
                    self.track_files(line);
                    row + 1
                }
            };
        }

        self.log
    }

    /// Builds the diagnostic opened by `marker` at `row` and returns the
    /// first row after it.
    fn consume(&mut self, marker: Marker<'_>, text: &LogText, row: usize) -> usize {
        let head = text.get(row).unwrap_or_default();
        match marker {
            Marker::Error { message } => {
                let file = self.current_file();
                self.consume_error(text, row, message, file, None)
            }
            Marker::FileLineError {
                file,
                line,
                message,
            } => self.consume_error(text, row, message, Some(file.to_string()), Some(line)),
            Marker::Warning { message } => {
                let line = capture_number(&INPUT_LINE, message);
                self.emit(Diagnostic {
                    level: Level::Warning,
                    message: message.trim().to_string(),
                    content: String::new(),
                    line,
                    file: self.current_file(),
                    raw: head.to_string(),
                });
                row + 1
            }
            Marker::PackageWarning { package, level } => {
                let prefix = format!("({package})");
                let mut message = head.trim().to_string();
                let mut raw = vec![head];
                let mut next = row + 1;
                while let Some(cont) = text.get(next) {
                    let Some(rest) = cont.strip_prefix(prefix.as_str()) else {
                        break;
                    };
                    message.push(' ');
                    message.push_str(rest.trim());
                    raw.push(cont);
                    next += 1;
                }
                let line = capture_number(&INPUT_LINE, &message);
                self.emit(Diagnostic {
                    level,
                    message,
                    content: String::new(),
                    line,
                    file: self.current_file(),
                    raw: raw.join("\n"),
                });
                next
            }
            Marker::BadBox => {
                let mut content = Vec::new();
                let mut next = row + 1;
                while let Some(cont) = text.get(next) {
                    if cont.trim().is_empty()
                        || cont.starts_with('(')
                        || cont.starts_with(')')
                        || Marker::classify(cont).is_some()
                    {
                        break;
                    }
                    content.push(cont);
                    next += 1;
                }
                let mut raw = vec![head];
                raw.extend(content.iter().copied());
                self.emit(Diagnostic {
                    level: Level::Typesetting,
                    message: head.trim().to_string(),
                    content: content.join("\n"),
                    line: capture_number(&LINES, head),
                    file: self.current_file(),
                    raw: raw.join("\n"),
                });
                next
            }
        }
    }

    /// Attaches context lines to an error until its `l.<n>` reference, a new
    /// marker, a line opening or closing a file, or the end of input.
    fn consume_error(
        &mut self,
        text: &LogText,
        row: usize,
        message: &str,
        file: Option<String>,
        mut line: Option<u32>,
    ) -> usize {
        let head = text.get(row).unwrap_or_default();
        let mut raw = vec![head];
        let mut content = Vec::new();
        let mut next = row + 1;

        while let Some(cont) = text.get(next) {
            if content.len() >= ERROR_CONTEXT_LIMIT
                || cont.starts_with('(')
                || cont.starts_with(')')
                || Marker::classify(cont).is_some()
            {
                break;
            }
            content.push(cont);
            raw.push(cont);
            next += 1;

            if let Some(number) = capture_number(&LINE_REF, cont) {
                line.get_or_insert(number);
                // The indented line after `l.<n>` is the rest of the excerpt.
                if let Some(tail) = text
                    .get(next)
                    .filter(|t| t.starts_with(' ') && !t.trim().is_empty())
                {
                    content.push(tail);
                    raw.push(tail);
                    next += 1;
                }
                break;
            }
        }

        self.emit(Diagnostic {
            level: Level::Error,
            message: message.to_string(),
            content: content.join("\n"),
            line,
            file,
            raw: raw.join("\n"),
        });
        next
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        if self.options.ignore_duplicates {
            let (message, file, line) = diagnostic.identity();
            let key = (message.to_string(), file.map(str::to_string), line);
            if !self.seen.insert(key) {
                return;
            }
        }
        self.log.push(diagnostic);
    }

    fn current_file(&self) -> Option<String> {
        self.file_stack.iter().rev().find_map(|f| f.clone())
    }

    /// Follows `(file` and `)` pairs on a line that carries no diagnostic.
    fn track_files(&mut self, line: &str) {
        let mut chars = line.char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                '(' => {
                    let rest = &line[idx + 1..];
                    let end = rest
                        .find(|c: char| c == '(' || c == ')' || c.is_whitespace())
                        .unwrap_or(rest.len());
                    let candidate = &rest[..end];
                    if is_likely_path(candidate) {
                        self.file_stack.push(Some(candidate.to_string()));
                        // Skip the path itself so dots and slashes are not rescanned.
                        for _ in candidate.chars() {
                            chars.next();
                        }
                    } else {
                        self.file_stack.push(None);
                    }
                }
                ')' => {
                    // Unmatched closers are tolerated.
                    self.file_stack.pop();
                }
                _ => {}
            }
        }
    }
}

/// Parses `input` with `options`. See [`LatexParser`].
pub fn parse(input: &str, options: ParseOptions) -> ProcessedLog {
    LatexParser::new(options).parse(input)
}

/// Rejects parentheticals that are not file paths, such as
/// `Latexmk: (Info) ...` or `TeX Live (preloaded format=...)`.
fn is_likely_path(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    let looks_like_path = candidate.starts_with('/')
        || candidate.starts_with('\\')
        || candidate.starts_with('.')
        || (candidate.contains('.') && !candidate.ends_with('.'))
        || candidate.contains('/');
    let blacklisted = matches!(candidate, "Info" | "preloaded" | "TeX" | "con");
    looks_like_path && !blacklisted
}

fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
