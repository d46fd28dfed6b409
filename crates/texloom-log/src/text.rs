/// TeX's default `max_print_line`: log lines of exactly this width were
/// hard-wrapped by the engine and continue on the next line.
pub const DEFAULT_WRAP_WIDTH: usize = 79;

/// Prefixes that always start a fresh log line, even when the previous line
/// was exactly `wrap_width` characters long.
const EVENT_PREFIXES: &[&str] = &[
    "!",
    "(",
    ")",
    "LaTeX Warning:",
    "LaTeX Font Warning:",
    "Package",
    "Class",
    "Overfull",
    "Underfull",
    "LaTeX",
    "Document Class:",
    "L3 programming",
];

/// A log split into logical lines, with TeX's hard wrapping undone.
#[derive(Debug, Clone, Default)]
pub struct LogText {
    lines: Vec<String>,
}

impl LogText {
    /// Splits `input` into lines and rejoins lines the engine wrapped.
    ///
    /// A `wrap_width` of `0` disables unwrapping.
    pub fn new(input: &str, wrap_width: usize) -> Self {
        let mut lines = Vec::new();
        let mut pending: Option<String> = None;

        for raw in input.lines() {
            if pending.is_some() && starts_event(raw) {
                // Guarded joining: a wrapped line never swallows a new event.
                lines.extend(pending.take());
            }

            let wrapped = wrap_width > 0 && raw.chars().count() == wrap_width;
            match pending.as_mut() {
                Some(buf) => buf.push_str(raw),
                None => pending = Some(raw.to_string()),
            }
            if !wrapped {
                lines.extend(pending.take());
            }
        }
        lines.extend(pending);

        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }
}

fn starts_event(line: &str) -> bool {
    EVENT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}
