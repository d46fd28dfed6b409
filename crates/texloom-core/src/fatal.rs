//! Detection of compiles that ran but could not produce a PDF.

use crate::store::{BuildLogStore, ToolKey};
use texloom_log::ProcessedLog;

/// Phrase TeX prints when it gives up without writing output.
pub const NO_OUTPUT_SENTINEL: &str = "no output PDF";

pub const FATAL_BANNER: &str = "WARNING: Your LaTeX file is badly misformatted; it is not possible to generate a useful PDF file.";

/// Checks the `latex` entry of `store` for a fatal compile.
pub fn classify(store: &BuildLogStore) -> Option<String> {
    let parse = store.get(ToolKey::Latex)?.parse.as_ref()?;
    classify_log(parse)
}

/// Looks only at the last error: TeX reports the fatal condition after
/// everything else.
pub fn classify_log(log: &ProcessedLog) -> Option<String> {
    let last = log.errors.last()?;
    let text = format!("{}{}", last.message, last.content);
    if !text.contains(NO_OUTPUT_SENTINEL) {
        return None;
    }

    let mut excerpt = text.as_str();
    if let Some(start) = excerpt.find("Fatal error") {
        excerpt = &excerpt[start..];
    }
    if let Some(bang) = excerpt.find('!') {
        excerpt = &excerpt[..=bang];
    }
    Some(format!("{FATAL_BANNER}\n{}", excerpt.trim()))
}
