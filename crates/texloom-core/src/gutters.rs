use crate::target::BuildTarget;
use crate::ui::GutterMarker;
use std::path::Path;
use texloom_log::{Diagnostic, Level, ProcessedLog};

/// Group order used when drawing; later groups win on a shared row.
const DRAW_ORDER: [Level; 3] = [Level::Typesetting, Level::Warning, Level::Error];

/// Markers for the diagnostics of `log` that belong to `target`'s document,
/// as (0-based row, marker) pairs.
pub fn markers(target: &BuildTarget, log: &ProcessedLog) -> Vec<(u32, GutterMarker)> {
    DRAW_ORDER
        .iter()
        .flat_map(|level| log.group(*level))
        .filter(|d| in_document(target, d))
        .filter_map(|d| {
            let line = d.line.filter(|l| *l > 0)?;
            Some((
                line - 1,
                GutterMarker {
                    level: d.level,
                    message: d.message.clone(),
                    content: d.content.clone(),
                },
            ))
        })
        .collect()
}

/// Matches by file name only; TeX reports paths relative to wherever it was
/// run from. A diagnostic without a file is taken to be the document's.
fn in_document(target: &BuildTarget, diagnostic: &Diagnostic) -> bool {
    match &diagnostic.file {
        None => true,
        Some(file) => Path::new(file).file_name() == target.file_name(),
    }
}
