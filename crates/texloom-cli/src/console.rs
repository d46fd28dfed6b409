//! Terminal stand-ins for the editor UI.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use texloom_core::ui::{
    FrameKind, GutterMarker, GutterSink, ScrollRequest, StatusChannel, ViewHost, ViewId, Viewer,
};

/// View id the console reports as its editor.
pub const EDITOR: &str = "editor";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Prints status and errors to stderr and keeps gutters in memory.
#[derive(Default)]
pub struct ConsoleUi {
    gutters: Mutex<BTreeMap<String, BTreeMap<u32, GutterMarker>>>,
    pdfjs: Mutex<Option<ViewId>>,
    cursor: Option<(u32, u32)>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// An editor whose cursor sits at the 0-based (`line`, `column`).
    pub fn with_cursor(line: u32, column: u32) -> Self {
        Self {
            cursor: Some((line, column)),
            ..Self::default()
        }
    }

    pub fn print_gutter(&self, gutter_id: &str) {
        let gutters = lock(&self.gutters);
        let Some(markers) = gutters.get(gutter_id) else {
            return;
        };
        for (row, marker) in markers {
            eprintln!("{:>5} | {}: {}", row + 1, marker.level.as_str(), marker.message);
        }
    }
}

impl StatusChannel for ConsoleUi {
    fn set_status(&self, text: &str) {
        if !text.is_empty() {
            eprintln!("{text}");
        }
    }

    fn set_error(&self, text: &str) {
        if !text.is_empty() {
            eprintln!("error: {text}");
        }
    }
}

impl GutterSink for ConsoleUi {
    fn clear_gutter(&self, gutter_id: &str) {
        lock(&self.gutters).remove(gutter_id);
    }

    fn set_gutter_marker(&self, line: u32, marker: GutterMarker, gutter_id: &str) {
        lock(&self.gutters)
            .entry(gutter_id.to_string())
            .or_default()
            .insert(line, marker);
    }
}

impl ViewHost for ConsoleUi {
    fn most_recent_pdfjs(&self) -> Option<ViewId> {
        lock(&self.pdfjs).clone()
    }

    fn active_view(&self) -> ViewId {
        ViewId::new(EDITOR)
    }

    fn split_view(&self, from: &ViewId, viewer: Viewer) {
        log::debug!("Opening {} next to {}", viewer, from);
        *lock(&self.pdfjs) = Some(ViewId::new(viewer.as_str()));
    }

    fn scroll_pdf_into_view(&self, request: ScrollRequest) {
        eprintln!("{}: page {}, y = {}", request.id, request.page, request.y);
    }

    fn goto_line(&self, line: u32, _focus: bool, _align: bool) {
        eprintln!("{EDITOR}: line {line}");
    }

    fn editor_cursor(&self, id: &ViewId) -> Option<(u32, u32)> {
        if id.0 == EDITOR {
            self.cursor
        } else {
            None
        }
    }

    fn request_sync(&self, id: &ViewId) {
        log::info!("Sync requested from {}", id);
    }

    fn reload(&self, viewer: Viewer, version: u64) {
        log::debug!("{} now at version {}", viewer, version);
    }

    fn frame_kind(&self, id: &ViewId) -> Option<FrameKind> {
        if id.0 == EDITOR {
            return Some(FrameKind::Editor);
        }
        Viewer::ALL
            .into_iter()
            .find(|viewer| viewer.as_str() == id.0)
            .map(FrameKind::Preview)
    }

    fn download_file(&self, project_id: &str, path: &Path) {
        println!("{}", Path::new(project_id).join(path).display());
    }

    fn print_editor(&self, id: &ViewId) {
        log::warn!("{} has no printer attached", id);
    }

    fn print_document(&self, project_id: &str, path: &Path) {
        log::warn!(
            "No printer attached for {}",
            Path::new(project_id).join(path).display()
        );
    }

    fn zoom_page_width(&self, id: &ViewId) {
        log::debug!("{}: zoom to page width", id);
    }

    fn zoom_page_height(&self, id: &ViewId) {
        log::debug!("{}: zoom to page height", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texloom_log::Level;

    fn marker(message: &str) -> GutterMarker {
        GutterMarker {
            level: Level::Error,
            message: message.into(),
            content: String::new(),
        }
    }

    #[test]
    fn gutter_is_replaced_after_clear() {
        let ui = ConsoleUi::new();
        ui.set_gutter_marker(2, marker("a"), "g");
        ui.clear_gutter("g");
        ui.set_gutter_marker(5, marker("b"), "g");
        let gutters = lock(&ui.gutters);
        assert_eq!(gutters["g"].keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn split_creates_a_preview() {
        let ui = ConsoleUi::with_cursor(0, 0);
        assert_eq!(ui.most_recent_pdfjs(), None);
        ui.split_view(&ui.active_view(), Viewer::PdfjsCanvas);
        assert_eq!(ui.most_recent_pdfjs(), Some(ViewId::new("pdfjs_canvas")));
        assert_eq!(ui.editor_cursor(&ViewId::new(EDITOR)), Some((0, 0)));
        assert_eq!(ui.editor_cursor(&ViewId::new("pdfjs_canvas")), None);
    }

    #[test]
    fn frames_are_the_editor_and_named_viewers() {
        let ui = ConsoleUi::new();
        assert_eq!(ui.frame_kind(&ViewId::new(EDITOR)), Some(FrameKind::Editor));
        assert_eq!(
            ui.frame_kind(&ViewId::new("embed")),
            Some(FrameKind::Preview(Viewer::Embed))
        );
        assert_eq!(ui.frame_kind(&ViewId::new("other")), None);
    }
}
