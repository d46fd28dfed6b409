//! In-process interfaces to the surrounding editor UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use texloom_log::Level;

/// Status bar and error banner. Each holds one value; every call overwrites
/// it and an empty string clears it.
pub trait StatusChannel: Send + Sync {
    fn set_status(&self, text: &str);
    fn set_error(&self, text: &str);
}

/// Gutter id owned by the compile diagnostics.
pub const LATEX_GUTTER: &str = "latex-errors";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GutterMarker {
    pub level: Level,
    pub message: String,
    pub content: String,
}

/// Editor margin annotations.
pub trait GutterSink: Send + Sync {
    fn clear_gutter(&self, gutter_id: &str);
    /// `line` is a 0-based editor row.
    fn set_gutter_marker(&self, line: u32, marker: GutterMarker, gutter_id: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kinds of preview that display the compiled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewer {
    PdfjsCanvas,
    PdfjsSvg,
    Embed,
    Build,
}

impl Viewer {
    pub const ALL: [Viewer; 4] = [
        Viewer::PdfjsCanvas,
        Viewer::PdfjsSvg,
        Viewer::Embed,
        Viewer::Build,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Viewer::PdfjsCanvas => "pdfjs_canvas",
            Viewer::PdfjsSvg => "pdfjs_svg",
            Viewer::Embed => "embed",
            Viewer::Build => "build",
        }
    }

    /// Whether the viewer renders the compiled PDF, as opposed to the build
    /// log.
    pub fn shows_pdf(&self) -> bool {
        !matches!(self, Viewer::Build)
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a frame of the [`ViewHost`] shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Editor,
    Preview(Viewer),
    Other(String),
}

impl FrameKind {
    pub fn shows_pdf(&self) -> bool {
        matches!(self, FrameKind::Preview(viewer) if viewer.shows_pdf())
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Editor => f.write_str("editor"),
            FrameKind::Preview(viewer) => f.write_str(viewer.as_str()),
            FrameKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// Ask a pdf.js view to bring `page` at offset `y` into view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub page: u32,
    pub y: f64,
    pub id: ViewId,
}

/// The frame tree hosting editors and previews.
pub trait ViewHost: Send + Sync {
    /// The pdf.js view used most recently, if any exists.
    fn most_recent_pdfjs(&self) -> Option<ViewId>;

    fn active_view(&self) -> ViewId;

    /// Splits `from` and shows `viewer` in the new half.
    fn split_view(&self, from: &ViewId, viewer: Viewer);

    fn scroll_pdf_into_view(&self, request: ScrollRequest);

    /// Moves the editor cursor to the 1-based `line`.
    fn goto_line(&self, line: u32, focus: bool, align: bool);

    /// Cursor of `id` as 0-based (line, column), if `id` is an editor.
    fn editor_cursor(&self, id: &ViewId) -> Option<(u32, u32)>;

    /// Publishes a sync request for a non-editor view to act on.
    fn request_sync(&self, id: &ViewId);

    /// The cached document for `viewer` changed; reload with `version`.
    fn reload(&self, viewer: Viewer, version: u64);

    /// `None` when the host has no frame `id`.
    fn frame_kind(&self, id: &ViewId) -> Option<FrameKind>;

    /// Offers the project file at `path` as a download.
    fn download_file(&self, project_id: &str, path: &Path);

    fn print_editor(&self, id: &ViewId);

    /// Opens the project PDF at `path` for printing.
    fn print_document(&self, project_id: &str, path: &Path);

    fn zoom_page_width(&self, id: &ViewId);

    fn zoom_page_height(&self, id: &ViewId);
}
