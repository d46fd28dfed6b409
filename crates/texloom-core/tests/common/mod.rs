#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use texloom_core::cache::{PdfCache, PdfDocument};
use texloom_core::synctex::{SyncRecord, SyncService};
use texloom_core::tools::{BuildTools, ExecOutput};
use texloom_core::ui::{
    FrameKind, GutterMarker, GutterSink, ScrollRequest, StatusChannel, ViewHost, ViewId, Viewer,
};
use texloom_core::{
    BuildTarget, CacheKey, Collaborators, LogStoreReader, Orchestrator, Timestamp, ToolKey,
};
use texloom_log::ParseOptions;

pub fn output(stdout: &str) -> ExecOutput {
    ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: 0,
    }
}

/// Toolchain fake. `Err` replies simulate a tool that could not be launched.
#[derive(Default)]
pub struct FakeTools {
    pub latex: Mutex<Option<Result<ExecOutput, String>>>,
    pub bibtex: Mutex<Option<Result<ExecOutput, String>>>,
    pub sagetex: Mutex<Option<Result<ExecOutput, String>>>,
    pub clean_lines: Vec<String>,
    pub clean_error: Option<String>,
    pub delay: Option<Duration>,
    /// `start <tool>` / `end <tool>` in call order.
    pub events: Mutex<Vec<String>>,
    pub times: Mutex<Vec<Option<Timestamp>>>,
    /// When set, the `clean` entry is read back after every streamed line.
    pub observer: Mutex<Option<LogStoreReader>>,
    pub observed: Mutex<Vec<String>>,
}

impl FakeTools {
    pub fn compiling(stdout: &str) -> Self {
        Self {
            latex: Mutex::new(Some(Ok(output(stdout)))),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    async fn reply(
        &self,
        tool: &str,
        slot: &Mutex<Option<Result<ExecOutput, String>>>,
        time: Option<Timestamp>,
    ) -> Result<ExecOutput> {
        self.events.lock().unwrap().push(format!("start {tool}"));
        self.times.lock().unwrap().push(time);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.events.lock().unwrap().push(format!("end {tool}"));
        let reply = slot.lock().unwrap().clone();
        match reply {
            Some(Ok(out)) => Ok(out),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(output("")),
        }
    }
}

#[async_trait]
impl BuildTools for FakeTools {
    async fn latexmk(&self, _target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput> {
        self.reply("latex", &self.latex, time).await
    }

    async fn bibtex(&self, _target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput> {
        self.reply("bibtex", &self.bibtex, time).await
    }

    async fn sagetex(&self, _target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput> {
        self.reply("sagetex", &self.sagetex, time).await
    }

    async fn clean(
        &self,
        _target: &BuildTarget,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<()> {
        self.events.lock().unwrap().push("start clean".into());
        for line in &self.clean_lines {
            on_line(line);
            let seen = self
                .observer
                .lock()
                .unwrap()
                .as_ref()
                .and_then(|reader| reader.get(ToolKey::Clean))
                .map(|log| log.stdout);
            if let Some(stdout) = seen {
                self.observed.lock().unwrap().push(stdout);
            }
        }
        self.events.lock().unwrap().push("end clean".into());
        match &self.clean_error {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

/// Synctex fake answering every query with one record.
#[derive(Default)]
pub struct FakeSync {
    pub reply: Option<SyncRecord>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSync {
    pub fn answering(pairs: &[(&str, &str)]) -> Self {
        Self {
            reply: Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    fn answer(&self) -> Result<SyncRecord> {
        self.reply.clone().ok_or_else(|| anyhow!("synctex is not installed"))
    }
}

#[async_trait]
impl SyncService for FakeSync {
    async fn tex_to_pdf(
        &self,
        project_id: &str,
        tex_path: &Path,
        pdf_path: &Path,
        line: u32,
        column: u32,
    ) -> Result<SyncRecord> {
        self.calls.lock().unwrap().push(format!(
            "view {project_id} {line}:{column}:{} {}",
            tex_path.display(),
            pdf_path.display()
        ));
        self.answer()
    }

    async fn pdf_to_tex(
        &self,
        project_id: &str,
        pdf_path: &Path,
        page: u32,
        x: f64,
        y: f64,
    ) -> Result<SyncRecord> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("edit {project_id} {page}:{x}:{y}:{}", pdf_path.display()));
        self.answer()
    }
}

/// Cache fake holding keys only.
#[derive(Default)]
pub struct FakeCache {
    pub entries: Mutex<BTreeSet<CacheKey>>,
    pub forgotten: Mutex<Vec<CacheKey>>,
}

impl FakeCache {
    pub fn insert(&self, key: CacheKey) {
        self.entries.lock().unwrap().insert(key);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl PdfCache for FakeCache {
    async fn forget(&self, key: &CacheKey) {
        self.forgotten.lock().unwrap().push(key.clone());
        self.entries.lock().unwrap().remove(key);
    }

    async fn load(&self, key: &CacheKey) -> Result<Arc<PdfDocument>> {
        if !self.contains(key) {
            return Err(anyhow!("no such document {key}"));
        }
        Ok(Arc::new(PdfDocument {
            key: key.clone(),
            bytes: Vec::new(),
            fingerprint: String::new(),
        }))
    }
}

/// Records everything the orchestrator shows to the user.
#[derive(Default)]
pub struct RecordingUi {
    pub statuses: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub gutters: Mutex<HashMap<String, BTreeMap<u32, GutterMarker>>>,
    pub pdfjs: Mutex<Option<ViewId>>,
    /// Whether splitting the active view creates a pdf.js preview.
    pub split_creates_pdfjs: bool,
    pub splits: Mutex<Vec<(ViewId, Viewer)>>,
    pub scrolls: Mutex<Vec<ScrollRequest>>,
    pub gotos: Mutex<Vec<(u32, bool, bool)>>,
    pub cursors: HashMap<ViewId, (u32, u32)>,
    pub sync_requests: Mutex<Vec<ViewId>>,
    pub reloads: Mutex<Vec<(Viewer, u64)>>,
    pub frames: HashMap<ViewId, FrameKind>,
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
    /// `editor <id>` or `pdf <project>/<path>` per print request.
    pub prints: Mutex<Vec<String>>,
    pub zooms: Mutex<Vec<(ViewId, &'static str)>>,
}

impl RecordingUi {
    pub fn status(&self) -> String {
        self.statuses.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn error(&self) -> String {
        self.errors.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn gutter(&self, id: &str) -> BTreeMap<u32, GutterMarker> {
        self.gutters
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

impl StatusChannel for RecordingUi {
    fn set_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }

    fn set_error(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }
}

impl GutterSink for RecordingUi {
    fn clear_gutter(&self, gutter_id: &str) {
        self.gutters.lock().unwrap().remove(gutter_id);
    }

    fn set_gutter_marker(&self, line: u32, marker: GutterMarker, gutter_id: &str) {
        self.gutters
            .lock()
            .unwrap()
            .entry(gutter_id.to_string())
            .or_default()
            .insert(line, marker);
    }
}

impl ViewHost for RecordingUi {
    fn most_recent_pdfjs(&self) -> Option<ViewId> {
        self.pdfjs.lock().unwrap().clone()
    }

    fn active_view(&self) -> ViewId {
        ViewId::new("editor-1")
    }

    fn split_view(&self, from: &ViewId, viewer: Viewer) {
        self.splits.lock().unwrap().push((from.clone(), viewer));
        if self.split_creates_pdfjs {
            *self.pdfjs.lock().unwrap() = Some(ViewId::new("pdfjs-split"));
        }
    }

    fn scroll_pdf_into_view(&self, request: ScrollRequest) {
        self.scrolls.lock().unwrap().push(request);
    }

    fn goto_line(&self, line: u32, focus: bool, align: bool) {
        self.gotos.lock().unwrap().push((line, focus, align));
    }

    fn editor_cursor(&self, id: &ViewId) -> Option<(u32, u32)> {
        self.cursors.get(id).copied()
    }

    fn request_sync(&self, id: &ViewId) {
        self.sync_requests.lock().unwrap().push(id.clone());
    }

    fn reload(&self, viewer: Viewer, version: u64) {
        self.reloads.lock().unwrap().push((viewer, version));
    }

    fn frame_kind(&self, id: &ViewId) -> Option<FrameKind> {
        self.frames.get(id).cloned()
    }

    fn download_file(&self, project_id: &str, path: &Path) {
        self.downloads
            .lock()
            .unwrap()
            .push((project_id.to_string(), path.to_path_buf()));
    }

    fn print_editor(&self, id: &ViewId) {
        self.prints.lock().unwrap().push(format!("editor {id}"));
    }

    fn print_document(&self, project_id: &str, path: &Path) {
        self.prints
            .lock()
            .unwrap()
            .push(format!("pdf {project_id}/{}", path.display()));
    }

    fn zoom_page_width(&self, id: &ViewId) {
        self.zooms.lock().unwrap().push((id.clone(), "width"));
    }

    fn zoom_page_height(&self, id: &ViewId) {
        self.zooms.lock().unwrap().push((id.clone(), "height"));
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub tools: Arc<FakeTools>,
    pub sync: Arc<FakeSync>,
    pub cache: Arc<FakeCache>,
    pub ui: Arc<RecordingUi>,
}

pub fn harness(target: BuildTarget, tools: FakeTools) -> Harness {
    harness_with(target, tools, FakeSync::default(), RecordingUi::default())
}

pub fn harness_with(
    target: BuildTarget,
    tools: FakeTools,
    sync: FakeSync,
    ui: RecordingUi,
) -> Harness {
    let tools = Arc::new(tools);
    let sync = Arc::new(sync);
    let cache = Arc::new(FakeCache::default());
    let ui = Arc::new(ui);
    let orchestrator = Orchestrator::new(
        target,
        ParseOptions::default().ignore_duplicates(true),
        Collaborators {
            tools: tools.clone(),
            sync: sync.clone(),
            cache: cache.clone(),
            gutters: ui.clone(),
            status: ui.clone(),
            views: ui.clone(),
        },
    );
    Harness {
        orchestrator,
        tools,
        sync,
        cache,
        ui,
    }
}
