//! Sequencing of build actions for one document.

use crate::action::BuildAction;
use crate::cache::PdfCache;
use crate::error::BuildError;
use crate::fatal;
use crate::gutters;
use crate::mapper::{PdfPosition, PositionMapper, SourcePosition};
use crate::store::{BuildLog, LogStoreReader, LogStoreWriter, ToolKey};
use crate::synctex::SyncService;
use crate::target::{BuildTarget, CacheKey, Timestamp};
use crate::tools::{BuildTools, ExecOutput};
use crate::ui::{
    FrameKind, GutterSink, ScrollRequest, StatusChannel, ViewHost, ViewId, Viewer, LATEX_GUTTER,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use texloom_log::ParseOptions;
use tokio::sync::watch;

/// Everything outside the core that the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub tools: Arc<dyn BuildTools>,
    pub sync: Arc<dyn SyncService>,
    pub cache: Arc<dyn PdfCache>,
    pub gutters: Arc<dyn GutterSink>,
    pub status: Arc<dyn StatusChannel>,
    pub views: Arc<dyn ViewHost>,
}

/// Progress of the most recent build action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "tool", rename_all = "lowercase")]
pub enum BuildState {
    Idle,
    Running(ToolKey),
    Succeeded(ToolKey),
    Failed(ToolKey),
}

/// Runs build actions and position lookups for a single [`BuildTarget`].
///
/// Build actions are serialized: each holds the run guard from start to
/// finish, so a second request waits for the first instead of interleaving
/// its store updates. Position lookups do not take the guard.
///
/// Every action reports its failure to the status channel before returning
/// it; the returned error is informational. A compile that produced no output
/// is reported but still returns `Ok`, since its log and gutters were applied.
pub struct Orchestrator {
    target: BuildTarget,
    options: ParseOptions,
    tools: Arc<dyn BuildTools>,
    cache: Arc<dyn PdfCache>,
    gutters: Arc<dyn GutterSink>,
    status: Arc<dyn StatusChannel>,
    views: Arc<dyn ViewHost>,
    mapper: PositionMapper,
    store: LogStoreWriter,
    state: watch::Sender<BuildState>,
    run_guard: tokio::sync::Mutex<()>,
    last_save: Mutex<Option<Timestamp>>,
    versions: Mutex<BTreeMap<Viewer, u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Orchestrator {
    pub fn new(target: BuildTarget, options: ParseOptions, collaborators: Collaborators) -> Self {
        let (state, _) = watch::channel(BuildState::Idle);
        Self {
            target,
            options,
            tools: collaborators.tools,
            cache: collaborators.cache,
            gutters: collaborators.gutters,
            status: collaborators.status,
            views: collaborators.views,
            mapper: PositionMapper::new(collaborators.sync),
            store: LogStoreWriter::new(),
            state,
            run_guard: tokio::sync::Mutex::new(()),
            last_save: Mutex::new(None),
            versions: Mutex::new(Viewer::ALL.iter().map(|v| (*v, 0)).collect()),
        }
    }

    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// Read-only handle on the build logs.
    pub fn logs(&self) -> LogStoreReader {
        self.store.subscribe()
    }

    pub fn state(&self) -> BuildState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<BuildState> {
        self.state.subscribe()
    }

    pub fn last_save_time(&self) -> Option<Timestamp> {
        *lock(&self.last_save)
    }

    pub fn reload_version(&self, viewer: Viewer) -> u64 {
        lock(&self.versions).get(&viewer).copied().unwrap_or_default()
    }

    /// Cache key of the document `viewer` currently shows.
    pub fn cache_key(&self, viewer: Viewer) -> CacheKey {
        self.target.cache_key(self.reload_version(viewer))
    }

    /// The document was written to disk at `time`; recompile.
    pub async fn on_save_to_disk(&self, time: Timestamp) -> Result<(), BuildError> {
        *lock(&self.last_save) = Some(time);
        self.run_latexmk(Some(time)).await
    }

    /// Runs the action named `action`, stamped with the current time.
    pub async fn build_action(&self, action: &str) -> Result<(), BuildError> {
        let action = action.parse::<BuildAction>().map_err(|e| self.report(e))?;
        self.run(action, Some(Timestamp::now())).await
    }

    pub async fn run(&self, action: BuildAction, time: Option<Timestamp>) -> Result<(), BuildError> {
        match action {
            BuildAction::Recompile => self.run_latexmk(time).await,
            BuildAction::Latex => self.run_latex(time).await,
            BuildAction::Bibtex => self.run_bibtex(time).await,
            BuildAction::Sagetex => self.run_sagetex(time).await,
            BuildAction::Clean => self.run_clean().await,
        }
    }

    pub async fn run_latexmk(&self, time: Option<Timestamp>) -> Result<(), BuildError> {
        self.run_latex(time).await
    }

    /// Compiles the document, then refreshes logs, gutters and previews.
    pub async fn run_latex(&self, time: Option<Timestamp>) -> Result<(), BuildError> {
        let _guard = self.run_guard.lock().await;
        self.status.set_status("Running LaTeX...");
        self.status.set_error("");
        self.store.clear();
        self.set_state(BuildState::Running(ToolKey::Latex));

        let time = self.stamp(time);
        let result = self.tools.latexmk(&self.target, time).await;
        self.status.set_status("");
        let output = match result {
            Ok(output) => output,
            Err(err) => return Err(self.fail(ToolKey::Latex, BuildError::tool(err))),
        };
        log::info!("{}: latexmk exited with {}", self.target, output.exit_code);

        let parse = texloom_log::parse(&output.stdout, self.options);
        let markers = gutters::markers(&self.target, &parse);
        self.store
            .set(ToolKey::Latex, BuildLog::from(output).with_parse(parse));

        let fatal = self.store.read(fatal::classify);

        self.gutters.clear_gutter(LATEX_GUTTER);
        for (line, marker) in markers {
            self.gutters.set_gutter_marker(line, marker, LATEX_GUTTER);
        }

        self.invalidate_previews().await;

        // Reported only. The log, gutters and previews above stay applied.
        match fatal {
            Some(warning) => {
                self.fail(ToolKey::Latex, BuildError::FatalCompile(warning));
            }
            None => self.set_state(BuildState::Succeeded(ToolKey::Latex)),
        }
        Ok(())
    }

    pub async fn run_bibtex(&self, time: Option<Timestamp>) -> Result<(), BuildError> {
        let _guard = self.run_guard.lock().await;
        let time = self.stamp(time);
        self.run_auxiliary(
            ToolKey::Bibtex,
            "Running BibTeX...",
            self.tools.bibtex(&self.target, time),
        )
        .await
    }

    pub async fn run_sagetex(&self, time: Option<Timestamp>) -> Result<(), BuildError> {
        let _guard = self.run_guard.lock().await;
        let time = self.stamp(time);
        self.run_auxiliary(
            ToolKey::Sagetex,
            "Running SageTeX...",
            self.tools.sagetex(&self.target, time),
        )
        .await
    }

    /// Caller holds the run guard.
    async fn run_auxiliary(
        &self,
        key: ToolKey,
        status: &str,
        run: impl Future<Output = anyhow::Result<ExecOutput>>,
    ) -> Result<(), BuildError> {
        self.status.set_status(status);
        self.set_state(BuildState::Running(key));
        let result = run.await;
        self.status.set_status("");
        match result {
            Ok(output) => {
                log::info!("{}: {} exited with {}", self.target, key, output.exit_code);
                self.store.set(key, output.into());
                self.set_state(BuildState::Succeeded(key));
                Ok(())
            }
            Err(err) => Err(self.fail(key, BuildError::tool(err))),
        }
    }

    /// Removes auxiliary files. Each line the cleanup reports replaces the
    /// `clean` log with everything reported so far.
    pub async fn run_clean(&self) -> Result<(), BuildError> {
        let _guard = self.run_guard.lock().await;
        *lock(&self.last_save) = None;
        self.store.clear();
        self.status.set_status("Cleaning up auxiliary files...");
        self.set_state(BuildState::Running(ToolKey::Clean));

        let store = &self.store;
        let mut buffer = String::new();
        let mut on_line = |line: &str| {
            buffer.push_str(line);
            buffer.push('\n');
            store.set(ToolKey::Clean, BuildLog::streamed(buffer.as_str()));
        };
        let result = self.tools.clean(&self.target, &mut on_line).await;
        self.status.set_status("");

        match result {
            Ok(()) => {
                self.set_state(BuildState::Succeeded(ToolKey::Clean));
                Ok(())
            }
            Err(err) => {
                let err =
                    BuildError::ToolLaunch(format!("Error cleaning auxiliary files -- {err:#}"));
                Err(self.fail(ToolKey::Clean, err))
            }
        }
    }

    /// Inverse search: moves the editor to the source of a PDF position.
    pub async fn synctex_pdf_to_tex(
        &self,
        page: u32,
        x: f64,
        y: f64,
    ) -> Result<SourcePosition, BuildError> {
        self.status.set_status("Running SyncTex...");
        let result = self.mapper.output_to_source(&self.target, page, x, y).await;
        self.status.set_status("");
        let position = result.map_err(|e| self.report(e))?;
        // Multi-file documents are not supported: `position.file` is not
        // consulted and the open document is always the one navigated.
        self.views.goto_line(position.line, true, true);
        Ok(position)
    }

    /// Forward search: scrolls a pdf.js preview to a source position,
    /// opening one next to the active view if none exists.
    ///
    /// `line` and `column` are 0-based editor coordinates.
    pub async fn synctex_tex_to_pdf(
        &self,
        line: u32,
        column: u32,
        source_path: &Path,
    ) -> Result<PdfPosition, BuildError> {
        self.status.set_status("Running SyncTex from tex to pdf...");
        let result = self
            .mapper
            .source_to_output(&self.target, line, column, source_path)
            .await;
        self.status.set_status("");
        let position = result.map_err(|e| self.report(e))?;

        let id = match self.views.most_recent_pdfjs() {
            Some(id) => id,
            None => {
                self.views
                    .split_view(&self.views.active_view(), Viewer::PdfjsCanvas);
                self.views.most_recent_pdfjs().ok_or_else(|| {
                    self.report(BuildError::InvariantViolation(
                        "there must be a pdfjs frame.".to_string(),
                    ))
                })?
            }
        };
        self.views.scroll_pdf_into_view(ScrollRequest {
            page: position.page,
            y: position.y,
            id,
        });
        Ok(position)
    }

    /// Forward search from the cursor of editor `id`. `Ok(None)` when `id`
    /// is not an editor.
    pub async fn forward_search(&self, id: &ViewId) -> Result<Option<PdfPosition>, BuildError> {
        let Some((line, column)) = self.views.editor_cursor(id) else {
            return Ok(None);
        };
        let path = self.target.path().to_path_buf();
        self.synctex_tex_to_pdf(line, column, &path).await.map(Some)
    }

    /// The sync button of view `id`: editors search forward themselves,
    /// previews are asked to do the work.
    pub async fn sync(&self, id: &ViewId) -> Result<(), BuildError> {
        if self.views.editor_cursor(id).is_some() {
            self.forward_search(id).await?;
        } else {
            self.views.request_sync(id);
        }
        Ok(())
    }

    /// The download button of frame `id`. Only PDF previews have one.
    pub fn download(&self, id: &ViewId) -> Result<(), BuildError> {
        if !self.frame(id)?.shows_pdf() {
            return Err(self.report(BuildError::InvariantViolation(
                "download button only implemented for pdf".to_string(),
            )));
        }
        self.views
            .download_file(self.target.project_id(), &self.target.pdf_path());
        Ok(())
    }

    /// The print button of frame `id`: editors print their source, PDF
    /// previews print the compiled document.
    pub fn print(&self, id: &ViewId) -> Result<(), BuildError> {
        match self.frame(id)? {
            FrameKind::Editor => self.views.print_editor(id),
            kind if kind.shows_pdf() => self.print_pdf(),
            kind => {
                return Err(self.report(BuildError::InvariantViolation(format!(
                    "printing not implemented for frame of type {kind}"
                ))))
            }
        }
        Ok(())
    }

    pub fn print_pdf(&self) {
        self.views
            .print_document(self.target.project_id(), &self.target.pdf_path());
    }

    pub fn zoom_page_width(&self, id: &ViewId) {
        self.views.zoom_page_width(id);
    }

    pub fn zoom_page_height(&self, id: &ViewId) {
        self.views.zoom_page_height(id);
    }

    fn frame(&self, id: &ViewId) -> Result<FrameKind, BuildError> {
        self.views.frame_kind(id).ok_or_else(|| {
            self.report(BuildError::InvariantViolation(format!(
                "no frame with id \"{id}\""
            )))
        })
    }

    /// Drops the cached document before the editor goes away.
    pub async fn close(&self) {
        for key in self.current_cache_keys() {
            self.cache.forget(&key).await;
        }
    }

    fn current_cache_keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = lock(&self.versions)
            .values()
            .map(|v| self.target.cache_key(*v))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Forgets every cached document of this target, then moves each viewer
    /// to a fresh version so it reloads.
    async fn invalidate_previews(&self) {
        for key in self.current_cache_keys() {
            self.cache.forget(&key).await;
        }
        let bumped: Vec<(Viewer, u64)> = {
            let mut versions = lock(&self.versions);
            versions
                .iter_mut()
                .map(|(viewer, version)| {
                    *version += 1;
                    (*viewer, *version)
                })
                .collect()
        };
        for (viewer, version) in bumped {
            self.views.reload(viewer, version);
        }
    }

    fn stamp(&self, time: Option<Timestamp>) -> Option<Timestamp> {
        time.or_else(|| self.last_save_time())
    }

    fn set_state(&self, state: BuildState) {
        self.state.send_replace(state);
    }

    fn report(&self, err: BuildError) -> BuildError {
        log::warn!("{}: {}", self.target, err);
        self.status.set_error(&err.to_string());
        err
    }

    fn fail(&self, key: ToolKey, err: BuildError) -> BuildError {
        self.set_state(BuildState::Failed(key));
        self.report(err)
    }
}
