//! # texloom Core
//!
//! Build orchestration for a LaTeX document: runs the toolchain, keeps the
//! per-tool build logs, turns compiler output into gutter markers, notices
//! compiles that produced no PDF, and maps positions between source and PDF.
//!
//! ## Modules
//!
//! - [`orchestrator`] - the build actions and their state machine
//! - [`store`] - build logs keyed by tool, single writer with read-only handles
//! - [`fatal`] - "no output PDF" detection
//! - [`mapper`] / [`synctex`] - forward and inverse search
//! - [`tools`] / [`exec`] - the toolchain contract and its process-backed form
//! - [`cache`] - rendered-output cache shared by the previews
//! - [`ui`] - status bar, gutters and views, as the orchestrator sees them
//!
//! ## Collaborators
//!
//! The orchestrator owns no I/O of its own. Everything it touches is a trait
//! object in [`Collaborators`], so the CLI wires in processes and a console
//! while tests wire in recording fakes.
//!
//! ```no_run
//! use std::sync::Arc;
//! use texloom_core::{
//!     BuildTarget, Collaborators, Config, MemoryPdfCache, Orchestrator, ProcessTools, SynctexCli,
//! };
//! # use texloom_core::ui::{GutterSink, StatusChannel, ViewHost};
//! # async fn demo(
//! #     gutters: Arc<dyn GutterSink>,
//! #     status: Arc<dyn StatusChannel>,
//! #     views: Arc<dyn ViewHost>,
//! # ) {
//! let config = Config::load();
//! let collaborators = Collaborators {
//!     tools: Arc::new(ProcessTools::new(config.clone())),
//!     sync: Arc::new(SynctexCli::new(config.clone())),
//!     cache: Arc::new(MemoryPdfCache::new(config.clone())),
//!     gutters,
//!     status,
//!     views,
//! };
//! let orchestrator = Orchestrator::new(
//!     BuildTarget::new("thesis", "main.tex"),
//!     config.parse_options(),
//!     collaborators,
//! );
//! let _ = orchestrator.build_action("recompile").await;
//! println!("{:?}", orchestrator.logs().snapshot());
//! # }
//! ```

pub mod action;
pub mod cache;
pub mod config;
pub mod error;
pub mod exec;
pub mod fatal;
pub mod gutters;
pub mod mapper;
pub mod orchestrator;
pub mod store;
pub mod synctex;
pub mod target;
pub mod tools;
pub mod ui;

pub use action::BuildAction;
pub use cache::{MemoryPdfCache, PdfCache, PdfDocument};
pub use config::{Config, ToolCommand};
pub use error::BuildError;
pub use exec::ProcessTools;
pub use mapper::{PdfPosition, PositionMapper, SourcePosition};
pub use orchestrator::{BuildState, Collaborators, Orchestrator};
pub use store::{BuildLog, BuildLogStore, LogStoreReader, ToolKey};
pub use synctex::{SyncRecord, SyncService, SynctexCli};
pub use target::{BuildTarget, CacheKey, Timestamp};
pub use tools::{BuildTools, ExecOutput};
