//! Forward and inverse search on top of a [`SyncService`].

use crate::error::BuildError;
use crate::synctex::{SyncRecord, SyncService};
use crate::target::BuildTarget;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Where a source position landed in the compiled output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfPosition {
    pub page: u32,
    pub y: f64,
}

/// Where an output position came from in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// 1-based.
    pub line: u32,
    /// The input file synctex reported. Navigation ignores it and stays in
    /// the open document; multi-file documents are not supported yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

pub struct PositionMapper {
    service: Arc<dyn SyncService>,
}

impl PositionMapper {
    pub fn new(service: Arc<dyn SyncService>) -> Self {
        Self { service }
    }

    /// `line` and `column` are 0-based editor coordinates.
    pub async fn source_to_output(
        &self,
        target: &BuildTarget,
        line: u32,
        column: u32,
        source_path: &Path,
    ) -> Result<PdfPosition, BuildError> {
        let record = self
            .service
            .tex_to_pdf(
                target.project_id(),
                source_path,
                &target.pdf_path(),
                line.saturating_add(1),
                column.saturating_add(1),
            )
            .await
            .map_err(BuildError::tool)?;
        interpret_forward(&record)
    }

    pub async fn output_to_source(
        &self,
        target: &BuildTarget,
        page: u32,
        x: f64,
        y: f64,
    ) -> Result<SourcePosition, BuildError> {
        let record = self
            .service
            .pdf_to_tex(target.project_id(), &target.pdf_path(), page, x, y)
            .await
            .map_err(BuildError::tool)?;
        interpret_inverse(&record)
    }
}

fn field<'a>(record: &'a SyncRecord, key: &str) -> Result<&'a str, BuildError> {
    record
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| BuildError::InvalidResponse(format!("missing {key}")))
}

pub fn interpret_forward(record: &SyncRecord) -> Result<PdfPosition, BuildError> {
    let page_text = field(record, "Page")?;
    let page = page_text
        .parse::<u32>()
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| BuildError::InvalidResponse(format!("page='{page_text}'")))?;

    let y_text = field(record, "y")?;
    let y = y_text
        .parse::<f64>()
        .ok()
        .filter(|y| y.is_finite())
        .ok_or_else(|| BuildError::InvalidResponse(format!("y='{y_text}'")))?;

    Ok(PdfPosition { page, y })
}

pub fn interpret_inverse(record: &SyncRecord) -> Result<SourcePosition, BuildError> {
    let line_text = field(record, "Line")?;
    let line = line_text
        .parse::<u32>()
        .ok()
        .filter(|l| *l >= 1)
        .ok_or_else(|| BuildError::InvalidResponse(format!("line='{line_text}'")))?;

    let file = record
        .get("Input")
        .filter(|f| !f.is_empty())
        .cloned();
    Ok(SourcePosition { line, file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn record(pairs: &[(&str, &str)]) -> SyncRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[derive(Default)]
    struct FakeSync {
        reply: Option<SyncRecord>,
        calls: Mutex<Vec<String>>,
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
        ) -> anyhow::Result<SyncRecord> {
            self.calls.lock().unwrap().push(format!(
                "{project_id} {}:{line}:{column} {}",
                tex_path.display(),
                pdf_path.display()
            ));
            self.reply.clone().ok_or_else(|| anyhow!("synctex exploded"))
        }

        async fn pdf_to_tex(
            &self,
            project_id: &str,
            pdf_path: &Path,
            page: u32,
            x: f64,
            y: f64,
        ) -> anyhow::Result<SyncRecord> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{project_id} {}:{page}:{x}:{y}", pdf_path.display()));
            self.reply.clone().ok_or_else(|| anyhow!("synctex exploded"))
        }
    }

    #[test]
    fn forward_needs_page_and_y() {
        let pos = interpret_forward(&record(&[("Page", "4"), ("y", "312.5")])).unwrap();
        assert_eq!(pos, PdfPosition { page: 4, y: 312.5 });

        for bad in [
            record(&[("y", "1.0")]),
            record(&[("Page", "0"), ("y", "1.0")]),
            record(&[("Page", "two"), ("y", "1.0")]),
            record(&[("Page", "1")]),
            record(&[("Page", "1"), ("y", "NaN")]),
        ] {
            assert!(matches!(
                interpret_forward(&bad),
                Err(BuildError::InvalidResponse(_))
            ));
        }
    }

    #[test]
    fn inverse_needs_a_positive_line() {
        let pos = interpret_inverse(&record(&[("Line", "17"), ("Input", "./ch1.tex")])).unwrap();
        assert_eq!(pos.line, 17);
        assert_eq!(pos.file.as_deref(), Some("./ch1.tex"));

        for bad in ["0", "-3", "abc", ""] {
            assert!(matches!(
                interpret_inverse(&record(&[("Line", bad)])),
                Err(BuildError::InvalidResponse(_))
            ));
        }
        assert!(interpret_inverse(&record(&[])).is_err());
    }

    #[tokio::test]
    async fn forward_converts_to_one_based_rows() {
        let fake = Arc::new(FakeSync {
            reply: Some(record(&[("Page", "1"), ("y", "10")])),
            ..FakeSync::default()
        });
        let mapper = PositionMapper::new(fake.clone());
        let target = BuildTarget::new("p", "doc/a.tex");

        let pos = mapper
            .source_to_output(&target, 0, 4, Path::new("doc/a.tex"))
            .await
            .unwrap();
        assert_eq!(pos.page, 1);
        assert_eq!(
            fake.calls.lock().unwrap().as_slice(),
            ["p doc/a.tex:1:5 doc/a.pdf"]
        );
    }

    #[tokio::test]
    async fn service_failure_is_a_tool_error() {
        let mapper = PositionMapper::new(Arc::new(FakeSync::default()));
        let err = mapper
            .output_to_source(&BuildTarget::new("p", "a.tex"), 1, 2.0, 3.0)
            .await
            .unwrap_err();
        assert_eq!(err, BuildError::ToolLaunch("synctex exploded".into()));
    }
}
