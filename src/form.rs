use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};

use crate::research::{RequestTicket, ResearchController};

/// Retrieval channels a research request can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Web,
    ArxivPapers,
    YouTube,
    Pdf,
}

impl SourceKind {
    /// Order in which enabled kinds are written to the request.
    pub const SUBMISSION_ORDER: [SourceKind; 4] = [
        SourceKind::Web,
        SourceKind::YouTube,
        SourceKind::Pdf,
        SourceKind::ArxivPapers,
    ];

    /// Order in which the checkboxes are shown.
    pub const DISPLAY_ORDER: [SourceKind; 4] = [
        SourceKind::Web,
        SourceKind::ArxivPapers,
        SourceKind::YouTube,
        SourceKind::Pdf,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            SourceKind::Web => "fromWeb",
            SourceKind::ArxivPapers => "fromResearchPapers",
            SourceKind::YouTube => "fromYouTube",
            SourceKind::Pdf => "fromPDF",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Web => "Web Search",
            SourceKind::ArxivPapers => "Academic Papers (ArXiv)",
            SourceKind::YouTube => "YouTube",
            SourceKind::Pdf => "PDF Document",
        }
    }
}

/// A PDF chosen by the user. Bytes are shared so the form can be cloned cheaply.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfAttachment {
    file_name: String,
    bytes: Arc<[u8]>,
}

impl PdfAttachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(anyhow!("Only .pdf files can be attached: {}", path.display()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PdfAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfAttachment")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a prompt.")]
    EmptyPrompt,
    #[error("Please select at least one source.")]
    NoSourceSelected,
}

/// One editable field of the submission form.
#[derive(Debug, Clone)]
pub enum FormField {
    Prompt(String),
    Source { kind: SourceKind, enabled: bool },
    YoutubeUrl(String),
    PdfFile(Option<PdfAttachment>),
}

#[derive(Debug, Clone, Default)]
pub struct SourceSelection {
    prompt: String,
    enabled_kinds: BTreeSet<SourceKind>,
    youtube_url: String,
    pdf_file: Option<PdfAttachment>,
}

impl SourceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_field(&mut self, field: FormField) {
        match field {
            FormField::Prompt(prompt) => self.prompt = prompt,
            FormField::Source { kind, enabled: true } => {
                self.enabled_kinds.insert(kind);
            }
            FormField::Source { kind, enabled: false } => {
                self.enabled_kinds.remove(&kind);
            }
            FormField::YoutubeUrl(url) => self.youtube_url = url,
            FormField::PdfFile(file) => self.pdf_file = file,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        self.enabled_kinds.contains(&kind)
    }

    pub fn youtube_url(&self) -> &str {
        &self.youtube_url
    }

    pub fn pdf_file(&self) -> Option<&PdfAttachment> {
        self.pdf_file.as_ref()
    }

    pub fn validate(&self) -> Result<ResearchRequest, ValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if self.enabled_kinds.is_empty() {
            return Err(ValidationError::NoSourceSelected);
        }

        let sources: Vec<SourceKind> = SourceKind::SUBMISSION_ORDER
            .into_iter()
            .filter(|kind| self.enabled_kinds.contains(kind))
            .collect();

        Ok(ResearchRequest {
            prompt: self.prompt.clone(),
            youtube_link: self
                .is_enabled(SourceKind::YouTube)
                .then(|| self.youtube_url.clone()),
            pdf_document: if self.is_enabled(SourceKind::Pdf) {
                self.pdf_file.clone()
            } else {
                None
            },
            sources,
        })
    }

    /// Validates and, if the form is sound, moves the controller to pending.
    /// Returns `None` when nothing should be sent.
    pub fn submit(&self, controller: &mut ResearchController) -> Option<Submission> {
        if controller.is_pending() {
            return None;
        }

        match self.validate() {
            Ok(request) => {
                let ticket = controller.begin_request();
                tracing::info!(
                    prompt_chars = request.prompt().chars().count(),
                    sources = ?request.sources(),
                    has_pdf = request.pdf_document.is_some(),
                    "Submitting research request"
                );
                Some(Submission { ticket, request })
            }
            Err(err) => {
                tracing::debug!(error = %err, "Research form rejected");
                controller.report_invalid(err);
                None
            }
        }
    }
}

#[derive(Debug)]
pub struct Submission {
    pub ticket: RequestTicket,
    pub request: ResearchRequest,
}

/// One part of the multipart body, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePart<'a> {
    Text { name: &'static str, value: &'a str },
    File { name: &'static str, file: &'a PdfAttachment },
}

#[derive(Debug, Clone)]
pub struct ResearchRequest {
    prompt: String,
    sources: Vec<SourceKind>,
    youtube_link: Option<String>,
    pdf_document: Option<PdfAttachment>,
}

impl ResearchRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn sources(&self) -> &[SourceKind] {
        &self.sources
    }

    pub fn parts(&self) -> Vec<WirePart<'_>> {
        let mut parts = vec![WirePart::Text {
            name: "prompt",
            value: &self.prompt,
        }];

        for kind in &self.sources {
            parts.push(WirePart::Text {
                name: "sources",
                value: kind.wire_name(),
            });
            match kind {
                SourceKind::YouTube => {
                    if let Some(link) = &self.youtube_link {
                        parts.push(WirePart::Text {
                            name: "youtube_link",
                            value: link,
                        });
                    }
                }
                SourceKind::Pdf => {
                    if let Some(file) = &self.pdf_document {
                        parts.push(WirePart::File {
                            name: "pdf_document",
                            file,
                        });
                    }
                }
                SourceKind::Web | SourceKind::ArxivPapers => {}
            }
        }

        parts
    }

    pub fn to_multipart(&self) -> reqwest::Result<Form> {
        let mut form = Form::new();
        for part in self.parts() {
            form = match part {
                WirePart::Text { name, value } => form.text(name, value.to_string()),
                WirePart::File { name, file } => {
                    let part = Part::bytes(file.bytes().to_vec())
                        .file_name(file.file_name().to_string())
                        .mime_str("application/pdf")?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}
