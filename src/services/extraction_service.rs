use std::io::Write;

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

use crate::errors::{AppError, AppResult};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

/// Converts uploaded binary content of a known MIME type into plain text.
///
/// Dispatch is over a fixed set of supported types; each maps to one
/// extraction strategy. The input buffer is only read, never retained.
pub struct ExtractionService {
    ocr_binary: String,
}

impl ExtractionService {
    pub fn new(ocr_binary: impl Into<String>) -> Self {
        Self {
            ocr_binary: ocr_binary.into(),
        }
    }

    pub async fn extract(&self, content: &[u8], mime_type: &str) -> AppResult<String> {
        match mime_type {
            MIME_PDF => extract_pdf(content),
            MIME_DOCX => extract_docx(content),
            MIME_PNG | MIME_JPEG => self.extract_image(content).await,
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Optical character recognition via the configured tesseract binary.
    /// The image goes to a scratch file; text comes back on stdout.
    async fn extract_image(&self, content: &[u8]) -> AppResult<String> {
        let mut scratch = tempfile::NamedTempFile::new()
            .map_err(|err| AppError::ExtractionError(format!("scratch file: {}", err)))?;
        scratch
            .write_all(content)
            .map_err(|err| AppError::ExtractionError(format!("scratch file: {}", err)))?;

        let output = tokio::process::Command::new(&self.ocr_binary)
            .arg(scratch.path())
            .arg("stdout")
            .output()
            .await
            .map_err(|err| {
                AppError::ExtractionError(format!("failed to run '{}': {}", self.ocr_binary, err))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ExtractionError(format!(
                "OCR failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|err| AppError::ExtractionError(format!("OCR output not UTF-8: {}", err)))
    }
}

/// Text-layer extraction per page, concatenated in page order.
fn extract_pdf(content: &[u8]) -> AppResult<String> {
    let document = lopdf::Document::load_mem(content)
        .map_err(|err| AppError::ExtractionError(format!("PDF parse error: {}", err)))?;

    let mut text = String::new();
    // get_pages returns a BTreeMap, so iteration is already in page order.
    for page_number in document.get_pages().keys() {
        let page_text = document
            .extract_text(&[*page_number])
            .map_err(|err| AppError::ExtractionError(format!("PDF text extraction: {}", err)))?;
        text.push_str(&page_text);
    }
    Ok(text)
}

/// Paragraph text joined by newlines in document order.
fn extract_docx(content: &[u8]) -> AppResult<String> {
    let docx = read_docx(content)
        .map_err(|err| AppError::ExtractionError(format!("DOCX parse error: {:?}", err)))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let paragraph_text = paragraph
                .children
                .iter()
                .filter_map(|pc| match pc {
                    ParagraphChild::Run(run) => Some(run),
                    _ => None,
                })
                .flat_map(|run| &run.children)
                .filter_map(|rc| match rc {
                    RunChild::Text(t) => Some(t.text.as_str()),
                    _ => None,
                })
                .collect::<String>();
            if !paragraph_text.trim().is_empty() {
                paragraphs.push(paragraph_text);
            }
        }
    }
    Ok(paragraphs.join("\n"))
}
