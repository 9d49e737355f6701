//! Format dispatch from uploaded files to plain text.

use std::sync::Arc;

use advisor_types::ExtractError;

use crate::docx::extract_docx_text;
use crate::file::{FileKind, UploadedFile};
use crate::ocr::OcrEngine;
use crate::pdf::extract_pdf_text;

/// Turns uploaded files into plain text.
///
/// OCR failures are folded into the returned text as a visible placeholder;
/// PDF, DOCX and UTF-8 decode failures propagate. Unsupported extensions
/// produce an empty string.
#[derive(Clone)]
pub struct Extractor {
    ocr: Arc<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// Extract the text of a single file.
    pub async fn extract(&self, file: &UploadedFile) -> Result<String, ExtractError> {
        let text = match file.kind() {
            Some(FileKind::Text) => {
                String::from_utf8(file.bytes.clone()).map_err(|source| ExtractError::Decode {
                    file: file.name.clone(),
                    source,
                })?
            }
            Some(FileKind::Pdf) => {
                extract_pdf_text(&file.bytes).map_err(|message| ExtractError::Pdf {
                    file: file.name.clone(),
                    message,
                })?
            }
            Some(FileKind::Docx) => {
                extract_docx_text(&file.bytes).map_err(|message| ExtractError::Docx {
                    file: file.name.clone(),
                    message,
                })?
            }
            Some(FileKind::Image) => self.ocr_text(file).await,
            None => {
                tracing::debug!("Skipping '{}': unsupported extension", file.name);
                String::new()
            }
        };

        tracing::debug!("Extracted {} bytes of text from '{}'", text.len(), file.name);
        Ok(text)
    }

    /// Concatenate `--- {name} ---\n` followed by each file's text.
    ///
    /// The first extraction error aborts the whole build.
    pub async fn build_context(&self, files: &[UploadedFile]) -> Result<String, ExtractError> {
        let mut context = String::new();
        for file in files {
            context.push_str(&format!("--- {} ---\n", file.name));
            context.push_str(&self.extract(file).await?);
        }
        Ok(context)
    }

    async fn ocr_text(&self, file: &UploadedFile) -> String {
        match self.ocr.recognize(&file.bytes).await {
            Ok(fragments) => fragments
                .into_iter()
                .map(|f| f.text)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                tracing::warn!("OCR failed for '{}': {e}", file.name);
                format!("[Erro ao usar OCR: {e}]")
            }
        }
    }
}
