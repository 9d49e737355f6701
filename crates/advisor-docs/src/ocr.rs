//! Optical character recognition for image uploads.
//!
//! The shipped engine drives the `tesseract` executable and reads its TSV
//! report. Word rows are grouped into one fragment per recognized line, in the
//! order the engine reports them.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Languages used when none are configured: Portuguese and English.
pub const DEFAULT_LANGUAGES: [&str; 2] = ["por", "eng"];

/// Pixel rectangle of a recognized fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    fn union(self, other: BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = (self.left + self.width).max(other.left + other.width);
        let bottom = (self.top + self.height).max(other.top + other.height);
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// One piece of recognized text. `confidence` is in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrFragment {
    pub bounds: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("unsupported image format (expected PNG or JPEG)")]
    UnsupportedImage,

    #[error("failed to run {program}: {source}")]
    EngineUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    EngineFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("unreadable OCR output: {0}")]
    InvalidOutput(String),
}

/// Boxed future returned by [`OcrEngine::recognize`].
pub type OcrFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<OcrFragment>, OcrError>> + Send + 'a>>;

/// An OCR backend. Dyn-compatible so the extractor can hold `Arc<dyn OcrEngine>`.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in an encoded image (PNG/JPEG bytes).
    fn recognize<'a>(&'a self, image: &'a [u8]) -> OcrFuture<'a>;
}

/// OCR through the Tesseract command-line tool, CPU only.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    program: PathBuf,
    languages: Vec<String>,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl TesseractOcr {
    pub fn new(program: impl Into<PathBuf>, languages: Vec<String>) -> Self {
        Self {
            program: program.into(),
            languages,
        }
    }

    /// The `-l` argument, e.g. `por+eng`.
    pub fn language_arg(&self) -> String {
        self.languages.join("+")
    }

    async fn run(&self, image: &[u8]) -> Result<Vec<OcrFragment>, OcrError> {
        if !is_supported_image(image) {
            return Err(OcrError::UnsupportedImage);
        }

        let program = self.program.display().to_string();
        let unavailable = |source| OcrError::EngineUnavailable {
            program: program.clone(),
            source,
        };

        let languages = self.language_arg();
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", languages.as_str(), "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(unavailable)?;
        tracing::debug!("Running {program} -l {languages} on {} bytes", image.len());

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await.map_err(unavailable)?;
        }

        let output = child.wait_with_output().await.map_err(unavailable)?;
        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let report = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::InvalidOutput(e.to_string()))?;
        parse_tsv(&report)
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize<'a>(&'a self, image: &'a [u8]) -> OcrFuture<'a> {
        Box::pin(self.run(image))
    }
}

/// PNG or JPEG signature check.
pub fn is_supported_image(bytes: &[u8]) -> bool {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    bytes.starts_with(PNG) || bytes.starts_with(JPEG)
}

/// Tesseract TSV row level for a single word.
const WORD_LEVEL: &str = "5";

/// Parse a Tesseract TSV report into line fragments.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Only word rows with a non-negative
/// confidence and non-blank text are kept.
pub fn parse_tsv(report: &str) -> Result<Vec<OcrFragment>, OcrError> {
    struct Line {
        key: (u32, u32, u32, u32),
        bounds: BoundingBox,
        words: Vec<String>,
        conf_sum: f32,
    }

    let mut lines: Vec<Line> = Vec::new();

    for (row_no, row) in report.lines().enumerate() {
        if row.starts_with("level") || row.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }

        let num = |i: usize| -> Result<u32, OcrError> {
            cols[i].trim().parse::<u32>().map_err(|_| {
                OcrError::InvalidOutput(format!("row {}: bad column {}: {:?}", row_no + 1, i, cols[i]))
            })
        };
        let conf: f32 = cols[10].trim().parse().map_err(|_| {
            OcrError::InvalidOutput(format!("row {}: bad confidence {:?}", row_no + 1, cols[10]))
        })?;
        let text = cols[11..].join("\t");
        let text = text.trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let key = (num(1)?, num(2)?, num(3)?, num(4)?);
        let bounds = BoundingBox {
            left: num(6)?,
            top: num(7)?,
            width: num(8)?,
            height: num(9)?,
        };

        match lines.last_mut() {
            Some(line) if line.key == key => {
                line.bounds = line.bounds.union(bounds);
                line.words.push(text.to_string());
                line.conf_sum += conf;
            }
            _ => lines.push(Line {
                key,
                bounds,
                words: vec![text.to_string()],
                conf_sum: conf,
            }),
        }
    }

    Ok(lines
        .into_iter()
        .map(|line| OcrFragment {
            bounds: line.bounds,
            confidence: line.conf_sum / line.words.len() as f32 / 100.0,
            text: line.words.join(" "),
        })
        .collect())
}
