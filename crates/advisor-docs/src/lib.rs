//! Text extraction, chunking, and chunk selection for Advisor.

pub mod chunk;
pub mod docx;
pub mod extract;
pub mod file;
pub mod ocr;
pub mod pdf;
pub mod select;

pub use chunk::{DEFAULT_MAX_WORDS, chunk_words};
pub use extract::Extractor;
pub use file::{FileKind, UploadedFile};
pub use ocr::{BoundingBox, DEFAULT_LANGUAGES, OcrEngine, OcrError, OcrFragment, TesseractOcr};
pub use select::{DEFAULT_MAX_CHUNKS, select_relevant};
