mod ocr;
mod tesseract;

pub use ocr::{Ocr, OcrResult};
pub use tesseract::{Tesseract, TesseractConfig};
