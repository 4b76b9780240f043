mod decoder;
mod linear;
mod qr;
#[cfg(test)]
mod testing;

pub use decoder::{Barcode, BarcodeDecoder, CompositeDecoder};
pub use linear::LinearDecoder;
pub use qr::QrDecoder;
