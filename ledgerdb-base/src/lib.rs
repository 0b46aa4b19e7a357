mod bitmap256;
mod error;

pub use bitmap256::Bitmap256;
pub use error::{err, kind_err, Category, Error, Kind, Result};

#[cfg(test)]
#[path = "test/bitmap256.rs"]
mod test_bitmap256;
