mod tools;
pub mod bits;
pub mod lzss;

type DYNERR = Box<dyn std::error::Error>;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("size must be positive")]
    OutOfRange
}
