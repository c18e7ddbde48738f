pub mod codec;
pub mod input;
pub mod quality;
pub mod record_id;

mod error;

pub use codec::{FlatMap, Scalar};
pub use error::{Error, Result};
