mod env;
mod error;


pub use env::Env;
pub use error::{RtResult, RuntimeError};
