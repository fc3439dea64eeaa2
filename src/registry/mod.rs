pub mod chain;
pub mod source;

pub use chain::{ChainRecord, Layer};
pub use source::RegistrySource;
