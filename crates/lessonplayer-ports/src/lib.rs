pub mod media;
pub mod storage;
pub mod types;

pub use media::*;
pub use storage::*;
pub use types::*;
