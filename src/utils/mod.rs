// Utils compartidos

pub mod constants;
pub mod storage;
pub mod time;

pub use constants::*;
pub use storage::*;
pub use time::*;
