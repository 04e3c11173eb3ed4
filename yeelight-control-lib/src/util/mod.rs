pub mod device;
pub mod discovery;
pub mod traits;
