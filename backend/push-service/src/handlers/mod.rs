/// HTTP handlers for push service API
pub mod push;

pub use push::*;
