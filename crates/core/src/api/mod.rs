//! API-versioned resource models
//!
//! `v1` holds the input shapes, `v3` the output shapes. Values that v1
//! writes loosely are described in `numorstring`.
pub mod numorstring;
pub mod v1;
pub mod v3;
