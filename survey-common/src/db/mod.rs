//! Submission storage

pub mod init;
pub mod submissions;

pub use init::*;
pub use submissions::*;
