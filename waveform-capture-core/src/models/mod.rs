pub mod config;
pub mod encoder;
pub mod error;
pub mod permission;
pub mod recording_result;
pub mod state;
