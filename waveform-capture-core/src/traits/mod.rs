pub mod audio_sink;
pub mod capture_provider;
pub mod media_writer;
pub mod permission;
pub mod platform;
