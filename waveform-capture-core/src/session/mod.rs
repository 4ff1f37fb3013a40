pub mod capture;
pub mod clock;
pub mod file_recorder;
pub mod manager;
pub mod probe;
