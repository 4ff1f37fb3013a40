pub mod output_path;
pub mod wav_writer;
