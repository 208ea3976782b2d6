pub mod download;
pub mod ffmpeg;
pub mod youtube;
