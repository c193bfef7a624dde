//! Audio input: decoded sample buffers and the file decoder

pub mod decode;
pub mod waveform;

pub use decode::{decode_file, DecodeError};
pub use waveform::Waveform;
