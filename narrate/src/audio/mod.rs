//! Audio clips and their ordered assembly into tracks.

pub mod assembler;
mod clip;

pub use assembler::{AudioTrack, concatenate};
pub use clip::{AudioClip, AudioFormat};
