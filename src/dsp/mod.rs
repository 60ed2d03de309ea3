//! The synthesis core: waveforms, the modulation-graph evaluator, the
//! command interpreter, and PCM accumulation.

pub mod buffer;
pub mod engine;
pub mod envelope;
pub mod graph;
pub mod renderer;
pub mod wave;

/// Fixed render sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44100;
