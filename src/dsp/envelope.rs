//! Positional ADSR window.
//!
//! Unlike a gate-driven envelope, the window here is a pure function of the
//! sample offset within a note: attack/decay/release are fractions of the
//! beat length, and everything past the beat boundary is the release tail.

use crate::compiler::CompiledOscillator;

/// Envelope multiplier for sample `point` of a note `beat_length` samples
/// long. The rendered note extends to `beat_length * (1 + release)`.
pub fn adsr_gain(point: usize, beat_length: usize, osc: &CompiledOscillator) -> f64 {
    let attack = (osc.attack * beat_length as f64) as usize;
    let decay = attack + (osc.decay * beat_length as f64) as usize;
    let length = (beat_length as f64 * (1.0 + osc.release)) as usize;
    if point < attack {
        point as f64 / attack as f64
    } else if point < decay {
        // attack < decay is implied by point landing in this window
        let q = (point - attack) as f64 / (decay - attack) as f64;
        1.0 - q * (1.0 - osc.sustain)
    } else if point < beat_length {
        osc.sustain
    } else if point < length {
        let q = (point - beat_length) as f64 / (length - beat_length) as f64;
        (1.0 - q) * osc.sustain
    } else {
        // zero-width release window, or past the end of the tail
        0.0
    }
}
