//! Recursive modulation-graph evaluator.
//!
//! `amplitude_at` computes one oscillator's instantaneous output by first
//! recursively evaluating every sibling routed into it. The compiler has
//! already rejected cyclic routing, so recursion terminates without a
//! depth guard.

use std::f64::consts::TAU;

use super::SAMPLE_RATE;
use super::envelope::adsr_gain;
use super::wave;
use crate::ast::Waveform;
use crate::compiler::{CompiledInstrument, RouteKind};

/// Amplitude of oscillator `osc_index` at sample offset `point` within a
/// note of `beat_length` nominal samples at `carrier_freq` Hz.
///
/// The result is not clamped to [-1, 1]; that happens where contributions
/// are mixed into the output buffer, so a hot oscillator can still drive a
/// modulation target beyond unity.
pub fn amplitude_at(
    point: usize,
    beat_length: usize,
    carrier_freq: f64,
    instrument: &CompiledInstrument,
    osc_index: usize,
) -> f64 {
    let osc = &instrument.oscillators[osc_index];

    let mut am = 0.0;
    let mut fm = 0.0;
    let mut pm = 0.0;
    let mut add = 0.0;
    let mut sub = 0.0;
    let mut env = 0.0;
    let mut n_env = 0usize;
    for route in &instrument.routes[osc_index] {
        let value = amplitude_at(point, beat_length, carrier_freq, instrument, route.source);
        match route.kind {
            RouteKind::Am => am += value,
            RouteKind::Fm => fm += value,
            RouteKind::Pm => pm += value,
            RouteKind::Add => add += value,
            RouteKind::Sub => sub += value,
            RouteKind::Env => {
                env += value;
                n_env += 1;
            }
        }
    }

    // An absolute hz overrides the note pitch entirely; otherwise the
    // carrier frequency is scaled by detune.
    let freq = if osc.hz != 0.0 { osc.hz } else { carrier_freq * osc.detune };

    let phase = (point as f64 + pm) * (freq * (1.0 + fm)) * TAU / SAMPLE_RATE as f64;
    let mut amp = (1.0 + am)
        * osc.volume
        * match osc.shape {
            Waveform::Sine => wave::sine(phase),
            Waveform::Saw => wave::saw(phase),
            Waveform::Triangle => wave::triangle(phase),
            Waveform::Square => wave::square(phase),
            Waveform::Noise => wave::noise(point as i64),
        };
    amp += add;
    amp -= sub;

    // The summed env value is a signed bound: positive gates the amplitude
    // into [0, env], negative into [env, 0], without flipping its sign.
    if n_env > 0 {
        amp = if env < 0.0 { env.max(amp.min(0.0)) } else { env.min(amp.max(0.0)) };
    }

    amp *= adsr_gain(point, beat_length, osc);

    if osc.clip > 0.0 && amp.abs() > osc.clip {
        amp = osc.clip.copysign(amp);
    }
    amp
}
