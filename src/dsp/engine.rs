//! Command interpreter — walks one voice's command list and drives the
//! evaluator sample by sample.
//!
//! Each voice gets a fresh [`RenderContext`] starting at buffer position 0,
//! so every voice of a song mixes into the same sample timeline. The cursor
//! advances exactly one beat length per `Note`/`Chord`/`Rest`; release
//! tails overhang the beat and later content sums on top of them.

use super::SAMPLE_RATE;
use super::buffer::SongBuffer;
use super::graph::amplitude_at;
use crate::ast::{Command, Number, NumberKind};
use crate::compiler::{CompiledInstrument, CompiledSong};
use crate::error::RenderError;

/// The most recent pitch-bearing command, kept for legato. A chord note
/// glides from the same position within the previous chord; an
/// out-of-range position means no previous pitch and no glide.
enum PrevSource<'a> {
    Note(Number),
    Chord(&'a [Number]),
}

/// Per-voice render state. Created fresh for each voice and discarded
/// afterwards; the song data itself is never mutated.
pub struct RenderContext<'a> {
    instrument: &'a CompiledInstrument,
    buffer: &'a mut SongBuffer,
    /// Sample position of the next beat.
    cursor: usize,
    /// Exponent base for evaluating pitch degrees. Octaves by default.
    base: f64,
    root: f64,
    tempo: f64,
    legato: f64,
    /// Groove phase counter.
    beat: usize,
    /// Monotonic carrier selector, taken modulo the oscillator count.
    osc_cursor: usize,
    groove: Option<&'a [Number]>,
    prev: Option<PrevSource<'a>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        song: &CompiledSong,
        instrument: &'a CompiledInstrument,
        buffer: &'a mut SongBuffer,
    ) -> Self {
        RenderContext {
            instrument,
            buffer,
            cursor: 0,
            base: 2.0,
            root: song.root,
            tempo: song.tempo,
            legato: 0.0,
            beat: 0,
            osc_cursor: 0,
            groove: None,
            prev: None,
        }
    }

    /// Interpret a command list. Called recursively for `Repeat` bodies.
    pub fn run(&mut self, commands: &'a [Command]) -> Result<(), RenderError> {
        for command in commands {
            self.step(command)?;
        }
        Ok(())
    }

    fn step(&mut self, command: &'a Command) -> Result<(), RenderError> {
        match command {
            Command::Base(n) => {
                self.base = self.eval(*n)?;
            }
            Command::Legato(n) => {
                self.legato = self.eval(*n)?;
            }
            Command::Modulate(n) => {
                self.root *= self.eval(*n)?;
            }
            Command::Groove(beats) => {
                self.groove = Some(beats);
                self.beat = 0;
            }
            Command::Repeat { count, body } => {
                let count = self.eval(*count)?.floor() as i64;
                for _ in 0..1 + count.max(0) {
                    self.run(body)?;
                }
            }
            Command::Rest => {
                let length = self.beat_length()?;
                self.buffer.extend_to(self.cursor + length);
                self.cursor += length;
            }
            Command::Note(n) => {
                let length = self.beat_length()?;
                let target = self.root * self.eval(*n)?;
                let prev = self.prev_frequency(0, false)?;
                let carrier = self.next_carrier()?;
                self.write_note(length, prev, target, carrier);
                self.cursor += length;
                self.prev = Some(PrevSource::Note(*n));
            }
            Command::Chord(notes) => {
                let length = self.beat_length()?;
                for (position, n) in notes.iter().enumerate() {
                    let target = self.root * self.eval(*n)?;
                    let prev = self.prev_frequency(position, true)?;
                    let carrier = self.next_carrier()?;
                    // every chord note starts at the same cursor and sums
                    self.write_note(length, prev, target, carrier);
                }
                self.cursor += length;
                self.prev = Some(PrevSource::Chord(notes));
            }
        }
        Ok(())
    }

    fn eval(&self, n: Number) -> Result<f64, RenderError> {
        eval_against(self.base, n)
    }

    /// One beat in samples, scaled by the active groove. The groove phase
    /// advances once per beat-consuming command, chords included.
    fn beat_length(&mut self) -> Result<usize, RenderError> {
        let mut length = SAMPLE_RATE as f64 * 60.0 / self.tempo;
        if let Some(groove) = self.groove {
            if !groove.is_empty() {
                length *= eval_against(1.0, groove[self.beat % groove.len()])?;
                self.beat += 1;
            }
        }
        Ok(length as usize)
    }

    /// Previous pitch for the note at `position` of the current command.
    /// A chord note glides only from the same position of a previous chord;
    /// a plain note predecessor supplies no pitch to a chord.
    fn prev_frequency(&self, position: usize, chord: bool) -> Result<f64, RenderError> {
        match &self.prev {
            None => Ok(0.0),
            Some(PrevSource::Note(n)) if !chord && position == 0 => {
                Ok(self.root * self.eval(*n)?)
            }
            Some(PrevSource::Note(_)) => Ok(0.0),
            Some(PrevSource::Chord(notes)) => match notes.get(position) {
                Some(n) => Ok(self.root * self.eval(*n)?),
                None => Ok(0.0),
            },
        }
    }

    /// Skip past modulators and claim the next carrier slot. Bounded by the
    /// oscillator count: an instrument with no carrier is a fatal error
    /// rather than an infinite scan.
    fn next_carrier(&mut self) -> Result<usize, RenderError> {
        let count = self.instrument.oscillators.len();
        for _ in 0..count {
            let index = self.osc_cursor % count;
            self.osc_cursor += 1;
            if !self.instrument.oscillators[index].is_modulator {
                return Ok(index);
            }
        }
        Err(RenderError::NoCarrier { instrument: self.instrument.name.clone() })
    }

    /// Render one note into the buffer at the current cursor. The cursor
    /// itself is not advanced here; chords render several notes from the
    /// same start position.
    fn write_note(&mut self, length: usize, prev: f64, target: f64, carrier: usize) {
        let osc = &self.instrument.oscillators[carrier];
        let total = (length as f64 * (1.0 + osc.release)) as usize;
        let legato_end = (length as f64 * self.legato) as usize;
        for i in 0..total {
            let freq = if self.legato > 0.0 && prev != 0.0 {
                glide_frequency(prev, target, i, legato_end)
            } else {
                target
            };
            let amp = amplitude_at(i, length, freq, self.instrument, carrier);
            self.buffer.mix(self.cursor + i, amp);
        }
    }
}

fn eval_against(base: f64, n: Number) -> Result<f64, RenderError> {
    if n.kind == NumberKind::Rational && n.denominator == 0 {
        return Err(RenderError::DivisionByZero);
    }
    Ok(n.evaluate(base))
}

/// Legato pitch interpolation: an ease-out cubic from `prev` to `target`
/// over `legato_end` samples, then `target` exactly.
pub fn glide_frequency(prev: f64, target: f64, i: usize, legato_end: usize) -> f64 {
    if i >= legato_end {
        return target;
    }
    let t = 1.0 - (1.0 - i as f64 / legato_end as f64).powi(3);
    prev + (target - prev) * t
}
