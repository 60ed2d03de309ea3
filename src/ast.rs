use serde::{Deserialize, Serialize};

/// How a [`Number`] is evaluated against a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberKind {
    /// `n/d` — a plain ratio, independent of the base.
    Rational,
    /// `n\d` — `base ^ (n/d)`, a pitch degree in the current tuning system.
    Exponential,
}

/// An exact pitch/time ratio as written in the source.
///
/// Everything musical in a tunebook — pitch degrees, tempo multipliers,
/// envelope fractions, repeat counts — is one of these, evaluated lazily
/// against whatever base is in scope at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    pub kind: NumberKind,
    pub numerator: i32,
    pub denominator: i32,
}

impl Number {
    pub fn rational(numerator: i32, denominator: i32) -> Self {
        Number { kind: NumberKind::Rational, numerator, denominator }
    }

    pub fn exponential(numerator: i32, denominator: i32) -> Self {
        Number { kind: NumberKind::Exponential, numerator, denominator }
    }

    /// Evaluate against `base`: rationals ignore the base entirely,
    /// exponentials raise it to the ratio.
    ///
    /// A rational with denominator 0 produces an infinity here; the render
    /// engine checks for that case first and reports it as a fatal error.
    pub fn evaluate(&self, base: f64) -> f64 {
        let ratio = self.numerator as f64 / self.denominator as f64;
        match self.kind {
            NumberKind::Rational => ratio,
            NumberKind::Exponential => base.powf(ratio),
        }
    }
}

/// Waveform shape of an oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Saw,
    Triangle,
    Square,
    Noise,
}

/// One waveform generator with an envelope, optionally routed into
/// sibling oscillators of the same instrument.
///
/// The target lists name *other* oscillators this one feeds: `am`
/// (amplitude), `fm` (frequency), `pm` (phase), `add`/`sub` (plain mix),
/// and `env` (signed amplitude bound). A name that matches no sibling is
/// silently inert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oscillator {
    pub name: String,
    pub shape: Waveform,
    /// Attack time as a fraction of the beat length.
    pub attack: f64,
    /// Decay time as a fraction of the beat length.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release tail as a fraction of the beat length.
    pub release: f64,
    pub volume: f64,
    /// Absolute frequency override; 0 = follow the note pitch.
    pub hz: f64,
    /// Multiplier on the note pitch.
    pub detune: f64,
    /// Hard clip threshold; 0 = no clipping.
    pub clip: f64,
    pub am: Vec<String>,
    pub fm: Vec<String>,
    pub pm: Vec<String>,
    pub add: Vec<String>,
    pub sub: Vec<String>,
    pub env: Vec<String>,
}

impl Oscillator {
    pub fn new(name: String, shape: Waveform) -> Self {
        Oscillator {
            name,
            shape,
            attack: 1.0 / 32.0,
            decay: 1.0 / 3.0,
            sustain: 3.0 / 4.0,
            release: 1.0 / 32.0,
            volume: 1.0 / 2.0,
            hz: 0.0,
            detune: 1.0,
            clip: 0.0,
            am: Vec::new(),
            fm: Vec::new(),
            pm: Vec::new(),
            add: Vec::new(),
            sub: Vec::new(),
            env: Vec::new(),
        }
    }

    /// True iff any target list is non-empty. Modulators exist only to feed
    /// other oscillators and are never picked as note carriers — even when
    /// every name they list is dangling.
    pub fn is_modulator(&self) -> bool {
        !self.am.is_empty()
            || !self.fm.is_empty()
            || !self.pm.is_empty()
            || !self.add.is_empty()
            || !self.sub.is_empty()
            || !self.env.is_empty()
    }
}

/// A named bundle of oscillators forming one modulation network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub oscillators: Vec<Oscillator>,
}

/// One song: a tempo, a root pitch, and the voices that play together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    /// Beats per minute. Fixed once at load time.
    pub tempo: Number,
    /// Root pitch in Hz. Fixed once at load time.
    pub root: Number,
    pub voices: Vec<Voice>,
}

impl Song {
    pub fn new(name: String) -> Self {
        Song {
            name,
            tempo: Number::rational(60, 1),
            root: Number::rational(440, 1),
            voices: Vec::new(),
        }
    }
}

/// One voice: an instrument reference and the command list that drives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub instrument: String,
    pub commands: Vec<Command>,
}

/// A voice command. `section` / `repeat` pairs in the source are folded
/// into nested [`Command::Repeat`] blocks by the parser, so the interpreter
/// recurses over a tree instead of replaying index ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Reassign the exponent base (itself evaluated against the old base).
    Base(Number),
    /// Play one note at `root * evaluate(base, n)` for one beat.
    Note(Number),
    /// Play several notes over the same beat, summed into the output.
    Chord(Vec<Number>),
    /// Multiply the root pitch.
    Modulate(Number),
    /// Install a repeating sequence of per-beat duration multipliers.
    Groove(Vec<Number>),
    /// Set the fractional glide time from the previous pitch.
    Legato(Number),
    /// Play `body` once, then `floor(evaluate(base, count))` more times.
    Repeat { count: Number, body: Vec<Command> },
    /// Advance one beat in silence.
    Rest,
}

/// The whole parsed tunebook. Built once, immutable during rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub instruments: Vec<Instrument>,
    pub songs: Vec<Song>,
}
