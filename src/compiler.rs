//! Load-time lowering of a parsed [`Book`] into a render-ready model.
//!
//! Three jobs happen here, once, before any sample is computed:
//! oscillator target names become index-based modulation routes (dangling
//! names are silently dropped), the routing graph of every instrument is
//! checked for cycles, and each voice's instrument name is resolved to an
//! index into the instrument table.

use serde::{Deserialize, Serialize};

use crate::ast::*;
use crate::error::CompileError;

// ── Modulation Routes ───────────────────────────────────────

/// What a modulation route contributes to its sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    Am,
    Fm,
    Pm,
    Add,
    Sub,
    Env,
}

/// One resolved route: oscillator `source` feeds the sink this route is
/// attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Route {
    pub source: usize,
    pub kind: RouteKind,
}

// ── Compiled Model ──────────────────────────────────────────

/// Oscillator parameters with the routing stripped out; routes live on the
/// owning [`CompiledInstrument`], keyed by sink index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledOscillator {
    pub name: String,
    pub shape: Waveform,
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
    pub volume: f64,
    pub hz: f64,
    pub detune: f64,
    pub clip: f64,
    /// Computed from the raw target lists, dangling names included: a
    /// modulator is never selected as a note carrier.
    pub is_modulator: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledInstrument {
    pub name: String,
    pub oscillators: Vec<CompiledOscillator>,
    /// Inbound routes per oscillator: `routes[k]` lists every
    /// `(source, kind)` pair feeding oscillator `k`.
    pub routes: Vec<Vec<Route>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledVoice {
    /// Index into [`CompiledBook::instruments`].
    pub instrument: usize,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledSong {
    pub name: String,
    /// Beats per minute, evaluated once against base 1.
    pub tempo: f64,
    /// Root pitch in Hz, evaluated once against base 1.
    pub root: f64,
    pub voices: Vec<CompiledVoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledBook {
    pub instruments: Vec<CompiledInstrument>,
    pub songs: Vec<CompiledSong>,
}

// ── Compiler ────────────────────────────────────────────────

pub fn compile(book: &Book) -> Result<CompiledBook, CompileError> {
    let instruments: Vec<CompiledInstrument> = book
        .instruments
        .iter()
        .map(compile_instrument)
        .collect::<Result<_, _>>()?;

    let mut songs = Vec::with_capacity(book.songs.len());
    for song in &book.songs {
        let tempo = song.tempo.evaluate(1.0);
        if !tempo.is_finite() || tempo <= 0.0 {
            return Err(CompileError::InvalidTempo { song: song.name.clone(), tempo });
        }
        let mut voices = Vec::with_capacity(song.voices.len());
        for voice in &song.voices {
            let instrument = book
                .instruments
                .iter()
                .position(|i| i.name == voice.instrument)
                .ok_or_else(|| CompileError::UnknownInstrument {
                    song: song.name.clone(),
                    instrument: voice.instrument.clone(),
                })?;
            voices.push(CompiledVoice { instrument, commands: voice.commands.clone() });
        }
        songs.push(CompiledSong {
            name: song.name.clone(),
            tempo,
            root: song.root.evaluate(1.0),
            voices,
        });
    }

    Ok(CompiledBook { instruments, songs })
}

/// Compile a single instrument: resolve its target names to routes and
/// reject cyclic routing.
pub fn compile_instrument(instrument: &Instrument) -> Result<CompiledInstrument, CompileError> {
    let count = instrument.oscillators.len();
    let mut routes: Vec<Vec<Route>> = vec![Vec::new(); count];

    for (source, osc) in instrument.oscillators.iter().enumerate() {
        let lists = [
            (RouteKind::Am, &osc.am),
            (RouteKind::Fm, &osc.fm),
            (RouteKind::Pm, &osc.pm),
            (RouteKind::Add, &osc.add),
            (RouteKind::Sub, &osc.sub),
            (RouteKind::Env, &osc.env),
        ];
        for (kind, targets) in lists {
            for target in targets {
                // Names resolve by exact equality; a dangling name is inert.
                for (sink, candidate) in instrument.oscillators.iter().enumerate() {
                    if candidate.name == *target {
                        routes[sink].push(Route { source, kind });
                    }
                }
            }
        }
    }

    check_acyclic(instrument, &routes)?;

    let oscillators = instrument
        .oscillators
        .iter()
        .map(|osc| CompiledOscillator {
            name: osc.name.clone(),
            shape: osc.shape,
            attack: osc.attack,
            decay: osc.decay,
            sustain: osc.sustain,
            release: osc.release,
            volume: osc.volume,
            hz: osc.hz,
            detune: osc.detune,
            clip: osc.clip,
            is_modulator: osc.is_modulator(),
        })
        .collect();

    Ok(CompiledInstrument {
        name: instrument.name.clone(),
        oscillators,
        routes,
    })
}

/// Depth-first search over the inbound route graph. A cycle would make the
/// render-time evaluator recurse forever, so it is rejected here and the
/// evaluator runs unguarded.
fn check_acyclic(instrument: &Instrument, routes: &[Vec<Route>]) -> Result<(), CompileError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    fn visit(
        node: usize,
        routes: &[Vec<Route>],
        marks: &mut [Mark],
    ) -> Result<(), usize> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::InProgress => return Err(node),
            Mark::Unvisited => {}
        }
        marks[node] = Mark::InProgress;
        for route in &routes[node] {
            visit(route.source, routes, marks)?;
        }
        marks[node] = Mark::Done;
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; routes.len()];
    for node in 0..routes.len() {
        if let Err(offender) = visit(node, routes, &mut marks) {
            return Err(CompileError::ModulationCycle {
                instrument: instrument.name.clone(),
                oscillator: instrument.oscillators[offender].name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_osc_instrument() -> Instrument {
        let mut a = Oscillator::new("a".into(), Waveform::Sine);
        a.am.push("b".into());
        let b = Oscillator::new("b".into(), Waveform::Sine);
        Instrument { name: "duo".into(), oscillators: vec![a, b] }
    }

    fn book_with(instruments: Vec<Instrument>, songs: Vec<Song>) -> Book {
        Book { instruments, songs }
    }

    #[test]
    fn targets_resolve_to_inbound_routes() {
        let book = book_with(vec![two_osc_instrument()], vec![]);
        let compiled = compile(&book).expect("compile failed");
        let inst = &compiled.instruments[0];
        assert!(inst.routes[0].is_empty());
        assert_eq!(inst.routes[1].len(), 1);
        assert_eq!(inst.routes[1][0].source, 0);
        assert_eq!(inst.routes[1][0].kind, RouteKind::Am);
        assert!(inst.oscillators[0].is_modulator);
        assert!(!inst.oscillators[1].is_modulator);
    }

    #[test]
    fn dangling_target_is_dropped_but_still_modulator() {
        let mut osc = Oscillator::new("a".into(), Waveform::Sine);
        osc.fm.push("ghost".into());
        let inst = Instrument { name: "solo".into(), oscillators: vec![osc] };
        let compiled = compile(&book_with(vec![inst], vec![])).expect("compile failed");
        assert!(compiled.instruments[0].routes[0].is_empty());
        assert!(compiled.instruments[0].oscillators[0].is_modulator);
    }

    #[test]
    fn duplicate_names_route_to_every_match() {
        let mut a = Oscillator::new("a".into(), Waveform::Sine);
        a.add.push("x".into());
        let x1 = Oscillator::new("x".into(), Waveform::Sine);
        let x2 = Oscillator::new("x".into(), Waveform::Saw);
        let inst = Instrument { name: "dup".into(), oscillators: vec![a, x1, x2] };
        let compiled = compile(&book_with(vec![inst], vec![])).expect("compile failed");
        assert_eq!(compiled.instruments[0].routes[1].len(), 1);
        assert_eq!(compiled.instruments[0].routes[2].len(), 1);
    }

    #[test]
    fn two_oscillator_cycle_is_rejected() {
        let mut a = Oscillator::new("a".into(), Waveform::Sine);
        a.am.push("b".into());
        let mut b = Oscillator::new("b".into(), Waveform::Sine);
        b.fm.push("a".into());
        let inst = Instrument { name: "loop".into(), oscillators: vec![a, b] };
        let err = compile(&book_with(vec![inst], vec![])).unwrap_err();
        assert!(matches!(err, CompileError::ModulationCycle { .. }));
    }

    #[test]
    fn self_feedback_is_rejected() {
        let mut a = Oscillator::new("a".into(), Waveform::Sine);
        a.pm.push("a".into());
        let inst = Instrument { name: "selfie".into(), oscillators: vec![a] };
        let err = compile(&book_with(vec![inst], vec![])).unwrap_err();
        assert!(matches!(err, CompileError::ModulationCycle { .. }));
    }

    #[test]
    fn unknown_instrument_is_rejected() {
        let song = {
            let mut s = Song::new("tune".into());
            s.voices.push(Voice { instrument: "missing".into(), commands: vec![] });
            s
        };
        let err = compile(&book_with(vec![], vec![song])).unwrap_err();
        assert!(matches!(err, CompileError::UnknownInstrument { .. }));
    }

    #[test]
    fn unplayable_tempo_is_rejected() {
        // zero, negative, and denominator-0 tempos all leave a beat with no
        // defined length
        for tempo in [
            Number::rational(0, 1),
            Number::rational(-120, 1),
            Number::rational(60, 0),
        ] {
            let mut song = Song::new("tune".into());
            song.tempo = tempo;
            let err = compile(&book_with(vec![], vec![song])).unwrap_err();
            assert!(matches!(err, CompileError::InvalidTempo { .. }), "{tempo:?}");
        }
    }

    #[test]
    fn tempo_and_root_fixed_against_base_one() {
        let mut song = Song::new("tune".into());
        song.tempo = Number::rational(90, 1);
        song.root = Number::rational(220, 1);
        let compiled = compile(&book_with(vec![], vec![song])).expect("compile failed");
        assert_eq!(compiled.songs[0].tempo, 90.0);
        assert_eq!(compiled.songs[0].root, 220.0);
    }
}
