use crate::ast::{Number, NumberKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(Number),
    StringLit(String),

    // Punctuation — `(` and `)` delimit chords, grooves, and target lists
    ChordStart,
    ChordEnd,

    // Keywords
    Add,
    Am,
    Attack,
    Base,
    Clip,
    Decay,
    Detune,
    Env,
    Fm,
    Groove,
    Hz,
    Instrument,
    Legato,
    Modulate,
    Noise,
    Pm,
    Release,
    Repeat,
    Rest,
    Root,
    Saw,
    Section,
    Sine,
    Song,
    Square,
    Sub,
    Sustain,
    Tempo,
    Triangle,
    Voice,
    Volume,

    EOF,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

/// Convert a token back to its approximate source representation.
pub fn token_to_string(token: &Token) -> String {
    match token {
        Token::Number(n) => {
            let sep = match n.kind {
                NumberKind::Rational => '/',
                NumberKind::Exponential => '\\',
            };
            if n.kind == NumberKind::Rational && n.denominator == 1 {
                format!("{}", n.numerator)
            } else {
                format!("{}{}{}", n.numerator, sep, n.denominator)
            }
        }
        Token::StringLit(s) => format!("\"{s}\""),
        Token::ChordStart => "(".into(),
        Token::ChordEnd => ")".into(),
        Token::Add => "add".into(),
        Token::Am => "am".into(),
        Token::Attack => "attack".into(),
        Token::Base => "base".into(),
        Token::Clip => "clip".into(),
        Token::Decay => "decay".into(),
        Token::Detune => "detune".into(),
        Token::Env => "env".into(),
        Token::Fm => "fm".into(),
        Token::Groove => "groove".into(),
        Token::Hz => "hz".into(),
        Token::Instrument => "instrument".into(),
        Token::Legato => "legato".into(),
        Token::Modulate => "modulate".into(),
        Token::Noise => "noise".into(),
        Token::Pm => "pm".into(),
        Token::Release => "release".into(),
        Token::Repeat => "repeat".into(),
        Token::Rest => "rest".into(),
        Token::Root => "root".into(),
        Token::Saw => "saw".into(),
        Token::Section => "section".into(),
        Token::Sine => "sine".into(),
        Token::Song => "song".into(),
        Token::Square => "square".into(),
        Token::Sub => "sub".into(),
        Token::Sustain => "sustain".into(),
        Token::Tempo => "tempo".into(),
        Token::Triangle => "triangle".into(),
        Token::Voice => "voice".into(),
        Token::Volume => "volume".into(),
        Token::EOF => "".into(),
    }
}
