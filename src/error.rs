use crate::token::{Span, Token};
use std::fmt;

#[derive(Debug)]
pub enum TunebookError {
    Lex(LexError),
    Parse(ParseError),
    Compile(CompileError),
    Render(RenderError),
    Io(std::io::Error),
}

#[derive(Debug)]
pub enum LexError {
    UnexpectedChar { ch: char, pos: usize },
    UnterminatedString { pos: usize },
    UnknownWord { word: String, pos: usize },
}

#[derive(Debug)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: Token,
        span: Span,
    },
    UnexpectedEOF {
        expected: String,
    },
    /// `repeat` with no open `section` in the same voice.
    RepeatWithoutSection {
        span: Span,
    },
    /// A fixed quantity (oscillator parameter) written with denominator 0.
    ZeroDenominator {
        span: Span,
    },
}

#[derive(Debug)]
pub enum CompileError {
    /// A voice names an instrument absent from the book.
    UnknownInstrument { song: String, instrument: String },
    /// The modulation routing of an instrument contains a cycle, which
    /// would recurse forever at render time.
    ModulationCycle { instrument: String, oscillator: String },
    /// A song's tempo is zero, negative, or not finite, so a beat has no
    /// defined length.
    InvalidTempo { song: String, tempo: f64 },
}

#[derive(Debug)]
pub enum RenderError {
    /// A rational number with denominator 0 reached the interpreter.
    DivisionByZero,
    /// Every oscillator of the instrument is a modulator, so no carrier
    /// can be selected for a note.
    NoCarrier { instrument: String },
}

impl fmt::Display for TunebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunebookError::Lex(e) => write!(f, "Lexer error: {e}"),
            TunebookError::Parse(e) => write!(f, "Parse error: {e}"),
            TunebookError::Compile(e) => write!(f, "Compile error: {e}"),
            TunebookError::Render(e) => write!(f, "Render error: {e}"),
            TunebookError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for TunebookError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar { ch, pos } => {
                write!(f, "Unexpected char '{ch}' at pos {pos}")
            }
            LexError::UnterminatedString { pos } => {
                write!(f, "Unterminated string at pos {pos}")
            }
            LexError::UnknownWord { word, pos } => {
                write!(f, "Unknown word '{word}' at pos {pos}")
            }
        }
    }
}

impl std::error::Error for LexError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, span } => {
                write!(f, "Expected {expected}, found {found:?} at pos {}", span.start)
            }
            ParseError::UnexpectedEOF { expected } => {
                write!(f, "Unexpected end of file, expected {expected}")
            }
            ParseError::RepeatWithoutSection { span } => {
                write!(f, "'repeat' without a matching 'section' at pos {}", span.start)
            }
            ParseError::ZeroDenominator { span } => {
                write!(f, "Number with denominator 0 at pos {}", span.start)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownInstrument { song, instrument } => {
                write!(f, "Song \"{song}\" uses unknown instrument \"{instrument}\"")
            }
            CompileError::ModulationCycle { instrument, oscillator } => {
                write!(
                    f,
                    "Modulation cycle in instrument \"{instrument}\" through oscillator \"{oscillator}\""
                )
            }
            CompileError::InvalidTempo { song, tempo } => {
                write!(f, "Song \"{song}\" has invalid tempo {tempo}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::DivisionByZero => {
                write!(f, "Rational number with denominator 0")
            }
            RenderError::NoCarrier { instrument } => {
                write!(f, "Instrument \"{instrument}\" has no carrier oscillator")
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl From<LexError> for TunebookError {
    fn from(e: LexError) -> Self {
        TunebookError::Lex(e)
    }
}

impl From<ParseError> for TunebookError {
    fn from(e: ParseError) -> Self {
        TunebookError::Parse(e)
    }
}

impl From<CompileError> for TunebookError {
    fn from(e: CompileError) -> Self {
        TunebookError::Compile(e)
    }
}

impl From<RenderError> for TunebookError {
    fn from(e: RenderError) -> Self {
        TunebookError::Render(e)
    }
}

impl From<std::io::Error> for TunebookError {
    fn from(e: std::io::Error) -> Self {
        TunebookError::Io(e)
    }
}
