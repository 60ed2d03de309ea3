use crate::ast::*;
use crate::error::ParseError;
use crate::token::{Span, Spanned, Token};

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser { tokens, pos: 0 }
    }

    // ── Helpers ──────────────────────────────────────────────

    fn peek(&self) -> Token {
        self.tokens[self.pos].token.clone()
    }

    fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) -> Spanned {
        let s = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        s
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::EOF)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.peek(),
            span: self.span(),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::StringLit(s) => {
                self.advance();
                Ok(s)
            }
            Token::EOF => Err(ParseError::UnexpectedEOF { expected: "string".into() }),
            _ => Err(self.unexpected("string")),
        }
    }

    fn expect_number(&mut self) -> Result<Number, ParseError> {
        match self.peek() {
            Token::Number(n) => {
                self.advance();
                Ok(n)
            }
            Token::EOF => Err(ParseError::UnexpectedEOF { expected: "number".into() }),
            _ => Err(self.unexpected("number")),
        }
    }

    /// Oscillator parameters are plain quantities, read once against base 1
    /// and never re-evaluated, so a denominator of 0 is rejected here
    /// instead of surfacing as an infinity at render time.
    fn expect_fixed_number(&mut self) -> Result<f64, ParseError> {
        let span = self.span();
        let n = self.expect_number()?;
        if n.denominator == 0 {
            return Err(ParseError::ZeroDenominator { span });
        }
        Ok(n.evaluate(1.0))
    }

    /// `( "name" "name" ... )`
    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        match self.peek() {
            Token::ChordStart => self.advance(),
            _ => return Err(self.unexpected("'('")),
        };
        let mut names = Vec::new();
        loop {
            match self.peek() {
                Token::ChordEnd => {
                    self.advance();
                    break;
                }
                Token::StringLit(s) => {
                    self.advance();
                    names.push(s);
                }
                Token::EOF => {
                    return Err(ParseError::UnexpectedEOF { expected: "string or ')'".into() });
                }
                _ => return Err(self.unexpected("string or ')'")),
            }
        }
        Ok(names)
    }

    /// `( n n ... )`
    fn parse_number_list(&mut self) -> Result<Vec<Number>, ParseError> {
        match self.peek() {
            Token::ChordStart => self.advance(),
            _ => return Err(self.unexpected("'('")),
        };
        let mut numbers = Vec::new();
        loop {
            match self.peek() {
                Token::ChordEnd => {
                    self.advance();
                    break;
                }
                Token::Number(n) => {
                    self.advance();
                    numbers.push(n);
                }
                Token::EOF => {
                    return Err(ParseError::UnexpectedEOF { expected: "number or ')'".into() });
                }
                _ => return Err(self.unexpected("number or ')'")),
            }
        }
        Ok(numbers)
    }

    // ── Book ─────────────────────────────────────────────────

    pub fn parse_book(&mut self) -> Result<Book, ParseError> {
        let mut book = Book { instruments: Vec::new(), songs: Vec::new() };
        while !self.is_at_end() {
            match self.peek() {
                Token::Instrument => book.instruments.push(self.parse_instrument()?),
                Token::Song => book.songs.push(self.parse_song()?),
                _ => return Err(self.unexpected("'instrument' or 'song'")),
            }
        }
        Ok(book)
    }

    // ── Instrument ───────────────────────────────────────────

    fn parse_instrument(&mut self) -> Result<Instrument, ParseError> {
        self.advance(); // 'instrument'
        let name = self.expect_string()?;
        let mut oscillators = Vec::new();
        while matches!(
            self.peek(),
            Token::Sine | Token::Saw | Token::Triangle | Token::Square | Token::Noise
        ) {
            oscillators.push(self.parse_oscillator()?);
        }
        Ok(Instrument { name, oscillators })
    }

    fn parse_oscillator(&mut self) -> Result<Oscillator, ParseError> {
        let shape = match self.advance().token {
            Token::Sine => Waveform::Sine,
            Token::Saw => Waveform::Saw,
            Token::Triangle => Waveform::Triangle,
            Token::Square => Waveform::Square,
            Token::Noise => Waveform::Noise,
            _ => return Err(self.unexpected("oscillator shape")),
        };
        let name = self.expect_string()?;
        let mut osc = Oscillator::new(name, shape);
        loop {
            match self.peek() {
                Token::Attack => {
                    self.advance();
                    osc.attack = self.expect_fixed_number()?;
                }
                Token::Decay => {
                    self.advance();
                    osc.decay = self.expect_fixed_number()?;
                }
                Token::Sustain => {
                    self.advance();
                    osc.sustain = self.expect_fixed_number()?;
                }
                Token::Release => {
                    self.advance();
                    osc.release = self.expect_fixed_number()?;
                }
                Token::Volume => {
                    self.advance();
                    osc.volume = self.expect_fixed_number()?;
                }
                Token::Hz => {
                    self.advance();
                    osc.hz = self.expect_fixed_number()?;
                }
                Token::Detune => {
                    self.advance();
                    osc.detune = self.expect_fixed_number()?;
                }
                Token::Clip => {
                    self.advance();
                    osc.clip = self.expect_fixed_number()?;
                }
                Token::Am => {
                    self.advance();
                    osc.am = self.parse_name_list()?;
                }
                Token::Fm => {
                    self.advance();
                    osc.fm = self.parse_name_list()?;
                }
                Token::Pm => {
                    self.advance();
                    osc.pm = self.parse_name_list()?;
                }
                Token::Add => {
                    self.advance();
                    osc.add = self.parse_name_list()?;
                }
                Token::Sub => {
                    self.advance();
                    osc.sub = self.parse_name_list()?;
                }
                Token::Env => {
                    self.advance();
                    osc.env = self.parse_name_list()?;
                }
                _ => break,
            }
        }
        Ok(osc)
    }

    // ── Song ─────────────────────────────────────────────────

    fn parse_song(&mut self) -> Result<Song, ParseError> {
        self.advance(); // 'song'
        let mut song = Song::new(self.expect_string()?);
        loop {
            match self.peek() {
                Token::Tempo => {
                    self.advance();
                    song.tempo = self.expect_number()?;
                }
                Token::Root => {
                    self.advance();
                    song.root = self.expect_number()?;
                }
                Token::Voice => song.voices.push(self.parse_voice()?),
                _ => break,
            }
        }
        Ok(song)
    }

    // ── Voice ────────────────────────────────────────────────

    fn parse_voice(&mut self) -> Result<Voice, ParseError> {
        self.advance(); // 'voice'
        let instrument = self.expect_string()?;
        let commands = self.parse_commands()?;
        Ok(Voice { instrument, commands })
    }

    /// Commands run until the next `voice`, `song`, `instrument`, or EOF.
    ///
    /// `section` opens a frame on a LIFO stack; `repeat n` pops it into a
    /// nested `Repeat` block. Frames still open when the voice ends were
    /// never repeated and are spliced back inline.
    fn parse_commands(&mut self) -> Result<Vec<Command>, ParseError> {
        let mut frames: Vec<Vec<Command>> = vec![Vec::new()];
        loop {
            let command = match self.peek() {
                Token::Number(n) => {
                    self.advance();
                    Command::Note(n)
                }
                Token::ChordStart => Command::Chord(self.parse_number_list()?),
                Token::Groove => {
                    self.advance();
                    Command::Groove(self.parse_number_list()?)
                }
                Token::Base => {
                    self.advance();
                    Command::Base(self.expect_number()?)
                }
                Token::Modulate => {
                    self.advance();
                    Command::Modulate(self.expect_number()?)
                }
                Token::Legato => {
                    self.advance();
                    Command::Legato(self.expect_number()?)
                }
                Token::Rest => {
                    self.advance();
                    Command::Rest
                }
                Token::Section => {
                    self.advance();
                    frames.push(Vec::new());
                    continue;
                }
                Token::Repeat => {
                    let span = self.span();
                    self.advance();
                    let count = self.expect_number()?;
                    if frames.len() < 2 {
                        return Err(ParseError::RepeatWithoutSection { span });
                    }
                    let body = frames.pop().unwrap_or_default();
                    Command::Repeat { count, body }
                }
                Token::Voice | Token::Song | Token::Instrument | Token::EOF => break,
                _ => return Err(self.unexpected("voice command")),
            };
            if let Some(frame) = frames.last_mut() {
                frame.push(command);
            }
        }
        let mut commands = frames.remove(0);
        for frame in frames {
            commands.extend(frame);
        }
        Ok(commands)
    }
}
