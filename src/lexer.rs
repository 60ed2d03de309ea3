use crate::ast::{Number, NumberKind};
use crate::error::LexError;
use crate::token::{Span, Spanned, Token};

pub struct Lexer {
    chars: Vec<char>,
    /// Precomputed byte offset for each char index.
    /// `byte_offsets[i]` = byte offset of `chars[i]` in the original `&str`.
    /// `byte_offsets[chars.len()]` = total byte length (sentinel for EOF).
    byte_offsets: Vec<usize>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut offset = 0;
        for ch in &chars {
            byte_offsets.push(offset);
            offset += ch.len_utf8();
        }
        byte_offsets.push(offset); // sentinel for EOF
        Lexer { chars, byte_offsets, pos: 0 }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let is_eof = spanned.token == Token::EOF;
            tokens.push(spanned);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    /// Convert a char index to a byte offset.
    fn byte_pos_of(&self, char_idx: usize) -> usize {
        self.byte_offsets[char_idx.min(self.chars.len())]
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            span: Span {
                start: self.byte_pos_of(start),
                end: self.byte_pos_of(self.pos),
            },
        }
    }

    fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();

        if self.pos >= self.chars.len() {
            return Ok(Spanned {
                token: Token::EOF,
                span: Span {
                    start: self.byte_pos_of(self.pos),
                    end: self.byte_pos_of(self.pos),
                },
            });
        }

        let start = self.pos;
        let ch = self.chars[self.pos];

        match ch {
            '(' => {
                self.advance();
                Ok(self.spanned(Token::ChordStart, start))
            }
            ')' => {
                self.advance();
                Ok(self.spanned(Token::ChordEnd, start))
            }
            '"' => self.lex_string(start),
            c if c == '-' || c.is_ascii_digit() => self.lex_number(start),
            _ => self.lex_word(start),
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Spanned, LexError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some(c) => s.push(c),
                None => {
                    return Err(LexError::UnterminatedString { pos: self.byte_pos_of(start) });
                }
            }
        }
        Ok(self.spanned(Token::StringLit(s), start))
    }

    /// Numbers are `N`, `N/D` (rational) or `N\D` (exponential), optionally
    /// signed. A missing denominator defaults to 1; a separator followed by
    /// no digits yields denominator 0, rejected later at the point the value
    /// is actually evaluated.
    fn lex_number(&mut self, start: usize) -> Result<Spanned, LexError> {
        let sign = if self.peek() == Some('-') {
            self.advance();
            -1
        } else {
            1
        };
        let numerator = sign * self.lex_digits();
        let mut number = Number::rational(numerator, 1);
        match self.peek() {
            Some('/') => {
                self.advance();
                number.denominator = self.lex_digits();
            }
            Some('\\') => {
                self.advance();
                number.kind = NumberKind::Exponential;
                number.denominator = self.lex_digits();
            }
            _ => {}
        }
        Ok(self.spanned(Token::Number(number), start))
    }

    fn lex_digits(&mut self) -> i32 {
        let mut value = 0i32;
        while let Some(c) = self.peek() {
            match c.to_digit(10) {
                Some(d) => {
                    value = value * 10 + d as i32;
                    self.advance();
                }
                None => break,
            }
        }
        value
    }

    /// Bare words run to the next whitespace and must match a keyword.
    fn lex_word(&mut self, start: usize) -> Result<Spanned, LexError> {
        while self.pos < self.chars.len() && !self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let token = match word.as_str() {
            "add" => Token::Add,
            "am" => Token::Am,
            "attack" => Token::Attack,
            "base" => Token::Base,
            "clip" => Token::Clip,
            "decay" => Token::Decay,
            "detune" => Token::Detune,
            "env" => Token::Env,
            "fm" => Token::Fm,
            "groove" => Token::Groove,
            "hz" => Token::Hz,
            "instrument" => Token::Instrument,
            "legato" => Token::Legato,
            "modulate" => Token::Modulate,
            "noise" => Token::Noise,
            "pm" => Token::Pm,
            "release" => Token::Release,
            "repeat" => Token::Repeat,
            "r" | "rest" => Token::Rest,
            "root" => Token::Root,
            "saw" => Token::Saw,
            "section" => Token::Section,
            "sin" | "sine" => Token::Sine,
            "song" => Token::Song,
            "sqr" | "square" => Token::Square,
            "sub" => Token::Sub,
            "sustain" => Token::Sustain,
            "tempo" => Token::Tempo,
            "tri" | "triangle" => Token::Triangle,
            "voice" => Token::Voice,
            "volume" => Token::Volume,
            _ => {
                return Err(LexError::UnknownWord { word, pos: self.byte_pos_of(start) });
            }
        };
        Ok(self.spanned(token, start))
    }
}
