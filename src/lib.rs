pub mod ast;
pub mod compiler;
pub mod dsp;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

use crate::error::TunebookError;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse tunebook source into a [`Book`](ast::Book).
pub fn parse(input: &str) -> Result<ast::Book, TunebookError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse_book()?)
}

/// Parse and lower tunebook source into a render-ready
/// [`CompiledBook`](compiler::CompiledBook).
pub fn compile(input: &str) -> Result<compiler::CompiledBook, TunebookError> {
    let book = parse(input)?;
    Ok(compiler::compile(&book)?)
}

/// Parse, compile, and render every song of `input` into `out_dir`, one
/// raw PCM file per song.
pub fn render_to_dir(input: &str, out_dir: &std::path::Path) -> Result<(), TunebookError> {
    let book = compile(input)?;
    dsp::renderer::write_book(&book, out_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pipeline_source_to_samples() {
        let source = r#"
            instrument "organ"
              sine "vibrato" volume 1/8 hz 6 fm ( "main" )
              sine "main" attack 1/16 release 1/8

            song "scale"
              tempo 120
              voice "organ"
                0\1 2\12 4\12 5\12 7\12 9\12 11\12 1\1
        "#;
        let book = compile(source).expect("compile failed");
        let samples = dsp::renderer::render_song(&book, &book.songs[0]).expect("render failed");
        // eight beats at tempo 120, last note trailing its release
        let beat = dsp::SAMPLE_RATE as usize / 2;
        assert_eq!(samples.len(), 7 * beat + (beat as f64 * 1.125) as usize);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn section_repeat_round_trip() {
        let source = r#"
            instrument "solo" sine "main"
            song "loop"
              voice "solo"
                section 0\1 7\12 repeat 2
        "#;
        let book = compile(source).expect("compile failed");
        let samples = dsp::renderer::render_song(&book, &book.songs[0]).expect("render failed");
        // the two-note block plays three times in total
        let beat = dsp::SAMPLE_RATE as usize;
        assert_eq!(samples.len(), 5 * beat + (beat as f64 * (1.0 + 1.0 / 32.0)) as usize);
    }
}
