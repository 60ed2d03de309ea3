//! CLI: render a tunebook file to raw PCM audio, one file per song.

use std::fs;
use std::io::Read;
use std::ops::Range;
use std::path::PathBuf;
use std::process;

use ariadne::{Label, Report, ReportKind, Source};
use clap::Parser;

use tunebook_core::dsp::renderer::{render_song, song_path};
use tunebook_core::error::{LexError, ParseError, TunebookError};

#[derive(Parser)]
#[command(
    name = "tunebook",
    version,
    about = "Render tunebook notation to raw PCM audio files"
)]
struct Args {
    /// Tunebook source file; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Directory for the rendered `.l16` files.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the compiled book as JSON instead of rendering.
    #[arg(long)]
    dump: bool,
}

fn main() {
    let args = Args::parse();

    let (name, source) = match read_input(&args.input) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("tunebook: {err}");
            process::exit(1);
        }
    };

    let book = match tunebook_core::compile(&source) {
        Ok(book) => book,
        Err(err) => {
            report(&name, &source, &err);
            process::exit(1);
        }
    };

    if args.dump {
        match serde_json::to_string_pretty(&book) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("tunebook: {err}");
                process::exit(1);
            }
        }
        return;
    }

    for song in &book.songs {
        let samples = match render_song(&book, song) {
            Ok(samples) => samples,
            Err(err) => {
                eprintln!("tunebook: song \"{}\": {err}", song.name);
                process::exit(1);
            }
        };
        let path = song_path(&args.out_dir, song);
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in &samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        if let Err(err) = fs::write(&path, bytes) {
            eprintln!("tunebook: {}: {err}", path.display());
            process::exit(1);
        }
        println!("{} ({} samples)", path.display(), samples.len());
    }
}

fn read_input(input: &Option<PathBuf>) -> std::io::Result<(String, String)> {
    match input {
        Some(path) => Ok((path.display().to_string(), fs::read_to_string(path)?)),
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}

/// Print a source-annotated report for spanned errors, a plain line for
/// everything else.
fn report(name: &str, source: &str, err: &TunebookError) {
    let span: Option<Range<usize>> = match err {
        TunebookError::Lex(e) => match e {
            LexError::UnexpectedChar { pos, .. }
            | LexError::UnterminatedString { pos }
            | LexError::UnknownWord { pos, .. } => Some(*pos..(*pos + 1).min(source.len())),
        },
        TunebookError::Parse(e) => match e {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::RepeatWithoutSection { span }
            | ParseError::ZeroDenominator { span } => Some(span.start..span.end),
            ParseError::UnexpectedEOF { .. } => None,
        },
        _ => None,
    };
    match span {
        Some(range) if !source.is_empty() => {
            let message = err.to_string();
            let _ = Report::build(ReportKind::Error, (name, range.clone()))
                .with_message(&message)
                .with_label(Label::new((name, range)).with_message(&message))
                .finish()
                .eprint((name, Source::from(source)));
        }
        _ => eprintln!("tunebook: {err}"),
    }
}
