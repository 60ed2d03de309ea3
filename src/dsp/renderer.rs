//! Per-song orchestration: render every voice into one shared buffer and
//! write the result as a raw PCM file.

use std::fs;
use std::path::{Path, PathBuf};

use super::buffer::SongBuffer;
use super::engine::RenderContext;
use crate::compiler::{CompiledBook, CompiledSong};
use crate::error::{RenderError, TunebookError};

/// Output files are `<song-name>` plus this extension: raw signed 16-bit
/// little-endian PCM, mono, 44100 Hz, no header.
pub const FILE_EXTENSION: &str = ".l16";

/// Render one song to samples. Voices render strictly in order, each
/// starting at position 0 of the same buffer, so they mix additively; the
/// final length is set by whichever voice reaches furthest.
pub fn render_song(book: &CompiledBook, song: &CompiledSong) -> Result<Vec<i16>, RenderError> {
    let mut buffer = SongBuffer::new();
    for voice in &song.voices {
        let instrument = &book.instruments[voice.instrument];
        let mut context = RenderContext::new(song, instrument, &mut buffer);
        context.run(&voice.commands)?;
    }
    Ok(buffer.into_samples())
}

/// File path for a song inside `dir`.
pub fn song_path(dir: &Path, song: &CompiledSong) -> PathBuf {
    dir.join(format!("{}{}", song.name, FILE_EXTENSION))
}

/// Render every song of the book into `dir`, one file per song.
pub fn write_book(book: &CompiledBook, dir: &Path) -> Result<(), TunebookError> {
    for song in &book.songs {
        let samples = render_song(book, song)?;
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        fs::write(song_path(dir, song), bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Book, Command, Instrument, Number, Oscillator, Song, Voice, Waveform};
    use crate::compiler::compile;
    use crate::dsp::SAMPLE_RATE;

    fn demo_book() -> CompiledBook {
        let instrument = Instrument {
            name: "solo".into(),
            oscillators: vec![Oscillator::new("main".into(), Waveform::Sine)],
        };
        let mut song = Song::new("demo".into());
        song.voices.push(Voice {
            instrument: "solo".into(),
            commands: vec![Command::Note(Number::exponential(0, 1))],
        });
        compile(&Book { instruments: vec![instrument], songs: vec![song] })
            .expect("compile failed")
    }

    #[test]
    fn one_default_note_length_and_content() {
        let book = demo_book();
        let samples = render_song(&book, &book.songs[0]).expect("render failed");
        // one beat at tempo 60 plus the default 1/32 release tail
        let expected = (SAMPLE_RATE as f64 * (1.0 + 1.0 / 32.0)) as usize;
        assert_eq!(samples.len(), expected);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn second_voice_mixes_into_the_same_timeline() {
        let book = demo_book();
        let single = render_song(&book, &book.songs[0]).expect("render failed");

        let mut doubled = demo_book();
        let voice = doubled.songs[0].voices[0].clone();
        doubled.songs[0].voices.push(voice);
        let mixed = render_song(&doubled, &doubled.songs[0]).expect("render failed");

        assert_eq!(mixed.len(), single.len());
        for i in 0..mixed.len() {
            assert_eq!(mixed[i], single[i].saturating_add(single[i]), "sample {i}");
        }
    }

    #[test]
    fn write_book_produces_one_file_per_song() {
        let book = demo_book();
        let dir = tempfile::tempdir().expect("tempdir");
        write_book(&book, dir.path()).expect("write failed");

        let path = song_path(dir.path(), &book.songs[0]);
        assert!(path.ends_with("demo.l16"));
        let bytes = std::fs::read(&path).expect("read back");
        let samples = render_song(&book, &book.songs[0]).expect("render failed");
        assert_eq!(bytes.len(), samples.len() * 2);
        // spot-check the little-endian layout
        let first = i16::from_le_bytes([bytes[0], bytes[1]]);
        assert_eq!(first, samples[0]);
    }
}
