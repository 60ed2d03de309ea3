//! PCM accumulation buffer.
//!
//! One buffer per song, shared by every voice. Contributions are clamped
//! to [-1, 1] individually, scaled to the sample range, and summed with
//! saturating addition, so overlapping note tails, chord notes, and other
//! voices mix instead of overwriting — and a hot mix flattens at full
//! scale instead of wrapping around.

/// Full-scale value of one sample.
pub const SAMPLE_MAX: i16 = i16::MAX;

/// A growable mono sample buffer for one song.
#[derive(Debug, Default)]
pub struct SongBuffer {
    samples: Vec<i16>,
}

impl SongBuffer {
    pub fn new() -> Self {
        SongBuffer { samples: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Add one contribution at `index`, growing the buffer with silence as
    /// needed. `amp` is clamped to [-1, 1] before scaling.
    pub fn mix(&mut self, index: usize, amp: f64) {
        if index >= self.samples.len() {
            self.samples.resize(index + 1, 0);
        }
        let amp = amp.clamp(-1.0, 1.0);
        let contribution = (SAMPLE_MAX as f64 * amp).round() as i16;
        self.samples[index] = self.samples[index].saturating_add(contribution);
    }

    /// Grow the buffer with silence up to `len` samples. Rests use this to
    /// advance time without touching what other voices already wrote.
    pub fn extend_to(&mut self, len: usize) {
        if len > self.samples.len() {
            self.samples.resize(len, 0);
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Serialize as raw little-endian 16-bit PCM.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_grows_and_scales() {
        let mut buf = SongBuffer::new();
        buf.mix(3, 0.5);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.samples()[..3], [0, 0, 0]);
        assert_eq!(buf.samples()[3], (SAMPLE_MAX as f64 * 0.5).round() as i16);
    }

    #[test]
    fn contributions_sum() {
        let mut buf = SongBuffer::new();
        buf.mix(0, 0.25);
        buf.mix(0, 0.25);
        let one = (SAMPLE_MAX as f64 * 0.25).round() as i16;
        assert_eq!(buf.samples()[0], one + one);
    }

    #[test]
    fn per_contribution_clamp_before_scaling() {
        let mut buf = SongBuffer::new();
        buf.mix(0, 3.7);
        assert_eq!(buf.samples()[0], SAMPLE_MAX);
        let mut buf = SongBuffer::new();
        buf.mix(0, -3.7);
        assert_eq!(buf.samples()[0], -SAMPLE_MAX);
    }

    #[test]
    fn accumulation_saturates_instead_of_wrapping() {
        let mut buf = SongBuffer::new();
        buf.mix(0, 1.0);
        buf.mix(0, 1.0);
        assert_eq!(buf.samples()[0], i16::MAX);
        let mut buf = SongBuffer::new();
        buf.mix(0, -1.0);
        buf.mix(0, -1.0);
        assert_eq!(buf.samples()[0], i16::MIN);
    }

    #[test]
    fn extend_to_preserves_content() {
        let mut buf = SongBuffer::new();
        buf.mix(0, 0.5);
        buf.extend_to(10);
        assert_eq!(buf.len(), 10);
        assert_ne!(buf.samples()[0], 0);
        assert!(buf.samples()[1..].iter().all(|&s| s == 0));
        // shrinking never happens
        buf.extend_to(5);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn little_endian_bytes() {
        let mut buf = SongBuffer::new();
        buf.mix(0, 1.0);
        buf.mix(1, 0.0);
        let bytes = buf.to_bytes();
        assert_eq!(bytes, vec![0xFF, 0x7F, 0x00, 0x00]);
    }
}
