//! The 128-word program image the simulator executes.

use crate::constants::{NOP_WORD, PROGRAM_CAPACITY};

#[derive(Clone)]
pub struct ProgramImage {
    words: [u32; PROGRAM_CAPACITY],
}

impl ProgramImage {
    /// Builds a program image from assembled words, padding any remainder
    /// up to [`PROGRAM_CAPACITY`] with `NOP`.
    ///
    /// `words` longer than [`PROGRAM_CAPACITY`] is truncated rather than
    /// rejected; loading is a precondition-only operation and must never
    /// panic on a real-time audio thread. Use [`ProgramImage::load_words`]
    /// to find out whether truncation happened.
    pub fn from_words(words: &[u32]) -> ProgramImage {
        ProgramImage::load_words(words).0
    }

    /// Like [`ProgramImage::from_words`], but also reports whether `words`
    /// had to be truncated to fit [`PROGRAM_CAPACITY`].
    pub fn load_words(words: &[u32]) -> (ProgramImage, Option<String>) {
        let mut image = [NOP_WORD; PROGRAM_CAPACITY];
        let truncated = if words.len() > PROGRAM_CAPACITY {
            image.copy_from_slice(&words[..PROGRAM_CAPACITY]);
            Some(format!(
                "program has {} words, exceeding the {}-word capacity; truncated",
                words.len(),
                PROGRAM_CAPACITY
            ))
        } else {
            image[..words.len()].copy_from_slice(words);
            None
        };
        (ProgramImage { words: image }, truncated)
    }

    pub fn word(&self, address: usize) -> u32 {
        self.words[address % PROGRAM_CAPACITY]
    }

    pub fn as_slice(&self) -> &[u32; PROGRAM_CAPACITY] {
        &self.words
    }
}

impl Default for ProgramImage {
    fn default() -> ProgramImage {
        ProgramImage::from_words(&[])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_program_is_padded_with_nop() {
        let image = ProgramImage::from_words(&[0xDEAD_BEEF]);
        assert_eq!(image.word(0), 0xDEAD_BEEF);
        assert_eq!(image.word(1), NOP_WORD);
        assert_eq!(image.word(PROGRAM_CAPACITY - 1), NOP_WORD);
    }

    #[test]
    fn oversize_program_is_truncated_with_a_warning() {
        let words = vec![0xAAAA_AAAA; PROGRAM_CAPACITY + 5];
        let (image, warning) = ProgramImage::load_words(&words);
        assert!(warning.is_some());
        assert_eq!(image.word(PROGRAM_CAPACITY - 1), 0xAAAA_AAAA);
    }
}
