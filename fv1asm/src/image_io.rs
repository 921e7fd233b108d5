//! Reads and writes a program image as 128 big-endian 32-bit words (spec.md
//! §6), the wire format real FV-1 programmers flash to the chip. Mirrors
//! `vexfile`'s reader/writer-extension-trait shape, minus its two-section
//! data/instructions split — an FV-1 image is just the word array.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use fv1::constants::PROGRAM_CAPACITY;
use fv1::ProgramImage;

pub fn read<R: Read>(reader: &mut R) -> std::io::Result<ProgramImage> {
    let mut words = [0u32; PROGRAM_CAPACITY];
    for word in words.iter_mut() {
        *word = reader.read_u32::<BigEndian>()?;
    }
    Ok(ProgramImage::from_words(&words))
}

pub fn write<W: Write>(writer: &mut W, program: &ProgramImage) -> std::io::Result<()> {
    for &word in program.as_slice().iter() {
        writer.write_u32::<BigEndian>(word)?;
    }
    Ok(())
}

pub trait ReadFv1Ext: Read + Sized {
    fn read_fv1_image(&mut self) -> std::io::Result<ProgramImage> {
        read(self)
    }
}

impl<R: Read + Sized> ReadFv1Ext for R {}

pub trait WriteFv1Ext: Write + Sized {
    fn write_fv1_image(&mut self, program: &ProgramImage) -> std::io::Result<()> {
        write(self, program)
    }
}

impl<W: Write + Sized> WriteFv1Ext for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<ProgramImage> {
    BufReader::new(File::open(path)?).read_fv1_image()
}

pub fn write_file<P: AsRef<Path>>(path: P, program: &ProgramImage) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_fv1_image(program)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_a_byte_buffer() {
        let mut words = [0u32; PROGRAM_CAPACITY];
        words[0] = 0xDEAD_BEEF;
        words[1] = 0x0000_0011;
        let program = ProgramImage::from_words(&words);

        let mut buffer = Vec::new();
        write(&mut buffer, &program).unwrap();
        assert_eq!(buffer.len(), PROGRAM_CAPACITY * 4);
        assert_eq!(&buffer[0..4], &[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut cursor = std::io::Cursor::new(buffer);
        let read_back = read(&mut cursor).unwrap();
        assert_eq!(read_back.as_slice(), program.as_slice());
    }
}
