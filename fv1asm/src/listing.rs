//! Human-readable program listing (spec.md §6): one `address<TAB>word` line
//! per instruction slot, hex-formatted the way a disassembly dump would be.

use fv1::ProgramImage;

/// Renders `program` as `NNNN\tHHHHHHHH` lines, one per instruction address.
pub fn format_listing(program: &ProgramImage) -> String {
    let mut out = String::new();
    for (address, &word) in program.as_slice().iter().enumerate() {
        out.push_str(&format!("{:04}\t{:08X}\n", address, word));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_line_is_address_zero() {
        let program = ProgramImage::default();
        let listing = format_listing(&program);
        let first_line = listing.lines().next().unwrap();
        assert_eq!(first_line, "0000\t00000011");
    }

    #[test]
    fn listing_has_one_line_per_instruction_slot() {
        let program = ProgramImage::default();
        assert_eq!(format_listing(&program).lines().count(), fv1::constants::PROGRAM_CAPACITY);
    }
}
