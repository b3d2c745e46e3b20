//! Writing candidate 2-clubs to the binary record format consumed by the external maximality
//! filter (ams-cardinality).
//!
//! The format is a plain record stream, all values little endian:
//! 4 bytes set id, 4 bytes set size, size * 4 bytes member vertex indices in ascending order.
//! Ids are assigned in emission order.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::Candidate;

/// Write all candidate records to a writer (e.g. an output file).
pub fn write<W: Write>(mut writer: W, candidates: &[Candidate]) -> Result<(), String> {
    for (id, candidate) in candidates.iter().enumerate() {
        writer
            .write_i32::<LittleEndian>(id as i32)
            .map_err(|e| e.to_string())?;
        writer
            .write_i32::<LittleEndian>(candidate.len() as i32)
            .map_err(|e| e.to_string())?;
        for vertex in candidate.members.ones() {
            writer
                .write_i32::<LittleEndian>(vertex as i32)
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Candidate, Membership};

    #[test]
    fn test_record_layout() {
        use crate::Membership::{Excluded, Included, Undecided};
        let candidates = vec![
            Candidate::from_labels(&[Included, Excluded, Undecided, Included]),
            Candidate::from_labels(&[Excluded, Included, Excluded, Excluded]),
        ];

        let mut buffer = Vec::new();
        super::write(&mut buffer, &candidates).unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0, 0, 0, 0,  3, 0, 0, 0,  0, 0, 0, 0,  2, 0, 0, 0,  3, 0, 0, 0,
            1, 0, 0, 0,  1, 0, 0, 0,  1, 0, 0, 0,
        ];
        assert_eq!(buffer, expected);
    }
}
