//! Positional queries over a cigar and its read/reference buffers
//!
//! Read offsets are 0-based into the read's bases (soft clips included).
//! Reference offsets are 0-based into whatever reference buffer the caller
//! passes; callers that work in genome coordinates pass those instead and
//! get genome coordinates back.

use crate::cigar::{Cigar, CigarOperator};
use crate::error::{CigarError, Result};

/// Placed at every deleted or skipped reference position of an alignment byte array
pub const DELETION_BASE: u8 = b'D';
/// An `A` immediately followed by an insertion
pub const A_FOLLOWED_BY_INSERTION_BASE: u8 = 87;
/// A `C` immediately followed by an insertion
pub const C_FOLLOWED_BY_INSERTION_BASE: u8 = 88;
/// A `T` immediately followed by an insertion
pub const T_FOLLOWED_BY_INSERTION_BASE: u8 = 89;
/// A `G` immediately followed by an insertion
pub const G_FOLLOWED_BY_INSERTION_BASE: u8 = 90;

/// Marker for `base` when an insertion follows it; other bases are returned unchanged
const fn followed_by_insertion(base: u8) -> u8 {
    match base {
        b'A' => A_FOLLOWED_BY_INSERTION_BASE,
        b'C' => C_FOLLOWED_BY_INSERTION_BASE,
        b'T' => T_FOLLOWED_BY_INSERTION_BASE,
        b'G' => G_FOLLOWED_BY_INSERTION_BASE,
        other => other,
    }
}

pub(crate) fn slice_at(seq: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    seq.get(start..start + len)
        .ok_or(CigarError::OffsetOutOfBounds {
            offset: start + len,
            length: seq.len(),
        })
}

/// Number of differences between `read` and `reference` under `cigar`
///
/// Each mismatched aligned base counts one. Every inserted and deleted base
/// counts one.
pub fn calc_num_different_bases(cigar: &Cigar, reference: &[u8], read: &[u8]) -> Result<usize> {
    use CigarOperator::*;

    let mut ref_index = 0;
    let mut read_index = 0;
    let mut delta = 0;

    for element in cigar {
        let len = element.len;
        match element.op {
            Match | SequenceMatch | SequenceMismatch => {
                let ref_bases = slice_at(reference, ref_index, len)?;
                let read_bases = slice_at(read, read_index, len)?;
                delta += ref_bases
                    .iter()
                    .zip(read_bases)
                    .filter(|(r, b)| r != b)
                    .count();
                ref_index += len;
                read_index += len;
            }
            Insertion => {
                delta += len;
                read_index += len;
            }
            SoftClip => read_index += len,
            Deletion => {
                delta += len;
                ref_index += len;
            }
            Skip => ref_index += len,
            HardClip | Padding => {}
        }
    }

    Ok(delta)
}

/// Index into the alignment byte array of a pileup position
///
/// For a base, `read_offset` locates it in the read. For a deletion,
/// `read_offset` is ignored and the position is derived from `ref_locus`
/// relative to `alignment_start`, clamped to the alignment start when
/// `ref_locus` lies before it. Offsets inside a soft clip or insertion map
/// to the last aligned position before it.
pub fn calc_alignment_byte_array_offset(
    cigar: &Cigar,
    read_offset: usize,
    is_deletion: bool,
    alignment_start: usize,
    ref_locus: usize,
) -> usize {
    use CigarOperator::*;

    let pileup_offset = if is_deletion {
        let leading_soft_clip = match cigar.first() {
            Some(e) if e.op == SoftClip => e.len,
            _ => 0,
        };
        ref_locus.saturating_sub(alignment_start) + leading_soft_clip
    } else {
        read_offset
    };

    let mut pos = 0;
    let mut alignment_pos = 0;
    for element in cigar {
        let len = element.len;
        match element.op {
            Insertion | SoftClip => {
                pos += len;
                if pos >= pileup_offset {
                    return alignment_pos;
                }
            }
            Deletion if !is_deletion => alignment_pos += len,
            Deletion | Match | SequenceMatch | SequenceMismatch => {
                if pos + len > pileup_offset {
                    return alignment_pos + (pileup_offset - pos);
                }
                pos += len;
                alignment_pos += len;
            }
            HardClip | Padding | Skip => {}
        }
    }

    alignment_pos
}

/// Project `read` onto the reference span of `cigar`
///
/// The result has one byte per reference position: the aligned read base,
/// `DELETION_BASE` for deleted or skipped positions, and the
/// followed-by-insertion marker on the base just before an insertion.
pub fn read_to_alignment_byte_array(cigar: &Cigar, read: &[u8]) -> Result<Vec<u8>> {
    use CigarOperator::*;

    let mut alignment = Vec::with_capacity(cigar.reference_length());
    let mut read_pos = 0;

    for element in cigar {
        let len = element.len;
        match element.op {
            Insertion => {
                if let Some(last) = alignment.last_mut() {
                    *last = followed_by_insertion(*last);
                }
                read_pos += len;
            }
            SoftClip => read_pos += len,
            Deletion | Skip => alignment.extend(std::iter::repeat(DELETION_BASE).take(len)),
            Match | SequenceMatch | SequenceMismatch => {
                alignment.extend_from_slice(slice_at(read, read_pos, len)?);
                read_pos += len;
            }
            HardClip | Padding => {}
        }
    }

    Ok(alignment)
}

/// Whether `offset` falls inside a deletion
///
/// Positions accumulate over soft clips, insertions, aligned runs and
/// deletions; skipped regions, hard clips and padding do not move them.
pub fn is_inside_deletion(cigar: &Cigar, offset: i64) -> bool {
    if offset < 0 {
        return false;
    }
    let offset = offset as u64;

    let mut pos: u64 = 0;
    for element in cigar {
        if matches!(
            element.op,
            CigarOperator::Skip | CigarOperator::HardClip | CigarOperator::Padding
        ) {
            continue;
        }
        let prev_pos = pos;
        pos += element.len as u64;
        if element.op == CigarOperator::Deletion && prev_pos < offset && offset <= pos {
            return true;
        }
    }
    false
}

/// Reference offset of the first aligned base at or after read offset `start`
pub fn calc_first_base_matching_reference_in_cigar(cigar: &Cigar, start: usize) -> Result<usize> {
    use CigarOperator::*;

    let read_length = cigar.read_length();
    if start >= read_length {
        return Err(CigarError::OffsetOutOfBounds {
            offset: start,
            length: read_length,
        });
    }

    let mut read_offset = 0;
    let mut ref_offset = 0;
    for element in cigar {
        let len = element.len;
        match element.op {
            Match | SequenceMatch | SequenceMismatch => {
                if len > 0 && read_offset + len > start {
                    return Ok(ref_offset + start.saturating_sub(read_offset));
                }
                read_offset += len;
                ref_offset += len;
            }
            Insertion | SoftClip => read_offset += len,
            Deletion => ref_offset += len,
            op => {
                return Err(CigarError::UnsupportedOperator {
                    op,
                    context: "first base matching the reference",
                })
            }
        }
    }

    Err(CigarError::InvalidState(format!(
        "No aligned base at or after read offset {} in {}",
        start, cigar
    )))
}

/// Bases of the read that cover reference positions [ref_start, ref_end]
///
/// `bases_start_on_ref` is the reference position of the first base. Returns
/// `Ok(None)` when either end lands in a deletion or the interval is not
/// entirely covered by the alignment.
pub fn get_bases_covering_ref_interval<'a>(
    ref_start: usize,
    ref_end: usize,
    bases: &'a [u8],
    bases_start_on_ref: usize,
    cigar: &Cigar,
) -> Result<Option<&'a [u8]>> {
    use CigarOperator::*;

    if ref_end < ref_start {
        return Err(CigarError::InvalidInterval {
            start: ref_start,
            end: ref_end,
        });
    }
    let read_length = cigar.read_length();
    if bases.len() != read_length {
        return Err(CigarError::LengthMismatch {
            expected: read_length,
            actual: bases.len(),
        });
    }

    let covers = |pos: usize, len: usize, target: usize| target >= pos && target < pos + len;

    let mut ref_pos = bases_start_on_ref;
    let mut bases_pos = 0;
    let mut bases_start = None;
    for element in cigar {
        let len = element.len;
        match element.op {
            Insertion => bases_pos += len,
            Match | SequenceMatch | SequenceMismatch => {
                if bases_start.is_none() && covers(ref_pos, len, ref_start) {
                    bases_start = Some(bases_pos + (ref_start - ref_pos));
                }
                if covers(ref_pos, len, ref_end) {
                    let stop = bases_pos + (ref_end - ref_pos);
                    return Ok(bases_start.map(|start| &bases[start..=stop]));
                }
                ref_pos += len;
                bases_pos += len;
            }
            Deletion => {
                if covers(ref_pos, len, ref_start) || covers(ref_pos, len, ref_end) {
                    return Ok(None);
                }
                ref_pos += len;
            }
            op => {
                return Err(CigarError::UnsupportedOperator {
                    op,
                    context: "bases covering a reference interval",
                })
            }
        }
    }

    Ok(None)
}

/// Read offset of the base aligned to reference coordinate `ref_coord`
///
/// Soft-clipped bases are laid out on the reference starting at `soft_start`,
/// as if they were aligned. Returns None before the soft start, past the end
/// of the read, and inside deletions or skipped regions.
pub fn get_read_coordinate_for_reference_coordinate(
    soft_start: usize,
    cigar: &Cigar,
    ref_coord: usize,
) -> Option<usize> {
    if ref_coord < soft_start {
        return None;
    }

    let mut ref_pos = soft_start;
    let mut read_pos = 0;
    for element in cigar {
        let on_reference = element.op.consumes_reference() || element.op == CigarOperator::SoftClip;
        let on_read = element.op.consumes_read();

        if on_reference {
            if ref_coord < ref_pos + element.len {
                return on_read.then(|| read_pos + (ref_coord - ref_pos));
            }
            ref_pos += element.len;
        }
        if on_read {
            read_pos += element.len;
        }
    }
    None
}
