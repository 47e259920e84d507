use tracing::{debug, trace};

use crate::cigar::{Cigar, CigarElement, CigarOperator};
use crate::error::{CigarError, Result};

/// What `left_align_indel` does with a cigar carrying more than one indel
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MultipleIndelPolicy {
    /// Return the cigar unchanged
    #[default]
    KeepOriginal,
    /// Fail with `CigarError::MultipleIndels`
    Reject,
}

impl MultipleIndelPolicy {
    /// Convert to u8 for binary serialization
    pub fn to_u8(&self) -> u8 {
        match self {
            Self::KeepOriginal => 0,
            Self::Reject => 1,
        }
    }

    /// Parse from u8 for binary deserialization
    pub fn from_u8(byte: u8) -> std::result::Result<Self, String> {
        match byte {
            0 => Ok(Self::KeepOriginal),
            1 => Ok(Self::Reject),
            _ => Err(format!("Invalid multiple indel policy byte: {}", byte)),
        }
    }

    /// Parse from string representation (case-insensitive)
    pub fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "keep-original" => Ok(Self::KeepOriginal),
            "reject" => Ok(Self::Reject),
            _ => Err(format!(
                "Invalid multiple indel policy '{}'. Expected 'keep-original' or 'reject'",
                s
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepOriginal => "keep-original",
            Self::Reject => "reject",
        }
    }
}

impl std::fmt::Display for MultipleIndelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shift the single indel of `cigar` as far left as it can go without changing the haplotype
///
/// `ref_offset` and `read_offset` locate the first cigar element in
/// `reference` and `read`. An indel inside a tandem repeat of unit length up
/// to the indel length ends up at the leftmost equivalent position. Cigars
/// without an indel, with the indel as first element, or whose indel cannot be
/// placed on the reference are returned unchanged. Cigars with several indels
/// are handled according to `policy`.
pub fn left_align_indel(
    cigar: &Cigar,
    reference: &[u8],
    read: &[u8],
    ref_offset: usize,
    read_offset: usize,
    policy: MultipleIndelPolicy,
) -> Result<Cigar> {
    if ref_offset > reference.len() {
        return Err(CigarError::OffsetOutOfBounds {
            offset: ref_offset,
            length: reference.len(),
        });
    }
    if read_offset > read.len() {
        return Err(CigarError::OffsetOutOfBounds {
            offset: read_offset,
            length: read.len(),
        });
    }

    match cigar.count_indel_elements() {
        0 => return Ok(cigar.clone()),
        1 => {}
        count => {
            return match policy {
                MultipleIndelPolicy::KeepOriginal => {
                    debug!("Not left aligning {}: it has {} indels", cigar, count);
                    Ok(cigar.clone())
                }
                MultipleIndelPolicy::Reject => Err(CigarError::MultipleIndels { count }),
            }
        }
    }

    let indel_index = match cigar.iter().position(|e| e.op.is_indel()) {
        Some(index) if index > 0 => index,
        _ => return Ok(cigar.clone()),
    };
    let indel_len = cigar.elements()[indel_index].len;

    let site = HaplotypeSite {
        reference,
        read,
        ref_offset,
        read_offset,
    };
    let haplotype = match site.haplotype(cigar.elements(), indel_index) {
        Some(haplotype) => haplotype,
        None => return Ok(cigar.clone()),
    };

    let mut accepted = cigar.elements().to_vec();
    let mut candidate = accepted.clone();
    let mut shifted = false;
    let mut failed_attempts = 0;

    let max_iterations = cigar.reference_length() + cigar.read_length();
    for _ in 0..max_iterations {
        if failed_attempts >= indel_len || !shift_indel_left(&mut candidate, indel_index) {
            break;
        }
        let reached_start = candidate[indel_index - 1].len == 0;

        if site.haplotype(&candidate, indel_index).as_deref() == Some(haplotype.as_slice()) {
            trace!(
                "Accepted left shift of {}: {}",
                cigar,
                Cigar::new(candidate.clone())
            );
            accepted.clone_from(&candidate);
            shifted = true;
            failed_attempts = 0;
        } else {
            failed_attempts += 1;
        }

        if reached_start {
            break;
        }
    }

    if !shifted {
        return Ok(cigar.clone());
    }
    Ok(clean_up(accepted))
}

/// Move one base from the run before the indel to the run after it
///
/// The base keeps the operator of the run it came from. Returns false when the
/// preceding run is not an alignment run or is already empty.
fn shift_indel_left(elements: &mut Vec<CigarElement>, indel_index: usize) -> bool {
    let previous = elements[indel_index - 1];
    if previous.len == 0 || !previous.op.is_alignment() {
        return false;
    }

    elements[indel_index - 1].len -= 1;
    match elements.get_mut(indel_index + 1) {
        Some(next) if next.op == previous.op => next.len += 1,
        _ => elements.insert(indel_index + 1, CigarElement::new(1, previous.op)),
    }
    true
}

fn clean_up(elements: Vec<CigarElement>) -> Cigar {
    let mut kept: Vec<CigarElement> = Vec::with_capacity(elements.len());
    for element in elements {
        if element.len == 0 || (kept.is_empty() && element.op == CigarOperator::Deletion) {
            continue;
        }
        kept.push(element);
    }
    Cigar::new(kept).consolidate()
}

struct HaplotypeSite<'a> {
    reference: &'a [u8],
    read: &'a [u8],
    ref_offset: usize,
    read_offset: usize,
}

impl HaplotypeSite<'_> {
    /// Reference with the indel at `indel_index` applied, or None if it does not fit
    fn haplotype(&self, elements: &[CigarElement], indel_index: usize) -> Option<Vec<u8>> {
        use CigarOperator::*;

        let mut ref_index = self.ref_offset;
        let mut read_index = self.read_offset;
        let mut total_ref_bases = 0;
        for element in &elements[..indel_index] {
            match element.op {
                Match | SequenceMatch | SequenceMismatch => {
                    read_index += element.len;
                    ref_index += element.len;
                    total_ref_bases += element.len;
                }
                SoftClip => read_index += element.len,
                Skip => {
                    ref_index += element.len;
                    total_ref_bases += element.len;
                }
                _ => {}
            }
        }

        let indel = elements[indel_index];
        let indel_len = if indel.op == Deletion {
            indel
                .len
                .min(self.reference.len().saturating_sub(total_ref_bases))
        } else {
            indel.len
        };

        let mut haplotype = Vec::with_capacity(self.reference.len() + indel_len);
        haplotype.extend_from_slice(self.reference.get(..ref_index)?);
        if indel.op == Deletion {
            ref_index += indel_len;
        } else {
            haplotype.extend_from_slice(self.read.get(read_index..read_index + indel_len)?);
        }
        haplotype.extend_from_slice(self.reference.get(ref_index..)?);
        Some(haplotype)
    }
}
