use crate::cigar::{Cigar, CigarElement, CigarOperator};
use crate::error::{CigarError, Result};

/// Clip `element`, which starts at axis position `pos`, to the inclusive window [start, end]
///
/// The clipped run is appended to `dest` when it is non-empty. Returns `pos`
/// advanced by the full, unclipped length of `element`, so several walks over
/// the same axis stay in step even when a run lies entirely outside the window.
pub fn add_cigar_elements(
    dest: &mut Vec<CigarElement>,
    pos: usize,
    start: usize,
    end: usize,
    element: CigarElement,
) -> usize {
    let overlap_start = pos.max(start);
    let overlap_end = (pos + element.len).min(end.saturating_add(1));
    if overlap_end > overlap_start {
        dest.push(CigarElement::new(overlap_end - overlap_start, element.op));
    }
    pos + element.len
}

/// Trim a cigar to the reference-relative inclusive interval [start, end]
///
/// Partial runs at either edge are shortened. Insertions and soft clips are
/// kept whole when they sit at or after `start`, and dropped once the walk has
/// passed `end`. The result is consolidated.
pub fn trim_cigar_by_reference(cigar: &Cigar, start: usize, end: usize) -> Result<Cigar> {
    if end < start {
        return Err(CigarError::InvalidInterval { start, end });
    }
    let length = cigar.reference_length();
    if end > length {
        return Err(CigarError::IntervalOutOfRange { end, length });
    }
    trim_cigar(cigar, start, end, true)
}

/// Trim a cigar to the read-relative inclusive interval [start, end]
///
/// Deletions inside or directly after the kept read span are retained whole
/// since they have no read length to clip.
pub fn trim_cigar_by_bases(cigar: &Cigar, start: usize, end: usize) -> Result<Cigar> {
    if end < start {
        return Err(CigarError::InvalidInterval { start, end });
    }
    let length = cigar.read_length();
    if end > length {
        return Err(CigarError::IntervalOutOfRange { end, length });
    }
    trim_cigar(cigar, start, end, false)
}

fn trim_cigar(cigar: &Cigar, start: usize, end: usize, by_reference: bool) -> Result<Cigar> {
    use CigarOperator::*;

    let mut elements = Vec::with_capacity(cigar.len());
    let mut pos = 0;
    for element in cigar {
        let zero_width = if by_reference {
            matches!(element.op, Insertion | SoftClip)
        } else {
            matches!(element.op, Deletion | Skip)
        };

        if pos > end && (by_reference || !zero_width) {
            break;
        }

        match element.op {
            HardClip | Padding => {
                return Err(CigarError::UnsupportedOperator {
                    op: element.op,
                    context: "cigar trimming",
                })
            }
            _ if zero_width => {
                if pos >= start {
                    elements.push(*element);
                }
            }
            _ => pos = add_cigar_elements(&mut elements, pos, start, end, *element),
        }
    }

    Ok(Cigar::new(elements).consolidate())
}

/// One step of the lock-step walk in `apply_cigar_to_cigar`
///
/// Holds the operator emitted for the first -> third alignment (if any) and how
/// far each input advances.
struct PairTransform {
    op13: Option<CigarOperator>,
    advance12: usize,
    advance23: usize,
}

impl PairTransform {
    const fn new(op13: Option<CigarOperator>, advance12: usize, advance23: usize) -> Self {
        Self {
            op13,
            advance12,
            advance23,
        }
    }

    fn between(op12: CigarOperator, op23: CigarOperator) -> Result<Self> {
        use CigarOperator::*;

        let transform = match (op12, op23) {
            // 3: xxx B yyy
            // 2: xxx M yyy
            // 1: xxx M yyy
            (a, b) if a.is_alignment() && b.is_alignment() => Self::new(Some(Match), 1, 1),
            (a, Insertion) if a.is_alignment() => Self::new(Some(Insertion), 1, 1),
            (a, Deletion) if a.is_alignment() => Self::new(Some(Deletion), 0, 1),

            // 3: xxx D M yyy
            // 2: xxx   M yyy
            // 1: xxx   D yyy
            (Deletion, b) if b.is_alignment() => Self::new(Some(Deletion), 1, 1),
            // the base inserted in 2 was deleted again from 1; nothing to emit
            (Deletion, Insertion) => Self::new(None, 1, 1),
            (Deletion, Deletion) => Self::new(Some(Deletion), 0, 1),

            // an extra base in 1 is absent from 2 and so from 3
            (Insertion, b) if b.is_alignment() || b.is_indel() => Self::new(Some(Insertion), 1, 0),

            (a, b) => {
                let op = if a.is_alignment() || a.is_indel() { b } else { a };
                return Err(CigarError::UnsupportedOperator {
                    op,
                    context: "cigar composition",
                });
            }
        };
        Ok(transform)
    }
}

/// Compose two alignments that share an intermediate coordinate system
///
/// Given `first_to_second` (e.g. read -> haplotype) and `second_to_third`
/// (e.g. haplotype -> reference), returns the first -> third alignment.
/// Both inputs are walked one base at a time along the shared axis. An
/// insertion in either input that the other treats as matched passes through
/// unchanged. Once either input is exhausted, trailing insertions of
/// `first_to_second` and trailing deletions of `second_to_third` are carried
/// over, since neither consumes the shared axis.
pub fn apply_cigar_to_cigar(first_to_second: &Cigar, second_to_third: &Cigar) -> Result<Cigar> {
    let first = first_to_second.consolidate();
    let second = second_to_third.consolidate();
    let (elements12, elements23) = (first.elements(), second.elements());

    let mut elements = Vec::new();
    let (mut index12, mut index23) = (0, 0);
    let (mut offset12, mut offset23) = (0, 0);

    while index12 < elements12.len() && index23 < elements23.len() {
        let element12 = elements12[index12];
        let element23 = elements23[index23];

        let transform = PairTransform::between(element12.op, element23.op)?;
        if let Some(op) = transform.op13 {
            push_merged(&mut elements, CigarElement::new(1, op));
        }

        offset12 += transform.advance12;
        offset23 += transform.advance23;

        // move on once the current element is exhausted
        if offset12 == element12.len {
            index12 += 1;
            offset12 = 0;
        }
        if offset23 == element23.len {
            index23 += 1;
            offset23 = 0;
        }
    }

    let trailing_insertions = elements12[index12..]
        .iter()
        .take_while(|e| e.op == CigarOperator::Insertion);
    let trailing_deletions = elements23[index23..]
        .iter()
        .take_while(|e| e.op == CigarOperator::Deletion);
    for (i, element) in trailing_insertions.enumerate() {
        let consumed = if i == 0 { offset12 } else { 0 };
        push_merged(&mut elements, CigarElement::new(element.len - consumed, element.op));
    }
    for (i, element) in trailing_deletions.enumerate() {
        let consumed = if i == 0 { offset23 } else { 0 };
        push_merged(&mut elements, CigarElement::new(element.len - consumed, element.op));
    }

    Ok(Cigar::new(elements))
}

fn push_merged(elements: &mut Vec<CigarElement>, element: CigarElement) {
    match elements.last_mut() {
        Some(last) if last.op == element.op => last.len += element.len,
        _ => elements.push(element),
    }
}
