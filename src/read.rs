use crate::cigar::{Cigar, CigarOperator};
use crate::error::{CigarError, Result};

/// An aligned (or unaligned) read
///
/// `alignment_start` is the reference position of the first
/// reference-consuming base. Base qualities may be empty when the record
/// carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRead {
    pub name: String,
    pub bases: Vec<u8>,
    pub quals: Vec<u8>,
    pub cigar: Cigar,
    pub contig: Option<String>,
    pub alignment_start: Option<usize>,
    pub unmapped: bool,
}

impl AlignedRead {
    /// Build an unplaced read, checking that bases, qualities and cigar agree in length
    ///
    /// An empty cigar is accepted for any number of bases.
    pub fn new(
        name: impl Into<String>,
        bases: Vec<u8>,
        quals: Vec<u8>,
        cigar: Cigar,
    ) -> Result<Self> {
        if !cigar.is_empty() && cigar.read_length() != bases.len() {
            return Err(CigarError::LengthMismatch {
                expected: cigar.read_length(),
                actual: bases.len(),
            });
        }
        if !quals.is_empty() && quals.len() != bases.len() {
            return Err(CigarError::LengthMismatch {
                expected: bases.len(),
                actual: quals.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            bases,
            quals,
            cigar,
            contig: None,
            alignment_start: None,
            unmapped: false,
        })
    }

    /// Place the read on `contig` with its first aligned base at `alignment_start`
    pub fn with_position(mut self, contig: impl Into<String>, alignment_start: usize) -> Self {
        self.contig = Some(contig.into());
        self.alignment_start = Some(alignment_start);
        self
    }

    pub fn with_unmapped_flag(mut self, unmapped: bool) -> Self {
        self.unmapped = unmapped;
        self
    }

    pub fn read_length(&self) -> usize {
        self.bases.len()
    }

    /// Alignment start moved back over any leading soft clip
    pub fn soft_start(&self) -> Option<usize> {
        let start = self.alignment_start?;
        let clipped: usize = self
            .cigar
            .iter()
            .take_while(|e| e.op.is_clip())
            .filter(|e| e.op == CigarOperator::SoftClip)
            .map(|e| e.len)
            .sum();
        Some(start.saturating_sub(clipped))
    }

    /// The read is unmapped if flagged so or if it has no contig or no start
    pub fn is_unmapped(&self) -> bool {
        self.unmapped || self.contig.is_none() || self.alignment_start.is_none()
    }

    /// The read sorts with the unplaced reads: it has no contig at all
    ///
    /// A read flagged unmapped but still carrying a contig (as mates of mapped
    /// reads do) is not genome-loc unmapped.
    pub fn is_genome_loc_unmapped(&self) -> bool {
        self.contig.is_none()
    }

    pub fn num_aligned_bases_counting_soft_clips(&self) -> usize {
        self.cigar.num_aligned_bases_counting_soft_clips()
    }

    pub fn num_hard_clipped_bases(&self) -> usize {
        self.cigar.num_hard_clipped_bases()
    }

    pub fn num_alignment_blocks(&self) -> usize {
        self.cigar.num_alignment_blocks()
    }

    /// Number of soft-clipped bases with quality strictly above `threshold`
    pub fn calc_num_high_quality_soft_clips(&self, threshold: u8) -> usize {
        use CigarOperator::*;

        let mut count = 0;
        let mut align_pos = 0;
        for element in &self.cigar {
            match element.op {
                SoftClip => {
                    count += (align_pos..align_pos + element.len)
                        .filter(|&i| self.quals.get(i).is_some_and(|&q| q > threshold))
                        .count();
                    align_pos += element.len;
                }
                Match | Insertion | SequenceMatch | SequenceMismatch => align_pos += element.len,
                Deletion | Skip | HardClip | Padding => {}
            }
        }
        count
    }
}

/// Mismatches found by `get_mismatch_count`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MismatchCount {
    pub num_mismatches: usize,
    /// Sum of the base qualities at mismatching positions
    pub mismatch_qualities: u64,
    /// Read offset of the first mismatch
    pub first_mismatch: Option<usize>,
}

impl MismatchCount {
    fn record(&mut self, read_index: usize, qual: u8) {
        self.num_mismatches += 1;
        self.mismatch_qualities += u64::from(qual);
        self.first_mismatch.get_or_insert(read_index);
    }
}

/// Count mismatches of `read` against `reference` over the read window
/// [start_on_read, start_on_read + bases_to_read)
///
/// `ref_index` is the reference offset of the read's first aligned base.
/// `X` runs count as mismatches without looking at the bases and `=` runs
/// never do. Positions beyond the end of `reference` are skipped.
pub fn get_mismatch_count(
    read: &AlignedRead,
    reference: &[u8],
    ref_index: usize,
    start_on_read: usize,
    bases_to_read: usize,
) -> Result<MismatchCount> {
    use CigarOperator::*;

    let mut mismatches = MismatchCount::default();
    if bases_to_read == 0 {
        return Ok(mismatches);
    }
    let end_on_read = start_on_read.saturating_add(bases_to_read) - 1;

    let mut ref_index = ref_index;
    let mut read_index = 0;
    for element in &read.cigar {
        if read_index > end_on_read {
            break;
        }

        let len = element.len;
        match element.op {
            Match | SequenceMismatch => {
                for _ in 0..len {
                    if read_index > end_on_read {
                        break;
                    }
                    if read_index >= start_on_read && ref_index < reference.len() {
                        let read_base = *read.bases.get(read_index).ok_or(
                            CigarError::OffsetOutOfBounds {
                                offset: read_index,
                                length: read.bases.len(),
                            },
                        )?;
                        if element.op == SequenceMismatch || read_base != reference[ref_index] {
                            let qual = read.quals.get(read_index).copied().unwrap_or(0);
                            mismatches.record(read_index, qual);
                        }
                    }
                    ref_index += 1;
                    read_index += 1;
                }
            }
            SequenceMatch => {
                ref_index += len;
                read_index += len;
            }
            Insertion | SoftClip => read_index += len,
            Deletion | Skip => ref_index += len,
            HardClip | Padding => {}
        }
    }

    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cigar::tests::{build_test_cigar, cigar};

    fn read(bases: &[u8], quals: &[u8], c: &str) -> AlignedRead {
        AlignedRead::new("myRead", bases.to_vec(), quals.to_vec(), cigar(c)).unwrap()
    }

    #[test]
    fn test_new_checks_lengths() {
        assert_eq!(
            AlignedRead::new("r", b"ACG".to_vec(), vec![], cigar("4M")),
            Err(CigarError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            AlignedRead::new("r", b"ACGT".to_vec(), vec![30; 3], cigar("4M")),
            Err(CigarError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert!(AlignedRead::new("r", b"ACGT".to_vec(), vec![], Cigar::default()).is_ok());
        assert!(AlignedRead::new("r", b"ACGT".to_vec(), vec![30; 4], cigar("2H1S3M")).is_ok());
    }

    #[test]
    fn test_mapped_state() {
        let base = AlignedRead::new("r", b"ACGT".to_vec(), vec![], cigar("4M")).unwrap();

        let no_reference = base.clone();
        let mapped = base.clone().with_position("chr1", 1);
        let unmapped_flag = base.clone().with_position("chr1", 1).with_unmapped_flag(true);
        let unknown_contig = base.clone().with_position("unknownContig", 1);
        let mut unknown_start = base.clone().with_position("chr1", 1);
        unknown_start.alignment_start = None;

        let test_cases = [
            (&no_reference, true, true),
            (&mapped, false, false),
            (&unmapped_flag, false, true),
            (&unknown_contig, false, false),
            (&unknown_start, false, true),
        ];
        for (i, (r, genome_loc_unmapped, unmapped)) in test_cases.iter().enumerate() {
            assert_eq!(
                r.is_genome_loc_unmapped(),
                *genome_loc_unmapped,
                "Test case {}: genome loc unmapped",
                i
            );
            assert_eq!(r.is_unmapped(), *unmapped, "Test case {}: unmapped", i);
        }
    }

    #[test]
    fn test_soft_start() {
        let test_cases = [
            ("4M", Some(10), Some(10)),
            ("2S2M", Some(10), Some(8)),
            ("3H2S2M", Some(10), Some(8)),
            ("2M2S", Some(10), Some(10)),
            ("2S2M", Some(1), Some(0)),
            ("4M", None, None),
        ];
        for (i, (c, start, expected)) in test_cases.iter().enumerate() {
            let mut r = read(b"ACGT", &[], c);
            r.alignment_start = *start;
            assert_eq!(r.soft_start(), *expected, "Test case {}: {}", i, c);
        }
    }

    #[test]
    fn test_calc_num_high_quality_soft_clips() {
        let qual_array = |length: usize, threshold: u8| -> Vec<u8> {
            (0..length)
                .map(|i| if i % 2 == 0 { threshold + 1 } else { threshold - 1 })
                .collect()
        };

        for left_clip in [0, 1, 10] {
            for right_clip in [0, 1, 10] {
                for threshold in [10u8, 20, 30] {
                    for middle_op in ["M", "D"] {
                        for match_size in [0, 1, 10] {
                            let left = qual_array(left_clip, threshold);
                            let right = qual_array(right_clip, threshold);
                            let expected = left
                                .iter()
                                .chain(&right)
                                .filter(|&&q| q > threshold)
                                .count();

                            let middle = if middle_op == "D" { 0 } else { match_size };
                            let read_length = left_clip + middle + right_clip;
                            let mut quals = left.clone();
                            quals.extend(std::iter::repeat(30).take(middle));
                            quals.extend(&right);

                            let mut c = String::new();
                            if left_clip > 0 {
                                c.push_str(&format!("{}S", left_clip));
                            }
                            if match_size > 0 {
                                c.push_str(&format!("{}{}", match_size, middle_op));
                            }
                            if right_clip > 0 {
                                c.push_str(&format!("{}S", right_clip));
                            }

                            let r = read(&vec![b'A'; read_length], &quals, &c);
                            assert_eq!(
                                r.calc_num_high_quality_soft_clips(threshold),
                                expected,
                                "Soft clips of {} above {}",
                                c,
                                threshold
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_structural_counters_on_read() {
        let r = read(&[b'A'; 10], &[], "2H3S2M1D2=1X2S4H");
        assert_eq!(r.num_aligned_bases_counting_soft_clips(), 10);
        assert_eq!(r.num_hard_clipped_bases(), 6);
        assert_eq!(r.num_alignment_blocks(), 3);
    }

    #[test]
    fn test_get_mismatch_count() {
        let read_length = 20;
        let indel_length = 2;
        let location_on_reference = 10;
        let reference = vec![b'A'; 100];
        let quals = vec![b'A'; read_length];

        for start_on_read in 0..=read_length {
            for bases_to_read in 0..=read_length {
                for soft_clip in [0, 1, 10] {
                    for first_m in [0, 3] {
                        for middle_op in ['M', 'D', 'I'] {
                            for mismatch_location in [None, Some(0), Some(5), Some(10), Some(15), Some(19)] {
                                let mut bases = vec![b'A'; read_length];
                                if let Some(at) = mismatch_location {
                                    bases[at] = b'C';
                                }
                                let c = build_test_cigar(
                                    middle_op,
                                    soft_clip,
                                    first_m,
                                    indel_length,
                                    read_length,
                                );
                                let r = AlignedRead::new("myRead", bases, quals.clone(), c)
                                    .unwrap()
                                    .with_position("chr1", location_on_reference);

                                let is_mismatch = match mismatch_location {
                                    None => false,
                                    Some(at)
                                        if at < start_on_read
                                            || at >= start_on_read + bases_to_read
                                            || at < soft_clip =>
                                    {
                                        false
                                    }
                                    Some(at) => {
                                        middle_op == 'M'
                                            || middle_op == 'D'
                                            || at < soft_clip + first_m
                                            || at >= soft_clip + first_m + indel_length
                                    }
                                };

                                let actual = get_mismatch_count(
                                    &r,
                                    &reference,
                                    location_on_reference,
                                    start_on_read,
                                    bases_to_read,
                                )
                                .unwrap();
                                let expected = MismatchCount {
                                    num_mismatches: usize::from(is_mismatch),
                                    mismatch_qualities: if is_mismatch { u64::from(b'A') } else { 0 },
                                    first_mismatch: if is_mismatch { mismatch_location } else { None },
                                };
                                assert_eq!(
                                    actual, expected,
                                    "Mismatches of {} over [{}, {})",
                                    r.cigar,
                                    start_on_read,
                                    start_on_read + bases_to_read
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_get_mismatch_count_soft_clipped_both_ends() {
        let reference = vec![b'A'; 100];
        let r = read(&[b'A'; 20], &[b'A'; 20], "10S5M5S").with_position("chr1", 10);
        let actual = get_mismatch_count(&r, &reference, 10, 10, r.read_length()).unwrap();
        assert_eq!(actual, MismatchCount::default());
    }

    #[test]
    fn test_get_mismatch_count_unbounded_window() {
        let reference = b"ACGTACGTAC";
        let r = read(b"TTGT", &[], "4M");
        let actual = get_mismatch_count(&r, reference, 0, 1, usize::MAX).unwrap();
        assert_eq!(actual.num_mismatches, 1);
        assert_eq!(actual.first_mismatch, Some(1));
    }

    #[test]
    fn test_get_mismatch_count_operators() {
        let reference = b"ACGTACGTAC";
        let test_cases = [
            // X counts without comparing bases
            ("ACGT", "2M2X", 0, 4, 2, Some(2)),
            // = never counts
            ("TTTT", "4=", 0, 4, 0, None),
            ("TTGT", "4M", 0, 4, 2, Some(0)),
            ("TTGT", "4M", 1, 3, 1, Some(1)),
            // past the end of the reference
            ("GTACT", "5M", 0, 5, 0, None),
        ];
        for (i, (bases, c, start, count, expected, first)) in test_cases.iter().enumerate() {
            let r = read(bases.as_bytes(), &[], c);
            let ref_index = if bases.len() == 5 { 6 } else { 0 };
            let actual = get_mismatch_count(&r, reference, ref_index, *start, *count).unwrap();
            assert_eq!(
                (actual.num_mismatches, actual.first_mismatch),
                (*expected, *first),
                "Test case {}: {} {}",
                i,
                bases,
                c
            );
        }
    }
}
