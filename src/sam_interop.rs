use noodles::sam;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record_buf::RecordBuf;

use crate::cigar::{Cigar, CigarElement, CigarOperator};
use crate::error::Result;
use crate::read::AlignedRead;

impl From<Kind> for CigarOperator {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Match => Self::Match,
            Kind::Insertion => Self::Insertion,
            Kind::Deletion => Self::Deletion,
            Kind::Skip => Self::Skip,
            Kind::SoftClip => Self::SoftClip,
            Kind::HardClip => Self::HardClip,
            Kind::Pad => Self::Padding,
            Kind::SequenceMatch => Self::SequenceMatch,
            Kind::SequenceMismatch => Self::SequenceMismatch,
        }
    }
}

impl From<CigarOperator> for Kind {
    fn from(op: CigarOperator) -> Self {
        match op {
            CigarOperator::Match => Self::Match,
            CigarOperator::Insertion => Self::Insertion,
            CigarOperator::Deletion => Self::Deletion,
            CigarOperator::Skip => Self::Skip,
            CigarOperator::SoftClip => Self::SoftClip,
            CigarOperator::HardClip => Self::HardClip,
            CigarOperator::Padding => Self::Pad,
            CigarOperator::SequenceMatch => Self::SequenceMatch,
            CigarOperator::SequenceMismatch => Self::SequenceMismatch,
        }
    }
}

impl From<Op> for CigarElement {
    fn from(op: Op) -> Self {
        Self::new(op.len(), op.kind().into())
    }
}

impl From<CigarElement> for Op {
    fn from(element: CigarElement) -> Self {
        Op::new(element.op.into(), element.len)
    }
}

impl From<&sam::alignment::record_buf::Cigar> for Cigar {
    fn from(cigar: &sam::alignment::record_buf::Cigar) -> Self {
        cigar.as_ref().iter().copied().map(CigarElement::from).collect()
    }
}

impl From<&Cigar> for sam::alignment::record_buf::Cigar {
    fn from(cigar: &Cigar) -> Self {
        cigar.iter().copied().map(Op::from).collect::<Vec<_>>().into()
    }
}

/// Build the read view of a SAM record
///
/// The contig name is resolved through `header`; a reference sequence id
/// missing from the header leaves the read without a contig. The alignment
/// start keeps SAM's 1-based coordinate.
pub fn aligned_read_from_record(header: &sam::Header, record: &RecordBuf) -> Result<AlignedRead> {
    let name = record
        .name()
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_default();

    let mut read = AlignedRead::new(
        name,
        record.sequence().as_ref().to_vec(),
        record.quality_scores().as_ref().to_vec(),
        Cigar::from(record.cigar()),
    )?;

    read.contig = record
        .reference_sequence_id()
        .and_then(|id| header.reference_sequences().get_index(id))
        .map(|(name, _)| String::from_utf8_lossy(name).into_owned());
    read.alignment_start = record.alignment_start().map(usize::from);
    read.unmapped = record.flags().is_unmapped();
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cigar::tests::cigar;
    use crate::error::CigarError;
    use noodles::core::Position;
    use noodles::sam::alignment::record::Flags;
    use noodles::sam::alignment::record_buf::{QualityScores, Sequence};
    use noodles::sam::header::record::value::map::ReferenceSequence;
    use noodles::sam::header::record::value::Map;
    use std::num::NonZeroUsize;

    fn test_header() -> sam::Header {
        let ref_seq = Map::<ReferenceSequence>::new(NonZeroUsize::new(1_000).unwrap());
        sam::Header::builder()
            .add_reference_sequence("chr1", ref_seq)
            .build()
    }

    fn test_record(bases: &[u8], c: &str) -> RecordBuf {
        let mut record = RecordBuf::default();
        *record.name_mut() = Some("read1".into());
        *record.sequence_mut() = Sequence::from(bases.to_vec());
        *record.quality_scores_mut() = QualityScores::from(vec![30; bases.len()]);
        *record.cigar_mut() = (&cigar(c)).into();
        *record.flags_mut() = Flags::empty();
        record
    }

    #[test]
    fn test_operator_kind_roundtrip() {
        for op in CigarOperator::ALL {
            let kind = Kind::from(op);
            assert_eq!(CigarOperator::from(kind), op, "Roundtrip of {}", op);
        }
    }

    #[test]
    fn test_cigar_roundtrip() {
        for c in ["*", "10M", "2H3S4M1I2D3=1X5N1P2S"] {
            let original = cigar(c);
            let noodles_cigar = sam::alignment::record_buf::Cigar::from(&original);
            assert_eq!(noodles_cigar.as_ref().len(), original.len());
            assert_eq!(Cigar::from(&noodles_cigar), original, "Roundtrip of {}", c);
        }
    }

    #[test]
    fn test_element_from_op() {
        let element = CigarElement::from(Op::new(Kind::Deletion, 7));
        assert_eq!(element, CigarElement::new(7, CigarOperator::Deletion));
        assert_eq!(Op::from(element), Op::new(Kind::Deletion, 7));
    }

    #[test]
    fn test_aligned_read_from_mapped_record() {
        let header = test_header();
        let mut record = test_record(b"TTACGT", "2S4M");
        *record.reference_sequence_id_mut() = Some(0);
        *record.alignment_start_mut() = Some(Position::try_from(10).unwrap());

        let read = aligned_read_from_record(&header, &record).unwrap();
        assert_eq!(read.name, "read1");
        assert_eq!(read.bases, b"TTACGT");
        assert_eq!(read.quals, vec![30; 6]);
        assert_eq!(read.cigar, cigar("2S4M"));
        assert_eq!(read.contig.as_deref(), Some("chr1"));
        assert_eq!(read.alignment_start, Some(10));
        assert_eq!(read.soft_start(), Some(8));
        assert!(!read.is_unmapped());
    }

    #[test]
    fn test_aligned_read_from_unmapped_record() {
        let header = test_header();
        let mut record = test_record(b"ACGT", "*");
        *record.flags_mut() = Flags::UNMAPPED;

        let read = aligned_read_from_record(&header, &record).unwrap();
        assert!(read.is_unmapped());
        assert!(read.is_genome_loc_unmapped());

        // placed next to its mate but still flagged unmapped
        *record.reference_sequence_id_mut() = Some(0);
        *record.alignment_start_mut() = Some(Position::try_from(5).unwrap());
        let read = aligned_read_from_record(&header, &record).unwrap();
        assert!(read.is_unmapped());
        assert!(!read.is_genome_loc_unmapped());
    }

    #[test]
    fn test_aligned_read_from_record_length_mismatch() {
        let header = test_header();
        let record = test_record(b"ACG", "4M");
        assert_eq!(
            aligned_read_from_record(&header, &record),
            Err(CigarError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
