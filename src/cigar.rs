use std::fmt;
use std::str::FromStr;

use crate::error::{CigarError, Result};

/// CIGAR operator
///
/// Closed set of the nine SAM operators. Membership in the read-consuming,
/// reference-consuming and clipping classes is answered by the `const fn`
/// predicates below rather than re-derived at each call site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CigarOperator {
    /// M: alignment match (can be a sequence match or mismatch)
    Match,
    /// I: insertion to the reference
    Insertion,
    /// D: deletion from the reference
    Deletion,
    /// N: skipped region from the reference
    Skip,
    /// S: soft clip (bases present in the read)
    SoftClip,
    /// H: hard clip (bases absent from the read)
    HardClip,
    /// P: padding (silent deletion from padded reference)
    Padding,
    /// =: sequence match
    SequenceMatch,
    /// X: sequence mismatch
    SequenceMismatch,
}

impl CigarOperator {
    /// All operators in BAM op-code order
    pub const ALL: [CigarOperator; 9] = [
        Self::Match,
        Self::Insertion,
        Self::Deletion,
        Self::Skip,
        Self::SoftClip,
        Self::HardClip,
        Self::Padding,
        Self::SequenceMatch,
        Self::SequenceMismatch,
    ];

    /// Convert to the BAM op code
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Match => 0,
            Self::Insertion => 1,
            Self::Deletion => 2,
            Self::Skip => 3,
            Self::SoftClip => 4,
            Self::HardClip => 5,
            Self::Padding => 6,
            Self::SequenceMatch => 7,
            Self::SequenceMismatch => 8,
        }
    }

    /// Parse from a BAM op code
    pub fn from_u8(code: u8) -> std::result::Result<Self, String> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| format!("Invalid CIGAR op code: {}", code))
    }

    /// Single-character SAM representation
    pub const fn to_char(self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::Skip => 'N',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Padding => 'P',
            Self::SequenceMatch => '=',
            Self::SequenceMismatch => 'X',
        }
    }

    /// Parse from the single-character SAM representation
    pub fn from_char(c: char) -> std::result::Result<Self, String> {
        match c {
            'M' => Ok(Self::Match),
            'I' => Ok(Self::Insertion),
            'D' => Ok(Self::Deletion),
            'N' => Ok(Self::Skip),
            'S' => Ok(Self::SoftClip),
            'H' => Ok(Self::HardClip),
            'P' => Ok(Self::Padding),
            '=' => Ok(Self::SequenceMatch),
            'X' => Ok(Self::SequenceMismatch),
            _ => Err(format!(
                "Invalid CIGAR operator '{}'. Expected one of M, I, D, N, S, H, P, =, X",
                c
            )),
        }
    }

    /// Whether the operator consumes read bases (M, I, S, =, X)
    pub const fn consumes_read(self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Insertion
                | Self::SoftClip
                | Self::SequenceMatch
                | Self::SequenceMismatch
        )
    }

    /// Whether the operator consumes reference bases (M, D, N, =, X)
    pub const fn consumes_reference(self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Deletion
                | Self::Skip
                | Self::SequenceMatch
                | Self::SequenceMismatch
        )
    }

    /// Soft or hard clip
    pub const fn is_clip(self) -> bool {
        matches!(self, Self::SoftClip | Self::HardClip)
    }

    /// Alignment block operator (M, =, X): consumes both read and reference
    pub const fn is_alignment(self) -> bool {
        matches!(
            self,
            Self::Match | Self::SequenceMatch | Self::SequenceMismatch
        )
    }

    /// Insertion or deletion
    pub const fn is_indel(self) -> bool {
        matches!(self, Self::Insertion | Self::Deletion)
    }
}

impl fmt::Display for CigarOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A single run of a CIGAR operator
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CigarElement {
    pub len: usize,
    pub op: CigarOperator,
}

impl CigarElement {
    pub const fn new(len: usize, op: CigarOperator) -> Self {
        Self { len, op }
    }

    /// Number of read bases covered by this element
    pub const fn length_on_read(&self) -> usize {
        if self.op.consumes_read() {
            self.len
        } else {
            0
        }
    }

    /// Number of reference bases covered by this element
    pub const fn length_on_reference(&self) -> usize {
        if self.op.consumes_reference() {
            self.len
        } else {
            0
        }
    }
}

impl fmt::Display for CigarElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.op)
    }
}

/// An ordered sequence of CIGAR elements
///
/// Equality is element-wise: `1M1M` and `2M` are different cigars until
/// consolidated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cigar(Vec<CigarElement>);

impl Cigar {
    pub fn new(elements: Vec<CigarElement>) -> Self {
        Self(elements)
    }

    pub fn elements(&self) -> &[CigarElement] {
        &self.0
    }

    pub fn into_elements(self) -> Vec<CigarElement> {
        self.0
    }

    /// Number of elements (not bases)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CigarElement> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&CigarElement> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&CigarElement> {
        self.0.last()
    }

    /// Number of read bases described by the cigar (M, I, S, =, X)
    pub fn read_length(&self) -> usize {
        self.0.iter().map(CigarElement::length_on_read).sum()
    }

    /// Number of reference bases spanned by the cigar (M, D, N, =, X)
    pub fn reference_length(&self) -> usize {
        self.0.iter().map(CigarElement::length_on_reference).sum()
    }

    /// Whether `consolidate` would change this cigar
    pub fn needs_consolidation(&self) -> bool {
        self.has_zero_length_element() || self.0.windows(2).any(|w| w[0].op == w[1].op)
    }

    /// Merge adjacent elements sharing an operator and drop zero-length elements
    ///
    /// Idempotent: consolidating a consolidated cigar returns it unchanged.
    pub fn consolidate(&self) -> Cigar {
        if !self.needs_consolidation() {
            return self.clone();
        }

        let mut elements: Vec<CigarElement> = Vec::with_capacity(self.0.len());
        for element in self.0.iter().filter(|e| e.len > 0) {
            match elements.last_mut() {
                Some(last) if last.op == element.op => last.len += element.len,
                _ => elements.push(*element),
            }
        }
        Cigar(elements)
    }

    pub fn has_zero_length_element(&self) -> bool {
        self.0.iter().any(|e| e.len == 0)
    }

    /// Number of I and D elements
    pub fn count_indel_elements(&self) -> usize {
        self.0.iter().filter(|e| e.op.is_indel()).count()
    }

    /// True when the first or last element is an insertion or deletion
    ///
    /// Such alignments are geometrically invalid at their edges.
    pub fn starts_or_ends_with_insertion_or_deletion(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => first.op.is_indel() || last.op.is_indel(),
            _ => false,
        }
    }

    /// Drop a trailing deletion, if present
    pub fn remove_trailing_deletions(&self) -> Cigar {
        match self.0.split_last() {
            Some((last, rest)) if last.op == CigarOperator::Deletion => Cigar(rest.to_vec()),
            _ => self.clone(),
        }
    }

    /// Bases aligned to the genome, counting soft clips (M, =, X, S)
    pub fn num_aligned_bases_counting_soft_clips(&self) -> usize {
        self.0
            .iter()
            .filter(|e| e.op.is_alignment() || e.op == CigarOperator::SoftClip)
            .map(|e| e.len)
            .sum()
    }

    pub fn num_hard_clipped_bases(&self) -> usize {
        self.0
            .iter()
            .filter(|e| e.op == CigarOperator::HardClip)
            .map(|e| e.len)
            .sum()
    }

    /// Number of alignment blocks (M, =, X elements) after consolidation
    pub fn num_alignment_blocks(&self) -> usize {
        self.consolidate()
            .iter()
            .filter(|e| e.op.is_alignment())
            .count()
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        for element in &self.0 {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

impl FromStr for Cigar {
    type Err = CigarError;

    /// Parse a SAM textual cigar; `*` and the empty string are the empty cigar
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "*" {
            return Ok(Cigar::default());
        }

        let parse_error = |reason: String| CigarError::Parse {
            cigar: s.to_string(),
            reason,
        };

        let mut elements = Vec::new();
        let mut num: Option<usize> = None;
        for ch in s.chars() {
            if let Some(digit) = ch.to_digit(10) {
                let value = num
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit as usize))
                    .ok_or_else(|| parse_error("element length overflows".to_string()))?;
                num = Some(value);
            } else {
                let op = CigarOperator::from_char(ch).map_err(parse_error)?;
                let len = num
                    .take()
                    .ok_or_else(|| parse_error(format!("operator '{}' has no length", ch)))?;
                elements.push(CigarElement::new(len, op));
            }
        }
        if num.is_some() {
            return Err(parse_error("trailing length without operator".to_string()));
        }
        Ok(Cigar(elements))
    }
}

impl From<Vec<CigarElement>> for Cigar {
    fn from(elements: Vec<CigarElement>) -> Self {
        Self(elements)
    }
}

impl FromIterator<CigarElement> for Cigar {
    fn from_iter<T: IntoIterator<Item = CigarElement>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Cigar {
    type Item = &'a CigarElement;
    type IntoIter = std::slice::Iter<'a, CigarElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl AsRef<[CigarElement]> for Cigar {
    fn as_ref(&self) -> &[CigarElement] {
        &self.0
    }
}
