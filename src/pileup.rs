use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::error::{CigarError, Result};
use crate::geometry::get_read_coordinate_for_reference_coordinate;
use crate::read::AlignedRead;

/// An allele, identified by name and bases
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Allele {
    name: String,
    bases: Vec<u8>,
}

impl Allele {
    pub fn new(name: impl Into<String>, bases: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bases: bases.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, String::from_utf8_lossy(&self.bases))
    }
}

/// Each read paired with the allele it supports best
///
/// Reads are identified by their index in insertion order. Lookups go both
/// ways: read -> best allele, and allele -> reads.
#[derive(Debug, Clone, Default)]
pub struct ReadAlleleAssignments {
    reads: Vec<(AlignedRead, Allele)>,
    by_allele: BTreeMap<Allele, Vec<usize>>,
}

impl ReadAlleleAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `best_allele` as the best allele for `read`, returning the read's index
    pub fn assign(&mut self, read: AlignedRead, best_allele: Allele) -> usize {
        let index = self.reads.len();
        self.by_allele
            .entry(best_allele.clone())
            .or_default()
            .push(index);
        self.reads.push((read, best_allele));
        index
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn read(&self, index: usize) -> Option<&AlignedRead> {
        self.reads.get(index).map(|(read, _)| read)
    }

    pub fn best_allele(&self, index: usize) -> Option<&Allele> {
        self.reads.get(index).map(|(_, allele)| allele)
    }

    /// Reads whose best allele is `allele`, in insertion order
    pub fn reads_for<'a>(&'a self, allele: &Allele) -> impl Iterator<Item = &'a AlignedRead> + 'a {
        self.by_allele
            .get(allele)
            .into_iter()
            .flatten()
            .map(move |&index| &self.reads[index].0)
    }

    /// Every allele with at least one read
    pub fn alleles(&self) -> impl Iterator<Item = &Allele> {
        self.by_allele.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AlignedRead, &Allele)> {
        self.reads.iter().map(|(read, allele)| (read, allele))
    }
}

impl FromIterator<(AlignedRead, Allele)> for ReadAlleleAssignments {
    fn from_iter<T: IntoIterator<Item = (AlignedRead, Allele)>>(iter: T) -> Self {
        let mut assignments = Self::new();
        for (read, allele) in iter {
            assignments.assign(read, allele);
        }
        assignments
    }
}

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Count A, C, G and T (in that order) at reference `position` over the reads assigned to `alleles`
///
/// Every requested allele must have reads, and every read must be assigned
/// to one of the requested alleles. Reads that are unplaced, that do not reach
/// `position`, or that have a deletion there do not contribute.
pub fn count_bases_at_pileup_position(
    assignments: &ReadAlleleAssignments,
    alleles: &[Allele],
    position: usize,
) -> Result<[usize; 4]> {
    for allele in alleles {
        if assignments.reads_for(allele).next().is_none() {
            return Err(CigarError::InvalidState(format!(
                "Allele {} has no reads assigned to it",
                allele
            )));
        }
    }

    let mut counts = [0; 4];
    for (read, allele) in assignments.iter() {
        if !alleles.contains(allele) {
            return Err(CigarError::InvalidState(format!(
                "Read {} is assigned to allele {}, which is not among the requested alleles",
                read.name, allele
            )));
        }

        let offset = read
            .soft_start()
            .and_then(|start| get_read_coordinate_for_reference_coordinate(start, &read.cigar, position));
        if let Some(index) = offset
            .and_then(|offset| read.bases.get(offset))
            .and_then(|&base| base_index(base))
        {
            counts[index] += 1;
        }
    }

    trace!("Base counts at {}: {:?}", position, counts);
    Ok(counts)
}
