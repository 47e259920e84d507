//! Alignment geometry over CIGAR strings
//!
//! Pure functions for reasoning about how a read lines up against a
//! reference: cigar normalization, trimming and composition, indel
//! left-alignment, and read/reference coordinate queries.
//!
//! ```
//! use cigar_geometry::{apply_cigar_to_cigar, Cigar};
//!
//! let read_to_haplotype: Cigar = "3M".parse().unwrap();
//! let haplotype_to_reference: Cigar = "2M3D1M".parse().unwrap();
//! let read_to_reference = apply_cigar_to_cigar(&read_to_haplotype, &haplotype_to_reference).unwrap();
//! assert_eq!(read_to_reference.to_string(), "2M3D1M");
//! ```

pub mod algebra;
pub mod cigar;
pub mod error;
pub mod geometry;
pub mod left_align;
pub mod pileup;
pub mod read;
#[cfg(feature = "noodles")]
pub mod sam_interop;

pub use algebra::{
    add_cigar_elements, apply_cigar_to_cigar, trim_cigar_by_bases, trim_cigar_by_reference,
};
pub use cigar::{Cigar, CigarElement, CigarOperator};
pub use error::{CigarError, Result};
pub use geometry::{
    calc_alignment_byte_array_offset, calc_first_base_matching_reference_in_cigar,
    calc_num_different_bases, get_bases_covering_ref_interval,
    get_read_coordinate_for_reference_coordinate, is_inside_deletion,
    read_to_alignment_byte_array, A_FOLLOWED_BY_INSERTION_BASE, C_FOLLOWED_BY_INSERTION_BASE,
    DELETION_BASE, G_FOLLOWED_BY_INSERTION_BASE, T_FOLLOWED_BY_INSERTION_BASE,
};
pub use left_align::{left_align_indel, MultipleIndelPolicy};
pub use pileup::{count_bases_at_pileup_position, Allele, ReadAlleleAssignments};
pub use read::{get_mismatch_count, AlignedRead, MismatchCount};
#[cfg(feature = "noodles")]
pub use sam_interop::aligned_read_from_record;
