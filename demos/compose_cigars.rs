use cigar_geometry::{apply_cigar_to_cigar, trim_cigar_by_reference, Cigar};

fn main() {
    // read -> haplotype, then haplotype -> reference
    let read_to_haplotype: Cigar = "3M1I2M".parse().unwrap();
    let haplotype_to_reference: Cigar = "2M1D3M".parse().unwrap();

    let read_to_reference = apply_cigar_to_cigar(&read_to_haplotype, &haplotype_to_reference).unwrap();
    let trimmed = trim_cigar_by_reference(&read_to_reference, 1, 4).unwrap();

    println!("      Read to haplotype: {}", read_to_haplotype);
    println!(" Haplotype to reference: {}", haplotype_to_reference);
    println!("      Read to reference: {}", read_to_reference);
    println!(" Trimmed to ref [1, 4]: {}", trimmed);
}
