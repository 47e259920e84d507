use cigar_geometry::{left_align_indel, Cigar, MultipleIndelPolicy};

fn main() {
    // A 2 bp deletion placed at the right end of an AT repeat
    let reference = b"GGGATATATATCCC";
    let read = b"GGGATATATCCC";
    let cigar: Cigar = "9M2D3M".parse().unwrap();

    let aligned = left_align_indel(
        &cigar,
        reference,
        read,
        0,
        0,
        MultipleIndelPolicy::KeepOriginal,
    )
    .unwrap();

    println!("Reference: {}", String::from_utf8_lossy(reference));
    println!("     Read: {}", String::from_utf8_lossy(read));
    println!("   Before: {}", cigar);
    println!("    After: {}", aligned);
}
