//! Deterministic content addressing.
//!
//! Block and document identifiers are 53-bit hashes rendered as 14 lowercase
//! hex digits. The bit mixing must stay exactly as written: stored identifiers
//! are compared across runs and across implementations.

const SEED_1: u32 = 0xdead_beef;
const SEED_2: u32 = 0x41c6_ce57;

const MIX_1: u32 = 2_654_435_761;
const MIX_2: u32 = 1_597_334_677;
const AVALANCHE_1: u32 = 2_246_822_507;
const AVALANCHE_2: u32 = 3_266_489_909;

/// Low 21 bits of the second accumulator form the high part of the result.
const HIGH_MASK: u32 = 0x001f_ffff;

/// Hash a string to a 53-bit unsigned integer.
///
/// Characters are fed as UTF-16 code units so that identifiers match those
/// produced by JavaScript hosts for the same text.
pub fn hash(s: &str) -> u64 {
    let mut h1 = SEED_1;
    let mut h2 = SEED_2;

    for unit in s.encode_utf16() {
        let c = u32::from(unit);
        h1 = (h1 ^ c).wrapping_mul(MIX_1);
        h2 = (h2 ^ c).wrapping_mul(MIX_2);
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(AVALANCHE_1);
    h1 ^= (h2 ^ (h2 >> 13)).wrapping_mul(AVALANCHE_2);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(AVALANCHE_1);
    h2 ^= (h1 ^ (h1 >> 13)).wrapping_mul(AVALANCHE_2);

    (u64::from(h2 & HIGH_MASK) << 32) | u64::from(h1)
}

/// Hash a string and format it as a 14-character lowercase hex id.
pub fn hash_hex(s: &str) -> String {
    format!("{:014x}", hash(s))
}

/// Identifier of a block: hash of the raw line followed by its line index.
pub fn block_id(raw_source: &str, line_number: usize) -> String {
    hash_hex(&format!("{}{}", raw_source, line_number))
}

/// Identifier of a document: hash of all block ids concatenated in order.
pub fn document_id<'a, I>(block_ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined: String = block_ids.into_iter().collect();
    hash_hex(&joined)
}
