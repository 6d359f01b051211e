// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::insn::Instr;

const M: u64 = 0x880355f21e6d1965;

/// Compression function for the Merkle-Damgard construction.
fn mix(mut h: u64) -> u64 {
    h ^= h >> 23;
    h = h.wrapping_mul(0x2127598bf4325c37);
    h ^ (h >> 47)
}

/// The 64-bit fasthash over a byte buffer.  The buffer is consumed
/// as 8-byte little-endian blocks, with any trailing bytes folded
/// into one final block by shifting the i-th remaining byte left by
/// `8*i` bits.  The constants are fixed for cross-implementation
/// reproducibility.
pub fn fasthash64(buf: &[u8], seed: u64) -> u64 {
    let mut h = seed ^ (buf.len() as u64).wrapping_mul(M);
    //
    let mut blocks = buf.chunks_exact(8);
    for block in &mut blocks {
        let v = u64::from_le_bytes(block.try_into().unwrap());
        h = (h ^ mix(v)).wrapping_mul(M);
    }
    // Fold the 1..7 trailing bytes, if any.
    let rest = blocks.remainder();
    if !rest.is_empty() {
        let mut v = 0u64;
        for (i, b) in rest.iter().enumerate() {
            v ^= (*b as u64) << (8 * i);
        }
        h = (h ^ mix(v)).wrapping_mul(M);
    }
    //
    mix(h)
}

/// Hash an instruction record: its opcode bytes, seeded by its
/// address.  Equal identities always hash equal; the converse holds
/// only up to collisions, which is why store buckets compare the
/// full identity triple.
pub fn hash_instr(instr: &Instr) -> u64 {
    fasthash64(instr.opcodes(), instr.address())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasthash_empty() {
        assert_eq!(fasthash64(&[], 0), 0);
        assert_eq!(fasthash64(&[], 0x12345678), 0x29d2570b463fce60);
    }

    #[test]
    fn test_fasthash_vectors() {
        // Reference vectors; any drift here breaks cross-run
        // reproducibility.
        assert_eq!(
            fasthash64(&[0xbe, 0xba, 0xfe, 0xca], 0xdeadbeef),
            0x7da7ae194c3fe257
        );
        assert_eq!(fasthash64(&[0x90], 0x400000), 0xd3b490effb439141);
        assert_eq!(fasthash64(&[0x48, 0x89, 0xe5], 0x1000), 0xf884794ff7daf87c);
    }

    #[test]
    fn test_fasthash_block_boundary() {
        // Exactly one 8-byte block, no trailing bytes.
        assert_eq!(
            fasthash64(&[0x48, 0x83, 0xec, 0x10, 0x48, 0x89, 0x7d, 0xf8], 0x401126),
            0xee40335dfb7e0e75
        );
        // One block plus a 7-byte tail.
        let buf: Vec<u8> = (1..=15).collect();
        assert_eq!(fasthash64(&buf, 0x7fff0000), 0x07dc1d001216497c);
    }

    #[test]
    fn test_fasthash_deterministic() {
        let buf = [0x0f, 0x84, 0x12, 0x00, 0x00, 0x00];
        assert_eq!(fasthash64(&buf, 42), fasthash64(&buf, 42));
        assert_ne!(fasthash64(&buf, 42), fasthash64(&buf, 43));
    }

    #[test]
    fn test_hash_instr_seeded_by_address() {
        let i1 = Instr::new(0x1000, 1, &[0x90], None).unwrap();
        let i2 = Instr::new(0x2000, 1, &[0x90], None).unwrap();
        assert_eq!(hash_instr(&i1), fasthash64(&[0x90], 0x1000));
        assert_ne!(hash_instr(&i1), hash_instr(&i2));
    }
}
