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

//! Opcode constants for the x86 encodings the classifier cares
//! about.  Only control-flow relevant bytes are named here; plain
//! instructions never need to be told apart.

/// First opcode of the short conditional branch family (`jo`).
pub const JCC_SHORT_FIRST: u8 = 0x70;
/// Last opcode of the short conditional branch family (`jg`).
pub const JCC_SHORT_LAST: u8 = 0x7F;

/// Escape byte opening the two-byte opcode map.
pub const TWO_BYTE_ESCAPE: u8 = 0x0F;
/// First second-byte of the long conditional branch family.
pub const JCC_LONG_FIRST: u8 = 0x80;
/// Last second-byte of the long conditional branch family.
pub const JCC_LONG_LAST: u8 = 0x8F;

/// Near relative call with a 32-bit displacement.
pub const CALL_REL32: u8 = 0xE8;
/// Far absolute call with a segment:offset operand.
pub const CALL_FAR: u8 = 0x9A;

/// Group-5 escape: indirect `call` (`/2`, `/3`) and indirect `jmp`
/// (`/4`, `/5`) share this byte and are told apart by encoded size.
pub const GRP5: u8 = 0xFF;

/// REX.B prefix; a following group-5 byte is ambiguous at the byte
/// level and needs the decoder's mnemonic.
pub const REX_B: u8 = 0x41;

/// Near relative jump with a 32-bit displacement.
pub const JMP_REL32: u8 = 0xE9;
/// Far absolute jump with a segment:offset operand.
pub const JMP_FAR: u8 = 0xEA;
/// Short relative jump with an 8-bit displacement.
pub const JMP_REL8: u8 = 0xEB;

/// First opcode of the `loopne`/`loope`/`loop`/`jcxz` family.
pub const LOOP_FIRST: u8 = 0xE0;
/// Last opcode of the `loopne`/`loope`/`loop`/`jcxz` family.
pub const LOOP_LAST: u8 = 0xE3;

/// Near return.
pub const RET_NEAR: u8 = 0xC3;
/// Far return.
pub const RET_FAR: u8 = 0xCB;
/// Near return popping an immediate number of bytes.
pub const RET_NEAR_IMM: u8 = 0xC2;
/// Far return popping an immediate number of bytes.
pub const RET_FAR_IMM: u8 = 0xCA;
/// REP prefix, seen on the two-byte `rep ret` form.
pub const REP: u8 = 0xF3;
