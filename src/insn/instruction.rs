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
use std::fmt;

use crate::util::hex_bytes;

use super::opcode;
use super::InsnError;

/// Maximum encoded length of an x86 instruction.
pub const MAX_INSN_SIZE: usize = 15;

/// The control-flow class of an instruction, as determined from its
/// raw encoding.  The class decides how the control-flow graph links
/// a node to its successor: straight-line instructions have a single
/// follower, conditional branches at most two, jumps arbitrarily
/// many (indirect targets), while calls and returns are paired
/// through the engine's call stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstrKind {
    /// Any instruction without control-flow effect.
    Basic,
    /// A conditional branch (`jcc`), short or long form.
    Branch,
    /// A near, far or indirect `call`.
    Call,
    /// An unconditional `jmp` (direct or indirect) or a `loop`.
    Jump,
    /// A near or far `ret`, with or without stack adjustment.
    Ret,
}

impl fmt::Display for InstrKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            InstrKind::Basic => "basic",
            InstrKind::Branch => "branch",
            InstrKind::Call => "call",
            InstrKind::Jump => "jump",
            InstrKind::Ret => "ret",
        };
        write!(f, "{s}")
    }
}

/// A single machine instruction observed during a trace.  Records
/// are immutable once constructed, and identified by the triple
/// `(address, size, opcode bytes)` — the same address can legally
/// carry different bytes across a run (dynamic loading, patching),
/// and each such pair is a distinct instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instr {
    /// Address where the instruction lies.
    address: u64,
    /// The encoded bytes, of length `1..=15`.
    opcodes: Vec<u8>,
    /// Control-flow class, fixed at construction.
    kind: InstrKind,
}

impl Instr {
    /// Construct an instruction record from its address and raw
    /// bytes.  The `mnemonic`, when available from the decoder, is
    /// consulted for classification only and is not retained.
    pub fn new(
        address: u64,
        size: u8,
        opcodes: &[u8],
        mnemonic: Option<&str>,
    ) -> Result<Self, InsnError> {
        if size == 0 {
            return Err(InsnError::ZeroSize);
        }
        if size as usize > MAX_INSN_SIZE {
            return Err(InsnError::OversizedInstruction(size as usize));
        }
        if opcodes.len() < size as usize {
            return Err(InsnError::TruncatedOpcodes(opcodes.len(), size as usize));
        }
        // Copy exactly `size` bytes out of the fetch window.
        let opcodes = opcodes[..size as usize].to_vec();
        let kind = classify(&opcodes, mnemonic);
        Ok(Self { address, opcodes, kind })
    }

    /// Returns the address of this instruction.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Returns the encoded size of this instruction, in bytes.
    pub fn size(&self) -> u8 {
        self.opcodes.len() as u8
    }

    /// Returns the raw opcode bytes of this instruction.
    pub fn opcodes(&self) -> &[u8] {
        &self.opcodes
    }

    /// Returns the control-flow class of this instruction.
    pub fn kind(&self) -> InstrKind {
        self.kind
    }

    /// Address of the instruction lying immediately after this one.
    pub fn follower(&self) -> u64 {
        self.address.wrapping_add(self.opcodes.len() as u64)
    }

    /// Check whether another record denotes the same instruction,
    /// i.e. agrees on the full identity triple.
    pub fn same_identity(&self, other: &Instr) -> bool {
        self.address == other.address && self.opcodes == other.opcodes
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:#x}: {} ({})",
            self.address,
            hex_bytes(&self.opcodes),
            self.kind
        )
    }
}

/// Determine the control-flow class of an instruction from its raw
/// encoding.  Rules are tried in order and the first match wins.
/// Indirect `call`/`jmp` through `0xFF` share an opcode byte and are
/// told apart by total encoded size (2-3 bytes for `/2` call, 4-5
/// for `/4` jump); the REX.B-prefixed forms are ambiguous at the
/// byte level and fall back to the decoder's mnemonic text.
pub fn classify(opcodes: &[u8], mnemonic: Option<&str>) -> InstrKind {
    let size = opcodes.len();
    let op0 = match opcodes.first() {
        Some(b) => *b,
        None => return InstrKind::Basic,
    };
    let op1 = opcodes.get(1).copied();
    let mnemonic = mnemonic.unwrap_or("");
    // Conditional branches: short Jcc and 0x0F-prefixed long Jcc.
    if (opcode::JCC_SHORT_FIRST..=opcode::JCC_SHORT_LAST).contains(&op0) {
        return InstrKind::Branch;
    }
    if op0 == opcode::TWO_BYTE_ESCAPE
        && matches!(op1, Some(b) if (opcode::JCC_LONG_FIRST..=opcode::JCC_LONG_LAST).contains(&b))
    {
        return InstrKind::Branch;
    }
    // Calls: near relative, far absolute, indirect, REX-prefixed.
    if op0 == opcode::CALL_REL32
        || op0 == opcode::CALL_FAR
        || (op0 == opcode::GRP5 && (size == 2 || size == 3))
        || (op0 == opcode::REX_B && op1 == Some(opcode::GRP5) && mnemonic.contains("call"))
    {
        return InstrKind::Call;
    }
    // Jumps: direct, indirect, LOOPcc/JCXZ, REX-prefixed.
    if (opcode::JMP_REL32..=opcode::JMP_REL8).contains(&op0)
        || (op0 == opcode::GRP5 && (size == 4 || size == 5))
        || (opcode::LOOP_FIRST..=opcode::LOOP_LAST).contains(&op0)
        || (op0 == opcode::REX_B && op1 == Some(opcode::GRP5) && mnemonic.contains("jmp"))
    {
        return InstrKind::Jump;
    }
    // Returns: near/far, with immediate, rep-prefixed.
    if ((op0 == opcode::RET_NEAR || op0 == opcode::RET_FAR) && size == 1)
        || ((op0 == opcode::RET_NEAR_IMM || op0 == opcode::RET_FAR_IMM) && size == 3)
        || (op0 == opcode::REP && op1 == Some(opcode::RET_NEAR) && size == 2)
    {
        return InstrKind::Ret;
    }
    InstrKind::Basic
}
