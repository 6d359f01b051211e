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
use capstone::arch::x86::{ArchMode, ArchSyntax};
use capstone::prelude::*;

use crate::probe::Arch;

use super::EngineError;

/// Width of the byte window handed to the decoder on every step.
pub const FETCH_WINDOW: usize = 16;

/// Canonical base address at which the window is decoded.  The
/// decoder is pure with respect to its input buffer; the engine
/// consumes only the size, mnemonic and operand text.
pub const DECODE_BASE: u64 = 0x1000;

/// Assembly syntax flavour for the textual output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syntax {
    /// AT&T syntax (the default).
    Att,
    /// Intel syntax.
    Intel,
}

/// The decoder's view of one instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Encoded size in bytes, always `1..=15`.
    pub size: u8,
    /// Mnemonic text, e.g. `mov`.
    pub mnemonic: String,
    /// Operand text, e.g. `%rsp, %rbp`.
    pub operands: String,
}

/// The machine-code decoder seam.  Implementations turn a fixed
/// 16-byte window into size, mnemonic and operand text; tests
/// substitute a scripted mock.
pub trait InsnDecoder {
    /// Decode the first instruction of the window.  A window which
    /// does not begin with a valid instruction yields a
    /// `Decoder` error, which the engine treats as a skippable
    /// step.
    fn decode(&mut self, window: &[u8; FETCH_WINDOW]) -> Result<Decoded, EngineError>;
}

/// A decoder backed by capstone, in 32 or 64-bit x86 mode.
pub struct CapstoneDecoder {
    cs: Capstone,
}

impl CapstoneDecoder {
    /// Initialize capstone for the given architecture and syntax
    /// flavour.
    pub fn new(arch: Arch, syntax: Syntax) -> Result<Self, EngineError> {
        let mode = match arch {
            Arch::X86_32 => ArchMode::Mode32,
            Arch::X86_64 => ArchMode::Mode64,
        };
        let flavour = match syntax {
            Syntax::Att => ArchSyntax::Att,
            Syntax::Intel => ArchSyntax::Intel,
        };
        let cs = Capstone::new()
            .x86()
            .mode(mode)
            .syntax(flavour)
            .detail(false)
            .build()
            .map_err(|e| EngineError::Decoder(format!("cannot start capstone: {e}")))?;
        Ok(Self { cs })
    }
}

impl InsnDecoder for CapstoneDecoder {
    fn decode(&mut self, window: &[u8; FETCH_WINDOW]) -> Result<Decoded, EngineError> {
        let insns = self
            .cs
            .disasm_count(window, DECODE_BASE, 1)
            .map_err(|e| EngineError::Decoder(e.to_string()))?;
        let insn = match insns.iter().next() {
            Some(insn) => insn,
            None => {
                return Err(EngineError::Decoder("undecodable byte sequence".to_string()));
            }
        };
        Ok(Decoded {
            size: insn.bytes().len() as u8,
            mnemonic: insn.mnemonic().unwrap_or("").to_string(),
            operands: insn.op_str().unwrap_or("").to_string(),
        })
    }
}
