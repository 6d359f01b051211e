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
mod instruction;
pub mod opcode;

pub use instruction::*;

use std::fmt;

// ============================================================================
// Errors
// ============================================================================

/// Errors which can arise when constructing an instruction record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsnError {
    /// An instruction record was requested with a size of zero.
    ZeroSize,
    /// An instruction record was requested with a size above the
    /// architectural limit of fifteen bytes.
    OversizedInstruction(usize),
    /// The opcode buffer held fewer bytes than the declared size.
    TruncatedOpcodes(usize, usize),
}

impl fmt::Display for InsnError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InsnError::ZeroSize => {
                write!(f, "instruction size cannot be zero")
            }
            InsnError::OversizedInstruction(n) => {
                write!(f, "instruction size {n} exceeds 15 bytes")
            }
            InsnError::TruncatedOpcodes(have, need) => {
                write!(f, "opcode buffer holds {have} bytes, {need} required")
            }
        }
    }
}

impl std::error::Error for InsnError {}
