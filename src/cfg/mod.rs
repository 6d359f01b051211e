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
mod builder;
mod graph;

pub use graph::*;

use std::fmt;

/// Bound on the depth of the engine's call stack.  Overflowing it is
/// a fatal error rather than a silent truncation.
pub const MAX_CALL_DEPTH: usize = 256;

// ============================================================================
// Errors
// ============================================================================

/// Errors which can arise while growing the control-flow graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CfgError {
    /// A conditional branch was asked for a third distinct outgoing
    /// edge; a branch has exactly a taken and a fall-through
    /// successor.
    BranchLimit(u64),
    /// More nested `call`s were observed than the call stack can
    /// hold.
    CallDepthExceeded(usize),
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CfgError::BranchLimit(addr) => {
                write!(f, "branch at {addr:#x} cannot take a third outgoing edge")
            }
            CfgError::CallDepthExceeded(depth) => {
                write!(f, "call stack exceeded {depth} frames")
            }
        }
    }
}

impl std::error::Error for CfgError {}
