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
mod decoder;
mod process;
mod tracer;

pub use decoder::*;
pub use process::*;
pub use tracer::*;

use std::fmt;
use std::io;

use crate::cfg::CfgError;
use crate::insn::InsnError;

// ============================================================================
// Errors
// ============================================================================

/// Errors which can arise while driving a tracee.  Only `Decoder`
/// failures are recoverable (the step is skipped); everything else
/// aborts the run.
#[derive(Debug)]
pub enum EngineError {
    /// The process-control primitive failed (spawn, wait, register
    /// or memory read, single-step).  Fatal.
    Tracer(String),
    /// The decoder could not form an instruction from the fetched
    /// window, typically because the tracee stopped on a signal
    /// boundary.  The step is skipped.
    Decoder(String),
    /// Growing the control-flow graph failed.
    Graph(CfgError),
    /// Constructing an instruction record failed.
    Insn(InsnError),
    /// Writing the textual log failed.
    Io(io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::Tracer(msg) => write!(f, "tracer failure: {msg}"),
            EngineError::Decoder(msg) => write!(f, "decoder failure: {msg}"),
            EngineError::Graph(e) => write!(f, "{e}"),
            EngineError::Insn(e) => write!(f, "{e}"),
            EngineError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Graph(e) => Some(e),
            EngineError::Insn(e) => Some(e),
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CfgError> for EngineError {
    fn from(e: CfgError) -> Self {
        EngineError::Graph(e)
    }
}

impl From<InsnError> for EngineError {
    fn from(e: InsnError) -> Self {
        EngineError::Insn(e)
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<nix::Error> for EngineError {
    fn from(e: nix::Error) -> Self {
        EngineError::Tracer(e.to_string())
    }
}
