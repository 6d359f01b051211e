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
use crate::store::InstrId;

/// An execution trace: the ordered sequence of instruction handles
/// in the exact order they executed.  Traces are append-only and
/// positions are 1-based in the external contract.  A trace holds
/// handles only; the records live in the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<InstrId>,
}

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append one handle at the tail.
    pub fn append(&mut self, id: InstrId) {
        self.steps.push(id);
    }

    /// Get the handle at the given 1-based position, or `None` when
    /// the position is zero or past the end.
    pub fn get(&self, index: usize) -> Option<InstrId> {
        if index == 0 {
            return None;
        }
        self.steps.get(index - 1).copied()
    }

    /// Number of handles appended so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Compare two traces by handle identity.  Returns 0 when the
    /// sequences are pointwise identical, otherwise the 1-based
    /// position at which they first differ; when one trace is a
    /// proper prefix of the other that position is just past the
    /// prefix.
    pub fn compare(&self, other: &Trace) -> usize {
        // Two empty traces are equal; one empty side differs at the
        // head.
        match (self.steps.is_empty(), other.steps.is_empty()) {
            (true, true) => return 0,
            (true, false) | (false, true) => return 1,
            _ => {}
        }
        let mut k = 0;
        while k < self.steps.len() && k < other.steps.len() {
            if self.steps[k] != other.steps[k] {
                return k + 1;
            }
            k += 1;
        }
        if self.steps.len() == other.steps.len() {
            0
        } else {
            k + 1
        }
    }

    /// Iterate over the handles in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, InstrId> {
        self.steps.iter()
    }
}
