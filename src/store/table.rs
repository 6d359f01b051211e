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

use super::{hash_instr, StoreError};

/// A stable handle onto an instruction record held by an
/// `InstrStore`.  Handles index the store's arena and remain valid
/// until the store itself is dropped; the trace and the control-flow
/// graph only ever hold handles, never records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrId(usize);

impl InstrId {
    /// Returns the underlying arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A deduplicating store of instruction records.  The store is a
/// hash table with a fixed number of buckets, each bucket a dense
/// vector of handles; it owns every record inserted into it for the
/// lifetime of a run.  A fixed bucket array avoids any resize while
/// tracing (a run can produce millions of hits), and the dense
/// per-bucket chains keep the scan cache-friendly in the common case
/// of very few collisions.
///
/// Entry identity is the triple `(address, size, opcode bytes)`, not
/// the hash alone: the same address may execute different bytes
/// across a run.
pub struct InstrStore {
    /// The arena owning every stored record; `InstrId` indexes it.
    instrs: Vec<Instr>,
    /// One chain of handles per bucket; an empty chain is an empty
    /// bucket.
    buckets: Vec<Vec<InstrId>>,
    /// Number of insertions which landed in an occupied bucket.
    collisions: usize,
    /// Number of non-empty buckets.
    filled: usize,
}

impl InstrStore {
    /// Create a store with the given number of buckets.  Zero
    /// buckets is refused.
    pub fn new(size: usize) -> Result<Self, StoreError> {
        if size == 0 {
            return Err(StoreError::ZeroCapacity);
        }
        Ok(Self {
            instrs: Vec::new(),
            buckets: vec![Vec::new(); size],
            collisions: 0,
            filled: 0,
        })
    }

    /// Insert an instruction record, taking ownership of it.
    /// Returns the handle of the stored record and `true` when the
    /// record was fresh; a duplicate identity returns the canonical
    /// handle and `false`, dropping the redundant record.
    pub fn insert(&mut self, instr: Instr) -> (InstrId, bool) {
        let index = (hash_instr(&instr) % self.buckets.len() as u64) as usize;
        // Scan the chain for an entry with the same identity.
        for &id in &self.buckets[index] {
            if self.instrs[id.0].same_identity(&instr) {
                return (id, false);
            }
        }
        // Fresh identity; the first handle in a bucket is not a
        // collision, every subsequent one is.
        if self.buckets[index].is_empty() {
            self.filled += 1;
        } else {
            self.collisions += 1;
        }
        let id = InstrId(self.instrs.len());
        self.instrs.push(instr);
        self.buckets[index].push(id);
        (id, true)
    }

    /// Find the handle of a record with the same identity as the
    /// given one, if any.
    pub fn find(&self, instr: &Instr) -> Option<InstrId> {
        let index = (hash_instr(instr) % self.buckets.len() as u64) as usize;
        self.buckets[index]
            .iter()
            .find(|id| self.instrs[id.0].same_identity(instr))
            .copied()
    }

    /// Check whether a record with the same identity is stored.
    pub fn contains(&self, instr: &Instr) -> bool {
        self.find(instr).is_some()
    }

    /// Access the record behind a handle.
    pub fn get(&self, id: InstrId) -> &Instr {
        &self.instrs[id.0]
    }

    /// Number of records stored.
    pub fn entries(&self) -> usize {
        self.instrs.len()
    }

    /// Number of insertions which landed in an occupied bucket.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Number of non-empty buckets.
    pub fn filled_buckets(&self) -> usize {
        self.filled
    }

    /// Total number of buckets.
    pub fn buckets(&self) -> usize {
        self.buckets.len()
    }
}
