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
use crate::insn::{Instr, InstrKind};
use crate::store::InstrStore;

use super::{Cfg, CfgError, NodeId, MAX_CALL_DEPTH};

impl Cfg {
    /// Begin a trace: deduplicate the first observed instruction and
    /// return its node, creating both when unseen.  The very first
    /// node of the graph becomes the entry of function 0.
    pub fn entry(&mut self, store: &mut InstrStore, instr: Instr) -> NodeId {
        let (iid, _) = store.insert(instr);
        let node = match self.node_of(iid) {
            Some(n) => n,
            None => self.add_node(iid, store.get(iid).kind()),
        };
        if self.function_entries().is_empty() {
            self.push_entry(node);
        }
        node
    }

    /// Extend the graph by one execution step: the instruction
    /// `instr` was observed immediately after the instruction of
    /// `cur`.  Deduplicates `instr` against the store, links the new
    /// node according to the control-flow class of `cur`, maintains
    /// the call stack across `call`/`ret` pairs, and returns the
    /// node to use as the next step's predecessor.
    pub fn insert(
        &mut self,
        store: &mut InstrStore,
        cur: NodeId,
        instr: Instr,
    ) -> Result<NodeId, CfgError> {
        // Adopt the canonical record; a duplicate identity drops the
        // passed one.
        let (iid, _) = store.insert(instr);
        let (node, fresh) = match self.node_of(iid) {
            Some(n) => (n, false),
            None => (self.add_node(iid, store.get(iid).kind()), true),
        };
        let cur_kind = self.node(cur).kind();
        // A call pushes its node for the matching ret, and a fresh
        // target opens a new function.
        if cur_kind == InstrKind::Call {
            if self.call_depth() == MAX_CALL_DEPTH {
                return Err(CfgError::CallDepthExceeded(MAX_CALL_DEPTH));
            }
            self.push_caller(cur);
            if fresh {
                let function = self.push_entry(node);
                self.set_function(node, function);
            }
        }
        match cur_kind {
            InstrKind::Ret => self.link_return(store, cur, node, fresh),
            _ if self.has_edge(cur, node) => {}
            InstrKind::Basic => {
                // A straight-line instruction has one follower slot;
                // once taken, later distinct successors add no edge.
                if self.node(cur).out_degree() == 0 {
                    self.connect(cur, node);
                }
                if fresh {
                    let function = self.node(cur).function();
                    self.set_function(node, function);
                }
            }
            InstrKind::Branch => {
                if self.node(cur).out_degree() == 2 {
                    let addr = store.get(self.node(cur).instr()).address();
                    return Err(CfgError::BranchLimit(addr));
                }
                self.connect(cur, node);
                if fresh {
                    let function = self.node(cur).function();
                    self.set_function(node, function);
                }
            }
            InstrKind::Call => {
                // First edge is the called entry; an indirect call
                // observed with further targets keeps appending.
                self.connect(cur, node);
            }
            InstrKind::Jump => {
                self.connect(cur, node);
                if fresh {
                    let function = self.node(cur).function();
                    self.set_function(node, function);
                }
            }
        }
        Ok(node)
    }

    /// Handle the step following a `ret`.  One frame is popped; when
    /// the new node sits exactly after the popped caller the edge is
    /// drawn from the caller (the return-to-follower edge), otherwise
    /// it falls back to the `ret` node itself.
    fn link_return(&mut self, store: &InstrStore, cur: NodeId, node: NodeId, fresh: bool) {
        let source = match self.pop_caller() {
            Some(caller) => {
                let follower = store.get(self.node(caller).instr()).follower();
                let addr = store.get(self.node(node).instr()).address();
                if addr == follower {
                    caller
                } else {
                    cur
                }
            }
            None => cur,
        };
        if !self.has_edge(source, node) {
            self.connect(source, node);
        }
        if fresh {
            let function = self.node(source).function();
            self.set_function(node, function);
        }
    }
}
