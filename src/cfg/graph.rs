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
use crate::insn::InstrKind;
use crate::store::InstrId;

/// A stable handle onto a node of the control-flow graph.  Handles
/// index the graph's arena; edges are handles, which makes cycles
/// (loops, recursion) free of any ownership concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the underlying arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node of the control-flow graph.  There is at most one node per
/// instruction identity; the node's kind is the kind of its
/// instruction.
#[derive(Clone, Debug)]
pub struct Node {
    /// Handle of the instruction this node stands for.
    instr: InstrId,
    /// Control-flow class, copied from the instruction.
    kind: InstrKind,
    /// Number of distinct predecessors pointing here.
    in_degree: u16,
    /// Function this node was grouped into (0 is the trace root).
    function: u16,
    /// Outgoing edges, in the order they were witnessed.
    successors: Vec<NodeId>,
}

impl Node {
    fn new(instr: InstrId, kind: InstrKind) -> Self {
        // Straight-line nodes have a single follower; branches and
        // jumps start with room for two.
        let capacity = match kind {
            InstrKind::Branch | InstrKind::Jump => 2,
            _ => 1,
        };
        Self {
            instr,
            kind,
            in_degree: 0,
            function: 0,
            successors: Vec::with_capacity(capacity),
        }
    }

    /// Handle of the instruction this node stands for.
    pub fn instr(&self) -> InstrId {
        self.instr
    }

    /// Control-flow class of this node.
    pub fn kind(&self) -> InstrKind {
        self.kind
    }

    /// Number of distinct predecessors pointing at this node.
    pub fn in_degree(&self) -> u16 {
        self.in_degree
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self) -> u16 {
        self.successors.len() as u16
    }

    /// Identifier of the function this node belongs to.
    pub fn function(&self) -> u16 {
        self.function
    }

    /// The outgoing edges, in the order they were witnessed.
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }
}

/// The dynamic control-flow graph.  Nodes are owned by an arena and
/// looked up through the instruction store's handles; the graph also
/// tracks the entry node of every inferred function and the stack of
/// callers awaiting a matching `ret`.
#[derive(Default)]
pub struct Cfg {
    /// Node arena; `NodeId` indexes it.
    nodes: Vec<Node>,
    /// Node handle per instruction handle, parallel to the store's
    /// arena.
    node_of: Vec<Option<NodeId>>,
    /// Entry node per function id; index 0 is the trace root.
    entries: Vec<NodeId>,
    /// Callers whose `call` has not yet been matched by a `ret`.
    call_stack: Vec<NodeId>,
}

impl Cfg {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph holds no node yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node behind its handle.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The node standing for a given instruction, if one exists.
    pub fn node_of(&self, instr: InstrId) -> Option<NodeId> {
        self.node_of.get(instr.index()).copied().flatten()
    }

    /// Entry nodes of the inferred functions, indexed by function
    /// id.
    pub fn function_entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Current depth of the call stack.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Iterate over all node handles.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.successors.len()).sum()
    }

    /// Iterate over every edge as a `(from, to)` pair, grouped by
    /// source node.
    pub fn edges(&self) -> EdgeIter<'_> {
        EdgeIter { nodes: &self.nodes, i: 0, j: 0 }
    }

    /// Number of nodes grouped into the given function.
    pub fn function_size(&self, function: u16) -> usize {
        self.nodes.iter().filter(|n| n.function == function).count()
    }

    // ------------------------------------------------------------------
    // Internal storage operations, used by the insertion driver.
    // ------------------------------------------------------------------

    pub(super) fn add_node(&mut self, instr: InstrId, kind: InstrKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(instr, kind));
        if self.node_of.len() <= instr.index() {
            self.node_of.resize(instr.index() + 1, None);
        }
        self.node_of[instr.index()] = Some(id);
        id
    }

    pub(super) fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes[from.0].successors.contains(&to)
    }

    /// Connect `from` to `to`.  Edges are never duplicated; callers
    /// check `has_edge` first.
    pub(super) fn connect(&mut self, from: NodeId, to: NodeId) {
        // Grow the successor list by doubling whenever the current
        // count is a power of two and the capacity is exhausted.
        let list = &mut self.nodes[from.0].successors;
        let n = list.len();
        if n > 0 && n.is_power_of_two() && n == list.capacity() {
            list.reserve_exact(n);
        }
        list.push(to);
        self.nodes[to.0].in_degree += 1;
    }

    pub(super) fn set_function(&mut self, id: NodeId, function: u16) {
        self.nodes[id.0].function = function;
    }

    pub(super) fn push_entry(&mut self, id: NodeId) -> u16 {
        self.entries.push(id);
        (self.entries.len() - 1) as u16
    }

    pub(super) fn push_caller(&mut self, id: NodeId) {
        self.call_stack.push(id);
    }

    pub(super) fn pop_caller(&mut self) -> Option<NodeId> {
        self.call_stack.pop()
    }
}

/// An iterator over the edges of the graph, walking each node's
/// successor list in turn.
pub struct EdgeIter<'a> {
    // Nodes being iterated over.
    nodes: &'a [Node],
    // Current source node.
    i: usize,
    // Current position within the source's successor list.
    j: usize,
}

impl Iterator for EdgeIter<'_> {
    // An edge
    type Item = (NodeId, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        //
        while self.i < self.nodes.len() {
            let succs = &self.nodes[self.i].successors;
            // sanity check position
            if self.j >= succs.len() {
                self.j = 0;
                self.i += 1;
            } else {
                // Found an edge
                let to = succs[self.j];
                self.j += 1;
                // Done
                return Some((NodeId(self.i), to));
            }
        }
        // Empty
        None
    }
}
