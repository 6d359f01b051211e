/// Functionality related to individual machine instructions: the
/// immutable instruction record observed during a trace, and the
/// classification of raw x86 opcodes into control-flow kinds.
pub mod insn;
/// Functionality related to storing observed instructions.  This
/// includes the hash function used to index them, and the
/// fixed-bucket store which owns every record for the lifetime of a
/// run and hands out stable handles.
pub mod store;
/// Functionality related to the execution trace: the ordered
/// sequence of instruction handles in the exact order they executed.
pub mod trace;
/// Functionality related to the dynamic control-flow graph.  Every
/// edge in this graph was witnessed by a concrete execution step,
/// and function entries are inferred from `call`/`ret` pairing.
pub mod cfg;
/// Functionality related to driving the tracee: the process-control
/// and decoder seams, and the per-step loop which feeds the store,
/// the trace and the graph.
pub mod engine;
/// Functionality related to probing an executable file before
/// tracing it (architecture, `.text` bounds).
pub mod probe;
/// Various utilities.
pub mod util;
