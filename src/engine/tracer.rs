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
use std::io;
use std::io::Write;

use crate::cfg::{Cfg, NodeId};
use crate::insn::Instr;
use crate::store::{InstrStore, StoreError};
use crate::trace::Trace;
use crate::util::hex_bytes;

use super::{Decoded, EngineError, InsnDecoder, Process, WaitEvent, FETCH_WINDOW};

/// What one tracee invocation produced.
#[derive(Debug)]
pub struct RunReport {
    /// Number of instructions executed (and logged).
    pub executed: usize,
    /// Exit code of the tracee (128 + signal when signal-killed).
    pub exit_code: i32,
    /// The run's execution trace.
    pub trace: Trace,
}

/// The dynamic-analysis engine.  One engine accumulates a single
/// instruction store and a single control-flow graph across any
/// number of runs; each run contributes its own trace.
pub struct Engine {
    store: InstrStore,
    cfg: Cfg,
}

impl Engine {
    /// Create an engine whose store has the given bucket count.
    pub fn new(store_size: usize) -> Result<Self, StoreError> {
        Ok(Self { store: InstrStore::new(store_size)?, cfg: Cfg::new() })
    }

    /// The accumulated instruction store.
    pub fn store(&self) -> &InstrStore {
        &self.store
    }

    /// The accumulated control-flow graph.
    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// Supervise one tracee from its current stop to its exit,
    /// extending the store and the graph by one witnessed step at a
    /// time and logging each executed instruction to `out`.
    pub fn run(
        &mut self,
        process: &mut dyn Process,
        decoder: &mut dyn InsnDecoder,
        out: &mut dyn Write,
    ) -> Result<RunReport, EngineError> {
        let mut trace = Trace::new();
        let mut cur: Option<NodeId> = None;
        let mut executed = 0;
        let exit_code;
        loop {
            match process.wait()? {
                WaitEvent::Exited(code) => {
                    log::debug!("tracee exited with {}", code);
                    exit_code = code;
                    break;
                }
                WaitEvent::Stopped(signal) => {
                    log::trace!("tracee stopped with signal {}", signal);
                }
            }
            let regs = process.regs()?;
            log::trace!("{}", regs);
            let ip = regs.rip;
            let mut window = [0u8; FETCH_WINDOW];
            process.read_bytes(ip, &mut window)?;
            let decoded = match decoder.decode(&window) {
                Ok(decoded) => decoded,
                Err(EngineError::Decoder(reason)) => {
                    // Probably a stop on a signal boundary; skip.
                    log::debug!("skipping undecodable step at {:#x}: {}", ip, reason);
                    process.step()?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            write_step(out, ip, &window[..decoded.size as usize], &decoded)?;
            let instr = Instr::new(ip, decoded.size, &window, Some(&decoded.mnemonic))?;
            log::debug!("step {}: {}", executed + 1, instr);
            let node = match cur {
                None => self.cfg.entry(&mut self.store, instr),
                Some(cur) => self.cfg.insert(&mut self.store, cur, instr)?,
            };
            cur = Some(node);
            trace.append(self.cfg.node(node).instr());
            executed += 1;
            process.step()?;
        }
        log::info!(
            "run complete: {} steps, {} nodes, {} edges, {} inferred functions",
            executed,
            self.cfg.len(),
            self.cfg.edge_count(),
            self.cfg.function_entries().len()
        );
        Ok(RunReport { executed, exit_code, trace })
    }

    /// Emit the end-of-run statistics block.
    pub fn write_statistics(&self, out: &mut dyn Write, executed: usize) -> io::Result<()> {
        write!(out, "\n\tStatistics about this run\n\t=========================\n")?;
        writeln!(out, "* #instructions executed: {}", executed)?;
        writeln!(out, "* #unique instructions:   {}", self.store.entries())?;
        writeln!(out, "* #hashtable buckets:     {}", self.store.buckets())?;
        writeln!(out, "* #filled buckets:        {}", self.store.filled_buckets())?;
        writeln!(out, "* #hashtable collisions:  {}\n\n", self.store.collisions())?;
        Ok(())
    }
}

/// One line per executed instruction: address, raw bytes, tab
/// padding, mnemonic and operands.  The padding is consumed by
/// downstream tooling and must not change.
fn write_step(out: &mut dyn Write, ip: u64, bytes: &[u8], decoded: &Decoded) -> io::Result<()> {
    write!(out, "0x{ip:x}   {}", hex_bytes(bytes))?;
    let size = bytes.len() as i32;
    if size != 8 && size != 11 {
        write!(out, "\t")?;
    }
    for _ in 0..(4 - size / 3).max(0) {
        write!(out, "\t")?;
    }
    writeln!(out, "{}  {}", decoded.mnemonic, decoded.operands)
}
