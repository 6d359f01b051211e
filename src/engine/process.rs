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
use std::fmt;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::sys::personality::{self, Persona};
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::uio::{self, IoVec, RemoteIoVec};
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::Pid;
use spawn_ptrace::CommandPtraceSpawn;

use super::EngineError;

/// What the tracee did since the last step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitEvent {
    /// The tracee is gone; the run is over.
    Exited(i32),
    /// The tracee is suspended on the given signal and can be
    /// inspected.
    Stopped(i32),
}

/// The (usermode) register file of a stopped tracee.  Only the
/// standard addressable registers plus `RFLAGS` are tracked; the
/// engine itself consumes `rip`, the rest feed the debug log.  On a
/// 32-bit host the `e`-registers are widened into these fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rsp: u64,
    pub rbp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
    pub rflags: u64,
}

#[cfg(target_arch = "x86_64")]
impl From<nix::libc::user_regs_struct> for Registers {
    fn from(user_regs: nix::libc::user_regs_struct) -> Self {
        Self {
            rax: user_regs.rax,
            rbx: user_regs.rbx,
            rcx: user_regs.rcx,
            rdx: user_regs.rdx,
            rsi: user_regs.rsi,
            rdi: user_regs.rdi,
            rsp: user_regs.rsp,
            rbp: user_regs.rbp,
            r8: user_regs.r8,
            r9: user_regs.r9,
            r10: user_regs.r10,
            r11: user_regs.r11,
            r12: user_regs.r12,
            r13: user_regs.r13,
            r14: user_regs.r14,
            r15: user_regs.r15,
            rip: user_regs.rip,
            rflags: user_regs.eflags,
        }
    }
}

#[cfg(target_arch = "x86")]
impl From<nix::libc::user_regs_struct> for Registers {
    fn from(user_regs: nix::libc::user_regs_struct) -> Self {
        Self {
            rax: user_regs.eax as u64,
            rbx: user_regs.ebx as u64,
            rcx: user_regs.ecx as u64,
            rdx: user_regs.edx as u64,
            rsi: user_regs.esi as u64,
            rdi: user_regs.edi as u64,
            rsp: user_regs.esp as u64,
            rbp: user_regs.ebp as u64,
            rip: user_regs.eip as u64,
            rflags: user_regs.eflags as u64,
            ..Default::default()
        }
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "rip={:#x} rsp={:#x} rbp={:#x} rax={:#x} rbx={:#x} rcx={:#x} \
             rdx={:#x} rsi={:#x} rdi={:#x} rflags={:#x}",
            self.rip,
            self.rsp,
            self.rbp,
            self.rax,
            self.rbx,
            self.rcx,
            self.rdx,
            self.rsi,
            self.rdi,
            self.rflags
        )
    }
}

/// The process-control seam: attach, wait, inspect, single-step.
/// The production implementation is `PtraceProcess`; tests
/// substitute a scripted mock.
pub trait Process {
    /// Block until the tracee stops or exits.
    fn wait(&mut self) -> Result<WaitEvent, EngineError>;
    /// Read the register state of the stopped tracee.
    fn regs(&mut self) -> Result<Registers, EngineError>;
    /// Read `buf.len()` bytes of tracee memory starting at `addr`.
    fn read_bytes(&mut self, addr: u64, buf: &mut [u8]) -> Result<(), EngineError>;
    /// Advance the tracee by exactly one instruction.
    fn step(&mut self) -> Result<(), EngineError>;
    /// Release the tracee.
    fn detach(&mut self) -> Result<(), EngineError>;
}

/// A tracee driven through ptrace.  The child is spawned with
/// `PTRACE_TRACEME` and with ASLR disabled, so that repeated runs of
/// the same program observe consistent addresses.
pub struct PtraceProcess {
    pid: Pid,
    /// The spawn helper consumes the initial exec stop; the first
    /// `wait` reports it without blocking.
    pending_stop: bool,
    alive: bool,
}

impl PtraceProcess {
    /// Spawn `argv` as a traced child, suspended at its entry.
    pub fn spawn(argv: &[String]) -> Result<Self, EngineError> {
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => return Err(EngineError::Tracer("empty command line".to_string())),
        };
        let mut command = Command::new(program);
        command.args(args);
        // Disable ASLR in the child, before it execs.
        unsafe {
            command.pre_exec(|| {
                personality::set(Persona::ADDR_NO_RANDOMIZE)
                    .map(|_| ())
                    .map_err(|e| io::Error::from_raw_os_error(e as i32))
            });
        }
        let child = command
            .spawn_ptrace()
            .map_err(|e| EngineError::Tracer(format!("cannot spawn '{program}': {e}")))?;
        let pid = Pid::from_raw(child.id() as i32);
        log::debug!("spawned '{}' for tracing as child {}", program, pid);
        // Make sure the tracee does not outlive a dying tracer.
        ptrace::setoptions(pid, ptrace::Options::PTRACE_O_EXITKILL)?;
        Ok(Self { pid, pending_stop: true, alive: true })
    }

    /// Process id of the tracee.
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl Process for PtraceProcess {
    fn wait(&mut self) -> Result<WaitEvent, EngineError> {
        if self.pending_stop {
            self.pending_stop = false;
            return Ok(WaitEvent::Stopped(Signal::SIGTRAP as i32));
        }
        match wait::waitpid(self.pid, None)? {
            WaitStatus::Exited(_, code) => {
                self.alive = false;
                Ok(WaitEvent::Exited(code))
            }
            WaitStatus::Signaled(_, signal, _) => {
                self.alive = false;
                Ok(WaitEvent::Exited(128 + signal as i32))
            }
            WaitStatus::Stopped(_, signal) => Ok(WaitEvent::Stopped(signal as i32)),
            _ => Ok(WaitEvent::Stopped(0)),
        }
    }

    fn regs(&mut self) -> Result<Registers, EngineError> {
        Ok(Registers::from(ptrace::getregs(self.pid)?))
    }

    fn read_bytes(&mut self, addr: u64, buf: &mut [u8]) -> Result<(), EngineError> {
        let len = buf.len();
        let local = [IoVec::from_mut_slice(buf)];
        let remote = [RemoteIoVec { base: addr as usize, len }];
        // A short read is fine: the window may cross into an
        // unmapped page, and the zero-filled tail will simply fail
        // to decode.
        let n = uio::process_vm_readv(self.pid, &local, &remote)
            .map_err(|e| EngineError::Tracer(format!("cannot read {len} bytes at {addr:#x}: {e}")))?;
        if n == 0 {
            return Err(EngineError::Tracer(format!("no bytes readable at {addr:#x}")));
        }
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        ptrace::step(self.pid, None)?;
        Ok(())
    }

    fn detach(&mut self) -> Result<(), EngineError> {
        if self.alive {
            ptrace::detach(self.pid, None)?;
            self.alive = false;
        }
        Ok(())
    }
}

impl Drop for PtraceProcess {
    fn drop(&mut self) {
        let _ = self.detach();
    }
}
