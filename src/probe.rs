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
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

// ============================================================================
// Errors
// ============================================================================

/// Errors which can arise when probing an executable file.
#[derive(Debug)]
pub enum ProbeError {
    /// The file does not exist.
    NotFound(PathBuf),
    /// The file is not a regular file with its owner-executable bit
    /// set.
    NotExecutable(PathBuf),
    /// The file does not carry the ELF magic.
    NotElf(PathBuf),
    /// The image targets a machine other than x86-32 or x86-64.
    UnsupportedArch(PathBuf, u16),
    /// Reading the file failed.
    Io(PathBuf, io::Error),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbeError::NotFound(p) => {
                write!(f, "'{}': no such file", p.display())
            }
            ProbeError::NotExecutable(p) => {
                write!(f, "'{}' is not an executable file", p.display())
            }
            ProbeError::NotElf(p) => {
                write!(f, "'{}' is not an ELF binary", p.display())
            }
            ProbeError::UnsupportedArch(p, machine) => {
                write!(f, "'{}': unsupported architecture {machine:#04x}", p.display())
            }
            ProbeError::Io(p, e) => {
                write!(f, "'{}': {e}", p.display())
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// Probe
// ============================================================================

/// Machine architecture of an ELF image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    X86_32,
    X86_64,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arch::X86_32 => write!(f, "x86-32"),
            Arch::X86_64 => write!(f, "x86-64"),
        }
    }
}

/// Virtual address and size of the image's `.text` section, when
/// the section table names one.  Used downstream to tell program
/// code from library code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextBounds {
    pub address: u64,
    pub size: u64,
}

/// What the probe learned about an executable file.
#[derive(Debug)]
pub struct Executable {
    path: PathBuf,
    arch: Arch,
    sections: Vec<String>,
    text: Option<TextBounds>,
}

impl Executable {
    /// Validate the file at `path` and discover its architecture.
    /// The file must be a regular, owner-executable ELF image for
    /// x86-32 or x86-64.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self, ProbeError> {
        let path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ProbeError::NotFound(path.clone()),
            _ => ProbeError::Io(path.clone(), e),
        })?;
        if !metadata.is_file() || metadata.permissions().mode() & 0o100 == 0 {
            return Err(ProbeError::NotExecutable(path));
        }
        let mut file = File::open(&path).map_err(|e| ProbeError::Io(path.clone(), e))?;
        // ELF magic: 0x7f "ELF".
        let mut magic = [0u8; 4];
        if file.read_exact(&mut magic).is_err() || magic != [0x7f, b'E', b'L', b'F'] {
            return Err(ProbeError::NotElf(path));
        }
        // e_machine lies at offset 0x12.
        let machine = match read_u16(&mut file, 0x12) {
            Ok(machine) => machine,
            Err(_) => return Err(ProbeError::NotElf(path)),
        };
        let arch = match machine {
            0x03 => Arch::X86_32,
            0x3e => Arch::X86_64,
            _ => return Err(ProbeError::UnsupportedArch(path, machine)),
        };
        // The section walk is best-effort enrichment; a truncated or
        // unusual table just leaves the names and bounds unset.
        let (sections, text) = scan_sections(&mut file, arch).unwrap_or_default();
        Ok(Self { path, arch, sections, text })
    }

    /// Path this executable was probed at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Machine architecture of the image.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Names of the image's sections, in table order; empty when the
    /// image carries no section table.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Bounds of the `.text` section, when found.
    pub fn text(&self) -> Option<&TextBounds> {
        self.text.as_ref()
    }
}

/// Walk the image's section-header table, collecting section names
/// and the virtual address and size of `.text` when present.
/// Header field offsets and section-header layout differ by ELF
/// class.
fn scan_sections(file: &mut File, arch: Arch) -> io::Result<(Vec<String>, Option<TextBounds>)> {
    let wide = arch == Arch::X86_64;
    let (e_shoff, e_shentsize, e_shnum, e_shstrndx, sh_addr, sh_offset, sh_size) = if wide {
        (
            read_u64(file, 0x28)?,
            read_u16(file, 0x3a)? as u64,
            read_u16(file, 0x3c)? as u64,
            read_u16(file, 0x3e)? as u64,
            0x10,
            0x18,
            0x20,
        )
    } else {
        (
            read_u32(file, 0x20)? as u64,
            read_u16(file, 0x2e)? as u64,
            read_u16(file, 0x30)? as u64,
            read_u16(file, 0x32)? as u64,
            0x0c,
            0x10,
            0x14,
        )
    };
    if e_shoff == 0 || e_shentsize == 0 || e_shstrndx >= e_shnum {
        return Ok((Vec::new(), None));
    }
    // File offset of the section-name string table.
    let shstrtab = read_word(file, e_shoff + e_shentsize * e_shstrndx + sh_offset, wide)?;
    let mut sections = Vec::with_capacity(e_shnum as usize);
    let mut text = None;
    for index in 0..e_shnum {
        let shdr = e_shoff + e_shentsize * index;
        let name_off = read_u32(file, shdr)? as u64;
        let name = read_name(file, shstrtab + name_off)?;
        if name == ".text" {
            let address = read_word(file, shdr + sh_addr, wide)?;
            let size = read_word(file, shdr + sh_size, wide)?;
            text = Some(TextBounds { address, size });
        }
        sections.push(name);
    }
    Ok((sections, text))
}

/// Read a NUL-terminated section name out of the string table.
/// Names are capped at 64 bytes, far beyond anything a linker
/// emits.
fn read_name(file: &mut File, offset: u64) -> io::Result<String> {
    let mut buf = [0u8; 64];
    file.seek(SeekFrom::Start(offset))?;
    let n = file.read(&mut buf)?;
    let end = buf[..n].iter().position(|b| *b == 0).unwrap_or(n);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Read a class-sized word: eight bytes for a 64-bit image, four
/// for a 32-bit one.
fn read_word(file: &mut File, offset: u64, wide: bool) -> io::Result<u64> {
    if wide {
        read_u64(file, offset)
    } else {
        Ok(read_u32(file, offset)? as u64)
    }
}

fn read_u16(file: &mut File, offset: u64) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(file: &mut File, offset: u64) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(file: &mut File, offset: u64) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
