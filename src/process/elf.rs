//! Minimal ELF header reader for image architecture and entry point.

use std::io::Read;

use crate::error::{ProcfsError, ProcfsResult};
use crate::process::record::Architecture;

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2MSB: u8 = 2;

const ET_DYN: u16 = 3;

const EM_386: u16 = 3;
const EM_ARM: u16 = 40;
const EM_X86_64: u16 = 62;
const EM_AARCH64: u16 = 183;

/// Size of the 64-bit header; the 32-bit one is shorter.
pub const ELF_HEADER_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    pub is_64bit: bool,
    pub e_type: u16,
    pub e_machine: u16,
    pub e_entry: u64,
}

impl ElfHeader {
    pub fn architecture(&self) -> Architecture {
        match self.e_machine {
            EM_X86_64 => Architecture::X64,
            EM_386 => Architecture::X86,
            EM_AARCH64 => Architecture::Arm64,
            EM_ARM => Architecture::Arm,
            _ => Architecture::Unknown,
        }
    }

    /// Position-independent images are relocated by their load address.
    pub fn is_position_independent(&self) -> bool {
        self.e_type == ET_DYN
    }

    /// Entry point as mapped in the process, given the image's load address.
    pub fn runtime_entry(&self, image_base: u64) -> u64 {
        if self.is_position_independent() {
            image_base.wrapping_add(self.e_entry)
        } else {
            self.e_entry
        }
    }
}

/// Parses an ELF header from the first bytes of an image.
pub fn parse_elf_header(bytes: &[u8]) -> ProcfsResult<ElfHeader> {
    if bytes.len() < 24 || bytes[..4] != ELF_MAGIC {
        return Err(ProcfsError::NotElf("bad magic".into()));
    }

    let is_64bit = match bytes[4] {
        ELFCLASS32 => false,
        ELFCLASS64 => true,
        other => return Err(ProcfsError::NotElf(format!("unknown class {other}"))),
    };
    let big_endian = bytes[5] == ELFDATA2MSB;

    let u16_at = |off: usize| -> u16 {
        let b = [bytes[off], bytes[off + 1]];
        if big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        }
    };

    let e_entry = if is_64bit {
        let raw: [u8; 8] = bytes
            .get(24..32)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ProcfsError::NotElf("truncated 64-bit header".into()))?;
        if big_endian {
            u64::from_be_bytes(raw)
        } else {
            u64::from_le_bytes(raw)
        }
    } else {
        let raw: [u8; 4] = bytes
            .get(24..28)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ProcfsError::NotElf("truncated 32-bit header".into()))?;
        u64::from(if big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        })
    };

    Ok(ElfHeader {
        is_64bit,
        e_type: u16_at(16),
        e_machine: u16_at(18),
        e_entry,
    })
}

/// Reads and parses the header from an open image.
pub fn read_elf_header<R: Read>(reader: &mut R) -> ProcfsResult<ElfHeader> {
    let mut buf = [0u8; ELF_HEADER_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProcfsError::io("<image>", e)),
        }
    }
    parse_elf_header(&buf[..filled])
}

#[cfg(test)]
pub(crate) fn synthetic_header(is_64bit: bool, e_type: u16, e_machine: u16, e_entry: u64) -> Vec<u8> {
    let mut out = vec![0u8; ELF_HEADER_LEN];
    out[..4].copy_from_slice(&ELF_MAGIC);
    out[4] = if is_64bit { ELFCLASS64 } else { ELFCLASS32 };
    out[5] = 1;
    out[6] = 1;
    out[16..18].copy_from_slice(&e_type.to_le_bytes());
    out[18..20].copy_from_slice(&e_machine.to_le_bytes());
    if is_64bit {
        out[24..32].copy_from_slice(&e_entry.to_le_bytes());
    } else {
        out[24..28].copy_from_slice(&(e_entry as u32).to_le_bytes());
    }
    out
}
