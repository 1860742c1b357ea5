//! In-memory test double for the native emulator module.
//!
//! Used by this crate's own tests and available to embedders that want to
//! exercise host integration without a real core: a flat `Vec<u8>` memory
//! image, a `HashMap`-backed virtual filesystem, and a log of every
//! entry-point invocation.

use std::collections::HashMap;

use crate::error::FsError;
use crate::module::{EntryArg, NativeModule, Vfs};

/// Owned form of [`EntryArg`], for the call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedArg {
    Num(i32),
    Str(String),
    Null,
}

impl From<&EntryArg<'_>> for OwnedArg {
    fn from(arg: &EntryArg<'_>) -> Self {
        match arg {
            EntryArg::Num(v) => OwnedArg::Num(*v),
            EntryArg::Str(s) => OwnedArg::Str((*s).to_owned()),
            EntryArg::Null => OwnedArg::Null,
        }
    }
}

/// One recorded entry-point invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCall {
    pub entry: String,
    pub args: Vec<OwnedArg>,
}

/// `HashMap`-backed [`Vfs`].
#[derive(Debug, Default)]
pub struct MemFs {
    files: HashMap<String, Vec<u8>>,
}

impl Vfs for MemFs {
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), FsError> {
        self.files.insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>, FsError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::NotFound(name.to_owned()))
    }

    fn stat(&self, name: &str) -> Result<(), FsError> {
        if self.files.contains_key(name) {
            Ok(())
        } else {
            Err(FsError::NotFound(name.to_owned()))
        }
    }
}

/// Recording mock of [`NativeModule`].
#[derive(Debug, Default)]
pub struct MockModule {
    pub mem: Vec<u8>,
    pub fs: MemFs,
    pub calls: Vec<EntryCall>,
}

impl MockModule {
    pub fn new(mem_len: usize) -> Self {
        Self {
            mem: vec![0; mem_len],
            ..Self::default()
        }
    }

    /// Number of recorded invocations of `entry`.
    pub fn calls_to(&self, entry: &str) -> usize {
        self.calls.iter().filter(|c| c.entry == entry).count()
    }

    /// The most recent invocation of `entry`, if any.
    pub fn last_call_to(&self, entry: &str) -> Option<&EntryCall> {
        self.calls.iter().rev().find(|c| c.entry == entry)
    }

    /// Drop the recorded call log.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Write a NUL-terminated string at `addr`, returning `addr` for
    /// convenience. Panics if it does not fit — test images are small.
    pub fn place_cstr(&mut self, addr: u32, value: &str) -> u32 {
        let at = addr as usize;
        self.mem[at..at + value.len()].copy_from_slice(value.as_bytes());
        self.mem[at + value.len()] = 0;
        addr
    }
}

impl NativeModule for MockModule {
    fn mem_len(&self) -> u32 {
        self.mem.len() as u32
    }

    fn read_mem(&self, addr: u32, dst: &mut [u8]) {
        let at = addr as usize;
        dst.copy_from_slice(&self.mem[at..at + dst.len()]);
    }

    fn write_mem(&mut self, addr: u32, src: &[u8]) {
        let at = addr as usize;
        self.mem[at..at + src.len()].copy_from_slice(src);
    }

    fn invoke(&mut self, entry: &str, args: &[EntryArg<'_>]) {
        self.calls.push(EntryCall {
            entry: entry.to_owned(),
            args: args.iter().map(OwnedArg::from).collect(),
        });
    }

    fn fs(&self) -> &dyn Vfs {
        &self.fs
    }

    fn fs_mut(&mut self) -> &mut dyn Vfs {
        &mut self.fs
    }
}
