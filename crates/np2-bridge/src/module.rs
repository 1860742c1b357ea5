//! Contract between the bridge and the precompiled emulator module.
//!
//! The emulator core is opaque: the bridge sees a byte-addressable linear
//! memory, a small set of named entry points, and a virtual filesystem. Both
//! core variants (`np2` and `np21`) export the same surface, so one trait
//! covers both.

use crate::error::FsError;

/// Entry points exported by the emulator cores.
pub mod entry {
    /// Resume the module's internal main loop (no arguments).
    pub const RESUME: &str = "np2_resume";
    /// Pause the module's internal main loop (no arguments).
    pub const PAUSE: &str = "np2_pause";
    /// Reset the emulated machine (no arguments).
    pub const RESET: &str = "np2_reset";
    /// Attach or eject a floppy image: `(drive, name | null, 0, 0)`.
    ///
    /// The two trailing parameters are reserved by the core's calling
    /// convention and are always passed as zero.
    pub const SET_FDD: &str = "diskdrv_setfddex";
    /// Attach or disconnect a hard-drive image: `(drive, name | null)`.
    pub const SET_HDD: &str = "diskdrv_setsxsi";
}

/// Typed positional argument for a native entry-point call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryArg<'a> {
    /// Numeric argument (drive indices, reserved zeros).
    Num(i32),
    /// String argument, marshaled into module memory by the caller side.
    Str(&'a str),
    /// Null reference, used to eject/disconnect a drive.
    Null,
}

/// Virtual filesystem exposed by the module, backing disk images and
/// preloaded resources.
pub trait Vfs {
    /// Create or overwrite a file.
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), FsError>;

    /// Read a whole file.
    fn read_file(&self, name: &str) -> Result<Vec<u8>, FsError>;

    /// Existence check; errs with [`FsError::NotFound`] on absence.
    fn stat(&self, name: &str) -> Result<(), FsError>;
}

/// Handle to one loaded emulator module.
///
/// Addresses are module-relative byte offsets supplied by the native side.
/// Implementations add no bounds recovery of their own: an out-of-range
/// access is a fatal condition for the whole instance and panics (or traps).
pub trait NativeModule {
    /// Total byte length of the module's linear memory.
    fn mem_len(&self) -> u32;

    /// Copy `dst.len()` bytes out of module memory starting at `addr`.
    fn read_mem(&self, addr: u32, dst: &mut [u8]);

    /// Copy `src` into module memory starting at `addr`.
    fn write_mem(&mut self, addr: u32, src: &[u8]);

    /// Synchronously invoke a named native entry point.
    fn invoke(&mut self, entry: &str, args: &[EntryArg<'_>]);

    /// The module's virtual filesystem.
    fn fs(&self) -> &dyn Vfs;

    /// Mutable access to the module's virtual filesystem.
    fn fs_mut(&mut self) -> &mut dyn Vfs;
}
