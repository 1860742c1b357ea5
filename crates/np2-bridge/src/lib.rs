//! Host-side lifecycle and configuration bridge for the NP2/NP21 emulator
//! cores.
//!
//! The emulator itself is a precompiled, self-contained module (CPU, disk
//! controller and video logic included); this crate only governs *when* its
//! entry points may be invoked and *how* host settings and disk images cross
//! the boundary:
//!
//! - [`Instance`]: the lifecycle state machine (`run`/`pause`/`reset`, the
//!   visibility-driven auto-pause policy, the deferred exit reaction) plus
//!   the disk attach/detach operations.
//! - config marshaling: the native side reads and writes named settings as
//!   raw bytes in its own memory, tagged with a wire type; the host never
//!   duplicates the native schema.
//! - [`create`]: the single asynchronous boundary, resolving to a ready
//!   instance or rejecting with the factory's failure.
//!
//! Everything here is plain Rust over the [`NativeModule`] trait, usable
//! from native integration tests; the browser adapter lives in `np2-wasm`.

#![forbid(unsafe_code)]

mod boot;
mod config;
mod error;
mod lifecycle;
pub mod memory;
mod module;
pub mod testing;

use std::collections::VecDeque;

use lifecycle::DeferredAction;

pub use boot::{
    create, CreateError, DiskChangeHook, ExitHook, InstanceConfig, ModuleDescriptor, ModuleVariant,
    PreloadFile,
};
pub use config::{ConfigStore, ConfigValue, IniType};
pub use error::{BridgeError, FsError};
pub use lifecycle::RunState;
pub use module::{entry, EntryArg, NativeModule, Vfs};

/// Outcome of [`Instance::set_hard_drive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a deferred hard-drive change takes effect only after an explicit reset"]
pub enum HardDriveChange {
    /// The instance had not booted yet; the change was applied and the
    /// machine reset immediately.
    Applied,
    /// The native side accepted the change but will pick it up only at the
    /// next explicit `reset()`.
    DeferredUntilReset,
}

/// One live emulator instance.
///
/// Owns exactly one module handle, one config store and the lifecycle
/// state. The host-facing operations (`run`, `pause`, `reset`, disk and
/// config access) are the only mutators of the state; the `notify_*` /
/// `config_*` methods form the callback surface the native module is wired
/// to by the embedder.
pub struct Instance<M: NativeModule> {
    module: M,
    config: ConfigStore,
    state: RunState,
    visibility_armed: bool,
    pending: VecDeque<DeferredAction>,
    on_exit: Option<ExitHook>,
    on_disk_change: Option<DiskChangeHook>,
}

impl<M: NativeModule> Instance<M> {
    /// Wrap a freshly instantiated module. State starts at
    /// [`RunState::Loading`]; the embedder (or [`create`]) drives the ready
    /// transition once module bootstrap completes.
    pub fn new(config: InstanceConfig, module: M) -> Self {
        Self {
            module,
            config: config.values,
            state: RunState::Loading,
            visibility_armed: false,
            pending: VecDeque::new(),
            on_exit: config.on_exit,
            on_disk_change: config.on_disk_change,
        }
    }

    /// Current lifecycle state. Read-only; no external code sets state
    /// directly.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Snapshot of the host-side settings store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Mutable settings store. The native side observes changes on its next
    /// config read.
    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    /// The underlying module handle (drawing surface access, debugging).
    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Start or resume execution. Legal from `Ready` or `Paused`; a no-op
    /// in any other state.
    pub fn run(&mut self) {
        if matches!(self.state, RunState::Ready | RunState::Paused) {
            self.state = RunState::Running;
            self.module.invoke(entry::RESUME, &[]);
        }
    }

    /// Pause execution. Legal only from `Running`; a no-op otherwise.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
            self.module.invoke(entry::PAUSE, &[]);
        }
    }

    /// Reset the emulated machine. Legal from any state; from `Exited` the
    /// instance first transitions back to `Running` and resumes.
    pub fn reset(&mut self) {
        if self.state == RunState::Exited {
            self.state = RunState::Running;
            self.module.invoke(entry::RESUME, &[]);
        }
        self.module.invoke(entry::RESET, &[]);
    }

    /// Ready callback, fired once from inside module bootstrap.
    ///
    /// Pauses the module (instances start paused by policy), arms the
    /// visibility observer and transitions `Loading → Ready`. Idempotent:
    /// only the first call in `Loading` has any effect.
    pub fn notify_ready(&mut self) {
        if self.state != RunState::Loading {
            return;
        }
        self.module.invoke(entry::PAUSE, &[]);
        self.visibility_armed = true;
        self.state = RunState::Ready;
    }

    /// Exit callback, fired synchronously from deep inside the native call
    /// stack.
    ///
    /// Only queues the reaction; mutating module state while the module is
    /// still executing would corrupt it. The embedder must schedule
    /// [`Instance::poll_deferred`] as a zero-delay task so the reaction runs
    /// after the native stack unwinds and before any later host-initiated
    /// call.
    pub fn notify_exit(&mut self) {
        self.pending.push_back(DeferredAction::Exit);
    }

    /// Execute reactions queued by native callbacks. See
    /// [`Instance::notify_exit`].
    pub fn poll_deferred(&mut self) {
        while let Some(action) = self.pending.pop_front() {
            match action {
                DeferredAction::Exit => {
                    self.pause();
                    self.state = RunState::Exited;
                    if let Some(hook) = self.on_exit.as_mut() {
                        hook();
                    }
                }
            }
        }
    }

    /// Visibility-driven auto-pause policy, armed at the ready transition.
    ///
    /// Hidden while `Running` pauses; visible while `Paused` resumes. The
    /// policy cannot tell an automatic pause from a host-initiated pause
    /// that happened while hidden — the latter is auto-resumed too. That
    /// ambiguity is inherited behavior; the intended semantics are
    /// unspecified, so it is kept rather than fixed.
    pub fn set_surface_visible(&mut self, visible: bool) {
        if !self.visibility_armed {
            return;
        }
        if visible {
            if self.state == RunState::Paused {
                self.run();
            }
        } else if self.state == RunState::Running {
            self.pause();
        }
    }

    /// Disk-change callback: the native side reports a changed image by the
    /// address of its name in module memory.
    pub fn notify_disk_change(&mut self, name_addr: u32) {
        let name = memory::read_cstr(&self.module, name_addr);
        if let Some(hook) = self.on_disk_change.as_mut() {
            hook(&name);
        }
    }

    // ---------------------------------------------------------------------
    // Config marshaling callbacks
    // ---------------------------------------------------------------------

    /// Native config read: encode `store[key]` into module memory.
    pub fn config_read(&mut self, key_addr: u32, raw_tag: u32, value_addr: u32, size: u32) {
        let key = memory::read_cstr(&self.module, key_addr);
        config::read_into_module(&self.config, &mut self.module, &key, raw_tag, value_addr, size);
    }

    /// Native config write: decode module memory into `store[key]`.
    pub fn config_write(&mut self, key_addr: u32, raw_tag: u32, value_addr: u32, size: u32) {
        let key = memory::read_cstr(&self.module, key_addr);
        config::write_from_module(&mut self.config, &self.module, &key, raw_tag, value_addr, size);
    }

    // ---------------------------------------------------------------------
    // Disk images
    // ---------------------------------------------------------------------

    /// Store a disk image in the virtual filesystem under `name`.
    pub fn add_disk_image(&mut self, name: &str, bytes: &[u8]) -> Result<(), BridgeError> {
        self.module.fs_mut().write_file(name, bytes)?;
        Ok(())
    }

    /// Read back the raw bytes stored under `name`.
    pub fn disk_image(&mut self, name: &str) -> Result<Vec<u8>, BridgeError> {
        Ok(self.module.fs().read_file(name)?)
    }

    /// Attach (`Some`) or eject (`None`) a floppy image. Takes effect
    /// immediately; no reset required.
    pub fn set_floppy_drive(&mut self, drive: u32, image: Option<&str>) -> Result<(), BridgeError> {
        let drive = drive as i32;
        match image {
            None => {
                self.module.invoke(
                    entry::SET_FDD,
                    &[
                        EntryArg::Num(drive),
                        EntryArg::Null,
                        EntryArg::Num(0),
                        EntryArg::Num(0),
                    ],
                );
            }
            Some(name) => {
                if self.module.fs().stat(name).is_err() {
                    return Err(BridgeError::InvalidImageName(name.to_owned()));
                }
                self.module.invoke(
                    entry::SET_FDD,
                    &[
                        EntryArg::Num(drive),
                        EntryArg::Str(name),
                        EntryArg::Num(0),
                        EntryArg::Num(0),
                    ],
                );
            }
        }
        Ok(())
    }

    /// Attach (`Some`) or disconnect (`None`) a hard-drive image.
    ///
    /// Before boot (state `Ready`) the change applies immediately and the
    /// machine is reset. After boot the native side accepts the call but
    /// only picks it up at the next explicit [`Instance::reset`]; that
    /// common misuse is surfaced both in the return value and as a warning.
    pub fn set_hard_drive(
        &mut self,
        drive: u32,
        image: Option<&str>,
    ) -> Result<HardDriveChange, BridgeError> {
        let drive = drive as i32;
        match image {
            None => {
                self.module
                    .invoke(entry::SET_HDD, &[EntryArg::Num(drive), EntryArg::Null]);
            }
            Some(name) => {
                if self.module.fs().stat(name).is_err() {
                    return Err(BridgeError::InvalidImageName(name.to_owned()));
                }
                self.module
                    .invoke(entry::SET_HDD, &[EntryArg::Num(drive), EntryArg::Str(name)]);
            }
        }
        if self.state == RunState::Ready {
            self.reset();
            Ok(HardDriveChange::Applied)
        } else {
            log::warn!(
                "hard drive change while {}: takes effect only after the next reset",
                self.state
            );
            Ok(HardDriveChange::DeferredUntilReset)
        }
    }
}
