//! Instance bootstrap: variant selection, default configuration, module
//! descriptor, and the single asynchronous boundary of the bridge.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::config::{ConfigStore, ConfigValue};
use crate::module::NativeModule;
use crate::Instance;

/// Which emulator core to load. The two variants share the whole bridge
/// contract; the selector only decides which factory the embedder resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleVariant {
    /// The base core.
    Np2,
    /// The extended core (enhanced CPU/graphics generation).
    Np21,
}

impl ModuleVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleVariant::Np2 => "np2",
            ModuleVariant::Np21 => "np21",
        }
    }
}

impl fmt::Display for ModuleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file the embedder must place into the module's virtual filesystem
/// before the module's main routine starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadFile {
    /// Name inside the virtual filesystem (root directory).
    pub name: String,
    /// Where the embedder fetches the bytes from.
    pub url: String,
}

/// Everything the module factory needs to instantiate a core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub variant: ModuleVariant,
    /// Pre-boot hook list; currently the font resource.
    pub preload: Vec<PreloadFile>,
}

/// Host hook invoked after the instance reaches `Exited`.
pub type ExitHook = Box<dyn FnMut()>;

/// Host hook invoked when the native side reports a disk change, with the
/// image name.
pub type DiskChangeHook = Box<dyn FnMut(&str)>;

/// Host-supplied bootstrap configuration, merged over fixed defaults.
pub struct InstanceConfig {
    /// Font resource file name, preloaded into the virtual filesystem. The
    /// resolved name is also visible to the native side through the
    /// `"fontfile"` config key.
    pub font_file: String,
    /// URL the font resource is fetched from; defaults to `font_file`
    /// itself (relative to the embedding page).
    pub font_url: Option<String>,
    /// Initial settings; the native side reads and writes these through the
    /// config-marshaling callbacks.
    pub values: ConfigStore,
    pub on_exit: Option<ExitHook>,
    pub on_disk_change: Option<DiskChangeHook>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            font_file: "font.bmp".to_owned(),
            font_url: None,
            values: ConfigStore::new(),
            on_exit: None,
            on_disk_change: None,
        }
    }
}

impl InstanceConfig {
    /// Mirror the resolved font file name into the settings store (under
    /// `"fontfile"`) unless the host already set one.
    pub fn apply_defaults(&mut self) {
        self.values
            .entry("fontfile".to_owned())
            .or_insert_with(|| ConfigValue::Str(self.font_file.clone()));
    }

    /// Build the descriptor the module factory receives.
    pub fn descriptor(&self, variant: ModuleVariant) -> ModuleDescriptor {
        let url = self
            .font_url
            .clone()
            .unwrap_or_else(|| self.font_file.clone());
        ModuleDescriptor {
            variant,
            preload: vec![PreloadFile {
                name: self.font_file.clone(),
                url,
            }],
        }
    }
}

/// Bootstrap failure. No partial instance is ever exposed.
#[derive(Debug, Error)]
pub enum CreateError {
    /// The module factory's own initialization failed.
    #[error("module factory failed: {0}")]
    Factory(String),
}

/// Create one instance of the selected core variant.
///
/// `factory` receives the module descriptor and yields the loaded module;
/// its failure is the only rejection path. The returned future resolves
/// once the instance has completed the ready transition (module paused,
/// visibility policy armed, state `Ready`).
///
/// Embedders whose factory delivers the ready callback itself (through
/// [`Instance::notify_ready`]) compose with this: the transition is
/// idempotent.
pub async fn create<M, F, Fut>(
    variant: ModuleVariant,
    mut config: InstanceConfig,
    factory: F,
) -> Result<Instance<M>, CreateError>
where
    M: NativeModule,
    F: FnOnce(ModuleDescriptor) -> Fut,
    Fut: Future<Output = Result<M, CreateError>>,
{
    config.apply_defaults();
    let descriptor = config.descriptor(variant);
    let module = factory(descriptor).await?;

    let mut instance = Instance::new(config, module);
    instance.notify_ready();
    Ok(instance)
}
