//! JS-facing instance wrapper.
//!
//! Owns the bridge instance behind an `Rc<RefCell<..>>` shared with the
//! module-object callbacks. A single cell is sufficient: the cores deliver
//! config/disk callbacks from their own main-loop task, never synchronously
//! from inside an entry-point call, so callback re-entry while the host
//! surface holds the borrow does not occur.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use np2_bridge::{
    ConfigValue, HardDriveChange, Instance, InstanceConfig, ModuleVariant, RunState,
};

use crate::em_module::EmModule;

type Shared = Rc<RefCell<Instance<EmModule>>>;

/// Which emulator core to load. Both variants expose the identical surface.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorVariant {
    Np2,
    Np21,
}

impl From<EmulatorVariant> for ModuleVariant {
    fn from(v: EmulatorVariant) -> Self {
        match v {
            EmulatorVariant::Np2 => ModuleVariant::Np2,
            EmulatorVariant::Np21 => ModuleVariant::Np21,
        }
    }
}

/// Global factory function the embedding page provides per variant.
fn factory_symbol(variant: ModuleVariant) -> &'static str {
    match variant {
        ModuleVariant::Np2 => "__np2_create_module",
        ModuleVariant::Np21 => "__np21_create_module",
    }
}

/// Data fields of the `create` options bag (`canvas` and the JS hooks are
/// pulled out separately — they are not serde-friendly).
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CreateOptions {
    font_file: Option<String>,
    font_url: Option<String>,
    config: HashMap<String, ConfigValue>,
}

fn js_error(message: impl core::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

fn get_function(options: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(options, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.dyn_into().ok())
}

/// Schedule `poll_deferred` as a zero-delay task.
///
/// The exit reaction must run only after the triggering native call stack
/// has fully unwound; a `setTimeout(0)` lands after the current task and
/// before any later host-initiated call.
fn schedule_poll_deferred(inner: &Shared) {
    let inner = inner.clone();
    let cb = Closure::once_into_js(move || {
        inner.borrow_mut().poll_deferred();
    });
    if let Some(window) = web_sys::window() {
        let _ = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), 0);
    }
}

#[wasm_bindgen]
pub struct Np2Instance {
    inner: Shared,
}

#[wasm_bindgen]
impl Np2Instance {
    /// Boot one core instance.
    ///
    /// `options`: `{ canvas?, fontFile?, fontUrl?, config?, onExit?,
    /// onDiskChange? }`. The returned promise resolves once the module
    /// reports readiness (instances start paused) and rejects if the
    /// factory's own initialization fails.
    pub async fn create(
        variant: EmulatorVariant,
        options: JsValue,
    ) -> Result<Np2Instance, JsValue> {
        let variant = ModuleVariant::from(variant);

        let canvas = Reflect::get(&options, &JsValue::from_str("canvas"))
            .unwrap_or(JsValue::UNDEFINED);
        let on_exit = get_function(&options, "onExit");
        let on_disk_change = get_function(&options, "onDiskChange");

        let opts: CreateOptions = if options.is_undefined() || options.is_null() {
            CreateOptions::default()
        } else {
            let data = Object::assign(&Object::new(), options.unchecked_ref());
            for key in ["canvas", "onExit", "onDiskChange"] {
                let _ = Reflect::delete_property(&data, &JsValue::from_str(key));
            }
            serde_wasm_bindgen::from_value(data.into()).map_err(|e| js_error(e))?
        };

        let mut config = InstanceConfig::default();
        if let Some(font_file) = opts.font_file {
            config.font_file = font_file;
        }
        config.font_url = opts.font_url;
        config.values.extend(opts.config);
        if let Some(hook) = on_exit {
            config.on_exit = Some(Box::new(move || {
                let _ = hook.call0(&JsValue::NULL);
            }));
        }
        if let Some(hook) = on_disk_change {
            config.on_disk_change = Some(Box::new(move |name: &str| {
                let _ = hook.call1(&JsValue::NULL, &JsValue::from_str(name));
            }));
        }

        config.apply_defaults();
        let descriptor = config.descriptor(variant);

        // The emscripten factory fleshes out this object in place; the
        // bridge reaches memory / entry points / FS through it afterwards.
        let module_obj = Object::new();
        Reflect::set(&module_obj, &JsValue::from_str("canvas"), &canvas)?;

        // Pre-boot hook: place the font resource into the module FS before
        // its main routine starts.
        {
            let pre_run = Array::new();
            let target = module_obj.clone();
            let preload = descriptor.preload.clone();
            let hook = Closure::<dyn FnMut()>::new(move || {
                let fs = Reflect::get(&target, &JsValue::from_str("FS")).unwrap_throw();
                let create_preloaded: Function =
                    Reflect::get(&fs, &JsValue::from_str("createPreloadedFile"))
                        .unwrap_throw()
                        .unchecked_into();
                for file in &preload {
                    let args = Array::of5(
                        &JsValue::from_str("/"),
                        &JsValue::from_str(&file.name),
                        &JsValue::from_str(&file.url),
                        &JsValue::TRUE,
                        &JsValue::FALSE,
                    );
                    let _ = create_preloaded.apply(&fs, &args);
                }
            })
            .into_js_value();
            pre_run.push(&hook);
            Reflect::set(&module_obj, &JsValue::from_str("preRun"), &pre_run)?;
        }

        let inner: Shared = Rc::new(RefCell::new(Instance::new(
            config,
            EmModule::new(module_obj.clone()),
        )));

        let mut resolve_slot: Option<Function> = None;
        let ready_promise = Promise::new(&mut |resolve, _reject| {
            resolve_slot = Some(resolve);
        });
        let resolve_ready =
            resolve_slot.ok_or_else(|| js_error("promise executor did not run"))?;

        // Callback bindings, supplied once; the module owns when they fire.
        {
            let inner = inner.clone();
            let cb = Closure::<dyn FnMut()>::new(move || {
                inner.borrow_mut().notify_ready();
                let _ = resolve_ready.call0(&JsValue::NULL);
            })
            .into_js_value();
            Reflect::set(&module_obj, &JsValue::from_str("onReady"), &cb)?;
        }
        {
            let inner = inner.clone();
            let cb = Closure::<dyn FnMut()>::new(move || {
                inner.borrow_mut().notify_exit();
                schedule_poll_deferred(&inner);
            })
            .into_js_value();
            Reflect::set(&module_obj, &JsValue::from_str("onExit"), &cb)?;
        }
        {
            let inner = inner.clone();
            let cb = Closure::<dyn FnMut(u32, u32, u32, u32)>::new(
                move |key, tag, value, size| {
                    inner.borrow_mut().config_read(key, tag, value, size);
                },
            )
            .into_js_value();
            Reflect::set(&module_obj, &JsValue::from_str("getConfig"), &cb)?;
        }
        {
            let inner = inner.clone();
            let cb = Closure::<dyn FnMut(u32, u32, u32, u32)>::new(
                move |key, tag, value, size| {
                    inner.borrow_mut().config_write(key, tag, value, size);
                },
            )
            .into_js_value();
            Reflect::set(&module_obj, &JsValue::from_str("setConfig"), &cb)?;
        }
        {
            let inner = inner.clone();
            let cb = Closure::<dyn FnMut(u32)>::new(move |name_addr| {
                inner.borrow_mut().notify_disk_change(name_addr);
            })
            .into_js_value();
            Reflect::set(&module_obj, &JsValue::from_str("onDiskChange"), &cb)?;
        }

        let symbol = factory_symbol(variant);
        let factory: Function = Reflect::get(&js_sys::global(), &JsValue::from_str(symbol))
            .ok()
            .and_then(|v| v.dyn_into().ok())
            .ok_or_else(|| js_error(format!("missing module factory {symbol}")))?;
        let factory_promise: Promise = factory
            .call1(&JsValue::NULL, &module_obj)
            .map_err(|e| js_error(format!("{symbol} threw during instantiation: {e:?}")))?
            .unchecked_into();

        // Readiness is signalled by the module's own callback; the factory
        // promise only contributes the rejection path.
        let raced = Promise::race(&Array::of2(&ready_promise, &factory_promise));
        JsFuture::from(raced).await?;
        if inner.borrow().state() == RunState::Loading {
            JsFuture::from(ready_promise).await?;
        }

        // Visibility policy: pause hidden instances, resume them on return.
        {
            let inner = inner.clone();
            let listener = Closure::<dyn FnMut()>::new(move || {
                let visible = web_sys::window()
                    .and_then(|w| w.document())
                    .map(|d| d.visibility_state() == web_sys::VisibilityState::Visible)
                    .unwrap_or(true);
                inner.borrow_mut().set_surface_visible(visible);
            })
            .into_js_value();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                document
                    .add_event_listener_with_callback(
                        "visibilitychange",
                        listener.unchecked_ref(),
                    )?;
            }
        }

        Ok(Np2Instance { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.borrow().state().as_str().to_owned()
    }

    pub fn run(&self) {
        self.inner.borrow_mut().run();
    }

    pub fn pause(&self) {
        self.inner.borrow_mut().pause();
    }

    pub fn reset(&self) {
        self.inner.borrow_mut().reset();
    }

    pub fn add_disk_image(&self, name: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .add_disk_image(name, bytes)
            .map_err(|e| js_error(e))
    }

    pub fn disk_image(&self, name: &str) -> Result<Vec<u8>, JsValue> {
        self.inner
            .borrow_mut()
            .disk_image(name)
            .map_err(|e| js_error(e))
    }

    pub fn set_floppy_drive(&self, drive: u32, name: Option<String>) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .set_floppy_drive(drive, name.as_deref())
            .map_err(|e| js_error(e))
    }

    /// Returns `true` when the change applied immediately; `false` when it
    /// takes effect only after the next explicit `reset()`.
    pub fn set_hard_drive(&self, drive: u32, name: Option<String>) -> Result<bool, JsValue> {
        self.inner
            .borrow_mut()
            .set_hard_drive(drive, name.as_deref())
            .map(|change| change == HardDriveChange::Applied)
            .map_err(|e| js_error(e))
    }

    /// Snapshot of the settings store as a plain JS object.
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().config()).map_err(|e| js_error(e))
    }

    pub fn config_value(&self, key: &str) -> Result<JsValue, JsValue> {
        match self.inner.borrow().config().get(key) {
            Some(value) => serde_wasm_bindgen::to_value(value).map_err(|e| js_error(e)),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn set_config_value(&self, key: &str, value: JsValue) -> Result<(), JsValue> {
        let value: ConfigValue = serde_wasm_bindgen::from_value(value).map_err(|e| js_error(e))?;
        self.inner
            .borrow_mut()
            .config_mut()
            .insert(key.to_owned(), value);
        Ok(())
    }
}
