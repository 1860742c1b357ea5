//! Emscripten-style module object adapted to the [`NativeModule`] trait.
//!
//! The loaded core exposes its linear memory as `HEAPU8`, entry points via
//! `ccall`, and the virtual filesystem as `FS`. A missing field here means
//! the factory handed us something that is not an emscripten module — that
//! is a fatal wiring bug, so the accessors abort via `unwrap_throw`.

use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use np2_bridge::{EntryArg, FsError, NativeModule, Vfs};

pub struct EmModule {
    obj: Object,
}

impl EmModule {
    /// Wrap the module object handed to (and fleshed out by) the core
    /// factory.
    pub fn new(obj: Object) -> Self {
        Self { obj }
    }

    pub fn object(&self) -> &Object {
        &self.obj
    }

    fn field(&self, name: &str) -> JsValue {
        Reflect::get(&self.obj, &JsValue::from_str(name)).unwrap_throw()
    }

    fn heap_u8(&self) -> Uint8Array {
        self.field("HEAPU8").unchecked_into()
    }

    fn fs_object(&self) -> Object {
        self.field("FS").unchecked_into()
    }

    fn fs_function(&self, name: &str) -> Function {
        Reflect::get(&self.fs_object(), &JsValue::from_str(name))
            .unwrap_throw()
            .unchecked_into()
    }
}

fn js_error_string(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| {
        err.dyn_ref::<js_sys::Error>()
            .map(|e| String::from(e.message()))
            .unwrap_or_else(|| format!("{err:?}"))
    })
}

impl NativeModule for EmModule {
    fn mem_len(&self) -> u32 {
        self.heap_u8().length()
    }

    fn read_mem(&self, addr: u32, dst: &mut [u8]) {
        self.heap_u8()
            .subarray(addr, addr + dst.len() as u32)
            .copy_to(dst);
    }

    fn write_mem(&mut self, addr: u32, src: &[u8]) {
        self.heap_u8()
            .subarray(addr, addr + src.len() as u32)
            .copy_from(src);
    }

    fn invoke(&mut self, entry: &str, args: &[EntryArg<'_>]) {
        let types = Array::new();
        let values = Array::new();
        for arg in args {
            match arg {
                EntryArg::Num(v) => {
                    types.push(&JsValue::from_str("number"));
                    values.push(&JsValue::from(*v));
                }
                EntryArg::Str(s) => {
                    types.push(&JsValue::from_str("string"));
                    values.push(&JsValue::from_str(s));
                }
                // Null references travel as numeric zero in the core's
                // calling convention.
                EntryArg::Null => {
                    types.push(&JsValue::from_str("number"));
                    values.push(&JsValue::from(0));
                }
            }
        }

        let ccall: Function = self.field("ccall").unchecked_into();
        let call_args = Array::of4(
            &JsValue::from_str(entry),
            &JsValue::UNDEFINED,
            &types,
            &values,
        );
        ccall.apply(&self.obj, &call_args).unwrap_throw();
    }

    fn fs(&self) -> &dyn Vfs {
        self
    }

    fn fs_mut(&mut self) -> &mut dyn Vfs {
        self
    }
}

impl Vfs for EmModule {
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), FsError> {
        let write_file = self.fs_function("writeFile");
        write_file
            .call2(
                &self.fs_object(),
                &JsValue::from_str(name),
                &Uint8Array::from(bytes),
            )
            .map(|_| ())
            .map_err(|e| FsError::Io(js_error_string(e)))
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>, FsError> {
        let opts = Object::new();
        Reflect::set(
            &opts,
            &JsValue::from_str("encoding"),
            &JsValue::from_str("binary"),
        )
        .unwrap_throw();

        let read_file = self.fs_function("readFile");
        let bytes = read_file
            .call2(&self.fs_object(), &JsValue::from_str(name), &opts)
            .map_err(|_| FsError::NotFound(name.to_owned()))?;
        Ok(bytes.unchecked_into::<Uint8Array>().to_vec())
    }

    fn stat(&self, name: &str) -> Result<(), FsError> {
        let stat = self.fs_function("stat");
        stat.call1(&self.fs_object(), &JsValue::from_str(name))
            .map(|_| ())
            .map_err(|_| FsError::NotFound(name.to_owned()))
    }
}
