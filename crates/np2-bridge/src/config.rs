//! Bidirectional configuration marshaling between the host store and module
//! memory.
//!
//! The native side owns the schema: it decides *when* a setting is read or
//! written and with which wire type. The host only owns the values. A
//! mismatch between the two is therefore never fatal — the offending call is
//! skipped (and logged for unknown tags) so a host misconfiguration cannot
//! crash emulation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::memory::{self, Width};
use crate::module::NativeModule;

/// Host-side key/value settings store.
pub type ConfigStore = HashMap<String, ConfigValue>;

/// Dynamic value of one configuration setting.
///
/// Serde representation is untagged, so JS-side objects map naturally:
/// booleans to `Bool`, numbers to `Int`, strings to `Str`, arrays to
/// `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Str(v.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Str(v)
    }
}

impl From<Vec<u8>> for ConfigValue {
    fn from(v: Vec<u8>) -> Self {
        ConfigValue::Bytes(v)
    }
}

/// Wire type tag supplied by the native side for each setting.
///
/// The numbering is part of the module contract. The `Hex*` variants are
/// hexadecimal-formatted in the core's own `.ini` handling but share the
/// wire representation of their unsigned counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IniType {
    Str = 0,
    Bool = 1,
    ByteArg = 2,
    Sint8 = 3,
    Sint16 = 4,
    Sint32 = 5,
    Uint8 = 6,
    Uint16 = 7,
    Uint32 = 8,
    Hex8 = 9,
    Hex16 = 10,
    Hex32 = 11,
}

impl IniType {
    pub fn from_raw(raw: u32) -> Option<IniType> {
        Some(match raw {
            0 => IniType::Str,
            1 => IniType::Bool,
            2 => IniType::ByteArg,
            3 => IniType::Sint8,
            4 => IniType::Sint16,
            5 => IniType::Sint32,
            6 => IniType::Uint8,
            7 => IniType::Uint16,
            8 => IniType::Uint32,
            9 => IniType::Hex8,
            10 => IniType::Hex16,
            11 => IniType::Hex32,
            _ => return None,
        })
    }

    /// Memory layout for the integer tags; `None` for `Str`/`Bool`/`ByteArg`.
    fn int_layout(self) -> Option<(Width, bool)> {
        match self {
            IniType::Sint8 => Some((Width::W8, true)),
            IniType::Sint16 => Some((Width::W16, true)),
            IniType::Sint32 => Some((Width::W32, true)),
            IniType::Uint8 | IniType::Hex8 => Some((Width::W8, false)),
            IniType::Uint16 | IniType::Hex16 => Some((Width::W16, false)),
            IniType::Uint32 | IniType::Hex32 => Some((Width::W32, false)),
            IniType::Str | IniType::Bool | IniType::ByteArg => None,
        }
    }
}

/// Encode `store[key]` into module memory at `addr`, as requested by the
/// native side.
///
/// Missing key, or a stored value whose dynamic type does not match `raw_tag`,
/// leaves memory untouched. An unrecognized tag is a non-fatal protocol
/// violation: logged and ignored.
pub fn read_into_module<M: NativeModule + ?Sized>(
    store: &ConfigStore,
    module: &mut M,
    key: &str,
    raw_tag: u32,
    addr: u32,
    size: u32,
) {
    let Some(tag) = IniType::from_raw(raw_tag) else {
        log::warn!("config read: {key} has unknown type tag {raw_tag}");
        return;
    };
    let Some(value) = store.get(key) else {
        return;
    };
    match (tag, value) {
        (IniType::Str, ConfigValue::Str(s)) => memory::write_cstr(module, addr, s, size),
        (IniType::Bool, ConfigValue::Bool(b)) => {
            memory::write_scalar(module, addr, Width::W8, i64::from(*b))
        }
        (IniType::ByteArg, ConfigValue::Bytes(b)) if b.len() == size as usize => {
            memory::write_bytes(module, addr, b)
        }
        (tag, ConfigValue::Int(v)) => {
            if let Some((width, _)) = tag.int_layout() {
                memory::write_scalar(module, addr, width, *v);
            }
        }
        // Type disagreement (including a Bytes length mismatch): the native
        // schema is authoritative, leave its memory alone.
        _ => {}
    }
}

/// Decode the bytes at `addr` per `raw_tag` and overwrite `store[key]`.
///
/// An unrecognized tag is logged and ignored; the store keeps its previous
/// value for the key.
pub fn write_from_module<M: NativeModule + ?Sized>(
    store: &mut ConfigStore,
    module: &M,
    key: &str,
    raw_tag: u32,
    addr: u32,
    size: u32,
) {
    let Some(tag) = IniType::from_raw(raw_tag) else {
        log::warn!("config write: {key} has unknown type tag {raw_tag}");
        return;
    };
    let value = match tag {
        IniType::Str => ConfigValue::Str(memory::read_cstr(module, addr)),
        IniType::Bool => ConfigValue::Bool(memory::read_scalar(module, addr, Width::W8, false) != 0),
        IniType::ByteArg => ConfigValue::Bytes(memory::read_bytes(module, addr, size)),
        IniType::Sint8 => ConfigValue::Int(memory::read_scalar(module, addr, Width::W8, true)),
        IniType::Sint16 => ConfigValue::Int(memory::read_scalar(module, addr, Width::W16, true)),
        IniType::Sint32 => ConfigValue::Int(memory::read_scalar(module, addr, Width::W32, true)),
        IniType::Uint8 | IniType::Hex8 => {
            ConfigValue::Int(memory::read_scalar(module, addr, Width::W8, false))
        }
        IniType::Uint16 | IniType::Hex16 => {
            ConfigValue::Int(memory::read_scalar(module, addr, Width::W16, false))
        }
        IniType::Uint32 | IniType::Hex32 => {
            ConfigValue::Int(memory::read_scalar(module, addr, Width::W32, false))
        }
    };
    store.insert(key.to_owned(), value);
}
