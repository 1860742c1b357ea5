//! Round-trips through the native config callbacks, with keys and values
//! living in module memory the way the core delivers them.

use np2_bridge::testing::MockModule;
use np2_bridge::{ConfigValue, IniType, Instance, InstanceConfig};
use pretty_assertions::assert_eq;

const KEY_ADDR: u32 = 0;
const VAL_ADDR: u32 = 64;

fn instance_with(key: &str, value: ConfigValue) -> Instance<MockModule> {
    let mut module = MockModule::new(256);
    module.place_cstr(KEY_ADDR, key);
    let mut config = InstanceConfig::default();
    config.values.insert(key.to_owned(), value);
    let mut inst = Instance::new(config, module);
    inst.notify_ready();
    inst
}

#[track_caller]
fn roundtrip_int(tag: IniType, stored: i64, expect: i64) {
    let mut inst = instance_with("value", ConfigValue::Int(stored));
    inst.config_read(KEY_ADDR, tag as u32, VAL_ADDR, 0);
    inst.config_write(KEY_ADDR, tag as u32, VAL_ADDR, 0);
    assert_eq!(
        inst.config()["value"],
        ConfigValue::Int(expect),
        "tag {tag:?}"
    );
}

#[test]
fn integer_tags_roundtrip_with_width_and_signedness() {
    roundtrip_int(IniType::Sint8, -100, -100);
    roundtrip_int(IniType::Sint16, -30_000, -30_000);
    roundtrip_int(IniType::Sint32, -2_000_000_000, -2_000_000_000);
    roundtrip_int(IniType::Uint8, 200, 200);
    roundtrip_int(IniType::Uint16, 60_000, 60_000);
    roundtrip_int(IniType::Uint32, 4_000_000_000, 4_000_000_000);
    // Hex variants share the unsigned wire representation.
    roundtrip_int(IniType::Hex8, 0xAB, 0xAB);
    roundtrip_int(IniType::Hex16, 0xABCD, 0xABCD);
    roundtrip_int(IniType::Hex32, 0xDEAD_BEEF, 0xDEAD_BEEF);
}

#[test]
fn bool_roundtrips_as_one_byte() {
    for stored in [true, false] {
        let mut inst = instance_with("joystick", ConfigValue::Bool(stored));
        inst.config_read(KEY_ADDR, IniType::Bool as u32, VAL_ADDR, 0);
        inst.config_write(KEY_ADDR, IniType::Bool as u32, VAL_ADDR, 0);
        assert_eq!(inst.config()["joystick"], ConfigValue::Bool(stored));
    }
}

#[test]
fn string_roundtrips_up_to_the_buffer_size() {
    let mut inst = instance_with("fontfile", ConfigValue::Str("custom-font.bmp".into()));
    inst.config_read(KEY_ADDR, IniType::Str as u32, VAL_ADDR, 32);
    inst.config_write(KEY_ADDR, IniType::Str as u32, VAL_ADDR, 32);
    assert_eq!(
        inst.config()["fontfile"],
        ConfigValue::Str("custom-font.bmp".into())
    );

    // A smaller buffer truncates on the way out; the write-back then
    // reflects what actually reached native memory.
    let mut inst = instance_with("fontfile", ConfigValue::Str("custom-font.bmp".into()));
    inst.config_read(KEY_ADDR, IniType::Str as u32, VAL_ADDR, 7);
    inst.config_write(KEY_ADDR, IniType::Str as u32, VAL_ADDR, 7);
    assert_eq!(inst.config()["fontfile"], ConfigValue::Str("custom".into()));
}

#[test]
fn byte_array_roundtrips_only_at_the_exact_size() {
    let bytes = vec![0x10, 0x20, 0x30, 0x40];
    let mut inst = instance_with("mpu", ConfigValue::Bytes(bytes.clone()));
    inst.config_read(KEY_ADDR, IniType::ByteArg as u32, VAL_ADDR, 4);
    inst.config_write(KEY_ADDR, IniType::ByteArg as u32, VAL_ADDR, 4);
    assert_eq!(inst.config()["mpu"], ConfigValue::Bytes(bytes));
}

#[test]
fn byte_array_size_mismatch_leaves_store_and_memory_unchanged() {
    let mut inst = instance_with("mpu", ConfigValue::Bytes(vec![1, 2, 3, 4]));
    let before_mem = inst.module().mem.clone();

    // Native requests 8 bytes but the stored array holds 4: the read is a
    // no-op on module memory.
    inst.config_read(KEY_ADDR, IniType::ByteArg as u32, VAL_ADDR, 8);
    assert_eq!(inst.module().mem, before_mem);
}

#[test]
fn unknown_tag_is_a_non_fatal_no_op() {
    let mut inst = instance_with("value", ConfigValue::Int(5));
    let before_mem = inst.module().mem.clone();

    inst.config_read(KEY_ADDR, 42, VAL_ADDR, 4);
    assert_eq!(inst.module().mem, before_mem);

    inst.config_write(KEY_ADDR, 42, VAL_ADDR, 4);
    assert_eq!(inst.config()["value"], ConfigValue::Int(5));
}

#[test]
fn native_write_overwrites_with_the_native_type() {
    // The native side may rewrite a key with whatever its schema says; the
    // store takes the new dynamic type.
    let mut inst = instance_with("value", ConfigValue::Str("old".into()));
    inst.module_mut().mem[VAL_ADDR as usize] = 9;
    inst.config_write(KEY_ADDR, IniType::Uint8 as u32, VAL_ADDR, 0);
    assert_eq!(inst.config()["value"], ConfigValue::Int(9));
}

#[test]
fn type_mismatch_read_leaves_memory_untouched() {
    let mut inst = instance_with("value", ConfigValue::Str("text".into()));
    let before_mem = inst.module().mem.clone();
    inst.config_read(KEY_ADDR, IniType::Sint32 as u32, VAL_ADDR, 0);
    assert_eq!(inst.module().mem, before_mem);
}
