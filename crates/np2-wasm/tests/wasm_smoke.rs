#![cfg(target_arch = "wasm32")]

use np2_wasm::{EmulatorVariant, Np2Instance};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::wasm_bindgen_test;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn version_matches_the_crate() {
    assert_eq!(np2_wasm::version(), env!("CARGO_PKG_VERSION"));
}

#[wasm_bindgen_test]
async fn create_rejects_when_the_factory_is_missing() {
    let err = Np2Instance::create(EmulatorVariant::Np2, wasm_bindgen::JsValue::UNDEFINED)
        .await
        .err()
        .expect("bootstrap must reject without a module factory");
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .unwrap_or_default();
    assert!(message.contains("__np2_create_module"), "{message}");
}
