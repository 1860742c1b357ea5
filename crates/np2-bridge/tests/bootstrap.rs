use np2_bridge::testing::MockModule;
use np2_bridge::{
    create, ConfigValue, CreateError, InstanceConfig, ModuleVariant, RunState, Vfs,
};
use pretty_assertions::assert_eq;

#[test]
fn create_resolves_with_a_ready_instance() {
    let inst = pollster::block_on(create(
        ModuleVariant::Np2,
        InstanceConfig::default(),
        |descriptor| async move {
            assert_eq!(descriptor.variant, ModuleVariant::Np2);
            // The descriptor asks the embedder to preload the font resource
            // before the module's main routine starts.
            assert_eq!(descriptor.preload.len(), 1);
            assert_eq!(descriptor.preload[0].name, "font.bmp");
            assert_eq!(descriptor.preload[0].url, "font.bmp");

            let mut module = MockModule::new(64);
            for file in &descriptor.preload {
                module.fs.write_file(&file.name, b"glyphs").unwrap();
            }
            Ok(module)
        },
    ))
    .unwrap();

    assert_eq!(inst.state(), RunState::Ready);
    assert_eq!(inst.module().fs.read_file("font.bmp").unwrap(), b"glyphs");
    // The resolved default is visible to the native side as a config key.
    assert_eq!(
        inst.config()["fontfile"],
        ConfigValue::Str("font.bmp".into())
    );
}

#[test]
fn create_merges_host_config_over_defaults() {
    let config = InstanceConfig {
        font_file: "font2.bmp".to_owned(),
        font_url: Some("https://host.example/res/font2.bmp".to_owned()),
        ..InstanceConfig::default()
    };

    let inst = pollster::block_on(create(ModuleVariant::Np21, config, |descriptor| async move {
        assert_eq!(descriptor.variant, ModuleVariant::Np21);
        assert_eq!(descriptor.preload[0].name, "font2.bmp");
        assert_eq!(
            descriptor.preload[0].url,
            "https://host.example/res/font2.bmp"
        );
        Ok(MockModule::new(64))
    }))
    .unwrap();

    assert_eq!(
        inst.config()["fontfile"],
        ConfigValue::Str("font2.bmp".into())
    );
}

#[test]
fn create_keeps_an_explicit_fontfile_value() {
    let mut config = InstanceConfig::default();
    config
        .values
        .insert("fontfile".to_owned(), ConfigValue::Str("mine.bmp".into()));

    let inst = pollster::block_on(create(ModuleVariant::Np2, config, |_| async {
        Ok(MockModule::new(64))
    }))
    .unwrap();

    assert_eq!(inst.config()["fontfile"], ConfigValue::Str("mine.bmp".into()));
}

#[test]
fn factory_failure_rejects_the_whole_bootstrap() {
    let result = pollster::block_on(create(
        ModuleVariant::Np2,
        InstanceConfig::default(),
        |_| async { Err::<MockModule, _>(CreateError::Factory("wasm fetch failed".into())) },
    ));

    match result {
        Err(CreateError::Factory(msg)) => assert_eq!(msg, "wasm fetch failed"),
        Ok(_) => panic!("bootstrap must not produce a partial instance"),
    }
}
