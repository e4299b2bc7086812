use once_cell::sync::OnceCell;

/// Process-wide CLI configuration, set once at startup.
#[derive(Debug, Default)]
pub struct GlobalConfig {
    pub verbose: bool,
}

static CONFIG: OnceCell<GlobalConfig> = OnceCell::new();

pub fn init_global_config(config: GlobalConfig) {
    // Repeated init keeps the first value; tests may race here harmlessly.
    let _ = CONFIG.set(config);
}

pub fn global_config() -> &'static GlobalConfig {
    CONFIG.get_or_init(GlobalConfig::default)
}
