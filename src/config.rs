use serde::Deserialize;

/// Defaults every application starts from.
const BUILTIN_SETTINGS: &str = r#"
debug: true
listen_addr: "127.0.0.1:8080"
"#;

/// Application settings.
///
/// Settings are plain YAML. Anything not given falls back to the built-in
/// defaults, so `Settings::from_yaml("debug: false")` keeps the default
/// listen address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Append a stack trace to 4xx/5xx status bodies.
    pub debug: bool,
    /// Address the bundled gateway binds to.
    pub listen_addr: String,
}

#[derive(Debug, Default, Deserialize)]
struct Overlay {
    debug: Option<bool>,
    listen_addr: Option<String>,
}

impl Settings {
    pub fn builtin() -> Self {
        Self::from_yaml("").unwrap_or(Self {
            debug: true,
            listen_addr: "127.0.0.1:8080".to_string(),
        })
    }

    /// Parses `yaml` over the built-in defaults.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let mut settings: Settings = serde_yaml::from_str(BUILTIN_SETTINGS)?;

        if yaml.trim().is_empty() {
            return Ok(settings);
        }

        let overlay: Overlay = serde_yaml::from_str(yaml)?;
        settings.merge(overlay);
        Ok(settings)
    }

    /// Built-in defaults with environment overrides.
    ///
    /// `TINYWEB_DEBUG` accepts `1/0`, `true/false`, `yes/no`, `on/off`;
    /// `LISTEN` replaces the listen address.
    pub fn load() -> Self {
        let mut settings = Self::builtin();

        let overlay = Overlay {
            debug: std::env::var("TINYWEB_DEBUG")
                .ok()
                .and_then(|v| parse_flag(&v)),
            listen_addr: std::env::var("LISTEN").ok(),
        };
        settings.merge(overlay);
        settings
    }

    fn merge(&mut self, overlay: Overlay) {
        if let Some(debug) = overlay.debug {
            self.debug = debug;
        }
        if let Some(addr) = overlay.listen_addr {
            self.listen_addr = addr;
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
