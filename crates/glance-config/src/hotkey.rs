use serde::Serialize;

use crate::{ConfigError, Lookup};

fn default_run() -> String {
    "ctrl+alt+g".to_string()
}

fn default_panic() -> String {
    "F10".to_string()
}

/// Global key combinations, in `global-hotkey` syntax (e.g. `ctrl+alt+g`, `F10`)
#[derive(Debug, Serialize, Clone)]
pub struct HotkeyConfig {
    pub run: String,
    pub panic: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            run: default_run(),
            panic: default_panic(),
        }
    }
}

impl HotkeyConfig {
    pub(crate) fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            run: env.get("RUN_HOTKEY").unwrap_or_else(default_run),
            panic: env.get("PANIC_HOTKEY").unwrap_or_else(default_panic),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.eq_ignore_ascii_case(&self.panic) {
            return Err(ConfigError::Invalid {
                key: "PANIC_HOTKEY",
                value: self.panic.clone(),
                reason: "must differ from RUN_HOTKEY".to_string(),
            });
        }
        Ok(())
    }
}
