use serde::Serialize;

use crate::Lookup;

fn default_app_name() -> String {
    "Glance".to_string()
}

#[derive(Debug, Serialize, Clone)]
pub struct NotifyConfig {
    pub app_name: String,
    /// `SHOW_POPUP` is read and reported at startup but has no effect
    pub show_popup: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            show_popup: None,
        }
    }
}

impl NotifyConfig {
    pub(crate) fn from_lookup(env: &Lookup<'_>) -> Self {
        Self {
            show_popup: env.get("SHOW_POPUP"),
            ..Self::default()
        }
    }
}
