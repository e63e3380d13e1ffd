use std::time::Duration;

use glance_types::HotkeyAction;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};

/// How long one wait on the event channel lasts before OS messages are pumped again
const PUMP_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("failed to create hotkey manager: {0}")]
    Manager(String),

    #[error("invalid hotkey {combo:?}: {reason}")]
    Parse { combo: String, reason: String },

    #[error("run and panic hotkeys are the same combination ({0})")]
    Duplicate(String),

    #[error("failed to register hotkey {combo:?}: {reason}")]
    Register { combo: String, reason: String },

    #[error("hotkey event channel closed: {0}")]
    Channel(String),
}

pub fn parse_hotkey(combo: &str) -> Result<HotKey, HotkeyError> {
    combo.parse::<HotKey>().map_err(|e| HotkeyError::Parse {
        combo: combo.to_string(),
        reason: e.to_string(),
    })
}

/// Hotkey ids mapped to the actions they trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub run: u32,
    pub panic: u32,
}

impl HotkeyBindings {
    pub fn action_for(&self, id: u32) -> Option<HotkeyAction> {
        if id == self.run {
            Some(HotkeyAction::Run)
        } else if id == self.panic {
            Some(HotkeyAction::Panic)
        } else {
            None
        }
    }
}

/// Owns the two process-wide hotkeys: "run" and "panic"
///
/// Must be created and polled on the same thread. On Windows that thread
/// receives `WM_HOTKEY`, which [`HotkeyManager::next_action`] dispatches.
/// On macOS events are only delivered while the main thread runs an
/// application event loop.
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    run: HotKey,
    panic: HotKey,
}

impl HotkeyManager {
    /// Parse and register both combinations; either failing is an error
    pub fn register(run_combo: &str, panic_combo: &str) -> Result<Self, HotkeyError> {
        let run = parse_hotkey(run_combo)?;
        let panic = parse_hotkey(panic_combo)?;
        if run.id() == panic.id() {
            return Err(HotkeyError::Duplicate(run_combo.to_string()));
        }

        let manager =
            GlobalHotKeyManager::new().map_err(|e| HotkeyError::Manager(e.to_string()))?;

        manager.register(run).map_err(|e| HotkeyError::Register {
            combo: run_combo.to_string(),
            reason: e.to_string(),
        })?;

        if let Err(e) = manager.register(panic) {
            let _ = manager.unregister(run);
            return Err(HotkeyError::Register {
                combo: panic_combo.to_string(),
                reason: e.to_string(),
            });
        }

        tracing::info!("Registered hotkeys: run={}, panic={}", run_combo, panic_combo);

        Ok(Self {
            manager,
            run,
            panic,
        })
    }

    pub fn bindings(&self) -> HotkeyBindings {
        HotkeyBindings {
            run: self.run.id(),
            panic: self.panic.id(),
        }
    }

    /// Block until one of our hotkeys is pressed, pumping OS messages meanwhile
    pub fn next_action(&self) -> Result<HotkeyAction, HotkeyError> {
        let receiver = GlobalHotKeyEvent::receiver();
        wait_for_action(self.bindings(), || {
            pump_os_messages();
            match receiver.recv_timeout(PUMP_INTERVAL) {
                Ok(event) => Ok(Some(event)),
                Err(e) if e.is_timeout() => Ok(None),
                Err(e) => Err(HotkeyError::Channel(e.to_string())),
            }
        })
    }
}

/// Poll until an event maps to an action; `poll` yields `None` when nothing arrived yet
fn wait_for_action<F>(bindings: HotkeyBindings, mut poll: F) -> Result<HotkeyAction, HotkeyError>
where
    F: FnMut() -> Result<Option<GlobalHotKeyEvent>, HotkeyError>,
{
    loop {
        let Some(event) = poll()? else {
            continue;
        };

        if event.state != HotKeyState::Pressed {
            continue;
        }

        match bindings.action_for(event.id) {
            Some(action) => return Ok(action),
            None => tracing::debug!("Ignoring unknown hotkey id {}", event.id),
        }
    }
}

/// Dispatch pending messages so the hidden hotkey window sees `WM_HOTKEY`
#[cfg(windows)]
fn pump_os_messages() {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
    };

    unsafe {
        let mut msg = MSG::default();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            let _ = DispatchMessageW(&msg);
        }
    }
}

#[cfg(not(windows))]
fn pump_os_messages() {}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        let _ = self.manager.unregister(self.run);
        let _ = self.manager.unregister(self.panic);
    }
}
