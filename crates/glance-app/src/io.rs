use std::thread;

use glance_capture::{HotkeyError, HotkeyManager};
use glance_config::hotkey::HotkeyConfig;
use glance_types::HotkeyAction;
use kanal::AsyncSender;
use tokio::sync::oneshot;

/// Register the hotkeys on a dedicated thread and forward presses to `action_tx`
///
/// The returned receiver resolves once registration succeeded or failed. The
/// thread owns the hotkey manager and pumps its OS events for the rest of the
/// process.
pub fn spawn_hotkey_listener(
    config: HotkeyConfig,
    action_tx: AsyncSender<HotkeyAction>,
) -> oneshot::Receiver<Result<(), HotkeyError>> {
    let (ready_tx, ready_rx) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name("hotkeys".to_string())
        .spawn(move || {
            let manager = match HotkeyManager::register(&config.run, &config.panic) {
                Ok(manager) => {
                    #[cfg(target_os = "macos")]
                    tracing::warn!(
                        "macOS delivers hotkeys to the main thread's event loop only; \
                         presses may be missed"
                    );
                    let _ = ready_tx.send(Ok(()));
                    manager
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                let action = match manager.next_action() {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::error!("Hotkey listener stopped: {}", e);
                        break;
                    }
                };

                tracing::debug!("Hotkey action {:?}", action);
                if let Err(e) = action_tx.try_send(action) {
                    tracing::error!("Failed to forward hotkey action: {}", e);
                    break;
                }
                if action == HotkeyAction::Panic {
                    break;
                }
            }

            tracing::info!("Hotkey listener stopping");
        });

    if let Err(e) = spawned {
        tracing::error!("Failed to spawn hotkey thread: {}", e);
    }

    ready_rx
}
