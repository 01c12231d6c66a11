use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use lucent_core::hotkey::HotkeyDispatcher;
use lucent_core::store::DataDir;
use lucent_core::window::WindowApi;
use lucent_core::{LinkedDragCoordinator, Result, Session, config, logging};

use crate::api::Win32WindowApi;
use crate::event_loop::{self, HookSetup};
use crate::theme;

use super::daemon_loop_handlers;
use super::daemon_threads;
use super::daemon_types::{DaemonMsg, Flow};

/// The inner daemon loop, separated so cleanup always runs in `run()`.
pub(super) fn daemon_loop() -> Result<()> {
    let settings = config::load();
    logging::init(&settings.logging);

    log::info!("Daemon started (PID: {})", std::process::id());
    log::info!(
        "Config: theme={:?}, bulk_opacity={}%, poll={}ms, linked_drag(debounce={}ms, suppress={}ms), log_level={}",
        theme::resolve(settings.theme),
        settings.bulk_opacity,
        settings.poll_interval_ms,
        settings.linked_drag.debounce_ms,
        settings.linked_drag.suppress_ms,
        settings.logging.level
    );

    let api: Arc<dyn WindowApi> = Arc::new(Win32WindowApi);
    let mut session = Session::new(Arc::clone(&api), settings.clone(), DataDir::default());
    if let Err(e) = session.refresh() {
        log::warn!("Initial window scan failed: {e}");
    }
    log::info!("Tracking {} windows", session.registry().len());

    let (tx, rx) = mpsc::channel::<DaemonMsg>();

    let (moved_tx, moved_rx) = mpsc::channel();
    let coordinator = Arc::new(LinkedDragCoordinator::new(
        Arc::clone(&api),
        settings.linked_drag.clone(),
        Some(moved_tx),
    ));
    coordinator.set_topology(session.link_topology());

    let bindings = if settings.hotkeys_enabled {
        let (dispatcher, rejected) = HotkeyDispatcher::new(&settings.hotkeys);
        for e in rejected {
            log::warn!("Skipping {e}");
        }
        dispatcher.bindings().to_vec()
    } else {
        Vec::new()
    };

    // Start the hooks + hotkeys on their own thread.
    let (hotkey_tx, hotkey_rx) = mpsc::channel();
    let (wheel_tx, wheel_rx) = mpsc::channel();
    let event_loop = event_loop::start(HookSetup {
        coordinator: Arc::clone(&coordinator),
        bindings,
        hotkey_tx,
        wheel: settings
            .wheel
            .enabled
            .then(|| (settings.wheel.clone(), wheel_tx)),
    })?;

    let bridges = [
        daemon_threads::spawn_bridge("hotkey-bridge", hotkey_rx, tx.clone(), DaemonMsg::Hotkey),
        daemon_threads::spawn_bridge("wheel-bridge", wheel_rx, tx.clone(), DaemonMsg::Wheel),
        daemon_threads::spawn_bridge("linked-move-bridge", moved_rx, tx.clone(), DaemonMsg::LinkedMoved),
    ];
    let ipc_thread = daemon_threads::spawn_ipc_listener(tx.clone());
    let (poll_stop, poll_stop_rx) = mpsc::channel::<()>();
    let poll_thread = daemon_threads::spawn_poll_thread(
        Arc::clone(&api),
        Duration::from_millis(settings.poll_interval_ms),
        tx.clone(),
        poll_stop_rx,
    );

    // Main processing loop: blocks until a message arrives.
    while let Ok(msg) = rx.recv() {
        let handled = panic::catch_unwind(AssertUnwindSafe(|| {
            daemon_loop_handlers::handle(msg, &mut session, &coordinator, &tx)
        }));
        match handled {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => break,
            Err(_) => log::error!("Message handler panicked; continuing"),
        }
    }

    log::info!("Shutting down");
    session.save_all();
    event_loop.stop();
    drop(poll_stop);
    drop(coordinator);
    drop(tx);
    for handle in bridges.into_iter().flatten() {
        let _ = handle.join();
    }
    if let Some(handle) = poll_thread {
        let _ = handle.join();
    }
    if let Some(handle) = ipc_thread {
        let _ = handle.join();
    }

    Ok(())
}
