use std::sync::mpsc::Sender;

use lucent_core::Error;
use lucent_core::hotkey::{Chord, HotkeyCommand, Modifier};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, MOD_WIN, RegisterHotKey,
    UnregisterHotKey,
};

use crate::keys;

/// Owns the global hotkey registrations of the hook thread.
///
/// `RegisterHotKey` binds to the calling thread's message queue, so this
/// must be created and dropped on the thread that runs the message pump.
pub struct HotkeyManager {
    registered: Vec<(i32, HotkeyCommand)>,
    sender: Sender<HotkeyCommand>,
}

impl HotkeyManager {
    pub fn new(sender: Sender<HotkeyCommand>) -> Self {
        Self {
            registered: Vec::new(),
            sender,
        }
    }

    /// Registers every binding. Failures are logged and the binding stays
    /// inert; the rest still register.
    pub fn register_all(&mut self, bindings: &[(Chord, HotkeyCommand)]) {
        for (chord, command) in bindings {
            let id = self.registered.len() as i32 + 1;
            match register(id, chord) {
                Ok(()) => self.registered.push((id, *command)),
                Err(e) => log::warn!("{e}"),
            }
        }
        log::info!("Registered {} of {} hotkeys", self.registered.len(), bindings.len());
    }

    /// Forwards the command bound to a `WM_HOTKEY` id.
    pub fn dispatch(&self, id: i32) {
        if let Some((_, command)) = self.registered.iter().find(|(i, _)| *i == id) {
            let _ = self.sender.send(*command);
        }
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        for (id, _) in &self.registered {
            // SAFETY: the id was registered on this thread.
            unsafe {
                let _ = UnregisterHotKey(None, *id);
            }
        }
    }
}

fn register(id: i32, chord: &Chord) -> lucent_core::Result<()> {
    let vk = keys::vk_from_name(&chord.key).ok_or_else(|| Error::Hotkey {
        chord: chord.to_string(),
        reason: format!("unknown key {:?}", chord.key),
    })?;

    let modifiers = chord
        .modifiers
        .iter()
        .fold(MOD_NOREPEAT, |flags, m| flags | modifier_flag(*m));

    // SAFETY: registers a system-wide hotkey on this thread's queue under
    // an id unique within this manager.
    unsafe { RegisterHotKey(None, id, modifiers, vk) }.map_err(|e| Error::Hotkey {
        chord: chord.to_string(),
        reason: format!("registration failed ({e}); already taken by another program?"),
    })
}

fn modifier_flag(modifier: Modifier) -> HOT_KEY_MODIFIERS {
    match modifier {
        Modifier::Ctrl => MOD_CONTROL,
        Modifier::Alt => MOD_ALT,
        Modifier::Shift => MOD_SHIFT,
        Modifier::Win => MOD_WIN,
    }
}
