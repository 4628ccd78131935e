// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! System-wide key capture through `rdev`.
//!
//! `rdev::listen` only observes events, it never swallows them, and it can't
//! be stopped once running. The listener thread is therefore started on the
//! first install and kept for the life of the process; uninstalling just
//! empties the handler slot.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rdev::{EventType, Key};
use tracing::{error, info, span, Level};

use super::{CaptureError, HandlerSlot, KeyEvent, KeyEventHandler};
use crate::samples::{VK_BACK, VK_RETURN, VK_SPACE};

const NAME: &str = "rdev";

/// How long install waits for the hook to report an early failure.
const INSTALL_GRACE: Duration = Duration::from_millis(250);

/// Code used for keys with no virtual key equivalent.
const VK_UNKNOWN: u8 = 0xFF;

pub struct Adapter {
    handler: Arc<HandlerSlot>,
    listener: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Adapter {
    pub fn new() -> Adapter {
        Adapter {
            handler: Arc::new(HandlerSlot::new()),
            listener: Mutex::new(None),
        }
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl super::InputCaptureAdapter for Adapter {
    fn name(&self) -> &str {
        NAME
    }

    fn install(&self, handler: KeyEventHandler) -> Result<(), CaptureError> {
        let mut listener = self.listener.lock();
        if listener.as_ref().is_some_and(|thread| thread.is_finished()) {
            // A previous hook died after install, try again.
            *listener = None;
        }

        self.handler.set(handler);
        if listener.is_some() {
            return Ok(());
        }

        let (failed_tx, failed_rx) = crossbeam_channel::bounded::<String>(1);
        let slot = self.handler.clone();
        let thread = thread::Builder::new()
            .name("rdev keys".to_string())
            .spawn(move || {
                let span = span!(Level::INFO, "rdev key capture");
                let _enter = span.enter();

                let result = rdev::listen(move |event| {
                    if let Some(event) = translate(&event.event_type) {
                        slot.dispatch(event);
                    }
                });
                if let Err(e) = result {
                    let reason = format!("{:?}", e);
                    error!(err = reason, "Keyboard hook failed");
                    let _ = failed_tx.send(reason);
                }
            })
            .map_err(|e| CaptureError::InstallFailed(e.to_string()))?;

        match failed_rx.recv_timeout(INSTALL_GRACE) {
            Ok(reason) => {
                self.handler.clear();
                let _ = thread.join();
                Err(CaptureError::InstallFailed(reason))
            }
            Err(_) => {
                info!("Installed global keyboard hook");
                *listener = Some(thread);
                Ok(())
            }
        }
    }

    fn uninstall(&self) {
        self.handler.clear();
    }
}

fn translate(event_type: &EventType) -> Option<KeyEvent> {
    match event_type {
        EventType::KeyPress(key) => Some(KeyEvent::down(virtual_key(key))),
        EventType::KeyRelease(key) => Some(KeyEvent::up(virtual_key(key))),
        _ => None,
    }
}

/// Maps an rdev key to a Windows-style virtual key code.
fn virtual_key(key: &Key) -> u8 {
    match key {
        Key::Backspace => VK_BACK,
        Key::Tab => 0x09,
        Key::Return | Key::KpReturn => VK_RETURN,
        Key::Pause => 0x13,
        Key::CapsLock => 0x14,
        Key::Escape => 0x1B,
        Key::Space => VK_SPACE,
        Key::PageUp => 0x21,
        Key::PageDown => 0x22,
        Key::End => 0x23,
        Key::Home => 0x24,
        Key::LeftArrow => 0x25,
        Key::UpArrow => 0x26,
        Key::RightArrow => 0x27,
        Key::DownArrow => 0x28,
        Key::PrintScreen => 0x2C,
        Key::Insert => 0x2D,
        Key::Delete | Key::KpDelete => 0x2E,
        Key::Num0 | Key::Kp0 => 0x30,
        Key::Num1 | Key::Kp1 => 0x31,
        Key::Num2 | Key::Kp2 => 0x32,
        Key::Num3 | Key::Kp3 => 0x33,
        Key::Num4 | Key::Kp4 => 0x34,
        Key::Num5 | Key::Kp5 => 0x35,
        Key::Num6 | Key::Kp6 => 0x36,
        Key::Num7 | Key::Kp7 => 0x37,
        Key::Num8 | Key::Kp8 => 0x38,
        Key::Num9 | Key::Kp9 => 0x39,
        Key::KeyA => 0x41,
        Key::KeyB => 0x42,
        Key::KeyC => 0x43,
        Key::KeyD => 0x44,
        Key::KeyE => 0x45,
        Key::KeyF => 0x46,
        Key::KeyG => 0x47,
        Key::KeyH => 0x48,
        Key::KeyI => 0x49,
        Key::KeyJ => 0x4A,
        Key::KeyK => 0x4B,
        Key::KeyL => 0x4C,
        Key::KeyM => 0x4D,
        Key::KeyN => 0x4E,
        Key::KeyO => 0x4F,
        Key::KeyP => 0x50,
        Key::KeyQ => 0x51,
        Key::KeyR => 0x52,
        Key::KeyS => 0x53,
        Key::KeyT => 0x54,
        Key::KeyU => 0x55,
        Key::KeyV => 0x56,
        Key::KeyW => 0x57,
        Key::KeyX => 0x58,
        Key::KeyY => 0x59,
        Key::KeyZ => 0x5A,
        Key::MetaLeft => 0x5B,
        Key::MetaRight => 0x5C,
        Key::KpMultiply => 0x6A,
        Key::KpPlus => 0x6B,
        Key::KpMinus => 0x6D,
        Key::KpDivide => 0x6F,
        Key::F1 => 0x70,
        Key::F2 => 0x71,
        Key::F3 => 0x72,
        Key::F4 => 0x73,
        Key::F5 => 0x74,
        Key::F6 => 0x75,
        Key::F7 => 0x76,
        Key::F8 => 0x77,
        Key::F9 => 0x78,
        Key::F10 => 0x79,
        Key::F11 => 0x7A,
        Key::F12 => 0x7B,
        Key::NumLock => 0x90,
        Key::ScrollLock => 0x91,
        Key::ShiftLeft => 0xA0,
        Key::ShiftRight => 0xA1,
        Key::ControlLeft => 0xA2,
        Key::ControlRight => 0xA3,
        Key::Alt => 0xA4,
        Key::AltGr => 0xA5,
        Key::SemiColon => 0xBA,
        Key::Equal => 0xBB,
        Key::Comma => 0xBC,
        Key::Minus => 0xBD,
        Key::Dot => 0xBE,
        Key::Slash => 0xBF,
        Key::BackQuote => 0xC0,
        Key::LeftBracket => 0xDB,
        Key::BackSlash | Key::IntlBackslash => 0xDC,
        Key::RightBracket => 0xDD,
        Key::Quote => 0xDE,
        _ => VK_UNKNOWN,
    }
}
