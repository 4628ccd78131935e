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

//! Reads key names from stdin, one or more per line. Useful on machines
//! without a global keyboard hook.
//!
//! `a` taps a key (down then up), `+shift` holds it and `-shift` releases it.

use std::io;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{info, span, warn, Level};

use super::{CaptureError, HandlerSlot, KeyEvent, KeyEventHandler};
use crate::samples::{VK_BACK, VK_RETURN, VK_SPACE};

const NAME: &str = "stdin";

/// Named keys beyond letters and digits.
const NAMED_KEYS: &[(&str, u8)] = &[
    ("backspace", VK_BACK),
    ("tab", 0x09),
    ("enter", VK_RETURN),
    ("return", VK_RETURN),
    ("shift", 0xA0),
    ("lshift", 0xA0),
    ("rshift", 0xA1),
    ("ctrl", 0xA2),
    ("lctrl", 0xA2),
    ("rctrl", 0xA3),
    ("alt", 0xA4),
    ("lalt", 0xA4),
    ("ralt", 0xA5),
    ("win", 0x5B),
    ("lwin", 0x5B),
    ("rwin", 0x5C),
    ("esc", 0x1B),
    ("space", VK_SPACE),
    ("left", 0x25),
    ("up", 0x26),
    ("right", 0x27),
    ("down", 0x28),
    ("delete", 0x2E),
];

/// Maps a key name to its virtual key code.
pub fn key_code(name: &str) -> Option<u8> {
    let name = name.to_lowercase();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            // Virtual key codes for letters and digits are their uppercase ASCII.
            return Some(c.to_ascii_uppercase() as u8);
        }
    }

    NAMED_KEYS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, code)| *code)
}

/// Parses one line into raw events.
pub fn parse_line(line: &str) -> Vec<KeyEvent> {
    let mut events = Vec::new();
    for token in line.split_whitespace() {
        let (name, hold, release) = match token.as_bytes()[0] {
            b'+' if token.len() > 1 => (&token[1..], true, false),
            b'-' if token.len() > 1 => (&token[1..], false, true),
            _ => (token, false, false),
        };

        let Some(code) = key_code(name) else {
            warn!(token, "Unrecognized key name");
            continue;
        };

        if !release {
            events.push(KeyEvent::down(code));
        }
        if !hold {
            events.push(KeyEvent::up(code));
        }
    }
    events
}

/// An adapter fed by stdin.
pub struct Adapter {
    handler: Arc<HandlerSlot>,
    reader: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Adapter {
    pub fn new() -> Adapter {
        Adapter {
            handler: Arc::new(HandlerSlot::new()),
            reader: Mutex::new(None),
        }
    }

    /// Reads one line and dispatches its events. Returns false at end of input.
    fn monitor_io<R>(handler: &HandlerSlot, mut reader: R) -> Result<bool, io::Error>
    where
        R: io::BufRead,
    {
        let mut input = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        for event in parse_line(&input) {
            handler.dispatch(event);
        }
        Ok(true)
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
        self.handler.set(handler);

        // Reading stdin can't be interrupted, so the reader thread is started
        // once and simply has nowhere to deliver events while uninstalled.
        let mut reader = self.reader.lock();
        if reader.is_none() {
            let slot = self.handler.clone();
            let thread = thread::Builder::new()
                .name("stdin keys".to_string())
                .spawn(move || {
                    let span = span!(Level::INFO, "stdin key capture");
                    let _enter = span.enter();

                    info!("Reading key names from stdin.");
                    loop {
                        match Self::monitor_io(&slot, io::stdin().lock()) {
                            Ok(true) => {}
                            Ok(false) => {
                                info!("End of stdin, no more key events.");
                                return;
                            }
                            Err(e) => {
                                warn!(err = %e, "Error reading stdin");
                                return;
                            }
                        }
                    }
                })
                .map_err(|e| CaptureError::InstallFailed(e.to_string()))?;
            *reader = Some(thread);
        }

        Ok(())
    }

    fn uninstall(&self) {
        self.handler.clear();
    }
}
