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
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::info;

use super::{CaptureError, HandlerSlot, KeyEvent, KeyEventHandler};

/// A mock adapter. Never touches the OS; events are injected by calling
/// [`Adapter::press`] and friends.
pub struct Adapter {
    name: String,
    handler: HandlerSlot,
    fail_install: AtomicBool,
    installs: AtomicUsize,
    uninstalls: AtomicUsize,
}

impl Adapter {
    pub fn new(name: &str) -> Adapter {
        Adapter {
            name: name.to_string(),
            handler: HandlerSlot::new(),
            fail_install: AtomicBool::new(false),
            installs: AtomicUsize::new(0),
            uninstalls: AtomicUsize::new(0),
        }
    }

    /// Delivers a raw event. Returns false if nothing is installed.
    pub fn send(&self, event: KeyEvent) -> bool {
        self.handler.dispatch(event)
    }

    pub fn press(&self, code: u8) -> bool {
        self.send(KeyEvent::down(code))
    }

    /// An auto-repeat while the key is held looks exactly like another press.
    pub fn repeat(&self, code: u8) -> bool {
        self.send(KeyEvent::down(code))
    }

    pub fn release(&self, code: u8) -> bool {
        self.send(KeyEvent::up(code))
    }

    /// Makes the next installs fail, as if the OS refused the hook.
    pub fn fail_install(&self, fail: bool) {
        self.fail_install.store(fail, Ordering::Relaxed);
    }

    pub fn is_installed(&self) -> bool {
        self.handler.is_set()
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::Relaxed)
    }

    pub fn uninstalls(&self) -> usize {
        self.uninstalls.load(Ordering::Relaxed)
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mock)", self.name)
    }
}

impl super::InputCaptureAdapter for Adapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, handler: KeyEventHandler) -> Result<(), CaptureError> {
        if self.fail_install.load(Ordering::Relaxed) {
            return Err(CaptureError::InstallFailed(format!(
                "{} refused the hook",
                self.name
            )));
        }

        self.handler.set(handler);
        self.installs.fetch_add(1, Ordering::Relaxed);
        info!(adapter = self.name, "Installed mock key capture");
        Ok(())
    }

    fn uninstall(&self) {
        self.handler.clear();
        self.uninstalls.fetch_add(1, Ordering::Relaxed);
    }
}
