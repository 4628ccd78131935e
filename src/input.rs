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

//! Keyboard capture.
//!
//! An [`InputCaptureAdapter`] hooks some source of raw key events (the OS,
//! stdin, a test) and forwards every event to a handler. [`InputCapture`]
//! sits on top of it, tracks which keys are held and reports a key as struck
//! only on its first down event.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::samples::KEY_CODE_COUNT;

mod error;
pub mod mock;
#[cfg(feature = "global-hook")]
pub mod rdev;
pub mod stdin;

pub use error::CaptureError;

/// Down or up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEventKind {
    Down,
    Up,
}

/// A raw key transition as reported by an adapter. Auto-repeat shows up as
/// repeated `Down` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u8,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    pub fn down(code: u8) -> KeyEvent {
        KeyEvent {
            code,
            kind: KeyEventKind::Down,
        }
    }

    pub fn up(code: u8) -> KeyEvent {
        KeyEvent {
            code,
            kind: KeyEventKind::Up,
        }
    }
}

/// Receives every raw event while an adapter is installed.
pub type KeyEventHandler = Arc<dyn Fn(KeyEvent) + Send + Sync>;

/// Receives the code of every struck key.
pub type KeyStruckHandler = Arc<dyn Fn(u8) + Send + Sync>;

/// A source of raw key events.
///
/// Adapters only observe: events are always left for the next handler in the
/// platform's chain, whatever the handler does.
pub trait InputCaptureAdapter: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// Starts forwarding events to `handler`, replacing any previous handler.
    fn install(&self, handler: KeyEventHandler) -> Result<(), CaptureError>;

    /// Stops forwarding events. No handler call starts after this returns,
    /// though one already under way may still be running.
    fn uninstall(&self);
}

/// Creates the adapter with the given name: "rdev", "stdin" or anything
/// starting with "mock".
pub fn create_adapter(name: &str) -> Result<Arc<dyn InputCaptureAdapter>, CaptureError> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Adapter::new(name)));
    }

    match name {
        "stdin" => Ok(Arc::new(stdin::Adapter::new())),
        #[cfg(feature = "global-hook")]
        "rdev" => Ok(Arc::new(rdev::Adapter::new())),
        _ => Err(CaptureError::Unavailable(name.to_string())),
    }
}

/// A lock-free slot holding the installed handler, shared by the adapters.
pub(crate) struct HandlerSlot {
    handler: ArcSwapOption<KeyEventHandler>,
}

impl HandlerSlot {
    pub(crate) fn new() -> HandlerSlot {
        HandlerSlot {
            handler: ArcSwapOption::empty(),
        }
    }

    pub(crate) fn set(&self, handler: KeyEventHandler) {
        self.handler.store(Some(Arc::new(handler)));
    }

    pub(crate) fn clear(&self) {
        self.handler.store(None);
    }

    pub(crate) fn is_set(&self) -> bool {
        self.handler.load().is_some()
    }

    /// Calls the handler, if any. Returns whether one was installed.
    pub(crate) fn dispatch(&self, event: KeyEvent) -> bool {
        let handler = self.handler.load();
        match &*handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }
}

/// The set of keys currently held down, indexed by key code.
pub struct KeyStateSet {
    keys: [AtomicBool; KEY_CODE_COUNT],
}

impl KeyStateSet {
    pub fn new() -> KeyStateSet {
        KeyStateSet {
            keys: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    /// Marks the key as held. Returns true only if it was not held before.
    pub fn press(&self, code: u8) -> bool {
        !self.keys[code as usize].swap(true, Ordering::AcqRel)
    }

    pub fn release(&self, code: u8) {
        self.keys[code as usize].store(false, Ordering::Release);
    }

    pub fn is_down(&self, code: u8) -> bool {
        self.keys[code as usize].load(Ordering::Acquire)
    }

    /// Releases every key.
    pub fn clear(&self) {
        for key in self.keys.iter() {
            key.store(false, Ordering::Release);
        }
    }

    /// Number of keys currently held.
    pub fn held(&self) -> usize {
        self.keys
            .iter()
            .filter(|key| key.load(Ordering::Acquire))
            .count()
    }
}

impl Default for KeyStateSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyStateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held: Vec<usize> = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.load(Ordering::Acquire))
            .map(|(code, _)| code)
            .collect();
        f.debug_struct("KeyStateSet").field("held", &held).finish()
    }
}

/// Applies one raw event to the key set. Returns the code if the key was
/// struck.
fn process_event(keys: &KeyStateSet, event: KeyEvent) -> Option<u8> {
    match event.kind {
        KeyEventKind::Down => keys.press(event.code).then_some(event.code),
        KeyEventKind::Up => {
            keys.release(event.code);
            None
        }
    }
}

/// Turns raw key events into "key struck" signals, suppressing auto-repeat.
pub struct InputCapture {
    adapter: Arc<dyn InputCaptureAdapter>,
    keys: Arc<KeyStateSet>,
    on_key_struck: KeyStruckHandler,
    /// Checked by the handler so that events racing a disable are dropped.
    running: Arc<AtomicBool>,
    /// Handler calls currently past their entry point.
    in_flight: Arc<AtomicUsize>,
    /// Serializes enable and disable.
    transition: Mutex<()>,
}

impl InputCapture {
    pub fn new(adapter: Arc<dyn InputCaptureAdapter>, on_key_struck: KeyStruckHandler) -> Self {
        InputCapture {
            adapter,
            keys: Arc::new(KeyStateSet::new()),
            on_key_struck,
            running: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            transition: Mutex::new(()),
        }
    }

    /// Installs the adapter. Does nothing if already running.
    pub fn enable(&self) -> Result<(), CaptureError> {
        let _transition = self.transition.lock();
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);
        if let Err(e) = self.adapter.install(self.handler()) {
            self.running.store(false, Ordering::SeqCst);
            error!(adapter = self.adapter.name(), err = %e, "Unable to install key capture");
            return Err(e);
        }

        info!(adapter = self.adapter.name(), "Key capture started");
        Ok(())
    }

    /// Uninstalls the adapter and forgets every held key. Does nothing if
    /// already stopped.
    ///
    /// Waits for handler calls already under way to finish, so it must not be
    /// called from the key struck callback.
    pub fn disable(&self) {
        let _transition = self.transition.lock();
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.adapter.uninstall();
        // A call that saw `running` set is counted here, so once this drains
        // nothing can press a key after the clear below.
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            thread::yield_now();
        }
        self.keys.clear();
        info!(adapter = self.adapter.name(), "Key capture stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn key_state(&self) -> &KeyStateSet {
        &self.keys
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    fn handler(&self) -> KeyEventHandler {
        let keys = self.keys.clone();
        let on_key_struck = self.on_key_struck.clone();
        let running = self.running.clone();
        let in_flight = self.in_flight.clone();

        Arc::new(move |event: KeyEvent| {
            // Counted before `running` is checked; disable relies on the order.
            in_flight.fetch_add(1, Ordering::SeqCst);
            if running.load(Ordering::SeqCst) {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    if let Some(code) = process_event(&keys, event) {
                        on_key_struck(code);
                    }
                }));
                if result.is_err() {
                    error!(code = event.code, kind = ?event.kind, "Key handler panicked");
                }
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        self.disable();
    }
}

impl fmt::Debug for InputCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputCapture")
            .field("adapter", &self.adapter.name())
            .field("running", &self.is_running())
            .field("keys", &self.keys)
            .finish()
    }
}
