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
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{error, info, span, warn, Level, Span};

use crate::audio::{AudioMixer, BufferError, Output, SampleBuffer};
use crate::input::{CaptureError, InputCapture, InputCaptureAdapter};
use crate::pack::PackInfo;
use crate::samples::{LoadError, PackLoader, SoundBank, Voice};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("unable to preview sound: {0}")]
    Preview(#[from] BufferError),

    #[error("the engine has been disposed")]
    Disposed,
}

/// State changes published to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Key capture was switched on or off.
    EnabledChanged(bool),

    /// The master volume changed. Carries the clamped value.
    VolumeChanged(f32),

    /// A pack was loaded and is now playing.
    PackLoaded { directory: PathBuf, variants: usize },

    /// A pack failed to load. The previous pack, if any, is still active.
    PackFailed { directory: PathBuf, reason: String },
}

/// Plays a click for every struck key.
///
/// Owns the key capture, the mixer and the current sound bank. Shareable
/// across threads; every operation takes `&self`.
pub struct SoundEngine {
    /// Key capture, wired to inject into the mixer.
    capture: InputCapture,
    /// The mixer all voices are injected into.
    mixer: AudioMixer,
    /// The device pulling from the mixer, if any.
    output: Mutex<Option<Box<dyn Output>>>,
    /// The active sound bank. Replaced, never edited.
    bank: Arc<ArcSwapOption<SoundBank>>,
    /// Builds new banks.
    loader: PackLoader,
    /// Incremented by every load; only the newest load may publish.
    generation: AtomicU64,
    /// The directory of the active bank. Also serializes publication.
    current_pack: Mutex<Option<PathBuf>>,
    /// Serializes enable, disable and reload.
    state: Mutex<()>,
    /// Whether the user wants sounds on.
    enabled: AtomicBool,
    disposed: AtomicBool,
    subscribers: Mutex<Vec<Sender<EngineEvent>>>,
    /// The logging span.
    span: Span,
}

impl SoundEngine {
    /// Creates a disabled engine with no pack loaded. `output` is the device
    /// already pulling from `mixer`; without one the mixer has to be rendered
    /// by the caller.
    pub fn new(
        adapter: Arc<dyn InputCaptureAdapter>,
        mixer: AudioMixer,
        output: Option<Box<dyn Output>>,
    ) -> SoundEngine {
        let bank: Arc<ArcSwapOption<SoundBank>> = Arc::new(ArcSwapOption::empty());

        let on_key_struck = {
            let bank = bank.clone();
            let mixer = mixer.clone();
            Arc::new(move |code: u8| {
                let bank = bank.load();
                if let Some(bank) = &*bank {
                    mixer.inject(bank.get(code), &mut rand::thread_rng());
                }
            })
        };

        SoundEngine {
            capture: InputCapture::new(adapter, on_key_struck),
            loader: PackLoader::new(mixer.sample_rate()),
            mixer,
            output: Mutex::new(output),
            bank,
            generation: AtomicU64::new(0),
            current_pack: Mutex::new(None),
            state: Mutex::new(()),
            enabled: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
            span: span!(Level::INFO, "sound engine"),
        }
    }

    /// Replaces the pack loader, e.g. to change the number of pitch variants.
    pub fn with_loader(mut self, loader: PackLoader) -> SoundEngine {
        self.loader = loader;
        self
    }

    /// Returns a channel that receives every state change from now on.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        if !self.is_disposed() {
            self.subscribers.lock().push(tx);
        }
        rx
    }

    /// Turns key capture on or off. Does nothing if already in that state. If
    /// the capture can't be installed the engine stays disabled.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        let _enter = self.span.enter();
        self.ensure_live()?;

        let _state = self.state.lock();
        if enabled {
            self.capture.enable()?;
        } else {
            self.capture.disable();
        }

        if self.enabled.swap(enabled, Ordering::AcqRel) != enabled {
            info!(enabled, "Key sounds toggled");
            self.emit(EngineEvent::EnabledChanged(enabled));
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sets the master volume, clamped to [0, 2]. Returns the applied value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let previous = self.mixer.volume();
        let applied = self.mixer.set_volume(volume);
        if applied != previous {
            self.emit(EngineEvent::VolumeChanged(applied));
        }
        applied
    }

    pub fn volume(&self) -> f32 {
        self.mixer.volume()
    }

    /// Loads the pack in `directory` and makes it active. On failure the
    /// previous pack stays active. If a newer load starts before this one
    /// finishes, this one's result is thrown away.
    pub fn load_pack(&self, directory: &Path, wants_variants: bool) -> Result<(), EngineError> {
        let _enter = self.span.enter();
        self.ensure_live()?;

        let generation = self.next_generation();
        let bank = match self.loader.load(directory, wants_variants) {
            Ok(bank) => bank,
            Err(e) => {
                error!(path = ?directory, err = %e, "Sound pack failed to load");
                self.emit(EngineEvent::PackFailed {
                    directory: directory.to_path_buf(),
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.publish(generation, directory, bank)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Makes `bank` active unless a load newer than `generation` has started.
    fn publish(
        &self,
        generation: u64,
        directory: &Path,
        bank: SoundBank,
    ) -> Result<(), EngineError> {
        let mut current_pack = self.current_pack.lock();
        if self.generation.load(Ordering::Acquire) != generation || self.is_disposed() {
            warn!(path = ?directory, "Discarding superseded sound pack");
            return Err(LoadError::Superseded(directory.to_path_buf()).into());
        }

        let variants = bank.standard().len();
        self.bank.store(Some(Arc::new(bank)));
        *current_pack = Some(directory.to_path_buf());
        drop(current_pack);

        self.emit(EngineEvent::PackLoaded {
            directory: directory.to_path_buf(),
            variants,
        });
        Ok(())
    }

    /// Loads a discovered pack, honoring its pitch variant setting.
    pub fn load_pack_info(&self, pack: &PackInfo) -> Result<(), EngineError> {
        info!(pack = pack.display_name(), "Loading sound pack");
        self.load_pack(pack.directory(), pack.has_pitch_variants())
    }

    /// Stops capture, loads the pack in `directory` and restarts capture if
    /// it was running, so no key is ever handled against a half-built bank.
    pub fn reload(&self, directory: &Path) -> Result<(), EngineError> {
        self.ensure_live()?;
        let pack = PackInfo::load_or_default(directory);

        let _state = self.state.lock();
        let was_enabled = self.is_enabled();
        if was_enabled {
            self.capture.disable();
        }

        let result = self.load_pack(pack.directory(), pack.has_pitch_variants());

        if was_enabled {
            if let Err(e) = self.capture.enable() {
                self.enabled.store(false, Ordering::Release);
                self.emit(EngineEvent::EnabledChanged(false));
                return Err(e.into());
            }
        }
        result
    }

    /// Plays one file through the mixer whether or not capture is running.
    /// Leaves the bank and key state alone. Returns how long the sound plays.
    pub fn preview_one_shot(&self, path: &Path) -> Result<Duration, EngineError> {
        let _enter = self.span.enter();
        self.ensure_live()?;

        let buffer = SampleBuffer::load_canonical(path, self.mixer.sample_rate())?;
        let duration = buffer.duration();
        if !self.mixer.play(Voice::new(Arc::new(buffer))) {
            warn!(path = ?path, "Mixer busy, preview dropped");
        }
        info!(path = ?path, duration = ?duration, "Previewing sound");
        Ok(duration)
    }

    /// Stops capture, releases the output device and drops the bank. Safe to
    /// call more than once.
    pub fn dispose(&self) {
        let _enter = self.span.enter();
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            let _state = self.state.lock();
            self.capture.disable();
            if self.enabled.swap(false, Ordering::AcqRel) {
                self.emit(EngineEvent::EnabledChanged(false));
            }
        }

        if let Some(mut output) = self.output.lock().take() {
            info!(device = output.name(), "Releasing audio output");
            output.stop();
        }
        self.mixer.clear();
        self.bank.store(None);
        *self.current_pack.lock() = None;
        self.subscribers.lock().clear();
        info!("Sound engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// The directory of the active pack.
    pub fn current_pack(&self) -> Option<PathBuf> {
        self.current_pack.lock().clone()
    }

    /// The active sound bank.
    pub fn bank(&self) -> Option<Arc<SoundBank>> {
        self.bank.load_full()
    }

    pub fn mixer(&self) -> &AudioMixer {
        &self.mixer
    }

    pub fn capture(&self) -> &InputCapture {
        &self.capture
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        Ok(())
    }

    fn emit(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl Drop for SoundEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;
    use crate::input::mock;
    use crate::samples::{SoundCategory, VK_BACK, VK_RETURN, VK_SPACE};
    use crate::testutil::{write_pack, write_wav_f32};

    const RATE: u32 = 44100;

    fn engine() -> (Arc<mock::Adapter>, SoundEngine) {
        let adapter = Arc::new(mock::Adapter::new("mock"));
        let engine = SoundEngine::new(adapter.clone(), AudioMixer::new(RATE), None);
        (adapter, engine)
    }

    fn drain(rx: &Receiver<EngineEvent>) -> Vec<EngineEvent> {
        rx.try_iter().collect()
    }

    /// Voices queued by key presses since the last render.
    fn queued_voices(engine: &SoundEngine) -> usize {
        engine.mixer().pending_voices()
    }

    #[test]
    fn test_every_key_has_a_pool() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (_, engine) = engine();

        engine.load_pack(dir.path(), true).unwrap();
        let bank = engine.bank().unwrap();
        for code in 0..=u8::MAX {
            assert!(!bank.get(code).is_empty());
        }
        assert_eq!(engine.current_pack(), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_held_key_plays_once() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (adapter, engine) = engine();
        engine.load_pack(dir.path(), true).unwrap();
        engine.set_enabled(true).unwrap();

        adapter.press(0x41);
        for _ in 0..20 {
            adapter.repeat(0x41);
        }
        adapter.release(0x41);
        assert_eq!(queued_voices(&engine), 1);

        for _ in 0..3 {
            adapter.press(0x41);
            adapter.release(0x41);
        }
        assert_eq!(queued_voices(&engine), 4);
    }

    #[test]
    fn test_disabled_engine_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (adapter, engine) = engine();
        engine.load_pack(dir.path(), true).unwrap();

        adapter.press(0x41);
        assert_eq!(queued_voices(&engine), 0);

        engine.set_enabled(true).unwrap();
        engine.set_enabled(false).unwrap();
        adapter.press(0x41);
        assert_eq!(queued_voices(&engine), 0);
    }

    #[test]
    fn test_enabled_without_pack() {
        let (adapter, engine) = engine();
        engine.set_enabled(true).unwrap();
        assert!(adapter.press(0x41));
        assert_eq!(queued_voices(&engine), 0);
    }

    #[test]
    fn test_volume_clamp() {
        let (_, engine) = engine();
        assert_eq!(engine.set_volume(-1.0), 0.0);
        assert_eq!(engine.volume(), 0.0);
        assert_eq!(engine.set_volume(5.0), 2.0);
        assert_eq!(engine.volume(), 2.0);
        assert_eq!(engine.set_volume(0.5), 0.5);
    }

    #[test]
    fn test_variant_counts() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (_, engine) = engine();

        engine.load_pack(dir.path(), false).unwrap();
        assert_eq!(engine.bank().unwrap().standard().len(), 1);

        engine.load_pack(dir.path(), true).unwrap();
        let bank = engine.bank().unwrap();
        assert_eq!(bank.standard().len(), 5);
        assert_eq!(bank.standard().ratios()[2], 1.0);
    }

    #[test]
    fn test_failed_load_keeps_previous_bank() {
        let good = tempfile::tempdir().unwrap();
        write_pack(good.path(), &["key-press"]).unwrap();
        let bad = tempfile::tempdir().unwrap();
        write_pack(bad.path(), &["space-press"]).unwrap();
        let (_, engine) = engine();

        engine.load_pack(good.path(), true).unwrap();
        let before = engine.bank().unwrap();

        assert!(matches!(
            engine.load_pack(bad.path(), true),
            Err(EngineError::Load(LoadError::MissingBaseFile(_)))
        ));
        assert!(Arc::ptr_eq(&before, &engine.bank().unwrap()));
        assert_eq!(engine.current_pack(), Some(good.path().to_path_buf()));
    }

    #[test]
    fn test_failed_first_load_leaves_no_bank() {
        let dir = tempfile::tempdir().unwrap();
        let (adapter, engine) = engine();

        assert!(engine.load_pack(dir.path(), true).is_err());
        assert!(engine.bank().is_none());

        engine.set_enabled(true).unwrap();
        adapter.press(0x41);
        assert_eq!(queued_voices(&engine), 0);
    }

    #[test]
    fn test_space_only_pack() {
        let dir = tempfile::tempdir().unwrap();
        // key-press is level 0.1, space-press level 0.2.
        write_pack(dir.path(), &["key-press", "space-press"]).unwrap();
        let (adapter, engine) = engine();
        engine.load_pack(dir.path(), true).unwrap();
        engine.set_enabled(true).unwrap();

        let bank = engine.bank().unwrap();
        assert!(bank.has_dedicated(SoundCategory::Space));
        assert_eq!(bank.get(VK_SPACE).len(), 1);
        for code in [0x41, VK_RETURN, VK_BACK, 0xA0] {
            assert!(Arc::ptr_eq(bank.get(code), bank.standard()));
        }
        assert_eq!(bank.standard().len(), 5);

        // Space plays the dedicated sound at its own level.
        adapter.press(VK_SPACE);
        let frames = engine.mixer().process_frames(1);
        assert!((frames[0] - 0.2).abs() < 1e-4);
        engine.mixer().clear();

        // Letters draw from the standard variants.
        let mut first_samples = HashSet::new();
        for _ in 0..200 {
            adapter.press(0x41);
            adapter.release(0x41);
            let frames = engine.mixer().process_frames(441 * 2);
            assert!((frames[0] - 0.1).abs() < 1e-4);
            let length = frames.iter().take_while(|s| **s != 0.0).count();
            first_samples.insert(length);
            engine.mixer().clear();
        }
        // Variants differ in length, and more than one got picked.
        assert!(first_samples.len() > 1);

        // Enter, backspace and shift fall back to the standard pool.
        for code in [VK_RETURN, VK_BACK, 0xA0] {
            adapter.press(code);
            let frames = engine.mixer().process_frames(1);
            assert!((frames[0] - 0.1).abs() < 1e-4);
            engine.mixer().clear();
        }
    }

    #[test]
    fn test_events() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (_, engine) = engine();
        let rx = engine.subscribe();

        engine.set_enabled(true).unwrap();
        engine.set_enabled(true).unwrap();
        engine.set_volume(0.25);
        engine.set_volume(0.25);
        engine.load_pack(dir.path(), false).unwrap();
        assert!(engine.load_pack(&dir.path().join("missing"), false).is_err());
        engine.set_enabled(false).unwrap();

        let events = drain(&rx);
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], EngineEvent::EnabledChanged(true));
        assert_eq!(events[1], EngineEvent::VolumeChanged(0.25));
        assert_eq!(
            events[2],
            EngineEvent::PackLoaded {
                directory: dir.path().to_path_buf(),
                variants: 1,
            }
        );
        assert!(matches!(events[3], EngineEvent::PackFailed { .. }));
        assert_eq!(events[4], EngineEvent::EnabledChanged(false));
    }

    #[test]
    fn test_capture_failure_keeps_engine_disabled() {
        let (adapter, engine) = engine();
        let rx = engine.subscribe();
        adapter.fail_install(true);

        assert!(matches!(
            engine.set_enabled(true),
            Err(EngineError::Capture(CaptureError::InstallFailed(_)))
        ));
        assert!(!engine.is_enabled());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_reload_restarts_capture() {
        let first = tempfile::tempdir().unwrap();
        write_pack(first.path(), &["key-press"]).unwrap();
        let second = tempfile::tempdir().unwrap();
        write_pack(second.path(), &["key-press", "enter-press"]).unwrap();
        std::fs::write(
            second.path().join("pack.json"),
            r#"{"DisplayName": "Second", "HasPitchVariants": false}"#,
        )
        .unwrap();
        let (adapter, engine) = engine();

        engine.load_pack(first.path(), true).unwrap();
        engine.set_enabled(true).unwrap();
        adapter.press(0x41);

        engine.reload(second.path()).unwrap();
        assert!(engine.is_enabled());
        assert!(engine.capture().is_running());
        assert_eq!(adapter.installs(), 2);
        // Held keys were forgotten while capture was stopped.
        assert_eq!(engine.capture().key_state().held(), 0);

        let bank = engine.bank().unwrap();
        assert_eq!(bank.standard().len(), 1);
        assert!(bank.has_dedicated(SoundCategory::Enter));
    }

    #[test]
    fn test_reload_while_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (adapter, engine) = engine();

        engine.reload(dir.path()).unwrap();
        assert!(!engine.is_enabled());
        assert_eq!(adapter.installs(), 0);
        // No pack.json means variants are on.
        assert_eq!(engine.bank().unwrap().standard().len(), 5);
    }

    #[test]
    fn test_superseded_load() {
        let slow = tempfile::tempdir().unwrap();
        write_pack(slow.path(), &["key-press"]).unwrap();
        let fast = tempfile::tempdir().unwrap();
        write_pack(fast.path(), &["key-press", "space-press"]).unwrap();
        let (_, engine) = engine();

        // A load that finishes after a newer one has started is discarded.
        let stale = engine.next_generation();
        let stale_bank = PackLoader::new(RATE).load(slow.path(), true).unwrap();
        engine.load_pack(fast.path(), true).unwrap();
        assert!(matches!(
            engine.publish(stale, slow.path(), stale_bank),
            Err(EngineError::Load(LoadError::Superseded(_)))
        ));
        assert_eq!(engine.current_pack(), Some(fast.path().to_path_buf()));
        assert!(engine.bank().unwrap().has_dedicated(SoundCategory::Space));

        // Loads on several threads: whichever publishes last is the newest.
        let engine = Arc::new(engine);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = engine.clone();
                let dir = if i % 2 == 0 {
                    slow.path().to_path_buf()
                } else {
                    fast.path().to_path_buf()
                };
                thread::spawn(move || engine.load_pack(&dir, true))
            })
            .collect();

        let mut superseded = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(()) => {}
                Err(EngineError::Load(LoadError::Superseded(_))) => superseded += 1,
                Err(e) => panic!("unexpected error {}", e),
            }
        }
        assert!(superseded < 4);
        assert!(engine.bank().is_some());
    }

    #[test]
    fn test_preview_ignores_enabled_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.wav");
        write_wav_f32(&path, &[0.5; 441], RATE, 1).unwrap();
        let (_, engine) = engine();

        let duration = engine.preview_one_shot(&path).unwrap();
        assert!((duration.as_secs_f64() - 0.01).abs() < 1e-6);
        assert!(!engine.is_enabled());
        assert!(engine.bank().is_none());
        assert_eq!(engine.mixer().process_frames(1), vec![0.5]);

        assert!(matches!(
            engine.preview_one_shot(&dir.path().join("missing.wav")),
            Err(EngineError::Preview(_))
        ));
    }

    #[test]
    fn test_dispose_twice() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let adapter = Arc::new(mock::Adapter::new("mock"));
        let mixer = AudioMixer::new(RATE);
        let output = crate::audio::mock::Device::start(
            mixer.clone(),
            "mock-output",
            Duration::from_millis(5),
        );
        let engine = SoundEngine::new(adapter.clone(), mixer, Some(Box::new(output)));
        let rx = engine.subscribe();

        engine.load_pack(dir.path(), true).unwrap();
        engine.set_enabled(true).unwrap();
        drain(&rx);

        engine.dispose();
        engine.dispose();

        assert!(engine.is_disposed());
        assert!(!engine.is_enabled());
        assert!(!adapter.is_installed());
        assert!(engine.bank().is_none());
        assert_eq!(drain(&rx), vec![EngineEvent::EnabledChanged(false)]);
        assert!(matches!(
            engine.set_enabled(true),
            Err(EngineError::Disposed)
        ));
        assert!(matches!(
            engine.load_pack(dir.path(), true),
            Err(EngineError::Disposed)
        ));
    }

    #[test]
    fn test_concurrent_key_strikes_and_render() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(dir.path(), &["key-press"]).unwrap();
        let (adapter, engine) = engine();
        engine.load_pack(dir.path(), true).unwrap();
        engine.set_enabled(true).unwrap();

        let renderer = {
            let mixer = engine.mixer().clone();
            thread::spawn(move || {
                let mut block = vec![0.0f32; 128];
                for _ in 0..200 {
                    mixer.render(&mut block);
                }
            })
        };
        for code in 0..64u8 {
            adapter.press(code);
            adapter.release(code);
        }
        renderer.join().unwrap();

        let mixer = engine.mixer();
        let mut block = vec![0.0f32; 128];
        mixer.render(&mut block);
        let mut last = mixer.active_voices();
        while last > 0 {
            mixer.render(&mut block);
            let now = mixer.active_voices();
            assert!(now <= last);
            last = now;
        }
    }

    #[test]
    fn test_engine_with_resampled_pack() {
        let dir = tempfile::tempdir().unwrap();
        write_wav_f32(&dir.path().join("key-press.wav"), &[0.3; 480], 48000, 1).unwrap();
        let (_, engine) = engine();

        engine.load_pack(dir.path(), false).unwrap();
        let bank = engine.bank().unwrap();
        let buffer: &SampleBuffer = &bank.standard().variants()[0];
        assert_eq!(buffer.sample_rate(), RATE);
        assert_eq!(buffer.channels(), 1);
    }
}
