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
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use tracing::{info, span, Level};

use crate::audio::mixer::AudioMixer;

/// An output device that pulls from the mixer on its own clock and throws the
/// audio away. Tracks how much it rendered and the loudest sample seen.
pub struct Device {
    name: String,
    running: Arc<AtomicBool>,
    blocks_rendered: Arc<AtomicU64>,
    peak: Arc<AtomicU32>,
    render_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mock)", self.name)
    }
}

impl Device {
    /// Starts rendering `mixer` in blocks of `block` duration.
    pub fn start(mixer: AudioMixer, name: &str, block: Duration) -> Device {
        let running = Arc::new(AtomicBool::new(true));
        let blocks_rendered = Arc::new(AtomicU64::new(0));
        let peak = Arc::new(AtomicU32::new(0.0f32.to_bits()));

        let render_thread = {
            let running = running.clone();
            let blocks_rendered = blocks_rendered.clone();
            let peak = peak.clone();
            let name = name.to_string();
            thread::spawn(move || {
                let span = span!(Level::INFO, "audio output (mock)");
                let _enter = span.enter();
                info!(device = name, "Mock output started");

                let frames = ((block.as_secs_f64() * mixer.sample_rate() as f64) as usize).max(1);
                let mut buffer = vec![0.0f32; frames];
                while running.load(Ordering::Relaxed) {
                    mixer.render(&mut buffer);
                    let block_peak = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
                    if block_peak > f32::from_bits(peak.load(Ordering::Relaxed)) {
                        peak.store(block_peak.to_bits(), Ordering::Relaxed);
                    }
                    blocks_rendered.fetch_add(1, Ordering::Relaxed);
                    thread::sleep(block);
                }
            })
        };

        Device {
            name: name.to_string(),
            running,
            blocks_rendered,
            peak,
            render_thread: Some(render_thread),
        }
    }

    /// Returns true until the device is stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn blocks_rendered(&self) -> u64 {
        self.blocks_rendered.load(Ordering::Relaxed)
    }

    /// The largest absolute sample value rendered so far.
    pub fn peak(&self) -> f32 {
        f32::from_bits(self.peak.load(Ordering::Relaxed))
    }
}

impl crate::audio::Output for Device {
    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.render_thread.take() {
            let _ = thread.join();
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        crate::audio::Output::stop(self);
    }
}
