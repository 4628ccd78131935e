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
use clacker::audio::buffer::resample_linear;
use clacker::audio::{AudioMixer, SampleBuffer};
use clacker::samples::VariantPool;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A decaying burst of noise, roughly what a key click looks like.
fn generate_click(duration_seconds: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (duration_seconds * sample_rate as f32) as usize;
    let mut rng = StdRng::seed_from_u64(7);

    (0..num_samples)
        .map(|i| {
            let envelope = (-(i as f32) / (num_samples as f32 / 6.0)).exp();
            envelope * (rng.gen::<f32>() * 2.0 - 1.0)
        })
        .collect()
}

fn benchmark_pitch_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("pitch_variants");
    let base = SampleBuffer::new(generate_click(0.12, 44100), 44100, 1);

    for count in [1, 5, 9] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, count| {
            b.iter(|| black_box(VariantPool::with_pitch_variants(base.clone(), *count)))
        });
    }

    group.bench_function("rate_conversion_48kHz_to_44.1kHz", |b| {
        let samples = generate_click(0.12, 48000);
        b.iter(|| black_box(resample_linear(black_box(&samples), 1, 48000.0 / 44100.0)))
    });

    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let pool = VariantPool::with_pitch_variants(
        SampleBuffer::new(generate_click(0.12, 44100), 44100, 1),
        5,
    );

    // Blocks of ~75ms at 44.1kHz, the usual device buffer.
    for voices in [1, 8, 32] {
        group.bench_with_input(BenchmarkId::new("voices", voices), &voices, |b, voices| {
            let mixer = AudioMixer::new(44100);
            let mut rng = StdRng::seed_from_u64(1);
            let mut block = vec![0.0f32; 3308];
            b.iter(|| {
                for _ in 0..*voices {
                    mixer.inject(&pool, &mut rng);
                }
                mixer.render(black_box(&mut block));
                mixer.clear();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_pitch_variants, benchmark_render);
criterion_main!(benches);
