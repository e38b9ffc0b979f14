#![allow(dead_code)]

use std::f32::consts::PI;

use pitch_vocoder::{Config, PitchShiftEngine};
use rustfft::{num_complex::Complex, FftPlanner};

pub const SAMPLE_RATE: u32 = 44_100;

pub fn gen_sine<F>(freq_hz: f32, sr: u32, n: usize, amp_fn: F) -> Vec<f32>
where
    F: Fn(usize) -> f32,
{
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * freq_hz * i as f32 / sr as f32;
            amp_fn(i) * phase.sin()
        })
        .collect()
}

/// Deterministic broadband test signal in [-1, 1].
pub fn gen_noise(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 7919 + 13) % 211) as f32 / 105.0 - 1.0)
        .collect()
}

pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f32>() / signal.len() as f32).sqrt()
}

pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0f32, |m, x| m.max(x.abs()))
}

/// Streams a mono signal through `engine` in blocks of `block` samples.
pub fn process_mono(engine: &PitchShiftEngine, input: &[f32], block: usize) -> Vec<f32> {
    let mut out = input.to_vec();
    for chunk in out.chunks_mut(block) {
        let len = chunk.len();
        assert!(engine.process(&mut [chunk], len));
    }
    out
}

pub fn mono_engine(config: Config) -> PitchShiftEngine {
    PitchShiftEngine::with_config(config.with_max_channels(1)).unwrap()
}

/// Frequency of the strongest bin of a Hann-windowed transform of `signal`.
pub fn dominant_frequency(signal: &[f32], sr: u32) -> f32 {
    let n = signal.len();
    let mut spectrum: Vec<Complex<f32>> = signal
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos();
            Complex::new(x * w, 0.0)
        })
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut spectrum);

    let (bin, _) = spectrum[1..n / 2]
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |best, (k, c)| {
            let mag = c.norm();
            if mag > best.1 {
                (k + 1, mag)
            } else {
                best
            }
        });
    bin as f32 * sr as f32 / n as f32
}
