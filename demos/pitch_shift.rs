//! Streams a WAV file through the pitch shifter in fixed-size blocks, the way
//! an audio callback would.
//!
//! ```text
//! cargo run --example pitch_shift -- input.wav 7 [frame_size] [hop_divisor]
//! ```

mod wav;

use pitch_vocoder::{power, ratio_to_semitones, Config, PitchShiftEngine, WindowShape};

const BLOCK_SIZE: usize = 256;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let file = args.next().unwrap_or("epic.wav".to_string());
    let semitones: f32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(-5.0);
    let frame_size: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(2048);
    let hop_divisor: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(4);

    let (spec, mut channels) = wav::load(&file)?;
    log::info!(
        "{file}: {} channels at {} Hz, input level {}",
        spec.channels,
        spec.sample_rate,
        power(&channels[0])
    );

    let engine = PitchShiftEngine::with_config(
        Config::new(frame_size, hop_divisor, WindowShape::Hann)
            .with_sample_rate(spec.sample_rate as f32)
            .with_max_channels(channels.len())
            .with_semitone_range(24.0),
    )?;
    engine.set_semitones(semitones, 0.0)?;

    let latency = engine.latency_samples();
    for channel in channels.iter_mut() {
        channel.extend(std::iter::repeat(0.0).take(latency));
    }

    let start = std::time::Instant::now();
    let len = channels[0].len();
    let mut offset = 0;
    while offset < len {
        let n = BLOCK_SIZE.min(len - offset);
        let mut block: Vec<&mut [f32]> = channels
            .iter_mut()
            .map(|c| &mut c[offset..offset + n])
            .collect();
        engine.process(&mut block, n);
        offset += n;
    }
    log::info!("processed {len} samples in {:?}", start.elapsed());
    if let Some(ratio) = engine.pitch_ratio() {
        log::info!(
            "shifted by {:.2} semitones (ratio {ratio})",
            ratio_to_semitones(ratio)
        );
    }

    for channel in channels.iter_mut() {
        channel.drain(..latency);
    }
    log::info!("output level {}", power(&channels[0]));

    wav::save(file.replace('.', "_out."), spec, &channels)?;
    Ok(())
}
