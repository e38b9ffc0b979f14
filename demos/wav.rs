use std::path::Path;

use hound::{SampleFormat, WavSpec};

/// Reads a 16-bit integer or 32-bit float file into one buffer per channel.
pub fn load(p: impl AsRef<Path>) -> Result<(WavSpec, Vec<Vec<f32>>), hound::Error> {
    let mut reader = hound::WavReader::open(p)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match &spec {
        WavSpec {
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
            ..
        } => reader.samples::<f32>().collect::<Result<_, _>>()?,
        WavSpec {
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
            ..
        } => reader
            .samples::<i16>()
            .map(|x| x.map(|x| x as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()?,
        _ => return Err(hound::Error::Unsupported),
    };

    let channels = spec.channels.max(1) as usize;
    let mut buf = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks(channels) {
        for (channel, &x) in buf.iter_mut().zip(frame) {
            channel.push(x);
        }
    }
    Ok((spec, buf))
}

pub fn save(p: impl AsRef<Path>, spec: WavSpec, buf: &[Vec<f32>]) -> Result<(), hound::Error> {
    let mut writer = hound::WavWriter::create(p, spec)?;
    let len = buf.iter().map(Vec::len).min().unwrap_or(0);
    for i in 0..len {
        for channel in buf {
            let x = channel[i];
            match spec.sample_format {
                SampleFormat::Float => writer.write_sample(x)?,
                SampleFormat::Int => writer.write_sample(
                    (x * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16,
                )?,
            }
        }
    }
    writer.finalize()
}
