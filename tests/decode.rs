// End-to-end decode tests over a synthesized WAV file.
// These drive the loader and media pipeline without an audio device.

use std::fs::File;
use std::io::Write;

use anyhow::Result;

use tonearm::{Buffer, Media, PlayError};

const RATE: u32 = 8000;

/// Build a minimal mono 16-bit PCM WAV file in memory.
fn wav_bytes(samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&RATE.to_le_bytes());
    out.extend_from_slice(&(RATE * 2).to_le_bytes()); // byte rate
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

fn ramp(frames: usize) -> Vec<i16> {
    (0..frames).map(|i| (i % 1000) as i16).collect()
}

fn decode_all(media: &mut Media) -> Result<Vec<f32>> {
    let mut samples = Vec::new();
    while let Some(block) = media.decode_next()? {
        samples.extend(block);
    }
    Ok(samples)
}

#[test]
fn probe_reports_track_parameters() -> Result<()> {
    let mut media = Media::from_buffer(wav_bytes(&ramp(RATE as usize)), Some("wav"))?;

    assert_eq!(media.sample_rate(), RATE);
    assert_eq!(media.channels(), 1);
    let duration = media.duration().expect("wav declares its length");
    assert!((duration.as_secs_f64() - 1.0).abs() < 0.01);

    // Parameters hold after decoding starts.
    media.decode_next()?;
    assert_eq!(media.sample_rate(), RATE);
    Ok(())
}

#[test]
fn decodes_every_sample() -> Result<()> {
    let frames = 12_345;
    let mut media = Media::from_buffer(wav_bytes(&ramp(frames)), Some("wav"))?;

    let samples = decode_all(&mut media)?;
    assert_eq!(samples.len(), frames);
    Ok(())
}

#[test]
fn sample_values_survive_decoding() -> Result<()> {
    let source: Vec<i16> = vec![0, 16384, -16384, 32767, -32768, 0, 0, 0];
    let mut media = Media::from_buffer(wav_bytes(&source), Some("wav"))?;

    let samples = decode_all(&mut media)?;
    assert_eq!(samples.len(), source.len());
    for (got, want) in samples.iter().zip(&source) {
        let want = *want as f32 / 32768.0;
        assert!((got - want).abs() < 1e-4, "expected {want}, got {got}");
    }
    Ok(())
}

#[test]
fn loaded_buffer_feeds_the_decoder() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    let bytes = wav_bytes(&ramp(4000));
    File::create(&path)?.write_all(&bytes)?;

    let buffer = Buffer::from_file(&path)?;
    assert_eq!(buffer.len(), bytes.len());

    let mut media = Media::from_buffer(buffer.into_bytes(), Some("wav"))?;
    let samples = decode_all(&mut media)?;
    assert_eq!(samples.len(), 4000);
    Ok(())
}

#[test]
fn path_and_buffer_routes_agree() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.wav");
    let source = ramp(2048);
    File::create(&path)?.write_all(&wav_bytes(&source))?;

    let from_path = decode_all(&mut Media::from_path(&path)?)?;
    let from_buffer = decode_all(&mut Media::from_buffer(
        Buffer::from_file(&path)?.into_bytes(),
        Some("wav"),
    )?)?;

    assert_eq!(from_path, from_buffer);
    Ok(())
}

#[test]
fn garbage_bytes_fail_to_probe() {
    let err = Media::from_buffer(vec![0u8; 512], None).unwrap_err();
    assert!(matches!(err, PlayError::Probe(_)), "got {err:?}");
}

#[test]
fn empty_buffer_fails_to_probe() {
    assert!(Media::from_buffer(Vec::new(), Some("wav")).is_err());
}
