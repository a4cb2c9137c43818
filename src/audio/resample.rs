// Sample-rate conversion for the decode thread, used when the track
// rate differs from the device rate. Rubato wants fixed-size planar
// chunks, so incoming interleaved blocks of any size are staged until a
// full chunk is ready; leftovers come out through `flush` at end of
// stream. Staging internally keeps the output independent of how the
// input happens to be split into blocks.

use rubato::{FastFixedIn, PolynomialDegree, ResampleError, Resampler, ResamplerConstructionError};

const CHUNK_FRAMES: usize = 1024;

pub(crate) struct RateConverter {
    inner: FastFixedIn<f32>,
    channels: usize,
    // Interleaved samples waiting for a full chunk.
    pending: Vec<f32>,
}

impl RateConverter {
    pub fn new(
        from_rate: u32,
        to_rate: u32,
        channels: usize,
    ) -> Result<Self, ResamplerConstructionError> {
        let inner = FastFixedIn::new(
            to_rate as f64 / from_rate as f64,
            1.0,
            PolynomialDegree::Linear,
            CHUNK_FRAMES,
            channels,
        )?;

        Ok(Self {
            inner,
            channels,
            pending: Vec::new(),
        })
    }

    /// Convert one interleaved block. Samples short of a full chunk stay
    /// staged; the converted output for them arrives with later blocks
    /// or at `flush`.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, ResampleError> {
        self.pending.extend_from_slice(input);

        let chunk_len = CHUNK_FRAMES * self.channels;
        let mut out = Vec::new();

        while self.pending.len() >= chunk_len {
            let planes = self.deinterleave(CHUNK_FRAMES);
            self.pending.drain(..chunk_len);

            let converted = self.inner.process(&planes, None)?;
            interleave_into(&converted, &mut out);
        }

        Ok(out)
    }

    /// Convert whatever is still staged, plus the tail the interpolator
    /// holds back. Call once, at end of stream.
    pub fn flush(&mut self) -> Result<Vec<f32>, ResampleError> {
        let frames = self.pending.len() / self.channels;
        let mut out = Vec::new();

        if frames > 0 {
            let planes = self.deinterleave(frames);
            self.pending.clear();

            let converted = self.inner.process_partial(Some(&planes), None)?;
            interleave_into(&converted, &mut out);
        }

        let tail = self.inner.process_partial::<Vec<f32>>(None, None)?;
        interleave_into(&tail, &mut out);

        Ok(out)
    }

    fn deinterleave(&self, frames: usize) -> Vec<Vec<f32>> {
        let mut planes = vec![Vec::with_capacity(frames); self.channels];
        for frame in self.pending[..frames * self.channels].chunks_exact(self.channels) {
            for (plane, sample) in planes.iter_mut().zip(frame) {
                plane.push(*sample);
            }
        }
        planes
    }
}

fn interleave_into(planes: &[Vec<f32>], out: &mut Vec<f32>) {
    let frames = planes.first().map_or(0, Vec::len);
    out.reserve(frames * planes.len());
    for i in 0..frames {
        for plane in planes {
            out.push(plane[i]);
        }
    }
}
