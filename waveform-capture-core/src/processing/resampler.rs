/// Streaming linear-interpolation resampler for mono audio.
///
/// Converts device-rate samples to the encoder rate on the writer thread.
/// Carries the last input sample and the fractional read position across
/// calls so chunk boundaries do not click.
#[derive(Debug, Clone)]
pub struct MonoResampler {
    source_sample_rate: f64,
    target_sample_rate: f64,
    position: f64,
    previous: Option<f32>,
}

impl MonoResampler {
    pub fn new(source_sample_rate: f64, target_sample_rate: f64) -> Self {
        Self {
            source_sample_rate,
            target_sample_rate,
            position: 0.0,
            previous: None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        (self.source_sample_rate - self.target_sample_rate).abs() < 0.01
            || self.source_sample_rate <= 0.0
            || self.target_sample_rate <= 0.0
    }

    /// Resample the next chunk of a continuous stream.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.is_passthrough() {
            return input.to_vec();
        }
        if input.is_empty() {
            return Vec::new();
        }

        let step = self.source_sample_rate / self.target_sample_rate;
        let offset = usize::from(self.previous.is_some());
        let len = input.len() + offset;
        let previous = self.previous.unwrap_or(0.0);
        let at = |i: usize| if i < offset { previous } else { input[i - offset] };

        let estimate = ((len as f64 - self.position) / step).ceil().max(0.0) as usize;
        let mut output = Vec::with_capacity(estimate);
        while self.position + 1.0 < len as f64 {
            let index = self.position as usize;
            let fraction = (self.position - index as f64) as f32;
            output.push(at(index) * (1.0 - fraction) + at(index + 1) * fraction);
            self.position += step;
        }

        // The last input sample becomes index 0 of the next chunk.
        self.position -= (len - 1) as f64;
        self.previous = input.last().copied();
        output
    }
}
