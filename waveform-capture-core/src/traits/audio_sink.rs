use std::sync::Arc;

use crate::processing::amplitude::AmplitudeMeter;
use crate::traits::capture_provider::AudioBufferCallback;

/// A consumer registered on the hardware tap.
///
/// `consume` runs on the real-time audio thread.
pub trait AudioSink: Send + Sync {
    fn consume(&self, samples: &[f32], channels: u16);
}

impl AudioSink for AmplitudeMeter {
    fn consume(&self, samples: &[f32], channels: u16) {
        self.process(samples, channels);
    }
}

/// Build one tap callback that hands every buffer to each sink in order.
pub fn fan_out(sinks: Vec<Arc<dyn AudioSink>>) -> AudioBufferCallback {
    Arc::new(move |samples: &[f32], channels: u16| {
        for sink in &sinks {
            sink.consume(samples, channels);
        }
    })
}
