use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use waveform_capture_core::{AmplitudeMeter, PCM16_FULL_SCALE};

#[test]
fn reads_never_exceed_the_peak_written_so_far() {
    let meter = Arc::new(AmplitudeMeter::new());
    // Largest scaled peak the writer is about to publish, as f32 bits.
    let announced = Arc::new(AtomicU32::new(0));

    let writer = {
        let meter = Arc::clone(&meter);
        let announced = Arc::clone(&announced);
        thread::spawn(move || {
            for i in 1..=1_000u32 {
                let peak = i as f32 / 1_000.0;
                announced.store((peak * PCM16_FULL_SCALE).to_bits(), Ordering::SeqCst);
                meter.process(&[peak * 0.5, -peak, 0.0], 1);
            }
        })
    };

    let mut reads = Vec::new();
    while !writer.is_finished() {
        let value = meter.take();
        let bound = f32::from_bits(announced.load(Ordering::SeqCst));
        assert!(value >= 0.0 && value <= PCM16_FULL_SCALE, "{}", value);
        assert!(value <= bound, "{} > {}", value, bound);
        reads.push(value);
    }
    writer.join().unwrap();
    reads.push(meter.take());

    // No peak is lost: the final maximum shows up in some read.
    assert_eq!(reads.iter().cloned().fold(0.0, f32::max), PCM16_FULL_SCALE);
    assert_eq!(meter.take(), 0.0);
}

#[test]
fn concurrent_writers_keep_the_largest_peak() {
    let meter = Arc::new(AmplitudeMeter::new());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let meter = Arc::clone(&meter);
            thread::spawn(move || {
                for i in 0..250 {
                    let peak = (t * 250 + i) as f32 / 1_000.0;
                    meter.process(&[peak], 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(meter.take(), 0.999 * PCM16_FULL_SCALE);
}
