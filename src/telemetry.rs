/// Mixing telemetry reported to the embedding caller.
///
/// The two proxies are saturating functions of elapsed simulation time, NOT a
/// measurement of the actual particle distribution. The formula is kept for
/// interface compatibility with the callers that already consume it; a
/// positional entropy measure would be a breaking substitution.
pub const METRICS_INTERVAL: u32 = 30;

pub fn entropy_proxy(elapsed: f32) -> f32 {
    (elapsed * 0.01).min(1.0)
}

pub fn mixedness_proxy(elapsed: f32) -> f32 {
    (elapsed * 0.008).min(1.0)
}

pub type MetricsCallback = Box<dyn FnMut(f32, f32)>;

/// Invokes the caller's callback once every `METRICS_INTERVAL` frames with
/// `(entropy_proxy, mixedness_proxy)`.
pub struct Telemetry {
    frame_count: u32,
    callback: Option<MetricsCallback>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            callback: None,
        }
    }

    pub fn set_callback(&mut self, callback: MetricsCallback) {
        self.callback = Some(callback);
    }

    /// Call once per frame with the elapsed simulation time.
    pub fn tick(&mut self, elapsed: f32) {
        self.frame_count = self.frame_count.wrapping_add(1);
        if self.frame_count % METRICS_INTERVAL != 0 {
            return;
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(entropy_proxy(elapsed), mixedness_proxy(elapsed));
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn proxies_are_monotonic_and_saturating() {
        let mut previous = (0.0, 0.0);
        for step in 0..2_000 {
            let t = step as f32 * 0.1;
            let sample = (entropy_proxy(t), mixedness_proxy(t));
            assert!(sample.0 >= previous.0);
            assert!(sample.1 >= previous.1);
            assert!(sample.0 <= 1.0 && sample.1 <= 1.0);
            previous = sample;
        }
        assert_eq!(entropy_proxy(1e6), 1.0);
        assert_eq!(mixedness_proxy(1e6), 1.0);
    }

    #[test]
    fn callback_fires_every_interval() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();

        let mut telemetry = Telemetry::new();
        telemetry.set_callback(Box::new(move |entropy, mixedness| {
            assert!((0.0..=1.0).contains(&entropy));
            assert!((0.0..=1.0).contains(&mixedness));
            counter.set(counter.get() + 1);
        }));

        for frame in 0..(METRICS_INTERVAL * 4) {
            telemetry.tick(frame as f32 * 0.016);
        }
        assert_eq!(calls.get(), 4);
    }
}
