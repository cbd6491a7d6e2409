use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(1000);
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Maps normalized elapsed time in `[0, 1]` to normalized progress
pub type Easing = fn(f64) -> f64;

pub fn ease_out_quad(t: f64) -> f64 {
    t * (2.0 - t)
}

pub fn linear(t: f64) -> f64 {
    t
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnimationOptions {
    pub duration: Duration,
    pub easing: Easing,
    /// Sampling period of the frame loop
    pub frame_interval: Duration,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            easing: ease_out_quad,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    origin: f64,
    target: f64,
    started: Instant,
}

/// Identifies the transition a scheduled frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Displayed value after this frame; more frames are needed
    Running(i64),
    /// Target reached; no more frames should be scheduled
    Finished(i64),
    /// The frame belongs to a superseded transition and was ignored
    Stale,
}

/// A displayed number easing towards its target.
///
/// Every [`retarget`](Self::retarget) starts a new transition from the value
/// currently displayed and invalidates frames scheduled for the previous one.
#[derive(Debug, Clone)]
pub struct AnimatedValue {
    options: AnimationOptions,
    displayed: f64,
    transition: Option<Transition>,
    generation: u64,
}

impl AnimatedValue {
    pub fn new(initial: f64, options: AnimationOptions) -> Self {
        Self {
            options,
            displayed: initial.round(),
            transition: None,
            generation: 0,
        }
    }

    pub fn displayed(&self) -> i64 {
        self.displayed as i64
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn retarget(&mut self, target: f64, now: Instant) -> FrameToken {
        self.generation += 1;
        self.transition = Some(Transition {
            origin: self.displayed,
            target,
            started: now,
        });
        FrameToken(self.generation)
    }

    pub fn on_frame(&mut self, token: FrameToken, now: Instant) -> Frame {
        if token.0 != self.generation {
            return Frame::Stale;
        }
        let Some(transition) = self.transition else {
            return Frame::Finished(self.displayed());
        };

        let duration = self.options.duration.as_secs_f64();
        let elapsed = now.saturating_duration_since(transition.started).as_secs_f64();
        let progress = if duration > 0.0 {
            (elapsed / duration).min(1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.displayed = transition.target.round();
            self.transition = None;
            return Frame::Finished(self.displayed());
        }

        let eased = (self.options.easing)(progress);
        self.displayed =
            (transition.origin + (transition.target - transition.origin) * eased).round();
        Frame::Running(self.displayed())
    }
}

/// Drives an [`AnimatedValue`] from a Tokio frame loop and publishes each
/// displayed value.
///
/// One frame task runs per counter; retargeting replaces it.
#[derive(Clone)]
pub struct AnimatedCounter {
    inner: Arc<CounterInner>,
}

struct CounterInner {
    value: Mutex<AnimatedValue>,
    displayed: watch::Sender<i64>,
    frame_interval: Duration,
    frames: Mutex<Option<JoinHandle<()>>>,
}

impl AnimatedCounter {
    pub fn new(initial: f64, options: AnimationOptions) -> Self {
        let value = AnimatedValue::new(initial, options);
        let displayed = watch::Sender::new(value.displayed());
        Self {
            inner: Arc::new(CounterInner {
                value: Mutex::new(value),
                displayed,
                frame_interval: options.frame_interval,
                frames: Mutex::new(None),
            }),
        }
    }

    pub fn displayed(&self) -> i64 {
        *self.inner.displayed.borrow()
    }

    pub fn is_animating(&self) -> bool {
        self.inner.value.lock().is_animating()
    }

    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.inner.displayed.subscribe()
    }

    /// Start easing towards `target` from whatever is displayed now
    pub fn animate_to(&self, target: f64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime available, jumping straight to {}", target);
            let mut value = self.inner.value.lock();
            let now = Instant::now();
            let finished_at = now + value.options.duration;
            let token = value.retarget(target, now);
            let frame = value.on_frame(token, finished_at);
            drop(value);
            self.inner.publish(frame);
            return;
        };

        // Held across retarget and spawn so the recorded task always carries the live token
        let mut frames = self.inner.frames.lock();
        let token = self.inner.value.lock().retarget(target, Instant::now());
        tracing::trace!("Animating towards {} ({:?})", target, token);

        let counter: Weak<CounterInner> = Arc::downgrade(&self.inner);
        let frame_interval = self.inner.frame_interval;
        if let Some(previous) = frames.take() {
            previous.abort();
        }
        *frames = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(counter) = counter.upgrade() else {
                    break;
                };
                let frame = counter.value.lock().on_frame(token, Instant::now());
                if !counter.publish(frame) {
                    break;
                }
            }
        }));
    }

    /// Retarget on every change of a watched source.
    ///
    /// The current value is applied immediately. The task ends when the
    /// source's sender is dropped.
    pub fn follow<T, F>(&self, mut source: watch::Receiver<T>, projection: F) -> JoinHandle<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> f64 + Send + 'static,
    {
        let counter = self.clone();
        tokio::spawn(async move {
            let mut last = projection(&source.borrow_and_update());
            counter.animate_to(last);
            while source.changed().await.is_ok() {
                let next = projection(&source.borrow_and_update());
                if next != last {
                    last = next;
                    counter.animate_to(next);
                }
            }
        })
    }
}

impl CounterInner {
    /// Returns whether the frame loop should keep running
    fn publish(&self, frame: Frame) -> bool {
        match frame {
            Frame::Running(value) => {
                self.displayed.send_if_modified(|shown| replace(shown, value));
                true
            }
            Frame::Finished(value) => {
                self.displayed.send_if_modified(|shown| replace(shown, value));
                false
            }
            Frame::Stale => false,
        }
    }
}

fn replace(shown: &mut i64, value: i64) -> bool {
    if *shown == value {
        return false;
    }
    *shown = value;
    true
}

impl Drop for CounterInner {
    fn drop(&mut self) {
        if let Some(frames) = self.frames.get_mut().take() {
            frames.abort();
        }
    }
}
