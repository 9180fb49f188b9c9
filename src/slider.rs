use std::time::Duration;

use crate::constants::{DEFAULT_IMAGE_DURATION_MS, PROGRESS_TICK, VIDEO_ERROR_RETRY_DELAY};
use crate::error::{LoadError, PlaybackError};
use crate::media::{MediaKind, to_media_items};
use crate::scheduler::{Scheduler, TimerId};
use crate::state::{SliderPhase, SliderState};

/// Playback surface for the active video.
pub trait MediaControl {
    /// Starts loading `src`, replacing whatever was loaded before.
    fn load(&mut self, src: &str);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn set_muted(&mut self, muted: bool);
    /// Stops playback and frees the loaded media.
    fn release(&mut self);
}

/// What to do when the active video fails to load or play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VideoErrorPolicy {
    /// Log the error and advance to the next item
    #[default]
    Skip,
    /// Log the error and keep showing the broken item
    Stay,
}

#[derive(Debug, Clone, Copy)]
pub struct SliderConfig {
    pub image_duration: Duration,
    pub on_video_error: VideoErrorPolicy,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            image_duration: Duration::from_millis(DEFAULT_IMAGE_DURATION_MS),
            on_video_error: VideoErrorPolicy::default(),
        }
    }
}

/// Timers armed for the current activation: the image progress ticks and
/// the pending advance (image timeout or video error delay).
#[derive(Debug, Default)]
struct ImageTimers {
    progress: Option<TimerId>,
    advance: Option<TimerId>,
    steps: u32,
    total_steps: u32,
}

/// Timed rotation over a list of images and videos.
///
/// Images advance on a timeout of `image_duration`, videos when the media
/// surface reports the end of playback. Every activation cancels the timers
/// of the previous one before arming its own.
pub struct Slider<S: Scheduler, M: MediaControl> {
    state: SliderState,
    config: SliderConfig,
    scheduler: S,
    media: M,
    timers: ImageTimers,
    activations: u64,
    mounted: bool,
}

impl<S: Scheduler, M: MediaControl> Slider<S, M> {
    pub fn new(config: SliderConfig, scheduler: S, media: M) -> Self {
        Self {
            state: SliderState::default(),
            config,
            scheduler,
            media,
            timers: ImageTimers::default(),
            activations: 0,
            mounted: true,
        }
    }

    pub fn state(&self) -> &SliderState {
        &self.state
    }

    pub fn phase(&self) -> SliderPhase {
        self.state.phase()
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    /// Bumped every time an item is (re-)activated.
    pub fn activation(&self) -> u64 {
        self.activations
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Applies the result of the media list fetch. Only the first result is
    /// taken; the list never changes afterwards.
    pub fn finish_load(&mut self, result: Result<Vec<String>, LoadError>) {
        if !self.mounted || !self.state.loading {
            return;
        }
        self.state.loading = false;

        match result {
            Ok(urls) => {
                let fetched = urls.len();
                self.state.items = to_media_items(urls);
                self.state.active_index = 0;
                self.state.progress = 0.0;
                log::info!(
                    "Loaded {} media items ({} dropped)",
                    self.state.items.len(),
                    fetched - self.state.items.len()
                );
                if self.state.items.is_empty() {
                    return;
                }
                self.activate();
            }
            Err(e) => {
                log::error!("Error fetching media: {}", e);
                self.state.items.clear();
                self.state.error_message = Some(e.to_string());
            }
        }
    }

    /// Moves the virtual clock forward by `dt`, handling each due timer in order.
    pub fn tick(&mut self, dt: Duration) {
        let deadline = self.scheduler.now() + dt;
        while let Some(id) = self.scheduler.fire_next(deadline) {
            self.on_timer(id);
        }
    }

    pub fn on_timer(&mut self, id: TimerId) {
        if !self.mounted {
            return;
        }
        if self.timers.progress == Some(id) {
            self.timers.steps += 1;
            let total = self.timers.total_steps.max(1) as f32;
            self.state.progress = (self.timers.steps as f32 / total * 100.0).min(100.0);
        } else if self.timers.advance == Some(id) {
            self.timers.advance = None;
            self.advance();
        } else {
            log::trace!("Ignoring stale timer {:?}", id);
        }
    }

    pub fn on_video_metadata_loaded(&mut self) {
        if !self.video_active() {
            return;
        }
        self.media.set_muted(self.state.muted);
        match self.media.play() {
            Ok(()) => {}
            Err(e) if !self.state.muted => {
                log::warn!("Autoplay failed with sound, retrying muted: {}", e);
                self.state.muted = true;
                self.media.set_muted(true);
                if let Err(e) = self.media.play() {
                    log::warn!("Autoplay failed on load: {}", e);
                }
            }
            Err(e) => log::warn!("Autoplay failed on load: {}", e),
        }
    }

    pub fn on_video_time_update(&mut self, position: f64, duration: f64) {
        if !self.video_active() {
            return;
        }
        self.state.progress = video_progress(position, duration);
    }

    pub fn on_video_ended(&mut self) {
        if !self.video_active() {
            return;
        }
        self.advance();
    }

    pub fn on_video_error(&mut self, message: &str) {
        if !self.video_active() {
            return;
        }
        let src = self.state.active_item().map(|item| item.src.as_str()).unwrap_or_default();
        log::error!("Video error on {}: {}", src, message);
        if self.config.on_video_error == VideoErrorPolicy::Skip && self.timers.advance.is_none() {
            // One pending move per broken video, after a short pause
            self.timers.advance = Some(self.scheduler.set_timeout(VIDEO_ERROR_RETRY_DELAY));
        }
    }

    /// Flips the mute flag for the active video. Does nothing for images.
    pub fn toggle_mute(&mut self) {
        if !self.video_active() {
            return;
        }
        self.state.muted = !self.state.muted;
        self.media.set_muted(self.state.muted);
    }

    /// Tears the slider down. Every later event is ignored.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.clear_timers();
        self.media.release();
        self.mounted = false;
    }

    /// Goes to the next item, wrapping at the end. A single item is
    /// re-activated in place.
    fn advance(&mut self) {
        self.clear_timers();
        self.state.progress = 0.0;
        let len = self.state.items.len();
        if len > 1 {
            self.state.active_index = (self.state.active_index + 1) % len;
        }
        self.activate();
    }

    fn activate(&mut self) {
        self.clear_timers();
        self.state.progress = 0.0;

        let Some(item) = self.state.items.get(self.state.active_index) else {
            return;
        };
        self.activations += 1;
        log::debug!("Showing item {}: {}", self.state.active_index, item.src);

        match item.kind {
            MediaKind::Image => {
                self.media.release();
                // The last tick lands at or just before the advance, so progress reaches 100
                let (steps, period) = progress_steps(self.config.image_duration);
                self.timers.total_steps = steps;
                self.timers.progress = Some(self.scheduler.set_interval(period));
                self.timers.advance = Some(self.scheduler.set_timeout(self.config.image_duration));
            }
            MediaKind::Video => {
                let src = item.src.clone();
                // Every video starts muted; the user unmutes it explicitly
                self.state.muted = true;
                self.media.load(&src);
            }
        }
    }

    fn clear_timers(&mut self) {
        if let Some(id) = self.timers.progress.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.timers.advance.take() {
            self.scheduler.cancel(id);
        }
        self.timers.steps = 0;
        self.timers.total_steps = 0;
    }

    fn video_active(&self) -> bool {
        self.mounted && !self.state.loading && self.state.active_item().is_some_and(|item| item.is_video())
    }
}

impl<S: Scheduler, M: MediaControl> Drop for Slider<S, M> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Splits an image duration into whole progress ticks of at most
/// `PROGRESS_TICK`, returning the tick count and the tick period.
fn progress_steps(duration: Duration) -> (u32, Duration) {
    let steps = duration
        .as_nanos()
        .div_ceil(PROGRESS_TICK.as_nanos())
        .clamp(1, u32::MAX as u128) as u32;
    (steps, duration / steps)
}

/// Playback position as a percentage, 0 when it is not a finite number.
pub fn video_progress(position: f64, duration: f64) -> f32 {
    let progress = position / duration * 100.0;
    if progress.is_finite() {
        progress.clamp(0.0, 100.0) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TimerQueue;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String),
        Play,
        Muted(bool),
        Release,
    }

    /// Records every call; `reject_unmuted_play` mimics a browser-style autoplay policy.
    #[derive(Clone, Default)]
    struct FakeMedia {
        calls: Rc<RefCell<Vec<Call>>>,
        muted: Rc<RefCell<bool>>,
        reject_unmuted_play: bool,
    }

    impl FakeMedia {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn clear(&self) {
            self.calls.borrow_mut().clear();
        }
    }

    impl MediaControl for FakeMedia {
        fn load(&mut self, src: &str) {
            self.calls.borrow_mut().push(Call::Load(src.to_string()));
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Play);
            if self.reject_unmuted_play && !*self.muted.borrow() {
                return Err(PlaybackError::Rejected("autoplay with sound".into()));
            }
            Ok(())
        }

        fn set_muted(&mut self, muted: bool) {
            *self.muted.borrow_mut() = muted;
            self.calls.borrow_mut().push(Call::Muted(muted));
        }

        fn release(&mut self) {
            self.calls.borrow_mut().push(Call::Release);
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn slider_with(duration_ms: u64, policy: VideoErrorPolicy) -> (Slider<TimerQueue, FakeMedia>, FakeMedia) {
        let media = FakeMedia::default();
        let config = SliderConfig {
            image_duration: ms(duration_ms),
            on_video_error: policy,
        };
        (Slider::new(config, TimerQueue::new(), media.clone()), media)
    }

    fn slider(duration_ms: u64) -> (Slider<TimerQueue, FakeMedia>, FakeMedia) {
        slider_with(duration_ms, VideoErrorPolicy::Skip)
    }

    fn urls(list: &[&str]) -> Result<Vec<String>, LoadError> {
        Ok(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn default_config_shows_images_for_ten_seconds() {
        assert_eq!(SliderConfig::default().image_duration, ms(10_000));
    }

    #[test]
    fn starts_loading_and_muted() {
        let (slider, _) = slider(1_000);
        assert_eq!(slider.phase(), SliderPhase::Loading);
        assert!(slider.state().muted);
        assert_eq!(slider.scheduler().pending(), 0);
    }

    #[test]
    fn load_drops_unknown_and_starts_on_first_item() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.mp4", "c.txt"]));

        let items: Vec<_> = slider.state().items.iter().map(|i| (i.src.as_str(), i.kind)).collect();
        assert_eq!(items, vec![("a.jpg", MediaKind::Image), ("b.mp4", MediaKind::Video)]);
        assert_eq!(slider.phase(), SliderPhase::ShowingImage(0));
        // progress interval and advance timeout
        assert_eq!(slider.scheduler().pending(), 2);
    }

    #[test]
    fn empty_list_shows_nothing_and_arms_no_timers() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&[]));

        assert_eq!(slider.phase(), SliderPhase::Empty);
        assert_eq!(slider.scheduler().pending(), 0);
        slider.tick(ms(60_000));
        assert_eq!(slider.phase(), SliderPhase::Empty);
        assert!(media.calls().is_empty());
    }

    #[test]
    fn list_of_only_unknown_urls_is_empty() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["notes.txt", "page.html"]));
        assert_eq!(slider.phase(), SliderPhase::Empty);
    }

    #[test]
    fn fetch_failure_is_terminal_and_arms_no_timers() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(Err(LoadError::NotAnArray));

        assert_eq!(
            slider.phase(),
            SliderPhase::Failed("API response is not an array of URLs.".into())
        );
        assert_eq!(slider.scheduler().pending(), 0);

        // A late success does not resurrect the slider
        slider.finish_load(urls(&["a.jpg"]));
        assert!(matches!(slider.phase(), SliderPhase::Failed(_)));
    }

    #[test]
    fn image_advances_exactly_once_at_its_duration() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.png", "c.gif"]));

        slider.tick(ms(999));
        assert_eq!(slider.state().active_index, 0);
        slider.tick(ms(1));
        assert_eq!(slider.state().active_index, 1);
        assert_eq!(slider.state().progress, 0.0);
        assert_eq!(slider.scheduler().pending(), 2);

        slider.tick(ms(999));
        assert_eq!(slider.state().active_index, 1);
    }

    #[test]
    fn image_progress_rises_linearly_until_the_advance() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.jpg"]));

        let mut last = 0.0;
        for _ in 0..9 {
            slider.tick(ms(100));
            let progress = slider.state().progress;
            assert!(progress > last, "{} should exceed {}", progress, last);
            last = progress;
        }
        assert!((last - 90.0).abs() < 1e-3);

        slider.tick(ms(99));
        assert_eq!(slider.state().active_index, 0);
        assert!((slider.state().progress - 90.0).abs() < 1e-3);
    }

    /// Fires timers one at a time and returns the progress seen right before
    /// the first advance.
    fn progress_before_first_advance(duration_ms: u64) -> f32 {
        let (mut slider, _) = slider(duration_ms);
        slider.finish_load(urls(&["a.jpg", "b.jpg"]));
        loop {
            let before = slider.state().progress;
            let id = slider.scheduler.fire_next(ms(duration_ms)).expect("advance is due by then");
            slider.on_timer(id);
            if slider.state().active_index == 1 {
                return before;
            }
        }
    }

    #[test]
    fn image_progress_is_full_right_before_the_advance() {
        for duration_ms in [1_000, 1_050, 250, 30, 1] {
            let progress = progress_before_first_advance(duration_ms);
            assert!((progress - 100.0).abs() < 1e-3, "{} ms: {}", duration_ms, progress);
        }
    }

    #[test]
    fn progress_steps_divide_the_duration() {
        assert_eq!(progress_steps(ms(1_000)), (10, ms(100)));
        assert_eq!(progress_steps(ms(20_000)), (200, ms(100)));
        assert_eq!(progress_steps(ms(30)), (1, ms(30)));

        let (steps, period) = progress_steps(ms(1_050));
        assert_eq!(steps, 11);
        assert!(period <= PROGRESS_TICK);
        assert!(period * steps <= ms(1_050));
    }

    #[test]
    fn index_wraps_at_the_end() {
        let (mut slider, _) = slider(500);
        slider.finish_load(urls(&["a.jpg", "b.jpg", "c.jpg"]));

        let mut seen = vec![slider.state().active_index];
        for _ in 0..6 {
            slider.tick(ms(500));
            let index = slider.state().active_index;
            assert!(index < 3);
            seen.push(index);
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn single_image_restarts_in_place() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["only.png"]));

        slider.tick(ms(500));
        assert!(slider.state().progress > 0.0);

        slider.tick(ms(500));
        assert_eq!(slider.state().active_index, 0);
        assert_eq!(slider.state().progress, 0.0);
        assert_eq!(slider.scheduler().pending(), 2);

        slider.tick(ms(300));
        assert!((slider.state().progress - 30.0).abs() < 1e-3);
        assert_eq!(slider.activation(), 2);
    }

    #[test]
    fn long_frame_does_not_skip_or_double_advance() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]));

        // Each activation arms fresh timers from the instant it happened
        slider.tick(ms(2_500));
        assert_eq!(slider.state().active_index, 2);
        assert!((slider.state().progress - 50.0).abs() < 1e-3);
        assert_eq!(slider.scheduler().pending(), 2);
    }

    #[test]
    fn video_waits_for_metadata_then_plays_with_current_mute() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["b.mp4", "a.jpg"]));

        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(0));
        assert_eq!(slider.scheduler().pending(), 0);
        assert_eq!(media.calls(), vec![Call::Load("b.mp4".into())]);

        media.clear();
        slider.on_video_metadata_loaded();
        assert_eq!(media.calls(), vec![Call::Muted(true), Call::Play]);
    }

    #[test]
    fn video_ignores_wall_clock_and_advances_on_end() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["b.mp4", "a.jpg"]));
        slider.on_video_metadata_loaded();

        slider.tick(ms(60_000));
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(0));

        slider.on_video_time_update(5.0, 10.0);
        assert!((slider.state().progress - 50.0).abs() < 1e-3);

        slider.on_video_ended();
        assert_eq!(slider.phase(), SliderPhase::ShowingImage(1));
        assert_eq!(slider.state().progress, 0.0);
    }

    #[test]
    fn ended_fires_before_any_image_duration() {
        let (mut slider, _) = slider(20_000);
        slider.finish_load(urls(&["a.webm", "b.ogg"]));

        slider.tick(ms(10));
        slider.on_video_ended();
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(1));
    }

    #[test]
    fn video_progress_is_always_finite() {
        assert_eq!(video_progress(3.0, 0.0), 0.0);
        assert_eq!(video_progress(0.0, 0.0), 0.0);
        assert_eq!(video_progress(1.0, f64::NAN), 0.0);
        assert_eq!(video_progress(1.0, f64::INFINITY), 0.0);
        assert_eq!(video_progress(12.0, 10.0), 100.0);
        assert_eq!(video_progress(-1.0, 10.0), 0.0);
        assert!((video_progress(2.5, 10.0) - 25.0).abs() < 1e-3);
    }

    #[test]
    fn time_update_with_zero_duration_yields_zero() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["v.mov"]));
        slider.on_video_time_update(4.0, 0.0);
        assert_eq!(slider.state().progress, 0.0);
    }

    #[test]
    fn video_events_are_ignored_while_an_image_is_active() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.mp4"]));
        media.clear();

        slider.on_video_ended();
        slider.on_video_time_update(9.0, 10.0);
        slider.on_video_metadata_loaded();
        slider.on_video_error("boom");

        assert_eq!(slider.phase(), SliderPhase::ShowingImage(0));
        assert_eq!(slider.state().progress, 0.0);
        assert!(media.calls().is_empty());
    }

    #[test]
    fn mute_toggle_applies_to_video_only() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.mp4"]));

        slider.toggle_mute();
        assert!(slider.state().muted);

        slider.tick(ms(1_000));
        media.clear();
        slider.toggle_mute();
        assert!(!slider.state().muted);
        assert_eq!(media.calls(), vec![Call::Muted(false)]);

        slider.toggle_mute();
        assert!(slider.state().muted);
    }

    #[test]
    fn every_video_starts_muted() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["a.mp4", "b.mp4"]));
        slider.on_video_metadata_loaded();
        slider.toggle_mute();
        assert!(!slider.state().muted);

        slider.on_video_ended();
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(1));
        assert!(slider.state().muted);

        media.clear();
        slider.on_video_metadata_loaded();
        assert_eq!(media.calls(), vec![Call::Muted(true), Call::Play]);
        assert!(slider.state().muted);
    }

    #[test]
    fn rejected_unmuted_autoplay_retries_muted() {
        let media = FakeMedia {
            reject_unmuted_play: true,
            ..FakeMedia::default()
        };
        let mut slider = Slider::new(SliderConfig::default(), TimerQueue::new(), media.clone());
        slider.finish_load(urls(&["a.mp4", "b.mp4"]));
        slider.toggle_mute();
        assert!(!slider.state().muted);

        media.clear();
        slider.on_video_metadata_loaded();
        assert!(slider.state().muted);
        assert_eq!(
            media.calls(),
            vec![Call::Muted(false), Call::Play, Call::Muted(true), Call::Play]
        );
    }

    #[test]
    fn video_error_skips_after_a_pause_by_default() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["broken.mp4", "a.jpg"]));
        slider.on_video_error("decoder exited with status 1");
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(0));
        assert_eq!(slider.scheduler().pending(), 1);

        // A repeated error does not stack another move
        slider.on_video_error("decoder exited with status 1");
        assert_eq!(slider.scheduler().pending(), 1);

        slider.tick(VIDEO_ERROR_RETRY_DELAY);
        assert_eq!(slider.phase(), SliderPhase::ShowingImage(1));
    }

    #[test]
    fn single_broken_video_is_not_reloaded_in_a_tight_loop() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["broken.mp4"]));
        media.clear();

        slider.on_video_error("no video stream");
        slider.tick(VIDEO_ERROR_RETRY_DELAY - ms(1));
        assert!(media.calls().is_empty());

        slider.tick(ms(1));
        assert_eq!(media.calls(), vec![Call::Load("broken.mp4".into())]);
        assert_eq!(slider.scheduler().pending(), 0);
    }

    #[test]
    fn video_ending_during_the_error_pause_cancels_the_pending_move() {
        let (mut slider, _) = slider(1_000);
        slider.finish_load(urls(&["a.mp4", "b.mp4", "c.jpg"]));
        slider.on_video_error("corrupt frame");
        slider.on_video_ended();
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(1));
        assert_eq!(slider.scheduler().pending(), 0);

        slider.tick(VIDEO_ERROR_RETRY_DELAY);
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(1));
    }

    #[test]
    fn video_error_can_stay_on_the_item() {
        let (mut slider, _) = slider_with(1_000, VideoErrorPolicy::Stay);
        slider.finish_load(urls(&["broken.mp4", "a.jpg"]));
        slider.on_video_error("decoder exited with status 1");
        assert_eq!(slider.phase(), SliderPhase::ShowingVideo(0));
    }

    #[test]
    fn switching_to_image_releases_video_and_cancels_before_arming() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.mp4", "c.jpg"]));

        slider.tick(ms(1_000));
        assert_eq!(slider.scheduler().pending(), 0);
        assert_eq!(media.calls(), vec![Call::Release, Call::Load("b.mp4".into())]);

        slider.on_video_ended();
        assert_eq!(slider.phase(), SliderPhase::ShowingImage(2));
        assert_eq!(slider.scheduler().pending(), 2);
        assert_eq!(media.calls().last(), Some(&Call::Release));
    }

    #[test]
    fn stale_timer_ids_are_ignored() {
        let mut queue = TimerQueue::new();
        let stale = queue.set_timeout(ms(1));
        let (mut slider, _) = {
            let media = FakeMedia::default();
            (Slider::new(SliderConfig::default(), queue, media.clone()), media)
        };
        slider.finish_load(urls(&["a.jpg", "b.jpg"]));

        slider.on_timer(stale);
        assert_eq!(slider.state().active_index, 0);
        assert_eq!(slider.state().progress, 0.0);
    }

    #[test]
    fn unmount_cancels_everything_and_ignores_later_events() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["a.jpg", "b.mp4"]));
        slider.unmount();

        assert!(!slider.is_mounted());
        assert_eq!(slider.scheduler().pending(), 0);
        assert_eq!(media.calls().last(), Some(&Call::Release));

        media.clear();
        slider.tick(ms(10_000));
        slider.on_video_ended();
        slider.toggle_mute();
        slider.unmount();
        assert_eq!(slider.state().active_index, 0);
        assert!(media.calls().is_empty());
    }

    #[test]
    fn load_after_unmount_is_dropped() {
        let (mut slider, _) = slider(1_000);
        slider.unmount();
        slider.finish_load(urls(&["a.jpg"]));
        assert_eq!(slider.phase(), SliderPhase::Loading);
        assert_eq!(slider.scheduler().pending(), 0);
    }

    #[test]
    fn drop_releases_media() {
        let (mut slider, media) = slider(1_000);
        slider.finish_load(urls(&["a.mp4"]));
        media.clear();
        drop(slider);
        assert_eq!(media.calls(), vec![Call::Release]);
    }
}
