use std::sync::mpsc::TryRecvError;

use raylib::prelude::*;

use crate::constants::{AUDIO_SAMPLE_RATE, VIDEO_FPS};
use crate::error::PlaybackError;
use crate::ffmpeg::{DecoderMsg, Ffmpeg, VideoInfo};
use crate::slider::MediaControl;

/// What the active video reports back to the slider.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoSignal {
    MetadataLoaded,
    TimeUpdate { position: f64, duration: f64 },
    Ended,
    Error(String),
}

/// Mono s16 output through raylib's audio device.
pub struct AudioOut {
    stream: AudioStream<'static>,
}

impl AudioOut {
    pub fn open() -> Option<AudioOut> {
        let device = match RaylibAudio::init_audio_device() {
            Ok(device) => device,
            Err(e) => {
                log::warn!("No audio device, videos will play silently: {}", e);
                return None;
            }
        };
        // The device lives for the rest of the process; the stream borrows it
        let device: &'static RaylibAudio = Box::leak(Box::new(device));
        let mut stream = device.new_audio_stream(AUDIO_SAMPLE_RATE, 16, 1);
        stream.set_volume(0.0);
        Some(AudioOut { stream })
    }

    fn feed(&mut self, decoder: &Ffmpeg) {
        while self.stream.is_processed() {
            match decoder.audio.try_recv() {
                Ok(samples) => self.stream.update(&samples),
                Err(_) => break,
            }
        }
    }
}

struct Session {
    decoder: Ffmpeg,
    info: Option<VideoInfo>,
    playing: bool,
    clock: f64,
    frames_shown: u64,
    frame: Option<Vec<u8>>,
    done: bool,
}

impl Session {
    fn new(decoder: Ffmpeg) -> Self {
        Self {
            decoder,
            info: None,
            playing: false,
            clock: 0.0,
            frames_shown: 0,
            frame: None,
            done: false,
        }
    }

    fn position(&self) -> f64 {
        self.frames_shown as f64 / VIDEO_FPS as f64
    }
}

/// Plays one video at a time, paced by the host's frame delta.
pub struct VideoPlayer {
    audio: Option<AudioOut>,
    session: Option<Session>,
    muted: bool,
}

impl VideoPlayer {
    pub fn new(audio: Option<AudioOut>) -> Self {
        Self { audio, session: None, muted: true }
    }

    fn attach(&mut self, decoder: Ffmpeg) {
        self.release();
        self.session = Some(Session::new(decoder));
    }

    /// Frame geometry, once the metadata is in.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        let info = self.session.as_ref()?.info?;
        Some((info.width, info.height))
    }

    /// RGBA pixels of the newest frame not yet handed out.
    pub fn take_frame(&mut self) -> Option<Vec<u8>> {
        self.session.as_mut()?.frame.take()
    }

    pub fn poll(&mut self, dt: f32) -> Vec<VideoSignal> {
        let mut signals = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return signals;
        };
        if session.done {
            return signals;
        }

        let Some(info) = session.info else {
            match session.decoder.frames.try_recv() {
                Ok(DecoderMsg::Metadata(info)) => {
                    session.info = Some(info);
                    signals.push(VideoSignal::MetadataLoaded);
                }
                Ok(DecoderMsg::Failed(reason)) => {
                    session.done = true;
                    signals.push(VideoSignal::Error(reason));
                }
                Ok(_) | Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    session.done = true;
                    signals.push(VideoSignal::Error("decoder stopped before metadata".into()));
                }
            }
            return signals;
        };

        if !session.playing {
            return signals;
        }

        if let Some(audio) = self.audio.as_mut() {
            audio.feed(&session.decoder);
        }

        session.clock += dt as f64;
        let mut presented = false;
        while session.position() <= session.clock {
            match session.decoder.frames.try_recv() {
                Ok(DecoderMsg::Frame(pixels)) => {
                    session.frame = Some(pixels);
                    session.frames_shown += 1;
                    presented = true;
                }
                Ok(DecoderMsg::Metadata(_)) => {}
                Ok(DecoderMsg::Finished) => {
                    session.done = true;
                    signals.push(VideoSignal::TimeUpdate { position: info.duration, duration: info.duration });
                    signals.push(VideoSignal::Ended);
                    return signals;
                }
                Ok(DecoderMsg::Failed(reason)) => {
                    session.done = true;
                    signals.push(VideoSignal::Error(reason));
                    return signals;
                }
                Err(TryRecvError::Empty) => {
                    // Decoder is behind; do not bank the lost time
                    session.clock = session.clock.min(session.position() + 1.0 / VIDEO_FPS as f64);
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    session.done = true;
                    signals.push(VideoSignal::Error("decoder stopped unexpectedly".into()));
                    return signals;
                }
            }
        }

        if presented {
            signals.push(VideoSignal::TimeUpdate { position: session.position(), duration: info.duration });
        }
        signals
    }
}

impl MediaControl for VideoPlayer {
    fn load(&mut self, src: &str) {
        log::debug!("Opening video {}", src);
        self.attach(Ffmpeg::open(src));
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let session = self.session.as_mut().ok_or(PlaybackError::NothingLoaded)?;
        if session.done {
            return Err(PlaybackError::Rejected("playback already finished".into()));
        }
        if session.info.is_none() {
            return Err(PlaybackError::Rejected("metadata not loaded yet".into()));
        }
        session.playing = true;
        if let Some(audio) = self.audio.as_mut() {
            audio.stream.set_volume(volume(self.muted));
            audio.stream.play();
        }
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(audio) = self.audio.as_mut() {
            audio.stream.set_volume(volume(muted));
        }
    }

    fn release(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            audio.stream.stop();
        }
        self.session = None;
    }
}

fn volume(muted: bool) -> f32 {
    if muted { 0.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const FRAME: f32 = 1.0 / VIDEO_FPS as f32;

    fn info() -> VideoInfo {
        VideoInfo { duration: 2.0, width: 2, height: 2, has_audio: false }
    }

    fn player_with(messages: Vec<DecoderMsg>) -> VideoPlayer {
        let (tx, rx) = mpsc::sync_channel(messages.len() + 1);
        for message in messages {
            tx.send(message).unwrap();
        }
        let (_, audio) = mpsc::sync_channel(1);
        let mut player = VideoPlayer::new(None);
        player.attach(Ffmpeg::from_channels(rx, audio));
        player
    }

    fn pixels(value: u8) -> Vec<u8> {
        vec![value; 16]
    }

    #[test]
    fn reports_metadata_then_waits_for_play() {
        let mut player = player_with(vec![DecoderMsg::Metadata(info()), DecoderMsg::Frame(pixels(1))]);

        assert_eq!(player.poll(FRAME), vec![VideoSignal::MetadataLoaded]);
        assert_eq!(player.frame_size(), Some((2, 2)));
        assert!(player.poll(FRAME).is_empty());
        assert!(player.take_frame().is_none());
    }

    #[test]
    fn play_before_metadata_is_rejected() {
        let mut player = player_with(vec![]);
        assert!(matches!(player.play(), Err(PlaybackError::Rejected(_))));

        player.release();
        assert_eq!(player.play(), Err(PlaybackError::NothingLoaded));
    }

    #[test]
    fn presents_frames_at_the_video_rate_and_ends() {
        let mut player = player_with(vec![
            DecoderMsg::Metadata(info()),
            DecoderMsg::Frame(pixels(1)),
            DecoderMsg::Frame(pixels(2)),
            DecoderMsg::Finished,
        ]);
        player.poll(FRAME);
        player.play().unwrap();

        let signals = player.poll(0.0);
        assert_eq!(signals, vec![VideoSignal::TimeUpdate { position: 1.0 / VIDEO_FPS as f64, duration: 2.0 }]);
        assert_eq!(player.take_frame(), Some(pixels(1)));

        // The next frame is not due yet
        assert!(player.poll(FRAME * 0.5).is_empty());

        let signals = player.poll(FRAME * 0.6);
        assert_eq!(signals.len(), 1);
        assert_eq!(player.take_frame(), Some(pixels(2)));

        let signals = player.poll(FRAME);
        assert_eq!(
            signals,
            vec![VideoSignal::TimeUpdate { position: 2.0, duration: 2.0 }, VideoSignal::Ended]
        );
        assert!(player.poll(FRAME).is_empty());
    }

    #[test]
    fn decoder_failure_is_reported_once() {
        let mut player = player_with(vec![DecoderMsg::Failed("404 Not Found".into())]);
        assert_eq!(player.poll(FRAME), vec![VideoSignal::Error("404 Not Found".into())]);
        assert!(player.poll(FRAME).is_empty());
    }

    #[test]
    fn release_drops_the_session() {
        let mut player = player_with(vec![DecoderMsg::Metadata(info())]);
        player.poll(FRAME);
        player.release();
        assert_eq!(player.frame_size(), None);
        assert!(player.poll(FRAME).is_empty());
    }
}
