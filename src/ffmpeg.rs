use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Deserialize;

use crate::constants::{AUDIO_CHUNK_SAMPLES, AUDIO_SAMPLE_RATE, VIDEO_FPS, VIDEO_MAX_WIDTH};
use crate::error::MediaError;

const FRAME_QUEUE: usize = 3;   // Decoded frames buffered ahead of presentation
const AUDIO_QUEUE: usize = 32;  // Audio chunks buffered ahead of the device
const STDERR_TAIL: usize = 8;   // Decoder error lines kept for the failure message

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,  // Decoded frame width
    pub height: u32, // Decoded frame height
    pub has_audio: bool,
}

#[derive(Debug)]
pub enum DecoderMsg {
    Metadata(VideoInfo),
    Frame(Vec<u8>),
    Finished,
    Failed(String),
}

#[derive(Default)]
struct Processes {
    video: Option<Child>,
    audio: Option<Child>,
}

/// A video being decoded by `ffprobe` + `ffmpeg` child processes.
///
/// Metadata, RGBA frames and the end of the stream arrive on `frames`; mono
/// s16 samples arrive on `audio`. Dropping it kills the processes.
pub struct Ffmpeg {
    pub frames: Receiver<DecoderMsg>,
    pub audio: Receiver<Vec<i16>>,
    cancelled: Arc<AtomicBool>,
    processes: Arc<Mutex<Processes>>,
}

impl Ffmpeg {
    pub fn open(url: &str) -> Ffmpeg {
        let (frame_tx, frames) = mpsc::sync_channel(FRAME_QUEUE);
        let (audio_tx, audio) = mpsc::sync_channel(AUDIO_QUEUE);
        let cancelled = Arc::new(AtomicBool::new(false));
        let processes = Arc::new(Mutex::new(Processes::default()));

        let worker = Worker {
            url: url.to_string(),
            frame_tx,
            audio_tx,
            cancelled: cancelled.clone(),
            processes: processes.clone(),
        };
        thread::spawn(move || worker.run());

        Ffmpeg { frames, audio, cancelled, processes }
    }

    /// Wraps already-fed channels, with no processes behind them.
    #[cfg(test)]
    pub fn from_channels(frames: Receiver<DecoderMsg>, audio: Receiver<Vec<i16>>) -> Ffmpeg {
        Ffmpeg {
            frames,
            audio,
            cancelled: Arc::new(AtomicBool::new(false)),
            processes: Arc::new(Mutex::new(Processes::default())),
        }
    }
}

impl Drop for Ffmpeg {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let (video, audio) = match self.processes.lock() {
            Ok(mut processes) => (processes.video.take(), processes.audio.take()),
            Err(_) => (None, None),
        };
        for mut child in [video, audio].into_iter().flatten() {
            // Either fails only when the process already exited
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

struct Worker {
    url: String,
    frame_tx: SyncSender<DecoderMsg>,
    audio_tx: SyncSender<Vec<i16>>,
    cancelled: Arc<AtomicBool>,
    processes: Arc<Mutex<Processes>>,
}

impl Worker {
    fn run(self) {
        if let Err(e) = self.decode() {
            let _ = self.frame_tx.send(DecoderMsg::Failed(e.to_string()));
        }
    }

    fn decode(&self) -> Result<(), MediaError> {
        let info = probe(&self.url)?;
        log::debug!("Probed {}: {:?}", self.url, info);
        if self.frame_tx.send(DecoderMsg::Metadata(info)).is_err() {
            return Ok(());
        }

        let mut video = spawn_video_decoder(&self.url, info.width, info.height)?;
        let stdout = video.stdout.take();
        // Read alongside stdout so a chatty decoder never blocks on a full pipe
        let stderr = video.stderr.take().map(|stderr| thread::spawn(move || stderr_tail(stderr)));

        let mut audio = if info.has_audio {
            match spawn_audio_decoder(&self.url) {
                Ok(child) => Some(child),
                Err(e) => {
                    log::warn!("Playing {} without sound: {}", self.url, e);
                    None
                }
            }
        } else {
            None
        };
        let audio_stdout = audio.as_mut().and_then(|child| child.stdout.take());

        {
            let Ok(mut processes) = self.processes.lock() else {
                return Ok(());
            };
            if self.cancelled.load(Ordering::SeqCst) {
                for mut child in [Some(video), audio].into_iter().flatten() {
                    let _ = child.kill();
                    let _ = child.wait();
                }
                return Ok(());
            }
            processes.video = Some(video);
            processes.audio = audio;
        }

        if let Some(stdout) = audio_stdout {
            let audio_tx = self.audio_tx.clone();
            thread::spawn(move || pump_audio(stdout, audio_tx));
        }

        let Some(mut stdout) = stdout else {
            return Err(MediaError::Decode("decoder has no output pipe".into()));
        };
        let frame_len = info.width as usize * info.height as usize * 4;
        let mut frames = 0u64;
        loop {
            let mut frame = vec![0u8; frame_len];
            match stdout.read_exact(&mut frame) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(MediaError::Decode(e.to_string())),
            }
            frames += 1;
            if self.frame_tx.send(DecoderMsg::Frame(frame)).is_err() {
                return Ok(());
            }
        }

        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(());
        }

        let status = self
            .processes
            .lock()
            .ok()
            .and_then(|mut processes| processes.video.as_mut().map(|child| child.wait()));
        match status {
            Some(Ok(status)) if status.success() && frames > 0 => {
                let _ = self.frame_tx.send(DecoderMsg::Finished);
                Ok(())
            }
            Some(Ok(status)) => Err(MediaError::Decode(format!(
                "ffmpeg exited with {} after {} frames: {}",
                status,
                frames,
                stderr.and_then(|tail| tail.join().ok()).unwrap_or_default()
            ))),
            Some(Err(e)) => Err(MediaError::Decode(e.to_string())),
            // Killed by a drop in the meantime
            None => Ok(()),
        }
    }
}

/// Consumes `stderr` to the end, returning its last few non-empty lines.
fn stderr_tail(stderr: impl Read) -> String {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL);
    for line in BufReader::new(stderr).split(b'\n') {
        let Ok(line) = line else {
            break;
        };
        let line = String::from_utf8_lossy(&line).trim().to_string();
        if line.is_empty() {
            continue;
        }
        if tail.len() == STDERR_TAIL {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}

fn pump_audio(mut stdout: impl Read, tx: SyncSender<Vec<i16>>) {
    let mut bytes = vec![0u8; AUDIO_CHUNK_SAMPLES * 2];
    while stdout.read_exact(&mut bytes).is_ok() {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if tx.send(samples).is_err() {
            return;
        }
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn probe(url: &str) -> Result<VideoInfo, MediaError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(["-show_entries", "stream=codec_type,width,height:format=duration"])
        .args(["-of", "json"])
        .arg(url)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| MediaError::Spawn { program: "ffprobe", source })?;

    if !output.status.success() {
        return Err(MediaError::Probe {
            url: url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    parse_probe(&output.stdout).map_err(|reason| MediaError::Probe { url: url.to_string(), reason })
}

/// Reads `ffprobe -of json` output into the decoded frame geometry.
pub fn parse_probe(json: &[u8]) -> Result<VideoInfo, String> {
    let probe: ProbeOutput = serde_json::from_slice(json).map_err(|e| e.to_string())?;

    let video = probe
        .streams
        .iter()
        .find(|stream| stream.codec_type.as_deref() == Some("video"))
        .ok_or("no video stream")?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err("video stream has no dimensions".into());
    };
    if width == 0 || height == 0 {
        return Err("video stream has no dimensions".into());
    }

    // Unknown for some live streams; progress then stays at 0
    let duration = probe
        .format
        .and_then(|format| format.duration)
        .and_then(|duration| duration.parse::<f64>().ok())
        .unwrap_or(0.0);
    let has_audio = probe.streams.iter().any(|stream| stream.codec_type.as_deref() == Some("audio"));
    let (width, height) = output_size(width, height);

    Ok(VideoInfo { duration, width, height, has_audio })
}

/// Scales down to at most `VIDEO_MAX_WIDTH`, keeping both sides even.
pub fn output_size(width: u32, height: u32) -> (u32, u32) {
    let even = |n: u32| (n & !1).max(2);
    if width <= VIDEO_MAX_WIDTH {
        return (even(width), even(height));
    }
    let scaled = (height as u64 * VIDEO_MAX_WIDTH as u64 / width as u64) as u32;
    (even(VIDEO_MAX_WIDTH), even(scaled))
}

fn spawn_video_decoder(url: &str, width: u32, height: u32) -> Result<Child, MediaError> {
    Command::new("ffmpeg")
        .args(["-loglevel", "error", "-nostdin"])
        .args(["-i", url])
        .arg("-an")
        .args(["-vf", &format!("scale={}:{}", width, height)])
        .args(["-r", &VIDEO_FPS.to_string()])
        .args(["-f", "rawvideo"])
        .args(["-pix_fmt", "rgba"])
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| MediaError::Spawn { program: "ffmpeg", source })
}

fn spawn_audio_decoder(url: &str) -> Result<Child, MediaError> {
    Command::new("ffmpeg")
        .args(["-loglevel", "error", "-nostdin"])
        .args(["-i", url])
        .arg("-vn")
        .args(["-ac", "1"])
        .args(["-ar", &AUDIO_SAMPLE_RATE.to_string()])
        .args(["-f", "s16le"])
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| MediaError::Spawn { program: "ffmpeg", source })
}
