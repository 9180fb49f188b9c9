use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::constants::*;
use crate::slider::{SliderConfig, VideoErrorPolicy};

/// IKITIME media slider: cycles the images and videos listed by an endpoint
#[derive(Debug, Parser)]
#[command(name = "ikitime", version, about)]
pub struct Args {
    /// URL returning a JSON array of media URLs
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// How long each image stays on screen, in milliseconds
    #[arg(long, default_value_t = DASHBOARD_IMAGE_DURATION_MS, value_parser = clap::value_parser!(u64).range(1..))]
    pub image_duration_ms: u64,

    /// What to do when a video fails to load or play
    #[arg(long, value_enum, default_value_t = VideoErrorPolicy::Skip)]
    pub on_video_error: VideoErrorPolicy,

    /// HTTP timeout for the media list and image downloads, in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = WINDOW_WIDTH)]
    pub width: i32,

    #[arg(long, default_value_t = WINDOW_HEIGHT)]
    pub height: i32,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn slider_config(&self) -> SliderConfig {
        SliderConfig {
            image_duration: Duration::from_millis(self.image_duration_ms),
            on_video_error: self.on_video_error,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
