use std::time::Duration;

pub const WINDOW_WIDTH: i32 = 480;            // Default window width
pub const WINDOW_HEIGHT: i32 = 560;           // Default window height
pub const FPS: u32 = 60;                      // Frames per second of the host loop

pub const CONTAINER_WIDTH: f32 = 400.0;       // Slider container width inside the window
pub const CONTAINER_HEIGHT: f32 = 480.0;      // Slider container height inside the window

pub const DEFAULT_ENDPOINT: &str = "https://ikitime.ir/medias/list_media.php";
pub const DEFAULT_IMAGE_DURATION_MS: u64 = 10_000;   // Standalone slider
pub const DASHBOARD_IMAGE_DURATION_MS: u64 = 20_000; // As placed on the dashboard
pub const PROGRESS_TICK: Duration = Duration::from_millis(100);
pub const VIDEO_ERROR_RETRY_DELAY: Duration = Duration::from_millis(1_500); // Before moving past a broken video
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const VIDEO_FPS: u32 = 30;                // Decoder output frame rate
pub const VIDEO_MAX_WIDTH: u32 = 960;         // Decoder output is scaled down to this
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
pub const AUDIO_CHUNK_SAMPLES: usize = 1024;  // Mono s16 samples per stream update

pub const PROGRESS_BAR_HEIGHT: f32 = 6.0;
pub const MUTE_BUTTON_SIZE: f32 = 36.0;
