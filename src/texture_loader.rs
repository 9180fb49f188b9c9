use std::collections::HashMap;
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use exif::{In, Reader, Tag, Value};
use raylib::prelude::*;
use reqwest::blocking::Client;

use crate::error::MediaError;
use crate::media::extension;

// raylib decodes these; anything else gets a placeholder
const DECODABLE: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

pub enum ImageSlot {
    Pending,
    Ready(Texture2D),
    Unavailable(String),
}

struct Download {
    url: String,
    bytes: Result<Vec<u8>, MediaError>,
}

/// Downloads images in the background and turns them into textures on the
/// render thread.
pub struct ImageLoader {
    client: Client,
    tx: Sender<Download>,
    rx: Receiver<Download>,
    slots: HashMap<String, ImageSlot>,
}

impl ImageLoader {
    pub fn new(client: Client) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { client, tx, rx, slots: HashMap::new() }
    }

    pub fn get(&self, url: &str) -> Option<&ImageSlot> {
        self.slots.get(url)
    }

    /// Starts a download unless `url` is already loaded or in flight.
    pub fn request(&mut self, url: &str) {
        if self.slots.contains_key(url) {
            return;
        }

        let decodable = extension(url).is_some_and(|ext| DECODABLE.contains(&ext.as_str()));
        if !decodable {
            log::warn!("Image format of {} cannot be displayed", url);
            self.slots.insert(url.to_string(), ImageSlot::Unavailable("Unsupported image format".into()));
            return;
        }

        self.slots.insert(url.to_string(), ImageSlot::Pending);
        let client = self.client.clone();
        let tx = self.tx.clone();
        let url = url.to_string();
        thread::spawn(move || {
            let bytes = download(&client, &url);
            let _ = tx.send(Download { url, bytes });
        });
    }

    /// Decodes finished downloads. Must run on the thread that owns `rl`.
    pub fn poll(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) {
        while let Ok(Download { url, bytes }) = self.rx.try_recv() {
            // Evicted while downloading
            let Some(slot) = self.slots.get_mut(&url) else {
                continue;
            };

            let loaded = bytes.and_then(|bytes| {
                let ext = extension(&url).unwrap_or_default();
                load_texture_with_exif_rotation(rl, thread, &bytes, &ext)
                    .map_err(|reason| MediaError::Image { url: url.clone(), reason })
            });

            *slot = match loaded {
                Ok(texture) => {
                    log::debug!("Loaded image {}", url);
                    ImageSlot::Ready(texture)
                }
                Err(e) => {
                    log::error!("{}", e);
                    ImageSlot::Unavailable(e.to_string())
                }
            };
        }
    }

    /// Unloads every image not listed in `keep`.
    pub fn retain(&mut self, keep: &[&str]) {
        self.slots.retain(|url, _| keep.contains(&url.as_str()));
    }
}

fn download(client: &Client, url: &str) -> Result<Vec<u8>, MediaError> {
    let failed = |reason: String| MediaError::Download { url: url.to_string(), reason };

    let response = client.get(url).send().map_err(|e| failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {}", status.as_u16())));
    }
    let bytes = response.bytes().map_err(|e| failed(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// EXIF orientation tag of a JPEG, 1 when absent or unreadable.
pub fn exif_orientation(bytes: &[u8]) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => match exif.get_field(Tag::Orientation, In::PRIMARY).map(|field| &field.value) {
            Some(Value::Short(values)) => values.first().copied().unwrap_or(1),
            _ => 1,
        },
        Err(e) => {
            log::debug!("Could not read EXIF data: {}", e);
            1
        }
    }
}

// --- Decode Image, Apply EXIF Rotation, Create Texture ---
pub fn load_texture_with_exif_rotation(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    bytes: &[u8],
    extension: &str,
) -> Result<Texture2D, String> {
    // EXIF is only read reliably for JPEG
    let orientation = if extension == "jpg" || extension == "jpeg" {
        exif_orientation(bytes)
    } else {
        1
    };

    let mut image = Image::load_image_from_mem(&format!(".{}", extension), bytes)
        .map_err(|e| format!("Failed to decode image data: {}", e))?;

    // 3 = 180 deg, 6 = 90 deg CW, 8 = 90 deg CCW. Flipped variants are ignored.
    match orientation {
        3 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        6 => image.rotate_cw(),
        8 => image.rotate_ccw(),
        _ => {}
    }

    let texture = rl
        .load_texture_from_image(thread, &image)
        .map_err(|e| format!("Failed to create texture: {}", e))?;

    Ok(texture)
}
