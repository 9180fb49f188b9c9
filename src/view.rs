use std::ffi::c_void;

use raylib::prelude::*;

use crate::constants::*;
use crate::state::{SliderPhase, SliderState};
use crate::texture_loader::{ImageLoader, ImageSlot};

const MARGIN: f32 = 16.0;
const FONT_SIZE: i32 = 20;
const BACKGROUND: Color = Color::new(229, 231, 235, 255);
const TRACK: Color = Color::new(255, 255, 255, 90);
const FILL: Color = Color::new(255, 255, 255, 230);

/// Slider container centred in the window, shrunk to fit small windows.
pub fn container_rect(screen_width: i32, screen_height: i32) -> Rectangle {
    let width = CONTAINER_WIDTH.min(screen_width as f32 - 2.0 * MARGIN).max(0.0);
    let height = CONTAINER_HEIGHT.min(screen_height as f32 - 2.0 * MARGIN).max(0.0);
    Rectangle::new(
        (screen_width as f32 - width) * 0.5,
        (screen_height as f32 - height) * 0.5,
        width,
        height,
    )
}

/// Largest rectangle with the texture's aspect ratio that fits in `area`, centred.
pub fn fit(tex_width: f32, tex_height: f32, area: Rectangle) -> Rectangle {
    if tex_width <= 0.0 || tex_height <= 0.0 {
        return Rectangle::new(area.x, area.y, 0.0, 0.0);
    }
    let scale = (area.width / tex_width).min(area.height / tex_height);
    let width = tex_width * scale;
    let height = tex_height * scale;
    Rectangle::new(
        area.x + (area.width - width) * 0.5,
        area.y + (area.height - height) * 0.5,
        width,
        height,
    )
}

pub fn mute_button_rect(area: Rectangle) -> Rectangle {
    Rectangle::new(
        area.x + area.width - MUTE_BUTTON_SIZE - 12.0,
        area.y + area.height - MUTE_BUTTON_SIZE - PROGRESS_BAR_HEIGHT - 12.0,
        MUTE_BUTTON_SIZE,
        MUTE_BUTTON_SIZE,
    )
}

/// Greedy word wrap at `max_chars` characters per line.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Draws the slider's current state inside a caller-supplied rectangle.
#[derive(Default)]
pub struct SliderView {
    video: Option<(Texture2D, u32, u32)>,
}

impl SliderView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_video(&mut self) {
        self.video = None;
    }

    pub fn upload_video_frame(
        &mut self,
        rl: &mut RaylibHandle,
        thread: &RaylibThread,
        (width, height): (u32, u32),
        pixels: &[u8],
    ) {
        if pixels.len() != width as usize * height as usize * 4 {
            log::warn!("Dropping video frame of {} bytes for {}x{}", pixels.len(), width, height);
            return;
        }

        let reuse = matches!(&self.video, Some((_, w, h)) if *w == width && *h == height);
        if !reuse {
            let blank = Image::gen_image_color(width as i32, height as i32, Color::BLACK);
            match rl.load_texture_from_image(thread, &blank) {
                Ok(texture) => self.video = Some((texture, width, height)),
                Err(e) => {
                    log::error!("Failed to create video texture: {}", e);
                    self.video = None;
                    return;
                }
            }
        }

        if let Some((texture, _, _)) = self.video.as_mut() {
            // Size checked above; the texture is RGBA8 like the decoder output
            unsafe {
                raylib::ffi::UpdateTexture(**texture, pixels.as_ptr() as *const c_void);
            }
        }
    }

    pub fn draw(&self, d: &mut RaylibDrawHandle, area: Rectangle, state: &SliderState, images: &ImageLoader) {
        d.draw_rectangle_rec(area, BACKGROUND);

        match state.phase() {
            SliderPhase::Loading => {
                self.draw_skeleton(d, area);
                return;
            }
            SliderPhase::Failed(message) => {
                draw_message(d, area, &message, Color::RED);
                return;
            }
            SliderPhase::Empty => {
                draw_message(d, area, "No media found to display.", Color::DARKGRAY);
                return;
            }
            SliderPhase::ShowingImage(index) => {
                let src = &state.items[index].src;
                match images.get(src) {
                    Some(ImageSlot::Ready(texture)) => draw_fitted(d, texture, area),
                    Some(ImageSlot::Unavailable(reason)) => draw_message(d, area, reason, Color::GRAY),
                    Some(ImageSlot::Pending) | None => self.draw_skeleton(d, area),
                }
            }
            SliderPhase::ShowingVideo(_) => {
                d.draw_rectangle_rec(area, Color::BLACK);
                if let Some((texture, _, _)) = &self.video {
                    draw_fitted(d, texture, area);
                }
                draw_mute_button(d, mute_button_rect(area), state.muted);
            }
        }

        draw_progress(d, area, state.progress);
    }

    fn draw_skeleton(&self, d: &mut RaylibDrawHandle, area: Rectangle) {
        let pulse = ((d.get_time() * 2.5).sin() * 0.5 + 0.5) as f32;
        let shade = (200.0 + 30.0 * pulse) as u8;
        let inner = Rectangle::new(area.x + 12.0, area.y + 12.0, area.width - 24.0, area.height - 36.0);
        d.draw_rectangle_rec(inner, Color::new(shade, shade, shade, 255));
        draw_progress(d, area, 0.0);
    }
}

fn draw_fitted(d: &mut RaylibDrawHandle, texture: &Texture2D, area: Rectangle) {
    let tex_width = texture.width() as f32;
    let tex_height = texture.height() as f32;
    d.draw_texture_pro(
        texture,
        Rectangle::new(0.0, 0.0, tex_width, tex_height),
        fit(tex_width, tex_height, area),
        Vector2::new(0.0, 0.0),
        0.0,
        Color::WHITE,
    );
}

fn draw_message(d: &mut RaylibDrawHandle, area: Rectangle, message: &str, color: Color) {
    let max_chars = ((area.width - 2.0 * MARGIN) / (FONT_SIZE as f32 * 0.55)).max(8.0) as usize;
    let lines = wrap(message, max_chars);
    let line_height = FONT_SIZE + 6;
    let top = (area.y + area.height * 0.5) as i32 - (lines.len() as i32 * line_height) / 2;
    for (i, line) in lines.iter().enumerate() {
        d.draw_text(line, (area.x + MARGIN) as i32, top + i as i32 * line_height, FONT_SIZE, color);
    }
}

fn draw_progress(d: &mut RaylibDrawHandle, area: Rectangle, progress: f32) {
    let track = Rectangle::new(
        area.x,
        area.y + area.height - PROGRESS_BAR_HEIGHT,
        area.width,
        PROGRESS_BAR_HEIGHT,
    );
    d.draw_rectangle_rec(track, TRACK);
    let fill = Rectangle::new(track.x, track.y, track.width * progress.clamp(0.0, 100.0) / 100.0, track.height);
    d.draw_rectangle_rec(fill, FILL);
}

fn draw_mute_button(d: &mut RaylibDrawHandle, button: Rectangle, muted: bool) {
    d.draw_rectangle_rounded(button, 0.5, 8, Color::new(0, 0, 0, 140));

    let cx = button.x + button.width * 0.5;
    let cy = button.y + button.height * 0.5;
    let s = button.width * 0.18;

    // Speaker body and cone
    d.draw_rectangle_rec(Rectangle::new(cx - 2.5 * s, cy - s * 0.7, s, s * 1.4), Color::WHITE);
    d.draw_triangle(
        Vector2::new(cx - 1.5 * s, cy),
        Vector2::new(cx, cy + 1.6 * s),
        Vector2::new(cx, cy - 1.6 * s),
        Color::WHITE,
    );

    if muted {
        d.draw_line_ex(Vector2::new(cx + 0.6 * s, cy - s), Vector2::new(cx + 2.4 * s, cy + s), 2.0, Color::WHITE);
        d.draw_line_ex(Vector2::new(cx + 0.6 * s, cy + s), Vector2::new(cx + 2.4 * s, cy - s), 2.0, Color::WHITE);
    } else {
        d.draw_line_ex(Vector2::new(cx + 0.8 * s, cy - 0.6 * s), Vector2::new(cx + 0.8 * s, cy + 0.6 * s), 2.0, Color::WHITE);
        d.draw_line_ex(Vector2::new(cx + 1.8 * s, cy - 1.2 * s), Vector2::new(cx + 1.8 * s, cy + 1.2 * s), 2.0, Color::WHITE);
    }
}
