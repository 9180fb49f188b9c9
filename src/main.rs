use std::sync::mpsc::TryRecvError;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use raylib::prelude::*;

mod config;
mod constants;
mod error;
mod ffmpeg;
mod logger;
mod media;
mod player;
mod scheduler;
mod slider;
mod source;
mod state;
mod texture_loader;
mod view;

use crate::config::Args;
use crate::constants::*;
use crate::error::LoadError;
use crate::media::MediaKind;
use crate::player::{AudioOut, VideoPlayer, VideoSignal};
use crate::scheduler::TimerQueue;
use crate::slider::Slider;
use crate::source::{HttpMediaList, build_client, spawn_fetch};
use crate::state::SliderPhase;
use crate::texture_loader::ImageLoader;
use crate::view::{SliderView, container_rect, mute_button_rect};

fn main() -> Result<()> {
    let args = Args::parse();
    logger::setup(args.debug, args.log_file.as_deref())?;
    log::info!("Media endpoint: {}, image duration: {} ms", args.endpoint, args.image_duration_ms);

    let client = build_client(args.http_timeout()).context("Failed to build HTTP client")?;

    let (mut rl, thread) = raylib::init()
        .size(args.width, args.height)
        .title("IKITIME")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    // --- Mount the slider and start the one-shot fetch ---
    let mut slider = Slider::new(args.slider_config(), TimerQueue::new(), VideoPlayer::new(AudioOut::open()));
    let media_list = spawn_fetch(HttpMediaList::new(client.clone(), args.endpoint.as_str()));
    let mut images = ImageLoader::new(client);
    let mut view = SliderView::new();
    let mut shown_activation = 0;

    // --- Main Loop ---
    while !rl.window_should_close() {
        let dt = rl.get_frame_time();

        // 1. Media list, once
        if slider.state().loading {
            match media_list.try_recv() {
                Ok(result) => slider.finish_load(result),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => slider.finish_load(Err(LoadError::Abandoned)),
            }
        }

        // 2. Image timers
        slider.tick(Duration::from_secs_f32(dt));

        // 3. Video signals
        for signal in slider.media_mut().poll(dt) {
            match signal {
                VideoSignal::MetadataLoaded => slider.on_video_metadata_loaded(),
                VideoSignal::TimeUpdate { position, duration } => slider.on_video_time_update(position, duration),
                VideoSignal::Ended => slider.on_video_ended(),
                VideoSignal::Error(message) => slider.on_video_error(&message),
            }
        }

        // 4. Input
        let area = container_rect(rl.get_screen_width(), rl.get_screen_height());
        let clicked_mute = rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT)
            && mute_button_rect(area).check_collision_point_rec(rl.get_mouse_position());
        if (clicked_mute || rl.is_key_pressed(KeyboardKey::KEY_M))
            && matches!(slider.phase(), SliderPhase::ShowingVideo(_))
        {
            slider.toggle_mute();
        }

        // 5. Textures for the active and the upcoming image
        {
            let state = slider.state();
            let mut keep = Vec::new();
            if !state.items.is_empty() {
                let next = (state.active_index + 1) % state.items.len();
                for item in [&state.items[state.active_index], &state.items[next]] {
                    if item.kind == MediaKind::Image {
                        images.request(&item.src);
                        keep.push(item.src.as_str());
                    }
                }
            }
            images.retain(&keep);
        }
        images.poll(&mut rl, &thread);

        if slider.activation() != shown_activation {
            shown_activation = slider.activation();
            view.clear_video();
        }
        if let Some(size) = slider.media().frame_size() {
            if let Some(pixels) = slider.media_mut().take_frame() {
                view.upload_video_frame(&mut rl, &thread, size, &pixels);
            }
        }

        // --- Render ---
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::RAYWHITE);
        view.draw(&mut d, area, slider.state(), &images);
    }

    slider.unmount();
    log::info!("Window closed");
    Ok(())
}
