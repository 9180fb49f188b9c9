use crate::media::{MediaItem, MediaKind};

/// What the slider is doing, derived from [`SliderState`].
#[derive(Debug, PartialEq, Clone)]
pub enum SliderPhase {
    Loading,              // Waiting for the media list
    Failed(String),       // Load failed, terminal until remount
    Empty,                // Loaded, but nothing to show
    ShowingImage(usize),  // Image at the index is active
    ShowingVideo(usize),  // Video at the index is active
}

#[derive(Debug, Clone)]
pub struct SliderState {
    pub items: Vec<MediaItem>,
    pub active_index: usize,
    pub progress: f32,
    pub muted: bool,
    pub loading: bool,
    pub error_message: Option<String>,
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active_index: 0,
            progress: 0.0,
            muted: true, // autoplay with sound is not expected to work
            loading: true,
            error_message: None,
        }
    }
}

impl SliderState {
    pub fn active_item(&self) -> Option<&MediaItem> {
        self.items.get(self.active_index)
    }

    pub fn phase(&self) -> SliderPhase {
        if self.loading {
            return SliderPhase::Loading;
        }
        if let Some(message) = &self.error_message {
            return SliderPhase::Failed(message.clone());
        }
        match self.active_item().map(|item| item.kind) {
            None => SliderPhase::Empty,
            Some(MediaKind::Image) => SliderPhase::ShowingImage(self.active_index),
            Some(MediaKind::Video) => SliderPhase::ShowingVideo(self.active_index),
        }
    }
}
