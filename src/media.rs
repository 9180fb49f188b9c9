use reqwest::Url;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "ogg", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub src: String,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Lowercased extension of the last path segment of `src`.
pub fn extension(src: &str) -> Option<String> {
    if src.is_empty() {
        return None;
    }

    let path = match Url::parse(src) {
        Ok(url) => url.path().to_string(),
        Err(_) => src.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    // Last path segment only, so a dot in a directory name is not an extension
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let (_, extension) = file_name.rsplit_once('.')?;
    Some(extension.to_lowercase())
}

/// Infers the media kind from the extension of the URL's path.
///
/// Absolute URLs are parsed so that query strings and fragments never leak
/// into the extension. Anything that does not parse is treated as a bare
/// path with its `?query` and `#fragment` cut off.
pub fn classify(src: &str) -> Option<MediaKind> {
    let extension = extension(src)?;

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Keeps the order of `urls`, dropping the ones with unrecognized extensions.
pub fn to_media_items<I, S>(urls: I) -> Vec<MediaItem>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    urls.into_iter()
        .filter_map(|src| {
            let src = src.into();
            match classify(&src) {
                Some(kind) => Some(MediaItem { src, kind }),
                None => {
                    log::debug!("Dropping media URL with unrecognized extension: {}", src);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_image_extension_is_an_image() {
        for ext in IMAGE_EXTENSIONS {
            let url = format!("https://ikitime.ir/medias/photo.{}", ext);
            assert_eq!(classify(&url), Some(MediaKind::Image), "{}", url);
        }
    }

    #[test]
    fn every_video_extension_is_a_video() {
        for ext in VIDEO_EXTENSIONS {
            let url = format!("https://ikitime.ir/medias/clip.{}", ext);
            assert_eq!(classify(&url), Some(MediaKind::Video), "{}", url);
        }
    }

    #[test]
    fn extension_match_ignores_case() {
        assert_eq!(classify("https://x.ir/A.JPG"), Some(MediaKind::Image));
        assert_eq!(classify("https://x.ir/B.MoV"), Some(MediaKind::Video));
    }

    #[test]
    fn query_and_fragment_do_not_count() {
        assert_eq!(classify("https://x.ir/a.mp4?v=2.txt"), Some(MediaKind::Video));
        assert_eq!(classify("https://x.ir/a.png#frag.mp4"), Some(MediaKind::Image));
        assert_eq!(classify("https://x.ir/list.php?file=a.jpg"), None);
        assert_eq!(classify("relative/a.webp?size=2"), Some(MediaKind::Image));
    }

    #[test]
    fn unknown_or_missing_extensions_are_rejected() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("c.txt"), None);
        assert_eq!(classify("https://x.ir/no-extension"), None);
        assert_eq!(classify("https://x.ir/dir.jpg/file"), None);
        assert_eq!(classify("https://x.ir/"), None);
    }

    #[test]
    fn conversion_keeps_order_and_drops_unknown() {
        let items = to_media_items(["a.jpg", "b.mp4", "c.txt", "d.gif"]);
        assert_eq!(
            items,
            vec![
                MediaItem { src: "a.jpg".into(), kind: MediaKind::Image },
                MediaItem { src: "b.mp4".into(), kind: MediaKind::Video },
                MediaItem { src: "d.gif".into(), kind: MediaKind::Image },
            ]
        );
    }
}
