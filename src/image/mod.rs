use itertools::Itertools;
use serde::Serialize;

use crate::utils::encode_uri;

pub const IMAGE_DELIMITER: &str = ";;";
pub const CAPTION_SEPARATOR: &str = "、";
pub const NO_IMAGE_TEXT: &str = "無圖片";
pub const DEFAULT_ALT: &str = "藥物圖片";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageCandidate {
    pub url: String,
    pub alt: String,
}

impl ImageCandidate {
    /// Value to hand to an image element.
    pub fn src(&self) -> String {
        encode_uri(&self.url)
    }

    pub fn alt_or<'a>(&'a self, name: &'a str) -> &'a str {
        if !self.alt.is_empty() {
            &self.alt
        } else if !name.is_empty() {
            name
        } else {
            DEFAULT_ALT
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageSet {
    pub candidates: Vec<ImageCandidate>,
    pub captions: Vec<String>,
}

impl ImageSet {
    /// Text shown when no candidate loads.
    pub fn fallback_text(&self) -> String {
        if self.captions.is_empty() {
            NO_IMAGE_TEXT.to_string()
        } else {
            self.captions.join(CAPTION_SEPARATOR)
        }
    }
}

fn upgrade_to_https(url: &str) -> String {
    match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => {
            format!("https://{}", &url[7..])
        }
        _ => url.to_string(),
    }
}

/// Resolves the delimited image list of an entry into load candidates.
///
/// Captions pair with URLs by their segment position in the raw strings, so
/// an empty URL segment takes its caption out with it instead of shifting
/// later captions onto the wrong image. Each `http://` URL is preceded by
/// its `https://` form; duplicates keep their first occurrence.
pub fn parse_image_set(raw_urls: &str, raw_captions: &str) -> ImageSet {
    let caption_segments: Vec<&str> = raw_captions.split(IMAGE_DELIMITER).map(str::trim).collect();

    let mut expanded = Vec::new();
    for (i, url) in raw_urls.split(IMAGE_DELIMITER).map(str::trim).enumerate() {
        if url.is_empty() {
            continue;
        }
        let alt = caption_segments.get(i).copied().unwrap_or_default().to_string();
        let https = upgrade_to_https(url);
        if https != url {
            expanded.push(ImageCandidate {
                url: https,
                alt: alt.clone(),
            });
        }
        expanded.push(ImageCandidate {
            url: url.to_string(),
            alt,
        });
    }

    let candidates = expanded
        .into_iter()
        .unique_by(|c| c.url.clone())
        .collect();
    let captions = caption_segments
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    ImageSet {
        candidates,
        captions,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Trying(usize),
    Loaded(usize),
    Exhausted,
}

/// Walks an entry's candidates in order until one loads.
///
/// The renderer reports each load outcome; the loader answers with the next
/// source to try or switches to the caption fallback.
#[derive(Clone, Debug)]
pub struct ImageLoader {
    set: ImageSet,
    state: LoadState,
}

impl ImageLoader {
    pub fn new(set: ImageSet) -> Self {
        let state = if set.candidates.is_empty() {
            LoadState::Exhausted
        } else {
            LoadState::Trying(0)
        };
        Self { set, state }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn current(&self) -> Option<&ImageCandidate> {
        match self.state {
            LoadState::Trying(i) | LoadState::Loaded(i) => self.set.candidates.get(i),
            LoadState::Exhausted => None,
        }
    }

    pub fn on_error(&mut self) -> LoadState {
        if let LoadState::Trying(i) = self.state {
            let next = i + 1;
            self.state = if next < self.set.candidates.len() {
                LoadState::Trying(next)
            } else {
                LoadState::Exhausted
            };
        }
        self.state
    }

    pub fn on_load(&mut self) -> LoadState {
        if let LoadState::Trying(i) = self.state {
            self.state = LoadState::Loaded(i);
        }
        self.state
    }

    pub fn shows_fallback(&self) -> bool {
        self.state == LoadState::Exhausted
    }

    pub fn fallback_text(&self) -> String {
        self.set.fallback_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(set: &ImageSet) -> Vec<&str> {
        set.candidates.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn http_url_prefers_https_variant() {
        let set = parse_image_set("http://x/y.jpg", "");
        assert_eq!(urls(&set), vec!["https://x/y.jpg", "http://x/y.jpg"]);
    }

    #[test]
    fn upgrade_is_case_insensitive() {
        let set = parse_image_set("HTTP://x/y.jpg", "");
        assert_eq!(urls(&set), vec!["https://x/y.jpg", "HTTP://x/y.jpg"]);
    }

    #[test]
    fn https_url_has_single_candidate() {
        let set = parse_image_set("https://x/y.jpg", "cap");
        assert_eq!(urls(&set), vec!["https://x/y.jpg"]);
        assert_eq!(set.candidates[0].alt, "cap");
    }

    #[test]
    fn duplicates_are_removed_keeping_first() {
        let set = parse_image_set("http://a.png;;http://a.png", "one;;two");
        assert_eq!(urls(&set), vec!["https://a.png", "http://a.png"]);
        assert_eq!(set.candidates[0].alt, "one");
        assert_eq!(set.candidates[1].alt, "one");
    }

    #[test]
    fn captions_stay_with_their_url_position() {
        let set = parse_image_set(" ;;https://b.png", "lost;;b caption");
        assert_eq!(urls(&set), vec!["https://b.png"]);
        assert_eq!(set.candidates[0].alt, "b caption");
        assert_eq!(set.captions, vec!["lost", "b caption"]);
    }

    #[test]
    fn missing_caption_is_empty() {
        let set = parse_image_set("https://a.png;;https://b.png", "a");
        assert_eq!(set.candidates[1].alt, "");
    }

    #[test]
    fn fallback_text_joins_captions() {
        let set = parse_image_set("", " 白色粉末 ;; ;;藥錠");
        assert!(set.candidates.is_empty());
        assert_eq!(set.fallback_text(), "白色粉末、藥錠");
        assert_eq!(parse_image_set("", "").fallback_text(), NO_IMAGE_TEXT);
    }

    #[test]
    fn alt_falls_back_to_name_then_default() {
        let c = ImageCandidate {
            url: "https://a.png".to_string(),
            alt: String::new(),
        };
        assert_eq!(c.alt_or("安非他命"), "安非他命");
        assert_eq!(c.alt_or(""), DEFAULT_ALT);
    }

    #[test]
    fn loader_advances_until_exhausted() {
        let mut loader = ImageLoader::new(parse_image_set("http://a.png;;https://b.png", ""));
        assert_eq!(loader.state(), LoadState::Trying(0));
        assert_eq!(loader.current().map(|c| c.url.as_str()), Some("https://a.png"));
        assert_eq!(loader.on_error(), LoadState::Trying(1));
        assert_eq!(loader.on_error(), LoadState::Trying(2));
        assert_eq!(loader.on_error(), LoadState::Exhausted);
        assert!(loader.shows_fallback());
        assert_eq!(loader.on_error(), LoadState::Exhausted);
        assert_eq!(loader.on_load(), LoadState::Exhausted);
    }

    #[test]
    fn loader_stops_on_first_load() {
        let mut loader = ImageLoader::new(parse_image_set("http://a.png", ""));
        assert_eq!(loader.on_error(), LoadState::Trying(1));
        assert_eq!(loader.on_load(), LoadState::Loaded(1));
        assert_eq!(loader.on_error(), LoadState::Loaded(1));
        assert!(!loader.shows_fallback());
        assert_eq!(loader.current().map(|c| c.url.as_str()), Some("http://a.png"));
    }

    #[test]
    fn loader_without_candidates_starts_exhausted() {
        let loader = ImageLoader::new(parse_image_set("", "cap"));
        assert!(loader.shows_fallback());
        assert_eq!(loader.fallback_text(), "cap");
    }
}
