//! Travel diary model.

use serde::{Deserialize, Serialize};

use super::{Document, MediaItem};
use crate::storage::content_type_from_name;

/// A personal journal entry that can be shared into the community feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Empty when the entry has no video
    #[serde(default)]
    pub video_url: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_post_id: Option<String>,
}

impl Document for Diary {
    const COLLECTION: &'static str = "diaries";
    const KIND: &'static str = "Diary";
}

impl Diary {
    /// Text of the feed post created when the entry is shared.
    pub fn share_text(&self) -> String {
        if self.text.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{}", self.title, self.text)
        }
    }

    /// Images followed by the video, as feed media.
    pub fn share_media(&self) -> Vec<MediaItem> {
        let mut media: Vec<MediaItem> = self
            .image_urls
            .iter()
            .map(|url| MediaItem {
                url: url.clone(),
                content_type: content_type_from_name(url, "image/jpeg"),
            })
            .collect();
        if !self.video_url.is_empty() {
            media.push(MediaItem {
                url: self.video_url.clone(),
                content_type: content_type_from_name(&self.video_url, "video/mp4"),
            });
        }
        media
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diary(video_url: &str) -> Diary {
        Diary {
            title: "Bali Trip".to_string(),
            text: "Rice terraces and temples".to_string(),
            image_urls: vec![
                "http://localhost/files/diaries/a.png".to_string(),
                "http://localhost/files/diaries/b".to_string(),
            ],
            video_url: video_url.to_string(),
            owner_id: "u1".to_string(),
            shared_post_id: None,
        }
    }

    #[test]
    fn test_share_media_orders_images_before_video() {
        let media = diary("http://localhost/files/diaries/v.webm").share_media();
        assert_eq!(media.len(), 3);
        assert_eq!(media[0].content_type, "image/png");
        assert_eq!(media[1].content_type, "image/jpeg");
        assert!(media[2].is_video());
        assert_eq!(media[2].content_type, "video/webm");
    }

    #[test]
    fn test_share_without_video() {
        let entry = diary("");
        assert_eq!(entry.share_media().len(), 2);
        assert_eq!(entry.share_text(), "Bali Trip\n\nRice terraces and temples");
    }
}
