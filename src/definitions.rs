/*
 * The contents of this file are subject to the terms of the
 * Common Development and Distribution License, Version 1.0 only
 * (the "License").  You may not use this file except in compliance
 * with the License.
 *
 * See the file LICENSE in this distribution for details.
 * A copy of the CDDL is also available via the Internet at
 * http://www.opensource.org/licenses/cddl1.txt
 *
 * When distributing Covered Code, include this CDDL HEADER in each
 * file and include the contents of the LICENSE file from this
 * distribution.
 */

// Yet Another Suno Down Loader
// - definitions.rs file -

use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

// The only way a site handler can fail on a page it was given.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

impl ExtractError {
    pub fn no_audio_url() -> Self {
        ExtractError::ExtractionFailed(
            "no audio URL located; the page structure may have changed".to_string(),
        )
    }

    // Expected errors are reported per item; the batch goes on.
    pub fn is_expected(&self) -> bool {
        match self {
            ExtractError::ExtractionFailed(_) => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    // An audio stream without any video.
    Audio,
}

impl MediaKind {
    pub fn ext(&self) -> &'static str {
        match self {
            MediaKind::Audio => "mp3",
        }
    }

    pub fn vcodec(&self) -> &'static str {
        match self {
            MediaKind::Audio => "none",
        }
    }
}

/// Everything a handler found out about one piece of media.
///
/// Only `media_url` is guaranteed; every other field is best-effort.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub media_url: Url,
    pub duration_seconds: Option<f64>,
    pub uploader: Option<String>,
    pub kind: MediaKind,
}

impl MediaRecord {
    pub fn ext(&self) -> &'static str {
        self.kind.ext()
    }

    // "<title> [<id>].<ext>", without characters file systems dislike.
    // The ID keeps tracks that share a title apart.
    pub fn file_name(&self) -> String {
        format!(
            "{} [{}].{}",
            self.title
                .trim()
                .replace(&['|', '\'', '\"', ':', '\\', '/', '?', '*'][..], ""),
            self.id,
            self.ext()
        )
    }

    // The info dictionary handed to the downloader (and to --dump-json).
    pub fn to_info_json(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "url": self.media_url.as_str(),
            "ext": self.kind.ext(),
            "duration": self.duration_seconds,
            "uploader": self.uploader,
            "vcodec": self.kind.vcodec(),
        })
    }
}

// Define the public interface for site definitions:
pub trait SiteDefinition: Sync {
    // true, if this site can handle <url>.
    fn can_handle_url(&self, url: &str) -> bool;

    // returns the media ID embedded in <url>.
    fn media_id(&self, url: &str) -> Option<String>;

    // turns the fetched page into a media record.
    fn resolve(&self, page: &str, id: &str) -> Result<MediaRecord, ExtractError>;

    // returns the name of the site (e.g. "Suno").
    fn display_name(&self) -> String;
}

inventory::collect!(&'static dyn SiteDefinition);

// Find a known handler for <url>:
pub fn find_handler(url: &str) -> Option<&'static dyn SiteDefinition> {
    inventory::iter::<&'static dyn SiteDefinition>
        .into_iter()
        .copied()
        .find(|handler| handler.can_handle_url(url))
}
