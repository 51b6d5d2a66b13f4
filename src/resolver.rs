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
// - resolver.rs file -

//! Turns the markup of an embed page into a [`MediaRecord`].
//!
//! Each field has its own ordered list of rules. A rule looks at the page
//! and maybe returns a raw value; the first value that survives validation
//! wins. Only the audio URL is mandatory.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::definitions::{ExtractError, MediaKind, MediaRecord};
use crate::scrape::{
    as_text, float_or_none, html_search_meta, json_field, og_search, search_regex, tag_attr,
    tag_text, try_get, url_or_none, JsonKeys, Page,
};

/// A single extraction rule: look at the page, maybe find a raw value.
pub type Rule = fn(&Page) -> Option<String>;

/// Where a site lives and what it calls itself.
#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    // Relative media paths are resolved against this.
    pub origin: &'static str,
    // Stripped from titles as " | <site_name>".
    pub site_name: &'static str,
}

/// The rule chains, one per field, in priority order.
///
/// The title is assembled from three chains: the HTML one, the embedded JSON
/// one (which wins when it is strictly longer) and the meta tag one (used when
/// neither of the others found anything).
#[derive(Clone)]
pub struct FieldRules {
    pub audio_url: Vec<Rule>,
    pub title_html: Vec<Rule>,
    pub title_json: Vec<Rule>,
    pub title_meta: Vec<Rule>,
    pub description: Vec<Rule>,
    pub duration: Vec<Rule>,
    pub uploader: Vec<Rule>,
}

impl Default for FieldRules {
    fn default() -> Self {
        FieldRules {
            audio_url: vec![
                audio_url_key_value,
                embedded_json_audio_url,
                audio_tag_src,
                data_audio_url,
            ],
            title_html: vec![title_tag, first_h1],
            title_json: vec![json_title as Rule],
            title_meta: vec![og_title, meta_title],
            description: vec![og_description, meta_description, escaped_og_description],
            duration: vec![duration_text, json_duration],
            uploader: vec![json_display_name, json_uploader, meta_author, loose_artist],
        }
    }
}

pub struct PageMetadataResolver {
    profile: SiteProfile,
    rules: FieldRules,
}

impl PageMetadataResolver {
    pub fn new(profile: SiteProfile) -> Self {
        Self::with_rules(profile, FieldRules::default())
    }

    pub fn with_rules(profile: SiteProfile, rules: FieldRules) -> Self {
        PageMetadataResolver { profile, rules }
    }

    /// Runs every chain over `page_text`.
    ///
    /// Fails with [`ExtractError::ExtractionFailed`] only if no usable audio
    /// URL turns up; `id` doubles as the title when the page has none.
    pub fn resolve(&self, page_text: &str, id: &str) -> Result<MediaRecord, ExtractError> {
        let page = Page::parse(page_text);

        let media_url = self.audio_url(&page).ok_or_else(ExtractError::no_audio_url)?;
        let title = self.title(&page).unwrap_or_else(|| id.to_string());
        let description = first_valid(&self.rules.description, &page, Some);
        let duration_seconds = first_valid(&self.rules.duration, &page, |d| float_or_none(&d));
        let uploader = first_valid(&self.rules.uploader, &page, Some);

        Ok(MediaRecord {
            id: id.to_string(),
            title,
            description,
            media_url,
            duration_seconds,
            uploader,
            kind: MediaKind::Audio,
        })
    }

    fn audio_url(&self, page: &Page) -> Option<Url> {
        self.rules
            .audio_url
            .iter()
            .enumerate()
            .find_map(|(index, rule)| {
                let candidate = rule(page)?;
                match self.absolutize(&candidate) {
                    Some(url) => {
                        debug!(rule = index, url = %url, "audio URL located");
                        Some(url)
                    }
                    None => {
                        debug!(rule = index, %candidate, "discarding audio URL candidate");
                        None
                    }
                }
            })
    }

    // Values without a scheme are paths on the site itself.
    fn absolutize(&self, candidate: &str) -> Option<Url> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        if SCHEME_RE.is_match(candidate) {
            return url_or_none(candidate);
        }

        let joined = Url::parse(self.profile.origin).ok()?.join(candidate).ok()?;
        url_or_none(joined.as_str())
    }

    fn title(&self, page: &Page) -> Option<String> {
        let strip = |t: String| Some(self.strip_site_suffix(&t)).filter(|t| !t.is_empty());

        let html = first_valid(&self.rules.title_html, page, strip);
        let json = first_valid(&self.rules.title_json, page, strip);

        match (html, json) {
            (Some(html), Some(json)) if json.chars().count() > html.chars().count() => Some(json),
            (Some(html), _) => Some(html),
            (None, Some(json)) => Some(json),
            (None, None) => first_valid(&self.rules.title_meta, page, strip),
        }
    }

    fn strip_site_suffix(&self, title: &str) -> String {
        let suffix = format!(" | {}", self.profile.site_name);
        let title = title.trim();
        title.strip_suffix(suffix.as_str()).unwrap_or(title).trim().to_string()
    }
}

fn first_valid<T>(
    rules: &[Rule],
    page: &Page,
    validate: impl Fn(String) -> Option<T>,
) -> Option<T> {
    rules.iter().find_map(|rule| rule(page).and_then(&validate))
}

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").unwrap());

static AUDIO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // The value has to end in .mp3; signed URLs are left to the JSON rule.
    Regex::new(r#"(?i)audio_?url\\?["']\s*:\s*\\?["']\s*([^"'\\\s]+\.mp3)\\?["']"#).unwrap()
});

static TITLE_KEYS: LazyLock<JsonKeys> =
    LazyLock::new(|| JsonKeys::new(&["title", "name", "track_name"]));
static DISPLAY_NAME_KEYS: LazyLock<JsonKeys> =
    LazyLock::new(|| JsonKeys::new(&["display_name"]));
static UPLOADER_KEYS: LazyLock<JsonKeys> = LazyLock::new(|| JsonKeys::new(&["uploader"]));

static ESCAPED_OG_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\\?["']og:description\\?["'][^"']*\\?["']content\\?["']\s*:\s*\\?["']([^"'\\]+)\\?["']"#,
    )
    .unwrap()
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"duration\\?["']?\s*:\s*\\?["']?([0-9.]+)"#).unwrap()
});

static LOOSE_ARTIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:artist|creator|by)\s*:\s*([^<>"'\r\n]{1,100})"#).unwrap()
});

// Audio URL rules.

pub fn audio_url_key_value(page: &Page) -> Option<String> {
    search_regex(page.text, &AUDIO_URL_RE)
}

pub fn embedded_json_audio_url(page: &Page) -> Option<String> {
    try_get(&page.blobs, &["audio_url", "audioUrl", "url", "src"], |v| {
        as_text(v).filter(|s| url_or_none(s).is_some() || s.starts_with('/'))
    })
}

pub fn audio_tag_src(page: &Page) -> Option<String> {
    tag_attr(
        page,
        r#"audio[src], source[type^="audio/"][src], audio source[src]"#,
        "src",
    )
}

pub fn data_audio_url(page: &Page) -> Option<String> {
    tag_attr(page, "[data-audio-url]", "data-audio-url")
}

// Title rules.

pub fn title_tag(page: &Page) -> Option<String> {
    tag_text(page, "title")
}

pub fn first_h1(page: &Page) -> Option<String> {
    tag_text(page, "h1")
}

pub fn json_title(page: &Page) -> Option<String> {
    json_field(page, &TITLE_KEYS)
}

pub fn og_title(page: &Page) -> Option<String> {
    og_search(page, "title")
}

pub fn meta_title(page: &Page) -> Option<String> {
    html_search_meta(page, &["title", "twitter:title"])
}

// Description rules.

pub fn og_description(page: &Page) -> Option<String> {
    og_search(page, "description")
}

pub fn meta_description(page: &Page) -> Option<String> {
    html_search_meta(page, &["description"])
}

pub fn escaped_og_description(page: &Page) -> Option<String> {
    search_regex(page.text, &ESCAPED_OG_DESCRIPTION_RE)
}

// Duration rules.

pub fn duration_text(page: &Page) -> Option<String> {
    search_regex(page.text, &DURATION_RE)
}

pub fn json_duration(page: &Page) -> Option<String> {
    try_get(&page.blobs, &["duration"], |v| {
        v.as_f64().map(|d| d.to_string()).or_else(|| as_text(v))
    })
}

// Uploader rules.

pub fn json_display_name(page: &Page) -> Option<String> {
    json_field(page, &DISPLAY_NAME_KEYS)
}

pub fn json_uploader(page: &Page) -> Option<String> {
    json_field(page, &UPLOADER_KEYS)
}

pub fn meta_author(page: &Page) -> Option<String> {
    html_search_meta(page, &["author"])
}

pub fn loose_artist(page: &Page) -> Option<String> {
    search_regex(page.text, &LOOSE_ARTIST_RE)
}
