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
// - Suno handler -

use std::sync::LazyLock;

use regex::Regex;

use crate::definitions::{ExtractError, MediaRecord, SiteDefinition};
use crate::resolver::{PageMetadataResolver, SiteProfile};

// Only the embed page carries the track metadata inline.
static EMBED_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?suno\.com/embed/(?P<id>[a-zA-Z0-9_-]+)$").unwrap()
});

pub const SUNO: SiteProfile = SiteProfile {
    origin: "https://suno.com",
    site_name: "Suno",
};

// Implement the site definition:
struct SunoHandler;
impl SiteDefinition for SunoHandler {
    fn can_handle_url(&self, url: &str) -> bool {
        EMBED_URL_RE.is_match(url)
    }

    fn media_id(&self, url: &str) -> Option<String> {
        EMBED_URL_RE
            .captures(url)
            .and_then(|caps| caps.name("id"))
            .map(|id| id.as_str().to_string())
    }

    fn resolve(&self, page: &str, id: &str) -> Result<MediaRecord, ExtractError> {
        PageMetadataResolver::new(SUNO).resolve(page, id)
    }

    fn display_name(&self) -> String {
        "Suno".to_string()
    }
}

// Push the site definition to the list of known handlers:
inventory::submit! {
    &SunoHandler as &dyn SiteDefinition
}
