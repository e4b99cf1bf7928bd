// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Removal of executable content from the render stream.
//!
//! Raw HTML written in the Markdown source is turned into text, and link or
//! image destinations with a scheme outside [`ALLOWED_SCHEMES`] are emptied.
//! Markup produced by mention expansion is passed through untouched.

use pulldown_cmark::{CowStr, Event, Tag};
use url::Url;

use crate::render::Segment;

/// `tmp:` is the scheme the host uses for freshly uploaded attachments.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tmp"];

/// Whether `url` may be used as a link or image destination.
///
/// Relative URLs are allowed; absolute ones need an allowed scheme.
pub fn is_safe_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => ALLOWED_SCHEMES.contains(&parsed.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

pub(crate) fn sanitize(segment: Segment<'_>) -> Event<'_> {
    match segment {
        Segment::Mention(html) => Event::InlineHtml(CowStr::from(html)),
        Segment::Markdown(event) => sanitize_event(event),
    }
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_destination(dest_url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&dest_url) {
        dest_url
    } else {
        tracing::debug!(url = %dest_url, "Dropped unsafe destination");
        CowStr::Borrowed("")
    }
}
