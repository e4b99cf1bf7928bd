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

//! Autocomplete: trigger detection at the caret and directory search.

use std::rc::Rc;

use crate::buffer::{byte_index, utf16_offset};
use crate::{DirectoryEntity, DirectoryGroups, HostClient};

/// A trigger token found immediately before the caret, e.g. `@al`.
///
/// `start` and `end` are UTF-16 offsets into the text it was found in;
/// `text` includes the trigger character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionPattern {
    pub trigger: char,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl SuggestionPattern {
    /// The search query, without the trigger character.
    pub fn query(&self) -> &str {
        &self.text[self.trigger.len_utf8()..]
    }

    /// Whether `text` still holds this pattern at the same offsets.
    pub fn is_current(&self, text: &str) -> bool {
        let start = byte_index(text, self.start);
        let end = byte_index(text, self.end);
        start <= end && text[start..end] == self.text
    }
}

/// Scan backwards from `caret` for a word opened by `trigger`.
///
/// The trigger must start the text or follow whitespace, and be followed by
/// at least one character. Words starting with `[` are finished mention
/// tokens and never match.
pub fn find_suggestion(
    text: &str,
    caret: usize,
    trigger: char,
) -> Option<SuggestionPattern> {
    let end_byte = byte_index(text, caret);
    let before = &text[..end_byte];
    let word_start = before
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(index, ch)| index + ch.len_utf8());
    let word = &before[word_start..];

    let query = word.strip_prefix(trigger)?;
    if query.is_empty() || query.starts_with('[') {
        return None;
    }

    let start = utf16_offset(text, word_start);
    Some(SuggestionPattern {
        trigger,
        text: word.to_owned(),
        start,
        end: utf16_offset(text, end_byte),
    })
}

/// Flatten grouped search results, keeping group order and each group's
/// own order.
pub fn flatten_groups(groups: DirectoryGroups) -> Vec<DirectoryEntity> {
    groups.into_iter().flatten().collect()
}

/// Supplies autocomplete candidates from the host's directory.
pub struct DirectoryProvider<C> {
    client: Rc<C>,
}

impl<C> Clone for DirectoryProvider<C> {
    fn clone(&self) -> Self {
        Self {
            client: Rc::clone(&self.client),
        }
    }
}

impl<C: HostClient> DirectoryProvider<C> {
    pub fn new(client: Rc<C>) -> Self {
        Self { client }
    }

    /// Candidates for `query`. A failed search yields no candidates.
    pub async fn candidates(&self, query: &str) -> Vec<DirectoryEntity> {
        match self.client.search_directory(query).await {
            Ok(groups) => flatten_groups(groups),
            Err(error) => {
                tracing::warn!(query, %error, "Directory search failed");
                Vec::new()
            }
        }
    }
}
