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

use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::EntityKind;

static MENTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\[(user|org|group):([^\]\[\s]+)\]")
        .expect("mention pattern is a valid regex")
});

/// A reference to a directory entity embedded in Markdown source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub code: String,
}

impl Mention {
    pub fn new(kind: EntityKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }

    /// The token text inserted into the Markdown source.
    pub fn to_token(&self) -> String {
        format!("@[{}:{}]", self.kind.token_name(), self.code)
    }

    /// Parse `text` as exactly one mention token.
    ///
    /// Returns `None` when `text` is not a token or carries anything
    /// before or after it.
    pub fn parse(text: &str) -> Option<Self> {
        let found = find_mentions(text).next()?;
        (found.range == (0..text.len())).then_some(found.mention)
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@[{}:{}]", self.kind.token_name(), self.code)
    }
}

/// A mention found inside a larger text, with its byte range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionMatch {
    pub mention: Mention,
    pub range: Range<usize>,
}

/// Iterate over every mention token in `text`, in order of appearance.
pub fn find_mentions(text: &str) -> impl Iterator<Item = MentionMatch> + '_ {
    MENTION_REGEX.captures_iter(text).filter_map(|captures| {
        let whole = captures.get(0)?;
        let kind = EntityKind::from_token_name(captures.get(1)?.as_str())?;
        let code = captures.get(2)?.as_str();
        Some(MentionMatch {
            mention: Mention::new(kind, code),
            range: whole.range(),
        })
    })
}
