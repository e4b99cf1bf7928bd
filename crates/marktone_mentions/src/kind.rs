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

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The kinds of directory entity a mention can point at.
///
/// `Display`/`FromStr` use the directory service's spelling (`USER`,
/// `ORGANIZATION`, `GROUP`); [`EntityKind::token_name`] gives the short form
/// used inside mention tokens.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    User,
    Organization,
    Group,
}

impl EntityKind {
    pub fn token_name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "org",
            Self::Group => "group",
        }
    }

    pub fn from_token_name(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Self::User),
            "org" => Some(Self::Organization),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}
