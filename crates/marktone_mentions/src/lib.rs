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

//! Mention tokens as they appear inside Markdown source.
//!
//! A mention is written as `@[<kind>:<code>]`, for example
//! `@[user:alice]` or `@[org:sales]`. The token is what the autocomplete
//! inserts and what the renderer later expands into a display element once
//! the directory entity behind `code` is known.

mod kind;
mod mention;

pub use kind::EntityKind;
pub use mention::{find_mentions, Mention, MentionMatch};
