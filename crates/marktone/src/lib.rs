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

//! Model code for the Marktone comment composer.
//!
//! The composer owns a Markdown buffer and caret, renders the buffer to
//! sanitized HTML on every change and pushes that HTML to a host-owned
//! render target. Three kinds of asynchronous work feed back into the same
//! buffer: directory lookups for `@` mentions, autocomplete searches and
//! image uploads. All of them run as local tasks on one thread and only
//! touch the buffer between their own suspension points.

mod buffer;
mod client;
mod composer;
pub mod config;
mod directory;
mod error;
pub mod host;
mod render;
mod resolver;
mod sanitize;
mod spawn;
mod sync;
mod upload;

#[cfg(test)]
mod tests;

pub use crate::buffer::{utf16_len, TextBuffer};
pub use crate::client::{
    DirectoryEntity, DirectoryGroups, DroppedFile, FileKey, HostClient,
    LoginUser, ReplyMention,
};
pub use crate::composer::{initial_text, Composer};
pub use crate::config::ComposerConfig;
pub use crate::directory::{
    find_suggestion, flatten_groups, DirectoryProvider, SuggestionPattern,
};
pub use crate::error::{ClientError, ConfigError};
pub use crate::render::Renderer;
pub use crate::resolver::MentionResolver;
pub use crate::sanitize::is_safe_url;
pub use crate::sync::{InputSurface, RenderTarget, RenderTargetSync};
pub use crate::upload::{
    placeholder_text, reference_text, CompletedUpload, UploadQueue,
    UploadState, UploadTask,
};
pub use marktone_mentions::{EntityKind, Mention};
