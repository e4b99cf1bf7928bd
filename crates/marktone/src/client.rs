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

//! The host-facing data types and the transport trait the composer talks to.

use std::fmt;

use marktone_mentions::{EntityKind, Mention};
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// A mention supplied when the composer is created, e.g. the author of the
/// comment being replied to.
pub type ReplyMention = Mention;

/// Directory search results, one group per entity kind in the order the
/// directory service returns them.
pub type DirectoryGroups = Vec<Vec<DirectoryEntity>>;

/// A user, organization or group known to the host's directory service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: u64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

impl DirectoryEntity {
    pub fn mention(&self) -> Mention {
        Mention::new(self.kind, self.code.clone())
    }
}

/// The user the composer is running for. Injected at construction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    pub id: u64,
    pub code: String,
    pub name: String,
}

/// Server-assigned key of an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileKey(String);

impl FileKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FileKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file dropped onto the composer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DroppedFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn has_mime_prefix(&self, prefix: &str) -> bool {
        self.mime_type.starts_with(prefix)
    }
}

/// Authenticated access to the host's directory search and file upload.
///
/// Both calls run as local tasks on the composer's thread, so
/// implementations do not need to be `Send`.
#[allow(async_fn_in_trait)]
pub trait HostClient {
    /// Search users, organizations and groups matching `token`.
    async fn search_directory(
        &self,
        token: &str,
    ) -> Result<DirectoryGroups, ClientError>;

    /// Upload `file` and return the key the host assigned to it.
    async fn upload_file(
        &self,
        file: &DroppedFile,
    ) -> Result<FileKey, ClientError>;
}
