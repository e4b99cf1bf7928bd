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

//! Test doubles for the host collaborators.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use tokio::sync::oneshot;
use tokio::task::LocalSet;

use crate::{
    ClientError, DirectoryEntity, DirectoryGroups, DroppedFile, EntityKind,
    FileKey, HostClient, InputSurface, LoginUser, RenderTarget,
};

pub fn entity(
    kind: EntityKind,
    id: u64,
    code: &str,
    name: &str,
) -> DirectoryEntity {
    DirectoryEntity {
        kind,
        id,
        code: code.to_owned(),
        name: name.to_owned(),
        avatar: format!("https://example.com/avatar/{id}.png"),
    }
}

pub fn login_user(code: &str) -> LoginUser {
    LoginUser {
        id: 1,
        code: code.to_owned(),
        name: code.to_uppercase(),
    }
}

pub fn png(name: &str) -> DroppedFile {
    DroppedFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

/// Run `future` on a fresh `LocalSet` so it can spawn local tasks.
pub async fn run_local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

/// Give spawned local tasks a chance to run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

type UploadGate = oneshot::Receiver<Result<FileKey, ClientError>>;

/// A [`HostClient`] whose answers are scripted by the test.
///
/// Searches answer with the configured directory regardless of the query.
/// Searches and uploads can be gated so they only complete when the test
/// releases them.
#[derive(Default)]
pub struct FakeClient {
    directory: RefCell<DirectoryGroups>,
    fail_search: Cell<bool>,
    searches: RefCell<Vec<String>>,
    search_gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    upload_gates: RefCell<HashMap<String, UploadGate>>,
    uploads_started: RefCell<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_directory(&self, groups: DirectoryGroups) {
        *self.directory.borrow_mut() = groups;
    }

    pub fn fail_searches(&self, fail: bool) {
        self.fail_search.set(fail);
    }

    /// Hold searches for `token` until the returned sender fires.
    pub fn gate_search(&self, token: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.search_gates.borrow_mut().insert(token.to_owned(), rx);
        tx
    }

    /// Hold the upload of `file_name` until the returned sender fires
    /// with the upload result.
    pub fn gate_upload(
        &self,
        file_name: &str,
    ) -> oneshot::Sender<Result<FileKey, ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.upload_gates
            .borrow_mut()
            .insert(file_name.to_owned(), rx);
        tx
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.borrow().clone()
    }

    pub fn uploads_started(&self) -> Vec<String> {
        self.uploads_started.borrow().clone()
    }
}

impl HostClient for FakeClient {
    async fn search_directory(
        &self,
        token: &str,
    ) -> Result<DirectoryGroups, ClientError> {
        self.searches.borrow_mut().push(token.to_owned());
        let gate = self.search_gates.borrow_mut().remove(token);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_search.get() {
            return Err(ClientError::Search("directory unavailable".into()));
        }
        Ok(self.directory.borrow().clone())
    }

    async fn upload_file(
        &self,
        file: &DroppedFile,
    ) -> Result<FileKey, ClientError> {
        self.uploads_started.borrow_mut().push(file.name.clone());
        let gate = self.upload_gates.borrow_mut().remove(&file.name);
        match gate {
            Some(gate) => gate.await.unwrap_or_else(|_| {
                Err(ClientError::Upload("gate dropped".into()))
            }),
            None => Ok(FileKey::new(format!("key-{}", file.name))),
        }
    }
}

/// A [`RenderTarget`] that keeps every pushed value.
#[derive(Default)]
pub struct RecordingTarget {
    pushed: RefCell<Vec<String>>,
}

impl RecordingTarget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pushed(&self) -> Vec<String> {
        self.pushed.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.pushed.borrow().last().cloned()
    }
}

impl RenderTarget for RecordingTarget {
    fn set_html(&self, html: &str) {
        self.pushed.borrow_mut().push(html.to_owned());
    }
}

/// An [`InputSurface`] that keeps every text and caret written to it.
#[derive(Default)]
pub struct RecordingSurface {
    writes: RefCell<Vec<(String, usize)>>,
}

impl RecordingSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn writes(&self) -> Vec<(String, usize)> {
        self.writes.borrow().clone()
    }

    /// What the text area shows now, as `(text, caret)`.
    pub fn current(&self) -> Option<(String, usize)> {
        self.writes.borrow().last().cloned()
    }

    pub fn text(&self) -> String {
        self.current().map(|(text, _)| text).unwrap_or_default()
    }
}

impl InputSurface for RecordingSurface {
    fn set_text(&self, text: &str, caret: usize) {
        self.writes.borrow_mut().push((text.to_owned(), caret));
    }
}
