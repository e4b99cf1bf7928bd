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

//! The editor controller tying buffer, resolver, renderer and uploads
//! together.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use marktone_mentions::{EntityKind, Mention};

use crate::buffer::utf16_len;
use crate::spawn::spawn_local;
use crate::{
    find_suggestion, ClientError, CompletedUpload, ComposerConfig,
    DirectoryEntity, DirectoryProvider, DroppedFile, FileKey, HostClient,
    InputSurface, LoginUser, MentionResolver, RenderTarget, RenderTargetSync,
    Renderer, ReplyMention, SuggestionPattern, TextBuffer, UploadQueue,
    UploadTask,
};

/// The text a composer starts with when opened as a reply.
///
/// The login user never mentions themselves; the remaining mentions are
/// separated by spaces and followed by one space to type after.
pub fn initial_text(
    reply_mentions: &[ReplyMention],
    login_user: &LoginUser,
) -> String {
    let mentions: Vec<String> = reply_mentions
        .iter()
        .filter(|mention| {
            mention.kind != EntityKind::User || mention.code != login_user.code
        })
        .map(Mention::to_token)
        .collect();
    if mentions.is_empty() {
        String::new()
    } else {
        format!("{} ", mentions.join(" "))
    }
}

struct EditorState {
    buffer: TextBuffer,
    rendered: String,
    dragging: bool,
    destroyed: bool,
}

struct Shared<C> {
    config: ComposerConfig,
    client: Rc<C>,
    provider: DirectoryProvider<C>,
    resolver: MentionResolver,
    renderer: Renderer,
    sync: RenderTargetSync,
    surface: Rc<dyn InputSurface>,
    state: RefCell<EditorState>,
    uploads: RefCell<UploadQueue>,
}

/// A Markdown comment composer.
///
/// All methods are meant to be called from the thread that owns the
/// composer. Async work (mention lookups, uploads) runs as local tasks that
/// hold only weak references, so dropping or destroying the composer turns
/// their completions into no-ops.
///
/// With the `sys` feature those tasks are spawned with
/// `tokio::task::spawn_local`, so the composer must be created and driven
/// inside a tokio `LocalSet`.
pub struct Composer<C: HostClient + 'static> {
    shared: Rc<Shared<C>>,
}

impl<C: HostClient + 'static> Clone for Composer<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<C: HostClient + 'static> Composer<C> {
    /// Create a composer seeded from `reply_mentions`.
    ///
    /// The initial text is written to `surface` with the caret at its end
    /// and rendered once to `target`.
    pub fn new(
        config: ComposerConfig,
        login_user: &LoginUser,
        reply_mentions: &[ReplyMention],
        client: Rc<C>,
        resolver: MentionResolver,
        target: Rc<dyn RenderTarget>,
        surface: Rc<dyn InputSurface>,
    ) -> Self {
        let mut buffer = TextBuffer::new(initial_text(reply_mentions, login_user));
        buffer.set_caret(buffer.len());

        let shared = Rc::new(Shared {
            config,
            provider: DirectoryProvider::new(Rc::clone(&client)),
            client,
            resolver,
            renderer: Renderer::new(),
            sync: RenderTargetSync::new(target),
            surface,
            state: RefCell::new(EditorState {
                buffer,
                rendered: String::new(),
                dragging: false,
                destroyed: false,
            }),
            uploads: RefCell::new(UploadQueue::new()),
        });
        shared.write_surface();
        shared.commit();
        Self { shared }
    }

    /// The user edited the text; `caret` is where the input surface put the
    /// caret afterwards.
    pub fn input(&self, text: impl Into<String>, caret: usize) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.buffer.replace(text);
            state.buffer.set_caret(caret);
        }
        self.shared.commit();
    }

    pub fn set_caret(&self, position: usize) {
        self.shared.state.borrow_mut().buffer.set_caret(position);
    }

    pub fn raw_text(&self) -> String {
        self.shared.state.borrow().buffer.read().to_owned()
    }

    pub fn caret(&self) -> usize {
        self.shared.state.borrow().buffer.caret()
    }

    pub fn rendered_html(&self) -> String {
        self.shared.state.borrow().rendered.clone()
    }

    pub fn resolver(&self) -> &MentionResolver {
        &self.shared.resolver
    }

    /// The trigger word right before the caret, if the autocomplete should
    /// be open.
    pub fn suggestion(&self) -> Option<SuggestionPattern> {
        let state = self.shared.state.borrow();
        if state.destroyed {
            return None;
        }
        find_suggestion(
            state.buffer.read(),
            state.buffer.caret(),
            self.shared.config.mentions.trigger,
        )
    }

    /// Autocomplete candidates for `query`, flattened in directory order.
    pub async fn candidates(&self, query: &str) -> Vec<DirectoryEntity> {
        self.shared.provider.candidates(query).await
    }

    /// Replace `suggestion` with a mention of `entity` and put the caret
    /// after it.
    ///
    /// If the text changed since the suggestion was found, the trigger word
    /// is looked up again at the caret. Returns whether anything was
    /// inserted.
    pub fn select_candidate(
        &self,
        suggestion: &SuggestionPattern,
        entity: &DirectoryEntity,
    ) -> bool {
        let token = entity.mention().to_token();
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return false;
            }
            let target = if suggestion.is_current(state.buffer.read()) {
                Some(suggestion.clone())
            } else {
                find_suggestion(
                    state.buffer.read(),
                    state.buffer.caret(),
                    suggestion.trigger,
                )
            };
            let Some(target) = target else {
                tracing::debug!(
                    code = %entity.code,
                    "Suggestion no longer in text, selection dropped"
                );
                return false;
            };

            state
                .buffer
                .splice(target.start, target.end - target.start, &token);
            state.buffer.set_caret(target.start + utf16_len(&token));
        }
        self.shared.resolver.insert(entity.clone());
        self.shared.write_surface();
        self.shared.commit();
        true
    }

    pub fn drag_enter(&self) {
        if self.shared.config.upload.enabled {
            self.shared.state.borrow_mut().dragging = true;
        }
    }

    pub fn drag_leave(&self) {
        self.shared.state.borrow_mut().dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.shared.state.borrow().dragging
    }

    /// Queue dropped files for upload in the order given. Non-images are
    /// skipped. Returns how many files were queued.
    ///
    /// If no upload is running, the first file's placeholder is inserted
    /// before this returns.
    pub fn drop_files(
        &self,
        files: impl IntoIterator<Item = DroppedFile>,
    ) -> usize {
        {
            let mut state = self.shared.state.borrow_mut();
            state.dragging = false;
            if state.destroyed {
                return 0;
            }
        }
        let upload = &self.shared.config.upload;
        if !upload.enabled {
            tracing::debug!("Upload disabled, ignoring drop");
            return 0;
        }

        let (accepted, start_worker) = {
            let mut uploads = self.shared.uploads.borrow_mut();
            let accepted = uploads.enqueue(files, &upload.image_mime_prefix);
            (accepted, uploads.claim_worker())
        };
        if start_worker {
            if let Some(first) = self.shared.start_next_upload() {
                spawn_local(drain_uploads(
                    Rc::downgrade(&self.shared),
                    Rc::clone(&self.shared.client),
                    first,
                ));
            }
        }
        accepted
    }

    /// Uploads that finished, in the order they finished.
    pub fn completed_uploads(&self) -> Vec<CompletedUpload> {
        self.shared.uploads.borrow().completed().to_vec()
    }

    pub fn uploads_idle(&self) -> bool {
        self.shared.uploads.borrow().is_idle()
    }

    /// Tear the composer down. Pending uploads are dropped and in-flight
    /// work finishes without touching the text.
    pub fn destroy(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.dragging = false;
            state.buffer.detach();
        }
        self.shared.uploads.borrow_mut().clear();
        tracing::debug!("Composer destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.borrow().destroyed
    }
}

impl<C: HostClient + 'static> Shared<C> {
    /// Render the current text, push it to the host and start lookups for
    /// any mention we cannot display yet.
    fn commit(self: &Rc<Self>) {
        let text = {
            let state = self.state.borrow();
            if state.destroyed {
                return;
            }
            state.buffer.read().to_owned()
        };

        let html = self.renderer.render(&text, &self.resolver);
        self.state.borrow_mut().rendered.clone_from(&html);
        for mention in self.resolver.claim_unresolved(&text) {
            self.spawn_lookup(mention);
        }
        self.sync.push(&html);
    }

    /// Show the composer's own edit in the text area.
    fn write_surface(&self) {
        let (text, caret) = {
            let state = self.state.borrow();
            if state.destroyed {
                return;
            }
            (state.buffer.read().to_owned(), state.buffer.caret())
        };
        self.surface.set_text(&text, caret);
    }

    fn spawn_lookup(self: &Rc<Self>, mention: Mention) {
        let composer = Rc::downgrade(self);
        let client = Rc::clone(&self.client);
        let resolver = self.resolver.clone();
        spawn_local(async move {
            if resolver.resolve(client.as_ref(), &mention).await.is_none() {
                return;
            }
            match composer.upgrade() {
                Some(shared) => shared.commit(),
                None => tracing::debug!(
                    code = %mention.code,
                    "Mention resolved after composer was dropped"
                ),
            }
        });
    }

    /// Returns `false` when the composer is gone and the task was not
    /// started.
    fn begin_upload(self: &Rc<Self>, task: &mut UploadTask) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return false;
            }
            task.insert_placeholder(&mut state.buffer);
        }
        self.write_surface();
        self.commit();
        true
    }

    /// Take the next queued task and insert its placeholder. `None` means
    /// the queue is empty and the worker role was released.
    fn start_next_upload(self: &Rc<Self>) -> Option<UploadTask> {
        loop {
            let next = self.uploads.borrow_mut().next_task();
            let mut task = next?;
            if self.begin_upload(&mut task) {
                return Some(task);
            }
        }
    }

    fn finish_upload(
        self: &Rc<Self>,
        mut task: UploadTask,
        result: Result<FileKey, ClientError>,
    ) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                tracing::debug!(
                    file = %task.file().name,
                    "Upload finished after teardown"
                );
                return;
            }
            task.complete(
                &mut state.buffer,
                result,
                self.config.upload.default_thumbnail_width,
            );
        }
        self.write_surface();
        self.commit();
        self.uploads.borrow_mut().finish(task);
    }
}

/// The single upload worker: one file at a time, in queue order. `first`
/// already has its placeholder in the text.
async fn drain_uploads<C: HostClient + 'static>(
    composer: Weak<Shared<C>>,
    client: Rc<C>,
    first: UploadTask,
) {
    let mut task = first;
    loop {
        let result = client.upload_file(task.file()).await;

        let Some(shared) = composer.upgrade() else {
            tracing::debug!(
                file = %task.file().name,
                "Upload finished after composer was dropped"
            );
            return;
        };
        shared.finish_upload(task, result);
        match shared.start_next_upload() {
            Some(next) => task = next,
            None => return,
        }
    }
}
