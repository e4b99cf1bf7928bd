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

//! Browser binding for the Marktone composer.
//!
//! The extension's content script supplies four callbacks: `search(token)`
//! and `upload(name, mimeType, bytes)` return promises, `setHtml(html)`
//! writes into the host's rich-text field and `setText(text, caret)` updates
//! the text area after the composer edited it.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect, Uint8Array};
use marktone::config::Loader;
use marktone::{
    ClientError, DirectoryEntity, DirectoryGroups, DroppedFile, FileKey,
    HostClient, InputSurface, LoginUser, MentionResolver, RenderTarget,
    ReplyMention, SuggestionPattern,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

thread_local! {
    static RESOLVER: MentionResolver = MentionResolver::new();
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::DEBUG)
            .build(),
    );
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn js_error(error: impl std::fmt::Display) -> JsError {
    JsError::new(&error.to_string())
}

/// `search` and `upload` callbacks provided by the content script.
struct JsHostClient {
    search: Function,
    upload: Function,
}

impl JsHostClient {
    async fn settle(
        result: Result<JsValue, JsValue>,
        fail: fn(String) -> ClientError,
    ) -> Result<JsValue, ClientError> {
        let value = result.map_err(|error| fail(describe(&error)))?;
        JsFuture::from(Promise::resolve(&value))
            .await
            .map_err(|error| fail(describe(&error)))
    }
}

impl HostClient for JsHostClient {
    async fn search_directory(
        &self,
        token: &str,
    ) -> Result<DirectoryGroups, ClientError> {
        let called = self.search.call1(&JsValue::NULL, &token.into());
        let groups = Self::settle(called, ClientError::Search).await?;
        serde_wasm_bindgen::from_value(groups)
            .map_err(|error| ClientError::Malformed(error.to_string()))
    }

    async fn upload_file(
        &self,
        file: &DroppedFile,
    ) -> Result<FileKey, ClientError> {
        let bytes = Uint8Array::from(file.data.as_slice());
        let called = self.upload.call3(
            &JsValue::NULL,
            &file.name.as_str().into(),
            &file.mime_type.as_str().into(),
            &bytes,
        );
        let key = Self::settle(called, ClientError::Upload).await?;
        key.as_string().map(FileKey::from).ok_or_else(|| {
            ClientError::Malformed(format!("file key is not a string: {key:?}"))
        })
    }
}

struct JsRenderTarget {
    set_html: Function,
}

impl RenderTarget for JsRenderTarget {
    fn set_html(&self, html: &str) {
        if let Err(error) = self.set_html.call1(&JsValue::NULL, &html.into())
        {
            tracing::warn!(error = %describe(&error), "setHtml callback threw");
        }
    }
}

struct JsInputSurface {
    set_text: Function,
}

impl InputSurface for JsInputSurface {
    fn set_text(&self, text: &str, caret: usize) {
        let called = self.set_text.call2(
            &JsValue::NULL,
            &text.into(),
            &JsValue::from(caret as u32),
        );
        if let Err(error) = called {
            tracing::warn!(error = %describe(&error), "setText callback threw");
        }
    }
}

fn dropped_file(item: &JsValue) -> Result<DroppedFile, JsError> {
    let field = |name: &str| Reflect::get(item, &name.into());
    let text = |name: &str| -> Result<String, JsError> {
        field(name)
            .map_err(|error| js_error(describe(&error)))?
            .as_string()
            .ok_or_else(|| JsError::new(&format!("`{name}` must be a string")))
    };
    let data = field("data").map_err(|error| js_error(describe(&error)))?;
    Ok(DroppedFile::new(
        text("name")?,
        text("mimeType")?,
        Uint8Array::new(&data).to_vec(),
    ))
}

/// A composer for one comment form.
#[wasm_bindgen(js_name = Composer)]
pub struct JsComposer {
    inner: marktone::Composer<JsHostClient>,
    suggestion: RefCell<Option<SuggestionPattern>>,
}

#[wasm_bindgen(js_class = Composer)]
impl JsComposer {
    /// `config` is an optional TOML document layered over the built-in
    /// defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: Option<String>,
        login_user: JsValue,
        reply_mentions: JsValue,
        search: Function,
        upload: Function,
        set_html: Function,
        set_text: Function,
    ) -> Result<JsComposer, JsError> {
        let mut loader = Loader::new();
        if let Some(toml) = &config {
            loader = loader.with_toml_str(toml);
        }
        let config = loader.build().map_err(js_error)?;
        let login_user: LoginUser =
            serde_wasm_bindgen::from_value(login_user).map_err(js_error)?;
        let reply_mentions: Vec<ReplyMention> =
            serde_wasm_bindgen::from_value(reply_mentions).map_err(js_error)?;

        let inner = marktone::Composer::new(
            config,
            &login_user,
            &reply_mentions,
            Rc::new(JsHostClient { search, upload }),
            RESOLVER.with(MentionResolver::clone),
            Rc::new(JsRenderTarget { set_html }),
            Rc::new(JsInputSurface { set_text }),
        );
        Ok(Self {
            inner,
            suggestion: RefCell::new(None),
        })
    }

    pub fn input(&self, text: String, caret: u32) {
        self.inner.input(text, caret as usize);
    }

    #[wasm_bindgen(js_name = setCaret)]
    pub fn set_caret(&self, caret: u32) {
        self.inner.set_caret(caret as usize);
    }

    #[wasm_bindgen(js_name = rawText)]
    pub fn raw_text(&self) -> String {
        self.inner.raw_text()
    }

    pub fn caret(&self) -> u32 {
        self.inner.caret() as u32
    }

    #[wasm_bindgen(js_name = renderedHtml)]
    pub fn rendered_html(&self) -> String {
        self.inner.rendered_html()
    }

    /// The autocomplete query at the caret, if any. The matching span is
    /// remembered for `selectCandidate`.
    pub fn suggestion(&self) -> Option<String> {
        let found = self.inner.suggestion();
        let query = found.as_ref().map(|pattern| pattern.query().to_owned());
        *self.suggestion.borrow_mut() = found;
        query
    }

    /// Resolves to the flattened candidate list for `query`.
    pub fn candidates(&self, query: String) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let candidates = inner.candidates(&query).await;
            serde_wasm_bindgen::to_value(&candidates).map_err(JsValue::from)
        })
    }

    #[wasm_bindgen(js_name = selectCandidate)]
    pub fn select_candidate(&self, entity: JsValue) -> Result<bool, JsError> {
        let entity: DirectoryEntity =
            serde_wasm_bindgen::from_value(entity).map_err(js_error)?;
        let Some(pattern) = self.suggestion.borrow_mut().take() else {
            return Ok(false);
        };
        Ok(self.inner.select_candidate(&pattern, &entity))
    }

    #[wasm_bindgen(js_name = dragEnter)]
    pub fn drag_enter(&self) {
        self.inner.drag_enter();
    }

    #[wasm_bindgen(js_name = dragLeave)]
    pub fn drag_leave(&self) {
        self.inner.drag_leave();
    }

    #[wasm_bindgen(js_name = isDragging)]
    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    /// `files` is an array of `{ name, mimeType, data: Uint8Array }`.
    /// Returns how many were queued for upload.
    #[wasm_bindgen(js_name = dropFiles)]
    pub fn drop_files(&self, files: Array) -> Result<u32, JsError> {
        let files = files
            .iter()
            .map(|item| dropped_file(&item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.inner.drop_files(files) as u32)
    }

    pub fn destroy(&self) {
        self.suggestion.borrow_mut().take();
        self.inner.destroy();
    }

    #[wasm_bindgen(js_name = isDestroyed)]
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }
}
