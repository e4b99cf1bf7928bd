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

use std::cell::RefCell;
use std::rc::Rc;

/// The host-owned rich-text surface that receives the rendered HTML.
///
/// The composer only ever writes to it.
pub trait RenderTarget {
    fn set_html(&self, html: &str);
}

/// The text area the user types into.
///
/// The composer writes to it only after edits it made itself (a selected
/// mention, an upload placeholder or its final reference); keystrokes reach
/// the composer through [`Composer::input`](crate::Composer::input). `caret`
/// is a UTF-16 offset into `text`.
pub trait InputSurface {
    fn set_text(&self, text: &str, caret: usize);
}

/// Pushes rendered HTML to a [`RenderTarget`] whenever it changes.
pub struct RenderTargetSync {
    target: Rc<dyn RenderTarget>,
    last_pushed: RefCell<Option<String>>,
}

impl RenderTargetSync {
    pub fn new(target: Rc<dyn RenderTarget>) -> Self {
        Self {
            target,
            last_pushed: RefCell::new(None),
        }
    }

    /// Push `html` unless it is what the target already shows.
    pub fn push(&self, html: &str) -> bool {
        {
            let mut last = self.last_pushed.borrow_mut();
            if last.as_deref() == Some(html) {
                return false;
            }
            *last = Some(html.to_owned());
        }
        // The target may call back into the composer.
        self.target.set_html(html);
        true
    }
}
