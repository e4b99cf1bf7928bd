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

//! The Markdown source buffer and its caret.
//!
//! Positions are UTF-16 code unit offsets, the unit host text areas report
//! for `selectionStart`/`selectionEnd`. Offsets that land inside a surrogate
//! pair are snapped back to the start of that character.

/// Number of UTF-16 code units in `text`.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Byte index of the UTF-16 `offset` in `text`, clamped to the end.
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        let next = units + ch.len_utf16();
        if next > offset {
            return index;
        }
        units = next;
    }
    text.len()
}

/// UTF-16 offset of the byte index `byte`, which must be a char boundary.
pub(crate) fn utf16_offset(text: &str, byte: usize) -> usize {
    utf16_len(&text[..byte])
}

/// Raw Markdown source plus caret, as seen through the host's input surface.
///
/// Once the surface is detached (the composer was torn down) every mutation
/// becomes a no-op and the caret reads as 0, so late async completions can
/// write into the buffer without failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    caret: usize,
    attached: bool,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            caret: 0,
            attached: true,
        }
    }

    pub fn read(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        utf16_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Replace the whole text. The caret is kept, clamped to the new length.
    pub fn replace(&mut self, text: impl Into<String>) {
        if !self.attached {
            return;
        }
        self.text = text.into();
        self.clamp_caret();
    }

    pub fn caret(&self) -> usize {
        if self.attached {
            self.caret
        } else {
            0
        }
    }

    pub fn set_caret(&mut self, position: usize) {
        if !self.attached {
            return;
        }
        self.caret = position.min(self.len());
    }

    /// Delete `delete` code units at `at` and insert `insert` in their place.
    ///
    /// The caret is not moved except to keep it inside the text; callers
    /// that need it to follow the edit set it themselves.
    pub fn splice(&mut self, at: usize, delete: usize, insert: &str) -> bool {
        if !self.attached {
            return false;
        }
        let start = byte_index(&self.text, at);
        let end = byte_index(&self.text, at.saturating_add(delete)).max(start);
        self.text.replace_range(start..end, insert);
        self.clamp_caret();
        true
    }

    /// UTF-16 offset of the first occurrence of `needle`.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.text
            .find(needle)
            .map(|byte| utf16_offset(&self.text, byte))
    }

    /// Replace the first literal occurrence of `needle` in the current text.
    ///
    /// Returns the UTF-16 offset the replacement starts at, or `None` when
    /// the needle is gone or the buffer is detached.
    pub fn replace_first(
        &mut self,
        needle: &str,
        replacement: &str,
    ) -> Option<usize> {
        if !self.attached || needle.is_empty() {
            return None;
        }
        let byte = self.text.find(needle)?;
        let start = utf16_offset(&self.text, byte);
        self.text
            .replace_range(byte..byte + needle.len(), replacement);
        self.clamp_caret();
        Some(start)
    }

    /// Mark the input surface as gone.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    fn clamp_caret(&mut self) {
        self.caret = self.caret.min(self.len());
    }
}
