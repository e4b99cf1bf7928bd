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

//! Image upload reconciliation.
//!
//! Every accepted file goes through
//! `PendingInsert → Uploading → Done | Failed`. While uploading, a literal
//! placeholder stands in the text. When the upload returns, the first
//! occurrence of that placeholder in the *current* text is replaced; no
//! offsets are remembered across the network round trip because typing in
//! the meantime would have moved them.

use std::collections::VecDeque;

use crate::buffer::utf16_len;
use crate::{ClientError, DroppedFile, FileKey, TextBuffer};

/// Text inserted after each placeholder.
const PLACEHOLDER_SEPARATOR: &str = "\n";

pub fn placeholder_text(file_name: &str) -> String {
    format!("![](Uploading... {file_name})")
}

pub fn reference_text(file_name: &str, key: &FileKey, width: u32) -> String {
    format!("![{file_name}](tmp:{key} \"={width}\")")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadState {
    PendingInsert,
    Uploading { placeholder: String },
    Done { reference: String },
    /// The placeholder stays in the text; there is no retry.
    Failed { placeholder: String },
}

/// One dropped file on its way through the upload state machine.
#[derive(Clone, Debug)]
pub struct UploadTask {
    seq: u64,
    file: DroppedFile,
    state: UploadState,
}

impl UploadTask {
    pub fn new(seq: u64, file: DroppedFile) -> Self {
        Self {
            seq,
            file,
            state: UploadState::PendingInsert,
        }
    }

    /// Position of the file in drop order.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn file(&self) -> &DroppedFile {
        &self.file
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// `PendingInsert → Uploading`: splice the placeholder in at the caret
    /// and move the caret past it.
    pub fn insert_placeholder(&mut self, buffer: &mut TextBuffer) {
        if self.state != UploadState::PendingInsert {
            return;
        }
        let placeholder = placeholder_text(&self.file.name);
        let inserted = format!("{placeholder}{PLACEHOLDER_SEPARATOR}");
        let caret = buffer.caret();
        if buffer.splice(caret, 0, &inserted) {
            buffer.set_caret(caret + utf16_len(&inserted));
        }
        self.state = UploadState::Uploading { placeholder };
    }

    /// `Uploading → Done | Failed` once the upload call returns.
    pub fn complete(
        &mut self,
        buffer: &mut TextBuffer,
        result: Result<FileKey, ClientError>,
        thumbnail_width: u32,
    ) {
        let UploadState::Uploading { placeholder } = &self.state else {
            return;
        };
        let placeholder = placeholder.clone();

        self.state = match result {
            Ok(key) => {
                let reference =
                    reference_text(&self.file.name, &key, thumbnail_width);
                if !replace_placeholder(buffer, &placeholder, &reference) {
                    tracing::debug!(
                        file = %self.file.name,
                        "Placeholder gone before upload finished"
                    );
                }
                UploadState::Done { reference }
            }
            Err(error) => {
                tracing::warn!(file = %self.file.name, %error, "Upload failed");
                UploadState::Failed { placeholder }
            }
        };
    }
}

/// Swap the first `placeholder` in the buffer for `reference`, keeping the
/// caret on the same surrounding text.
fn replace_placeholder(
    buffer: &mut TextBuffer,
    placeholder: &str,
    reference: &str,
) -> bool {
    let caret = buffer.caret();
    let Some(start) = buffer.replace_first(placeholder, reference) else {
        return false;
    };
    let old_end = start + utf16_len(placeholder);
    let new_end = start + utf16_len(reference);

    let caret = if caret >= old_end {
        caret - old_end + new_end
    } else if caret > start {
        new_end
    } else {
        caret
    };
    buffer.set_caret(caret);
    true
}

/// A finished upload, as recorded by [`UploadQueue::finish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedUpload {
    pub seq: u64,
    pub file_name: String,
    pub state: UploadState,
}

/// Ordered queue of uploads, drained by a single worker.
///
/// The worker takes one task at a time and only asks for the next one after
/// the previous upload finished, which keeps reconciliation in drop order
/// even across separate drops.
#[derive(Debug, Default)]
pub struct UploadQueue {
    pending: VecDeque<UploadTask>,
    worker_active: bool,
    next_seq: u64,
    completed: Vec<CompletedUpload>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the files whose MIME type starts with `mime_prefix`, in order.
    /// Other files are skipped. Returns how many were queued.
    pub fn enqueue(
        &mut self,
        files: impl IntoIterator<Item = DroppedFile>,
        mime_prefix: &str,
    ) -> usize {
        let mut accepted = 0;
        for file in files {
            if !file.has_mime_prefix(mime_prefix) {
                tracing::debug!(
                    file = %file.name,
                    mime_type = %file.mime_type,
                    "Skipping non-image drop"
                );
                continue;
            }
            self.pending.push_back(UploadTask::new(self.next_seq, file));
            self.next_seq += 1;
            accepted += 1;
        }
        accepted
    }

    /// Take the worker role if nobody holds it and there is work.
    pub fn claim_worker(&mut self) -> bool {
        if self.worker_active || self.pending.is_empty() {
            return false;
        }
        self.worker_active = true;
        true
    }

    /// The next task for the worker. `None` releases the worker role.
    pub fn next_task(&mut self) -> Option<UploadTask> {
        let task = self.pending.pop_front();
        if task.is_none() {
            self.worker_active = false;
        }
        task
    }

    pub fn finish(&mut self, task: UploadTask) {
        self.completed.push(CompletedUpload {
            seq: task.seq,
            file_name: task.file.name,
            state: task.state,
        });
    }

    /// Drop everything not yet started.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        !self.worker_active && self.pending.is_empty()
    }

    /// Finished uploads in the order they finished.
    pub fn completed(&self) -> &[CompletedUpload] {
        &self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::{
        placeholder_text, reference_text, UploadQueue, UploadState,
        UploadTask,
    };
    use crate::buffer::utf16_len;
    use crate::tests::testutils_client::png;
    use crate::{ClientError, DroppedFile, FileKey, TextBuffer};

    fn uploading(name: &str, buffer: &mut TextBuffer) -> UploadTask {
        let mut task = UploadTask::new(0, png(name));
        task.insert_placeholder(buffer);
        task
    }

    fn assert_caret_in_bounds(buffer: &TextBuffer) {
        assert!(buffer.caret() <= buffer.len());
    }

    #[test]
    fn placeholder_and_reference_text() {
        assert_eq!(placeholder_text("cat.png"), "![](Uploading... cat.png)");
        assert_eq!(
            reference_text("cat.png", &FileKey::new("abc123"), 250),
            "![cat.png](tmp:abc123 \"=250\")"
        );
    }

    #[test]
    fn placeholder_is_inserted_at_caret() {
        let mut buffer = TextBuffer::new("");
        let task = uploading("cat.png", &mut buffer);

        assert_eq!(buffer.read(), "![](Uploading... cat.png)\n");
        assert_eq!(buffer.caret(), 26);
        assert_eq!(
            task.state(),
            &UploadState::Uploading {
                placeholder: "![](Uploading... cat.png)".to_owned()
            }
        );
    }

    #[test]
    fn placeholder_splits_text_around_caret() {
        let mut buffer = TextBuffer::new("before after");
        buffer.set_caret(7);
        uploading("a.png", &mut buffer);

        assert_eq!(buffer.read(), "before ![](Uploading... a.png)\nafter");
        assert_eq!(buffer.caret(), 7 + utf16_len("![](Uploading... a.png)\n"));
    }

    #[test]
    fn completion_replaces_placeholder_and_shifts_caret() {
        let mut buffer = TextBuffer::new("");
        let mut task = uploading("cat.png", &mut buffer);
        let caret_before = buffer.caret();

        task.complete(&mut buffer, Ok(FileKey::new("abc123")), 250);

        let reference = "![cat.png](tmp:abc123 \"=250\")";
        assert_eq!(buffer.read(), format!("{reference}\n"));
        assert_eq!(
            buffer.caret(),
            caret_before + utf16_len(reference)
                - utf16_len("![](Uploading... cat.png)")
        );
        assert_eq!(
            task.state(),
            &UploadState::Done {
                reference: reference.to_owned()
            }
        );
        assert_caret_in_bounds(&buffer);
    }

    #[test]
    fn typing_before_placeholder_is_preserved() {
        let mut buffer = TextBuffer::new("");
        let mut task = uploading("cat.png", &mut buffer);

        // The user moves to the start and types while the upload runs.
        buffer.set_caret(0);
        buffer.splice(0, 0, "look: ");
        buffer.set_caret(6);

        task.complete(&mut buffer, Ok(FileKey::new("k")), 250);

        assert_eq!(buffer.read(), "look: ![cat.png](tmp:k \"=250\")\n");
        assert_eq!(buffer.caret(), 6);
    }

    #[test]
    fn caret_inside_placeholder_moves_to_reference_end() {
        let mut buffer = TextBuffer::new("");
        let mut task = uploading("cat.png", &mut buffer);
        buffer.set_caret(5);

        task.complete(&mut buffer, Ok(FileKey::new("k")), 250);

        assert_eq!(buffer.caret(), utf16_len("![cat.png](tmp:k \"=250\")"));
        assert_caret_in_bounds(&buffer);
    }

    #[test]
    fn failed_upload_leaves_placeholder() {
        let mut buffer = TextBuffer::new("");
        let mut task = uploading("cat.png", &mut buffer);

        task.complete(
            &mut buffer,
            Err(ClientError::Upload("too large".into())),
            250,
        );

        assert_eq!(buffer.read(), "![](Uploading... cat.png)\n");
        assert!(matches!(task.state(), UploadState::Failed { .. }));
    }

    #[test]
    fn deleted_placeholder_completes_without_edit() {
        let mut buffer = TextBuffer::new("");
        let mut task = uploading("cat.png", &mut buffer);
        buffer.replace("never mind");

        task.complete(&mut buffer, Ok(FileKey::new("k")), 250);

        assert_eq!(buffer.read(), "never mind");
        assert!(matches!(task.state(), UploadState::Done { .. }));
        assert_caret_in_bounds(&buffer);
    }

    #[test]
    fn identical_placeholders_resolve_first_occurrence_first() {
        let mut buffer = TextBuffer::new("");
        let mut first = uploading("cat.png", &mut buffer);
        let mut second = uploading("cat.png", &mut buffer);

        first.complete(&mut buffer, Ok(FileKey::new("one")), 250);
        assert!(buffer.read().starts_with("![cat.png](tmp:one"));
        second.complete(&mut buffer, Ok(FileKey::new("two")), 250);

        assert_eq!(
            buffer.read(),
            "![cat.png](tmp:one \"=250\")\n![cat.png](tmp:two \"=250\")\n"
        );
        assert_eq!(buffer.caret(), buffer.len());
    }

    #[test]
    fn queue_skips_non_images_and_keeps_order() {
        let mut queue = UploadQueue::new();
        let accepted = queue.enqueue(
            vec![
                png("a.png"),
                DroppedFile::new("notes.txt", "text/plain", vec![]),
                png("b.png"),
            ],
            "image/",
        );

        assert_eq!(accepted, 2);
        assert!(queue.claim_worker());
        assert!(!queue.claim_worker());

        let a = queue.next_task().unwrap();
        let b = queue.next_task().unwrap();
        assert_eq!((a.seq(), a.file().name.as_str()), (0, "a.png"));
        assert_eq!((b.seq(), b.file().name.as_str()), (1, "b.png"));

        assert!(queue.next_task().is_none());
        assert!(queue.is_idle());
    }

    #[test]
    fn empty_queue_does_not_start_a_worker() {
        let mut queue = UploadQueue::new();
        queue.enqueue(vec![DroppedFile::new("a.pdf", "application/pdf", vec![])], "image/");
        assert!(!queue.claim_worker());
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn finish_records_completion_order() {
        let mut queue = UploadQueue::new();
        queue.enqueue(vec![png("a.png"), png("b.png")], "image/");
        queue.claim_worker();
        let mut buffer = TextBuffer::new("");

        while let Some(mut task) = queue.next_task() {
            task.insert_placeholder(&mut buffer);
            let key = FileKey::new(task.file().name.clone());
            task.complete(&mut buffer, Ok(key), 100);
            queue.finish(task);
        }

        let names: Vec<_> = queue
            .completed()
            .iter()
            .map(|done| done.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }
}
