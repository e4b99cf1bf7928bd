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

//! Resolution of mention codes to directory entities.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use marktone_mentions::{find_mentions, Mention};

use crate::directory::flatten_groups;
use crate::{DirectoryEntity, HostClient};

#[derive(Default)]
struct ResolverState {
    cache: HashMap<String, DirectoryEntity>,
    in_flight: HashSet<String>,
    // Codes whose last lookup failed. Cleared once the code leaves the text.
    failed: HashSet<String>,
}

/// Process-local cache of directory entities, keyed by code.
///
/// Clones share the same cache, so every composer on a page benefits from
/// lookups made by the others. Entries live for the whole session.
#[derive(Clone, Default)]
pub struct MentionResolver {
    state: Rc<RefCell<ResolverState>>,
}

impl MentionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, code: &str) -> Option<DirectoryEntity> {
        self.state.borrow().cache.get(code).cloned()
    }

    pub fn is_resolved(&self, code: &str) -> bool {
        self.state.borrow().cache.contains_key(code)
    }

    pub fn is_in_flight(&self, code: &str) -> bool {
        self.state.borrow().in_flight.contains(code)
    }

    pub fn has_failed(&self, code: &str) -> bool {
        self.state.borrow().failed.contains(code)
    }

    /// Cache an entity we already know, e.g. a selected candidate.
    pub fn insert(&self, entity: DirectoryEntity) {
        self.state
            .borrow_mut()
            .cache
            .insert(entity.code.clone(), entity);
    }

    /// Mentions in `text` that need a lookup.
    ///
    /// Each returned code is marked in flight, so the same code is never
    /// handed out twice while a lookup for it is outstanding. A code whose
    /// lookup failed is not handed out again until a call sees `text`
    /// without it.
    pub fn claim_unresolved(&self, text: &str) -> Vec<Mention> {
        let mentions: Vec<Mention> =
            find_mentions(text).map(|found| found.mention).collect();
        let mut state = self.state.borrow_mut();
        state
            .failed
            .retain(|code| mentions.iter().any(|mention| &mention.code == code));

        let mut claimed = Vec::new();
        for mention in mentions {
            let code = &mention.code;
            if state.cache.contains_key(code)
                || state.in_flight.contains(code)
                || state.failed.contains(code)
            {
                continue;
            }
            state.in_flight.insert(code.clone());
            claimed.push(mention);
        }
        claimed
    }

    /// Look `mention` up in the directory and cache the result.
    ///
    /// Only an entity with the same kind and code is accepted. On failure
    /// the code stays unresolved until it disappears from the text and is
    /// mentioned again.
    pub async fn resolve<C: HostClient>(
        &self,
        client: &C,
        mention: &Mention,
    ) -> Option<DirectoryEntity> {
        let found = match client.search_directory(&mention.code).await {
            Ok(groups) => flatten_groups(groups).into_iter().find(|entity| {
                entity.kind == mention.kind && entity.code == mention.code
            }),
            Err(error) => {
                tracing::warn!(code = %mention.code, %error, "Mention lookup failed");
                None
            }
        };

        let mut state = self.state.borrow_mut();
        state.in_flight.remove(&mention.code);
        match &found {
            Some(entity) => {
                state.failed.remove(&entity.code);
                state.cache.insert(entity.code.clone(), entity.clone());
            }
            None => {
                tracing::debug!(code = %mention.code, "Mention left unresolved");
                state.failed.insert(mention.code.clone());
            }
        }
        found
    }
}
