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

//! Lifecycle entry points the host page drives.
//!
//! The host expands and collapses its native comment form; each expansion
//! creates a composer and each collapse tears it down.

use std::rc::Rc;

use crate::{
    Composer, ComposerConfig, HostClient, InputSurface, LoginUser,
    MentionResolver, RenderTarget, ReplyMention,
};

/// A host-side "confirm before leaving the page" hook.
pub trait NavigationGuard {
    fn set_armed(&self, armed: bool);
}

/// Everything needed to create a composer for one comment form.
pub struct ComposerMount<C> {
    pub config: ComposerConfig,
    pub login_user: LoginUser,
    pub reply_mentions: Vec<ReplyMention>,
    pub client: Rc<C>,
    pub resolver: MentionResolver,
    pub target: Rc<dyn RenderTarget>,
    pub surface: Rc<dyn InputSurface>,
}

/// Holds at most one live composer for a comment form.
pub struct ComposerSlot<C: HostClient + 'static> {
    mount: ComposerMount<C>,
    guard: Option<Rc<dyn NavigationGuard>>,
    composer: Option<Composer<C>>,
}

impl<C: HostClient + 'static> ComposerSlot<C> {
    pub fn new(mount: ComposerMount<C>) -> Self {
        Self {
            mount,
            guard: None,
            composer: None,
        }
    }

    pub fn with_navigation_guard(
        mut self,
        guard: Rc<dyn NavigationGuard>,
    ) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Create the composer, or return the live one.
    pub fn create(&mut self) -> Composer<C> {
        if let Some(composer) = &self.composer {
            return composer.clone();
        }

        let mount = &self.mount;
        let composer = Composer::new(
            mount.config.clone(),
            &mount.login_user,
            &mount.reply_mentions,
            Rc::clone(&mount.client),
            mount.resolver.clone(),
            Rc::clone(&mount.target),
            Rc::clone(&mount.surface),
        );
        if let Some(guard) = &self.guard {
            guard.set_armed(true);
        }
        tracing::debug!("Composer created");
        self.composer = Some(composer.clone());
        composer
    }

    pub fn destroy(&mut self) {
        let Some(composer) = self.composer.take() else {
            return;
        };
        composer.destroy();
        if let Some(guard) = &self.guard {
            guard.set_armed(false);
        }
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        if expanded {
            self.create();
        } else {
            self.destroy();
        }
    }

    pub fn composer(&self) -> Option<&Composer<C>> {
        self.composer.as_ref()
    }
}
