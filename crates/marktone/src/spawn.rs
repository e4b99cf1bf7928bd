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

use std::future::Future;

#[cfg(not(any(feature = "sys", feature = "js")))]
compile_error!("marktone needs the `sys` feature, or `js` on wasm32.");

/// Run `future` as a local task on the current thread.
///
/// Under `sys` this panics unless called inside a tokio `LocalSet`.
pub(crate) fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    cfg_if::cfg_if! {
        if #[cfg(all(feature = "js", target_arch = "wasm32"))] {
            wasm_bindgen_futures::spawn_local(future);
        } else if #[cfg(feature = "sys")] {
            drop(tokio::task::spawn_local(future));
        } else {
            drop(future);
            unreachable!("The `js` feature only spawns on wasm32; enable `sys` elsewhere.")
        }
    }
}
