// Copyright 2024 FastLabs Developers
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

//! Reusable scratch objects.
//!
//! A [`Pool`] hands out [`Pooled`] guards. Dropping a guard resets the object and returns it to
//! the pool, so buffers and field maps are reused across log calls without any process-wide state.

use std::collections::BTreeMap;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Value;

// buffers grown past this size are dropped instead of pooled
const MAX_RETAINED_BYTES: usize = 64 * 1024;

/// An object that can be cleared for reuse.
pub trait Reset: Default {
    /// Clear the object. Return `false` if it should be dropped instead of pooled.
    fn reset(&mut self) -> bool;
}

impl Reset for Vec<u8> {
    fn reset(&mut self) -> bool {
        self.clear();
        self.capacity() <= MAX_RETAINED_BYTES
    }
}

impl Reset for BTreeMap<String, Value> {
    fn reset(&mut self) -> bool {
        self.clear();
        true
    }
}

/// A bounded free list of reusable objects.
pub struct Pool<T: Reset> {
    idle: Mutex<Vec<T>>,
    max_idle: usize,
}

impl<T: Reset> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle_count())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

impl<T: Reset> Default for Pool<T> {
    fn default() -> Self {
        Self::new(16)
    }
}

impl<T: Reset> Pool<T> {
    /// Create a pool that keeps at most `max_idle` objects around.
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Take an idle object, or create a fresh one if none is available.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let item = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Pooled {
            pool: self,
            item: ManuallyDrop::new(item),
        }
    }

    /// The number of idle objects currently held.
    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, mut item: T) {
        if !item.reset() {
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(item);
        }
    }
}

/// An object borrowed from a [`Pool`], returned on drop.
pub struct Pooled<'a, T: Reset> {
    pool: &'a Pool<T>,
    item: ManuallyDrop<T>,
}

impl<T: Reset + fmt::Debug> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: Reset> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Reset> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T: Reset> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `item` is never touched again after this point
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.release(item);
    }
}
