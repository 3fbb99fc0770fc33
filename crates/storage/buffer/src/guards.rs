use page::page::Page;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

/// Provides read access to a `Page` instance stored in one of the buffer's frames.
/// Shared latch, allowing concurrent reads.
/// Free as soon as possible.
#[derive(Debug)]
pub struct PageReadGuard<'a> {
    /// The underlying `RwLockReadGuard` which will be dereferenced to `&Page`
    pub guard: RwLockReadGuard<'a, Page>,
}

impl<'a> Deref for PageReadGuard<'a> {
    type Target = Page;
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Provides write access to a `Page` instance stored in one of the buffer's frames.
/// Exclusive latch. Marks the owning frame dirty as soon as the guard is taken,
/// since the caller asked for write access in order to mutate the page.
#[derive(Debug)]
pub struct PageWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Page>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(guard: RwLockWriteGuard<'a, Page>, dirty: &AtomicBool) -> Self {
        dirty.store(true, Ordering::Relaxed);
        Self { guard }
    }
}

impl<'a> Deref for PageWriteGuard<'a> {
    type Target = Page;
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<'a> DerefMut for PageWriteGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
