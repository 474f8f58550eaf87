use libsqlite3_sys::{sqlite3, sqlite3_stmt};
use std::ops::{Deref, DerefMut};

pub(crate) trait NullCheck {
    fn is_null(&self) -> bool;
}

impl NullCheck for *mut sqlite3 {
    fn is_null(&self) -> bool {
        (*self as *const sqlite3).is_null()
    }
}

impl NullCheck for *mut sqlite3_stmt {
    fn is_null(&self) -> bool {
        (*self as *const sqlite3_stmt).is_null()
    }
}

/// Owns a SQLite handle and releases it with `dealloc` when dropped, unless null.
#[derive(Debug)]
pub(crate) struct CBox<T: NullCheck + Copy> {
    pub(crate) ptr: T,
    dealloc: fn(T),
}

impl<T: NullCheck + Copy> CBox<T> {
    pub fn new(ptr: T, dealloc: fn(T)) -> Self {
        Self { ptr, dealloc }
    }
}

impl<T: NullCheck + Copy> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            (self.dealloc)(self.ptr);
        }
    }
}

impl<T: NullCheck + Copy> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.ptr
    }
}

impl<T: NullCheck + Copy> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ptr
    }
}
