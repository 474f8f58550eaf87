use crate::{Error, Query, Result, RowLabeled, RowMapper, Rows};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

/// Driver cursor and look-ahead row of one [`ResultCursor`], shared with its unit.
pub(crate) struct CursorState {
    rows: Option<Box<dyn Rows>>,
    look_ahead: Option<RowLabeled>,
}

impl CursorState {
    /// Releases the driver cursor. The look-ahead becomes empty.
    pub(crate) fn close(&mut self) {
        self.look_ahead = None;
        self.rows = None;
    }
    fn is_open(&self) -> bool {
        self.rows.is_some()
    }
}

/// The cursors currently open on a connection unit.
#[derive(Default)]
pub(crate) struct OpenCursors {
    next_id: u64,
    open: BTreeMap<u64, Weak<RefCell<CursorState>>>,
}

impl OpenCursors {
    pub(crate) fn len(&self) -> usize {
        self.open.len()
    }

    /// Closes every registered cursor and empties the registry.
    pub(crate) fn close_all(&mut self) -> usize {
        let open = std::mem::take(&mut self.open);
        let len = open.len();
        for state in open.into_values().filter_map(|v| v.upgrade()) {
            match state.try_borrow_mut() {
                Ok(mut state) => state.close(),
                Err(..) => log::warn!("Cursor is in use and could not be closed"),
            }
        }
        len
    }
}

/// A lazily fetched sequence of rows extracted into `T`.
///
/// Holds one row of look-ahead: the first row is fetched when the cursor is opened.
/// The cursor closes itself and leaves the unit's registry the moment a fetch finds no
/// more rows, when [`ResultCursor::close`] is called, when dropped, or when its unit is
/// committed or rolled back. A closed cursor simply reports exhaustion.
pub struct ResultCursor<T> {
    id: u64,
    state: Rc<RefCell<CursorState>>,
    registry: Weak<RefCell<OpenCursors>>,
    mapper: Box<dyn RowMapper<T>>,
    query: Query,
    failure: Option<Error>,
}

impl<T> ResultCursor<T> {
    pub(crate) fn open(
        rows: Box<dyn Rows>,
        mapper: Box<dyn RowMapper<T>>,
        registry: &Rc<RefCell<OpenCursors>>,
        query: Query,
    ) -> Result<Self> {
        let state = Rc::new(RefCell::new(CursorState {
            rows: Some(rows),
            look_ahead: None,
        }));
        let id = {
            let mut cursors = registry.borrow_mut();
            let id = cursors.next_id;
            cursors.next_id += 1;
            cursors.open.insert(id, Rc::downgrade(&state));
            id
        };
        let mut result = Self {
            id,
            state,
            registry: Rc::downgrade(registry),
            mapper,
            query,
            failure: None,
        };
        if let Err(e) = result.fetch_ahead() {
            result.close();
            return Err(e);
        }
        Ok(result)
    }

    /// Refills the look-ahead, closing the cursor once no row is left.
    fn fetch_ahead(&mut self) -> Result<()> {
        let fetched = {
            let mut state = self.state.borrow_mut();
            let Some(rows) = state.rows.as_mut() else {
                return Ok(());
            };
            rows.fetch()
        };
        match fetched {
            Ok(Some(row)) => {
                self.state.borrow_mut().look_ahead = Some(row);
                Ok(())
            }
            Ok(None) => {
                self.close();
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(Error::database(&self.query, e))
            }
        }
    }

    /// True while a row is buffered.
    pub fn has_next(&self) -> bool {
        self.state.borrow().look_ahead.is_some()
    }

    pub fn is_closed(&self) -> bool {
        !self.state.borrow().is_open()
    }

    /// Releases the driver cursor and leaves the unit's registry. Idempotent.
    pub fn close(&mut self) {
        self.state.borrow_mut().close();
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().open.remove(&self.id);
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl<T> Iterator for ResultCursor<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(row) = self.state.borrow_mut().look_ahead.take() else {
            return self.failure.take().map(Err);
        };
        if let Err(e) = self.fetch_ahead() {
            self.failure = Some(e);
        }
        Some(self.mapper.map(row))
    }
}

impl<T> Drop for ResultCursor<T> {
    fn drop(&mut self) {
        self.close();
    }
}
