//! Browser-style back/forward history.

use crate::{Error, Result};

/// An append-only list of visited items with a cursor.
///
/// Pushing always appends and moves the cursor to the new last item. Unlike a browser, moving
/// back and then pushing keeps the forward entries: they stay reachable from the end of the list.
#[derive(Debug, Clone)]
pub struct History<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        History {
            items: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T> History<T> {
    /// An empty history
    #[must_use]
    pub fn new() -> Self {
        History::default()
    }

    /// Appends `item` and makes it current
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.cursor = self.items.len() - 1;
    }

    /// The current item, `None` for an empty history.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the cursor is outside the list.
    pub fn current(&self) -> Result<Option<&T>> {
        if self.items.is_empty() {
            return Ok(None);
        }

        match self.items.get(self.cursor) {
            Some(item) => Ok(Some(item)),
            None => Err(Error::InvalidState(format!(
                "History cursor {} is out of bounds ({} items)",
                self.cursor,
                self.items.len()
            ))),
        }
    }

    /// Position of the current item
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// True if there is an item before the current one
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    /// True if there is an item after the current one
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.items.len()
    }

    /// Moves to the previous item.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if there is none.
    pub fn move_to_previous(&mut self) -> Result<()> {
        if !self.has_previous() {
            return Err(Error::InvalidState(
                "There is no previous item in the history".to_string(),
            ));
        }

        self.cursor -= 1;
        Ok(())
    }

    /// Moves to the next item.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if there is none.
    pub fn move_to_next(&mut self) -> Result<()> {
        if !self.has_next() {
            return Err(Error::InvalidState(
                "There is no next item in the history".to_string(),
            ));
        }

        self.cursor += 1;
        Ok(())
    }

    /// Forgets everything
    pub fn reset(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing was pushed since creation or the last reset
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
