use crate::models::Batch;

/// Anything that can be picked from a refreshed collection.
pub trait Selectable {
    fn selection_id(&self) -> &str;
}

impl Selectable for Batch {
    fn selection_id(&self) -> &str {
        &self.id
    }
}

/// Reconciles the previous selection with a freshly fetched collection.
///
/// A selection that is still present is kept as is; otherwise the first item
/// in collection order is taken, or nothing when the collection is empty.
pub fn resolve<T: Selectable>(previous: Option<&str>, collection: &[T]) -> Option<String> {
    if let Some(id) = previous {
        if collection.iter().any(|item| item.selection_id() == id) {
            return Some(id.to_string());
        }
    }
    collection.first().map(|item| item.selection_id().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Changed(String),
    Cleared,
}

/// Selection owned by a view loop, threaded through each refresh.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    current: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn reconcile<T: Selectable>(&mut self, collection: &[T]) -> SelectionChange {
        let next = resolve(self.current(), collection);
        self.replace(next)
    }

    /// Explicit pick by the user. Ids absent from `collection` are ignored.
    pub fn choose<T: Selectable>(&mut self, id: &str, collection: &[T]) -> SelectionChange {
        if !collection.iter().any(|item| item.selection_id() == id) {
            return SelectionChange::Unchanged;
        }
        self.replace(Some(id.to_string()))
    }

    fn replace(&mut self, next: Option<String>) -> SelectionChange {
        if next == self.current {
            return SelectionChange::Unchanged;
        }
        self.current = next.clone();
        match next {
            Some(id) => SelectionChange::Changed(id),
            None => SelectionChange::Cleared,
        }
    }
}
