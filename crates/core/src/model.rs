//! Observable, append-only collection of uniquely identified elements.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity assigned to an element when it enters a [`Model`].
///
/// Identities are unique for the whole process, so two models never hand out
/// the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Listener<T> = Arc<dyn Fn(ElementId, &T) + Send + Sync>;

/// Ordered collection that notifies registered observers on every change.
///
/// Observers run synchronously on the thread performing the mutation, after
/// the internal lock has been released, so a callback may freely read the
/// model it observes.
pub struct Model<T> {
    elements: RwLock<Vec<(ElementId, T)>>,
    added: RwLock<Vec<Listener<T>>>,
    modified: RwLock<Vec<Listener<T>>>,
}

impl<T> Default for Model<T> {
    fn default() -> Self {
        Self {
            elements: RwLock::new(Vec::new()),
            added: RwLock::new(Vec::new()),
            modified: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Clone> Model<T> {
    /// Build an empty model without observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every element appended to the model.
    pub fn on_element_added(&self, callback: impl Fn(ElementId, &T) + Send + Sync + 'static) {
        self.added.write().push(Arc::new(callback));
    }

    /// Register a callback invoked whenever an existing element is replaced.
    pub fn on_element_modified(&self, callback: impl Fn(ElementId, &T) + Send + Sync + 'static) {
        self.modified.write().push(Arc::new(callback));
    }

    /// Append an element, returning the identity it was assigned.
    pub fn add_element(&self, element: T) -> ElementId {
        let id = ElementId::next();
        self.elements.write().push((id, element.clone()));
        notify(&self.added, id, &element);
        id
    }

    /// Replace the element stored under `id`. Returns `false` when the id is unknown.
    pub fn modify_element(&self, id: ElementId, element: T) -> bool {
        {
            let mut elements = self.elements.write();
            match elements.iter_mut().find(|(current, _)| *current == id) {
                Some((_, slot)) => *slot = element.clone(),
                None => return false,
            }
        }

        notify(&self.modified, id, &element);
        true
    }

    /// Snapshot of the elements in insertion order.
    pub fn elements(&self) -> Vec<T> {
        self.elements
            .read()
            .iter()
            .map(|(_, element)| element.clone())
            .collect()
    }

    /// Look up a single element by identity.
    pub fn get(&self, id: ElementId) -> Option<T> {
        self.elements
            .read()
            .iter()
            .find(|(current, _)| *current == id)
            .map(|(_, element)| element.clone())
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// Whether the model holds no element.
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }
}

fn notify<T>(listeners: &RwLock<Vec<Listener<T>>>, id: ElementId, element: &T) {
    let listeners: Vec<Listener<T>> = listeners.read().clone();
    for listener in listeners {
        listener(id, element);
    }
}
