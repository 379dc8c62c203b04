use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The note currently on screen. Replaced wholesale on every successful
/// fetch; the only other writer is the edit-save round trip, which replaces
/// it with the server's authoritative response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Note {
    pub title: String,
    pub html: String,
    pub raw: String,
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NoteSummary {
    pub title: String,
    pub url: String,
}

/// The notebook currently on screen. `name: None` is the unresolved
/// sentinel: a note was loaded first and its parent notebook has not been
/// fetched yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Notebook {
    pub name: Option<String>,
    pub url: String,
    pub notes: Vec<NoteSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Breadcrumb {
    pub label: String,
    pub href: String,
}

pub(crate) type SubscriberId = u64;

/// An observable value holder: `set` replaces the value and synchronously
/// notifies subscribers in registration order, exactly one cycle per call.
///
/// Deliberately framework-free (plain `Rc`/`RefCell`, no signals) so the
/// content model and the navigation engine stay testable on the host and
/// independent of the rendering layer. Single-threaded by construction.
pub(crate) struct Slot<T> {
    value: Rc<RefCell<T>>,
    subscribers: Rc<RefCell<Vec<(SubscriberId, Rc<dyn Fn(&T)>)>>>,
    next_id: Rc<Cell<SubscriberId>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            subscribers: Rc::clone(&self.subscribers),
            next_id: Rc::clone(&self.next_id),
        }
    }
}

impl<T: Clone> Slot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial)),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            next_id: Rc::new(Cell::new(0)),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriberId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(f)));
        id
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self) {
        // Snapshot first: a subscriber may read the slot or (un)subscribe
        // while we iterate, and must not hit a live borrow.
        let subs: Vec<Rc<dyn Fn(&T)>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        let value = self.value.borrow().clone();

        for f in subs {
            f(&value);
        }
    }
}

/// Singleton current-resource slots: exactly one live Note and one live
/// Notebook. Navigation overwrites, never appends. Only the navigation
/// engine writes; views subscribe and read.
#[derive(Clone)]
pub(crate) struct ContentModel {
    pub note: Slot<Note>,
    pub notebook: Slot<Notebook>,
}

impl ContentModel {
    pub fn new() -> Self {
        Self {
            note: Slot::new(Note::default()),
            notebook: Slot::new(Notebook::default()),
        }
    }

    pub fn set_note(&self, note: Note) {
        self.note.set(note);
    }

    pub fn set_notebook(&self, notebook: Notebook) {
        self.notebook.set(notebook);
    }

    /// False while in the note-first-load state, i.e. the current note's
    /// parent notebook has not been fetched yet.
    pub fn is_notebook_resolved(&self) -> bool {
        self.notebook.get().name.is_some()
    }
}

impl Default for ContentModel {
    fn default() -> Self {
        Self::new()
    }
}
