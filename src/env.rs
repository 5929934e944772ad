use crate::command::Rejected;
use crate::session::{Selection, SessionStack};
use crate::store::{Privilege, RecordStore, User};
use tracing::debug;

/// Everything a command may read or change.
///
/// One `Environment` is built at start-up from the loaded records, owned by
/// the [`Interpreter`](crate::Interpreter) for the whole run and handed back
/// for the final dump. The three parts stay private so that session
/// transitions and the selection they invalidate always move together.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    store: RecordStore,
    sessions: SessionStack,
    selection: Selection,
}

impl Environment {
    /// Wrap a store with no active session and nothing selected.
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            sessions: SessionStack::default(),
            selection: Selection::default(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn sessions(&self) -> &SessionStack {
        &self.sessions
    }

    pub fn into_store(self) -> RecordStore {
        self.store
    }

    /// The user whose session is on top of the stack.
    pub fn current_user(&self) -> Option<&User> {
        self.sessions.top().and_then(|id| self.store.user(id))
    }

    /// Privilege of the active session, [`Privilege::Guest`] when nobody is
    /// logged in.
    pub fn current_privilege(&self) -> Privilege {
        self.current_user()
            .map_or(Privilege::Guest, |user| user.privilege)
    }

    pub fn require_at_least(&self, min: Privilege) -> Result<(), Rejected> {
        if self.current_privilege() >= min {
            Ok(())
        } else {
            Err(Rejected::Privilege)
        }
    }

    pub fn require_admin(&self) -> Result<(), Rejected> {
        if self.current_privilege() == Privilege::Admin {
            Ok(())
        } else {
            Err(Rejected::Privilege)
        }
    }

    /// Push a session for `id`.
    ///
    /// With a password the match must be exact. Without one the active
    /// session must outrank the target.
    pub fn login(&mut self, id: &str, password: Option<&str>) -> Result<(), Rejected> {
        let target = self.store.user(id).ok_or(Rejected::Missing("user"))?;
        match password {
            Some(password) if password != target.password => {
                return Err(Rejected::Precondition("password mismatch"));
            }
            None if self.current_privilege() <= target.privilege => {
                return Err(Rejected::Privilege);
            }
            _ => {}
        }
        self.sessions.push(id);
        self.selection.clear();
        debug!(user = id, depth = self.sessions.depth(), "session opened");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), Rejected> {
        let id = self
            .sessions
            .pop()
            .ok_or(Rejected::Precondition("no active session"))?;
        self.selection.clear();
        debug!(user = %id, depth = self.sessions.depth(), "session closed");
        Ok(())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.current()
    }

    /// The selected ISBN, or a rejection if nothing is open for editing.
    pub fn require_selected(&self) -> Result<String, Rejected> {
        self.selection
            .current()
            .map(str::to_string)
            .ok_or(Rejected::Precondition("no book selected"))
    }

    /// Open `isbn` for editing, cataloguing it first if unknown.
    pub fn select(&mut self, isbn: &str) {
        if self.store.ensure_book(isbn) {
            debug!(isbn, "catalogued new book");
        }
        self.selection.select(isbn);
    }

    /// Rename the selected book and keep the selection on it.
    pub fn rename_selected(&mut self, to: &str) -> Result<(), Rejected> {
        let from = self.require_selected()?;
        self.store.rekey_book(&from, to)?;
        self.selection.select(to);
        Ok(())
    }
}
