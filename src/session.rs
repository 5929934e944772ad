/// Nested logins, innermost last.
///
/// Holds user ids only; privileges are looked up in the record store so a
/// frame can never disagree with the user it names.
#[derive(Debug, Clone, Default)]
pub struct SessionStack {
    frames: Vec<String>,
}

impl SessionStack {
    pub fn push(&mut self, id: impl Into<String>) {
        self.frames.push(id.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.frames.iter().any(|frame| frame == id)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the outermost login to the active one.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(String::as_str)
    }
}

/// The book currently open for editing, by ISBN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    isbn: Option<String>,
}

impl Selection {
    pub fn current(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    pub fn select(&mut self, isbn: impl Into<String>) {
        self.isbn = Some(isbn.into());
    }

    pub fn clear(&mut self) {
        self.isbn = None;
    }
}
