use crate::command::Rejected;
use crate::money::Money;
use std::collections::BTreeMap;
use std::fmt;

/// Separator between keyword segments of a book.
pub const KEYWORD_SEPARATOR: char = '|';

/// Closed set of access levels. Ordering follows the numeric level.
///
/// `Guest` is what an empty session stack reports; it can never be granted
/// to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    Guest = 0,
    Customer = 1,
    Staff = 3,
    Admin = 7,
}

impl Privilege {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Privilege {
    type Error = Rejected;

    /// Only grantable levels convert; 0 is rejected along with everything
    /// outside {1, 3, 7}.
    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Privilege::Customer),
            3 => Ok(Privilege::Staff),
            7 => Ok(Privilege::Admin),
            _ => Err(Rejected::BadArguments),
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub password: String,
    pub name: String,
    pub privilege: Privilege,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        privilege: Privilege,
    ) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
            name: name.into(),
            privilege,
        }
    }
}

/// Ordered keywords of a book, no segment repeated and none empty.
///
/// The textual form joins segments with [`KEYWORD_SEPARATOR`]; the empty
/// string stands for no keywords at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    segments: Vec<String>,
}

impl KeywordSet {
    pub fn parse(raw: &str) -> Result<Self, Rejected> {
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let mut segments: Vec<String> = Vec::new();
        for segment in raw.split(KEYWORD_SEPARATOR) {
            if segment.is_empty() {
                return Err(Rejected::Precondition("empty keyword segment"));
            }
            if segments.iter().any(|s| s == segment) {
                return Err(Rejected::Duplicate("keyword"));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Whether `fragment` occurs anywhere in the joined keyword text.
    pub fn mentions(&self, fragment: &str) -> bool {
        self.to_string().contains(fragment)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", KEYWORD_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Book {
    pub isbn: String,
    pub name: String,
    pub author: String,
    pub keywords: KeywordSet,
    pub price: Money,
    pub stock: u64,
}

impl Book {
    /// A freshly catalogued book: everything but the ISBN empty or zero.
    pub fn blank(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Book {
    /// Tab separated listing line as printed by `show`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.isbn, self.name, self.author, self.keywords, self.price, self.stock
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Sale,
    Restock,
}

/// One monetary event. `amount` is never negative; `kind` says which way
/// the money went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: EntryKind,
    pub amount: Money,
}

impl LedgerEntry {
    pub fn sale(amount: Money) -> Self {
        Self {
            kind: EntryKind::Sale,
            amount,
        }
    }

    pub fn restock(amount: Money) -> Self {
        Self {
            kind: EntryKind::Restock,
            amount,
        }
    }
}

/// Income and expenditure over some slice of the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Money,
    pub expenditure: Money,
}

impl Totals {
    /// These totals with `entry` counted, or `None` when a sum no longer
    /// fits in [`Money`].
    pub fn with(self, entry: &LedgerEntry) -> Option<Self> {
        let mut next = self;
        match entry.kind {
            EntryKind::Sale => next.income = self.income.checked_add(entry.amount)?,
            EntryKind::Restock => next.expenditure = self.expenditure.checked_add(entry.amount)?,
        }
        Some(next)
    }

    pub fn over(entries: &[LedgerEntry]) -> Option<Self> {
        entries
            .iter()
            .try_fold(Self::default(), |acc, entry| acc.with(entry))
    }

    pub fn profit(&self) -> Option<Money> {
        self.income.checked_sub(self.expenditure)
    }
}

/// Users, books and the ledger. Every mutation of persistent state goes
/// through here.
///
/// `totals` always equals `Totals::over(&ledger)`; an entry that would push
/// either sum out of range is refused, so totals over any part of the
/// ledger are representable too.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    users: BTreeMap<String, User>,
    books: BTreeMap<String, Book>,
    ledger: Vec<LedgerEntry>,
    totals: Totals,
}

const TOTALS_OUT_OF_RANGE: Rejected = Rejected::Precondition("ledger totals out of range");

pub const ROOT_ID: &str = "root";
pub const ROOT_PASSWORD: &str = "sjtu";
pub const ROOT_NAME: &str = "root";

impl RecordStore {
    /// A store holding only the bootstrap administrator.
    pub fn bootstrap() -> Self {
        let mut store = Self::default();
        store.users.insert(
            ROOT_ID.to_string(),
            User::new(ROOT_ID, ROOT_PASSWORD, ROOT_NAME, Privilege::Admin),
        );
        store
    }

    /// Assemble a store from previously persisted users and books, with an
    /// empty ledger. Later duplicates of a key replace earlier ones.
    pub fn from_records(
        users: impl IntoIterator<Item = User>,
        books: impl IntoIterator<Item = Book>,
    ) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            books: books.into_iter().map(|b| (b.isbn.clone(), b)).collect(),
            ..Self::default()
        }
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn add_user(&mut self, user: User) -> Result<(), Rejected> {
        if self.users.contains_key(&user.id) {
            return Err(Rejected::Duplicate("user"));
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn set_password(&mut self, id: &str, password: &str) -> Result<(), Rejected> {
        let user = self.users.get_mut(id).ok_or(Rejected::Missing("user"))?;
        user.password = password.to_string();
        Ok(())
    }

    pub fn remove_user(&mut self, id: &str) -> Result<User, Rejected> {
        self.users.remove(id).ok_or(Rejected::Missing("user"))
    }

    pub fn book(&self, isbn: &str) -> Option<&Book> {
        self.books.get(isbn)
    }

    pub fn book_mut(&mut self, isbn: &str) -> Option<&mut Book> {
        self.books.get_mut(isbn)
    }

    /// Books in ascending ISBN order.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Catalogue `isbn` if it is not known yet. Returns whether a new entry
    /// was created.
    pub fn ensure_book(&mut self, isbn: &str) -> bool {
        if self.books.contains_key(isbn) {
            return false;
        }
        self.books.insert(isbn.to_string(), Book::blank(isbn));
        true
    }

    /// Move the book at `from` to the key `to`, rewriting its ISBN.
    pub fn rekey_book(&mut self, from: &str, to: &str) -> Result<(), Rejected> {
        if from == to || self.books.contains_key(to) {
            return Err(Rejected::Duplicate("ISBN"));
        }
        let mut book = self.books.remove(from).ok_or(Rejected::Missing("book"))?;
        book.isbn = to.to_string();
        self.books.insert(to.to_string(), book);
        Ok(())
    }

    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Append `entry` to the ledger unless the totals would overflow.
    pub fn record(&mut self, entry: LedgerEntry) -> Result<(), Rejected> {
        self.totals = self.totals.with(&entry).ok_or(TOTALS_OUT_OF_RANGE)?;
        self.ledger.push(entry);
        Ok(())
    }

    /// Receive `quantity` copies of `isbn` bought for `cost` in total.
    /// Nothing changes unless both the stock and the ledger can take it.
    pub fn restock(&mut self, isbn: &str, quantity: u64, cost: Money) -> Result<(), Rejected> {
        let entry = LedgerEntry::restock(cost);
        let totals = self.totals.with(&entry).ok_or(TOTALS_OUT_OF_RANGE)?;
        let book = self.books.get_mut(isbn).ok_or(Rejected::Missing("book"))?;
        book.stock = book
            .stock
            .checked_add(quantity)
            .ok_or(Rejected::Precondition("stock overflow"))?;
        self.totals = totals;
        self.ledger.push(entry);
        Ok(())
    }

    /// Sell `quantity` copies of `isbn`, returning the amount charged.
    pub fn sell(&mut self, isbn: &str, quantity: u64) -> Result<Money, Rejected> {
        let book = self.books.get_mut(isbn).ok_or(Rejected::Missing("book"))?;
        if quantity > book.stock {
            return Err(Rejected::Precondition("not enough stock"));
        }
        let total = book
            .price
            .checked_mul(quantity)
            .ok_or(Rejected::Precondition("total overflow"))?;
        let entry = LedgerEntry::sale(total);
        let totals = self.totals.with(&entry).ok_or(TOTALS_OUT_OF_RANGE)?;
        book.stock -= quantity;
        self.totals = totals;
        self.ledger.push(entry);
        Ok(total)
    }

    /// The most recent `count` ledger entries, oldest first.
    pub fn recent(&self, count: usize) -> Option<&[LedgerEntry]> {
        let start = self.ledger.len().checked_sub(count)?;
        Some(&self.ledger[start..])
    }
}
