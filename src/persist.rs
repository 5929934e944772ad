//! Flat-file load and dump of the record store.
//!
//! Three files live in the data directory, one record per line. Fields are
//! written tab separated so that empty names and keyword lists survive a
//! round trip; lines without any tab are split on whitespace instead, which
//! keeps older space separated dumps readable.

use crate::money::Money;
use crate::store::{Book, EntryKind, KeywordSet, LedgerEntry, Privilege, RecordStore, User};
use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

pub const USER_FILE: &str = "users.dat";
pub const BOOK_FILE: &str = "books.dat";
pub const LEDGER_FILE: &str = "transactions.dat";

const SALE_TAG: &str = "buy";
const RESTOCK_TAG: &str = "import";

fn fields(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    }
}

fn parse_user(line: &str) -> Result<User> {
    let &[id, password, name, privilege] = fields(line).as_slice() else {
        bail!("expected 4 fields");
    };
    if id.is_empty() {
        bail!("empty user id");
    }
    let level: u8 = privilege.parse().context("privilege is not a number")?;
    let privilege = Privilege::try_from(level).map_err(|_| anyhow!("bad privilege {level}"))?;
    Ok(User::new(id, password, name, privilege))
}

fn parse_book(line: &str) -> Result<Book> {
    let &[isbn, name, author, keywords, price, stock] = fields(line).as_slice() else {
        bail!("expected 6 fields");
    };
    if isbn.is_empty() {
        bail!("empty ISBN");
    }
    Ok(Book {
        isbn: isbn.to_string(),
        name: name.to_string(),
        author: author.to_string(),
        keywords: KeywordSet::parse(keywords).map_err(|e| anyhow!("bad keywords: {e}"))?,
        price: price.parse()?,
        stock: stock.parse().context("stock is not a number")?,
    })
}

fn parse_entry(line: &str) -> Result<LedgerEntry> {
    let &[kind, amount] = fields(line).as_slice() else {
        bail!("expected 2 fields");
    };
    let amount: Money = amount.trim_start_matches('-').parse()?;
    match kind {
        SALE_TAG => Ok(LedgerEntry::sale(amount)),
        RESTOCK_TAG => Ok(LedgerEntry::restock(amount)),
        other => bail!("unknown ledger entry kind {other:?}"),
    }
}

/// Parse every non-blank line of `path`, skipping malformed ones. A missing
/// file yields `Ok(None)`.
fn read_records<T>(path: &Path, parse: fn(&str) -> Result<T>) -> Result<Option<Vec<T>>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("can't read {}", path.display())),
    };
    let mut records = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(file = %path.display(), line = number + 1, "skipping record: {e:#}"),
        }
    }
    Ok(Some(records))
}

/// Load users, books and the ledger from `dir`.
///
/// When no user could be loaded (file missing, unreadable or without a
/// single valid record) the store starts with only the bootstrap
/// administrator and nothing else is read.
pub fn load_all(dir: &Path) -> Result<RecordStore> {
    let users = match read_records(&dir.join(USER_FILE), parse_user) {
        Ok(Some(users)) if !users.is_empty() => users,
        Ok(_) => {
            warn!(dir = %dir.display(), "no stored users, starting with the bootstrap administrator");
            return Ok(RecordStore::bootstrap());
        }
        Err(e) => {
            warn!(dir = %dir.display(), "user records unreadable, starting with the bootstrap administrator: {e:#}");
            return Ok(RecordStore::bootstrap());
        }
    };
    let books = read_records(&dir.join(BOOK_FILE), parse_book)?.unwrap_or_default();
    let ledger = read_records(&dir.join(LEDGER_FILE), parse_entry)?.unwrap_or_default();

    let mut store = RecordStore::from_records(users, books);
    for (number, entry) in ledger.into_iter().enumerate() {
        if let Err(reason) = store.record(entry) {
            warn!(entry = number + 1, %reason, "skipping ledger entry");
        }
    }
    info!(
        users = store.user_count(),
        books = store.book_count(),
        entries = store.ledger().len(),
        "records loaded"
    );
    Ok(store)
}

fn write_lines<T>(path: &Path, records: impl Iterator<Item = T>, render: fn(T) -> String) -> Result<()> {
    let mut text = String::new();
    for record in records {
        text.push_str(&render(record));
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("can't write {}", path.display()))
}

/// Write the whole store to `dir`, replacing earlier dumps.
pub fn dump_all(dir: &Path, store: &RecordStore) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("can't create {}", dir.display()))?;

    write_lines(&dir.join(USER_FILE), store.users(), |u| {
        format!("{}\t{}\t{}\t{}", u.id, u.password, u.name, u.privilege)
    })?;
    write_lines(&dir.join(BOOK_FILE), store.books(), |b| {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            b.isbn, b.name, b.author, b.keywords, b.price, b.stock
        )
    })?;
    write_lines(&dir.join(LEDGER_FILE), store.ledger().iter(), |e| match e.kind {
        EntryKind::Sale => format!("{}\t{}", SALE_TAG, e.amount),
        EntryKind::Restock => format!("{}\t-{}", RESTOCK_TAG, e.amount),
    })?;

    info!(
        users = store.user_count(),
        books = store.book_count(),
        entries = store.ledger().len(),
        dir = %dir.display(),
        "records saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ROOT_ID, ROOT_PASSWORD};
    use tempfile::TempDir;

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::bootstrap();
        store
            .add_user(User::new("clerk", "pw", "Clerk", Privilege::Staff))
            .unwrap();
        store.ensure_book("001");
        store.ensure_book("002");
        let book = store.book_mut("002").unwrap();
        book.name = "Algorithms".into();
        book.keywords = KeywordSet::parse("cs|math").unwrap();
        book.price = Money::from_cents(999);
        book.stock = 3;
        store.record(LedgerEntry::restock(Money::from_cents(2000))).unwrap();
        store.record(LedgerEntry::sale(Money::from_cents(1998))).unwrap();
        store
    }

    #[test]
    fn test_missing_directory_bootstraps_root() {
        let dir = TempDir::new().unwrap();
        let store = load_all(&dir.path().join("absent")).unwrap();
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.user(ROOT_ID).unwrap().password, ROOT_PASSWORD);
        assert_eq!(store.book_count(), 0);
    }

    #[test]
    fn test_dump_then_load_restores_everything() {
        let dir = TempDir::new().unwrap();
        let store = sample_store();
        dump_all(dir.path(), &store).unwrap();

        let loaded = load_all(dir.path()).unwrap();
        assert_eq!(loaded.users().collect::<Vec<_>>(), store.users().collect::<Vec<_>>());
        assert_eq!(loaded.books().collect::<Vec<_>>(), store.books().collect::<Vec<_>>());
        assert_eq!(loaded.ledger(), store.ledger());
        assert_eq!(loaded.book("001").unwrap(), &Book::blank("001"));
    }

    #[test]
    fn test_ledger_file_keeps_sign_and_tag() {
        let dir = TempDir::new().unwrap();
        dump_all(dir.path(), &sample_store()).unwrap();
        let text = fs::read_to_string(dir.path().join(LEDGER_FILE)).unwrap();
        assert_eq!(text, "import\t-20.00\nbuy\t19.98\n");
    }

    #[test]
    fn test_reads_space_separated_records() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(USER_FILE), "root sjtu root 7\nbob pw Bob 1\n").unwrap();
        fs::write(dir.path().join(BOOK_FILE), "001 Name Author a|b 9.99 4\n").unwrap();
        fs::write(dir.path().join(LEDGER_FILE), "buy 19.98\nimport -50.00\n").unwrap();

        let store = load_all(dir.path()).unwrap();
        assert_eq!(store.user("bob").unwrap().privilege, Privilege::Customer);
        let book = store.book("001").unwrap();
        assert_eq!(book.to_string(), "001\tName\tAuthor\ta|b\t9.99\t4");
        assert_eq!(
            store.ledger(),
            [
                LedgerEntry::sale(Money::from_cents(1998)),
                LedgerEntry::restock(Money::from_cents(5000)),
            ]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(USER_FILE),
            "root sjtu root 7\nbroken line\nx y z 5\n\n",
        )
        .unwrap();
        fs::write(dir.path().join(LEDGER_FILE), "refund 3.00\nbuy abc\nbuy 1.00\n").unwrap();

        let store = load_all(dir.path()).unwrap();
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.ledger(), [LedgerEntry::sale(Money::from_cents(100))]);
    }

    #[test]
    fn test_ledger_entries_past_range_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(USER_FILE), "root\tsjtu\troot\t7\n").unwrap();
        fs::write(
            dir.path().join(LEDGER_FILE),
            "import\t-90000000000000000.00\nimport\t-90000000000000000.00\nbuy\t1.00\n",
        )
        .unwrap();

        let store = load_all(dir.path()).unwrap();
        assert_eq!(store.ledger().len(), 2);
        assert_eq!(store.totals().income, Money::from_cents(100));
        assert_eq!(
            store.totals().expenditure,
            Money::from_cents(9_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_empty_user_file_bootstraps_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(USER_FILE), "").unwrap();
        fs::write(dir.path().join(BOOK_FILE), "001\t\t\t\t0.00\t0\n").unwrap();
        let store = load_all(dir.path()).unwrap();
        assert!(store.user(ROOT_ID).is_some());
        assert_eq!(store.book_count(), 0);
    }
}
