use crate::builtin::BuiltinCommand;
use crate::command::{Rejected, Reply};
use crate::env::Environment;
use crate::money::Money;
use crate::parser::{self, Field};
use crate::store::{Book, KEYWORD_SEPARATOR, KeywordSet, Privilege};
use argh::FromArgs;

const MODIFY_FIELDS: &[Field] = &[
    Field::Isbn,
    Field::Name,
    Field::Author,
    Field::Keyword,
    Field::Price,
];

const SHOW_FIELDS: &[Field] = &[Field::Isbn, Field::Name, Field::Author, Field::Keyword];

#[derive(FromArgs)]
/// Open a book for editing, cataloguing it if the ISBN is new.
pub struct Select {
    #[argh(positional)]
    /// the book's ISBN.
    pub isbn: String,
}

impl BuiltinCommand for Select {
    fn name() -> &'static str {
        "select"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_at_least(Privilege::Staff)?;
        env.select(&self.isbn);
        Ok(Reply::new())
    }
}

/// Validated changes for the selected book, applied only once every flag
/// has been checked.
#[derive(Debug, Default)]
struct BookEdit {
    isbn: Option<String>,
    name: Option<String>,
    author: Option<String>,
    keywords: Option<KeywordSet>,
    price: Option<Money>,
}

impl BookEdit {
    fn apply_fields(self, book: &mut Book) -> Option<String> {
        if let Some(name) = self.name {
            book.name = name;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(keywords) = self.keywords {
            book.keywords = keywords;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        self.isbn
    }
}

#[derive(FromArgs)]
/// Change fields of the selected book with -ISBN=, -name=, -author=,
/// -keyword= and -price= flags, each at most once.
pub struct Modify {
    #[argh(positional, greedy)]
    /// field assignments of the form -key=value.
    pub flags: Vec<String>,
}

impl Modify {
    fn validate(&self, env: &Environment, selected: &str) -> Result<BookEdit, Rejected> {
        if self.flags.is_empty() {
            return Err(Rejected::BadArguments);
        }
        let mut edit = BookEdit::default();
        for flag in parser::parse_flags(&self.flags, MODIFY_FIELDS)? {
            match flag.field {
                Field::Isbn => {
                    if flag.value.is_empty() {
                        return Err(Rejected::BadArguments);
                    }
                    if flag.value == selected || env.store().book(&flag.value).is_some() {
                        return Err(Rejected::Duplicate("ISBN"));
                    }
                    edit.isbn = Some(flag.value);
                }
                Field::Name => edit.name = Some(flag.value),
                Field::Author => edit.author = Some(flag.value),
                Field::Keyword => edit.keywords = Some(KeywordSet::parse(&flag.value)?),
                Field::Price => {
                    let price: Money = flag.value.parse().map_err(|_| Rejected::BadArguments)?;
                    edit.price = Some(price);
                }
            }
        }
        Ok(edit)
    }
}

impl BuiltinCommand for Modify {
    fn name() -> &'static str {
        "modify"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_at_least(Privilege::Staff)?;
        let selected = env.require_selected()?;
        let edit = self.validate(env, &selected)?;

        let book = env
            .store_mut()
            .book_mut(&selected)
            .ok_or(Rejected::Missing("book"))?;
        if let Some(new_isbn) = edit.apply_fields(book) {
            env.rename_selected(&new_isbn)?;
        }
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Receive stock for the selected book at a total cost.
///
/// The cost is rounded to whole cents before it is checked, so an amount
/// below half a cent counts as zero and is refused.
pub struct Import {
    #[argh(positional)]
    /// number of copies received.
    pub quantity: u64,
    #[argh(positional)]
    /// total cost paid for the delivery.
    pub cost: Money,
}

impl BuiltinCommand for Import {
    fn name() -> &'static str {
        "import"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_at_least(Privilege::Staff)?;
        let selected = env.require_selected()?;
        if self.quantity == 0 || !self.cost.is_positive() {
            return Err(Rejected::BadArguments);
        }
        env.store_mut().restock(&selected, self.quantity, self.cost)?;
        Ok(Reply::new())
    }
}

#[derive(FromArgs)]
/// Sell copies of a book and print the total charged.
pub struct Buy {
    #[argh(positional)]
    /// the book's ISBN.
    pub isbn: String,
    #[argh(positional)]
    /// number of copies.
    pub quantity: u64,
}

impl BuiltinCommand for Buy {
    fn name() -> &'static str {
        "buy"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_at_least(Privilege::Customer)?;
        if self.quantity == 0 {
            return Err(Rejected::BadArguments);
        }
        let total = env.store_mut().sell(&self.isbn, self.quantity)?;
        Ok(format!("{}\n", total))
    }
}

#[derive(FromArgs)]
/// List books in ISBN order, optionally filtered by one of -ISBN=, -name=,
/// -author= (exact match) or -keyword= (any part of the keyword text).
pub struct Show {
    #[argh(positional)]
    /// a single -key=value filter.
    pub filter: Option<String>,
}

/// Which books a `show` lists.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    All,
    Isbn(String),
    Name(String),
    Author(String),
    Keyword(String),
}

impl Filter {
    fn matches(&self, book: &Book) -> bool {
        match self {
            Filter::All => true,
            Filter::Isbn(isbn) => book.isbn == *isbn,
            Filter::Name(name) => book.name == *name,
            Filter::Author(author) => book.author == *author,
            Filter::Keyword(fragment) => book.keywords.mentions(fragment),
        }
    }
}

impl Show {
    /// Multi-keyword queries aren't supported, so a keyword containing the
    /// separator is refused rather than read as "any of". Empty values are
    /// allowed and match empty fields.
    fn parse_filter(&self) -> Result<Filter, Rejected> {
        let Some(token) = &self.filter else {
            return Ok(Filter::All);
        };
        let flag = parser::parse_flag(token, SHOW_FIELDS)?;
        match flag.field {
            Field::Isbn => Ok(Filter::Isbn(flag.value)),
            Field::Name => Ok(Filter::Name(flag.value)),
            Field::Author => Ok(Filter::Author(flag.value)),
            Field::Keyword if flag.value.contains(KEYWORD_SEPARATOR) => {
                Err(Rejected::BadArguments)
            }
            Field::Keyword => Ok(Filter::Keyword(flag.value)),
            Field::Price => Err(Rejected::BadArguments),
        }
    }
}

impl BuiltinCommand for Show {
    fn name() -> &'static str {
        "show"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_at_least(Privilege::Customer)?;
        let filter = self.parse_filter()?;

        let mut reply = Reply::new();
        for book in env.store().books().filter(|book| filter.matches(book)) {
            reply.push_str(&book.to_string());
            reply.push('\n');
        }
        if reply.is_empty() {
            reply.push('\n');
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LedgerEntry, RecordStore, ROOT_ID, ROOT_PASSWORD, User};

    fn staff_env() -> Environment {
        let mut store = RecordStore::bootstrap();
        store
            .add_user(User::new("clerk", "pw", "Clerk", Privilege::Staff))
            .unwrap();
        store
            .add_user(User::new("reader", "rd", "Reader", Privilege::Customer))
            .unwrap();
        let mut env = Environment::new(store);
        env.login("clerk", Some("pw")).unwrap();
        env
    }

    fn modify(env: &mut Environment, flags: &[&str]) -> Result<Reply, Rejected> {
        Modify {
            flags: flags.iter().map(|f| f.to_string()).collect(),
        }
        .execute(env)
    }

    fn select(env: &mut Environment, isbn: &str) {
        Select { isbn: isbn.into() }.execute(env).unwrap();
    }

    fn import(env: &mut Environment, quantity: u64, cost: &str) -> Result<Reply, Rejected> {
        Import {
            quantity,
            cost: cost.parse().unwrap(),
        }
        .execute(env)
    }

    fn buy(env: &mut Environment, isbn: &str, quantity: u64) -> Result<Reply, Rejected> {
        Buy {
            isbn: isbn.into(),
            quantity,
        }
        .execute(env)
    }

    fn show(env: &mut Environment, filter: Option<&str>) -> Result<Reply, Rejected> {
        Show {
            filter: filter.map(str::to_string),
        }
        .execute(env)
    }

    #[test]
    fn test_select_requires_staff_and_creates_book() {
        let mut env = staff_env();
        env.login("reader", None).unwrap();
        assert_eq!(
            Select { isbn: "001".into() }.execute(&mut env),
            Err(Rejected::Privilege)
        );
        env.logout().unwrap();

        select(&mut env, "001");
        assert_eq!(env.store().book("001"), Some(&Book::blank("001")));
        assert_eq!(env.selected(), Some("001"));
    }

    #[test]
    fn test_modify_sets_fields() {
        let mut env = staff_env();
        select(&mut env, "001");
        modify(
            &mut env,
            &["-name=Algorithms", "-author=Knuth", "-keyword=cs|math", "-price=9.99"],
        )
        .unwrap();
        let book = env.store().book("001").unwrap();
        assert_eq!(book.to_string(), "001\tAlgorithms\tKnuth\tcs|math\t9.99\t0");
    }

    #[test]
    fn test_modify_without_selection_or_flags() {
        let mut env = staff_env();
        assert!(modify(&mut env, &["-name=x"]).is_err());
        select(&mut env, "001");
        assert_eq!(modify(&mut env, &[]), Err(Rejected::BadArguments));
    }

    #[test]
    fn test_modify_is_all_or_nothing() {
        let mut env = staff_env();
        select(&mut env, "001");
        modify(&mut env, &["-name=Old"]).unwrap();

        for flags in [
            &["-name=New", "-price=abc"][..],
            &["-name=New", "-keyword=a|a"],
            &["-name=New", "-name=Other"],
            &["-name=New", "-title=x"],
            &["-name=New", "plain"],
            &["-name=New", "-price=-1"],
        ] {
            assert!(modify(&mut env, flags).is_err(), "{flags:?}");
            assert_eq!(env.store().book("001").unwrap().name, "Old");
        }
    }

    #[test]
    fn test_modify_isbn_rename_and_collisions() {
        let mut env = staff_env();
        select(&mut env, "002");
        select(&mut env, "001");

        assert_eq!(modify(&mut env, &["-ISBN=001"]), Err(Rejected::Duplicate("ISBN")));
        assert_eq!(modify(&mut env, &["-ISBN=002"]), Err(Rejected::Duplicate("ISBN")));
        assert_eq!(modify(&mut env, &["-ISBN="]), Err(Rejected::BadArguments));
        assert_eq!(env.store().book_count(), 2);

        modify(&mut env, &["-ISBN=003", "-name=Moved"]).unwrap();
        assert_eq!(env.selected(), Some("003"));
        assert!(env.store().book("001").is_none());
        assert_eq!(env.store().book("003").unwrap().name, "Moved");

        modify(&mut env, &["-author=Someone"]).unwrap();
        assert_eq!(env.store().book("003").unwrap().author, "Someone");
    }

    #[test]
    fn test_import_adds_stock_and_restock_entry() {
        let mut env = staff_env();
        assert!(import(&mut env, 5, "20").is_err());
        select(&mut env, "001");
        import(&mut env, 5, "20").unwrap();
        assert_eq!(env.store().book("001").unwrap().stock, 5);
        assert_eq!(
            env.store().ledger(),
            [LedgerEntry::restock(Money::from_cents(2000))]
        );
    }

    #[test]
    fn test_import_rejects_zero_quantity_or_cost() {
        let mut env = staff_env();
        select(&mut env, "001");
        assert!(import(&mut env, 0, "20").is_err());
        assert!(import(&mut env, 3, "0").is_err());
        assert!(import(&mut env, 3, "0.004").is_err());
        assert_eq!(env.store().book("001").unwrap().stock, 0);
        assert!(env.store().ledger().is_empty());
    }

    #[test]
    fn test_buy_charges_price_times_quantity() {
        let mut env = staff_env();
        select(&mut env, "001");
        modify(&mut env, &["-price=9.99"]).unwrap();
        import(&mut env, 5, "20").unwrap();

        env.login("reader", None).unwrap();
        assert_eq!(buy(&mut env, "001", 2), Ok("19.98\n".to_string()));
        assert_eq!(env.store().book("001").unwrap().stock, 3);
        assert_eq!(
            env.store().ledger().last(),
            Some(&LedgerEntry::sale(Money::from_cents(1998)))
        );
    }

    #[test]
    fn test_buy_over_stock_changes_nothing() {
        let mut env = staff_env();
        select(&mut env, "001");
        import(&mut env, 2, "5").unwrap();

        assert!(buy(&mut env, "001", 3).is_err());
        assert!(buy(&mut env, "001", 0).is_err());
        assert!(buy(&mut env, "999", 1).is_err());
        assert_eq!(env.store().book("001").unwrap().stock, 2);
        assert_eq!(env.store().ledger().len(), 1);
    }

    #[test]
    fn test_buy_needs_a_session() {
        let mut env = staff_env();
        select(&mut env, "001");
        import(&mut env, 2, "5").unwrap();
        env.logout().unwrap();
        assert_eq!(buy(&mut env, "001", 1), Err(Rejected::Privilege));
    }

    #[test]
    fn test_show_empty_store_prints_blank_line() {
        let mut env = staff_env();
        assert_eq!(show(&mut env, None), Ok("\n".to_string()));
    }

    #[test]
    fn test_show_sorted_and_filtered() {
        let mut env = staff_env();
        select(&mut env, "b");
        modify(&mut env, &["-name=Beta", "-keyword=x|y", "-author=Ann"]).unwrap();
        select(&mut env, "a");
        modify(&mut env, &["-name=Alpha", "-keyword=y", "-author=Bob"]).unwrap();

        assert_eq!(
            show(&mut env, None).unwrap(),
            "a\tAlpha\tBob\ty\t0.00\t0\nb\tBeta\tAnn\tx|y\t0.00\t0\n"
        );
        assert_eq!(
            show(&mut env, Some("-keyword=y")).unwrap().lines().count(),
            2
        );
        assert!(show(&mut env, Some("-keyword=x")).unwrap().starts_with("b\t"));
        assert!(show(&mut env, Some("-author=Bob")).unwrap().starts_with("a\t"));
        assert!(show(&mut env, Some("-ISBN=b")).unwrap().starts_with("b\t"));
        assert_eq!(show(&mut env, Some("-name=Gamma")), Ok("\n".to_string()));
    }

    #[test]
    fn test_show_rejects_bad_filters() {
        let mut env = staff_env();
        for bad in ["-keyword=x|y", "-keyword=|", "-price=1", "name=x", "-colour=red"] {
            assert!(show(&mut env, Some(bad)).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_show_keyword_matches_part_of_keyword_text() {
        let mut env = staff_env();
        select(&mut env, "001");
        modify(&mut env, &["-keyword=fantasy|epic"]).unwrap();
        select(&mut env, "002");
        modify(&mut env, &["-name=Plain"]).unwrap();

        assert!(show(&mut env, Some("-keyword=fan")).unwrap().starts_with("001\t"));
        assert!(show(&mut env, Some("-keyword=pic")).unwrap().starts_with("001\t"));
        assert_eq!(show(&mut env, Some("-keyword=fantasy")).unwrap().lines().count(), 1);
        assert_eq!(show(&mut env, Some("-keyword=drama")), Ok("\n".to_string()));
    }

    #[test]
    fn test_show_empty_values_match_empty_fields() {
        let mut env = staff_env();
        select(&mut env, "001");
        select(&mut env, "002");
        modify(&mut env, &["-name=Named", "-author=Someone"]).unwrap();

        assert_eq!(show(&mut env, Some("-name=")), Ok("001\t\t\t\t0.00\t0\n".to_string()));
        assert_eq!(show(&mut env, Some("-author=")), Ok("001\t\t\t\t0.00\t0\n".to_string()));
        assert_eq!(show(&mut env, Some("-keyword=")).unwrap().lines().count(), 2);
        assert_eq!(show(&mut env, Some("-ISBN=")), Ok("\n".to_string()));
    }

    #[test]
    fn test_show_requires_login() {
        let mut env = staff_env();
        env.logout().unwrap();
        assert_eq!(show(&mut env, None), Err(Rejected::Privilege));
        env.login(ROOT_ID, Some(ROOT_PASSWORD)).unwrap();
        assert!(show(&mut env, None).is_ok());
    }
}
