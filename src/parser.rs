use crate::command::Rejected;
use regex::Regex;
use std::sync::LazyLock;

static FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([A-Za-z]+)=(.*)$").expect("flag pattern is valid"));

/// Split a command line into whitespace separated tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Book attribute addressed by a `-key=value` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Isbn,
    Name,
    Author,
    Keyword,
    Price,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "ISBN" => Some(Field::Isbn),
            "name" => Some(Field::Name),
            "author" => Some(Field::Author),
            "keyword" => Some(Field::Keyword),
            "price" => Some(Field::Price),
            _ => None,
        }
    }
}

/// One parsed `-key=value` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub field: Field,
    pub value: String,
}

/// Parse a single flag, accepting only keys listed in `allowed`.
pub fn parse_flag(token: &str, allowed: &[Field]) -> Result<Flag, Rejected> {
    let caps = FLAG.captures(token).ok_or(Rejected::BadArguments)?;
    let field = Field::from_key(&caps[1])
        .filter(|field| allowed.contains(field))
        .ok_or(Rejected::BadArguments)?;
    Ok(Flag {
        field,
        value: caps[2].to_string(),
    })
}

/// Parse every token as a flag. A repeated key rejects the whole list.
pub fn parse_flags<S: AsRef<str>>(tokens: &[S], allowed: &[Field]) -> Result<Vec<Flag>, Rejected> {
    let mut flags: Vec<Flag> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let flag = parse_flag(token.as_ref(), allowed)?;
        if flags.iter().any(|seen| seen.field == flag.field) {
            return Err(Rejected::Duplicate("flag"));
        }
        flags.push(flag);
    }
    Ok(flags)
}
