//! Query-string parser and evaluator for the in-memory search index.
//!
//! Implements the subset of the Lucene query-string syntax that the phone
//! search endpoint accepts.
//!
//! # Syntax
//!
//! ```text
//! query     = clause { [ "OR" / "||" ] clause }     ; default operator is OR
//! clause    = unary { ( "AND" / "&&" ) unary }
//! unary     = ( "NOT" / "!" ) unary / primary
//! primary   = "(" query ")" / field ":" value / value
//! value     = term / phrase / range / "(" query ")"
//! term      = word, may contain "*" and "?" wildcards
//! phrase    = '"' text '"'
//! range     = ( "[" / "{" ) bound "TO" bound ( "]" / "}" )   ; "*" is an open bound
//! ```
//!
//! # Examples
//!
//! ```text
//! pixel
//! name:pixel AND brand:google
//! brand:"Google Inc" OR price:[100 TO 500}
//! ip* NOT brand:apple
//! name:*
//! ```
//!
//! Text is matched case-insensitively against the lowercase alphanumeric
//! tokens of `name` and `brand`. Bare numeric terms also match `id` and
//! `price`. Negated clauses next to positive ones exclude, as in Lucene:
//! `a NOT b` selects documents matching `a` but not `b`.

use std::cmp::Ordering;

use phoneservice_core::decimal::parse_decimal;
use phoneservice_core::{BigDecimal, Phone, PhoneField};
use phoneservice_storage::{FieldValue, StorageError};

/// One character of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Literal(char),
    /// `*`: any run of characters.
    Many,
    /// `?`: exactly one character.
    One,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Word(Vec<Piece>);

impl Word {
    fn literal(&self) -> Option<String> {
        self.0
            .iter()
            .map(|p| match p {
                Piece::Literal(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn is_lone_star(&self) -> bool {
        self.0 == [Piece::Many]
    }

    fn lowercase(&self) -> Vec<Piece> {
        self.0
            .iter()
            .flat_map(|p| match p {
                Piece::Literal(c) => c.to_lowercase().map(Piece::Literal).collect::<Vec<_>>(),
                other => vec![*other],
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeSpec {
    lower: Option<String>,
    upper: Option<String>,
    include_lower: bool,
    include_upper: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(Word),
    Phrase(String),
    Range(RangeSpec),
    Colon,
    OpenParen,
    CloseParen,
    And,
    Or,
    Not,
    Eof,
}

fn invalid(message: impl Into<String>) -> StorageError {
    StorageError::invalid_query(message)
}

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn next_token(&mut self) -> Result<Token, StorageError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }

        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };

        match ch {
            '(' => {
                self.pos += 1;
                Ok(Token::OpenParen)
            }
            ')' => {
                self.pos += 1;
                Ok(Token::CloseParen)
            }
            ':' => {
                self.pos += 1;
                Ok(Token::Colon)
            }
            '!' => {
                self.pos += 1;
                Ok(Token::Not)
            }
            '"' => {
                self.pos += 1;
                self.read_phrase()
            }
            '[' | '{' => {
                self.pos += 1;
                self.read_range(ch == '[')
            }
            _ => self.read_word(),
        }
    }

    fn read_phrase(&mut self) -> Result<Token, StorageError> {
        let mut text = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        text.push(escaped);
                    }
                }
                '"' => return Ok(Token::Phrase(text)),
                _ => text.push(c),
            }
        }
        Err(invalid("Unterminated phrase in query"))
    }

    fn read_range(&mut self, include_lower: bool) -> Result<Token, StorageError> {
        let mut body = String::new();
        let include_upper = loop {
            match self.bump() {
                Some(']') => break true,
                Some('}') => break false,
                Some(c) => body.push(c),
                None => return Err(invalid("Unterminated range in query")),
            }
        };

        let parts: Vec<&str> = body.split_whitespace().collect();
        let [lower, "TO", upper] = parts.as_slice() else {
            return Err(invalid(format!(
                "Malformed range '{body}', expected '<lower> TO <upper>'"
            )));
        };
        let bound = |s: &str| (s != "*").then(|| s.to_string());

        Ok(Token::Range(RangeSpec {
            lower: bound(*lower),
            upper: bound(*upper),
            include_lower,
            include_upper,
        }))
    }

    fn read_word(&mut self) -> Result<Token, StorageError> {
        let mut pieces = Vec::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | ':' | '"') {
                break;
            }
            self.pos += 1;
            match c {
                '\\' => {
                    escaped = true;
                    match self.bump() {
                        Some(next) => pieces.push(Piece::Literal(next)),
                        None => return Err(invalid("Dangling escape at end of query")),
                    }
                }
                '*' => pieces.push(Piece::Many),
                '?' => pieces.push(Piece::One),
                _ => pieces.push(Piece::Literal(c)),
            }
        }

        let word = Word(pieces);
        if !escaped && let Some(text) = word.literal() {
            match text.as_str() {
                "AND" | "&&" => return Ok(Token::And),
                "OR" | "||" => return Ok(Token::Or),
                "NOT" => return Ok(Token::Not),
                _ => {}
            }
        }
        Ok(Token::Word(word))
    }
}

/// Which attributes a term is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// `name` and `brand`, plus `id` and `price` for numeric terms.
    Default,
    Field(PhoneField),
    /// A field name the index does not know; matches nothing.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
enum Matcher {
    Term(String),
    Phrase(String),
    Wildcard(Vec<Piece>),
    Range(RangeSpec),
    Exists,
}

#[derive(Debug, Clone, PartialEq)]
enum QueryNode {
    MatchAll,
    Match { target: Target, matcher: Matcher },
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
    Not(Box<QueryNode>),
}

/// A parsed query, ready to be evaluated against documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Query(QueryNode);

struct Parser {
    tokenizer: Tokenizer,
    current: Token,
}

impl Parser {
    fn new(input: &str) -> Result<Self, StorageError> {
        let mut tokenizer = Tokenizer::new(input);
        let current = tokenizer.next_token()?;
        Ok(Self { tokenizer, current })
    }

    fn advance(&mut self) -> Result<Token, StorageError> {
        let next = self.tokenizer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn starts_clause(&self) -> bool {
        matches!(
            self.current,
            Token::Word(_) | Token::Phrase(_) | Token::Range(_) | Token::OpenParen | Token::Not
        )
    }

    /// Parse a sequence of clauses joined by OR or by juxtaposition.
    fn parse_or(&mut self, target: Target) -> Result<QueryNode, StorageError> {
        let mut should = Vec::new();
        let mut must_not = Vec::new();

        loop {
            match self.parse_and(target)? {
                QueryNode::Not(inner) => must_not.push(*inner),
                node => should.push(node),
            }
            if self.current == Token::Or {
                self.advance()?;
                if !self.starts_clause() {
                    return Err(invalid("Expected a clause after OR"));
                }
                continue;
            }
            if !self.starts_clause() {
                break;
            }
        }

        let positive = should
            .into_iter()
            .reduce(|l, r| QueryNode::Or(Box::new(l), Box::new(r)))
            .unwrap_or(QueryNode::MatchAll);
        Ok(match must_not
            .into_iter()
            .reduce(|l, r| QueryNode::Or(Box::new(l), Box::new(r)))
        {
            Some(excluded) => {
                QueryNode::And(Box::new(positive), Box::new(QueryNode::Not(Box::new(excluded))))
            }
            None => positive,
        })
    }

    fn parse_and(&mut self, target: Target) -> Result<QueryNode, StorageError> {
        let mut left = self.parse_not(target)?;

        while self.current == Token::And {
            self.advance()?;
            let right = self.parse_not(target)?;
            left = QueryNode::And(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_not(&mut self, target: Target) -> Result<QueryNode, StorageError> {
        if self.current == Token::Not {
            self.advance()?;
            let expr = self.parse_not(target)?;
            return Ok(QueryNode::Not(Box::new(expr)));
        }
        self.parse_primary(target)
    }

    fn parse_primary(&mut self, target: Target) -> Result<QueryNode, StorageError> {
        match self.advance()? {
            Token::OpenParen => self.parse_group(target),
            Token::Word(word) if self.current == Token::Colon => {
                self.advance()?;
                self.parse_field_value(&word)
            }
            Token::Word(word) => term(target, &word),
            Token::Phrase(text) => matcher(target, Matcher::Phrase(text)),
            Token::Range(range) => matcher(target, Matcher::Range(range)),
            Token::Eof => Err(invalid("Unexpected end of query")),
            other => Err(invalid(format!("Unexpected {} in query", describe(&other)))),
        }
    }

    fn parse_group(&mut self, target: Target) -> Result<QueryNode, StorageError> {
        let expr = self.parse_or(target)?;
        if self.current != Token::CloseParen {
            return Err(invalid("Expected ')' in query"));
        }
        self.advance()?;
        Ok(expr)
    }

    fn parse_field_value(&mut self, name: &Word) -> Result<QueryNode, StorageError> {
        if name.is_lone_star() {
            return match self.advance()? {
                Token::Word(value) if value.is_lone_star() => Ok(QueryNode::MatchAll),
                _ => Err(invalid("Only '*:*' is supported for the '*' field")),
            };
        }

        let Some(name) = name.literal() else {
            return Err(invalid("Field names cannot contain wildcards"));
        };
        let target = name
            .parse::<PhoneField>()
            .map(Target::Field)
            .unwrap_or(Target::Unknown);

        match self.advance()? {
            Token::OpenParen => self.parse_group(target),
            Token::Word(value) if value.is_lone_star() => matcher(target, Matcher::Exists),
            Token::Word(value) => term(target, &value),
            Token::Phrase(text) => matcher(target, Matcher::Phrase(text)),
            Token::Range(range) => matcher(target, Matcher::Range(range)),
            _ => Err(invalid(format!("Expected a value after '{name}:'"))),
        }
    }
}

fn describe(token: &Token) -> &'static str {
    match token {
        Token::Colon => "':'",
        Token::CloseParen => "')'",
        Token::And => "AND",
        Token::Or => "OR",
        Token::Not => "NOT",
        _ => "token",
    }
}

fn term(target: Target, word: &Word) -> Result<QueryNode, StorageError> {
    if target == Target::Default && word.is_lone_star() {
        return Ok(QueryNode::MatchAll);
    }
    match word.literal() {
        Some(text) => matcher(target, Matcher::Term(text)),
        None => matcher(target, Matcher::Wildcard(word.lowercase())),
    }
}

/// Builds a match node, rejecting values a numeric field can never hold.
fn matcher(target: Target, matcher: Matcher) -> Result<QueryNode, StorageError> {
    if let Target::Field(field) = target
        && !field.is_text()
    {
        let check = |raw: &str| {
            parse_decimal(raw)
                .map(|_| ())
                .map_err(|_| invalid(format!("'{raw}' is not a number for field '{field}'")))
        };
        match &matcher {
            Matcher::Term(text) | Matcher::Phrase(text) => check(text.as_str())?,
            Matcher::Range(range) => {
                for bound in [&range.lower, &range.upper].into_iter().flatten() {
                    check(bound.as_str())?;
                }
            }
            Matcher::Wildcard(_) | Matcher::Exists => {}
        }
    }
    Ok(QueryNode::Match { target, matcher })
}

/// Parses a query string.
///
/// # Errors
///
/// Returns `StorageError::InvalidQuery` for empty or malformed input.
pub fn parse_query(input: &str) -> Result<Query, StorageError> {
    if input.trim().is_empty() {
        return Err(invalid("Query must not be empty"));
    }

    let mut parser = Parser::new(input)?;
    let expr = parser.parse_or(Target::Default)?;

    if parser.current != Token::Eof {
        return Err(invalid(format!(
            "Unexpected {} after query",
            describe(&parser.current)
        )));
    }

    Ok(Query(expr))
}

/// Lowercase alphanumeric tokens of a text value.
fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Greedy matcher: on a mismatch only the most recent `*` is widened, so the
/// cost stays within `pattern.len() * text.len()` steps.
fn wildcard_match(pattern: &[Piece], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    // (pattern index after the last `*`, text index it is currently matched up to)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(Piece::Many) => {
                p += 1;
                star = Some((p, t));
            }
            Some(Piece::One) => {
                p += 1;
                t += 1;
            }
            Some(Piece::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((after_star, matched)) => {
                    p = after_star;
                    t = matched + 1;
                    star = Some((after_star, t));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|piece| matches!(piece, Piece::Many))
}

fn in_range<T: Ord>(value: &T, range: &RangeSpec, parse: impl Fn(&str) -> Option<T>) -> bool {
    let lower_ok = match &range.lower {
        None => true,
        Some(raw) => parse(raw).is_some_and(|b| match value.cmp(&b) {
            Ordering::Greater => true,
            Ordering::Equal => range.include_lower,
            Ordering::Less => false,
        }),
    };
    let upper_ok = match &range.upper {
        None => true,
        Some(raw) => parse(raw).is_some_and(|b| match value.cmp(&b) {
            Ordering::Less => true,
            Ordering::Equal => range.include_upper,
            Ordering::Greater => false,
        }),
    };
    lower_ok && upper_ok
}

fn text_matches(text: &str, matcher: &Matcher) -> bool {
    let tokens = analyze(text);
    match matcher {
        Matcher::Exists => true,
        Matcher::Term(query) | Matcher::Phrase(query) => {
            contains_sequence(&tokens, &analyze(query))
        }
        Matcher::Wildcard(pattern) => tokens.iter().any(|t| {
            let chars: Vec<char> = t.chars().collect();
            wildcard_match(pattern, &chars)
        }),
        Matcher::Range(range) => tokens
            .iter()
            .any(|t| in_range(t, range, |raw| Some(raw.to_lowercase()))),
    }
}

fn number_matches(value: &BigDecimal, matcher: &Matcher) -> bool {
    match matcher {
        Matcher::Exists => true,
        Matcher::Term(query) | Matcher::Phrase(query) => {
            parse_decimal(query).is_ok_and(|q| q == *value)
        }
        Matcher::Wildcard(pattern) => {
            let chars: Vec<char> = value.normalized().to_string().chars().collect();
            wildcard_match(pattern, &chars)
        }
        Matcher::Range(range) => in_range(value, range, |raw| parse_decimal(raw).ok()),
    }
}

fn field_matches(phone: &Phone, field: PhoneField, matcher: &Matcher) -> bool {
    match FieldValue::of(phone, field) {
        None => false,
        Some(FieldValue::Text(text)) => text_matches(&text, matcher),
        Some(FieldValue::Id(id)) => number_matches(&BigDecimal::from(id), matcher),
        Some(FieldValue::Decimal(value)) => number_matches(&value, matcher),
    }
}

impl QueryNode {
    fn matches(&self, phone: &Phone) -> bool {
        match self {
            QueryNode::MatchAll => true,
            QueryNode::Match { target, matcher } => match target {
                Target::Field(field) => field_matches(phone, *field, matcher),
                Target::Unknown => false,
                Target::Default => PhoneField::ALL
                    .into_iter()
                    .any(|field| field_matches(phone, field, matcher)),
            },
            QueryNode::And(l, r) => l.matches(phone) && r.matches(phone),
            QueryNode::Or(l, r) => l.matches(phone) || r.matches(phone),
            QueryNode::Not(inner) => !inner.matches(phone),
        }
    }
}

impl Query {
    /// Evaluates the query against a document.
    pub fn matches(&self, phone: &Phone) -> bool {
        self.0.matches(phone)
    }

    /// Returns `true` for queries that select every document.
    pub fn is_match_all(&self) -> bool {
        self.0 == QueryNode::MatchAll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phones() -> Vec<Phone> {
        vec![
            Phone::new("Pixel 8", "Google", 699).with_id(1),
            Phone::new("iPhone 15", "Apple", 999).with_id(2),
            Phone::new("Galaxy S24", "Samsung", 799).with_id(3),
            Phone::default().with_id(4).with_brand("Nokia"),
        ]
    }

    fn hits(query: &str) -> Vec<i64> {
        let node = parse_query(query).unwrap();
        phones()
            .iter()
            .filter(|p| node.matches(p))
            .filter_map(|p| p.id)
            .collect()
    }

    #[test]
    fn bare_term_matches_text_fields_case_insensitively() {
        assert_eq!(hits("pixel"), vec![1]);
        assert_eq!(hits("GOOGLE"), vec![1]);
        assert_eq!(hits("nothing"), Vec::<i64>::new());
    }

    #[test]
    fn bare_numeric_term_matches_id_and_price() {
        assert_eq!(hits("2"), vec![2]);
        assert_eq!(hits("799"), vec![3]);
        assert_eq!(hits("15"), vec![2]);
    }

    #[test]
    fn default_operator_is_or() {
        assert_eq!(hits("pixel samsung"), vec![1, 3]);
        assert_eq!(hits("pixel OR samsung"), vec![1, 3]);
        assert_eq!(hits("pixel || samsung"), vec![1, 3]);
    }

    #[test]
    fn and_not_and_grouping() {
        assert_eq!(hits("name:pixel AND brand:google"), vec![1]);
        assert_eq!(hits("name:pixel && brand:apple"), Vec::<i64>::new());
        assert_eq!(hits("NOT brand:apple"), vec![1, 3, 4]);
        assert_eq!(hits("!brand:apple"), vec![1, 3, 4]);
        assert_eq!(hits("(pixel OR iphone) AND NOT brand:apple"), vec![1]);
        assert_eq!(hits("brand:(google OR samsung)"), vec![1, 3]);
    }

    #[test]
    fn negated_clause_excludes_from_disjunction() {
        assert_eq!(hits("google apple NOT iphone"), vec![1]);
    }

    #[test]
    fn phrases_match_consecutive_tokens() {
        assert_eq!(hits("name:\"galaxy s24\""), vec![3]);
        assert_eq!(hits("\"s24 galaxy\""), Vec::<i64>::new());
    }

    #[test]
    fn wildcards() {
        assert_eq!(hits("i*"), vec![2]);
        assert_eq!(hits("brand:?oogle"), vec![1]);
        assert_eq!(hits("name:*"), vec![1, 2, 3]);
        assert_eq!(hits("*"), vec![1, 2, 3, 4]);
        assert_eq!(hits("*:*"), vec![1, 2, 3, 4]);
    }

    fn pieces(pattern: &str) -> Vec<Piece> {
        pattern
            .chars()
            .map(|c| match c {
                '*' => Piece::Many,
                '?' => Piece::One,
                c => Piece::Literal(c),
            })
            .collect()
    }

    fn glob(pattern: &str, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        wildcard_match(&pieces(pattern), &text)
    }

    #[test]
    fn wildcard_backtracks_to_last_star() {
        assert!(glob("*b*c", "abxbyc"));
        assert!(glob("a*b?d", "axxbbcd"));
        assert!(glob("**", ""));
        assert!(glob("a*", "a"));
        assert!(!glob("a*c", "abcb"));
        assert!(!glob("?", ""));
        assert!(!glob("abc", "ab"));
    }

    #[test]
    fn many_stars_against_long_token_finish_quickly() {
        let pattern = format!("name:{}b", "*a".repeat(40));
        let query = parse_query(&pattern).unwrap();
        let long = Phone::new("a".repeat(5000), "Acme", 1).with_id(1);

        let started = std::time::Instant::now();
        assert!(!query.matches(&long));
        let tail = Phone::new(format!("{}b", "a".repeat(5000)), "Acme", 1).with_id(2);
        assert!(query.matches(&tail));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn numeric_ranges() {
        assert_eq!(hits("price:[699 TO 799]"), vec![1, 3]);
        assert_eq!(hits("price:{699 TO 799]"), vec![3]);
        assert_eq!(hits("price:[800 TO *]"), vec![2]);
        assert_eq!(hits("id:[* TO 2}"), vec![1]);
    }

    #[test]
    fn text_ranges_compare_tokens() {
        assert_eq!(hits("brand:[a TO b]"), vec![2]);
    }

    #[test]
    fn unknown_fields_match_nothing() {
        assert_eq!(hits("color:red"), Vec::<i64>::new());
    }

    #[test]
    fn malformed_queries_are_rejected() {
        for query in [
            "",
            "   ",
            "name:",
            "(pixel",
            "pixel)",
            "\"open",
            "price:[1 TO",
            "price:[1 5]",
            "pixel AND",
            "OR pixel",
            "price:cheap",
            "na*e:pixel",
        ] {
            let err = parse_query(query).unwrap_err();
            assert!(err.is_invalid_query(), "query {query:?} gave {err:?}");
        }
    }

    #[test]
    fn escaped_operators_are_terms() {
        let node = parse_query("\\AND").unwrap();
        let phone = Phone::default().with_id(9).with_name("AND");
        assert!(node.matches(&phone));
    }

    #[test]
    fn match_all_detection() {
        assert!(parse_query("*").unwrap().is_match_all());
        assert!(!parse_query("pixel").unwrap().is_match_all());
    }
}
