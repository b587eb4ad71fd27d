//! Search terms for the candidate database: synonym expansion and boolean queries.
//!
//! A boolean query combines terms with `AND`, `OR`, `NOT` and parentheses.
//! Operators are recognized only in upper case. Adjacent bare words form one
//! phrase, and double quotes keep operator words inside a phrase.

use thiserror::Error;

pub const MAX_QUERY_CHARS: usize = 500;
const MAX_TERMS: usize = 20;
const MAX_DEPTH: usize = 16;

/// Known alternative spellings, keyed by lowercase term. Each list includes the key.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("ml", &["ml", "machine learning", "deep learning"]),
    ("machine learning", &["machine learning", "ml", "deep learning"]),
    ("js", &["javascript", "js", "ecmascript"]),
    ("javascript", &["javascript", "js", "ecmascript"]),
    ("python", &["python", "python3"]),
    ("react", &["react", "reactjs", "react.js"]),
    ("aws", &["aws", "amazon web services", "ec2"]),
    ("k8s", &["kubernetes", "k8s"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("ci/cd", &["ci/cd", "cicd", "continuous integration", "continuous deployment"]),
    ("devops", &["devops", "dev ops", "site reliability"]),
    ("frontend", &["frontend", "front-end", "front end"]),
    ("backend", &["backend", "back-end", "back end", "server-side"]),
    ("fullstack", &["fullstack", "full-stack", "full stack"]),
    ("sql", &["sql", "mysql", "postgresql"]),
    ("nosql", &["nosql", "mongodb", "cassandra", "dynamodb"]),
    ("ux", &["ux", "user experience"]),
    ("hvac", &["hvac", "heating", "air conditioning", "refrigeration"]),
    ("plc", &["plc", "programmable logic controller"]),
    ("welding", &["welding", "welder", "mig", "tig"]),
    ("welder", &["welder", "welding", "mig", "tig"]),
    ("electrician", &["electrician", "electrical", "wiring"]),
    ("plumber", &["plumber", "plumbing", "pipefitter"]),
    ("plumbing", &["plumbing", "plumber", "pipefitter"]),
    ("cnc", &["cnc", "computer numerical control"]),
    ("cdl", &["cdl", "commercial driver"]),
    ("forklift", &["forklift", "reach truck", "pallet jack"]),
];

/// Returns each term followed by its synonyms, without case-insensitive duplicates.
pub fn expand_terms(terms: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    let mut push = |term: &str| {
        if !expanded.iter().any(|t| t.eq_ignore_ascii_case(term)) {
            expanded.push(term.to_string());
        }
    };
    for term in terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        push(term);
        let key = term.to_lowercase();
        if let Some((_, synonyms)) = SYNONYMS.iter().find(|(k, _)| *k == key) {
            for &synonym in synonyms.iter() {
                push(synonym);
            }
        }
    }
    expanded
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,

    #[error("query is longer than 500 characters")]
    TooLong,

    #[error("query has more than 20 terms")]
    TooManyTerms,

    #[error("query is nested too deeply")]
    TooDeep,

    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("expected a term {0}")]
    MissingTerm(&'static str),
}

/// A parsed boolean query. Each term matches the resume text or any of its synonyms.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolQuery {
    Term(String),
    Not(Box<BoolQuery>),
    And(Vec<BoolQuery>),
    Or(Vec<BoolQuery>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Word(String),
    Phrase(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => phrase.push(ch),
                        None => return Err(QueryError::UnterminatedQuote),
                    }
                }
                let phrase = phrase.trim();
                if !phrase.is_empty() {
                    tokens.push(Token::Phrase(phrase.to_string()));
                }
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Word(word),
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    terms: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Open | Token::Not | Token::Word(_) | Token::Phrase(_))
        )
    }

    fn descend(&mut self) -> Result<(), QueryError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(QueryError::TooDeep);
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<BoolQuery, QueryError> {
        let mut items = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            if !self.starts_operand() {
                return Err(QueryError::MissingTerm("after OR"));
            }
            items.push(self.parse_and()?);
        }
        Ok(collapse(items, BoolQuery::Or))
    }

    /// Juxtaposed operands are joined with an implicit AND.
    fn parse_and(&mut self) -> Result<BoolQuery, QueryError> {
        let mut items = vec![self.parse_unary()?];
        loop {
            if self.eat(&Token::And) {
                if !self.starts_operand() {
                    return Err(QueryError::MissingTerm("after AND"));
                }
                items.push(self.parse_unary()?);
            } else if self.starts_operand() {
                items.push(self.parse_unary()?);
            } else {
                break;
            }
        }
        Ok(collapse(items, BoolQuery::And))
    }

    fn parse_unary(&mut self) -> Result<BoolQuery, QueryError> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(BoolQuery::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<BoolQuery, QueryError> {
        let token = self.peek().cloned();
        match token {
            Some(Token::Open) => {
                self.pos += 1;
                self.descend()?;
                if self.peek() == Some(&Token::Close) {
                    return Err(QueryError::MissingTerm("inside parentheses"));
                }
                let inner = self.parse_or()?;
                if !self.eat(&Token::Close) {
                    return Err(QueryError::UnbalancedParentheses);
                }
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::Phrase(phrase)) => {
                self.pos += 1;
                self.term(phrase)
            }
            Some(Token::Word(first)) => {
                self.pos += 1;
                let mut words = vec![first];
                while let Some(Token::Word(next)) = self.peek() {
                    words.push(next.clone());
                    self.pos += 1;
                }
                self.term(words.join(" "))
            }
            Some(Token::Close) => Err(QueryError::UnbalancedParentheses),
            Some(_) => Err(QueryError::MissingTerm("before operator")),
            None => Err(QueryError::MissingTerm("at end of query")),
        }
    }

    fn term(&mut self, text: String) -> Result<BoolQuery, QueryError> {
        self.terms += 1;
        if self.terms > MAX_TERMS {
            return Err(QueryError::TooManyTerms);
        }
        Ok(BoolQuery::Term(text))
    }
}

fn collapse(mut items: Vec<BoolQuery>, join: fn(Vec<BoolQuery>) -> BoolQuery) -> BoolQuery {
    if items.len() == 1 {
        items.remove(0)
    } else {
        join(items)
    }
}

impl BoolQuery {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        if input.chars().count() > MAX_QUERY_CHARS {
            return Err(QueryError::TooLong);
        }
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(QueryError::Empty);
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            terms: 0,
        };
        let query = parser.parse_or()?;
        match parser.peek() {
            None => Ok(query),
            Some(Token::Close) => Err(QueryError::UnbalancedParentheses),
            Some(_) => Err(QueryError::MissingTerm("between operators")),
        }
    }
}
