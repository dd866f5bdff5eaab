//! Statement classification.
//!
//! Reads and writes are routed differently (a read fetches rows, a write asks
//! for a row count), and executor scopes only admit certain statement kinds.
//! Classification looks at the leading keyword using the dialect's tokenizer,
//! so comments, string literals and quoted identifiers never confuse it.

use sqlparser::tokenizer::{Token, Tokenizer};

use crate::database::traits::Dialect;
use crate::error::ConnectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Returns rows: SELECT, SHOW, DESCRIBE, EXPLAIN, PRAGMA, read-only WITH
    Read,
    Insert,
    Update,
    /// DELETE and TRUNCATE
    Delete,
    /// DDL
    Schema,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// Anything else (SET, USE, GRANT, CALL, data-modifying WITH, ...)
    Other,
}

impl StatementKind {
    pub fn returns_rows(&self) -> bool {
        matches!(self, Self::Read)
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Schema => "schema",
            Self::Transaction => "transaction",
            Self::Other => "other",
        }
    }

    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "SELECT" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" | "PRAGMA" | "VALUES" | "TABLE"
            | "FROM" | "SUMMARIZE" | "EXISTS" => Self::Read,
            "INSERT" | "REPLACE" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" | "TRUNCATE" => Self::Delete,
            "CREATE" | "ALTER" | "DROP" | "RENAME" | "COMMENT" => Self::Schema,
            "BEGIN" | "START" | "COMMIT" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" | "END"
            | "ABORT" => Self::Transaction,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a single SQL statement.
///
/// Fails with `InvalidStatement` for empty input and for input holding more
/// than one statement. Input the tokenizer cannot read is classified by its
/// first word, as long as it has no second statement after a `;`.
pub fn classify(dialect: Dialect, sql: &str) -> Result<StatementKind, ConnectorError> {
    classify_tokens(dialect, sql, true)
}

/// Like [`classify`], but input the tokenizer cannot read is rejected.
///
/// Restricted executors use this: a first-word guess is not enough to rule
/// out a write.
pub(crate) fn classify_strict(dialect: Dialect, sql: &str) -> Result<StatementKind, ConnectorError> {
    classify_tokens(dialect, sql, false)
}

fn classify_tokens(
    dialect: Dialect,
    sql: &str,
    first_word_fallback: bool,
) -> Result<StatementKind, ConnectorError> {
    let sql_dialect = dialect.sql_dialect();
    let tokens = match Tokenizer::new(sql_dialect.as_ref(), sql).tokenize() {
        Ok(tokens) => tokens,
        Err(e) if first_word_fallback => {
            // Unterminated literals and the like: the engine will report the
            // real error, we only need a routing decision.
            tracing::debug!(dialect = %dialect, error = %e, "tokenizer failed, using first word");
            return classify_by_first_word(dialect, sql);
        }
        Err(e) => {
            return Err(ConnectorError::invalid_statement(
                dialect,
                format!("statement could not be tokenized: {}", e),
            ));
        }
    };

    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|tok| !matches!(tok, Token::Whitespace(_)))
        .collect();

    let Some(end) = statement_end(&significant) else {
        return Err(ConnectorError::invalid_statement(dialect, "empty statement"));
    };
    if end == 0 {
        return Err(ConnectorError::invalid_statement(dialect, "empty statement"));
    }
    if significant[end..].iter().any(|tok| !matches!(tok, Token::SemiColon)) {
        return Err(ConnectorError::invalid_statement(
            dialect,
            "multiple statements are not allowed; send one statement per call",
        ));
    }

    Ok(classify_statement(dialect, &significant[..end]))
}

fn classify_statement(dialect: Dialect, statement: &[&Token]) -> StatementKind {
    let Some(first) = keyword_at(statement, 0) else {
        // Leading parenthesis: `(SELECT ...) UNION (SELECT ...)`
        return if matches!(statement[0], Token::LParen) {
            first_keyword_kind(statement)
        } else {
            StatementKind::Other
        };
    };

    match first.as_str() {
        "EXPLAIN" | "DESCRIBE" | "DESC" => classify_explain(dialect, statement),
        "WITH" | "SELECT" => {
            let kind = if first == "WITH" {
                classify_with(statement)
            } else {
                StatementKind::Read
            };
            if kind == StatementKind::Read && selects_into(statement) {
                // Postgres `SELECT ... INTO t` creates a table; elsewhere it
                // writes variables or files
                if dialect == Dialect::Postgres {
                    StatementKind::Schema
                } else {
                    StatementKind::Other
                }
            } else {
                kind
            }
        }
        keyword => StatementKind::from_keyword(keyword),
    }
}

/// `EXPLAIN` only plans its statement, but `EXPLAIN ANALYZE` runs it. An
/// analyzed statement keeps the kind of the statement it wraps.
fn classify_explain(dialect: Dialect, tokens: &[&Token]) -> StatementKind {
    let mut analyze = false;
    let mut depth = 0usize;

    for (idx, tok) in tokens.iter().enumerate().skip(1) {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Word(w) if w.quote_style.is_none() => {
                let kw = w.value.to_uppercase();
                if kw == "ANALYZE" || kw == "ANALYSE" {
                    analyze = true;
                    continue;
                }
                if depth > 0 {
                    continue;
                }
                let starts_statement =
                    kw == "WITH" || StatementKind::from_keyword(&kw) != StatementKind::Other;
                if starts_statement {
                    let inner = classify_statement(dialect, &tokens[idx..]);
                    return if analyze { inner } else { StatementKind::Read };
                }
            }
            _ => {}
        }
    }
    StatementKind::Read
}

/// A top-level `INTO` in a `SELECT`.
fn selects_into(tokens: &[&Token]) -> bool {
    let mut depth = 0usize;
    tokens.iter().any(|tok| match tok {
        Token::LParen => {
            depth += 1;
            false
        }
        Token::RParen => {
            depth = depth.saturating_sub(1);
            false
        }
        Token::Word(w) => depth == 0 && w.quote_style.is_none() && w.value.eq_ignore_ascii_case("INTO"),
        _ => false,
    })
}

/// Index one past the last token of the first statement, ignoring trailing
/// semicolons. `None` when the input has no tokens at all.
fn statement_end(tokens: &[&Token]) -> Option<usize> {
    if tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .iter()
            .position(|tok| matches!(tok, Token::SemiColon))
            .unwrap_or(tokens.len()),
    )
}

fn keyword_at(tokens: &[&Token], idx: usize) -> Option<String> {
    match tokens.get(idx) {
        Some(Token::Word(w)) if w.quote_style.is_none() => Some(w.value.to_uppercase()),
        _ => None,
    }
}

fn first_keyword_kind(tokens: &[&Token]) -> StatementKind {
    (0..tokens.len())
        .find_map(|idx| keyword_at(tokens, idx))
        .map(|kw| StatementKind::from_keyword(&kw))
        .unwrap_or(StatementKind::Other)
}

/// A `WITH` statement is a read unless its main body (or a CTE body, on
/// engines that allow data-modifying CTEs) writes.
fn classify_with(tokens: &[&Token]) -> StatementKind {
    let mut depth = 0usize;
    let mut writes = false;
    let mut main = None;

    for (idx, tok) in tokens.iter().enumerate() {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Word(w) if w.quote_style.is_none() => {
                let kw = w.value.to_uppercase();
                let kind = StatementKind::from_keyword(&kw);
                // `SELECT ... FOR UPDATE` locks, it does not write
                let after_for = idx > 0 && keyword_at(tokens, idx - 1).as_deref() == Some("FOR");
                if kind.is_write() && !after_for {
                    writes = true;
                }
                // The main body follows the closing paren of the last CTE
                let after_cte = idx > 0 && matches!(tokens[idx - 1], Token::RParen);
                if depth == 0 && main.is_none() && after_cte && kind != StatementKind::Other {
                    main = Some(kind);
                }
            }
            _ => {}
        }
    }

    match main {
        Some(kind) if kind.is_write() => kind,
        Some(_) if writes => StatementKind::Other,
        Some(kind) => kind,
        None if writes => StatementKind::Other,
        None => StatementKind::Read,
    }
}

fn classify_by_first_word(dialect: Dialect, sql: &str) -> Result<StatementKind, ConnectorError> {
    let body = strip_leading_comments(sql);
    let first = body
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .find(|w| !w.is_empty())
        .ok_or_else(|| ConnectorError::invalid_statement(dialect, "empty statement"))?;
    if body.split(';').skip(1).any(|rest| !rest.trim().is_empty()) {
        return Err(ConnectorError::invalid_statement(
            dialect,
            "statement could not be tokenized and may hold more than one statement",
        ));
    }
    Ok(StatementKind::from_keyword(&first.to_uppercase()))
}

fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map(|(_, r)| r).unwrap_or("").trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, r)| r).unwrap_or("").trim_start();
        } else {
            return rest;
        }
    }
}
