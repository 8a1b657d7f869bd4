//! Statement parsing
//!
//! Turns one line of input into a `Statement`.
//!
//! ## Grammar
//! ```text
//! insert <id> <username> <email...>
//! select [* | column[, column]*] [where id = <n>]
//! ```
//! Keywords and column names are case-insensitive.

use std::str::FromStr;

use thiserror::Error;

use crate::row::Row;

/// Longest accepted input line, in bytes
pub const MAX_INPUT_LEN: usize = 1024;

/// Why a line could not be turned into a statement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("Query cannot be empty")]
    Empty,

    #[error("Query exceeds maximum length of {0} bytes")]
    TooLong(usize),

    #[error("Unrecognized statement type: {0}")]
    Unrecognized(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("ID must be positive")]
    NegativeId,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported column: {0}. Supported columns are: id, username, email, *")]
    UnsupportedColumn(String),

    #[error("Unsupported WHERE clause: {0}. Only 'id = number' format is supported")]
    UnsupportedWhere(String),
}

/// A selectable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Username,
    Email,
}

impl Column {
    /// All columns in schema order
    pub const ALL: [Column; 3] = [Column::Id, Column::Username, Column::Email];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Username => "username",
            Column::Email => "email",
        }
    }

    /// Render this column's value for `row`
    pub fn value(&self, row: &Row) -> String {
        match self {
            Column::Id => row.id().to_string(),
            Column::Username => row.username().to_string(),
            Column::Email => row.email().to_string(),
        }
    }
}

impl FromStr for Column {
    type Err = PrepareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Column::Id),
            "username" => Ok(Column::Username),
            "email" => Ok(Column::Email),
            _ => Err(PrepareError::UnsupportedColumn(s.to_string())),
        }
    }
}

/// A parsed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Insert one row
    Insert(Row),

    /// Select rows, optionally by primary key
    Select {
        /// Projection, in output order
        columns: Vec<Column>,

        /// `where id = <n>`
        id_filter: Option<i32>,
    },
}

impl Statement {
    /// Parse a single line of input
    pub fn parse(input: &str) -> Result<Self, PrepareError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PrepareError::Empty);
        }
        if input.len() > MAX_INPUT_LEN {
            return Err(PrepareError::TooLong(MAX_INPUT_LEN));
        }

        let (keyword, rest) = split_word(input).ok_or(PrepareError::Empty)?;
        match keyword.to_ascii_lowercase().as_str() {
            "insert" => parse_insert(rest),
            "select" => parse_select(rest),
            _ => Err(PrepareError::Unrecognized(keyword.to_ascii_lowercase())),
        }
    }
}

impl FromStr for Statement {
    type Err = PrepareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Statement::parse(s)
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn parse_insert(rest: &str) -> Result<Statement, PrepareError> {
    let syntax = || PrepareError::Syntax("expected: insert <id> <username> <email>".to_string());

    let (id, rest) = split_word(rest).ok_or_else(syntax)?;
    let (username, email) = split_word(rest).ok_or_else(syntax)?;
    if email.is_empty() {
        return Err(syntax());
    }

    let id: i32 = id
        .parse()
        .map_err(|_| PrepareError::Syntax(format!("Invalid ID format: {}", id)))?;
    if id <= 0 {
        return Err(PrepareError::NegativeId);
    }

    let row = Row::new(id, username, email)
        .map_err(|e| PrepareError::InvalidData(e.to_string()))?;

    Ok(Statement::Insert(row))
}

fn parse_select(rest: &str) -> Result<Statement, PrepareError> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let where_pos = tokens.iter().position(|t| t.eq_ignore_ascii_case("where"));

    let (column_tokens, where_tokens) = match where_pos {
        Some(pos) => (&tokens[..pos], Some(&tokens[pos + 1..])),
        None => (&tokens[..], None),
    };

    let columns = parse_columns(&column_tokens.join(" "))?;

    let id_filter = match where_tokens {
        Some([]) => {
            return Err(PrepareError::Syntax("WHERE clause cannot be empty".to_string()))
        }
        Some(clause) => Some(parse_id_filter(&clause.join(" "))?),
        None => None,
    };

    Ok(Statement::Select { columns, id_filter })
}

fn parse_columns(list: &str) -> Result<Vec<Column>, PrepareError> {
    let list = list.trim();
    if list.is_empty() || list == "*" {
        return Ok(Column::ALL.to_vec());
    }

    let mut columns = Vec::new();
    for name in list.split(',').map(str::trim) {
        match name {
            "" => return Err(PrepareError::Syntax("Column name cannot be empty".to_string())),
            "*" => return Ok(Column::ALL.to_vec()),
            name => columns.push(name.parse()?),
        }
    }
    Ok(columns)
}

/// Accepts `id = <digits>` with any spacing around `=`
fn parse_id_filter(clause: &str) -> Result<i32, PrepareError> {
    let unsupported = || PrepareError::UnsupportedWhere(clause.to_string());

    let compact: String = clause.chars().filter(|c| !c.is_whitespace()).collect();
    let (column, value) = compact.split_once('=').ok_or_else(unsupported)?;

    if !column.eq_ignore_ascii_case("id")
        || value.is_empty()
        || !value.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(unsupported());
    }

    value.parse().map_err(|_| unsupported())
}

/// Split off the first whitespace-delimited word
fn split_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }

    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], input[end..].trim()))
}
