//! SQL dialect differences between the two backends.
//!
//! Statements everywhere else are written once with `?` placeholders and
//! rendered here; repository code never branches on the backend.

use std::borrow::Cow;

/// Dialect of the active backend, fixed at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Rewrites `?` placeholders to `$1..$n` for PostgreSQL. SQLite
    /// statements pass through unchanged. Question marks inside
    /// single-quoted literals are left alone.
    pub fn render(self, sql: &str) -> Cow<'_, str> {
        match self {
            Dialect::Sqlite => Cow::Borrowed(sql),
            Dialect::Postgres => {
                let mut out = String::with_capacity(sql.len() + 8);
                let mut next = 0u32;
                let mut in_literal = false;
                for ch in sql.chars() {
                    match ch {
                        '\'' => {
                            in_literal = !in_literal;
                            out.push(ch);
                        }
                        '?' if !in_literal => {
                            next += 1;
                            out.push('$');
                            out.push_str(&next.to_string());
                        }
                        _ => out.push(ch),
                    }
                }
                Cow::Owned(out)
            }
        }
    }

    /// Two-argument maximum: scalar `MAX` on SQLite, `GREATEST` on
    /// PostgreSQL, where `MAX` is aggregate-only.
    pub fn greatest(self) -> &'static str {
        match self {
            Dialect::Sqlite => "MAX",
            Dialect::Postgres => "GREATEST",
        }
    }

    /// Lowercase backend name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }
}
