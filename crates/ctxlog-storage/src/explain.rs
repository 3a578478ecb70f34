//! Render a statement with its parameters inlined, for log output only.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;

/// Substitute parameter placeholders in `sql` with SQL literals built from
/// `params`.
///
/// Placeholders are numbered the way SQLite binds a positional parameter
/// slice: `?` takes the next number after the highest one assigned so far,
/// `?NNN` takes `NNN`, and a named `:x`, `@x` or `$x` takes the next number
/// the first time its name appears and reuses it afterwards. Quoted literals,
/// `[...]` identifiers and comments are copied untouched, as are placeholders
/// without a matching parameter. The result is meant for humans reading
/// logs, never for execution.
pub fn explain_sql(sql: &str, params: &[&dyn ToSql]) -> String {
    if params.is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut chars = sql.chars().peekable();
    let mut highest = 0usize;
    let mut named: HashMap<String, usize> = HashMap::new();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                out.push(c);
                copy_through(&mut chars, &mut out, c);
            }
            '[' => {
                out.push(c);
                copy_through(&mut chars, &mut out, ']');
            }
            '-' if chars.peek() == Some(&'-') => {
                out.push(c);
                copy_through(&mut chars, &mut out, '\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                out.push(c);
                copy_block_comment(&mut chars, &mut out);
            }
            '?' => {
                let digits = take_while(&mut chars, |d| d.is_ascii_digit());
                let index = if digits.is_empty() {
                    Some(highest + 1)
                } else {
                    digits.parse::<usize>().ok()
                };
                if let Some(index) = index {
                    highest = highest.max(index);
                }
                push_param(&mut out, params, index, &format!("?{}", digits));
            }
            ':' | '@' | '$' if chars.peek().is_some_and(|&n| is_name_char(n)) => {
                let name = format!("{}{}", c, take_while(&mut chars, is_name_char));
                let index = *named.entry(name.clone()).or_insert_with(|| {
                    highest += 1;
                    highest
                });
                push_param(&mut out, params, Some(index), &name);
            }
            _ => out.push(c),
        }
    }

    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn take_while(chars: &mut Peekable<Chars<'_>>, keep: impl Fn(char) -> bool) -> String {
    let mut taken = String::new();
    while let Some(&c) = chars.peek() {
        if !keep(c) {
            break;
        }
        taken.push(c);
        chars.next();
    }
    taken
}

/// Copy up to and including `end`, or to the end of input.
fn copy_through(chars: &mut Peekable<Chars<'_>>, out: &mut String, end: char) {
    for c in chars.by_ref() {
        out.push(c);
        if c == end {
            return;
        }
    }
}

/// Copy a `/* ... */` comment whose leading `/` was already written.
fn copy_block_comment(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    let mut prev = None;
    // The opening `*` cannot also close the comment: `/*/` is still open.
    if let Some(star) = chars.next() {
        out.push(star);
    }
    for c in chars.by_ref() {
        out.push(c);
        if prev == Some('*') && c == '/' {
            return;
        }
        prev = Some(c);
    }
}

fn push_param(out: &mut String, params: &[&dyn ToSql], index: Option<usize>, placeholder: &str) {
    match index
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| params.get(i))
    {
        Some(param) => out.push_str(&literal(*param)),
        None => out.push_str(placeholder),
    }
}

fn literal(param: &dyn ToSql) -> String {
    match param.to_sql() {
        Ok(ToSqlOutput::Borrowed(value)) => value_ref_literal(value),
        Ok(ToSqlOutput::Owned(value)) => value_literal(&value),
        #[allow(unreachable_patterns)]
        Ok(_) | Err(_) => "?".to_string(),
    }
}

fn value_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => quote_text(s),
        Value::Blob(b) => format!("X'{}'", hex::encode_upper(b)),
    }
}

fn value_ref_literal(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) => quote_text(&String::from_utf8_lossy(bytes)),
        ValueRef::Blob(b) => format!("X'{}'", hex::encode_upper(b)),
    }
}

fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
