//! A closed, non-Turing-complete command language for `execute_code`.
//!
//! The bridge embeds no scripting engine. Instead of evaluating arbitrary code
//! against the host, `execute_code` accepts a small fixed vocabulary of
//! statements, one per line, each either a `print(...)` call or a `host.*(...)`
//! call with keyword arguments. This resolves the open question of what
//! "execute arbitrary code" means for a host with no embedded interpreter
//! dependency anywhere in reach: a closed command set is the only form that
//! can be implemented without fabricating a scripting runtime.

use crate::error::{Error, Result};
use crate::host::{Host, ObjectKind};
use std::fmt::Write as _;

/// Output captured from a single `execute_code` call, mirroring the stdout
/// capture the transport envelope reports back to the caller.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CaptureBuffers {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Print(String),
    AddCube { name: Option<String>, location: [f64; 3] },
    AddObject { kind: ObjectKind, name: Option<String>, location: [f64; 3] },
    SetVisible { name: String, visible: bool },
    RemoveObject { name: String },
}

/// Parse and run `source` against `host`, appending to `buffers.stdout` as each
/// statement executes. Parsing happens line-by-line; a parse error on any line
/// aborts before any statement runs, so `execute_code` either fully applies or
/// has no effect.
pub fn execute(source: &str, host: &mut dyn Host, buffers: &mut CaptureBuffers) -> Result<()> {
    let statements = parse(source)?;
    for statement in statements {
        run_statement(statement, host, buffers)?;
    }
    Ok(())
}

fn parse(source: &str) -> Result<Vec<Statement>> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_semicolons)
        .map(|stmt| parse_line(stmt.trim()))
        .collect()
}

/// Splits `print(a); print(b)` into separate statements on top-level semicolons
/// (outside quotes and parens), so multiple calls can be chained on one
/// physical line.
fn split_semicolons(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut quote_char: Option<char> = None;
    let mut start = 0usize;
    for (i, ch) in line.char_indices() {
        let in_quotes = quote_char.is_some();
        match ch {
            '"' | '\'' if quote_char == Some(ch) => quote_char = None,
            '"' | '\'' if !in_quotes => quote_char = Some(ch),
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth -= 1,
            ';' if !in_quotes && depth == 0 => {
                segments.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&line[start..]);
    segments.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn parse_line(line: &str) -> Result<Statement> {
    if let Some(arg) = strip_call(line, "print") {
        return Ok(Statement::Print(parse_single_string_arg(&arg)?));
    }
    if let Some(args) = strip_call(line, "host.add_cube") {
        let kv = parse_kwargs(&args)?;
        return Ok(Statement::AddCube {
            name: kv.string("name")?,
            location: kv.location().unwrap_or([0.0, 0.0, 0.0]),
        });
    }
    if let Some(args) = strip_call(line, "host.add_object") {
        let kv = parse_kwargs(&args)?;
        let kind_raw = kv.require_string("kind")?;
        return Ok(Statement::AddObject {
            kind: ObjectKind::parse(&kind_raw),
            name: kv.string("name")?,
            location: kv.location().unwrap_or([0.0, 0.0, 0.0]),
        });
    }
    if let Some(args) = strip_call(line, "host.set_visible") {
        let kv = parse_kwargs(&args)?;
        return Ok(Statement::SetVisible {
            name: kv.require_string("name")?,
            visible: kv.require_bool("visible")?,
        });
    }
    if let Some(args) = strip_call(line, "host.remove_object") {
        let kv = parse_kwargs(&args)?;
        return Ok(Statement::RemoveObject {
            name: kv.require_string("name")?,
        });
    }
    Err(Error::Interpreter(format!("unsupported statement: {line}")))
}

fn run_statement(statement: Statement, host: &mut dyn Host, buffers: &mut CaptureBuffers) -> Result<()> {
    match statement {
        Statement::Print(text) => {
            let _ = writeln!(buffers.stdout, "{text}");
            Ok(())
        }
        Statement::AddCube { name, location } => {
            let created = host
                .add_cube(name, location)
                .map_err(|e| Error::Host(e.to_string()))?;
            let _ = writeln!(buffers.stdout, "added cube: {created}");
            Ok(())
        }
        Statement::AddObject { kind, name, location } => {
            let created = host
                .add_object(kind, name, location)
                .map_err(|e| Error::Host(e.to_string()))?;
            let _ = writeln!(buffers.stdout, "added object: {created}");
            Ok(())
        }
        Statement::SetVisible { name, visible } => {
            host.set_visible(&name, visible)
                .map_err(|e| Error::Host(e.to_string()))?;
            let _ = writeln!(buffers.stdout, "set_visible({name}, {visible})");
            Ok(())
        }
        Statement::RemoveObject { name } => {
            host.remove_object(&name).map_err(|e| Error::Host(e.to_string()))?;
            let _ = writeln!(buffers.stdout, "removed: {name}");
            Ok(())
        }
    }
}

fn strip_call<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?.trim_start();
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}

fn parse_single_string_arg(raw: &str) -> Result<String> {
    let raw = raw.trim();
    unquote(raw).ok_or_else(|| Error::Interpreter(format!("expected a quoted string, got: {raw}")))
}

struct KwArgs(Vec<(String, String)>);

impl KwArgs {
    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.0.iter().find(|(k, _)| k == key) {
            Some((_, v)) => unquote(v)
                .map(Some)
                .ok_or_else(|| Error::Interpreter(format!("{key} must be a quoted string"))),
            None => Ok(None),
        }
    }

    fn require_string(&self, key: &str) -> Result<String> {
        self.string(key)?
            .ok_or_else(|| Error::Interpreter(format!("missing required argument: {key}")))
    }

    fn require_bool(&self, key: &str) -> Result<bool> {
        let (_, raw) = self
            .0
            .iter()
            .find(|(k, _)| k == key)
            .ok_or_else(|| Error::Interpreter(format!("missing required argument: {key}")))?;
        match raw.as_str() {
            "true" | "True" => Ok(true),
            "false" | "False" => Ok(false),
            other => Err(Error::Interpreter(format!("{key} must be true/false, got: {other}"))),
        }
    }

    fn location(&self) -> Option<[f64; 3]> {
        let (_, raw) = self.0.iter().find(|(k, _)| k == "location")?;
        let raw = raw.trim().strip_prefix('(')?.strip_suffix(')')?;
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return None;
        }
        let mut out = [0.0; 3];
        for (i, part) in parts.iter().enumerate() {
            out[i] = part.parse().ok()?;
        }
        Some(out)
    }
}

fn parse_kwargs(raw: &str) -> Result<KwArgs> {
    if raw.trim().is_empty() {
        return Ok(KwArgs(Vec::new()));
    }
    let mut pairs = Vec::new();
    for segment in split_top_level(raw) {
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| Error::Interpreter(format!("expected key=value, got: {segment}")))?;
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(KwArgs(pairs))
}

/// Splits `a=1, b=(1,2,3), c="x,y"` on top-level commas, respecting parens and quotes.
fn split_top_level(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut quote_char: Option<char> = None;
    let mut current = String::new();
    for ch in raw.chars() {
        let in_quotes = quote_char.is_some();
        match ch {
            '"' | '\'' if quote_char == Some(ch) => {
                quote_char = None;
                current.push(ch);
            }
            '"' | '\'' if !in_quotes => {
                quote_char = Some(ch);
                current.push(ch);
            }
            '(' if !in_quotes => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_quotes => {
                depth -= 1;
                current.push(ch);
            }
            ',' if !in_quotes && depth == 0 => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        segments.push(current);
    }
    segments
}

/// Strips matching quotes from a string literal. The closed command language
/// accepts both `"double"` and `'single'` quoting to match the host's own
/// Python-flavored call syntax (e.g. `name='X'`).
fn unquote(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Some(inner.to_string());
    }
    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    #[test]
    fn runs_print_statement() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute("print(\"hello\")", &mut host, &mut buffers).unwrap();
        assert_eq!(buffers.stdout, "hello\n");
    }

    #[test]
    fn runs_add_cube_with_location_and_name() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute(
            "host.add_cube(location=(1, 2, 3), name=\"MyCube\")",
            &mut host,
            &mut buffers,
        )
        .unwrap();
        assert_eq!(host.document().objects.len(), 1);
        assert_eq!(host.document().objects[0].name, "MyCube");
        assert_eq!(host.document().objects[0].location, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn runs_multiple_statements_in_order() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        let source = "host.add_cube(name=\"A\")\nhost.set_visible(name=\"A\", visible=false)\n";
        execute(source, &mut host, &mut buffers).unwrap();
        assert!(!host.document().objects[0].visible);
    }

    #[test]
    fn single_quoted_strings_are_accepted() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute(
            "host.add_cube(location=(1,2,3), name='X')",
            &mut host,
            &mut buffers,
        )
        .unwrap();
        assert_eq!(host.document().objects[0].name, "X");
        assert_eq!(host.document().objects[0].location, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn semicolon_separated_statements_on_one_line() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute("print('a'); print('b')", &mut host, &mut buffers).unwrap();
        assert_eq!(buffers.stdout, "a\nb\n");
    }

    #[test]
    fn remove_object_statement() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute("host.add_cube(name=\"A\")", &mut host, &mut buffers).unwrap();
        execute("host.remove_object(name=\"A\")", &mut host, &mut buffers).unwrap();
        assert!(host.document().objects.is_empty());
    }

    #[test]
    fn unsupported_statement_is_rejected() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        let err = execute("import os", &mut host, &mut buffers).unwrap_err();
        assert!(matches!(err, Error::Interpreter(_)));
    }

    #[test]
    fn parse_error_leaves_host_untouched() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        let source = "host.add_cube(name=\"A\")\nbogus()";
        let err = execute(source, &mut host, &mut buffers).unwrap_err();
        assert!(matches!(err, Error::Interpreter(_)));
        assert!(host.document().objects.is_empty());
    }

    #[test]
    fn add_object_with_kind_light() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute(
            "host.add_object(kind=\"light\", name=\"Sun\", location=(0, 0, 5))",
            &mut host,
            &mut buffers,
        )
        .unwrap();
        assert_eq!(host.document().objects[0].name, "Sun");
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let mut host = InMemoryHost::new();
        let mut buffers = CaptureBuffers::default();
        execute("# a comment\n\nprint(\"ok\")\n", &mut host, &mut buffers).unwrap();
        assert_eq!(buffers.stdout, "ok\n");
    }
}
