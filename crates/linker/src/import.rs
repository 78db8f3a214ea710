use std::collections::HashSet;

use crate::error::LinkError;

/// One `import` directive found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Module path joined with `::`, without the leading `package` segment.
    pub module: String,
    /// Items named by the directive; empty for a bare `import util;`.
    pub items: Vec<String>,
}

/// Returns true when `line` is an import directive rather than shader code.
pub(crate) fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("import")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// Parses a single import line. `module` and `line_no` only feed the error.
pub(crate) fn parse_import(module: &str, line_no: usize, line: &str) -> Result<Import, LinkError> {
    let malformed = || LinkError::MalformedImport {
        module: module.to_string(),
        line: line_no,
        text: line.trim().to_string(),
    };

    let body = line
        .trim()
        .strip_prefix("import")
        .and_then(|rest| rest.trim().strip_suffix(';'))
        .map(str::trim)
        .ok_or_else(malformed)?;

    let (path, braced) = match body.split_once('{') {
        Some((prefix, rest)) => {
            let list = rest.trim().strip_suffix('}').ok_or_else(malformed)?;
            let prefix = prefix.trim().strip_suffix("::").ok_or_else(malformed)?;
            let items = list
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            if items.is_empty() || !items.iter().all(|item| is_identifier(item)) {
                return Err(malformed());
            }
            (prefix, Some(items))
        }
        None => (body, None),
    };

    let mut segments = path.split("::").map(str::trim).collect::<Vec<_>>();
    if segments.iter().any(|segment| !is_identifier(segment)) {
        return Err(malformed());
    }
    if segments.first() == Some(&"package") {
        segments.remove(0);
    }

    let items = match braced {
        Some(items) => items,
        None if segments.len() > 1 => segments.pop().map(str::to_string).into_iter().collect(),
        None => Vec::new(),
    };
    if segments.is_empty() {
        return Err(malformed());
    }

    Ok(Import {
        module: segments.join("::"),
        items,
    })
}

/// Module-scope names a WGSL body declares with `fn`, `struct`, `const`,
/// `alias`, `override` or `var`. The scan is lexical and ignores `//`
/// comments; block comments are not understood.
pub(crate) fn declared_items(body: &str) -> HashSet<String> {
    let mut declared = HashSet::new();
    for line in body.lines() {
        let code = line.split_once("//").map_or(line, |(code, _)| code);
        let mut words = code
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|word| !word.is_empty());
        while let Some(word) = words.next() {
            let name = match word {
                "fn" | "struct" | "const" | "alias" | "override" => words.next(),
                "var" => words.find(|word| !ADDRESS_SPACE_WORDS.contains(word)),
                _ => continue,
            };
            if let Some(name) = name.filter(|name| is_identifier(name)) {
                declared.insert(name.to_string());
            }
        }
    }
    declared
}

const ADDRESS_SPACE_WORDS: &[&str] = &[
    "function",
    "private",
    "workgroup",
    "uniform",
    "storage",
    "handle",
    "read",
    "write",
    "read_write",
];

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
