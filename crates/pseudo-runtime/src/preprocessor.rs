//! Import preprocessor (spec §6.3): textually concatenates `import X [as A]`
//! and `from X import a, b` before compilation. Grounded on the teacher's
//! `Resolver` (`seq-compiler/src/resolver.rs`) — an absolute-path set for the
//! cycle guard, a project-relative search order — adapted from the teacher's
//! AST-level include merge to plain text concatenation, since this runtime
//! has no parser of its own (spec §1 OUT OF SCOPE: the source-text compiler
//! is a black box).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["pseudo", "psc"];

enum ImportStmt {
    /// `import X [as A]`
    Whole { module: String, alias: Option<String> },
    /// `from X import a, b`
    Selective { module: String, names: Vec<String> },
}

fn parse_import_line(line: &str) -> Option<ImportStmt> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("from ") {
        let (module, rest) = rest.split_once(" import ")?;
        let names = rest.split(',').map(|s| s.trim().to_string()).collect();
        return Some(ImportStmt::Selective {
            module: module.trim().to_string(),
            names,
        });
    }
    if let Some(rest) = trimmed.strip_prefix("import ") {
        if let Some((module, alias)) = rest.split_once(" as ") {
            return Some(ImportStmt::Whole {
                module: module.trim().to_string(),
                alias: Some(alias.trim().to_string()),
            });
        }
        return Some(ImportStmt::Whole {
            module: rest.trim().to_string(),
            alias: None,
        });
    }
    None
}

/// `has_imports(source_text) -> bool` (spec §6.1).
pub fn has_imports(source_text: &str) -> bool {
    source_text
        .lines()
        .any(|line| parse_import_line(line).is_some())
}

/// Resolves one module name to a file path (spec §6.3 path resolution
/// order): relative/absolute by leading `.`/`/`, same-directory by name,
/// then a built-in stdlib list (with `~` expanded to `$HOME`), then
/// colon-separated `PSEUDO_PATH` entries.
fn resolve_module(module: &str, base_dir: &Path) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if module.starts_with('.') || module.starts_with('/') {
        vec![base_dir.join(module)]
    } else {
        let mut dirs = vec![base_dir.to_path_buf()];
        dirs.extend(stdlib_dirs());
        if let Ok(path_var) = std::env::var("PSEUDO_PATH") {
            dirs.extend(path_var.split(':').map(PathBuf::from));
        }
        dirs.into_iter().map(|d| d.join(module)).collect()
    };

    for candidate in candidates {
        if candidate.is_file() {
            return Some(candidate);
        }
        for ext in EXTENSIONS {
            let with_ext = candidate.with_extension(ext);
            if with_ext.is_file() {
                return Some(with_ext);
            }
        }
    }
    None
}

fn stdlib_dirs() -> Vec<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_default();
    vec![
        PathBuf::from(format!("{home}/.pseudo/stdlib")),
        PathBuf::from("/usr/local/share/pseudo/stdlib"),
    ]
}

/// Depth cap on nested imports (spec §6.3).
pub const IMPORT_DEPTH_MAX: usize = crate::frame::IMPORT_DEPTH_MAX;

/// `preprocess_imports(source_text, base_path) -> source_text` (spec §6.1,
/// §6.3): resolves every `import`/`from ... import` line, recursively, and
/// returns a single concatenated text with the banner comments §6.3 names.
pub fn preprocess_imports(source_text: &str, base_path: &Path) -> Result<String, String> {
    let mut seen = HashSet::new();
    expand(source_text, base_path, &mut seen, 0)
}

fn expand(
    source_text: &str,
    base_dir: &Path,
    seen: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<String, String> {
    if depth > IMPORT_DEPTH_MAX {
        return Err(format!("import depth exceeded ({IMPORT_DEPTH_MAX} levels)"));
    }

    let mut out = String::new();
    for line in source_text.lines() {
        match parse_import_line(line) {
            None => {
                out.push_str(line);
                out.push('\n');
            }
            Some(ImportStmt::Whole { module, alias }) => {
                let body = load_and_expand(&module, base_dir, seen, depth)?;
                out.push_str(&format!("// [import: {module}]\n"));
                if let Some(alias) = &alias {
                    out.push_str(&format!("// [namespace: {alias}]\n"));
                }
                out.push_str(&body);
                out.push_str("// [end import]\n");
            }
            Some(ImportStmt::Selective { module, names }) => {
                let body = load_and_expand(&module, base_dir, seen, depth)?;
                let selected = select_definitions(&body, &names);
                out.push_str(&format!("// [selective import: {module} ({})]\n", names.join(", ")));
                out.push_str(&selected);
                out.push_str("// [end import]\n");
            }
        }
    }
    Ok(out)
}

fn load_and_expand(
    module: &str,
    base_dir: &Path,
    seen: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<String, String> {
    let Some(path) = resolve_module(module, base_dir) else {
        return Err(format!("cannot resolve import '{module}'"));
    };
    let canonical = path.canonicalize().unwrap_or(path.clone());
    if !seen.insert(canonical) {
        // Cycle guard (spec §6.3): duplicate imports resolve silently to
        // the empty string.
        return Ok(String::new());
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read import '{module}': {e}"))?;
    let dir = path.parent().unwrap_or(base_dir).to_path_buf();
    expand(&text, &dir, seen, depth + 1)
}

/// Selective `from X import a, b` (spec §6.3): emits only top-level `fn` or
/// `let` definitions whose name appears in `names`. An `fn` body spans until
/// a matching `end` at nesting depth zero; `if`/`for`/`while`/`match`/`fn`
/// increase depth, `end` decreases it.
fn select_definitions(body: &str, names: &[String]) -> String {
    let mut out = String::new();
    let mut lines = body.lines().peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if let Some(name) = definition_name(trimmed, "fn") {
            if names.iter().any(|n| n == name) {
                out.push_str(line);
                out.push('\n');
                let mut depth = 1usize;
                for body_line in lines.by_ref() {
                    depth = depth.saturating_add(block_depth_delta(body_line));
                    out.push_str(body_line);
                    out.push('\n');
                    if depth == 0 {
                        break;
                    }
                }
            } else {
                // Skip this definition's body without emitting it.
                let mut depth = 1usize;
                for body_line in lines.by_ref() {
                    depth = depth.saturating_add(block_depth_delta(body_line));
                    if depth == 0 {
                        break;
                    }
                }
            }
        } else if let Some(name) = definition_name(trimmed, "let") {
            if names.iter().any(|n| n == name) {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

fn definition_name<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?.strip_prefix(' ')?;
    rest.split(|c: char| c.is_whitespace() || c == '(' || c == '=').next()
}

fn block_depth_delta(line: &str) -> isize {
    let trimmed = line.trim_start();
    if trimmed == "end" || trimmed.starts_with("end ") {
        -1
    } else if ["if ", "for ", "while ", "match ", "fn "]
        .iter()
        .any(|kw| trimmed.starts_with(kw))
    {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn has_imports_detects_both_forms() {
        assert!(has_imports("import math\nlet x = 1\n"));
        assert!(has_imports("from math import sqrt\n"));
        assert!(!has_imports("let x = 1\n"));
    }

    #[test]
    fn whole_import_wraps_with_banner_comments() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("math.pseudo")).unwrap();
        writeln!(f, "fn square(x)\n  return x * x\nend").unwrap();

        let main = "import math\nlet y = square(2)\n";
        let out = preprocess_imports(main, dir.path()).unwrap();
        assert!(out.contains("// [import: math]"));
        assert!(out.contains("// [end import]"));
        assert!(out.contains("fn square(x)"));
    }

    #[test]
    fn selective_import_keeps_only_named_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("util.pseudo")).unwrap();
        writeln!(f, "fn keep(x)\n  return x\nend\nfn drop(x)\n  return x\nend").unwrap();

        let main = "from util import keep\n";
        let out = preprocess_imports(main, dir.path()).unwrap();
        assert!(out.contains("fn keep(x)"));
        assert!(!out.contains("fn drop(x)"));
        assert!(out.contains("// [selective import: util (keep)]"));
    }

    #[test]
    fn duplicate_import_resolves_to_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("a.pseudo"))
            .unwrap()
            .write_all(b"let a = 1\n")
            .unwrap();

        let main = "import a\nimport a\n";
        let out = preprocess_imports(main, dir.path()).unwrap();
        assert_eq!(out.matches("let a = 1").count(), 1);
    }
}
