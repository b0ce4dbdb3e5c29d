//! Lint: non-test source must not contain panicking shortcuts.
//!
//! Every transition is total and load falls back to a fresh game, so library
//! code propagates or absorbs failures instead of calling `.unwrap()`,
//! `.expect(...)`, `panic!` or `unreachable!`.
//!
//! This test scans every `.rs` file under `src/` up to its first
//! `#[cfg(test)]` line and flags those calls outside comments.

use std::fs;
use std::path::Path;

const FORBIDDEN: [&str; 4] = [".unwrap()", ".expect(", "panic!(", "unreachable!("];

/// Scan the non-test part of a source file for forbidden calls.
fn find_panicking_calls(source: &str) -> Vec<(usize, String)> {
    let mut violations = Vec::new();

    for (line_num_0, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        // Everything after the first test module is test code
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }

        // Skip comments
        if trimmed.starts_with("//") {
            continue;
        }

        let code = match trimmed.find("//") {
            Some(i) if !trimmed[..i].contains('"') => &trimmed[..i],
            _ => trimmed,
        };
        if FORBIDDEN.iter().any(|pat| code.contains(pat)) {
            violations.push((line_num_0 + 1, trimmed.to_string()));
        }
    }

    violations
}

#[test]
fn no_panicking_calls_in_library_code() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut all_violations = Vec::new();

    visit_source_files(&src_dir, &mut all_violations);

    if !all_violations.is_empty() {
        let mut msg = String::from(
            "Found panicking calls in non-test code.\n\
             Propagate the error with `?` or absorb it as a no-op instead.\n\n",
        );
        for (file, line_num, line) in &all_violations {
            msg.push_str(&format!("  {}:{}: {}\n", file, line_num, line));
        }
        panic!("{}", msg);
    }
}

fn visit_source_files(dir: &Path, violations: &mut Vec<(String, usize, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            visit_source_files(&path, violations);
        } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
            let Ok(source) = fs::read_to_string(&path) else {
                continue;
            };
            let display_path = path.display().to_string();
            for (line_num, line) in find_panicking_calls(&source) {
                violations.push((display_path.clone(), line_num, line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_unwrap() {
        let source = "let x = map.get(\"k\").unwrap();";
        assert_eq!(find_panicking_calls(source).len(), 1);
    }

    #[test]
    fn detects_expect_and_panic() {
        let source = "let x = y.expect(\"present\");\npanic!(\"boom\");\nunreachable!(\"no\");";
        assert_eq!(find_panicking_calls(source).len(), 3);
    }

    #[test]
    fn allows_unwrap_or_variants() {
        let source = "let a = x.unwrap_or(0);\nlet b = y.unwrap_or_default();\nlet c = z.unwrap_or_else(f);";
        assert!(find_panicking_calls(source).is_empty());
    }

    #[test]
    fn ignores_comments() {
        let source = "// value.unwrap() is fine here\nlet a = 1; // never .unwrap()";
        assert!(find_panicking_calls(source).is_empty());
    }

    #[test]
    fn stops_at_test_module() {
        let source = "fn f() {}\n#[cfg(test)]\nmod tests {\n    fn g() { x.unwrap(); }\n}";
        assert!(find_panicking_calls(source).is_empty());
    }

    #[test]
    fn reports_line_numbers() {
        let source = "fn f() {}\n\nfn g() { x.unwrap(); }";
        let violations = find_panicking_calls(source);
        assert_eq!(violations[0].0, 3);
    }
}
