//! Runner for the bundled `test_programs/` suite, backing the `end` CLI
//! command.
//!
//! Grounded directly in the original `run_test_programs.py`: a test file
//! holds one or more `---`-separated cases, each an `input ...` source
//! fragment followed by a `prints` block with the expected stdout. Each
//! case is compiled to a standalone executable (same path the `compile`
//! command uses) and run; its stdout is trimmed and compared to the
//! expected text, exactly like the reference's
//! `output.strip() == testcase.output`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::CompilerConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub expected: String,
}

/// Splits a test file's contents into cases. Cases are separated by a line
/// containing only `---`; within a case, the `input` block and the
/// expected-output block are separated by the literal `prints`, mirroring
/// the reference's `file.split('---\n')` / `case.split('prints')`.
pub fn parse_test_cases(file_stem: &str, content: &str) -> Vec<TestCase> {
    content
        .split("---\n")
        .enumerate()
        .map(|(i, case)| {
            let mut parts = case.splitn(2, "prints");
            let input_part = parts.next().unwrap_or("").trim();
            let expected = parts.next().unwrap_or("").trim().to_string();
            let input = input_part
                .strip_prefix("input")
                .unwrap_or(input_part)
                .trim()
                .to_string();
            TestCase {
                name: format!("{file_stem}#{i}"),
                input,
                expected,
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub results: Vec<CaseResult>,
}

impl Summary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

/// Discovers every `*.pebble` file directly inside `dir`, sorted by name so
/// results are reported in a stable order.
pub fn discover_test_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "pebble") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Compiles and runs one test case, comparing trimmed stdout against the
/// expected output.
pub fn run_case(case: &TestCase, config: &CompilerConfig) -> CaseResult {
    let exe_path = std::env::temp_dir().join(format!(
        "pebble_end_{}_{}",
        std::process::id(),
        sanitize(&case.name)
    ));

    if let Err(e) = crate::compile_to_executable(&case.name, &case.input, &exe_path, config) {
        return CaseResult {
            name: case.name.clone(),
            passed: false,
            detail: Some(format!("compile error: {e}")),
        };
    }

    let output = Command::new(&exe_path).output();
    fs::remove_file(&exe_path).ok();

    match output {
        Ok(out) => {
            let stdout = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if stdout == case.expected {
                CaseResult {
                    name: case.name.clone(),
                    passed: true,
                    detail: None,
                }
            } else {
                CaseResult {
                    name: case.name.clone(),
                    passed: false,
                    detail: Some(format!(
                        "expected {:?}, got {:?}",
                        case.expected, stdout
                    )),
                }
            }
        }
        Err(e) => CaseResult {
            name: case.name.clone(),
            passed: false,
            detail: Some(format!("failed to run compiled program: {e}")),
        },
    }
}

/// Runs every case in every `*.pebble` file under `dir`.
pub fn run_directory(dir: &Path, config: &CompilerConfig) -> Summary {
    let mut summary = Summary::default();
    for path in discover_test_files(dir) {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("test")
            .to_string();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                summary.results.push(CaseResult {
                    name: stem,
                    passed: false,
                    detail: Some(format!("failed to read {}: {e}", path.display())),
                });
                continue;
            }
        };
        for case in parse_test_cases(&stem, &content) {
            summary.results.push(run_case(&case, config));
        }
    }
    summary
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Prints a pass/fail summary in the teacher's `TestRunner::print_results`
/// style: per-case status, then a totals line, then failure detail.
pub fn print_summary(summary: &Summary) {
    for result in &summary.results {
        let status = if result.passed { "ok" } else { "FAILED" };
        println!("{} ... {status}", result.name);
    }

    println!();
    if summary.all_passed() {
        println!("All {} test cases successful!", summary.total());
    } else {
        println!(
            "{} out of {} test cases passed",
            summary.passed(),
            summary.total()
        );
        println!("\nFAILURES:\n");
        for result in summary.results.iter().filter(|r| !r.passed) {
            println!("{}", result.name);
            if let Some(detail) = &result.detail {
                println!("  {detail}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_case() {
        let content = "input\n1 + 1\nprints\n2";
        let cases = parse_test_cases("arith", content);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].input, "1 + 1");
        assert_eq!(cases[0].expected, "2");
    }

    #[test]
    fn parses_multiple_cases_separated_by_dashes() {
        let content = "input\n1 + 1\nprints\n2\n---\ninput\ntrue\nprints\ntrue";
        let cases = parse_test_cases("misc", content);
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].input, "true");
        assert_eq!(cases[1].expected, "true");
    }

    #[test]
    fn case_name_includes_file_stem_and_index() {
        let content = "input\n1\nprints\n1";
        let cases = parse_test_cases("literals", content);
        assert_eq!(cases[0].name, "literals#0");
    }

    #[test]
    fn discover_test_files_finds_only_pebble_files() {
        let dir = std::env::temp_dir().join(format!("pebble_discover_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.pebble"), "input\n1\nprints\n1").unwrap();
        fs::write(dir.join("readme.txt"), "not a test").unwrap();
        let files = discover_test_files(&dir);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "a.pebble");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn summary_reports_totals() {
        let summary = Summary {
            results: vec![
                CaseResult { name: "a".into(), passed: true, detail: None },
                CaseResult { name: "b".into(), passed: false, detail: Some("boom".into()) },
            ],
        };
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.passed(), 1);
        assert!(!summary.all_passed());
    }
}
