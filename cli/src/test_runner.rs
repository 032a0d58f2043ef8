//! Runner for `.test.md` editing scenarios.
//!
//! A scenario is TOML frontmatter between `---` lines followed by a listing
//! of the starting document, cursor marked with `|`. The steps are replayed
//! through an [`Editor`] over a [`MemoryHost`] and the result compared with
//! the expected listing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use editor::{Editor, Key, MemoryHost};
use screenplay::parser::Parser;

/// One thing the user does.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Press a key: `{ key = "enter" }`.
    Key(String),
    /// Type characters one by one: `{ text = "INT. " }`.
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Listing after all steps, cursor included.
    #[serde(default)]
    pub expect: Option<String>,

    /// Scene labels after all steps, in order.
    #[serde(default)]
    pub expect_scenes: Option<Vec<String>>,

    /// Undo this many times after the steps, then compare with
    /// `expect_after_undo`.
    #[serde(default)]
    pub expect_undo_steps: Option<usize>,

    #[serde(default)]
    pub expect_after_undo: Option<String>,

    /// The starting listing itself must fail to parse.
    #[serde(default)]
    pub expect_parse_error: bool,
}

/// Split a scenario file into its frontmatter and the listing after it.
fn split_frontmatter(content: &str) -> Result<(Scenario, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;
    let frontmatter = after_open[..close].trim_end_matches('\r');
    let rest = &after_open[close + 4..];
    let listing = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let scenario: Scenario =
        toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((scenario, listing))
}

/// Parse and re-render a listing so hand-written expectations compare
/// independently of blank lines and trailing newlines.
fn normalize(listing: &str, what: &str) -> Result<String, String> {
    let parsed = Parser::new(listing.to_string(), 0).parse().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
        format!("{} is not a valid listing: {}", what, messages.join("; "))
    })?;
    Ok(parsed.document.to_listing(parsed.selection.as_ref()))
}

fn compare(what: &str, expected: &str, actual: &str) -> Result<(), String> {
    if expected == actual {
        return Ok(());
    }
    let indent = |s: &str| {
        s.lines()
            .map(|line| format!("    {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    };
    Err(format!(
        "{} mismatch\n  expected:\n{}\n  actual:\n{}",
        what,
        indent(expected),
        indent(actual)
    ))
}

fn replay(scenario: &Scenario, listing: &str) -> Result<(), String> {
    let parsed = Parser::new(listing.to_string(), 0).parse();
    if scenario.expect_parse_error {
        return match parsed {
            Err(_) => Ok(()),
            Ok(_) => Err("expected parse error, but parsing succeeded".into()),
        };
    }
    let parsed = parsed.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
        format!("unexpected parse error: {}", messages.join("; "))
    })?;

    let host = MemoryHost::from_listing(parsed).map_err(|e| format!("bad start state: {}", e))?;
    let mut editor = Editor::new(host);
    for (i, step) in scenario.steps.iter().enumerate() {
        match step {
            Step::Key(name) => {
                let key: Key = name.parse().map_err(|e| format!("step {}: {}", i, e))?;
                editor.press(key);
            }
            Step::Text(text) => {
                editor.type_text(text);
            }
        }
    }

    if let Some(expected) = &scenario.expect {
        let expected = normalize(expected, "expect")?;
        compare("document", &expected, &editor.host().to_listing())?;
    }

    if let Some(expected) = &scenario.expect_scenes {
        let actual: Vec<String> = editor.scene_index().into_iter().map(|e| e.label).collect();
        if &actual != expected {
            return Err(format!(
                "scene index mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if let Some(steps) = scenario.expect_undo_steps {
        for n in 1..=steps {
            if !editor.host_mut().undo() {
                return Err(format!("undo {} of {}: nothing left to undo", n, steps));
            }
        }
        if let Some(expected) = &scenario.expect_after_undo {
            let expected = normalize(expected, "expect_after_undo")?;
            compare("document after undo", &expected, &editor.host().to_listing())?;
        }
    }

    Ok(())
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(".test.md"))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let result = |description: Option<String>, outcome: TestOutcome| TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return result(None, TestOutcome::Fail(format!("cannot read file: {}", e))),
    };
    let (scenario, listing) = match split_frontmatter(&content) {
        Ok(pair) => pair,
        Err(e) => return result(None, TestOutcome::Fail(format!("frontmatter error: {}", e))),
    };

    let outcome = match replay(&scenario, listing) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };
    result(scenario.description, outcome)
}

fn is_scenario(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with(".test.md"))
}

/// Folder of `file` relative to `root`, `/`-separated. "" for files
/// directly in `root`.
fn category_of(file: &Path, root: &Path) -> String {
    let Some(folder) = file.parent().and_then(|p| p.strip_prefix(root).ok()) else {
        return String::new();
    };
    folder
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// Scenario files keyed by category, both sorted.
struct Suite {
    categories: BTreeMap<String, Vec<PathBuf>>,
}

impl Suite {
    /// Walk everything under `root`. Unreadable folders are skipped.
    fn discover(root: &Path) -> Self {
        let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.flatten().map(|e| e.path()) {
                if path.is_dir() {
                    pending.push(path);
                } else if is_scenario(&path) {
                    categories.entry(category_of(&path, root)).or_default().push(path);
                }
            }
        }
        categories.values_mut().for_each(|files| files.sort());
        Suite { categories }
    }

    fn single(file: &Path) -> Self {
        Suite {
            categories: BTreeMap::from([(String::new(), vec![file.to_path_buf()])]),
        }
    }

    fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Display names of every category, for listings and warnings.
    fn labels(&self) -> Vec<&str> {
        self.categories.keys().map(|k| category_label(k)).collect()
    }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("{} is a single scenario; it has no categories", path.display());
        return;
    }
    let suite = Suite::discover(path);
    if suite.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }
    eprintln!("categories under {}:", path.display());
    for (label, files) in suite.labels().into_iter().zip(suite.categories.values()) {
        let noun = if files.len() == 1 { "scenario" } else { "scenarios" };
        eprintln!("  {:<24} {} {}", label, files.len(), noun);
    }
}

/// Terminal styling for the report.
struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        } else {
            s.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }
}

/// Keep only the requested categories (and their sub-folders), warning about
/// names that match nothing.
fn select<'a>(suite: &'a Suite, requested: &[String]) -> BTreeMap<&'a str, &'a [PathBuf]> {
    let all = &suite.categories;
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for wanted in requested {
        let wanted = wanted.trim_matches('/');
        let matching: Vec<_> = all
            .iter()
            .filter(|(category, _)| {
                category.as_str() == wanted
                    || category
                        .strip_prefix(wanted)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .collect();
        if matching.is_empty() {
            eprintln!(
                "warning: no scenarios in category '{}'; known: {}",
                wanted,
                suite.labels().join(", ")
            );
        }
        for (category, files) in matching {
            selected.insert(category.as_str(), files.as_slice());
        }
    }
    selected
}

/// Run every scenario under `path` (or the single file `path`), optionally
/// restricted to `categories`. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };

    let suite = if path.is_file() {
        Suite::single(path)
    } else {
        Suite::discover(path)
    };
    if suite.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }
    let selected = if path.is_file() {
        select(&suite, &[])
    } else {
        select(&suite, categories)
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();
    for (category, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", style.bold(category_label(category)));
        }
        for file in *files {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
