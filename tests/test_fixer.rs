use std::path::{Path, PathBuf};

use cat_toolkit::config::Config;
use cat_toolkit::discovery;
use cat_toolkit::external::ClaudePluginValidator;
use cat_toolkit::fixer::ComponentFixer;
use cat_toolkit::frontmatter::ComponentKind;
use cat_toolkit::validators::frontmatter::FrontmatterValidator;
use cat_toolkit::validators::{ValidationContext, Validator};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// A tree with one problem of every fixable kind.
fn messy_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "plugins/demo/skills/foo-bar/SKILL.md",
        "---\nname: foo_bar\n# keep this comment\ndescription: Builds things. Use when building\nallowed-tools: [Read]\n---\n# Foo\n",
    );
    write(
        root,
        "plugins/demo/agents/helper.md",
        "---\nname: helper\ndescription: >\n  Helps with\n  many things.\ntools:\n  - Read\n  - Bash[git]\n---\nBody\n",
    );
    write(
        root,
        "plugins/demo/commands/run.md",
        "---\ndescription: \"Runs scripts.\"\nallowed-tools: [Bash[python,node]]\nargument-hint: \"[script]\"\n---\nRun it.\n",
    );
    dir
}

fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files: Vec<(PathBuf, String)> = files_under(root)
        .into_iter()
        .map(|p| {
            let content = read(&p);
            (p, content)
        })
        .collect();
    files.sort();
    files
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn change_log(fixer: &ComponentFixer) -> Vec<(PathBuf, Vec<String>)> {
    fixer
        .results()
        .iter()
        .filter(|r| r.fixed)
        .map(|r| (r.file_path.clone(), r.changes.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn underscore_name_is_fixed_and_errors_clear() {
    let dir = messy_tree();
    let plugins = dir.path().join("plugins");
    let skill = plugins.join("demo/skills/foo-bar/SKILL.md");

    let mut fixer = ComponentFixer::new(&plugins, false);
    fixer.fix_all();
    assert_eq!(fixer.error_count(), 0);

    let content = read(&skill);
    assert!(content.starts_with("---\nname: foo-bar\n# keep this comment\n"));
    assert!(content.contains("description: \"Builds things. Use when building.\"\n"));
    assert!(content.ends_with("allowed-tools: [Read]\n---\n# Foo\n"));

    let discovery = discovery::discover(dir.path());
    let config = Config::default();
    let external = ClaudePluginValidator::from_config(&config.external);
    let result = FrontmatterValidator.validate(&ValidationContext::new(&discovery, &config, &external));
    let skill_errors: Vec<_> = result
        .errors
        .iter()
        .filter(|f| f.file.as_deref() == Some(skill.as_path()))
        .collect();
    assert!(skill_errors.is_empty(), "{skill_errors:?}");
}

#[test]
fn bracket_tools_become_scoped_tools() {
    let dir = messy_tree();
    let plugins = dir.path().join("plugins");
    let command = plugins.join("demo/commands/run.md");

    let mut fixer = ComponentFixer::new(&plugins, false);
    let result = fixer.fix_component_file(&command, ComponentKind::Command);

    assert_eq!(result.changes, vec!["Normalized tool syntax in allowed-tools"]);
    assert_eq!(
        read(&command),
        "---\ndescription: \"Runs scripts.\"\nallowed-tools: [Bash(python:*), Bash(node:*)]\nargument-hint: \"[script]\"\n---\nRun it.\n"
    );
}

#[test]
fn block_list_and_folded_description_keep_layout() {
    let dir = messy_tree();
    let plugins = dir.path().join("plugins");
    let agent = plugins.join("demo/agents/helper.md");

    let mut fixer = ComponentFixer::new(&plugins, false);
    let result = fixer.fix_component_file(&agent, ComponentKind::Agent);

    assert_eq!(
        result.changes,
        vec![
            "Sanitized description (removed newlines/special chars)",
            "Normalized tool syntax in tools",
        ]
    );
    assert_eq!(
        read(&agent),
        "---\nname: helper\ndescription: \"Helps with many things.\"\ntools:\n  - Read\n  - Bash(git:*)\n---\nBody\n"
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn second_run_is_a_no_op() {
    let dir = messy_tree();
    let plugins = dir.path().join("plugins");

    let mut first = ComponentFixer::new(&plugins, false);
    first.fix_all();
    assert!(first.fixed_count() > 0);
    let after_first = snapshot(dir.path());

    let mut second = ComponentFixer::new(&plugins, false);
    second.fix_all();
    assert_eq!(second.fixed_count(), 0);
    assert_eq!(second.error_count(), 0);
    assert_eq!(snapshot(dir.path()), after_first);
}

#[test]
fn dry_run_matches_live_run_and_writes_nothing() {
    let dry_dir = messy_tree();
    let live_dir = messy_tree();
    let before = snapshot(dry_dir.path());

    let mut dry = ComponentFixer::new(&dry_dir.path().join("plugins"), true);
    dry.fix_all();
    let mut live = ComponentFixer::new(&live_dir.path().join("plugins"), false);
    live.fix_all();

    assert_eq!(snapshot(dry_dir.path()), before);
    assert!(dry.is_dry_run());

    let relative = |log: Vec<(PathBuf, Vec<String>)>, root: &Path| -> Vec<(PathBuf, Vec<String>)> {
        log.into_iter()
            .map(|(p, c)| (p.strip_prefix(root).unwrap().to_path_buf(), c))
            .collect()
    };
    assert_eq!(
        relative(change_log(&dry), dry_dir.path()),
        relative(change_log(&live), live_dir.path())
    );
}

#[test]
fn clean_description_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let content = "---\nname: tidy\ndescription: \"Already clean. Use when tidy.\"\n---\n";
    let path = write(dir.path(), "plugins/p/skills/tidy/SKILL.md", content);

    let mut fixer = ComponentFixer::new(&dir.path().join("plugins"), false);
    let result = fixer.fix_component_file(&path, ComponentKind::Skill);
    assert!(!result.fixed);
    assert_eq!(read(&path), content);
}

// ---------------------------------------------------------------------------
// Directory / name synchronization
// ---------------------------------------------------------------------------

#[test]
fn valid_directory_name_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "plugins/p/skills/right-name/SKILL.md",
        "---\nname: 'wrong-name'\ndescription: \"Does it. Use when needed.\"\n---\n",
    );

    let mut fixer = ComponentFixer::new(&dir.path().join("plugins"), false);
    fixer.fix_all();

    assert_eq!(
        read(&path),
        "---\nname: 'right-name'\ndescription: \"Does it. Use when needed.\"\n---\n"
    );
    let sync = fixer
        .results()
        .iter()
        .find(|r| r.file_path.ends_with("right-name"))
        .unwrap();
    assert_eq!(
        sync.changes,
        vec![
            "Name mismatch: YAML='wrong-name' vs Dir='right-name'",
            "Updated YAML name to match directory: right-name",
        ]
    );
}

#[test]
fn invalid_directory_is_renamed_to_yaml_name() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "plugins/p/skills/Bad Dir/SKILL.md",
        "---\nname: good-name\ndescription: \"Does it. Use when needed.\"\n---\n",
    );
    let plugins = dir.path().join("plugins");

    let mut dry = ComponentFixer::new(&plugins, true);
    dry.fix_all();
    assert_eq!(dry.fixed_count(), 1);
    assert!(plugins.join("p/skills/Bad Dir").is_dir());

    let mut live = ComponentFixer::new(&plugins, false);
    live.fix_all();
    assert!(plugins.join("p/skills/good-name/SKILL.md").is_file());
    assert!(!plugins.join("p/skills/Bad Dir").exists());
}

#[test]
fn unresolvable_mismatch_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "plugins/p/skills/Bad Dir/SKILL.md",
        "---\nname: \"bad name!\"\ndescription: \"Does it. Use when needed.\"\n---\n",
    );

    let mut fixer = ComponentFixer::new(&dir.path().join("plugins"), false);
    fixer.fix_all();

    assert_eq!(fixer.error_count(), 1);
    let failed = fixer.results().iter().find(|r| !r.errors.is_empty()).unwrap();
    assert!(failed.errors[0].starts_with("Cannot resolve mismatch"));
    assert!(!failed.fixed);
}

#[test]
fn colliding_renames_report_the_same_in_dry_and_live_runs() {
    let skill = "---\nname: a-x\ndescription: \"Does it. Use when needed.\"\n---\n";
    let trees = [tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap()];
    for tree in &trees {
        write(tree.path(), "plugins/p/skills/A_x/SKILL.md", skill);
        write(tree.path(), "plugins/p/skills/B_x/SKILL.md", skill);
    }

    let outcome = |root: &Path, dry_run: bool| {
        let mut fixer = ComponentFixer::new(&root.join("plugins"), dry_run);
        fixer.fix_all();
        fixer
            .results()
            .iter()
            .filter(|r| !r.changes.is_empty() || !r.errors.is_empty())
            .map(|r| {
                let errors: Vec<String> = r
                    .errors
                    .iter()
                    .map(|e| e.replace(&root.display().to_string(), "<root>"))
                    .collect();
                (
                    r.file_path.strip_prefix(root).unwrap().to_path_buf(),
                    r.changes.clone(),
                    errors,
                )
            })
            .collect::<Vec<_>>()
    };
    let dry = outcome(trees[0].path(), true);
    let live = outcome(trees[1].path(), false);

    assert_eq!(dry, live);
    assert_eq!(dry.len(), 2);
    assert_eq!(dry[0].1[1], "Renamed directory to match YAML: a-x");
    assert!(dry[1].2[0].starts_with("Cannot rename directory: <root>"));
    assert!(dry[1].2[0].ends_with("already exists"));
    assert!(trees[1].path().join("plugins/p/skills/a-x/SKILL.md").is_file());
    assert!(trees[1].path().join("plugins/p/skills/B_x/SKILL.md").is_file());
}
