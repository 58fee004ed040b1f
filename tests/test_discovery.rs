use std::path::Path;

use cat_toolkit::discovery::references::ReferenceExtractor;
use cat_toolkit::discovery::{self, ComponentKey, LinkType};
use cat_toolkit::frontmatter::ComponentKind;
use cat_toolkit::validators::architecture::ArchitectureValidator;
use cat_toolkit::validators::{ValidationContext, Validator};
use std::collections::BTreeSet;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn skill(name: &str, body: &str) -> String {
    format!("---\nname: {name}\ndescription: \"Does {name}. Use when asked.\"\n---\n{body}\n")
}

// ---------------------------------------------------------------------------
// Component inventory
// ---------------------------------------------------------------------------

#[test]
fn discovers_every_component_kind() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "plugins/core/skills/planner/SKILL.md", &skill("planner", "Plan."));
    write(root, "plugins/core/agents/worker.md", "---\nname: builder\ndescription: \"Builds.\"\n---\n");
    write(root, "plugins/core/agents/nameless.md", "---\ndescription: \"No name.\"\n---\n");
    write(root, "plugins/core/commands/plan.md", "---\ndescription: \"Plans.\"\n---\n");
    write(
        root,
        "plugins/core/hooks/hooks.json",
        r#"{"hooks": {"PreToolUse": [], "Stop": []}}"#,
    );
    write(root, "plugins/core/commands/notes.md", "no frontmatter here\n");
    write(root, "plugins/.hidden/skills/x/SKILL.md", &skill("x", ""));

    let result = discovery::discover(root);

    let keys: Vec<String> = result.components.keys().map(|k| k.to_string()).collect();
    assert_eq!(
        keys,
        vec![
            "core:builder:agent",
            "core:hooks:hook",
            "core:nameless:agent",
            "core:plan:command",
            "core:planner:skill",
        ]
    );
    let stats = &result.plugin_stats["core"];
    assert_eq!(
        (stats.skills, stats.agents, stats.commands, stats.hook_events),
        (1, 2, 1, 2)
    );
    assert!(result.plugin_stats.get(".hidden").is_none());
}

#[test]
fn skill_is_named_after_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "plugins/core/skills/real-name/SKILL.md", &skill("other-name", ""));

    let result = discovery::discover(dir.path());
    let key = ComponentKey::new("core", "real-name", ComponentKind::Skill);
    assert!(result.components.contains_key(&key));
}

#[test]
fn plugins_dir_resolution() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(discovery::resolve_plugins_dir(dir.path()), dir.path());
    std::fs::create_dir(dir.path().join("plugins")).unwrap();
    assert_eq!(
        discovery::resolve_plugins_dir(dir.path()),
        dir.path().join("plugins")
    );
}

// ---------------------------------------------------------------------------
// Cross-plugin links
// ---------------------------------------------------------------------------

#[test]
fn external_and_bare_references_become_links() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "plugins/app/skills/deploy/SKILL.md",
        &skill("deploy", "Load `references/core/planner` first. Again references/core/planner."),
    );
    write(
        root,
        "plugins/app/agents/runner.md",
        "---\nname: runner\ndescription: \"Runs.\"\nskills: [planner, deploy]\n---\n",
    );
    write(root, "plugins/core/skills/planner/SKILL.md", &skill("planner", ""));

    let result = discovery::discover(root);

    let links: Vec<(String, String, LinkType)> = result
        .cross_links
        .iter()
        .map(|l| (l.source.to_string(), l.target.to_string(), l.link_type))
        .collect();
    assert_eq!(
        links,
        vec![
            (
                "app:deploy:skill".to_string(),
                "core:planner:skill".to_string(),
                LinkType::Delegates
            ),
            (
                "app:runner:agent".to_string(),
                "core:planner:skill".to_string(),
                LinkType::Invokes
            ),
        ]
    );

    let planner = &result.components[&ComponentKey::new("core", "planner", ComponentKind::Skill)];
    let expected: BTreeSet<String> = ["app:deploy:skill", "app:runner:agent"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(planner.referenced_by, expected);
}

#[test]
fn custom_extractor_is_used() {
    struct Everything;
    impl ReferenceExtractor for Everything {
        fn extract(&self, _content: &str, own_plugin: &str) -> BTreeSet<String> {
            if own_plugin == "a" {
                ["external:b:target".to_string()].into_iter().collect()
            } else {
                BTreeSet::new()
            }
        }
    }

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "plugins/a/commands/go.md", "---\ndescription: \"Go.\"\n---\n");
    write(dir.path(), "plugins/b/agents/target.md", "---\nname: target\n---\n");

    let result = discovery::discover_with(dir.path(), &Everything);
    assert_eq!(result.cross_links.len(), 1);
    assert_eq!(result.cross_links[0].link_type, LinkType::Invokes);
    assert_eq!(result.cross_links[0].target.to_string(), "b:target:agent");
}

// ---------------------------------------------------------------------------
// Architecture pass
// ---------------------------------------------------------------------------

#[test]
fn three_plugin_cycle_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "plugins/pa/skills/a/SKILL.md", &skill("a", "See references/pb/b."));
    write(root, "plugins/pb/skills/b/SKILL.md", &skill("b", "See references/pc/c."));
    write(root, "plugins/pc/skills/c/SKILL.md", &skill("c", "See references/pa/a."));

    let result = discovery::discover(root);
    assert_eq!(result.cross_links.len(), 3);
    assert!(result
        .cross_links
        .iter()
        .all(|l| l.link_type == LinkType::Delegates));

    let config = cat_toolkit::config::Config::default();
    let external = cat_toolkit::external::ClaudePluginValidator::from_config(&config.external);
    let ctx = ValidationContext::new(&result, &config, &external);
    let report = ArchitectureValidator.validate(&ctx);

    assert!(!report.errors.is_empty());
    let message = &report.errors[0].message;
    assert!(message.starts_with("Circular dependency detected involving "));
    let named = ["pa:a", "pb:b", "pc:c"]
        .iter()
        .filter(|n| message.contains(*n))
        .count();
    assert_eq!(named, 2, "{message}");
    assert_eq!(
        report.info[0].message,
        "3 components, 3 cross-plugin relationships"
    );
}

#[test]
fn acyclic_graph_has_no_errors() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "plugins/pa/skills/a/SKILL.md", &skill("a", "See references/pb/b."));
    write(root, "plugins/pb/skills/b/SKILL.md", &skill("b", ""));

    let result = discovery::discover(root);
    let config = cat_toolkit::config::Config::default();
    let external = cat_toolkit::external::ClaudePluginValidator::from_config(&config.external);
    let ctx = ValidationContext::new(&result, &config, &external);

    assert!(ArchitectureValidator.validate(&ctx).errors.is_empty());
}
