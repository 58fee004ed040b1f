//! Component discovery and cross-plugin graph construction.
//!
//! [`discover`] walks the plugins directory once, parses every component it
//! finds and links components across plugins. The result is a plain value
//! handed to every validation pass; nothing is cached between runs.

pub mod references;

use crate::common::is_excluded;
use crate::frontmatter::{self, ComponentKind, Frontmatter, FrontmatterError};
use references::{ReferenceExtractor, RegexReferenceExtractor};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Composite identity of a component: `plugin:name:kind`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentKey {
    pub plugin: String,
    pub name: String,
    pub kind: ComponentKind,
}

impl ComponentKey {
    pub fn new(plugin: &str, name: &str, kind: ComponentKind) -> Self {
        ComponentKey {
            plugin: plugin.to_string(),
            name: name.to_string(),
            kind,
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.plugin, self.name, self.kind)
    }
}

impl serde::Serialize for ComponentKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone)]
pub struct PluginComponent {
    pub key: ComponentKey,
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub references: BTreeSet<String>,
    pub referenced_by: BTreeSet<String>,
}

impl PluginComponent {
    pub fn new(key: ComponentKey, path: &Path, frontmatter: Frontmatter) -> Self {
        PluginComponent {
            key,
            path: path.to_path_buf(),
            frontmatter,
            references: BTreeSet::new(),
            referenced_by: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Delegates,
    Invokes,
    References,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Delegates => write!(f, "delegates"),
            LinkType::Invokes => write!(f, "invokes"),
            LinkType::References => write!(f, "references"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CrossPluginLink {
    pub source: ComponentKey,
    pub target: ComponentKey,
    pub link_type: LinkType,
    pub source_file: PathBuf,
    pub target_file: PathBuf,
    pub description: String,
}

/// Component counts for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PluginStats {
    pub skills: usize,
    pub agents: usize,
    pub commands: usize,
    pub hook_events: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    pub root_dir: PathBuf,
    pub plugins_dir: PathBuf,
    pub components: BTreeMap<ComponentKey, PluginComponent>,
    pub cross_links: Vec<CrossPluginLink>,
    pub plugin_stats: BTreeMap<String, PluginStats>,
}

impl DiscoveryResult {
    /// An empty result rooted at `root_dir`.
    pub fn empty(root_dir: &Path) -> Self {
        DiscoveryResult {
            root_dir: root_dir.to_path_buf(),
            plugins_dir: resolve_plugins_dir(root_dir),
            ..Default::default()
        }
    }

    pub fn marketplace_path(&self) -> PathBuf {
        self.root_dir.join(".claude-plugin").join("marketplace.json")
    }

    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &PluginComponent> {
        self.components.values().filter(move |c| c.key.kind == kind)
    }

    /// Inserts a component, replacing any previous one with the same key.
    pub fn insert(&mut self, component: PluginComponent) {
        self.components.insert(component.key.clone(), component);
    }
}

/// The plugins directory for `root_dir`: `root_dir/plugins` when it exists,
/// otherwise `root_dir` itself.
pub fn resolve_plugins_dir(root_dir: &Path) -> PathBuf {
    let nested = root_dir.join("plugins");
    if nested.is_dir() {
        nested
    } else {
        root_dir.to_path_buf()
    }
}

/// Discovers every component below `root_dir` using the default extractor.
pub fn discover(root_dir: &Path) -> DiscoveryResult {
    discover_with(root_dir, &RegexReferenceExtractor)
}

pub fn discover_with(root_dir: &Path, extractor: &dyn ReferenceExtractor) -> DiscoveryResult {
    let mut result = DiscoveryResult::empty(root_dir);
    tracing::info!("Discovering plugin components in {}", result.plugins_dir.display());

    for plugin_dir in plugin_dirs(&result.plugins_dir) {
        let Some(plugin) = plugin_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let stats = discover_plugin(&mut result, &plugin_dir, plugin, extractor);
        tracing::debug!(
            plugin,
            skills = stats.skills,
            agents = stats.agents,
            commands = stats.commands,
            "discovered plugin"
        );
        result.plugin_stats.insert(plugin.to_string(), stats);
    }

    result.cross_links = extract_relationships(&mut result.components);
    tracing::info!(
        "Found {} components across {} plugins, {} cross-plugin links",
        result.components.len(),
        result.plugin_stats.len(),
        result.cross_links.len()
    );
    result
}

/// Non-hidden immediate child directories, sorted.
fn plugin_dirs(plugins_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(plugins_dir) else {
        return vec![];
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .filter(|p| !is_excluded(p.strip_prefix(plugins_dir).unwrap_or(p)))
        .collect();
    dirs.sort();
    dirs
}

fn sorted_children(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return vec![];
    };
    let mut children: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    children.sort();
    children
}

fn discover_plugin(
    result: &mut DiscoveryResult,
    plugin_dir: &Path,
    plugin: &str,
    extractor: &dyn ReferenceExtractor,
) -> PluginStats {
    let mut stats = PluginStats::default();

    for skill_dir in sorted_children(&plugin_dir.join("skills")) {
        if !skill_dir.is_dir() {
            continue;
        }
        let skill_file = ["SKILL.md", "skill.md"]
            .iter()
            .map(|f| skill_dir.join(f))
            .find(|p| p.is_file());
        let Some(skill_file) = skill_file else {
            continue;
        };
        let dir_name = skill_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if let Some(component) =
            parse_component(&skill_file, plugin, ComponentKind::Skill, Some(dir_name), extractor)
        {
            result.insert(component);
            stats.skills += 1;
        }
    }

    for (folder, kind) in [("agents", ComponentKind::Agent), ("commands", ComponentKind::Command)] {
        for file in sorted_children(&plugin_dir.join(folder)) {
            if !file.is_file() || file.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if let Some(component) = parse_component(&file, plugin, kind, None, extractor) {
                result.insert(component);
                match kind {
                    ComponentKind::Agent => stats.agents += 1,
                    _ => stats.commands += 1,
                }
            }
        }
    }

    let hooks_file = plugin_dir.join("hooks").join("hooks.json");
    if hooks_file.is_file() {
        match read_hook_events(&hooks_file) {
            Some(events) => {
                stats.hook_events = events;
                let key = ComponentKey::new(plugin, "hooks", ComponentKind::Hook);
                result.insert(PluginComponent::new(key, &hooks_file, Frontmatter::default()));
            }
            None => tracing::debug!("skipping unparseable {}", hooks_file.display()),
        }
    }

    stats
}

/// Number of events in a `hooks.json` file, or `None` if it is not valid JSON.
fn read_hook_events(path: &Path) -> Option<usize> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    Some(
        value
            .get("hooks")
            .and_then(|h| h.as_object())
            .map(|h| h.len())
            .unwrap_or(0),
    )
}

/// Parses one markdown component. Unreadable files and files without a
/// parseable frontmatter block yield `None`; a block that is valid YAML but
/// not a mapping yields an empty frontmatter.
fn parse_component(
    path: &Path,
    plugin: &str,
    kind: ComponentKind,
    dir_name: Option<&str>,
    extractor: &dyn ReferenceExtractor,
) -> Option<PluginComponent> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("skipping unreadable {}: {e}", path.display());
            return None;
        }
    };
    let parts = frontmatter::split(&content).ok()?;
    let fm = match Frontmatter::from_yaml(parts.yaml) {
        Ok(fm) => fm,
        Err(FrontmatterError::NotAMapping) => Frontmatter::default(),
        Err(e) => {
            tracing::debug!("skipping {}: {e}", path.display());
            return None;
        }
    };

    let name = match dir_name {
        Some(dir) => dir.to_string(),
        None => fm
            .get_str("name")
            .map(str::to_string)
            .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))?,
    };

    let mut component = PluginComponent::new(ComponentKey::new(plugin, &name, kind), path, fm);
    component.references = extractor.extract(&content, plugin);
    Some(component)
}

/// Resolves reference tokens into cross-plugin links and fills
/// `referenced_by` on each link target.
pub fn extract_relationships(
    components: &mut BTreeMap<ComponentKey, PluginComponent>,
) -> Vec<CrossPluginLink> {
    let mut by_name: HashMap<&str, Vec<&ComponentKey>> = HashMap::new();
    for key in components.keys().filter(|k| k.kind != ComponentKind::Hook) {
        by_name.entry(key.name.as_str()).or_default().push(key);
    }

    let mut links: Vec<CrossPluginLink> = Vec::new();
    let mut seen: BTreeSet<(ComponentKey, ComponentKey, LinkType)> = BTreeSet::new();

    for (source_key, source) in components.iter() {
        for reference in &source.references {
            let resolved: Vec<(&ComponentKey, LinkType)> =
                if let Some(rest) = reference.strip_prefix("external:") {
                    let Some((plugin, name)) = rest.split_once(':') else {
                        continue;
                    };
                    let link_type = match source_key.kind {
                        ComponentKind::Skill => LinkType::Delegates,
                        ComponentKind::Agent => LinkType::References,
                        _ => LinkType::Invokes,
                    };
                    [ComponentKind::Skill, ComponentKind::Agent, ComponentKind::Command]
                        .into_iter()
                        .map(|kind| ComponentKey::new(plugin, name, kind))
                        .find_map(|candidate| components.get_key_value(&candidate).map(|(k, _)| k))
                        .map(|k| vec![(k, link_type)])
                        .unwrap_or_default()
                } else if let Some(name) = reference.strip_prefix("skill:") {
                    by_name
                        .get(name)
                        .map(|keys| {
                            keys.iter()
                                .filter(|k| k.plugin != source_key.plugin)
                                .map(|k| (*k, LinkType::Invokes))
                                .collect()
                        })
                        .unwrap_or_default()
                } else {
                    continue;
                };

            for (target_key, link_type) in resolved {
                if !seen.insert((source_key.clone(), target_key.clone(), link_type)) {
                    continue;
                }
                let target = &components[target_key];
                links.push(CrossPluginLink {
                    source: source_key.clone(),
                    target: target_key.clone(),
                    link_type,
                    source_file: source.path.clone(),
                    target_file: target.path.clone(),
                    description: format!(
                        "{} {link_type} {}:{}",
                        source_key.name, target_key.plugin, target_key.name
                    ),
                });
            }
        }
    }

    for link in &links {
        if let Some(target) = components.get_mut(&link.target) {
            target.referenced_by.insert(link.source.to_string());
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(plugin: &str, name: &str, kind: ComponentKind, refs: &[&str]) -> PluginComponent {
        let mut c = PluginComponent::new(
            ComponentKey::new(plugin, name, kind),
            Path::new("x.md"),
            Frontmatter::default(),
        );
        c.references = refs.iter().map(|r| r.to_string()).collect();
        c
    }

    fn map(items: Vec<PluginComponent>) -> BTreeMap<ComponentKey, PluginComponent> {
        items.into_iter().map(|c| (c.key.clone(), c)).collect()
    }

    #[test]
    fn key_displays_as_triple() {
        let key = ComponentKey::new("p", "n", ComponentKind::Agent);
        assert_eq!(key.to_string(), "p:n:agent");
    }

    #[test]
    fn bare_skill_references_only_link_across_plugins() {
        let mut components = map(vec![
            component("a", "caller", ComponentKind::Command, &["skill:shared"]),
            component("a", "shared", ComponentKind::Skill, &[]),
            component("b", "shared", ComponentKind::Skill, &[]),
        ]);
        let links = extract_relationships(&mut components);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target.to_string(), "b:shared:skill");
        assert_eq!(links[0].link_type, LinkType::Invokes);
    }

    #[test]
    fn external_reference_prefers_skill_and_fills_referenced_by() {
        let mut components = map(vec![
            component("a", "s", ComponentKind::Skill, &["external:b:t"]),
            component("b", "t", ComponentKind::Agent, &[]),
            component("b", "t", ComponentKind::Skill, &[]),
        ]);
        let links = extract_relationships(&mut components);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_type, LinkType::Delegates);
        let target = &components[&ComponentKey::new("b", "t", ComponentKind::Skill)];
        assert!(target.referenced_by.contains("a:s:skill"));
    }

    #[test]
    fn unresolved_references_are_dropped() {
        let mut components = map(vec![component(
            "a",
            "s",
            ComponentKind::Agent,
            &["external:zzz:none", "skill:missing", "bogus"],
        )]);
        assert!(extract_relationships(&mut components).is_empty());
    }
}
