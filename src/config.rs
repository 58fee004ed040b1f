//! Configuration loading.
//!
//! The default configuration file is `cat-toolkit.toml` in the current
//! working directory. Every field is defaulted, so the file can be omitted
//! entirely:
//!
//! ```rust,no_run
//! use cat_toolkit::config::Config;
//!
//! let config = Config::load(None).expect("failed to load config");
//! assert!(config.is_pass_enabled("frontmatter"));
//! ```

use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "cat-toolkit.toml";

/// Main configuration for a validation or fix run.
///
/// # Examples
///
/// ```toml
/// [passes]
/// emoji = false
///
/// [budget]
/// token_budget = 20000
///
/// [external]
/// enabled = false
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// Per-pass on/off toggles.
    pub passes: PassesConfig,
    pub budget: BudgetConfig,
    pub fork: ForkConfig,
    /// The `claude plugin validate` subprocess.
    pub external: ExternalConfig,
}

/// Per-pass on/off toggles. Every pass defaults to enabled.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PassesConfig {
    pub frontmatter: bool,
    pub links: bool,
    pub glue_code: bool,
    pub fork_bloat: bool,
    pub askuser: bool,
    pub token_budget: bool,
    pub zero_token: bool,
    pub modality: bool,
    pub permissions: bool,
    pub command_structure: bool,
    pub architecture: bool,
    pub agent_security: bool,
    pub thin_wrapper: bool,
    pub persona: bool,
    pub emoji: bool,
    pub hooks: bool,
    pub plugin_validation: bool,
}

impl Default for PassesConfig {
    fn default() -> Self {
        PassesConfig {
            frontmatter: true,
            links: true,
            glue_code: true,
            fork_bloat: true,
            askuser: true,
            token_budget: true,
            zero_token: true,
            modality: true,
            permissions: true,
            command_structure: true,
            architecture: true,
            agent_security: true,
            thin_wrapper: true,
            persona: true,
            emoji: true,
            hooks: true,
            plugin_validation: true,
        }
    }
}

/// Limit on the summed length of every component description and
/// argument hint, in characters.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub token_budget: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        BudgetConfig {
            token_budget: 15_000,
        }
    }
}

/// Skills allowed to run in a fork context without delegating work.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ForkConfig {
    pub exempt_skills: Vec<String>,
}

impl Default for ForkConfig {
    fn default() -> Self {
        ForkConfig {
            exempt_skills: vec![
                "intent-translation".to_string(),
                "multimodal-understanding".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub enabled: bool,
    /// Program invoked as `<program> plugin validate <path>`.
    pub program: String,
    pub timeout_secs: u64,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        ExternalConfig {
            enabled: true,
            program: "claude".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try `cat-toolkit.toml` in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` when the explicit path does not exist, the file
    /// cannot be read, or the TOML content fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let config_path = if let Some(p) = path {
            if p.exists() {
                Some(p.to_path_buf())
            } else {
                return Err(format!("Config file not found: {}", p.display()));
            }
        } else {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        };

        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
                let config: Config = toml::from_str(&content)
                    .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))?;
                tracing::debug!("loaded configuration from {}", path.display());
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    /// Returns `true` if the pass with identifier `id` is enabled.
    ///
    /// Unknown identifiers are considered enabled.
    ///
    /// ```
    /// use cat_toolkit::config::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.is_pass_enabled("emoji"));
    /// assert!(config.is_pass_enabled("unknown_pass"));
    /// ```
    pub fn is_pass_enabled(&self, id: &str) -> bool {
        let p = &self.passes;
        match id {
            "frontmatter" => p.frontmatter,
            "links" => p.links,
            "glue_code" => p.glue_code,
            "fork_bloat" => p.fork_bloat,
            "askuser" => p.askuser,
            "token_budget" => p.token_budget,
            "zero_token" => p.zero_token,
            "modality" => p.modality,
            "permissions" => p.permissions,
            "command_structure" => p.command_structure,
            "architecture" => p.architecture,
            "agent_security" => p.agent_security,
            "thin_wrapper" => p.thin_wrapper,
            "persona" => p.persona,
            "emoji" => p.emoji,
            "hooks" => p.hooks,
            "plugin_validation" => p.plugin_validation,
            _ => true,
        }
    }
}
