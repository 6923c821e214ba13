use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csbind_gen::{GeneratorOptions, OmitRules};
use csbind_utils::find_best_match;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CONFIG_FILE: &str = "csbind.toml";
pub const OUTPUT_DIR_ENV: &str = "CSBIND_OUTPUT_DIR";
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Contents of `csbind.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output directory, relative to the working directory.
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub generator: GeneratorOptions,
    /// Extra omissions selected with `--platform NAME`.
    pub platforms: BTreeMap<String, OmitRules>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid csbind configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// An explicit path must exist. Otherwise `csbind.toml` next to the
    /// model is used when present, and defaults when not.
    pub fn discover(explicit: Option<&Path>, model: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let beside_model = model
            .parent()
            .map_or_else(|| PathBuf::from(CONFIG_FILE), |dir| dir.join(CONFIG_FILE));
        if beside_model.is_file() {
            debug!(config = %beside_model.display(), "using config next to model");
            return Self::load(&beside_model);
        }
        debug!("no config file, using defaults");
        Ok(Self::default())
    }

    /// Generator options with the omissions of `platform` merged in.
    pub fn options_for(&self, platform: Option<&str>) -> Result<GeneratorOptions> {
        let mut options = self.generator.clone();
        let Some(platform) = platform else {
            return Ok(options);
        };
        let Some(rules) = self.platforms.get(platform) else {
            match find_best_match(platform, self.platforms.keys()) {
                Some(suggestion) => {
                    bail!("unknown platform `{platform}`; did you mean `{suggestion}`?")
                }
                None => bail!("unknown platform `{platform}`"),
            }
        };
        options.omit.merge(rules);
        Ok(options)
    }

    /// Flag, then environment, then config file, then the default.
    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        resolve_output_dir(flag, env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from), self)
    }
}

fn resolve_output_dir(flag: Option<&Path>, from_env: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or(from_env)
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
output = "bindings"
indent_width = 2

[native]
includes = ["<Atomic/Scene/Node.h>", "\"NETCore.h\""]

[managed]
namespace = "AtomicEngine"

[omit]
functions = ["Node::GetScene"]

[platforms.web]
classes = ["Graphics"]
"#;

    #[test]
    fn parses_all_sections() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.output, Some(PathBuf::from("bindings")));
        assert_eq!(config.generator.indent_width, 2);
        assert_eq!(config.generator.native.includes.len(), 2);
        assert_eq!(config.generator.native.export_macro, "ATOMIC_EXPORT_API");
        assert_eq!(
            config.generator.managed.namespace.as_deref(),
            Some("AtomicEngine")
        );
        assert!(config.generator.omit.omits("Node", "GetScene"));
        assert!(config.platforms.contains_key("web"));
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn platform_rules_merge_into_options() {
        let config = Config::parse(SAMPLE).unwrap();
        let web = config.options_for(Some("web")).unwrap();
        assert!(web.omit.omits("Graphics", "Render"));
        assert!(web.omit.omits("Node", "GetScene"));

        let native = config.options_for(None).unwrap();
        assert!(!native.omit.omits("Graphics", "Render"));

        let error = config.options_for(Some("webb")).unwrap_err();
        assert!(error.to_string().contains("did you mean `web`"));
    }

    #[test]
    fn output_dir_precedence() {
        let config = Config::parse(SAMPLE).unwrap();
        let env = Some(PathBuf::from("from-env"));
        assert_eq!(
            resolve_output_dir(Some(Path::new("flag")), env.clone(), &config),
            PathBuf::from("flag")
        );
        assert_eq!(
            resolve_output_dir(None, env, &config),
            PathBuf::from("from-env")
        );
        assert_eq!(
            resolve_output_dir(None, None, &config),
            PathBuf::from("bindings")
        );
        assert_eq!(
            resolve_output_dir(None, None, &Config::default()),
            PathBuf::from(DEFAULT_OUTPUT_DIR)
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::parse("indent_width = \"four\"").is_err());
    }
}
