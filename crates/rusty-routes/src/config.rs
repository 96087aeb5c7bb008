// File: src/config.rs
// Purpose: Router options and route-table configuration (routes.toml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::pattern::{CompileOptions, ParamEncoder};
use crate::router::Routes;

/// Configuration profile
///
/// Required-parameter and catch-all path checks run in every profile except
/// `Production`, which skips them to save per-call work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

/// Options for [`create_routes`](crate::create_routes), decided once at construction time
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// Configuration profile (drives validation unless overridden)
    pub profile: Profile,
    /// Explicit validation override
    pub validate: Option<bool>,
    /// Match paths case-sensitively
    pub case_sensitive: bool,
    /// Reject trailing slashes the pattern does not spell out
    pub strict: bool,
    /// Custom parameter encoder used when generating paths
    pub encoder: Option<Arc<dyn ParamEncoder>>,
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Forces validation on or off regardless of profile
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the encoder applied to each parameter value during generation
    ///
    /// ```
    /// use rusty_routes::{pattern::ParamKey, RouterOptions};
    ///
    /// let options = RouterOptions::new()
    ///     .with_encoder(|_value: &str, key: &ParamKey| key.name.clone());
    /// assert!(options.encoder.is_some());
    /// ```
    pub fn with_encoder(mut self, encoder: impl ParamEncoder + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Whether required-param / route-path checks run
    pub fn validates(&self) -> bool {
        self.validate
            .unwrap_or(self.profile != Profile::Production)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            case_sensitive: self.case_sensitive,
            strict: self.strict,
        }
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("profile", &self.profile)
            .field("validate", &self.validate)
            .field("case_sensitive", &self.case_sensitive)
            .field("strict", &self.strict)
            .field("encoder", &self.encoder.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// Route table configuration
///
/// ```toml
/// catch_all = "NotFound"
/// profile = "production"
///
/// [[route]]
/// kind = "AppList"
/// pattern = "/"
///
/// [[route]]
/// kind = "Foo"
/// pattern = "/foo/:name"
/// ```
///
/// Routes are an array of tables so declaration order (which decides the
/// first match) survives parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_catch_all")]
    pub catch_all: String,

    #[serde(default)]
    pub profile: Profile,

    #[serde(default)]
    pub validate: Option<bool>,

    #[serde(default = "default_false")]
    pub case_sensitive: bool,

    #[serde(default = "default_false")]
    pub strict: bool,

    #[serde(default, rename = "route")]
    pub routes: Vec<RouteEntry>,
}

/// One `[[route]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub kind: String,
    pub pattern: String,
}

// Default values
fn default_catch_all() -> String {
    "NotFound".to_string()
}

fn default_false() -> bool {
    false
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            catch_all: default_catch_all(),
            profile: Profile::default(),
            validate: None,
            case_sensitive: false,
            strict: false,
            routes: Vec::new(),
        }
    }
}

impl RoutesConfig {
    /// Load configuration from a routes.toml file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read routes file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse routes file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./routes.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routes.toml")
    }

    /// Parses a configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Router options described by this configuration
    pub fn options(&self) -> RouterOptions {
        RouterOptions {
            profile: self.profile,
            validate: self.validate,
            case_sensitive: self.case_sensitive,
            strict: self.strict,
            encoder: None,
        }
    }

    /// Compiles the configured table
    pub fn build(&self) -> crate::Result<Routes> {
        self.build_with(self.options())
    }

    /// Compiles the configured table with caller-supplied options
    /// (e.g. to add a custom encoder)
    pub fn build_with(&self, options: RouterOptions) -> crate::Result<Routes> {
        crate::create_routes(
            self.routes
                .iter()
                .map(|entry| (entry.kind.as_str(), entry.pattern.as_str())),
            self.catch_all.as_str(),
            options,
        )
    }
}
