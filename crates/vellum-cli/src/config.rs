// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Vellum project configuration.
//!
//! Configuration is loaded from `vellum.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! [project]
//! name = "trading-desk"
//!
//! [server]
//! port = 3000
//! host = "127.0.0.1"
//!
//! [templates]
//! dir = "templates"
//! extension = "html"
//! includes_segment = "includes"
//!
//! [site]
//! title = "Trading Desk"
//! author = "Ops"
//! static_dir = "static"
//! scripts_dir = "static/js"
//!
//! [[routes]]
//! pattern = "/orders/{id}"
//! template = "order"
//! title = "Order"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use vellum::{PageDefaults, SetupOptions};

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE: &str = "vellum.toml";

/// Main configuration structure loaded from `vellum.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Project metadata (name, version).
    #[serde(default)]
    pub project: ProjectConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Template walk settings.
    #[serde(default)]
    pub templates: TemplatesConfig,
    /// Site-wide page defaults.
    #[serde(default)]
    pub site: SiteConfig,
    /// Declared routes, matched in the server before the name fallback.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Project metadata configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project name (default: "unnamed").
    #[serde(default = "default_name")]
    pub name: String,
    /// Project version (default: "0.1.0").
    #[serde(default = "default_version")]
    pub version: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Server host (default: "127.0.0.1").
    #[serde(default = "default_host")]
    pub host: String,
}

/// Template directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Template root (default: "templates").
    #[serde(default = "default_templates_dir")]
    pub dir: String,
    /// Template file extension (default: "html").
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Directory name marking include fragments (default: "includes").
    #[serde(default = "default_includes_segment")]
    pub includes_segment: String,
}

/// Site-wide values every page starts with.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site title (default: "Unknown Site Title").
    #[serde(default = "default_title")]
    pub title: String,
    /// Site author (default: "Maravilla Labs").
    #[serde(default = "default_author")]
    pub author: String,
    /// CSS class for `<body>` (default: "sb-nav-fixed").
    #[serde(default = "default_body_class")]
    pub body_class: String,
    /// Label for requests without a user (default: "Anonymous").
    #[serde(default = "default_anonymous_user")]
    pub anonymous_user: String,
    /// Directory served under `/static` (default: "static").
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Per-page scripts directory (default: "static/js").
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,
    /// Redirect target for expired credentials (default: "/td/renew").
    #[serde(default = "default_renewal_path")]
    pub renewal_path: String,
}

/// A declared route.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// `matchit` pattern, e.g. `/orders/{id}`.
    pub pattern: String,
    /// Template rendered for matching requests.
    pub template: String,
    /// Page title (defaults to the template name).
    #[serde(default)]
    pub title: Option<String>,
}

fn default_name() -> String {
    "unnamed".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_extension() -> String {
    "html".to_string()
}

fn default_includes_segment() -> String {
    "includes".to_string()
}

fn default_title() -> String {
    "Unknown Site Title".to_string()
}

fn default_author() -> String {
    "Maravilla Labs".to_string()
}

fn default_body_class() -> String {
    "sb-nav-fixed".to_string()
}

fn default_anonymous_user() -> String {
    "Anonymous".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_scripts_dir() -> String {
    "static/js".to_string()
}

fn default_renewal_path() -> String {
    "/td/renew".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
            extension: default_extension(),
            includes_segment: default_includes_segment(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: default_author(),
            body_class: default_body_class(),
            anonymous_user: default_anonymous_user(),
            static_dir: default_static_dir(),
            scripts_dir: default_scripts_dir(),
            renewal_path: default_renewal_path(),
        }
    }
}

impl Config {
    /// Loads configuration from `vellum.toml` in the current directory.
    ///
    /// If no configuration file exists, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Loads `vellum.toml` from `project_dir`, falling back to defaults.
    pub fn load_from(project_dir: &Path) -> anyhow::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            tracing::debug!("No {} found, using defaults", config_path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Walk options for [`vellum::TemplateSet::setup`].
    pub fn setup_options(&self) -> SetupOptions {
        SetupOptions {
            extension: self.templates.extension.clone(),
            includes_segment: self.templates.includes_segment.clone(),
        }
    }

    /// Page defaults, with the asset root set to `project_dir`.
    pub fn page_defaults(&self, project_dir: &Path) -> PageDefaults {
        PageDefaults {
            body_class: self.site.body_class.clone(),
            site_title: self.site.title.clone(),
            site_author: self.site.author.clone(),
            anonymous_user: self.site.anonymous_user.clone(),
            asset_root: project_dir.to_path_buf(),
            scripts_dir: self.site.scripts_dir.clone(),
            renewal_path: self.site.renewal_path.clone(),
        }
    }
}
