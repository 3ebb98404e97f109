//! Manifest profiles
//!
//! A profile declares everything that differs between manifest variants:
//! where the URLs sit inside each record, where canonical lists are written,
//! and how extracted members are routed. A single pipeline serves every
//! profile.
//!
//! Profiles are described with serializable `*Spec` types (so they can live
//! in the TOML configuration) and resolved against a working root into the
//! runtime [`Profile`] and [`Category`] types.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::rules::{normalize_extension, OutputRule, Requirement};
use crate::constants::URL_HEADER_SUFFIX;
use crate::errors::{ConfigError, ConfigResult};

/// Serializable profile description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    /// Human readable summary
    #[serde(default)]
    pub description: String,
    /// Raw manifest path, relative to the working root
    pub manifest: PathBuf,
    /// URL categories extracted from each record
    pub categories: Vec<CategorySpec>,
}

/// Serializable category description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Category name, used for the URL list header (`<name>_URL`)
    pub name: String,
    /// Position of the URL in the `;`-split first column
    pub field_index: usize,
    /// Canonical URL list path
    pub url_list: PathBuf,
    /// Destination root directory
    pub destination: PathBuf,
    /// Routing rules in priority order
    pub rules: Vec<RuleSpec>,
}

/// Serializable rule description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// File extension, with or without the leading dot
    pub extension: String,
    /// Subdirectory of the category destination; `None` routes to the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdirectory: Option<PathBuf>,
    /// Companion outputs never trigger a fetch on their own
    #[serde(default)]
    pub optional: bool,
}

impl RuleSpec {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            subdirectory: None,
            optional: false,
        }
    }

    pub fn in_subdirectory(mut self, subdirectory: &str) -> Self {
        self.subdirectory = Some(PathBuf::from(subdirectory));
        self
    }
}

/// Resolved category ready for reconciliation and extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub field_index: usize,
    pub url_list: PathBuf,
    pub destination: PathBuf,
    pub rules: Vec<OutputRule>,
}

impl Category {
    /// Header of the canonical URL list
    pub fn url_header(&self) -> String {
        format!("{}{}", self.name, URL_HEADER_SUFFIX)
    }

    /// Destination root plus every distinct rule directory
    pub fn directories(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = vec![self.destination.as_path()];
        for rule in &self.rules {
            if !dirs.contains(&rule.directory.as_path()) {
                dirs.push(rule.directory.as_path());
            }
        }
        dirs
    }

    /// Create all output directories (idempotent)
    pub fn ensure_directories(&self) -> io::Result<()> {
        for dir in self.directories() {
            std::fs::create_dir_all(dir)?;
            debug!("Ensured directory {}", dir.display());
        }
        Ok(())
    }
}

/// Resolved profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub manifest: PathBuf,
    pub categories: Vec<Category>,
}

impl Profile {
    /// Create every category's output directories
    pub fn ensure_directories(&self) -> io::Result<()> {
        self.categories
            .iter()
            .try_for_each(Category::ensure_directories)
    }
}

impl ProfileSpec {
    /// Check structural constraints, collecting every problem found
    pub fn validate(&self, name: &str) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.categories.is_empty() {
            errors.push(format!("profile '{}' declares no categories", name));
        }

        for (i, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                errors.push(format!("profile '{}' category #{} has no name", name, i));
            }
            if self.categories[..i].iter().any(|c| c.name == category.name) {
                errors.push(format!(
                    "profile '{}' declares category '{}' twice",
                    name, category.name
                ));
            }
            if category.rules.is_empty() {
                errors.push(format!(
                    "profile '{}' category '{}' has no rules",
                    name, category.name
                ));
            }
            if category.rules.iter().all(|r| r.optional) && !category.rules.is_empty() {
                errors.push(format!(
                    "profile '{}' category '{}' needs at least one non-optional rule",
                    name, category.name
                ));
            }
            for rule in &category.rules {
                if rule.extension.trim().trim_start_matches('.').is_empty() {
                    errors.push(format!(
                        "profile '{}' category '{}' has a rule with an empty extension",
                        name, category.name
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Resolve all paths against `root`
    pub fn resolve(&self, name: &str, root: &Path) -> ConfigResult<Profile> {
        self.validate(name)?;

        let categories = self
            .categories
            .iter()
            .map(|spec| {
                let destination = root.join(&spec.destination);
                let rules = spec
                    .rules
                    .iter()
                    .map(|rule| {
                        let directory = match &rule.subdirectory {
                            Some(sub) => destination.join(sub),
                            None => destination.clone(),
                        };
                        OutputRule {
                            extension: normalize_extension(&rule.extension),
                            directory,
                            requirement: if rule.optional {
                                Requirement::Companion
                            } else {
                                Requirement::Required
                            },
                        }
                    })
                    .collect();

                Category {
                    name: spec.name.clone(),
                    field_index: spec.field_index,
                    url_list: root.join(&spec.url_list),
                    destination,
                    rules,
                }
            })
            .collect();

        Ok(Profile {
            name: name.to_string(),
            description: self.description.clone(),
            manifest: root.join(&self.manifest),
            categories,
        })
    }
}

/// Profiles for the City of Vancouver LiDAR releases
pub fn builtin_profiles() -> BTreeMap<String, ProfileSpec> {
    let mut profiles = BTreeMap::new();

    profiles.insert(
        "van-2013".to_string(),
        ProfileSpec {
            description: "Vancouver 2013 LiDAR point clouds and GeoTIFF orthophotos".to_string(),
            manifest: PathBuf::from("lidar-2013.csv"),
            categories: vec![
                CategorySpec {
                    name: "LiDAR".to_string(),
                    field_index: 2,
                    url_list: PathBuf::from("VanLidar2013_urls.csv"),
                    destination: PathBuf::from("VanLidar2013"),
                    rules: vec![RuleSpec::new(".las")],
                },
                CategorySpec {
                    name: "GeoTIFF".to_string(),
                    field_index: 1,
                    url_list: PathBuf::from("VanGeoTiff2013_urls.csv"),
                    destination: PathBuf::from("VanGeoTiff2013"),
                    rules: vec![RuleSpec::new(".tif"), RuleSpec::new(".tfw")],
                },
            ],
        },
    );

    profiles.insert(
        "van-2018".to_string(),
        ProfileSpec {
            description: "Vancouver 2018 LiDAR point clouds with projection files".to_string(),
            manifest: PathBuf::from("lidar-2018.csv"),
            categories: vec![CategorySpec {
                name: "LiDAR".to_string(),
                field_index: 1,
                url_list: PathBuf::from("VanLidar2018_urls.csv"),
                destination: PathBuf::from("VanLidar2018"),
                rules: vec![
                    RuleSpec::new(".prj").in_subdirectory("prj"),
                    RuleSpec::new(".las"),
                ],
            }],
        },
    );

    profiles.insert(
        "van-2022".to_string(),
        ProfileSpec {
            description: "Vancouver 2022 LiDAR point clouds with LASX indexes".to_string(),
            manifest: PathBuf::from("lidar-2022.csv"),
            categories: vec![CategorySpec {
                name: "LiDAR".to_string(),
                field_index: 1,
                url_list: PathBuf::from("VanLidar2022_urls.csv"),
                destination: PathBuf::from("VanLidar2022"),
                rules: vec![
                    RuleSpec::new(".lasx").in_subdirectory("lasx"),
                    RuleSpec::new(".las"),
                ],
            }],
        },
    );

    profiles
}
