use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub clean: CleanConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
}

/// Declarative category node; paths are derived from nesting at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub children: Vec<CategorySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Source directory to target category. A source either matches an
    /// aggregate verbatim or acts as a prefix for everything beneath it.
    /// Ordered map so prefix resolution is reproducible.
    #[serde(default)]
    pub directory_mappings: BTreeMap<String, String>,
    /// Results at or above this confidence are eligible for phase 2.
    #[serde(default = "default_high_confidence_threshold")]
    pub high_confidence_threshold: f64,
    /// Holding category for directories no rule can place.
    #[serde(default = "default_holding_target")]
    pub holding_target: String,
    #[serde(default)]
    pub content_targets: ContentTargets,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            directory_mappings: BTreeMap::new(),
            high_confidence_threshold: default_high_confidence_threshold(),
            holding_target: default_holding_target(),
            content_targets: ContentTargets::default(),
        }
    }
}

/// Fixed targets for the content-analysis rule.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentTargets {
    #[serde(default = "default_photography_target")]
    pub photography: String,
    #[serde(default = "default_music_target")]
    pub music: String,
    #[serde(default = "default_phone_photo_target")]
    pub phone_photos: String,
}

impl Default for ContentTargets {
    fn default() -> Self {
        Self {
            photography: default_photography_target(),
            music: default_music_target(),
            phone_photos: default_phone_photo_target(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    /// Directories that never move, and never receive classification.
    #[serde(default)]
    pub frozen_dirs: Vec<String>,
    /// Phase 4 only removes empty directories under these prefixes.
    #[serde(default)]
    pub legacy_cleanup_prefixes: Vec<String>,
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            frozen_dirs: Vec::new(),
            legacy_cleanup_prefixes: Vec::new(),
            delete_batch_size: default_delete_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Duplicate groups whose members share a common path prefix at least
    /// this many segments deep are left for manual handling.
    #[serde(default = "default_manual_prefix_depth")]
    pub manual_prefix_depth: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            manual_prefix_depth: default_manual_prefix_depth(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanConfig {
    /// Files at or above this size show up in the space report.
    #[serde(default = "default_large_file_threshold_mb")]
    pub large_file_threshold_mb: i64,
    /// Files untouched for longer than this count as stale.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            large_file_threshold_mb: default_large_file_threshold_mb(),
            stale_after_days: default_stale_after_days(),
            exclude_dirs: Vec::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            taxonomy: TaxonomyConfig::default(),
            classifier: ClassifierConfig::default(),
            migration: MigrationConfig::default(),
            dedup: DedupConfig::default(),
            clean: CleanConfig::default(),
        }
    }
}

fn default_database_path() -> String {
    "drive_curator.db".to_string()
}

fn default_high_confidence_threshold() -> f64 {
    0.9
}

fn default_holding_target() -> String {
    "/Unsorted".to_string()
}

fn default_photography_target() -> String {
    "/Media/Photography".to_string()
}

fn default_music_target() -> String {
    "/Personal/Music".to_string()
}

fn default_phone_photo_target() -> String {
    "/Personal/Phone Photos".to_string()
}

fn default_delete_batch_size() -> usize {
    100
}

fn default_manual_prefix_depth() -> usize {
    3
}

fn default_large_file_threshold_mb() -> i64 {
    500
}

fn default_stale_after_days() -> i64 {
    365
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
