// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::backends::ImageBackend;
use crate::config::format_table::normalize_format;
use crate::config::{builtin_backends, BackendConfig, Config, EntryPointKind, FormatTable};
use crate::traits::ConversionBackend;

/// Builds a fresh backend instance for a newly spawned context.
pub type EntryPoint = Arc<dyn Fn() -> Arc<dyn ConversionBackend> + Send + Sync>;

/// One registry entry.
#[derive(Clone)]
pub struct BackendDescriptor {
    pub id: String,
    pub entry_point: EntryPoint,
    pub supported_conversions: FormatTable,
}

impl BackendDescriptor {
    pub fn new<F>(id: impl Into<String>, entry_point: F, supported_conversions: FormatTable) -> Self
    where
        F: Fn() -> Arc<dyn ConversionBackend> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            entry_point: Arc::new(entry_point),
            supported_conversions,
        }
    }

    pub fn instantiate(&self) -> Arc<dyn ConversionBackend> {
        (self.entry_point)()
    }

    fn from_config(config: &BackendConfig) -> Self {
        let mut table = FormatTable::new();
        for rule in &config.conversions {
            for target in &rule.to {
                table.insert(&rule.from, target);
            }
        }

        Self {
            id: config.id.trim().to_string(),
            entry_point: entry_point_for(config.entry_point),
            supported_conversions: table,
        }
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("id", &self.id)
            .field("supported_conversions", &self.supported_conversions)
            .finish_non_exhaustive()
    }
}

/// Entry point for a configured backend kind.
pub fn entry_point_for(kind: EntryPointKind) -> EntryPoint {
    match kind {
        EntryPointKind::Image => Arc::new(|| Arc::new(ImageBackend::new()) as Arc<dyn ConversionBackend>),
    }
}

/// Ordered table of backends. Resolution picks the first entry declaring a
/// pair, so order matters when declarations overlap.
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    descriptors: Vec<BackendDescriptor>,
}

impl BackendRegistry {
    pub fn new(descriptors: Vec<BackendDescriptor>) -> Self {
        Self { descriptors }
    }

    /// The built-in `image`, `document`, `audio-video` and `heic` entries.
    pub fn builtin() -> Self {
        Self::new(builtin_backends().iter().map(BackendDescriptor::from_config).collect())
    }

    pub fn from_config(cfg: &Config) -> Self {
        build_registry(cfg)
    }

    /// Id of the first backend declaring `source_format -> target_format`.
    pub fn resolve(&self, source_format: &str, target_format: &str) -> Option<&str> {
        self.resolve_descriptor(source_format, target_format)
            .map(|d| d.id.as_str())
    }

    pub fn resolve_descriptor(
        &self,
        source_format: &str,
        target_format: &str,
    ) -> Option<&BackendDescriptor> {
        let source = normalize_format(source_format);
        let target = normalize_format(target_format);
        self.descriptors
            .iter()
            .find(|d| d.supported_conversions.supports(&source, &target))
    }

    pub fn descriptor(&self, backend_id: &str) -> Option<&BackendDescriptor> {
        self.descriptors.iter().find(|d| d.id == backend_id)
    }

    /// Union of every backend's pairs, in registry order.
    pub fn all_conversions(&self) -> FormatTable {
        let mut all = FormatTable::new();
        for descriptor in &self.descriptors {
            all.merge(&descriptor.supported_conversions);
        }
        all
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolves backend entries from config into a registry
pub fn build_registry(cfg: &Config) -> BackendRegistry {
    BackendRegistry::new(
        cfg.effective_backends()
            .iter()
            .map(BackendDescriptor::from_config)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionRule;

    #[test]
    fn test_builtin_resolution_table_driven() {
        struct TestCase {
            source: &'static str,
            target: &'static str,
            expected: Option<&'static str>,
        }

        let test_cases = vec![
            TestCase { source: "jpg", target: "png", expected: Some("image") },
            TestCase { source: "JPEG", target: "PNG", expected: Some("image") },
            TestCase { source: "png", target: "jpeg", expected: Some("image") },
            TestCase { source: "pdf", target: "jpg", expected: Some("document") },
            TestCase { source: "docx", target: "pdf", expected: Some("document") },
            TestCase { source: "mp4", target: "gif", expected: Some("audio-video") },
            TestCase { source: "mov", target: "mp4", expected: Some("audio-video") },
            TestCase { source: "heic", target: "jpg", expected: Some("heic") },
            TestCase { source: "jpg", target: "jpeg", expected: None },
            TestCase { source: "gif", target: "png", expected: None },
            TestCase { source: "", target: "png", expected: None },
        ];

        let registry = BackendRegistry::builtin();
        for case in test_cases {
            assert_eq!(
                registry.resolve(case.source, case.target),
                case.expected,
                "{} -> {}",
                case.source,
                case.target
            );
        }
    }

    #[test]
    fn test_all_conversions_is_union_in_order() {
        let registry = BackendRegistry::builtin();
        let all = registry.all_conversions();

        let sources: Vec<&str> = all.iter().map(|(s, _)| s).collect();
        assert_eq!(sources, ["jpg", "jpeg", "png", "pdf", "docx", "mp4", "mov", "heic"]);
        assert_eq!(all.targets_for("png"), ["jpg", "jpeg"]);
        assert_eq!(all.targets_for("pdf"), ["docx", "jpg"]);
        assert_eq!(all.targets_for("mp4"), ["mp3", "gif"]);
    }

    #[test]
    fn test_first_declaring_backend_wins() {
        let table = FormatTable::from_pairs(&[("png", &["jpg"])]);
        let registry = BackendRegistry::new(vec![
            BackendDescriptor::new("first", || Arc::new(ImageBackend::new()) as Arc<dyn ConversionBackend>, table.clone()),
            BackendDescriptor::new("second", || Arc::new(ImageBackend::new()) as Arc<dyn ConversionBackend>, table),
        ]);

        assert_eq!(registry.resolve("png", "jpg"), Some("first"));
        assert_eq!(registry.all_conversions().len(), 1);
    }

    #[test]
    fn test_build_registry_from_config() {
        let cfg = Config {
            backends: Some(vec![BackendConfig {
                id: " pictures ".into(),
                entry_point: EntryPointKind::Image,
                conversions: vec![ConversionRule {
                    from: "PNG".into(),
                    to: vec!["JPG".into()],
                }],
            }]),
            ..Config::default()
        };

        let registry = build_registry(&cfg);
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["pictures"]);
        assert_eq!(registry.resolve("png", "jpg"), Some("pictures"));
        assert!(registry.resolve("jpg", "png").is_none());

        let backend = registry.descriptor("pictures").unwrap().instantiate();
        assert_eq!(backend.backend_type(), "image-converter");
    }

    #[test]
    fn test_default_config_builds_builtin_registry() {
        let registry = BackendRegistry::from_config(&Config::default());
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            ["image", "document", "audio-video", "heic"]
        );
        assert_eq!(registry.len(), 4);
    }
}
