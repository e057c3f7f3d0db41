//! Console-style debug commands
//!
//! `self_test` validates every registered definition and reports
//! per-definition errors and warnings; `dump_coverage` counts
//! definitions by family and position tag. Both log their findings and
//! return structured reports for tooling.

use std::collections::HashMap;

use umbra_core::Tag;

use crate::content::ContentRegistry;
use crate::definition::{ExecutionBackend, ExecutionFamily};
use crate::manager::ExecutionManager;

/// Findings for one definition
#[derive(Debug, Clone)]
pub struct SelfTestEntry {
    /// Definition name (or the unresolved asset name)
    pub name: String,
    /// Problems that make the definition unselectable
    pub errors: Vec<String>,
    /// Suspicious but non-fatal findings
    pub warnings: Vec<String>,
}

impl SelfTestEntry {
    /// Whether the definition passed
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregate self-test result
#[derive(Debug, Clone, Default)]
pub struct SelfTestReport {
    /// Per-definition findings
    pub entries: Vec<SelfTestEntry>,
}

impl SelfTestReport {
    /// Definitions with no errors
    pub fn passed(&self) -> usize {
        self.entries.iter().filter(|e| e.passed()).count()
    }

    /// Definitions with at least one error
    pub fn failed(&self) -> usize {
        self.entries.len() - self.passed()
    }
}

/// Definition counts grouped by family and by position tag
#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    /// Count per execution family
    pub by_family: Vec<(ExecutionFamily, usize)>,
    /// Count per position tag
    pub by_position: Vec<(Tag, usize)>,
    /// Definitions with no position tag at all
    pub untagged: usize,
}

impl ExecutionManager {
    /// Validate every registered definition.
    pub fn self_test(&self, content: &ContentRegistry) -> SelfTestReport {
        let mut report = SelfTestReport::default();

        for resolved in self.resolved_definitions(content) {
            let definition = match resolved {
                Ok(definition) => definition,
                Err(asset_name) => {
                    report.entries.push(SelfTestEntry {
                        name: asset_name.clone(),
                        errors: vec![format!("definition asset '{asset_name}' unresolved")],
                        warnings: Vec::new(),
                    });
                    continue;
                }
            };

            let mut errors = Vec::new();
            let mut warnings = Vec::new();

            if definition.execution_tag.path().is_empty() {
                errors.push("empty execution tag".to_string());
            }

            match &definition.backend {
                ExecutionBackend::Cas(config) => {
                    if let Err(e) = content.resolve_scene(&config.scene) {
                        errors.push(e.to_string());
                    }
                    if config.min_distance > config.max_distance {
                        errors.push(format!(
                            "min distance {:.1} exceeds max distance {:.1}",
                            config.min_distance, config.max_distance
                        ));
                    }
                    if config.max_facing_angle_degrees <= 0.0 {
                        warnings.push("non-positive facing angle gate".to_string());
                    }
                    if config.offset.max_warp_distance <= 0.0 {
                        warnings.push("non-positive max warp distance".to_string());
                    }
                }
                ExecutionBackend::LevelSequence(config) => {
                    if let Err(e) = content.resolve_sequence(&config.sequence) {
                        errors.push(e.to_string());
                    }
                }
                ExecutionBackend::AiScript(config) => {
                    if config.behavior_tag.is_none() {
                        errors.push("AI-script backend has no behavior tag".to_string());
                    }
                    warnings.push("AI-script backend is retired".to_string());
                }
                ExecutionBackend::SpawnActor(config) => {
                    if let Err(e) = content.resolve_helper_class(&config.helper_class) {
                        errors.push(e.to_string());
                    }
                    match content.resolve_execution_data(&config.execution_data) {
                        Ok(data) => match &data.instigator_montage {
                            Some(montage) => {
                                if let Err(e) = content.resolve_montage(montage) {
                                    errors.push(e.to_string());
                                }
                            }
                            None => errors.push("execution data has no instigator montage".into()),
                        },
                        Err(e) => errors.push(e.to_string()),
                    }
                    if config.use_omnitrace_warp
                        && config.pattern_entry.is_none()
                        && config.legacy_pattern_tag.is_none()
                        && definition.position_tag.is_none()
                    {
                        warnings.push(
                            "probe refinement enabled but no pattern entry, legacy tag, or position tag"
                                .to_string(),
                        );
                    }
                }
            }

            if definition.family == ExecutionFamily::Unknown {
                warnings.push("family is Unknown".to_string());
            }
            for warp_point in &definition.warp_points {
                if warp_point.max_warp_distance <= 0.0 {
                    warnings.push(format!(
                        "warp point '{}' has non-positive max distance",
                        warp_point.name
                    ));
                }
            }

            report.entries.push(SelfTestEntry {
                name: definition.display_name().to_string(),
                errors,
                warnings,
            });
        }

        for entry in &report.entries {
            for error in &entry.errors {
                log::error!("self-test '{}': {error}", entry.name);
            }
            for warning in &entry.warnings {
                log::warn!("self-test '{}': {warning}", entry.name);
            }
        }
        log::info!(
            "self-test: {} passed, {} failed",
            report.passed(),
            report.failed()
        );

        report
    }

    /// Count registered definitions by family and position tag.
    pub fn dump_coverage(&self, content: &ContentRegistry) -> CoverageReport {
        let mut by_family: HashMap<ExecutionFamily, usize> = HashMap::new();
        let mut by_position: HashMap<Tag, usize> = HashMap::new();
        let mut untagged = 0usize;

        for definition in self.resolved_definitions(content).into_iter().flatten() {
            *by_family.entry(definition.family).or_insert(0) += 1;
            let mut tagged = false;
            for tag in definition.position_tags() {
                *by_position.entry(tag.clone()).or_insert(0) += 1;
                tagged = true;
            }
            if !tagged {
                untagged += 1;
            }
        }

        let mut by_family: Vec<_> = by_family.into_iter().collect();
        by_family.sort_by_key(|(family, _)| format!("{family:?}"));
        let mut by_position: Vec<_> = by_position.into_iter().collect();
        by_position.sort_by(|(a, _), (b, _)| a.path().cmp(b.path()));

        for (family, count) in &by_family {
            log::info!("coverage: {family:?} x{count}");
        }
        for (tag, count) in &by_position {
            log::info!("coverage: {tag} x{count}");
        }
        if untagged > 0 {
            log::info!("coverage: {untagged} definitions without position tags");
        }

        CoverageReport {
            by_family,
            by_position,
            untagged,
        }
    }
}
