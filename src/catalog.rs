//! Placeable model templates and the spawn scale policy.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::types::ModelIndex;

/// Factor for names that ask for a smaller model.
const SMALL_NAME_FACTOR: f32 = 0.5;

/// Factor for names that ask for a larger model.
const LARGE_NAME_FACTOR: f32 = 2.0;

/// One renderable piece of a model.
#[derive(Debug, Clone)]
pub struct ModelPart {
    /// Part name, used in logs.
    pub name: String,
    /// Mesh to render.
    pub mesh: Handle<Mesh>,
    /// Material to render the mesh with.
    pub material: Handle<StandardMaterial>,
    /// Offset from the model root.
    pub offset: Transform,
}

impl ModelPart {
    /// Creates a part at the model root.
    pub fn new(
        name: impl Into<String>,
        mesh: Handle<Mesh>,
        material: Handle<StandardMaterial>,
    ) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
            offset: Transform::IDENTITY,
        }
    }

    /// Sets the part's offset from the model root.
    pub fn with_offset(mut self, offset: Transform) -> Self {
        self.offset = offset;
        self
    }
}

/// A placeable model.
#[derive(Debug, Clone)]
pub struct ModelTemplate {
    /// Display name; also drives the name-based scale heuristic.
    pub name: String,
    /// Scale the model was authored at.
    pub base_scale: Vec3,
    /// Explicit spawn scale factor. Wins over every other rule.
    pub scale_override: Option<f32>,
    /// Parts spawned under the model root.
    pub parts: Vec<ModelPart>,
    /// Alternate parts the placed model can be switched to.
    pub variant: Option<Vec<ModelPart>>,
}

impl ModelTemplate {
    /// Creates a template with unit base scale and no parts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_scale: Vec3::ONE,
            scale_override: None,
            parts: Vec::new(),
            variant: None,
        }
    }

    /// Sets the authored scale.
    pub fn with_base_scale(mut self, base_scale: Vec3) -> Self {
        self.base_scale = base_scale;
        self
    }

    /// Forces the spawn scale factor.
    pub fn with_scale_override(mut self, factor: f32) -> Self {
        self.scale_override = Some(factor);
        self
    }

    /// Appends a part.
    pub fn with_part(mut self, part: ModelPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Sets the alternate parts.
    pub fn with_variant(mut self, parts: Vec<ModelPart>) -> Self {
        self.variant = Some(parts);
        self
    }

    /// Parts to spawn for the main or alternate look.
    pub fn parts_for(&self, variant_active: bool) -> &[ModelPart] {
        match (&self.variant, variant_active) {
            (Some(variant), true) => variant,
            _ => &self.parts,
        }
    }
}

/// Ordered list of placeable models.
#[derive(Resource, Debug, Clone, Default)]
pub struct ModelCatalog {
    templates: Vec<ModelTemplate>,
}

impl ModelCatalog {
    /// Creates a catalog from templates in display order.
    pub fn new(templates: Vec<ModelTemplate>) -> Self {
        Self { templates }
    }

    /// Template at `index`.
    pub fn get(&self, index: ModelIndex) -> Option<&ModelTemplate> {
        self.templates.get(index)
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog has no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelTemplate> {
        self.templates.iter()
    }
}

/// A factor applied to an inclusive range of model indices.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScaleRule {
    /// First index covered.
    pub first: ModelIndex,
    /// Last index covered.
    pub last: ModelIndex,
    /// Spawn scale factor.
    pub factor: f32,
}

/// Last-resort spawn scale factors keyed by model index.
///
/// Consulted only when a template has no override and its name does not hint
/// at a size. The first matching rule wins.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FallbackScales {
    /// Rules checked in order.
    pub rules: Vec<ScaleRule>,
    /// Per-index overrides checked before the rules.
    pub by_index: HashMap<ModelIndex, f32>,
    /// Factor when nothing matches.
    pub default_factor: f32,
}

impl Default for FallbackScales {
    fn default() -> Self {
        Self {
            rules: vec![
                ScaleRule {
                    first: 0,
                    last: 0,
                    factor: 0.5,
                },
                ScaleRule {
                    first: 1,
                    last: 4,
                    factor: 25.0,
                },
                ScaleRule {
                    first: 5,
                    last: 7,
                    factor: 0.5,
                },
            ],
            by_index: HashMap::new(),
            default_factor: 1.0,
        }
    }
}

impl FallbackScales {
    /// An empty table that always yields 1.0.
    pub fn uniform() -> Self {
        Self {
            rules: Vec::new(),
            by_index: HashMap::new(),
            default_factor: 1.0,
        }
    }

    /// Factor for `index`.
    pub fn factor(&self, index: ModelIndex) -> f32 {
        if let Some(factor) = self.by_index.get(&index) {
            return *factor;
        }
        self.rules
            .iter()
            .find(|rule| (rule.first..=rule.last).contains(&index))
            .map_or(self.default_factor, |rule| rule.factor)
    }
}

/// Which rule produced a spawn scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleSource {
    /// The template's explicit override.
    Override,
    /// A size keyword in the template name.
    Name,
    /// The index-keyed fallback table.
    Fallback,
}

/// Resolves the spawn scale factor for a template.
pub fn scale_factor(
    template: &ModelTemplate,
    index: ModelIndex,
    fallback: &FallbackScales,
) -> (f32, ScaleSource) {
    if let Some(factor) = template.scale_override {
        return (factor, ScaleSource::Override);
    }

    let name = template.name.to_lowercase();
    if name.contains("small") || name.contains("tiny") {
        (SMALL_NAME_FACTOR, ScaleSource::Name)
    } else if name.contains("large") || name.contains("big") {
        (LARGE_NAME_FACTOR, ScaleSource::Name)
    } else {
        (fallback.factor(index), ScaleSource::Fallback)
    }
}

/// Scale a freshly spawned object gets.
///
/// A zero authored scale would make the object invisible, so it is treated
/// as unit scale.
pub fn spawn_scale(template: &ModelTemplate, index: ModelIndex, fallback: &FallbackScales) -> Vec3 {
    let (factor, source) = scale_factor(template, index, fallback);
    debug!(
        "scale factor {factor} for '{}' (index {index}) from {source:?}",
        template.name
    );
    if template.base_scale == Vec3::ZERO {
        warn!(
            "model '{}' has a zero base scale, spawning at {factor}",
            template.name
        );
        Vec3::splat(factor)
    } else {
        template.base_scale * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_beats_name_and_table() {
        let template = ModelTemplate::new("Tiny Skull").with_scale_override(3.0);
        let (factor, source) = scale_factor(&template, 2, &FallbackScales::default());
        assert_eq!(factor, 3.0);
        assert_eq!(source, ScaleSource::Override);
    }

    #[test]
    fn name_keywords_are_case_insensitive() {
        let table = FallbackScales::default();
        assert_eq!(scale_factor(&ModelTemplate::new("SMALL Radius"), 2, &table).0, 0.5);
        assert_eq!(scale_factor(&ModelTemplate::new("tinyBone"), 2, &table).0, 0.5);
        assert_eq!(scale_factor(&ModelTemplate::new("Large Pelvis"), 2, &table).0, 2.0);
        assert_eq!(scale_factor(&ModelTemplate::new("bigfoot"), 2, &table).0, 2.0);
    }

    #[test]
    fn default_table_matches_index_ranges() {
        let table = FallbackScales::default();
        assert_eq!(table.factor(0), 0.5);
        assert_eq!(table.factor(1), 25.0);
        assert_eq!(table.factor(4), 25.0);
        assert_eq!(table.factor(5), 0.5);
        assert_eq!(table.factor(7), 0.5);
        assert_eq!(table.factor(8), 1.0);
    }

    #[test]
    fn by_index_entries_win_over_rules() {
        let mut table = FallbackScales::default();
        table.by_index.insert(2, 4.0);
        assert_eq!(table.factor(2), 4.0);
        assert_eq!(table.factor(3), 25.0);
    }

    #[test]
    fn spawn_scale_multiplies_base_scale() {
        let template = ModelTemplate::new("Femur").with_base_scale(Vec3::new(1.0, 2.0, 3.0));
        let scale = spawn_scale(&template, 0, &FallbackScales::default());
        assert_eq!(scale, Vec3::new(0.5, 1.0, 1.5));
    }

    #[test]
    fn zero_base_scale_falls_back_to_factor() {
        let template = ModelTemplate::new("Ulna").with_base_scale(Vec3::ZERO);
        let scale = spawn_scale(&template, 9, &FallbackScales::uniform());
        assert_eq!(scale, Vec3::ONE);
    }

    #[test]
    fn table_deserializes_with_defaults() {
        let table: FallbackScales =
            serde_json::from_str(r#"{ "rules": [{ "first": 0, "last": 2, "factor": 3.0 }] }"#).unwrap();
        assert_eq!(table.factor(1), 3.0);
        assert_eq!(table.factor(5), 1.0);
    }

    #[test]
    fn variant_parts_selected_when_active() {
        let part = ModelPart::new("shaft", Handle::default(), Handle::default());
        let template = ModelTemplate::new("Femur")
            .with_part(part.clone())
            .with_variant(vec![part.clone(), part]);
        assert_eq!(template.parts_for(false).len(), 1);
        assert_eq!(template.parts_for(true).len(), 2);
        assert_eq!(ModelTemplate::new("Rib").parts_for(true).len(), 0);
    }
}
