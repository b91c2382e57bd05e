//! Atlas access: the provider seam, an in-memory mesh atlas, and a registry.

use std::collections::BTreeMap;
use std::path::Path;

use brainslice_math::BoundingBox3;
use brainslice_mesh::RegionMesh;
use brainslice_slicer::AxisConvention;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, Result};
use crate::heatmap::Heatmap;
use crate::settings::HeatmapSettings;

/// Acronym of the whole-brain outline region.
pub const ROOT: &str = "root";

/// Atlas used when settings do not name one.
pub const DEFAULT_ATLAS: &str = "allen_mouse_25um";

/// Source of region meshes for one atlas.
///
/// Implementations are shared read-only across worker threads while
/// regions are sectioned in parallel.
pub trait AtlasProvider: Send + Sync {
    /// Atlas name, e.g. `allen_mouse_25um`.
    fn name(&self) -> &str;

    /// Mesh of a region by acronym. [`ROOT`] resolves to the root mesh.
    fn region_mesh(&self, acronym: &str) -> Option<&RegionMesh>;

    /// Whole-brain outline.
    fn root_mesh(&self) -> &RegionMesh;

    /// Whether `acronym` names a region of this atlas.
    fn has_region(&self, acronym: &str) -> bool {
        self.region_mesh(acronym).is_some()
    }

    /// Bounds used to center planes; the root mesh bounds by default.
    fn bounds(&self) -> BoundingBox3 {
        self.root_mesh().bounds().unwrap_or_default()
    }

    /// Canonical axes of this atlas's coordinate space.
    fn axes(&self) -> AxisConvention {
        AxisConvention::default()
    }
}

/// An atlas held in memory: a root mesh plus named region meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAtlas {
    /// Atlas name.
    pub name: String,
    /// Whole-brain outline.
    pub root: RegionMesh,
    /// Region meshes keyed by acronym.
    #[serde(default)]
    pub regions: BTreeMap<String, RegionMesh>,
    /// Canonical axes.
    #[serde(default)]
    pub axes: AxisConvention,
}

impl MeshAtlas {
    /// Create an atlas with only a root mesh.
    pub fn new(name: impl Into<String>, root: RegionMesh) -> Self {
        Self {
            name: name.into(),
            root,
            regions: BTreeMap::new(),
            axes: AxisConvention::default(),
        }
    }

    /// Add a region, builder style.
    #[must_use]
    pub fn with_region(mut self, acronym: impl Into<String>, mesh: RegionMesh) -> Self {
        self.regions.insert(acronym.into(), mesh);
        self
    }

    /// Add or replace a region after checking its mesh.
    pub fn insert_region(&mut self, acronym: impl Into<String>, mesh: RegionMesh) -> Result<()> {
        let acronym = acronym.into();
        mesh.validate().map_err(|source| HeatmapError::Mesh {
            region: acronym.clone(),
            source,
        })?;
        self.regions.insert(acronym, mesh);
        Ok(())
    }

    /// Check every mesh in the atlas.
    pub fn validate(&self) -> Result<()> {
        let meshes = std::iter::once((ROOT, &self.root))
            .chain(self.regions.iter().map(|(k, v)| (k.as_str(), v)));
        for (region, mesh) in meshes {
            mesh.validate().map_err(|source| HeatmapError::Mesh {
                region: region.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Region acronyms in sorted order.
    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string, validating every mesh.
    pub fn from_json(json: &str) -> Result<Self> {
        let atlas: Self = serde_json::from_str(json)?;
        atlas.validate()?;
        Ok(atlas)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let atlas = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(
            "loaded atlas {} from {} ({} regions)",
            atlas.name,
            path.display(),
            atlas.regions.len()
        );
        Ok(atlas)
    }
}

impl AtlasProvider for MeshAtlas {
    fn name(&self) -> &str {
        &self.name
    }

    fn region_mesh(&self, acronym: &str) -> Option<&RegionMesh> {
        if acronym == ROOT {
            return Some(&self.root);
        }
        self.regions.get(acronym)
    }

    fn root_mesh(&self) -> &RegionMesh {
        &self.root
    }

    fn axes(&self) -> AxisConvention {
        self.axes
    }
}

/// Atlases available by name.
#[derive(Default)]
pub struct AtlasRegistry {
    atlases: BTreeMap<String, Box<dyn AtlasProvider>>,
}

impl AtlasRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an atlas under its own name, replacing any previous one.
    pub fn register(&mut self, atlas: impl AtlasProvider + 'static) {
        self.atlases.insert(atlas.name().to_string(), Box::new(atlas));
    }

    /// Look up an atlas; `None` selects [`DEFAULT_ATLAS`].
    pub fn get(&self, name: Option<&str>) -> Result<&dyn AtlasProvider> {
        let name = name.unwrap_or(DEFAULT_ATLAS);
        self.atlases
            .get(name)
            .map(|a| &**a)
            .ok_or_else(|| HeatmapError::UnknownAtlas(name.to_string()))
    }

    /// Registered atlas names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.atlases.keys().map(String::as_str)
    }

    /// Build a heatmap on the atlas named by `settings.atlas_name`.
    pub fn heatmap(
        &self,
        values: BTreeMap<String, f64>,
        settings: HeatmapSettings,
    ) -> Result<Heatmap<'_, dyn AtlasProvider + '_>> {
        let atlas = self.get(settings.atlas_name.as_deref())?;
        Heatmap::new(atlas, values, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainslice_math::Point3;

    fn toy_atlas() -> MeshAtlas {
        MeshAtlas::new(
            "toy",
            RegionMesh::cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)),
        )
        .with_region(
            "TH",
            RegionMesh::cuboid(Point3::new(2.0, 2.0, 2.0), Point3::new(4.0, 4.0, 4.0)),
        )
    }

    #[test]
    fn test_region_lookup() {
        let atlas = toy_atlas();
        assert!(atlas.has_region("TH"));
        assert!(atlas.has_region(ROOT));
        assert!(!atlas.has_region("SS"));
        assert_eq!(atlas.bounds().max, [10.0, 10.0, 10.0]);
        assert_eq!(atlas.region_names().collect::<Vec<_>>(), vec!["TH"]);
    }

    #[test]
    fn test_insert_region_validates() {
        let mut atlas = toy_atlas();
        let bad = RegionMesh {
            vertices: vec![0.0; 9],
            indices: vec![0, 1, 7],
        };
        let err = atlas.insert_region("BAD", bad).unwrap_err();
        assert!(matches!(err, HeatmapError::Mesh { ref region, .. } if region == "BAD"));
        assert!(!atlas.has_region("BAD"));
    }

    #[test]
    fn test_json_round_trip() {
        let atlas = toy_atlas();
        let json = atlas.to_json().unwrap();
        let restored = MeshAtlas::from_json(&json).unwrap();
        assert_eq!(restored, atlas);
    }

    #[test]
    fn test_registry_unknown_atlas() {
        let mut registry = AtlasRegistry::new();
        registry.register(toy_atlas());
        assert_eq!(registry.get(Some("toy")).unwrap().name(), "toy");
        assert!(matches!(
            registry.get(None),
            Err(HeatmapError::UnknownAtlas(name)) if name == DEFAULT_ATLAS
        ));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["toy"]);
    }

    #[test]
    fn test_registry_heatmap_uses_named_atlas() {
        let mut registry = AtlasRegistry::new();
        registry.register(toy_atlas());
        let values = BTreeMap::from([("TH".to_string(), 1.0)]);

        let settings = HeatmapSettings {
            atlas_name: Some("toy".to_string()),
            ..HeatmapSettings::default()
        };
        let heatmap = registry.heatmap(values.clone(), settings).unwrap();
        assert_eq!(heatmap.atlas().name(), "toy");

        let missing = registry.heatmap(values, HeatmapSettings::default());
        assert!(matches!(missing, Err(HeatmapError::UnknownAtlas(_))));
    }
}
