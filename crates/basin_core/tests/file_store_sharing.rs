use basin_core::{Entity, EntityRepository, JsonFileRepository, Metadata};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Polymorphic GIS feature family stored behind one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Feature {
    Point {
        id: String,
        x: f64,
        y: f64,
        #[serde(default)]
        metadata: Metadata,
    },
    Polyline {
        id: String,
        vertices: Vec<(f64, f64)>,
        #[serde(default)]
        metadata: Metadata,
    },
}

impl Entity for Feature {
    type Id = String;

    fn id(&self) -> &String {
        match self {
            Self::Point { id, .. } | Self::Polyline { id, .. } => id,
        }
    }

    fn metadata(&self) -> &Metadata {
        match self {
            Self::Point { metadata, .. } | Self::Polyline { metadata, .. } => metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Point { metadata, .. } | Self::Polyline { metadata, .. } => metadata,
        }
    }
}

fn point(id: &str, x: f64, y: f64) -> Feature {
    Feature::Point {
        id: id.to_string(),
        x,
        y,
        metadata: Metadata::new(),
    }
}

fn polyline(id: &str, vertices: Vec<(f64, f64)>) -> Feature {
    Feature::Polyline {
        id: id.to_string(),
        vertices,
        metadata: Metadata::new(),
    }
}

#[test]
fn two_instances_sharing_a_file_converge() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("features.json");

    let first: JsonFileRepository<Feature> = JsonFileRepository::open(&path).unwrap();
    let second: JsonFileRepository<Feature> = JsonFileRepository::open(&path).unwrap();

    first.add(&point("p-1", 10.0, 20.0), None).unwrap();

    // The second instance was opened before the write; the reload on every
    // operation picks it up anyway.
    assert!(second.contains(&"p-1".to_string(), None).unwrap());
    second.add(&point("p-2", 30.0, 40.0), None).unwrap();

    assert_eq!(first.count(None).unwrap(), 2);
    let loaded = first.get(&"p-2".to_string(), None).unwrap().value().unwrap();
    assert_eq!(loaded, point("p-2", 30.0, 40.0));
}

#[test]
fn one_document_holds_multiple_concrete_variants() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("features.json");

    let repo: JsonFileRepository<Feature> = JsonFileRepository::open(&path).unwrap();
    repo.add(&point("p-1", 1.0, 2.0), None).unwrap();
    repo.add(&polyline("l-1", vec![(0.0, 0.0), (5.0, 5.0)]), None)
        .unwrap();

    // Reopen from disk; variants decode back into their own shapes via the
    // discriminator tag.
    let reopened: JsonFileRepository<Feature> = JsonFileRepository::open(&path).unwrap();
    let all = reopened.get_all(None).unwrap();
    assert_eq!(all.len(), 2);
    assert!(matches!(
        reopened.get(&"p-1".to_string(), None).unwrap().value().unwrap(),
        Feature::Point { .. }
    ));
    assert!(matches!(
        reopened.get(&"l-1".to_string(), None).unwrap().value().unwrap(),
        Feature::Polyline { .. }
    ));

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"type\""));
    assert!(raw.contains("point"));
    assert!(raw.contains("polyline"));
}

#[test]
fn documents_written_by_one_instance_reload_cleanly_in_another() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("features.json");

    {
        let repo: JsonFileRepository<Feature> = JsonFileRepository::open(&path).unwrap();
        repo.add(&point("p-1", 1.5, -2.5), None).unwrap();
        repo.update(&point("p-1", 3.5, -4.5), None).unwrap();
    }

    let reopened: JsonFileRepository<Feature> = JsonFileRepository::open(&path).unwrap();
    let loaded = reopened
        .get(&"p-1".to_string(), None)
        .unwrap()
        .value()
        .unwrap();
    assert_eq!(loaded, point("p-1", 3.5, -4.5));
}
