use crate::errors::LoadError;
use geo::{Contains, MultiPolygon, Polygon};
use std::io::Read;

#[derive(Debug)]
struct Region {
    name: String,
    boundary: MultiPolygon<f64>,
}

/// Named region boundaries, loaded once per run and queried per record.
/// Regions are assumed disjoint; when boundaries overlap anyway, the first
/// region in file order wins, so the tie-break is a property of the file
/// the operator ships.
#[derive(Debug)]
pub struct RegionIndex {
    regions: Vec<Region>,
}

impl RegionIndex {
    /// Parses a JSON object mapping region name to a GeoJSON Polygon or
    /// MultiPolygon. Key order is preserved and becomes index order. Any
    /// other geometry is fatal: a broken region file must stop the run
    /// before any mapping starts.
    pub fn load(reader: impl Read) -> Result<Self, LoadError> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(reader)?;
        let mut regions = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let geometry: geojson::Geometry =
                serde_json::from_value(value).map_err(|e| LoadError::MalformedGeometry {
                    region: name.clone(),
                    reason: e.to_string(),
                })?;
            let converted: geo::Geometry<f64> =
                geometry.value.try_into().map_err(|e: geojson::Error| {
                    LoadError::MalformedGeometry {
                        region: name.clone(),
                        reason: e.to_string(),
                    }
                })?;
            let boundary = match converted {
                geo::Geometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
                geo::Geometry::MultiPolygon(multi) => multi,
                _ => {
                    return Err(LoadError::MalformedGeometry {
                        region: name,
                        reason: "expected Polygon or MultiPolygon".to_string(),
                    })
                }
            };
            regions.push(Region { name, boundary });
        }
        Ok(Self { regions })
    }

    /// First region in index order whose boundary fully contains the box.
    /// Containment, not intersection: a box straddling a border resolves
    /// to no region.
    pub fn resolve(&self, bounding_box: &Polygon<f64>) -> Option<&str> {
        self.regions
            .iter()
            .find(|region| region.boundary.contains(bounding_box))
            .map(|region| region.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
