use crate::io::manifest::read_scene_manifest;
use crate::types::{PlanError, PlanResult};
use geo::{Area, BooleanOps, Coord, Intersects, LineString, Polygon};
use std::path::Path;

/// On-ground boundary of one acquisition, derived from the manifest's
/// ground-control polygon. Computed on demand and never cached across
/// predicate evaluations.
#[derive(Debug, Clone)]
pub struct Footprint {
    polygon: Polygon<f64>,
}

impl Footprint {
    /// Reads the footprint from `<scene>/manifest.safe`
    pub fn from_scene(scene: &Path) -> PlanResult<Footprint> {
        let manifest = read_scene_manifest(scene)?;
        let coords = manifest
            .coordinates
            .ok_or_else(|| PlanError::MetadataMissing {
                scene: scene.display().to_string(),
                element: "gml:coordinates".to_string(),
            })?;
        Footprint::from_coordinates(&coords)
    }

    /// Parses the manifest coordinate list: whitespace-separated points in
    /// `lat,lon` order, swapped here to lon/lat. The ring is closed by the
    /// polygon constructor.
    pub fn from_coordinates(text: &str) -> PlanResult<Footprint> {
        let mut ring: Vec<Coord<f64>> = Vec::new();
        for point in text.split_whitespace() {
            let (lat, lon) = point
                .split_once(',')
                .ok_or_else(|| PlanError::Geometry(format!("bad coordinate pair: {}", point)))?;
            let lat: f64 = lat
                .trim()
                .parse()
                .map_err(|_| PlanError::Geometry(format!("bad latitude: {}", lat)))?;
            let lon: f64 = lon
                .trim()
                .parse()
                .map_err(|_| PlanError::Geometry(format!("bad longitude: {}", lon)))?;
            ring.push(Coord { x: lon, y: lat });
        }
        if ring.len() < 4 {
            return Err(PlanError::Geometry(format!(
                "footprint needs at least 4 points, got {}",
                ring.len()
            )));
        }
        Ok(Footprint {
            polygon: Polygon::new(LineString::from(ring), vec![]),
        })
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Intersection area with another footprint, in degrees squared
    pub fn overlap_area(&self, other: &Footprint) -> f64 {
        self.polygon.intersection(&other.polygon).unsigned_area()
    }

    /// Intersection test with every vertex coordinate floored to 2 decimal
    /// places first. Adjacent slice footprints disagree in the last digits
    /// because their metadata is generated independently; flooring restores
    /// the intended touching relationship. Not a precision operation.
    pub fn rounded_intersects(&self, other: &Footprint) -> bool {
        floor_vertices(&self.polygon).intersects(&floor_vertices(&other.polygon))
    }

    /// Splits the footprint into three along-track sub-polygons by linear
    /// interpolation of the long edges (vertex pairs 0-1 and 2-3) at 1/3 and
    /// 2/3. Index order corresponds to subswaths IW3, IW2, IW1 (far-to-near);
    /// downstream overlap checks index into the triple positionally.
    pub fn thirds(&self) -> PlanResult<[Polygon<f64>; 3]> {
        let ring = &self.polygon.exterior().0;
        if ring.len() < 4 {
            return Err(PlanError::Geometry(
                "footprint is not a quadrilateral".to_string(),
            ));
        }
        let (l1p4, l1p1) = (ring[0], ring[1]);
        let (l2p1, l2p4) = (ring[2], ring[3]);

        let l1p2 = lerp(l1p4, l1p1, 2.0 / 3.0);
        let l1p3 = lerp(l1p4, l1p1, 1.0 / 3.0);
        let l2p2 = lerp(l2p1, l2p4, 1.0 / 3.0);
        let l2p3 = lerp(l2p1, l2p4, 2.0 / 3.0);

        Ok([
            quad(l1p1, l1p2, l2p2, l2p1),
            quad(l1p2, l1p3, l2p3, l2p2),
            quad(l1p3, l1p4, l2p4, l2p3),
        ])
    }
}

fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x * (1.0 - t) + b.x * t,
        y: a.y * (1.0 - t) + b.y * t,
    }
}

fn quad(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, d: Coord<f64>) -> Polygon<f64> {
    Polygon::new(LineString::from(vec![a, b, c, d]), vec![])
}

fn floor_vertices(polygon: &Polygon<f64>) -> Polygon<f64> {
    let floor2 = |v: f64| (v * 100.0).floor() / 100.0;
    let ring: Vec<Coord<f64>> = polygon
        .exterior()
        .0
        .iter()
        .map(|c| Coord {
            x: floor2(c.x),
            y: floor2(c.y),
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Overlap area between two scene footprints; metadata or geometry failures
/// degrade to 0.0 so the grouping algorithm stays total.
pub fn overlap_area(scene_a: &Path, scene_b: &Path) -> f64 {
    match (Footprint::from_scene(scene_a), Footprint::from_scene(scene_b)) {
        (Ok(a), Ok(b)) => a.overlap_area(&b),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("overlap area unavailable, assuming 0: {}", e);
            0.0
        }
    }
}

/// Rounding-tolerant intersection between two scene footprints; failures
/// degrade to false.
pub fn rounded_intersects(scene_a: &Path, scene_b: &Path) -> bool {
    match (Footprint::from_scene(scene_a), Footprint::from_scene(scene_b)) {
        (Ok(a), Ok(b)) => a.rounded_intersects(&b),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("intersection test unavailable, assuming disjoint: {}", e);
            false
        }
    }
}

/// Flags which of the scene's three subswath thirds intersect the area of
/// interest. No AOI means every subswath is relevant; an AOI outside the
/// footprint yields no valid subswath.
pub fn aoi_subswath_overlap(
    scene: &Path,
    aoi: Option<&Polygon<f64>>,
) -> PlanResult<[bool; 3]> {
    let aoi = match aoi {
        None => return Ok([true, true, true]),
        Some(aoi) => aoi,
    };

    let footprint = Footprint::from_scene(scene)?;
    if !footprint.polygon().intersects(aoi) {
        log::warn!(
            "AOI does not intersect footprint of {}, no valid subswath",
            scene.display()
        );
        return Ok([false, false, false]);
    }

    let thirds = footprint.thirds()?;
    Ok([
        thirds[0].intersects(aoi),
        thirds[1].intersects(aoi),
        thirds[2].intersects(aoi),
    ])
}

/// Maps subswath overlap flags to SNAP subswath identifiers (index 0 is the
/// far subswath IW3)
pub fn subswath_names(flags: [bool; 3]) -> Vec<String> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, valid)| **valid)
        .map(|(i, _)| format!("IW{}", 3 - i))
        .collect()
}
