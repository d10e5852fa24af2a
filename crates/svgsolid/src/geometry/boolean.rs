use crate::error::{ConvertError, Result};
use crate::geometry::path::{Orientation, Path};
use crate::geometry::region::{CompoundPath, FillRule};
use crate::geometry::{from_kernel_polygons, to_kernel_polygons, KERNEL_TOLERANCE};
use clipper2::{union, PathType};
use geo::{
    Contains, Coord, InteriorPoint, LineString, Point as GeoPoint, Polygon as GeoPolygon,
};

/// Union two regions and return the result with normalized nesting.
///
/// Each input is first read under its own fill rule, so a hole in one region
/// never cuts material out of the other. The combined outlines then go through a
/// single kernel union, which fills by non-zero winding.
pub fn unite(a: &CompoundPath, b: &CompoundPath) -> Result<CompoundPath> {
    let mut rings = winding_rings(a);
    rings.extend(winding_rings(b));

    let paths = kernel_union(&rings);
    if paths.is_empty() {
        return Err(ConvertError::kernel("union", "union produced no outlines"));
    }
    Ok(CompoundPath::new(normalize_nesting(paths)))
}

/// Children of `compound` with solids counter-clockwise and holes clockwise, so
/// that summing windings across regions gives their union.
fn winding_rings(compound: &CompoundPath) -> Vec<Path> {
    match compound.fill_rule() {
        FillRule::NonZero => normalize_nesting(kernel_union(compound.children())),
        FillRule::EvenOdd => resolve_nesting(compound.children().to_vec(), FillRule::EvenOdd),
    }
}

fn kernel_union(paths: &[Path]) -> Vec<Path> {
    if paths.is_empty() {
        return Vec::new();
    }
    from_kernel_polygons(&union(to_kernel_polygons(paths, PathType::Subject)))
}

/// Orient and order the outlines of one element by containment depth.
///
/// Even-depth outlines are solids (counter-clockwise), odd-depth outlines are holes
/// (clockwise). Every hole is placed directly after the solid that immediately
/// encloses it; solids keep their input order.
pub fn normalize_nesting(paths: Vec<Path>) -> Vec<Path> {
    resolve_nesting(paths, FillRule::EvenOdd)
}

/// Decide which outlines of one element are solids and which are holes under
/// `rule`, then orient and order them like [`normalize_nesting`].
///
/// Containment is tested from a point strictly inside each outline, so the result
/// does not depend on where an outline starts. Outlines of one element that
/// partly overlap each other are classified by that point alone.
pub fn resolve_nesting(paths: Vec<Path>, rule: FillRule) -> Vec<Path> {
    let areas: Vec<f64> = paths.iter().map(Path::area).collect();
    let rings: Vec<GeoPolygon<f64>> = paths.iter().map(to_geo_polygon).collect();
    let probes: Vec<Option<GeoPoint<f64>>> = paths
        .iter()
        .zip(&rings)
        .map(|(path, ring)| probe_point(path, ring))
        .collect();

    // Immediate parent: the smallest strictly larger outline containing this one.
    let mut parents: Vec<Option<usize>> = vec![None; paths.len()];
    let mut solid = vec![true; paths.len()];
    for (i, probe) in probes.iter().enumerate() {
        let Some(probe) = probe else { continue };
        let mut depth = 0usize;
        let mut winding = winding_sign(&paths[i]);
        for (j, ring) in rings.iter().enumerate() {
            if i == j || areas[j] <= areas[i] || !ring.contains(probe) {
                continue;
            }
            depth += 1;
            winding += winding_sign(&paths[j]);
            if parents[i].map_or(true, |p| areas[j] < areas[p]) {
                parents[i] = Some(j);
            }
        }
        solid[i] = match rule {
            FillRule::EvenOdd => depth % 2 == 0,
            FillRule::NonZero => winding != 0,
        };
    }

    let mut ordered = Vec::with_capacity(paths.len());
    let mut placed = vec![false; paths.len()];
    for outer in (0..paths.len()).filter(|&i| solid[i]) {
        ordered.push(paths[outer].oriented(Orientation::CounterClockwise));
        placed[outer] = true;
        for hole in (0..paths.len()).filter(|&h| !solid[h] && parents[h] == Some(outer)) {
            ordered.push(paths[hole].oriented(Orientation::Clockwise));
            placed[hole] = true;
        }
    }
    // Holes whose parent is itself a hole only arise from malformed input.
    for (i, path) in paths.iter().enumerate() {
        if !placed[i] {
            ordered.push(path.oriented(Orientation::Clockwise));
        }
    }
    ordered
}

fn winding_sign(path: &Path) -> i32 {
    match path.orientation() {
        Orientation::Clockwise => -1,
        _ => 1,
    }
}

fn to_geo_polygon(path: &Path) -> GeoPolygon<f64> {
    let mut coords: Vec<Coord<f64>> = path
        .flatten(KERNEL_TOLERANCE)
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    GeoPolygon::new(LineString::new(coords), vec![])
}

fn probe_point(path: &Path, ring: &GeoPolygon<f64>) -> Option<GeoPoint<f64>> {
    ring.interior_point().or_else(|| {
        path.segments()
            .first()
            .map(|segment| GeoPoint::new(segment.point.x, segment.point.y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_orders_hole_after_its_solid() {
        let hole = Path::rectangle(4.0, 4.0, 2.0, 2.0);
        let far = Path::rectangle(20.0, 0.0, 5.0, 5.0);
        let outer = Path::rectangle(0.0, 0.0, 10.0, 10.0);
        let ordered = normalize_nesting(vec![hole, far.clone(), outer.clone()]);

        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0], far);
        assert_eq!(ordered[1], outer);
        assert_eq!(ordered[2].orientation(), Orientation::Clockwise);
    }

    #[test]
    fn island_inside_hole_is_a_solid() {
        let outer = Path::rectangle(0.0, 0.0, 30.0, 30.0);
        let hole = Path::rectangle(5.0, 5.0, 20.0, 20.0);
        let island = Path::rectangle(10.0, 10.0, 5.0, 5.0).reversed();
        let ordered = normalize_nesting(vec![outer, hole, island]);

        let orientations: Vec<Orientation> = ordered.iter().map(Path::orientation).collect();
        assert_eq!(
            orientations,
            vec![
                Orientation::CounterClockwise,
                Orientation::Clockwise,
                Orientation::CounterClockwise
            ]
        );
    }

    #[test]
    fn union_of_disjoint_squares_keeps_both() {
        let compound = CompoundPath::new(vec![
            Path::rectangle(0.0, 0.0, 5.0, 5.0),
            Path::rectangle(10.0, 0.0, 5.0, 5.0),
        ]);
        let united = unite(&compound, &compound).expect("union");
        assert_eq!(united.len(), 2);
        assert!((united.signed_area() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn start_point_does_not_change_nesting() {
        let base = Path::rectangle(0.0, 0.0, 20.0, 20.0);
        let overlap = Path::from_points([(15.0, 5.0), (25.0, 5.0), (25.0, 15.0), (15.0, 15.0)], true);
        let rotated = Path::from_points([(25.0, 15.0), (15.0, 15.0), (15.0, 5.0), (25.0, 5.0)], true);
        let a = resolve_nesting(vec![base.clone(), overlap], FillRule::NonZero);
        let b = resolve_nesting(vec![base, rotated], FillRule::NonZero);
        let orientations = |paths: &[Path]| paths.iter().map(Path::orientation).collect::<Vec<_>>();
        assert_eq!(orientations(&a[..]), orientations(&b[..]));
    }

    #[test]
    fn nonzero_keeps_same_direction_inner_ring_filled() {
        let outer = Path::rectangle(0.0, 0.0, 30.0, 30.0);
        let inner = Path::rectangle(10.0, 10.0, 10.0, 10.0);
        let nonzero = resolve_nesting(vec![outer.clone(), inner.clone()], FillRule::NonZero);
        assert!(nonzero.iter().all(|p| p.orientation() == Orientation::CounterClockwise));

        let evenodd = resolve_nesting(vec![outer.clone(), inner.clone()], FillRule::EvenOdd);
        assert_eq!(evenodd[1].orientation(), Orientation::Clockwise);

        let reversed = resolve_nesting(vec![outer, inner.reversed()], FillRule::NonZero);
        assert_eq!(reversed[1].orientation(), Orientation::Clockwise);
    }

    #[test]
    fn hole_of_one_region_does_not_cut_another() {
        let ring = CompoundPath::new(vec![
            Path::rectangle(0.0, 0.0, 30.0, 30.0),
            Path::rectangle(10.0, 10.0, 10.0, 10.0),
        ])
        .with_fill_rule(FillRule::EvenOdd);
        let plug = CompoundPath::new(vec![Path::rectangle(5.0, 5.0, 20.0, 20.0).reversed()]);
        let united = unite(&ring, &plug).expect("union");
        assert_eq!(united.hole_count(), 0);
        assert!((united.signed_area() - 900.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_windings_in_separate_regions_both_fill() {
        let a = CompoundPath::new(vec![Path::rectangle(0.0, 0.0, 20.0, 20.0)]);
        let b = CompoundPath::new(vec![Path::rectangle(15.0, 5.0, 10.0, 10.0).reversed()]);
        let united = unite(&a, &b).expect("union");
        assert_eq!(united.len(), 1);
        assert!((united.signed_area() - 450.0).abs() < 1e-6);
    }

    #[test]
    fn union_merges_overlapping_squares() {
        let a = CompoundPath::new(vec![Path::rectangle(0.0, 0.0, 10.0, 10.0)]);
        let b = CompoundPath::new(vec![Path::rectangle(5.0, 0.0, 10.0, 10.0)]);
        let united = unite(&a, &b).expect("union");
        assert_eq!(united.len(), 1);
        assert!((united.signed_area() - 150.0).abs() < 1e-6);
    }
}
