use crate::elements::subsegment::Osub;
use crate::elements::triangle::Otri;
use crate::elements::vertex::{Vertex, VertexId, VertexKind};
use crate::planar::refine_params::RefineParams;
use crate::planar::refine_procedures::flaws::{BadTriangle, FlawBuffers};
use crate::planar::refine_procedures::quality::{RefineError, RefineState};
use crate::planar::triangulation::Triangulation;
use crate::planar::triangulation_procedures::vertices::{self, InsertStatus};
use crate::properties::circumcenter::find_circumcenter;
use crate::properties::distance::{distance, distance2};
use crate::properties::area::doubled_signed_area;

/**
 * Quality test of one triangle: size constraints first (global cap,
 * per-triangle target, user veto), then the angle bounds, with the
 * Miller-Pav-Walkington exemption sparing triangles whose shortest
 * edge spans two concentric shells around a shared segment endpoint.
 * Condemned triangles are enqueued keyed by the squared shortest edge.
 */
pub fn test_triangle(
    mesh: &Triangulation,
    t: Otri,
    params: &RefineParams,
    flaws: &mut FlawBuffers,
) {
    let org_id = mesh.org(t);
    let dest_id = mesh.dest(t);
    let apex_id = mesh.apex(t);
    let org = mesh.vertex(org_id).clone();
    let dest = mesh.vertex(dest_id).clone();
    let apex = mesh.vertex(apex_id).clone();

    let od2 = distance2(&org, &dest);
    let da2 = distance2(&dest, &apex);
    let ao2 = distance2(&apex, &org);

    /* shortest edge, ties resolved in the fixed order od, da, ao */
    let (tri1, base1, base2, min_edge2, cos2_min) = if od2 <= da2 && od2 <= ao2 {
        /* smallest angle at the apex */
        let d = (org.x - apex.x) * (dest.x - apex.x) + (org.y - apex.y) * (dest.y - apex.y);
        (t, org_id, dest_id, od2, d * d / (ao2 * da2))
    } else if da2 <= ao2 {
        /* smallest angle at the origin */
        let d = (dest.x - org.x) * (apex.x - org.x) + (dest.y - org.y) * (apex.y - org.y);
        (t.lnext(), dest_id, apex_id, da2, d * d / (od2 * ao2))
    } else {
        /* smallest angle at the destination */
        let d = (org.x - dest.x) * (apex.x - dest.x) + (org.y - dest.y) * (apex.y - dest.y);
        (t.lprev(), apex_id, org_id, ao2, d * d / (od2 * da2))
    };

    let enqueue = |flaws: &mut FlawBuffers| {
        flaws.enqueue_triangle(BadTriangle {
            handle: tri1,
            key: min_edge2,
            org: mesh.org(tri1),
            dest: mesh.dest(tri1),
            apex: mesh.apex(tri1),
        });
    };

    if params.fixed_area || params.var_area || params.usertest.is_some() {
        let area = doubled_signed_area(&org, &dest, &apex).abs() / 2.0;

        if params.fixed_area && area > params.max_area {
            enqueue(flaws);
            return;
        }
        if params.var_area {
            let target = mesh.area_target(t.tri);
            if area > target && target > 0.0 {
                enqueue(flaws);
                return;
            }
        }
        if let Some(user) = params.usertest.as_ref() {
            if user(&org, &dest, &apex, area) {
                enqueue(flaws);
                return;
            }
        }
    }

    let mut angle_bad = cos2_min > params.good_angle;

    if !angle_bad && params.max_angle != 0.0 {
        /* signed cosine at the vertex opposite the longest edge, same
         * fixed tie order with max instead of min */
        let cos_max = if od2 >= da2 && od2 >= ao2 {
            ((org.x - apex.x) * (dest.x - apex.x) + (org.y - apex.y) * (dest.y - apex.y))
                / (ao2 * da2).sqrt()
        } else if da2 >= ao2 {
            ((dest.x - org.x) * (apex.x - org.x) + (dest.y - org.y) * (apex.y - org.y))
                / (od2 * ao2).sqrt()
        } else {
            ((org.x - dest.x) * (apex.x - dest.x) + (org.y - dest.y) * (apex.y - dest.y))
                / (od2 * da2).sqrt()
        };
        if cos_max < params.max_good_angle {
            angle_bad = true;
        }
    }

    if !angle_bad {
        return;
    }

    /* both shortest-edge endpoints on segments: the triangle may sit
     * between concentric shells around a shared segment endpoint and
     * would not improve by splitting */
    if mesh.vertex(base1).kind == VertexKind::SegmentVertex
        && mesh.vertex(base2).kind == VertexKind::SegmentVertex
    {
        let segment1 = containing_segment(mesh, tri1, base1);
        let segment2 = containing_segment(mesh, tri1.lnext(), base2);
        if let (Some((a1, b1)), Some((a2, b2))) = (segment1, segment2) {
            let joint = if a1 == a2 || a1 == b2 {
                Some(a1)
            } else if b1 == a2 || b1 == b2 {
                Some(b1)
            } else {
                None
            };
            if let Some(j) = joint {
                let shared = mesh.vertex(j);
                let d1 = distance(mesh.vertex(base1), shared);
                let d2 = distance(mesh.vertex(base2), shared);
                if d1 < 1.001 * d2 && d1 > 0.999 * d2 {
                    return;
                }
            }
        }
    }

    enqueue(flaws);
}

/* The endpoints of the whole constraining segment through `v`: pivot
 * clockwise around `v` from a handle whose origin is `v` until a
 * subsegment shows up, then walk its chain out to both ends. */
fn containing_segment(
    mesh: &Triangulation,
    start: Otri,
    v: VertexId,
) -> Option<(VertexId, VertexId)> {
    debug_assert_eq!(mesh.org(start), v);
    let mut handle = start;
    let mut guard = 0usize;
    loop {
        let s = mesh.seg_pivot(handle);
        if !s.is_dummy() {
            return Some((chain_end(mesh, s), chain_end(mesh, s.sym())));
        }
        handle = mesh.oprev(handle);
        guard += 1;
        if handle == start || guard > 4 * mesh.triangles.len() {
            return None;
        }
    }
}

/* Follows the subsegment chain from `s` past its destination until the
 * original segment runs out; returns the terminal vertex. */
fn chain_end(mesh: &Triangulation, s: Osub) -> VertexId {
    let mut current = s;
    let mut guard = 0usize;
    loop {
        let next = mesh.snext(current);
        guard += 1;
        if next.is_dummy() || guard > mesh.subsegs.len() {
            return mesh.sdest(current);
        }
        current = next;
    }
}

/**
 * Seeds the bad-triangle queue from every real triangle.
 */
pub fn tally_faces(mesh: &Triangulation, params: &RefineParams, flaws: &mut FlawBuffers) {
    for id in mesh.real_triangle_ids().collect::<Vec<_>>() {
        test_triangle(mesh, Otri::new(id, 0), params, flaws);
    }
}

/**
 * Splits one bad triangle: a Steiner point at the circumcenter (when
 * area constraints are active) or at the relocated off-center, with a
 * rollback when the insertion encroaches upon subsegments.
 */
pub fn split_triangle(
    mesh: &mut Triangulation,
    params: &RefineParams,
    flaws: &mut FlawBuffers,
    state: &mut RefineState,
    bad: &BadTriangle,
) -> Result<(), RefineError> {
    let t = bad.handle;

    /* stale entries are discarded silently */
    if mesh.tri_is_dead(t.tri)
        || mesh.org(t) != bad.org
        || mesh.dest(t) != bad.dest
        || mesh.apex(t) != bad.apex
    {
        return Ok(());
    }

    let org = mesh.vertex(bad.org).clone();
    let dest = mesh.vertex(bad.dest).clone();
    let apex = mesh.vertex(bad.apex).clone();

    /* the off-center relocation does not mix with area constraints;
     * those runs keep the plain circumcenter */
    let off_constant = if params.fixed_area || params.var_area || params.off_constant <= 0.0 {
        None
    } else {
        Some(params.off_constant)
    };

    let found = find_circumcenter(
        &org,
        &dest,
        &apex,
        off_constant,
        mesh.exact_arithmetic.get(),
    );
    let (x, y, xi, eta) = match found {
        Some(values) => values,
        None => {
            return Err(RefineError::PrecisionExhausted(format!(
                "degenerate triangle {} {} {}",
                org, dest, apex
            )));
        }
    };

    if (x == org.x && y == org.y) || (x == dest.x && y == dest.y) || (x == apex.x && y == apex.y) {
        log::error!(
            "New vertex ({}, {}) falls on an existing vertex of {} {} {}.",
            x,
            y,
            org,
            dest,
            apex
        );
        return Err(RefineError::PrecisionExhausted(format!(
            "the new vertex ({}, {}) coincides with a corner",
            x, y
        )));
    }

    let vertex = Vertex {
        x,
        y,
        attributes: org
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| a + xi * (dest.attributes[i] - a) + eta * (apex.attributes[i] - a))
            .collect(),
        mark: 0,
        kind: VertexKind::FreeVertex,
    };

    if params.verbose {
        log::debug!(
            "Splitting triangle {} {} {} at ({}, {}).",
            org,
            dest,
            apex,
            x,
            y
        );
    }

    /* start the point-location walk on an edge the new point lies to
     * the left of */
    let start = if eta < xi { t.lprev() } else { t };

    let (status, _) = vertices::insert_vertex(
        mesh,
        vertex,
        Some(start),
        None,
        params,
        Some(flaws),
        true,
        true,
    );
    match status {
        InsertStatus::Successful => {
            state.note_insertion();
        }
        InsertStatus::Encroaching => {
            /* the encroached subsegments stay queued; the vertex goes */
            mesh.undo_vertex();
        }
        InsertStatus::Violating => {
            /* the point fell on a subsegment, which was noted instead */
        }
        InsertStatus::Duplicate => {
            log::warn!("New vertex ({}, {}) falls on an existing vertex.", x, y);
            return Err(RefineError::PrecisionExhausted(format!(
                "the new vertex ({}, {}) duplicates an existing vertex",
                x, y
            )));
        }
    }
    return Ok(());
}


#[cfg(test)]
mod shell_exemption {
    use super::*;
    use crate::planar::refine_procedures::flaws::FlawBuffers;
    use crate::planar::triangulation_procedures::skeleton;

    /* `inner_radius` must be a power of two so the shell vertex lands
     * exactly on the segment */
    fn wedge_with_shells(inner_radius: f64) -> crate::planar::triangulation::Triangulation {
        let angle = (10.0f64).to_radians();
        skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(0.5, 0.0),
                Vertex::new(angle.cos(), angle.sin()),
                Vertex::new(inner_radius * angle.cos(), inner_radius * angle.sin()),
            ],
            &[(0, 1), (0, 3)],
            &[],
        )
    }

    fn tip_triangle(mesh: &crate::planar::triangulation::Triangulation) -> Otri {
        for id in mesh.real_triangle_ids() {
            let t = Otri::new(id, 0);
            let has_origin = [mesh.org(t), mesh.dest(t), mesh.apex(t)]
                .iter()
                .any(|&c| mesh.vertex(c).x == 0.0 && mesh.vertex(c).y == 0.0);
            if has_origin {
                return t;
            }
        }
        panic!("no triangle at the wedge tip");
    }

    #[test]
    fn test_equidistant_shells_are_spared() {
        let mesh = wedge_with_shells(0.5);
        let params = RefineParams::new(20.0);
        let mut flaws = FlawBuffers::new();

        test_triangle(&mesh, tip_triangle(&mesh), &params, &mut flaws);
        assert!(!flaws.has_triangles());
    }

    #[test]
    fn test_unequal_shells_are_condemned() {
        let mesh = wedge_with_shells(0.25);
        let params = RefineParams::new(20.0);
        let mut flaws = FlawBuffers::new();

        test_triangle(&mesh, tip_triangle(&mesh), &params, &mut flaws);
        assert!(flaws.has_triangles());
    }
}
