use crate::elements::subsegment::Osub;
use crate::elements::triangle::Otri;
use crate::elements::vertex::{Vertex, VertexId, VertexKind, GHOST_VERTEX};
use crate::planar::refine_params::RefineParams;
use crate::planar::triangulation::Triangulation;
use crate::planar::triangulation_procedures::vertices;
use crate::properties::dot::dot;

use std::collections::HashMap;

/**
 * Builds the constrained Delaunay triangulation of a planar
 * straight-line graph: incremental Bowyer-Watson insertion over ghost
 * triangles, then segment recovery by flipping crossed edges, then
 * subsegment records with boundary marks. Convex-hull edges always
 * become subsegments; endpoints of subsegments are typed
 * `SegmentVertex`.
 *
 * `segments` holds index pairs into `vertices`; `segment_marks` may be
 * empty or parallel to `segments`.
 */
pub fn build(
    vertices: Vec<Vertex>,
    segments: &[(usize, usize)],
    segment_marks: &[i32],
) -> Triangulation {
    if vertices.len() < 3 {
        panic!("A triangulation needs at least 3 input vertices.");
    }
    if !segment_marks.is_empty() && segment_marks.len() != segments.len() {
        panic!("segment_marks must be empty or parallel to segments.");
    }
    let nextras = vertices[0].attributes.len();
    if vertices.iter().any(|v| v.attributes.len() != nextras) {
        panic!("Every input vertex must carry the same number of attributes.");
    }

    let mut mesh = Triangulation::new();

    /* allocate, deduplicating exact coordinate repeats */
    let mut seen: HashMap<[(u64, i16, i8); 2], VertexId> = HashMap::new();
    let mut ids: Vec<VertexId> = Vec::with_capacity(vertices.len());
    for vertex in vertices.into_iter() {
        let key = vertex.coordinate_key();
        match seen.get(&key) {
            Some(&existing) => {
                log::warn!("Duplicate input vertex {}; reusing the earlier one.", vertex);
                ids.push(existing);
            }
            None => {
                let id = mesh.add_vertex(vertex);
                seen.insert(key, id);
                ids.push(id);
            }
        }
    }

    let distinct: Vec<VertexId> = {
        let mut list: Vec<VertexId> = Vec::new();
        for &id in ids.iter() {
            if !list.contains(&id) {
                list.push(id);
            }
        }
        list
    };
    if distinct.len() < 3 {
        panic!("A triangulation needs at least 3 distinct input vertices.");
    }

    /* first non-degenerate triple seeds the triangulation */
    let a = distinct[0];
    let b = distinct[1];
    let mut third = None;
    for &candidate in distinct[2..].iter() {
        if mesh.ccw(a, b, candidate) != 0.0 {
            third = Some(candidate);
            break;
        }
    }
    let c = match third {
        Some(c) => c,
        None => panic!("All input vertices are colinear."),
    };
    let (a, b) = if mesh.ccw(a, b, c) > 0.0 { (a, b) } else { (b, a) };
    seed_triangle(&mut mesh, a, b, c);

    let params = RefineParams::default();
    for &id in distinct.iter() {
        if id == a || id == b || id == c {
            continue;
        }
        let (status, _) =
            vertices::insert_allocated(&mut mesh, id, None, None, &params, None, false, false);
        if status != vertices::InsertStatus::Successful {
            log::warn!(
                "Input vertex {} was not inserted ({:?}).",
                mesh.vertex(id),
                status
            );
        }
    }
    mesh.commit_rollback();

    /* constrain the input segments */
    for (index, &(i, j)) in segments.iter().enumerate() {
        let org = ids[i];
        let dest = ids[j];
        if org == dest {
            log::warn!("Skipping degenerate input segment {} -> {}.", i, j);
            continue;
        }
        let mark = if segment_marks.is_empty() {
            0
        } else {
            segment_marks[index]
        };
        insert_segment(&mut mesh, org, dest, mark);
    }

    /* the convex hull is always constrained */
    mark_hull(&mut mesh);

    /* endpoints of constrained subsegments lie on segments */
    for id in mesh.live_subseg_ids().collect::<Vec<_>>() {
        let s = Osub::new(id, 0);
        let org = mesh.sorg(s);
        let dest = mesh.sdest(s);
        mesh.vertex_mut(org).kind = VertexKind::SegmentVertex;
        mesh.vertex_mut(dest).kind = VertexKind::SegmentVertex;
    }

    return mesh;
}

/**
 * Applies one global area target to every real triangle, for runs that
 * honor per-triangle constraints.
 */
pub fn set_uniform_area_target(mesh: &mut Triangulation, target: f64) {
    for id in mesh.live_triangle_ids().collect::<Vec<_>>() {
        mesh.triangles[id].area_target = target;
    }
}

/* The first real triangle and its three ghosts. */
fn seed_triangle(mesh: &mut Triangulation, a: VertexId, b: VertexId, c: VertexId) {
    let real = mesh.make_triangle(a, b, c);
    let g_ab = mesh.make_triangle(b, a, GHOST_VERTEX);
    let g_bc = mesh.make_triangle(c, b, GHOST_VERTEX);
    let g_ca = mesh.make_triangle(a, c, GHOST_VERTEX);

    /* real edges against ghost bases */
    mesh.bond(Otri::new(real, 2), Otri::new(g_ab, 2));
    mesh.bond(Otri::new(real, 0), Otri::new(g_bc, 2));
    mesh.bond(Otri::new(real, 1), Otri::new(g_ca, 2));

    /* ghosts against each other around the hull */
    mesh.bond(Otri::new(g_ab, 1), Otri::new(g_bc, 0));
    mesh.bond(Otri::new(g_bc, 1), Otri::new(g_ca, 0));
    mesh.bond(Otri::new(g_ca, 1), Otri::new(g_ab, 0));

    mesh.recent = real;
}

/**
 * Makes the edge (org, dest) an edge of the triangulation and bonds a
 * subsegment record to it. Input vertices sitting on the segment split
 * the constraint into collinear pieces, and edges crossing it are
 * flipped away.
 */
fn insert_segment(mesh: &mut Triangulation, org: VertexId, dest: VertexId, mark: i32) {
    /* a vertex on the open segment splits the constraint */
    if let Some(between) = vertex_between(mesh, org, dest) {
        insert_segment(mesh, org, between, mark);
        insert_segment(mesh, between, dest, mark);
        return;
    }

    let mut guard = 0usize;
    while find_edge(mesh, org, dest).is_none() {
        guard += 1;
        if guard > 4 * mesh.triangles.len() + 16 {
            panic!("Failed to recover an input segment; is the input a valid PSLG?");
        }
        let crossing = match find_crossing_edge(mesh, org, dest) {
            Some(t) => t,
            None => panic!("Failed to recover an input segment; is the input a valid PSLG?"),
        };
        if !mesh.seg_pivot(crossing).is_dummy() {
            panic!("Two input segments cross each other.");
        }
        flip(mesh, crossing);
    }

    let forward = find_edge(mesh, org, dest).unwrap();
    if !mesh.seg_pivot(forward).is_dummy() {
        /* duplicate input segment */
        return;
    }
    let backward = mesh.sym(forward);
    let seg = mesh.make_subseg(org, dest, mark);
    mesh.sbond(Osub::new(seg, 0), forward);
    mesh.sbond(Osub::new(seg, 1), backward);
}

/* A live vertex strictly inside the open segment (org, dest), if any. */
fn vertex_between(mesh: &Triangulation, org: VertexId, dest: VertexId) -> Option<VertexId> {
    let o = mesh.vertex(org).clone();
    let d = mesh.vertex(dest).clone();
    for id in mesh.live_vertex_ids() {
        if id == org || id == dest {
            continue;
        }
        let v = mesh.vertex(id);
        if mesh.ccw(org, dest, id) != 0.0 {
            continue;
        }
        if dot(&o, &d, &o, v) > 0.0 && dot(&d, &o, &d, v) > 0.0 {
            return Some(id);
        }
    }
    return None;
}

/* The directed edge (org, dest), if it exists. */
fn find_edge(mesh: &Triangulation, org: VertexId, dest: VertexId) -> Option<Otri> {
    for id in mesh.live_triangle_ids() {
        for orient in 0..3 {
            let t = Otri::new(id, orient);
            if mesh.org(t) == org && mesh.dest(t) == dest {
                return Some(t);
            }
        }
    }
    return None;
}

/* A flippable edge properly crossing the open segment (org, dest). */
fn find_crossing_edge(mesh: &Triangulation, org: VertexId, dest: VertexId) -> Option<Otri> {
    for id in mesh.real_triangle_ids() {
        for orient in 0..3 {
            let t = Otri::new(id, orient);
            let u = mesh.org(t);
            let v = mesh.dest(t);
            if u == org || u == dest || v == org || v == dest {
                continue;
            }
            let d1 = mesh.ccw(org, dest, u);
            let d2 = mesh.ccw(org, dest, v);
            let d3 = mesh.ccw(u, v, org);
            let d4 = mesh.ccw(u, v, dest);
            if d1 * d2 >= 0.0 || d3 * d4 >= 0.0 {
                continue;
            }
            if mesh.is_ghost(mesh.sym(t)) {
                continue;
            }
            /* flippable only when the surrounding quad is convex */
            let w1 = mesh.apex(t);
            let w2 = mesh.apex(mesh.sym(t));
            if mesh.ccw(u, w2, w1) > 0.0 && mesh.ccw(w2, v, w1) > 0.0 {
                return Some(t);
            }
        }
    }
    return None;
}

/**
 * Replaces the edge of `t` with the opposite diagonal of the
 * surrounding quadrilateral.
 */
fn flip(mesh: &mut Triangulation, t: Otri) {
    let mate = mesh.sym(t);
    let id1 = t.tri;
    let id2 = mate.tri;

    let u = mesh.org(t);
    let v = mesh.dest(t);
    let w1 = mesh.apex(t);
    let w2 = mesh.apex(mate);

    /* surrounding bonds to restore afterwards */
    let n_vw1 = mesh.sym(t.lnext());
    let s_vw1 = mesh.seg_pivot(t.lnext());
    let n_w1u = mesh.sym(t.lprev());
    let s_w1u = mesh.seg_pivot(t.lprev());
    let n_uw2 = mesh.sym(mate.lnext());
    let s_uw2 = mesh.seg_pivot(mate.lnext());
    let n_w2v = mesh.sym(mate.lprev());
    let s_w2v = mesh.seg_pivot(mate.lprev());

    let target1 = mesh.area_target(id1);
    let target2 = mesh.area_target(id2);

    mesh.triangles[id1] = crate::elements::triangle::TriangleData::new(u, w2, w1);
    mesh.triangles[id2] = crate::elements::triangle::TriangleData::new(w2, v, w1);
    mesh.triangles[id1].area_target = target1;
    mesh.triangles[id2].area_target = target2;

    /* the new diagonal */
    mesh.bond(Otri::new(id1, 0), Otri::new(id2, 1));

    rebond(mesh, Otri::new(id1, 1), n_w1u, s_w1u); /* w1 -> u  */
    rebond(mesh, Otri::new(id1, 2), n_uw2, s_uw2); /* u  -> w2 */
    rebond(mesh, Otri::new(id2, 0), n_vw1, s_vw1); /* v  -> w1 */
    rebond(mesh, Otri::new(id2, 2), n_w2v, s_w2v); /* w2 -> v  */
}

fn rebond(mesh: &mut Triangulation, inner: Otri, outer: Otri, subseg: Osub) {
    mesh.bond(inner, outer);
    if !subseg.is_dummy() {
        let aligned = if mesh.sorg(subseg) == mesh.org(inner) {
            subseg
        } else {
            subseg.sym()
        };
        mesh.sbond(aligned, inner);
    }
}

/* Bonds a mark-1 subsegment to every hull edge that is not already
 * constrained. */
fn mark_hull(mesh: &mut Triangulation) {
    let ghost_ids: Vec<_> = mesh
        .live_triangle_ids()
        .filter(|&id| mesh.is_ghost(Otri::new(id, 0)))
        .collect();
    for id in ghost_ids {
        let base = mesh.ghost_base(Otri::new(id, 0));
        if !mesh.seg_pivot(base).is_dummy() {
            continue;
        }
        let real = mesh.sym(base);
        let org = mesh.org(real);
        let dest = mesh.dest(real);
        let seg = mesh.make_subseg(org, dest, 1);
        mesh.sbond(Osub::new(seg, 0), real);
        mesh.sbond(Osub::new(seg, 1), base);
    }
}
