use crate::elements::subsegment::{Osub, SubsegData, SubsegId};
use crate::elements::triangle::{Otri, TriangleData, TriangleId};
use crate::elements::vertex::{Vertex, VertexId, VertexKind};
use crate::planar::refine_params::RefineParams;
use crate::planar::refine_procedures::encroachment;
use crate::planar::refine_procedures::flaws::{BadSubseg, FlawBuffers};
use crate::planar::refine_procedures::triangle_split;
use crate::planar::triangulation::{Location, Triangulation};
use crate::properties::orientation::counterclockwise;

use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertStatus {
    Successful,
    Encroaching,
    Violating,
    Duplicate,
}

/**
 * Everything needed to revert the most recent insertion: the slots it
 * created, full snapshots of the records it destroyed or rewired, and
 * the vertex it introduced. Destroyed slots are not reused while a
 * rollback is armed.
 */
pub struct Rollback {
    pub vertex: VertexId,
    pub created_triangles: Vec<TriangleId>,
    pub killed_triangles: Vec<(TriangleId, TriangleData)>,
    pub touched_subsegs: Vec<(SubsegId, SubsegData)>,
    pub created_subsegs: Vec<SubsegId>,
}

impl Triangulation {
    /**
     * Reverts the most recent successful insertion. Does nothing when
     * no rollback is armed.
     */
    pub fn undo_vertex(&mut self) {
        let rollback = match self.rollback.take() {
            Some(rollback) => rollback,
            None => return,
        };

        for &id in rollback.created_triangles.iter() {
            self.retire_triangle(id);
        }
        for &id in rollback.created_subsegs.iter() {
            self.retire_subseg(id);
        }
        for (id, data) in rollback.killed_triangles.iter() {
            self.triangles[*id] = data.clone();
        }
        for (id, data) in rollback.touched_subsegs.iter() {
            self.subsegs[*id] = data.clone();
        }

        /* outward bonds are recomputed from the restored records */
        for (id, data) in rollback.killed_triangles.iter() {
            for orient in 0..3 {
                let neighbor = data.neighbors[orient];
                if !neighbor.is_dummy() {
                    self.triangles[neighbor.tri].neighbors[neighbor.orient] =
                        Otri::new(*id, orient);
                }
                let subseg = data.subsegs[orient];
                if !subseg.is_dummy() {
                    self.subsegs[subseg.seg].triangles[subseg.orient] = Otri::new(*id, orient);
                }
            }
        }

        self.vertices[rollback.vertex].kind = VertexKind::Undead;
        if let Some((id, _)) = rollback.killed_triangles.first() {
            self.recent = *id;
        }
    }

    /* Releases the armed rollback and lets its dead slots be reused. */
    pub(crate) fn commit_rollback(&mut self) {
        let rollback = match self.rollback.take() {
            Some(rollback) => rollback,
            None => return,
        };
        for (id, _) in rollback.killed_triangles.iter() {
            self.free_triangles.push(*id);
        }
        for (id, _) in rollback.touched_subsegs.iter() {
            if self.subsegs[*id].dead {
                self.free_subsegs.push(*id);
            }
        }
    }
}

/**
 * Inserts a vertex through constrained Bowyer-Watson: the conflict
 * region around the point is flooded by the strict in-circle test,
 * never crossing a subsegment, and retriangulated as a fan around the
 * new vertex. With `split_seg` the region covers both sides of the
 * subsegment, which is replaced by two chained halves; the aligned
 * first half is returned so the caller can walk both via `snext`.
 *
 * Returns `Violating` (nothing inserted) when the point falls on a
 * subsegment that was not meant to be split, `Duplicate` when it falls
 * on an existing vertex, and `Encroaching` when a subsegment shields
 * the point or ends up encroached once the fan is in place. Flaw
 * queues are fed when `segment_flaws`/`tri_flaws` ask for it.
 */
pub fn insert_vertex(
    mesh: &mut Triangulation,
    vertex: Vertex,
    start: Option<Otri>,
    split_seg: Option<Osub>,
    params: &RefineParams,
    flaws: Option<&mut FlawBuffers>,
    segment_flaws: bool,
    tri_flaws: bool,
) -> (InsertStatus, Option<Osub>) {
    let vertex_id = mesh.add_vertex(vertex);
    return insert_allocated(
        mesh,
        vertex_id,
        start,
        split_seg,
        params,
        flaws,
        segment_flaws,
        tri_flaws,
    );
}

pub(crate) fn insert_allocated(
    mesh: &mut Triangulation,
    vertex_id: VertexId,
    start: Option<Otri>,
    split_seg: Option<Osub>,
    params: &RefineParams,
    mut flaws: Option<&mut FlawBuffers>,
    segment_flaws: bool,
    tri_flaws: bool,
) -> (InsertStatus, Option<Osub>) {
    mesh.commit_rollback();

    let point = mesh.vertex(vertex_id).clone();
    let mut seeds: Vec<Otri> = Vec::new();

    if let Some(s) = split_seg {
        seeds.push(mesh.stri(s));
        seeds.push(mesh.stri(s.sym()));
    } else {
        match mesh.locate(&point, start) {
            Location::OnVertex(_) => {
                mesh.vertex_mut(vertex_id).kind = VertexKind::Undead;
                return (InsertStatus::Duplicate, None);
            }
            Location::InTriangle(t) => {
                seeds.push(t);
            }
            Location::OnEdge(t) => {
                let s = mesh.seg_pivot(t);
                if !s.is_dummy() {
                    /* the point falls on a constrained subsegment */
                    if segment_flaws {
                        note_subseg(mesh, s, params, flaws.as_deref_mut());
                    }
                    mesh.vertex_mut(vertex_id).kind = VertexKind::Undead;
                    return (InsertStatus::Violating, None);
                }
                seeds.push(t);
                seeds.push(mesh.sym(t));
            }
            Location::Outside(_) => {
                /* only reachable while the hull is still unconstrained:
                 * pick any hull ghost the point strictly conflicts with */
                match hull_seed(mesh, &point) {
                    Some(ghost) => seeds.push(ghost),
                    None => {
                        log::error!(
                            "Vertex {} is outside the hull and conflicts with no hull edge.",
                            point
                        );
                        mesh.vertex_mut(vertex_id).kind = VertexKind::Undead;
                        return (InsertStatus::Violating, None);
                    }
                }
            }
            Location::Blocked(edge) => {
                /* a subsegment shields the point; it must be split
                 * before anything can be placed here */
                let s = mesh.seg_pivot(edge);
                if segment_flaws {
                    note_subseg(mesh, s, params, flaws.as_deref_mut());
                }
                mesh.vertex_mut(vertex_id).kind = VertexKind::Undead;
                return (InsertStatus::Encroaching, None);
            }
        }
    }

    /* ---- conflict region ---- */

    struct BorderEdge {
        org: VertexId,
        dest: VertexId,
        outside: Otri,
        subseg: Osub,
    }

    let crossable = |mesh: &Triangulation, s: Osub| {
        s.is_dummy() || split_seg.map_or(false, |split| split.seg == s.seg)
    };

    let mut cavity: HashSet<TriangleId> = HashSet::new();
    let mut order: Vec<TriangleId> = Vec::new();
    let mut stack: Vec<TriangleId> = Vec::new();
    for seed in seeds.iter() {
        if !seed.is_dummy() && cavity.insert(seed.tri) {
            order.push(seed.tri);
            stack.push(seed.tri);
        }
    }

    let mut border: Vec<BorderEdge> = Vec::new();
    while let Some(id) = stack.pop() {
        for orient in 0..3 {
            let handle = Otri::new(id, orient);
            let subseg = mesh.seg_pivot(handle);
            let neighbor = mesh.sym(handle);

            if crossable(mesh, subseg) && cavity.contains(&neighbor.tri) {
                continue;
            }

            /* a subsegment is never crossed, and a candidate reached
             * around a segment tip is kept out when the opposite side
             * of one of its subsegments already conflicts: the region
             * must stay fannable around the new vertex */
            let mut admissible = crossable(mesh, subseg) && conflicts(mesh, neighbor, &point);
            if admissible {
                for other in 0..3 {
                    let edge = Otri::new(neighbor.tri, other);
                    let shield = mesh.seg_pivot(edge);
                    if !crossable(mesh, shield) && cavity.contains(&mesh.sym(edge).tri) {
                        admissible = false;
                        break;
                    }
                }
            }

            if admissible {
                cavity.insert(neighbor.tri);
                order.push(neighbor.tri);
                stack.push(neighbor.tri);
            } else {
                border.push(BorderEdge {
                    org: mesh.org(handle),
                    dest: mesh.dest(handle),
                    outside: neighbor,
                    subseg,
                });
            }
        }
    }

    let seed_target = order
        .iter()
        .find(|&&id| !mesh.is_ghost(Otri::new(id, 0)))
        .map(|&id| mesh.area_target(id))
        .unwrap_or(-1.0);

    /* ---- rollback snapshots ---- */

    let mut rollback = Rollback {
        vertex: vertex_id,
        created_triangles: Vec::new(),
        killed_triangles: Vec::new(),
        touched_subsegs: Vec::new(),
        created_subsegs: Vec::new(),
    };

    let mut touched: HashSet<SubsegId> = HashSet::new();
    for edge in border.iter() {
        if !edge.subseg.is_dummy() && touched.insert(edge.subseg.seg) {
            rollback
                .touched_subsegs
                .push((edge.subseg.seg, mesh.subsegs[edge.subseg.seg].clone()));
        }
    }
    if let Some(s) = split_seg {
        if touched.insert(s.seg) {
            rollback
                .touched_subsegs
                .push((s.seg, mesh.subsegs[s.seg].clone()));
        }
        for slot in 0..2 {
            let link = mesh.subsegs[s.seg].links[slot];
            if !link.is_dummy() && touched.insert(link.seg) {
                rollback
                    .touched_subsegs
                    .push((link.seg, mesh.subsegs[link.seg].clone()));
            }
        }
    }

    for &id in order.iter() {
        rollback
            .killed_triangles
            .push((id, mesh.triangles[id].clone()));
        mesh.kill_triangle(id);
    }

    /* ---- fan retriangulation ---- */

    let mut directed: HashMap<(VertexId, VertexId), Otri> = HashMap::new();
    for edge in border.iter() {
        let id = mesh.make_triangle(vertex_id, edge.org, edge.dest);
        mesh.triangles[id].area_target = seed_target;
        rollback.created_triangles.push(id);

        let base = Otri::new(id, 0);
        debug_assert!(!cavity.contains(&edge.outside.tri));
        mesh.bond(base, edge.outside);
        if !edge.subseg.is_dummy() {
            let aligned = if mesh.sorg(edge.subseg) == edge.org {
                edge.subseg
            } else {
                edge.subseg.sym()
            };
            mesh.sbond(aligned, base);
        }

        directed.insert((edge.dest, vertex_id), base.lnext());
        directed.insert((vertex_id, edge.org), base.lprev());
    }

    for (&(a, b), &handle) in directed.iter() {
        if a < b {
            if let Some(&partner) = directed.get(&(b, a)) {
                mesh.bond(handle, partner);
            }
        }
    }

    /* ---- split subsegment bookkeeping ---- */

    let mut first_half: Option<Osub> = None;
    if let Some(s) = split_seg {
        let e_org = mesh.sorg(s);
        let e_dest = mesh.sdest(s);
        let mark = mesh.sub_mark(s.seg);
        let link_beyond_dest = mesh.subsegs[s.seg].links[s.orient];
        let link_beyond_org = mesh.subsegs[s.seg].links[1 - s.orient];

        let s1 = mesh.make_subseg(e_org, vertex_id, mark);
        let s2 = mesh.make_subseg(vertex_id, e_dest, mark);
        rollback.created_subsegs.push(s1);
        rollback.created_subsegs.push(s2);

        mesh.subsegs[s1].links = [Osub::new(s2, 0), link_beyond_org];
        mesh.subsegs[s2].links = [link_beyond_dest, Osub::new(s1, 1)];

        /* rewire the chain neighbors of the dying subsegment */
        if !link_beyond_org.is_dummy() {
            relink(mesh, link_beyond_org.seg, s.seg, Osub::new(s1, 0));
        }
        if !link_beyond_dest.is_dummy() {
            relink(mesh, link_beyond_dest.seg, s.seg, Osub::new(s2, 1));
        }

        for &(org, dest, seg) in [(e_org, vertex_id, s1), (vertex_id, e_dest, s2)].iter() {
            if let Some(&handle) = directed.get(&(org, dest)) {
                mesh.sbond(Osub::new(seg, 0), handle);
            }
            if let Some(&handle) = directed.get(&(dest, org)) {
                mesh.sbond(Osub::new(seg, 1), handle);
            }
        }

        mesh.kill_subseg(s.seg);
        first_half = Some(Osub::new(s1, 0));
    }

    if let Some(&id) = rollback
        .created_triangles
        .iter()
        .find(|&&id| !mesh.is_ghost(Otri::new(id, 0)))
    {
        mesh.recent = id;
    }

    /* ---- flaw checks on the final topology ---- */

    let mut status = InsertStatus::Successful;
    if segment_flaws {
        for &sid in touched.iter() {
            if mesh.sub_is_dead(sid) {
                continue;
            }
            let (_, noted) =
                encroachment::check_subseg(mesh, Osub::new(sid, 0), params, flaws.as_deref_mut());
            if noted {
                status = InsertStatus::Encroaching;
            }
        }
    }

    if mesh.check_quality && tri_flaws {
        if let Some(buffers) = flaws.as_deref_mut() {
            for &id in rollback.created_triangles.iter() {
                let t = Otri::new(id, 0);
                if !mesh.is_ghost(t) {
                    triangle_split::test_triangle(mesh, t, params, buffers);
                }
            }
        }
    }

    mesh.rollback = Some(rollback);
    return (status, first_half);
}

/* Enqueues a subsegment standing in the way of an insertion, honoring
 * the boundary split policy. */
fn note_subseg(
    mesh: &Triangulation,
    s: Osub,
    params: &RefineParams,
    flaws: Option<&mut FlawBuffers>,
) {
    let buffers = match flaws {
        Some(buffers) => buffers,
        None => return,
    };
    let near = mesh.stri(s);
    let far = mesh.stri(s.sym());
    let boundary = near.is_dummy()
        || far.is_dummy()
        || mesh.is_ghost(near)
        || mesh.is_ghost(far);
    let suppressed = match params.no_bisect {
        0 => false,
        1 => boundary,
        _ => true,
    };
    if suppressed {
        return;
    }
    buffers.enqueue_subseg(BadSubseg {
        handle: s,
        org: mesh.sorg(s),
        dest: mesh.sdest(s),
    });
}

/* Replaces the link of `seg` that referenced `old` with `with`. */
fn relink(mesh: &mut Triangulation, seg: SubsegId, old: SubsegId, with: Osub) {
    for slot in 0..2 {
        if mesh.subsegs[seg].links[slot].seg == old {
            mesh.subsegs[seg].links[slot] = with;
        }
    }
}

/* Whether the triangle is in conflict with the point: strict in-circle
 * for real triangles, strictly-outside-the-hull for ghosts. */
fn conflicts(mesh: &Triangulation, t: Otri, point: &Vertex) -> bool {
    if t.is_dummy() {
        return false;
    }
    if mesh.is_ghost(t) {
        let base = mesh.ghost_base(t);
        let det = counterclockwise(
            mesh.vertex(mesh.org(base)),
            mesh.vertex(mesh.dest(base)),
            point,
            mesh.exact_arithmetic.get(),
        );
        return det > 0.0;
    }
    let corners = &mesh.triangles[t.tri].corners;
    let det = crate::properties::continence::non_regular(
        mesh.vertex(corners[0]),
        mesh.vertex(corners[1]),
        mesh.vertex(corners[2]),
        point,
        mesh.exact_arithmetic.get(),
    );
    return det > 0.0;
}

/* Any hull ghost the point strictly conflicts with. */
fn hull_seed(mesh: &Triangulation, point: &Vertex) -> Option<Otri> {
    for id in mesh.live_triangle_ids() {
        let t = Otri::new(id, 0);
        if mesh.is_ghost(t) && conflicts(mesh, t, point) {
            return Some(t);
        }
    }
    return None;
}

/**
 * Deletes the origin of `handle`, a free vertex whose star contains no
 * ghost triangle and no incident subsegment, and retriangulates the
 * star polygon by the empty-circumcircle ear rule.
 */
pub fn delete_vertex(mesh: &mut Triangulation, handle: Otri) {
    mesh.commit_rollback();

    let victim = mesh.org(handle);
    debug_assert_eq!(mesh.vertex(victim).kind, VertexKind::FreeVertex);

    /* walk the star counterclockwise */
    let mut ring: Vec<VertexId> = Vec::new();
    let mut outside: Vec<Otri> = Vec::new();
    let mut outer_subsegs: Vec<Osub> = Vec::new();
    let mut star: Vec<TriangleId> = Vec::new();

    let mut current = handle;
    loop {
        debug_assert!(mesh.seg_pivot(current).is_dummy());
        debug_assert!(!mesh.is_ghost(current));
        star.push(current.tri);
        ring.push(mesh.dest(current));
        let outer = current.lnext();
        outside.push(mesh.sym(outer));
        outer_subsegs.push(mesh.seg_pivot(outer));
        current = mesh.onext(current);
        if current == handle {
            break;
        }
    }

    let target = mesh.area_target(star[0]);
    for &id in star.iter() {
        mesh.retire_triangle(id);
    }
    mesh.vertex_mut(victim).kind = VertexKind::Undead;

    /* triangulate the star polygon */
    let mut faces: Vec<[VertexId; 3]> = Vec::new();
    triangulate_ring(mesh, &ring, &mut faces);

    let mut directed: HashMap<(VertexId, VertexId), Otri> = HashMap::new();
    for face in faces.iter() {
        let id = mesh.make_triangle(face[0], face[1], face[2]);
        mesh.triangles[id].area_target = target;
        for orient in 0..3 {
            let h = Otri::new(id, orient);
            directed.insert((mesh.org(h), mesh.dest(h)), h);
        }
        mesh.recent = id;
    }

    for (&(a, b), &h) in directed.iter() {
        if a < b {
            if let Some(&partner) = directed.get(&(b, a)) {
                mesh.bond(h, partner);
            }
        }
    }

    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let inner = directed[&(a, b)];
        mesh.bond(inner, outside[i]);
        if !outer_subsegs[i].is_dummy() {
            let s = outer_subsegs[i];
            let aligned = if mesh.sorg(s) == a { s } else { s.sym() };
            mesh.sbond(aligned, inner);
        }
    }
}

/* Recursive empty-circumcircle triangulation of a star polygon ring
 * given in counterclockwise order. */
fn triangulate_ring(mesh: &Triangulation, ring: &[VertexId], faces: &mut Vec<[VertexId; 3]>) {
    if ring.len() < 3 {
        return;
    }
    if ring.len() == 3 {
        faces.push([ring[0], ring[1], ring[2]]);
        return;
    }

    let mut best = 2;
    for i in 3..ring.len() {
        if mesh.in_circle(ring[0], ring[1], ring[best], ring[i]) > 0.0 {
            best = i;
        }
    }
    faces.push([ring[0], ring[1], ring[best]]);

    triangulate_ring(mesh, &ring[1..=best], faces);

    let mut rest: Vec<VertexId> = Vec::with_capacity(ring.len() - best + 1);
    rest.push(ring[0]);
    rest.extend_from_slice(&ring[best..]);
    triangulate_ring(mesh, &rest, faces);
}

#[cfg(test)]
mod insertion {
    use super::*;
    use crate::planar::refine_procedures::consistency::{check_delaunay, check_mesh};
    use crate::planar::triangulation_procedures::skeleton;

    fn unit_square() -> Triangulation {
        skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(1.0, 1.0),
                Vertex::new(0.0, 1.0),
            ],
            &[],
            &[],
        )
    }

    #[test]
    fn test_interior_insertion() {
        let mut mesh = unit_square();
        let params = RefineParams::default();

        let (status, half) = insert_vertex(
            &mut mesh,
            Vertex::new(0.6, 0.2),
            None,
            None,
            &params,
            None,
            false,
            false,
        );

        assert_eq!(status, InsertStatus::Successful);
        assert!(half.is_none());
        assert_eq!(mesh.real_triangle_ids().count(), 4);
        assert!(check_mesh(&mesh));
        assert!(check_delaunay(&mesh));
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut mesh = unit_square();
        let params = RefineParams::default();
        let triangles_before = mesh.real_triangle_ids().count();

        let (status, _) = insert_vertex(
            &mut mesh,
            Vertex::new(1.0, 1.0),
            None,
            None,
            &params,
            None,
            false,
            false,
        );

        assert_eq!(status, InsertStatus::Duplicate);
        assert_eq!(mesh.real_triangle_ids().count(), triangles_before);
        assert!(check_mesh(&mesh));
    }

    #[test]
    fn test_point_on_subsegment_is_violating() {
        let mut mesh = unit_square();
        let params = RefineParams::default();

        let (status, _) = insert_vertex(
            &mut mesh,
            Vertex::new(0.5, 0.0),
            None,
            None,
            &params,
            None,
            true,
            false,
        );

        assert_eq!(status, InsertStatus::Violating);
        assert_eq!(mesh.real_triangle_ids().count(), 2);
        assert!(check_mesh(&mesh));
    }
}

#[cfg(test)]
mod undo {
    use super::*;
    use crate::planar::refine_procedures::consistency::{check_delaunay, check_mesh};
    use crate::planar::triangulation_procedures::skeleton;

    #[test]
    fn test_undo_restores_the_previous_mesh() {
        let mut mesh = skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(1.0, 1.0),
                Vertex::new(0.0, 1.0),
            ],
            &[],
            &[],
        );
        let params = RefineParams::default();

        let live_before: Vec<_> = mesh.live_triangle_ids().collect();
        let subsegs_before = mesh.live_subseg_ids().count();

        let mut vertex = Vertex::new(0.3, 0.4);
        vertex.kind = VertexKind::FreeVertex;
        let (status, _) =
            insert_vertex(&mut mesh, vertex, None, None, &params, None, false, false);
        assert_eq!(status, InsertStatus::Successful);
        assert_ne!(mesh.live_triangle_ids().count(), live_before.len());

        mesh.undo_vertex();

        let live_after: Vec<_> = mesh.live_triangle_ids().collect();
        assert_eq!(live_after, live_before);
        assert_eq!(mesh.live_subseg_ids().count(), subsegs_before);
        assert_eq!(mesh.vertices.last().unwrap().kind, VertexKind::Undead);
        assert!(check_mesh(&mesh));
        assert!(check_delaunay(&mesh));
    }

    #[test]
    fn test_undo_without_insertion_is_a_no_op() {
        let mut mesh = skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(2.0, 0.0),
                Vertex::new(0.0, 2.0),
            ],
            &[],
            &[],
        );
        let count = mesh.live_triangle_ids().count();
        mesh.undo_vertex();
        assert_eq!(mesh.live_triangle_ids().count(), count);
        assert!(check_mesh(&mesh));
    }
}
