use crate::elements::subsegment::{Osub, SubsegData, SubsegId};
use crate::elements::triangle::{Otri, TriangleData, TriangleId, DUMMY_TRIANGLE};
use crate::elements::vertex::{Vertex, VertexId, VertexKind, GHOST_VERTEX};
use crate::properties::continence::non_regular;
use crate::properties::dot::dot;
use crate::properties::orientation::counterclockwise;

use std::cell::Cell;

/**
 * Where a point was found by `locate`.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Location {
    /* the handle's origin is the coincident vertex */
    OnVertex(Otri),
    InTriangle(Otri),
    /* the point lies on the handle's directed edge */
    OnEdge(Otri),
    /* the walk left the hull through the handle's ghost triangle */
    Outside(Otri),
    /* the walk was stopped by a subsegment on the handle's edge */
    Blocked(Otri),
}

/**
 * Arena-backed triangulation. Slot 0 of the triangle arena is the
 * sentinel dummy triangle, slot 0 of the subsegment arena the dummy
 * subsegment, and vertex 0 the ghost vertex. Ghost triangles (one per
 * hull edge, apex at the ghost vertex) keep neighbor adjacency total.
 */
pub struct Triangulation {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<TriangleData>,
    pub subsegs: Vec<SubsegData>,
    pub exact_arithmetic: Cell<bool>,
    pub check_quality: bool,
    pub(crate) recent: TriangleId,
    pub(crate) rollback: Option<super::triangulation_procedures::vertices::Rollback>,
    pub(crate) free_triangles: Vec<TriangleId>,
    pub(crate) free_subsegs: Vec<SubsegId>,
}

impl Triangulation {
    pub fn new() -> Self {
        let mut dummy_tri = TriangleData::new(GHOST_VERTEX, GHOST_VERTEX, GHOST_VERTEX);
        dummy_tri.dead = true;
        let mut dummy_sub = SubsegData::new(GHOST_VERTEX, GHOST_VERTEX, 0);
        dummy_sub.dead = true;

        Self {
            vertices: vec![Vertex::new_ghost()],
            triangles: vec![dummy_tri],
            subsegs: vec![dummy_sub],
            exact_arithmetic: Cell::new(true),
            check_quality: false,
            recent: DUMMY_TRIANGLE,
            rollback: None,
            free_triangles: Vec::new(),
            free_subsegs: Vec::new(),
        }
    }

    /* ---- vertices ---- */

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id]
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        self.vertices.push(vertex);
        return self.vertices.len() - 1;
    }

    pub fn live_vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (1..self.vertices.len()).filter(move |&id| self.vertices[id].kind != VertexKind::Undead)
    }

    /* ---- triangle topology ---- */

    pub fn org(&self, t: Otri) -> VertexId {
        self.triangles[t.tri].corners[(t.orient + 1) % 3]
    }

    pub fn dest(&self, t: Otri) -> VertexId {
        self.triangles[t.tri].corners[(t.orient + 2) % 3]
    }

    pub fn apex(&self, t: Otri) -> VertexId {
        self.triangles[t.tri].corners[t.orient]
    }

    pub fn sym(&self, t: Otri) -> Otri {
        self.triangles[t.tri].neighbors[t.orient]
    }

    /* Next edge counterclockwise around the origin. */
    pub fn onext(&self, t: Otri) -> Otri {
        self.sym(t.lprev())
    }

    /* Next edge clockwise around the origin. */
    pub fn oprev(&self, t: Otri) -> Otri {
        self.sym(t).lnext()
    }

    /* Next edge counterclockwise around the destination. */
    pub fn dnext(&self, t: Otri) -> Otri {
        self.sym(t).lprev()
    }

    pub fn seg_pivot(&self, t: Otri) -> Osub {
        self.triangles[t.tri].subsegs[t.orient]
    }

    pub fn tri_is_dead(&self, id: TriangleId) -> bool {
        self.triangles[id].dead
    }

    pub fn is_ghost(&self, t: Otri) -> bool {
        let corners = &self.triangles[t.tri].corners;
        return corners[0] == GHOST_VERTEX
            || corners[1] == GHOST_VERTEX
            || corners[2] == GHOST_VERTEX;
    }

    pub fn area_target(&self, id: TriangleId) -> f64 {
        self.triangles[id].area_target
    }

    /* Bond two triangle edges to each other. */
    pub fn bond(&mut self, t1: Otri, t2: Otri) {
        self.triangles[t1.tri].neighbors[t1.orient] = t2;
        self.triangles[t2.tri].neighbors[t2.orient] = t1;
    }

    /* Bond a subsegment side to a triangle edge. */
    pub fn sbond(&mut self, s: Osub, t: Otri) {
        self.subsegs[s.seg].triangles[s.orient] = t;
        self.triangles[t.tri].subsegs[t.orient] = s;
    }

    pub fn make_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) -> TriangleId {
        let data = TriangleData::new(a, b, c);
        match self.free_triangles.pop() {
            Some(id) => {
                self.triangles[id] = data;
                return id;
            }
            None => {
                self.triangles.push(data);
                return self.triangles.len() - 1;
            }
        }
    }

    /* Marks the slot dead. The caller decides when the slot may be
     * reused; see `retire_triangle`. */
    pub fn kill_triangle(&mut self, id: TriangleId) {
        self.triangles[id].dead = true;
    }

    pub fn retire_triangle(&mut self, id: TriangleId) {
        self.triangles[id].dead = true;
        self.free_triangles.push(id);
    }

    pub fn live_triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        (1..self.triangles.len()).filter(move |&id| !self.triangles[id].dead)
    }

    pub fn real_triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.live_triangle_ids()
            .filter(move |&id| !self.is_ghost(Otri::new(id, 0)))
    }

    /* ---- subsegments ---- */

    pub fn sorg(&self, s: Osub) -> VertexId {
        self.subsegs[s.seg].ends[s.orient]
    }

    pub fn sdest(&self, s: Osub) -> VertexId {
        self.subsegs[s.seg].ends[1 - s.orient]
    }

    /* The chained subsegment continuing beyond the destination. */
    pub fn snext(&self, s: Osub) -> Osub {
        self.subsegs[s.seg].links[s.orient]
    }

    /* The adjoining triangle aligned with this side. */
    pub fn stri(&self, s: Osub) -> Otri {
        self.subsegs[s.seg].triangles[s.orient]
    }

    pub fn sub_mark(&self, id: SubsegId) -> i32 {
        self.subsegs[id].mark
    }

    pub fn sub_is_dead(&self, id: SubsegId) -> bool {
        self.subsegs[id].dead
    }

    pub fn make_subseg(&mut self, org: VertexId, dest: VertexId, mark: i32) -> SubsegId {
        let data = SubsegData::new(org, dest, mark);
        match self.free_subsegs.pop() {
            Some(id) => {
                self.subsegs[id] = data;
                return id;
            }
            None => {
                self.subsegs.push(data);
                return self.subsegs.len() - 1;
            }
        }
    }

    pub fn kill_subseg(&mut self, id: SubsegId) {
        self.subsegs[id].dead = true;
    }

    pub fn retire_subseg(&mut self, id: SubsegId) {
        self.subsegs[id].dead = true;
        self.free_subsegs.push(id);
    }

    pub fn live_subseg_ids(&self) -> impl Iterator<Item = SubsegId> + '_ {
        (1..self.subsegs.len()).filter(move |&id| !self.subsegs[id].dead)
    }

    /* ---- predicates bound to the arena ---- */

    pub fn ccw(&self, a: VertexId, b: VertexId, c: VertexId) -> f64 {
        counterclockwise(
            self.vertex(a),
            self.vertex(b),
            self.vertex(c),
            self.exact_arithmetic.get(),
        )
    }

    pub fn in_circle(&self, a: VertexId, b: VertexId, c: VertexId, d: VertexId) -> f64 {
        non_regular(
            self.vertex(a),
            self.vertex(b),
            self.vertex(c),
            self.vertex(d),
            self.exact_arithmetic.get(),
        )
    }

    /* ---- point location ---- */

    /**
     * Straight-line walk toward `point` from `start` (or the most
     * recently created triangle). The walk refuses to step across a
     * subsegment and reports `Blocked` instead; leaving the hull
     * through a ghost triangle reports `Outside`.
     */
    pub fn locate(&self, point: &Vertex, start: Option<Otri>) -> Location {
        let mut current = match start {
            Some(t) if !self.tri_is_dead(t.tri) => t,
            _ => {
                let fallback = if self.recent != DUMMY_TRIANGLE && !self.tri_is_dead(self.recent)
                {
                    self.recent
                } else {
                    match self.live_triangle_ids().next() {
                        Some(id) => id,
                        None => return Location::Outside(Otri::dummy()),
                    }
                };
                Otri::new(fallback, 0)
            }
        };

        /* step inward if the start is a ghost */
        if self.is_ghost(current) {
            current = self.ghost_base(current);
            let inward = self.sym(current);
            if self.is_ghost(inward) {
                return Location::Outside(current);
            }
            current = inward;
        }

        let mut steps = 0usize;
        let limit = 4 * self.triangles.len() + 16;

        loop {
            steps += 1;
            if steps > limit {
                /* a walk this long means the structure is damaged */
                log::error!("Point location failed to terminate; the mesh may be inconsistent.");
                return Location::Outside(current);
            }

            /* exact coincidence with a corner */
            for orient in 0..3 {
                let h = Otri::new(current.tri, orient);
                let o = self.vertex(self.org(h));
                if o.x == point.x && o.y == point.y {
                    return Location::OnVertex(h);
                }
            }

            let mut worst: Option<(f64, Otri)> = None;
            let mut on_edge: Option<Otri> = None;
            let mut inside = true;

            for orient in 0..3 {
                let h = Otri::new(current.tri, orient);
                let det = counterclockwise(
                    self.vertex(self.org(h)),
                    self.vertex(self.dest(h)),
                    point,
                    self.exact_arithmetic.get(),
                );
                if det < 0.0 {
                    inside = false;
                    match worst {
                        Some((w, _)) if w <= det => {}
                        _ => worst = Some((det, h)),
                    }
                } else if det == 0.0 {
                    on_edge = Some(h);
                }
            }

            if inside {
                if let Some(h) = on_edge {
                    /* within the closed triangle and on one edge line;
                     * confirm the point is on the edge segment */
                    let o = self.vertex(self.org(h));
                    let d = self.vertex(self.dest(h));
                    if dot(o, d, o, point) >= 0.0 && dot(d, o, d, point) >= 0.0 {
                        return Location::OnEdge(h);
                    }
                }
                return Location::InTriangle(Otri::new(current.tri, 0));
            }

            let (_, exit_edge) = worst.unwrap();
            if !self.seg_pivot(exit_edge).is_dummy() {
                return Location::Blocked(exit_edge);
            }
            let neighbor = self.sym(exit_edge);
            if self.is_ghost(neighbor) {
                return Location::Outside(self.ghost_base(neighbor));
            }
            current = neighbor;
        }
    }

    /* The handle of a ghost triangle's finite (hull) edge. */
    pub fn ghost_base(&self, t: Otri) -> Otri {
        let corners = &self.triangles[t.tri].corners;
        for orient in 0..3 {
            if corners[orient] == GHOST_VERTEX {
                return Otri::new(t.tri, orient);
            }
        }
        return t;
    }

    /* ---- statistics ---- */

    /**
     * Smallest interior angle over all real triangles, in degrees.
     */
    pub fn smallest_angle(&self) -> f64 {
        let mut best = 180.0f64;
        for id in self.real_triangle_ids() {
            let t = Otri::new(id, 0);
            let corners = [self.org(t), self.dest(t), self.apex(t)];
            for i in 0..3 {
                let v = self.vertex(corners[i]);
                let p = self.vertex(corners[(i + 1) % 3]);
                let q = self.vertex(corners[(i + 2) % 3]);
                let num = dot(v, p, v, q);
                let den = (crate::properties::distance::distance2(v, p)
                    * crate::properties::distance::distance2(v, q))
                .sqrt();
                if den > 0.0 {
                    let angle = (num / den).max(-1.0).min(1.0).acos().to_degrees();
                    if angle < best {
                        best = angle;
                    }
                }
            }
        }
        return best;
    }
}


#[cfg(test)]
mod locate {
    use super::*;
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
    fn test_interior_point() {
        let mesh = unit_square();
        match mesh.locate(&Vertex::new(0.8, 0.1), None) {
            Location::InTriangle(t) => assert!(!mesh.is_ghost(t)),
            other => panic!("expected InTriangle, found {:?}", other),
        }
    }

    #[test]
    fn test_existing_vertex() {
        let mesh = unit_square();
        match mesh.locate(&Vertex::new(1.0, 1.0), None) {
            Location::OnVertex(t) => {
                let v = mesh.vertex(mesh.org(t));
                assert_eq!((v.x, v.y), (1.0, 1.0));
            }
            other => panic!("expected OnVertex, found {:?}", other),
        }
    }

    #[test]
    fn test_point_on_interior_edge() {
        let mesh = unit_square();
        /* both diagonals pass through the center, whichever the
         * Delaunay tie chose */
        match mesh.locate(&Vertex::new(0.5, 0.5), None) {
            Location::OnEdge(t) => {
                assert!(mesh.seg_pivot(t).is_dummy());
            }
            other => panic!("expected OnEdge, found {:?}", other),
        }
    }

    #[test]
    fn test_outside_point_is_blocked_by_the_hull() {
        let mesh = unit_square();
        match mesh.locate(&Vertex::new(3.0, 0.4), None) {
            Location::Blocked(t) => assert!(!mesh.seg_pivot(t).is_dummy()),
            other => panic!("expected Blocked, found {:?}", other),
        }
    }
}
