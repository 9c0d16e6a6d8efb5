use crate::planar::refine_params::RefineParams;
use crate::planar::refine_procedures::flaws::FlawBuffers;
use crate::planar::refine_procedures::{encroachment, triangle_split};
use crate::planar::triangulation::Triangulation;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefineError {
    /* a split point coincided with an existing vertex, or an insertion
     * came back with a status a segment split cannot recover from */
    #[error("precision exhausted: {0}")]
    PrecisionExhausted(String),
}

/**
 * Outcome of a completed refinement run.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RefineReport {
    pub steiner_points: usize,
}

/**
 * Mutable bookkeeping of one run: the remaining Steiner allowance
 * (-1 unlimited, never below zero) and the number of points inserted.
 */
pub struct RefineState {
    pub steiner_left: i64,
    pub inserted: usize,
}

impl RefineState {
    pub fn new(steiner_limit: i64) -> Self {
        Self {
            steiner_left: steiner_limit,
            inserted: 0,
        }
    }

    pub fn note_insertion(&mut self) {
        self.inserted += 1;
        if self.steiner_left > 0 {
            self.steiner_left -= 1;
        }
    }
}

/**
 * Refines the triangulation until every subsegment is unencroached and
 * every triangle meets the quality targets, or the Steiner allowance
 * runs out. Subsegments are always fixed to completion before any
 * triangle is split; when a triangle split introduces encroachments,
 * the triangle is re-enqueued and the subsegments are drained first.
 */
pub fn enforce_quality(
    mesh: &mut Triangulation,
    params: &RefineParams,
) -> Result<RefineReport, RefineError> {
    let mut flaws = FlawBuffers::new();
    let mut state = RefineState::new(params.steiner_limit);

    encroachment::tally_encroached(mesh, params, &mut flaws);
    encroachment::split_encroached(mesh, params, &mut flaws, &mut state, false)?;

    if params.min_angle > 0.0
        || params.var_area
        || params.fixed_area
        || params.usertest.is_some()
    {
        triangle_split::tally_faces(mesh, params, &mut flaws);
        mesh.check_quality = true;

        while flaws.has_triangles() && state.steiner_left != 0 {
            let bad = flaws.dequeue_triangle().unwrap();
            triangle_split::split_triangle(mesh, params, &mut flaws, &mut state, &bad)?;

            if flaws.has_subsegs() {
                /* retry the triangle once the subsegments are clean */
                flaws.enqueue_triangle(bad);
                encroachment::split_encroached(mesh, params, &mut flaws, &mut state, true)?;
            }
        }
    }

    if params.verbose && params.conform_del && flaws.has_subsegs() {
        log::warn!("The Steiner allowance ran out with encroached subsegments left over.");
    }

    mesh.commit_rollback();
    return Ok(RefineReport {
        steiner_points: state.inserted,
    });
}


#[cfg(test)]
mod accounting {
    use super::*;
    use crate::elements::vertex::{Vertex, VertexKind};
    use crate::planar::refine_procedures::consistency::check_mesh;
    use crate::planar::triangulation_procedures::skeleton;

    #[test]
    fn test_steiner_allowance_bounds_the_insertions() {
        let mut mesh = skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(1.0, 1.0),
                Vertex::new(0.0, 1.0),
            ],
            &[(0, 2)],
            &[],
        );
        let live_before = mesh.live_vertex_ids().count();

        let mut params = RefineParams::new(20.0).with_max_area(0.01);
        params.steiner_limit = 7;

        let report = enforce_quality(&mut mesh, &params).unwrap();

        assert!(report.steiner_points <= 7);
        let live_after = mesh.live_vertex_ids().count();
        assert_eq!(live_after - live_before, report.steiner_points);
        assert!(check_mesh(&mesh));
    }

    #[test]
    fn test_segment_split_attributes_stay_linear() {
        /* one attribute equal to x + 2y on every input vertex */
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let vertices = corners
            .iter()
            .map(|&(x, y)| Vertex::with_attributes(x, y, vec![x + 2.0 * y]))
            .collect();
        let mut mesh = skeleton::build(vertices, &[(0, 2)], &[]);

        let mut params = RefineParams::new(20.0).with_max_area(0.05);
        params.steiner_limit = 1000;
        enforce_quality(&mut mesh, &params).unwrap();

        for id in mesh.live_vertex_ids() {
            let v = mesh.vertex(id);
            if v.kind != VertexKind::SegmentVertex {
                continue;
            }
            assert!(
                (v.attributes[0] - (v.x + 2.0 * v.y)).abs() < 1.0e-9,
                "attribute drifted at ({}, {})",
                v.x,
                v.y
            );
        }
    }
}
