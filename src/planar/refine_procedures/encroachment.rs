use crate::elements::subsegment::Osub;
use crate::elements::vertex::{Vertex, VertexKind};
use crate::planar::refine_params::RefineParams;
use crate::planar::refine_procedures::flaws::{BadSubseg, FlawBuffers};
use crate::planar::refine_procedures::quality::{RefineError, RefineState};
use crate::planar::triangulation::Triangulation;
use crate::planar::triangulation_procedures::vertices::{self, InsertStatus};
use crate::properties::distance::{distance, distance2};
use crate::properties::encroachment::{diametral_dot, is_encroached};
use crate::properties::orientation::counterclockwise;

/**
 * Tests one subsegment against the apexes of its adjoining triangles.
 * Returns the encroached-sides bitmask (bit 0: the handle's side,
 * bit 1: the opposite side) and whether an entry was enqueued, which
 * the boundary policy `no_bisect` may suppress: 1 keeps subsegments
 * with a missing neighbor, 2 or more keeps all of them.
 */
pub fn check_subseg(
    mesh: &Triangulation,
    s: Osub,
    params: &RefineParams,
    flaws: Option<&mut FlawBuffers>,
) -> (u8, bool) {
    let e_org = mesh.vertex(mesh.sorg(s)).clone();
    let e_dest = mesh.vertex(mesh.sdest(s)).clone();

    let mut sides = 0u8;
    let mut boundary = false;

    let near = mesh.stri(s);
    if near.is_dummy() || mesh.is_ghost(near) {
        boundary = true;
    } else {
        let apex = mesh.vertex(mesh.apex(near));
        if is_encroached(&e_org, &e_dest, apex, params.good_angle, params.conform_del) {
            sides |= 1;
        }
    }

    let far = mesh.stri(s.sym());
    if far.is_dummy() || mesh.is_ghost(far) {
        boundary = true;
    } else {
        let apex = mesh.vertex(mesh.apex(far));
        if is_encroached(&e_org, &e_dest, apex, params.good_angle, params.conform_del) {
            sides |= 2;
        }
    }

    if sides == 0 {
        return (0, false);
    }

    let suppressed = match params.no_bisect {
        0 => false,
        1 => boundary,
        _ => true,
    };
    if suppressed {
        return (sides, false);
    }

    if let Some(buffers) = flaws {
        /* enqueue through the first encroaching side */
        let bad = if sides & 1 != 0 {
            BadSubseg {
                handle: s,
                org: mesh.sorg(s),
                dest: mesh.sdest(s),
            }
        } else {
            BadSubseg {
                handle: s.sym(),
                org: mesh.sdest(s),
                dest: mesh.sorg(s),
            }
        };
        buffers.enqueue_subseg(bad);
    }
    return (sides, true);
}

/**
 * Seeds the bad-subsegment queue from every live subsegment.
 */
pub fn tally_encroached(mesh: &Triangulation, params: &RefineParams, flaws: &mut FlawBuffers) {
    for id in mesh.live_subseg_ids().collect::<Vec<_>>() {
        check_subseg(mesh, Osub::new(id, 0), params, Some(flaws));
    }
}

/**
 * Drains the bad-subsegment queue, splitting each live entry at its
 * midpoint or, near acute endpoints, on a concentric power-of-two
 * shell. Stops when the queue is empty or the Steiner allowance runs
 * out.
 */
pub fn split_encroached(
    mesh: &mut Triangulation,
    params: &RefineParams,
    flaws: &mut FlawBuffers,
    state: &mut RefineState,
    tri_flaws: bool,
) -> Result<(), RefineError> {
    while state.steiner_left != 0 {
        let bad = match flaws.dequeue_subseg() {
            Some(bad) => bad,
            None => break,
        };
        let s = bad.handle;

        /* stale entries are discarded silently */
        if mesh.sub_is_dead(s.seg) || mesh.sorg(s) != bad.org || mesh.sdest(s) != bad.dest {
            continue;
        }

        let (acute_org, acute_dest) = endpoint_acuteness(mesh, s);

        /* Chew's variant clears free vertices out of the diametral
         * circle before a midpoint split */
        if !params.conform_del && !acute_org && !acute_dest {
            clear_diametral_apexes(mesh, s);
        }

        let e_org = mesh.vertex(bad.org).clone();
        let e_dest = mesh.vertex(bad.dest).clone();
        let split = split_parameter(distance(&e_org, &e_dest), acute_org, acute_dest);

        let mut vertex = Vertex {
            x: e_org.x + split * (e_dest.x - e_org.x),
            y: e_org.y + split * (e_dest.y - e_org.y),
            attributes: e_org
                .attributes
                .iter()
                .zip(e_dest.attributes.iter())
                .map(|(a, b)| a + split * (b - a))
                .collect(),
            mark: mesh.sub_mark(s.seg),
            kind: VertexKind::SegmentVertex,
        };

        /* one step of collinearity refinement with the exact predicate */
        if !params.no_exact {
            let measure = counterclockwise(&e_org, &e_dest, &vertex, true)
                / distance2(&e_org, &e_dest);
            if measure.is_finite() && measure != 0.0 {
                vertex.x += measure * (e_dest.y - e_org.y);
                vertex.y += measure * (e_org.x - e_dest.x);
            }
        }

        if (vertex.x == e_org.x && vertex.y == e_org.y)
            || (vertex.x == e_dest.x && vertex.y == e_dest.y)
        {
            log::error!(
                "Ran out of precision splitting the subsegment {} - {}.",
                e_org,
                e_dest
            );
            return Err(RefineError::PrecisionExhausted(format!(
                "the split point of {} - {} coincides with an endpoint",
                e_org, e_dest
            )));
        }

        if params.verbose {
            log::debug!("Splitting subsegment {} - {} at {}.", e_org, e_dest, split);
        }

        let start = mesh.stri(s);
        let (status, first_half) = vertices::insert_vertex(
            mesh,
            vertex,
            Some(start),
            Some(s),
            params,
            Some(flaws),
            true,
            tri_flaws,
        );
        match status {
            InsertStatus::Successful | InsertStatus::Encroaching => {}
            _ => {
                return Err(RefineError::PrecisionExhausted(format!(
                    "unexpected status {:?} while splitting {} - {}",
                    status, e_org, e_dest
                )));
            }
        }
        state.note_insertion();

        /* re-test the two new halves */
        if let Some(half) = first_half {
            check_subseg(mesh, half, params, Some(flaws));
            let second = mesh.snext(half);
            if !second.is_dummy() {
                check_subseg(mesh, second, params, Some(flaws));
            }
        }
    }
    return Ok(());
}

/**
 * An endpoint is acute when another subsegment meets the segment
 * there, detected by pivoting around both adjoining triangles.
 */
pub fn endpoint_acuteness(mesh: &Triangulation, s: Osub) -> (bool, bool) {
    let mut acute_org = false;
    let mut acute_dest = false;

    let near = mesh.stri(s);
    if !near.is_dummy() {
        /* edge touching the destination, then the origin */
        acute_dest |= !mesh.seg_pivot(near.lnext()).is_dummy();
        acute_org |= !mesh.seg_pivot(near.lnext().lnext()).is_dummy();
    }

    let far = mesh.stri(s.sym());
    if !far.is_dummy() {
        /* on the far side the origin comes first */
        acute_org |= !mesh.seg_pivot(far.lnext()).is_dummy();
        acute_dest |= !mesh.seg_pivot(far.lnext().lnext()).is_dummy();
    }

    return (acute_org, acute_dest);
}

/**
 * The split parameter along org -> dest: the midpoint away from acute
 * endpoints, otherwise the power of two nearest half the length so
 * successive splits land on common concentric shells.
 */
pub fn split_parameter(length: f64, acute_org: bool, acute_dest: bool) -> f64 {
    if !acute_org && !acute_dest {
        return 0.5;
    }

    let mut nearest_power_of_two = 1.0f64;
    while length > 3.0 * nearest_power_of_two {
        nearest_power_of_two *= 2.0;
    }
    while length < 1.5 * nearest_power_of_two {
        nearest_power_of_two *= 0.5;
    }

    let mut split = nearest_power_of_two / length;
    if acute_dest && !acute_org {
        split = 1.0 - split;
    }
    return split;
}

/* Deletes every free-vertex apex strictly inside the diametral circle,
 * on both sides of the subsegment. */
fn clear_diametral_apexes(mesh: &mut Triangulation, s: Osub) {
    for side in [s, s.sym()].iter() {
        loop {
            let t = mesh.stri(*side);
            if t.is_dummy() || mesh.is_ghost(t) {
                break;
            }
            let apex_id = mesh.apex(t);
            let apex = mesh.vertex(apex_id);
            if apex.kind != VertexKind::FreeVertex {
                break;
            }
            let e_org = mesh.vertex(mesh.sorg(*side));
            let e_dest = mesh.vertex(mesh.sdest(*side));
            if diametral_dot(e_org, e_dest, apex) >= 0.0 {
                break;
            }
            /* the handle with the apex at its origin */
            vertices::delete_vertex(mesh, t.lprev());
        }
    }
}

#[cfg(test)]
mod split_parameter {
    use super::*;

    #[test]
    fn test_midpoint_without_acute_endpoints() {
        assert_eq!(split_parameter(7.3, false, false), 0.5);
    }

    #[test]
    fn test_power_of_two_shell() {
        /* length 0.76: the nearest power of two in [L/3, 2L/3] is 0.5 */
        let split = split_parameter(0.76, true, false);
        assert!(float_cmp::approx_eq!(f64, split * 0.76, 0.5, epsilon = 1.0e-12));
    }

    #[test]
    fn test_shell_bounds() {
        /* the split always lands within [1/3, 2/3] of the segment */
        for &length in [0.2, 0.5, 1.0, 1.7, 2.9, 12.0, 1000.0].iter() {
            let split = split_parameter(length, true, false);
            assert!(split >= 1.0 / 3.0 - 1.0e-12);
            assert!(split <= 2.0 / 3.0 + 1.0e-12);
            /* and the org-side piece is an exact power of two */
            let piece: f64 = split * length;
            let log = piece.log2();
            assert!((log - log.round()).abs() < 1.0e-9);
        }
    }

    #[test]
    fn test_acute_destination_mirrors_the_split() {
        let toward_org = split_parameter(0.76, true, false);
        let toward_dest = split_parameter(0.76, false, true);
        assert!(float_cmp::approx_eq!(
            f64,
            toward_dest,
            1.0 - toward_org,
            epsilon = 1.0e-12
        ));
    }

    #[test]
    fn test_both_acute_splits_from_origin() {
        assert_eq!(split_parameter(2.0, true, true), 0.5);
        let split = split_parameter(2.5, true, true);
        assert!(float_cmp::approx_eq!(f64, split * 2.5, 1.0, epsilon = 1.0e-12));
    }
}

#[cfg(test)]
mod check_subseg {
    use super::*;
    use crate::planar::refine_procedures::flaws::FlawBuffers;
    use crate::planar::triangulation_procedures::skeleton;

    /* a shallow triangle whose apex sees the base under ~127 degrees */
    fn shallow_wedge() -> Triangulation {
        skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(2.0, 0.0),
                Vertex::new(1.0, 0.5),
            ],
            &[],
            &[],
        )
    }

    fn base_of(mesh: &Triangulation) -> Osub {
        let id = mesh
            .live_subseg_ids()
            .find(|&id| {
                let s = Osub::new(id, 0);
                mesh.vertex(mesh.sorg(s)).y == 0.0 && mesh.vertex(mesh.sdest(s)).y == 0.0
            })
            .unwrap();
        Osub::new(id, 0)
    }

    #[test]
    fn test_ruppert_sees_the_diametral_circle() {
        let mesh = shallow_wedge();
        let mut params = RefineParams::new(20.0);
        params.conform_del = true;
        let mut flaws = FlawBuffers::new();

        let (sides, noted) = check_subseg(&mesh, base_of(&mesh), &params, Some(&mut flaws));
        assert_ne!(sides, 0);
        assert!(noted);
        assert!(flaws.has_subsegs());
    }

    #[test]
    fn test_chew_lens_is_stricter() {
        let mesh = shallow_wedge();
        let params = RefineParams::new(20.0);
        let mut flaws = FlawBuffers::new();

        /* 127 degrees is under the 140 degree lens threshold */
        let (sides, noted) = check_subseg(&mesh, base_of(&mesh), &params, Some(&mut flaws));
        assert_eq!(sides, 0);
        assert!(!noted);
        assert!(!flaws.has_subsegs());
    }

    #[test]
    fn test_no_bisect_suppresses_the_queue() {
        let mesh = shallow_wedge();
        let mut params = RefineParams::new(20.0);
        params.conform_del = true;
        params.no_bisect = 2;
        let mut flaws = FlawBuffers::new();

        let (sides, noted) = check_subseg(&mesh, base_of(&mesh), &params, Some(&mut flaws));
        assert_ne!(sides, 0);
        assert!(!noted);
        assert!(!flaws.has_subsegs());
    }
}

#[cfg(test)]
mod acuteness {
    use super::*;
    use crate::planar::triangulation_procedures::skeleton;

    #[test]
    fn test_triangle_corners_are_acute() {
        let mesh = skeleton::build(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(2.0, 0.0),
                Vertex::new(1.0, 0.5),
            ],
            &[],
            &[],
        );
        for id in mesh.live_subseg_ids().collect::<Vec<_>>() {
            let (acute_org, acute_dest) = endpoint_acuteness(&mesh, Osub::new(id, 0));
            assert!(acute_org);
            assert!(acute_dest);
        }
    }
}
