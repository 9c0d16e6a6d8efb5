use crate::elements::triangle::Otri;
use crate::planar::triangulation::Triangulation;

/**
 * Topological sanity: every edge bond must be symmetric with matching
 * shared vertices, and every real triangle must wind counterclockwise.
 * Flaws are logged and counted; returns true when none was found.
 */
pub fn check_mesh(mesh: &Triangulation) -> bool {
    let saved = mesh.exact_arithmetic.get();
    mesh.exact_arithmetic.set(true);

    let mut horrors = 0usize;
    for id in mesh.live_triangle_ids() {
        let handle = Otri::new(id, 0);
        if !mesh.is_ghost(handle) {
            let det = mesh.ccw(mesh.org(handle), mesh.dest(handle), mesh.apex(handle));
            if det <= 0.0 {
                log::warn!("Triangle {} is degenerate or inverted.", id);
                horrors += 1;
            }
        }

        for orient in 0..3 {
            let edge = Otri::new(id, orient);
            let neighbor = mesh.sym(edge);
            if neighbor.is_dummy() {
                log::warn!("Triangle {} has an unbonded edge.", id);
                horrors += 1;
                continue;
            }
            if mesh.tri_is_dead(neighbor.tri) {
                log::warn!("Triangle {} abuts the dead triangle {}.", id, neighbor.tri);
                horrors += 1;
                continue;
            }
            if mesh.sym(neighbor) != edge {
                log::warn!(
                    "Asymmetric bond between triangles {} and {}.",
                    id,
                    neighbor.tri
                );
                horrors += 1;
            }
            if mesh.org(edge) != mesh.dest(neighbor) || mesh.dest(edge) != mesh.org(neighbor) {
                log::warn!(
                    "Mismatched edge coordinates between triangles {} and {}.",
                    id,
                    neighbor.tri
                );
                horrors += 1;
            }
        }
    }

    match horrors {
        0 => log::info!("The mesh topology appears to be consistent."),
        1 => log::warn!("Precisely one mesh inconsistency discovered."),
        n => log::warn!("{} mesh inconsistencies discovered.", n),
    }

    mesh.exact_arithmetic.set(saved);
    return horrors == 0;
}

/**
 * Local Delaunay verification: every interior unconstrained edge must
 * pass the in-circle test against the opposite apex. Edges bounded by
 * the ghost vertex and edges carrying a subsegment are exempt.
 * Returns true when no violation was found.
 */
pub fn check_delaunay(mesh: &Triangulation) -> bool {
    let saved = mesh.exact_arithmetic.get();
    mesh.exact_arithmetic.set(true);

    let mut horrors = 0usize;
    for id in mesh.real_triangle_ids() {
        for orient in 0..3 {
            let edge = Otri::new(id, orient);
            let neighbor = mesh.sym(edge);
            /* each interior edge once, from its lower-numbered side */
            if neighbor.tri < id || mesh.is_ghost(neighbor) {
                continue;
            }
            if !mesh.seg_pivot(edge).is_dummy() {
                continue;
            }
            let measure = mesh.in_circle(
                mesh.org(edge),
                mesh.dest(edge),
                mesh.apex(edge),
                mesh.apex(neighbor),
            );
            if measure > 0.0 {
                log::warn!(
                    "Non-Delaunay pair across the edge {} - {}.",
                    mesh.vertex(mesh.org(edge)),
                    mesh.vertex(mesh.dest(edge))
                );
                horrors += 1;
            }
        }
    }

    match horrors {
        0 => log::info!("The mesh is locally Delaunay."),
        1 => log::warn!("Precisely one non-Delaunay pair discovered."),
        n => log::warn!("{} non-Delaunay pairs discovered.", n),
    }

    mesh.exact_arithmetic.set(saved);
    return horrors == 0;
}
