extern crate nalgebra;

use crate::elements::vertex::Vertex;

use geometry_predicates::incircle;
use nalgebra::Matrix4;

#[derive(PartialEq, Debug)]
pub enum Continence {
    Inside,
    Outside,
    Boundary,
}

/**
 * In-circle measure: positive when d lies strictly inside the
 * circumcircle of the counterclockwise triangle (a, b, c), negative
 * outside, zero on the circle. The exact path runs Shewchuk's adaptive
 * predicate.
 */
pub fn non_regular(a: &Vertex, b: &Vertex, c: &Vertex, d: &Vertex, exact: bool) -> f64 {
    if exact {
        return incircle([a.x, a.y], [b.x, b.y], [c.x, c.y], [d.x, d.y]);
    }

    let matrix = Matrix4::new(
        a.x, a.y, a.x.powi(2) + a.y.powi(2), 1.0,
        b.x, b.y, b.x.powi(2) + b.y.powi(2), 1.0,
        c.x, c.y, c.x.powi(2) + c.y.powi(2), 1.0,
        d.x, d.y, d.x.powi(2) + d.y.powi(2), 1.0,
    );
    return matrix.determinant();
}

pub fn continence(a: &Vertex, b: &Vertex, c: &Vertex, d: &Vertex, exact: bool) -> Continence {
    let det = non_regular(a, b, c, d, exact);

    if det > 0.0 {
        return Continence::Inside;
    } else if det < 0.0 {
        return Continence::Outside;
    } else {
        return Continence::Boundary;
    }
}
