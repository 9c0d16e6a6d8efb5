extern crate nalgebra;

use crate::elements::vertex::Vertex;

use geometry_predicates::orient2d;
use nalgebra::Matrix3;

#[derive(PartialEq, Debug)]
pub enum Orientation {
    Counterclockwise,
    Clockwise,
    Colinear,
}

/**
 * Twice the signed area of (a, b, c): positive when the vertices wind
 * counterclockwise. The exact path runs Shewchuk's adaptive predicate;
 * the approximate path evaluates the determinant directly.
 */
pub fn counterclockwise(a: &Vertex, b: &Vertex, c: &Vertex, exact: bool) -> f64 {
    if exact {
        return orient2d([a.x, a.y], [b.x, b.y], [c.x, c.y]);
    }

    let matrix = Matrix3::new(a.x, a.y, 1.0, b.x, b.y, 1.0, c.x, c.y, 1.0);
    return matrix.determinant();
}

pub fn orientation(a: &Vertex, b: &Vertex, c: &Vertex, exact: bool) -> Orientation {
    let det = counterclockwise(a, b, c, exact);

    if det > 0.0 {
        return Orientation::Counterclockwise;
    } else if det < 0.0 {
        return Orientation::Clockwise;
    } else {
        return Orientation::Colinear;
    }
}
