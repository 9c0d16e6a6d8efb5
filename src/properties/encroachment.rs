use crate::elements::vertex::Vertex;
use crate::properties::distance::distance2;

/**
 * Opening measure of the angle the segment (e0, e1) subtends at `apex`:
 * the dot product (e0 - apex) . (e1 - apex). Negative exactly when the
 * apex sees the segment under more than a right angle, i.e. when the
 * apex lies strictly inside the diametral circle.
 */
pub fn diametral_dot(e0: &Vertex, e1: &Vertex, apex: &Vertex) -> f64 {
    (e0.x - apex.x) * (e1.x - apex.x) + (e0.y - apex.y) * (e1.y - apex.y)
}

/**
 * Whether `apex` encroaches upon the segment (e0, e1). With
 * `conform_del` the test is the plain diametral circle (Ruppert);
 * otherwise the diametral lens: the apex angle must exceed
 * 180 degrees minus twice the minimum angle, where
 * `good_angle = cos^2(min_angle)`.
 */
pub fn is_encroached(
    e0: &Vertex,
    e1: &Vertex,
    apex: &Vertex,
    good_angle: f64,
    conform_del: bool,
) -> bool {
    let d = diametral_dot(e0, e1, apex);
    if d >= 0.0 {
        return false;
    }
    if conform_del {
        return true;
    }
    return d * d >= (2.0 * good_angle - 1.0).powi(2) * distance2(e0, apex) * distance2(e1, apex);
}


#[cfg(test)]
mod diametral_lens {
    use super::*;

    /* good_angle for a 30 degree minimum-angle bound: the lens only
     * admits apexes seeing the segment under at least 120 degrees */
    fn good_angle_30() -> f64 {
        let c = (30.0f64).to_radians().cos();
        return c * c;
    }

    #[test]
    fn test_lens_is_narrower_than_circle() {
        let e0 = Vertex::new(0.0, 0.0);
        let e1 = Vertex::new(2.0, 0.0);

        /* apex angle near 149 degrees: inside the lens */
        let near = Vertex::new(1.0, 0.28);
        assert!(is_encroached(&e0, &e1, &near, good_angle_30(), false));

        /* apex angle near 118 degrees: inside the circle but outside
         * the lens */
        let far = Vertex::new(1.0, 0.6);
        assert!(is_encroached(&e0, &e1, &far, 1.0, true));
        assert!(!is_encroached(&e0, &e1, &far, good_angle_30(), false));
    }
}
