use crate::elements::vertex::Vertex;
use crate::properties::orientation::counterclockwise;

/**
 * Circumcenter of the counterclockwise triangle (org, dest, apex),
 * together with the coordinates (xi, eta) of the center in the frame
 * spanned by the edges org->dest and org->apex, so that
 *
 *     center = org + xi * (dest - org) + eta * (apex - org)
 *
 * With `off_constant` set, the off-center relocation is applied: a
 * candidate point is placed on the bisector of the shortest edge at a
 * bounded distance, and replaces the circumcenter whenever it is
 * closer to that edge. Returns None for degenerate (colinear) corners.
 */
pub fn find_circumcenter(
    org: &Vertex,
    dest: &Vertex,
    apex: &Vertex,
    off_constant: Option<f64>,
    exact: bool,
) -> Option<(f64, f64, f64, f64)> {
    let xdo = dest.x - org.x;
    let ydo = dest.y - org.y;
    let xao = apex.x - org.x;
    let yao = apex.y - org.y;
    let xda = apex.x - dest.x;
    let yda = apex.y - dest.y;

    let dodist = xdo * xdo + ydo * ydo;
    let aodist = xao * xao + yao * yao;
    let dadist = xda * xda + yda * yda;

    let doubled_area = counterclockwise(org, dest, apex, exact);
    if doubled_area == 0.0 {
        return None;
    }
    let denominator = 0.5 / doubled_area;

    let mut dx = (yao * dodist - ydo * aodist) * denominator;
    let mut dy = (xdo * aodist - xao * dodist) * denominator;

    if let Some(off) = off_constant {
        if dodist < aodist && dodist < dadist {
            /* shortest edge is org->dest */
            let dxoff = 0.5 * xdo - off * ydo;
            let dyoff = 0.5 * ydo + off * xdo;
            if dxoff * dxoff + dyoff * dyoff < dx * dx + dy * dy {
                dx = dxoff;
                dy = dyoff;
            }
        } else if aodist < dadist {
            /* shortest edge is org->apex */
            let dxoff = 0.5 * xao + off * yao;
            let dyoff = 0.5 * yao - off * xao;
            if dxoff * dxoff + dyoff * dyoff < dx * dx + dy * dy {
                dx = dxoff;
                dy = dyoff;
            }
        } else {
            /* shortest edge is dest->apex; the candidate is offset from
             * the destination */
            let dxoff = 0.5 * xda - off * yda;
            let dyoff = 0.5 * yda + off * xda;
            if dxoff * dxoff + dyoff * dyoff
                < (dx - xdo) * (dx - xdo) + (dy - ydo) * (dy - ydo)
            {
                dx = xdo + dxoff;
                dy = ydo + dyoff;
            }
        }
    }

    let xi = (yao * dx - xao * dy) * (2.0 * denominator);
    let eta = (xdo * dy - ydo * dx) * (2.0 * denominator);

    return Some((org.x + dx, org.y + dy, xi, eta));
}


#[cfg(test)]
mod off_center {
    use super::*;

    /* off-center constant for a 20 degree minimum angle */
    fn off_20() -> f64 {
        let c = (20.0f64).to_radians().cos();
        return 0.475 * ((1.0 + c) / (1.0 - c)).sqrt();
    }

    #[test]
    fn test_relocation_pulls_toward_short_edge() {
        /* a sliver: very short edge org->dest and a distant apex, so
         * the circumcenter is far away and the off-center wins */
        let org = Vertex::new(0.0, 0.0);
        let dest = Vertex::new(0.1, 0.0);
        let apex = Vertex::new(0.05, 2.0);

        let (_, plain_y, _, _) = find_circumcenter(&org, &dest, &apex, None, true).unwrap();
        let (x, y, _, _) = find_circumcenter(&org, &dest, &apex, Some(off_20()), true).unwrap();

        assert!(y < plain_y);
        assert!((x - 0.05).abs() < 1.0e-12);
        assert!((y - 0.1 * off_20()).abs() < 1.0e-12);
    }

    #[test]
    fn test_relocation_keeps_circumcenter_when_closer() {
        /* near-equilateral: the circumcenter is already close */
        let org = Vertex::new(0.0, 0.0);
        let dest = Vertex::new(1.0, 0.0);
        let apex = Vertex::new(0.52, 0.87);

        let plain = find_circumcenter(&org, &dest, &apex, None, true).unwrap();
        let relocated = find_circumcenter(&org, &dest, &apex, Some(off_20()), true).unwrap();
        assert_eq!(plain, relocated);
    }
}
