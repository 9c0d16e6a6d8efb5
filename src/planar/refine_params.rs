use crate::elements::vertex::Vertex;

/**
 * A user-supplied veto: called with the corners and area of each
 * triangle; returning true condemns the triangle to be split.
 */
pub type UserTest = Box<dyn Fn(&Vertex, &Vertex, &Vertex, f64) -> bool>;

/**
 * Immutable configuration of one refinement run. Construct through
 * `new` (or `Default`) so the derived constants `good_angle`,
 * `max_good_angle` and `off_constant` stay consistent with the angle
 * bounds; the remaining fields may be set directly.
 */
pub struct RefineParams {
    /* lower bound on the smallest angle, degrees; 0 disables */
    pub min_angle: f64,
    /* upper bound on the largest angle, degrees; 0 disables */
    pub max_angle: f64,
    /* cos^2 of min_angle */
    pub good_angle: f64,
    /* cos of (180 - 2 * max_angle) degrees */
    pub max_good_angle: f64,
    /* off-center relocation constant derived from min_angle */
    pub off_constant: f64,
    pub fixed_area: bool,
    pub max_area: f64,
    pub var_area: bool,
    pub usertest: Option<UserTest>,
    /* Ruppert's diametral circles instead of Chew's diametral lenses */
    pub conform_del: bool,
    /* 0: split freely; 1: keep boundary subsegments with a missing
     * neighbor; 2 or more: never split subsegments */
    pub no_bisect: u8,
    /* -1: unlimited; otherwise the Steiner point allowance */
    pub steiner_limit: i64,
    pub verbose: bool,
    /* skip the exact-arithmetic refinement of new segment points */
    pub no_exact: bool,
}

impl RefineParams {
    pub fn new(min_angle: f64) -> Self {
        let cosine = min_angle.to_radians().cos();
        let off_constant = if min_angle > 0.0 {
            0.475 * ((1.0 + cosine) / (1.0 - cosine)).sqrt()
        } else {
            0.0
        };

        Self {
            min_angle,
            max_angle: 0.0,
            good_angle: cosine * cosine,
            max_good_angle: 0.0,
            off_constant,
            fixed_area: false,
            max_area: 0.0,
            var_area: false,
            usertest: None,
            conform_del: false,
            no_bisect: 0,
            steiner_limit: -1,
            verbose: false,
            no_exact: false,
        }
    }

    pub fn with_max_angle(mut self, max_angle: f64) -> Self {
        self.max_angle = max_angle;
        self.max_good_angle = if max_angle == 0.0 {
            0.0
        } else {
            (180.0 - 2.0 * max_angle).to_radians().cos()
        };
        return self;
    }

    pub fn with_max_area(mut self, max_area: f64) -> Self {
        self.fixed_area = true;
        self.max_area = max_area;
        return self;
    }
}

impl Default for RefineParams {
    fn default() -> Self {
        RefineParams::new(0.0)
    }
}

#[cfg(test)]
mod derived_constants {
    use super::*;

    #[test]
    fn test_good_angle_is_squared_cosine() {
        let params = RefineParams::new(20.0);
        let cosine = (20.0f64).to_radians().cos();
        assert!(float_cmp::approx_eq!(
            f64,
            params.good_angle,
            cosine * cosine,
            epsilon = 1.0e-14
        ));
    }

    #[test]
    fn test_zero_min_angle_disables_everything() {
        let params = RefineParams::new(0.0);
        assert_eq!(params.good_angle, 1.0);
        assert_eq!(params.off_constant, 0.0);
        assert_eq!(params.steiner_limit, -1);
    }

    #[test]
    fn test_max_good_angle_is_signed() {
        let params = RefineParams::new(20.0).with_max_angle(140.0);
        /* 180 - 280 = -100 degrees; cos(-100 deg) is negative */
        assert!(params.max_good_angle < 0.0);
        assert!(float_cmp::approx_eq!(
            f64,
            params.max_good_angle,
            (-100.0f64).to_radians().cos(),
            epsilon = 1.0e-14
        ));
    }

    #[test]
    fn test_area_builder() {
        let params = RefineParams::new(20.0).with_max_area(0.1);
        assert!(params.fixed_area);
        assert_eq!(params.max_area, 0.1);
    }
}
