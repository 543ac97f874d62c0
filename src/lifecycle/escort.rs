use crate::models::booking::Dimensions;

// Texas oversize limits beyond which a pilot-car escort is mandatory.
pub const MAX_UNESCORTED_LENGTH_FT: f64 = 110.0;
pub const MAX_UNESCORTED_WIDTH_FT: f64 = 14.0;
pub const MAX_UNESCORTED_HEIGHT_FT: f64 = 17.0;

pub fn escort_required(dims: &Dimensions) -> bool {
    dims.length_ft > MAX_UNESCORTED_LENGTH_FT
        || dims.width_ft > MAX_UNESCORTED_WIDTH_FT
        || dims.height_ft > MAX_UNESCORTED_HEIGHT_FT
}

/// The shipper may opt into an escort voluntarily, but can never opt out of
/// one the dimensions force.
pub fn resolve_escort_flag(requested: bool, dims: &Dimensions) -> bool {
    requested || escort_required(dims)
}

#[cfg(test)]
mod tests {
    use super::{escort_required, resolve_escort_flag};
    use crate::models::booking::Dimensions;

    fn dims(length_ft: f64, width_ft: f64, height_ft: f64) -> Dimensions {
        Dimensions {
            length_ft,
            width_ft,
            height_ft,
        }
    }

    #[test]
    fn length_over_110_forces_escort_even_when_other_dims_fit() {
        assert!(escort_required(&dims(120.0, 10.0, 10.0)));
    }

    #[test]
    fn width_and_height_thresholds_each_trigger_alone() {
        assert!(escort_required(&dims(50.0, 14.5, 10.0)));
        assert!(escort_required(&dims(50.0, 10.0, 17.5)));
    }

    #[test]
    fn limits_are_exclusive_bounds() {
        assert!(!escort_required(&dims(110.0, 14.0, 17.0)));
    }

    #[test]
    fn within_limits_needs_no_escort() {
        assert!(!escort_required(&dims(80.0, 8.5, 13.5)));
    }

    #[test]
    fn voluntary_escort_request_is_honored() {
        assert!(resolve_escort_flag(true, &dims(40.0, 8.0, 10.0)));
    }

    #[test]
    fn forced_escort_cannot_be_declined() {
        assert!(resolve_escort_flag(false, &dims(120.0, 10.0, 10.0)));
    }
}
