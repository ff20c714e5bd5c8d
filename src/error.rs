//! Error taxonomy for the crate's fallible construction paths.
//!
//! Errors surface at the API boundary where a violation first becomes
//! detectable (raster construction, gradient construction, SVG path
//! parsing). Rendering itself never fails; a path with out-of-range
//! vertices produces an invalid [`crate::polygon_mask::PolygonMask`]
//! that renders transparent instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A canvas rectangle field is outside the supported range
    /// (left/top in [-32768, 32767], width/height in [1, 32767]).
    #[error("bounds {field} out of range [{min}..{max}]: {value}")]
    BoundsViolation {
        field: &'static str,
        min: i32,
        max: i32,
        value: i32,
    },

    /// A radial gradient radius would overflow the fixed-point
    /// evaluation (|radius| must be in (0, 32767]).
    #[error("radial gradient radius out of range (0..=32767]: {0}")]
    RadiusOverflow(f64),

    /// SVG path data failed to parse.
    #[error(transparent)]
    SvgPath(#[from] SvgPathError),
}

/// Parse failure for SVG path-data strings, naming the command at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SvgPathError {
    #[error("SVG path must begin with 'M'")]
    MissingInitialMove,

    /// A recognized command had malformed or out-of-range arguments.
    #[error("invalid '{0}' syntax in SVG path data")]
    BadCommandSyntax(char),

    /// A character that is not a path-data command.
    #[error("invalid command '{0}' in SVG path data")]
    UnknownCommand(char),
}

/// Validate a destination canvas rectangle per the supported coordinate
/// ranges: left/top in [-32768, 32767], width/height in [1, 32767].
pub fn check_canvas_bounds(bounds: &crate::basics::IntRect) -> Result<()> {
    let field = |field, min, max, value| Error::BoundsViolation {
        field,
        min,
        max,
        value,
    };
    if bounds.left < -32768 || bounds.left >= 32768 {
        return Err(field("left", -32768, 32767, bounds.left));
    }
    if bounds.top < -32768 || bounds.top >= 32768 {
        return Err(field("top", -32768, 32767, bounds.top));
    }
    if bounds.width <= 0 || bounds.width >= 32768 {
        return Err(field("width", 1, 32767, bounds.width));
    }
    if bounds.height <= 0 || bounds.height >= 32768 {
        return Err(field("height", 1, 32767, bounds.height));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::IntRect;

    #[test]
    fn test_check_canvas_bounds_accepts_valid() {
        assert!(check_canvas_bounds(&IntRect::new(-32768, -32768, 32767, 32767)).is_ok());
        assert!(check_canvas_bounds(&IntRect::new(0, 0, 1, 1)).is_ok());
    }

    #[test]
    fn test_check_canvas_bounds_rejects_bad_fields() {
        assert!(matches!(
            check_canvas_bounds(&IntRect::new(-32769, 0, 10, 10)),
            Err(Error::BoundsViolation { field: "left", .. })
        ));
        assert!(matches!(
            check_canvas_bounds(&IntRect::new(0, 40000, 10, 10)),
            Err(Error::BoundsViolation { field: "top", .. })
        ));
        assert!(matches!(
            check_canvas_bounds(&IntRect::new(0, 0, 0, 10)),
            Err(Error::BoundsViolation { field: "width", .. })
        ));
        assert!(matches!(
            check_canvas_bounds(&IntRect::new(0, 0, 10, -1)),
            Err(Error::BoundsViolation { field: "height", .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let e = check_canvas_bounds(&IntRect::new(0, 0, 0, 10)).unwrap_err();
        assert_eq!(e.to_string(), "bounds width out of range [1..32767]: 0");
        assert_eq!(
            Error::from(SvgPathError::BadCommandSyntax('L')).to_string(),
            "invalid 'L' syntax in SVG path data"
        );
    }
}
