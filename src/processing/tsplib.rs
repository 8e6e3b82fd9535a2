//! TSPLIB point-set writer and solver-solution reader
//!
//! The point-set layout and number rendering must match what the solver
//! has always been fed, byte for byte: coordinates use the `GEO` degree/minute
//! encoding and are printed like a C `%g` (six significant digits).

use crate::core::Coordinate;
use crate::processing::TourFileError;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Encode decimal degrees as TSPLIB `GEO`: whole degrees * 100 + minutes
pub fn to_geo(degrees: f64) -> f64 {
    let sign = if degrees < 0.0 { -1.0 } else { 1.0 };
    let magnitude = degrees.abs();
    let whole = magnitude.floor();
    let minutes = (magnitude - whole) * 60.0;
    sign * (whole * 100.0 + minutes)
}

/// Render a number the way C's `%g` does with the default precision of 6
pub fn format_general(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    // Exponent after rounding to the target precision
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = strip_trailing_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_trailing_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Render a TSPLIB `GEO` point-set
///
/// `name` is the point-set name and `source` the file it was generated from.
pub fn render_tsp(name: &str, source: &str, points: &[Coordinate]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "NAME: {}", name);
    let _ = writeln!(out, "TYPE: TSP");
    let _ = writeln!(out, "COMMENT: generated from {}", source);
    let _ = writeln!(out, "DIMENSION: {}", points.len());
    let _ = writeln!(out, "EDGE_WEIGHT_TYPE: GEO");
    let _ = writeln!(out, "NODE_COORD_SECTION");
    for (i, point) in points.iter().enumerate() {
        let _ = writeln!(
            out,
            "{} {} {}",
            i + 1,
            format_general(to_geo(point.latitude)),
            format_general(to_geo(point.longitude))
        );
    }
    let _ = writeln!(out, "EOF");
    out
}

/// Write a TSPLIB point-set file
pub fn write_tsp_file<P: AsRef<Path>>(
    path: P,
    name: &str,
    source: &str,
    points: &[Coordinate],
) -> Result<(), TourFileError> {
    let path = path.as_ref();
    fs::write(path, render_tsp(name, source, points)).map_err(|e| TourFileError::io(path, e))
}

/// Parse a solver solution: a point count followed by that many 0-based
/// indices forming a permutation of `0..expected`
pub fn parse_solution(content: &str, expected: usize) -> Result<Vec<usize>, TourFileError> {
    let mut tokens = content.split_whitespace();

    let count_token = tokens.next().ok_or(TourFileError::MissingCount)?;
    let count: usize = count_token.parse().map_err(|_| TourFileError::InvalidCount {
        token: count_token.to_string(),
    })?;
    if count != expected {
        return Err(TourFileError::CountMismatch {
            expected,
            found: count,
        });
    }

    let mut order = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    for token in tokens.take(count) {
        let index: usize = token.parse().map_err(|_| TourFileError::InvalidIndex {
            token: token.to_string(),
        })?;
        if index >= count {
            return Err(TourFileError::IndexOutOfRange { index, len: count });
        }
        if !seen.insert(index) {
            return Err(TourFileError::DuplicateIndex { index });
        }
        order.push(index);
    }

    if order.len() < count {
        return Err(TourFileError::TooFewIndices {
            expected: count,
            found: order.len(),
        });
    }
    Ok(order)
}

/// Read and validate a solution file
pub fn read_solution<P: AsRef<Path>>(path: P, expected: usize) -> Result<Vec<usize>, TourFileError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| TourFileError::io(path, e))?;
    parse_solution(&content, expected)
}
