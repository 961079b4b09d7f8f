use std::f64::consts::PI;

/// Split a units string into its optional numeric multiplier and the unit symbol.
///
/// Arguments
/// ---------
/// * `units`: a units string such as `"cm"`, `"10cm"` or `"0.5 m"`
///
/// Return
/// ------
/// * `(multiplier, symbol)`: the multiplier defaults to 1 when no number prefixes the symbol
fn split_multiplier(units: &str) -> (f64, &str) {
    let units = units.trim();
    let end = units
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == '+' || *c == '-'))
        .map(|(i, _)| i)
        .unwrap_or(units.len());

    let factor = units[..end].parse::<f64>().unwrap_or(1.0);
    (factor, units[end..].trim())
}

/// Factor converting a length expressed in `units` to meters.
///
/// Arguments
/// ---------
/// * `units`: the value of a field's `units` attribute
///
/// Return
/// ------
/// * The multiplicative factor to meters. Unknown units give `1.0`.
pub fn length_factor(units: &str) -> f64 {
    let (factor, symbol) = split_multiplier(units);
    let unit = match symbol {
        "" | "m" | "meter" | "meters" | "metre" | "metres" | "met" => 1.0,
        "cm" | "centim" | "centimeter" | "centimeters" | "cmeter" | "cmet" => 1e-2,
        "mm" | "millim" | "millimeter" | "millimeters" => 1e-3,
        "um" | "umet" | "umeter" | "umeters" | "micron" | "microns" => 1e-6,
        "in" | "inch" | "inches" => 0.0254,
        "ft" | "foot" | "feet" => 0.3048,
        _ => 1.0,
    };
    factor * unit
}

/// Factor converting an angle expressed in `units` to radians.
///
/// Arguments
/// ---------
/// * `units`: the value of a field's `units` attribute
///
/// Return
/// ------
/// * The multiplicative factor to radians. Unknown units give `1.0`.
pub fn angle_factor(units: &str) -> f64 {
    match units.trim() {
        "deg" | "degree" | "degrees" | "d" => PI / 180.0,
        _ => 1.0,
    }
}

/// Factor converting an electric charge expressed in `units` to picocoulombs.
pub fn charge_factor(units: &str) -> f64 {
    let (factor, symbol) = split_multiplier(units);
    let unit = match symbol {
        "C" | "coulomb" | "coulombs" | "Coulomb" => 1e12,
        "mC" | "millicoulomb" | "milliCoulomb" => 1e9,
        "uC" | "microcoulomb" | "microCoulomb" => 1e6,
        "nC" | "nanocoulomb" | "nanoCoulomb" => 1e3,
        _ => 1.0,
    };
    factor * unit
}

/// Factor converting a solid angle expressed in `units` to steradians.
pub fn solid_angle_factor(units: &str) -> f64 {
    let (factor, symbol) = split_multiplier(units);
    let unit = match symbol {
        "" | "sr" | "steradian" | "steradians" => 1.0,
        "msr" | "millisteradian" | "millisteradians" => 1e-3,
        "usr" | "microsteradian" | "microsteradians" => 1e-6,
        "deg2" | "deg^2" | "sq deg" | "square degree" | "square degrees" => {
            (PI / 180.0) * (PI / 180.0)
        }
        _ => 1.0,
    };
    factor * unit
}

/// Multiply every value by `factor` in place.
pub fn scale_in_place(values: &mut [f64], factor: f64) {
    if factor == 1.0 {
        return;
    }
    values.iter_mut().for_each(|v| *v *= factor);
}

/// Turn bin centres into bin boundaries.
///
/// The first boundary is `values[0] - offset`; every following boundary mirrors
/// the previous one around the next centre, so N centres yield N + 1 boundaries.
///
/// Arguments
/// ---------
/// * `values`: the bin centres read from an axis field
/// * `offset`: the value of the field's `histogram_offset` attribute
///
/// Return
/// ------
/// * The bin boundaries, or `values` unchanged when `offset` is zero, NaN or the input is empty
pub fn histogram_from_centres(values: Vec<f64>, offset: f64) -> Vec<f64> {
    if values.is_empty() || offset == 0.0 || offset.is_nan() {
        return values;
    }

    let mut left = values[0] - offset;
    let mut bounds = Vec::with_capacity(values.len() + 1);
    bounds.push(left);
    for centre in values {
        let right = 2.0 * centre - left;
        bounds.push(right);
        left = right;
    }
    bounds
}
