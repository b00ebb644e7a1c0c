use herdguard_core::GateError;

/// Parse a resource quantity such as `"2"`, `"1600m"`, `"1.5"`, `"2k"`, `"1Ki"` or
/// `"5e-1"` into a core count.
pub fn parse_cpu_quantity(raw: &str) -> Result<f64, GateError> {
    let invalid = || GateError::InvalidQuantity(raw.to_string());

    let value = raw.trim();
    if value.is_empty() {
        return Err(invalid());
    }

    let split = value
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let (number, suffix) = value.split_at(split);

    let base: f64 = number.parse().map_err(|_| invalid())?;
    let multiplier = suffix_multiplier(suffix).ok_or_else(invalid)?;

    let cores = base * multiplier;
    if !cores.is_finite() {
        return Err(invalid());
    }
    Ok(cores)
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        other => {
            let exponent = other
                .strip_prefix('e')
                .or_else(|| other.strip_prefix('E'))?;
            let exponent: i32 = exponent.parse().ok()?;
            10f64.powi(exponent)
        }
    };
    Some(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_plain_cores() {
        assert!(approx(parse_cpu_quantity("2").unwrap(), 2.0));
        assert!(approx(parse_cpu_quantity("1.6").unwrap(), 1.6));
        assert!(approx(parse_cpu_quantity(" 4 ").unwrap(), 4.0));
    }

    #[test]
    fn test_parse_millicores() {
        assert!(approx(parse_cpu_quantity("1600m").unwrap(), 1.6));
        assert!(approx(parse_cpu_quantity("250m").unwrap(), 0.25));
    }

    #[test]
    fn test_parse_si_and_binary_suffixes() {
        assert!(approx(parse_cpu_quantity("2k").unwrap(), 2000.0));
        assert!(approx(parse_cpu_quantity("1Ki").unwrap(), 1024.0));
        assert!(approx(parse_cpu_quantity("500000u").unwrap(), 0.5));
    }

    #[test]
    fn test_parse_exponent() {
        assert!(approx(parse_cpu_quantity("5e-1").unwrap(), 0.5));
        assert!(approx(parse_cpu_quantity("2E3").unwrap(), 2000.0));
        assert!(approx(parse_cpu_quantity("1E").unwrap(), 1e18));
    }

    #[test]
    fn test_parse_invalid() {
        for raw in ["", "m", "abc", "1.2.3", "12x", "1e", "--1"] {
            let err = parse_cpu_quantity(raw).unwrap_err();
            assert!(matches!(err, GateError::InvalidQuantity(_)), "{raw}");
        }
    }
}
