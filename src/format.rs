//! Number formatting driven by d3-format style specifiers, e.g. `>-.2f`,
//! `$,.0f` or `.1%`.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SPECIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(.)?([<>=^]))?([+\-( ])?([$#])?(0)?(\d+)?(,)?(\.\d+)?(~)?([a-z%])?$")
        .unwrap()
});

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "\u{b5}", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatSpecError {
    #[error("invalid format specifier: {0}")]
    Invalid(String),
    #[error("unsupported format type '{kind}' in {spec}")]
    UnsupportedType { spec: String, kind: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    fill: char,
    align: Align,
    sign: char,
    currency: bool,
    width: Option<usize>,
    grouping: bool,
    precision: Option<usize>,
    trim: bool,
    kind: char,
}

impl NumberFormat {
    pub fn parse(spec: &str) -> Result<Self, FormatSpecError> {
        let caps = SPECIFIER_RE
            .captures(spec)
            .ok_or_else(|| FormatSpecError::Invalid(spec.to_string()))?;
        let group = |idx: usize| caps.get(idx).map(|m| m.as_str());

        let mut fill = group(1).and_then(|s| s.chars().next()).unwrap_or(' ');
        let mut align = match group(2) {
            Some("<") => Align::Left,
            Some("^") => Align::Center,
            Some("=") => Align::AfterSign,
            _ => Align::Right,
        };
        if group(5).is_some() {
            fill = '0';
            align = Align::AfterSign;
        }
        let sign = group(3).and_then(|s| s.chars().next()).unwrap_or('-');
        let width = group(6).and_then(|s| s.parse().ok());
        let precision = group(8).and_then(|s| s[1..].parse().ok());
        let mut trim = group(9).is_some();
        let kind = match group(10).and_then(|s| s.chars().next()) {
            Some(kind @ ('f' | 'd' | 'e' | 'g' | 'r' | 's' | '%')) => kind,
            Some(kind) => {
                return Err(FormatSpecError::UnsupportedType {
                    spec: spec.to_string(),
                    kind,
                });
            }
            None => {
                trim = true;
                'g'
            }
        };
        let precision = match (kind, group(10)) {
            ('g', None) => Some(precision.unwrap_or(12)),
            _ => precision,
        };

        Ok(Self {
            fill,
            align,
            sign,
            currency: group(4) == Some("$"),
            width,
            grouping: group(7).is_some(),
            precision,
            trim,
            kind,
        })
    }

    pub fn format(&self, value: f32) -> String {
        let value = value as f64;
        if !value.is_finite() {
            return value.to_string();
        }
        let mut negative = value < 0.0;
        let magnitude = value.abs();

        let (mut body, suffix) = match self.kind {
            'f' => (fixed(magnitude, self.precision.unwrap_or(6)), String::new()),
            'd' => (fixed(magnitude.round(), 0), String::new()),
            '%' => (
                fixed(magnitude * 100.0, self.precision.unwrap_or(6)),
                "%".to_string(),
            ),
            'e' => (exponential(magnitude, self.precision.unwrap_or(6)), String::new()),
            'r' => (significant(magnitude, self.precision.unwrap_or(6).max(1)), String::new()),
            's' => si_prefixed(magnitude, self.precision.unwrap_or(6).max(1)),
            _ => (general(magnitude, self.precision.unwrap_or(6).max(1)), String::new()),
        };

        if self.trim {
            body = trim_insignificant(&body);
        }
        if negative && body.chars().all(|ch| matches!(ch, '0' | '.')) {
            negative = false;
        }
        if self.grouping {
            body = group_thousands(&body);
        }

        let sign = match (negative, self.sign) {
            (true, '(') => "(",
            (true, _) => "-",
            (false, '+') => "+",
            (false, ' ') => " ",
            _ => "",
        };
        let close = if negative && self.sign == '(' { ")" } else { "" };
        let prefix = format!("{sign}{}", if self.currency { "$" } else { "" });
        let number = format!("{body}{suffix}{close}");
        self.pad(&prefix, &number)
    }

    fn pad(&self, prefix: &str, number: &str) -> String {
        let len = prefix.chars().count() + number.chars().count();
        let Some(width) = self.width.filter(|width| *width > len) else {
            return format!("{prefix}{number}");
        };
        let padding = width - len;
        let fill = |count: usize| std::iter::repeat_n(self.fill, count).collect::<String>();
        match self.align {
            Align::Left => format!("{prefix}{number}{}", fill(padding)),
            Align::Right => format!("{}{prefix}{number}", fill(padding)),
            Align::AfterSign => format!("{prefix}{}{number}", fill(padding)),
            Align::Center => {
                let left = padding / 2;
                format!("{}{prefix}{number}{}", fill(left), fill(padding - left))
            }
        }
    }
}

fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

fn exponential(value: f64, decimals: usize) -> String {
    let raw = format!("{value:.decimals$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{mantissa}e{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}e+{exp}"),
        None => raw,
    }
}

fn decimal_exponent(value: f64) -> i32 {
    if value == 0.0 {
        0
    } else {
        value.log10().floor() as i32
    }
}

fn significant(value: f64, digits: usize) -> String {
    let exponent = decimal_exponent(value);
    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    let step = 10f64.powi(exponent - digits as i32 + 1);
    let rounded = if decimals == 0 {
        (value / step).round() * step
    } else {
        value
    };
    fixed(rounded, decimals)
}

fn general(value: f64, digits: usize) -> String {
    let exponent = decimal_exponent(value);
    if exponent < -6 || exponent >= digits as i32 {
        exponential(value, digits - 1)
    } else {
        significant(value, digits)
    }
}

fn si_prefixed(value: f64, digits: usize) -> (String, String) {
    // Pick the prefix from the rounded value so 999.9 becomes 1.0k.
    let precision = digits.saturating_sub(1);
    let rounded = format!("{value:.precision$e}")
        .parse::<f64>()
        .unwrap_or(value);
    let exponent = (decimal_exponent(rounded).div_euclid(3) * 3).clamp(-24, 24);
    let scaled = rounded / 10f64.powi(exponent);
    let prefix = SI_PREFIXES[((exponent + 24) / 3) as usize];
    (significant(scaled, digits), prefix.to_string())
}

fn trim_insignificant(body: &str) -> String {
    let (mantissa, exponent) = match body.find('e') {
        Some(pos) => body.split_at(pos),
        None => (body, ""),
    };
    if !mantissa.contains('.') {
        return body.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{exponent}")
}

fn group_thousands(body: &str) -> String {
    let split = body.find(['.', 'e']).unwrap_or(body.len());
    let (integer, rest) = body.split_at(split);
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push_str(rest);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, value: f32) -> String {
        NumberFormat::parse(spec).unwrap().format(value)
    }

    #[test]
    fn fixed_point_and_sign() {
        assert_eq!(fmt(".2f", 3.14159), "3.14");
        assert_eq!(fmt(">-.2f", 3.14159), "3.14");
        assert_eq!(fmt("+.1f", 2.0), "+2.0");
        assert_eq!(fmt("(.1f", -2.0), "(2.0)");
        assert_eq!(fmt(".1f", -0.01), "0.0");
    }

    #[test]
    fn grouping_and_currency() {
        assert_eq!(fmt(",d", 1234567.0), "1,234,567");
        assert_eq!(fmt("$,.2f", 1234.5), "$1,234.50");
        assert_eq!(fmt(" >-$.2f", 12.0), "$12.00");
    }

    #[test]
    fn percent_si_and_exponent() {
        assert_eq!(fmt(".0%", 0.256), "26%");
        assert_eq!(fmt(".2s", 1500.0), "1.5k");
        assert_eq!(fmt(".2s", 999.9), "1.0k");
        assert_eq!(fmt(".3s", 999.9), "1.00k");
        assert_eq!(fmt(".3s", 999.4), "999");
        assert_eq!(fmt(".2e", 1234.0), "1.23e+3");
        assert_eq!(fmt(".2r", 1234.0), "1200");
    }

    #[test]
    fn default_type_trims() {
        assert_eq!(fmt("", 10.0), "10");
        assert_eq!(fmt("", 2.5), "2.5");
        assert_eq!(fmt(".2~f", 2.50), "2.5");
    }

    #[test]
    fn padding() {
        assert_eq!(fmt("08.2f", 3.14159), "00003.14");
        assert_eq!(fmt("*^7d", 42.0), "**42***");
        assert_eq!(fmt("<6d", 7.0), "7     ");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            NumberFormat::parse("what"),
            Err(FormatSpecError::Invalid(_))
        ));
        assert!(matches!(
            NumberFormat::parse(".2x"),
            Err(FormatSpecError::UnsupportedType { kind: 'x', .. })
        ));
    }
}
