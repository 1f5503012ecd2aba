//! Editable fields and the coercion policy shared by every write path

use std::fmt;
use std::str::FromStr;

/// Which kind of point an operation or selection register refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Waypoint,
    TrackPoint,
}

/// Editable field of a waypoint or track point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    Lat,
    Lon,
    Elevation,
    Time,
    Name,
    Description,
}

impl Field {
    /// Numeric fields are coerced with [`coerce_number`], all others with [`coerce_text`]
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Lat | Field::Lon | Field::Elevation)
    }

    /// Whether entities of `category` carry this field
    #[inline]
    pub fn applies_to(self, category: Category) -> bool {
        match category {
            Category::Waypoint => true,
            Category::TrackPoint => !matches!(self, Field::Name | Field::Description),
        }
    }

    /// Name of the matching GPX element or attribute
    pub fn tag(self) -> &'static str {
        match self {
            Field::Lat => "lat",
            Field::Lon => "lon",
            Field::Elevation => "ele",
            Field::Time => "time",
            Field::Name => "name",
            Field::Description => "desc",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lat" | "latitude" => Ok(Field::Lat),
            "lon" | "lng" | "longitude" => Ok(Field::Lon),
            "ele" | "elevation" => Ok(Field::Elevation),
            "time" => Ok(Field::Time),
            "name" => Ok(Field::Name),
            "desc" | "description" => Ok(Field::Description),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// Document-level metadata field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetaField {
    Version,
    Creator,
    Name,
    Description,
}

impl FromStr for MetaField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "version" => Ok(MetaField::Version),
            "creator" => Ok(MetaField::Creator),
            "name" => Ok(MetaField::Name),
            "desc" | "description" => Ok(MetaField::Description),
            other => Err(format!("unknown metadata field '{other}'")),
        }
    }
}

/// Parse user or file input as a coordinate/elevation value.
///
/// Leading whitespace is skipped and the longest decimal prefix is used, so
/// `"100m"` reads as `100`. Input without a leading number, and non-finite
/// results, become `None`.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let end = numeric_prefix_len(text.as_bytes());
    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Length of the longest `[+-]digits[.digits][(e|E)[+-]digits]` prefix
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |start: usize| {
        start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    end
}

/// Trim free text, mapping empty input to `None`.
pub fn coerce_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
