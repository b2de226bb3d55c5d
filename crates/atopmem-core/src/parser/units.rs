//! Size units used by atop and conversion to gibibytes.

/// Unit suffix printed by atop after a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    /// `G`
    Gibibytes,
    /// `M`
    Mebibytes,
}

impl SizeUnit {
    /// Maps a unit token to a unit. Only `G` and `M` are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "G" => Some(SizeUnit::Gibibytes),
            "M" => Some(SizeUnit::Mebibytes),
            _ => None,
        }
    }
}

/// A raw magnitude as printed in the log, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnitude {
    pub value: f64,
    pub unit: SizeUnit,
}

impl Magnitude {
    /// Value in gibibytes.
    pub fn to_gib(self) -> f64 {
        normalize(self.value, self.unit)
    }
}

/// Converts `value` in `unit` to gibibytes.
pub fn normalize(value: f64, unit: SizeUnit) -> f64 {
    match unit {
        SizeUnit::Gibibytes => value,
        SizeUnit::Mebibytes => value / 1024.0,
    }
}
