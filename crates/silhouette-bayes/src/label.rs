use std::fmt;
use std::str::FromStr;

/// The silhouettes of the traffic signs to recognize.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ShapeClass {
    /// Warning signs.
    Triangle,
    /// Prohibitory and mandatory signs.
    Circle,
    /// Information signs.
    Square,
}

impl ShapeClass {
    /// All the shape classes in label order.
    pub const ALL: [ShapeClass; 3] = [
        ShapeClass::Triangle,
        ShapeClass::Circle,
        ShapeClass::Square,
    ];

    /// The lowercase name of the class.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeClass::Triangle => "triangle",
            ShapeClass::Circle => "circle",
            ShapeClass::Square => "square",
        }
    }
}

impl fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`ShapeClass`].
#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Unknown shape class: {0}")]
pub struct ParseShapeClassError(String);

impl FromStr for ShapeClass {
    type Err = ParseShapeClassError;

    /// Parse a class name, case insensitive, singular or plural.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.strip_suffix('s').unwrap_or(&name);
        match name {
            "triangle" => Ok(ShapeClass::Triangle),
            "circle" => Ok(ShapeClass::Circle),
            "square" => Ok(ShapeClass::Square),
            _ => Err(ParseShapeClassError(s.to_string())),
        }
    }
}
