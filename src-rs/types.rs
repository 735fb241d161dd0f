use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle in buffer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// True when either side is shorter than `min_side`.
    pub fn is_degenerate(&self, min_side: u32) -> bool {
        self.w < min_side || self.h < min_side
    }

    /// Geometric centre, rounded down to a pixel.
    pub fn center(&self) -> (i64, i64) {
        (
            i64::from(self.x) + i64::from(self.w) / 2,
            i64::from(self.y) + i64::from(self.h) / 2,
        )
    }

    /// Exclusive right/bottom edges.
    pub fn x2(&self) -> i64 {
        i64::from(self.x) + i64::from(self.w)
    }

    pub fn y2(&self) -> i64 {
        i64::from(self.y) + i64::from(self.h)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

impl FromStr for Rect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,w,h but got '{s}'"));
        }
        let x = parts[0]
            .parse::<i32>()
            .map_err(|err| format!("invalid x '{}': {err}", parts[0]))?;
        let y = parts[1]
            .parse::<i32>()
            .map_err(|err| format!("invalid y '{}': {err}", parts[1]))?;
        let w = parts[2]
            .parse::<u32>()
            .map_err(|err| format!("invalid w '{}': {err}", parts[2]))?;
        let h = parts[3]
            .parse::<u32>()
            .map_err(|err| format!("invalid h '{}': {err}", parts[3]))?;
        Ok(Rect { x, y, w, h })
    }
}

/// Subject record returned by the external lookup. Rendered as-is, never validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub clearance: String,
    #[serde(default)]
    pub email: String,
}
