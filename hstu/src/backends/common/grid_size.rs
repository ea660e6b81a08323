use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridSize {
    pub const ONE: GridSize = GridSize {
        x: 1,
        y: 1,
        z: 1,
    };

    pub fn new(
        x: usize,
        y: usize,
        z: usize,
    ) -> Self {
        Self {
            x,
            y,
            z,
        }
    }

    pub fn product(&self) -> usize {
        self.x * self.y * self.z
    }
}

impl fmt::Display for GridSize {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
