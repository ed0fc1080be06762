use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub enum Direction {
    /// Uplink
    Ul,
    /// Downlink
    Dl,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ul => write!(f, "UL"),
            Direction::Dl => write!(f, "DL"),
        }
    }
}
