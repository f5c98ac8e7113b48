use core::fmt;

/// Display channel selected with `Channel/SetIndex`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The clock face picked in the Divoom app
    Faces,
    Cloud,
    Visualizer,
    Custom,
}

impl Channel {
    pub const fn index(self) -> u8 {
        match self {
            Channel::Faces => 0,
            Channel::Cloud => 1,
            Channel::Visualizer => 2,
            Channel::Custom => 3,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Faces => write!(f, "Faces"),
            Channel::Cloud => write!(f, "Cloud"),
            Channel::Visualizer => write!(f, "Visualizer"),
            Channel::Custom => write!(f, "Custom"),
        }
    }
}
