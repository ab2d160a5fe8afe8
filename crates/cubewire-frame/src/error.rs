/// Errors that can occur while building or decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A read or write touched bytes past the end of the frame.
    #[error("frame access out of bounds (offset {offset}, width {width}, length {len})")]
    Bounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    /// A value destined for a single byte was outside 0..=255.
    #[error("value {value} at index {index} does not fit in a byte")]
    Range { index: usize, value: i64 },

    /// The packet is too short or carries an unrecognized discriminant.
    #[error("cannot parse {what} packet: {reason}")]
    Parse { what: &'static str, reason: String },

    /// The caller supplied an argument the protocol cannot express.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl FrameError {
    pub(crate) fn parse(what: &'static str, reason: impl Into<String>) -> Self {
        FrameError::Parse {
            what,
            reason: reason.into(),
        }
    }

    pub(crate) fn too_short(what: &'static str, need: usize, got: usize) -> Self {
        Self::parse(what, format!("need at least {need} bytes, got {got}"))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
