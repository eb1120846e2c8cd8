/// Deterministic frame metadata passed along with each render.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time_s: f64,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time_s: index as f64 * dt_s,
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(0, 1.0 / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn frame_time_is_deterministic() {
        let a = Frame::new(10, 1.0 / 60.0);
        let b = Frame::new(10, 1.0 / 60.0);
        assert_eq!(a, b);
        assert_eq!(a.time_s, 10.0 / 60.0);
    }

    #[test]
    fn next_advances_index_and_time() {
        let f1 = Frame::new(0, 0.5).next();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time_s, 0.5);
    }
}
