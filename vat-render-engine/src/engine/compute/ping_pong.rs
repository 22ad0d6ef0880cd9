/// Which of the two compute targets is read and which is written on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeTick {
    /// Both targets are filled with the seed-derived starting state.
    Init,
    /// Read the previous result from `read`, write the next one into `write`.
    Step { read: usize, write: usize },
}

/// Read/write roles for a pair of targets, swapped after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingPong {
    read: usize,
    initialised: bool,
}

impl PingPong {
    /// Roles for this tick. Swaps afterwards, so [`Self::exposed`] is always the target just written.
    pub fn tick(&mut self) -> ComputeTick {
        if !self.initialised {
            self.initialised = true;
            return ComputeTick::Init;
        }
        let read = self.read;
        let write = 1 - read;
        self.read = write;
        ComputeTick::Step { read, write }
    }

    /// Target holding the most recently completed result.
    pub fn exposed(&self) -> usize {
        self.read
    }
}
