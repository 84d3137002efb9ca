/// Single-owner countdown.
///
/// Owned by the one task that reads the collection channel. Writers never
/// see it, which is what keeps "close the channel" a single-owner action.
#[derive(Debug)]
pub struct Countdown {
    remaining: usize,
}

impl Countdown {
    pub fn new(expected: usize) -> Self {
        Self { remaining: expected }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_zero(&self) -> bool {
        self.remaining == 0
    }

    /// Records one completed unit. Returns `true` only for the call that
    /// brings the count to zero; calls past zero are ignored.
    pub fn count_down(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}
