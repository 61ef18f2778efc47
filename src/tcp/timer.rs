/// Retransmission timer for the oldest outstanding segment.
///
/// Time only moves when the owner calls [`RetransmissionTimer::tick`]; there is no clock.
#[derive(Debug, Clone, PartialEq)]
pub struct RetransmissionTimer {
    initial_rto_ms: u64,
    rto_ms: u64,
    elapsed_ms: u64,
}

impl RetransmissionTimer {
    pub fn new(initial_rto_ms: u64) -> Self {
        RetransmissionTimer {
            initial_rto_ms,
            rto_ms: initial_rto_ms,
            elapsed_ms: 0,
        }
    }

    pub fn rto_ms(&self) -> u64 {
        self.rto_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Start counting again from zero
    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
    }

    /// Advance the timer; returns true once the current RTO has elapsed
    pub fn tick(&mut self, ms_since_last_tick: u64) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms_since_last_tick);
        self.elapsed_ms >= self.rto_ms
    }

    /// Exponential backoff: double the RTO
    pub fn back_off(&mut self) {
        self.rto_ms = self.rto_ms.saturating_mul(2);
    }

    pub fn reset_rto(&mut self) {
        self.rto_ms = self.initial_rto_ms;
    }
}

// -- Unit tests --
