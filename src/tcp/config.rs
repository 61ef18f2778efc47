use crate::tcp::errors::TcpError;
use crate::tcp::wrap32::Wrap32;

/// Tunables shared by the sender and receiver halves of a connection
#[derive(Debug, Clone, PartialEq)]
pub struct TcpConfig {
    pub rt_timeout_ms: u64,        // Initial retransmission timeout
    pub recv_capacity: u64,        // Inbound stream capacity
    pub send_capacity: u64,        // Outbound stream capacity
    pub max_payload_size: usize,   // Largest payload put in one segment
    pub max_retx_attempts: u64,    // Retransmissions before the caller should give up
    pub fixed_isn: Option<Wrap32>, // Use this ISN instead of a random one
}

impl TcpConfig {
    pub const DEFAULT_CAPACITY: u64 = 64000;
    pub const MAX_PAYLOAD_SIZE: usize = 1000;
    /// 1500-byte MTU minus the IPv4 and TCP headers
    pub const MAX_PAYLOAD_LIMIT: usize = 1460;
    pub const TIMEOUT_DFLT: u64 = 1000;
    pub const MAX_RETX_ATTEMPTS: u64 = 8;

    pub fn with_rt_timeout_ms(mut self, rt_timeout_ms: u64) -> Self {
        self.rt_timeout_ms = rt_timeout_ms;
        self
    }

    pub fn with_recv_capacity(mut self, capacity: u64) -> Self {
        self.recv_capacity = capacity;
        self
    }

    pub fn with_send_capacity(mut self, capacity: u64) -> Self {
        self.send_capacity = capacity;
        self
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub fn with_max_retx_attempts(mut self, attempts: u64) -> Self {
        self.max_retx_attempts = attempts;
        self
    }

    pub fn with_fixed_isn(mut self, isn: Wrap32) -> Self {
        self.fixed_isn = Some(isn);
        self
    }

    /// The fixed ISN if configured, otherwise a random one
    pub fn isn(&self) -> Wrap32 {
        self.fixed_isn.unwrap_or_else(Wrap32::random)
    }

    /// Has a connection retransmitted often enough that it should be abandoned?
    pub fn retransmissions_exhausted(&self, consecutive_retransmissions: u64) -> bool {
        consecutive_retransmissions > self.max_retx_attempts
    }

    pub fn validate(&self) -> Result<(), TcpError> {
        if self.recv_capacity == 0 {
            return Err(TcpError::ZeroCapacity("recv_capacity"));
        }
        if self.send_capacity == 0 {
            return Err(TcpError::ZeroCapacity("send_capacity"));
        }
        if self.rt_timeout_ms == 0 {
            return Err(TcpError::ZeroTimeout);
        }
        if self.max_payload_size == 0 || self.max_payload_size > Self::MAX_PAYLOAD_LIMIT {
            return Err(TcpError::InvalidPayloadSize {
                max: Self::MAX_PAYLOAD_LIMIT,
                found: self.max_payload_size,
            });
        }
        Ok(())
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            rt_timeout_ms: Self::TIMEOUT_DFLT,
            recv_capacity: Self::DEFAULT_CAPACITY,
            send_capacity: Self::DEFAULT_CAPACITY,
            max_payload_size: Self::MAX_PAYLOAD_SIZE,
            max_retx_attempts: Self::MAX_RETX_ATTEMPTS,
            fixed_isn: None,
        }
    }
}

// -- Unit tests --
