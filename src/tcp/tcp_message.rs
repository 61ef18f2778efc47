use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::wrap32::Wrap32;

/// A segment travelling from a sender to the peer's receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,
    pub flags: TcpFlags, // SYN, FIN, RST
    pub payload: Vec<u8>,
}

impl TcpSenderMessage {
    pub fn new(seqno: Wrap32) -> Self {
        TcpSenderMessage {
            seqno,
            flags: TcpFlags::empty(),
            payload: vec![],
        }
    }

    pub fn flags(mut self, flags: TcpFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn syn(&self) -> bool {
        self.flags.contains(TcpFlags::SYN)
    }

    pub fn fin(&self) -> bool {
        self.flags.contains(TcpFlags::FIN)
    }

    pub fn rst(&self) -> bool {
        self.flags.contains(TcpFlags::RST)
    }

    /// How many sequence numbers this segment occupies: payload plus SYN and FIN
    pub fn sequence_length(&self) -> u64 {
        self.payload.len() as u64 + self.syn() as u64 + self.fin() as u64
    }
}

/// An acknowledgment travelling from a receiver back to the peer's sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
    pub rst: bool,
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_length() {
        let isn = Wrap32::new(7);
        assert_eq!(TcpSenderMessage::new(isn).sequence_length(), 0);
        assert_eq!(TcpSenderMessage::new(isn).flags(TcpFlags::SYN).sequence_length(), 1);
        assert_eq!(TcpSenderMessage::new(isn).payload(*b"abc").sequence_length(), 3);

        let msg = TcpSenderMessage::new(isn)
            .flags(TcpFlags::SYN | TcpFlags::FIN)
            .payload(*b"abc");
        assert_eq!(msg.sequence_length(), 5);
    }

    #[test]
    fn test_rst_occupies_no_sequence_space() {
        let msg = TcpSenderMessage::new(Wrap32::new(0)).flags(TcpFlags::RST);
        assert!(msg.rst());
        assert!(!msg.syn());
        assert_eq!(msg.sequence_length(), 0);
    }

    #[test]
    fn test_flags_accumulate() {
        let msg = TcpSenderMessage::new(Wrap32::new(0))
            .flags(TcpFlags::SYN)
            .flags(TcpFlags::FIN);
        assert!(msg.syn());
        assert!(msg.fin());
    }
}
