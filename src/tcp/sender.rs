use crate::tcp::byte_stream::{read, ByteStream, Reader, StreamError, Writer};
use crate::tcp::config::TcpConfig;
use crate::tcp::errors::TcpError;
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::tcp_message::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::timer::RetransmissionTimer;
use crate::tcp::wrap32::Wrap32;
use std::collections::BTreeMap;

/// The sender end of a connection.
///
/// Reads the outbound `ByteStream` into segments that fit the peer's window, keeps every
/// segment until it is fully acknowledged, and retransmits the oldest one when the RTO
/// expires. Segments leave through the `transmit` callback given to `push` and `tick`.
#[derive(Debug)]
pub struct TcpSender {
    input: ByteStream,                            // Stream of outgoing data
    isn: Wrap32,                                  // Our initial seq number
    next_seqno: u64,                              // Absolute seq number of the next byte to send
    syn_sent: bool,
    fin_sent: bool,
    window_size: u64,                             // Peer's window; zero is treated as one
    advertised_window: u16,                       // Peer's window as advertised
    outstanding: BTreeMap<u64, TcpSenderMessage>, // Sent but un'acked segments. key = abs seq number
    in_flight: u64,                               // Total sequence length of `outstanding`
    timer: RetransmissionTimer,
    consecutive_retransmissions: u64,
    max_payload_size: usize,
}

impl TcpSender {
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64) -> Self {
        TcpSender {
            input,
            isn,
            next_seqno: 0,
            syn_sent: false,
            fin_sent: false,
            window_size: 1,
            advertised_window: 1,
            outstanding: BTreeMap::new(),
            in_flight: 0,
            timer: RetransmissionTimer::new(initial_rto_ms),
            consecutive_retransmissions: 0,
            max_payload_size: TcpConfig::MAX_PAYLOAD_SIZE,
        }
    }

    pub fn from_config(config: &TcpConfig) -> Result<Self, TcpError> {
        config.validate()?;
        let sender = Self::new(
            ByteStream::new(config.send_capacity),
            config.isn(),
            config.rt_timeout_ms,
        );
        Ok(sender.with_max_payload_size(config.max_payload_size))
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// An empty segment at the current seq number, carrying RST if the stream has errored
    pub fn make_empty_message(&self) -> TcpSenderMessage {
        let msg = TcpSenderMessage::new(Wrap32::wrap(self.next_seqno, self.isn));
        if self.input.has_error() {
            msg.flags(TcpFlags::RST)
        } else {
            msg
        }
    }

    /// Send as many new segments as the window allows
    pub fn push(&mut self, mut transmit: impl FnMut(&TcpSenderMessage)) {
        while !self.fin_sent {
            if self.in_flight >= self.window_size {
                break;
            }
            let mut room = self.window_size - self.in_flight;

            let mut msg = self.make_empty_message();
            if !self.syn_sent {
                msg.flags |= TcpFlags::SYN;
                self.syn_sent = true;
                room -= 1;
            }

            let len = room
                .min(self.max_payload_size as u64)
                .min(self.input.bytes_buffered());
            read(&mut self.input, len, &mut msg.payload);
            room -= msg.payload.len() as u64;

            if self.input.is_finished() && room > 0 {
                msg.flags |= TcpFlags::FIN;
                self.fin_sent = true;
            }

            if msg.sequence_length() == 0 {
                break;
            }
            self.send_segment(msg, &mut transmit);
        }
    }

    /// Process an acknowledgment and window update from the peer's receiver
    pub fn receive(&mut self, message: &TcpReceiverMessage) {
        if message.rst {
            log::debug!("RST received; aborting outbound stream");
            self.input.set_error();
            return;
        }

        self.advertised_window = message.window_size;
        self.window_size = message.window_size.max(1) as u64;

        let Some(ackno) = message.ackno else {
            return;
        };

        let abs_ackno = ackno.unwrap(self.isn, self.next_seqno);
        if abs_ackno > self.next_seqno {
            log::debug!(
                "Ignoring ackno {} beyond next seq number {}",
                abs_ackno,
                self.next_seqno
            );
            return;
        }

        // Cumulative ACK: retire whole segments only
        let mut acked = false;
        while let Some(entry) = self.outstanding.first_entry() {
            let len = entry.get().sequence_length();
            if *entry.key() + len > abs_ackno {
                break;
            }
            entry.remove();
            self.in_flight -= len;
            acked = true;
        }

        if acked {
            self.timer.reset_rto();
            self.timer.restart();
            self.consecutive_retransmissions = 0;
        }
    }

    /// Time has passed; retransmit the oldest outstanding segment if the RTO expired
    pub fn tick(&mut self, ms_since_last_tick: u64, mut transmit: impl FnMut(&TcpSenderMessage)) {
        let Some((&seqno, oldest)) = self.outstanding.first_key_value() else {
            return;
        };
        if !self.timer.tick(ms_since_last_tick) {
            return;
        }

        log::debug!(
            "RTO of {} ms expired after {} ms; retransmitting segment at {} (attempt {})",
            self.timer.rto_ms(),
            self.timer.elapsed_ms(),
            seqno,
            self.consecutive_retransmissions + 1
        );
        transmit(oldest);
        self.timer.restart();

        // A closed window means the peer is slow, not that the network dropped the segment
        if self.advertised_window > 0 {
            self.consecutive_retransmissions += 1;
            self.timer.back_off();
        }
    }

    /// How many sequence numbers are outstanding
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.in_flight
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    pub fn current_rto_ms(&self) -> u64 {
        self.timer.rto_ms()
    }

    /// Absolute seq number of the next byte or flag to send
    pub fn next_seqno_absolute(&self) -> u64 {
        self.next_seqno
    }

    pub fn isn(&self) -> Wrap32 {
        self.isn
    }

    /// The writing end of the outbound stream.
    ///
    /// Only the sender reads from it:
    ///
    /// ```compile_fail
    /// use tcp_core::tcp::{ByteStream, Reader, TcpSender, Wrap32};
    ///
    /// let mut sender = TcpSender::new(ByteStream::new(16), Wrap32::new(0), 1000);
    /// sender.writer().pop(1);
    /// ```
    pub fn writer(&mut self) -> &mut impl Writer {
        &mut self.input
    }

    pub fn reader(&self) -> &ByteStream {
        &self.input
    }

    fn send_segment(&mut self, msg: TcpSenderMessage, transmit: &mut impl FnMut(&TcpSenderMessage)) {
        if self.outstanding.is_empty() {
            self.timer.restart();
        }

        log::trace!(
            "Sending seqno={} len={} flags={:?}",
            msg.seqno,
            msg.sequence_length(),
            msg.flags
        );
        transmit(&msg);

        let len = msg.sequence_length();
        self.outstanding.insert(self.next_seqno, msg);
        self.next_seqno += len;
        self.in_flight += len;
    }
}

// -- Unit tests --
