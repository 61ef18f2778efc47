use crate::tcp::byte_stream::{ByteStream, Reader, StreamError, Writer};
use crate::tcp::config::TcpConfig;
use crate::tcp::errors::TcpError;
use crate::tcp::reassembler::Reassembler;
use crate::tcp::tcp_message::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;
use std::io::Read;

/// The receiver end of a connection: segments in, acknowledgments out
#[derive(Debug)]
pub struct TcpReceiver {
    isn: Option<Wrap32>,      // Peer's initial seq number, once SYN is seen
    reassembler: Reassembler, // Handles incoming TCP segments
}

impl TcpReceiver {
    pub fn new(reassembler: Reassembler) -> Self {
        TcpReceiver {
            isn: None,
            reassembler,
        }
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self::new(Reassembler::new(ByteStream::new(capacity)))
    }

    pub fn from_config(config: &TcpConfig) -> Result<Self, TcpError> {
        config.validate()?;
        Ok(Self::with_capacity(config.recv_capacity))
    }

    /// Process a segment from the peer's sender
    pub fn receive(&mut self, message: &TcpSenderMessage) {
        if message.rst() {
            log::debug!("RST received; aborting inbound stream");
            self.reassembler.output_mut().set_error();
            return;
        }

        let isn = match (self.isn, message.syn()) {
            (Some(isn), _) => isn,
            (None, true) => {
                log::debug!("SYN received with ISN {}", message.seqno);
                self.isn = Some(message.seqno);
                message.seqno
            }
            (None, false) => {
                log::trace!("Ignoring segment {} before SYN", message.seqno);
                return;
            }
        };

        if message.payload.is_empty() && !message.fin() {
            return;
        }

        // SYN occupies absolute seq_no 0, so stream index = abs_seq_no - 1 for data after it
        let checkpoint = self.reassembler.next_index();
        let abs_seq_no = message.seqno.unwrap(isn, checkpoint);
        let Some(stream_index) = (abs_seq_no + message.syn() as u64).checked_sub(1) else {
            log::trace!("Ignoring segment without SYN at the ISN");
            return;
        };

        self.reassembler
            .insert(stream_index, &message.payload, message.fin());
    }

    /// The acknowledgment and window to advertise to the peer's sender
    pub fn send(&self) -> TcpReceiverMessage {
        let output = self.reassembler.output();
        let window_size = output.available_capacity().min(u16::MAX as u64) as u16;

        // +1 for the SYN, and +1 more once the FIN has been written out
        let ackno = self.isn.map(|isn| {
            let next = self.reassembler.next_index() + 1 + output.is_closed() as u64;
            Wrap32::wrap(next, isn)
        });

        TcpReceiverMessage {
            ackno,
            window_size,
            rst: output.has_error(),
        }
    }

    pub fn isn(&self) -> Option<Wrap32> {
        self.isn
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// The reassembled inbound stream
    pub fn stream_out(&self) -> &ByteStream {
        self.reassembler.output()
    }

    /// The reading end of the inbound stream.
    ///
    /// Only segments can write into it:
    ///
    /// ```compile_fail
    /// use tcp_core::tcp::{TcpReceiver, Writer};
    ///
    /// let mut receiver = TcpReceiver::with_capacity(16);
    /// receiver.stream_out_mut().push(b"zz");
    /// ```
    pub fn stream_out_mut(&mut self) -> &mut (impl Reader + Read) {
        self.reassembler.output_mut()
    }
}

// -- Unit tests --
