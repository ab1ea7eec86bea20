//! [`PortalTransport`] over an `embassy-net` stack.

use embassy_net::Stack;
use embassy_net::tcp::{AcceptError, Error as TcpError, TcpSocket};
use embassy_time::Duration;
use embedded_io_async::{ErrorType, Read, ReadReady, Write};

use super::PortalTransport;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

/// Serves portal connections from `stack`, one at a time, through the given buffers.
pub struct EmbassyNetTransport<'d> {
    stack: Stack<'d>,
    rx_buffer: &'d mut [u8],
    tx_buffer: &'d mut [u8],
}

impl<'d> EmbassyNetTransport<'d> {
    #[must_use]
    pub const fn new(stack: Stack<'d>, rx_buffer: &'d mut [u8], tx_buffer: &'d mut [u8]) -> Self {
        Self {
            stack,
            rx_buffer,
            tx_buffer,
        }
    }
}

impl PortalTransport for EmbassyNetTransport<'_> {
    type Error = AcceptError;
    type Connection<'a>
        = PortalSocket<'a>
    where
        Self: 'a;

    async fn accept(&mut self, port: u16) -> Result<PortalSocket<'_>, AcceptError> {
        let mut socket = TcpSocket::new(self.stack, &mut *self.rx_buffer, &mut *self.tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        debug!("Waiting for portal connection on port {}", port);
        socket.accept(port).await?;
        Ok(PortalSocket { socket })
    }
}

/// An accepted portal connection. Flushing ends the exchange and closes the socket,
/// since every portal response is sent with `Connection: close`.
pub struct PortalSocket<'a> {
    socket: TcpSocket<'a>,
}

impl ErrorType for PortalSocket<'_> {
    type Error = TcpError;
}

impl Read for PortalSocket<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TcpError> {
        self.socket.read(buf).await
    }
}

impl ReadReady for PortalSocket<'_> {
    fn read_ready(&mut self) -> Result<bool, TcpError> {
        self.socket.read_ready()
    }
}

impl Write for PortalSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TcpError> {
        self.socket.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), TcpError> {
        self.socket.flush().await?;
        self.socket.close();
        self.socket.flush().await
    }
}
