#![allow(dead_code, reason = "each test file uses a different subset of the fakes")]
#![allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "test scaffolding")]

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_io_async::{ErrorType, Read, ReadReady, Write};
use embedded_storage::nor_flash::{
    ErrorType as FlashErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use stac::portal::{AccessPoint, ApConfig, PortalTransport};
use stac::provision::{Cue, Indicator};
use stac::store::Preferences;
use stac::{OPERATING_NAMESPACE, PERIPHERAL_NAMESPACE};

pub const FLASH_SECTOR_SIZE: usize = 4096;
pub const WORD_SIZE: usize = 4;

pub static NAMESPACES: [&str; 2] = [OPERATING_NAMESPACE, PERIPHERAL_NAMESPACE];

/// RAM-backed NOR flash. Erased bytes read `0xff` and writes can only clear bits.
#[derive(Default)]
pub struct Flash {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
    Erase { offset: u32, len: usize },
}

impl Flash {
    pub fn new(pages: usize) -> Self {
        Self {
            buf: vec![0xffu8; FLASH_SECTOR_SIZE * pages],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn new_with_fault(pages: usize, fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new(pages)
        }
    }

    pub fn erases(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Erase { .. }))
            .count()
    }

    fn check_fault(&self) -> Result<(), FlashError> {
        if self.operations.len() >= self.fail_after_operation {
            return Err(FlashError);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FlashError;

impl NorFlashError for FlashError {
    fn kind(&self) -> NorFlashErrorKind {
        NorFlashErrorKind::Other
    }
}

impl FlashErrorType for Flash {
    type Error = FlashError;
}

impl ReadNorFlash for Flash {
    const READ_SIZE: usize = WORD_SIZE;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::READ_SIZE as u32));
        self.check_fault()?;
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });
        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl NorFlash for Flash {
    const WRITE_SIZE: usize = WORD_SIZE;
    const ERASE_SIZE: usize = FLASH_SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        assert!(from.is_multiple_of(Self::ERASE_SIZE as u32));
        assert!(to.is_multiple_of(Self::ERASE_SIZE as u32));
        self.check_fault()?;
        self.operations.push(Operation::Erase {
            offset: from,
            len: (to - from) as usize,
        });
        self.buf[from as usize..to as usize].fill(0xff);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::WRITE_SIZE as u32));
        assert!(bytes.len().is_multiple_of(Self::WRITE_SIZE));
        assert!(!bytes.is_empty());
        self.check_fault()?;
        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });
        let offset = offset as usize;
        for (cell, &val) in self.buf[offset..offset + bytes.len()].iter_mut().zip(bytes) {
            *cell &= val;
        }
        Ok(())
    }
}

/// A fresh two-namespace store on erased flash.
pub fn preferences() -> Preferences<Flash> {
    Preferences::new(Flash::new(2), 0, &NAMESPACES).unwrap()
}

/// An active-low push button.
///
/// `pressed` is the level seen by `is_pressed`. With `releases` set, waiting for
/// release lifts the button at once. Otherwise the button is held forever.
pub struct FakeButtonPin {
    pub pressed: bool,
    pub releases: bool,
}

impl FakeButtonPin {
    pub fn up() -> Self {
        Self {
            pressed: false,
            releases: true,
        }
    }

    pub fn tapped() -> Self {
        Self {
            pressed: true,
            releases: true,
        }
    }

    pub fn held() -> Self {
        Self {
            pressed: true,
            releases: false,
        }
    }
}

impl PinErrorType for FakeButtonPin {
    type Error = Infallible;
}

impl InputPin for FakeButtonPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.pressed)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed)
    }
}

impl Wait for FakeButtonPin {
    async fn wait_for_high(&mut self) -> Result<(), Infallible> {
        if self.pressed && !self.releases {
            core::future::pending::<()>().await;
        }
        self.pressed = false;
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Infallible> {
        self.pressed = true;
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Infallible> {
        self.wait_for_high().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Infallible> {
        self.wait_for_low().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Infallible> {
        self.pressed = !self.pressed;
        Ok(())
    }
}

/// A delay that returns at once and remembers what was asked for.
#[derive(Default)]
pub struct RecordingDelay {
    pub requested_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.requested_ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.requested_ms.push(ms);
    }
}

#[derive(Default)]
pub struct FakeAccessPoint {
    pub started: Vec<ApConfig>,
    pub stops: usize,
    pub fail_start: bool,
}

impl AccessPoint for FakeAccessPoint {
    type Error = ();

    async fn start(&mut self, config: &ApConfig) -> Result<(), ()> {
        if self.fail_start {
            return Err(());
        }
        self.started.push(config.clone());
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ()> {
        self.stops += 1;
        Ok(())
    }
}

/// One scripted client connection: the chunks the client sends, in arrival order.
/// A `None` session makes `accept` fail once.
pub type Session = Option<Vec<Vec<u8>>>;

/// Serves scripted sessions and records every response written back.
#[derive(Default)]
pub struct FakeTransport {
    pub sessions: VecDeque<Session>,
    pub responses: Vec<String>,
    pub ports: Vec<u16>,
}

impl FakeTransport {
    pub fn with_requests(requests: &[&str]) -> Self {
        Self {
            sessions: requests
                .iter()
                .map(|request| Some(vec![request.as_bytes().to_vec()]))
                .collect(),
            ..Self::default()
        }
    }

    pub fn status_lines(&self) -> Vec<&str> {
        self.responses
            .iter()
            .map(|response| response.lines().next().unwrap_or(""))
            .collect()
    }
}

impl PortalTransport for FakeTransport {
    type Error = ();
    type Connection<'a>
        = FakeConnection<'a>
    where
        Self: 'a;

    async fn accept(&mut self, port: u16) -> Result<FakeConnection<'_>, ()> {
        self.ports.push(port);
        let session = self
            .sessions
            .pop_front()
            .expect("portal accepted more connections than were scripted");
        let chunks = session.ok_or(())?;
        Ok(FakeConnection {
            chunks: chunks.into(),
            written: Vec::new(),
            responses: &mut self.responses,
        })
    }
}

pub struct FakeConnection<'a> {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    responses: &'a mut Vec<String>,
}

impl ErrorType for FakeConnection<'_> {
    type Error = Infallible;
}

impl Read for FakeConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let len = chunk.len().min(buf.len());
        buf[..len].copy_from_slice(&chunk[..len]);
        if len < chunk.len() {
            self.chunks.push_front(chunk.split_off(len));
        }
        Ok(len)
    }
}

impl ReadReady for FakeConnection<'_> {
    fn read_ready(&mut self) -> Result<bool, Infallible> {
        Ok(!self.chunks.is_empty())
    }
}

impl Write for FakeConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Infallible> {
        self.responses
            .push(String::from_utf8_lossy(&self.written).into_owned());
        self.written.clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingIndicator {
    pub cues: Vec<Cue>,
}

impl Indicator for RecordingIndicator {
    fn show(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

pub const SANDY_SHORES_BODY: &str = "SSID=SandyShores222&pwd=flatBUSH%40%26%24%29%28%3B%3A%2F-3546&stIP=192.168.2.132&stPort=80&stChan=7&pollTime=300";

/// A browser-style form submission carrying `body`.
pub fn post(body: &str) -> String {
    format!(
        "POST / HTTP/1.1\r\nHost: 192.168.6.14\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

pub const GET_ROOT: &str = "GET / HTTP/1.1\r\nHost: 192.168.6.14\r\nAccept: text/html\r\n\r\n";
