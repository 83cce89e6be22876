//! Mock serial device for testing.
//!
//! Simulates a device without hardware: reads are served from a queue,
//! writes are logged, and faults can be scripted mid-sequence to exercise
//! the abort paths of the write and read protocols.

use super::error::PortError;
use super::traits::SerialDevice;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Inner state of the mock device, protected by a mutex for interior
/// mutability.
#[derive(Debug, Default)]
struct MockDeviceState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Every write call, in order.
    write_log: Vec<Vec<u8>>,
    /// 1-based index of the write call that should fail, if any.
    fail_write_at: Option<usize>,
    /// Write calls attempted so far.
    write_calls: usize,
    /// Remaining bytes to serve before reads start failing, if scripted.
    read_budget: Option<usize>,
    /// Whether buffered input has been discarded.
    input_discarded: bool,
    /// Whether output has been flushed.
    flushed: bool,
}

/// Mock serial device for tests.
///
/// Cloning yields a handle onto the same device state, so a test can keep
/// inspecting a mock after handing a boxed clone to a session.
///
/// # Example
/// ```
/// use serial_line::{MockSerialDevice, SerialDevice};
///
/// let mut device = MockSerialDevice::new("MOCK0");
/// device.enqueue_read(b"ok\n");
///
/// let mut buffer = [0u8; 3];
/// let n = device.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"ok\n");
/// ```
#[derive(Clone)]
pub struct MockSerialDevice {
    name: String,
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockSerialDevice {
    /// Create a new mock device with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockDeviceState::default())),
        }
    }

    /// Append bytes to the read queue.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Make the `n`th write call fail (1-based). Earlier writes succeed.
    pub fn fail_write_at(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        state.fail_write_at = Some(n);
    }

    /// Serve at most `budget` more bytes, then fail every read.
    pub fn fail_read_after(&self, budget: usize) {
        let mut state = self.state.lock().unwrap();
        state.read_budget = Some(budget);
    }

    /// Every byte written so far, flattened across calls.
    pub fn written(&self) -> Vec<u8> {
        let state = self.state.lock().unwrap();
        state.write_log.iter().flatten().copied().collect()
    }

    /// A copy of the write log, one entry per call.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// Whether buffered input has been discarded since creation.
    pub fn was_discarded(&self) -> bool {
        self.state.lock().unwrap().input_discarded
    }

    /// Whether output has been flushed since creation.
    pub fn was_flushed(&self) -> bool {
        self.state.lock().unwrap().flushed
    }

    /// Bytes still waiting in the read queue.
    pub fn pending_reads(&self) -> usize {
        self.state.lock().unwrap().read_queue.len()
    }
}

impl SerialDevice for MockSerialDevice {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        state.write_calls += 1;
        if state.fail_write_at == Some(state.write_calls) {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }

        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        if state.read_budget == Some(0) {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scripted read failure",
            )));
        }

        let mut bytes_read = 0;
        for slot in buffer.iter_mut() {
            if state.read_budget == Some(0) {
                break;
            }
            match state.read_queue.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    bytes_read += 1;
                    if let Some(budget) = state.read_budget.as_mut() {
                        *budget -= 1;
                    }
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // An exhausted queue behaves like an expired read timeout.
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "no data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn flush(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.flushed = true;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.read_queue.clear();
        state.input_discarded = true;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockSerialDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialDevice")
            .field("name", &self.name)
            .field("pending_reads", &self.pending_reads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_and_read() {
        let mut device = MockSerialDevice::new("MOCK0");
        device.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = device.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn write_logging() {
        let mut device = MockSerialDevice::new("MOCK0");
        device.write_bytes(b"a").unwrap();
        device.write_bytes(b"b").unwrap();

        assert_eq!(device.write_log(), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(device.written(), b"ab");
    }

    #[test]
    fn scripted_write_failure() {
        let mut device = MockSerialDevice::new("MOCK0");
        device.fail_write_at(2);

        device.write_bytes(b"x").unwrap();
        assert!(device.write_bytes(b"y").is_err());
        // The failed call is not logged; later calls succeed again.
        device.write_bytes(b"z").unwrap();
        assert_eq!(device.written(), b"xz");
    }

    #[test]
    fn scripted_read_failure_honors_budget() {
        let mut device = MockSerialDevice::new("MOCK0");
        device.enqueue_read(b"abcdef");
        device.fail_read_after(3);

        let mut buffer = [0u8; 10];
        let n = device.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"abc");
        assert!(device.read_bytes(&mut buffer).is_err());
    }

    #[test]
    fn empty_queue_reads_time_out() {
        let mut device = MockSerialDevice::new("MOCK0");
        let mut buffer = [0u8; 4];

        let result = device.read_bytes(&mut buffer);
        match result {
            Err(PortError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn discard_clears_queue() {
        let mut device = MockSerialDevice::new("MOCK0");
        device.enqueue_read(b"stale");

        device.discard_input().unwrap();
        assert!(device.was_discarded());
        assert_eq!(device.pending_reads(), 0);
    }

    #[test]
    fn clone_shares_state() {
        let device = MockSerialDevice::new("MOCK0");
        let mut handle = device.clone();

        handle.write_bytes(b"shared").unwrap();
        assert_eq!(device.written(), b"shared");
    }
}
