//! Pure translation of a [`PortConfiguration`] into a termios image.
//!
//! The translation never touches the device: it edits a `libc::termios`
//! value in place, and [`apply_to_fd`] is the only function that reads or
//! writes actual device attributes. Flow-control and parity flags are
//! applied clear-then-set: each group is fully cleared before exactly the
//! selected mode's bits are raised, so switching modes can never leave
//! stale bits behind.

use super::error::PortError;
use crate::config::{DataBits, FlowControl, Parity, PortConfiguration, StopBits};
use std::io;
use std::os::unix::io::RawFd;

/// Software flow control bits (input flags).
const SOFT_FLOW_BITS: libc::tcflag_t = libc::IXON | libc::IXOFF | libc::IXANY;
/// Parity bits in the input flags.
const PARITY_IFLAG_BITS: libc::tcflag_t = libc::INPCK | libc::PARMRK | libc::IGNPAR;

/// Rewrite a termios image for the given configuration.
///
/// Fails only if the speed cannot be encoded into the structure.
pub(crate) fn configure(tty: &mut libc::termios, config: &PortConfiguration) -> Result<(), PortError> {
    // Transmit and receive speed.
    if unsafe { libc::cfsetspeed(tty, config.baud.speed_flag()) } != 0 {
        return Err(PortError::apply(format!(
            "cfsetspeed({}): {}",
            config.baud,
            io::Error::last_os_error()
        )));
    }

    // Character size.
    tty.c_cflag &= !libc::CSIZE;
    tty.c_cflag |= match config.data_bits {
        DataBits::Five => libc::CS5,
        DataBits::Six => libc::CS6,
        DataBits::Seven => libc::CS7,
        DataBits::Eight => libc::CS8,
    };

    // Local mode, receiver enabled.
    tty.c_cflag |= libc::CLOCAL | libc::CREAD;

    // Ignore break conditions, no CR/NL translation on input.
    tty.c_iflag |= libc::IGNBRK;
    tty.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::IGNCR);

    // Local echo on, raw output.
    tty.c_lflag |= libc::ECHO | libc::ECHOE;
    tty.c_oflag = 0;

    // Read gating: minimum bytes and inter-byte timeout.
    tty.c_cc[libc::VMIN] = config.min_read;
    tty.c_cc[libc::VTIME] = config.read_timeout_ds;

    // Flow control, clear-then-set.
    tty.c_iflag &= !SOFT_FLOW_BITS;
    tty.c_cflag &= !libc::CRTSCTS;
    match config.flow_control {
        FlowControl::None => {}
        FlowControl::Software => tty.c_iflag |= SOFT_FLOW_BITS,
        FlowControl::Hardware => tty.c_cflag |= libc::CRTSCTS,
        FlowControl::SoftwareAndHardware => {
            tty.c_iflag |= SOFT_FLOW_BITS;
            tty.c_cflag |= libc::CRTSCTS;
        }
    }

    // Parity, clear-then-set.
    tty.c_cflag &= !(libc::PARENB | libc::PARODD);
    tty.c_iflag &= !PARITY_IFLAG_BITS;
    match config.parity {
        Parity::Off => {}
        Parity::Even => {
            tty.c_cflag |= libc::PARENB;
            tty.c_iflag |= libc::INPCK;
        }
        Parity::Odd => {
            tty.c_cflag |= libc::PARENB | libc::PARODD;
            tty.c_iflag |= libc::INPCK;
        }
    }

    // Stop bits.
    match config.stop_bits {
        StopBits::One => tty.c_cflag &= !libc::CSTOPB,
        StopBits::Two => tty.c_cflag |= libc::CSTOPB,
    }

    Ok(())
}

/// Read the device's current attributes, rewrite them for `config`, and
/// apply them immediately. On any failure the device is left untouched.
pub(crate) fn apply_to_fd(fd: RawFd, config: &PortConfiguration) -> Result<(), PortError> {
    let mut tty = unsafe { std::mem::zeroed::<libc::termios>() };

    if unsafe { libc::tcgetattr(fd, &mut tty) } != 0 {
        return Err(PortError::apply(format!(
            "tcgetattr: {}",
            io::Error::last_os_error()
        )));
    }

    configure(&mut tty, config)?;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tty) } != 0 {
        return Err(PortError::apply(format!(
            "tcsetattr: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}
