// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! I/O Device Trait
//!
//! Register-level view of a memory-mapped peripheral. The bus protocol itself
//! (APB setup/access phases, PSEL/PENABLE/PREADY) is outside this crate: the
//! trait starts where a bus bridge has already decoded a transfer into a
//! 32-bit read or write at a device-relative offset.
//!
//! ```text
//!   bus bridge (external)
//!         │  addr, data, write
//!         ▼
//!   translate(addr) ──▶ offset ──▶ read_register / write_register
//!                                        │
//!                                        ▼
//!                                  RegisterFile decode
//! ```
//!
//! # Example
//!
//! ```
//! use irqarb::core::bus::IODevice;
//! use irqarb::core::error::Result;
//!
//! struct Scratch {
//!     base: u32,
//!     word: u32,
//! }
//!
//! impl IODevice for Scratch {
//!     fn address_range(&self) -> (u32, u32) {
//!         (self.base, self.base + 3)
//!     }
//!
//!     fn read_register(&self, _offset: u32) -> Result<u32> {
//!         Ok(self.word)
//!     }
//!
//!     fn write_register(&mut self, _offset: u32, value: u32) -> Result<()> {
//!         self.word = value;
//!         Ok(())
//!     }
//! }
//!
//! let mut dev = Scratch { base: 0x4000_0000, word: 0 };
//! let offset = dev.translate(0x4000_0000).unwrap();
//! dev.write_register(offset, 7).unwrap();
//! assert_eq!(dev.read_register(offset).unwrap(), 7);
//! ```

use crate::core::error::Result;

/// Trait for memory-mapped register devices
///
/// All accesses are 32-bit words. Offsets are relative to the device base
/// and must be 4-byte aligned; implementations reject anything else.
pub trait IODevice {
    /// Inclusive `(start, end)` physical address range of the device
    fn address_range(&self) -> (u32, u32);

    /// Check if this device contains the given address
    fn contains(&self, addr: u32) -> bool {
        let (start, end) = self.address_range();
        addr >= start && addr <= end
    }

    /// Convert a physical address into a device-relative offset
    ///
    /// # Returns
    ///
    /// `None` if the address is outside this device
    fn translate(&self, addr: u32) -> Option<u32> {
        if self.contains(addr) {
            Some(addr - self.address_range().0)
        } else {
            None
        }
    }

    /// Read a 32-bit register
    ///
    /// # Errors
    ///
    /// Returns an error if the offset does not decode to a readable register.
    fn read_register(&self, offset: u32) -> Result<u32>;

    /// Write a 32-bit register
    ///
    /// # Errors
    ///
    /// Returns an error if the offset does not decode to a writable register
    /// or the written fields are out of range. A rejected write changes nothing.
    fn write_register(&mut self, offset: u32, value: u32) -> Result<()>;

    /// Device name for debugging
    fn name(&self) -> &str {
        "Unknown Device"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ControllerError;

    /// Mock device for testing
    struct MockDevice {
        base: u32,
        registers: Vec<u32>,
    }

    impl MockDevice {
        fn new(base: u32, register_count: usize) -> Self {
            Self {
                base,
                registers: vec![0; register_count],
            }
        }
    }

    impl IODevice for MockDevice {
        fn address_range(&self) -> (u32, u32) {
            (self.base, self.base + (self.registers.len() as u32 * 4) - 1)
        }

        fn read_register(&self, offset: u32) -> Result<u32> {
            self.registers
                .get((offset / 4) as usize)
                .copied()
                .ok_or(ControllerError::InvalidOperation {
                    offset,
                    reason: "no such register",
                })
        }

        fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
            let slot = self.registers.get_mut((offset / 4) as usize).ok_or(
                ControllerError::InvalidOperation {
                    offset,
                    reason: "no such register",
                },
            )?;
            *slot = value;
            Ok(())
        }

        fn name(&self) -> &str {
            "MockDevice"
        }
    }

    #[test]
    fn test_contains_boundaries() {
        let device = MockDevice::new(0x4000_0000, 4);

        assert!(device.contains(0x4000_0000));
        assert!(device.contains(0x4000_000F));
        assert!(!device.contains(0x3FFF_FFFF));
        assert!(!device.contains(0x4000_0010));
    }

    #[test]
    fn test_translate() {
        let device = MockDevice::new(0x4000_0000, 4);
        assert_eq!(device.translate(0x4000_0008), Some(0x08));
        assert_eq!(device.translate(0x4000_0010), None);
    }

    #[test]
    fn test_read_write() {
        let mut device = MockDevice::new(0, 2);
        device.write_register(0x04, 0xDEAD_BEEF).unwrap();
        assert_eq!(device.read_register(0x04).unwrap(), 0xDEAD_BEEF);
        assert_eq!(device.read_register(0x00).unwrap(), 0);
        assert!(device.write_register(0x08, 1).is_err());
    }

    #[test]
    fn test_default_name() {
        struct Nameless;
        impl IODevice for Nameless {
            fn address_range(&self) -> (u32, u32) {
                (0, 0)
            }
            fn read_register(&self, _offset: u32) -> Result<u32> {
                Ok(0)
            }
            fn write_register(&mut self, _offset: u32, _value: u32) -> Result<()> {
                Ok(())
            }
        }

        assert_eq!(Nameless.name(), "Unknown Device");
        assert_eq!(MockDevice::new(0, 1).name(), "MockDevice");
    }
}
