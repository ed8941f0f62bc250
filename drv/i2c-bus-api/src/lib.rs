// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contract for a blocking I2C/SMBus bus controller
//!
//! This crate specifies the bus transport consumed by device drivers: a
//! synchronous controller that can probe a 7-bit address for a response,
//! register (and unregister) a device at an address, and perform blocking
//! transmit and transmit-then-receive transactions against a registered
//! device, each under a caller-specified timeout.  The transport itself is
//! implemented elsewhere (an MCU peripheral driver, an emulator, a test
//! double); drivers are written against [`I2cBus`] and never against a
//! concrete controller.
//!
//! Every operation blocks until the bus transaction completes or times out;
//! there is no cancellation.  A bus is a shared resource: drivers assume
//! exclusive, serialized access for the duration of any single operation,
//! and callers wanting concurrency must supply external mutual exclusion.

#![cfg_attr(not(test), no_std)]

use num_derive::FromPrimitive;

/// The response code returned from the bus controller.  These response codes
/// are pretty specific, not because the caller is expected to necessarily
/// handle them differently, but to give upstack software some modicum of
/// context surrounding the error.
#[derive(Copy, Clone, Debug, FromPrimitive, Eq, PartialEq)]
#[repr(u32)]
pub enum ResponseCode {
    /// Malformed response from the controller
    BadResponse = 1,
    /// Bad argument sent to the controller
    BadArg = 2,
    /// Indicated device is invalid or not registered
    NoDevice = 3,
    /// Device address is reserved
    ReservedAddress = 4,
    /// Device does not have the indicated register
    NoRegister = 5,
    /// Bus was spontaneously reset during the operation
    BusReset = 6,
    /// Bus locked up and was reset
    BusLocked = 7,
    /// Controller appeared to be busy and was reset
    ControllerBusy = 8,
    /// Bus error (lost arbitration, NACK mid-transfer, etc.)
    BusError = 9,
    /// Bad device state of unknown origin
    BadDeviceState = 10,
    /// Operation did not complete within the specified timeout
    BusTimeout = 11,
}

///
/// A blocking I2C bus controller.
///
/// `Device` is the controller's opaque per-device resource, handed out by
/// [`add_device`] once a device is registered at an address.  Drivers never
/// inspect its internals; they only pass it back to the controller, and
/// release it exactly once via [`remove_device`].
///
/// [`add_device`]: I2cBus::add_device
/// [`remove_device`]: I2cBus::remove_device
///
pub trait I2cBus {
    /// The controller's opaque handle for a registered device.
    type Device;

    /// Address a start condition to `address` and report whether anything
    /// acknowledged it, giving up after `timeout_ms` milliseconds.  A probe
    /// is a yes/no question, not an error: an unacknowledged address is a
    /// routine outcome.
    fn probe(&mut self, address: u8, timeout_ms: u32) -> bool;

    /// Register a device at the given 7-bit address, returning the
    /// controller's handle for it.
    fn add_device(&mut self, address: u8) -> Result<Self::Device, ResponseCode>;

    /// Unregister a previously added device.  After this returns -- whether
    /// or not it succeeds -- the handle must not be used for further
    /// transactions.
    fn remove_device(
        &mut self,
        device: &mut Self::Device,
    ) -> Result<(), ResponseCode>;

    /// Blocking write of `buf` to the device.
    fn transmit(
        &mut self,
        device: &Self::Device,
        buf: &[u8],
        timeout_ms: u32,
    ) -> Result<(), ResponseCode>;

    /// Blocking write of `out` followed by a read filling `recv`, performed
    /// without an intervening operation on the bus.
    fn transmit_receive(
        &mut self,
        device: &Self::Device,
        out: &[u8],
        recv: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), ResponseCode>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Device = T::Device;

    fn probe(&mut self, address: u8, timeout_ms: u32) -> bool {
        T::probe(self, address, timeout_ms)
    }

    fn add_device(&mut self, address: u8) -> Result<Self::Device, ResponseCode> {
        T::add_device(self, address)
    }

    fn remove_device(
        &mut self,
        device: &mut Self::Device,
    ) -> Result<(), ResponseCode> {
        T::remove_device(self, device)
    }

    fn transmit(
        &mut self,
        device: &Self::Device,
        buf: &[u8],
        timeout_ms: u32,
    ) -> Result<(), ResponseCode> {
        T::transmit(self, device, buf, timeout_ms)
    }

    fn transmit_receive(
        &mut self,
        device: &Self::Device,
        out: &[u8],
        recv: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), ResponseCode> {
        T::transmit_receive(self, device, out, recv, timeout_ms)
    }
}
