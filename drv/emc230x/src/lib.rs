// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Driver for the Microchip EMC230x family of PWM fan controllers
//!
//! The family spans the EMC2301, the two sub-models of the EMC2302 (which
//! differ only in bus address), the EMC2303 and the EMC2305.  The driver
//! probes the model's candidate addresses, verifies the manufacturer and
//! product identity registers before binding a device, and then offers
//! per-fan PWM drive, tach/RPM readings, and the chip-wide and per-fan
//! configuration bits.  Registers that the chip protects behind its
//! software lock are only ever written through an unlock/write/re-lock
//! bracket.
//!
//! The driver is fully synchronous: every operation round-trips to the
//! hardware (nothing is cached) and blocks until the bus transaction
//! completes or times out.  Callers wanting concurrent access to one
//! device or one bus must supply their own mutual exclusion.

#![cfg_attr(not(test), no_std)]

use bitfield::bitfield;
use drv_i2c_bus_api::{I2cBus, ResponseCode};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use ringbuf::*;

/// SMBus minimum-turnaround-derived timeout applied to every bus
/// transaction.  This is a protocol constant, not a tunable.
const TIMEOUT_MS: u32 = 35;

const EMC2301_ADDRESS: u8 = 0x2f;
const EMC2302_1_ADDRESS: u8 = 0x2e;
const EMC2302_2_ADDRESS: u8 = 0x2f;

// The EMC2303 and EMC2305 can use one of six addresses, selected by the
// pullup resistor on the address selection pin.  The default is 0x2f.
const EMC230X_DEFAULT_ADDRESS: u8 = 0x2f;
const EMC230X_SEL_ADDRESSES: [u8; 6] = [
    0x2c, // 10 kΩ
    0x2d, // 15 kΩ
    0x2e, // 4.7 kΩ
    0x2f, // 6.8 kΩ, default
    0x4c, // 22 kΩ
    0x4d, // 33 kΩ
];

const MANUFACTURER_ID: u8 = 0x5d;

/// Registers with a software-lock annotation cannot be modified unless the
/// LOCK bit (LSB of `SoftwareLock`) is zero; the driver writes them through
/// [`Emc230x::write_reg8_locked`] only.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum Register {
    Configuration = 0x20, // software locked
    FanStatus = 0x24,
    FanStallStatus = 0x25,
    FanSpinStatus = 0x26,
    DriveFailStatus = 0x27,
    FanInterruptEnable = 0x29, // software locked
    PwmPolarityCfg = 0x2a,     // software locked
    PwmOutputCfg = 0x2b,       // software locked
    PwmBaseF45 = 0x2c,         // software locked
    PwmBaseF123 = 0x2d,        // software locked

    Fan1Setting = 0x30,
    Pwm1Divide = 0x31,
    Fan1Cfg1 = 0x32,
    Fan1Cfg2 = 0x33,
    Gain1 = 0x35,
    Fan1SpinUpCfg = 0x36,
    Fan1MaxStep = 0x37,
    Fan1MinDrive = 0x38,
    Fan1ValidTach = 0x39,
    Fan1DriveFailBandLo = 0x3a,
    Fan1DriveFailBandHi = 0x3b,
    Tach1TargetLo = 0x3c,
    Tach1TargetHi = 0x3d,
    Tach1ReadingHi = 0x3e,
    Tach1ReadingLo = 0x3f,

    // Fan 2 registers exist only on the EMC2302/2303/2305
    Fan2Setting = 0x40,
    Pwm2Divide = 0x41,
    Fan2Cfg1 = 0x42,
    Fan2Cfg2 = 0x43,
    Gain2 = 0x45,
    Fan2SpinUpCfg = 0x46,
    Fan2MaxStep = 0x47,
    Fan2MinDrive = 0x48,
    Fan2ValidTach = 0x49,
    Fan2DriveFailBandLo = 0x4a,
    Fan2DriveFailBandHi = 0x4b,
    Tach2TargetLo = 0x4c,
    Tach2TargetHi = 0x4d,
    Tach2ReadingHi = 0x4e,
    Tach2ReadingLo = 0x4f,

    // Fan 3 registers exist only on the EMC2303/2305
    Fan3Setting = 0x50,
    Pwm3Divide = 0x51,
    Fan3Cfg1 = 0x52,
    Fan3Cfg2 = 0x53,
    Gain3 = 0x55,
    Fan3SpinUpCfg = 0x56,
    Fan3MaxStep = 0x57,
    Fan3MinDrive = 0x58,
    Fan3ValidTach = 0x59,
    Fan3DriveFailBandLo = 0x5a,
    Fan3DriveFailBandHi = 0x5b,
    Tach3TargetLo = 0x5c,
    Tach3TargetHi = 0x5d,
    Tach3ReadingHi = 0x5e,
    Tach3ReadingLo = 0x5f,

    // Fan 4 and fan 5 registers exist only on the EMC2305
    Fan4Setting = 0x60,
    Pwm4Divide = 0x61,
    Fan4Cfg1 = 0x62,
    Fan4Cfg2 = 0x63,
    Gain4 = 0x65,
    Fan4SpinUpCfg = 0x66,
    Fan4MaxStep = 0x67,
    Fan4MinDrive = 0x68,
    Fan4ValidTach = 0x69,
    Fan4DriveFailBandLo = 0x6a,
    Fan4DriveFailBandHi = 0x6b,
    Tach4TargetLo = 0x6c,
    Tach4TargetHi = 0x6d,
    Tach4ReadingHi = 0x6e,
    Tach4ReadingLo = 0x6f,

    Fan5Setting = 0x70,
    Pwm5Divide = 0x71,
    Fan5Cfg1 = 0x72,
    Fan5Cfg2 = 0x73,
    Gain5 = 0x75,
    Fan5SpinUpCfg = 0x76,
    Fan5MaxStep = 0x77,
    Fan5MinDrive = 0x78,
    Fan5ValidTach = 0x79,
    Fan5DriveFailBandLo = 0x7a,
    Fan5DriveFailBandHi = 0x7b,
    Tach5TargetLo = 0x7c,
    Tach5TargetHi = 0x7d,
    Tach5ReadingHi = 0x7e,
    Tach5ReadingLo = 0x7f,

    SoftwareLock = 0xef,
    ProductFeatures = 0xfc, // EMC2303/2305 only
    ProductId = 0xfd,
    MfgId = 0xfe,
    Revision = 0xff,
}

/// The chip models of the family.  `Emc2302ModelUnspec` is a detection
/// target only: it asks the detector to try both EMC2302 sub-models, and a
/// successfully bound device always carries the concrete sub-model that
/// matched.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Model {
    Emc2301,
    Emc2302Model1,
    Emc2302Model2,
    Emc2302ModelUnspec,
    Emc2303,
    Emc2305,
}

impl Model {
    /// The value the product identity register must read for this model.
    pub fn product_id(&self) -> u8 {
        match self {
            Model::Emc2301 => 0x37,
            Model::Emc2302Model1
            | Model::Emc2302Model2
            | Model::Emc2302ModelUnspec => 0x36,
            Model::Emc2303 => 0x35,
            Model::Emc2305 => 0x34,
        }
    }

    /// The finite set of bus addresses at which this model may legally
    /// appear.  An unspecified EMC2302 has no legal *explicit* address;
    /// detection for it iterates both sub-model addresses instead.
    fn legal_addresses(&self) -> &'static [u8] {
        match self {
            Model::Emc2301 => &[EMC2301_ADDRESS],
            Model::Emc2302Model1 => &[EMC2302_1_ADDRESS],
            Model::Emc2302Model2 => &[EMC2302_2_ADDRESS],
            Model::Emc2302ModelUnspec => &[],
            Model::Emc2303 | Model::Emc2305 => &EMC230X_SEL_ADDRESSES,
        }
    }

    /// The addresses tried, in order, when no explicit address is given.
    /// The selectable-address models are only probed at their default
    /// address unless the caller overrides it.
    fn candidate_addresses(&self) -> &'static [u8] {
        match self {
            Model::Emc2302ModelUnspec => {
                &[EMC2302_1_ADDRESS, EMC2302_2_ADDRESS]
            }
            Model::Emc2303 | Model::Emc2305 => &[EMC230X_DEFAULT_ADDRESS],
            _ => self.legal_addresses(),
        }
    }

    /// The concrete model implied by a successful match at `address`.
    fn resolve(&self, address: u8) -> Model {
        match self {
            Model::Emc2302ModelUnspec => {
                if address == EMC2302_1_ADDRESS {
                    Model::Emc2302Model1
                } else {
                    Model::Emc2302Model2
                }
            }
            _ => *self,
        }
    }

    /// The highest valid zero-based fan index for this model, or `None`
    /// for the unresolved-EMC2302 sentinel, which must never appear on a
    /// bound device.
    pub fn max_fan_index(&self) -> Option<u8> {
        match self {
            Model::Emc2301 => Some(0),
            Model::Emc2302Model1 | Model::Emc2302Model2 => Some(0),
            Model::Emc2302ModelUnspec => None,
            Model::Emc2303 => Some(1),
            Model::Emc2305 => Some(3),
        }
    }
}

/// The register map carries five fan slots regardless of model.
pub const MAX_FANS: u8 = 5;

/// A validated zero-based fan index.  This is *not* the number of the fan:
/// fan numbers in the datasheet have a 1-based index.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Fan(u8);

impl Fan {
    /// Per-fan registers repeat at a 0x10 stride from the fan 1 block.
    fn register(&self, base: Register) -> Register {
        Register::from_u8((base as u8) + self.0 * 0x10).unwrap()
    }

    fn setting(&self) -> Register {
        self.register(Register::Fan1Setting)
    }

    fn tach_reading_hi(&self) -> Register {
        self.register(Register::Tach1ReadingHi)
    }

    fn tach_reading_lo(&self) -> Register {
        self.register(Register::Tach1ReadingLo)
    }

    /// The fan's bit in the shared single-bit-per-fan registers
    /// (interrupt enable, PWM polarity, PWM output configuration).
    fn bit(&self) -> u8 {
        1 << self.0
    }
}

/// PWM base frequency selection for a fan driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PwmBaseFrequency {
    Freq26000Hz = 0b00,
    Freq19531Hz = 0b01,
    Freq4882Hz = 0b10,
    Freq2441Hz = 0b11,
}

bitfield! {
    pub struct PwmBaseF123(u8);
    _, set_pwm3: 5, 4;
    _, set_pwm2: 3, 2;
    _, set_pwm1: 1, 0;
}

bitfield! {
    pub struct PwmBaseF45(u8);
    _, set_pwm5: 3, 2;
    _, set_pwm4: 1, 0;
}

/// Fan speed in rotations per minute.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Rpm(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A register read failed at the bus level.
    BadRegisterRead { reg: Register, code: ResponseCode },
    /// A register write failed at the bus level.
    BadRegisterWrite { reg: Register, code: ResponseCode },
    /// No candidate address yielded a device with the model's identity.
    NotDetected { model: Model },
    /// The caller supplied an address that is not legal for the model.
    BadAddress { model: Model, address: u8 },
    /// The fan index exceeds the bound model's highest valid index.
    BadFanIndex { index: u8, max: u8 },
    /// The tach count read as zero, which the chip does not produce for a
    /// merely stopped fan; the sensor input is missing or stalled.
    TachStalled { index: u8 },
    /// A bound device carried a model that detection can never bind; this
    /// indicates a programming defect, not a runtime condition.
    BadModelState { model: Model },
}

impl From<Error> for ResponseCode {
    fn from(err: Error) -> Self {
        match err {
            Error::BadRegisterRead { code, .. } => code,
            Error::BadRegisterWrite { code, .. } => code,
            Error::NotDetected { .. } => ResponseCode::NoDevice,
            Error::BadAddress { .. } => ResponseCode::BadArg,
            Error::BadFanIndex { .. } => ResponseCode::BadArg,
            Error::TachStalled { .. } => ResponseCode::BadDeviceState,
            Error::BadModelState { .. } => ResponseCode::BadDeviceState,
        }
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    None,
    NoProbeResponse(u8),
    ProbeResponse(u8),
    AddFailed { address: u8, code: ResponseCode },
    IdentityReadFailed { address: u8, reg: Register, code: ResponseCode },
    BadIdentity { address: u8, reg: Register, value: u8 },
    Detected { address: u8, product_id: u8 },
    RemoveFailed(u8),
    RelockFailed,
    BadFanIndex { index: u8, max: u8 },
    BadModel(Model),
    ZeroTach(u8),
}

ringbuf!(Trace, 16, Trace::None);

/// A bound EMC230x device: a verified model at a verified address, plus
/// the bus controller's handle for it.  The handle is released back to the
/// bus exactly once, on drop.
pub struct Emc230x<B: I2cBus> {
    bus: B,
    device: B::Device,
    model: Model,
    address: u8,
    product_id: u8,
}

impl<B: I2cBus> Emc230x<B> {
    /// Detect a device of `model`, probing the model's candidate addresses
    /// in their fixed order.  The first candidate whose manufacturer and
    /// product identity registers both match wins; a responding device
    /// with the wrong identity is unregistered from the bus (best effort)
    /// before the next candidate is tried.
    pub fn detect(bus: B, model: Model) -> Result<Self, Error> {
        Self::detect_inner(bus, model, None)
    }

    /// Like [`detect`], but at one explicit address, which must be a
    /// member of the model's legal address set.  An illegal address fails
    /// before any bus traffic.
    ///
    /// [`detect`]: Emc230x::detect
    pub fn detect_at_address(
        bus: B,
        model: Model,
        address: u8,
    ) -> Result<Self, Error> {
        Self::detect_inner(bus, model, Some(address))
    }

    fn detect_inner(
        mut bus: B,
        model: Model,
        address: Option<u8>,
    ) -> Result<Self, Error> {
        let explicit;

        let candidates: &[u8] = match address {
            Some(addr) => {
                if !model.legal_addresses().contains(&addr) {
                    return Err(Error::BadAddress {
                        model,
                        address: addr,
                    });
                }
                explicit = [addr];
                &explicit
            }
            None => model.candidate_addresses(),
        };

        let product_id = model.product_id();

        for &addr in candidates {
            if let Some(device) =
                Self::probe_candidate(&mut bus, addr, product_id)
            {
                ringbuf_entry!(Trace::Detected {
                    address: addr,
                    product_id,
                });

                return Ok(Self {
                    bus,
                    device,
                    model: model.resolve(addr),
                    address: addr,
                    product_id,
                });
            }
        }

        Err(Error::NotDetected { model })
    }

    /// Probe one candidate address.  Only a verified identity produces a
    /// device; every other outcome -- no probe response, a failed open, a
    /// failed identity read, a mismatched identity -- is traced and
    /// reported as `None` so the detection loop can move on.
    fn probe_candidate(
        bus: &mut B,
        address: u8,
        product_id: u8,
    ) -> Option<B::Device> {
        if !bus.probe(address, TIMEOUT_MS) {
            ringbuf_entry!(Trace::NoProbeResponse(address));
            return None;
        }

        ringbuf_entry!(Trace::ProbeResponse(address));

        let mut device = match bus.add_device(address) {
            Ok(device) => device,
            Err(code) => {
                ringbuf_entry!(Trace::AddFailed { address, code });
                return None;
            }
        };

        let mut verify = |reg, expected| {
            match Self::read_device_reg(bus, &device, reg) {
                Ok(value) if value == expected => true,
                Ok(value) => {
                    ringbuf_entry!(Trace::BadIdentity {
                        address,
                        reg,
                        value,
                    });
                    false
                }
                Err(code) => {
                    ringbuf_entry!(Trace::IdentityReadFailed {
                        address,
                        reg,
                        code,
                    });
                    false
                }
            }
        };

        if verify(Register::MfgId, MANUFACTURER_ID)
            && verify(Register::ProductId, product_id)
        {
            return Some(device);
        }

        // The device didn't respond with the expected identity; it is some
        // other chip sharing the address.  Unregister it and let the caller
        // try the next candidate.
        if bus.remove_device(&mut device).is_err() {
            ringbuf_entry!(Trace::RemoveFailed(address));
        }

        None
    }

    fn read_device_reg(
        bus: &mut B,
        device: &B::Device,
        reg: Register,
    ) -> Result<u8, ResponseCode> {
        let mut val = [0u8; 1];
        bus.transmit_receive(device, &[reg as u8], &mut val, TIMEOUT_MS)?;
        Ok(val[0])
    }

    /// The concrete model that was bound at detection time.
    pub fn model(&self) -> Model {
        self.model
    }

    /// The bus address the device was bound at.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The product identity verified at detection time.  It is not
    /// re-verified afterwards, so it is stale if the hardware has been
    /// hot-swapped.
    pub fn product_id(&self) -> u8 {
        self.product_id
    }

    /// The number of fans the bound model drives.
    pub fn fan_count(&self) -> Result<u8, Error> {
        Ok(self.max_fan_index()? + 1)
    }

    fn max_fan_index(&self) -> Result<u8, Error> {
        match self.model.max_fan_index() {
            Some(max) => Ok(max),
            None => {
                ringbuf_entry!(Trace::BadModel(self.model));
                Err(Error::BadModelState { model: self.model })
            }
        }
    }

    /// Validate a zero-based fan index against the bound model.
    fn fan(&self, index: u8) -> Result<Fan, Error> {
        let max = self.max_fan_index()?;

        if index > max {
            ringbuf_entry!(Trace::BadFanIndex { index, max });
            return Err(Error::BadFanIndex { index, max });
        }

        Ok(Fan(index))
    }

    fn read_reg8(&mut self, reg: Register) -> Result<u8, Error> {
        Self::read_device_reg(&mut self.bus, &self.device, reg)
            .map_err(|code| Error::BadRegisterRead { reg, code })
    }

    fn write_reg8(&mut self, reg: Register, val: u8) -> Result<(), Error> {
        self.bus
            .transmit(&self.device, &[reg as u8, val], TIMEOUT_MS)
            .map_err(|code| Error::BadRegisterWrite { reg, code })
    }

    /// Write a software-locked register: clear the lock, write the
    /// payload, and set the lock again.  If the unlock write fails the
    /// payload is never attempted.  If the payload write fails, the
    /// re-lock is still attempted -- the protected range must not be left
    /// unlocked on an error path -- and the payload's error is the one
    /// propagated.  A re-lock failure after a successful payload write is
    /// propagated itself.
    fn write_reg8_locked(
        &mut self,
        reg: Register,
        val: u8,
    ) -> Result<(), Error> {
        self.write_reg8(Register::SoftwareLock, 0)?;

        let payload = self.write_reg8(reg, val);
        let relock = self.write_reg8(Register::SoftwareLock, 1);

        if relock.is_err() {
            ringbuf_entry!(Trace::RelockFailed);
        }

        payload.and(relock)
    }

    /// Read-modify-write of the configuration register: keep the bits in
    /// `mask`, then or-in `bits` if `enabled`.
    fn update_config(
        &mut self,
        mask: u8,
        bits: u8,
        enabled: bool,
    ) -> Result<(), Error> {
        let current = self.read_reg8(Register::Configuration)?;
        let val = (current & mask) | if enabled { bits } else { 0 };
        self.write_reg8_locked(Register::Configuration, val)
    }

    /// Set or clear one fan's bit in a shared single-bit-per-fan register,
    /// preserving every other fan's bit.
    fn update_fan_bit(
        &mut self,
        index: u8,
        reg: Register,
        enabled: bool,
    ) -> Result<(), Error> {
        let fan = self.fan(index)?;
        let current = self.read_reg8(reg)?;

        let val = if enabled {
            current | fan.bit()
        } else {
            current & !fan.bit()
        };

        self.write_reg8_locked(reg, val)
    }

    /// Drive the CLK pin as a push-pull output of the internal clock
    /// source.
    pub fn set_clock_output(&mut self) -> Result<(), Error> {
        self.update_config(0xfc, 0b10, true)
    }

    /// Use the CLK pin as the tachometer measurement clock.
    pub fn set_clock_input(&mut self) -> Result<(), Error> {
        self.update_config(0xfc, 0b01, true)
    }

    /// Use the local oscillator (the power-on default), leaving the CLK
    /// pin alone.
    pub fn set_clock_local(&mut self) -> Result<(), Error> {
        self.update_config(0xfc, 0b00, false)
    }

    /// Assert or clear the alert mask bit.  Masked (the power-on default)
    /// suppresses the ALERT# pin.
    pub fn set_alert_mask(&mut self, masked: bool) -> Result<(), Error> {
        self.update_config(0x7f, 0x80, masked)
    }

    /// Control the SMBus timeout function bit of the configuration
    /// register.
    pub fn set_timeout(&mut self, enabled: bool) -> Result<(), Error> {
        self.update_config(0xbf, 0x40, enabled)
    }

    /// Enable or disable the watchdog timer.
    pub fn set_watchdog(&mut self, enabled: bool) -> Result<(), Error> {
        self.update_config(0xdf, 0x20, enabled)
    }

    /// Enable or disable a fan's contribution to the ALERT# interrupt.
    pub fn set_interrupt(
        &mut self,
        index: u8,
        enabled: bool,
    ) -> Result<(), Error> {
        self.update_fan_bit(index, Register::FanInterruptEnable, enabled)
    }

    /// Invert (or restore) the polarity of a fan's PWM output.
    pub fn set_pwm_polarity(
        &mut self,
        index: u8,
        inverted: bool,
    ) -> Result<(), Error> {
        self.update_fan_bit(index, Register::PwmPolarityCfg, inverted)
    }

    /// Select push-pull (true) or open-drain (false) drive for a fan's
    /// PWM output.
    pub fn set_pwm_push_pull(
        &mut self,
        index: u8,
        push_pull: bool,
    ) -> Result<(), Error> {
        self.update_fan_bit(index, Register::PwmOutputCfg, push_pull)
    }

    /// Select the PWM base frequency for a fan driver.
    pub fn set_pwm_base_frequency(
        &mut self,
        index: u8,
        freq: PwmBaseFrequency,
    ) -> Result<(), Error> {
        let fan = self.fan(index)?;

        let (reg, val) = if fan.0 < 3 {
            let reg = Register::PwmBaseF123;
            let mut f = PwmBaseF123(self.read_reg8(reg)?);

            match fan.0 {
                0 => f.set_pwm1(freq as u8),
                1 => f.set_pwm2(freq as u8),
                _ => f.set_pwm3(freq as u8),
            }

            (reg, f.0)
        } else {
            let reg = Register::PwmBaseF45;
            let mut f = PwmBaseF45(self.read_reg8(reg)?);

            match fan.0 {
                3 => f.set_pwm4(freq as u8),
                _ => f.set_pwm5(freq as u8),
            }

            (reg, f.0)
        };

        self.write_reg8_locked(reg, val)
    }

    /// Set the drive setting for a fan: the raw 8-bit duty value, not a
    /// percentage.
    pub fn set_pwm(&mut self, index: u8, pwm: u8) -> Result<(), Error> {
        let fan = self.fan(index)?;
        self.write_reg8(fan.setting(), pwm)
    }

    /// Read back the drive setting for a fan.
    pub fn pwm(&mut self, index: u8) -> Result<u8, Error> {
        let fan = self.fan(index)?;
        self.read_reg8(fan.setting())
    }

    /// Read the raw tach count for a fan: an 11-bit count of clock edges
    /// between tach pulses, packed across the two tach reading registers
    /// with the low three bits of the low byte unused.
    pub fn tach(&mut self, index: u8) -> Result<u16, Error> {
        let fan = self.fan(index)?;

        let hi = self.read_reg8(fan.tach_reading_hi())?;
        let lo = self.read_reg8(fan.tach_reading_lo())?;

        Ok((u16::from(hi) << 5) + (u16::from(lo) >> 3))
    }

    /// Derive the fan's speed from its tach count.
    ///
    /// This assumes a two-pole, five-edge fan, the 32.768 kHz internal
    /// clock, and the default tach range multiplier (RANGE field at 00);
    /// the driver does not read the fan's RANGE field, so a reconfigured
    /// multiplier yields proportionally wrong results.  A zero count is
    /// reported as a stalled sensor rather than dividing by it.
    pub fn rpm(&mut self, index: u8) -> Result<Rpm, Error> {
        let count = u32::from(self.tach(index)?);

        if count == 0 {
            ringbuf_entry!(Trace::ZeroTach(index));
            return Err(Error::TachStalled { index });
        }

        const EDGES: u32 = 5;
        const FREQ: u32 = 32768;
        const POLES: u32 = 2;

        Ok(Rpm((EDGES - 1) * FREQ * 60 / (POLES * count)))
    }

    /// Read the chip revision register.
    pub fn revision(&mut self) -> Result<u8, Error> {
        self.read_reg8(Register::Revision)
    }
}

impl<B: I2cBus> Drop for Emc230x<B> {
    fn drop(&mut self) {
        // Best effort: a failure to unregister is traced, not propagated.
        if self.bus.remove_device(&mut self.device).is_err() {
            ringbuf_entry!(Trace::RemoveFailed(self.address));
        }
    }
}
