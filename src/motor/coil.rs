//! Motor windings driven from digital outputs.

use embedded_hal::digital::OutputPin;

use crate::error::{MotorError, Result};

use super::drive::WindingState;

/// One stepper winding on a digital output.
///
/// `is_active` reflects the last commanded value, not sensed voltage.
#[derive(Debug)]
pub struct Coil<P: OutputPin> {
    pin: P,
    active: bool,
}

impl<P: OutputPin> Coil<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(pin: P) -> Result<Self> {
        let mut coil = Self { pin, active: false };
        coil.deactivate()?;
        Ok(coil)
    }

    /// Energise the winding.
    pub fn activate(&mut self) -> Result<()> {
        self.pin.set_high().map_err(|_| MotorError::PinError)?;
        self.active = true;
        Ok(())
    }

    /// De-energise the winding.
    pub fn deactivate(&mut self) -> Result<()> {
        self.pin.set_low().map_err(|_| MotorError::PinError)?;
        self.active = false;
        Ok(())
    }

    /// Drive the winding to `on`.
    #[inline]
    pub fn set(&mut self, on: bool) -> Result<()> {
        if on {
            self.activate()
        } else {
            self.deactivate()
        }
    }

    /// Last commanded state.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}

/// The four windings of a unipolar stepper.
#[derive(Debug)]
pub struct Coils<P: OutputPin> {
    a1: Coil<P>,
    b1: Coil<P>,
    a2: Coil<P>,
    b2: Coil<P>,
}

impl<P: OutputPin> Coils<P> {
    /// Build the coil set from pins in a1, b1, a2, b2 order. Every pin is driven low.
    pub fn new(a1: P, b1: P, a2: P, b2: P) -> Result<Self> {
        Ok(Self {
            a1: Coil::new(a1)?,
            b1: Coil::new(b1)?,
            a2: Coil::new(a2)?,
            b2: Coil::new(b2)?,
        })
    }

    /// Apply a winding state to all four coils.
    pub fn set_state(&mut self, state: WindingState) -> Result<()> {
        self.a1.set(state.a1)?;
        self.b1.set(state.b1)?;
        self.a2.set(state.a2)?;
        self.b2.set(state.b2)
    }

    /// Switch every coil off.
    pub fn deactivate(&mut self) -> Result<()> {
        self.set_state(WindingState::OFF)
    }

    /// Commanded state of the four coils.
    pub fn state(&self) -> WindingState {
        WindingState::new(
            self.a1.is_active(),
            self.b1.is_active(),
            self.a2.is_active(),
            self.b2.is_active(),
        )
    }

    /// Give the pins back in a1, b1, a2, b2 order.
    pub fn release(self) -> [P; 4] {
        [
            self.a1.release(),
            self.b1.release(),
            self.a2.release(),
            self.b2.release(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_new_coil_drives_low() {
        let pin = PinMock::new(&[Transaction::set(State::Low)]);
        let coil = Coil::new(pin).unwrap();
        assert!(!coil.is_active());
        coil.release().done();
    }

    #[test]
    fn test_activate_then_deactivate() {
        let pin = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let mut coil = Coil::new(pin).unwrap();

        coil.activate().unwrap();
        assert!(coil.is_active());

        coil.deactivate().unwrap();
        assert!(!coil.is_active());

        coil.release().done();
    }

    #[test]
    fn test_set_state_drives_matching_coils() {
        let expect = |on: State| [Transaction::set(State::Low), Transaction::set(on)];
        let a1 = PinMock::new(&expect(State::High));
        let b1 = PinMock::new(&expect(State::Low));
        let a2 = PinMock::new(&expect(State::Low));
        let b2 = PinMock::new(&expect(State::High));

        let mut coils = Coils::new(a1, b1, a2, b2).unwrap();
        coils.set_state(WindingState::new(true, false, false, true)).unwrap();
        assert_eq!(coils.state(), WindingState::new(true, false, false, true));

        for mut pin in coils.release() {
            pin.done();
        }
    }
}
