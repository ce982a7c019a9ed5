//! Cycle inputs for the situations the cart runs into

use cartwatch_core::{AmbientSample, Channel, CycleInput, ElectricalSample, LeakSample};

/// Healthy mains, nothing drawing current
pub fn idle(voltage: f32) -> ElectricalSample {
    ElectricalSample::reading(voltage, 0.0, 0.0, 50.0, 0.0)
}

/// Device running at `current` amps
pub fn running(voltage: f32, current: f32) -> ElectricalSample {
    ElectricalSample::reading(voltage, current, voltage * current * 0.9, 50.0, 0.9)
}

/// Comfortable theatre, no leakage
pub fn quiet_sensors(input: CycleInput) -> CycleInput {
    input
        .with_ambient(AmbientSample::reading(22.0, 50.0))
        .with_leak(LeakSample::reading(0.2))
}

/// Every socket powered and idle at `voltage`
pub fn all_idle(voltage: f32) -> CycleInput {
    let mut input = quiet_sensors(CycleInput::unpowered());
    for channel in Channel::ALL {
        input = input.with_channel(channel, idle(voltage));
    }
    input
}

/// Every socket powered, every device running within its limits
pub fn all_running(voltage: f32) -> CycleInput {
    let currents = [0.3, 0.3, 0.2, 0.1, 1.0, 1.0];
    let mut input = quiet_sensors(CycleInput::unpowered());
    for channel in Channel::ALL {
        input = input.with_channel(channel, running(voltage, currents[channel.index()]));
    }
    input
}

/// Cart unplugged, ambient and leak sensors still on their own supply
pub fn cart_unplugged() -> CycleInput {
    quiet_sensors(CycleInput::unpowered())
}
