//! Built-in tiles: junction boxes, lamps, switches and logic gates.
//!
//! Signals are pulses: a lamp toggles the channels it receives, a gate
//! toggles the level of the input a pulse arrives on, and a switch emits a
//! pulse whenever it is flipped.

use serde::{Deserialize, Serialize};
use std::any::Any;

use wiregrid_core::{JunctionOrientation, WireMask};

use crate::tile::{Tile, TileContext, TileSignal};

macro_rules! impl_any {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

/// Redirects wire channels passing through its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JunctionBox {
    pub orientation: JunctionOrientation,
}

impl JunctionBox {
    pub fn new(orientation: JunctionOrientation) -> Self {
        Self { orientation }
    }
}

impl Tile for JunctionBox {
    fn kind(&self) -> &'static str {
        "junction"
    }

    fn junction(&self) -> Option<JunctionOrientation> {
        Some(self.orientation)
    }

    fn on_wire_signal(&mut self, _ctx: &mut TileContext<'_>, _signal: &TileSignal) {}

    impl_any!();
}

/// Indicator that flips the channels it listens to on every pulse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lamp {
    pub channels: WireMask,
    lit: WireMask,
    pulses: u64,
}

impl Lamp {
    pub fn new(channels: WireMask) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }

    /// Channels currently lit
    pub fn lit(&self) -> WireMask {
        self.lit
    }

    pub fn is_lit(&self) -> bool {
        !self.lit.is_empty()
    }

    /// Number of pulses that reached a listened channel
    pub fn pulses(&self) -> u64 {
        self.pulses
    }
}

impl Tile for Lamp {
    fn kind(&self) -> &'static str {
        "lamp"
    }

    fn on_wire_signal(&mut self, _ctx: &mut TileContext<'_>, signal: &TileSignal) {
        let hit = signal.mask & self.channels;
        if hit.is_empty() {
            return;
        }
        self.lit = self.lit ^ hit;
        self.pulses += 1;
    }

    impl_any!();
}

/// Toggle that pulses its channels when flipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Switch {
    pub channels: WireMask,
    on: bool,
}

impl Switch {
    pub fn new(channels: WireMask) -> Self {
        Self { channels, on: false }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Tile for Switch {
    fn kind(&self) -> &'static str {
        "switch"
    }

    fn on_wire_signal(&mut self, _ctx: &mut TileContext<'_>, _signal: &TileSignal) {}

    fn on_interact(&mut self, ctx: &mut TileContext<'_>) {
        self.on = !self.on;
        ctx.emit_from_footprint(self.channels);
    }

    impl_any!();
}

/// Boolean function of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    /// Inverts input A; input B is ignored
    Not,
    /// Repeats input A; input B is ignored
    Buffer,
}

impl GateKind {
    pub const fn eval(self, a: bool, b: bool) -> bool {
        match self {
            GateKind::And => a && b,
            GateKind::Or => a || b,
            GateKind::Xor => a ^ b,
            GateKind::Nand => !(a && b),
            GateKind::Nor => !(a || b),
            GateKind::Xnor => !(a ^ b),
            GateKind::Not => !a,
            GateKind::Buffer => a,
        }
    }
}

/// Two-input gate tracking input levels from pulses.
///
/// A pulse on an input channel flips that input's level. When the result
/// changes the gate pulses its output channels from its own cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicGate {
    pub kind: GateKind,
    pub input_a: WireMask,
    pub input_b: WireMask,
    pub output: WireMask,
    a: bool,
    b: bool,
    out: bool,
}

impl LogicGate {
    pub fn new(kind: GateKind, input_a: WireMask, input_b: WireMask, output: WireMask) -> Self {
        Self {
            kind,
            input_a,
            input_b,
            output,
            a: false,
            b: false,
            out: false,
        }
    }

    pub fn inputs(&self) -> (bool, bool) {
        (self.a, self.b)
    }

    pub fn output_level(&self) -> bool {
        self.out
    }

    fn settle(&mut self, ctx: &mut TileContext<'_>) {
        let out = self.kind.eval(self.a, self.b);
        if out != self.out {
            self.out = out;
            ctx.emit_from_footprint(self.output);
        }
    }
}

impl Tile for LogicGate {
    fn kind(&self) -> &'static str {
        "gate"
    }

    fn on_created(&mut self, ctx: &mut TileContext<'_>) {
        // Inverting gates start high
        self.settle(ctx);
    }

    fn on_wire_signal(&mut self, ctx: &mut TileContext<'_>, signal: &TileSignal) {
        // Own output coming back around
        if ctx.footprint().contains(signal.origin) {
            return;
        }
        if signal.mask.intersects(self.input_a) {
            self.a = !self.a;
        }
        if signal.mask.intersects(self.input_b) {
            self.b = !self.b;
        }
        self.settle(ctx);
    }

    impl_any!();
}
