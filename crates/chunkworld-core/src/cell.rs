//! Packed 8-bit cell encoding.
//!
//! Bit 0 marks an occupant, bit 1 is a reserved link flag, and the remaining
//! six bits hold three 2-bit color channels. Each channel keeps its low bit in
//! bits 2..=4 and its high bit in bits 5..=7.

use serde::{Deserialize, Serialize};

/// Bit index of the occupancy flag.
pub const BIT_OCCUPIED: u8 = 0;

/// Bit index of the reserved link flag.
pub const BIT_LINKED: u8 = 1;

/// One of the three color channels of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red channel.
    Red,
    /// Green channel.
    Green,
    /// Blue channel.
    Blue,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Returns the `(low, high)` bit indices of this channel.
    #[must_use]
    pub const fn bits(self) -> (u8, u8) {
        match self {
            Channel::Red => (2, 5),
            Channel::Green => (3, 6),
            Channel::Blue => (4, 7),
        }
    }
}

/// A single packed cell value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(u8);

impl Cell {
    /// The zero cell: unoccupied, unlinked, black.
    pub const EMPTY: Cell = Cell(0);

    /// Wraps a raw byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Returns the raw byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Builds an unoccupied cell with the given channel values (each taken mod 4).
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        let (r0, r1) = Channel::Red.bits();
        let (g0, g1) = Channel::Green.bits();
        let (b0, b1) = Channel::Blue.bits();
        Self::EMPTY
            .set2(r0, r1, red)
            .set2(g0, g1, green)
            .set2(b0, b1, blue)
    }

    /// Reads a single bit.
    #[must_use]
    pub const fn get_bit(self, bit: u8) -> bool {
        (self.0 >> bit) & 1 == 1
    }

    /// Returns a copy with `bit` set or cleared.
    #[must_use]
    pub const fn set_bit(self, bit: u8, on: bool) -> Self {
        let mask = 1u8 << bit;
        if on {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    /// Reads a 2-bit field stored at `low` (weight 1) and `high` (weight 2).
    #[must_use]
    pub const fn get2(self, low: u8, high: u8) -> u8 {
        (((self.0 >> high) & 1) << 1) | ((self.0 >> low) & 1)
    }

    /// Returns a copy with the 2-bit field at `low`/`high` set to `value mod 4`.
    #[must_use]
    pub const fn set2(self, low: u8, high: u8, value: u8) -> Self {
        let value = value & 0b11;
        let cleared = self.0 & !((1u8 << low) | (1u8 << high));
        Self(cleared | ((value & 1) << low) | (((value >> 1) & 1) << high))
    }

    /// Reads one color channel (0..=3).
    #[must_use]
    pub const fn channel(self, channel: Channel) -> u8 {
        let (low, high) = channel.bits();
        self.get2(low, high)
    }

    /// Returns a copy with one color channel replaced (value taken mod 4).
    #[must_use]
    pub const fn with_channel(self, channel: Channel, value: u8) -> Self {
        let (low, high) = channel.bits();
        self.set2(low, high, value)
    }

    /// Returns `true` if a session currently renders on this cell.
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        self.get_bit(BIT_OCCUPIED)
    }

    /// Returns the reserved link flag.
    #[must_use]
    pub const fn is_linked(self) -> bool {
        self.get_bit(BIT_LINKED)
    }

    /// Advances every color channel by one, wrapping 3 back to 0.
    #[must_use]
    pub const fn increment_color(self) -> Self {
        let mut cell = self;
        let mut i = 0;
        while i < Channel::ALL.len() {
            let channel = Channel::ALL[i];
            cell = cell.with_channel(channel, cell.channel(channel) + 1);
            i += 1;
        }
        cell
    }

    /// Returns this color with the occupant flag set.
    #[must_use]
    pub const fn with_occupant(self) -> Self {
        self.set_bit(BIT_OCCUPIED, true)
    }

    /// Returns this cell with the occupant flag cleared, keeping its color.
    #[must_use]
    pub const fn without_occupant(self) -> Self {
        self.set_bit(BIT_OCCUPIED, false)
    }
}
