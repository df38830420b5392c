/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Flow-relative sides, and the writing modes that map them onto physical ones.

use std::fmt::{self, Debug, Error, Formatter};

use bitflags::bitflags;
use euclid::default::SideOffsets2D;

bitflags!(
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct WritingMode: u8 {
        /// A vertical writing mode; writing-mode is vertical-rl,
        /// vertical-lr, sideways-lr, or sideways-rl.
        const VERTICAL = 1 << 0;
        /// The inline flow direction is reversed against the physical
        /// direction (i.e. right-to-left or bottom-to-top); writing-mode is
        /// sideways-lr or direction is rtl (but not both).
        const INLINE_REVERSED = 1 << 1;
        /// A vertical writing mode whose block progression direction is left-
        /// to-right; writing-mode is vertical-lr or sideways-lr.
        ///
        /// Never set without VERTICAL.
        const VERTICAL_LR = 1 << 2;
        /// The line-over/line-under sides are inverted with respect to the
        /// block-start/block-end edge; writing-mode is vertical-lr.
        ///
        /// Never set without VERTICAL and VERTICAL_LR.
        const LINE_INVERTED = 1 << 3;
        /// direction is rtl.
        const RTL = 1 << 4;
        /// writing-mode is sideways-rl or sideways-lr.
        ///
        /// Never set without VERTICAL.
        const VERTICAL_SIDEWAYS = 1 << 5;

        /// * writing-mode: horizontal-tb;
        const WRITING_MODE_HORIZONTAL_TB = 0;
        /// * writing-mode: vertical-rl;
        const WRITING_MODE_VERTICAL_RL = WritingMode::VERTICAL.bits();
        /// * writing-mode: vertical-lr;
        const WRITING_MODE_VERTICAL_LR = WritingMode::VERTICAL.bits() |
                                         WritingMode::VERTICAL_LR.bits() |
                                         WritingMode::LINE_INVERTED.bits();
        /// * writing-mode: sideways-rl;
        const WRITING_MODE_SIDEWAYS_RL = WritingMode::VERTICAL.bits() |
                                         WritingMode::VERTICAL_SIDEWAYS.bits();
        /// * writing-mode: sideways-lr;
        const WRITING_MODE_SIDEWAYS_LR = WritingMode::VERTICAL.bits() |
                                         WritingMode::VERTICAL_LR.bits() |
                                         WritingMode::VERTICAL_SIDEWAYS.bits();
    }
);

impl WritingMode {
    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.intersects(WritingMode::VERTICAL)
    }

    /// Assuming .is_vertical(), does the block direction go left to right?
    #[inline]
    pub fn is_vertical_lr(&self) -> bool {
        self.intersects(WritingMode::VERTICAL_LR)
    }

    #[inline]
    pub fn is_bidi_ltr(&self) -> bool {
        !self.intersects(WritingMode::RTL)
    }

    #[inline]
    pub fn is_sideways(&self) -> bool {
        self.intersects(WritingMode::VERTICAL_SIDEWAYS)
    }

    #[inline]
    pub fn block_start_physical_side(&self) -> PhysicalSide {
        LogicalSide::BlockStart.to_physical(*self)
    }

    #[inline]
    pub fn block_end_physical_side(&self) -> PhysicalSide {
        LogicalSide::BlockEnd.to_physical(*self)
    }
}

impl fmt::Display for WritingMode {
    fn fmt(&self, formatter: &mut Formatter) -> Result<(), Error> {
        if self.is_vertical() {
            write!(formatter, "V")?;
            if self.is_vertical_lr() {
                write!(formatter, " LR")?;
            } else {
                write!(formatter, " RL")?;
            }
            if self.is_sideways() {
                write!(formatter, " Sideways")?;
            }
            if self.intersects(WritingMode::LINE_INVERTED) {
                write!(formatter, " Inverted")?;
            }
        } else {
            write!(formatter, "H")?;
        }
        if self.is_bidi_ltr() {
            write!(formatter, " LTR")
        } else {
            write!(formatter, " RTL")
        }
    }
}

/// A block-direction side, relative to the writing mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum LogicalSide {
    BlockStart = 0,
    BlockEnd,
}

impl LogicalSide {
    fn flag(self) -> LogicalSideFlags {
        match self {
            LogicalSide::BlockStart => LogicalSideFlags::BLOCK_START,
            LogicalSide::BlockEnd => LogicalSideFlags::BLOCK_END,
        }
    }

    #[inline]
    pub fn to_physical(self, wm: WritingMode) -> PhysicalSide {
        // Block mapping depends only on vertical+vertical-lr
        static BLOCK_MAPPING: [[PhysicalSide; 2]; 4] = [
            [PhysicalSide::Top, PhysicalSide::Bottom], // horizontal-tb
            [PhysicalSide::Right, PhysicalSide::Left], // vertical-rl
            [PhysicalSide::Bottom, PhysicalSide::Top], // (horizontal-bt)
            [PhysicalSide::Left, PhysicalSide::Right], // vertical-lr
        ];

        let vertical = wm.is_vertical();
        let lr = wm.is_vertical_lr();
        let index = (vertical as usize) | ((lr as usize) << 1);
        BLOCK_MAPPING[index][self as usize]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PhysicalSide {
    Top = 0,
    Right,
    Bottom,
    Left,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct LogicalSideFlags: u8 {
        const BLOCK_START = 1 << 0;
        const BLOCK_END = 1 << 1;
        const BLOCK_BOTH = Self::BLOCK_START.bits() | Self::BLOCK_END.bits();
    }
}

/// A set of flow-relative sides, tagged with the writing mode they are relative to.
///
/// This is what the skip-sides computation produces: the sides whose border and
/// padding are left out when a fragment's decorations are drawn.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct LogicalSides {
    writing_mode: WritingMode,
    sides: LogicalSideFlags,
}

impl LogicalSides {
    pub fn new(writing_mode: WritingMode) -> Self {
        Self {
            writing_mode,
            sides: LogicalSideFlags::empty(),
        }
    }

    #[inline]
    pub fn writing_mode(&self) -> WritingMode {
        self.writing_mode
    }

    #[inline]
    pub fn sides(&self) -> LogicalSideFlags {
        self.sides
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    #[inline]
    pub fn contains(&self, side: LogicalSide) -> bool {
        self.sides.contains(side.flag())
    }

    #[inline]
    pub fn block_start(&self) -> bool {
        self.contains(LogicalSide::BlockStart)
    }

    #[inline]
    pub fn block_end(&self) -> bool {
        self.contains(LogicalSide::BlockEnd)
    }

    pub fn insert(&mut self, side: LogicalSide) {
        self.sides.insert(side.flag());
    }

    pub fn insert_sides(&mut self, sides: LogicalSideFlags) {
        self.sides.insert(sides);
    }

    /// The physical sides in this set, as `top`, `right`, `bottom` and `left` flags.
    pub fn to_physical(&self) -> SideOffsets2D<bool> {
        let mut physical = SideOffsets2D::new(false, false, false, false);
        for side in [LogicalSide::BlockStart, LogicalSide::BlockEnd] {
            if !self.contains(side) {
                continue;
            }
            match side.to_physical(self.writing_mode) {
                PhysicalSide::Top => physical.top = true,
                PhysicalSide::Right => physical.right = true,
                PhysicalSide::Bottom => physical.bottom = true,
                PhysicalSide::Left => physical.left = true,
            }
        }
        physical
    }
}

impl Debug for LogicalSides {
    fn fmt(&self, formatter: &mut Formatter) -> Result<(), Error> {
        write!(formatter, "LogicalSides({}, {:?})", self.writing_mode, self.sides)
    }
}
