//! Rectangles and screens.

use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A window or screen rectangle in virtual screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// A rectangle from its position and size
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge, exclusive. Computed in `i64`; persisted bounds may sit at the `i32` limits.
    #[must_use]
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Bottom edge, exclusive
    #[must_use]
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// True if `other` lies entirely inside this rectangle
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True if the point lies inside this rectangle
    #[must_use]
    pub fn contains_point(&self, x: i64, y: i64) -> bool {
        i64::from(self.x) <= x && x < self.right() && i64::from(self.y) <= y && y < self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}, {}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Rect {
    type Err = Error;

    /// Parses `x, y, width, height`.
    fn from_str(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        let [x, y, width, height] = parts.as_slice() else {
            return Err(Error::InvalidArgument(format!(
                "'{text}' is not a rectangle (x, y, width, height)"
            )));
        };

        let number = |part: &str| {
            part.parse::<i32>()
                .map_err(|_| Error::InvalidArgument(format!("'{part}' is not a number in '{text}'")))
        };

        Ok(Rect::new(number(x)?, number(y)?, number(width)?, number(height)?))
    }
}

/// A display attached to the desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Device name, e.g. `\\.\DISPLAY1`
    pub device_name: String,
    /// Full screen area
    pub bounds: Rect,
    /// Screen area minus task bars and docked windows
    pub working_area: Rect,
    /// True for the primary screen
    pub primary: bool,
}

/// The primary screen of `screens`, or the first one when none is flagged primary.
#[must_use]
pub fn primary_screen(screens: &[Screen]) -> Option<&Screen> {
    screens
        .iter()
        .find(|screen| screen.primary)
        .or_else(|| screens.first())
}

/// The screen showing most of `bounds`: the one containing its center, else the primary one.
#[must_use]
pub fn screen_of<'a>(screens: &'a [Screen], bounds: &Rect) -> Option<&'a Screen> {
    let center_x = i64::from(bounds.x) + i64::from(bounds.width) / 2;
    let center_y = i64::from(bounds.y) + i64::from(bounds.height) / 2;

    screens
        .iter()
        .find(|screen| screen.bounds.contains_point(center_x, center_y))
        .or_else(|| primary_screen(screens))
}
