//! Trend arrow geometry
//!
//! An arrow is a shaft from the origin plus a two-segment tip at the shaft's
//! end. The "double" trends are two single arrows side by side. Layout is a
//! pure function of direction, origin, length and screen size; drawing the
//! strokes is left to [`crate::pixoo::Pixoo::draw_arrow`].

use core::fmt;

use embedded_graphics::prelude::Point;

use crate::pixoo::graphics::clamp_point;

/// Shaft length used when the caller does not pick one
pub const DEFAULT_LENGTH: i32 = 7;

/// Shorter arrows are visually degenerate
pub const MIN_LENGTH: i32 = 3;

/// Drawn instead of an arrow for trend tokens without a glyph
pub const UNKNOWN_GLYPH: &str = "???";

/// Nightscout trend direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Flat,
    FortyFiveUp,
    FortyFiveDown,
    SingleUp,
    SingleDown,
    DoubleUp,
    DoubleDown,
    /// Any other token (`NONE`, `NOT COMPUTABLE`, ...), kept for logging
    Unrecognized(String),
}

impl Direction {
    /// Tokens are matched exactly as Nightscout spells them
    pub fn from_token(token: &str) -> Self {
        match token {
            "Flat" => Self::Flat,
            "FortyFiveUp" => Self::FortyFiveUp,
            "FortyFiveDown" => Self::FortyFiveDown,
            "SingleUp" => Self::SingleUp,
            "SingleDown" => Self::SingleDown,
            "DoubleUp" => Self::DoubleUp,
            "DoubleDown" => Self::DoubleDown,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Flat => "Flat",
            Self::FortyFiveUp => "FortyFiveUp",
            Self::FortyFiveDown => "FortyFiveDown",
            Self::SingleUp => "SingleUp",
            Self::SingleDown => "SingleDown",
            Self::DoubleUp => "DoubleUp",
            Self::DoubleDown => "DoubleDown",
            Self::Unrecognized(token) => token,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One straight line of an arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// What the display has to draw for an arrow, in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Line(Segment),
    Text { origin: Point, text: &'static str },
}

/// Trend arrow anchored at the start of its shaft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    pub direction: Direction,
    pub origin: Point,
    pub length: i32,
}

impl Arrow {
    pub fn new(direction: Direction, origin: Point) -> Self {
        Self {
            direction,
            origin,
            length: DEFAULT_LENGTH,
        }
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    /// Strokes for a square screen of `screen_size` pixels
    pub fn strokes(&self, screen_size: u32) -> Vec<Stroke> {
        layout(&self.direction, self.origin, self.length, screen_size)
    }
}

/// `floor(length * 2/3) + 1`
pub fn tip_length(length: i32) -> i32 {
    length.saturating_mul(2) / 3 + 1
}

/// Flat and vertical chevrons use a tip shortened to `floor(tip / 1.5)`
fn short_tip(tip: i32) -> i32 {
    tip.saturating_mul(2) / 3
}

/// Lengths below [`MIN_LENGTH`] are raised to it
pub fn clamp_length(length: i32) -> i32 {
    if length < MIN_LENGTH {
        log::warn!(
            "draw_arrow length {} too small. Setting to minimum length of {}",
            length,
            MIN_LENGTH
        );
        MIN_LENGTH
    } else {
        length
    }
}

fn layout(direction: &Direction, origin: Point, length: i32, screen_size: u32) -> Vec<Stroke> {
    let length = clamp_length(length);
    let origin = clamp_point(origin, screen_size, "draw_arrow");
    let tip = tip_length(length);
    let Point { x, y } = origin;

    match direction {
        Direction::Flat => {
            let end = Point::new(x.saturating_add(length), y);
            let t = short_tip(tip);
            chevron(origin, end, [end + Point::new(-t, -t), end + Point::new(-t, t)])
        }
        Direction::FortyFiveUp => {
            let end = Point::new(x.saturating_add(length), y.saturating_sub(length));
            chevron(origin, end, [end + Point::new(0, tip), end + Point::new(-tip, 0)])
        }
        Direction::FortyFiveDown => {
            let end = Point::new(x.saturating_add(length), y.saturating_add(length));
            chevron(origin, end, [end + Point::new(0, -tip), end + Point::new(-tip, 0)])
        }
        Direction::SingleUp => {
            let end = Point::new(x, y.saturating_sub(length));
            let t = short_tip(tip);
            chevron(origin, end, [end + Point::new(-t, t), end + Point::new(t, t)])
        }
        Direction::SingleDown => {
            let end = Point::new(x, y.saturating_add(length));
            let t = short_tip(tip);
            chevron(origin, end, [end + Point::new(-t, -t), end + Point::new(t, -t)])
        }
        Direction::DoubleUp => pair(&Direction::SingleUp, origin, length, tip, screen_size),
        Direction::DoubleDown => pair(&Direction::SingleDown, origin, length, tip, screen_size),
        Direction::Unrecognized(token) => {
            log::debug!("No arrow for trend {:?}, drawing {}", token, UNKNOWN_GLYPH);
            vec![Stroke::Text {
                origin,
                text: UNKNOWN_GLYPH,
            }]
        }
    }
}

/// Shaft from `start` to `end`, then both barbs back from `end`
fn chevron(start: Point, end: Point, barbs: [Point; 2]) -> Vec<Stroke> {
    let mut strokes = vec![Stroke::Line(Segment::new(start, end))];
    strokes.extend(barbs.map(|barb| Stroke::Line(Segment::new(end, barb))));
    strokes
}

/// Two single arrows, the second shifted right by `tip + 1`
fn pair(single: &Direction, origin: Point, length: i32, tip: i32, screen_size: u32) -> Vec<Stroke> {
    let mut strokes = layout(single, origin, length, screen_size);
    let second = Point::new(origin.x.saturating_add(tip + 1), origin.y);
    strokes.extend(layout(single, second, length, screen_size));
    strokes
}
