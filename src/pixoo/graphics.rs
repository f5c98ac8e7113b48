//! Local frame buffer
//!
//! The whole screen is kept in memory as RGB888 and sent to the device in one
//! push. [`FrameBuffer`] is an `embedded-graphics` [`DrawTarget`], so every
//! primitive of that crate can draw onto it.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

const BYTES_PER_PIXEL: usize = 3;

/// Square grid of RGB pixels indexed by (x, y), row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    size: u32,
    pixels: Vec<Rgb888>,
}

impl FrameBuffer {
    /// Black buffer of `size` x `size` pixels
    pub fn new(size: u32) -> Self {
        let side = size as usize;
        Self {
            size,
            pixels: vec![Rgb888::BLACK; side * side],
        }
    }

    /// Side length in pixels
    pub fn screen_size(&self) -> u32 {
        self.size
    }

    /// Color at (x, y), `None` off screen
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.index(Point::new(x, y)).map(|index| self.pixels[index])
    }

    /// Set every pixel to `color`
    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    /// Row-major `R, G, B` bytes, the layout `Draw/SendHttpGif` expects
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * BYTES_PER_PIXEL);
        for pixel in &self.pixels {
            bytes.extend_from_slice(&[pixel.r(), pixel.g(), pixel.b()]);
        }
        bytes
    }

    /// Number of pixels that are not black
    pub fn lit_pixels(&self) -> usize {
        self.pixels
            .iter()
            .filter(|pixel| **pixel != Rgb888::BLACK)
            .count()
    }

    fn index(&self, point: Point) -> Option<usize> {
        let size = self.size as i32;
        if (0..size).contains(&point.x) && (0..size).contains(&point.y) {
            Some((point.y * size + point.x) as usize)
        } else {
            None
        }
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.size, self.size)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    /// Pixels outside the screen are dropped
    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(index) = self.index(point) {
                self.pixels[index] = color;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

/// Replace each coordinate outside `[0, screen_size)` with 0, logging the fix
pub fn clamp_point(point: Point, screen_size: u32, what: &str) -> Point {
    Point::new(
        clamp_coordinate(point.x, screen_size, what, "x"),
        clamp_coordinate(point.y, screen_size, what, "y"),
    )
}

fn clamp_coordinate(value: i32, screen_size: u32, what: &str, axis: &str) -> i32 {
    if value >= 0 && (value as u32) < screen_size {
        value
    } else {
        log::warn!(
            "{} {} coordinate {} out of screen. Range: 0 - {}. Setting to 0",
            what,
            axis,
            value,
            screen_size.saturating_sub(1)
        );
        0
    }
}
