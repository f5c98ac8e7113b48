//! Pixoo Display Session
//!
//! One connection to one Pixoo, owning the local frame buffer.
//!
//! ## Architecture
//!
//! ### Buffer Functions
//! - `fill()`, `draw_pixel()`, `draw_character()`, `draw_line()`
//! - `draw_border()`, `draw_rectangle()`, `draw_text()`, `draw_image()`
//! - `draw_arrow()` - trend arrow, see [`crate::arrow`]
//!
//! These only touch the buffer. Each takes a `push_now` flag that pushes right
//! after drawing; compound shapes (border, arrow) push once, after their last
//! part.
//!
//! ### Device Functions
//! - `push()` - send the whole buffer
//! - `set_channel()`, `set_visualizer()`, `set_clock()`, `set_brightness()`
//!
//! ## Push Counter
//!
//! Every `Draw/SendHttpGif` carries an increasing `PicID`. The device stops
//! accepting frames when the id grows too large, so at [`COUNTER_LIMIT`] the
//! id is reset on the device and restarts at 1.

use anyhow::{Context, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::{iso_8859_15::FONT_4X6, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::delay::DelayNs;
use serde_json::{json, Value};

use crate::arrow::{Arrow, Direction, Stroke};
use crate::http::HttpClient;
use crate::pixoo::channel::Channel;
use crate::pixoo::cmd::Cmd;
use crate::pixoo::graphics::{clamp_point, FrameBuffer};
use crate::pixoo::interface::DisplayInterface;
use crate::retry::RetryPolicy;

/// Push counter value at which the device id is reset
pub const COUNTER_LIMIT: u32 = 32;

/// Frame duration sent with single-frame uploads, in ms
const PIC_SPEED: u32 = 1000;

const MAX_BRIGHTNESS: u8 = 100;

/// Pixoo display session
pub struct Pixoo<C> {
    interface: DisplayInterface<C>,
    buffer: FrameBuffer,
    /// `PicID` of the last push
    counter: u32,
}

impl<C> Pixoo<C>
where
    C: HttpClient,
{
    /// Block until the device answers, then sync the push counter.
    ///
    /// Only the liveness probe is retried, forever, with `retry`; this is the
    /// startup barrier. The counter sync is tried once and falls back to 0.
    pub fn connect<D: DelayNs>(
        mut interface: DisplayInterface<C>,
        screen_size: u32,
        retry: RetryPolicy,
        delay: &mut D,
    ) -> Self {
        log::info!("Trying to connect to Pixoo at {}", interface.base_url());
        retry.run(delay, "Pixoo connect", || interface.probe());
        log::info!("Pixoo at {} is up", interface.base_url());

        let counter = sync_counter(&mut interface).unwrap_or_else(|e| {
            log::warn!("Could not read the Pixoo push counter, starting at 0: {:#}", e);
            0
        });

        Pixoo {
            interface,
            buffer: FrameBuffer::new(screen_size),
            counter,
        }
    }

    pub fn screen_size(&self) -> u32 {
        self.buffer.screen_size()
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// `PicID` of the last push
    pub fn counter(&self) -> u32 {
        self.counter
    }

    // ==================== Device Functions ====================

    /// Send the whole buffer to the device
    pub fn push(&mut self) -> Result<()> {
        self.counter = self.counter.saturating_add(1);
        if self.counter >= COUNTER_LIMIT {
            log::debug!("Push counter reached {}, resetting", self.counter);
            self.interface.cmd(Cmd::RESET_HTTP_GIF_ID, Value::Null)?;
            self.counter = 1;
        }

        let data = BASE64_STANDARD.encode(self.buffer.to_bytes());
        self.interface.cmd(
            Cmd::SEND_HTTP_GIF,
            json!({
                "PicNum": 1,
                "PicWidth": self.screen_size(),
                "PicOffset": 0,
                "PicID": self.counter,
                "PicSpeed": PIC_SPEED,
                "PicData": data,
            }),
        )?;
        Ok(())
    }

    pub fn set_channel(&mut self, channel: Channel) -> Result<()> {
        log::debug!("Switching to channel {}", channel);
        self.interface
            .cmd(Cmd::SET_CHANNEL, json!({ "SelectIndex": channel.index() }))?;
        Ok(())
    }

    /// Select one of the installed visualizers
    pub fn set_visualizer(&mut self, position: u32) -> Result<()> {
        self.interface
            .cmd(Cmd::SET_VISUALIZER, json!({ "EqPosition": position }))?;
        Ok(())
    }

    /// Select one of the installed clock faces
    pub fn set_clock(&mut self, clock_id: u32) -> Result<()> {
        self.interface
            .cmd(Cmd::SET_CLOCK, json!({ "ClockId": clock_id }))?;
        Ok(())
    }

    /// Brightness in percent, values over 100 are capped
    pub fn set_brightness(&mut self, percent: u8) -> Result<()> {
        let percent = if percent > MAX_BRIGHTNESS {
            log::warn!("Brightness {} capped to {}", percent, MAX_BRIGHTNESS);
            MAX_BRIGHTNESS
        } else {
            percent
        };
        self.interface
            .cmd(Cmd::SET_BRIGHTNESS, json!({ "Brightness": percent }))?;
        Ok(())
    }

    // ==================== Buffer Functions ====================

    /// Fill the whole buffer, black clears the screen
    pub fn fill(&mut self, color: Rgb888, push_now: bool) -> Result<()> {
        self.buffer.fill(color);
        self.finish(push_now)
    }

    pub fn draw_pixel(&mut self, point: Point, color: Rgb888, push_now: bool) -> Result<()> {
        let point = clamp_point(point, self.screen_size(), "draw_pixel");
        Pixel(point, color).draw(&mut self.buffer).ok();
        self.finish(push_now)
    }

    pub fn draw_character(
        &mut self,
        character: char,
        point: Point,
        color: Rgb888,
        push_now: bool,
    ) -> Result<()> {
        let mut text = [0u8; 4];
        self.draw_text(character.encode_utf8(&mut text), point, color, push_now)
    }

    pub fn draw_line(
        &mut self,
        start: Point,
        end: Point,
        color: Rgb888,
        push_now: bool,
    ) -> Result<()> {
        let size = self.screen_size();
        let start = clamp_point(start, size, "draw_line");
        let end = clamp_point(end, size, "draw_line");
        self.stroke_line(start, end, color);
        self.finish(push_now)
    }

    /// Outline from `top_left` to `bottom_right`, both inclusive
    pub fn draw_border(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: Rgb888,
        push_now: bool,
    ) -> Result<()> {
        let (left, top) = (top_left.x, top_left.y);
        let (right, bottom) = (bottom_right.x, bottom_right.y);
        self.draw_line(Point::new(left, top), Point::new(right, top), color, false)?; // Top Horizontal
        self.draw_line(Point::new(left, bottom), Point::new(left, top), color, false)?; // Left Vertical
        self.draw_line(Point::new(right, bottom), Point::new(left, bottom), color, false)?; // Bottom Horizontal
        self.draw_line(Point::new(right, top), Point::new(right, bottom), color, push_now) // Right Vertical
    }

    /// Outline around the whole screen
    pub fn draw_screen_border(&mut self, color: Rgb888, push_now: bool) -> Result<()> {
        let last = self.screen_size() as i32 - 1;
        self.draw_border(Point::zero(), Point::new(last, last), color, push_now)
    }

    /// Filled rectangle from `top_left` to `bottom_right`, both inclusive
    pub fn draw_rectangle(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: Rgb888,
        push_now: bool,
    ) -> Result<()> {
        let size = self.screen_size();
        let top_left = clamp_point(top_left, size, "draw_rectangle");
        let bottom_right = clamp_point(bottom_right, size, "draw_rectangle");
        Rectangle::with_corners(top_left, bottom_right)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.buffer)
            .ok();
        self.finish(push_now)
    }

    /// Text in the 4x6 font, `point` is the top left corner of the first glyph
    pub fn draw_text(
        &mut self,
        text: &str,
        point: Point,
        color: Rgb888,
        push_now: bool,
    ) -> Result<()> {
        let point = clamp_point(point, self.screen_size(), "draw_text");
        self.stroke_text(text, point, color);
        self.finish(push_now)
    }

    /// Raw RGB888 image, `width` pixels per row
    pub fn draw_image(
        &mut self,
        rgb: &[u8],
        width: u32,
        point: Point,
        push_now: bool,
    ) -> Result<()> {
        let row_bytes = (width as usize).saturating_mul(3);
        if row_bytes == 0 || rgb.len() < row_bytes {
            log::warn!(
                "draw_image needs at least one row of {} pixels, got {} bytes",
                width,
                rgb.len()
            );
            return self.finish(push_now);
        }
        let point = clamp_point(point, self.screen_size(), "draw_image");
        let raw = ImageRaw::<Rgb888>::new(rgb, width);
        Image::new(&raw, point).draw(&mut self.buffer).ok();
        self.finish(push_now)
    }

    /// Trend arrow starting at `origin`, see [`crate::arrow`] for the shapes
    pub fn draw_arrow(
        &mut self,
        direction: &Direction,
        origin: Point,
        length: i32,
        color: Rgb888,
        push_now: bool,
    ) -> Result<()> {
        let arrow = Arrow::new(direction.clone(), origin).with_length(length);
        for stroke in arrow.strokes(self.screen_size()) {
            match stroke {
                Stroke::Line(segment) => self.stroke_line(segment.start, segment.end, color),
                Stroke::Text { origin, text } => self.stroke_text(text, origin, color),
            }
        }
        self.finish(push_now)
    }

    // ==================== Helper Functions ====================

    fn stroke_line(&mut self, start: Point, end: Point, color: Rgb888) {
        Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(&mut self.buffer)
            .ok();
    }

    fn stroke_text(&mut self, text: &str, point: Point, color: Rgb888) {
        let style = MonoTextStyle::new(&FONT_4X6, color);
        Text::with_baseline(text, point, style, Baseline::Top)
            .draw(&mut self.buffer)
            .ok();
    }

    fn finish(&mut self, push_now: bool) -> Result<()> {
        if push_now {
            self.push().context("Push after draw failed")
        } else {
            Ok(())
        }
    }
}

/// Read the device's current `PicID`, resetting it when it is over the limit
fn sync_counter<C: HttpClient>(interface: &mut DisplayInterface<C>) -> Result<u32> {
    let reply = interface.cmd(Cmd::GET_HTTP_GIF_ID, Value::Null)?;
    let counter = reply
        .get("PicId")
        .and_then(Value::as_u64)
        .map_or(0, |id| u32::try_from(id).unwrap_or(u32::MAX));
    if counter > COUNTER_LIMIT {
        interface.cmd(Cmd::RESET_HTTP_GIF_ID, Value::Null)?;
        return Ok(0);
    }
    Ok(counter)
}
