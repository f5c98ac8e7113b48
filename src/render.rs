//! Render loop
//!
//! One cycle draws the dashboard frame, pushes it, then lets the device show
//! its Cloud and Faces channels, each for the configured screen time:
//!
//! ```text
//! fetch -> clear -> screen border -> time -> panel -> label -> push
//!       -> sleep -> Cloud -> sleep -> Faces -> sleep
//! ```
//!
//! The sequence never branches on the reading. Device commands are retried
//! until they succeed, so a Pixoo that drops off the network stalls the loop
//! instead of ending it.

use anyhow::Result;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;

use crate::clock::{clock_text, Clock};
use crate::config::Config;
use crate::http::HttpClient;
use crate::nightscout::{Reading, ReadingSource};
use crate::pixoo::{Channel, Pixoo};
use crate::retry::RetryPolicy;

const PANEL_WIDTH: i32 = 20;
const PANEL_HEIGHT: i32 = 35;
const ARROW_LENGTH: i32 = 6;

/// Placement and timing of the dashboard frame
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub panel_width: i32,
    pub panel_height: i32,
    /// Outline around the reading panel
    pub panel_border: bool,
    pub arrow_length: i32,
    pub label: String,
    /// Dwell time of the frame and of each native channel
    pub screen_time_ms: u32,
    pub color: Rgb888,
}

impl Layout {
    pub fn new(label: impl Into<String>, screen_time_ms: u32) -> Self {
        Self {
            panel_width: PANEL_WIDTH,
            panel_height: PANEL_HEIGHT,
            panel_border: true,
            arrow_length: ARROW_LENGTH,
            label: label.into(),
            screen_time_ms,
            color: Rgb888::WHITE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.label.clone(), config.screen_time_ms)
    }
}

/// Anchor points of one frame, derived from the screen size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchors {
    pub time: Point,
    pub panel_top_left: Point,
    pub panel_bottom_right: Point,
    pub value: Point,
    pub delta: Point,
    pub arrow: Point,
    pub label: Point,
}

impl Anchors {
    pub fn new(screen_size: u32, layout: &Layout) -> Self {
        let size = screen_size as i32;
        let center = (size - 1) / 2;
        let (w, h) = (layout.panel_width, layout.panel_height);
        Self {
            time: Point::new(center - 2 - 12, 6),
            panel_top_left: Point::new(center - w / 2, center - h / 2),
            panel_bottom_right: Point::new(center + w / 2, center + h / 2),
            value: Point::new(center - 5, center - h / 3),
            delta: Point::new(center - 3, center - 2),
            arrow: Point::new(center - 3, center + 2 + h / 4),
            label: Point::new(5, size - 10),
        }
    }
}

/// Drives one Pixoo from one reading source, forever
pub struct Dashboard<C, S, K, D> {
    pixoo: Pixoo<C>,
    source: S,
    clock: K,
    layout: Layout,
    retry: RetryPolicy,
    delay: D,
}

impl<C, S, K, D> Dashboard<C, S, K, D>
where
    C: HttpClient,
    S: ReadingSource,
    K: Clock,
    D: DelayNs,
{
    /// `retry` applies to device commands inside the loop
    pub fn new(
        pixoo: Pixoo<C>,
        source: S,
        clock: K,
        layout: Layout,
        retry: RetryPolicy,
        delay: D,
    ) -> Self {
        Self {
            pixoo,
            source,
            clock,
            layout,
            retry,
            delay,
        }
    }

    pub fn pixoo(&self) -> &Pixoo<C> {
        &self.pixoo
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Draw the whole dashboard for `reading` into the buffer, without pushing
    pub fn draw_frame(&mut self, reading: &Reading) -> Result<()> {
        let anchors = Anchors::new(self.pixoo.screen_size(), &self.layout);
        let color = self.layout.color;
        let time = clock_text(&self.clock.now());

        self.pixoo.fill(Rgb888::BLACK, false)?;
        self.pixoo.draw_screen_border(color, false)?;
        self.pixoo.draw_text(&time, anchors.time, color, false)?;
        self.draw_panel(reading, &anchors)?;
        self.pixoo
            .draw_text(&self.layout.label, anchors.label, color, false)
    }

    fn draw_panel(&mut self, reading: &Reading, anchors: &Anchors) -> Result<()> {
        let color = self.layout.color;
        if self.layout.panel_border {
            self.pixoo.draw_border(
                anchors.panel_top_left,
                anchors.panel_bottom_right,
                color,
                false,
            )?;
        }
        self.pixoo
            .draw_text(&reading.value.to_string(), anchors.value, color, false)?;
        let delta = reading.delta_text();
        if delta != "0" {
            self.pixoo.draw_text(&delta, anchors.delta, color, false)?;
        }
        self.pixoo.draw_arrow(
            &reading.direction,
            anchors.arrow,
            self.layout.arrow_length,
            color,
            false,
        )
    }

    /// One full cycle: frame, Cloud, Faces
    pub fn run_cycle(&mut self) {
        let reading = self.source.fetch_reading();
        if let Err(e) = self.draw_frame(&reading) {
            log::error!("Drawing the frame failed: {:#}", e);
        }
        self.retry.run(&mut self.delay, "Pixoo push", || self.pixoo.push());
        self.delay.delay_ms(self.layout.screen_time_ms);

        for channel in [Channel::Cloud, Channel::Faces] {
            self.retry.run(&mut self.delay, "Pixoo channel switch", || {
                self.pixoo.set_channel(channel)
            });
            self.delay.delay_ms(self.layout.screen_time_ms);
        }
    }

    pub fn run(&mut self) -> ! {
        log::info!(
            "Starting render loop, {} ms per screen",
            self.layout.screen_time_ms
        );
        loop {
            self.run_cycle();
        }
    }
}
