//! Nightscout glucose readings on a Divoom Pixoo LED matrix
//!
//! The crate polls a Nightscout server for the two newest sensor glucose
//! values and renders the latest one, with its trend arrow and the delta to
//! the previous value, into a local frame buffer that is pushed to a Pixoo
//! over its HTTP API. The custom frame alternates with the device's own
//! "Cloud" and "Faces" channels.
//!
//! ### Usage
//! Everything talks HTTP through [`http::HttpClient`] and sleeps through
//! [`embedded_hal::delay::DelayNs`], so the same code runs on the ESP32
//! firmware (feature `esp32`) and in host tests with fakes.
//!
//! 1. connect a [`pixoo::Pixoo`] session, which blocks until the device answers
//! 1. create a [`nightscout::Nightscout`] poller
//! 1. hand both to a [`render::Dashboard`] and call [`render::Dashboard::run`]

pub mod arrow;
pub mod clock;
pub mod config;
pub mod http;
pub mod nightscout;
pub mod pixoo;
pub mod render;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::arrow::Direction;
pub use crate::config::Config;
pub use crate::nightscout::{Nightscout, Reading};
pub use crate::pixoo::{Channel, FrameBuffer, Pixoo};
pub use crate::render::Dashboard;
pub use crate::retry::RetryPolicy;
