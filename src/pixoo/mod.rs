//! Divoom Pixoo LED matrix driver
//!
//! Talks to the Pixoo 16, 32 and 64 over the local HTTP API that the device
//! serves on port 80. Every command is one JSON envelope `POST`ed to `/post`.
//!
//! ### Usage
//! Nothing is sent while drawing; the driver keeps a [`FrameBuffer`] and
//! uploads it as a single frame. To display something you:
//!
//! 1. connect with [`driver::Pixoo::connect`], which blocks until the device
//! answers its liveness probe
//! 1. draw onto the buffer, with the `draw_*` functions or any
//! [`embedded_graphics`] primitive
//! 1. send the frame with [`driver::Pixoo::push`], or pass `push_now`
//!
//! The device stops showing the custom frame as soon as another channel is
//! selected with [`driver::Pixoo::set_channel`].

pub mod channel;
pub mod driver;
pub mod graphics;
pub mod interface;

mod cmd;

pub use channel::Channel;
pub use driver::{Pixoo, COUNTER_LIMIT};
pub use graphics::{clamp_point, FrameBuffer};
pub use interface::DisplayInterface;
