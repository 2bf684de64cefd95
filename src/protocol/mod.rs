//! # P-touch Raster Protocol
//!
//! Low-level building blocks for Brother P-touch tape printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Command builders (status, modes, raster lines, print)
//! - [`status`]: 32-byte status reply parsing
//! - [`raster`]: Print strip → packed raster lines
//! - [`compression`]: PackBits line compression
//!
//! ## Usage Example
//!
//! ```
//! use image::{GrayImage, Luma};
//! use tapeprint::protocol::{commands, raster};
//!
//! let strip = GrayImage::from_pixel(40, raster::HEAD_PINS, Luma([255]));
//! let (data, stride) = raster::load_raw_image(&strip, 12).unwrap();
//!
//! let mut job = Vec::new();
//! job.extend(commands::invalidate());
//! job.extend(commands::initialize());
//! job.extend(commands::raster_mode());
//! job.extend(commands::print_information(12, (data.len() / stride) as u32));
//! job.extend(commands::compression(true));
//! job.extend(raster::compress_image(&data, stride).unwrap());
//! job.extend(commands::print_and_eject());
//! ```

pub mod commands;
pub mod compression;
pub mod raster;
pub mod status;

pub use commands::ExtendedMode;
pub use status::DeviceStatus;
