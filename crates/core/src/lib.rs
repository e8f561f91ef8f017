//! Core emulator primitives and traits.

pub mod cpu_6502;
pub mod logging;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// A finished video frame as packed 0xAARRGGBB pixels, row-major.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0xFF00_0000; (width * height) as usize],
            }
        }

        /// Pixel at (x, y), or `None` outside the frame.
        pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
            if x >= self.width || y >= self.height {
                return None;
            }
            self.pixels.get((y * self.width + x) as usize).copied()
        }

        /// Raw little-endian byte view, suitable for hashing or dumping.
        pub fn to_bytes(&self) -> Vec<u8> {
            self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
        }
    }
}

use serde_json::Value;

/// A CPU-like component that can be stepped; returns cycles consumed.
pub trait Cpu {
    fn reset(&mut self);
    fn step(&mut self) -> u32;
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self);

    /// Emulate until a frame is produced and return a framebuffer.
    fn step_frame(&mut self) -> Result<types::Frame, Self::Error>;

    /// Return a JSON snapshot of the machine state for debugging.
    fn debug_state(&self) -> Value;
}
