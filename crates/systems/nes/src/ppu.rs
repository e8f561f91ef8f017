//! NES PPU (2C02), stepped one dot at a time.
//!
//! ## Timing
//!
//! - Scanline -1 is the pre-render line, 0..=239 are visible, 240 is idle
//!   and 241..=260 are vertical blank. Each line has 341 dots (0..=340);
//!   with rendering enabled, odd frames drop the last pre-render dot.
//! - Visible pixel `x` is produced on dot `x + 2`, from the scroll state
//!   held in `v` plus the fine-X register.
//! - VBlank is raised at (241, 1) and cleared with sprite-0/overflow at
//!   (-1, 1). A frame is complete when scanline 260 wraps to -1.
//!
//! ## Memory Map (PPU bus)
//!
//! - **$0000-$1FFF**: pattern tables, through the cartridge [`Mapper`]
//! - **$2000-$2FFF**: nametables (mirrored per the cartridge; $3000-$3EFF
//!   mirrors them again)
//! - **$3F00-$3FFF**: palette RAM, 32 bytes mirrored
//!
//! The NMI output is a level (`nmi_output`); the console forwards it to the
//! CPU's edge detector after every dot.

mod palette;
mod scroll;
mod sprites;

pub use palette::master_rgb;
pub use scroll::VramAddr;

use std::fmt;

use crate::cartridge::Mirroring;
use crate::config::PpuQuirks;
use crate::mappers::Mapper;
use fami_core::types::Frame;
use palette::PaletteRam;
use serde::Serialize;
use sprites::SpriteLine;

pub const SCREEN_WIDTH: u32 = 256;
pub const SCREEN_HEIGHT: u32 = 240;
pub const DOTS_PER_SCANLINE: u16 = 341;
pub const PRE_RENDER_SCANLINE: i16 = -1;
pub const VBLANK_SCANLINE: i16 = 241;
pub const LAST_SCANLINE: i16 = 260;

pub const CTRL_INCREMENT_32: u8 = 0x04;
pub const CTRL_SPRITE_TABLE: u8 = 0x08;
pub const CTRL_BG_TABLE: u8 = 0x10;
pub const CTRL_SPRITE_16: u8 = 0x20;
pub const CTRL_NMI: u8 = 0x80;

pub const MASK_GRAYSCALE: u8 = 0x01;
pub const MASK_BG_LEFT: u8 = 0x02;
pub const MASK_SPRITES_LEFT: u8 = 0x04;
pub const MASK_BG: u8 = 0x08;
pub const MASK_SPRITES: u8 = 0x10;

pub const STATUS_OVERFLOW: u8 = 0x20;
pub const STATUS_SPRITE_ZERO: u8 = 0x40;
pub const STATUS_VBLANK: u8 = 0x80;

/// Notifications raised by the PPU state machine.
pub trait PpuObserver {
    /// VBlank started with NMI generation enabled.
    fn on_nmi(&mut self, _frame: u64) {}
    /// `frame` (the index of the frame just finished) is ready to read.
    fn on_frame_complete(&mut self, _frame: u64, _pixels: &Frame) {}
}

#[derive(Debug, Default)]
pub struct NullObserver;

impl PpuObserver for NullObserver {}

/// Register-level view of the PPU for debugging output.
#[derive(Debug, Clone, Serialize)]
pub struct PpuSnapshot {
    pub ctrl: u8,
    pub mask: u8,
    pub status: u8,
    pub oam_addr: u8,
    pub v: u16,
    pub t: u16,
    pub fine_x: u8,
    pub w: bool,
    pub scanline: i16,
    pub cycle: u16,
    pub frame_count: u64,
    pub odd_frame: bool,
}

pub struct Ppu {
    /// $2000 PPUCTRL.
    ctrl: u8,
    /// $2001 PPUMASK.
    mask: u8,
    /// $2002 flags (bits 5-7 only).
    status: u8,
    /// $2003 OAMADDR.
    oam_addr: u8,
    /// Current VRAM address.
    v: VramAddr,
    /// Temporary VRAM address; top-left of the screen while rendering.
    t: VramAddr,
    /// Fine X scroll (0-7).
    fine_x: u8,
    /// First/second write toggle shared by $2005 and $2006.
    w: bool,
    /// PPUDATA read buffer.
    read_buffer: u8,
    /// Last value driven onto the CPU-facing data bus.
    io_latch: u8,
    /// Nametable storage indexed after mirroring.
    nametables: [u8; 0x1000],
    palette: PaletteRam,
    /// Primary OAM, 64 sprites x 4 bytes.
    oam: [u8; 256],
    /// Sprites selected for the current scanline.
    sprites: SpriteLine,
    /// -1 (pre-render) through 260.
    scanline: i16,
    /// Dot within the scanline, 0-340.
    cycle: u16,
    frame_count: u64,
    odd_frame: bool,
    /// Output pixels for the frame being drawn.
    frame: Frame,
    quirks: PpuQuirks,
    observer: Box<dyn PpuObserver>,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("scanline", &self.scanline)
            .field("cycle", &self.cycle)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            v: VramAddr::default(),
            t: VramAddr::default(),
            fine_x: 0,
            w: false,
            read_buffer: 0,
            io_latch: 0,
            nametables: [0; 0x1000],
            palette: PaletteRam::new(),
            oam: [0; 256],
            sprites: SpriteLine::new(),
            scanline: PRE_RENDER_SCANLINE,
            cycle: 0,
            frame_count: 0,
            odd_frame: false,
            frame: Frame::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            quirks: PpuQuirks::default(),
            observer: Box::new(NullObserver),
        }
    }

    pub fn with_quirks(mut self, quirks: PpuQuirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn PpuObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_power_on_vblank(mut self, vblank: bool) -> Self {
        if vblank {
            self.status |= STATUS_VBLANK;
        }
        self
    }

    /// RESET line: clears the write-only registers and restarts the frame.
    /// VRAM, OAM and palette contents survive.
    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.w = false;
        self.fine_x = 0;
        self.t = VramAddr::default();
        self.read_buffer = 0;
        self.scanline = PRE_RENDER_SCANLINE;
        self.cycle = 0;
        self.odd_frame = false;
        self.sprites.clear();
    }

    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// PPUSTATUS flags without the side effects of a register read.
    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    pub fn oam_addr(&self) -> u8 {
        self.oam_addr
    }

    pub fn open_bus(&self) -> u8 {
        self.io_latch
    }

    /// Level of the /NMI request: high while VBlank is set and enabled.
    pub fn nmi_output(&self) -> bool {
        self.status & STATUS_VBLANK != 0 && self.ctrl & CTRL_NMI != 0
    }

    pub fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BG | MASK_SPRITES) != 0
    }

    pub fn snapshot(&self) -> PpuSnapshot {
        PpuSnapshot {
            ctrl: self.ctrl,
            mask: self.mask,
            status: self.status,
            oam_addr: self.oam_addr,
            v: self.v.raw(),
            t: self.t.raw(),
            fine_x: self.fine_x,
            w: self.w,
            scanline: self.scanline,
            cycle: self.cycle,
            frame_count: self.frame_count,
            odd_frame: self.odd_frame,
        }
    }

    fn sprite_height(&self) -> i16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 {
            16
        } else {
            8
        }
    }

    /// Advance one dot.
    pub fn step(&mut self, mapper: &dyn Mapper) {
        let rendering = self.rendering_enabled();
        match self.scanline {
            PRE_RENDER_SCANLINE => {
                if self.cycle == 1 {
                    self.status &= !(STATUS_VBLANK | STATUS_SPRITE_ZERO | STATUS_OVERFLOW);
                }
                if rendering {
                    match self.cycle {
                        257 => self.v.copy_x(self.t),
                        280..=304 => self.v.copy_y(self.t),
                        _ => {}
                    }
                }
            }
            0..=239 => self.visible_dot(mapper, rendering),
            VBLANK_SCANLINE if self.cycle == 1 => {
                self.status |= STATUS_VBLANK;
                if self.ctrl & CTRL_NMI != 0 {
                    self.observer.on_nmi(self.frame_count);
                }
            }
            _ => {}
        }
        self.advance(rendering);
    }

    fn advance(&mut self, rendering: bool) {
        self.cycle += 1;
        let line_len = if self.scanline == PRE_RENDER_SCANLINE && self.odd_frame && rendering {
            DOTS_PER_SCANLINE - 1
        } else {
            DOTS_PER_SCANLINE
        };
        if self.cycle < line_len {
            return;
        }
        self.cycle = 0;
        self.scanline += 1;
        if self.scanline > LAST_SCANLINE {
            self.scanline = PRE_RENDER_SCANLINE;
            self.observer
                .on_frame_complete(self.frame_count, &self.frame);
            self.frame_count += 1;
            self.odd_frame = !self.odd_frame;
        }
    }

    fn visible_dot(&mut self, mapper: &dyn Mapper, rendering: bool) {
        match self.cycle {
            0 if self.scanline == 0 && rendering => self.v = self.t,
            1 => {
                if rendering {
                    let height = self.sprite_height();
                    if self.sprites.evaluate(&self.oam, self.scanline, height) {
                        self.status |= STATUS_OVERFLOW;
                    }
                } else {
                    self.sprites.clear();
                }
            }
            2..=257 => {
                let px = self.cycle - 2;
                self.render_pixel(mapper, px, rendering);
                if px == 255 && rendering {
                    self.v.increment_y();
                    self.v.copy_x(self.t);
                }
            }
            _ => {}
        }
    }

    fn render_pixel(&mut self, mapper: &dyn Mapper, px: u16, rendering: bool) {
        let index = if rendering {
            if px > 0 && (self.fine_x as u16 + px) % 8 == 0 {
                self.v.increment_x();
            }
            self.composite(mapper, px)
        } else {
            0
        };
        let grayscale = self.mask & MASK_GRAYSCALE != 0;
        let offset = self.scanline as usize * SCREEN_WIDTH as usize + px as usize;
        self.frame.pixels[offset] = self.palette.rgb(index, grayscale);
    }

    /// Palette index (0..0x1F) for pixel `px` of the current scanline.
    fn composite(&mut self, mapper: &dyn Mapper, px: u16) -> u8 {
        let left_edge = px < 8;
        let bg_on = self.mask & MASK_BG != 0;
        let sprites_on = self.mask & MASK_SPRITES != 0;

        let (bg_palette, bg_color) = if bg_on && !(left_edge && self.mask & MASK_BG_LEFT == 0) {
            self.background_pixel(mapper, px)
        } else {
            (0, 0)
        };

        let sprite = if sprites_on && !(left_edge && self.mask & MASK_SPRITES_LEFT == 0) {
            let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 { 0x1000 } else { 0 };
            self.sprites
                .pixel_at(px, self.sprite_height(), table, mapper)
        } else {
            None
        };

        let bg_index = bg_palette * 4 + bg_color;
        match sprite {
            None if bg_color == 0 => 0,
            None => bg_index,
            Some(s) => {
                if s.oam_index == 0 && bg_color != 0 && bg_on && sprites_on && px < 255 {
                    self.status |= STATUS_SPRITE_ZERO;
                }
                if bg_color != 0 && s.behind_bg && bg_on {
                    bg_index
                } else {
                    0x10 + s.palette * 4 + s.color
                }
            }
        }
    }

    /// (palette, color) of the background at pixel `px`, from `v`.
    fn background_pixel(&self, mapper: &dyn Mapper, px: u16) -> (u8, u8) {
        let v = self.v;
        let fine = (self.fine_x as u16 + px) & 7;

        let tile = self.vram_read(mapper, 0x2000 | (v.raw() & 0x0FFF)) as u16;

        let (cx, cy) = (v.coarse_x(), v.coarse_y());
        let attr_addr = 0x23C0 | (v.raw() & 0x0C00) | ((cy >> 2) << 3) | (cx >> 2);
        let attr = self.vram_read(mapper, attr_addr);
        let quadrant = (cx & 3) / 2 + ((cy & 3) / 2) * 2;
        let palette = (attr >> (quadrant * 2)) & 0x03;

        let base = if self.ctrl & CTRL_BG_TABLE != 0 { 0x1000 } else { 0 };
        let addr = base + tile * 16 + v.fine_y();
        let lo = mapper.chr_read(addr);
        let hi = mapper.chr_read(addr + 8);
        let bit = 7 - fine;
        let color = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
        (palette, color)
    }

    fn nametable_index(mirroring: Mirroring, addr: u16) -> usize {
        let a = (addr - 0x2000) & 0x0FFF;
        let table = a / 0x0400;
        let offset = a % 0x0400;
        let physical = match mirroring {
            Mirroring::Horizontal => table / 2,
            Mirroring::Vertical => table % 2,
            Mirroring::FourScreen => table,
        };
        (physical * 0x0400 + offset) as usize
    }

    fn vram_read(&self, mapper: &dyn Mapper, addr: u16) -> u8 {
        match addr & 0x3FFF {
            a @ 0x0000..=0x1FFF => mapper.chr_read(a),
            a @ 0x2000..=0x3EFF => self.nametables[Self::nametable_index(mapper.mirroring(), a)],
            a => self.palette.read(a),
        }
    }

    fn vram_write(&mut self, mapper: &mut dyn Mapper, addr: u16, val: u8) {
        match addr & 0x3FFF {
            a @ 0x0000..=0x1FFF => mapper.chr_write(a, val),
            a @ 0x2000..=0x3EFF => {
                self.nametables[Self::nametable_index(mapper.mirroring(), a)] = val
            }
            a => self.palette.write(a, val),
        }
    }

    fn increment_v(&mut self) {
        let step = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
        self.v.advance(step);
    }

    /// CPU read of $2000-$2007 (any mirror).
    pub fn read_register(&mut self, addr: u16, mapper: &dyn Mapper) -> u8 {
        let value = match addr & 0x07 {
            2 => {
                let value = (self.status & 0xE0) | (self.io_latch & 0x1F);
                self.status &= !STATUS_VBLANK;
                if self.quirks.status_read_clears_sprite_zero {
                    self.status &= !STATUS_SPRITE_ZERO;
                }
                self.w = false;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.v.addr();
                let value = if addr >= 0x3F00 {
                    // Palette data comes back immediately; the buffer picks
                    // up the nametable byte underneath.
                    self.read_buffer = self.vram_read(mapper, addr - 0x1000);
                    self.vram_read(mapper, addr)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.vram_read(mapper, addr);
                    buffered
                };
                self.increment_v();
                value
            }
            // Write-only registers read back the bus latch.
            _ => self.io_latch,
        };
        self.io_latch = value;
        value
    }

    /// CPU write of $2000-$2007 (any mirror).
    pub fn write_register(&mut self, addr: u16, val: u8, mapper: &mut dyn Mapper) {
        self.io_latch = val;
        match addr & 0x07 {
            0 => {
                self.ctrl = val;
                self.t.set_nametable(val);
            }
            1 => self.mask = val,
            2 => {}
            3 => self.oam_addr = val,
            4 => {
                self.oam[self.oam_addr as usize] = val;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if !self.w {
                    self.t.set_coarse_x(val >> 3);
                    self.fine_x = val & 0x07;
                } else {
                    self.t.set_fine_y(val & 0x07);
                    self.t.set_coarse_y(val >> 3);
                }
                self.w = !self.w;
            }
            6 => {
                if !self.w {
                    self.t.set_high(val);
                } else {
                    self.t.set_low(val);
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            _ => {
                let addr = self.v.addr();
                self.vram_write(mapper, addr, val);
                self.increment_v();
            }
        }
    }

    /// OAM DMA entry: byte `index` of the transfer lands at OAMADDR + index.
    pub fn dma_write(&mut self, index: u8, val: u8) {
        self.oam[self.oam_addr.wrapping_add(index) as usize] = val;
    }
}
