use std::fs::File;
use std::os::unix::io::AsRawFd;

use anyhow::{Context, Result};

use crate::config;
use crate::core::ScaleFactor;

// Kernel UAPI bindings from <linux/fb.h>; libc does not export these.
const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;

#[repr(C)]
#[derive(Clone, Copy)]
struct fb_bitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct fb_var_screeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: fb_bitfield,
    green: fb_bitfield,
    blue: fb_bitfield,
    transp: fb_bitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

nix::ioctl_read_bad!(fb_get_vscreeninfo, FBIOGET_VSCREENINFO, fb_var_screeninfo);

/// Calibrate the scale factor from the framebuffer resolution.
///
/// When the framebuffer runs below the HDMI reference (fbset -g 1280 720
/// ...), X coordinates and the player's output units diverge; the scale
/// bridges them. Calibration is best-effort: any failure falls back to
/// identity. Assumes the framebuffer mode was set before startup; there is
/// no recalibration afterwards.
pub fn probe() -> ScaleFactor {
    let device = std::env::var(config::FB_DEVICE_ENV)
        .unwrap_or_else(|_| config::FB_DEVICE.to_string());
    match probe_device(&device) {
        Ok(scale) => {
            tracing::info!("scale factor ({}, {}) from {}", scale.x, scale.y, device);
            scale
        }
        Err(err) => {
            tracing::warn!("no scale calibration from {}: {:#}", device, err);
            ScaleFactor::IDENTITY
        }
    }
}

fn probe_device(device: &str) -> Result<ScaleFactor> {
    let file = File::open(device).with_context(|| format!("failed to open {device}"))?;
    let mut info: fb_var_screeninfo = unsafe { std::mem::zeroed() };
    unsafe { fb_get_vscreeninfo(file.as_raw_fd(), &mut info) }
        .context("FBIOGET_VSCREENINFO failed")?;
    Ok(ScaleFactor::from_resolution(info.xres, info.yres))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_device_is_an_error_not_a_panic() {
        assert!(probe_device("/nonexistent/fb").is_err());
    }
}
