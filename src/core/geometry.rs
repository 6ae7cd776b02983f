use crate::config;

/// Window placement in player coordinate units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Calibration between the X coordinate space (framebuffer resolution) and
/// the space the player renders in (HDMI reference resolution).
///
/// X geometry is divided down to player units; player-unit sizes are
/// multiplied up when sizing the X window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub x: f32,
    pub y: f32,
}

impl ScaleFactor {
    pub const IDENTITY: ScaleFactor = ScaleFactor { x: 1.0, y: 1.0 };

    /// Scale for a framebuffer running at `xres` x `yres` against the
    /// reference resolution.
    pub fn from_resolution(xres: u32, yres: u32) -> Self {
        let (rw, rh) = config::REFERENCE_RESOLUTION;
        ScaleFactor {
            x: xres as f32 / rw as f32,
            y: yres as f32 / rh as f32,
        }
    }

    /// Convert reported X geometry to player units.
    pub fn to_player(&self, x: i32, y: i32, width: u32, height: u32) -> WindowGeometry {
        WindowGeometry {
            x: (x as f32 / self.x).round() as i32,
            y: (y as f32 / self.y).round() as i32,
            width: (width as f32 / self.x).round() as u32,
            height: (height as f32 / self.y).round() as u32,
        }
    }

    /// Convert a player-unit size to X units, for window creation and hints.
    pub fn to_x(&self, width: u32, height: u32) -> (u16, u16) {
        (
            (width as f32 * self.x).round() as u16,
            (height as f32 * self.y).round() as u16,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_scale_passes_geometry_through() {
        let geom = ScaleFactor::IDENTITY.to_player(10, 10, 1024, 576);
        assert_eq!(
            geom,
            WindowGeometry {
                x: 10,
                y: 10,
                width: 1024,
                height: 576
            }
        );
        assert_eq!(geom.right(), 1034);
        assert_eq!(geom.bottom(), 586);
    }

    #[test]
    fn test_framebuffer_scale_divides_reported_geometry() {
        // fbset -g 1280 720: X reports in 720p units, the player wants 1080p.
        let scale = ScaleFactor::from_resolution(1280, 720);
        let geom = scale.to_player(640, 360, 1280, 720);
        assert_eq!(geom.x, 960);
        assert_eq!(geom.y, 540);
        assert_eq!(geom.width, 1920);
        assert_eq!(geom.height, 1080);
    }

    #[test]
    fn test_window_sizes_scale_down_with_the_framebuffer() {
        let scale = ScaleFactor::from_resolution(1280, 720);
        let (w, h) = scale.to_x(1024, 576);
        assert_eq!((w, h), (683, 384));
    }
}
