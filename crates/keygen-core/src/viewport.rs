//! Output size of the render surface and the camera aspect derived from it

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Camera aspect ratio; a collapsed container keeps a square aspect
    pub fn aspect(&self) -> f32 {
        if self.width <= 0.0 || self.height <= 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Apply a container resize; returns true if the size actually changed
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_recomputes_aspect() {
        let mut viewport = Viewport::new(800.0, 600.0);
        assert!((viewport.aspect() - 4.0 / 3.0).abs() < 1e-6);

        assert!(viewport.resize(1920.0, 1080.0));
        assert_eq!(viewport.width, 1920.0);
        assert_eq!(viewport.height, 1080.0);
        assert!((viewport.aspect() - 16.0 / 9.0).abs() < 1e-6);

        assert!(!viewport.resize(1920.0, 1080.0));
    }

    #[test]
    fn test_zero_height_aspect() {
        let viewport = Viewport::new(300.0, 0.0);
        assert_eq!(viewport.aspect(), 1.0);
    }
}
