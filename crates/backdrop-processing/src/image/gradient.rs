use image::RgbaImage;

/// Concentric radial gradient over a scalar value (opacity).
///
/// Distances inside `inner_radius` take the first stop, distances beyond
/// `outer_radius` take the last one. Between stops the value is linear.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: (f32, f32),
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// `(offset, value)` pairs sorted by offset in `[0, 1]`
    stops: Vec<(f32, f32)>,
}

impl RadialGradient {
    pub fn new(center: (f32, f32), inner_radius: f32, outer_radius: f32) -> Self {
        Self {
            center,
            inner_radius,
            outer_radius,
            stops: Vec::new(),
        }
    }

    /// Add a color stop; offsets are clamped to `[0, 1]`
    pub fn with_stop(mut self, offset: f32, value: f32) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let idx = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(idx, (offset, value));
        self
    }

    pub fn stops(&self) -> &[(f32, f32)] {
        &self.stops
    }

    /// Value of the gradient at a point
    pub fn value_at(&self, x: f32, y: f32) -> f32 {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };

        let span = self.outer_radius - self.inner_radius;
        let distance = (x - self.center.0).hypot(y - self.center.1);
        let t = if span <= f32::EPSILON {
            if distance < self.inner_radius {
                0.0
            } else {
                1.0
            }
        } else {
            ((distance - self.inner_radius) / span).clamp(0.0, 1.0)
        };

        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        for pair in self.stops.windows(2) {
            let (o0, v0) = pair[0];
            let (o1, v1) = pair[1];
            if t <= o1 {
                if o1 - o0 <= f32::EPSILON {
                    return v1;
                }
                return v0 + (v1 - v0) * (t - o0) / (o1 - o0);
            }
        }

        last.1
    }

    /// Source-over fill of black at the gradient's opacity, sampled at pixel
    /// centers.
    pub fn darken(&self, canvas: &mut RgbaImage) {
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            let alpha = self.value_at(x as f32 + 0.5, y as f32 + 0.5).clamp(0.0, 1.0);
            if alpha <= 0.0 {
                continue;
            }
            let keep = 1.0 - alpha;
            for channel in pixel.0.iter_mut().take(3) {
                *channel = (*channel as f32 * keep).round() as u8;
            }
            let dst_alpha = pixel.0[3] as f32 / 255.0;
            pixel.0[3] = ((alpha + dst_alpha * keep) * 255.0).round() as u8;
        }
    }

    /// Multiply each pixel's alpha by the gradient, with `origin` giving the
    /// layer's position in gradient space.
    pub fn mask_alpha(&self, layer: &mut RgbaImage, origin: (i64, i64)) {
        for (x, y, pixel) in layer.enumerate_pixels_mut() {
            let gx = (origin.0 + x as i64) as f32 + 0.5;
            let gy = (origin.1 + y as i64) as f32 + 0.5;
            let factor = self.value_at(gx, gy).clamp(0.0, 1.0);
            pixel.0[3] = (pixel.0[3] as f32 * factor).round() as u8;
        }
    }
}
