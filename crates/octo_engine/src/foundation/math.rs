//! Math utilities and types
//!
//! Provides the small set of math types the 2D node contract needs.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Linearly interpolate between two vectors
pub fn lerp(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Clamp the length of a vector without changing its direction
pub fn clamp_length(v: Vec2, max_length: f32) -> Vec2 {
    let length = v.norm();
    if max_length > 0.0 && length > max_length {
        v * (max_length / length)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lerp_clamps_factor() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, -4.0);

        assert_relative_eq!(lerp(a, b, 0.5), Vec2::new(5.0, -2.0));
        assert_relative_eq!(lerp(a, b, 2.0), b);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(3.0, 4.0);
        assert_relative_eq!(clamp_length(v, 10.0), v);
        assert_relative_eq!(clamp_length(v, 2.5).norm(), 2.5, epsilon = 1e-6);
        // Zero means unlimited
        assert_relative_eq!(clamp_length(v, 0.0), v);
    }
}
