use glam::{Mat4, Vec3};

/// Pinhole camera description.
///
/// Holds the pose and projection parameters; the ray tracer only needs
/// the near-plane basis returned by [`Camera::pixel_shifts`].
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y: 45.0_f32.to_radians(),
            aspect,
            near: 0.01,
            far: 100.0,
        }
    }

    /// Set position, look target and up vector.
    pub fn pose(mut self, position: Vec3, target: Vec3, up: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self.up = up;
        self
    }

    /// Set aspect ratio, vertical field of view (radians) and clip planes.
    pub fn projection(mut self, aspect: f32, fov_y: f32, near: f32, far: f32) -> Self {
        self.aspect = aspect;
        self.fov_y = fov_y;
        self.near = near;
        self.far = far;
        self
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix (camera → clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Ray-generation basis on the near plane: `(corner, dx, dy)`.
    ///
    /// `corner` is the top-left corner of the visible near-plane rectangle,
    /// `dx` spans its full width to the right and `dy` its full height
    /// downwards, so `corner + u * dx + v * dy` for `u, v` in `[0, 1]`
    /// covers the image with row 0 at the top.
    pub fn pixel_shifts(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.position).normalize();
        // A view along `up` has no horizon; pick any perpendicular
        let right = forward
            .cross(self.up)
            .try_normalize()
            .or_else(|| forward.cross(Vec3::Z).try_normalize())
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let true_up = right.cross(forward);

        let half_height = self.near * (0.5 * self.fov_y).tan();
        let half_width = half_height * self.aspect;

        let center = self.position + self.near * forward;
        let corner = center - half_width * right + half_height * true_up;
        let dx = 2.0 * half_width * right;
        let dy = -2.0 * half_height * true_up;
        (corner, dx, dy)
    }
}
