//! Path integrator.
//!
//! Diffuse-only path tracing with next-event estimation: every bounce adds
//! the direct light at the hit point, weighted by the product of base
//! colors along the path.

use lux_core::Scene;
use lux_math::{Camera, Interval, Ray, Vec3};
use rand::Rng;

use crate::light::{light_visibility, RAY_EPSILON};
use crate::raycaster::Raycaster;
use crate::sampling::diffuse_direction;

/// Per-render state shared by all rows.
pub struct PathTracer<'a> {
    scene: &'a Scene,
    raycaster: &'a Raycaster<'a>,
    max_depth: u32,
    origin: Vec3,
    corner: Vec3,
    dx: Vec3,
    dy: Vec3,
}

impl<'a> PathTracer<'a> {
    pub fn new(raycaster: &'a Raycaster<'a>, camera: &Camera, max_depth: u32) -> Self {
        let (corner, dx, dy) = camera.pixel_shifts();
        Self {
            scene: raycaster.scene(),
            raycaster,
            max_depth,
            origin: camera.position,
            corner,
            dx,
            dy,
        }
    }

    /// Camera ray through the image-plane point `ndc` in `[0, 1]^2`, (0, 0) top-left.
    pub fn camera_ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let target = self.corner + ndc_x * self.dx + ndc_y * self.dy;
        Ray::new(self.origin, target - self.origin)
    }

    /// Sum of `samples` jittered path samples through pixel (x, y) of a
    /// `width` x `height` image. Not averaged.
    pub fn render_pixel<R: Rng + ?Sized>(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        samples: u32,
        rng: &mut R,
    ) -> Vec3 {
        let mut color = Vec3::ZERO;
        for _ in 0..samples {
            let jx: f32 = rng.gen();
            let jy: f32 = rng.gen();
            let ray = self.camera_ray(
                (x as f32 + jx) / width as f32,
                (y as f32 + jy) / height as f32,
            );
            color += self.trace(ray, rng);
        }
        color
    }

    /// Radiance carried back along one path starting with `ray`.
    ///
    /// The background only counts when the camera ray itself escapes;
    /// escaping bounce rays add nothing.
    pub fn trace<R: Rng + ?Sized>(&self, mut ray: Ray, rng: &mut R) -> Vec3 {
        if self.max_depth == 0 {
            return self.scene.background.sample(ray.direction());
        }

        let mut color = Vec3::ZERO;
        let mut throughput = Vec3::ONE;

        for bounce in 0..self.max_depth {
            let Some(hit) = self.raycaster.intersect(&ray) else {
                if bounce == 0 {
                    color += self.scene.background.sample(ray.direction());
                }
                break;
            };

            let material = self.raycaster.material(&hit);
            let point = self.raycaster.hit_point(&ray, &hit);
            let mut normal = self.raycaster.interpolate_normal(&hit);
            if material.two_sided && normal.dot(ray.direction()) > 0.0 {
                normal = -normal;
            }
            let uv = self.raycaster.interpolate_uv(&hit);
            let base_color = material.base_color.sample_linear(uv);

            let illumination = self.scene.lights.iter().fold(Vec3::ZERO, |acc, light| {
                match light_visibility(light, point, self.raycaster) {
                    Some(sample) => {
                        acc + sample.attenuation
                            * normal.dot(sample.direction).max(0.0)
                            * light.intensity()
                    }
                    None => acc,
                }
            });

            throughput *= base_color;
            color += throughput * illumination;

            if bounce + 1 < self.max_depth {
                let direction = diffuse_direction(normal, rng);
                ray = Ray::with_interval(point, direction, Interval::new(RAY_EPSILON, f32::INFINITY));
            }
        }

        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_core::{Background, Light, Material, Mesh, Object};
    use lux_math::Mat4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 1.0)
    }

    #[test]
    fn test_camera_ray_corners() {
        let scene = Scene::new("empty");
        let raycaster = Raycaster::new(&scene);
        let tracer = PathTracer::new(&raycaster, &camera(), 1);

        let center = tracer.camera_ray(0.5, 0.5);
        assert!((center.direction() - Vec3::NEG_Z).length() < 1e-5);

        // Top-left looks up and to the left
        let top_left = tracer.camera_ray(0.0, 0.0);
        assert!(top_left.direction().x < 0.0);
        assert!(top_left.direction().y > 0.0);
    }

    #[test]
    fn test_background_only_on_camera_ray() {
        let mut scene = Scene::new("sky");
        scene.background = Background::Color(Vec3::splat(0.5));
        let raycaster = Raycaster::new(&scene);
        let tracer = PathTracer::new(&raycaster, &camera(), 5);

        let mut rng = StdRng::seed_from_u64(1);
        let color = tracer.trace(Ray::new(Vec3::ZERO, Vec3::NEG_Z), &mut rng);
        assert_eq!(color, Vec3::splat(0.5));
    }

    #[test]
    fn test_direct_light_on_quad() {
        let mut scene = Scene::new("lit");
        let mesh = scene.add_mesh(Mesh::quad());
        scene.add_object(Object::new(
            "quad",
            mesh,
            Mat4::from_scale(Vec3::splat(10.0)),
            Material::new("white", Vec3::ONE),
        ));
        scene.add_light(Light::directional(Vec3::NEG_Z, Vec3::splat(0.8)));
        scene.background = Background::Color(Vec3::X);

        let raycaster = Raycaster::new(&scene);
        // Single bounce: base color 1, light straight on
        let tracer = PathTracer::new(&raycaster, &camera(), 1);
        let mut rng = StdRng::seed_from_u64(1);
        let color = tracer.trace(Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z), &mut rng);
        assert!((color - Vec3::splat(0.8)).length() < 1e-5);
    }

    #[test]
    fn test_single_sided_back_face_is_dark() {
        let mut scene = Scene::new("back");
        let mesh = scene.add_mesh(Mesh::quad());
        scene.add_object(Object::new("quad", mesh, Mat4::IDENTITY, Material::new("white", Vec3::ONE)));
        // Light behind the quad, viewed from behind
        scene.add_light(Light::directional(Vec3::Z, Vec3::ONE));

        let raycaster = Raycaster::new(&scene);
        let tracer = PathTracer::new(&raycaster, &camera(), 1);
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        assert_eq!(tracer.trace(ray, &mut rng), Vec3::ZERO);

        // Two-sided: the normal flips towards the viewer and the light counts
        scene.objects[0].material.two_sided = true;
        let raycaster = Raycaster::new(&scene);
        let tracer = PathTracer::new(&raycaster, &camera(), 1);
        let color = tracer.trace(ray, &mut rng);
        assert!((color - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_zero_depth_returns_background() {
        let mut scene = Scene::new("bg");
        let mesh = scene.add_mesh(Mesh::quad());
        scene.add_object(Object::new("quad", mesh, Mat4::IDENTITY, Material::default()));
        scene.background = Background::Color(Vec3::new(0.2, 0.3, 0.4));

        let raycaster = Raycaster::new(&scene);
        let tracer = PathTracer::new(&raycaster, &camera(), 0);
        let mut rng = StdRng::seed_from_u64(1);
        // Aimed straight at the quad, still background
        let color = tracer.trace(Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z), &mut rng);
        assert_eq!(color, Vec3::new(0.2, 0.3, 0.4));
    }
}
