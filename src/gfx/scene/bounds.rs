//! Axis-aligned bounding boxes.
//!
//! Every scene object keeps one box in local (untransformed) space. The
//! world-space box is derived on demand, either cheaply by transforming the
//! eight local corners or exactly by transforming every vertex.

use cgmath::{Matrix4, Point3, Transform, Vector3};

use super::vertex::Vertex3D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to include `point`.
    pub fn expand(&mut self, point: Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand(point);
        }
        aabb
    }

    /// Box over the positions of `vertices`; empty input yields a zero box at the origin.
    pub fn from_vertices(vertices: &[Vertex3D]) -> Self {
        if vertices.is_empty() {
            return Self::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0));
        }
        Self::from_points(vertices.iter().map(|v| Point3::from(v.position)))
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn max_extent(&self) -> f32 {
        let e = self.extent();
        e.x.max(e.y).max(e.z)
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World box from the eight transformed corners.
    ///
    /// Conservative: it always contains the exact vertex box, and grows under
    /// rotation.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self::from_points(self.corners().iter().map(|c| matrix.transform_point(*c)))
    }

    /// Exact world box from every vertex position.
    pub fn from_transformed_vertices(vertices: &[Vertex3D], matrix: &Matrix4<f32>) -> Self {
        if vertices.is_empty() {
            return Self::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)).transformed(matrix);
        }
        Self::from_points(
            vertices
                .iter()
                .map(|v| matrix.transform_point(Point3::from(v.position))),
        )
    }

    /// Containment test with `epsilon` of slack on every face.
    pub fn contains(&self, point: Point3<f32>, epsilon: f32) -> bool {
        point.x >= self.min.x - epsilon
            && point.x <= self.max.x + epsilon
            && point.y >= self.min.y - epsilon
            && point.y <= self.max.y + epsilon
            && point.z >= self.min.z - epsilon
            && point.z <= self.max.z + epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_aabb_from_vertices() {
        let vertices = vec![
            Vertex3D::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Vertex3D::new([1.0, 1.0, 1.0], [0.0, 1.0, 0.0]),
            Vertex3D::new([-1.0, -2.0, -1.0], [0.0, 1.0, 0.0]),
        ];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, -1.0));
        assert_eq!(aabb.max, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.center(), Point3::new(0.0, -0.5, 0.0));
        assert_eq!(aabb.max_extent(), 3.0);
    }

    #[test]
    fn test_empty_vertices_give_degenerate_box() {
        let aabb = Aabb::from_vertices(&[]);
        assert!(!aabb.is_empty());
        assert_eq!(aabb.max_extent(), 0.0);
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn test_translated_box_moves() {
        let world = unit_box().transformed(&Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)));
        assert_eq!(world.min, Point3::new(1.5, -0.5, -0.5));
        assert_eq!(world.max, Point3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_rotated_corners_box_grows() {
        let rotation = Matrix4::from_angle_y(Deg(45.0));
        let world = unit_box().transformed(&rotation);
        let half_diagonal = 0.5 * 2.0_f32.sqrt();
        assert!((world.max.x - half_diagonal).abs() < 1e-5);
        assert!((world.min.z + half_diagonal).abs() < 1e-5);
        assert!((world.max.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_corner_box_contains_exact_box() {
        // Octahedron: its exact rotated box is strictly smaller than the corner box.
        let vertices: Vec<Vertex3D> = [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ]
        .iter()
        .map(|p| Vertex3D::new(*p, [0.0, 1.0, 0.0]))
        .collect();

        let matrix = Matrix4::from_angle_y(Deg(30.0)) * Matrix4::from_angle_x(Deg(20.0));
        let exact = Aabb::from_transformed_vertices(&vertices, &matrix);
        let corners = Aabb::from_vertices(&vertices).transformed(&matrix);

        assert!(corners.contains(exact.min, 1e-5));
        assert!(corners.contains(exact.max, 1e-5));
        assert!(corners.max_extent() > exact.max_extent());
    }

    #[test]
    fn test_contains_with_epsilon() {
        let aabb = unit_box();
        assert!(aabb.contains(Point3::new(0.5, 0.0, 0.0), 0.0));
        assert!(!aabb.contains(Point3::new(0.5001, 0.0, 0.0), 0.0));
        assert!(aabb.contains(Point3::new(0.5001, 0.0, 0.0), 1e-3));
    }
}
