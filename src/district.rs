/*!

Districts are fixed polygonal regions. Every person has a home district, assigned at creation and
never changed; positions may drift outside it.

*/

use crate::{
    context::Context,
    error::ModelError,
    matrix::DistrictId,
    parameters::DistrictDefinition,
    random::{ContextRandomExt, RngId},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    #[must_use]
    pub fn distance_2(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    fn around(points: &[Point]) -> Self {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        BoundingBox { min, max }
    }

    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }
}

/// A simple polygon. The ring is implicitly closed.
#[derive(Clone, PartialEq, Debug)]
pub struct Polygon {
    vertices: Vec<Point>,
    bounds: BoundingBox,
}

impl Polygon {
    pub fn new(name: &str, ring: &[[f64; 2]]) -> Result<Self, ModelError> {
        let mut vertices: Vec<Point> = ring.iter().map(|&[x, y]| Point::new(x, y)).collect();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(ModelError::InvalidPolygon(name.to_string()));
        }

        let bounds = BoundingBox::around(&vertices);
        Ok(Polygon { vertices, bounds })
    }

    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    /// Strict containment: points on the boundary are outside.
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        if !self.bounds.contains(point) {
            return false;
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment(point, a, b) {
                return false;
            }
            // Even-odd rule with a ray cast towards +x.
            if (a.y > point.y) != (b.y > point.y) {
                let crossing_x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if point.x < crossing_x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Draws uniform points in the bounding box until one lands inside the polygon. There is no
    /// cap on the number of draws, so a sliver polygon can take a very long time.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let BoundingBox { min, max } = self.bounds;
        loop {
            let candidate = Point::new(
                rng.random_range(min.x..=max.x),
                rng.random_range(min.y..=max.y),
            );
            if self.contains(&candidate) {
                return candidate;
            }
        }
    }
}

fn on_segment(point: &Point, a: &Point, b: &Point) -> bool {
    let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
    cross == 0.0
        && point.x >= a.x.min(b.x)
        && point.x <= a.x.max(b.x)
        && point.y >= a.y.min(b.y)
        && point.y <= a.y.max(b.y)
}

#[derive(Clone, Debug)]
struct District {
    name: String,
    polygon: Polygon,
}

/// The fixed set of districts of a run, in registration order.
#[derive(Clone, Debug)]
pub struct DistrictRegistry {
    districts: Vec<District>,
}

impl DistrictRegistry {
    pub fn new(definitions: &[DistrictDefinition]) -> Result<Self, ModelError> {
        let mut districts = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if districts
                .iter()
                .any(|district: &District| district.name == definition.name)
            {
                return Err(ModelError::ModelError(format!(
                    "district {} is defined twice",
                    definition.name
                )));
            }
            districts.push(District {
                name: definition.name.clone(),
                polygon: Polygon::new(&definition.name, &definition.boundary)?,
            });
        }
        Ok(DistrictRegistry { districts })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.districts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DistrictId> {
        (0..self.districts.len()).map(DistrictId)
    }

    #[must_use]
    pub fn name(&self, district: DistrictId) -> &str {
        &self.districts[district.0].name
    }

    pub fn id(&self, name: &str) -> Result<DistrictId, ModelError> {
        self.districts
            .iter()
            .position(|district| district.name == name)
            .map(DistrictId)
            .ok_or_else(|| ModelError::UnknownDistrict(name.to_string()))
    }

    #[must_use]
    pub fn polygon(&self, district: DistrictId) -> &Polygon {
        &self.districts[district.0].polygon
    }

    #[must_use]
    pub fn contains(&self, point: &Point, district: DistrictId) -> bool {
        self.polygon(district).contains(point)
    }

    /// Name-keyed version of [`DistrictRegistry::contains`].
    pub fn contains_named(&self, point: &Point, name: &str) -> Result<bool, ModelError> {
        Ok(self.contains(point, self.id(name)?))
    }

    pub fn random_point_in<R: Rng + ?Sized>(&self, district: DistrictId, rng: &mut R) -> Point {
        self.polygon(district).random_point(rng)
    }

    /// The first district, in registration order, whose polygon contains `point`.
    #[must_use]
    pub fn locate(&self, point: &Point) -> Option<DistrictId> {
        self.ids().find(|district| self.contains(point, *district))
    }
}

pub trait ContextDistrictExt {
    fn get_districts(&self) -> &DistrictRegistry;

    /// Samples a position inside `district` from the random stream `R`.
    fn sample_point_in_district<R: RngId>(&mut self, district: DistrictId) -> Point
    where
        R::RngType: Rng;
}

impl ContextDistrictExt for Context {
    fn get_districts(&self) -> &DistrictRegistry {
        self.expect_data_container::<DistrictRegistry>()
    }

    fn sample_point_in_district<R: RngId>(&mut self, district: DistrictId) -> Point
    where
        R::RngType: Rng,
    {
        let polygon = self.get_districts().polygon(district).clone();
        self.sample::<R, _>(|rng| polygon.random_point(rng))
    }
}
