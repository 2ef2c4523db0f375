/*!

Tables indexed by age group and district. Every rate, count and terminal-outcome table in the
model has this shape: one row per [`AgeGroup`], one column per district.

*/

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

/// One of nine ten-year age bands. The last band is open-ended.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum AgeGroup {
    Age0To9,
    Age10To19,
    Age20To29,
    Age30To39,
    Age40To49,
    Age50To59,
    Age60To69,
    Age70To79,
    Age80Plus,
}

impl AgeGroup {
    pub const COUNT: usize = 9;

    pub const ALL: [AgeGroup; AgeGroup::COUNT] = [
        AgeGroup::Age0To9,
        AgeGroup::Age10To19,
        AgeGroup::Age20To29,
        AgeGroup::Age30To39,
        AgeGroup::Age40To49,
        AgeGroup::Age50To59,
        AgeGroup::Age60To69,
        AgeGroup::Age70To79,
        AgeGroup::Age80Plus,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_age(age: u8) -> AgeGroup {
        AgeGroup::ALL[usize::from(age / 10).min(AgeGroup::COUNT - 1)]
    }

    /// Ages assigned to newly created people in this band. The open-ended band draws from 80..=89.
    #[must_use]
    pub fn sampling_range(self) -> (u8, u8) {
        let low = u8::try_from(self.index() * 10).unwrap_or(u8::MAX);
        (low, low + 9)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Age0To9 => "0 to 9",
            AgeGroup::Age10To19 => "10 to 19",
            AgeGroup::Age20To29 => "20 to 29",
            AgeGroup::Age30To39 => "30 to 39",
            AgeGroup::Age40To49 => "40 to 49",
            AgeGroup::Age50To59 => "50 to 59",
            AgeGroup::Age60To69 => "60 to 69",
            AgeGroup::Age70To79 => "70 to 79",
            AgeGroup::Age80Plus => "80+",
        }
    }
}

impl Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of a district in the registry, which is also its column in every matrix.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct DistrictId(pub(crate) usize);

impl DistrictId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A dense `AgeGroup::COUNT` x `districts` table stored row-major.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct AgeDistrictMatrix<T> {
    districts: usize,
    values: Vec<T>,
}

impl<T: Copy + Default> AgeDistrictMatrix<T> {
    #[must_use]
    pub fn zeros(districts: usize) -> Self {
        Self {
            districts,
            values: vec![T::default(); AgeGroup::COUNT * districts],
        }
    }

    /// Builds a matrix from nine rows of per-district values, checking the shape.
    pub fn from_rows(
        table: &'static str,
        rows: &[Vec<T>],
        districts: usize,
    ) -> Result<Self, ModelError> {
        let found_columns = rows.iter().map(Vec::len).find(|len| *len != districts);
        if rows.len() != AgeGroup::COUNT || found_columns.is_some() {
            return Err(ModelError::ShapeMismatch {
                table,
                expected: format!("{} x {districts}", AgeGroup::COUNT),
                found: format!(
                    "{} x {}",
                    rows.len(),
                    found_columns.unwrap_or(districts)
                ),
            });
        }

        Ok(Self {
            districts,
            values: rows.iter().flatten().copied().collect(),
        })
    }

    #[must_use]
    pub fn get(&self, age_group: AgeGroup, district: DistrictId) -> T {
        self[(age_group, district)]
    }
}

impl<T> AgeDistrictMatrix<T> {
    #[must_use]
    pub fn district_count(&self) -> usize {
        self.districts
    }

    fn offset(&self, age_group: AgeGroup, district: DistrictId) -> usize {
        assert!(
            district.0 < self.districts,
            "district {} is outside a table with {} districts",
            district.0,
            self.districts
        );
        age_group.index() * self.districts + district.0
    }

    /// The values of one district, one per age group.
    pub fn column(&self, district: DistrictId) -> impl Iterator<Item = &T> + '_ {
        AgeGroup::ALL
            .into_iter()
            .map(move |age_group| &self.values[self.offset(age_group, district)])
    }

    /// Iterates over `(age group, district, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (AgeGroup, DistrictId, &T)> + '_ {
        self.values.iter().enumerate().map(|(idx, value)| {
            (
                AgeGroup::ALL[idx / self.districts],
                DistrictId(idx % self.districts),
                value,
            )
        })
    }

    pub fn scale_rows(&mut self, factors: &[f64; AgeGroup::COUNT])
    where
        T: std::ops::MulAssign<f64>,
    {
        let districts = self.districts;
        for (idx, value) in self.values.iter_mut().enumerate() {
            *value *= factors[idx / districts];
        }
    }
}

impl<T: Copy + std::iter::Sum<T>> AgeDistrictMatrix<T> {
    /// Sum over all age groups of one district.
    #[must_use]
    pub fn district_total(&self, district: DistrictId) -> T {
        self.column(district).copied().sum()
    }

    #[must_use]
    pub fn total(&self) -> T {
        self.values.iter().copied().sum()
    }
}

impl<T> Index<(AgeGroup, DistrictId)> for AgeDistrictMatrix<T> {
    type Output = T;

    fn index(&self, (age_group, district): (AgeGroup, DistrictId)) -> &T {
        &self.values[self.offset(age_group, district)]
    }
}

impl<T> IndexMut<(AgeGroup, DistrictId)> for AgeDistrictMatrix<T> {
    fn index_mut(&mut self, (age_group, district): (AgeGroup, DistrictId)) -> &mut T {
        let offset = self.offset(age_group, district);
        &mut self.values[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(districts: usize) -> Vec<Vec<u64>> {
        (0..AgeGroup::COUNT as u64)
            .map(|row| (0..districts as u64).map(|col| row * 10 + col).collect())
            .collect()
    }

    #[test]
    fn age_groups_cover_all_ages() {
        assert_eq!(AgeGroup::from_age(0), AgeGroup::Age0To9);
        assert_eq!(AgeGroup::from_age(19), AgeGroup::Age10To19);
        assert_eq!(AgeGroup::from_age(79), AgeGroup::Age70To79);
        assert_eq!(AgeGroup::from_age(80), AgeGroup::Age80Plus);
        assert_eq!(AgeGroup::from_age(104), AgeGroup::Age80Plus);
        assert_eq!(AgeGroup::Age80Plus.sampling_range(), (80, 89));
        assert_eq!(AgeGroup::Age30To39.to_string(), "30 to 39");
    }

    #[test]
    fn indexing_is_row_major() {
        let matrix = AgeDistrictMatrix::from_rows("counts", &rows(3), 3).unwrap();
        assert_eq!(matrix.get(AgeGroup::Age20To29, DistrictId(1)), 21);
        assert_eq!(matrix.district_total(DistrictId(2)), (0..9).map(|r| r * 10 + 2).sum::<u64>());
        assert_eq!(matrix.get(AgeGroup::Age80Plus, DistrictId(2)), 82);

        let (age_group, district, value) = matrix.iter().nth(4).unwrap();
        assert_eq!((age_group, district, *value), (AgeGroup::Age10To19, DistrictId(1), 11));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let mut short = rows(3);
        short.pop();
        assert!(matches!(
            AgeDistrictMatrix::from_rows("counts", &short, 3),
            Err(ModelError::ShapeMismatch { table: "counts", .. })
        ));

        let mut ragged = rows(3);
        ragged[4].push(1);
        assert!(AgeDistrictMatrix::from_rows("counts", &ragged, 3).is_err());
    }

    #[test]
    fn rows_can_be_scaled() {
        let mut matrix = AgeDistrictMatrix::<f64>::zeros(2);
        for age_group in AgeGroup::ALL {
            matrix[(age_group, DistrictId(0))] = 1.0;
            matrix[(age_group, DistrictId(1))] = 0.5;
        }
        let mut factors = [1.0; AgeGroup::COUNT];
        factors[AgeGroup::Age60To69.index()] = 0.25;
        matrix.scale_rows(&factors);

        assert_eq!(matrix.get(AgeGroup::Age60To69, DistrictId(0)), 0.25);
        assert_eq!(matrix.get(AgeGroup::Age60To69, DistrictId(1)), 0.125);
        assert_eq!(matrix.get(AgeGroup::Age0To9, DistrictId(1)), 0.5);
    }

    #[test]
    #[should_panic(expected = "outside a table")]
    fn out_of_range_district_panics() {
        let matrix = AgeDistrictMatrix::<u64>::zeros(2);
        let _ = matrix.get(AgeGroup::Age0To9, DistrictId(2));
    }
}
