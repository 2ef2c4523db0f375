use crate::{
    context::Context,
    error::ModelError,
    matrix::{AgeDistrictMatrix, AgeGroup, DistrictId},
    parameters::Parameters,
};

/// Which per-person probability to look up.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RateKind {
    Transmission,
    Incubation,
    Mortality,
    Recovery,
}

/// Immutable probability tables indexed by age group and district.
#[derive(Clone, Debug)]
pub struct RateTables {
    transmission: AgeDistrictMatrix<f64>,
    incubation: AgeDistrictMatrix<f64>,
    mortality: AgeDistrictMatrix<f64>,
    recovery: AgeDistrictMatrix<f64>,
}

impl RateTables {
    /// Builds the tables for `districts` districts. The incubation table is multiplied, row by
    /// row, by the age-stratified infection expectation; this happens once, here.
    pub fn new(parameters: &Parameters, districts: usize) -> Result<Self, ModelError> {
        let expectation: [f64; AgeGroup::COUNT] = parameters
            .as_infection_expectation
            .as_slice()
            .try_into()
            .map_err(|_| ModelError::ShapeMismatch {
                table: "as_infection_expectation",
                expected: AgeGroup::COUNT.to_string(),
                found: parameters.as_infection_expectation.len().to_string(),
            })?;

        let mut incubation =
            AgeDistrictMatrix::from_rows("incubation_rate", &parameters.incubation_rate, districts)?;
        incubation.scale_rows(&expectation);

        Ok(RateTables {
            transmission: AgeDistrictMatrix::from_rows(
                "transmission_rate",
                &parameters.transmission_rate,
                districts,
            )?,
            incubation,
            mortality: AgeDistrictMatrix::from_rows(
                "mortality_rate",
                &parameters.mortality_rate,
                districts,
            )?,
            recovery: AgeDistrictMatrix::from_rows(
                "recovery_rate",
                &parameters.recovery_rate,
                districts,
            )?,
        })
    }

    #[must_use]
    pub fn table(&self, kind: RateKind) -> &AgeDistrictMatrix<f64> {
        match kind {
            RateKind::Transmission => &self.transmission,
            RateKind::Incubation => &self.incubation,
            RateKind::Mortality => &self.mortality,
            RateKind::Recovery => &self.recovery,
        }
    }

    #[must_use]
    pub fn rate(&self, kind: RateKind, age_group: AgeGroup, district: DistrictId) -> f64 {
        self.table(kind).get(age_group, district)
    }
}

pub trait ContextRateTablesExt {
    /// The probability of `kind` for a person in `age_group` living in `district`.
    fn get_rate(&self, kind: RateKind, age_group: AgeGroup, district: DistrictId) -> f64;
}

impl ContextRateTablesExt for Context {
    fn get_rate(&self, kind: RateKind, age_group: AgeGroup, district: DistrictId) -> f64 {
        self.expect_data_container::<RateTables>()
            .rate(kind, age_group, district)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::tests::uniform_parameters;

    #[test]
    fn incubation_is_scaled_by_age_group() {
        let mut parameters = uniform_parameters(2, 0.5);
        parameters.as_infection_expectation[AgeGroup::Age70To79.index()] = 0.2;
        let tables = RateTables::new(&parameters, 2).unwrap();

        let old = tables.rate(RateKind::Incubation, AgeGroup::Age70To79, DistrictId(1));
        assert!((old - 0.1).abs() < 1e-12);
        let young = tables.rate(RateKind::Incubation, AgeGroup::Age0To9, DistrictId(0));
        assert!((young - 0.5).abs() < 1e-12);

        // Only incubation is scaled.
        assert_eq!(
            tables.rate(RateKind::Mortality, AgeGroup::Age70To79, DistrictId(1)),
            0.5
        );
    }

    #[test]
    fn rates_are_looked_up_per_cell() {
        let mut parameters = uniform_parameters(3, 0.0);
        parameters.transmission_rate[AgeGroup::Age40To49.index()][2] = 0.75;
        let tables = RateTables::new(&parameters, 3).unwrap();

        assert_eq!(
            tables.rate(RateKind::Transmission, AgeGroup::Age40To49, DistrictId(2)),
            0.75
        );
        assert_eq!(
            tables.rate(RateKind::Transmission, AgeGroup::Age40To49, DistrictId(1)),
            0.0
        );
    }

    #[test]
    fn mismatched_tables_fail_to_build() {
        let mut parameters = uniform_parameters(2, 0.1);
        parameters.recovery_rate[3].pop();
        assert!(matches!(
            RateTables::new(&parameters, 2),
            Err(ModelError::ShapeMismatch { table: "recovery_rate", .. })
        ));

        let mut parameters = uniform_parameters(2, 0.1);
        parameters.as_infection_expectation.push(1.0);
        assert!(matches!(
            RateTables::new(&parameters, 2),
            Err(ModelError::ShapeMismatch { table: "as_infection_expectation", .. })
        ));
    }
}
