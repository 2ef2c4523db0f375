use ixa_geo_seir::{
    initialize, run, AgeGroup, AgentId, Compartment, Context, ContextAggregationExt,
    ContextDistrictExt, ContextPopulationExt, ContextSchedulerExt, ContextSnapshotExt,
    DistrictDefinition, InitialPopulation, Parameters, Point, SimulationRng, SpatialIndex,
};
use std::collections::HashMap;

fn table<T: Clone>(districts: usize, value: T) -> Vec<Vec<T>> {
    vec![vec![value; districts]; AgeGroup::COUNT]
}

/// A 10 x 10 square, an L-shaped district to its right and a triangle above them.
fn districts() -> Vec<DistrictDefinition> {
    vec![
        DistrictDefinition {
            name: "square".to_string(),
            boundary: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
        },
        DistrictDefinition {
            name: "ell".to_string(),
            boundary: vec![
                [10.0, 0.0],
                [20.0, 0.0],
                [20.0, 5.0],
                [15.0, 5.0],
                [15.0, 10.0],
                [10.0, 10.0],
            ],
        },
        DistrictDefinition {
            name: "triangle".to_string(),
            boundary: vec![[0.0, 10.0], [20.0, 10.0], [10.0, 20.0]],
        },
    ]
}

fn quiet_parameters() -> Parameters {
    let districts = districts();
    let count = districts.len();
    Parameters {
        seed: 8675309,
        districts,
        transmission_rate: table(count, 0.0),
        incubation_rate: table(count, 0.0),
        mortality_rate: table(count, 0.0),
        recovery_rate: table(count, 0.0),
        recovery_period: 14.0,
        as_infection_expectation: vec![1.0; AgeGroup::COUNT],
        wearing_mask_percentage: 0.0,
        wearing_mask_protection: 0.0,
        physical_distancing_percentage: 0.0,
        physical_distancing_protection: 0.0,
        with_low_immunity_percentage: 0.0,
        min_age_restriction: 0,
        max_age_restriction: 120,
        mobile_worker_percentage: 0.3,
        agent_exposure_distance: 1.5,
        agent_mobility_range: 1,
    }
}

fn active_parameters() -> Parameters {
    let count = districts().len();
    Parameters {
        transmission_rate: table(count, 0.4),
        incubation_rate: table(count, 0.3),
        mortality_rate: table(count, 0.02),
        recovery_rate: table(count, 0.2),
        recovery_period: 5.0,
        wearing_mask_percentage: 0.5,
        wearing_mask_protection: 0.6,
        physical_distancing_percentage: 0.4,
        physical_distancing_protection: 0.5,
        with_low_immunity_percentage: 0.05,
        ..quiet_parameters()
    }
}

fn mixed_population() -> InitialPopulation {
    let count = districts().len();
    let mut population = InitialPopulation {
        susceptible: table(count, 8),
        exposed: table(count, 0),
        infected: table(count, 0),
        removed: table(count, 0),
    };
    population.exposed[2] = vec![2, 1, 0];
    population.infected[4] = vec![3, 0, 2];
    population.removed[7] = vec![1, 1, 1];
    population
}

fn compartments(context: &Context) -> HashMap<AgentId, Compartment> {
    context
        .live_agent_ids()
        .into_iter()
        .map(|id| (id, context.get_agent(id).unwrap().compartment()))
        .collect()
}

#[test]
fn counts_are_conserved_every_step() {
    let mut context = initialize(&active_parameters(), &mixed_population()).unwrap();
    let initial = context.get_aggregation().initial_population().clone();

    for _ in 0..40 {
        context.step();
        let aggregation = context.get_aggregation();
        assert!(aggregation.is_conserved());
        assert_eq!(aggregation.initial_population(), &initial);

        // Live people are exactly the S, E and I counts.
        let live = aggregation.city_count_of(Compartment::Susceptible)
            + aggregation.city_count_of(Compartment::Exposed)
            + aggregation.city_count_of(Compartment::Infected);
        assert_eq!(live, context.live_agent_count() as u64);
    }
}

#[test]
fn peaks_and_totals_never_decrease() {
    let mut context = initialize(&active_parameters(), &mixed_population()).unwrap();
    run(&mut context, 60);
    // One more snapshot so the history ends with the final aggregates.
    context.record_snapshot();

    let history = context.get_snapshot_history();
    for pair in history.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        for (old, new) in before.peaks.iter().zip(&after.peaks) {
            assert!(new.max_exposed >= old.max_exposed);
            assert!(new.max_exposed_time >= old.max_exposed_time);
            assert!(new.max_infected >= old.max_infected);
            assert!(new.max_infected_time >= old.max_infected_time);
        }
        for (old, new) in before.totals.iter().zip(&after.totals) {
            assert!(new.total_exposed >= old.total_exposed);
            assert!(new.total_infected >= old.total_infected);
            assert!(new.total_dead >= old.total_dead);
            assert!(new.total_recovered >= old.total_recovered);
        }
    }

    let last = history.last().unwrap();
    let dead: u64 = last.totals.iter().map(|total| total.total_dead).sum();
    let recovered: u64 = last.totals.iter().map(|total| total.total_recovered).sum();
    assert_eq!(dead, last.dead.total());
    assert_eq!(recovered, last.recovered.total());
    // Three people started out Removed.
    assert_eq!(last.city.removed, 3 + dead + recovered);
}

#[test]
fn certain_transmission_exposes_a_neighbor_in_one_step() {
    let mut parameters = quiet_parameters();
    parameters.transmission_rate[3][0] = 1.0;
    // Every point of the square is within this distance of every other, even after a move.
    parameters.agent_exposure_distance = 20.0;
    let count = parameters.districts.len();
    let mut population = InitialPopulation {
        susceptible: table(count, 0),
        exposed: table(count, 0),
        infected: table(count, 0),
        removed: table(count, 0),
    };
    population.susceptible[3][0] = 1;
    population.infected[3][0] = 1;
    let mut context = initialize(&parameters, &population).unwrap();

    context.step();

    let aggregation = context.get_aggregation();
    assert_eq!(aggregation.city_count_of(Compartment::Exposed), 1);
    assert_eq!(aggregation.city_count_of(Compartment::Susceptible), 0);
    assert_eq!(aggregation.totals()[0].total_exposed, 1);
    assert_eq!(aggregation.peaks()[0].max_exposed, 1);
    assert_eq!(aggregation.peaks()[0].max_exposed_time, 1);
}

#[test]
fn agent_views_agree_with_the_aggregates() {
    let mut parameters = quiet_parameters();
    parameters.incubation_rate = table(3, 1.0);
    let mut population = InitialPopulation {
        susceptible: table(3, 0),
        exposed: table(3, 0),
        infected: table(3, 0),
        removed: table(3, 0),
    };
    population.exposed[3][1] = 1;
    let mut context = initialize(&parameters, &population).unwrap();
    let ell = context.get_districts().id("ell").unwrap();
    let id = context.live_agent_ids()[0];

    let agent = *context.get_agent(id).unwrap();
    assert_eq!(agent.id(), id);
    assert_eq!(agent.district(), ell);
    assert_eq!(agent.compartment(), Compartment::Exposed);
    assert_eq!(agent.age_group(), AgeGroup::Age30To39);
    assert_eq!(AgeGroup::from_age(agent.age()), agent.age_group());
    assert_eq!(agent.days_infected(), 0);

    context.step();

    let agent = *context.get_agent(id).unwrap();
    assert_eq!(agent.compartment(), Compartment::Infected);
    assert_eq!(agent.district(), ell);
    let aggregation = context.get_aggregation();
    assert_eq!(
        aggregation.count(Compartment::Infected, agent.age_group(), agent.district()),
        1
    );
    assert_eq!(
        aggregation.count(Compartment::Exposed, agent.age_group(), agent.district()),
        0
    );
    assert!(aggregation.is_conserved());
}

#[test]
fn zero_probabilities_freeze_compartments() {
    let mut context = initialize(&quiet_parameters(), &mixed_population()).unwrap();
    let before = compartments(&context);
    let positions: Vec<Point> = context
        .live_agent_ids()
        .into_iter()
        .map(|id| context.get_agent(id).unwrap().position())
        .collect();

    for _ in 0..25 {
        context.step();
    }

    assert_eq!(compartments(&context), before);
    let moved = context
        .live_agent_ids()
        .into_iter()
        .zip(&positions)
        .filter(|(id, position)| context.get_agent(*id).unwrap().position() != **position)
        .count();
    assert!(moved > 0);
}

#[test]
fn people_outside_the_age_window_stay_put() {
    let mut parameters = quiet_parameters();
    parameters.min_age_restriction = 30;
    parameters.max_age_restriction = 49;
    let mut context = initialize(&parameters, &mixed_population()).unwrap();
    let start: HashMap<AgentId, Point> = context
        .live_agent_ids()
        .into_iter()
        .map(|id| (id, context.get_agent(id).unwrap().position()))
        .collect();

    for _ in 0..15 {
        context.step();
    }

    let mut moved_in_window = 0;
    for id in context.live_agent_ids() {
        let agent = context.get_agent(id).unwrap();
        if (30..=49).contains(&agent.age()) {
            moved_in_window += usize::from(agent.position() != start[&id]);
        } else {
            assert_eq!(agent.position(), start[&id], "{id:?} aged {} moved", agent.age());
        }
    }
    assert!(moved_in_window > 0);
}

#[test]
fn sampled_points_stay_in_their_district() {
    let mut context = initialize(&quiet_parameters(), &mixed_population()).unwrap();
    let ids: Vec<_> = context.get_districts().ids().collect();
    for district in ids {
        for _ in 0..2000 {
            let point = context.sample_point_in_district::<SimulationRng>(district);
            assert!(context.get_districts().contains(&point, district));
        }
    }

    // People start inside their home district.
    for id in context.live_agent_ids() {
        let agent = context.get_agent(id).unwrap();
        assert_eq!(context.get_districts().locate(&agent.position()), Some(agent.district()));
    }
}

#[test]
fn removed_people_never_come_back() {
    let mut parameters = active_parameters();
    parameters.mortality_rate = table(3, 0.5);
    parameters.recovery_rate = table(3, 0.5);
    let mut context = initialize(&parameters, &mixed_population()).unwrap();
    let mut removed: Vec<AgentId> = Vec::new();

    for _ in 0..30 {
        let live_before = context.live_agent_ids();
        context.step();
        let live_after = context.live_agent_ids();
        removed.extend(live_before.into_iter().filter(|id| !live_after.contains(id)));

        let index = context.expect_data_container::<SpatialIndex>();
        let everyone = index.within_distance(Point::new(10.0, 10.0), 1000.0);
        assert_eq!(everyone, live_after);
        for id in &removed {
            assert!(context.get_agent(*id).is_none());
            assert!(!index.contains(*id));
        }
    }
    assert!(!removed.is_empty());
}

#[test]
fn same_seed_same_run() {
    let first = {
        let mut context = initialize(&active_parameters(), &mixed_population()).unwrap();
        run(&mut context, 30);
        context
    };
    let second = {
        let mut context = initialize(&active_parameters(), &mixed_population()).unwrap();
        run(&mut context, 30);
        context
    };

    assert_eq!(first.get_snapshot_history(), second.get_snapshot_history());
    assert_eq!(first.live_agent_ids(), second.live_agent_ids());
    for id in first.live_agent_ids() {
        assert_eq!(first.get_agent(id), second.get_agent(id));
    }
}

#[test]
fn a_full_run_writes_its_reports() {
    let mut context = initialize(&active_parameters(), &mixed_population()).unwrap();
    let steps = run(&mut context, 200);
    assert!(steps > 0);
    assert_eq!(context.get_snapshot_history().len(), steps);
    if steps < 200 {
        assert!(context.is_epidemic_over());
    }

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("history.csv");
    let json_path = dir.path().join("summary.json");
    context.write_history_csv(&csv_path).unwrap();
    context.write_summary_json(&json_path).unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    // A header plus one row per step and district.
    assert_eq!(csv.lines().count(), 1 + steps * 3);
    assert!(csv.starts_with("step,district,susceptible,exposed,infected,removed"));
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(summary["districts"][1]["district"], "ell");
}
