use evoview_core::frame::FrameSynchronizer;
use evoview_core::statistics::{Channel, StatisticsTable};
use evoview_core::trajectory::{
    parse_evolution, serialize_evolution, Evolution, Generation, Individual, ParseMode,
};
use evoview_core::ViewError;

const RUN: &str = "\
-5.12,-5.12,57.85;1.5,0.5,22.5;0.98,1.02,2.1;\n\
0.9,1.1,3.3;-0.02,0.01,0.09;0.5,0.5,40.5;1.0,1.0,2.0;\n\
0.01,0.0,0.02;0.02,0.01,0.02;0.3,-0.1,11.2;\n";

const STATS: &str = "\
average_fitness,best_fitness,selection_pressure\n\
27.48,2.1,0.076\n\
11.47,0.09,0.0078\n\
3.75,0.02,0.0053\n";

fn run() -> Evolution {
    parse_evolution(RUN, ParseMode::Strict).unwrap().evolution
}

#[test]
fn scenario_two_records_best_is_second() {
    let parsed = parse_evolution("1.0,2.0,5.0;-1.0,0.0,3.0", ParseMode::Lenient).unwrap();
    let evolution = parsed.evolution;
    assert_eq!(evolution.population(0).unwrap().len(), 2);
    assert_eq!(evolution.best(0).unwrap(), &Individual::new(-1.0, 0.0, 3.0));
}

#[test]
fn scenario_malformed_record_is_dropped() {
    let parsed = parse_evolution("1.0,2.0;-1.0,0.0,3.0", ParseMode::Lenient).unwrap();
    assert_eq!(
        parsed.evolution.population(0).unwrap().individuals(),
        &[Individual::new(-1.0, 0.0, 3.0)]
    );
    assert_eq!(parsed.report.dropped.len(), 1);
}

#[test]
fn scenario_statistics_hidden_after_current_frame() {
    let evolution = run();
    let table = StatisticsTable::from_csv_str(STATS).unwrap();
    let sync = FrameSynchronizer::new(&evolution, Some(&table));

    let visible = sync.visible_statistics(1).unwrap().unwrap();
    let best = visible.series(Channel::BestFitness);
    assert_eq!(best.len(), 3);
    assert_eq!(&best[..2], &[2.1, 0.09]);
    assert!(best[2].is_nan());
}

#[test]
fn scenario_best_out_of_range() {
    assert_eq!(
        run().best(5),
        Err(ViewError::IndexOutOfRange { index: 5, len: 3 })
    );
}

#[test]
fn scenario_best_of_empty_population() {
    let evolution = Evolution::from_generations(vec![
        Generation::new(vec![Individual::new(0.0, 0.0, 1.0)]),
        Generation::default(),
    ]);
    assert_eq!(
        evolution.best(1),
        Err(ViewError::EmptyPopulation { generation: 1 })
    );
}

#[test]
fn coordinates_match_population_for_every_generation() {
    let evolution = run();
    for g in 0..evolution.len() {
        let population = evolution.population(g).unwrap();
        let coordinates = evolution.population_coordinates(g).unwrap();
        assert_eq!(coordinates.xs.len(), population.len());
        assert_eq!(coordinates.ys.len(), population.len());
        assert_eq!(coordinates.fitnesses.len(), population.len());
        for (i, individual) in population.iter().enumerate() {
            assert_eq!(coordinates.xs[i], individual.x());
            assert_eq!(coordinates.ys[i], individual.y());
            assert_eq!(coordinates.fitnesses[i], individual.fitness());
        }
    }
}

#[test]
fn best_is_minimal_and_first_among_ties() {
    let evolution = run();
    for g in 0..evolution.len() {
        let best = evolution.best(g).unwrap();
        assert!(evolution
            .population(g)
            .unwrap()
            .iter()
            .all(|i| best.fitness() <= i.fitness()));
    }
    // generation 2 has two individuals at 0.02; the first wins
    assert_eq!(
        evolution.best(2).unwrap(),
        &Individual::new(0.01, 0.0, 0.02)
    );
}

#[test]
fn every_frame_reveals_exactly_its_prefix() {
    let evolution = run();
    let table = StatisticsTable::from_csv_str(STATS).unwrap();
    let sync = FrameSynchronizer::new(&evolution, Some(&table));

    for k in 0..evolution.len() {
        let visible = sync.visible_statistics(k).unwrap().unwrap();
        for channel in Channel::ALL {
            let series = visible.series(channel);
            assert_eq!(series.len(), table.len());
            assert!(series[..=k].iter().all(|v| !v.is_nan()));
            assert!(series[k + 1..].iter().all(|v| v.is_nan()));
        }
    }
}

#[test]
fn synchronizer_is_idempotent() {
    let evolution = run();
    let table = StatisticsTable::from_csv_str(STATS).unwrap();
    let sync = FrameSynchronizer::new(&evolution, Some(&table));

    let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    for k in [2, 0, 1, 2] {
        let first = sync.frame(k).unwrap();
        let second = sync.frame(k).unwrap();
        assert_eq!(first.population, second.population);
        assert_eq!(first.best, second.best);
        let (a, b) = (first.statistics.unwrap(), second.statistics.unwrap());
        for channel in Channel::ALL {
            assert_eq!(bits(a.series(channel)), bits(b.series(channel)));
        }
    }
}

#[test]
fn serialized_run_parses_back_identically() {
    let evolution = run();
    let text = serialize_evolution(&evolution);
    let reparsed = parse_evolution(&text, ParseMode::Strict).unwrap();
    assert_eq!(reparsed.evolution.len(), evolution.len());
    for (left, right) in reparsed.evolution.generations().zip(evolution.generations()) {
        assert_eq!(left.len(), right.len());
        for (a, b) in left.iter().zip(right.iter()) {
            assert!((a.x() - b.x()).abs() < 1e-12);
            assert!((a.y() - b.y()).abs() < 1e-12);
            assert!((a.fitness() - b.fitness()).abs() < 1e-12);
        }
    }
}
