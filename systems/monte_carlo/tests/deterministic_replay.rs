use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use runoff_sim_core::{ElectionParameters, WinRates};
use runoff_sim_dataset::{ascoli_piceno_2019, base_preferences_2019};
use runoff_sim_system_monte_carlo::{MonteCarloElection, TrialOutcome};

fn model(params: ElectionParameters) -> MonteCarloElection {
    MonteCarloElection::new(&ascoli_piceno_2019(), &base_preferences_2019(), params)
        .expect("valid model")
}

fn small_run() -> ElectionParameters {
    ElectionParameters {
        draws: 3_000,
        concentration: 150.0,
        ..ElectionParameters::default()
    }
}

fn assert_covers_candidates(rates: &WinRates) {
    let names: Vec<_> = rates.iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        [
            "Marco Fioravanti",
            "Piero Celani",
            "Francesco Ameli",
            "Gianluca Vecchi",
            "Domenico Stallone",
        ]
    );
    assert!((rates.total() - 1.0).abs() < 1e-9, "total {}", rates.total());
}

#[test]
fn seeded_runs_replay_identically() {
    let model = model(small_run());
    let first = model.simulate(0x5eed);
    let second = model.simulate(0x5eed);
    assert_eq!(first, second, "seeded replay diverged");
    assert_covers_candidates(&first);
}

#[test]
fn rebuilt_models_replay_identically() {
    let first = model(small_run()).simulate(42);
    let second = model(small_run()).simulate(42);
    assert_eq!(first, second);
}

#[test]
fn thread_count_does_not_change_the_result() {
    let model = model(small_run());
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .expect("single-thread pool")
        .install(|| model.simulate(7));
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("multi-thread pool")
        .install(|| model.simulate(7));
    assert_eq!(single, many);
}

#[test]
fn sequential_runs_replay_with_the_same_generator_seed() {
    let model = model(small_run());
    let first = model.simulate_with_rng(&mut ChaCha8Rng::seed_from_u64(11));
    let second = model.simulate_with_rng(&mut ChaCha8Rng::seed_from_u64(11));
    assert_eq!(first, second);
    assert_covers_candidates(&first);
}

#[test]
fn frequencies_sum_to_one_for_any_draw_count() {
    for draws in [1, 2, 17, 1_023, 1_024, 1_025] {
        let rates = model(ElectionParameters {
            draws,
            ..small_run()
        })
        .simulate(draws);
        assert_covers_candidates(&rates);
    }
}

#[test]
fn deterministic_runoff_matches_the_projected_baseline() {
    let model = model(ElectionParameters {
        runoff_strength: 0.0,
        ..ElectionParameters::default()
    });
    let shares = [0.36, 0.33, 0.24, 0.05, 0.02];
    let expected = model.runoff_baseline(&shares, 0.4, [0, 1]);

    for seed in 0..5 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        match model.decide(&shares, 0.4, &mut rng) {
            TrialOutcome::Runoff(runoff) => {
                assert_eq!(runoff.finalists, [0, 1]);
                assert_eq!(runoff.baseline, expected);
                assert_eq!(runoff.shares, expected);
            }
            other => panic!("expected a runoff, got {other:?}"),
        }
    }
}

#[test]
fn noisy_runoff_stays_a_valid_split() {
    let model = model(ElectionParameters::default());
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for _ in 0..200 {
        if let TrialOutcome::Runoff(runoff) = model.run_trial(&mut rng) {
            let [first, second] = runoff.shares;
            assert!((0.0..=1.0).contains(&first));
            assert!((first + second - 1.0).abs() < 1e-12);
            assert!(runoff.finalists.contains(&runoff.winner));
        }
    }
}
