use ndarray::Array1;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use proptest::prelude::*;
use rand_isaac::isaac64::Isaac64Rng;

use reu::{relative_expanded_uncertainty, Approach, PointStatus, Table, Timestamp};

fn approach() -> impl Strategy<Value = Approach> {
    prop_oneof![
        Just(Approach::Gde),
        Just(Approach::Nilu1),
        Just(Approach::Nilu2)
    ]
}

/// A reference and a candidate series of equal length, at least three positions hold both
fn paired_series() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (5usize..40)
        .prop_flat_map(|len| {
            (
                prop::collection::vec(prop::option::weighted(0.8, 1.0..100.0f64), len),
                prop::collection::vec(prop::option::weighted(0.8, 1.0..100.0f64), len),
                prop::collection::vec(1.0..100.0f64, 3),
                prop::collection::vec(1.0..100.0f64, 3),
            )
        })
        .prop_map(|(x, y, x_head, y_head)| {
            let fill = |head: Vec<f64>, rest: Vec<Option<f64>>| {
                head.into_iter()
                    .map(Some)
                    .chain(rest.into_iter().skip(3))
                    .map(|value| value.unwrap_or(f64::NAN))
                    .collect::<Vec<_>>()
            };
            (fill(x_head, x), fill(y_head, y))
        })
}

fn timestamps(n: usize) -> Vec<Timestamp> {
    (0..n).map(|ii| Timestamp(format!("t{ii}"))).collect()
}

proptest! {
    #[test]
    fn values_exist_only_where_both_series_are_present(
        (x, y) in paired_series(),
        approach in approach(),
    ) {
        let table = Table::builder(timestamps(x.len()))
            .with_column("REF", x.clone())
            .with_column("SENSOR", y.clone())
            .build()
            .unwrap();

        let output = relative_expanded_uncertainty(&table, "REF", 1., 0., approach).unwrap();
        let series = output.column("u_SENSOR").unwrap().as_ref().unwrap();

        for (ii, (x, y)) in x.iter().zip(&y).enumerate() {
            let paired = !x.is_nan() && !y.is_nan();
            prop_assert_eq!(series.status()[ii] != PointStatus::Unpaired, paired);
            if !paired {
                prop_assert!(series.values()[ii].is_nan());
            }
        }
    }

    #[test]
    fn outputs_are_named_after_their_inputs(
        names in prop::collection::hash_set("[A-Z][A-Z0-9]{0,5}", 1..6),
        approach in approach(),
    ) {
        let names = names.into_iter().collect::<Vec<_>>();
        let values = vec![1., 2.5, 2., 4., 6.5];
        let (first, rest) = names.split_first().unwrap();
        let table = rest
            .iter()
            .fold(
                Table::builder(timestamps(values.len())).with_column(first.clone(), values.clone()),
                |builder, name| builder.with_column(name.clone(), values.clone()),
            )
            .build()
            .unwrap();

        let reference = names.last().unwrap();
        let output = relative_expanded_uncertainty(&table, reference, 1., 0., approach).unwrap();

        let mut expected = vec![reference.clone()];
        expected.extend(names.iter().map(|name| format!("u_{name}")));
        prop_assert_eq!(output.column_names(), expected);
        prop_assert_eq!(output.reference().values(), table.column(reference).unwrap().values());
    }
}

#[test]
fn a_noisy_sensor_has_finite_non_negative_uncertainty() {
    let seed = 40;
    let mut rng = Isaac64Rng::seed_from_u64(seed);
    let num_samples = 200;

    let truth = Array1::linspace(10., 60., num_samples);
    let reference = &truth + &Array1::random_using(num_samples, Normal::new(0., 0.5).unwrap(), &mut rng);
    let sensor = &truth * 1.1 + 2.
        + &Array1::random_using(num_samples, Normal::new(0., 2.).unwrap(), &mut rng);

    let table: Table<f64> = Table::builder(timestamps(num_samples))
        .with_column("REF", reference.to_vec())
        .with_column("SENSOR", sensor.to_vec())
        .build()
        .unwrap();

    for approach in [Approach::Gde, Approach::Nilu1, Approach::Nilu2] {
        let output = relative_expanded_uncertainty(&table, "REF", 1., 0., approach).unwrap();
        let series = output.column("u_SENSOR").unwrap().as_ref().unwrap();

        let line = series.fit().line();
        assert!((line.slope - 1.1).abs() < 0.1, "slope {} for {approach}", line.slope);
        assert!(series.values().iter().all(|value| value.is_finite() && *value >= 0.));
        assert!(series.status().iter().all(|status| *status == PointStatus::Defined));
    }
}
