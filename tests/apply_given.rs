use proptest::prelude::*;

use rusty_align::alignment::{
    apply_to_experiments, apply_to_feature_maps, apply_to_identifications, AlgorithmRegistry,
    AlignmentError, AlignmentOptions, ApplyGivenTransformation, MapAlignment,
};
use rusty_align::data::model::{
    ConvexHull, Experiment, Feature, FeatureMap, HullPoint, PeptideIdentification, Spectrum,
};
use rusty_align::transform::Transformation;

fn experiment(rts: &[f64]) -> Experiment {
    Experiment::from_spectra(rts.iter().copied().map(Spectrum::at).collect())
}

fn rts(exp: &Experiment) -> Vec<f64> {
    exp.spectra.iter().map(|s| s.rt).collect()
}

/// A feature map with nesting, hulls and identifications at every level.
fn nested_map() -> FeatureMap {
    let mut sub = Feature::at(10.0, 501.0);
    sub.convex_hulls
        .push(ConvexHull::from_points([(9.0, 501.0), (11.0, 501.0), (11.0, 501.2)]));

    let mut parent = Feature::at(12.0, 500.0);
    parent.convex_hulls.push(ConvexHull::from_points([
        (0.0, 0.0),
        (2.0, 0.0),
        (2.0, 1.0),
        (0.0, 1.0),
    ]));
    parent.subordinates.push(sub);
    parent
        .peptide_identifications
        .push(PeptideIdentification::at(12.5, 500.0));

    let mut map = FeatureMap::from_features(vec![Feature::at(3.0, 400.0), parent]);
    map.unassigned_peptide_identifications
        .push(PeptideIdentification::at(7.0, 650.0));
    map
}

#[test]
fn size_mismatch_leaves_every_shape_untouched() {
    let trafos = vec![Transformation::shift(1.0); 3];

    let mut exps = vec![experiment(&[1.0, 2.0]), experiment(&[3.0])];
    let exps_before = exps.clone();
    assert!(matches!(
        apply_to_experiments(&mut exps, &trafos),
        Err(AlignmentError::SizeMismatch {
            collections: 2,
            transformations: 3
        })
    ));
    assert_eq!(exps, exps_before);

    let mut maps = vec![nested_map(), nested_map()];
    let maps_before = maps.clone();
    assert!(apply_to_feature_maps(&mut maps, &trafos).is_err());
    assert_eq!(maps, maps_before);

    let mut ids = vec![
        vec![PeptideIdentification::at(5.0, 400.0)],
        vec![PeptideIdentification::at(6.0, 410.0)],
    ];
    let ids_before = ids.clone();
    assert!(apply_to_identifications(&mut ids, &trafos).is_err());
    assert_eq!(ids, ids_before);
}

#[test]
fn identity_leaves_everything_unchanged() {
    let mut exps = vec![experiment(&[1.0, 2.0, 2.0, 9.5])];
    let mut maps = vec![nested_map()];
    let mut ids = vec![vec![
        PeptideIdentification::at(8.0, 400.0),
        PeptideIdentification::at(2.0, 410.0),
    ]];
    let (e0, m0, i0) = (exps.clone(), maps.clone(), ids.clone());

    let identity = [Transformation::Identity];
    apply_to_experiments(&mut exps, &identity).unwrap();
    apply_to_feature_maps(&mut maps, &identity).unwrap();
    apply_to_identifications(&mut ids, &identity).unwrap();

    assert_eq!(exps, e0);
    assert_eq!(maps, m0);
    assert_eq!(ids, i0);
}

#[test]
fn negation_restores_sort_order() {
    let mut exps = vec![experiment(&[1.0, 5.0, 3.0])];
    apply_to_experiments(&mut exps, &[Transformation::linear(-1.0, 0.0)]).unwrap();
    assert_eq!(rts(&exps[0]), vec![-5.0, -3.0, -1.0]);
}

#[test]
fn hull_points_keep_their_order() {
    let mut maps = vec![nested_map()];
    apply_to_feature_maps(&mut maps, &[Transformation::shift(100.0)]).unwrap();

    let parent = maps[0]
        .features
        .iter()
        .find(|f| f.mz == 500.0)
        .unwrap();
    let hull = &parent.convex_hulls[0].points;
    assert_eq!(
        hull,
        &vec![
            HullPoint { rt: 100.0, mz: 0.0 },
            HullPoint { rt: 102.0, mz: 0.0 },
            HullPoint { rt: 102.0, mz: 1.0 },
            HullPoint { rt: 100.0, mz: 1.0 },
        ]
    );
}

#[test]
fn shift_and_inverse_round_trip() {
    let mut exps = vec![experiment(&[0.5, 60.0, 61.25, 1800.0])];
    let mut maps = vec![nested_map()];
    let mut ids = vec![vec![PeptideIdentification::at(33.0, 500.0)]];
    let (e0, m0, i0) = (exps.clone(), maps.clone(), ids.clone());

    let forward = [Transformation::shift(5.0)];
    let back = [Transformation::shift(-5.0)];
    apply_to_experiments(&mut exps, &forward).unwrap();
    apply_to_feature_maps(&mut maps, &forward).unwrap();
    apply_to_identifications(&mut ids, &forward).unwrap();
    assert_ne!(exps, e0);

    apply_to_experiments(&mut exps, &back).unwrap();
    apply_to_feature_maps(&mut maps, &back).unwrap();
    apply_to_identifications(&mut ids, &back).unwrap();
    assert_eq!(exps, e0);
    assert_eq!(maps, m0);
    assert_eq!(ids, i0);
}

#[test]
fn subordinate_is_scaled_with_parent_fixed() {
    let mut parent = Feature::at(0.0, 300.0);
    parent.subordinates.push(Feature::at(10.0, 301.0));
    let mut maps = vec![FeatureMap::from_features(vec![parent])];

    apply_to_feature_maps(&mut maps, &[Transformation::linear(2.0, 0.0)]).unwrap();

    assert_eq!(maps[0].features[0].rt, 0.0);
    assert_eq!(maps[0].features[0].subordinates[0].rt, 20.0);
}

#[test]
fn each_run_gets_its_own_transformation() {
    let mut exps = vec![experiment(&[10.0]), experiment(&[10.0]), experiment(&[10.0])];
    let trafos = vec![
        Transformation::shift(1.0),
        Transformation::Identity,
        Transformation::interpolated([(0.0, 0.0), (5.0, 10.0)]).unwrap(),
    ];
    apply_to_experiments(&mut exps, &trafos).unwrap();
    assert_eq!(exps.iter().map(|e| e.spectra[0].rt).collect::<Vec<_>>(), vec![11.0, 10.0, 20.0]);
}

#[test]
fn registry_algorithm_applies_provided_set() {
    let provided = vec![Transformation::linear(-1.0, 0.0), Transformation::shift(2.0)];
    let algorithm = AlgorithmRegistry::global()
        .create(
            ApplyGivenTransformation::PRODUCT_NAME,
            &provided,
            AlignmentOptions { parallel: true },
        )
        .unwrap();

    let mut runs = vec![
        vec![
            PeptideIdentification::at(1.0, 400.0),
            PeptideIdentification::at(2.0, 410.0),
        ],
        vec![PeptideIdentification::at(3.0, 420.0)],
    ];
    let applied = algorithm.align_identifications(&mut runs).unwrap();

    assert_eq!(applied, provided);
    assert_eq!(runs[0][0].rt, -1.0);
    assert_eq!(runs[0][1].rt, -2.0);
    assert_eq!(runs[1][0].rt, 5.0);
}

#[test]
fn algorithm_can_be_used_directly() {
    let engine = ApplyGivenTransformation::new(&[Transformation::shift(-3.0)]);
    let mut maps = vec![nested_map()];
    engine.align_feature_maps(&mut maps).unwrap();
    assert_eq!(maps[0].unassigned_peptide_identifications[0].rt, 4.0);
    assert_eq!(maps[0].rt_range().map(|r| r.min), Some(0.0));
}

proptest! {
    #[test]
    fn experiments_end_sorted_under_any_linear_map(
        rts in prop::collection::vec(-1.0e4f64..1.0e4, 0..64),
        slope in -3.0f64..3.0,
        intercept in -100.0f64..100.0,
    ) {
        let mut exps = vec![experiment(&rts)];
        apply_to_experiments(&mut exps, &[Transformation::linear(slope, intercept)]).unwrap();

        let out = &exps[0];
        prop_assert_eq!(out.len(), rts.len());
        prop_assert!(out.spectra.windows(2).all(|w| w[0].rt <= w[1].rt));
        if let Some(range) = out.rt_range() {
            prop_assert_eq!(range.min, out.spectra[0].rt);
            prop_assert_eq!(range.max, out.spectra[out.len() - 1].rt);
        }
    }

    #[test]
    fn identification_order_never_changes(
        rts in prop::collection::vec(-1.0e4f64..1.0e4, 0..64),
        slope in -3.0f64..3.0,
    ) {
        let mut runs = vec![rts
            .iter()
            .enumerate()
            .map(|(i, &rt)| PeptideIdentification::at(rt, i as f64))
            .collect::<Vec<_>>()];
        apply_to_identifications(&mut runs, &[Transformation::linear(slope, 0.0)]).unwrap();

        let order: Vec<f64> = runs[0].iter().map(|id| id.mz).collect();
        let expected: Vec<f64> = (0..rts.len()).map(|i| i as f64).collect();
        prop_assert_eq!(order, expected);
    }
}
