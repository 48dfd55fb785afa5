mod common;

use common::{scene, textured_scene};
use motdet::background::{
    create_model, foreground_count, BackgroundModel, MixtureConfig, MixtureModel, ModelKind,
    NeighborConfig, NeighborModel,
};
use motdet::PipelineError;

fn all_models() -> Vec<Box<dyn BackgroundModel>> {
    [ModelKind::Mixture, ModelKind::Neighbor]
        .into_iter()
        .map(|kind| create_model(kind, &MixtureConfig::default(), &NeighborConfig::default()))
        .collect()
}

#[test]
fn static_scene_converges_to_background_and_stays_there() {
    let frame = textured_scene(64, 48);

    for mut model in all_models() {
        let mut converged_at = None;
        for i in 0..60 {
            let mask = model.apply(&frame);
            assert_eq!(mask.dimensions(), (64, 48));
            let fg = foreground_count(&mask);

            match converged_at {
                None if fg == 0 => converged_at = Some(i),
                Some(_) => assert_eq!(fg, 0, "{} drifted at frame {}", model.kind(), i),
                None => {}
            }
        }

        let converged_at = converged_at.expect("model never converged");
        assert!(converged_at <= 2, "{} took {} frames", model.kind(), converged_at);
    }
}

#[test]
fn first_frame_is_treated_as_empty_scene() {
    let frame = scene(32, 32, &[(4, 4, 10, 10)]);
    for mut model in all_models() {
        assert!(model.dimensions().is_none());
        assert_eq!(foreground_count(&model.apply(&frame)), 0);
        assert_eq!(model.dimensions(), Some((32, 32)));
    }
}

#[test]
fn new_object_is_foreground() {
    let empty = scene(40, 30, &[]);
    let with_object = scene(40, 30, &[(10, 8, 6, 5)]);

    for mut model in all_models() {
        for _ in 0..5 {
            model.apply(&empty);
        }
        let mask = model.apply(&with_object);
        assert_eq!(foreground_count(&mask), 30, "{}", model.kind());
        assert_eq!(mask.get_pixel(12, 10)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }
}

#[test]
fn size_change_reinitializes_state() {
    let small = textured_scene(32, 24);
    let large = textured_scene(80, 60);
    let tiny = textured_scene(10, 7);

    for mut model in all_models() {
        for _ in 0..3 {
            model.apply(&small);
        }

        // Up-scale
        assert!(matches!(
            model.check_dimensions(&large),
            Err(PipelineError::DimensionMismatch {
                expected: (32, 24),
                actual: (80, 60)
            })
        ));
        let mask = model.apply(&large);
        assert_eq!(mask.dimensions(), (80, 60));
        assert_eq!(foreground_count(&mask), 0);
        assert_eq!(foreground_count(&model.apply(&large)), 0);

        // Down-scale
        let mask = model.apply(&tiny);
        assert_eq!(mask.dimensions(), (10, 7));
        assert_eq!(model.dimensions(), Some((10, 7)));
        assert_eq!(foreground_count(&model.apply(&tiny)), 0);
    }
}

#[test]
fn reset_forgets_learned_background() {
    let empty = scene(20, 20, &[]);
    let with_object = scene(20, 20, &[(5, 5, 5, 5)]);

    let mut model = MixtureModel::new(MixtureConfig::default());
    model.apply(&empty);
    model.apply(&empty);
    model.reset_state();
    assert!(model.dimensions().is_none());

    // The object is part of the freshly learned scene
    model.apply(&with_object);
    assert_eq!(foreground_count(&model.apply(&with_object)), 0);
}

#[test]
fn models_do_not_share_state() {
    let empty = scene(24, 24, &[]);
    let with_object = scene(24, 24, &[(2, 2, 4, 4)]);

    let mut mixture = MixtureModel::new(MixtureConfig::default());
    let mut neighbor = NeighborModel::new(NeighborConfig::default());
    mixture.apply(&empty);
    neighbor.apply(&empty);

    // Neighbor model sees the object first, the mixture model never does
    neighbor.apply(&with_object);
    assert_eq!(foreground_count(&mixture.apply(&empty)), 0);
    assert_eq!(foreground_count(&neighbor.apply(&with_object)), 16);
}
