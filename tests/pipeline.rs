mod common;

use common::{moving_shapes, scene};
use motdet::background::{foreground_count, ModelKind};
use motdet::{PipelineConfig, PipelineContext};

const WIDTH: u32 = 120;
const HEIGHT: u32 = 90;

fn warmed_context(config: &PipelineConfig) -> PipelineContext {
    let mut context = PipelineContext::new(config).unwrap();
    let empty = scene(WIDTH, HEIGHT, &[]);
    for _ in 0..10 {
        let outputs = context.process(&empty);
        assert!(outputs.contours.is_empty());
    }
    context
}

#[test]
fn moving_shapes_produce_one_contour_each() {
    for contour_model in [ModelKind::Neighbor, ModelKind::Mixture] {
        let config = PipelineConfig {
            contour_model,
            ..PipelineConfig::default()
        };
        let mut context = warmed_context(&config);

        for step in 0..6 {
            let frame = scene(WIDTH, HEIGHT, &moving_shapes(step));
            let outputs = context.process(&frame);

            assert_eq!(outputs.masks.len(), 2);
            assert!(foreground_count(&outputs.cleaned) > 0);
            assert_eq!(
                outputs.contours.len(),
                2,
                "{} at step {}",
                contour_model,
                step
            );
            assert_eq!(outputs.colors.len(), 2);
            assert_eq!(outputs.overlay.dimensions(), (WIDTH, HEIGHT));
        }
    }
}

#[test]
fn contours_surround_the_moving_shapes() {
    let mut context = warmed_context(&PipelineConfig::default());
    let outputs = context.process(&scene(WIDTH, HEIGHT, &moving_shapes(0)));

    let mut boxes: Vec<_> = outputs
        .contours
        .iter()
        .filter_map(|c| c.bounding_box())
        .collect();
    boxes.sort_by_key(|b| b.left());

    // Shapes sit at x 8..24 and 90..106
    assert!(boxes[0].left() >= 5 && boxes[0].right() <= 26);
    assert!(boxes[1].left() >= 87 && boxes[1].right() <= 108);
}

#[test]
fn overlay_is_drawn_in_assigned_colors() {
    let mut context = warmed_context(&PipelineConfig::default());
    let outputs = context.process(&scene(WIDTH, HEIGHT, &moving_shapes(1)));

    for color in &outputs.colors {
        assert!(
            outputs.overlay.pixels().any(|p| p == color),
            "color {:?} missing from overlay",
            color
        );
    }
}

#[test]
fn colors_are_reproducible_across_runs() {
    let run = || {
        let mut context = warmed_context(&PipelineConfig::default());
        (0..4)
            .map(|step| context.process(&scene(WIDTH, HEIGHT, &moving_shapes(step))).colors)
            .collect::<Vec<_>>()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_ne!(first[0], first[1], "generator should advance between frames");
}

#[test]
fn parameter_changes_apply_on_next_frame() {
    let mut context = warmed_context(&PipelineConfig::default());
    context.parameters_mut().request_kernel_size(0);
    context.parameters_mut().request_edge_threshold(300);
    assert_eq!(context.parameters().current().kernel_size, 5);

    let outputs = context.process(&scene(WIDTH, HEIGHT, &moving_shapes(0)));
    assert_eq!(outputs.parameters.kernel_size, 1);
    assert_eq!(outputs.parameters.edge_threshold, 255);
}

#[test]
fn cleaned_mask_comes_from_the_configured_model() {
    for contour_model in [ModelKind::Neighbor, ModelKind::Mixture] {
        let config = PipelineConfig {
            contour_model,
            parameters: motdet::Parameters {
                kernel_size: 1,
                ..Default::default()
            },
            ..PipelineConfig::default()
        };
        let mut context = warmed_context(&config);
        let outputs = context.process(&scene(WIDTH, HEIGHT, &moving_shapes(2)));

        assert_eq!(Some(&outputs.cleaned), outputs.mask(contour_model));
    }
}

#[test]
fn frame_size_change_keeps_pipeline_running() {
    let mut context = warmed_context(&PipelineConfig::default());

    let larger = scene(160, 120, &[(20, 20, 10, 10)]);
    let outputs = context.process(&larger);
    assert_eq!(outputs.cleaned.dimensions(), (160, 120));
    assert!(outputs.contours.is_empty());

    let smaller = scene(60, 40, &[]);
    let outputs = context.process(&smaller);
    assert_eq!(outputs.cleaned.dimensions(), (60, 40));
    for (_, mask) in &outputs.masks {
        assert_eq!(mask.dimensions(), (60, 40));
    }
    assert_eq!(context.frames_processed(), 12);
}
