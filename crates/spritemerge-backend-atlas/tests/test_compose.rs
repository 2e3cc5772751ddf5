//! Integration tests for strip compositing.
//!
//! Covers cell sizing, placement order, alignment, pixel fidelity and output
//! shape, plus the full compose-then-write path on a real directory.

use spritemerge_backend_atlas::{
    compose, write_atlas, write_metadata, AtlasComposer, CellSize, ComposeError, LocalDiskWriter,
    RasterImage, SourceImage, TRANSPARENT,
};
use spritemerge_spec::{Alignment, AtlasConfig, AtlasMetadata, Axis, FloorPolicy};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn solid(name: &str, width: u32, height: u32, color: [u8; 4]) -> SourceImage {
    SourceImage::new(name, RasterImage::filled(width, height, color).unwrap())
}

fn decode(bytes: &[u8]) -> RasterImage {
    let rgba = image::load_from_memory(bytes).unwrap().to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_rgba8(width, height, rgba.into_raw()).unwrap()
}

/// Image where every pixel encodes its own coordinates.
fn patterned(name: &str, width: u32, height: u32, seed: u8) -> SourceImage {
    let mut image = RasterImage::transparent(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            image.set(x, y, [x as u8, y as u8, seed, 255 - (x ^ y) as u8]);
        }
    }
    SourceImage::new(name, image)
}

/// Rows of the atlas column range `[x0, x1)` that contain any opaque pixel.
fn opaque_rows(atlas: &RasterImage, x0: u32, x1: u32) -> Vec<u32> {
    (0..atlas.height())
        .filter(|&y| (x0..x1).any(|x| atlas.get(x, y)[3] != 0))
        .collect()
}

// ============================================================================
// Empty input
// ============================================================================

#[test]
fn test_empty_input_fails_for_every_config() {
    for axis in [Axis::Horizontal, Axis::Vertical] {
        for alignment in [Alignment::Center, Alignment::Start, Alignment::End] {
            let config = AtlasConfig {
                axis,
                alignment,
                ..AtlasConfig::default()
            };
            let err = compose(&[], &config).unwrap_err();
            assert!(matches!(err, ComposeError::EmptyInput), "{axis} {alignment}");
        }
    }
}

#[test]
fn test_empty_input_with_floor_still_fails() {
    let config = AtlasConfig::horizontal().with_floor(16, 16);
    assert!(matches!(compose(&[], &config), Err(ComposeError::EmptyInput)));
}

// ============================================================================
// Sizing
// ============================================================================

#[test]
fn test_cell_size_is_order_independent() {
    let sizes = [(10, 20), (30, 5), (8, 8)];
    let orders = [[0, 1, 2], [2, 1, 0], [1, 0, 2], [2, 0, 1]];

    for order in orders {
        let sources: Vec<_> = order
            .iter()
            .map(|&i| solid(&i.to_string(), sizes[i].0, sizes[i].1, RED))
            .collect();
        let composition = compose(&sources, &AtlasConfig::horizontal()).unwrap();
        assert_eq!(
            composition.cell,
            CellSize {
                width: 30,
                height: 20
            }
        );
    }
}

#[test]
fn test_floor_raises_cell_size() {
    let sources = vec![solid("a", 4, 4, RED)];
    let composition = compose(&sources, &AtlasConfig::vertical().with_floor(10, 6)).unwrap();
    assert_eq!(composition.atlas.dimensions(), (10, 6));
    // Horizontal centering inside the widened cell
    assert_eq!(composition.placements[0].x, 3);
    assert_eq!(composition.placements[0].y, 1);
}

// ============================================================================
// Order preservation
// ============================================================================

#[test]
fn test_horizontal_order_is_preserved() {
    let sources = vec![
        solid("a", 3, 3, RED),
        solid("b", 3, 3, GREEN),
        solid("c", 3, 3, BLUE),
    ];
    let atlas = compose(&sources, &AtlasConfig::horizontal()).unwrap().atlas;

    for (i, color) in [RED, GREEN, BLUE].iter().enumerate() {
        let x0 = 3 * i as u32;
        for x in x0..x0 + 3 {
            for y in 0..3 {
                assert_eq!(atlas.get(x, y), *color, "pixel ({x}, {y})");
            }
        }
    }
}

#[test]
fn test_vertical_order_is_preserved() {
    let sources = vec![solid("a", 2, 2, BLUE), solid("b", 2, 2, RED)];
    let atlas = compose(&sources, &AtlasConfig::vertical()).unwrap().atlas;
    assert_eq!(atlas.get(0, 0), BLUE);
    assert_eq!(atlas.get(1, 1), BLUE);
    assert_eq!(atlas.get(0, 2), RED);
    assert_eq!(atlas.get(1, 3), RED);
}

#[test]
fn test_duplicate_images_each_appear_once_per_entry() {
    let sources = vec![solid("x", 2, 2, GREEN), solid("x", 2, 2, GREEN)];
    let composition = compose(&sources, &AtlasConfig::horizontal()).unwrap();
    assert_eq!(composition.placements.len(), 2);
    assert_eq!(composition.atlas.dimensions(), (4, 2));
}

// ============================================================================
// Alignment
// ============================================================================

#[test]
fn test_alignment_start_center_end() {
    // Tall spacer makes cell_h = 9; the probe is full cell width.
    let atlas_for = |alignment| {
        let config = AtlasConfig::horizontal().with_alignment(alignment);
        let sources = vec![solid("probe", 4, 4, RED), solid("spacer", 4, 9, TRANSPARENT)];
        compose(&sources, &config).unwrap().atlas
    };

    assert_eq!(opaque_rows(&atlas_for(Alignment::Start), 0, 4), vec![0, 1, 2, 3]);
    assert_eq!(opaque_rows(&atlas_for(Alignment::End), 0, 4), vec![5, 6, 7, 8]);
    // (9 - 4) / 2 = 2
    assert_eq!(opaque_rows(&atlas_for(Alignment::Center), 0, 4), vec![2, 3, 4, 5]);
}

#[test]
fn test_alignment_applies_to_vertical_axis_too() {
    let sources = vec![solid("short", 4, 2, RED), solid("tall", 2, 6, BLUE)];
    let config = AtlasConfig::vertical().with_alignment(Alignment::End);
    let composition = compose(&sources, &config).unwrap();

    assert_eq!(composition.cell, CellSize { width: 4, height: 6 });
    let short = &composition.placements[0];
    assert_eq!((short.x, short.y), (0, 4));
    let tall = &composition.placements[1];
    assert_eq!((tall.x, tall.y), (1, 6));
}

// ============================================================================
// Pixel fidelity
// ============================================================================

#[test]
fn test_pixels_are_copied_verbatim() {
    let sources = vec![
        patterned("a", 5, 3, 1),
        patterned("b", 2, 7, 2),
        patterned("c", 6, 6, 3),
    ];
    let config = AtlasConfig::vertical().with_alignment(Alignment::Center);
    let composition = compose(&sources, &config).unwrap();

    for (source, placement) in sources.iter().zip(&composition.placements) {
        for y in 0..source.image.height() {
            for x in 0..source.image.width() {
                assert_eq!(
                    composition.atlas.get(placement.x + x, placement.y + y),
                    source.image.get(x, y),
                    "{} pixel ({x}, {y})",
                    source.name
                );
            }
        }
    }
}

#[test]
fn test_inputs_are_not_modified() {
    let sources = vec![patterned("a", 3, 3, 9), patterned("b", 1, 5, 8)];
    let before = sources.clone();
    compose(&sources, &AtlasConfig::horizontal()).unwrap();
    assert_eq!(sources, before);
}

// ============================================================================
// Output shape
// ============================================================================

#[test]
fn test_output_shape_for_three_images() {
    let sources = vec![
        solid("a", 10, 20, RED),
        solid("b", 30, 5, GREEN),
        solid("c", 8, 8, BLUE),
    ];
    let horizontal = compose(&sources, &AtlasConfig::horizontal()).unwrap();
    assert_eq!(horizontal.atlas.dimensions(), (90, 20));

    let vertical = compose(&sources, &AtlasConfig::vertical()).unwrap();
    assert_eq!(vertical.atlas.dimensions(), (30, 60));
}

// ============================================================================
// Reference scenario
// ============================================================================

#[test]
fn test_red_blue_scenario() {
    let sources = vec![solid("red", 4, 4, RED), solid("blue", 2, 6, BLUE)];
    let composition = compose(&sources, &AtlasConfig::horizontal()).unwrap();
    let atlas = &composition.atlas;

    assert_eq!(composition.cell, CellSize { width: 4, height: 6 });
    assert_eq!(atlas.dimensions(), (8, 6));

    // Red: 1px transparent padding top and bottom.
    for x in 0..4 {
        assert_eq!(atlas.get(x, 0), TRANSPARENT);
        for y in 1..5 {
            assert_eq!(atlas.get(x, y), RED);
        }
        assert_eq!(atlas.get(x, 5), TRANSPARENT);
    }

    // Blue: full height, 1px transparent padding left and right.
    for y in 0..6 {
        assert_eq!(atlas.get(4, y), TRANSPARENT);
        assert_eq!(atlas.get(5, y), BLUE);
        assert_eq!(atlas.get(6, y), BLUE);
        assert_eq!(atlas.get(7, y), TRANSPARENT);
    }
}

// ============================================================================
// Stateful composer
// ============================================================================

#[test]
fn test_accumulating_composer_never_shrinks() {
    let mut composer = AtlasComposer::new(
        AtlasConfig::horizontal().with_floor_policy(FloorPolicy::Accumulate),
    );
    let first = composer.compose(&[solid("wide", 12, 2, RED)]).unwrap();
    let second = composer.compose(&[solid("narrow", 2, 2, RED)]).unwrap();
    assert_eq!(first.cell, second.cell);
    assert_eq!(second.atlas.dimensions(), (12, 2));
}

// ============================================================================
// Compose and write
// ============================================================================

#[test]
fn test_compose_and_write_to_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("png").join("merge");
    let sources = vec![solid("red", 4, 4, RED), solid("blue", 2, 6, BLUE)];
    let composition = compose(&sources, &AtlasConfig::horizontal()).unwrap();

    let writer = LocalDiskWriter::default();
    let written = write_atlas(&writer, &out_dir, &composition.atlas, 1_700_000_000_000).unwrap();
    let metadata_path =
        write_metadata(&writer, &out_dir, &composition.metadata(), 1_700_000_000_000).unwrap();

    assert_eq!(written.path, out_dir.join("1700000000000.png"));
    let decoded = decode(&std::fs::read(&written.path).unwrap());
    assert_eq!(decoded, composition.atlas);

    let metadata: AtlasMetadata =
        serde_json::from_slice(&std::fs::read(metadata_path).unwrap()).unwrap();
    assert_eq!(metadata.cells.len(), 2);
    assert_eq!(metadata.find("red").unwrap().y, 1);
}
