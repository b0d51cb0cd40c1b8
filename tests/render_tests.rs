//! GPU integration tests for the batch renderer.
//!
//! These tests render offscreen and read pixels back to verify the
//! per-object indirection end to end. They skip gracefully when no adapter
//! with texture binding arrays is available, so the suite stays green on
//! CI machines without a GPU.
//!
//! ```bash
//! cargo test --test render_tests
//! ```

use std::sync::Arc;

use glam::{Mat4, Vec3};
use rstest::rstest;

use batchless::{
    BatchMesh, BatchRenderer, GpuContext, MeshData, ObjectTransform, RenderError, RenderTarget,
    TableKind, TextureData, TextureTable, TransformTable,
};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const TARGET_SIZE: u32 = 64;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

struct TestContext {
    context: Arc<GpuContext>,
}

impl TestContext {
    fn new() -> Option<Self> {
        let _ = env_logger::builder().is_test(true).try_init();
        match GpuContext::new() {
            Ok(context) => Some(Self { context }),
            Err(e) => {
                eprintln!("GPU not available, skipping: {e}");
                None
            }
        }
    }

    fn texture_table(&self, colors: &[[u8; 4]]) -> TextureTable {
        let images: Vec<TextureData> = colors
            .iter()
            .map(|&c| TextureData::solid(2, 2, c))
            .collect();
        TextureTable::new(&self.context, &images).expect("texture table creation")
    }

    fn identity_transforms(&self, count: usize) -> TransformTable {
        TransformTable::new(&self.context, vec![ObjectTransform::IDENTITY; count])
            .expect("transform table creation")
    }

    fn renderer(&self, texture_slots: u32) -> BatchRenderer {
        BatchRenderer::new(self.context.clone(), texture_slots, TARGET_FORMAT)
            .expect("renderer creation")
    }

    fn target(&self) -> RenderTarget {
        RenderTarget::new(&self.context, TARGET_SIZE, TARGET_SIZE, TARGET_FORMAT)
    }

    fn read_pixels(&self, target: &RenderTarget) -> Vec<u8> {
        self.context
            .read_texture(target.color_texture(), target.width(), target.height())
            .expect("readback")
    }
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let offset = ((y * TARGET_SIZE + x) * 4) as usize;
    [
        pixels[offset],
        pixels[offset + 1],
        pixels[offset + 2],
        pixels[offset + 3],
    ]
}

/// Two objects, one draw: the left quad resolves texture slot 0, the right
/// quad slot 1, through the same pipeline and bind group.
#[test]
fn test_two_objects_resolve_distinct_textures() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(2);
    let textures = ctx.texture_table(&[RED, BLUE]);
    let mut renderer = ctx.renderer(2);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [0.0, 1.0], 0);
    data.push_quad([0.0, -1.0], [1.0, 1.0], 1);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_eq!(pixel(&pixels, TARGET_SIZE / 4, TARGET_SIZE / 2), RED);
    assert_eq!(pixel(&pixels, 3 * TARGET_SIZE / 4, TARGET_SIZE / 2), BLUE);
}

/// Each table slot resolves independently, including the last one.
#[rstest]
#[case::first_slot(0, RED)]
#[case::middle_slot(1, GREEN)]
#[case::last_slot(2, BLUE)]
fn test_slot_resolution(#[case] object_index: u32, #[case] expected: [u8; 4]) {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(3);
    let textures = ctx.texture_table(&[RED, GREEN, BLUE]);
    let mut renderer = ctx.renderer(3);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [1.0, 1.0], object_index);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_eq!(pixel(&pixels, TARGET_SIZE / 2, TARGET_SIZE / 2), expected);
}

/// The object index must reach the fragment stage un-interpolated: every
/// interior pixel of a one-index primitive samples that index's texture.
#[test]
fn test_object_index_is_flat_across_primitive() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(2);
    let textures = ctx.texture_table(&[RED, BLUE]);
    let mut renderer = ctx.renderer(2);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [1.0, 1.0], 1);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    for (x, y) in [(8, 8), (32, 16), (50, 50), (16, 48), (32, 32)] {
        assert_eq!(pixel(&pixels, x, y), BLUE, "pixel ({x}, {y})");
    }
}

/// A single-object batch is the trivial case: index 0 maps to the only
/// transform and the only texture.
#[test]
fn test_single_object_batch() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(1);
    let textures = ctx.texture_table(&[GREEN]);
    let mut renderer = ctx.renderer(1);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [1.0, 1.0], 0);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_eq!(pixel(&pixels, TARGET_SIZE / 2, TARGET_SIZE / 2), GREEN);
}

/// The vertex stage applies each object's model matrix: a quad translated
/// off to the right leaves the left half showing the clear color.
#[test]
fn test_transform_table_moves_objects() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(1);
    let textures = ctx.texture_table(&[RED]);
    let mut renderer = ctx.renderer(1);
    let target = ctx.target();

    // Quad covering the left half of clip space, then shifted fully right.
    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [0.0, 1.0], 0);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .update_transform(
            &mut transforms,
            0,
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        )
        .unwrap();
    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    let left = pixel(&pixels, TARGET_SIZE / 4, TARGET_SIZE / 2);
    let right = pixel(&pixels, 3 * TARGET_SIZE / 4, TARGET_SIZE / 2);
    assert_ne!(left, RED, "left half should show the clear color");
    assert_eq!(right, RED, "quad should have moved to the right half");
}

/// Updating a transform between draws changes the next frame only; no
/// rebinding is needed for in-place updates.
#[test]
fn test_update_between_draws() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(1);
    let textures = ctx.texture_table(&[BLUE]);
    let mut renderer = ctx.renderer(1);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [0.0, 1.0], 0);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();
    let before = ctx.read_pixels(&target);
    assert_eq!(pixel(&before, TARGET_SIZE / 4, TARGET_SIZE / 2), BLUE);

    renderer
        .update_transform(
            &mut transforms,
            0,
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        )
        .unwrap();
    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();
    let after = ctx.read_pixels(&target);
    assert_ne!(pixel(&after, TARGET_SIZE / 4, TARGET_SIZE / 2), BLUE);
    assert_eq!(pixel(&after, 3 * TARGET_SIZE / 4, TARGET_SIZE / 2), BLUE);
}

/// Growing the transform table reallocates its buffer; the renderer must
/// notice the stale bind group and rebind before the next draw.
#[test]
fn test_reallocated_table_is_rebound() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(1);
    let textures = ctx.texture_table(&[RED, BLUE]);
    let mut renderer = ctx.renderer(2);
    let target = ctx.target();

    let mut first = MeshData::default();
    first.push_quad([-1.0, -1.0], [1.0, 1.0], 0);
    let first_mesh = BatchMesh::upload(&ctx.context, &first).unwrap();
    renderer
        .submit_draw(&target, &first_mesh, &mut transforms, &textures)
        .unwrap();
    let generation_before = transforms.generation();

    // Grow to two objects; the second one was invalid before the growth.
    transforms
        .set_transforms(
            &ctx.context,
            vec![ObjectTransform::IDENTITY, ObjectTransform::IDENTITY],
        )
        .unwrap();
    assert_eq!(transforms.generation(), generation_before + 1);

    let mut second = MeshData::default();
    second.push_quad([-1.0, -1.0], [1.0, 1.0], 1);
    let second_mesh = BatchMesh::upload(&ctx.context, &second).unwrap();
    renderer
        .submit_draw(&target, &second_mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_eq!(pixel(&pixels, TARGET_SIZE / 2, TARGET_SIZE / 2), BLUE);
}

/// An object index past the end of the tables is rejected host-side before
/// any command is encoded.
#[test]
fn test_out_of_bounds_index_rejected() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(2);
    let textures = ctx.texture_table(&[RED, BLUE]);
    let mut renderer = ctx.renderer(2);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [1.0, 1.0], 2);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    let err = renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::IndexOutOfBounds {
            index: 2,
            len: 2,
            table: TableKind::Transforms,
        }
    );
}

/// Zero-length tables cannot be constructed at all; the N = 0 case is
/// rejected at the earliest possible point.
#[test]
fn test_empty_tables_rejected_at_construction() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    assert_eq!(
        TransformTable::new(&ctx.context, Vec::new()).unwrap_err(),
        RenderError::EmptyTable(TableKind::Transforms)
    );
    assert_eq!(
        TextureTable::new(&ctx.context, &[]).unwrap_err(),
        RenderError::EmptyTable(TableKind::Textures)
    );
}

/// Out-of-range transform updates are rejected without touching the GPU
/// buffer.
#[test]
fn test_update_transform_bounds_checked() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(2);
    let renderer = ctx.renderer(2);

    let err = renderer
        .update_transform(&mut transforms, 2, Mat4::IDENTITY)
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::IndexOutOfBounds {
            index: 2,
            len: 2,
            table: TableKind::Transforms,
        }
    );
}

/// Binding a texture table whose length differs from the pipeline's slot
/// count is a contract violation, not a silent truncation.
#[test]
fn test_texture_table_size_mismatch_rejected() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let transforms = ctx.identity_transforms(3);
    let textures = ctx.texture_table(&[RED, GREEN, BLUE]);
    let mut renderer = ctx.renderer(2);

    let err = renderer.bind_textures(&transforms, &textures).unwrap_err();
    assert_eq!(
        err,
        RenderError::TableSizeMismatch {
            expected: 2,
            actual: 3,
        }
    );
}

/// Submitting with a different texture table than the one last bound must
/// rebind; the draw samples the table passed to the call, not the one the
/// cached bind group was built from.
#[test]
fn test_swapped_texture_table_is_rebound() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(1);
    let red_table = ctx.texture_table(&[RED]);
    let blue_table = ctx.texture_table(&[BLUE]);
    let mut renderer = ctx.renderer(1);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [1.0, 1.0], 0);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer.bind_textures(&transforms, &red_table).unwrap();
    renderer
        .submit_draw(&target, &mesh, &mut transforms, &blue_table)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_eq!(pixel(&pixels, TARGET_SIZE / 2, TARGET_SIZE / 2), BLUE);
}

/// Submitting with a different transform table than the one last bound must
/// rebind, even when both tables are at generation zero.
#[test]
fn test_swapped_transform_table_is_rebound() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut centered = ctx.identity_transforms(1);
    let mut shifted = TransformTable::new(
        &ctx.context,
        vec![ObjectTransform::from_translation(Vec3::new(1.0, 0.0, 0.0))],
    )
    .expect("transform table creation");
    assert_eq!(centered.generation(), shifted.generation());

    let textures = ctx.texture_table(&[RED]);
    let mut renderer = ctx.renderer(1);
    let target = ctx.target();

    // Quad covering the left half of clip space.
    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [0.0, 1.0], 0);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    renderer
        .submit_draw(&target, &mesh, &mut centered, &textures)
        .unwrap();
    renderer
        .submit_draw(&target, &mesh, &mut shifted, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_ne!(pixel(&pixels, TARGET_SIZE / 4, TARGET_SIZE / 2), RED);
    assert_eq!(pixel(&pixels, 3 * TARGET_SIZE / 4, TARGET_SIZE / 2), RED);
}

/// The slot-count check must hold on every submission, including ones that
/// could reuse a cached bind group: a wrong-sized table passed after a
/// successful bind is rejected, not silently drawn with the old binding.
#[test]
fn test_cached_bind_group_rechecks_table_size() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(3);
    let matching = ctx.texture_table(&[RED, GREEN]);
    let oversized = ctx.texture_table(&[RED, GREEN, BLUE]);
    let mut renderer = ctx.renderer(2);
    let target = ctx.target();

    let mut first = MeshData::default();
    first.push_quad([-1.0, -1.0], [1.0, 1.0], 0);
    let first_mesh = BatchMesh::upload(&ctx.context, &first).unwrap();
    renderer
        .submit_draw(&target, &first_mesh, &mut transforms, &matching)
        .unwrap();

    // Index 2 is valid against the oversized table but past the pipeline's
    // two slots; letting it through would index past the bound array.
    let mut second = MeshData::default();
    second.push_quad([-1.0, -1.0], [1.0, 1.0], 2);
    let second_mesh = BatchMesh::upload(&ctx.context, &second).unwrap();
    let err = renderer
        .submit_draw(&target, &second_mesh, &mut transforms, &oversized)
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::TableSizeMismatch {
            expected: 2,
            actual: 3,
        }
    );
}

/// A target whose color format differs from the pipeline's is rejected
/// before any command is encoded.
#[test]
fn test_target_format_mismatch_rejected() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(1);
    let textures = ctx.texture_table(&[RED]);
    let mut renderer = ctx.renderer(1);
    let target = RenderTarget::new(
        &ctx.context,
        TARGET_SIZE,
        TARGET_SIZE,
        wgpu::TextureFormat::Rgba8Unorm,
    );

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [1.0, 1.0], 0);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    let err = renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::TargetFormatMismatch {
            expected: TARGET_FORMAT,
            actual: wgpu::TextureFormat::Rgba8Unorm,
        }
    );
}

/// A pipeline with zero texture slots cannot be constructed.
#[test]
fn test_zero_slot_pipeline_rejected() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let err = BatchRenderer::new(ctx.context.clone(), 0, TARGET_FORMAT).unwrap_err();
    assert!(matches!(err, RenderError::ResourceCreationFailed(_)));
}

/// The projection matrix applies uniformly to every object in the draw.
#[test]
fn test_projection_applies_to_all_objects() {
    let Some(ctx) = TestContext::new() else {
        return;
    };

    let mut transforms = ctx.identity_transforms(2);
    let textures = ctx.texture_table(&[RED, BLUE]);
    let mut renderer = ctx.renderer(2);
    let target = ctx.target();

    let mut data = MeshData::default();
    data.push_quad([-1.0, -1.0], [0.0, 1.0], 0);
    data.push_quad([0.0, -1.0], [1.0, 1.0], 1);
    let mesh = BatchMesh::upload(&ctx.context, &data).unwrap();

    // Mirror X: the red quad moves to the right half, the blue to the left.
    renderer.set_projection(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)));
    renderer
        .submit_draw(&target, &mesh, &mut transforms, &textures)
        .unwrap();

    let pixels = ctx.read_pixels(&target);
    assert_eq!(pixel(&pixels, TARGET_SIZE / 4, TARGET_SIZE / 2), BLUE);
    assert_eq!(pixel(&pixels, 3 * TARGET_SIZE / 4, TARGET_SIZE / 2), RED);
}
