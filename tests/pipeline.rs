//! Headless pass chain tests
//!
//! Each test requests a headless GPU context and returns early when no
//! adapter is available.

use starlight_earth::assets::SceneAssets;
use starlight_earth::render::target::{RenderTarget, LDR_FORMAT};
use starlight_earth::render::{FrameTime, OutlineSelection, OutputTarget, PassChain, PassChainLayout, StageKind};
use starlight_earth::scene::{CameraState, EarthScene, OrbitCamera};
use starlight_earth::settings::GlobeSettings;
use starlight_earth::GpuContext;

const WIDTH: u32 = 96;
const HEIGHT: u32 = 64;

fn gpu() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::headless()) {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}

fn scene() -> (GlobeSettings, EarthScene) {
    let mut settings = GlobeSettings::default();
    settings.stars.seed = Some(3);
    let scene = EarthScene::build(&settings, SceneAssets::placeholders()).unwrap();
    (settings, scene)
}

fn camera(width: u32, height: u32) -> CameraState {
    let mut camera = OrbitCamera::new(75.0, 0.1, 100.0, 3.0);
    camera.set_aspect(width as f32 / height as f32);
    camera.state()
}

fn chain(gpu: &GpuContext, settings: &GlobeSettings, scene: &EarthScene) -> PassChain {
    PassChain::build(
        gpu,
        scene,
        settings.background,
        OutlineSelection::from_group(&scene.earth_group),
        PassChainLayout::new(),
        OutputTarget {
            width: WIDTH,
            height: HEIGHT,
            format: LDR_FORMAT,
        },
    )
    .unwrap()
}

fn render(
    gpu: &GpuContext,
    chain: &mut PassChain,
    scene: &EarthScene,
    output: &RenderTarget,
) -> Vec<u8> {
    let (width, height) = output.size();
    chain.render(
        gpu,
        scene,
        &camera(width, height),
        FrameTime::new(1.25, 1.0 / 60.0),
        output.view(),
    );
    output.read_pixels(gpu).unwrap()
}

fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

#[test]
fn test_frame_shows_globe_over_background() {
    let Some(gpu) = gpu() else { return };
    let (settings, scene) = scene();
    let mut chain = chain(&gpu, &settings, &scene);
    let output = RenderTarget::new(&gpu.device, "Test Output", WIDTH, HEIGHT, LDR_FORMAT);

    let pixels = render(&gpu, &mut chain, &scene, &output);
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);

    let center = pixel(&pixels, WIDTH, WIDTH / 2, HEIGHT / 2);
    let corner = pixel(&pixels, WIDTH, 0, 0);
    assert_ne!(center, corner);
    // Color correction writes opaque output
    assert_eq!(center[3], 255);
}

#[test]
fn test_outline_toggle_round_trip_is_pixel_identical() {
    let Some(gpu) = gpu() else { return };
    let (settings, scene) = scene();
    let mut chain = chain(&gpu, &settings, &scene);
    let output = RenderTarget::new(&gpu.device, "Test Output", WIDTH, HEIGHT, LDR_FORMAT);

    let before = render(&gpu, &mut chain, &scene, &output);

    assert!(!chain.toggle(StageKind::Outline).unwrap());
    let without = render(&gpu, &mut chain, &scene, &output);

    assert!(chain.toggle(StageKind::Outline).unwrap());
    let after = render(&gpu, &mut chain, &scene, &output);

    assert_eq!(before, after);
    assert_ne!(before, without);
}

#[test]
fn test_resize_keeps_framebuffers_in_lockstep() {
    let Some(gpu) = gpu() else { return };
    let (settings, scene) = scene();
    let mut chain = chain(&gpu, &settings, &scene);

    chain.resize(&gpu.device, 150, 101);
    assert_eq!(chain.size(), (150, 101));

    let sizes = chain.framebuffer_sizes();
    assert!(!sizes.is_empty());
    for (label, size) in &sizes {
        assert!(
            *size == (150, 101) || *size == (75, 50),
            "{} is {:?} after resize",
            label,
            size
        );
    }
    // Disabled stages follow too
    assert!(sizes
        .iter()
        .any(|(label, size)| label.starts_with("Afterimage") && *size == (150, 101)));

    // Rendering at the new size works
    let output = RenderTarget::new(&gpu.device, "Test Output", 150, 101, LDR_FORMAT);
    let pixels = render(&gpu, &mut chain, &scene, &output);
    assert_eq!(pixels.len(), 150 * 101 * 4);
}

#[test]
fn test_resize_round_trip_restores_every_buffer() {
    let Some(gpu) = gpu() else { return };
    let (settings, scene) = scene();
    let mut chain = chain(&gpu, &settings, &scene);
    let original = chain.framebuffer_sizes();

    chain.resize(&gpu.device, 211, 37);
    assert_ne!(chain.framebuffer_sizes(), original);
    chain.resize(&gpu.device, 96, 64);
    assert_eq!(chain.framebuffer_sizes(), original);
}

#[test]
fn test_every_effect_renders() {
    let Some(gpu) = gpu() else { return };
    let (settings, scene) = scene();
    let mut chain = chain(&gpu, &settings, &scene);
    let output = RenderTarget::new(&gpu.device, "Test Output", WIDTH, HEIGHT, LDR_FORMAT);
    let plain = render(&gpu, &mut chain, &scene, &output);

    for kind in StageKind::EFFECTS {
        chain.layout_mut().set_enabled(kind, true).unwrap();
    }
    assert_eq!(
        chain.describe(),
        "Scene -> Color Correction -> Film Grain -> Glitch -> Afterimage -> Bloom -> Halftone -> Outline -> Anti-aliasing"
    );

    // Two frames so the afterimage reads a written history
    render(&gpu, &mut chain, &scene, &output);
    let effected = render(&gpu, &mut chain, &scene, &output);
    assert_ne!(plain, effected);
}

#[test]
fn test_transparent_shells_draw_after_opaque_meshes() {
    let Some(gpu) = gpu() else { return };
    let (settings, scene) = scene();
    let mut chain = chain(&gpu, &settings, &scene);
    let output = RenderTarget::new(&gpu.device, "Test Output", WIDTH, HEIGHT, LDR_FORMAT);
    render(&gpu, &mut chain, &scene, &output);

    let order = chain.scene_draw_order();
    assert_eq!(order.len(), 5);
    let first_shell = order
        .iter()
        .position(|name| name.ends_with("shell"))
        .unwrap();
    assert!(order[..first_shell].iter().all(|name| !name.ends_with("shell")));
    assert!(order[first_shell..].iter().all(|name| name.ends_with("shell")));
}

/// Mean color of the top row, away from the globe
fn top_row_mean(pixels: &[u8], width: u32) -> [f32; 3] {
    let mut sum = [0.0f32; 3];
    for x in 0..width {
        let p = pixel(pixels, width, x, 0);
        for c in 0..3 {
            sum[c] += p[c] as f32;
        }
    }
    sum.map(|c| c / width as f32)
}

#[test]
fn test_environment_fills_the_background() {
    let Some(gpu) = gpu() else { return };
    let mut settings = GlobeSettings::default();
    settings.stars.seed = Some(3);
    let mut assets = SceneAssets::placeholders();
    assets.environment =
        std::array::from_fn(|_| image::RgbaImage::from_pixel(4, 4, image::Rgba([230, 20, 20, 255])));
    let lit = EarthScene::build(&settings, assets).unwrap();
    let output = RenderTarget::new(&gpu.device, "Test Output", WIDTH, HEIGHT, LDR_FORMAT);

    let mut with_sky = chain(&gpu, &settings, &lit);
    let [r, g, b] = top_row_mean(&render(&gpu, &mut with_sky, &lit, &output), WIDTH);
    assert!(r > g + 60.0 && r > b + 60.0, "sky is {:?}", [r, g, b]);

    settings.environment.enabled = false;
    let flat = EarthScene::build(&settings, SceneAssets::placeholders()).unwrap();
    assert!(flat.environment.is_none());
    let mut without_sky = chain(&gpu, &settings, &flat);
    let [r, g, b] = top_row_mean(&render(&gpu, &mut without_sky, &flat, &output), WIDTH);
    assert!(r < g + 60.0 || r < b + 60.0, "background is {:?}", [r, g, b]);
}
