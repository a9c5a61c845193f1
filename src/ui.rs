use egui::Context;
use crate::controller::{CameraMode, FrameDriver};
use crate::view::UiFrame;

/// Build the debug overlay and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, driver: &FrameDriver) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_debug_window(ctx, driver);
        if !driver.input.pointer_locked {
            draw_capture_hint(ctx);
        }
    })
}

/// Tessellate shapes into primitives; returns what the platform needs back.
pub fn tessellate(egui_ctx: &Context, mut output: egui::FullOutput) -> (UiFrame, egui::PlatformOutput) {
    let shapes = std::mem::take(&mut output.shapes);
    let primitives = egui_ctx.tessellate(shapes, output.pixels_per_point);
    let frame = UiFrame {
        primitives,
        textures_delta: output.textures_delta,
        pixels_per_point: output.pixels_per_point,
    };
    (frame, output.platform_output)
}

fn draw_debug_window(ctx: &Context, driver: &FrameDriver) {
    let player = &driver.player;
    let cam = &driver.camera_controller;
    let pos = player.position;

    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {:.0}", driver.fps.fps)).small());
            if !player.is_loaded() {
                ui.label(egui::RichText::new("Loading character...").small());
                return;
            }
            ui.label(egui::RichText::new(format!("Pos: x: {:.1} y: {:.2} z: {:.1}", pos.x, pos.y, pos.z)).small());
            ui.label(egui::RichText::new(format!("Vy: {:.2}  jumping: {}", player.vertical_velocity, player.is_jumping)).small());
            ui.label(egui::RichText::new(format!("Facing: {:.0}°", player.facing_yaw().to_degrees())).small());
            let clip = player.animation_state.clip_name();
            let mixer = player.mixer();
            ui.label(egui::RichText::new(format!(
                "Anim: {clip} w={:.2} t={:.2}",
                mixer.weight(clip),
                mixer.time(clip).unwrap_or(0.0),
            )).small());
            ui.label(egui::RichText::new(format!("Yaw: {:.1}° Pitch: {:.1}°", cam.yaw.to_degrees(), cam.pitch.to_degrees())).small());
            let mode = match cam.mode {
                CameraMode::Orbit => "orbit",
                CameraMode::Shoulder => "shoulder",
            };
            ui.label(egui::RichText::new(format!("Camera: {mode}")).small());
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(egui::RichText::new("WASD / arrows - Move").small());
            ui.label(egui::RichText::new("Space - Jump").small());
            ui.label(egui::RichText::new("V - Toggle shoulder view").small());
            ui.label(egui::RichText::new("Click - Capture mouse, Esc - Release").small());
        });
}

fn draw_capture_hint(ctx: &Context) {
    egui::Area::new(egui::Id::new("capture_hint"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -16.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Click to look around").color(egui::Color32::WHITE));
        });
}
