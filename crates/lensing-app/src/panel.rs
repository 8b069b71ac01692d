use egui::{Color32, RichText};
use lensing_core::{Control, ControlHandle, FrameStats, ParamUpdate, ParameterSet};

/// Controls after which the panel draws a separator.
const GROUP_ENDS: [Control; 3] = [
    Control::IntegrationStep,
    Control::FlowFrequency,
    Control::NebulaIntensity,
];

const TITLE_COLOR: Color32 = Color32::from_rgb(255, 213, 124);

pub struct Readout {
    pub fps: f32,
    pub stats: FrameStats,
}

/// Side panel built from the control table. Every edit goes out as a
/// [`ParamUpdate`]; nothing here writes the store directly.
pub fn draw(
    ctx: &egui::Context,
    params: &ParameterSet,
    controls: &ControlHandle,
    readout: &Readout,
) {
    egui::SidePanel::right("controls")
        .resizable(false)
        .default_width(240.0)
        .show(ctx, |ui| {
            ui.label(RichText::new("Black hole").strong().color(TITLE_COLOR));
            ui.separator();

            for control in Control::ALL {
                let mut value = control.read(params);
                let slider = egui::Slider::new(&mut value, control.range())
                    .text(control.label())
                    .max_decimals(3);
                if ui.add(slider).changed() {
                    controls.set(control, value);
                }
                if GROUP_ENDS.contains(&control) {
                    ui.separator();
                }
            }

            let mut auto = params.auto_rotation_enabled();
            if ui.checkbox(&mut auto, "Auto rotation").changed() {
                controls.send(ParamUpdate::AutoRotation(auto));
            }
            if ui.button("Reset defaults").clicked() {
                controls.send(ParamUpdate::ResetDefaults);
            }

            ui.separator();
            ui.label(format!("{:.1} FPS", readout.fps));
            ui.label(format!(
                "presented {}  dropped {}",
                readout.stats.presented, readout.stats.dropped
            ));
            ui.label("Space: auto rotation  R: reset  +/-: zoom  H: hide");
        });
}
