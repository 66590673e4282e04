//! # Main Display Module
//!
//! Layout for the Tonic Tracer window: the trace plot on the left and the
//! control sidebar (tonic, label modes, drone, settings) on the right.

use iced::widget::{Space, button, checkbox, column, container, pick_list, row, slider, text};
use iced::{Alignment, Element, Length};

use trace_core::theory::TheoryEngine;
use trace_core::{EnharmonicPreference, RangeAdjustment, RenderFrame, Tonic};

use super::plot::Plot;

const DRONE_OCTAVES: [u8; 3] = [2, 3, 4];

/// Creates the complete main application view.
pub fn create_main_view(
    frame: RenderFrame,
    theory: &TheoryEngine,
    audio_active: bool,
    drone_on: bool,
    drone_octave: u8,
    drone_volume: f32,
) -> Element<'static, crate::Message> {
    if !audio_active {
        return container(text("Shutting down...").size(40))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let title = text("Tonic Tracer").size(28);

    let plot = Plot::new(frame).view();
    let sidebar = create_sidebar(theory, drone_on, drone_octave, drone_volume);

    let main_content = row![
        column![title, Space::with_height(20), plot]
            .width(Length::Fill)
            .spacing(10),
        Space::with_width(10),
        sidebar,
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// The control sidebar.
fn create_sidebar(
    theory: &TheoryEngine,
    drone_on: bool,
    drone_octave: u8,
    drone_volume: f32,
) -> Element<'static, crate::Message> {
    let tonic_picker = pick_list(
        Tonic::ALL,
        Some(theory.tonic()),
        crate::Message::TonicSelected,
    )
    .width(Length::Fill);

    let theory_section = column![
        text("Key").size(20),
        tonic_picker,
        checkbox("Scale degrees", theory.use_scale_degrees)
            .on_toggle(crate::Message::DegreeLabelsToggled),
        checkbox("Accidentals", theory.show_accidentals)
            .on_toggle(crate::Message::AccidentalsToggled),
        pick_list(
            EnharmonicPreference::ALL,
            Some(theory.enharmonic_preference),
            crate::Message::PreferenceSelected,
        )
        .width(Length::Fill),
    ]
    .spacing(8);

    // Arrow glyphs need advanced shaping, same as the accidentals.
    let arrow = |glyph: &'static str| text(glyph).shaping(iced::widget::text::Shaping::Advanced);

    // Semitone steps for each edge of the plotted range, C1..C6.
    let range_section = column![
        text("Display range").size(20),
        row![
            text("Top").width(60),
            button(arrow("▲"))
                .on_press(crate::Message::RangeAdjusted(RangeAdjustment::ExpandUpper)),
            button(arrow("▼")).on_press(crate::Message::RangeAdjusted(
                RangeAdjustment::ContractUpper
            )),
        ]
        .spacing(4)
        .align_y(Alignment::Center),
        row![
            text("Bottom").width(60),
            button(arrow("▼"))
                .on_press(crate::Message::RangeAdjusted(RangeAdjustment::ExpandLower)),
            button(arrow("▲")).on_press(crate::Message::RangeAdjusted(
                RangeAdjustment::ContractLower
            )),
        ]
        .spacing(4)
        .align_y(Alignment::Center),
    ]
    .spacing(8);

    let drone_section = column![
        text("Drone").size(20),
        checkbox("Play drone", drone_on).on_toggle(crate::Message::DroneToggled),
        row![
            text("Octave"),
            Space::with_width(10),
            pick_list(
                DRONE_OCTAVES,
                Some(drone_octave),
                crate::Message::DroneOctaveSelected,
            ),
        ]
        .align_y(Alignment::Center),
        slider(0.0..=1.0, drone_volume, crate::Message::DroneVolumeChanged).step(0.01),
    ]
    .spacing(8);

    let program_section = column![
        text("Program").size(20),
        button("Clear trace")
            .on_press(crate::Message::ClearTrace)
            .width(Length::Fill),
        button("Save Settings")
            .on_press(crate::Message::SaveSettings)
            .width(Length::Fill),
        button("Load Settings")
            .on_press(crate::Message::LoadSettings)
            .width(Length::Fill),
        button("Exit")
            .on_press(crate::Message::Exit)
            .width(Length::Fill),
    ]
    .spacing(8);

    container(
        column![
            theory_section,
            Space::with_height(20),
            range_section,
            Space::with_height(20),
            drone_section,
            Space::with_height(20),
            program_section,
        ]
        .width(220),
    )
    .padding(10)
    .into()
}
