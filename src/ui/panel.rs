use iced::widget::{
    button, column, container, horizontal_space, image, mouse_area, row, text,
};
use iced::{Alignment, Element, Length, Theme};

use crate::app::{GradingApp, Message, SlotUi};
use crate::state::{InputMode, SlotId};

/// One image slot: mode toggle, preview or viewfinder, and its controls.
/// Clicking anywhere in the panel makes it the drop target.
pub fn slot_panel(app: &GradingApp, id: SlotId) -> Element<'_, Message> {
    let ui = app.slot_ui(id);

    let mode_toggle = row![
        mode_button("Upload", id, InputMode::Upload, ui.input_mode),
        mode_button("Camera", id, InputMode::Camera, ui.input_mode),
    ]
    .spacing(6);

    let body: Element<'_, Message> = match ui.input_mode {
        InputMode::Upload => upload_area(app, id, ui),
        InputMode::Camera => camera_area(id, ui),
    };

    let panel = column![text(id.label()).size(18), mode_toggle, body]
        .spacing(10)
        .width(Length::Fill);

    let highlighted = app.drop_hover && app.active_slot == id;

    mouse_area(
        container(panel)
            .padding(12)
            .width(Length::Fill)
            .style(panel_style(highlighted)),
    )
    .on_press(Message::SlotActivated(id))
    .into()
}

fn mode_button(
    label: &'static str,
    id: SlotId,
    mode: InputMode,
    current: InputMode,
) -> Element<'static, Message> {
    let style = if mode == current {
        button::primary
    } else {
        button::secondary
    };
    button(text(label).size(13))
        .style(style)
        .on_press(Message::InputModeChanged(id, mode))
        .into()
}

fn upload_area<'a>(app: &'a GradingApp, id: SlotId, ui: &'a SlotUi) -> Element<'a, Message> {
    if let Some(preview) = &ui.preview {
        let dimensions = app
            .slots()
            .get(id)
            .image()
            .map(|img| format!("{}×{}", img.width, img.height))
            .unwrap_or_default();

        column![
            image(preview.clone()).width(Length::Fill),
            row![
                text(dimensions).size(12),
                horizontal_space(),
                button(text("Replace…").size(13)).on_press(Message::PickFile(id)),
                button(text("Clear").size(13))
                    .style(button::danger)
                    .on_press(Message::ClearSlot(id)),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        ]
        .spacing(8)
        .into()
    } else {
        let hint = if ui.acquiring {
            "Loading…"
        } else {
            "Click to upload, or drop an image here"
        };
        button(
            container(text(hint).size(14))
                .width(Length::Fill)
                .center_x(Length::Fill)
                .padding(40),
        )
        .style(button::secondary)
        .width(Length::Fill)
        .on_press(Message::PickFile(id))
        .into()
    }
}

fn camera_area<'a>(id: SlotId, ui: &'a SlotUi) -> Element<'a, Message> {
    let viewfinder: Element<'_, Message> = match &ui.live_frame {
        Some(frame) => image(frame.clone()).width(Length::Fill).into(),
        None => {
            let message = if ui.session.is_requesting() {
                "Starting camera…"
            } else {
                "Camera is off"
            };
            container(text(message).size(14))
                .width(Length::Fill)
                .center_x(Length::Fill)
                .padding(40)
                .into()
        }
    };

    let mut controls = row![button(text("📸 Capture").size(14))
        .on_press_maybe(ui.session.is_open().then_some(Message::CaptureStill(id)))]
    .spacing(8);

    if ui.session.flip_available() {
        controls = controls.push(
            button(text("🔄 Flip").size(14))
                .style(button::secondary)
                .on_press(Message::FlipCamera(id)),
        );
    }

    column![viewfinder, controls].spacing(8).into()
}

fn panel_style(highlighted: bool) -> impl Fn(&Theme) -> container::Style {
    move |theme| {
        let mut style = container::rounded_box(theme);
        if highlighted {
            style.border.color = theme.palette().primary;
            style.border.width = 2.0;
        }
        style
    }
}
