//! View helpers for the grading form. Pure functions from state to widgets;
//! all behavior lives in `app::update`.

mod panel;
mod results;

pub use panel::slot_panel;
pub use results::results_panel;

use iced::widget::{button, column, row, text, text_editor};
use iced::{Element, Length};

use crate::app::{GradingApp, Message};
use crate::state::{GradingMode, SlotId};

/// The two image slots, side by side.
pub fn slot_row(app: &GradingApp) -> Element<'_, Message> {
    row![
        slot_panel(app, SlotId::Reference),
        slot_panel(app, SlotId::Student),
    ]
    .spacing(20)
    .width(Length::Fill)
    .into()
}

/// Rubric and context inputs.
pub fn form(app: &GradingApp) -> Element<'_, Message> {
    column![
        text("Rubric (how to score)").size(14),
        text_editor(&app.rubric)
            .placeholder("e.g. 2 points for the correct structure, 1 point for naming…")
            .on_action(Message::RubricEdited)
            .height(90),
        text("Additional context").size(14),
        text_editor(&app.context_input)
            .placeholder("e.g. Question 4, second-year biochemistry…")
            .on_action(Message::ContextEdited)
            .height(90),
    ]
    .spacing(8)
    .into()
}

/// Grading-mode selector with the active mode's description underneath.
pub fn mode_picker(current: GradingMode) -> Element<'static, Message> {
    let mut buttons = row![].spacing(8);
    for mode in GradingMode::ALL {
        let style = if mode == current {
            button::primary
        } else {
            button::secondary
        };
        buttons = buttons.push(
            button(text(mode.label()).size(14))
                .style(style)
                .on_press(Message::GradingModeSelected(mode)),
        );
    }

    column![
        text("Grading mode").size(14),
        buttons,
        text(current.description()).size(12),
    ]
    .spacing(8)
    .into()
}

/// Submit button, busy indicator, and results.
pub fn submit_area(app: &GradingApp) -> Element<'_, Message> {
    let label = if app.is_submitting() {
        "Grading…"
    } else {
        "Grade Answer"
    };
    let submit = button(text(label).size(16))
        .padding(12)
        .on_press_maybe(app.can_submit().then_some(Message::Submit));

    let mut area = column![submit].spacing(12);

    if app.is_submitting() {
        area = area.push(text("⏳ Analyzing answer, this may take a moment…").size(13));
    }

    if let Some(outcome) = app.outcome() {
        area = area.push(results_panel(outcome));
    }

    area.into()
}
