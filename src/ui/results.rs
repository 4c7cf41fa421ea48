use iced::widget::{column, container, text};
use iced::{Element, Length};

use crate::api::GradingOutcome;
use crate::app::Message;

/// Returned feedback with its mode badge.
pub fn results_panel(outcome: &GradingOutcome) -> Element<'_, Message> {
    container(
        column![
            text(outcome.mode.badge()).size(15),
            text(&outcome.feedback).size(14),
        ]
        .spacing(10),
    )
    .padding(16)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}
