use snapgrade::app::GradingApp;

fn main() -> iced::Result {
    // Local overrides for the grading endpoint etc.
    dotenvy::dotenv().ok();
    env_logger::init();

    iced::application("Snapgrade", GradingApp::update, GradingApp::view)
        .subscription(GradingApp::subscription)
        .theme(GradingApp::theme)
        // Close is handled in update so open camera sessions are stopped first
        .window(iced::window::Settings {
            exit_on_close_request: false,
            ..Default::default()
        })
        .centered()
        .run_with(GradingApp::new)
}
