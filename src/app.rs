use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use iced::widget::image::Handle;
use iced::widget::{column, scrollable, text, text_editor};
use iced::{window, Element, Event, Length, Subscription, Task, Theme};

use crate::api::{GradingClient, GradingOutcome, GradingRequest};
use crate::capture::acquire::{acquire_from_path, is_image_path};
use crate::capture::camera::{self, CameraSession, FacingMode, OpenCamera, VideoFrame};
use crate::capture::{CameraBackend, EncodedImage, NokhwaBackend};
use crate::config::AppConfig;
use crate::errors::CameraError;
use crate::state::{GradingMode, InputMode, SlotId, SlotPair};
use crate::ui;

/// Preferred (not mandatory) capture resolution requested from the camera.
const PREFERRED_WIDTH: u32 = 1920;
const PREFERRED_HEIGHT: u32 = 1080;

/// Per-slot view state: how the slot is fed, what it currently shows, and
/// which background work is in flight for it.
#[derive(Default)]
pub(crate) struct SlotUi {
    pub(crate) input_mode: InputMode,
    pub(crate) preview: Option<Handle>,
    pub(crate) live_frame: Option<Handle>,
    pub(crate) acquiring: bool,
    pub(crate) grabbing: bool,
    pub(crate) session: CameraSession,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked a slot's upload area
    PickFile(SlotId),
    /// A file/camera acquisition finished
    ImageAcquired(SlotId, Result<EncodedImage, String>),
    /// A camera still was captured and normalized
    StillCaptured(SlotId, Result<EncodedImage, String>),
    /// User cleared a slot
    ClearSlot(SlotId),
    /// User clicked somewhere in a slot panel, making it the drop target
    SlotActivated(SlotId),
    /// A file is being dragged over the window
    FileHovered,
    FileHoverLeft,
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    /// User toggled a slot between upload and camera
    InputModeChanged(SlotId, InputMode),
    /// The camera open request completed
    CameraStarted(SlotId, Result<OpenCamera, CameraError>),
    /// Time to refresh the live previews
    CameraTick,
    /// A preview frame arrived
    CameraFrame(SlotId, Result<VideoFrame, CameraError>),
    FlipCamera(SlotId),
    CaptureStill(SlotId),
    GradingModeSelected(GradingMode),
    RubricEdited(text_editor::Action),
    ContextEdited(text_editor::Action),
    Submit,
    /// The grading request completed
    SubmitFinished(Result<GradingOutcome, String>),
    DialogDismissed,
    CloseRequested(window::Id),
}

/// Main application state
pub struct GradingApp {
    config: AppConfig,
    client: GradingClient,
    backend: Arc<dyn CameraBackend>,
    slots: SlotPair,
    pub(crate) grading_mode: GradingMode,
    pub(crate) rubric: text_editor::Content,
    pub(crate) context_input: text_editor::Content,
    reference_ui: SlotUi,
    student_ui: SlotUi,
    pub(crate) submitting: bool,
    outcome: Option<GradingOutcome>,
    /// Status message to display to the user
    status: String,
    last_error: Option<String>,
    pub(crate) drop_hover: bool,
    pub(crate) active_slot: SlotId,
}

impl GradingApp {
    /// Create a new instance of the application
    pub fn new() -> (Self, Task<Message>) {
        let config = AppConfig::from_env();
        log::info!("🎓 Snapgrade started, grading endpoint: {}", config.grade_url());
        (
            Self::with_backend(config, Arc::new(NokhwaBackend)),
            Task::none(),
        )
    }

    /// Build the application around an explicit camera backend.
    pub fn with_backend(config: AppConfig, backend: Arc<dyn CameraBackend>) -> Self {
        let client = GradingClient::new(config.grade_url());
        Self {
            config,
            client,
            backend,
            slots: SlotPair::default(),
            grading_mode: GradingMode::default(),
            rubric: text_editor::Content::new(),
            context_input: text_editor::Content::new(),
            reference_ui: SlotUi::default(),
            student_ui: SlotUi::default(),
            submitting: false,
            outcome: None,
            status: "Ready.".to_string(),
            last_error: None,
            drop_hover: false,
            active_slot: SlotId::Student,
        }
    }

    pub(crate) fn slot_ui(&self, id: SlotId) -> &SlotUi {
        match id {
            SlotId::Reference => &self.reference_ui,
            SlotId::Student => &self.student_ui,
        }
    }

    fn slot_ui_mut(&mut self, id: SlotId) -> &mut SlotUi {
        match id {
            SlotId::Reference => &mut self.reference_ui,
            SlotId::Student => &mut self.student_ui,
        }
    }

    pub fn slots(&self) -> &SlotPair {
        &self.slots
    }

    pub fn outcome(&self) -> Option<&GradingOutcome> {
        self.outcome.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn input_mode(&self, id: SlotId) -> InputMode {
        self.slot_ui(id).input_mode
    }

    pub fn camera_open(&self, id: SlotId) -> bool {
        self.slot_ui(id).session.is_open()
    }

    pub fn flip_available(&self, id: SlotId) -> bool {
        self.slot_ui(id).session.flip_available()
    }

    pub fn facing(&self, id: SlotId) -> FacingMode {
        self.slot_ui(id).session.facing()
    }

    pub fn grading_mode(&self) -> GradingMode {
        self.grading_mode
    }

    pub fn rubric_text(&self) -> String {
        self.rubric.text().trim_end().to_string()
    }

    pub fn context_text(&self) -> String {
        self.context_input.text().trim_end().to_string()
    }

    pub fn set_rubric_text(&mut self, value: &str) {
        self.rubric = text_editor::Content::with_text(value);
    }

    pub fn set_context_text(&mut self, value: &str) {
        self.context_input = text_editor::Content::with_text(value);
    }

    /// Submission is available when the student slot is filled, nothing is in
    /// flight, and the optional answer-sheet validation rule is satisfied.
    pub fn can_submit(&self) -> bool {
        if self.submitting || !self.slots.ready_to_submit() {
            return false;
        }
        if self.config.require_reference_for_answer_sheet
            && self.grading_mode == GradingMode::AnswerSheet
            && !self.slots.get(SlotId::Reference).has_image()
        {
            return false;
        }
        true
    }

    /// Assemble the grading request from current state.
    pub fn build_request(&self) -> GradingRequest {
        GradingRequest {
            rubric: self.rubric_text(),
            context: self.context_text(),
            reference_image: self
                .slots
                .get(SlotId::Reference)
                .image()
                .map(|img| img.data_uri()),
            student_image: self
                .slots
                .get(SlotId::Student)
                .image()
                .map(|img| img.data_uri())
                .unwrap_or_default(),
            grading_mode: self.grading_mode,
        }
    }

    /// Launch a file acquisition for a slot, unless one is already running.
    fn start_acquisition(&mut self, id: SlotId, path: PathBuf) -> Task<Message> {
        let ui = self.slot_ui_mut(id);
        if ui.acquiring {
            log::warn!("acquisition already in flight for {id} slot, ignoring");
            return Task::none();
        }
        ui.acquiring = true;
        self.status = format!("Loading {} image…", id);

        let max_width = self.config.max_width;
        let quality = self.config.jpeg_quality;
        Task::perform(
            async move {
                acquire_from_path(path, max_width, quality)
                    .await
                    .map_err(|e| e.user_message())
            },
            move |result| Message::ImageAcquired(id, result),
        )
    }

    fn store_image(&mut self, id: SlotId, image: EncodedImage) {
        self.slot_ui_mut(id).preview = Some(Handle::from_bytes(image.jpeg.clone()));
        self.slots.get_mut(id).store(image);
    }

    /// Handle application messages and update state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile(id) => {
                self.active_slot = id;
                let title = format!("Select {}", id.label());
                let picked = rfd::FileDialog::new()
                    .set_title(title.as_str())
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"])
                    .pick_file();

                match picked {
                    Some(path) => self.start_acquisition(id, path),
                    None => Task::none(),
                }
            }
            Message::ImageAcquired(id, Ok(image)) => {
                self.slot_ui_mut(id).acquiring = false;
                self.status = format!(
                    "✅ Loaded {} image ({}×{})",
                    id, image.width, image.height
                );
                self.store_image(id, image);
                Task::none()
            }
            Message::ImageAcquired(id, Err(message)) => {
                self.slot_ui_mut(id).acquiring = false;
                log::warn!("failed to acquire {id} image: {message}");
                self.status = format!("Could not load {} image: {}", id, message);
                Task::none()
            }
            Message::ClearSlot(id) => {
                self.slots.get_mut(id).clear();
                self.slot_ui_mut(id).preview = None;
                self.status = format!("Cleared {} image.", id);
                Task::none()
            }
            Message::SlotActivated(id) => {
                self.active_slot = id;
                Task::none()
            }
            Message::FileHovered => {
                self.drop_hover = true;
                Task::none()
            }
            Message::FileHoverLeft => {
                self.drop_hover = false;
                Task::none()
            }
            Message::FileDropped(path) => {
                self.drop_hover = false;
                let id = self.active_slot;
                if self.slot_ui(id).input_mode != InputMode::Upload {
                    return Task::none();
                }
                // Non-image drops are silently ignored
                if !is_image_path(&path) {
                    log::debug!("ignoring non-image drop: {}", path.display());
                    return Task::none();
                }
                self.start_acquisition(id, path)
            }
            Message::InputModeChanged(id, mode) => {
                if self.slot_ui(id).input_mode == mode {
                    return Task::none();
                }
                self.active_slot = id;
                match mode {
                    InputMode::Camera => {
                        let ui = self.slot_ui_mut(id);
                        ui.input_mode = InputMode::Camera;
                        ui.live_frame = None;
                        ui.session.begin_request();
                        let facing = ui.session.facing();
                        self.status = format!("Starting camera for {} slot…", id);
                        self.open_camera(id, facing)
                    }
                    InputMode::Upload => {
                        let ui = self.slot_ui_mut(id);
                        ui.session.stop();
                        ui.live_frame = None;
                        ui.input_mode = InputMode::Upload;
                        Task::none()
                    }
                }
            }
            Message::CameraStarted(id, Ok(opened)) => {
                self.slot_ui_mut(id).session.complete_request(opened);
                if self.slot_ui(id).session.is_open() {
                    self.status = format!("Camera ready for {} slot.", id);
                }
                Task::none()
            }
            Message::CameraStarted(id, Err(error)) => {
                // Fall back to upload mode for this slot
                let ui = self.slot_ui_mut(id);
                ui.session.fail_request();
                ui.live_frame = None;
                ui.input_mode = InputMode::Upload;

                log::error!("camera error on {id} slot: {error}");
                let message = format!("Could not access camera. {error}");
                self.status = message.clone();
                self.last_error = Some(message.clone());
                alert_task(message)
            }
            Message::CameraTick => {
                let mut tasks = Vec::new();
                for id in [SlotId::Reference, SlotId::Student] {
                    let ui = self.slot_ui_mut(id);
                    if ui.grabbing {
                        continue;
                    }
                    if let Some(stream) = ui.session.stream() {
                        ui.grabbing = true;
                        tasks.push(Task::perform(camera::grab_frame(stream), move |result| {
                            Message::CameraFrame(id, result)
                        }));
                    }
                }
                Task::batch(tasks)
            }
            Message::CameraFrame(id, Ok(frame)) => {
                let ui = self.slot_ui_mut(id);
                ui.grabbing = false;
                if ui.session.is_open() {
                    ui.live_frame = Some(Handle::from_rgba(frame.width, frame.height, frame.rgba));
                }
                Task::none()
            }
            Message::CameraFrame(id, Err(error)) => {
                // Transient grab failures only degrade the preview
                self.slot_ui_mut(id).grabbing = false;
                log::warn!("dropped preview frame for {id} slot: {error}");
                Task::none()
            }
            Message::FlipCamera(id) => {
                let ui = self.slot_ui_mut(id);
                ui.live_frame = None;
                let facing = ui.session.flip();
                ui.session.begin_request();
                self.open_camera(id, facing)
            }
            Message::CaptureStill(id) => {
                let Some(stream) = self.slot_ui(id).session.stream() else {
                    return Task::none();
                };
                let max_width = self.config.max_width;
                let quality = self.config.jpeg_quality;
                Task::perform(
                    async move {
                        camera::capture_still(stream, max_width, quality)
                            .await
                            .map_err(|e| e.user_message())
                    },
                    move |result| Message::StillCaptured(id, result),
                )
            }
            Message::StillCaptured(id, Ok(image)) => {
                self.status = format!(
                    "📸 Captured {} image ({}×{})",
                    id, image.width, image.height
                );
                self.store_image(id, image);

                // Tear down the session and show the captured preview
                let ui = self.slot_ui_mut(id);
                ui.session.stop();
                ui.live_frame = None;
                ui.input_mode = InputMode::Upload;
                Task::none()
            }
            Message::StillCaptured(id, Err(message)) => {
                log::warn!("still capture failed for {id} slot: {message}");
                self.status = format!("Could not capture {} image: {}", id, message);
                Task::none()
            }
            Message::GradingModeSelected(mode) => {
                self.grading_mode = mode;
                Task::none()
            }
            Message::RubricEdited(action) => {
                self.rubric.perform(action);
                Task::none()
            }
            Message::ContextEdited(action) => {
                self.context_input.perform(action);
                Task::none()
            }
            Message::Submit => {
                if !self.can_submit() {
                    return Task::none();
                }
                self.submitting = true;
                self.outcome = None;
                self.last_error = None;
                self.status = "Grading in progress…".to_string();

                let client = self.client.clone();
                let request = self.build_request();
                Task::perform(
                    async move {
                        client
                            .submit(&request)
                            .await
                            .map_err(|e| e.user_message())
                    },
                    Message::SubmitFinished,
                )
            }
            Message::SubmitFinished(result) => {
                // Always re-enable submission, success or failure
                self.submitting = false;
                match result {
                    Ok(outcome) => {
                        self.status = format!("✅ Feedback received ({}).", outcome.mode.label());
                        self.outcome = Some(outcome);
                        Task::none()
                    }
                    Err(message) => {
                        log::error!("grading request failed: {message}");
                        let message = format!("Error: {message}");
                        self.status = message.clone();
                        self.last_error = Some(message.clone());
                        alert_task(message)
                    }
                }
            }
            Message::DialogDismissed => Task::none(),
            Message::CloseRequested(id) => {
                // Both sessions are always addressed on teardown
                self.reference_ui.session.stop();
                self.student_ui.session.stop();
                window::close(id)
            }
        }
    }

    fn open_camera(&self, id: SlotId, facing: FacingMode) -> Task<Message> {
        let backend = self.backend.clone();
        Task::perform(
            camera::open_stream(backend, facing, PREFERRED_WIDTH, PREFERRED_HEIGHT),
            move |result| Message::CameraStarted(id, result),
        )
    }

    /// Build the user interface
    pub fn view(&self) -> Element<'_, Message> {
        let content = column![
            text("Snapgrade").size(36),
            text("Grade photographed exam answers with AI feedback.").size(14),
            ui::slot_row(self),
            ui::form(self),
            ui::mode_picker(self.grading_mode),
            ui::submit_area(self),
            text(&self.status).size(13),
        ]
        .spacing(18)
        .padding(30)
        .width(Length::Fill);

        scrollable(content).into()
    }

    /// Set the application theme
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![iced::event::listen_with(window_events)];

        if self.reference_ui.session.is_open() || self.student_ui.session.is_open() {
            subscriptions.push(
                iced::time::every(Duration::from_millis(100)).map(|_| Message::CameraTick),
            );
        }

        Subscription::batch(subscriptions)
    }
}

/// Map window events to application messages.
fn window_events(
    event: Event,
    _status: iced::event::Status,
    id: window::Id,
) -> Option<Message> {
    match event {
        Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FileHoverLeft),
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        Event::Window(window::Event::CloseRequested) => Some(Message::CloseRequested(id)),
        _ => None,
    }
}

/// Show a blocking error notification. Runs as a task so the event loop
/// keeps draining while the dialog is up.
fn alert_task(message: String) -> Task<Message> {
    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Snapgrade")
                .set_description(message.as_str())
                .show()
                .await;
        },
        |_| Message::DialogDismissed,
    )
}
