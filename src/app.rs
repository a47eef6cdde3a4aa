use std::time::Duration;

use iced::event;
use iced::{Element, Subscription, Task};

use crate::capture;
use crate::impact;
use crate::loader;
use crate::message::Message;
use crate::player::PlayerEvent;
use crate::state::App;
use crate::sync::AttemptOutcome;
use crate::ui;

impl App {
    /// Handle UI messages and state updates.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::BrowseFile => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter(
                        "Videos",
                        &[
                            "mov", "MOV", "mp4", "MP4", "m4v", "M4V", "mkv", "MKV", "avi", "AVI",
                            "webm", "WEBM",
                        ],
                    )
                    .pick_file()
                {
                    loader::load_video_from_path(self, path);
                }
                Task::none()
            }
            Message::FileDropped(path) => {
                loader::load_video_from_path(self, path);
                Task::none()
            }
            Message::EventOccurred(event) => self.handle_window_event(event),
            Message::MediaTick => self.pump_media(),
            Message::PositionTick => {
                let dragging = self.timeline.is_dragging();
                let Some(controller) = &mut self.controller else {
                    return Task::none();
                };
                controller.poll_position(dragging);
                let state = controller.state();
                // Continuous playback refreshes the still opportunistically,
                // about once per whole-second boundary.
                if state.playing && self.sync.should_sample(state.current_time) {
                    return self.schedule_capture();
                }
                Task::none()
            }
            Message::CaptureAttempt {
                generation,
                attempt,
            } => {
                let Some(controller) = &mut self.controller else {
                    return Task::none();
                };
                let state = controller.state();
                if state.errored {
                    return Task::none();
                }
                let result = if state.ready {
                    capture::capture(controller.backend_mut())
                } else {
                    None
                };
                match self.sync.apply_attempt(generation, attempt, result) {
                    AttemptOutcome::RetryAfter(delay) => Task::perform(
                        tokio::time::sleep(delay),
                        move |_| Message::CaptureAttempt {
                            generation,
                            attempt: attempt + 1,
                        },
                    ),
                    AttemptOutcome::Published | AttemptOutcome::Abandoned => Task::none(),
                }
            }
            Message::TogglePause => {
                let Some(controller) = &mut self.controller else {
                    return Task::none();
                };
                if controller.state().playing {
                    controller.pause();
                    // Refresh the still at the pause point.
                    return self.schedule_capture();
                }
                controller.play();
                Task::none()
            }
            Message::StepFrames(n) => self.step_frames(n),
            Message::TimelineHover(local_x) => {
                let duration = self.duration();
                self.timeline.hover(local_x, duration);
                Task::none()
            }
            Message::TimelineLeave => {
                self.timeline.leave();
                Task::none()
            }
            Message::TimelinePressed => {
                let duration = self.duration();
                let window_x = self.cursor_window_x;
                match self.timeline.press_at_last_position(window_x, duration) {
                    Some(target) => self.seek_and_capture(target),
                    None => Task::none(),
                }
            }
            Message::JumpToImpact | Message::RecaptureImpactFrame => {
                match self.impact_time {
                    Some(target) => self.seek_and_capture(target),
                    None => Task::none(),
                }
            }
            Message::ImpactPoll => {
                if !self.awaiting_impact {
                    return Task::none();
                }
                let Some(path) = &self.source_path else {
                    return Task::none();
                };
                let sidecar = impact::sidecar_path(path);
                if let Some(target) = impact::read_sidecar(&sidecar) {
                    log::info!("impact time received: {:.3}s", target);
                    self.awaiting_impact = false;
                    self.impact_time = Some(target);
                    return self.seek_and_capture(target);
                }
                Task::none()
            }
        }
    }

    fn handle_window_event(&mut self, event: iced::Event) -> Task<Message> {
        match event {
            iced::Event::Window(iced::window::Event::FileDropped(path)) => {
                loader::load_video_from_path(self, path);
                Task::none()
            }
            iced::Event::Mouse(iced::mouse::Event::CursorMoved { position }) => {
                self.cursor_window_x = position.x;
                if self.timeline.is_dragging() {
                    let duration = self.duration();
                    if let Some(target) = self.timeline.window_moved(position.x, duration) {
                        return self.seek_and_capture(target);
                    }
                }
                Task::none()
            }
            iced::Event::Mouse(iced::mouse::Event::ButtonReleased(
                iced::mouse::Button::Left,
            )) => {
                if self.timeline.release() {
                    log::debug!("scrub gesture ended");
                }
                Task::none()
            }
            iced::Event::Mouse(iced::mouse::Event::CursorLeft) => {
                // Leaving the window aborts the gesture; the global drag
                // tracking must not outlive it.
                if self.timeline.is_dragging() {
                    self.timeline.cancel();
                    log::debug!("scrub gesture cancelled: cursor left window");
                }
                Task::none()
            }
            iced::Event::Keyboard(iced::keyboard::Event::KeyPressed {
                key: iced::keyboard::Key::Named(key),
                ..
            }) => match key {
                iced::keyboard::key::Named::ArrowRight => self.step_frames(1),
                iced::keyboard::key::Named::ArrowLeft => self.step_frames(-1),
                iced::keyboard::key::Named::Space => self.update(Message::TogglePause),
                _ => Task::none(),
            },
            _ => Task::none(),
        }
    }

    /// Drain media element notifications and react to the ones that need
    /// coordination.
    fn pump_media(&mut self) -> Task<Message> {
        let events = match &mut self.controller {
            Some(controller) => controller.pump(),
            None => return Task::none(),
        };

        let mut tasks = Vec::new();
        for event in events {
            match event {
                PlayerEvent::BecameReady => {
                    self.status = "Video ready".to_string();
                    // An impact supplied before readiness becomes the first
                    // navigation target; otherwise show frame zero.
                    match self.impact_time {
                        Some(target) => tasks.push(self.seek_and_capture(target)),
                        None => tasks.push(self.schedule_capture()),
                    }
                }
                PlayerEvent::SeekSettled => {
                    // Position was already folded into PlaybackState.
                }
                PlayerEvent::DecodeFailed(msg) => {
                    self.error = Some(format!("Playback failed: {}", msg));
                }
                PlayerEvent::ReachedEnd => {
                    self.status = "End of video".to_string();
                }
            }
        }
        Task::batch(tasks)
    }

    fn step_frames(&mut self, n: i64) -> Task<Message> {
        let Some(controller) = &self.controller else {
            return Task::none();
        };
        let state = controller.state();
        let target = self.sync.step_target(state.current_time, n, state.duration);
        self.seek_and_capture(target)
    }

    /// Issue a seek and run the Requested → Published capture pipeline.
    fn seek_and_capture(&mut self, target: f64) -> Task<Message> {
        let Some(controller) = &mut self.controller else {
            return Task::none();
        };
        if controller.state().errored {
            return Task::none();
        }
        controller.seek(target);
        self.schedule_capture()
    }

    /// Schedule the first capture attempt after the settle delay.
    fn schedule_capture(&mut self) -> Task<Message> {
        let (generation, delay) = self.sync.begin_request();
        Task::perform(tokio::time::sleep(delay), move |_| Message::CaptureAttempt {
            generation,
            attempt: 1,
        })
    }

    fn duration(&self) -> f64 {
        self.controller
            .as_ref()
            .map(|controller| controller.state().duration)
            .unwrap_or(0.0)
    }

    /// Subscribe to events.
    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen().map(Message::EventOccurred)];
        if self.controller.is_some() {
            subscriptions.push(
                iced::time::every(Duration::from_millis(16)).map(|_| Message::MediaTick),
            );
            subscriptions.push(
                iced::time::every(Duration::from_millis(100)).map(|_| Message::PositionTick),
            );
            if self.awaiting_impact && self.source_path.is_some() {
                subscriptions.push(
                    iced::time::every(Duration::from_secs(3)).map(|_| Message::ImpactPoll),
                );
            }
        }
        Subscription::batch(subscriptions)
    }

    /// Render the view.
    pub fn view(&self) -> Element<'_, Message> {
        ui::render_main_view(self)
    }
}
