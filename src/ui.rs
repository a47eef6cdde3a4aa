use iced::widget::{button, center, column, container, image, mouse_area, row, stack, text};
use iced::{alignment, Color, Element, Length, Theme};

use crate::impact::{self, format_time};
use crate::message::Message;
use crate::state::{App, TRACK_WIDTH};
use crate::timeline;

const TRACK_HEIGHT: f32 = 12.0;
const MARKER_WIDTH: f32 = 4.0;

/// Render the main view.
pub fn render_main_view(app: &App) -> Element<'_, Message> {
    // Error state: decode errors are persistent until a new source loads.
    if let Some(error) = &app.error {
        return center(column![
            text("Error Loading Video").size(32),
            text(error.clone()),
            text("").size(10),
            button(text("[Browse Files]").size(16))
                .padding(10)
                .on_press(Message::BrowseFile),
        ])
        .width(Length::Fill)
        .height(Length::Fill)
        .into();
    }

    // Empty state
    let Some(controller) = &app.controller else {
        return center(
            column![
                text("Drag & Drop a Video Here").size(48),
                text("or click browse to load one").size(16),
                button(text("[Browse Files]").size(18))
                    .padding(10)
                    .on_press(Message::BrowseFile),
                text("").size(10),
                text(app.status.clone()).size(12),
            ]
            .spacing(20),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .into();
    };

    let state = controller.state();

    // While scrubbing the drag preview is the authoritative display time.
    let display_time = app.timeline.drag_preview().unwrap_or(state.current_time);

    let frame_surface: Element<'_, Message> = match app.sync.displayed() {
        Some(frame) => container(image(frame.handle()).content_fit(iced::ContentFit::Contain))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(|_theme: &Theme| container::Style {
                background: Some(Color::BLACK.into()),
                ..Default::default()
            })
            .into(),
        None => center(text(if state.ready {
            "Capturing frame..."
        } else {
            "Loading video..."
        }))
        .width(Length::Fill)
        .height(Length::Fill)
        .into(),
    };

    let mut content = column![frame_surface]
        .spacing(10)
        .width(Length::Fill)
        .height(Length::Fill);

    // No track before the duration is known.
    if state.duration > 0.0 {
        content = content.push(render_timeline(app, display_time, state.duration));
        content = content.push(render_transport(app, display_time, state.duration, state.playing));
    }

    content = content.push(render_impact_panel(app));
    content = content.push(render_status_bar(app));

    container(content).padding(10).into()
}

/// The scrub track: progress fill, impact marker and hover tooltip over a
/// fixed-width bar.
fn render_timeline(app: &App, display_time: f64, duration: f64) -> Element<'_, Message> {
    let progress_px = timeline::fraction_of(display_time, duration) * TRACK_WIDTH;

    let track_bg = container("")
        .width(Length::Fixed(TRACK_WIDTH))
        .height(Length::Fixed(TRACK_HEIGHT))
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::from_rgb8(60, 60, 60).into()),
            ..Default::default()
        });

    let progress = container("")
        .width(Length::Fixed(progress_px.max(0.0)))
        .height(Length::Fixed(TRACK_HEIGHT))
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::from_rgb8(140, 140, 140).into()),
            ..Default::default()
        });

    let mut layers = stack![track_bg, progress];

    if let Some(impact_time) = app.impact_time {
        if let Some(fraction) = impact::marker_fraction(impact_time, duration) {
            let marker_px =
                (fraction * TRACK_WIDTH).min(TRACK_WIDTH - MARKER_WIDTH);
            let marker = mouse_area(
                container("")
                    .width(Length::Fixed(MARKER_WIDTH))
                    .height(Length::Fixed(TRACK_HEIGHT))
                    .style(|_theme: &Theme| container::Style {
                        background: Some(Color::from_rgb8(220, 50, 50).into()),
                        ..Default::default()
                    }),
            )
            .on_press(Message::JumpToImpact);
            layers = layers.push(row![
                container("").width(Length::Fixed(marker_px)),
                marker
            ]);
        }
    }

    let track = mouse_area(layers)
        .on_move(|point| Message::TimelineHover(point.x))
        .on_exit(Message::TimelineLeave)
        .on_press(Message::TimelinePressed);

    // Tooltip row above the track, offset to the hover position.
    let tooltip: Element<'_, Message> = match app.timeline.hover_preview() {
        Some((preview_time, offset_px)) => row![
            container("").width(Length::Fixed(offset_px)),
            text(format_time(preview_time)).size(12),
        ]
        .into(),
        None => container("").height(Length::Fixed(14.0)).into(),
    };

    column![tooltip, track].spacing(2).into()
}

fn render_transport(
    app: &App,
    display_time: f64,
    duration: f64,
    playing: bool,
) -> Element<'_, Message> {
    row![
        button(text("<").size(12))
            .on_press(Message::StepFrames(-1))
            .padding(8),
        button(text(if playing { "||" } else { ">" }).size(12))
            .on_press(Message::TogglePause)
            .padding(8),
        button(text(">").size(12))
            .on_press(Message::StepFrames(1))
            .padding(8),
        text(format!(
            "{} / {}",
            format_time(display_time),
            format_time(duration)
        ))
        .size(12),
        text(format!("frame {}", app.sync.frame_index(display_time))).size(12),
    ]
    .spacing(5)
    .align_y(alignment::Vertical::Center)
    .into()
}

fn render_impact_panel(app: &App) -> Element<'_, Message> {
    match app.impact_time {
        Some(impact_time) => column![
            text("Impact Detected").size(18),
            text(format!(
                "Impact at {} ({:.2} seconds)",
                format_time(impact_time),
                impact_time
            ))
            .size(14),
            row![
                button(text("[Jump to Impact]").size(14))
                    .on_press(Message::JumpToImpact)
                    .padding(5),
                button(text("[Recapture Frame]").size(14))
                    .on_press(Message::RecaptureImpactFrame)
                    .padding(5),
            ]
            .spacing(10),
        ]
        .spacing(5)
        .into(),
        None if app.awaiting_impact => text("Awaiting impact analysis...").size(12).into(),
        None => text("No impact detected").size(12).into(),
    }
}

fn render_status_bar(app: &App) -> Element<'_, Message> {
    row![
        text(app.status.clone()).size(12),
        container("").width(Length::Fill),
        button(text("[Browse]").size(12))
            .on_press(Message::BrowseFile)
            .padding(5),
    ]
    .spacing(10)
    .align_y(alignment::Vertical::Center)
    .into()
}
