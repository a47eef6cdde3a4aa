mod app;
mod capture;
mod gst_backend;
mod impact;
mod loader;
mod media;
mod message;
mod player;
mod state;
mod sync;
mod timeline;
mod ui;

use iced::Task;

use state::{App, Options};

fn main() -> iced::Result {
    env_logger::init();

    let options = Options::parse(std::env::args().skip(1));

    iced::application("Impact Frame Viewer", App::update, App::view)
        .subscription(App::subscription)
        .run_with(move || {
            let mut app = App::new(&options);
            if let Some(source) = &options.source {
                loader::load_source(&mut app, source, options.impact_time);
            }
            (app, Task::none())
        })
}
