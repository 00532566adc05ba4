use anyhow::Result;
use exportable::prelude::*;
use ratatui::widgets::Paragraph;

fn hello_world() -> Component<()> {
    Component::new("HelloWorld", |_: &()| {
        Element::widget(Paragraph::new("Hello World! (press 'esc' to quit)"))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut term = init_tui()?;
    init_panic_hook();

    let app = App::new(&hello_world(), ()).render();
    let result = run(&mut term, app, RunConfig::default()).await;

    app.unmount();
    restore_tui()?;
    result
}
