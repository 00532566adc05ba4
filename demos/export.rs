use anyhow::Result;
use crossterm::event::KeyCode;
use exportable::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use serde::Serialize;

#[derive(Serialize)]
struct ChildExport {
    handle_click: Handler,
    state: String,
}

#[derive(Serialize)]
struct ParentExport {
    handle_click: Handler,
    state: String,
}

/// Press 'c' to click the child directly
fn child() -> Component<ExportProps<(), ChildExport>> {
    export_component("Child", |_: &(), exporter: &Exporter<ChildExport>| {
        let state = use_state("Hi, I'm child".to_string());
        let handle_click = use_handler(move |_| state.update(|s| s.push('!')));

        match_on!([handle_click], KeyCode, {
            KeyCode::Char('c') => handle_click.call(()),
        });

        exporter.export(|| ChildExport {
            handle_click: handle_click.clone(),
            state: state.get(),
        });

        let block = Block::default().borders(Borders::all()).title("Child (c)");
        Element::widget(Paragraph::new(state.get()).block(block))
    })
}

/// Press 'p' to click the child through the parent
fn parent() -> Component<ExportProps<(), ParentExport>> {
    let child = child();
    export_component("Parent", move |_: &(), exporter: &Exporter<ParentExport>| {
        let UseComponent {
            exported,
            component,
            mounted,
        } = use_component(&child);

        if let Some(exported) = &exported {
            exporter.export(|| ParentExport {
                handle_click: exported.handle_click.clone(),
                state: exported.state.clone(),
            });
        }

        match_on!([exported], KeyCode, {
            KeyCode::Char('p') => {
                if let (true, Some(exported)) = (mounted, &exported) {
                    exported.handle_click.call(())
                }
            },
        });

        let block = Block::default().borders(Borders::all()).title("Parent (p)");
        Element::column([
            Element::widget(Paragraph::new(format!("child mounted: {mounted}")).block(block)),
            Element::component(&component, ()),
        ])
    })
}

/// Press 'r' to click the child from the root
fn root() -> Component<()> {
    let parent = parent();
    Component::new("Root", move |_: &()| {
        let UseComponent {
            exported,
            component,
            mounted,
        } = use_component(&parent);

        let text = match (&exported, mounted) {
            (Some(exported), true) => format!("parent says: {}", exported.state),
            _ => "parent not mounted yet".to_string(),
        };

        match_on!([exported], KeyCode, {
            KeyCode::Char('r') => {
                if let (true, Some(exported)) = (mounted, &exported) {
                    exported.handle_click.call(())
                }
            },
        });

        let block = Block::default()
            .borders(Borders::all())
            .title("Root (r)")
            .title("(press esc to exit)");
        Element::column([
            Element::widget(Paragraph::new(text).block(block)),
            Element::component(&component, ()),
        ])
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut term = init_tui()?;
    init_panic_hook();

    let app = App::new(&root(), ()).render();
    let result = run(&mut term, app, RunConfig::default()).await;

    app.unmount();
    restore_tui()?;
    result
}
