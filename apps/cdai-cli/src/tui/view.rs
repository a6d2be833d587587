//! Frame rendering.

use cdai_core::{Phase, PromptStrategy, Step};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use super::app::{App, UploadField};

const ACCENT: Color = Color::Indexed(105);
const MUTED: Color = Color::DarkGray;
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, progress, body, notice, legend] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(6),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header);
    draw_progress(frame, progress, app.studio().current_step());
    draw_body(frame, body, app);
    draw_notice(frame, notice, app);
    frame.render_widget(
        Paragraph::new(legend_text(app)).style(Style::default().fg(MUTED)),
        legend,
    );
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "cdai studio",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Premium Commercial Asset Studio",
            Style::default().fg(MUTED),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Breadcrumb with the current phase highlighted.
fn draw_progress(frame: &mut Frame, area: Rect, step: Step) {
    let current = step.phase();
    let mut spans = Vec::new();
    for (i, phase) in Phase::ALL.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", Style::default().fg(MUTED)));
        }
        let style = if Some(phase) == current {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(phase.label(), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(frame: &mut Frame, area: Rect, app: &App) {
    let step = app.studio().current_step();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" {} ", step.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.studio().is_loading() {
        draw_loading(frame, inner, app);
        return;
    }
    match step {
        Step::Upload => draw_upload(frame, inner, app),
        Step::UserPromptInput => draw_prompt_input(frame, inner, app),
        Step::Generating => draw_loading(frame, inner, app),
        _ => draw_menu_step(frame, inner, app),
    }
}

fn draw_upload(frame: &mut Frame, area: Rect, app: &App) {
    let [product, model] =
        Layout::vertical([Constraint::Length(3), Constraint::Length(3)]).areas(area);
    let session = app.studio().session();
    draw_path_field(
        frame,
        product,
        app,
        UploadField::Product,
        "Product Image",
        session.product_image.is_some(),
    );
    draw_path_field(
        frame,
        model,
        app,
        UploadField::Model,
        "Model Image",
        session.model_image.is_some(),
    );
}

fn draw_path_field(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    field: UploadField,
    label: &str,
    loaded: bool,
) {
    let focused = app.focus() == field;
    let status = if loaded { " [loaded]" } else { "" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .title(format!(" {label}{status} "));
    let mut text = app.path_input(field).to_owned();
    if focused {
        text.push('_');
    }
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_prompt_input(frame: &mut Frame, area: Rect, app: &App) {
    let mut text = app
        .studio()
        .session()
        .user_prompt
        .clone()
        .unwrap_or_default();
    text.push('_');
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), area);
}

fn draw_loading(frame: &mut Frame, area: Rect, app: &App) {
    let spinner = SPINNER[app.ticks() % SPINNER.len()];
    let message = match app.studio().current_step() {
        Step::Generating => "Our creative team is rendering your vision...",
        _ => "Writing a creative prompt from your images...",
    };
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(spinner, Style::default().fg(ACCENT)),
            Span::raw(" "),
            Span::raw(message),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Context above the menu: the prompt on preview, the image on result.
fn draw_menu_step(frame: &mut Frame, area: Rect, app: &App) {
    let studio = app.studio();
    let session = studio.session();
    let context: Vec<Line> = match studio.current_step() {
        Step::PromptPreview => vec![
            Line::from(Span::styled("System Mode", Style::default().fg(ACCENT))),
            Line::from(session.system_prompt.clone().unwrap_or_default()),
        ],
        Step::ShotType => session
            .prompt_mode
            .map(PromptStrategy::from)
            .and_then(|strategy| strategy.active_prompt(session))
            .map(|prompt| vec![Line::from(Span::styled(prompt.to_owned(), Style::default().fg(MUTED)))])
            .unwrap_or_default(),
        Step::Result if studio.wizard().is_failed_result() => vec![Line::from(Span::styled(
            "Generation Failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))],
        Step::Result => session
            .generated_image
            .as_ref()
            .map(|image| {
                vec![Line::from(format!(
                    "Generated {image}. Press s to save it to {}.",
                    studio.output_dir().display()
                ))]
            })
            .unwrap_or_default(),
        Step::SessionEnd => vec![Line::from(
            "Your creative assets have been prepared. You can restart the engine anytime to build more campaigns.",
        )],
        _ => Vec::new(),
    };

    let context_height = if context.is_empty() {
        0
    } else {
        (context.len() as u16 + 2).min(area.height / 2)
    };
    let [top, bottom] =
        Layout::vertical([Constraint::Length(context_height), Constraint::Min(1)]).areas(area);
    if !context.is_empty() {
        frame.render_widget(Paragraph::new(context).wrap(Wrap { trim: true }), top);
    }

    let items: Vec<ListItem> = app
        .menu()
        .into_iter()
        .map(|action| ListItem::new(action.label()))
        .collect();
    let list = List::new(items)
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected()));
    frame.render_stateful_widget(list, bottom, &mut state);
}

/// Errors only show on the steps that can produce them.
fn draw_notice(frame: &mut Frame, area: Rect, app: &App) {
    let step = app.studio().current_step();
    let line = match (app.notice(), app.studio().last_error()) {
        (Some(notice), _) => {
            let color = if notice.is_error { Color::Red } else { Color::Green };
            Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)))
        }
        (None, Some(error))
            if matches!(
                step,
                Step::SystemDirection | Step::PromptPreview | Step::Result
            ) =>
        {
            Line::from(Span::styled(error.to_owned(), Style::default().fg(Color::Red)))
        }
        _ => return,
    };
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

fn legend_text(app: &App) -> String {
    let step = app.studio().current_step();
    let mut keys: Vec<&str> = match step {
        _ if app.studio().is_loading() => Vec::new(),
        Step::Upload => vec![
            "type a path",
            "Enter load / continue",
            "Tab switch field",
            "q/Esc quit",
        ],
        Step::UserPromptInput => vec!["Enter continue", "Esc cancel"],
        Step::Generating => Vec::new(),
        Step::Result => vec!["Up/Down select", "Enter confirm", "s save image"],
        Step::SessionEnd => vec!["Up/Down select", "Enter confirm", "q/Esc quit"],
        _ => vec!["Up/Down select", "Enter confirm"],
    };
    if step.allows_reset() {
        keys.push("Ctrl+R reset");
    }
    keys.push("Ctrl+C quit");
    keys.join("  ")
}
