use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, InputMode, Screen, SetupView};
use crate::chat::{Rating, Role};
use crate::language::{self, CATALOG};
use crate::roadmap::RoadmapError;
use crate::setup::{self, WIZARD_LANGUAGES};

/// Parse a line of text and convert **bold** and `code` markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else if c == '`' {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            let mut code_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '`' {
                    found_close = true;
                    break;
                }
                code_text.push(c);
            }

            if found_close && !code_text.is_empty() {
                spans.push(Span::styled(code_text, Style::default().fg(Color::Green)));
            } else {
                // No closing backtick, treat as literal
                current_text.push('`');
                current_text.push_str(&code_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Render markdown text as styled lines, keeping fenced code blocks apart
/// from prose.
fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        if raw.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        } else if in_code_block {
            lines.push(Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(parse_markdown_line(raw));
        }
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Home => render_home(app, frame, body_area),
        Screen::Lab => render_lab(app, frame, body_area),
        Screen::Roadmap => render_roadmap(app, frame, body_area),
        Screen::Blueprints => render_blueprints(app, frame, body_area),
        Screen::Setup => render_setup(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.show_key_input {
        render_key_input(app, frame, area);
    } else if app.show_example_modal {
        render_example_modal(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let auth_span = match app.auth.profile() {
        Some(profile) => Span::styled(
            format!(" {} ", profile.username),
            Style::default().fg(Color::Green),
        ),
        None => Span::styled(" guest ", Style::default().fg(Color::Gray)),
    };

    let key_span = match app.auth.key_source_label() {
        Some(source) => Span::styled(
            format!("[key: {}] ", source),
            Style::default().fg(Color::Gray),
        ),
        None => Span::styled("[no key] ", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(
            " TRIAD HUB ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        auth_span,
        key_span,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Home => " HOME ",
        Screen::Lab => " LAB ",
        Screen::Roadmap => " ROADMAP ",
        Screen::Blueprints => " BLUEPRINTS ",
        Screen::Setup => " SETUP ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.screen, app.input_mode) {
        (Screen::Home, _) => {
            let auth_label = if app.auth.is_authenticated() {
                " sign out "
            } else {
                " sign in "
            };
            vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" nav ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" lab ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" roadmap ", label_style),
                Span::styled(" t ", key_style),
                Span::styled(" general ", label_style),
                Span::styled(" b ", key_style),
                Span::styled(" blueprints ", label_style),
                Span::styled(" s ", key_style),
                Span::styled(" setup ", label_style),
                Span::styled(" g ", key_style),
                Span::styled(auth_label, label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]
        }
        (Screen::Lab, InputMode::Normal) => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" scope ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if app.can_retry_chat() {
                hints.extend(vec![
                    Span::styled(" r ", key_style),
                    Span::styled(" retry ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" +/- ", key_style),
                Span::styled(" rate ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" roadmap ", label_style),
                Span::styled(" K ", key_style),
                Span::styled(" key ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" home ", label_style),
            ]);
            hints
        }
        (Screen::Lab, InputMode::Editing) => {
            let mut hints = vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
            ];
            if !app.suggestions.is_empty() {
                hints.extend(vec![
                    Span::styled(" Up/Down ", key_style),
                    Span::styled(" suggestions ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ]);
            hints
        }
        (Screen::Roadmap, _) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" steps ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" expand ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" concept ", label_style),
            Span::styled(" e ", key_style),
            Span::styled(" example ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" refresh ", label_style),
            Span::styled(" t ", key_style),
            Span::styled(" lab ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" home ", label_style),
        ],
        (Screen::Blueprints, _) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" f ", key_style),
            Span::styled(" category ", label_style),
            Span::styled(" L ", key_style),
            Span::styled(" language ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" lab ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" home ", label_style),
        ],
        (Screen::Setup, _) => {
            let mut hints = vec![
                Span::styled(" 1-4 ", key_style),
                Span::styled(" view ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" next ", label_style),
            ];
            match app.setup_view {
                SetupView::Wizard => hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" move ", label_style),
                    Span::styled(" Space ", key_style),
                    Span::styled(" toggle ", label_style),
                    Span::styled(" t ", key_style),
                    Span::styled(" tools ", label_style),
                    Span::styled(" o ", key_style),
                    Span::styled(" os ", label_style),
                ]),
                SetupView::Starter => hints.extend(vec![
                    Span::styled(" n ", key_style),
                    Span::styled(" card ", label_style),
                    Span::styled(" a ", key_style),
                    Span::styled(" flavor ", label_style),
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                ]),
                _ => hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                ]),
            }
            hints.extend(vec![
                Span::styled(" Esc ", key_style),
                Span::styled(" home ", label_style),
            ]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_home(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Length(30), Constraint::Min(0)]).areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Triad Catalog ");

    let items: Vec<ListItem> = CATALOG
        .iter()
        .map(|entry| {
            let mut name = format!(" {} {}", entry.icon, entry.language.as_str());
            if entry.coming_soon {
                name.push_str(" (soon)");
            }
            let name_style = if entry.coming_soon {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            ListItem::new(vec![
                Line::from(Span::styled(name, name_style)),
                Line::from(Span::styled(
                    format!("   {}", entry.tagline),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.home_state);

    // Detail panel for the selected entry
    let entry = app.selected_catalog_entry();
    let detail_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", entry.language.as_str()));

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", entry.icon, entry.language.as_str()),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(Span::styled(
            entry.tagline,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::default(),
        Line::from(entry.description),
        Line::default(),
        Line::from(vec![
            Span::styled("Docs: ", Style::default().fg(Color::DarkGray)),
            Span::styled(entry.docs_url, Style::default().fg(Color::Cyan)),
        ]),
    ];
    if entry.satellite {
        lines.push(Line::from(Span::styled(
            "Satellite frequency",
            Style::default().fg(Color::Magenta),
        )));
    }
    if entry.coming_soon {
        lines.push(Line::from(Span::styled(
            "Coming soon",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Enter opens the lab, m opens the roadmap.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let detail = Paragraph::new(lines)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, detail_area);
}

fn render_lab(app: &mut App, frame: &mut Frame, area: Rect) {
    let suggestions_height = if app.input_mode == InputMode::Editing && !app.suggestions.is_empty()
    {
        (app.suggestions.len() as u16 + 2).min(6)
    } else {
        0
    };

    let [chat_area, suggestions_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(suggestions_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_area_height = chat_area.height.saturating_sub(2);
    app.chat_area_width = chat_area.width.saturating_sub(2);

    let lab_title = match app.scope {
        Some(language) => format!(
            " Architectural Lab: {} {} ",
            language::info(language).icon,
            language.as_str()
        ),
        None => " Architectural Lab: General ".to_string(),
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(lab_title);

    let chat_text = if app.session.messages().is_empty() {
        Text::from(Span::styled(
            "Press 'i' and ask the mentor anything...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for message in app.session.messages() {
            match message.role {
                Role::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )));
                    for line in message.content.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                    lines.push(Line::default());
                }
                Role::Model => {
                    let mut header = vec![Span::styled(
                        "Mentor:",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )];
                    match app.session.rating_for(&message.id) {
                        Some(Rating::Positive) => header.push(Span::styled(
                            "  [helpful]",
                            Style::default().fg(Color::Green),
                        )),
                        Some(Rating::Negative) => header.push(Span::styled(
                            "  [not helpful]",
                            Style::default().fg(Color::Red),
                        )),
                        None => {}
                    }
                    lines.push(Line::from(header));

                    if message.is_loading {
                        // Animated ellipsis: cycles through ".", "..", "..."
                        let dots = ".".repeat((app.animation_frame as usize) + 1);
                        lines.push(Line::from(Span::styled(
                            format!("Drafting blueprint{}", dots),
                            Style::default()
                                .fg(Color::DarkGray)
                                .add_modifier(Modifier::ITALIC),
                        )));
                    } else if message.is_error {
                        lines.push(Line::from(Span::styled(
                            message.content.clone(),
                            Style::default().fg(Color::Red),
                        )));
                    } else {
                        lines.extend(render_markdown(&message.content));
                    }
                    lines.push(Line::default());
                }
            }
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    // Suggestion list while editing
    if suggestions_height > 0 {
        let suggestion_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Quick Actions ");

        let items: Vec<ListItem> = app
            .suggestions
            .iter()
            .map(|s| ListItem::new(format!(" {} ", s)))
            .collect();

        let list = List::new(items)
            .block(suggestion_block)
            .highlight_style(
                Style::default()
                    .bg(Color::Magenta)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(app.suggestion_index);
        frame.render_stateful_widget(list, suggestions_area, &mut state);
    }

    // Chat input at the bottom
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Ask the Mentor (i to type) ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_roadmap(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = match app.roadmap_language {
        Some(language) => format!(" {} Learning Roadmap ", language.as_str()),
        None => " Learning Roadmap ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if app.roadmap_loading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let body = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                format!("Generating Roadmap{}", dots),
                Style::default().fg(Color::Yellow).bold(),
            )),
            Line::from(Span::styled(
                "Consulting the architectural mentor...",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(Paragraph::new(body).block(block), area);
        return;
    }

    if let Some(error) = &app.roadmap_error {
        let (heading, detail) = match error {
            RoadmapError::QuotaExceeded => (
                "Architectural Link Quota Exceeded",
                "The generation quota for this track is exhausted.".to_string(),
            ),
            RoadmapError::Generation(msg) => ("System Communication Failure", msg.clone()),
        };
        let body = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                heading,
                Style::default().fg(Color::Red).bold(),
            )),
            Line::from(detail),
            Line::default(),
            Line::from(Span::styled(
                "Press 'r' to retry.",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(body).block(block).wrap(Wrap { trim: true }),
            area,
        );
        return;
    }

    if app.roadmap_steps.is_empty() {
        let body = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "No roadmap modules available for this track yet.",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(Paragraph::new(body).block(block), area);
        return;
    }

    let selected = app.roadmap_state.selected();
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_offset: u16 = 0;

    for (idx, step) in app.roadmap_steps.iter().enumerate() {
        let is_selected = selected == Some(idx);
        if is_selected {
            selected_offset = lines.len() as u16;
        }
        let expanded = app.expanded_steps.contains(&idx);
        let marker = if expanded { "v" } else { ">" };

        let title_style = if is_selected {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:02} ", idx + 1), Style::default().fg(Color::Magenta).bold()),
            Span::styled(format!("{} {}", marker, step.title), title_style),
        ]));

        if expanded {
            for line in step.description.lines() {
                lines.push(Line::from(format!("     {}", line)));
            }

            // Flat cursor across key and related concepts
            let mut flat_idx = 0usize;
            if !step.concepts.is_empty() {
                lines.push(Line::from(Span::styled(
                    "     Key Concepts",
                    Style::default().fg(Color::Cyan).bold(),
                )));
                for concept in &step.concepts {
                    lines.push(concept_line(
                        concept.name.as_str(),
                        concept.definition.as_str(),
                        is_selected && app.concept_cursor == flat_idx,
                    ));
                    flat_idx += 1;
                }
            }
            if !step.related_concepts.is_empty() {
                lines.push(Line::from(Span::styled(
                    "     Related",
                    Style::default().fg(Color::DarkGray).bold(),
                )));
                for concept in &step.related_concepts {
                    lines.push(concept_line(
                        concept.name.as_str(),
                        concept.definition.as_str(),
                        is_selected && app.concept_cursor == flat_idx,
                    ));
                    flat_idx += 1;
                }
            }
            if flat_idx > 0 {
                lines.push(Line::from(Span::styled(
                    "     'e' fetches a code example for the highlighted concept.",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        lines.push(Line::default());
    }

    // Keep the selected step in view. Wrapped lines make this an estimate,
    // never an overshoot.
    let inner_height = area.height.saturating_sub(2);
    let scroll = selected_offset.saturating_sub(inner_height.saturating_sub(4));

    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(body, area);
}

fn concept_line(name: &str, definition: &str, highlighted: bool) -> Line<'static> {
    let name_style = if highlighted {
        Style::default().bg(Color::Yellow).fg(Color::Black).bold()
    } else {
        Style::default().fg(Color::Yellow)
    };
    Line::from(vec![
        Span::raw("       - "),
        Span::styled(format!(" {} ", name), name_style),
        Span::raw(format!(" {}", definition)),
    ])
}

fn render_blueprints(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);

    let category_label = app
        .blueprint_category
        .map(|c| c.as_str())
        .unwrap_or("All Frequencies");
    let language_label = app
        .blueprint_language
        .map(|l| l.as_str())
        .unwrap_or("All Languages");

    let filtered = app.filtered_blueprints();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Blueprints: {} / {} ", category_label, language_label));

    if filtered.is_empty() {
        let placeholder = Paragraph::new("No blueprints found in this frequency.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, list_area);
    } else {
        let items: Vec<ListItem> = filtered
            .iter()
            .map(|blueprint| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        format!(" {} ", blueprint.title),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!(
                            "   {} | {}",
                            blueprint.category.as_str(),
                            blueprint.difficulty.as_str()
                        ),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, list_area, &mut app.blueprint_state);
    }

    // Detail panel
    let detail_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Specification ");

    let detail_text = match app.selected_blueprint() {
        Some(blueprint) => {
            let languages: Vec<&str> = blueprint.languages.iter().map(|l| l.as_str()).collect();
            let mut lines = vec![
                Line::from(Span::styled(
                    blueprint.title,
                    Style::default().fg(Color::Yellow).bold(),
                )),
                Line::from(Span::styled(
                    format!(
                        "{} | {} | {}",
                        blueprint.category.as_str(),
                        blueprint.difficulty.as_str(),
                        languages.join(" / ")
                    ),
                    Style::default().fg(Color::Magenta),
                )),
                Line::default(),
                Line::from(blueprint.description),
                Line::default(),
            ];
            for stat in blueprint.stats {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}: ", stat.label),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(stat.value, Style::default().add_modifier(Modifier::BOLD)),
                ]));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Enter studies this blueprint in the lab.",
                Style::default().fg(Color::DarkGray),
            )));
            Text::from(lines)
        }
        None => Text::from(Span::styled(
            "Select a blueprint to inspect.",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let detail = Paragraph::new(detail_text)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, detail_area);
}

fn render_setup(app: &mut App, frame: &mut Frame, area: Rect) {
    let [tabs_area, body_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

    // Tab bar
    let tab_style = Style::default().fg(Color::DarkGray);
    let active_style = Style::default().bg(Color::Yellow).fg(Color::Black).bold();
    let tabs = [
        (SetupView::Wizard, " 1 Wizard "),
        (SetupView::Starter, " 2 Starter "),
        (SetupView::Nix, " 3 flake.nix "),
        (SetupView::Devcontainer, " 4 devcontainer "),
    ];
    let tab_spans: Vec<Span> = tabs
        .iter()
        .map(|(view, label)| {
            Span::styled(
                *label,
                if app.setup_view == *view {
                    active_style
                } else {
                    tab_style
                },
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(tab_spans)), tabs_area);

    match app.setup_view {
        SetupView::Wizard => render_setup_wizard(app, frame, body_area),
        SetupView::Starter => render_setup_starter(app, frame, body_area),
        SetupView::Nix => render_generated_file(
            app,
            frame,
            body_area,
            " flake.nix ",
            setup::flake_nix(&app.setup),
        ),
        SetupView::Devcontainer => render_generated_file(
            app,
            frame,
            body_area,
            " .devcontainer/devcontainer.json ",
            setup::devcontainer_json(&app.setup),
        ),
    }
}

fn render_setup_wizard(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Environment Wizard ");

    let mut lines = vec![
        Line::from(Span::styled(
            "Select the runtimes for your lab environment.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];

    for (i, language) in WIZARD_LANGUAGES.iter().enumerate() {
        let checked = app.setup.includes(*language);
        let box_str = if checked { "[x]" } else { "[ ]" };
        let style = if app.setup_cursor == i {
            Style::default().bg(Color::Blue).fg(Color::White).bold()
        } else if checked {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(" {} {} ", box_str, language.as_str()),
            style,
        )));
    }

    lines.push(Line::default());
    let tools_box = if app.setup.include_tools { "[x]" } else { "[ ]" };
    lines.push(Line::from(format!(
        " {} Language servers and tooling (t)",
        tools_box
    )));
    lines.push(Line::from(format!(
        " Target OS: {} (o)",
        app.setup.target_os.label()
    )));

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Provision command:",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        setup::provision_command(&app.setup),
        Style::default().fg(Color::Cyan),
    )));

    let body = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn render_setup_starter(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Starter Projects ");

    let Some(language) = app.focused_starter_language() else {
        let placeholder = Paragraph::new("Select at least one language in the wizard.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let advanced = app.starter_advanced.contains(&language);
    let flavor = if advanced { "advanced" } else { "basic" };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} starter", language.as_str()),
                Style::default().fg(Color::Yellow).bold(),
            ),
            Span::styled(
                format!("  [{}]", flavor),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled(
                format!(
                    "  ({} of {})",
                    app.starter_cursor + 1,
                    app.setup.languages.len()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::default(),
    ];

    match setup::starter_guide(language, advanced) {
        Some(guide) => {
            lines.push(Line::from(Span::styled(
                guide.command,
                Style::default().fg(Color::Cyan),
            )));
            lines.push(Line::from(guide.description));
            lines.push(Line::default());
            for line in guide.tree.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::Green),
                )));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "No starter guide for this track yet.",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.setup_scroll, 0));
    frame.render_widget(body, area);
}

fn render_generated_file(app: &App, frame: &mut Frame, area: Rect, title: &str, content: String) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title.to_string());

    let lines: Vec<Line> = content
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();

    let body = Paragraph::new(lines)
        .block(block)
        .scroll((app.setup_scroll, 0));
    frame.render_widget(body, area);
}

fn render_example_modal(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 72.min(area.width.saturating_sub(4));
    let popup_height = 20.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " Blueprint: {} (j/k scroll, Esc close) ",
            app.example_concept
        ));

    let content = if app.example_loading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Text::from(Span::styled(
            format!("Generating example{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Text::from(render_markdown(&app.example_content))
    };

    let body = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.example_scroll, 0));
    frame.render_widget(body, popup_area);
}

fn render_key_input(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Enter Gemini API Key ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Instructions
    let instructions =
        Paragraph::new("Paste your Gemini API key. Press Enter to save, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray));

    let instructions_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(instructions, instructions_area);

    // Input field
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);

    // Mask the key with asterisks (show last 4 chars)
    let char_count = app.key_input.chars().count();
    let display_text = if app.key_input.is_empty() {
        String::new()
    } else if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let masked_len = char_count - 4;
        let last_four: String = app.key_input.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    };

    let input = Paragraph::new(display_text).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    // Show cursor
    let cursor_x = app.key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    // Status line
    let status = Paragraph::new(format!("{} characters", char_count))
        .style(Style::default().fg(Color::DarkGray));

    let status_area = Rect::new(inner.x, inner.y + 4, inner.width, 1);
    frame.render_widget(status, status_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("use **comptime** here");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "comptime");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a ** dangling marker");
        let flat: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(flat, "a ** dangling marker");
    }

    #[test]
    fn test_parse_markdown_inline_code() {
        let line = parse_markdown_line("call `defer` last");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "defer");
        assert_eq!(line.spans[1].style.fg, Some(Color::Green));
    }

    #[test]
    fn test_render_markdown_tracks_code_fences() {
        let text = "intro\n```zig\nconst x = 1;\n```\noutro **done**";
        let lines = render_markdown(text);
        assert_eq!(lines.len(), 5);
        // The fenced body is styled as code, not parsed as prose.
        assert_eq!(lines[2].spans[0].style.fg, Some(Color::Green));
        assert!(lines[4]
            .spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
    }
}
