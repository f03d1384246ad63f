//! TUI rendering using ratatui.

use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};

use stockwright_core::production::PlanView;
use stockwright_core::selection::Modal;

use super::app::{App, DialogFocus, MATERIAL_FIELDS, PRODUCT_FIELDS, View};

/// Render the current view and any open overlay.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Min(3),    // main content
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);
    match app.view {
        View::Materials => render_materials(f, app, chunks[1]),
        View::Products => render_products(f, app, chunks[1]),
        View::Plan => render_plan(f, app, chunks[1]),
        View::Help => render_help(f, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    if !app.bench.modal().is_idle() {
        render_product_dialog(f, app);
    }
    if app.material_form.is_some() {
        render_material_form(f, app);
    }
    if let Some(pending) = &app.confirm {
        render_confirm(f, &pending.prompt);
    }
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(
        cells
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
    )
    .height(1)
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn bordered(title: String) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title)
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles = View::TABS.iter().map(|v| format!(" {} ", v.title()));
    let selected = View::TABS
        .iter()
        .position(|v| *v == app.view)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(tabs, area);
}

fn collection_title(name: &str, error: Option<&str>, loading: bool) -> String {
    match (error, loading) {
        (_, true) => format!(" {name} (loading...) "),
        (Some(_), false) => format!(" {name} (last refresh failed, showing cached data) "),
        (None, false) => format!(" {name} "),
    }
}

fn render_materials(f: &mut Frame, app: &App, area: Rect) {
    let materials = app.bench.store().materials();
    let rows = materials.items().iter().enumerate().map(|(i, m)| {
        Row::new(vec![
            Cell::from(m.id.to_string()),
            Cell::from(m.code.clone()),
            Cell::from(m.name.clone()),
            Cell::from(m.stock_quantity.to_string()),
        ])
        .style(selected_style(i == app.selected_material))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Percentage(50),
            Constraint::Length(14),
        ],
    )
    .header(header(&["ID", "Code", "Name", "Stock"]))
    .block(bordered(collection_title(
        "Raw Materials",
        materials.error(),
        materials.is_loading(),
    )));

    f.render_widget(table, area);
}

fn render_products(f: &mut Frame, app: &App, area: Rect) {
    let products = app.bench.store().products();
    let rows = products.items().iter().enumerate().map(|(i, p)| {
        let names: Vec<String> = p
            .composition
            .iter()
            .map(|c| {
                let name = c
                    .raw_material_name
                    .clone()
                    .unwrap_or_else(|| format!("#{}", c.raw_material_id));
                format!("{name} x{}", c.quantity)
            })
            .collect();
        Row::new(vec![
            Cell::from(p.id.to_string()),
            Cell::from(p.code.clone()),
            Cell::from(p.name.clone()),
            Cell::from(p.value.to_string()),
            Cell::from(names.join(", ")),
        ])
        .style(selected_style(i == app.selected_product))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Percentage(25),
            Constraint::Length(12),
            Constraint::Percentage(50),
        ],
    )
    .header(header(&["ID", "Code", "Name", "Value", "Composition"]))
    .block(bordered(collection_title(
        "Products",
        products.error(),
        products.is_loading(),
    )));

    f.render_widget(table, area);
}

fn render_plan(f: &mut Frame, app: &App, area: Rect) {
    let production = app.bench.production();
    let title = match production.fetched_at() {
        Some(at) => format!(
            " Production Plan (as of {}) ",
            at.with_timezone(&Local).format("%H:%M:%S")
        ),
        None => " Production Plan ".to_string(),
    };

    let message = |text: String, color: Color| {
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .block(bordered(title.clone()))
            .wrap(Wrap { trim: true })
    };

    match production.view() {
        PlanView::NotLoaded => {
            f.render_widget(message("Press r to load.".to_string(), Color::DarkGray), area);
        }
        PlanView::Loading => {
            f.render_widget(message("Loading...".to_string(), Color::Cyan), area);
        }
        PlanView::Failed(error) => {
            f.render_widget(
                message(format!("Could not load the plan: {error}"), Color::Red),
                area,
            );
        }
        PlanView::NoProductionPossible => {
            f.render_widget(
                message(
                    "No production possible with the current stock.".to_string(),
                    Color::Yellow,
                ),
                area,
            );
        }
        PlanView::Table { items, total_value } => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(area);

            let rows = items.iter().map(|item| {
                Row::new(vec![
                    Cell::from(item.product_code.clone()),
                    Cell::from(item.product_name.clone()),
                    Cell::from(item.quantity.to_string()),
                    Cell::from(item.subtotal.to_string()),
                ])
            });
            let table = Table::new(
                rows,
                [
                    Constraint::Length(12),
                    Constraint::Percentage(50),
                    Constraint::Length(10),
                    Constraint::Length(14),
                ],
            )
            .header(header(&["Code", "Product", "Quantity", "Subtotal"]))
            .block(bordered(title.clone()));
            f.render_widget(table, chunks[0]);

            let total = Paragraph::new(Line::from(vec![
                Span::raw(" Total value: "),
                Span::styled(
                    total_value.to_string(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
            ]))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(total, chunks[1]);
        }
    }
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::raw(format!("  {label:<8} ")),
        Span::styled(format!("{value}{cursor}"), style),
    ])
}

fn render_product_dialog(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 80, 80);
    f.render_widget(Clear, area);

    let (title, creating) = match app.bench.modal() {
        Modal::Creating(_) => (" New Product ".to_string(), true),
        Modal::Editing(session) => {
            let label = app
                .bench
                .store()
                .product(session.product_id())
                .map(|p| format!(" {} ({}) ", p.name, p.code))
                .unwrap_or_else(|| format!(" Product {} ", session.product_id()));
            (label, false)
        }
        Modal::Idle => return,
    };
    let block = bordered(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // base fields
            Constraint::Min(3),    // composition
            Constraint::Length(3), // add line
            Constraint::Length(1), // hints
        ])
        .split(inner);

    let dialog = &app.dialog;
    let base: Vec<Line> = if creating {
        PRODUCT_FIELDS
            .iter()
            .enumerate()
            .map(|(i, label)| {
                field_line(
                    label,
                    &dialog.fields[i].value,
                    dialog.focus == DialogFocus::Field(i),
                )
            })
            .collect()
    } else {
        let product = app
            .bench
            .modal()
            .editing_product()
            .and_then(|id| app.bench.store().product(id));
        match product {
            Some(p) => vec![
                field_line("Code", &p.code, false),
                field_line("Name", &p.name, false),
                field_line("Value", &p.value.to_string(), false),
            ],
            None => vec![Line::from("  (product no longer listed)")],
        }
    };
    f.render_widget(Paragraph::new(base), chunks[0]);

    let busy = app.busy.is_some();
    let rows_focused = dialog.focus == DialogFocus::Rows;
    let rows = app.dialog_rows();
    let editing_row = app.bench.editor().and_then(|e| e.editing()).map(|e| e.row);
    let table_rows = rows.iter().enumerate().map(|(i, row)| {
        let name = row
            .raw_material_name
            .clone()
            .unwrap_or_else(|| format!("#{}", row.raw_material_id));
        let quantity = match (&dialog.row_edit, editing_row) {
            (Some(input), Some(r)) if r == i => format!("[{}_]", input.value),
            _ => row.quantity.to_string(),
        };
        Row::new(vec![
            Cell::from(row.raw_material_id.to_string()),
            Cell::from(name),
            Cell::from(quantity),
        ])
        .style(selected_style(rows_focused && i == dialog.row))
    });
    let composition_title = match (rows.is_empty(), busy) {
        (_, true) => " Composition (saving...) ".to_string(),
        (true, false) => " Composition (empty) ".to_string(),
        (false, false) => format!(" Composition ({}) ", rows.len()),
    };
    let table = Table::new(
        table_rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(60),
            Constraint::Length(16),
        ],
    )
    .header(header(&["ID", "Raw material", "Quantity"]))
    .block(bordered(composition_title));
    f.render_widget(table, chunks[1]);

    let materials = app.bench.store().materials();
    let choice = materials
        .items()
        .get(dialog.material)
        .map(|m| format!("< {} {} >", m.code, m.name))
        .unwrap_or_else(|| "(no raw materials)".to_string());
    let focus_style = |focused: bool| {
        if focused {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        }
    };
    let add_line = Line::from(vec![
        Span::raw(" Add: "),
        Span::styled(choice, focus_style(dialog.focus == DialogFocus::Material)),
        Span::raw("  Quantity: "),
        Span::styled(
            format!("{}_", dialog.quantity.value),
            focus_style(dialog.focus == DialogFocus::Quantity),
        ),
    ]);
    f.render_widget(
        Paragraph::new(add_line).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    let hints = if creating {
        " Tab:next field  e:edit row  d:remove row  Enter:add  Ctrl-S:create  Esc:cancel"
    } else {
        " Tab:next field  e:edit row  d:remove row  Enter:add  Esc:close"
    };
    f.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(Color::DarkGray))),
        chunks[3],
    );
}

fn render_material_form(f: &mut Frame, app: &App) {
    let Some(form) = &app.material_form else {
        return;
    };
    let area = centered(f.area(), 50, 30);
    f.render_widget(Clear, area);

    let title = match form.id {
        Some(id) => format!(" Edit Raw Material {id} "),
        None => " New Raw Material ".to_string(),
    };
    let mut lines: Vec<Line> = vec![Line::from("")];
    lines.extend(MATERIAL_FIELDS.iter().enumerate().map(|(i, label)| {
        field_line(label, &form.fields[i].value, form.focus == i)
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Enter:next/save  Ctrl-S:save  Esc:cancel",
        Style::default().fg(Color::DarkGray),
    )));

    f.render_widget(Paragraph::new(lines).block(bordered(title)), area);
}

fn render_confirm(f: &mut Frame, prompt: &str) {
    let area = centered(f.area(), 50, 20);
    f.render_widget(Clear, area);
    let text = vec![
        Line::from(""),
        Line::from(format!("  {prompt}")),
        Line::from(""),
        Line::from(Span::styled(
            "  y: confirm   any other key: cancel",
            Style::default().fg(Color::Yellow),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm ")
        .border_style(Style::default().fg(Color::Red));
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: false }), area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let section = |name: &'static str| {
        Line::from(vec![Span::styled(
            name,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )])
    };
    let text = vec![
        Line::from(""),
        section("  Navigation"),
        Line::from("    Tab/S-Tab Switch view"),
        Line::from("    j/Down    Move down"),
        Line::from("    k/Up      Move up"),
        Line::from("    Esc/q     Back / Quit"),
        Line::from(""),
        section("  Lists"),
        Line::from("    n         New raw material / product"),
        Line::from("    e/Enter   Edit selected"),
        Line::from("    d         Delete selected (asks first)"),
        Line::from("    r         Refresh (reloads the plan on the plan view)"),
        Line::from(""),
        section("  Product dialog"),
        Line::from("    Tab       Next field"),
        Line::from("    e         Edit the selected row's quantity (Enter saves, Esc cancels)"),
        Line::from("    d         Remove the selected row"),
        Line::from("    h/l       Choose the material to add"),
        Line::from("    Enter     Add the chosen material"),
        Line::from("    Ctrl-S    Create the product (new product dialog)"),
        Line::from(""),
        section("  Other"),
        Line::from("    ?         Show this help"),
        Line::from("    Ctrl-C    Quit"),
    ];

    f.render_widget(Paragraph::new(text).block(bordered(" Help ".to_string())), area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let message = match (&app.busy, &app.status) {
        (Some(label), _) => Span::styled(format!("{label}..."), Style::default().fg(Color::Cyan)),
        (None, Some(status)) if status.error => {
            Span::styled(status.text.clone(), Style::default().fg(Color::Red))
        }
        (None, Some(status)) => Span::styled(status.text.clone(), Style::default().fg(Color::Green)),
        (None, None) => Span::raw(""),
    };

    let bar = Line::from(vec![
        Span::styled(
            format!(" {} ", app.view.title()),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw("  "),
        message,
        Span::raw("  q:quit  ?:help  Tab:switch view"),
    ]);

    f.render_widget(Paragraph::new(bar), area);
}

/// A rectangle of the given percentage size centered in `area`.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
