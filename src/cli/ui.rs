use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::aggregate;
use crate::model::category;

use super::state::{App, FormFocus, Tab};
use super::util::{fmt_date, fmt_money};

/// Chart palette, indexed by registry position; values outside the registry
/// fall back to gray.
const PALETTE: [Color; 7] = [
    Color::Yellow,
    Color::Blue,
    Color::Green,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
    Color::White,
];

pub fn draw(f: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(1)])
        .split(f.size());

    let titles = ["Expenses", "Help"]
        .into_iter()
        .map(|t| Line::from(Span::raw(t)))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(match app.tab {
            Tab::Expenses => 0,
            Tab::Help => 1,
        })
        .block(Block::default().borders(Borders::ALL).title("SpendWise"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Expenses => draw_expenses(f, root[1], app),
        Tab::Help => draw_help(f, root[1]),
    }

    let status = Paragraph::new(app.status.clone());
    f.render_widget(status, root[2]);

    if app.form.is_open() {
        let area = center_rect(root[1], 64, 16);
        f.render_widget(Clear, area);
        draw_form_modal(f, area, app);
    }

    if app.confirm_delete.is_some() {
        let area = center_rect(root[1], 50, 7);
        f.render_widget(Clear, area);
        draw_confirm_modal(f, area, app);
    }
}

// Expenses page

fn draw_expenses(f: &mut Frame, area: Rect, app: &mut App) {
    if app.rows.is_empty() {
        let welcome = Paragraph::new(
            "Welcome to SpendWise!\n\nYou haven't added any expenses yet.\nPress n to add your first expense.",
        )
        .block(Block::default().borders(Borders::ALL).title("Spending Overview"));
        f.render_widget(welcome, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(6)])
        .split(area);

    let overview = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[0]);

    draw_chart(f, overview[0], app);
    draw_totals(f, overview[1], app);
    draw_table(f, chunks[1], app);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    let totals = aggregate::aggregate(&app.rows);

    // Registry order first, then whatever stale values remain.
    let mut entries: Vec<(&str, &Decimal)> = Vec::with_capacity(totals.len());
    for cat in &category::CATEGORIES {
        if let Some(total) = totals.get(cat.value) {
            entries.push((cat.value, total));
        }
    }
    for (value, total) in &totals {
        if category::position(value).is_none() {
            entries.push((value.as_str(), total));
        }
    }

    let bars: Vec<Bar> = entries
        .iter()
        .map(|&(value, total)| {
            let color = category::position(value)
                .map(|i| PALETTE[i % PALETTE.len()])
                .unwrap_or(Color::DarkGray);
            Bar::default()
                .label(Line::from(category::label_for(value)))
                .value(cents(total))
                .text_value(fmt_money(*total))
                .style(Style::default().fg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Spending Overview"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(1);
    f.render_widget(chart, area);
}

fn cents(total: &Decimal) -> u64 {
    (*total * Decimal::from(100)).round().to_u64().unwrap_or(0)
}

fn draw_totals(f: &mut Frame, area: Rect, app: &App) {
    let count = app.rows.len();
    let total = aggregate::grand_total(&app.rows);
    let body = format!(
        "{}\n\nAcross {} transaction{}",
        fmt_money(total),
        count,
        if count == 1 { "" } else { "s" },
    );
    let p = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title("Total Spending"));
    f.render_widget(p, area);
}

fn draw_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(vec!["Date", "Category", "Notes", "Amount"]).height(1);

    let body: Vec<Row> = app
        .rows
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(fmt_date(&e.date)),
                Cell::from(category::label_for(&e.category)),
                Cell::from(e.notes.clone()),
                Cell::from(fmt_money(e.amount)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Percentage(55),
        Constraint::Length(12),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recent Expenses  (Up/Down, e=edit, x=delete)"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.tsel);
}

// Expense form modal

fn draw_form_modal(f: &mut Frame, area: Rect, app: &App) {
    let active = |focus: FormFocus| app.focus == focus;
    let marker = |focus: FormFocus| {
        if app.focus == focus {
            if app.editing { "  <editing>" } else { "  <focus>" }
        } else {
            ""
        }
    };

    let selected_category = app
        .cat_index
        .and_then(|i| category::CATEGORIES.get(i))
        .map(|c| format!("{} ({})", c.label, c.icon))
        .unwrap_or_else(|| "<none>".to_string());

    let mut lines = vec![
        format!(
            "Amount  : {}{}",
            app.edits.amount.rendered(active(FormFocus::Amount) && app.editing),
            marker(FormFocus::Amount)
        ),
        format!(
            "Date    : {}{}",
            app.edits.date.rendered(active(FormFocus::Date) && app.editing),
            marker(FormFocus::Date)
        ),
        format!(
            "Category: {}{}{}",
            selected_category,
            marker(FormFocus::Category),
            if active(FormFocus::Category) { " (Up/Down to choose)" } else { "" }
        ),
        format!(
            "Notes   : {}{}",
            app.edits.notes.rendered(active(FormFocus::Notes) && app.editing),
            marker(FormFocus::Notes)
        ),
        format!(
            "Receipt : {}{}",
            app.edits.receipt.rendered(active(FormFocus::Receipt) && app.editing),
            marker(FormFocus::Receipt)
        ),
        String::new(),
        "Tab: next field | Enter: edit | Ctrl+s: save | Esc: cancel".to_string(),
        "Ctrl+r: scan receipt | Ctrl+g: suggest category".to_string(),
    ];

    if !app.form_errors.is_empty() {
        lines.push(String::new());
        for err in &app.form_errors {
            lines.push(format!("! {err}"));
        }
    }

    let title = if app.form.assist_in_flight() {
        format!("{} (assist running…)", app.form_title())
    } else {
        app.form_title().to_string()
    };

    let p = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn draw_confirm_modal(f: &mut Frame, area: Rect, app: &App) {
    let notes = app
        .confirm_delete
        .and_then(|id| app.repo.get(id))
        .map(|e| e.notes.clone())
        .unwrap_or_default();

    let body = format!(
        "This will permanently delete this expense\nfrom your records:\n\n  {notes}\n\ny: delete | n/Esc: cancel"
    );
    let p = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title("Are you sure?"));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        "Global Keys:",
        "  q        : Quit (outside the form)",
        "  ?        : Open this Help tab",
        "",
        "Expenses Tab:",
        "  Up/Down  : Navigate the list",
        "  n        : Add a new expense",
        "  e/Enter  : Edit the selected expense",
        "  x/Del    : Delete the selected expense (asks to confirm)",
        "  r        : Reload the list",
        "",
        "Expense Form:",
        "  Tab      : Cycle through fields",
        "  Enter    : Enter/exit edit mode on the focused field",
        "  Up/Down  : Choose a category (when Category is focused)",
        "  Ctrl+s   : Save the expense",
        "  Ctrl+r   : Analyze the receipt image at the Receipt path",
        "  Ctrl+g   : Suggest a category from the notes",
        "  Esc      : Cancel",
        "",
        "AI assist pre-fills fields only; nothing is saved until Ctrl+s.",
    ]
    .join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect { x, y, width: w.min(rect.width), height: h.min(rect.height) }
}
