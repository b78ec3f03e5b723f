use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};
use skipwatch_core::model::{BinStatus, Priority, Severity};
use skipwatch_core::predict::RiskLevel;

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    // Title / header
    let header = Paragraph::new("skipwatch – waste-bin fleet monitor")
        .block(Block::default().borders(Borders::ALL).title("Skipwatch"));
    frame.render_widget(header, *header_area);

    // Main screen
    match app.screen {
        Screen::Overview => draw_overview(frame, app, *content_area),
        Screen::Alerts => draw_alerts(frame, app, *content_area),
        Screen::Route => draw_route(frame, app, *content_area),
        Screen::Forecast => draw_forecast(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::Overview => {
            "↑/↓ select bin · Enter forecast · Tab/→ next view · r refresh · q/Ctrl-C quit"
        }
        Screen::Alerts | Screen::Route => {
            "Esc/←/b back · Tab/→ next view · r refresh · q/Ctrl-C quit"
        }
        Screen::Forecast => "Esc/←/b back to overview · Tab/→ next view · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text.to_owned())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_overview(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // bin table
            Constraint::Length(3), // fleet stats
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [table_area, stats_area] = chunks else {
        return;
    };

    let rows = app.bins.iter().enumerate().map(|(index, bin)| {
        let marker = if index == app.bin_list_index { "> " } else { "  " };

        let mut style = Style::default().fg(status_color(bin.status));
        if index == app.bin_list_index {
            style = style.add_modifier(Modifier::BOLD);
        }

        Row::new(vec![
            Cell::from(format!("{marker}{}", bin.id)),
            Cell::from(bin.waste_type.label()),
            Cell::from(format!("{:>3}%", bin.fill_level)),
            Cell::from(format!("{:>2}", bin.hazard_score)),
            Cell::from(bin.status.to_string()),
            Cell::from(priority_label(bin.priority)),
            Cell::from(format!("{:.2}", bin.priority_score)),
            Cell::from(bin.location.clone()),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(10),
        Constraint::Length(14),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Min(16),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec![
                "Bin", "Type", "Fill", "Hz", "Status", "Priority", "Score", "Location",
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Fleet (sorted by priority)"),
        )
        .column_spacing(1);

    frame.render_widget(table, *table_area);

    let stats_line = app.stats.as_ref().map_or_else(
        || "No stats yet - press r to refresh".to_owned(),
        |stats| {
            format!(
                "{} bins ({} active) · avg fill {:.1}% · {} high priority · {} critical · {} alerts",
                stats.total_bins,
                stats.active_bins,
                stats.average_fill,
                stats.high_priority_count,
                stats.critical_count,
                app.alerts.len(),
            )
        },
    );

    let stats_widget = Paragraph::new(stats_line)
        .block(Block::default().borders(Borders::ALL).title("Fleet stats"))
        .wrap(Wrap { trim: true });
    frame.render_widget(stats_widget, *stats_area);
}

fn draw_alerts(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = if app.alerts.is_empty() {
        vec![ListItem::new("No active alerts. The fleet is behaving.")]
    } else {
        app.alerts
            .iter()
            .map(|alert| {
                let line = format!(
                    "[{}] {} – {}",
                    severity_label(alert.severity),
                    alert.location,
                    alert.message
                );
                ListItem::new(line).style(Style::default().fg(severity_color(alert.severity)))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Active alerts (Esc/← back)"),
    );

    let mut state = ListState::default();
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_route(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Collection route (Esc/← back)";

    let Some(plan) = &app.plan else {
        let paragraph = Paragraph::new("No route planned yet - press r to refresh.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    if plan.route.is_empty() {
        let paragraph = Paragraph::new("No bins currently need collection.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = plan.route.iter().map(|stop| {
        let style = if stop.priority_score > 0.7 {
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(format!("{:>2}", stop.stop_number)),
            Cell::from(stop.bin_id.0.clone()),
            Cell::from(stop.location.clone()),
            Cell::from(format!("{:>3}%", stop.fill_level)),
            Cell::from(format!("{:.2}", stop.priority_score)),
            Cell::from(format!("{:.1} km", stop.distance_from_previous)),
            Cell::from(format!("{:>2} min", stop.travel_time_minutes)),
            Cell::from(stop.estimated_arrival.format("%H:%M").to_string()),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(3),
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(6),
    ];

    let summary = &plan.summary;
    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec![
                "#", "Bin", "Location", "Fill", "Score", "Dist", "Travel", "ETA",
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{title} · {} stops · {:.1} km · {} min · {:.0}% fuel saved",
            summary.total_stops,
            summary.total_distance_km,
            summary.estimated_time_minutes,
            summary.fuel_savings_percent
        )))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_forecast(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Overflow forecast (Esc/← back)";

    let Some(forecast) = &app.forecast else {
        let paragraph =
            Paragraph::new("Select a bin on the overview and press Enter to load a forecast.")
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let predictions = &forecast.predictions;
    let risk = &forecast.risk_assessment;

    let mut lines = vec![
        Line::from(format!("Bin {}", forecast.bin_id)),
        Line::from(""),
        Line::from(format!(
            "Fill rate:        {:.2} %/day",
            predictions.daily_fill_rate_percent
        )),
        Line::from(format!(
            "Hours to 80%:     {:.1}",
            predictions.hours_to_80_percent
        )),
        Line::from(format!(
            "Hours to 90%:     {:.1}",
            predictions.hours_to_90_percent
        )),
        Line::from(format!("Hours to full:    {:.1}", predictions.hours_to_full)),
        Line::from(format!(
            "Collect by:       {}",
            predictions
                .predicted_collection_date
                .format("%Y-%m-%d %H:%M")
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw(format!("Risk {:.3} ", risk.overall_risk_score)),
            Span::styled(
                risk_label(risk.risk_level),
                Style::default()
                    .fg(risk_color(risk.risk_level))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];
    for recommendation in &risk.recommendations {
        lines.push(Line::from(format!("• {recommendation}")));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn status_color(status: BinStatus) -> Color {
    match status {
        BinStatus::Normal => Color::Green,
        BinStatus::Warning => Color::Yellow,
        BinStatus::Alert => Color::LightRed,
        BinStatus::Critical => Color::Red,
        BinStatus::Offline => Color::DarkGray,
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "HIGH",
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "high",
        Severity::Critical => "CRITICAL",
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Yellow,
        Severity::Critical => Color::Red,
    }
}

fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "HIGH",
        RiskLevel::Medium => "medium",
        RiskLevel::Low => "low",
    }
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::High => Color::Red,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::Low => Color::Green,
    }
}
