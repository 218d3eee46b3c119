use blackjack::{calculate_hand_value, is_blackjack, is_busted, is_soft_hand, Rank};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use shoe_advisor::{MirrorState, Move, Slot, TurnSession, MAX_DECKS};

use crate::app::{App, CardStyle, Overlay, Phase};

pub fn ui(f: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),  // Title bar
                Constraint::Min(10),    // Table
                Constraint::Length(3),  // Status bar
            ]
            .as_ref(),
        )
        .split(f.area());

    let mirror = app.controller.mirror();
    let title_text = match app.phase {
        Phase::Setup => "Shoe Advisor".to_string(),
        Phase::Table => format!(
            "Shoe Advisor - {} deck(s), {}",
            mirror.num_decks(),
            app.style.name()
        ),
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, main_chunks[0]);

    let (table_area, log_area) = if app.log_visible {
        let main_horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
            .split(main_chunks[1]);
        (main_horizontal[0], Some(main_horizontal[1]))
    } else {
        (main_chunks[1], None)
    };

    match app.phase {
        Phase::Setup => draw_setup(f, app, table_area, " New Shoe "),
        Phase::Table => draw_table(f, app, table_area),
    }

    if let Some(log_area) = log_area {
        draw_logs(f, app, log_area);
    }

    let status_bar = Paragraph::new(app.status.as_str())
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status_bar, main_chunks[2]);

    match app.overlay {
        Overlay::None => {}
        Overlay::Settings => {
            let area = centered_rect(50, 50, f.area());
            f.render_widget(Clear, area);
            draw_setup(f, app, area, " Settings - [Enter] reshuffle, [Esc] close ");
        }
        Overlay::Help => {
            let area = centered_rect(60, 70, f.area());
            f.render_widget(Clear, area);
            draw_help(f, area);
        }
    }
}

fn card_span(rank: Option<Rank>, style: CardStyle, focused: bool) -> Span<'static> {
    let text = match rank {
        Some(rank) => format!("{}{}", rank.symbol(), style.suit()),
        None => "__".to_string(),
    };
    let mut card_style = match rank {
        Some(_) => Style::default().fg(style.color()).bg(Color::Gray),
        None => Style::default().fg(Color::DarkGray),
    };
    if focused {
        card_style = card_style
            .add_modifier(Modifier::REVERSED)
            .add_modifier(Modifier::BOLD);
    }
    Span::styled(format!(" {text} "), card_style)
}

fn total_label(cards: &[Rank]) -> String {
    if cards.is_empty() {
        return String::new();
    }
    if is_blackjack(cards) {
        return " (Blackjack)".to_string();
    }
    let total = calculate_hand_value(cards);
    if is_busted(cards) {
        format!(" ({total}, bust)")
    } else if is_soft_hand(cards) {
        format!(" (soft {total})")
    } else {
        format!(" ({total})")
    }
}

fn draw_table(f: &mut Frame, app: &App, area: Rect) {
    let session = app.controller.session();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Dealer
                Constraint::Length(3), // Player
                Constraint::Length(4), // Seen
                Constraint::Length(5), // Picker and remaining counts
                Constraint::Min(5),    // Advice
            ]
            .as_ref(),
        )
        .split(area);

    let mut dealer: Vec<Span> = vec![card_span(
        session.dealer_upcard,
        app.style,
        app.focus == Slot::Dealer,
    )];
    dealer.extend(
        session
            .dealer_extra
            .iter()
            .enumerate()
            .map(|(i, r)| card_span(*r, app.style, app.focus == Slot::DealerExtra(i))),
    );
    let dealer_block = Paragraph::new(Line::from(dealer)).block(
        Block::default()
            .title(format!(" Dealer{} ", total_label(&session.dealer_cards())))
            .borders(Borders::ALL),
    );
    f.render_widget(dealer_block, rows[0]);

    let player: Vec<Span> = session
        .player_hand
        .iter()
        .enumerate()
        .map(|(i, r)| card_span(*r, app.style, app.focus == Slot::Player(i)))
        .collect();
    let player_block = Paragraph::new(Line::from(player)).block(
        Block::default()
            .title(format!(" Player{} ", total_label(&session.player_cards())))
            .borders(Borders::ALL),
    );
    f.render_widget(player_block, rows[1]);

    let mut seen: Vec<Span> = session
        .seen_cards
        .iter()
        .enumerate()
        .map(|(i, r)| card_span(Some(*r), app.style, app.focus == Slot::Seen(i)))
        .collect();
    seen.push(card_span(
        None,
        app.style,
        app.focus == Slot::Seen(session.seen_cards.len()),
    ));
    let seen_block = Paragraph::new(Line::from(seen))
        .block(Block::default().title(" Seen ").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(seen_block, rows[2]);

    draw_shoe(f, app, rows[3]);
    draw_advice(f, app, &session, rows[4]);
}

fn draw_shoe(f: &mut Frame, app: &App, area: Rect) {
    let remaining = app.controller.remaining();
    let mirror = app.controller.mirror();

    let picker: Vec<Span> = Rank::ALL
        .iter()
        .map(|rank| {
            let left = remaining.count(*rank);
            let mut style = if left == 0 {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            if rank.index() == app.picker {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Span::styled(format!(" {:>2} ", rank.symbol()), style)
        })
        .collect();

    let counts: Vec<Span> = Rank::ALL
        .iter()
        .map(|rank| Span::raw(format!(" {:>2} ", remaining.count(*rank))))
        .collect();

    let (marker, marker_color) = match mirror.state() {
        MirrorState::Provisional { .. } => ("provisional", Color::Yellow),
        MirrorState::Synced { .. } => ("synced", Color::Green),
    };
    let summary = Line::from(vec![
        Span::raw(format!(" {} cards left ", remaining.total())),
        Span::styled(format!("[{marker}]"), Style::default().fg(marker_color)),
    ]);

    let shoe_block = Paragraph::new(vec![Line::from(picker), Line::from(counts), summary])
        .block(Block::default().title(" Shoe ").borders(Borders::ALL));
    f.render_widget(shoe_block, area);
}

fn draw_advice(f: &mut Frame, app: &App, session: &TurnSession, area: Rect) {
    let lines: Vec<Line> = if session.busy {
        vec![Line::from(Span::styled(
            "Calculating...",
            Style::default().fg(Color::Yellow),
        ))]
    } else if let Some(advice) = &session.last_advice {
        let move_color = match advice.recommended {
            Move::Hit => Color::Green,
            Move::Stand => Color::Cyan,
        };
        vec![
            Line::from(vec![
                Span::raw("Move: "),
                Span::styled(
                    advice.recommended.to_string(),
                    Style::default().fg(move_color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(format!("Win:  {}", advice.win_display)),
            Line::from(format!("Loss: {}", advice.loss_display)),
            Line::from(Span::styled(
                "[n] next turn once the dealer's hand is in",
                Style::default().fg(Color::DarkGray),
            )),
        ]
    } else if app.controller.can_request_advice() {
        vec![Line::from("[c] get advice")]
    } else {
        vec![Line::from(Span::styled(
            "You need at least two cards and a dealer card to calculate",
            Style::default().fg(Color::DarkGray),
        ))]
    };

    let advice_block = Paragraph::new(lines)
        .block(Block::default().title(" Advice ").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(advice_block, area);
}

fn draw_setup(f: &mut Frame, app: &App, area: Rect, title: &str) {
    let highlight = Style::default()
        .fg(app.style.color())
        .bg(Color::Gray)
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Decks:  "),
            Span::styled(format!(" {} ", app.decks), highlight),
            Span::styled(format!("  (1-{MAX_DECKS}, ↑/↓)"), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("Style:  "),
            Span::styled(format!(" {} {} ", app.style.suit(), app.style.name()), highlight),
            Span::styled("  (←/→)", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    let block = Paragraph::new(lines)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(block, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let keys = [
        ("a 2-9 t/0 j q k", "place that rank in the focused slot"),
        ("←/→ then space", "place the rank under the picker"),
        ("Tab/↑/↓", "move between slots"),
        ("x", "remove the focused card"),
        ("+ / d", "add a player / dealer slot"),
        ("Enter or c", "get advice"),
        ("n", "next turn (after advice)"),
        ("s", "settings and reshuffle"),
        ("l", "toggle the log"),
        ("Esc", "quit"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>16}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help - any key to close ")
            .borders(Borders::ALL),
    );
    f.render_widget(help, area);
}

fn draw_logs(f: &mut Frame, app: &App, area: Rect) {
    let log_frame_height = area.height.saturating_sub(2) as usize; // Subtract borders
    let log_start_idx = app.logs.len().saturating_sub(log_frame_height);

    let log_lines: Vec<Line> = app
        .logs
        .iter()
        .skip(log_start_idx)
        .map(|log| {
            Line::from(vec![
                Span::styled("• ", Style::default().fg(Color::DarkGray)),
                Span::raw(log.clone()),
            ])
        })
        .collect();

    let logs_widget = Paragraph::new(log_lines)
        .block(
            Block::default()
                .title(" Log ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    f.render_widget(logs_widget, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
