mod app;

use std::io;
use std::time::Duration;

use app::{
    format_accuracy, format_latency, format_percent, format_time, truncate, AppState,
    ConnectionStatus, RightPane,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);
    app.refresh(&client).await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut market_table_state = TableState::default();

    let result = run_loop(&mut terminal, &mut app, &client, &mut market_table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
    market_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(2);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, market_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char('l') | KeyCode::Char('L') => {
                            app.right_pane = app.right_pane.toggle();
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.markets.len().saturating_sub(1);
                            let next = market_state.selected().map_or(0, |i| (i + 1).min(max));
                            market_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = market_state
                                .selected()
                                .map_or(0, |i| i.saturating_sub(1));
                            market_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, market_state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_body(f, app, market_state, chunks[1]);
    render_footer(f, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let white = Style::default().fg(Color::White);
    let spans = vec![
        Span::styled(
            " MoltVote  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(format!("{} markets", app.stats.active_markets), white),
        Span::raw("  │  "),
        Span::styled(format!("{} votes", app.stats.total_votes), white),
        Span::raw("  │  "),
        Span::styled(format!("{} agents", app.stats.total_agents), white),
        Span::raw("  │  "),
        Span::styled(format!("p99 {}", format_latency(app.latency.p99_ms)), white),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, market_state: &mut TableState, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_markets_table(f, app, market_state, halves[0]);
    match app.right_pane {
        RightPane::RecentVotes => render_votes_table(f, app, halves[1]),
        RightPane::Leaderboard => render_leaderboard(f, app, halves[1]),
    }
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).height(1)
}

fn titled_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_markets_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let rows: Vec<Row> = app
        .markets
        .iter()
        .map(|m| {
            let lean = if m.yes_percent > m.no_percent {
                Color::Green
            } else if m.yes_percent < m.no_percent {
                Color::Red
            } else {
                Color::White
            };
            let hot = if m.is_hot { "🔥" } else { "" };

            Row::new(vec![
                Cell::from(m.id.to_string()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&m.question, 40)),
                Cell::from(format_percent(m.yes_percent)).style(Style::default().fg(lean)),
                Cell::from(format_percent(m.no_percent)),
                Cell::from(m.total_votes.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(hot),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(3),
        ],
    )
    .header(header_row(&["#", "Question", "YES", "NO", "Votes", ""]))
    .block(titled_block(" MARKETS "))
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_votes_table(f: &mut Frame, app: &AppState, area: Rect) {
    let rows: Vec<Row> = app
        .recent_votes
        .iter()
        .map(|v| {
            let vote_color = if v.vote == "YES" { Color::Green } else { Color::Red };
            Row::new(vec![
                Cell::from(format_time(&v.created_at)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&v.agent_name, 14)),
                Cell::from(v.vote.clone()).style(Style::default().fg(vote_color)),
                Cell::from(truncate(&v.question, 30)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(4),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Time", "Agent", "Vote", "Question"]))
    .block(titled_block(" RECENT VOTES "));

    f.render_widget(table, area);
}

fn render_leaderboard(f: &mut Frame, app: &AppState, area: Rect) {
    let rows: Vec<Row> = app
        .leaderboard
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&a.name, 24)),
                Cell::from(a.total_votes.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_accuracy(a.accuracy)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(5),
        ],
    )
    .header(header_row(&["#", "Agent", "Votes", "Acc"]))
    .block(titled_block(" LEADERBOARD "));

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let line = Line::from(vec![
        Span::styled(" [q] ", key),
        Span::raw("quit  "),
        Span::styled("[r] ", key),
        Span::raw("refresh  "),
        Span::styled("[l] ", key),
        Span::raw("votes/leaderboard  "),
        Span::styled("[↑↓ / j k] ", key),
        Span::raw("scroll markets  "),
        Span::styled("auto-refresh: 2s", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::White)), area);
}
