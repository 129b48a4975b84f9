use anyhow::Result;
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use task_world_core::{
    Position, agent::Agent, episode::Episode, grid::Grid, search::SearchStrategy,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load instead of generating a random episode
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long, default_value_t = 22)]
    columns: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 17)]
    rows: usize,

    /// Number of barrier cells to scatter
    #[arg(long, default_value_t = 15)]
    barriers: usize,

    /// Number of tasks to scatter
    #[arg(long, default_value_t = 10)]
    tasks: usize,

    /// Seed for the episode layout; random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

struct App {
    /// The core simulation episode.
    episode: Episode,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let grid = match &args.map {
            Some(path) => {
                let map_string = std::fs::read_to_string(path)?;
                Grid::from_ascii(&map_string)?
            }
            None => {
                let seed = args.seed.unwrap_or_else(rand::random);
                let mut rng = StdRng::seed_from_u64(seed);
                Grid::generate(args.columns, args.rows, args.barriers, args.tasks, &mut rng)
            }
        };

        Ok(App {
            episode: Episode::new(grid),
            should_quit: false,
        })
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        self.episode.tick();
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(map_file) = &args.map {
        if !map_file.exists() {
            return Err(anyhow::anyhow!(
                "Map file does not exist: {}",
                map_file.display()
            ));
        }
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Create the application state
    let mut app = App::new(&args)?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(100); // One simulation step per tick
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        // Poll for events (keyboard, mouse, etc.)
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('a') => app.episode.activate(SearchStrategy::AStar),
                    KeyCode::Char('u') => app.episode.activate(SearchStrategy::Ucs),
                    KeyCode::Char('r') => app.episode.reset(),
                    _ => {}
                }
            }
        }

        // Update application state if enough time has passed
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        // Exit loop if requested
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60), // Area for the grid
            Constraint::Percentage(30), // Area for the agent status panel
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    render_grid(frame, main_layout[0], &app.episode);
    render_status(frame, main_layout[1], &app.episode);

    let help_text =
        Paragraph::new("a: run A*   u: run UCS   r: reset   q: quit")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the grid: barriers, remaining tasks, and the active agent.
fn render_grid(frame: &mut Frame, area: Rect, episode: &Episode) {
    let grid = episode.grid();
    let agent_cell = episode.active_agent().map(Agent::position);

    let mut lines: Vec<Line> = Vec::with_capacity(grid.rows());
    for y in 0..grid.rows() {
        let mut spans: Vec<Span> = Vec::with_capacity(grid.columns());
        for x in 0..grid.columns() {
            let cell = Position::new(x, y);
            let span = if agent_cell == Some(cell) {
                Span::styled("@", Style::default().fg(Color::Blue).bold())
            } else if let Some(id) = grid.task_at(cell) {
                // One glyph per cell; ids ten and up show their last digit.
                let digit = char::from_digit((id % 10) as u32, 10).unwrap_or('?');
                Span::styled(digit.to_string(), Style::default().fg(Color::Red))
            } else if grid.is_barrier(cell) {
                Span::styled("#", Style::default().fg(Color::DarkGray))
            } else {
                Span::styled(".", Style::default().fg(Color::Gray))
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let title = match episode.active() {
        Some(strategy) if episode.solved() => format!("Task World - {} (solved)", strategy.name()),
        Some(strategy) => format!("Task World - {}", strategy.name()),
        None => "Task World - press 'a' or 'u' to start".to_string(),
    };
    let grid_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(grid_paragraph, area);
}

/// Renders one status line set per agent: algorithm, progress, and the
/// per-task cost ledger.
fn render_status(frame: &mut Frame, area: Rect, episode: &Episode) {
    let mut items: Vec<ListItem> = Vec::new();

    for strategy in [SearchStrategy::AStar, SearchStrategy::Ucs] {
        let agent = episode.agent(strategy);
        let marker = if episode.active() == Some(strategy) {
            "> "
        } else {
            "  "
        };

        let ledger = agent
            .completed()
            .iter()
            .map(|(id, cost)| format!("{id} (cost {cost})"))
            .collect::<Vec<_>>()
            .join(", ");

        let position = agent.position();
        items.push(ListItem::from(vec![
            Line::from(Span::styled(
                format!(
                    "{marker}{} | tasks completed: {}, position: ({}, {})",
                    strategy.name(),
                    agent.tasks_completed(),
                    position.x,
                    position.y
                ),
                Style::default().bold(),
            )),
            Line::from(format!("    completed: {ledger}")),
            Line::from(format!("    total path cost: {}", agent.total_cost())),
        ]));
    }

    let status_widget =
        List::new(items).block(Block::default().borders(Borders::ALL).title("Agents"));
    frame.render_widget(status_widget, area);
}
