use anyhow::{Context, Result};
use clap::Parser;
use office_core::{
    ElementKind, EngineConfig, OfficeEngine, OfficeState, Position, Tile,
    engine::DEFAULT_INTERACTION_RANGE,
    pilot::{self, Pilot, RandomWalker, RouteToElement, elements_in_range},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Blueprint file to build the office from (built-in office if omitted)
    #[arg(short, long, value_name = "BLUEPRINT_FILE")]
    layout: Option<PathBuf>,

    /// Manhattan distance within which elements can be used
    #[arg(short, long, default_value_t = DEFAULT_INTERACTION_RANGE)]
    range: usize,

    /// Write logs to this file
    #[arg(long, value_name = "LOG_FILE")]
    log: Option<PathBuf>,

    /// Seed for the wander autopilot
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Initialize the office, print its state as JSON and exit
    #[arg(long)]
    dump: bool,
}

/// What is currently steering the character, if anything.
enum Autopilot {
    Wander(RandomWalker),
    Route(RouteToElement),
}

struct App {
    /// The office engine; the only source of truth.
    engine: OfficeEngine,
    /// Snapshot fetched after the last command.
    office: Option<OfficeState>,
    /// Index into the snapshot's elements.
    selected: usize,
    /// Result of the last command, shown to the user.
    status: String,
    autopilot: Option<Autopilot>,
    seed: u64,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(engine: OfficeEngine, seed: u64) -> Result<Self> {
        engine.initialize().context("Failed to initialize office")?;
        let mut app = App {
            engine,
            office: None,
            selected: 0,
            status: "Welcome to the office.".to_string(),
            autopilot: None,
            seed,
            should_quit: false,
        };
        app.refresh();
        Ok(app)
    }

    /// Re-fetches the snapshot from the engine.
    fn refresh(&mut self) {
        match self.engine.get_state() {
            Ok(office) => {
                if self.selected >= office.elements.len() {
                    self.selected = 0;
                }
                self.office = Some(office);
            }
            Err(err) => {
                warn!(%err, "failed to fetch office state");
                self.status = err.to_string();
            }
        }
    }

    fn selected_element_id(&self) -> Option<String> {
        self.office
            .as_ref()?
            .elements
            .get(self.selected)
            .map(|element| element.id.clone())
    }

    /// Moves one tile, turning the direction into an absolute target first.
    fn step(&mut self, direction: pilot::Direction) {
        let Some(office) = &self.office else {
            return;
        };
        let Some(target) = direction.step(office.character_position) else {
            self.status = "You can't leave the office that way.".to_string();
            return;
        };
        match self.engine.move_character(target.x, target.y) {
            Ok(()) => self.status.clear(),
            Err(err) => self.status = err.to_string(),
        }
        self.refresh();
    }

    fn interact_selected(&mut self) {
        let Some(id) = self.selected_element_id() else {
            self.status = "There is nothing here to use.".to_string();
            return;
        };
        self.status = match self.engine.interact_with_element(&id) {
            Ok(description) => description,
            Err(err) => err.to_string(),
        };
        self.refresh();
    }

    fn cycle_selection(&mut self) {
        if let Some(office) = &self.office {
            if !office.elements.is_empty() {
                self.selected = (self.selected + 1) % office.elements.len();
            }
        }
    }

    /// Selects the nearest element the character can use right now.
    fn select_nearest(&mut self) {
        let Some(office) = &self.office else {
            return;
        };
        let range = self.engine.config().interaction_range;
        let nearest = elements_in_range(office, range)
            .first()
            .and_then(|element| office.elements.iter().position(|e| e.id == element.id));
        match nearest {
            Some(index) => self.selected = index,
            None => self.status = "Nothing within reach.".to_string(),
        }
    }

    fn reinitialize(&mut self) {
        self.autopilot = None;
        self.status = match self.engine.initialize() {
            Ok(()) => "The office has been reset.".to_string(),
            Err(err) => err.to_string(),
        };
        self.refresh();
    }

    fn toggle_wander(&mut self) {
        self.autopilot = match self.autopilot {
            Some(Autopilot::Wander(_)) => None,
            _ => Some(Autopilot::Wander(RandomWalker::new(self.seed))),
        };
    }

    fn route_to_selected(&mut self) {
        if let Some(id) = self.selected_element_id() {
            let range = self.engine.config().interaction_range;
            self.status = format!("Walking to {id}.");
            self.autopilot = Some(Autopilot::Route(RouteToElement::new(id, range)));
        }
    }

    /// Handles one step of the autopilot, if one is engaged.
    fn tick(&mut self) {
        let (Some(autopilot), Some(office)) = (&mut self.autopilot, &self.office) else {
            return;
        };
        let next = match autopilot {
            Autopilot::Wander(walker) => walker.next_direction(office),
            Autopilot::Route(route) => {
                let next = route.next_direction(office);
                if next.is_none() {
                    self.status = if route.arrived(office) {
                        format!("Arrived at {}.", route.target())
                    } else {
                        format!("No way to reach {}.", route.target())
                    };
                    self.autopilot = None;
                }
                next
            }
        };
        if let Some(direction) = next {
            self.step(direction);
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_tracing(args.log.as_ref(), args.dump)?;

    let blueprint = match &args.layout {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read blueprint file: {}", path.display()))?,
        None => EngineConfig::default().blueprint,
    };
    let engine = OfficeEngine::new(EngineConfig {
        blueprint,
        interaction_range: args.range,
    });

    if args.dump {
        engine.initialize().context("Failed to initialize office")?;
        let office = engine.get_state()?;
        println!("{}", serde_json::to_string_pretty(&office)?);
        return Ok(());
    }

    // Create the application state before touching the terminal
    let mut app = App::new(engine, args.seed)?;
    info!("=== Office TUI Startup ===");

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Installs the tracing subscriber.
///
/// The UI owns the terminal, so logs only go to `--log` unless dumping state.
fn init_tracing(log_file: Option<&PathBuf>, dump: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .compact()
                .init();
        }
        None if dump => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .compact()
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?; // Use alternate screen and enable mouse capture
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
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
    let tick_rate = Duration::from_millis(200); // Autopilot step rate
    let mut last_tick = Instant::now();

    loop {
        // Draw the UI
        terminal.draw(|f| ui(f, app))?;

        // Calculate timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        // Poll for keyboard events
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code);
                }
            }
        }

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

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Up | KeyCode::Char('w') => app.step(pilot::Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => app.step(pilot::Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => app.step(pilot::Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => app.step(pilot::Direction::Right),
        KeyCode::Tab => app.cycle_selection(),
        KeyCode::Char('n') => app.select_nearest(),
        KeyCode::Enter | KeyCode::Char('e') => app.interact_selected(),
        KeyCode::Char('r') => app.reinitialize(),
        KeyCode::Char('p') => app.toggle_wander(),
        KeyCode::Char('g') => app.route_to_selected(),
        _ => {}
    }
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Map and element list
            Constraint::Length(3), // Status line
            Constraint::Length(2), // Help
        ])
        .split(frame.area());
    let top_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main_layout[0]);

    if let Some(office) = &app.office {
        render_map(frame, top_layout[0], office, app.selected);
        render_elements(
            frame,
            top_layout[1],
            office,
            app.selected,
            app.engine.config().interaction_range,
        );
    }

    let mode = match app.autopilot {
        Some(Autopilot::Wander(_)) => " [wandering]",
        Some(Autopilot::Route(_)) => " [walking]",
        None => "",
    };
    let status = Paragraph::new(format!("{}{}", app.status, mode))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, main_layout[1]);

    let help_text = Paragraph::new(
        "Arrows/WASD move | Tab select | n nearest | Enter use | g go to | p wander | r reset | q quit",
    )
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn element_span(kind: ElementKind, selected: bool) -> Span<'static> {
    let (glyph, color) = match kind {
        ElementKind::Desk => ("D", Color::Yellow),
        ElementKind::Chair => ("h", Color::Magenta),
        ElementKind::Plant => ("*", Color::Green),
        ElementKind::Computer => ("C", Color::Cyan),
    };
    let style = Style::default().fg(color);
    let style = if selected { style.reversed() } else { style };
    Span::styled(glyph, style)
}

/// Lists every element with its distance from the character.
fn render_elements(frame: &mut Frame, area: Rect, office: &OfficeState, selected: usize, range: usize) {
    let items: Vec<ListItem> = office
        .elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let distance = element
                .position
                .manhattan_distance(&office.character_position);
            let reach = if distance <= range { "in reach" } else { "" };
            let mut spans = vec![
                element_span(element.kind, index == selected),
                Span::raw(format!(
                    " {} ({}, {}) {}",
                    element.name, element.position.x, element.position.y, reach
                )),
            ];
            if index == selected {
                spans.push(Span::styled(" <", Style::default().bold()));
            }
            ListItem::from(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Elements"));
    frame.render_widget(list, area);
}

/// Renders the office grid onto the frame.
fn render_map(frame: &mut Frame, area: Rect, office: &OfficeState, selected: usize) {
    let mut lines: Vec<Line> = Vec::with_capacity(office.height());

    for y in 0..office.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(office.width());
        for x in 0..office.width() {
            let position = Position { x, y };
            if office.character_position == position {
                spans.push(Span::styled("@", Style::default().fg(Color::Red).bold()));
                continue;
            }

            let element = office
                .elements
                .iter()
                .enumerate()
                .find(|(_, element)| element.position == position);
            if let Some((index, element)) = element {
                spans.push(element_span(element.kind, index == selected));
                continue;
            }

            let span = match office.tile_at(position) {
                Some(Tile::Wall) => Span::styled("#", Style::default().fg(Color::DarkGray)),
                // Furniture without a placed element is drawn as plain floor
                _ => Span::raw("."),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Office").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
