use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use std::{fs, io};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
  DefaultTerminal, Frame,
  buffer::Buffer,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style, Stylize},
  text::Line,
  widgets::{Block, Padding, Paragraph, Widget},
};
use ratatui_macros::{horizontal, vertical};
use serde::Deserialize;
use solvegrid::{
  Cell, Dimensions, EntryClue, EntryId, Event as SolveEvent, EventEnvelope, InitArgs, PositionId,
  PositionValue, Precedence, ProgressSnapshot, ProgressStore, Registry, SolverState, ValueMetadata,
};

const SQUARE_WIDTH: u16 = 7;
const SQUARE_HEIGHT: u16 = 3;

#[derive(Parser)]
#[command(about = "Solve crossword puzzles in your terminal")]
struct Args {
  /// A puzzle file, see the puzzles/ directory for the format
  puzzle: PathBuf,
  /// Where to keep solving progress between sessions
  #[arg(long, default_value = "solvetui-progress.json")]
  progress: PathBuf,
  /// Disable checking and revealing
  #[arg(long)]
  strict: bool,
}

fn main() -> io::Result<()> {
  let args = Args::parse();

  let puzzle = load_puzzle(&args.puzzle);
  let uuid = puzzle.uuid.clone();
  let store = FileStore::open(args.progress);

  let mut registry = Registry::new(store);
  registry
    .initialize(init_args(puzzle, args.strict))
    .unwrap_or_else(|e| {
      println!("Failed to open the puzzle: {e}");
      std::process::exit(2);
    });
  // a grid without entries is rejected by the engine, which the registry
  // logs and swallows; catch it here before entering raw mode
  if registry.get(&uuid).is_none() {
    println!("The puzzle could not be initialized");
    std::process::exit(2);
  }

  let app = App::new(registry, uuid);
  let terminal = ratatui::init();
  let result = app.run(terminal);
  ratatui::restore();
  result
}

/// The on-disk shape of a puzzle: published values keyed by `"x,y"`, black
/// squares simply left out, and clues keyed by `"1-across"` style ids.
#[derive(Debug, Deserialize)]
struct PuzzleFile {
  uuid: String,
  width: usize,
  height: usize,
  values: BTreeMap<PositionId, String>,
  #[serde(default)]
  clues: BTreeMap<EntryId, String>,
}

fn load_puzzle(path: &PathBuf) -> PuzzleFile {
  let text = fs::read_to_string(path).unwrap_or_else(|err| {
    println!("{:?}", err);
    std::process::exit(1);
  });
  serde_json::from_str(&text).unwrap_or_else(|e| {
    println!("Failed to parse puzzle file: {e}");
    std::process::exit(2);
  })
}

fn init_args(puzzle: PuzzleFile, strict: bool) -> InitArgs {
  let values = puzzle
    .values
    .into_iter()
    .map(|(id, value)| {
      let value = PositionValue::new(&value).unwrap_or_else(|e| {
        println!("Bad published value at {id}: {e}");
        std::process::exit(2);
      });
      (id, value)
    })
    .collect();
  let clues = puzzle
    .clues
    .into_iter()
    .map(|(id, clue)| (id, EntryClue::new(clue)))
    .collect();
  InitArgs {
    uuid: puzzle.uuid,
    re_initialize: false,
    strict_mode: strict,
    dimensions: Dimensions {
      width: puzzle.width,
      height: puzzle.height,
    },
    has_revealed_any: false,
    has_revealed_all: false,
    values,
    entries: None,
    clues,
    server_progress: None,
  }
}

/// Progress for every puzzle solved on this machine, as one JSON file.
#[derive(Debug)]
struct FileStore {
  path: PathBuf,
  snapshots: HashMap<String, ProgressSnapshot>,
}

impl FileStore {
  fn open(path: PathBuf) -> Self {
    let snapshots = if path.exists() {
      let text = fs::read_to_string(&path).unwrap_or_else(|err| {
        println!("{:?}", err);
        std::process::exit(1);
      });
      serde_json::from_str(&text).unwrap_or_else(|e| {
        println!("Failed to parse progress file {}: {e}", path.display());
        std::process::exit(2);
      })
    } else {
      HashMap::new()
    };
    Self { path, snapshots }
  }
}

impl ProgressStore for FileStore {
  fn get(&self, uuid: &str) -> Option<ProgressSnapshot> {
    self.snapshots.get(uuid).cloned()
  }

  fn set(&mut self, uuid: &str, snapshot: &ProgressSnapshot) {
    self.snapshots.insert(uuid.to_string(), snapshot.clone());
    let text = serde_json::to_string_pretty(&self.snapshots).unwrap();
    // a failed write is retried by the next snapshot, which rewrites the
    // whole file anyway
    fs::write(&self.path, text).ok();
  }
}

pub struct App {
  registry: Registry<FileStore>,
  uuid: String,
  running: bool,
}

impl App {
  fn new(registry: Registry<FileStore>, uuid: String) -> Self {
    Self {
      registry,
      uuid,
      running: true,
    }
  }

  pub fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
    self.running = true;
    while self.running {
      terminal.draw(|frame| self.draw(frame))?;
      self.handle_crossterm_events()?;
    }
    self.registry.flush();
    Ok(())
  }

  fn draw(&self, frame: &mut Frame) {
    frame.render_widget(self, frame.area());
  }

  fn state(&self) -> &SolverState {
    self.registry.get(&self.uuid).unwrap()
  }

  fn send(&mut self, event: SolveEvent) {
    self.registry.dispatch(&EventEnvelope {
      uuid: self.uuid.clone(),
      event,
    });
  }

  /// Reads the crossterm events and updates the state of [`App`]. Between
  /// key presses the throttled progress writer gets polled, so a parked
  /// snapshot reaches disk even while the player thinks.
  fn handle_crossterm_events(&mut self) -> io::Result<()> {
    if !event::poll(Duration::from_millis(250))? {
      self.registry.poll();
      return Ok(());
    }
    match event::read()? {
      // it's important to check KeyEventKind::Press to avoid handling key release events
      Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
      Event::Mouse(_) => {}
      Event::Resize(_, _) => {}
      _ => {}
    }
    Ok(())
  }

  /// Handles the key events and updates the state of [`App`].
  fn on_key_event(&mut self, key: KeyEvent) {
    match (key.modifiers, key.code) {
      (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
        self.quit()
      }

      (_, KeyCode::Left) => self.send(SolveEvent::Left {
        is_user_action: true,
        allow_same_line_jump: true,
      }),
      (_, KeyCode::Right) => self.send(SolveEvent::Right {
        is_user_action: true,
        allow_same_line_jump: true,
      }),
      (_, KeyCode::Up) => self.send(SolveEvent::Up {
        is_user_action: true,
        allow_same_line_jump: true,
      }),
      (_, KeyCode::Down) => self.send(SolveEvent::Down {
        is_user_action: true,
        allow_same_line_jump: true,
      }),

      (_, KeyCode::Tab) => self.send(SolveEvent::EntryNext {
        incomplete_entries_only: false,
      }),
      (_, KeyCode::BackTab) => self.send(SolveEvent::EntryPrevious {
        incomplete_entries_only: false,
        precedence: Precedence::Start,
      }),
      (_, KeyCode::Enter) => self.send(SolveEvent::IntersectionEntrySwitch),

      (_, KeyCode::Backspace | KeyCode::Delete) => self.send(SolveEvent::Delete),

      (KeyModifiers::CONTROL, KeyCode::Char('e')) => self.send(SolveEvent::ValidateEntryNoStreak),
      (KeyModifiers::CONTROL, KeyCode::Char('p')) => self.send(SolveEvent::ValidateAllNoStreak),
      (KeyModifiers::CONTROL, KeyCode::Char('r')) => self.send(SolveEvent::RevealEntryNoStreak),
      (KeyModifiers::CONTROL, KeyCode::Char('f')) => self.send(SolveEvent::RevealAllNoStreak),
      (KeyModifiers::CONTROL, KeyCode::Char('x')) => self.send(SolveEvent::ClearEntry),
      (KeyModifiers::CONTROL, KeyCode::Char('l')) => self.send(SolveEvent::ClearAll),

      (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c))
        if c.is_ascii_alphanumeric() =>
      {
        self.send(SolveEvent::Character {
          value: PositionValue::from_char(c),
        })
      }

      _ => {}
    }
  }

  /// Set running to false to quit the application.
  fn quit(&mut self) {
    self.running = false;
  }

  fn square_style(&self, metadata: &ValueMetadata) -> Style {
    let bg = if metadata.cell_focus {
      Color::LightRed
    } else if metadata.entry_focus {
      Color::LightYellow
    } else {
      Color::White
    };
    let fg = if metadata.show_cell_error || metadata.show_cell_error_because_entry {
      Color::Red
    } else if metadata.show_cell_success || metadata.show_cell_success_because_entry {
      Color::Green
    } else if metadata.is_revealed() {
      Color::Blue
    } else {
      Color::Black
    };
    Style::new().bg(bg).fg(fg).add_modifier(Modifier::BOLD)
  }

  fn current_clue(&self) -> String {
    let state = self.state();
    let id = state.focused_entry.id;
    let clue = state
      .entries_metadata
      .get(&id)
      .map(|metadata| metadata.clue.to_string())
      .unwrap_or_default();
    format!("{id}: {clue}")
  }

  fn render_square(&self, cell: Cell, square_area: Rect, buf: &mut Buffer) {
    let state = self.state();
    match state.values_metadata.get(&cell.position_id()) {
      None => Block::new()
        .style(Style::new().bg(Color::Black))
        .render(square_area, buf),
      Some(metadata) => {
        let mut block = Block::new()
          .style(self.square_style(metadata))
          .padding(Padding::top(1));
        if let Some(index) = metadata.human_index {
          block = block.title(index.to_string());
        }
        Paragraph::new(metadata.value_player.to_string())
          .block(block)
          .centered()
          .render(square_area, buf);
      }
    }
  }
}

impl Widget for &App {
  fn render(self, area: Rect, buf: &mut Buffer) {
    let state = self.state();
    let [title_area, main_area, help_area] = vertical![==2, *=1, ==1].areas(area);

    let mut title = vec!["solvetui".bold().blue(), ": ".bold(), state.uuid.clone().bold()];
    if state.is_complete {
      title.push(" (solved!)".bold().green());
    }
    Line::from(title).centered().render(title_area, buf);

    let [puzzle_area, clue_area] = horizontal![*=1, ==45].areas(main_area);

    let puzzle_area = center(
      puzzle_area,
      Constraint::Length(grid_extent(state.dimensions.width, SQUARE_WIDTH)),
      Constraint::Length(grid_extent(state.dimensions.height, SQUARE_HEIGHT)),
    );

    let mut square_area = Rect {
      x: puzzle_area.x,
      y: puzzle_area.y,
      width: SQUARE_WIDTH,
      height: SQUARE_HEIGHT,
    };
    for y in 0..state.dimensions.height {
      for x in 0..state.dimensions.width {
        self.render_square(Cell::new(x, y), square_area, buf);
        square_area.x += SQUARE_WIDTH + 2;
      }
      square_area.x = puzzle_area.x;
      square_area.y += SQUARE_HEIGHT + 1;
    }

    Paragraph::new(self.current_clue())
      .block(
        Block::bordered()
          .title(Line::from("Current clue").centered())
          .padding(Padding::uniform(4)),
      )
      .render(clue_area, buf);

    Line::from("Esc quit | Tab entry | Enter direction | ^E/^P check | ^R/^F reveal | ^X/^L clear")
      .centered()
      .render(help_area, buf);
  }
}

/// https://ratatui.rs/recipes/layout/center-a-widget/
fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
  let [area] = Layout::horizontal([horizontal])
    .flex(Flex::Center)
    .areas(area);
  let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
  area
}

/// The on-screen span of a row or column of squares, saturating for grids
/// larger than the terminal coordinate space.
fn grid_extent(cells: usize, square: u16) -> u16 {
  cells
    .checked_mul(1 + square as usize)
    .and_then(|extent| u16::try_from(extent).ok())
    .unwrap_or(u16::MAX)
}
