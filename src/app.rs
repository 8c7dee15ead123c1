//! App: terminal init, main loop, key handling. Owns the one board of the session.

use crate::GameConfig;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::Stats;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use log::info;
use mergetui::{Board, Direction, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Whether the main loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    board: Board<StdRng>,
    /// What the renderer sees; refreshed after every move and new game.
    snapshot: Snapshot,
    screen: Screen,
    /// Moves that changed the board this game.
    moves: u32,
    /// Best score this session (not persisted).
    best_score: u64,
    /// Animations are timed from here.
    last_change: Instant,
    /// TachyonFX fade-in for freshly spawned tiles (created on first draw after a move).
    spawn_effect: Option<Effect>,
    /// Last time we processed the spawn effect (for delta).
    spawn_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::new(config.size, rng)
            .with_context(|| format!("cannot create a {0}x{0} board", config.size))?;
        Ok(Self::with_board(config, theme, board))
    }

    pub fn with_board(config: GameConfig, theme: Theme, board: Board<StdRng>) -> Self {
        let snapshot = board.snapshot();
        let screen = if board.is_game_over() {
            Screen::GameOver
        } else {
            Screen::Playing
        };
        Self {
            config,
            theme,
            board,
            snapshot,
            screen,
            moves: 0,
            best_score: 0,
            last_change: Instant::now(),
            spawn_effect: None,
            spawn_effect_process_time: None,
        }
    }

    fn refresh(&mut self) {
        self.snapshot = self.board.snapshot();
        self.best_score = self.best_score.max(self.board.score());
        self.last_change = Instant::now();
        self.spawn_effect = None;
        self.spawn_effect_process_time = None;
    }

    fn new_game(&mut self) {
        self.board.reset();
        self.moves = 0;
        self.screen = Screen::Playing;
        self.refresh();
    }

    fn apply_move(&mut self, direction: Direction) {
        let outcome = self.board.shift(direction);
        if outcome.changed {
            self.moves += 1;
        }
        self.refresh();
        if self.board.is_game_over() {
            info!(
                "game over after {} moves, score {}, largest tile {}",
                self.moves,
                self.board.score(),
                self.board.max_value()
            );
            self.screen = Screen::GameOver;
        }
    }

    fn apply_action(&mut self, action: Action) -> Flow {
        match (self.screen, action) {
            (_, Action::Quit) => return Flow::Quit,
            (_, Action::NewGame) => self.new_game(),
            (Screen::Playing, Action::Move(direction)) => self.apply_move(direction),
            (Screen::GameOver, Action::Move(_)) | (_, Action::None) => {}
        }
        Flow::Continue
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("cannot enable raw mode")?;
        let mut stdout = io::stdout();
        let entered = execute!(stdout, EnterAlternateScreen).context("cannot enter alternate screen");

        let result = entered
            .and_then(|()| {
                DefaultTerminal::new(CrosstermBackend::new(stdout)).context("cannot set up terminal")
            })
            .and_then(|mut terminal| self.run_loop(&mut terminal));

        // Restore even if setup or the loop failed; the loop's error wins.
        let restored = finish_restore(
            execute!(io::stdout(), LeaveAlternateScreen),
            disable_raw_mode(),
        );
        result.and(restored)
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.snapshot,
                    &self.theme,
                    Stats {
                        best_score: self.best_score,
                        moves: self.moves,
                        largest: self.board.max_value(),
                    },
                    now.saturating_duration_since(self.last_change),
                    self.config.animate,
                    &mut self.spawn_effect,
                    &mut self.spawn_effect_process_time,
                    now,
                );
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // Only the first press counts; OS repeats would skip whole moves.
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.apply_action(key_to_action(key)) == Flow::Quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Both restore steps have already run; report the first failure.
fn finish_restore(leave: io::Result<()>, raw: io::Result<()>) -> Result<()> {
    leave.context("cannot leave alternate screen")?;
    raw.context("cannot disable raw mode")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            size: 4,
            seed: Some(1),
            animate: false,
            frame_rate: 60.0,
        }
    }

    fn app_with(tiles: &[(u32, usize, usize)]) -> App {
        let board = Board::with_tiles(4, tiles.iter().copied(), StdRng::seed_from_u64(3)).unwrap();
        App::with_board(config(), Theme::default(), board)
    }

    #[test]
    fn test_new_seeds_board() {
        let app = App::new(config(), Theme::default()).unwrap();
        assert_eq!(app.snapshot.tiles.len(), 2);
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn test_new_rejects_bad_size() {
        let cfg = GameConfig { size: 1, ..config() };
        assert!(App::new(cfg, Theme::default()).is_err());
    }

    #[test]
    fn test_seed_replays_opening() {
        let a = App::new(config(), Theme::default()).unwrap();
        let b = App::new(config(), Theme::default()).unwrap();
        assert_eq!(a.snapshot, b.snapshot);
    }

    #[test]
    fn test_move_updates_snapshot_and_best() {
        let mut app = app_with(&[(2, 0, 0), (2, 1, 0)]);
        assert_eq!(app.apply_action(Action::Move(Direction::Left)), Flow::Continue);
        assert_eq!(app.snapshot.score, 4);
        assert_eq!(app.best_score, 4);
        assert_eq!(app.moves, 1);
        assert_eq!(app.snapshot.live_tiles().count(), 2);
    }

    #[test]
    fn test_blocked_move_not_counted() {
        let mut app = app_with(&[(2, 0, 0)]);
        app.apply_action(Action::Move(Direction::Up));
        app.apply_action(Action::Move(Direction::Left));
        assert_eq!(app.moves, 0);
    }

    #[test]
    fn test_new_game_keeps_best() {
        let mut app = app_with(&[(2, 0, 0), (2, 1, 0)]);
        app.apply_action(Action::Move(Direction::Left));
        app.apply_action(Action::NewGame);
        assert_eq!(app.snapshot.score, 0);
        assert_eq!(app.best_score, 4);
        assert_eq!(app.moves, 0);
    }

    #[test]
    fn test_stuck_board_is_game_over() {
        let checker: Vec<_> = (0..4)
            .flat_map(|y| (0..4).map(move |x| (2u32 << ((x + y) % 2), x, y)))
            .collect();
        let mut app = app_with(&checker);
        assert_eq!(app.screen, Screen::GameOver);
        let before = app.snapshot.clone();
        app.apply_action(Action::Move(Direction::Up));
        assert_eq!(app.snapshot, before);
        app.apply_action(Action::NewGame);
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn test_quit() {
        let mut app = app_with(&[(2, 0, 0)]);
        assert_eq!(app.apply_action(Action::Quit), Flow::Quit);
    }

    #[test]
    fn test_merge_on_full_board() {
        // checkerboard with the bottom-right 2 swapped for a 4: only row 3 can merge
        let tiles: Vec<_> = (0..4)
            .flat_map(|y| (0..4).map(move |x| (2u32 << ((x + y) % 2), x, y)))
            .map(|(v, x, y)| if (x, y) == (3, 3) { (4, x, y) } else { (v, x, y) })
            .collect();
        let mut app = app_with(&tiles);
        assert_eq!(app.screen, Screen::Playing);
        app.apply_action(Action::Move(Direction::Right));
        assert_eq!(app.snapshot.score, 8);
        assert_eq!(app.moves, 1);
        assert!(app.snapshot.tiles.iter().any(|t| t.is_new));
    }

    #[test]
    fn test_finish_restore_reports_first_failure() {
        assert!(finish_restore(Ok(()), Ok(())).is_ok());
        let both = finish_restore(Err(io::Error::other("leave")), Err(io::Error::other("raw")));
        assert_eq!(both.unwrap_err().to_string(), "cannot leave alternate screen");
        let raw_only = finish_restore(Ok(()), Err(io::Error::other("raw")));
        assert_eq!(raw_only.unwrap_err().to_string(), "cannot disable raw mode");
    }
}
