//! Layout and drawing: board, animated tiles, sidebar, game over.

use crate::app::Screen;
use crate::theme::Theme;
use mergetui::{Snapshot, Tile};
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Tile size in terminal cells. Terminal cells are about twice as tall as wide.
const TILE_WIDTH: u16 = 7;
const TILE_HEIGHT: u16 = 3;
const GAP_X: u16 = 2;
const GAP_Y: u16 = 1;

const SIDEBAR_WIDTH: u16 = 24;

/// Slide from previous to current cell.
const SLIDE_MS: u64 = 160;
/// Merged tiles pulse once the absorbed tile has slid underneath.
const UPGRADE_DELAY_MS: u64 = 100;
const UPGRADE_PULSE_MS: u64 = 160;
/// Fade-in of spawned tiles (TachyonFX).
const SPAWN_FADE_MS: u32 = 1000;

/// Numbers shown next to the board, taken from the app and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub best_score: u64,
    pub moves: u32,
    pub largest: u32,
}

/// Offset of a cell's top-left corner along one axis, inside the board border.
fn drawn_position(cell: usize, tile: u16, gap: u16) -> u16 {
    gap + cell as u16 * (tile + gap)
}

/// Board size in terminal cells (without border) for `cells` tiles per side.
fn board_size(cells: usize) -> (u16, u16) {
    (
        drawn_position(cells, TILE_WIDTH, GAP_X),
        drawn_position(cells, TILE_HEIGHT, GAP_Y),
    )
}

/// Board rect with border and the inner rect the cells live in, centred together with the sidebar.
fn board_rects(area: Rect, cells: usize) -> (Rect, Rect) {
    let (w, h) = board_size(cells);
    let (outer_w, outer_h) = (w + 2, h + 2);
    let total_w = outer_w + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(outer_h) / 2;
    let outer = Rect {
        x,
        y,
        width: outer_w,
        height: outer_h,
    };
    let inner = Rect {
        x: x + 1,
        y: y + 1,
        width: w,
        height: h,
    };
    (outer.intersection(area), inner.intersection(area))
}

/// 0.0 right after a move, 1.0 once the slide is over.
fn slide_progress(since_change: Duration) -> f32 {
    (since_change.as_millis() as f32 / SLIDE_MS as f32).min(1.0)
}

fn lerp(from: u16, to: u16, t: f32) -> u16 {
    (f32::from(from) + (f32::from(to) - f32::from(from)) * t).round() as u16
}

/// Brightness multiplier for a tile that merged this turn.
fn pulse_factor(since_change: Duration) -> f32 {
    let ms = since_change.as_millis() as u64;
    if ms < UPGRADE_DELAY_MS || ms >= UPGRADE_DELAY_MS + UPGRADE_PULSE_MS {
        return 1.0;
    }
    let p = (ms - UPGRADE_DELAY_MS) as f32 / UPGRADE_PULSE_MS as f32;
    1.0 + 0.25 * (p * std::f32::consts::PI).sin()
}

fn scale_color(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::White => (255, 255, 255),
        Color::Black => (0, 0, 0),
        _ => return color,
    };
    let scale = |c: u8| (f32::from(c) * factor).min(255.0) as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

/// Where a tile is drawn `progress` of the way from its previous cell to its current one.
fn tile_rect(board: Rect, tile: &Tile, progress: f32) -> Rect {
    let x = lerp(
        drawn_position(tile.previous_x, TILE_WIDTH, GAP_X),
        drawn_position(tile.x, TILE_WIDTH, GAP_X),
        progress,
    );
    let y = lerp(
        drawn_position(tile.previous_y, TILE_HEIGHT, GAP_Y),
        drawn_position(tile.y, TILE_HEIGHT, GAP_Y),
        progress,
    );
    Rect {
        x: board.x + x,
        y: board.y + y,
        width: TILE_WIDTH,
        height: TILE_HEIGHT,
    }
    .intersection(board)
}

fn cell_rect(board: Rect, x: usize, y: usize) -> Rect {
    Rect {
        x: board.x + drawn_position(x, TILE_WIDTH, GAP_X),
        y: board.y + drawn_position(y, TILE_HEIGHT, GAP_Y),
        width: TILE_WIDTH,
        height: TILE_HEIGHT,
    }
    .intersection(board)
}

fn tile_widget(tile: &Tile, theme: &Theme, bg: Color) -> Paragraph<'static> {
    let mut lines = vec![Line::from(""); (TILE_HEIGHT / 2) as usize];
    lines.push(Line::from(Span::styled(
        tile.value.to_string(),
        Style::default()
            .fg(theme.text_color(tile.value))
            .add_modifier(Modifier::BOLD),
    )));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(bg))
}

/// Draw the whole screen for the latest snapshot.
/// `since_change` drives the slide/pulse animations; the spawn fade is a TachyonFX effect kept in
/// `spawn_effect` between frames (reset by the app after every move).
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    snapshot: &Snapshot,
    theme: &Theme,
    stats: Stats,
    since_change: Duration,
    animate: bool,
    spawn_effect: &mut Option<Effect>,
    spawn_effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), area);

    let (outer, inner) = board_rects(area, snapshot.size);
    draw_board(frame, snapshot, theme, outer, inner, since_change, animate);
    draw_sidebar(frame, snapshot, theme, stats, outer, area);
    if animate {
        apply_spawn_effect(
            frame,
            snapshot,
            theme,
            inner,
            spawn_effect,
            spawn_effect_process_time,
            now,
        );
    }
    if screen == Screen::GameOver {
        draw_game_over(frame, snapshot, theme, stats, outer);
    }
}

fn draw_board(
    frame: &mut Frame,
    snapshot: &Snapshot,
    theme: &Theme,
    outer: Rect,
    inner: Rect,
    since_change: Duration,
    animate: bool,
) {
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line))
            .style(Style::default().bg(theme.board_bg)),
        outer,
    );

    let empty = Block::default().style(Style::default().bg(theme.empty_cell));
    for y in 0..snapshot.size {
        for x in 0..snapshot.size {
            let cell = cell_rect(inner, x, y);
            if !cell.is_empty() {
                frame.render_widget(empty.clone(), cell);
            }
        }
    }

    let progress = if animate {
        slide_progress(since_change)
    } else {
        1.0
    };
    let pulse = if animate {
        pulse_factor(since_change)
    } else {
        1.0
    };
    // Merged-away tiles first so the tile they merged into covers them.
    let layers = [
        snapshot.tiles.iter().filter(|t| t.is_deleted).collect::<Vec<_>>(),
        snapshot.live_tiles().collect(),
    ];
    for tile in layers.iter().flatten() {
        let rect = tile_rect(inner, tile, progress);
        if rect.is_empty() {
            continue;
        }
        let mut bg = theme.tile_color(tile.value);
        if tile.is_upgraded {
            bg = scale_color(bg, pulse);
        }
        frame.render_widget(tile_widget(tile, theme, bg), rect);
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    snapshot: &Snapshot,
    theme: &Theme,
    stats: Stats,
    board: Rect,
    area: Rect,
) {
    let rect = Rect {
        x: board.right() + 1,
        y: board.y,
        width: SIDEBAR_WIDTH - 1,
        height: board.height.max(14),
    }
    .intersection(area);
    if rect.is_empty() {
        return;
    }
    let label = Style::default().fg(theme.main_fg);
    let value = Style::default()
        .fg(theme.title)
        .add_modifier(Modifier::BOLD);
    let stat = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(format!(" {name:<8}"), label), Span::styled(v, value)])
    };
    let key = Style::default().fg(theme.tile_color(8));
    let lines = vec![
        Line::from(""),
        stat("Score", snapshot.score.to_string()),
        stat("Best", stats.best_score.to_string()),
        stat("Moves", stats.moves.to_string()),
        stat("Largest", stats.largest.to_string()),
        stat("Board", format!("{0}×{0}", snapshot.size)),
        Line::from(""),
        Line::from(vec![Span::styled(" ←↑↓→ hjkl wasd", key)]),
        Line::from(Span::styled("   Move", label)),
        Line::from(vec![Span::styled(" N / R", key), Span::styled("  New game", label)]),
        Line::from(vec![Span::styled(" Q / Esc", key), Span::styled(" Quit", label)]),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" mergetui ", theme.title)),
    );
    frame.render_widget(p, rect);
}

/// Buffer positions covered by the cells of tiles spawned this turn.
fn new_tile_positions(board: Rect, snapshot: &Snapshot) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for tile in snapshot.live_tiles().filter(|t| t.is_new) {
        let r = cell_rect(board, tile.x, tile.y);
        for bx in r.left()..r.right() {
            for by in r.top()..r.bottom() {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or update the spawn fade-in (TachyonFX: new tiles fade in from the empty cell colour).
fn apply_spawn_effect(
    frame: &mut Frame,
    snapshot: &Snapshot,
    theme: &Theme,
    board: Rect,
    spawn_effect: &mut Option<Effect>,
    spawn_effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = spawn_effect_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *spawn_effect_process_time = Some(now);

    if spawn_effect.is_none() {
        let cells = new_tile_positions(board, snapshot);
        if cells.is_empty() {
            return;
        }
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let from = theme.empty_cell;
        let effect = fx::fade_from(from, from, (SPAWN_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *spawn_effect = Some(effect);
    }

    if let Some(effect) = spawn_effect {
        if !effect.done() {
            frame.render_effect(effect, board, tfx_delta);
        }
    }
}

fn draw_game_over(frame: &mut Frame, snapshot: &Snapshot, theme: &Theme, stats: Stats, board: Rect) {
    let popup_w = 28u16;
    let popup_h = 7u16;
    let popup = Rect {
        x: board.x + board.width.saturating_sub(popup_w) / 2,
        y: board.y + board.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(board.width),
        height: popup_h.min(board.height),
    };
    let lines = vec![
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {}   Largest: {} ", snapshot.score, stats.largest),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " N: New game    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .style(Style::default().bg(theme.bg)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(p, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergetui::{Board, Direction, ScriptedSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    const STATS: Stats = Stats {
        best_score: 32,
        moves: 5,
        largest: 16,
    };

    fn render(screen: Screen, snapshot: &Snapshot, since: Duration, animate: bool) -> (String, Option<Effect>) {
        render_stats(screen, snapshot, STATS, since, animate)
    }

    fn render_stats(
        screen: Screen,
        snapshot: &Snapshot,
        stats: Stats,
        since: Duration,
        animate: bool,
    ) -> (String, Option<Effect>) {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut effect = None;
        let mut effect_time = None;
        terminal
            .draw(|f| {
                draw(
                    f,
                    screen,
                    snapshot,
                    &Theme::default(),
                    stats,
                    since,
                    animate,
                    &mut effect,
                    &mut effect_time,
                    Instant::now(),
                );
            })
            .unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (text, effect)
    }

    fn merged_snapshot() -> Snapshot {
        let mut board =
            Board::with_tiles(4, [(2, 0, 0), (2, 1, 0), (16, 3, 3)], ScriptedSource::default())
                .unwrap();
        board.shift(Direction::Left);
        board.snapshot()
    }

    #[test]
    fn test_board_size_matches_drawn_positions() {
        assert_eq!(board_size(4), (2 + 4 * 9, 1 + 4 * 4));
        assert_eq!(drawn_position(0, TILE_WIDTH, GAP_X), GAP_X);
        assert_eq!(drawn_position(2, TILE_HEIGHT, GAP_Y), 1 + 2 * 4);
    }

    #[test]
    fn test_lerp_and_progress() {
        assert_eq!(lerp(10, 30, 0.0), 10);
        assert_eq!(lerp(10, 30, 0.5), 20);
        assert_eq!(lerp(30, 10, 1.0), 10);
        assert!(slide_progress(Duration::ZERO).abs() < f32::EPSILON);
        assert!((slide_progress(Duration::from_millis(80)) - 0.5).abs() < 0.01);
        assert!((slide_progress(Duration::from_secs(3)) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pulse_window() {
        assert!((pulse_factor(Duration::from_millis(50)) - 1.0).abs() < f32::EPSILON);
        assert!(pulse_factor(Duration::from_millis(180)) > 1.2);
        assert!((pulse_factor(Duration::from_millis(400)) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_scale_color_clamps() {
        assert_eq!(scale_color(Color::Rgb(200, 100, 0), 1.5), Color::Rgb(255, 150, 0));
        assert_eq!(scale_color(Color::Reset, 2.0), Color::Reset);
    }

    #[test]
    fn test_tile_slides_between_cells() {
        let board = Rect::new(0, 0, 100, 100);
        let mut tile = Tile::placed(2, 0, 0);
        tile.previous_x = 2;
        let start = tile_rect(board, &tile, 0.0);
        let mid = tile_rect(board, &tile, 0.5);
        let end = tile_rect(board, &tile, 1.0);
        assert_eq!(start.x, drawn_position(2, TILE_WIDTH, GAP_X));
        assert_eq!(end.x, GAP_X);
        assert!(end.x < mid.x && mid.x < start.x);
        assert_eq!(start.y, end.y);
    }

    #[test]
    fn test_new_tile_positions_cover_spawn_only() {
        let snap = merged_snapshot();
        let board = Rect::new(0, 0, 80, 24);
        let cells = new_tile_positions(board, &snap);
        assert_eq!(cells.len(), (TILE_WIDTH * TILE_HEIGHT) as usize);
    }

    #[test]
    fn test_draw_shows_values_and_score() {
        let snap = merged_snapshot();
        let (text, effect) = render(Screen::Playing, &snap, Duration::from_secs(2), false);
        assert!(text.contains("Score"));
        assert!(text.contains("16"));
        assert!(text.contains('4'));
        assert!(!text.contains("Game Over"));
        assert!(effect.is_none());
    }

    #[test]
    fn test_draw_game_over_overlay() {
        let snap = merged_snapshot();
        let (text, _) = render(Screen::GameOver, &snap, Duration::from_secs(2), false);
        assert!(text.contains("Game Over"));
    }

    #[test]
    fn test_animated_draw_starts_spawn_fade() {
        let snap = merged_snapshot();
        let (_, effect) = render(Screen::Playing, &snap, Duration::ZERO, true);
        assert!(effect.is_some());
    }

    #[test]
    fn test_largest_comes_from_stats() {
        let snap = merged_snapshot();
        let stats = Stats {
            largest: 2048,
            ..STATS
        };
        let (text, _) = render_stats(Screen::GameOver, &snap, stats, Duration::from_secs(2), false);
        assert!(text.contains("2048"));
        assert!(text.contains("Largest: 2048"));
    }
}
