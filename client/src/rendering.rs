use crate::game::{Game, GameStatus};
use crate::scheduler::Scheduler;
use macroquad::prelude::*;
use shared::{Coordinate, GameMode};

pub const HEADER_HEIGHT: f32 = 64.0;

/// Window dimensions needed to show the whole board and the header
pub fn window_size(grid_size: i32, cell_size: f32) -> (i32, i32) {
    let board = grid_size as f32 * cell_size;
    (board as i32, (board + HEADER_HEIGHT) as i32)
}

pub struct Renderer {
    cell_size: f32,
    grid_size: i32,
}

impl Renderer {
    pub fn new(grid_size: i32, cell_size: f32) -> Self {
        Renderer {
            cell_size,
            grid_size,
        }
    }

    pub fn render<S: Scheduler>(&self, game: &Game<S>) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_grid();

        if let Some(food) = game.state().food {
            self.draw_cell(food, Color::from_rgba(255, 68, 68, 255));
        }

        if game.mode() == GameMode::Multi {
            for segment in &game.opponent().snake {
                self.draw_cell(*segment, Color::from_rgba(0, 170, 255, 255));
            }
        }

        let snake = game.state().snake.segments();
        for (i, segment) in snake.iter().enumerate() {
            let color = if i == 0 { LIME } else { GREEN };
            self.draw_cell(*segment, color);
        }

        self.draw_header(game);
    }

    fn board_origin(&self) -> (f32, f32) {
        (0.0, HEADER_HEIGHT)
    }

    fn draw_grid(&self) {
        let (x0, y0) = self.board_origin();
        let size = self.grid_size as f32 * self.cell_size;
        let line_color = Color::from_rgba(51, 51, 51, 255);

        for i in 0..=self.grid_size {
            let offset = i as f32 * self.cell_size;
            draw_line(x0 + offset, y0, x0 + offset, y0 + size, 1.0, line_color);
            draw_line(x0, y0 + offset, x0 + size, y0 + offset, 1.0, line_color);
        }
    }

    fn draw_cell(&self, cell: Coordinate, color: Color) {
        let (x0, y0) = self.board_origin();
        let x = x0 + cell.col as f32 * self.cell_size;
        let y = y0 + cell.row as f32 * self.cell_size;

        draw_rectangle(x + 1.0, y + 1.0, self.cell_size - 2.0, self.cell_size - 2.0, color);
    }

    fn draw_header<S: Scheduler>(&self, game: &Game<S>) {
        let status_color = match game.status() {
            GameStatus::InProgress => GREEN,
            GameStatus::Paused | GameStatus::Pending => YELLOW,
            GameStatus::Finished => RED,
            GameStatus::NotStarted => Color::from_rgba(136, 136, 136, 255),
        };
        draw_rectangle(10.0, 10.0, 10.0, 10.0, status_color);
        draw_text(game.status().label(), 26.0, 20.0, 18.0, WHITE);

        let mode = format!("{} (M to switch)", game.mode());
        draw_text(&mode, 130.0, 20.0, 18.0, WHITE);

        let score = match game.mode() {
            GameMode::Single => format!("Score: {}", game.state().score),
            GameMode::Multi => format!(
                "Score: {}  Opponent: {}",
                game.state().score,
                game.opponent().score
            ),
        };
        draw_text(&score, 10.0, 40.0, 18.0, WHITE);

        draw_text(game.message(), 10.0, 58.0, 16.0, LIGHTGRAY);
    }
}
