//! Plain-text board for logs
//!
//! Row 0 is printed first. `@` is the head, `o` the body, `*` the apple and
//! `.` an empty cell. Segments outside the grid (a head that just hit the
//! wall) are not drawn.

use crate::game::{GridWorld, Position};

pub const HEAD: char = '@';
pub const BODY: char = 'o';
pub const APPLE: char = '*';
pub const EMPTY: char = '.';

/// Character shown for one cell
pub fn cell_char(world: &GridWorld, pos: Position) -> char {
    let snake = world.snake();
    if pos == snake.head() {
        HEAD
    } else if snake.collides_with_body(pos) {
        BODY
    } else if pos == world.apple() {
        APPLE
    } else {
        EMPTY
    }
}

/// Render the grid as newline-separated rows
pub fn render_board(world: &GridWorld) -> String {
    let size = world.config().grid_size as i32;
    let mut out = String::with_capacity((size as usize) * (2 * size as usize + 1));

    for row in 0..size {
        for col in 0..size {
            if col > 0 {
                out.push(' ');
            }
            out.push(cell_char(world, Position::new(row, col)));
        }
        if row + 1 < size {
            out.push('\n');
        }
    }

    out
}
