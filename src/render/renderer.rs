use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{GridWorld, Position};

/// What the watch view shows next to the grid
#[derive(Debug, Clone, PartialEq)]
pub struct WatchStatus {
    pub episode: usize,
    pub best_apples: u32,
    /// Episodes the loaded model was trained for
    pub episodes_trained: usize,
    pub speed: &'static str,
    pub paused: bool,
    /// Q-values behind the last greedy move
    pub last_q_values: Option<[f32; 4]>,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, world: &GridWorld, status: &WatchStatus) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header
                Constraint::Min(0),    // Grid
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(world, status), chunks[0]);

        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];
        frame.render_widget(self.render_grid(world, status), game_area);

        frame.render_widget(self.render_controls(), chunks[2]);
    }

    fn render_grid(&self, world: &GridWorld, status: &WatchStatus) -> Paragraph<'_> {
        let size = world.config().grid_size as i32;
        let snake = world.snake();
        let mut lines = Vec::with_capacity(size as usize);

        for row in 0..size {
            let mut spans = Vec::with_capacity(size as usize);

            for col in 0..size {
                let pos = Position::new(row, col);

                let cell = if pos == snake.head() {
                    Span::styled(
                        "■ ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                } else if snake.collides_with_body(pos) {
                    Span::styled("□ ", Style::default().fg(Color::Green))
                } else if pos == world.apple() {
                    Span::styled(
                        "O ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        let title = if status.paused {
            " Snake DQN (paused) "
        } else {
            " Snake DQN "
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, world: &GridWorld, status: &WatchStatus) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let mut lines = vec![Line::from(vec![
            Span::styled("Episode: ", label),
            Span::styled(status.episode.to_string(), value),
            Span::raw("    "),
            Span::styled("Apples: ", label),
            Span::styled(
                world.apples().to_string(),
                value.add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(status.best_apples.to_string(), value),
            Span::raw("    "),
            Span::styled("Steps: ", label),
            Span::styled(world.state().steps.to_string(), value),
            Span::raw("    "),
            Span::styled("Speed: ", label),
            Span::styled(status.speed, value),
        ])];

        let q_line = match status.last_q_values {
            Some(q) => format!(
                "Q  up {:>8.3}  down {:>8.3}  left {:>8.3}  right {:>8.3}",
                q[0], q[1], q[2], q[3]
            ),
            None => format!("Model trained for {} episodes", status.episodes_trained),
        };
        lines.push(Line::from(Span::styled(
            q_line,
            Style::default().fg(Color::Gray),
        )));

        Paragraph::new(lines).alignment(Alignment::Center)
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("R", Style::default().fg(Color::Cyan)),
            Span::raw(" reset | "),
            Span::styled("1-4", Style::default().fg(Color::Cyan)),
            Span::raw(" speed | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn test_render_draws_grid_and_stats() {
        let world = GridWorld::new(GameConfig::default(), Some(0));
        let status = WatchStatus {
            episode: 3,
            best_apples: 7,
            episodes_trained: 1200,
            speed: "Normal",
            paused: true,
            last_q_values: None,
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal
            .draw(|frame| Renderer::new().render(frame, &world, &status))
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Episode: 3"));
        assert!(text.contains("Best: 7"));
        assert!(text.contains("paused"));
        assert!(text.contains("1200 episodes"));
        assert!(text.contains('■'));
    }
}
