//! Custom widgets for the flashdeck TUI.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Paragraph, Widget, Wrap},
};

use super::theme::Theme;
use crate::analytics::ForecastStep;
use crate::models::{DeckCounts, ReviewOutcome, SessionStats};

// ══════════════════════════════════════════════════════════════════════════
// Logo Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct Logo;

impl Logo {
    const ART: &'static str = r#"
   ┌─────────┐┐┐
   │ ┌─┐ ┌─┐ │││   f l a s h d e c k
   │ │ │ │ │ │││
   │ └─┘ └─┘ │││   review today, remember next month
   └─────────┘┘┘"#;

    pub fn render_to(theme: &Theme, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = Self::ART
            .lines()
            .skip(1)
            .map(|line| Line::from(Span::styled(line, Style::default().fg(theme.colors.primary))))
            .collect();

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Stats Bar Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct StatsBar<'a> {
    counts: DeckCounts,
    theme: &'a Theme,
}

impl<'a> StatsBar<'a> {
    pub fn new(counts: DeckCounts, theme: &'a Theme) -> Self {
        Self { counts, theme }
    }

    fn cell(&self, label: &'a str, value: usize, style: Style) -> Line<'a> {
        Line::from(vec![
            Span::styled("● ", style),
            Span::styled(label, Style::default().fg(self.theme.colors.text_muted)),
            Span::styled(value.to_string(), style),
        ])
    }
}

impl Widget for StatsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::horizontal([Constraint::Percentage(25); 4]).split(area);

        let cells = [
            self.cell("New: ", self.counts.new_cards, self.theme.stats_new()),
            self.cell("Learned: ", self.counts.learned_cards, self.theme.stats_learned()),
            self.cell("Due: ", self.counts.due_cards, self.theme.stats_due()),
            Line::from(vec![
                Span::styled("Total: ", Style::default().fg(self.theme.colors.text_muted)),
                Span::styled(
                    self.counts.total_cards.to_string(),
                    Style::default().fg(self.theme.colors.text_dim),
                ),
            ]),
        ];

        for (line, chunk) in cells.into_iter().zip(chunks.iter()) {
            Paragraph::new(line)
                .alignment(Alignment::Center)
                .render(*chunk, buf);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Flashcard Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct FlashcardWidget<'a> {
    content: &'a str,
    is_front: bool,
    theme: &'a Theme,
}

impl<'a> FlashcardWidget<'a> {
    pub fn new(content: &'a str, is_front: bool, theme: &'a Theme) -> Self {
        Self { content, is_front, theme }
    }
}

impl Widget for FlashcardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (label, label_style, border_style) = if self.is_front {
            ("QUESTION", self.theme.card_front(), Style::default().fg(self.theme.colors.accent))
        } else {
            ("ANSWER", self.theme.card_back(), Style::default().fg(self.theme.colors.success))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(label, label_style),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let width = inner.width.saturating_sub(4).max(1);

        // Center the wrapped text vertically
        let wrapped_height = textwrap::wrap(self.content, width as usize).len() as u16;
        let vertical_padding = inner.height.saturating_sub(wrapped_height) / 2;

        let content_area = Rect {
            x: inner.x + 2,
            y: inner.y + vertical_padding,
            width,
            height: inner.height.saturating_sub(vertical_padding),
        };

        Paragraph::new(self.content)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(self.theme.colors.text))
            .render(content_area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Answer Buttons Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct AnswerButtons<'a> {
    intervals: &'a [(ReviewOutcome, String)],
    revealed: bool,
    theme: &'a Theme,
}

impl<'a> AnswerButtons<'a> {
    pub fn new(intervals: &'a [(ReviewOutcome, String)], revealed: bool, theme: &'a Theme) -> Self {
        Self { intervals, revealed, theme }
    }
}

impl Widget for AnswerButtons<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);

        for (i, (outcome, interval)) in self.intervals.iter().enumerate() {
            // Skip works before the answer is shown; the others need it revealed.
            let enabled = self.revealed || *outcome == ReviewOutcome::Skip;
            let color = if enabled {
                outcome.color_for_theme(self.theme)
            } else {
                self.theme.colors.text_dim
            };

            let button = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color));

            let inner = button.inner(chunks[i]);
            button.render(chunks[i], buf);

            let rows = [
                Line::from(Span::styled(
                    (i + 1).to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(outcome.name(), Style::default().fg(color))),
                if enabled {
                    Line::from(Span::styled(
                        interval.as_str(),
                        Style::default().fg(self.theme.colors.text_muted),
                    ))
                } else {
                    Line::from("")
                },
            ];

            for (row, line) in rows.into_iter().enumerate() {
                let y = inner.y + row as u16;
                if y >= inner.y + inner.height {
                    break;
                }
                Paragraph::new(line)
                    .alignment(Alignment::Center)
                    .render(Rect { y, height: 1, ..inner }, buf);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Key Hints Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct KeyHints<'a> {
    hints: &'a [(&'a str, &'a str)],
    theme: &'a Theme,
}

impl<'a> KeyHints<'a> {
    pub fn new(hints: &'a [(&'a str, &'a str)], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }
}

impl Widget for KeyHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .hints
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(*key, self.theme.key_highlight()),
                    Span::styled(format!(" {} ", desc), self.theme.key_hint()),
                    Span::styled("│ ", Style::default().fg(self.theme.colors.text_dim)),
                ]
            })
            .collect();

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Retention Forecast Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct RetentionForecast<'a> {
    steps: &'a [ForecastStep],
    theme: &'a Theme,
}

impl<'a> RetentionForecast<'a> {
    pub fn new(steps: &'a [ForecastStep], theme: &'a Theme) -> Self {
        Self { steps, theme }
    }
}

impl Widget for RetentionForecast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.secondary))
            .title(" Next Review Schedule ")
            .title_style(Style::default().fg(self.theme.colors.secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        // "Day 30  2026-11-18  " is 20 columns; the rest is the bar.
        let bar_width = inner.width.saturating_sub(26) as usize;

        let lines: Vec<Line> = self
            .steps
            .iter()
            .map(|step| {
                let filled = bar_width * usize::from(step.retention) / 100;
                Line::from(vec![
                    Span::styled(
                        format!("Day {:<3} ", step.days),
                        Style::default().fg(self.theme.colors.text_muted),
                    ),
                    Span::styled(
                        format!("{}  ", step.date.format("%Y-%m-%d")),
                        Style::default().fg(self.theme.colors.text),
                    ),
                    Span::styled("█".repeat(filled), self.theme.progress()),
                    Span::styled(
                        "░".repeat(bar_width - filled),
                        Style::default().fg(self.theme.colors.text_dim),
                    ),
                    Span::styled(
                        format!(" {:>3}%", step.retention),
                        Style::default().fg(self.theme.colors.text_muted),
                    ),
                ])
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Completion Screen Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct CompletionScreen<'a> {
    session: SessionStats,
    learned: usize,
    total_cards: usize,
    duration_mins: u64,
    theme: &'a Theme,
}

impl<'a> CompletionScreen<'a> {
    pub fn new(
        session: SessionStats,
        learned: usize,
        total_cards: usize,
        duration_mins: u64,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            learned,
            total_cards,
            duration_mins,
            theme,
        }
    }

    fn row(&self, label: &'a str, value: String, style: Style) -> Line<'a> {
        Line::from(vec![
            Span::styled(label, Style::default().fg(self.theme.colors.text_muted)),
            Span::styled(value, style.add_modifier(Modifier::BOLD)),
        ])
    }
}

impl Widget for CompletionScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.success))
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled("SESSION COMPLETE", self.theme.card_back()),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let colors = &self.theme.colors;
        let text = vec![
            Line::from(""),
            self.row("Easy: ", self.session.easy.to_string(), Style::default().fg(colors.rating_easy)),
            self.row("Hard: ", self.session.hard.to_string(), Style::default().fg(colors.rating_hard)),
            self.row("Skipped: ", self.session.skipped.to_string(), Style::default().fg(colors.rating_skip)),
            Line::from(""),
            self.row(
                "Learned cards: ",
                format!("{}/{}", self.learned, self.total_cards),
                Style::default().fg(colors.primary),
            ),
            self.row(
                "Accuracy: ",
                format!("{:.1}%", self.session.accuracy()),
                Style::default().fg(colors.primary),
            ),
            self.row(
                "Time: ",
                format!("{} minutes", self.duration_mins),
                Style::default().fg(colors.primary),
            ),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(colors.text_dim)),
                Span::styled("ESC", self.theme.key_highlight()),
                Span::styled(" to return", Style::default().fg(colors.text_dim)),
            ]),
        ];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
