use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use livemark_config::{Config, RenderModeSetting};
use livemark_engine::{
    Editor, ElementKind, Key, MarkdownRenderer, Node, NodeId, NodeTree, RenderMode, segment,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use std::{env, io::stdout, path::PathBuf, process};

struct App {
    file_name: String,
    editor: Editor<MarkdownRenderer>,
    status: Option<String>,
}

impl App {
    fn new(path: &PathBuf, mode: RenderMode) -> Result<Self> {
        let content = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut editor = Editor::new(&content, MarkdownRenderer::source_faithful(), mode)?;
        // Start with the caret at the end of the document.
        editor.set_caret(editor.tree().total_text_len());

        Ok(Self {
            file_name: path.display().to_string(),
            editor,
            status: None,
        })
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        self.status = None;
        let result = match code {
            KeyCode::Esc => return false,
            KeyCode::Enter => self.editor.key_down(Key::Enter).map(|_| ()),
            KeyCode::Backspace => self.editor.delete_backward().map(|_| ()),
            KeyCode::Char(c) => self.editor.insert_text(&c.to_string()),
            KeyCode::Left => {
                if let Some(caret) = self.editor.caret() {
                    self.editor.set_caret(caret.start.saturating_sub(1));
                }
                Ok(())
            }
            KeyCode::Right => {
                if let Some(caret) = self.editor.caret() {
                    let total = self.editor.tree().total_text_len();
                    self.editor.set_caret((caret.end + 1).min(total));
                }
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!("reconciliation failed: {e}");
            self.status = Some(format!("render error: {e}"));
        }
        true
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Determine the file to edit from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let file_path;
    let mut mode = RenderMode::Segmented;

    if args.len() == 2 {
        file_path = PathBuf::from(&args[1]);
        if let Ok(Some(config)) = Config::load() {
            mode = render_mode(config.render_mode);
        }
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => {
                file_path = config.file_path;
                mode = render_mode(config.render_mode);
            }
            Ok(None) => {
                eprintln!("Error: No file provided and no config file found");
                eprintln!("Usage: {} <markdown-file>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <markdown-file>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [markdown-file]", args[0]);
        process::exit(1);
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(&file_path, mode)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn render_mode(setting: RenderModeSetting) -> RenderMode {
    match setting {
        RenderModeSetting::Segmented => RenderMode::Segmented,
        RenderModeSetting::WholeDocument => RenderMode::WholeDocument,
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if !app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
        .split(outer[0]);

    // Editor panel: styled view with a visible caret marker
    let caret = app.editor.caret().map(|c| c.start);
    let lines = styled_lines(app.editor.tree(), caret);
    let title = format!("Editing {}", app.file_name);
    let editor_panel =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(editor_panel, chunks[0]);

    // Raw blocks panel (segmentation debug view)
    let block_items: Vec<ListItem> = segment(app.editor.source())
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let first_line = b.raw.lines().next().unwrap_or("").to_string();
            let display_text = format!("{}. {}", i + 1, first_line);
            ListItem::new(vec![Line::from(vec![Span::raw(display_text)])])
        })
        .collect();
    let blocks_list =
        List::new(block_items).block(Block::default().borders(Borders::ALL).title("Blocks"));
    f.render_widget(blocks_list, chunks[1]);

    // Status and instructions
    let status = match &app.status {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )),
        None => {
            let caret_text = match app.editor.caret() {
                Some(c) if c.is_collapsed() => format!("caret {}", c.start),
                Some(c) => format!("selection {}..{}", c.start, c.end),
                None => "no caret".to_string(),
            };
            Line::from(vec![
                Span::raw(format!("{caret_text} | v{} | ", app.editor.version())),
                Span::raw("Esc: Quit | Enter: Split block | \u{2190}/\u{2192}: Move caret"),
            ])
        }
    };
    let help = Paragraph::new(vec![status]).block(Block::default());
    f.render_widget(help, outer[1]);
}

/// Flatten the rendered tree into styled terminal lines, inserting a
/// caret marker at the given flattened offset.
fn styled_lines(tree: &NodeTree, caret: Option<usize>) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    let mut count = 0usize;

    let mut stack: Vec<(NodeId, Style)> = vec![(tree.root(), Style::default())];
    while let Some((id, style)) = stack.pop() {
        match tree.node(id) {
            Node::Text(text) => {
                let mut run = String::new();
                for ch in text.chars() {
                    if caret == Some(count) {
                        flush_run(&mut current, &mut run, style);
                        current.push(caret_marker());
                    }
                    count += 1;
                    if ch == '\n' {
                        flush_run(&mut current, &mut run, style);
                        lines.push(Line::from(std::mem::take(&mut current)));
                    } else {
                        run.push(ch);
                    }
                }
                flush_run(&mut current, &mut run, style);
            }
            Node::Element { kind, children } => {
                if matches!(kind, ElementKind::BlockSeparator) {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    lines.push(Line::from(""));
                }
                let style = style.patch(element_style(kind));
                for &child in children.iter().rev() {
                    stack.push((child, style));
                }
            }
        }
    }

    if caret == Some(count) {
        current.push(caret_marker());
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

fn flush_run(spans: &mut Vec<Span<'static>>, run: &mut String, style: Style) {
    if !run.is_empty() {
        spans.push(Span::styled(std::mem::take(run), style));
    }
}

fn caret_marker() -> Span<'static> {
    Span::styled("\u{258f}", Style::default().fg(Color::Yellow))
}

fn element_style(kind: &ElementKind) -> Style {
    match kind {
        ElementKind::Heading { .. } => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ElementKind::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        ElementKind::Strong => Style::default().add_modifier(Modifier::BOLD),
        ElementKind::Strikethrough => Style::default().add_modifier(Modifier::CROSSED_OUT),
        ElementKind::CodeSpan | ElementKind::CodeBlock { .. } => Style::default().fg(Color::Green),
        ElementKind::Link { .. } => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::UNDERLINED),
        ElementKind::BlockQuote => Style::default().fg(Color::DarkGray),
        ElementKind::ThematicBreak => Style::default().fg(Color::DarkGray),
        _ => Style::default(),
    }
}
