use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::model::screen::{Purpose, Screen};
use crate::msg::Msg;
use crate::plugin::PluginManager;
use crate::plugin::catalog::SourceEntry;
use crate::plugin::error::{ErrorKind, PluginError};
use crate::plugin::lifecycle::Confirmation;
use crate::plugin::manager::Change;
use crate::plugin::store::PluginArtifact;

const BACK: &str = "Back";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Prompt {
    Delete(PluginArtifact),
    Restart(String),
}

/// Popups stacked over the menu; the front one receives all keys.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Notice {
        title: String,
        text: String,
        error: bool,
    },
    Confirm {
        text: String,
        prompt: Prompt,
    },
    Busy(String),
}

#[derive(Debug, Clone)]
struct PendingInstall {
    plugin: String,
    source: SourceEntry,
    /// Set once the busy popup has been rendered, so the blocking download
    /// never starts before the user has seen it.
    drawn: bool,
}

#[derive(Debug, Clone)]
struct MenuItem {
    label: String,
    hint: String,
}

fn item(label: impl Into<String>, hint: impl Into<String>) -> MenuItem {
    MenuItem {
        label: label.into(),
        hint: hint.into(),
    }
}

pub struct App {
    pub screen: Screen,
    selected: usize,
    manager: PluginManager,
    /// Instance names with their liveness at the time the picker opened.
    instances: Vec<(String, bool)>,
    instance: Option<String>,
    plugin_dir: Option<PathBuf>,
    plugins: Vec<PluginArtifact>,
    plugin: Option<PluginArtifact>,
    overlays: VecDeque<Overlay>,
    pending_install: Option<PendingInstall>,
    pub should_quit: bool,
}

impl App {
    pub fn new(manager: PluginManager) -> Self {
        Self {
            screen: Screen::MainMenu,
            selected: 0,
            manager,
            instances: Vec::new(),
            instance: None,
            plugin_dir: None,
            plugins: Vec::new(),
            plugin: None,
            overlays: VecDeque::new(),
            pending_install: None,
            should_quit: false,
        }
    }

    pub fn watch_root(&self) -> PathBuf {
        self.manager.versions_dir().to_path_buf()
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::FileChanged(path) => self.handle_file_changed(&path),
            Msg::Tick => self.handle_tick(),
            Msg::Resize => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if let Some(overlay) = self.overlays.front().cloned() {
            self.handle_key_overlay(overlay, key);
            return;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => self.activate(),
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => self.go_back(),
            KeyCode::Char('q') => {
                if self.screen == Screen::MainMenu {
                    self.should_quit = true;
                } else {
                    self.go_back();
                }
            }
            _ => {}
        }
    }

    fn handle_key_overlay(&mut self, overlay: Overlay, key: KeyEvent) {
        match overlay {
            Overlay::Busy(_) => {}
            Overlay::Notice { .. } => {
                if matches!(
                    key.code,
                    KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q')
                ) {
                    self.overlays.pop_front();
                }
            }
            Overlay::Confirm { prompt, .. } => {
                let answer = match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
                    _ => return,
                };
                self.overlays.pop_front();
                self.answer(prompt, answer);
            }
        }
    }

    fn handle_tick(&mut self) {
        if self.pending_install.as_ref().is_some_and(|p| p.drawn) {
            self.run_install();
        }
    }

    fn handle_file_changed(&mut self, path: &Path) {
        let Some(dir) = self.plugin_dir.clone() else {
            return;
        };
        if !path.starts_with(&dir) {
            return;
        }
        if !matches!(self.screen, Screen::Installed | Screen::PluginActions) {
            return;
        }

        self.reload_plugins();
        if self.screen == Screen::PluginActions {
            let still_there = self
                .plugin
                .as_ref()
                .is_some_and(|current| self.plugins.contains(current));
            if !still_there {
                self.enter(Screen::Installed);
            }
        }
        self.clamp_selection();
    }

    // ── Navigation ───────────────────────────────────────────────

    fn move_selection(&mut self, delta: isize) {
        let max = self.menu_items().len().saturating_sub(1) as isize;
        let next = (self.selected as isize + delta).clamp(0, max);
        self.selected = next as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.menu_items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn enter(&mut self, screen: Screen) {
        self.screen = screen;
        self.selected = 0;
    }

    fn go_back(&mut self) {
        let Some(parent) = self.screen.parent() else {
            return;
        };

        match parent {
            Screen::InstancePicker(purpose) => self.open_instance_picker(purpose),
            Screen::Installed => {
                self.reload_plugins();
                self.enter(Screen::Installed);
            }
            other => self.enter(other),
        }
    }

    fn activate(&mut self) {
        let items = self.menu_items();
        if self.selected + 1 >= items.len() && self.screen != Screen::MainMenu {
            self.go_back();
            return;
        }

        let index = self.selected;
        match self.screen.clone() {
            Screen::MainMenu => match index {
                0 => self.open_instance_picker(Purpose::Install),
                1 => self.open_instance_picker(Purpose::Manage),
                _ => self.should_quit = true,
            },
            Screen::InstancePicker(purpose) => {
                if let Some((name, _)) = self.instances.get(index).cloned() {
                    self.choose_instance(purpose, name);
                }
            }
            Screen::PluginPicker => {
                let name = self
                    .manager
                    .catalog()
                    .entries()
                    .get(index)
                    .map(|entry| entry.name.clone());
                if let Some(name) = name {
                    self.choose_plugin(name);
                }
            }
            Screen::SourcePicker(plugin) => self.choose_source(plugin, index),
            Screen::Installed => {
                if let Some(plugin) = self.plugins.get(index).cloned() {
                    self.plugin = Some(plugin);
                    self.enter(Screen::PluginActions);
                }
            }
            Screen::PluginActions => match index {
                0 => self.show_plugin_info(),
                1 => self.toggle_plugin(),
                _ => self.confirm_delete(),
            },
        }
    }

    // ── Install flow ─────────────────────────────────────────────

    fn open_instance_picker(&mut self, purpose: Purpose) {
        let names = self.manager.list_instances();
        if names.is_empty() {
            self.notice("Instances", "No server instances found.");
            self.enter(Screen::MainMenu);
            return;
        }

        self.instances = names
            .into_iter()
            .map(|name| {
                let running = self.manager.check_running(&name);
                (name, running)
            })
            .collect();
        self.enter(Screen::InstancePicker(purpose));
    }

    fn choose_instance(&mut self, purpose: Purpose, name: String) {
        match purpose {
            Purpose::Install => match self.manager.resolve_plugin_dir(&name) {
                Ok(dir) => {
                    self.instance = Some(name);
                    self.plugin_dir = Some(dir);
                    self.enter(Screen::PluginPicker);
                }
                Err(err) => self.fail("Cannot prepare plugin directory", &err),
            },
            Purpose::Manage => {
                let Some(dir) = self.manager.existing_plugin_dir(&name) else {
                    self.notice("Plugins", &format!("{name} has no plugin directory."));
                    return;
                };
                self.instance = Some(name);
                self.plugin_dir = Some(dir);
                self.reload_plugins();
                if self.plugins.is_empty() {
                    self.notice("Plugins", "No plugins found.");
                    return;
                }
                self.enter(Screen::Installed);
            }
        }
    }

    fn choose_plugin(&mut self, name: String) {
        let lookup = self.manager.catalog().sources(&name).map(|_| ());
        if let Err(err) = lookup {
            self.fail("Cannot install", &err);
            return;
        }
        self.enter(Screen::SourcePicker(name));
    }

    fn choose_source(&mut self, plugin: String, index: usize) {
        let source = self
            .manager
            .catalog()
            .sources(&plugin)
            .ok()
            .and_then(|sources| sources.get(index).cloned());
        let Some(source) = source else {
            return;
        };

        self.overlays.push_back(Overlay::Busy(format!(
            "Downloading {plugin}...\nSource: {}\nURL: {}",
            source.label, source.url
        )));
        self.pending_install = Some(PendingInstall {
            plugin,
            source,
            drawn: false,
        });
    }

    fn run_install(&mut self) {
        let Some(pending) = self.pending_install.take() else {
            return;
        };
        self.overlays.retain(|overlay| !matches!(overlay, Overlay::Busy(_)));

        let (Some(instance), Some(dir)) = (self.instance.clone(), self.plugin_dir.clone()) else {
            return;
        };

        match self
            .manager
            .install(&pending.plugin, &instance, &dir, &pending.source)
        {
            Ok(change) => {
                self.report(&instance, change);
                self.enter(Screen::MainMenu);
            }
            Err(err) => {
                tracing::warn!("install of {} failed: {err}", pending.plugin);
                self.fail("Download failed", &err);
            }
        }
    }

    // ── Manage flow ──────────────────────────────────────────────

    fn reload_plugins(&mut self) {
        self.plugins = self
            .plugin_dir
            .as_deref()
            .map(|dir| self.manager.list_plugins(dir))
            .unwrap_or_default();
    }

    fn show_plugin_info(&mut self) {
        let Some(plugin) = self.plugin.clone() else {
            return;
        };

        let mut text = format!(
            "Name: {}\nFile: {}\nSize: {} KB\nState: {}",
            plugin.name,
            plugin.file_name,
            plugin.size_kib(),
            plugin.state().label()
        );
        if plugin.conflicted {
            text.push_str("\nWarning: enabled and disabled copies both exist");
        }
        self.notice("Plugin info", &text);
    }

    fn toggle_plugin(&mut self) {
        let (Some(plugin), Some(dir), Some(instance)) = (
            self.plugin.clone(),
            self.plugin_dir.clone(),
            self.instance.clone(),
        ) else {
            return;
        };

        match self.manager.toggle(&plugin, &dir, &instance) {
            Ok((toggled, change)) => {
                self.reload_plugins();
                self.enter(Screen::Installed);
                if let Some(idx) = self.plugins.iter().position(|p| *p == toggled) {
                    self.selected = idx;
                }
                self.plugin = Some(toggled);
                self.report(&instance, change);
            }
            Err(err) => self.fail("Operation failed", &err),
        }
    }

    fn confirm_delete(&mut self) {
        let Some(plugin) = self.plugin.clone() else {
            return;
        };
        self.overlays.push_back(Overlay::Confirm {
            text: format!("Permanently delete plugin {}?", plugin.name),
            prompt: Prompt::Delete(plugin),
        });
    }

    fn answer(&mut self, prompt: Prompt, yes: bool) {
        match prompt {
            Prompt::Delete(plugin) => {
                let confirmation = if yes {
                    Confirmation::Confirmed
                } else {
                    Confirmation::Declined
                };
                self.delete_plugin(&plugin, confirmation);
            }
            Prompt::Restart(instance) => {
                if !yes {
                    tracing::info!("restart of {instance} postponed");
                    return;
                }
                if self.manager.restart(&instance) {
                    self.notice("Restart", &format!("{instance} is restarting."));
                } else {
                    self.error(format!("{instance} has no start script, cannot restart."));
                }
            }
        }
    }

    fn delete_plugin(&mut self, plugin: &PluginArtifact, confirmation: Confirmation) {
        let (Some(dir), Some(instance)) = (self.plugin_dir.clone(), self.instance.clone()) else {
            return;
        };

        match self.manager.delete(plugin, &dir, &instance, confirmation) {
            Ok(None) => {}
            Ok(Some(change)) => {
                self.plugin = None;
                self.reload_plugins();
                if self.plugins.is_empty() {
                    self.open_instance_picker(Purpose::Manage);
                } else {
                    self.enter(Screen::Installed);
                }
                self.report(&instance, change);
            }
            Err(err) => self.fail("Delete failed", &err),
        }
    }

    /// Announces a finished change and, if the instance is live, queues the
    /// restart question behind it.
    fn report(&mut self, instance: &str, change: Change) {
        self.notice("Success", &change.message);
        if change.needs_restart {
            self.overlays.push_back(Overlay::Confirm {
                text: format!("{instance} must restart for the change to take effect. Restart now?"),
                prompt: Prompt::Restart(instance.to_string()),
            });
        }
    }

    fn notice(&mut self, title: &str, text: &str) {
        self.overlays.push_back(Overlay::Notice {
            title: title.to_string(),
            text: text.to_string(),
            error: false,
        });
    }

    fn error(&mut self, text: String) {
        self.overlays.push_back(Overlay::Notice {
            title: "Error".to_string(),
            text,
            error: true,
        });
    }

    fn fail(&mut self, context: &str, err: &PluginError) {
        let title = match err.kind() {
            ErrorKind::Configuration => "Configuration error",
            ErrorKind::Network => "Network error",
            ErrorKind::Validation => "Invalid download",
            ErrorKind::Filesystem => "Filesystem error",
        };
        self.overlays.push_back(Overlay::Notice {
            title: title.to_string(),
            text: format!("{context}: {err}"),
            error: true,
        });
    }

    // ── Menus ────────────────────────────────────────────────────

    fn menu_title(&self) -> String {
        match &self.screen {
            Screen::MainMenu => "Plugin manager".to_string(),
            Screen::InstancePicker(Purpose::Install) => "Select target instance".to_string(),
            Screen::InstancePicker(Purpose::Manage) => "Select instance".to_string(),
            Screen::PluginPicker => "Select plugin".to_string(),
            Screen::SourcePicker(plugin) => format!("Select {plugin} source"),
            Screen::Installed => format!(
                "Plugins - {}",
                self.instance.as_deref().unwrap_or_default()
            ),
            Screen::PluginActions => format!(
                "Plugin - {}",
                self.plugin.as_ref().map_or("", |p| p.name.as_str())
            ),
        }
    }

    fn menu_items(&self) -> Vec<MenuItem> {
        let mut items = match &self.screen {
            Screen::MainMenu => {
                return vec![
                    item("Install plugin", "download from a mirror"),
                    item("Manage plugins", "info, enable, disable, delete"),
                    item("Quit", ""),
                ];
            }
            Screen::InstancePicker(_) => self
                .instances
                .iter()
                .map(|(name, running)| item(name, if *running { "running" } else { "" }))
                .collect(),
            Screen::PluginPicker => self
                .manager
                .catalog()
                .entries()
                .iter()
                .map(|entry| item(&entry.name, entry.description.clone().unwrap_or_default()))
                .collect(),
            Screen::SourcePicker(plugin) => self
                .manager
                .catalog()
                .sources(plugin)
                .map(|sources| {
                    sources
                        .iter()
                        .map(|source| item(&source.label, &source.url))
                        .collect()
                })
                .unwrap_or_default(),
            Screen::Installed => self
                .plugins
                .iter()
                .map(|plugin| {
                    item(
                        format!("{} [{}]", plugin.name, plugin.state().label()),
                        if plugin.conflicted { "duplicate" } else { "" },
                    )
                })
                .collect(),
            Screen::PluginActions => {
                let toggle = match &self.plugin {
                    Some(plugin) if plugin.enabled => "Disable",
                    _ => "Enable",
                };
                vec![item("Info", ""), item(toggle, ""), item("Delete", "")]
            }
        };
        items.push(item(BACK, ""));
        items
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title bar
                Constraint::Min(1),    // menu
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_title_bar(frame, chunks[0]);
        self.render_menu(frame, chunks[1]);
        self.render_status_bar(frame, chunks[2]);

        if let Some(overlay) = self.overlays.front() {
            render_overlay(frame, overlay);
            if matches!(overlay, Overlay::Busy(_)) {
                if let Some(pending) = self.pending_install.as_mut() {
                    pending.drawn = true;
                }
            }
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut title = " AetherCraft plugins".to_string();
        if let Some(instance) = &self.instance {
            if self.screen != Screen::MainMenu {
                title.push_str(&format!(" | {instance}"));
            }
        }

        let bar = Paragraph::new(title).style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(bar, area);
    }

    fn render_menu(&self, frame: &mut Frame, area: Rect) {
        let items = self.menu_items();
        let width = items.iter().map(|i| i.label.len()).max().unwrap_or(0);

        let lines: Vec<Line> = items
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let content = format!("  {:<width$}  ", entry.label);
                if idx == self.selected {
                    Line::from(vec![
                        Span::styled(
                            content,
                            Style::default().fg(Color::Black).bg(Color::Cyan),
                        ),
                        Span::styled(entry.hint.clone(), Style::default().fg(Color::Gray)),
                    ])
                } else {
                    Line::from(vec![
                        Span::styled(content, Style::default().fg(Color::Gray)),
                        Span::styled(entry.hint.clone(), Style::default().fg(Color::DarkGray)),
                    ])
                }
            })
            .collect();

        let menu = Paragraph::new(lines).block(
            Block::default()
                .title(format!(" {} ", self.menu_title()))
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(12, 12, 18))),
        );
        frame.render_widget(menu, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_span = Span::styled(
            format!(" {} ", self.screen.label()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        );

        let hints = match self.overlays.front() {
            Some(Overlay::Confirm { .. }) => " y: yes  n: no ",
            Some(Overlay::Notice { .. }) => " Enter: dismiss ",
            Some(Overlay::Busy(_)) => " please wait ",
            None => " j/k: move  Enter: select  Esc: back  q: quit ",
        };
        let info = Span::styled(hints, Style::default().fg(Color::Gray).bg(Color::DarkGray));

        let bar = Line::from(vec![mode_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}

fn render_overlay(frame: &mut Frame, overlay: &Overlay) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let (title, text, border) = match overlay {
        Overlay::Notice { title, text, error } => (
            title.as_str(),
            text.as_str(),
            if *error { Color::Red } else { Color::Cyan },
        ),
        Overlay::Confirm { text, .. } => ("Confirm", text.as_str(), Color::Yellow),
        Overlay::Busy(text) => ("Working", text.as_str(), Color::Magenta),
    };

    let popup = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(Color::Rgb(15, 15, 24))),
    );
    frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instance::tests::registry;
    use crate::plugin::catalog::{CatalogEntry, SourceCatalog};
    use crate::plugin::installer::Downloader;
    use crate::plugin::installer::tests::FakeFetcher;
    use crate::plugin::supervisor::Supervisor;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn app(root: &Path, alive: Vec<i32>, body: Option<Vec<u8>>) -> App {
        let catalog = SourceCatalog::new(vec![CatalogEntry {
            name: "LuckPerms".to_string(),
            description: Some("Permission management".to_string()),
            sources: vec![SourceEntry {
                label: "Modrinth".to_string(),
                url: "https://cdn.example/LuckPerms.jar".to_string(),
            }],
        }]);
        let downloader = Downloader::new(Box::new(FakeFetcher(body)), root.join("temp"), 10240);
        App::new(PluginManager::from_parts(
            registry(root, alive),
            catalog,
            downloader,
            Supervisor::new(Duration::ZERO),
        ))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.update(Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn draw(app: &mut App) {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.view(frame)).unwrap();
    }

    fn front_text(app: &App) -> String {
        match app.overlays.front() {
            Some(Overlay::Notice { text, .. }) => text.clone(),
            Some(Overlay::Confirm { text, .. }) => text.clone(),
            Some(Overlay::Busy(text)) => text.clone(),
            None => String::new(),
        }
    }

    #[test]
    fn no_instances_is_a_notice_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut app = app(tmp.path(), vec![], None);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::MainMenu);
        assert!(matches!(
            app.overlays.front(),
            Some(Overlay::Notice { error: false, .. })
        ));
        press(&mut app, KeyCode::Enter);
        assert!(app.overlays.is_empty());
    }

    #[test]
    fn install_waits_for_busy_popup_then_installs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("versions/Paper-1.20")).unwrap();
        let mut app = app(tmp.path(), vec![], Some(vec![9; 64 * 1024]));

        press(&mut app, KeyCode::Enter); // install
        press(&mut app, KeyCode::Enter); // Paper-1.20
        assert_eq!(app.screen, Screen::PluginPicker);
        press(&mut app, KeyCode::Enter); // LuckPerms
        assert_eq!(app.screen, Screen::SourcePicker("LuckPerms".to_string()));
        press(&mut app, KeyCode::Enter); // Modrinth
        assert!(front_text(&app).starts_with("Downloading LuckPerms"));

        app.update(Msg::Tick);
        let plugins_dir = tmp.path().join("versions/Paper-1.20/plugins");
        assert!(!plugins_dir.join("LuckPerms.jar").exists());

        draw(&mut app);
        app.update(Msg::Tick);
        assert!(plugins_dir.join("LuckPerms.jar").is_file());
        assert_eq!(app.screen, Screen::MainMenu);
        assert_eq!(front_text(&app), "plugin LuckPerms installed");
        assert_eq!(app.overlays.len(), 1);
    }

    #[test]
    fn failed_download_reports_cause() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("versions/Paper-1.20")).unwrap();
        let mut app = app(tmp.path(), vec![], Some(b"<html>404</html>".to_vec()));

        for _ in 0..4 {
            press(&mut app, KeyCode::Enter);
        }
        draw(&mut app);
        app.update(Msg::Tick);

        assert!(matches!(
            app.overlays.front(),
            Some(Overlay::Notice { error: true, .. })
        ));
        assert!(front_text(&app).starts_with("Download failed:"));
        assert_eq!(app.screen, Screen::SourcePicker("LuckPerms".to_string()));
    }

    #[test]
    fn toggle_on_running_instance_asks_to_restart() {
        let tmp = TempDir::new().unwrap();
        let instance = tmp.path().join("versions/Paper-1.20");
        fs::create_dir_all(instance.join("plugins")).unwrap();
        fs::write(instance.join("server.pid"), "31337").unwrap();
        fs::write(instance.join("plugins/Geyser.jar.disabled"), b"jar").unwrap();
        let mut app = app(tmp.path(), vec![31337], None);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter); // manage
        press(&mut app, KeyCode::Enter); // Paper-1.20
        assert_eq!(app.screen, Screen::Installed);
        press(&mut app, KeyCode::Enter); // Geyser
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter); // Enable

        assert!(instance.join("plugins/Geyser.jar").is_file());
        assert_eq!(app.screen, Screen::Installed);
        assert_eq!(app.overlays.len(), 2);

        press(&mut app, KeyCode::Enter); // dismiss success
        assert!(matches!(
            app.overlays.front(),
            Some(Overlay::Confirm {
                prompt: Prompt::Restart(_),
                ..
            })
        ));
        press(&mut app, KeyCode::Char('n'));
        assert!(app.overlays.is_empty());
    }

    #[test]
    fn delete_needs_yes_and_returns_when_empty() {
        let tmp = TempDir::new().unwrap();
        let plugins = tmp.path().join("versions/Paper-1.20/plugins");
        fs::create_dir_all(&plugins).unwrap();
        fs::write(plugins.join("Geyser.jar"), b"jar").unwrap();
        let mut app = app(tmp.path(), vec![], None);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::PluginActions);

        press(&mut app, KeyCode::Up); // clamps at Info
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter); // Delete
        press(&mut app, KeyCode::Esc); // decline
        assert!(plugins.join("Geyser.jar").is_file());

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('y'));
        assert!(!plugins.join("Geyser.jar").exists());
        assert_eq!(app.screen, Screen::InstancePicker(Purpose::Manage));
        assert_eq!(front_text(&app), "plugin Geyser deleted");
    }

    #[test]
    fn external_changes_refresh_installed_list() {
        let tmp = TempDir::new().unwrap();
        let plugins = tmp.path().join("versions/Paper-1.20/plugins");
        fs::create_dir_all(&plugins).unwrap();
        fs::write(plugins.join("Geyser.jar"), b"jar").unwrap();
        let mut app = app(tmp.path(), vec![], None);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.plugins.len(), 1);

        fs::write(plugins.join("Floodgate.jar"), b"jar").unwrap();
        app.update(Msg::FileChanged(plugins.join("Floodgate.jar")));
        assert_eq!(app.plugins.len(), 2);
        assert_eq!(app.plugins[0].name, "Floodgate");
    }
}
