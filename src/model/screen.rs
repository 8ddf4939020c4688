/// Why an instance is being picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Install,
    Manage,
}

/// Menu levels, from the main menu down to a single plugin's actions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    MainMenu,
    InstancePicker(Purpose),
    /// Catalog plugins available for install.
    PluginPicker,
    /// Mirrors for the named catalog plugin.
    SourcePicker(String),
    /// Plugins present in the selected instance.
    Installed,
    PluginActions,
}

impl Screen {
    pub fn label(&self) -> &'static str {
        match self {
            Screen::MainMenu => "MENU",
            Screen::InstancePicker(Purpose::Install) => "INSTALL",
            Screen::InstancePicker(Purpose::Manage) => "MANAGE",
            Screen::PluginPicker => "CATALOG",
            Screen::SourcePicker(_) => "SOURCE",
            Screen::Installed => "PLUGINS",
            Screen::PluginActions => "ACTIONS",
        }
    }

    /// Where Esc leads.
    pub fn parent(&self) -> Option<Screen> {
        match self {
            Screen::MainMenu => None,
            Screen::InstancePicker(_) => Some(Screen::MainMenu),
            Screen::PluginPicker => Some(Screen::InstancePicker(Purpose::Install)),
            Screen::SourcePicker(_) => Some(Screen::PluginPicker),
            Screen::Installed => Some(Screen::InstancePicker(Purpose::Manage)),
            Screen::PluginActions => Some(Screen::Installed),
        }
    }
}
