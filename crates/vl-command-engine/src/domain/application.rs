//! Per-application state touched by commands.
//!
//! The command catalogue, uploaded files and cached global properties. All
//! of it is mutated only from validation (reservations) and from the
//! finalize step of a command once its outcome is known.

use crate::domain::entities::{
    ConnectionKey, FileType, Image, KeyboardProperties, MenuParams, TtsChunk, VrHelpItem,
};
use std::collections::{BTreeMap, HashSet};

/// Registration data supplied by the session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub app_id: String,
    pub name: String,
    pub is_media: bool,
    /// Navigation apps may customise keyboard and menu
    pub allow_navigation: bool,
}

impl ApplicationInfo {
    pub fn new(app_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
            is_media: false,
            allow_navigation: false,
        }
    }
}

/// A command defined by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub cmd_id: u32,
    /// Registered with the UI
    pub menu_params: Option<MenuParams>,
    /// Registered with VR
    pub vr_commands: Option<Vec<String>>,
    pub cmd_icon: Option<Image>,
}

impl CommandEntry {
    pub fn has_menu(&self) -> bool {
        self.menu_params.is_some()
    }

    pub fn has_vr(&self) -> bool {
        self.vr_commands.as_ref().is_some_and(|v| !v.is_empty())
    }
}

/// A file uploaded through PutFile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFile {
    pub name: String,
    pub file_type: FileType,
    pub persistent: bool,
    pub download_complete: bool,
}

/// Cached global properties, last accepted values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalProperties {
    pub vr_help_title: Option<String>,
    pub vr_help: Option<Vec<VrHelpItem>>,
    pub help_prompt: Option<Vec<TtsChunk>>,
    pub timeout_prompt: Option<Vec<TtsChunk>>,
    pub menu_title: Option<String>,
    pub menu_icon: Option<Image>,
    pub keyboard_properties: Option<KeyboardProperties>,
}

impl GlobalProperties {
    /// Overwrite every field that `update` carries.
    pub fn merge(&mut self, update: GlobalProperties) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if update.$field.is_some() { self.$field = update.$field; })*
            };
        }
        take!(
            vr_help_title,
            vr_help,
            help_prompt,
            timeout_prompt,
            menu_title,
            menu_icon,
            keyboard_properties
        );
    }
}

/// State of one connected application
#[derive(Debug)]
pub struct Application {
    connection_key: ConnectionKey,
    info: ApplicationInfo,
    commands: BTreeMap<u32, CommandEntry>,
    files: BTreeMap<String, AppFile>,
    global_properties: GlobalProperties,
    /// Command ids owned by an in-flight fan-out
    reserved_commands: HashSet<u32>,
    /// Entries an in-flight AddCommand will commit; their names are taken
    pending_entries: BTreeMap<u32, CommandEntry>,
    hash: u64,
}

impl Application {
    pub fn new(connection_key: ConnectionKey, info: ApplicationInfo) -> Self {
        Self {
            connection_key,
            info,
            commands: BTreeMap::new(),
            files: BTreeMap::new(),
            global_properties: GlobalProperties::default(),
            reserved_commands: HashSet::new(),
            pending_entries: BTreeMap::new(),
            hash: 0,
        }
    }

    pub fn connection_key(&self) -> ConnectionKey {
        self.connection_key
    }

    pub fn app_id(&self) -> &str {
        &self.info.app_id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &ApplicationInfo {
        &self.info
    }

    pub fn allows_navigation(&self) -> bool {
        self.info.allow_navigation
    }

    // =========================================================================
    // Command catalogue
    // =========================================================================

    pub fn command(&self, cmd_id: u32) -> Option<&CommandEntry> {
        self.commands.get(&cmd_id)
    }

    /// Commands in ascending id order
    pub fn commands(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Insert a command. Returns false if the id is taken.
    pub fn add_command(&mut self, entry: CommandEntry) -> bool {
        if self.commands.contains_key(&entry.cmd_id) {
            return false;
        }
        self.commands.insert(entry.cmd_id, entry);
        true
    }

    pub fn command_mut(&mut self, cmd_id: u32) -> Option<&mut CommandEntry> {
        self.commands.get_mut(&cmd_id)
    }

    pub fn remove_command(&mut self, cmd_id: u32) -> Option<CommandEntry> {
        self.commands.remove(&cmd_id)
    }

    /// Committed and in-flight entries
    fn known_entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values().chain(self.pending_entries.values())
    }

    pub fn menu_name_in_use(&self, menu_name: &str) -> bool {
        self.known_entries().any(|c| {
            c.menu_params
                .as_ref()
                .is_some_and(|m| m.menu_name.eq_ignore_ascii_case(menu_name))
        })
    }

    pub fn vr_synonym_in_use(&self, synonym: &str) -> bool {
        self.known_entries().any(|c| {
            c.vr_commands
                .as_ref()
                .is_some_and(|v| v.iter().any(|s| s.eq_ignore_ascii_case(synonym)))
        })
    }

    pub fn is_reserved(&self, cmd_id: u32) -> bool {
        self.reserved_commands.contains(&cmd_id)
    }

    /// Reserve a command id for an in-flight fan-out. Returns false if already reserved.
    pub fn reserve_command(&mut self, cmd_id: u32) -> bool {
        self.reserved_commands.insert(cmd_id)
    }

    /// Reserve the id and the names of an entry awaiting confirmation.
    pub fn reserve_entry(&mut self, entry: CommandEntry) -> bool {
        if !self.reserve_command(entry.cmd_id) {
            return false;
        }
        self.pending_entries.insert(entry.cmd_id, entry);
        true
    }

    pub fn release_command(&mut self, cmd_id: u32) {
        self.reserved_commands.remove(&cmd_id);
        self.pending_entries.remove(&cmd_id);
    }

    // =========================================================================
    // Files
    // =========================================================================

    pub fn file(&self, name: &str) -> Option<&AppFile> {
        self.files.get(name)
    }

    pub fn files(&self) -> impl Iterator<Item = &AppFile> {
        self.files.values()
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Register a new file. Returns false if the name is already registered.
    pub fn add_file(&mut self, file: AppFile) -> bool {
        if self.files.contains_key(&file.name) {
            return false;
        }
        self.files.insert(file.name.clone(), file);
        true
    }

    /// Mark an upload complete. Returns false for an unknown file.
    pub fn mark_file_complete(&mut self, name: &str) -> bool {
        match self.files.get_mut(name) {
            Some(file) => {
                file.download_complete = true;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Global properties and resumption hash
    // =========================================================================

    pub fn global_properties(&self) -> &GlobalProperties {
        &self.global_properties
    }

    pub fn apply_global_properties(&mut self, update: GlobalProperties) {
        self.global_properties.merge(update);
    }

    /// Counter bumped on every committed state change
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn update_hash(&mut self) {
        self.hash = self.hash.wrapping_add(1);
    }
}
