use crate::command::{CommandBox, CompositeCommand};
use wiregrid_core::Pos;
use wiregrid_world::{World, WorldError};

/// An open group collecting commands until it is closed
struct OpenGroup {
    description: String,
    commands: Vec<CommandBox>,
}

/// Undo and redo stacks for world edits
#[derive(Default)]
pub struct HistoryManager {
    undo_stack: Vec<CommandBox>,
    redo_stack: Vec<CommandBox>,
    /// Oldest steps fall off past this depth
    max_size: usize,
    enable_merging: bool,
    group: Option<OpenGroup>,
}

impl HistoryManager {
    /// History keeping at most `max_size` undo steps
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
            enable_merging: true,
            group: None,
        }
    }

    /// Execute a command and add it to the undo stack.
    ///
    /// A command that fails is dropped and leaves the history untouched.
    pub fn execute(&mut self, mut command: CommandBox, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let affected = command.execute(world)?;

        // A new edit forks history
        self.redo_stack.clear();

        if let Some(group) = &mut self.group {
            group.commands.push(command);
            return Ok(affected);
        }

        if self.enable_merging {
            if let Some(last) = self.undo_stack.last_mut() {
                if last.can_merge(&*command) && last.merge(&*command) {
                    return Ok(affected);
                }
            }
        }

        self.push(command);
        Ok(affected)
    }

    fn push(&mut self, command: CommandBox) {
        self.undo_stack.push(command);

        if self.undo_stack.len() > self.max_size {
            let excess = self.undo_stack.len() - self.max_size;
            self.undo_stack.drain(..excess);
        }
    }

    /// Undo the last command. `Ok(None)` if there is nothing to undo.
    pub fn undo(&mut self, world: &mut World) -> Result<Option<Vec<Pos>>, WorldError> {
        self.end_group();
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let affected = command.undo(world)?;
        self.redo_stack.push(command);
        Ok(Some(affected))
    }

    /// Redo the last undone command. `Ok(None)` if there is nothing to redo.
    pub fn redo(&mut self, world: &mut World) -> Result<Option<Vec<Pos>>, WorldError> {
        self.end_group();
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let affected = command.execute(world)?;
        self.undo_stack.push(command);
        Ok(Some(affected))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the step `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.description())
    }

    /// Label of the step `redo` would apply
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget all history, including an open group
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.group = None;
    }

    /// Toggle folding of consecutive same-mask paint strokes
    pub fn set_merging_enabled(&mut self, enabled: bool) {
        self.enable_merging = enabled;
    }

    /// Start collecting commands into one undo step. Closes any open group first.
    pub fn start_group(&mut self, description: impl Into<String>) {
        self.end_group();
        self.group = Some(OpenGroup {
            description: description.into(),
            commands: Vec::new(),
        });
    }

    /// Close the open group and push it as a single undo step.
    /// An empty group leaves no trace.
    pub fn end_group(&mut self) {
        let Some(group) = self.group.take() else {
            return;
        };
        if group.commands.is_empty() {
            return;
        }
        self.push(Box::new(CompositeCommand::new(group.commands, group.description)));
    }

    pub fn in_group(&self) -> bool {
        self.group.is_some()
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_size", &self.max_size)
            .field("in_group", &self.group.is_some())
            .finish()
    }
}
