pub mod command;
pub mod stack;

pub use command::{
    Command, CommandBox, CompositeCommand, EraseWireCommand, PaintWireCommand, PlaceTileCommand,
    RemoveTileCommand,
};
pub use stack::HistoryManager;
