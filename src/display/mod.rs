pub mod terminal;

pub use terminal::{Frame, TerminalDisplay};
