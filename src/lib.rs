pub mod cli {
    pub mod commands;
}
pub mod config {
    pub mod content;
    pub mod simulation;
}
pub mod error;
pub mod items;
pub mod simulation;
pub mod world;
