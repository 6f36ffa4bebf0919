//! Process table (C3): fixed PCB pool, loader, and process creation.

pub mod loader;
pub mod pcb;
pub mod table;
