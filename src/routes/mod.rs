pub mod entries;
pub mod export;
pub mod tags;
