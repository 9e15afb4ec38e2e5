pub mod dump;
pub mod emit;
pub mod inspect;
pub mod unit_loader;
