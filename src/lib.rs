#[allow(non_snake_case)]
pub mod Chemistry;
#[allow(non_snake_case)]
pub mod Storage;
pub mod cli;
pub mod settings;
