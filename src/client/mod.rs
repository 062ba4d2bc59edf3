mod input_loader;
pub use input_loader::{InputError, load_input_data, parse_input_line};
