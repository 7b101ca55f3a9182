mod command_input;
mod department_picker;
mod input;
mod key_result;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use department_picker::{DepartmentPicker, DepartmentPickerEvent};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
